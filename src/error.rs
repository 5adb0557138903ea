/// Failure domain for the handful of fallible authoring-time entry points
/// (§10.1). The hot render path never returns a `Result`: its failure modes
/// are contract violations, enforced with assertions (§7).
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum GeometryError {
    #[error("geometry has no opcodes")]
    Empty,
    #[error("geometry does not start with a Move opcode")]
    MissingInitialMove,
}

/// Raised by the page allocator backing [`crate::raster::Buffer`] (§7).
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer allocation failed (out of memory)")]
    OutOfMemory,
}
