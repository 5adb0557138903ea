//! The rasterization backend (§4.4–§4.8): fat-row coverage accumulation,
//! height-class packing, per-shard contexts, and the parallel
//! [`Renderer`] that ties them together into one [`Buffer`] (§5).

pub mod allocator;
pub mod buffer;
pub mod context;
pub mod curve_indexer;
pub mod hit_test;
pub mod outliner;
mod renderer;
mod sort;

pub use allocator::{Allocator, HeightClass, Pass, Placement, PrimitiveKind};
pub use buffer::{Buffer, Edge, Entry, EntryTag, Header, Instance, InstanceTag, Opaque, Segment};
pub use context::Context;
pub use curve_indexer::CurveIndexer;
pub use hit_test::indices_for_point;
pub use renderer::Renderer;
