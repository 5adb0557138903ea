//! The GPU-ready output [`Buffer`] (§4.6, §4.7): a fixed-capacity, paged
//! byte arena plus a typed [`Entry`] table, a per-item [`Header`], and the
//! record types described in §6. Never grows past the capacity reserved
//! up front — paging just avoids one giant up-front `Vec::with_capacity`
//! allocation on a producer whose final size isn't known until after the
//! curve budget is walked (§4.2 step 3).

use bitflags::bitflags;
use bytemuck::{Pod, Zeroable};

use crate::{Bounds, BufferError, Colorant, Transform};

/// Bytes per page. Matches the original's `kPageSize`.
pub const K_PAGE_SIZE: usize = 4096;

/// Directory-level entry tag: which of the §6 per-pass or per-item record
/// tables a [`Entry`] points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EntryTag {
    QuadEdges = 0,
    FastEdges = 1,
    FastOutlines = 2,
    QuadOutlines = 3,
    FastMolecules = 4,
    QuadMolecules = 5,
    Opaques = 6,
    Instances = 7,
}

bitflags! {
    /// High-bit type tags packed into [`Instance::iz`] above the 24-bit
    /// path index (§6). Distinct from [`EntryTag`]: `EntryTag` says which
    /// directory table a record lives in, `InstanceTag` says what kind of
    /// placement the instance itself is.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct InstanceTag: u32 {
        const EVEN_ODD   = 1 << 24;
        const ROUND_CAP  = 1 << 25;
        const EDGE       = 1 << 26;
        const SOLID_CELL = 1 << 27;
        const SQUARE_CAP = 1 << 28;
        const OUTLINES   = 1 << 29;
        const FAST_EDGES = 1 << 30;
        const MOLECULE   = 1 << 31;
    }
}

const PATH_INDEX_MASK: u32 = (1 << 24) - 1;

/// One placement instance: a fill/stroke/molecule span positioned by
/// `ctm`, painted `color`, tagged with the owning path's index and its
/// kind via `iz` (§6).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Instance {
    pub ctm: Transform,
    pub color: Colorant,
    /// Low 24 bits: path index. High 8 bits: [`InstanceTag`] bits.
    pub iz: u32,
}

impl Instance {
    #[must_use]
    pub fn pack_iz(path_index: u32, tags: InstanceTag) -> u32 {
        debug_assert!(path_index <= PATH_INDEX_MASK, "path index must fit in 24 bits");
        (path_index & PATH_INDEX_MASK) | tags.bits()
    }

    #[must_use]
    pub fn path_index(self) -> u32 {
        self.iz & PATH_INDEX_MASK
    }

    #[must_use]
    pub fn tags(self) -> InstanceTag {
        InstanceTag::from_bits_truncate(self.iz & !PATH_INDEX_MASK)
    }
}

/// One stroke segment, ring-linked to its neighbors within the same
/// subpath so join/cap geometry can be derived downstream (§4.1 Outliner).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Segment {
    pub p0: [f32; 2],
    pub p1: [f32; 2],
    pub width: f32,
    pub prev: i32,
    pub next: i32,
}

/// One coverage edge within a `QuadEdges`/`FastEdges`/`*Outlines`/
/// `*Molecules` table: `i0` is the starting column, `ux` the fixed-point
/// coverage level, and `ic` packs the fat-row index (bias-shifted the
/// same way [`super::curve_indexer`] biases row keys for `u32` sorting)
/// together with two curve-continuation marker bits (§6).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Edge {
    pub ic: u32,
    pub i0: u16,
    pub ux: u16,
}

/// Bias applied to a signed fat-row index before packing it into
/// [`Edge::ic`], matching [`super::curve_indexer::finalize_row`]'s sort
/// bias so row indices pack as unsigned.
pub const ROW_BIAS: i32 = 1 << 20;

impl Edge {
    #[must_use]
    pub fn new(row: i32, i0: u16, ux: u16, a0: bool, a1: bool) -> Self {
        let biased = (row + ROW_BIAS) as u32;
        let ic = (biased << 2) | (a0 as u32) | ((a1 as u32) << 1);
        Self { ic, i0, ux }
    }

    #[must_use]
    pub fn row(self) -> i32 {
        ((self.ic >> 2) as i32) - ROW_BIAS
    }

    #[must_use]
    pub fn a0(self) -> bool {
        self.ic & 0b01 != 0
    }

    #[must_use]
    pub fn a1(self) -> bool {
        self.ic & 0b10 != 0
    }
}

/// A fully-covered run: no per-column coverage accumulation needed, just
/// the opaque quad's bounds and a settled winding base (§4.5 Solid-Cell /
/// Opaque emission).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Opaque {
    pub iz: u32,
    pub base: i32,
    pub lx: u16,
    pub ly: u16,
    pub ux: u16,
    pub uy: u16,
    pub ox: u16,
    pub oy: u16,
    pub cover: i16,
    pub _pad: u16,
}

/// A directory record: `iz` packs a 24-bit path index with an 8-bit
/// [`EntryTag`]; `offset`/`len` locate the record's bytes in the buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Entry {
    pub iz: u32,
    pub offset: u32,
    pub len: u32,
}

impl Entry {
    #[must_use]
    pub fn pack_iz(path_index: u32, tag: EntryTag) -> u32 {
        debug_assert!(path_index < (1 << 24), "path index must fit in 24 bits");
        (path_index << 8) | tag as u32
    }

    #[must_use]
    pub fn path_index(self) -> u32 {
        self.iz >> 8
    }

    #[must_use]
    pub fn tag(self) -> u8 {
        (self.iz & 0xFF) as u8
    }
}

/// Per-item metadata (§6 "Offset 0..headerSize"): one row appended per
/// scene item in draw order. Modeled as parallel side tables rather than
/// a byte-exact region at offset 0 of the arena, since shard buffers are
/// produced independently and concatenated after the fact (§5) — there is
/// no single up-front `pathsCount` to size a literal header region
/// against until every shard has run.
#[derive(Default, Debug, Clone)]
pub struct Header {
    pub colors: Vec<Colorant>,
    pub ctms: Vec<Transform>,
    pub clip_ctms: Vec<Transform>,
    pub widths: Vec<f32>,
    pub bnds: Vec<Bounds>,
}

impl Header {
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn push(&mut self, color: Colorant, ctm: Transform, clip_ctm: Transform, width: f32, bnds: Bounds) {
        self.colors.push(color);
        self.ctms.push(ctm);
        self.clip_ctms.push(clip_ctm);
        self.widths.push(width);
        self.bnds.push(bnds);
    }

    fn append(&mut self, other: &Self) {
        self.colors.extend_from_slice(&other.colors);
        self.ctms.extend_from_slice(&other.ctms);
        self.clip_ctms.extend_from_slice(&other.clip_ctms);
        self.widths.extend_from_slice(&other.widths);
        self.bnds.extend_from_slice(&other.bnds);
    }
}

/// A fixed-capacity byte arena grown in [`K_PAGE_SIZE`] increments up to
/// `capacity`, plus its [`Entry`] directory and [`Header`].
#[derive(Debug)]
pub struct Buffer {
    bytes: Vec<u8>,
    capacity: usize,
    entries: Vec<Entry>,
    header: Header,
}

impl Buffer {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(K_PAGE_SIZE.min(capacity)),
            capacity,
            entries: Vec::new(),
            header: Header::default(),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn bytes_used(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut Header {
        &mut self.header
    }

    fn reserve_page_for(&mut self, additional: usize) -> Result<(), BufferError> {
        let needed = self.bytes.len() + additional;
        if needed > self.capacity {
            return Err(BufferError::OutOfMemory);
        }
        if needed > self.bytes.capacity() {
            let pages = needed.div_ceil(K_PAGE_SIZE);
            self.bytes.reserve((pages * K_PAGE_SIZE) - self.bytes.capacity());
        }
        Ok(())
    }

    /// Appends one POD record's bytes and a directory [`Entry`] pointing
    /// at them, tagged with `path_index`/`tag`. Fails once `capacity`
    /// would be exceeded rather than growing past it (§7).
    pub fn push<T: Pod>(&mut self, value: T, path_index: u32, tag: EntryTag) -> Result<(), BufferError> {
        let bytes = bytemuck::bytes_of(&value);
        self.reserve_page_for(bytes.len())?;
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(bytes);
        self.entries.push(Entry {
            iz: Entry::pack_iz(path_index, tag),
            offset,
            len: bytes.len() as u32,
        });
        Ok(())
    }

    /// Appends another buffer's bytes, directory, and header wholesale,
    /// rebasing `other`'s entry offsets by this buffer's current length.
    /// Used to concatenate per-shard buffers into the final render output
    /// in shard order (§5).
    pub fn append(&mut self, other: &Self) -> Result<(), BufferError> {
        self.reserve_page_for(other.bytes.len())?;
        let base = self.bytes.len() as u32;
        self.bytes.extend_from_slice(&other.bytes);
        self.entries.extend(other.entries.iter().map(|e| Entry {
            iz: e.iz,
            offset: e.offset + base,
            len: e.len,
        }));
        self.header.append(&other.header);
        Ok(())
    }

    /// Reads back the record at `entry` as `T`. Panics (a contract
    /// violation, not a recoverable error) if `entry` doesn't describe a
    /// valid `T`-sized span — entries are only ever produced by
    /// [`Self::push`], so mismatches indicate caller error (§7).
    #[must_use]
    pub fn read<T: Pod>(&self, entry: Entry) -> T {
        let start = entry.offset as usize;
        let end = start + entry.len as usize;
        *bytemuck::from_bytes(&self.bytes[start..end])
    }
}
