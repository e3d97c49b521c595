//! Core data model: thread/inferior identity, section records, register-set
//! contracts, and the handler/transfer-kind enumerations that tie the rest
//! of the crate together.

use bitflags::bitflags;
use std::fmt;

/// `(process-id, lwp-id, extra)`. `extra` is unused here but kept so the
/// triple lines up with the wider debugger's notion of a thread identity.
/// LWP zero means "no thread discriminator" (single-threaded core).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThreadId {
    pub pid: u32,
    pub lwp: u32,
    pub extra: u32,
}

impl ThreadId {
    pub fn new(pid: u32, lwp: u32) -> Self {
        Self { pid, lwp, extra: 0 }
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lwp == 0 {
            write!(f, "{}", self.pid)
        } else {
            write!(f, "{}.{}", self.pid, self.lwp)
        }
    }
}

/// The synthetic pid used when the container carries no process id at all.
pub const SYNTHETIC_PID: u32 = 1;

/// A process-like record the debugger attaches threads to. Exactly one is
/// created per [`crate::session::CoreSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inferior {
    pub pid: u32,
    /// Set when the container reported no pid and [`SYNTHETIC_PID`] was
    /// substituted.
    pub fake_pid: bool,
}

bitflags! {
    /// Flags carried on a [`SectionRecord`]. `LOAD` marks a section the
    /// container parser's standard segment walk considers part of the
    /// process image (the `Memory` role of `SectionRole`); the others are
    /// informational.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SectionFlags: u32 {
        const LOAD     = 0b0000_0001;
        const READONLY = 0b0000_0010;
        const CODE     = 0b0000_0100;
    }
}

/// A flat, value-typed copy of one section's metadata, as it would be
/// reported by the container parser. Owned by the session's section table;
/// never a back-reference into the container itself (see DESIGN.md on
/// avoiding aliasing section data with the shared-object resolver).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRecord {
    pub name: String,
    pub vma: u64,
    pub size: u64,
    pub file_offset: u64,
    pub flags: SectionFlags,
}

impl SectionRecord {
    pub fn contains_vma(&self, addr: u64) -> bool {
        addr >= self.vma && addr < self.vma.saturating_add(self.size)
    }
}

bitflags! {
    /// Flags an architecture-declared [`RegisterSet`] carries. The only
    /// flag the register reader consults is `VARIABLE_SIZE`: without it, a
    /// section whose size differs from the set's declared minimum is a
    /// warning, not silently accepted.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RegisterSetFlags: u32 {
        const VARIABLE_SIZE = 0b0000_0001;
    }
}

/// How a decoded section's bytes are addressed when handed to the register
/// cache. `All` is used whenever a [`RegisterSet`] is available (the
/// architecture always supplies everything it is given); `Legacy` carries
/// the numeric discriminator a `CoreHandler::decode_registers` function
/// expects (`0` for general-purpose, `2` for floating-point, by
/// convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterDiscriminator {
    All,
    Legacy(u32),
}

/// An architecture-described contract for decoding one register section's
/// raw bytes into the register cache.
pub trait RegisterSet: Send + Sync {
    fn flags(&self) -> RegisterSetFlags;

    /// Minimum accepted size in bytes; sections smaller than this are
    /// rejected outright (`SectionTooSmall`).
    fn minimum_size(&self) -> usize;

    /// Supply `bytes` (the whole section's contents) into `cache`.
    fn supply(
        &self,
        cache: &mut dyn crate::collab::RegisterCache,
        discriminator: RegisterDiscriminator,
        bytes: &[u8],
    ) -> Result<(), crate::error::CoreError>;
}

/// Legacy per-container-flavour register decoder, the fallback used when
/// the architecture descriptor has no register-section iterator of its own.
pub type LegacyDecodeFn = fn(
    cache: &mut dyn crate::collab::RegisterCache,
    bytes: &[u8],
    size: usize,
    discriminator: u32,
    section_vma: u64,
) -> Result<(), crate::error::CoreError>;

/// A registration describing one core container variant. Immutable after
/// registration; the [`crate::registry::HandlerRegistry`] never mutates a
/// `CoreHandler` once added.
#[derive(Clone, Copy)]
pub struct CoreHandler {
    pub flavour: &'static str,
    pub sniff: fn(&dyn crate::container::CoreContainer) -> bool,
    pub check_format: fn(&dyn crate::container::CoreContainer) -> bool,
    pub decode_registers: LegacyDecodeFn,
}

impl fmt::Debug for CoreHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreHandler").field("flavour", &self.flavour).finish()
    }
}

/// The closed enumeration of transferable artefacts the partial-transfer
/// router understands. Anything not named here is forwarded to the
/// underlying target (`Other`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
    Memory,
    Aux,
    StackCookie,
    Libraries,
    LibrariesAix,
    Spu,
    SignalInfo,
    Other(String),
}
