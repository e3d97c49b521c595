//! The container-parser collaborator (the BFD-equivalent). Out of scope per
//! the specification: this module only defines the interface the rest of
//! the crate consumes, plus an in-memory test double used throughout the
//! unit tests and by `SessionManager` integration tests.

use crate::model::SectionRecord;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// Supplies an iterator of named sections plus whole-file metadata. A real
/// implementation would wrap something like a BFD or `object`/`goblin`
/// parse; this crate only consumes the trait.
pub trait CoreContainer: Send + Sync {
    /// All sections the parser found, in file order.
    fn sections(&self) -> &[SectionRecord];

    fn endianness(&self) -> Endianness;

    /// True if the generic parser itself recognized this as a core file
    /// (independent of any registered handler's `check_format`).
    fn accepted_as_core(&self) -> bool;

    /// The command that produced the core, if the container recorded one.
    fn failing_command(&self) -> Option<&str>;

    /// The terminating signal number, or a non-positive value if unknown.
    fn failing_signal(&self) -> i32;

    /// The originating process id, or `None` if the container carries none.
    fn originating_pid(&self) -> Option<u32>;

    /// Read `buf.len()` bytes starting at `file_offset`, returning the
    /// number of bytes actually read (short reads are valid and expected
    /// at end-of-file, matching the partial-transfer convention).
    fn read_at(&self, file_offset: u64, buf: &mut [u8]) -> io::Result<usize>;
}

/// A fully in-memory `CoreContainer`, built directly from a byte buffer and
/// a section list. Used by tests in place of a real ELF/core parser, which
/// is explicitly out of scope here.
pub struct InMemoryCoreContainer {
    bytes: Vec<u8>,
    sections: Vec<SectionRecord>,
    endianness: Endianness,
    accepted_as_core: bool,
    failing_command: Option<String>,
    failing_signal: i32,
    pid: Option<u32>,
}

impl InMemoryCoreContainer {
    pub fn builder() -> InMemoryCoreContainerBuilder {
        InMemoryCoreContainerBuilder::default()
    }
}

impl CoreContainer for InMemoryCoreContainer {
    fn sections(&self) -> &[SectionRecord] {
        &self.sections
    }

    fn endianness(&self) -> Endianness {
        self.endianness
    }

    fn accepted_as_core(&self) -> bool {
        self.accepted_as_core
    }

    fn failing_command(&self) -> Option<&str> {
        self.failing_command.as_deref()
    }

    fn failing_signal(&self) -> i32 {
        self.failing_signal
    }

    fn originating_pid(&self) -> Option<u32> {
        self.pid
    }

    fn read_at(&self, file_offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let offset = file_offset as usize;
        if offset >= self.bytes.len() {
            return Ok(0);
        }
        let available = &self.bytes[offset..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        Ok(n)
    }
}

#[derive(Default)]
pub struct InMemoryCoreContainerBuilder {
    bytes: Vec<u8>,
    sections: Vec<SectionRecord>,
    endianness: Option<Endianness>,
    accepted_as_core: bool,
    failing_command: Option<String>,
    failing_signal: i32,
    pid: Option<u32>,
}

impl InMemoryCoreContainerBuilder {
    /// Appends `data` to the backing byte buffer and registers a section
    /// describing it at the offset it was written to. Returns the offset.
    pub fn push_section(
        &mut self,
        name: impl Into<String>,
        vma: u64,
        data: &[u8],
        flags: crate::model::SectionFlags,
    ) -> &mut Self {
        let file_offset = self.bytes.len() as u64;
        self.bytes.extend_from_slice(data);
        self.sections.push(SectionRecord {
            name: name.into(),
            vma,
            size: data.len() as u64,
            file_offset,
            flags,
        });
        self
    }

    pub fn endianness(&mut self, e: Endianness) -> &mut Self {
        self.endianness = Some(e);
        self
    }

    pub fn accepted_as_core(&mut self, v: bool) -> &mut Self {
        self.accepted_as_core = v;
        self
    }

    pub fn failing_command(&mut self, v: impl Into<String>) -> &mut Self {
        self.failing_command = Some(v.into());
        self
    }

    pub fn failing_signal(&mut self, v: i32) -> &mut Self {
        self.failing_signal = v;
        self
    }

    pub fn pid(&mut self, v: u32) -> &mut Self {
        self.pid = Some(v);
        self
    }

    pub fn build(&mut self) -> InMemoryCoreContainer {
        InMemoryCoreContainer {
            bytes: std::mem::take(&mut self.bytes),
            sections: std::mem::take(&mut self.sections),
            endianness: self.endianness.unwrap_or(Endianness::Little),
            accepted_as_core: self.accepted_as_core,
            failing_command: self.failing_command.take(),
            failing_signal: self.failing_signal,
            pid: self.pid,
        }
    }
}
