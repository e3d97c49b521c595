//! The Memory Service (§4.4): serves inferior-memory reads by walking the
//! session's section table for whatever `LOAD` sections overlap the
//! requested range, clipping at both ends. Writes are unconditionally
//! rejected — a core file is a read-only snapshot.

use crate::container::CoreContainer;
use crate::model::{SectionFlags, SectionRecord};

/// The outcome of one `read` call. Mirrors the partial-transfer convention
/// used throughout this backend: a read that touches no mapped memory at
/// all is `NotMapped`, never an all-zero buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryReadOutcome {
    /// `len(bytes) <= requested_length`; short when the mapped region ends
    /// before `vma + requested_length`.
    Read { bytes: Vec<u8> },
    NotMapped,
}

/// Find the `LOAD` section covering `vma`, if any. Sections are assumed
/// non-overlapping; the first match wins.
fn find_load_section(sections: &[SectionRecord], vma: u64) -> Option<&SectionRecord> {
    sections
        .iter()
        .filter(|s| s.flags.contains(SectionFlags::LOAD))
        .find(|s| s.contains_vma(vma))
}

/// Read up to `length` bytes of inferior memory starting at `vma`.
///
/// Only the single section covering `vma` itself is consulted — a request
/// that starts in mapped memory and runs past the end of that section is
/// clipped to the section's end rather than stitched across sections, the
/// same short-read contract `xfer` exposes to its caller.
pub fn read(container: &dyn CoreContainer, sections: &[SectionRecord], vma: u64, length: u64) -> MemoryReadOutcome {
    let Some(section) = find_load_section(sections, vma) else {
        return MemoryReadOutcome::NotMapped;
    };

    let section_end = section.vma.saturating_add(section.size);
    let available = section_end.saturating_sub(vma);
    let clipped_len = length.min(available) as usize;
    if clipped_len == 0 {
        return MemoryReadOutcome::NotMapped;
    }

    let offset_within_section = vma - section.vma;
    let file_offset = section.file_offset + offset_within_section;

    let mut buf = vec![0u8; clipped_len];
    let n = container.read_at(file_offset, &mut buf).unwrap_or(0);
    buf.truncate(n);
    if buf.is_empty() {
        MemoryReadOutcome::NotMapped
    } else {
        MemoryReadOutcome::Read { bytes: buf }
    }
}

/// Writes are never serviced by a core file.
pub fn write_is_supported() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::InMemoryCoreContainer;

    fn loaded(name: &str, vma: u64, data: &[u8]) -> (InMemoryCoreContainer, Vec<SectionRecord>) {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section(name, vma, data, SectionFlags::LOAD);
        let container = builder.build();
        let sections = container.sections().to_vec();
        (container, sections)
    }

    #[test]
    fn reads_within_a_single_mapped_section() {
        let (container, sections) = loaded(".text", 0x1000, b"hello world");
        let outcome = read(&container, &sections, 0x1000, 5);
        assert_eq!(outcome, MemoryReadOutcome::Read { bytes: b"hello".to_vec() });
    }

    #[test]
    fn reads_with_nonzero_offset_into_section() {
        let (container, sections) = loaded(".text", 0x1000, b"hello world");
        let outcome = read(&container, &sections, 0x1006, 5);
        assert_eq!(outcome, MemoryReadOutcome::Read { bytes: b"world".to_vec() });
    }

    #[test]
    fn clips_a_request_that_runs_past_the_section_end() {
        let (container, sections) = loaded(".text", 0x1000, b"hello");
        let outcome = read(&container, &sections, 0x1000, 100);
        assert_eq!(outcome, MemoryReadOutcome::Read { bytes: b"hello".to_vec() });
    }

    #[test]
    fn vma_outside_any_load_section_is_not_mapped() {
        let (container, sections) = loaded(".text", 0x1000, b"hello");
        assert_eq!(read(&container, &sections, 0x2000, 4), MemoryReadOutcome::NotMapped);
    }

    #[test]
    fn non_load_sections_are_never_consulted_for_memory() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section(".auxv", 0x1000, b"not memory", SectionFlags::empty());
        let container = builder.build();
        let sections = container.sections().to_vec();
        assert_eq!(read(&container, &sections, 0x1000, 4), MemoryReadOutcome::NotMapped);
    }

    #[test]
    fn zero_length_request_at_a_valid_vma_is_not_mapped() {
        let (container, sections) = loaded(".text", 0x1000, b"hello");
        assert_eq!(read(&container, &sections, 0x1000, 0), MemoryReadOutcome::NotMapped);
    }

    #[test]
    fn write_is_never_supported() {
        assert!(!write_is_supported());
    }
}
