//! The Partial-Transfer Router (§4.6): the single `xfer` entry point that
//! multiplexes reads by object kind across the Memory Service, a handful of
//! fixed section names, the architecture's library extractors, and the SPU
//! id enumeration. Writes are never serviced here; every kind either
//! rejects them outright or (for `Other`) delegates to the underlying
//! target, which this crate does not model.

use crate::arch::{ArchitectureDescriptor, ObjectExtractor};
use crate::classify::{classify, spu_section_name, SectionRole};
use crate::container::{CoreContainer, Endianness};
use crate::error::CoreError;
use crate::memory::{self, MemoryReadOutcome};
use crate::model::{ObjectKind, SectionRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XferOutcome {
    Ok(Vec<u8>),
    Eof,
    IoError,
    /// Not handled here; the underlying target (out of scope) must service
    /// this request.
    Delegated,
}

/// `current_lwp` is the LWP of the session's current thread (`0` for a
/// single-threaded core), the same value `registers::fetch_all` takes — it
/// is only consulted for `SignalInfo`, to pick between the default
/// `.note.linuxcore.siginfo` section and its per-thread `/<lwp>` variant.
pub fn xfer(
    container: &dyn CoreContainer,
    sections: &[SectionRecord],
    architecture: &dyn ArchitectureDescriptor,
    kind: &ObjectKind,
    annex: Option<&str>,
    offset: u64,
    length: u64,
    current_lwp: u32,
) -> XferOutcome {
    match kind {
        ObjectKind::Memory => match memory::read(container, sections, offset, length) {
            MemoryReadOutcome::Read { bytes } => XferOutcome::Ok(bytes),
            MemoryReadOutcome::NotMapped => XferOutcome::Eof,
        },
        ObjectKind::Aux => clipped_section_read(container, sections, ".auxv", offset, length),
        ObjectKind::StackCookie => clipped_section_read(container, sections, ".wcookie", offset, length),
        ObjectKind::Libraries => match architecture.shared_library_extractor() {
            Some(extractor) => extractor_read(extractor, offset, length),
            None => xfer(
                container,
                sections,
                architecture,
                &ObjectKind::LibrariesAix,
                annex,
                offset,
                length,
                current_lwp,
            ),
        },
        ObjectKind::LibrariesAix => match architecture.aix_library_extractor() {
            Some(extractor) => extractor_read(extractor, offset, length),
            None => XferOutcome::Delegated,
        },
        ObjectKind::Spu => match annex {
            Some(a) => clipped_section_read(container, sections, &spu_section_name(a), offset, length),
            None => spu_enumeration_read(container, sections, offset, length),
        },
        ObjectKind::SignalInfo => {
            exact_section_read(container, sections, &signal_info_section_name(current_lwp), offset, length)
        }
        ObjectKind::Other(_) => XferOutcome::Delegated,
    }
}

fn find<'a>(sections: &'a [SectionRecord], name: &str) -> Option<&'a SectionRecord> {
    sections.iter().find(|s| s.name == name)
}

/// A read clipped to `[offset, offset+length)` within a named section.
/// Never returns `Ok` with an empty buffer — per the invariant, that's
/// always `Eof` instead.
fn clipped_section_read(
    container: &dyn CoreContainer,
    sections: &[SectionRecord],
    name: &str,
    offset: u64,
    length: u64,
) -> XferOutcome {
    let Some(section) = find(sections, name) else {
        return XferOutcome::Eof;
    };
    if offset >= section.size {
        return XferOutcome::Eof;
    }
    let available = section.size - offset;
    let want = length.min(available) as usize;
    if want == 0 {
        return XferOutcome::Eof;
    }

    let mut buf = vec![0u8; want];
    match container.read_at(section.file_offset + offset, &mut buf) {
        Ok(0) => XferOutcome::Eof,
        Ok(n) => {
            buf.truncate(n);
            XferOutcome::Ok(buf)
        }
        Err(source) => {
            let err = CoreError::TransferIoError { object: name.to_string(), source };
            tracing::warn!(error = %err, "couldn't read section from core file");
            XferOutcome::IoError
        }
    }
}

/// An exact-length read with no clipping: anything short of `length` bytes
/// — a missing section, an out-of-range offset, or a short underlying read
/// — is `IoError`.
fn exact_section_read(
    container: &dyn CoreContainer,
    sections: &[SectionRecord],
    name: &str,
    offset: u64,
    length: u64,
) -> XferOutcome {
    let Some(section) = find(sections, name) else {
        return XferOutcome::IoError;
    };
    if offset.saturating_add(length) > section.size {
        return XferOutcome::IoError;
    }
    let mut buf = vec![0u8; length as usize];
    match container.read_at(section.file_offset + offset, &mut buf) {
        Ok(n) if n as u64 == length => XferOutcome::Ok(buf),
        Ok(_) => XferOutcome::IoError,
        Err(source) => {
            let err = CoreError::TransferIoError { object: name.to_string(), source };
            tracing::warn!(error = %err, "couldn't read section from core file");
            XferOutcome::IoError
        }
    }
}

fn extractor_read(extractor: &dyn ObjectExtractor, offset: u64, length: u64) -> XferOutcome {
    match extractor.extract(offset, length) {
        Some(bytes) if !bytes.is_empty() => XferOutcome::Ok(bytes),
        Some(_) => XferOutcome::Eof,
        None => XferOutcome::IoError,
    }
}

fn signal_info_section_name(current_lwp: u32) -> String {
    if current_lwp != 0 {
        format!(".note.linuxcore.siginfo/{current_lwp}")
    } else {
        ".note.linuxcore.siginfo".to_string()
    }
}

/// Enumerates every `SPU/<id>/regs` section in ascending `<id>` order and
/// emits each id as a 4-byte integer in the container's byte order,
/// concatenated into one stream, then clips that stream to
/// `[offset, offset+length)` on 4-byte boundaries — a partial element is
/// never emitted.
fn spu_enumeration_read(container: &dyn CoreContainer, sections: &[SectionRecord], offset: u64, length: u64) -> XferOutcome {
    let mut ids: Vec<u32> = sections
        .iter()
        .filter_map(|s| match classify(&s.name) {
            SectionRole::SpuRegs { id } => Some(id),
            _ => None,
        })
        .collect();
    ids.sort_unstable();

    let big_endian = matches!(container.endianness(), Endianness::Big);
    let mut stream = Vec::with_capacity(ids.len() * 4);
    for id in ids {
        let bytes = if big_endian { id.to_be_bytes() } else { id.to_le_bytes() };
        stream.extend_from_slice(&bytes);
    }

    let total = stream.len() as u64;
    if offset >= total {
        return XferOutcome::Eof;
    }
    let available = total - offset;
    let mut want = length.min(available);
    want -= want % 4;
    if want == 0 {
        return XferOutcome::Eof;
    }

    let start = offset as usize;
    let end = start + want as usize;
    XferOutcome::Ok(stream[start..end].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::LegacyOnlyArch;
    use crate::container::InMemoryCoreContainer;
    use crate::model::SectionFlags;

    /// A section table with one entry over a container whose reads always
    /// fail, used to exercise the `TransferIoError`-reporting branch no
    /// in-memory container can otherwise reach.
    struct FailingReads(InMemoryCoreContainer);
    impl CoreContainer for FailingReads {
        fn sections(&self) -> &[SectionRecord] {
            self.0.sections()
        }
        fn endianness(&self) -> Endianness {
            self.0.endianness()
        }
        fn accepted_as_core(&self) -> bool {
            self.0.accepted_as_core()
        }
        fn failing_command(&self) -> Option<&str> {
            self.0.failing_command()
        }
        fn failing_signal(&self) -> i32 {
            self.0.failing_signal()
        }
        fn originating_pid(&self) -> Option<u32> {
            self.0.originating_pid()
        }
        fn read_at(&self, _offset: u64, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk gremlins"))
        }
    }

    #[test]
    fn clipped_read_reports_transfer_io_error_on_a_genuine_read_failure() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section(".auxv", 0, b"some bytes", SectionFlags::empty());
        let container = FailingReads(builder.build());
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;

        let got = xfer(&container, &sections, &arch, &ObjectKind::Aux, None, 0, 4, 0);
        assert_eq!(got, XferOutcome::IoError);
    }

    #[test]
    fn exact_read_reports_transfer_io_error_on_a_genuine_read_failure() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section(".note.linuxcore.siginfo", 0, &[0u8; 10], SectionFlags::empty());
        let container = FailingReads(builder.build());
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;

        let got = xfer(&container, &sections, &arch, &ObjectKind::SignalInfo, None, 0, 10, 0);
        assert_eq!(got, XferOutcome::IoError);
    }

    #[test]
    fn invariant_5_memory_xfer_matches_section_bytes() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section(".text", 0x1000, b"abcdefgh", SectionFlags::LOAD);
        let container = builder.build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;

        let got = xfer(&container, &sections, &arch, &ObjectKind::Memory, None, 0x1002, 3, 0);
        assert_eq!(got, XferOutcome::Ok(b"cde".to_vec()));
    }

    #[test]
    fn invariant_5_disjoint_memory_is_eof() {
        let container = InMemoryCoreContainer::builder().build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;
        let got = xfer(&container, &sections, &arch, &ObjectKind::Memory, None, 0x9000, 4, 0);
        assert_eq!(got, XferOutcome::Eof);
    }

    #[test]
    fn s6_spu_enumeration_matches_ascending_ids() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section("SPU/3/regs", 0, &[], SectionFlags::empty());
        builder.push_section("SPU/7/regs", 0, &[], SectionFlags::empty());
        builder.push_section("SPU/3/mem", 0, &[0u8; 4], SectionFlags::empty());
        let container = builder.build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;

        let got = xfer(&container, &sections, &arch, &ObjectKind::Spu, None, 0, 8, 0);
        let mut expected = Vec::new();
        expected.extend_from_slice(&3u32.to_le_bytes());
        expected.extend_from_slice(&7u32.to_le_bytes());
        assert_eq!(got, XferOutcome::Ok(expected));
    }

    #[test]
    fn spu_annex_reads_the_named_context_section() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section("SPU/mem", 0, b"contextbytes", SectionFlags::empty());
        let container = builder.build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;

        let got = xfer(&container, &sections, &arch, &ObjectKind::Spu, Some("mem"), 0, 7, 0);
        assert_eq!(got, XferOutcome::Ok(b"context".to_vec()));
    }

    #[test]
    fn invariant_6_zero_byte_aux_read_is_eof_not_ok() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section(".auxv", 0, b"", SectionFlags::empty());
        let container = builder.build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;

        let got = xfer(&container, &sections, &arch, &ObjectKind::Aux, None, 0, 16, 0);
        assert_eq!(got, XferOutcome::Eof);
    }

    #[test]
    fn signal_info_is_exact_length_with_no_clipping() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section(".note.linuxcore.siginfo", 0, &[9u8; 10], SectionFlags::empty());
        let container = builder.build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;

        let got = xfer(&container, &sections, &arch, &ObjectKind::SignalInfo, None, 0, 20, 0);
        assert_eq!(got, XferOutcome::IoError);

        let got = xfer(&container, &sections, &arch, &ObjectKind::SignalInfo, None, 0, 10, 0);
        assert_eq!(got, XferOutcome::Ok(vec![9u8; 10]));
    }

    #[test]
    fn signal_info_prefers_the_per_thread_section_for_the_current_lwp() {
        let mut builder = InMemoryCoreContainer::builder();
        builder.push_section(".note.linuxcore.siginfo", 0, &[1u8; 4], SectionFlags::empty());
        builder.push_section(".note.linuxcore.siginfo/18", 0, &[2u8; 4], SectionFlags::empty());
        let container = builder.build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;

        let got = xfer(&container, &sections, &arch, &ObjectKind::SignalInfo, None, 0, 4, 18);
        assert_eq!(got, XferOutcome::Ok(vec![2u8; 4]));

        let got = xfer(&container, &sections, &arch, &ObjectKind::SignalInfo, None, 0, 4, 0);
        assert_eq!(got, XferOutcome::Ok(vec![1u8; 4]));
    }

    #[test]
    fn unlisted_object_kind_is_delegated() {
        let container = InMemoryCoreContainer::builder().build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;
        let got = xfer(&container, &sections, &arch, &ObjectKind::Other("vfs".into()), None, 0, 4, 0);
        assert_eq!(got, XferOutcome::Delegated);
    }

    #[test]
    fn libraries_falls_through_to_aix_then_delegates() {
        let container = InMemoryCoreContainer::builder().build();
        let sections = container.sections().to_vec();
        let arch = LegacyOnlyArch;
        let got = xfer(&container, &sections, &arch, &ObjectKind::Libraries, None, 0, 4, 0);
        assert_eq!(got, XferOutcome::Delegated);
    }
}
