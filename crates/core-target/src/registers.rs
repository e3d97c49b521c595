//! The Register Reader (§4.3): decides whether to decode registers through
//! the architecture descriptor's own iterator or fall back to a legacy
//! per-container-flavour handler, and supplies whatever it reads into the
//! register cache. Mirrors the fallback-chain idiom in
//! `crates/kernel/src/drivers/watchdog.rs`'s `init()`: try the preferred
//! path first, fall back to a named default, and make "neither path
//! available" an explicit, loggable branch rather than a panic.

use crate::arch::ArchitectureDescriptor;
use crate::classify::effective_section_name;
use crate::collab::{RegisterCache, RegisterStatus};
use crate::container::CoreContainer;
use crate::error::CoreError;
use crate::model::{CoreHandler, LegacyDecodeFn, RegisterDiscriminator, RegisterSet, RegisterSetFlags};

/// What happened when attempting to read and decode one named register
/// section. Exposed (rather than folded into a single bool) so callers and
/// tests can distinguish "optional and absent" from "present but
/// malformed" without scraping log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionReadOutcome {
    Supplied,
    SuppliedWithSizeMismatch,
    MissingOptional,
    MissingRequired,
    TooSmall,
    ReadFailed,
}

enum Decoder<'a> {
    RegisterSet(&'a dyn RegisterSet, RegisterDiscriminator),
    Legacy(LegacyDecodeFn, u32),
}

fn read_section(
    container: &dyn CoreContainer,
    cache: &mut dyn RegisterCache,
    lwp: u32,
    base_name: &str,
    minimum_size: usize,
    variable_size: bool,
    required: bool,
    decoder: Decoder<'_>,
) -> SectionReadOutcome {
    let effective = effective_section_name(base_name, lwp);

    let Some(section) = container.sections().iter().find(|s| s.name == effective) else {
        if required {
            let err = CoreError::SectionMissing(effective.clone());
            tracing::warn!(error = %err, "could not find register section in core file");
            return SectionReadOutcome::MissingRequired;
        }
        return SectionReadOutcome::MissingOptional;
    };

    if (section.size as usize) < minimum_size {
        let err = CoreError::SectionTooSmall { name: effective.clone() };
        tracing::warn!(error = %err);
        return SectionReadOutcome::TooSmall;
    }

    let size_mismatch = section.size as usize != minimum_size && minimum_size != 0 && !variable_size;
    if size_mismatch {
        let err = CoreError::UnexpectedSectionSize { name: effective.clone() };
        tracing::warn!(error = %err);
    }

    let mut bytes = vec![0u8; section.size as usize];
    match container.read_at(section.file_offset, &mut bytes) {
        Ok(n) if n == bytes.len() => {}
        Ok(_) => {
            let err = CoreError::SectionReadFailed {
                name: effective.clone(),
                source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read"),
            };
            tracing::warn!(error = %err, "couldn't read register section from core file");
            return SectionReadOutcome::ReadFailed;
        }
        Err(source) => {
            let err = CoreError::SectionReadFailed { name: effective.clone(), source };
            tracing::warn!(error = %err, "couldn't read register section from core file");
            return SectionReadOutcome::ReadFailed;
        }
    }

    let result = match decoder {
        Decoder::RegisterSet(rs, discriminator) => rs.supply(cache, discriminator, &bytes),
        Decoder::Legacy(f, discriminator) => {
            f(cache, &bytes, bytes.len(), discriminator, section.vma)
        }
    };

    match result {
        Ok(()) if size_mismatch => SectionReadOutcome::SuppliedWithSizeMismatch,
        Ok(()) => SectionReadOutcome::Supplied,
        Err(err) => {
            tracing::warn!(section = %effective, error = %err, "register-set supply failed");
            SectionReadOutcome::ReadFailed
        }
    }
}

/// Fetch every register this target knows how to decode for the thread
/// with LWP `current_lwp`, in the order described by §4.3:
///
/// 1. architecture iterator, if present (legacy handler is never consulted
///    when this path is taken — invariant 8);
/// 2. else the legacy handler's `.reg`/`.reg2` pair, if one was chosen at
///    `open`;
/// 3. else "cannot fetch registers from this core", logged and returned.
///
/// Afterwards every register the cache still marks `Unknown` is flipped to
/// `Unavailable`.
pub fn fetch_all(
    container: &dyn CoreContainer,
    arch: &dyn ArchitectureDescriptor,
    legacy_handler: Option<&CoreHandler>,
    cache: &mut dyn RegisterCache,
    current_lwp: u32,
) -> Vec<SectionReadOutcome> {
    let mut outcomes = Vec::new();

    if let Some(iterator) = arch.register_section_iterator() {
        for spec in iterator.register_sets() {
            let variable = spec.register_set.flags().contains(RegisterSetFlags::VARIABLE_SIZE);
            let outcome = read_section(
                container,
                cache,
                current_lwp,
                spec.section_name,
                spec.register_set.minimum_size(),
                variable,
                spec.required,
                Decoder::RegisterSet(spec.register_set, spec.discriminator),
            );
            outcomes.push(outcome);
        }
    } else if let Some(handler) = legacy_handler {
        outcomes.push(read_section(
            container,
            cache,
            current_lwp,
            ".reg",
            0,
            true,
            true,
            Decoder::Legacy(handler.decode_registers, 0),
        ));
        outcomes.push(read_section(
            container,
            cache,
            current_lwp,
            ".reg2",
            0,
            true,
            false,
            Decoder::Legacy(handler.decode_registers, 2),
        ));
    } else {
        tracing::warn!("cannot fetch registers from this core");
        return outcomes;
    }

    for index in cache.known_register_indices() {
        if cache.status(index) == RegisterStatus::Unknown {
            cache.mark_unavailable(index);
        }
    }

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::{LegacyOnlyArch, RegisterSectionIterator, RegisterSetSpec};
    use crate::collab::doubles::RecordingRegisterCache;
    use crate::container::InMemoryCoreContainer;
    use crate::error::CoreError;
    use crate::model::{RegisterSetFlags, SectionFlags};
    use std::cell::RefCell;
    use std::rc::Rc;

    /// A container whose sections are real but whose reads always fail, to
    /// exercise the `SectionReadFailed`-reporting branch of `read_section`.
    struct FailingReads(InMemoryCoreContainer);
    impl CoreContainer for FailingReads {
        fn sections(&self) -> &[crate::model::SectionRecord] {
            self.0.sections()
        }
        fn endianness(&self) -> crate::container::Endianness {
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
    fn genuine_read_failure_reports_read_failed() {
        let mut container = InMemoryCoreContainer::builder();
        container.push_section(".reg", 0, &[0u8; 64], SectionFlags::empty());
        let container = FailingReads(container.build());

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cache = RecordingRegisterCache::new(log, vec![0]);
        let arch = LegacyOnlyArch;
        let handler = legacy_handler();

        let outcomes = fetch_all(&container, &arch, Some(&handler), &mut cache, 0);
        assert_eq!(outcomes[0], SectionReadOutcome::ReadFailed);
    }

    fn legacy_decode(
        cache: &mut dyn RegisterCache,
        _bytes: &[u8],
        _size: usize,
        discriminator: u32,
        _vma: u64,
    ) -> Result<(), CoreError> {
        cache.supply(RegisterDiscriminator::Legacy(discriminator), &[]);
        Ok(())
    }

    fn legacy_handler() -> CoreHandler {
        CoreHandler {
            flavour: "elf",
            sniff: |_| true,
            check_format: |_| true,
            decode_registers: legacy_decode,
        }
    }

    #[test]
    fn s1_single_threaded_native_core_fetches_gp_and_leaves_fp_unavailable() {
        let mut container = InMemoryCoreContainer::builder();
        container.push_section(".reg", 0, &[0u8; 64], SectionFlags::empty());
        let container = container.build();

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cache = RecordingRegisterCache::new(log, vec![0, 1, 2]);
        let arch = LegacyOnlyArch;
        let handler = legacy_handler();

        let outcomes = fetch_all(&container, &arch, Some(&handler), &mut cache, 0);
        assert_eq!(outcomes[0], SectionReadOutcome::Supplied);
        assert_eq!(outcomes[1], SectionReadOutcome::MissingOptional);
    }

    #[test]
    fn s5_undersized_fp_section_warns_but_still_fetches_gp() {
        let mut container = InMemoryCoreContainer::builder();
        container.push_section(".reg", 0, &[0u8; 64], SectionFlags::empty());
        container.push_section(".reg2", 0, &[0u8; 4], SectionFlags::empty());
        let container = container.build();

        struct HalfSizeSet;
        impl RegisterSet for HalfSizeSet {
            fn flags(&self) -> RegisterSetFlags {
                RegisterSetFlags::empty()
            }
            fn minimum_size(&self) -> usize {
                8
            }
            fn supply(
                &self,
                cache: &mut dyn RegisterCache,
                disc: RegisterDiscriminator,
                bytes: &[u8],
            ) -> Result<(), CoreError> {
                cache.supply(disc, bytes);
                Ok(())
            }
        }

        // Legacy path doesn't carry a declared minimum size, so exercise
        // the too-small branch through a register-set-bearing architecture
        // instead (still the same `read_section` code path).
        struct OneSet(HalfSizeSet);
        impl RegisterSectionIterator for OneSet {
            fn register_sets(&self) -> Vec<RegisterSetSpec<'_>> {
                vec![RegisterSetSpec {
                    section_name: ".reg2",
                    register_set: &self.0,
                    discriminator: RegisterDiscriminator::All,
                    required: false,
                    human_name: "floating-point",
                }]
            }
        }
        struct ArchWithIterator(OneSet);
        impl ArchitectureDescriptor for ArchWithIterator {
            fn register_section_iterator(&self) -> Option<&dyn RegisterSectionIterator> {
                Some(&self.0)
            }
            fn signal_from_target(&self, _raw: i32) -> Option<i32> {
                None
            }
            fn shared_library_extractor(&self) -> Option<&dyn crate::arch::ObjectExtractor> {
                None
            }
            fn aix_library_extractor(&self) -> Option<&dyn crate::arch::ObjectExtractor> {
                None
            }
        }

        let arch = ArchWithIterator(OneSet(HalfSizeSet));
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cache = RecordingRegisterCache::new(log, vec![0]);
        let outcomes = fetch_all(&container, &arch, None, &mut cache, 0);
        assert_eq!(outcomes, vec![SectionReadOutcome::TooSmall]);
    }

    #[test]
    fn no_decode_path_available_reports_and_does_not_panic() {
        let container = InMemoryCoreContainer::builder().build();
        let arch = LegacyOnlyArch;
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cache = RecordingRegisterCache::new(log, vec![0]);
        let outcomes = fetch_all(&container, &arch, None, &mut cache, 0);
        assert!(outcomes.is_empty());
    }

    #[test]
    fn current_lwp_selects_per_thread_section() {
        let mut container = InMemoryCoreContainer::builder();
        container.push_section(".reg/18", 0, &[1u8; 8], SectionFlags::empty());
        let container = container.build();

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut cache = RecordingRegisterCache::new(log, vec![0]);
        let handler = legacy_handler();
        let arch = LegacyOnlyArch;
        let outcomes = fetch_all(&container, &arch, Some(&handler), &mut cache, 18);
        assert_eq!(outcomes[0], SectionReadOutcome::Supplied);
    }
}
