//! The architecture-descriptor collaborator: owns CPU-specific
//! register-layout and signal-number translation. Out of scope per the
//! specification; this module defines the interface and a couple of
//! minimal test doubles exercising both branches of the register-reader
//! fallback chain (§4.3).

use crate::model::{RegisterDiscriminator, RegisterSet, ThreadId};

/// One register set the architecture wants decoded from a named section,
/// as reported by [`RegisterSectionIterator`].
pub struct RegisterSetSpec<'a> {
    pub section_name: &'static str,
    pub register_set: &'a dyn RegisterSet,
    pub discriminator: RegisterDiscriminator,
    pub required: bool,
    pub human_name: &'static str,
}

/// Supplied by an architecture descriptor that knows how to decode its own
/// register sections directly, superseding any legacy per-container-flavour
/// handler (§4.1: "the architecture supersedes legacy handlers").
pub trait RegisterSectionIterator: Send + Sync {
    fn register_sets(&self) -> Vec<RegisterSetSpec<'_>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoProcRequest {
    Mappings,
    Status,
    All,
}

/// The architecture-specific strategy consulted throughout this backend:
/// register decoding, signal-number translation, shared-library/AIX
/// extraction, and the handful of formatting hooks exposed to the target
/// stack (§4.7).
pub trait ArchitectureDescriptor: Send + Sync {
    /// `Some` iff this architecture supplies its own register-section
    /// iterator; `None` forces the legacy-handler fallback.
    fn register_section_iterator(&self) -> Option<&dyn RegisterSectionIterator>;

    /// Translate a container-reported (host) signal number into the
    /// architecture's target signal numbering. `None` means "use the host
    /// signal table instead" (§4.5 step 17).
    fn signal_from_target(&self, raw: i32) -> Option<i32>;

    fn shared_library_extractor(&self) -> Option<&dyn ObjectExtractor>;
    fn aix_library_extractor(&self) -> Option<&dyn ObjectExtractor>;

    fn core_specific_description(&self) -> Option<String> {
        None
    }

    fn pid_to_str(&self, _tid: ThreadId) -> Option<String> {
        None
    }

    fn info_proc(&self, _args: &str, _request: InfoProcRequest) -> Option<String> {
        None
    }
}

/// A read-only byte extractor used for `Libraries`/`LibrariesAix` transfers;
/// implementations typically walk a `.note` or auxiliary structure private
/// to the architecture.
pub trait ObjectExtractor: Send + Sync {
    fn extract(&self, offset: u64, length: u64) -> Option<Vec<u8>>;
}

/// A minimal architecture descriptor with no register-section iterator and
/// no extractors, forcing every decode through the legacy handler fallback.
/// Useful as a test double and as a conservative default.
#[derive(Default)]
pub struct LegacyOnlyArch;

impl ArchitectureDescriptor for LegacyOnlyArch {
    fn register_section_iterator(&self) -> Option<&dyn RegisterSectionIterator> {
        None
    }

    fn signal_from_target(&self, _raw: i32) -> Option<i32> {
        None
    }

    fn shared_library_extractor(&self) -> Option<&dyn ObjectExtractor> {
        None
    }

    fn aix_library_extractor(&self) -> Option<&dyn ObjectExtractor> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_only_arch_has_no_iterator() {
        let arch = LegacyOnlyArch;
        assert!(arch.register_section_iterator().is_none());
        assert!(arch.shared_library_extractor().is_none());
    }
}
