//! Trait-bounded stand-ins for the six collaborators the specification
//! names as external to this backend: the register cache, thread/inferior
//! registries, frame cache, shared-object resolver, symbol manager,
//! convenience-variable store, and target stack. `SessionManager` is
//! generic over none of these directly — it holds `Box<dyn Trait>` for
//! each, bundled in [`Collaborators`], and drives them in the order the
//! specification's `open` sequence requires.

use crate::container::CoreContainer;
use crate::error::CoreError;
use crate::model::{Inferior, RegisterDiscriminator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterStatus {
    Unknown,
    Supplied,
    Unavailable,
}

/// The debugger's per-thread mirror of CPU registers.
pub trait RegisterCache {
    fn supply(&mut self, discriminator: RegisterDiscriminator, bytes: &[u8]);
    fn mark_unavailable(&mut self, register_index: u32);
    fn known_register_indices(&self) -> Vec<u32>;
    fn status(&self, register_index: u32) -> RegisterStatus;
}

/// Tracks the set of threads known to the current inferior and which one is
/// "current".
pub trait ThreadRegistry {
    fn reset(&mut self);
    fn create_thread(&mut self, tid: crate::model::ThreadId);
    fn threads(&self) -> Vec<crate::model::ThreadId>;
    fn set_current(&mut self, tid: Option<crate::model::ThreadId>);
    fn current(&self) -> Option<crate::model::ThreadId>;
}

/// Tracks the (at most one, here) inferior this session created.
pub trait InferiorRegistry {
    fn create(&mut self, inferior: Inferior);
    fn current(&self) -> Option<Inferior>;
    fn clear(&mut self);
}

/// The debugger's cache of unwound stack frames; invalidated whenever
/// registers or the thread list might have changed.
pub trait FrameCache {
    fn reinitialize(&mut self);
}

/// Loads and later forgets shared-library bookkeeping for the inferior this
/// session creates. Per the design notes, its state must be cleared before
/// the container reference is released on `close`.
pub trait SharedObjectResolver {
    fn clear(&mut self);
    fn load_for_inferior(&mut self, inferior: Inferior) -> Result<(), CoreError>;
}

/// Cross-checks the core against any already-loaded executable and resolves
/// symbols once the inferior and its threads exist.
pub trait SymbolManager {
    fn validate_exec_core_consistency(&self, container: &dyn CoreContainer) -> Result<(), CoreError>;
    fn resolve_after_create(&mut self) -> Result<(), CoreError>;
}

/// The user-visible named scalars the debugger shell maintains (e.g.
/// `_exitsignal`).
pub trait ConvenienceVars {
    fn set_exit_signal(&mut self, signal: Option<i32>);
    fn clear_exit_related(&mut self);
}

/// The layered stack of backends this session is pushed onto and popped
/// from.
pub trait TargetStack {
    fn push_core(&mut self) -> Result<(), CoreError>;
    fn pop_core(&mut self);
    fn has_core_on_top(&self) -> bool;
    /// Re-enumerate threads through the (possibly now layered) stack;
    /// errors here are reported, never fatal (§4.5 step 16).
    fn enumerate_threads(&mut self) -> Result<(), CoreError>;
}

/// The full set of collaborators `SessionManager` drives. Bundled so `open`
/// can borrow them all without threading eight parameters through every
/// helper.
pub struct Collaborators {
    pub registers: Box<dyn RegisterCache>,
    pub threads: Box<dyn ThreadRegistry>,
    pub inferiors: Box<dyn InferiorRegistry>,
    pub frames: Box<dyn FrameCache>,
    pub shared_objects: Box<dyn SharedObjectResolver>,
    pub symbols: Box<dyn SymbolManager>,
    pub convenience_vars: Box<dyn ConvenienceVars>,
    pub target_stack: Box<dyn TargetStack>,
}

#[cfg(any(test, feature = "test-doubles"))]
pub mod doubles {
    //! In-memory collaborator doubles used by this crate's own tests and
    //! available to downstream integration tests that want to exercise
    //! `SessionManager` without a real debugger behind it.

    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared append-only log used to assert the ordering guarantees in
    /// the specification's concurrency section (container install before
    /// section table, before thread list, before target-stack push, before
    /// post-create hooks).
    pub type CallLog = Rc<RefCell<Vec<String>>>;

    pub struct RecordingRegisterCache {
        pub log: CallLog,
        pub indices: Vec<u32>,
        pub statuses: std::collections::HashMap<u32, RegisterStatus>,
        pub supplied_bytes: Vec<Vec<u8>>,
    }

    impl RecordingRegisterCache {
        pub fn new(log: CallLog, indices: Vec<u32>) -> Self {
            let statuses = indices.iter().map(|i| (*i, RegisterStatus::Unknown)).collect();
            Self { log, indices, statuses, supplied_bytes: Vec::new() }
        }
    }

    impl RegisterCache for RecordingRegisterCache {
        fn supply(&mut self, _discriminator: RegisterDiscriminator, bytes: &[u8]) {
            self.log.borrow_mut().push("registers.supply".into());
            self.supplied_bytes.push(bytes.to_vec());
            for idx in &self.indices {
                self.statuses.insert(*idx, RegisterStatus::Supplied);
            }
        }

        fn mark_unavailable(&mut self, register_index: u32) {
            self.statuses.insert(register_index, RegisterStatus::Unavailable);
        }

        fn known_register_indices(&self) -> Vec<u32> {
            self.indices.clone()
        }

        fn status(&self, register_index: u32) -> RegisterStatus {
            self.statuses.get(&register_index).copied().unwrap_or(RegisterStatus::Unknown)
        }
    }

    #[derive(Default)]
    pub struct RecordingThreadRegistry {
        pub threads: Vec<crate::model::ThreadId>,
        pub current: Option<crate::model::ThreadId>,
    }

    impl ThreadRegistry for RecordingThreadRegistry {
        fn reset(&mut self) {
            self.threads.clear();
            self.current = None;
        }
        fn create_thread(&mut self, tid: crate::model::ThreadId) {
            self.threads.push(tid);
        }
        fn threads(&self) -> Vec<crate::model::ThreadId> {
            self.threads.clone()
        }
        fn set_current(&mut self, tid: Option<crate::model::ThreadId>) {
            self.current = tid;
        }
        fn current(&self) -> Option<crate::model::ThreadId> {
            self.current
        }
    }

    #[derive(Default)]
    pub struct RecordingInferiorRegistry {
        pub inferior: Option<Inferior>,
    }

    impl InferiorRegistry for RecordingInferiorRegistry {
        fn create(&mut self, inferior: Inferior) {
            self.inferior = Some(inferior);
        }
        fn current(&self) -> Option<Inferior> {
            self.inferior
        }
        fn clear(&mut self) {
            self.inferior = None;
        }
    }

    pub struct RecordingFrameCache {
        pub log: CallLog,
    }

    impl FrameCache for RecordingFrameCache {
        fn reinitialize(&mut self) {
            self.log.borrow_mut().push("frames.reinitialize".into());
        }
    }

    pub struct RecordingSharedObjects {
        pub log: CallLog,
        pub fail_load: bool,
    }

    impl SharedObjectResolver for RecordingSharedObjects {
        fn clear(&mut self) {
            self.log.borrow_mut().push("shared_objects.clear".into());
        }
        fn load_for_inferior(&mut self, _inferior: Inferior) -> Result<(), CoreError> {
            self.log.borrow_mut().push("shared_objects.load".into());
            if self.fail_load {
                Err(CoreError::PostCreateFailed("shared object load failed".into()))
            } else {
                Ok(())
            }
        }
    }

    pub struct RecordingSymbols {
        pub log: CallLog,
    }

    impl SymbolManager for RecordingSymbols {
        fn validate_exec_core_consistency(&self, _container: &dyn CoreContainer) -> Result<(), CoreError> {
            self.log.borrow_mut().push("symbols.validate".into());
            Ok(())
        }
        fn resolve_after_create(&mut self) -> Result<(), CoreError> {
            self.log.borrow_mut().push("symbols.resolve".into());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct RecordingConvenienceVars {
        pub exit_signal: Option<i32>,
    }

    impl ConvenienceVars for RecordingConvenienceVars {
        fn set_exit_signal(&mut self, signal: Option<i32>) {
            self.exit_signal = signal;
        }
        fn clear_exit_related(&mut self) {
            self.exit_signal = None;
        }
    }

    pub struct RecordingTargetStack {
        pub log: CallLog,
        pub pushed: bool,
    }

    impl TargetStack for RecordingTargetStack {
        fn push_core(&mut self) -> Result<(), CoreError> {
            self.log.borrow_mut().push("target_stack.push".into());
            self.pushed = true;
            Ok(())
        }
        fn pop_core(&mut self) {
            self.log.borrow_mut().push("target_stack.pop".into());
            self.pushed = false;
        }
        fn has_core_on_top(&self) -> bool {
            self.pushed
        }
        fn enumerate_threads(&mut self) -> Result<(), CoreError> {
            self.log.borrow_mut().push("target_stack.enumerate_threads".into());
            Ok(())
        }
    }

    /// Builds a full [`Collaborators`] bundle of recording doubles sharing
    /// one [`CallLog`], plus the log handle itself for assertions.
    pub fn recording_collaborators(register_indices: Vec<u32>) -> (Collaborators, CallLog) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let bundle = Collaborators {
            registers: Box::new(RecordingRegisterCache::new(log.clone(), register_indices)),
            threads: Box::new(RecordingThreadRegistry::default()),
            inferiors: Box::new(RecordingInferiorRegistry::default()),
            frames: Box::new(RecordingFrameCache { log: log.clone() }),
            shared_objects: Box::new(RecordingSharedObjects { log: log.clone(), fail_load: false }),
            symbols: Box::new(RecordingSymbols { log: log.clone() }),
            convenience_vars: Box::new(RecordingConvenienceVars::default()),
            target_stack: Box::new(RecordingTargetStack { log: log.clone(), pushed: false }),
        };
        (bundle, log)
    }
}
