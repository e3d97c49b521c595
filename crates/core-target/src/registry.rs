//! The Format Registry (§4.1): a process-wide list of pluggable core
//! handlers. Registration happens once at startup; steady state is
//! read-only, mirroring `crates/kernel/src/driver.rs`'s `DriverRegistry` —
//! a register-once table walked by a probe predicate, consulted on a hot
//! path but never mutated after startup.

use crate::container::CoreContainer;
use crate::error::{AmbiguousFormatWarning, CoreError};
use crate::model::CoreHandler;
use once_cell::sync::OnceCell;
use std::sync::RwLock;

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<CoreHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Handlers are immutable after this call;
    /// `register` itself may be called repeatedly during startup.
    pub fn register(&mut self, handler: CoreHandler) {
        self.handlers.push(handler);
    }

    pub fn handlers(&self) -> &[CoreHandler] {
        &self.handlers
    }

    /// Picks a handler for `container`. If `architecture_has_iterator` is
    /// true, the architecture descriptor supersedes legacy handlers
    /// entirely and this always returns `Ok(None)` without consulting the
    /// registry. Otherwise: zero matches is `UnrecognizedFormat`; more than
    /// one match is a (caller-logged) ambiguity, resolved by taking the
    /// last match — see the open question in DESIGN.md.
    pub fn sniff(
        &self,
        container: &dyn CoreContainer,
        architecture_has_iterator: bool,
        path_for_error: &std::path::Path,
    ) -> Result<Option<&CoreHandler>, CoreError> {
        if architecture_has_iterator {
            return Ok(None);
        }

        let matches: Vec<&CoreHandler> =
            self.handlers.iter().filter(|h| (h.sniff)(container)).collect();

        match matches.len() {
            0 => Err(CoreError::UnrecognizedFormat { path: path_for_error.to_path_buf() }),
            1 => Ok(Some(matches[0])),
            n => {
                let warning = AmbiguousFormatWarning { flavour_candidates: n };
                tracing::warn!(
                    path = %path_for_error.display(),
                    flavour_candidates = warning.flavour_candidates,
                    "ambiguous core format, {n} handlers match"
                );
                Ok(matches.last().copied())
            }
        }
    }

    /// True iff any registered handler's `check_format` predicate accepts
    /// the container. Used when the generic parser rejects the file
    /// outright (§4.5 step 2).
    pub fn check_format(&self, container: &dyn CoreContainer) -> bool {
        self.handlers.iter().any(|h| (h.check_format)(container))
    }
}

static GLOBAL_REGISTRY: OnceCell<RwLock<HandlerRegistry>> = OnceCell::new();

/// The process-wide registry. Registration must complete before any
/// `SessionManager::open` call; no locking discipline beyond a plain
/// `RwLock` is required since the debugger itself is single-threaded.
pub fn global_registry() -> &'static RwLock<HandlerRegistry> {
    GLOBAL_REGISTRY.get_or_init(|| RwLock::new(HandlerRegistry::new()))
}

pub fn register(handler: CoreHandler) {
    global_registry().write().expect("registry lock poisoned").register(handler);
}
