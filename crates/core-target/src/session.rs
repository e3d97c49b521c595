//! The Session Manager (§4.5): owns the open container, the resolved
//! architecture, the chosen handler, the section table, and the lifetime of
//! the inferior and its threads. `open`/`close`/`detach` are the only three
//! operations; `open` in particular follows an eighteen-step order with a
//! strict happens-before boundary at "pushed onto the target stack" (step
//! 10) — everything before that must leave no observable state on failure,
//! everything after reports errors without unwinding the session.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::arch::ArchitectureDescriptor;
use crate::classify::{classify, SectionRole};
use crate::collab::Collaborators;
use crate::container::CoreContainer;
use crate::error::CoreError;
use crate::model::{CoreHandler, Inferior, SectionRecord, ThreadId, SYNTHETIC_PID};
use crate::registers;
use crate::registry::HandlerRegistry;

/// Everything the session exclusively owns once `open` has succeeded.
pub struct CoreSession {
    pub path: PathBuf,
    pub container: Arc<dyn CoreContainer>,
    pub architecture: Arc<dyn ArchitectureDescriptor>,
    pub handler: Option<CoreHandler>,
    pub sections: Vec<SectionRecord>,
    pub inferior: Inferior,
}

/// A read-only projection of the current session, grounded in the original
/// `core_files_info` display (§4.8). Carries no behaviour of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreDescription {
    pub path: PathBuf,
    pub pid: u32,
    pub fake_pid: bool,
    pub thread_count: usize,
    pub current_thread: Option<ThreadId>,
    pub section_count: usize,
    pub failing_signal: i32,
}

/// The two ambient, debugger-global flags this backend respects:
/// read-write vs. read-only container opening, and whether to emit the
/// user-facing notices `open`/`detach` produce when driven interactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub write_files: bool,
    pub interactive: bool,
}

pub struct SessionManager {
    session: Option<CoreSession>,
    collaborators: Collaborators,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(collaborators: Collaborators, config: SessionConfig) -> Self {
        Self { session: None, collaborators, config }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn describe(&self) -> Option<CoreDescription> {
        let session = self.session.as_ref()?;
        Some(CoreDescription {
            path: session.path.clone(),
            pid: session.inferior.pid,
            fake_pid: session.inferior.fake_pid,
            thread_count: self.collaborators.threads.threads().len(),
            current_thread: self.collaborators.threads.current(),
            section_count: session.sections.len(),
            failing_signal: session.container.failing_signal(),
        })
    }

    /// Steps 1–18 of §4.5. `open_container` stands in for the out-of-scope
    /// container parser (step 1); `resolve_architecture` stands in for the
    /// out-of-scope architecture resolver (step 5). Both run before any
    /// state is committed, so a failure from either leaves the session
    /// untouched.
    #[tracing::instrument(
        skip(self, registry, open_container, resolve_architecture),
        fields(path = %path.as_ref().display(), pid = tracing::field::Empty)
    )]
    pub fn open(
        &mut self,
        path: impl AsRef<Path>,
        registry: &HandlerRegistry,
        open_container: impl FnOnce(&Path, bool) -> io::Result<Arc<dyn CoreContainer>>,
        resolve_architecture: impl FnOnce(&dyn CoreContainer) -> Arc<dyn ArchitectureDescriptor>,
    ) -> Result<(), CoreError> {
        let path = path.as_ref().to_path_buf();

        // Step 1.
        let container = open_container(&path, self.config.write_files).map_err(|source| CoreError::OpenFailed {
            path: path.clone(),
            source,
        })?;

        // Step 2.
        if !container.accepted_as_core() && !registry.check_format(container.as_ref()) {
            return Err(CoreError::NotACore {
                path: path.clone(),
                detail: "neither the container parser nor any registered handler claims this file".into(),
            });
        }

        // Step 3: pop any previously attached instance (idempotent).
        if self.collaborators.target_stack.has_core_on_top() {
            self.collaborators.target_stack.pop_core();
        }

        // Step 5.
        let architecture = resolve_architecture(container.as_ref());

        // Step 6.
        let handler = registry.sniff(
            container.as_ref(),
            architecture.register_section_iterator().is_some(),
            &path,
        )?;

        // Step 7.
        self.collaborators.symbols.validate_exec_core_consistency(container.as_ref())?;

        // Step 8: the section table is a flat copy of what the container
        // parser already resolved (see DESIGN.md on avoiding back-references
        // into the container).
        let sections: Vec<SectionRecord> = container.sections().to_vec();

        // Step 9: always adopt — executable-file management is out of
        // scope, so no architecture is ever already loaded here.
        // Step 10.
        self.collaborators.target_stack.push_core()?;

        // Step 11.
        self.collaborators.threads.reset();
        self.collaborators.threads.set_current(None);

        // Step 12.
        self.collaborators.frames.reinitialize();
        for index in self.collaborators.registers.known_register_indices() {
            self.collaborators.registers.mark_unavailable(index);
        }

        // Step 13.
        let originating_pid = container.originating_pid();
        let (pid, fake_pid) = match originating_pid {
            Some(pid) => (pid, false),
            None => (SYNTHETIC_PID, true),
        };
        tracing::Span::current().record("pid", &pid);

        let default_reg_offset =
            sections.iter().find(|s| s.name == ".reg").map(|s| s.file_offset);

        let mut current_tid: Option<ThreadId> = None;
        for section in &sections {
            if let SectionRole::General { lwp: Some(lwp) } = classify(&section.name) {
                let tid = ThreadId::new(pid, lwp);
                self.collaborators.threads.create_thread(tid);
                if Some(section.file_offset) == default_reg_offset {
                    current_tid = Some(tid);
                }
            }
        }

        // Step 14.
        if current_tid.is_none() {
            let threads = self.collaborators.threads.threads();
            current_tid = Some(if threads.is_empty() {
                let synthetic = ThreadId::new(SYNTHETIC_PID, 0);
                self.collaborators.threads.create_thread(synthetic);
                synthetic
            } else {
                threads[0]
            });
        }
        self.collaborators.threads.set_current(current_tid);

        let inferior = Inferior { pid, fake_pid };
        self.collaborators.inferiors.create(inferior);

        // Step 15: reported, never fatal.
        if let Err(err) = self.collaborators.shared_objects.load_for_inferior(inferior) {
            tracing::warn!(error = %err, "post-create shared-object load failed");
        }
        if let Err(err) = self.collaborators.symbols.resolve_after_create() {
            tracing::warn!(error = %err, "post-create symbol resolution failed");
        }

        // Step 16: tolerated.
        if let Err(err) = self.collaborators.target_stack.enumerate_threads() {
            tracing::warn!(error = %err, "thread re-enumeration failed");
        }

        // Step 17.
        if let Some(command) = container.failing_command() {
            tracing::info!(command, "core was generated by");
        }
        self.collaborators.convenience_vars.clear_exit_related();
        let raw_signal = container.failing_signal();
        if raw_signal > 0 {
            let mapped = architecture.signal_from_target(raw_signal).unwrap_or(raw_signal);
            self.collaborators.convenience_vars.set_exit_signal(Some(mapped));
            tracing::info!(signal = mapped, "program terminated with signal");
        }

        // Step 18.
        let current_lwp = current_tid.map(|t| t.lwp).unwrap_or(0);
        registers::fetch_all(
            container.as_ref(),
            architecture.as_ref(),
            handler,
            &mut *self.collaborators.registers,
            current_lwp,
        );
        self.collaborators.frames.reinitialize();
        tracing::info!(thread = %current_tid.unwrap(), "innermost frame");
        if self.collaborators.threads.threads().len() > 1 {
            tracing::info!(current = %current_tid.unwrap(), "multiple threads present");
        }

        self.session = Some(CoreSession {
            path,
            container,
            architecture,
            handler: handler.copied(),
            sections,
            inferior,
        });

        Ok(())
    }

    /// Idempotent: clears the current thread, clears shared-object state
    /// before the container reference is dropped, then frees the section
    /// table.
    pub fn close(&mut self) {
        if self.session.is_none() {
            return;
        }
        self.collaborators.threads.set_current(None);
        self.collaborators.shared_objects.clear();
        self.session = None;
        self.collaborators.inferiors.clear();
        self.collaborators.threads.reset();
    }

    pub fn detach(&mut self, args: &str) -> Result<(), CoreError> {
        if !args.trim().is_empty() {
            return Err(CoreError::UsageError("detach takes no arguments".into()));
        }
        self.collaborators.target_stack.pop_core();
        self.collaborators.frames.reinitialize();
        self.session = None;
        if self.config.interactive {
            tracing::info!("No core file now.");
        }
        Ok(())
    }

    pub fn session(&self) -> Option<&CoreSession> {
        self.session.as_ref()
    }
}
