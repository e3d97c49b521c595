//! Core-file target backend
//!
//! Attaches the debugger's process-inspection interface to a post-mortem
//! core dump: given an already-parsed container (the container-format
//! parser itself is out of scope), this crate resolves a register-decoding
//! strategy, builds a section table, reconstructs the thread list, and
//! answers the memory and partial-transfer queries the rest of a debugger
//! issues against a live inferior.
//!
//! Entry points: [`registry::HandlerRegistry`] for pluggable container
//! flavours, [`session::SessionManager`] for `open`/`close`/`detach`,
//! [`registers::fetch_all`] for register decoding, [`memory::read`] and
//! [`xfer::xfer`] for the read paths, and [`trivial`] for the handful of
//! one-line queries every target answers.

pub mod arch;
pub mod classify;
pub mod collab;
pub mod container;
pub mod error;
pub mod memory;
pub mod model;
pub mod registers;
pub mod registry;
pub mod session;
pub mod trivial;
pub mod xfer;

pub use error::CoreError;
pub use model::{Inferior, ObjectKind, ThreadId};
pub use session::{CoreDescription, CoreSession, SessionManager};
