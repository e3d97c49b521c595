//! Trivial services exposed to the target stack (§4.7). None of these carry
//! any state of their own; they're pure functions of the session/arch state
//! the caller already has in hand.

use crate::arch::{ArchitectureDescriptor, InfoProcRequest};
use crate::model::{Inferior, ThreadId};

/// Dead threads still appear in listings, so this is always true.
pub fn thread_alive(_tid: ThreadId) -> bool {
    true
}

/// Breakpoints cannot be inserted into a core file; both operations succeed
/// silently rather than erroring, matching how the rest of the stack treats
/// a target that simply has nothing to do here.
pub fn insert_breakpoint() -> Result<(), std::convert::Infallible> {
    Ok(())
}

pub fn remove_breakpoint() -> Result<(), std::convert::Infallible> {
    Ok(())
}

pub fn has_memory(container_open: bool) -> bool {
    container_open
}

pub fn has_stack(container_open: bool) -> bool {
    container_open
}

pub fn has_registers(container_open: bool) -> bool {
    container_open
}

pub fn read_description(architecture: &dyn ArchitectureDescriptor) -> Option<String> {
    architecture.core_specific_description()
}

/// Architecture-specific formatting wins outright; otherwise: a non-zero
/// lwp formats as `"process <lwp>"`, a non-fake pid as `"process <pid>"`,
/// and a fake pid with no lwp falls back to the fixed string.
pub fn pid_to_str(architecture: &dyn ArchitectureDescriptor, tid: ThreadId, inferior: Inferior) -> String {
    if let Some(formatted) = architecture.pid_to_str(tid) {
        return formatted;
    }
    if tid.lwp != 0 {
        format!("process {}", tid.lwp)
    } else if !inferior.fake_pid {
        format!("process {}", inferior.pid)
    } else {
        "<main task>".to_string()
    }
}

pub fn info_proc(architecture: &dyn ArchitectureDescriptor, args: &str, request: InfoProcRequest) -> Option<String> {
    architecture.info_proc(args, request)
}
