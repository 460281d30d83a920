use crate::task::{
    add_process, current_process, exit_current_and_run_next, register_process,
    suspend_current_and_run_next,
};

pub fn sys_exit(exit_code: i32) -> ! {
    exit_current_and_run_next(exit_code);
}

pub fn sys_yield() -> isize {
    suspend_current_and_run_next();
    0
}

/// Returns twice: the child sees 0, the parent sees the child's pid.
pub fn sys_fork() -> isize {
    let current = current_process();
    let child = current.fork();
    let child_pid = child.pid();
    child.inner_exclusive_access().trap_cx().gprs[10] = 0;
    register_process(&child);
    add_process(child);
    child_pid as isize
}
