use crate::{config::INIT_APP, loader::get_app_data_by_name, println};
use alloc::sync::Arc;

mod context;
mod kernel_stack;
mod manager;
mod pid;
mod process;
mod processor;
mod switch;

pub use context::TaskContext;
pub use kernel_stack::KernelStack;
pub use manager::{
    add_process, fetch_process, process_count, register_process, remove_process, wakeup_process,
};
pub use pid::{pid_alloc, PidHandle};
pub use process::{ProcessControlBlock, ProcessStatus};
pub use processor::{
    current_kernel_stack_top, current_process, current_trap_cx, current_trap_cx_va,
    current_user_satp, run_tasks, schedule, take_current_process, try_current_process,
};

/// Load the single bootstrap process and make it READY.
pub fn add_initial_process() {
    let elf_data = get_app_data_by_name(INIT_APP)
        .unwrap_or_else(|| panic!("no embedded program named {}", INIT_APP));
    let process = Arc::new(ProcessControlBlock::new(elf_data));
    register_process(&process);
    add_process(process);
}

/// RUNNING -> READY at the tail of the ready queue, then reschedule.
pub fn suspend_current_and_run_next() {
    let process = take_current_process().unwrap();
    let mut inner = process.inner_exclusive_access();
    let task_cx_ptr = &mut inner.task_cx as *mut TaskContext;
    inner.status = ProcessStatus::Ready;
    drop(inner);
    add_process(process);
    schedule(task_cx_ptr);
}

/// RUNNING -> BLOCKED; the caller must already have parked the process on
/// some wait queue, or it will never run again.
pub fn block_current_and_run_next() {
    let process = take_current_process().unwrap();
    let mut inner = process.inner_exclusive_access();
    let task_cx_ptr = &mut inner.task_cx as *mut TaskContext;
    inner.status = ProcessStatus::Blocked;
    drop(inner);
    schedule(task_cx_ptr);
}

/// Tear the process down and reschedule; never returns. The address space
/// reference, trap frame and kernel stack are all released once the switch
/// to the idle loop is complete.
pub fn exit_current_and_run_next(exit_code: i32) -> ! {
    let process = take_current_process().unwrap();
    println!(
        "[kernel] process {} exited with code {}",
        process.pid(),
        exit_code
    );
    remove_process(process.pid());
    processor::stash_exited(process);
    let mut unused_task_cx = TaskContext::zero_init();
    schedule(&mut unused_task_cx as *mut _);
    unreachable!("process resumed after exit");
}
