//! The state of the (single) hart: which process is current, and the idle
//! continuation the scheduler always switches through.
use super::{
    manager::{fetch_process, process_count},
    process::{ProcessControlBlock, ProcessStatus},
    switch::__switch,
    TaskContext,
};
use crate::{sbi::shutdown, sync::UPSafeCell, trap::TrapContext};
use alloc::sync::Arc;
use lazy_static::lazy_static;

pub struct Processor {
    current: Option<Arc<ProcessControlBlock>>,
    idle_task_cx: TaskContext,
}

impl Processor {
    pub fn new() -> Self {
        Self {
            current: None,
            idle_task_cx: TaskContext::zero_init(),
        }
    }

    pub fn take_current(&mut self) -> Option<Arc<ProcessControlBlock>> {
        self.current.take()
    }

    pub fn current(&self) -> Option<Arc<ProcessControlBlock>> {
        self.current.clone()
    }

    fn get_idle_task_cx_ptr(&mut self) -> *mut TaskContext {
        &mut self.idle_task_cx as *mut _
    }
}

lazy_static! {
    pub static ref PROCESSOR: UPSafeCell<Processor> = UPSafeCell::new(Processor::new());
    /// Holding slot for a process that just exited: its kernel stack is
    /// still in use until the switch to the idle loop completes, so the
    /// teardown happens there.
    static ref EXITED: UPSafeCell<Option<Arc<ProcessControlBlock>>> = UPSafeCell::new(None);
}

pub fn take_current_process() -> Option<Arc<ProcessControlBlock>> {
    PROCESSOR.exclusive_access().take_current()
}

pub fn try_current_process() -> Option<Arc<ProcessControlBlock>> {
    PROCESSOR.exclusive_access().current()
}

pub fn current_process() -> Arc<ProcessControlBlock> {
    try_current_process().unwrap()
}

pub fn current_user_satp() -> usize {
    current_process().inner_exclusive_access().satp()
}

pub fn current_trap_cx() -> &'static mut TrapContext {
    current_process().inner_exclusive_access().trap_cx()
}

pub fn current_trap_cx_va() -> usize {
    current_process().inner_exclusive_access().trap_cx_va()
}

pub fn current_kernel_stack_top() -> Option<usize> {
    try_current_process().map(|process| process.kernel_stack.top())
}

pub fn stash_exited(process: Arc<ProcessControlBlock>) {
    *EXITED.exclusive_access() = Some(process);
}

fn reap_exited() {
    EXITED.exclusive_access().take();
}

/// The idle loop. Pops the head of the ready queue, marks it RUNNING and
/// switches into it; comes back here whenever a process suspends. Running
/// dry is either a clean shutdown (nothing left to run) or, with blocked
/// processes still in the table, a fatal condition.
pub fn run_tasks() -> ! {
    loop {
        reap_exited();
        let mut processor = PROCESSOR.exclusive_access();
        if let Some(process) = fetch_process() {
            let idle_task_cx_ptr = processor.get_idle_task_cx_ptr();
            let mut process_inner = process.inner_exclusive_access();
            let next_task_cx_ptr = &process_inner.task_cx as *const TaskContext;
            process_inner.status = ProcessStatus::Running;
            drop(process_inner);
            processor.current = Some(process);
            drop(processor);
            unsafe {
                __switch(idle_task_cx_ptr, next_task_cx_ptr);
            }
        } else {
            drop(processor);
            let remaining = process_count();
            if remaining == 0 {
                log::info!("no process left to run, shutting down");
                shutdown(false);
            }
            panic!(
                "ready queue is empty but {} blocked process(es) remain",
                remaining
            );
        }
    }
}

/// One-way transfer back to the idle loop; the caller resumes at this call
/// site only when it is scheduled again.
pub fn schedule(switched_task_cx_ptr: *mut TaskContext) {
    let mut processor = PROCESSOR.exclusive_access();
    let idle_task_cx_ptr = processor.get_idle_task_cx_ptr();
    drop(processor);
    unsafe {
        __switch(switched_task_cx_ptr, idle_task_cx_ptr);
    }
}
