use super::process::{ProcessControlBlock, ProcessStatus};
use crate::sync::UPSafeCell;
use alloc::{
    collections::{btree_map::BTreeMap, vec_deque::VecDeque},
    sync::Arc,
};
use lazy_static::lazy_static;

/// FIFO queue of READY processes: dispatch order matches enqueue order.
pub struct ProcessManager {
    ready_queue: VecDeque<Arc<ProcessControlBlock>>,
}

impl ProcessManager {
    pub fn new() -> Self {
        Self {
            ready_queue: VecDeque::new(),
        }
    }

    pub fn add(&mut self, process: Arc<ProcessControlBlock>) {
        self.ready_queue.push_back(process);
    }

    pub fn fetch(&mut self) -> Option<Arc<ProcessControlBlock>> {
        self.ready_queue.pop_front()
    }
}

lazy_static! {
    static ref PROCESS_MANAGER: UPSafeCell<ProcessManager> =
        UPSafeCell::new(ProcessManager::new());
    /// The process table. A pid present here is a live process; removal is
    /// what frees the slot.
    static ref PID2PCB: UPSafeCell<BTreeMap<usize, Arc<ProcessControlBlock>>> =
        UPSafeCell::new(BTreeMap::new());
}

pub fn add_process(process: Arc<ProcessControlBlock>) {
    PROCESS_MANAGER.exclusive_access().add(process);
}

pub fn fetch_process() -> Option<Arc<ProcessControlBlock>> {
    PROCESS_MANAGER.exclusive_access().fetch()
}

/// BLOCKED -> READY; the process becomes eligible but does not run
/// immediately.
pub fn wakeup_process(process: Arc<ProcessControlBlock>) {
    let mut inner = process.inner_exclusive_access();
    assert_eq!(inner.status, ProcessStatus::Blocked);
    inner.status = ProcessStatus::Ready;
    drop(inner);
    add_process(process);
}

pub fn register_process(process: &Arc<ProcessControlBlock>) {
    PID2PCB
        .exclusive_access()
        .insert(process.pid(), process.clone());
}

pub fn remove_process(pid: usize) {
    let mut map = PID2PCB.exclusive_access();
    if map.remove(&pid).is_none() {
        panic!("cannot find pid {} in the process table", pid);
    }
}

pub fn process_count() -> usize {
    PID2PCB.exclusive_access().len()
}

#[allow(unused)]
pub fn pid2process(pid: usize) -> Option<Arc<ProcessControlBlock>> {
    PID2PCB.exclusive_access().get(&pid).map(Arc::clone)
}
