use alloc::{collections::vec_deque::VecDeque, sync::Arc, vec::Vec};
use lazy_static::lazy_static;

use crate::{
    sync::UPSafeCell,
    task::{block_current_and_run_next, current_process, wakeup_process, ProcessControlBlock},
};

/// Counting semaphore. Waiters queue in FIFO order, so among processes
/// blocked on the same semaphore, wakeup order matches blocking order.
pub struct Semaphore {
    inner: UPSafeCell<SemaphoreInner>,
}

struct SemaphoreInner {
    value: isize,
    wait_queue: VecDeque<Arc<ProcessControlBlock>>,
}

impl Semaphore {
    pub fn new(initial: usize) -> Self {
        Self {
            inner: UPSafeCell::new(SemaphoreInner {
                value: initial as isize,
                wait_queue: VecDeque::new(),
            }),
        }
    }

    pub fn up(&self) {
        let mut inner = self.inner.exclusive_access();
        inner.value += 1;
        if inner.value <= 0 {
            // A non-positive value after the increment means somebody must
            // be waiting; an empty queue is a bookkeeping bug.
            let waiter = inner
                .wait_queue
                .pop_front()
                .expect("semaphore V: counter says a waiter exists but the wait queue is empty");
            wakeup_process(waiter);
        }
    }

    pub fn down(&self) {
        let mut inner = self.inner.exclusive_access();
        inner.value -= 1;
        if inner.value < 0 {
            inner.wait_queue.push_back(current_process());
            drop(inner);
            block_current_and_run_next();
        }
    }

    #[cfg(feature = "kernel_tests")]
    pub fn value(&self) -> isize {
        self.inner.exclusive_access().value
    }
}

lazy_static! {
    /// Ids index this table and are handed out monotonically. There is no
    /// destroy operation in the ABI, so slots are never reclaimed.
    static ref SEMAPHORES: UPSafeCell<Vec<Arc<Semaphore>>> = UPSafeCell::new(Vec::new());
}

pub fn sem_create(initial: usize) -> usize {
    let mut table = SEMAPHORES.exclusive_access();
    table.push(Arc::new(Semaphore::new(initial)));
    table.len() - 1
}

pub fn sem_get(id: usize) -> Arc<Semaphore> {
    let table = SEMAPHORES.exclusive_access();
    table
        .get(id)
        .unwrap_or_else(|| panic!("unknown semaphore id {}", id))
        .clone()
}
