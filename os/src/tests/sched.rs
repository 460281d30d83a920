use super::{TestCase, TestResult};
use crate::{
    loader::get_app_data,
    task::{add_process, fetch_process, ProcessControlBlock},
};
use alloc::sync::Arc;

pub const TESTS: &[TestCase] = &[
    TestCase::new("sched.ready_queue_fifo", ready_queue_fifo),
    TestCase::new("sched.pid_assignment", pid_assignment),
];

fn ready_queue_fifo() -> TestResult {
    let elf_data = get_app_data(0);
    let a = Arc::new(ProcessControlBlock::new(elf_data));
    let b = Arc::new(ProcessControlBlock::new(elf_data));
    let c = Arc::new(ProcessControlBlock::new(elf_data));
    add_process(a.clone());
    add_process(b.clone());
    add_process(c.clone());
    for expected in [&a, &b, &c] {
        let fetched = fetch_process().ok_or("ready queue ran dry")?;
        if !Arc::ptr_eq(&fetched, expected) {
            return Err("dispatch order does not match enqueue order");
        }
    }
    if fetch_process().is_some() {
        return Err("ready queue should be empty");
    }
    Ok(())
}

fn pid_assignment() -> TestResult {
    let elf_data = get_app_data(0);
    let a = ProcessControlBlock::new(elf_data);
    let b = ProcessControlBlock::new(elf_data);
    if b.pid() <= a.pid() {
        return Err("fresh pids should increase");
    }
    Ok(())
}
