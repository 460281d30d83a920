use crate::config::{CLINT_MTIME, CLINT_MTIMECMP, CLOCK_FREQ};

const TICKS_PER_SEC: usize = 100;
pub const TIMER_INTERVAL: usize = CLOCK_FREQ / TICKS_PER_SEC;

fn mtime() -> usize {
    unsafe { (CLINT_MTIME as *const usize).read_volatile() }
}

fn mtimecmp() -> usize {
    unsafe { (CLINT_MTIMECMP as *const usize).read_volatile() }
}

fn set_mtimecmp(value: usize) {
    unsafe { (CLINT_MTIMECMP as *mut usize).write_volatile(value) }
}

/// Program the first timer deadline. Machine mode only: the CLINT is not
/// mapped in any page table.
pub fn init() {
    set_mtimecmp(mtime() + TIMER_INTERVAL);
}

/// Push the deadline one interval forward.
pub fn rearm() {
    set_mtimecmp(mtimecmp() + TIMER_INTERVAL);
}
