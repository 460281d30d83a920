use crate::{mm::VirtAddr, task::current_process};

pub fn sys_allocate(size: usize) -> isize {
    let mem = current_process().inner_exclusive_access().mem.clone();
    let va = mem.exclusive_access().allocate(size);
    va.0 as isize
}

pub fn sys_free(va: usize) -> isize {
    let mem = current_process().inner_exclusive_access().mem.clone();
    mem.exclusive_access().free(VirtAddr::from(va));
    0
}
