#![no_std]

extern crate alloc;

use buddy_system_allocator::LockedHeap;
use syscall::*;

#[macro_use]
pub mod console;

mod lang_items;
mod syscall;

const USER_HEAP_SIZE: usize = 0x4000;
static mut HEAP_SPACE: [u8; USER_HEAP_SIZE] = [0; USER_HEAP_SIZE];

#[global_allocator]
static HEAP_ALLOCATOR: LockedHeap = LockedHeap::empty();

#[no_mangle]
#[link_section = ".text.entry"]
pub extern "C" fn _start() -> ! {
    unsafe {
        HEAP_ALLOCATOR
            .lock()
            .init(core::ptr::addr_of!(HEAP_SPACE) as usize, USER_HEAP_SIZE);
    }
    extern "C" {
        fn main() -> i32;
    }
    exit(unsafe { main() });
}

pub fn exit(exit_code: i32) -> ! {
    sys_exit(exit_code)
}

/// Sub-page allocation from the process heap; at most one page minus the
/// block header.
pub fn allocate(size: usize) -> *mut u8 {
    sys_allocate(size) as *mut u8
}

pub fn free(ptr: *mut u8) {
    sys_free(ptr as usize);
}

pub fn fork() -> isize {
    sys_fork()
}

pub fn yield_() -> isize {
    sys_yield()
}

pub fn sem_new(initial: usize) -> usize {
    sys_sem_new(initial) as usize
}

pub fn sem_p(id: usize) {
    sys_sem_p(id);
}

pub fn sem_v(id: usize) {
    sys_sem_v(id);
}

pub fn backtrace(max_frames: usize) -> isize {
    sys_backtrace(max_frames)
}
