//! System call ABI: the number arrives in a0, up to seven arguments in
//! a1..a7, and the result goes back to the caller's a0.

mod debug;
mod io;
mod mem;
mod process;
mod sync;

use debug::sys_backtrace;
use io::sys_print;
use mem::{sys_allocate, sys_free};
use process::{sys_exit, sys_fork, sys_yield};
use sync::{sys_sem_new, sys_sem_p, sys_sem_v};

const SYSCALL_PRINT: usize = 64;
const SYSCALL_EXIT: usize = 65;
const SYSCALL_ALLOCATE: usize = 66;
const SYSCALL_FREE: usize = 67;
const SYSCALL_FORK: usize = 68;
const SYSCALL_YIELD: usize = 69;
const SYSCALL_SEM_NEW: usize = 70;
const SYSCALL_SEM_P: usize = 71;
const SYSCALL_SEM_V: usize = 72;
const SYSCALL_BACKTRACE: usize = 73;

pub fn syscall(id: usize, args: [usize; 7]) -> isize {
    match id {
        SYSCALL_PRINT => sys_print(args[0] as *const u8, args[1]),
        SYSCALL_EXIT => sys_exit(args[0] as i32),
        SYSCALL_ALLOCATE => sys_allocate(args[0]),
        SYSCALL_FREE => sys_free(args[0]),
        SYSCALL_FORK => sys_fork(),
        SYSCALL_YIELD => sys_yield(),
        SYSCALL_SEM_NEW => sys_sem_new(args[0]),
        SYSCALL_SEM_P => sys_sem_p(args[0]),
        SYSCALL_SEM_V => sys_sem_v(args[0]),
        SYSCALL_BACKTRACE => sys_backtrace(args[0]),
        _ => panic!("unknown syscall {}", id),
    }
}
