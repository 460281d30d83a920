use crate::{
    config::{USER_STACK_LIMIT, USER_STACK_TOP},
    mm::VirtAddr,
    println,
    syscall::syscall,
    task::{current_process, current_trap_cx, current_trap_cx_va, current_user_satp},
};
use core::{
    arch::{asm, global_asm},
    sync::atomic::{AtomicUsize, Ordering},
};
use riscv::register::{
    scause::{self, Exception, Interrupt, Trap},
    sie, sstatus, stval, stvec,
};

mod context;

pub use context::TrapContext;

global_asm!(include_str!("trap.S"));

/// Timer ticks observed since boot. The machine-mode timer posts a software
/// interrupt; this counter is all the supervisor does with it.
static TICKS: AtomicUsize = AtomicUsize::new(0);

#[no_mangle]
pub fn trap_from_kernel() -> ! {
    panic!(
        "a trap from kernel! scause = {:?}, stval = {:#x}",
        scause::read().cause(),
        stval::read()
    );
}

fn set_kernel_trap_entry() {
    unsafe {
        stvec::write(trap_from_kernel as usize, stvec::TrapMode::Direct);
    }
}

fn set_user_trap_entry() {
    extern "C" {
        fn __alltraps();
    }
    unsafe {
        stvec::write(__alltraps as usize, stvec::TrapMode::Direct);
    }
}

pub fn init() {
    set_kernel_trap_entry();
}

/// The machine-mode timer arrives here as a supervisor software interrupt.
pub fn enable_tick_interrupt() {
    unsafe {
        sie::set_ssoft();
    }
}

#[allow(unused)]
pub fn ticks() -> usize {
    TICKS.load(Ordering::Relaxed)
}

#[no_mangle]
pub fn trap_handler() -> ! {
    set_kernel_trap_entry();
    // This path is only ever entered from user mode; anything else means
    // the kernel itself faulted through the user vector.
    if sstatus::read().spp() != sstatus::SPP::User {
        panic!("trap_handler: previous privilege level is not user");
    }
    let scause = scause::read();
    let stval = stval::read();
    match scause.cause() {
        Trap::Exception(Exception::UserEnvCall) => {
            let cx = current_trap_cx();
            // The ecall does not auto-advance the pc.
            cx.sepc += 4;
            let result = syscall(
                cx.gprs[10],
                [
                    cx.gprs[11],
                    cx.gprs[12],
                    cx.gprs[13],
                    cx.gprs[14],
                    cx.gprs[15],
                    cx.gprs[16],
                    cx.gprs[17],
                ],
            );
            current_trap_cx().gprs[10] = result as usize;
        }
        Trap::Interrupt(Interrupt::SupervisorSoft) => {
            let ticks = TICKS.fetch_add(1, Ordering::Relaxed) + 1;
            log::trace!("ticks = {}", ticks);
            unsafe {
                // acknowledge the software interrupt posted by machine mode
                asm!("csrc sip, {}", in(reg) 1usize << 1);
            }
        }
        Trap::Exception(Exception::StorePageFault) => {
            handle_store_page_fault(stval);
        }
        _ => {
            println!(
                "trap_handler(): unexpected scause {:?}",
                scause.cause()
            );
            println!(
                "            sepc={:#x} stval={:#x}",
                current_trap_cx().sepc,
                stval
            );
            panic!("unexpected exception happened");
        }
    }
    trap_return();
}

/// Store faults inside the stack window grow the user stack by one page;
/// anywhere else they are as fatal as any other fault.
fn handle_store_page_fault(stval: usize) {
    if !(USER_STACK_TOP - USER_STACK_LIMIT..USER_STACK_TOP).contains(&stval) {
        println!(
            "trap_handler(): store page fault outside the stack window, stval={:#x} sepc={:#x}",
            stval,
            current_trap_cx().sepc
        );
        panic!("unexpected page fault");
    }
    let process = current_process();
    let mem = process.inner_exclusive_access().mem.clone();
    mem.exclusive_access()
        .grow_user_stack(VirtAddr::from(stval));
    log::debug!("user stack grown to cover {:#x}", stval);
}

#[no_mangle]
pub fn trap_return() -> ! {
    set_user_trap_entry();
    extern "C" {
        fn __restore(trap_cx: usize, user_satp: usize) -> !;
    }
    unsafe {
        asm!("fence.i");
        __restore(current_trap_cx_va(), current_user_satp());
    }
}
