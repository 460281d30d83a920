//! Machine-mode boot and trap handling. Everything in this module runs with
//! paging off; kernel statics are reachable because the kernel is identity
//! mapped.

use crate::{config::PAGE_SIZE, println, task, timer};
use core::arch::{asm, global_asm};
use riscv::register::{
    mcause::{self, Exception, Interrupt, Trap},
    mepc, mie, mscratch, mstatus, mtval, mtvec, satp,
};

global_asm!(include_str!("mtrap.S"));

/// Exceptions the supervisor handles directly: ecall from user mode and the
/// page faults.
const DELEGATED_EXCEPTIONS: usize = (1 << 8) | (1 << 12) | (1 << 13) | (1 << 15);
/// All supervisor-level interrupts.
const DELEGATED_INTERRUPTS: usize = (1 << 1) | (1 << 5) | (1 << 9);

#[link_section = ".bss.stack"]
static mut MACHINE_STACK: [u8; PAGE_SIZE] = [0; PAGE_SIZE];

/// Entered from entry.asm on the boot stack, still in machine mode.
/// Prepares delegation, the timer and the machine trap vector, then drops
/// to supervisor mode in `rust_main`.
#[no_mangle]
pub unsafe extern "C" fn rust_start() -> ! {
    extern "C" {
        fn __mtrapvec();
    }
    mstatus::set_mpp(mstatus::MPP::Supervisor);
    mepc::write(crate::rust_main as usize);
    satp::write(0);
    asm!("csrw medeleg, {}", in(reg) DELEGATED_EXCEPTIONS);
    asm!("csrw mideleg, {}", in(reg) DELEGATED_INTERRUPTS);
    // Physical memory protection: open the whole range to S/U mode.
    asm!("csrw pmpaddr0, {}", in(reg) usize::MAX >> 10);
    asm!("csrw pmpcfg0, {}", in(reg) 0xfusize);
    timer::init();
    mie::set_mtimer();
    mscratch::write(core::ptr::addr_of!(MACHINE_STACK) as usize + PAGE_SIZE);
    mtvec::write(__mtrapvec as usize, mtvec::TrapMode::Direct);
    asm!("mret", options(noreturn));
}

#[no_mangle]
pub fn machine_trap_handler() {
    match mcause::read().cause() {
        Trap::Interrupt(Interrupt::MachineTimer) => {
            timer::rearm();
            // Post a supervisor software interrupt; supervisor mode counts
            // the tick when it next runs.
            unsafe {
                asm!("csrs mip, {}", in(reg) 1usize << 1);
            }
        }
        Trap::Exception(exception) => {
            report_fault_location();
            match exception {
                Exception::InstructionFault => panic!("Instruction access fault!"),
                Exception::LoadFault => panic!("Load access fault!"),
                Exception::StoreFault => panic!("Store/AMO access fault!"),
                Exception::LoadMisaligned => panic!("Misaligned load!"),
                Exception::StoreMisaligned => panic!("Misaligned store/AMO!"),
                Exception::IllegalInstruction => handle_illegal_instruction(),
                _ => fatal_dump(),
            }
        }
        _ => fatal_dump(),
    }
}

/// Interception hook for instructions the hardware rejects; nothing is
/// emulated yet.
fn handle_illegal_instruction() -> ! {
    panic!("Illegal instruction!");
}

fn fatal_dump() -> ! {
    println!(
        "machine_trap_handler(): unexpected mcause {:?}",
        mcause::read().cause()
    );
    println!(
        "            mepc={:#x} mtval={:#x}",
        mepc::read(),
        mtval::read()
    );
    panic!("unexpected exception in machine mode");
}

/// Resolve the faulting pc against the current process's line table and
/// print the source location. A miss prints empty fields; it is never an
/// error.
fn report_fault_location() {
    let fault_pc = mepc::read();
    let mut dir = "";
    let mut file = "";
    let mut line = 0;
    let process = task::try_current_process();
    let location = process
        .as_ref()
        .and_then(|p| p.debug_info.resolve_line(fault_pc));
    if let Some(location) = location {
        dir = location.dir;
        file = location.file;
        line = location.line;
    }
    println!("{}{}:{}", dir, file, line);
}
