use riscv::register::sstatus::{self, Sstatus, SPP};

/// Saved execution context of a process across a trap. Lives in its own
/// frame, mapped at the frame's physical address in both the kernel and the
/// owning process's page table; trap.S reaches it through sscratch before
/// any translation is re-established.
#[repr(C)]
pub struct TrapContext {
    /// offset 0: x0..x31
    pub gprs: [usize; 32],
    /// offset 32*8
    pub sstatus: Sstatus,
    /// offset 33*8: saved user pc
    pub sepc: usize,
    /// offset 34*8: satp of the kernel address space
    pub kernel_satp: usize,
    /// offset 35*8: top of this process's kernel stack
    pub kernel_sp: usize,
    /// offset 36*8: address of trap_handler
    pub trap_handler: usize,
}

impl TrapContext {
    pub fn app_initial_context(
        entry: usize,
        user_sp: usize,
        kernel_satp: usize,
        kernel_sp: usize,
        trap_handler: usize,
    ) -> Self {
        let mut gprs: [usize; 32] = [0; 32];
        gprs[2] = user_sp;
        let mut sstatus = sstatus::read();
        sstatus.set_spp(SPP::User);
        TrapContext {
            gprs,
            sstatus,
            sepc: entry,
            kernel_satp,
            kernel_sp,
            trap_handler,
        }
    }
}
