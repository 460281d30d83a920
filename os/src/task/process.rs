use super::{
    kernel_stack::KernelStack,
    pid::{pid_alloc, PidHandle},
    TaskContext,
};
use crate::{
    loader::DebugInfo,
    mm::{frame_alloc, kernel_satp, FrameTracker, MemoryControlBlock, PhysAddr},
    sync::UPSafeCell,
    trap::{trap_handler, TrapContext},
};
use alloc::sync::Arc;
use core::cell::RefMut;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProcessStatus {
    Ready,
    Running,
    Blocked,
}

pub struct ProcessControlBlockInner {
    pub status: ProcessStatus,
    pub task_cx: TaskContext,
    /// The address space; the strong count of this Arc is the reference
    /// count of the memory control block.
    pub mem: Arc<UPSafeCell<MemoryControlBlock>>,
    /// Frame holding the trap context, identity-mapped into both the kernel
    /// and this process's page table.
    trap_frame: FrameTracker,
}

impl ProcessControlBlockInner {
    pub fn trap_cx_va(&self) -> usize {
        PhysAddr::from(self.trap_frame.ppn).0
    }

    pub fn trap_cx(&self) -> &'static mut TrapContext {
        PhysAddr::from(self.trap_frame.ppn).get_mut()
    }

    pub fn satp(&self) -> usize {
        self.mem.exclusive_access().satp()
    }
}

pub struct ProcessControlBlock {
    // immutable
    pub pid: PidHandle,
    pub kernel_stack: KernelStack,
    /// Symbol and line tables of the loaded binary, read-only after load.
    pub debug_info: Arc<DebugInfo>,
    // mutable
    inner: UPSafeCell<ProcessControlBlockInner>,
}

impl ProcessControlBlock {
    pub fn inner_exclusive_access(&self) -> RefMut<'_, ProcessControlBlockInner> {
        self.inner.exclusive_access()
    }

    pub fn pid(&self) -> usize {
        self.pid.0
    }

    pub fn new(elf_data: &[u8]) -> Self {
        let (mut mem, user_sp, entry_point) = MemoryControlBlock::from_elf(elf_data);
        let trap_frame = frame_alloc().unwrap();
        let trap_frame_pa = PhysAddr::from(trap_frame.ppn);
        mem.map_trap_frame(trap_frame_pa);
        let debug_info = Arc::new(DebugInfo::from_elf(elf_data));
        let pid = pid_alloc();
        let kernel_stack = KernelStack::new();
        let kernel_stack_top = kernel_stack.top();
        *trap_frame_pa.get_mut::<TrapContext>() = TrapContext::app_initial_context(
            entry_point,
            user_sp,
            kernel_satp(),
            kernel_stack_top,
            trap_handler as usize,
        );
        Self {
            pid,
            kernel_stack,
            debug_info,
            inner: UPSafeCell::new(ProcessControlBlockInner {
                status: ProcessStatus::Ready,
                task_cx: TaskContext::goto_trap_return(kernel_stack_top),
                mem: Arc::new(UPSafeCell::new(mem)),
                trap_frame,
            }),
        }
    }

    /// Duplicate this process. The child gets a byte-copy of the address
    /// space and trap context; only its kernel stack pointer differs, so
    /// the pending syscall returns in both.
    pub fn fork(self: &Arc<Self>) -> Arc<Self> {
        let parent_inner = self.inner_exclusive_access();
        let mut mem = MemoryControlBlock::from_existed(&parent_inner.mem.exclusive_access());
        let trap_frame = frame_alloc().unwrap();
        trap_frame
            .ppn
            .get_bytes_array()
            .copy_from_slice(parent_inner.trap_frame.ppn.get_bytes_array());
        let trap_frame_pa = PhysAddr::from(trap_frame.ppn);
        mem.map_trap_frame(trap_frame_pa);
        let pid = pid_alloc();
        let kernel_stack = KernelStack::new();
        let kernel_stack_top = kernel_stack.top();
        trap_frame_pa.get_mut::<TrapContext>().kernel_sp = kernel_stack_top;
        Arc::new(Self {
            pid,
            kernel_stack,
            debug_info: self.debug_info.clone(),
            inner: UPSafeCell::new(ProcessControlBlockInner {
                status: ProcessStatus::Ready,
                task_cx: TaskContext::goto_trap_return(kernel_stack_top),
                mem: Arc::new(UPSafeCell::new(mem)),
                trap_frame,
            }),
        })
    }
}
