use crate::{
    config::PAGE_SIZE,
    mm::{frame_alloc, FrameTracker, PhysAddr},
};

/// One exclusively-owned frame used as the stack for this process's trap
/// handling, reached through the kernel's identity mapping. Returned to the
/// frame allocator on drop.
pub struct KernelStack {
    frame: FrameTracker,
}

impl KernelStack {
    pub fn new() -> Self {
        Self {
            frame: frame_alloc().unwrap(),
        }
    }

    pub fn top(&self) -> usize {
        PhysAddr::from(self.frame.ppn).0 + PAGE_SIZE
    }
}
