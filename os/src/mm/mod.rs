use crate::sync::UPSafeCell;
use alloc::sync::Arc;
use lazy_static::lazy_static;

mod address;
mod address_space;
mod frame_allocator;
mod heap;
mod heap_allocator;
mod page_table;

pub use address::{PhysAddr, PhysPageNum, VirtAddr, VirtPageNum};
pub use address_space::{MemoryControlBlock, MemorySegment, Permission};
pub use frame_allocator::{frame_alloc, frame_dealloc, FrameTracker};
pub use heap::{BlockState, Vma, VmaKind, BLOCK_HEADER_SIZE};
pub use page_table::{translated_byte_buffer, PageTable, PageTableEntry, PageTableView};

lazy_static! {
    pub static ref KERNEL_SPACE: Arc<UPSafeCell<MemoryControlBlock>> =
        Arc::new(UPSafeCell::new(MemoryControlBlock::new_kernel()));
}

pub fn kernel_satp() -> usize {
    KERNEL_SPACE.exclusive_access().satp()
}

pub fn init() {
    heap_allocator::init_heap();
    frame_allocator::init_frame_allocator();
    KERNEL_SPACE.exclusive_access().activate();
}
