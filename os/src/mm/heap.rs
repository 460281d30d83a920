use super::{
    address::{VirtAddr, VirtPageNum},
    address_space::Permission,
    frame_allocator::{frame_alloc, FrameTracker},
    page_table::PageTable,
};
use crate::config::PAGE_SIZE;
use alloc::vec::Vec;

/// Bytes reserved in front of every payload. The chain bookkeeping itself
/// lives in kernel memory, but the reservation stays part of each block's
/// size so that a page chain always sums to exactly one page and payloads
/// keep their 8-byte alignment.
pub const BLOCK_HEADER_SIZE: usize = 48;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockState {
    Free,
    Allocated,
}

/// One slot of a page chain. `vm_offset` is the distance of the block
/// (header included) from the VMA start; the payload begins
/// `BLOCK_HEADER_SIZE` bytes further.
#[derive(Clone, Copy, Debug)]
pub struct Block {
    pub vm_offset: usize,
    pub size: usize,
    pub state: BlockState,
}

/// One mapped page of a heap VMA. The page owns its frame and its chain;
/// blocks are consecutive slots ordered by offset, and their sizes sum to
/// `PAGE_SIZE`.
pub struct HeapPage {
    frame: FrameTracker,
    blocks: Vec<Block>,
}

impl HeapPage {
    fn new(frame: FrameTracker, page_base: usize, first_block: usize) -> Self {
        let mut blocks = Vec::new();
        blocks.push(Block {
            vm_offset: page_base,
            size: first_block,
            state: BlockState::Allocated,
        });
        if first_block < PAGE_SIZE {
            blocks.push(Block {
                vm_offset: page_base + first_block,
                size: PAGE_SIZE - first_block,
                state: BlockState::Free,
            });
        }
        Self { frame, blocks }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VmaKind {
    Heap,
}

/// A contiguous region of one address space with its own sub-page allocator
/// state. `[start, end)` grows and shrinks a page at a time; slot `i` of
/// `pages` backs the i-th page of the region, `None` once the page has been
/// handed back to the frame allocator.
pub struct Vma {
    kind: VmaKind,
    start: VirtAddr,
    end: VirtAddr,
    pages: Vec<Option<HeapPage>>,
}

impl Vma {
    pub fn new_heap(start: VirtAddr) -> Self {
        Self {
            kind: VmaKind::Heap,
            start,
            end: start,
            pages: Vec::new(),
        }
    }

    pub fn kind(&self) -> VmaKind {
        self.kind
    }

    pub fn start(&self) -> VirtAddr {
        self.start
    }

    pub fn end(&self) -> VirtAddr {
        self.end
    }

    /// First-fit allocation of `need` bytes (header already included).
    /// Scans the mapped pages in address order; a free block of exactly
    /// `need` bytes satisfies the request without a split. When no free
    /// block fits, one more page is mapped at the region end.
    pub fn allocate(&mut self, page_table: &mut PageTable, need: usize) -> VirtAddr {
        assert!(
            need <= PAGE_SIZE,
            "heap request of {:#x} bytes exceeds one page",
            need
        );
        let start = self.start.0;
        for page in self.pages.iter_mut().flatten() {
            if let Some(i) = page
                .blocks
                .iter()
                .position(|b| b.state == BlockState::Free && b.size >= need)
            {
                carve(page, i, need);
                return VirtAddr(start + page.blocks[i].vm_offset + BLOCK_HEADER_SIZE);
            }
        }
        self.map_new_page(page_table, need)
    }

    /// Releases the block whose payload starts at `va`. Freeing an address
    /// that is not the payload of an allocated block is a kernel bug and
    /// fails loudly instead of corrupting the chain.
    pub fn free(&mut self, page_table: &mut PageTable, va: VirtAddr) {
        assert!(
            va.0 >= self.start.0 + BLOCK_HEADER_SIZE && va.0 < self.end.0,
            "free of {:?} outside the heap region",
            va
        );
        let block_offset = va.0 - self.start.0 - BLOCK_HEADER_SIZE;
        let page_index = block_offset / PAGE_SIZE;
        let release = {
            let page = self.pages[page_index]
                .as_mut()
                .unwrap_or_else(|| panic!("free of {:?}: page already released", va));
            let mut i = page
                .blocks
                .iter()
                .position(|b| b.vm_offset == block_offset)
                .unwrap_or_else(|| panic!("free of {:?}: no block starts there", va));
            assert!(
                page.blocks[i].state == BlockState::Allocated,
                "double free of {:?}",
                va
            );
            page.blocks[i].state = BlockState::Free;
            // Merge with the following block, then with the preceding one.
            // Chains never hold two adjacent free blocks, so one pass in
            // each direction completes any cascade.
            if i + 1 < page.blocks.len() && page.blocks[i + 1].state == BlockState::Free {
                page.blocks[i].size += page.blocks[i + 1].size;
                page.blocks.remove(i + 1);
            }
            if i > 0 && page.blocks[i - 1].state == BlockState::Free {
                page.blocks[i - 1].size += page.blocks[i].size;
                page.blocks.remove(i);
                i -= 1;
            }
            page.blocks.len() == 1 && page.blocks[i].state == BlockState::Free
        };
        if release {
            let vpn: VirtPageNum = VirtAddr(self.start.0 + page_index * PAGE_SIZE).floor();
            page_table.unmap(vpn);
            // Dropping the page returns its frame to the allocator.
            self.pages[page_index] = None;
            while let Some(None) = self.pages.last() {
                self.pages.pop();
                self.end = VirtAddr(self.end.0 - PAGE_SIZE);
            }
        }
    }

    /// Byte-copies every mapped page into fresh frames mapped through
    /// `page_table`, preserving offsets and chain state.
    pub fn duplicate(&self, page_table: &mut PageTable) -> Self {
        let mut pages = Vec::new();
        for (idx, slot) in self.pages.iter().enumerate() {
            pages.push(slot.as_ref().map(|page| {
                let frame = frame_alloc().unwrap();
                frame
                    .ppn
                    .get_bytes_array()
                    .copy_from_slice(page.frame.ppn.get_bytes_array());
                let vpn: VirtPageNum = VirtAddr(self.start.0 + idx * PAGE_SIZE).floor();
                page_table.map(
                    vpn,
                    frame.ppn,
                    Permission::R | Permission::W | Permission::U,
                );
                HeapPage {
                    frame,
                    blocks: page.blocks.clone(),
                }
            }));
        }
        Self {
            kind: self.kind,
            start: self.start,
            end: self.end,
            pages,
        }
    }

    fn map_new_page(&mut self, page_table: &mut PageTable, need: usize) -> VirtAddr {
        let frame = frame_alloc().unwrap();
        let vpn: VirtPageNum = self.end.floor();
        page_table.map(
            vpn,
            frame.ppn,
            Permission::R | Permission::W | Permission::U,
        );
        let page_base = self.end.0 - self.start.0;
        self.pages.push(Some(HeapPage::new(frame, page_base, need)));
        self.end = VirtAddr(self.end.0 + PAGE_SIZE);
        VirtAddr(self.start.0 + page_base + BLOCK_HEADER_SIZE)
    }
}

fn carve(page: &mut HeapPage, i: usize, need: usize) {
    let remainder = page.blocks[i].size - need;
    page.blocks[i].state = BlockState::Allocated;
    // A remainder that cannot even hold a header is absorbed into the
    // allocation instead of becoming an unusable sliver.
    if remainder > BLOCK_HEADER_SIZE {
        page.blocks[i].size = need;
        let free_offset = page.blocks[i].vm_offset + need;
        page.blocks.insert(
            i + 1,
            Block {
                vm_offset: free_offset,
                size: remainder,
                state: BlockState::Free,
            },
        );
    }
}

#[cfg(feature = "kernel_tests")]
impl Vma {
    /// Asserts the chain invariants: per mapped page, blocks are contiguous,
    /// address-ordered and sum to exactly one page.
    pub fn check_chains(&self) {
        for (idx, slot) in self.pages.iter().enumerate() {
            if let Some(page) = slot {
                assert!(!page.blocks.is_empty());
                let mut expected = idx * PAGE_SIZE;
                for block in page.blocks.iter() {
                    assert_eq!(block.vm_offset, expected);
                    expected += block.size;
                }
                assert_eq!(expected, (idx + 1) * PAGE_SIZE);
            }
        }
    }

    pub fn mapped_page_count(&self) -> usize {
        self.pages.iter().flatten().count()
    }

    pub fn blocks_of_page(&self, idx: usize) -> &[Block] {
        self.pages[idx].as_ref().unwrap().blocks.as_slice()
    }
}
