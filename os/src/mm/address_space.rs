use super::{
    address::{PhysAddr, PhysPageNum, VirtAddr, VirtPageNum, VpnRange},
    frame_allocator::{frame_alloc, FrameTracker},
    heap::{Vma, VmaKind, BLOCK_HEADER_SIZE},
    page_table::{PageTable, PageTableEntry, PageTableView},
};
use crate::{
    config::{MEMORY_END, MMIO, PAGE_SIZE, USER_HEAP_BASE, USER_STACK_LIMIT, USER_STACK_TOP},
    println,
};
use alloc::{collections::btree_map::BTreeMap, vec::Vec};
use bitflags::bitflags;
use core::{arch::asm, cmp::min};
use riscv::register::satp;

extern "C" {
    fn stext();
    fn etext();
    fn strapvec();
    fn etrapvec();
    fn srodata();
    fn erodata();
    fn sdata();
    fn edata();
    fn sbss_with_stack();
    fn ebss();
    fn ekernel();
}

/// For MapType::Identical, the address space does not have ownership of the
/// physical page frames it maps to.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MapType {
    Identical,
    Framed,
}

bitflags! {
    /// The values of R/W/X/U should be identical to those defined in struct PTEFlags.
    pub struct Permission: u8 {
        const R = 1 << 1;
        const W = 1 << 2;
        const X = 1 << 3;
        const U = 1 << 4;
    }
}

/// A fixed range of one address space: a loaded ELF segment, a user stack
/// window, or an identity-mapped kernel section. Unlike a heap [`Vma`], a
/// segment has no sub-page state; framed segments may be mapped lazily, one
/// page at a time.
pub struct MemorySegment {
    vpn_range: VpnRange,
    data_frames: BTreeMap<VirtPageNum, FrameTracker>,
    map_type: MapType,
    permission: Permission,
}

impl MemorySegment {
    pub fn new(
        start_va: VirtAddr,
        end_va: VirtAddr,
        map_type: MapType,
        permission: Permission,
    ) -> Self {
        Self {
            vpn_range: VpnRange::new(start_va.floor(), end_va.ceil()),
            data_frames: BTreeMap::new(),
            map_type,
            permission,
        }
    }

    pub fn from_other(other: &Self) -> Self {
        Self {
            vpn_range: VpnRange::new(other.vpn_range.start(), other.vpn_range.end()),
            data_frames: BTreeMap::new(),
            map_type: other.map_type,
            permission: other.permission,
        }
    }

    /// Add the page with VirtPageNum vpn to page_table (and self.data_frames
    /// if self.map_type == MapType::Framed). The page must belong to self.
    pub fn map_one(&mut self, page_table: &mut PageTable, vpn: VirtPageNum) {
        assert!(
            self.vpn_range.contains(vpn),
            "vpn {:?} does not belong to this segment",
            vpn
        );
        let ppn: PhysPageNum;
        match self.map_type {
            MapType::Identical => {
                ppn = PhysPageNum(vpn.0);
            }
            MapType::Framed => {
                let frame = frame_alloc().unwrap();
                ppn = frame.ppn;
                self.data_frames.insert(vpn, frame);
            }
        }
        page_table.map(vpn, ppn, self.permission);
    }

    /// Add the whole range to page_table.
    pub fn map(&mut self, page_table: &mut PageTable) {
        for vpn in self.vpn_range {
            self.map_one(page_table, vpn);
        }
    }

    /// Pages actually backed by a frame, in address order.
    pub fn mapped_vpns(&self) -> Vec<VirtPageNum> {
        self.data_frames.keys().copied().collect()
    }

    /// Must be called after self is added to page_table.
    pub fn copy_data(&mut self, view: PageTableView, data: &[u8]) {
        assert_eq!(self.map_type, MapType::Framed);
        let mut start: usize = 0;
        for vpn in self.vpn_range {
            let src = &data[start..min(data.len(), start + PAGE_SIZE)];
            let dest = &mut view.translate(vpn).unwrap().ppn().get_bytes_array()[..src.len()];
            dest.copy_from_slice(src);
            start += PAGE_SIZE;
            if start >= data.len() {
                break;
            }
        }
    }
}

/// One address space: page table, fixed segments, and the VMA list driving
/// the sub-page heap allocator. Shared between processes through an `Arc`
/// whose strong count is the reference count of the address space.
pub struct MemoryControlBlock {
    page_table: PageTable,
    segments: Vec<MemorySegment>,
    stack_segment: Option<usize>,
    vmas: Vec<Vma>,
    /// Index of the most recently located VMA; invalidated whenever the
    /// list changes.
    vma_cache: Option<usize>,
}

impl MemoryControlBlock {
    pub fn new_bare() -> Self {
        Self {
            page_table: PageTable::new(),
            segments: Vec::new(),
            stack_segment: None,
            vmas: Vec::new(),
            vma_cache: None,
        }
    }

    /// Return the kernel address space.
    pub fn new_kernel() -> Self {
        let mut space = MemoryControlBlock::new_bare();
        println!(".text [{:#x}, {:#x})", stext as usize, etext as usize);
        println!(".rodata [{:#x}, {:#x})", srodata as usize, erodata as usize);
        println!(".data [{:#x}, {:#x})", sdata as usize, edata as usize);
        println!(
            ".bss [{:#x}, {:#x})",
            sbss_with_stack as usize, ebss as usize
        );
        space.add_segment(
            MemorySegment::new(
                (stext as usize).into(),
                (etext as usize).into(),
                MapType::Identical,
                Permission::R | Permission::X,
            ),
            None,
        );
        space.add_segment(
            MemorySegment::new(
                (srodata as usize).into(),
                (erodata as usize).into(),
                MapType::Identical,
                Permission::R,
            ),
            None,
        );
        space.add_segment(
            MemorySegment::new(
                (sdata as usize).into(),
                (edata as usize).into(),
                MapType::Identical,
                Permission::R | Permission::W,
            ),
            None,
        );
        space.add_segment(
            MemorySegment::new(
                (sbss_with_stack as usize).into(),
                (ebss as usize).into(),
                MapType::Identical,
                Permission::R | Permission::W,
            ),
            None,
        );
        space.add_segment(
            MemorySegment::new(
                (ekernel as usize).into(),
                MEMORY_END.into(),
                MapType::Identical,
                Permission::R | Permission::W,
            ),
            None,
        );
        for pair in MMIO {
            space.add_segment(
                MemorySegment::new(
                    (*pair).0.into(),
                    ((*pair).0 + (*pair).1).into(),
                    MapType::Identical,
                    Permission::R | Permission::W,
                ),
                None,
            );
        }
        space
    }

    /// Build a user address space from an ELF image.
    /// Return (space, initial user sp, entry point).
    pub fn from_elf(elf_data: &[u8]) -> (Self, usize, usize) {
        let mut space = MemoryControlBlock::new_bare();
        space.map_trap_vector();
        let elf = xmas_elf::ElfFile::new(elf_data).unwrap();
        let magic = elf.header.pt1.magic;
        assert_eq!(magic, [0x7f, 0x45, 0x4c, 0x46], "invalid elf!");
        let ph_count = elf.header.pt2.ph_count();
        for i in 0..ph_count {
            let ph = elf.program_header(i).unwrap();
            if ph.get_type().unwrap() == xmas_elf::program::Type::Load {
                let start_va: VirtAddr = (ph.virtual_addr() as usize).into();
                let end_va: VirtAddr = ((ph.virtual_addr() + ph.mem_size()) as usize).into();
                let mut permission = Permission::U;
                let ph_flags = ph.flags();
                if ph_flags.is_read() {
                    permission |= Permission::R;
                }
                if ph_flags.is_write() {
                    permission |= Permission::W;
                }
                if ph_flags.is_execute() {
                    permission |= Permission::X;
                }
                space.add_segment(
                    MemorySegment::new(start_va, end_va, MapType::Framed, permission),
                    Some(&elf.input[ph.offset() as usize..(ph.offset() + ph.file_size()) as usize]),
                );
            }
        }
        // User stack window below USER_STACK_TOP; only the top page is
        // mapped up front, the rest arrives through store-fault growth.
        let mut stack = MemorySegment::new(
            (USER_STACK_TOP - USER_STACK_LIMIT).into(),
            USER_STACK_TOP.into(),
            MapType::Framed,
            Permission::R | Permission::W | Permission::U,
        );
        stack.map_one(
            &mut space.page_table,
            VirtAddr::from(USER_STACK_TOP - PAGE_SIZE).floor(),
        );
        space.stack_segment = Some(space.segments.len());
        space.segments.push(stack);
        // The heap region starts empty; its first page is mapped by the
        // first allocation.
        space.push_vma(Vma::new_heap(USER_HEAP_BASE.into()));
        (
            space,
            USER_STACK_TOP,
            elf.header.pt2.entry_point() as usize,
        )
    }

    /// Duplicate a user address space for fork: every mapped page is
    /// byte-copied into a fresh frame at the same virtual address, and the
    /// VMA list (chains included) is carried over.
    pub fn from_existed(user: &Self) -> Self {
        let mut space = Self::new_bare();
        space.map_trap_vector();
        for segment in user.segments.iter() {
            let mut new_segment = MemorySegment::from_other(segment);
            for vpn in segment.mapped_vpns() {
                new_segment.map_one(&mut space.page_table, vpn);
                let src_ppn = user.translate(vpn).unwrap().ppn();
                let dest_ppn = space.translate(vpn).unwrap().ppn();
                dest_ppn
                    .get_bytes_array()
                    .copy_from_slice(src_ppn.get_bytes_array());
            }
            space.segments.push(new_segment);
        }
        space.stack_segment = user.stack_segment;
        for vma in user.vmas.iter() {
            let duplicate = vma.duplicate(&mut space.page_table);
            space.push_vma(duplicate);
        }
        space
    }

    /// Map the supervisor trap-vector section at its kernel address so the
    /// trap entry/exit path stays reachable across the satp switch.
    fn map_trap_vector(&mut self) {
        self.add_segment(
            MemorySegment::new(
                (strapvec as usize).into(),
                (etrapvec as usize).into(),
                MapType::Identical,
                Permission::R | Permission::X,
            ),
            None,
        );
    }

    /// Map a trap-frame page at its physical address, mirroring the kernel
    /// view, so the trap entry code can reach it before any translation is
    /// set up.
    pub fn map_trap_frame(&mut self, pa: PhysAddr) {
        self.page_table.map(
            VirtPageNum(pa.floor().0),
            pa.floor(),
            Permission::R | Permission::W,
        );
    }

    fn add_segment(&mut self, mut segment: MemorySegment, data: Option<&[u8]>) {
        segment.map(&mut self.page_table);
        if let Some(data) = data {
            segment.copy_data(self.page_table.view(), data);
        }
        self.segments.push(segment);
    }

    fn push_vma(&mut self, vma: Vma) {
        self.vma_cache = None;
        self.vmas.push(vma);
    }

    #[allow(unused)]
    pub fn vma_count(&self) -> usize {
        self.vmas.len()
    }

    /// Sub-page allocation: round the payload up to 8 bytes, account for
    /// the block header, and hand the request to the heap VMA.
    pub fn allocate(&mut self, n: usize) -> VirtAddr {
        let need = (n + 7) / 8 * 8 + BLOCK_HEADER_SIZE;
        assert!(
            need <= PAGE_SIZE,
            "allocation of {} bytes does not fit in one page",
            n
        );
        let idx = self.heap_vma_index();
        self.vmas[idx].allocate(&mut self.page_table, need)
    }

    pub fn free(&mut self, va: VirtAddr) {
        let idx = self.heap_vma_index();
        self.vmas[idx].free(&mut self.page_table, va);
    }

    fn heap_vma_index(&mut self) -> usize {
        if let Some(idx) = self.vma_cache {
            if self.vmas[idx].kind() == VmaKind::Heap {
                return idx;
            }
        }
        let idx = self
            .vmas
            .iter()
            .position(|vma| vma.kind() == VmaKind::Heap)
            .expect("address space has no heap region");
        self.vma_cache = Some(idx);
        idx
    }

    /// Map one more page of the user stack at the faulting address.
    pub fn grow_user_stack(&mut self, va: VirtAddr) {
        let idx = self
            .stack_segment
            .expect("address space has no stack segment");
        self.segments[idx].map_one(&mut self.page_table, va.floor());
    }

    pub fn satp(&self) -> usize {
        self.page_table.satp()
    }

    pub fn activate(&self) {
        unsafe {
            satp::write(self.satp());
            asm!("sfence.vma");
        }
    }

    pub fn translate(&self, vpn: VirtPageNum) -> Option<PageTableEntry> {
        self.page_table.view().translate(vpn)
    }
}

#[cfg(feature = "kernel_tests")]
impl MemoryControlBlock {
    /// A bare address space carrying only an empty heap region.
    pub fn new_with_heap(start: VirtAddr) -> Self {
        let mut space = Self::new_bare();
        space.push_vma(Vma::new_heap(start));
        space
    }

    pub fn heap_vma(&mut self) -> &Vma {
        let idx = self.heap_vma_index();
        &self.vmas[idx]
    }

    pub fn vma_cache_index(&self) -> Option<usize> {
        self.vma_cache
    }
}
