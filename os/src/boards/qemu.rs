//! Constants for the qemu virt machine

// the frequency of the timer
pub const CLOCK_FREQ: usize = 12500000;
pub const MEMORY_END: usize = 0x80800000;

pub const VIRT_TEST: usize = 0x00100000;
pub const VIRT_UART0: usize = 0x10000000;

pub const CLINT: usize = 0x02000000;
pub const CLINT_MTIMECMP: usize = CLINT + 0x4000;
pub const CLINT_MTIME: usize = CLINT + 0xbff8;

// (VIRT_TEST/RTC, UART0) in the virt machine
#[allow(unused)]
pub const MMIO: &[(usize, usize)] = &[(0x00100000, 0x002000), (0x10000000, 0x001000)];
