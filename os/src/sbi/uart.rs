use crate::{config::VIRT_UART0, sync::UPSafeCell};
use bitflags::bitflags;
use core::sync::atomic::{AtomicU8, Ordering};
use lazy_static::lazy_static;

macro_rules! wait_for {
    ($cond:expr) => {
        while !$cond {
            core::hint::spin_loop();
        }
    };
}

bitflags! {
    struct FifoControl: u8 {
        const ENABLE = 1 << 0;
        const CLEAR_RX_FIFO = 1 << 1;
        const CLEAR_TX_FIFO = 1 << 2;
        const TRIGGER_14 = 0b11 << 6;
    }

    struct LineControl: u8 {
        const DATA_8 = 0b11;
        const DLAB_ENABLE = 1 << 7;
    }

    struct ModemControl: u8 {
        const DATA_TERMINAL_READY = 1 << 0;
        const AUXILIARY_OUTPUT_2 = 1 << 3;
    }

    struct LineStatus: u8 {
        const INPUT_AVAILABLE = 1 << 0;
        const OUTPUT_EMPTY = 1 << 5;
    }
}

/// register file when DLAB = 0; thr doubles as rbr on read
#[repr(C)]
struct Port {
    /// transmitter holding / receiver buffer
    thr: AtomicU8,
    /// interrupt enable
    ier: AtomicU8,
    /// FIFO control / interrupt identification
    fcr: AtomicU8,
    /// line control
    lcr: AtomicU8,
    /// modem control
    mcr: AtomicU8,
    /// line status
    lsr: AtomicU8,
    /// modem status
    msr: AtomicU8,
    /// scratch
    scr: AtomicU8,
}

struct UartRaw {
    base: usize,
}

/// 38.4 Kbps
const UART_DIVISOR: usize = 3;

impl UartRaw {
    fn new(base: usize) -> Self {
        Self { base }
    }

    fn port(&self) -> &'static mut Port {
        unsafe { &mut *(self.base as *mut Port) }
    }

    fn init(&self) {
        let port = self.port();
        // Disable interrupts; the console is polled only.
        port.ier.store(0, Ordering::Release);
        // Enable DLAB.
        port.lcr
            .store(LineControl::DLAB_ENABLE.bits, Ordering::Release);
        // Set dll/dlm (to set maximum speed of 38.4K).
        port.thr.store(UART_DIVISOR as u8, Ordering::Release);
        port.ier.store((UART_DIVISOR >> 8) as u8, Ordering::Release);
        // Disable DLAB and set data word length to 8 bits.
        port.lcr.store(LineControl::DATA_8.bits, Ordering::Release);
        // Enable FIFO, clear TX/RX queues and set the watermark at 14 bytes.
        port.fcr.store(
            (FifoControl::ENABLE
                | FifoControl::CLEAR_RX_FIFO
                | FifoControl::CLEAR_TX_FIFO
                | FifoControl::TRIGGER_14)
                .bits,
            Ordering::Release,
        );
        // Mark data terminal ready and enable auxiliary output.
        port.mcr.store(
            (ModemControl::DATA_TERMINAL_READY | ModemControl::AUXILIARY_OUTPUT_2).bits,
            Ordering::Release,
        );
    }

    fn send(&self, byte: u8) {
        let port = self.port();
        wait_for!((port.lsr.load(Ordering::Acquire) & LineStatus::OUTPUT_EMPTY.bits) != 0);
        port.thr.store(byte, Ordering::Release);
    }
}

lazy_static! {
    static ref UART: UPSafeCell<UartRaw> = UPSafeCell::new(UartRaw::new(VIRT_UART0));
}

pub fn uart_init() {
    UART.exclusive_access().init();
}

pub fn uart_send(byte: u8) {
    UART.exclusive_access().send(byte);
}
