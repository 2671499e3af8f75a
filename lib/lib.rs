#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod buffer;
pub mod config;
pub mod drain;
pub mod error;
pub mod hw;
pub mod sampler;
pub mod sink;

// 8-bit ADC conversion
pub type Sample = u8;

#[cfg(target_os = "none")]
mod target {
    use core::sync::atomic::{AtomicUsize, Ordering};

    static COUNT: AtomicUsize = AtomicUsize::new(0);
    defmt::timestamp!("{=usize}", {
        let n = COUNT.load(Ordering::Relaxed);
        COUNT.store(n + 1, Ordering::Relaxed);
        n
    });
}
