use crate::Sample;

#[cfg(target_os = "none")]
mod adc;
#[cfg(target_os = "none")]
mod helper;
#[cfg(target_os = "none")]
mod sd;

#[cfg(target_os = "none")]
pub use adc::{AdcConfig, AdcDma};
#[cfg(target_os = "none")]
pub use helper::*;
#[cfg(target_os = "none")]
pub use sd::{FixedTimeSource, SdError, SdStorage};

pub trait TransferEngine {
    // `target..target + len` must stay valid and untouched by anyone else
    // until the completion following the next `start`
    unsafe fn arm(&mut self, target: *mut Sample, len: usize);
    fn start(&mut self);
    // Clears the pending completion flag
    fn acknowledge(&mut self);
}

pub trait Storage {
    type Error;
    fn open_append(&mut self) -> Result<(), Self::Error>;
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
    fn close(&mut self) -> Result<(), Self::Error>;
}

// SPI_CR1.BR divides PCLK by 2^(BR + 1). Picks the fastest rate not above
// `target_khz`, or the slowest one the peripheral has.
pub fn spi_baud_bits(pclk_khz: u32, target_khz: u32) -> u8 {
    (0..7)
        .find(|br| pclk_khz >> (br + 1) <= target_khz)
        .unwrap_or(7)
}
