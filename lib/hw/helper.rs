use cortex_m::peripheral::SYST;
use embedded_sdmmc::{SdCard, SdCardError};
use stm32g0xx_hal::dma::C1;
use stm32g0xx_hal::gpio::gpioa::{PA0, PA1, PA4, PA6, PA7};
use stm32g0xx_hal::gpio::{Analog, DefaultMode, Output, PushPull};
use stm32g0xx_hal::rcc::{Config, PllConfig, Rcc, RccExt};
use stm32g0xx_hal::spi::Spi;
use stm32g0xx_hal::stm32g0::stm32g070::{RCC, SPI1};
use stm32g0xx_hal::timer::delay::Delay;

use crate::config::{LOG_FILE_NAME, PCLK_KHZ, SD_SPI_WORK_FREQ_KHZ};
use crate::hw::adc::AdcDma;
use crate::hw::sd::{FixedTimeSource, SdError, SdStorage};
use crate::hw::spi_baud_bits;

pub fn init_clock(pac_rcc: RCC) -> Rcc {
    // ((16 MHz / 4) * 32) / 2 = 64 MHz
    let pll_config = PllConfig::with_hsi(4, 32, 2);
    pac_rcc.freeze(Config::pll().pll_cfg(pll_config))
}

// ADC DMA channel
type DmaChannel = C1;
// PA0 - ADC input channel
pub type InputChannel = PA0<Analog>;
// PA1 - SD_SCK
pub type SdSck = PA1<DefaultMode>;
// PA6 - SD_MISO
pub type SdMiso = PA6<DefaultMode>;
// PA7 - SD_MOSI
pub type SdMosi = PA7<DefaultMode>;
// PA4 - SD_CS
pub type SdCs = PA4<Output<PushPull>>;

pub type Adc = AdcDma<InputChannel, DmaChannel>;
pub type SdSpi = Spi<SPI1, (SdSck, SdMiso, SdMosi)>;
pub type SdBlockDevice = SdCard<SdSpi, SdCs, Delay<SYST>>;
pub type SdLog = SdStorage<SdBlockDevice, FixedTimeSource>;

pub fn init_storage(
    spi: SdSpi,
    cs: SdCs,
    delay: Delay<SYST>,
) -> Result<SdLog, SdError<SdCardError>> {
    let card = SdCard::new(spi, cs, delay);
    // First access runs the card init sequence
    let bytes = card
        .num_bytes()
        .map_err(|e| SdError::Card(embedded_sdmmc::Error::DeviceError(e)))?;
    info!("SD card: {} MB", bytes / (1024 * 1024));
    card.spi(|_: &mut SdSpi| set_spi_frequency(SD_SPI_WORK_FREQ_KHZ));
    SdStorage::mount(card, FixedTimeSource, LOG_FILE_NAME)
}

// The HAL only sets the baud rate in `Spi::spi`, so the divider is changed on
// the PAC while the card lends out its bus
fn set_spi_frequency(target_khz: u32) {
    let br = spi_baud_bits(PCLK_KHZ, target_khz);
    let spi1 = unsafe { &(*SPI1::ptr()) };
    while spi1.sr.read().bsy().bit_is_set() {}
    spi1.cr1.modify(|_, w| w.spe().clear_bit());
    spi1.cr1.modify(|_, w| unsafe { w.br().bits(br) });
    spi1.cr1.modify(|_, w| w.spe().set_bit());
    info!("SD SPI switched to {} kHz", PCLK_KHZ >> (br + 1));
}
