// Bounded by the 16-bit DMA transfer counter and by RAM, two of these live in .bss
pub const CAPTURE_DEPTH: usize = 8192;

// PA0 = ADC_IN0
pub const CAPTURE_CHANNEL: u8 = 0;

// 8.3 name in the root directory of the first volume
pub const LOG_FILE_NAME: &str = "DATA.TXT";

pub const BANNER: &str = "Hello, world!\n";

pub const SEPARATOR: char = ',';

pub const SINK_CHUNK_SIZE: usize = 512;

// PCLK after `init_clock`
pub const PCLK_KHZ: u32 = 64_000;

// SD cards must be brought up at 400 kHz or less
pub const SD_SPI_INIT_FREQ_KHZ: u32 = 400;
pub const SD_SPI_WORK_FREQ_KHZ: u32 = 16_000;

// Gives a probe time to attach
pub const BOOT_DELAY_MS: u32 = 10_000;
