#![cfg_attr(target_os = "none", no_main)]
#![cfg_attr(target_os = "none", no_std)]

#[cfg(target_os = "none")]
use {defmt_rtt as _, panic_probe as _};

#[cfg(target_os = "none")]
#[rtic::app(device = stm32g0xx_hal::stm32, peripherals = true)]
mod app {
    use lib::buffer::DoubleBuffer;
    use lib::config::{BOOT_DELAY_MS, CAPTURE_DEPTH, SD_SPI_INIT_FREQ_KHZ};
    use lib::drain::DrainLoop;
    use lib::hw::{init_clock, init_storage, Adc, AdcConfig, SdLog};
    use lib::sampler::Sampler;
    use lib::sink::TextSink;
    use stm32g0xx_hal::delay::DelayExt;
    use stm32g0xx_hal::dma::DmaExt;
    use stm32g0xx_hal::dmamux::DmaMuxIndex;
    use stm32g0xx_hal::gpio::GpioExt;
    use stm32g0xx_hal::hal::blocking::delay::DelayMs;
    use stm32g0xx_hal::spi::{self, SpiExt};
    use stm32g0xx_hal::time::U32Ext;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        sampler: Sampler<'static, Adc, CAPTURE_DEPTH>,
        drain: DrainLoop<'static, SdLog, CAPTURE_DEPTH>,
    }

    #[init(local = [buffers: DoubleBuffer<CAPTURE_DEPTH> = DoubleBuffer::new()])]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let core: rtic::export::Peripherals = cx.core;
        let device: stm32g0xx_hal::stm32::Peripherals = cx.device;

        // Clock
        let mut rcc = init_clock(device.RCC);
        let mut delay = core.SYST.delay(&mut rcc);
        delay.delay_ms(BOOT_DELAY_MS);
        defmt::info!("booting, capture depth {}", CAPTURE_DEPTH);

        // GPIO
        let gpioa = device.GPIOA.split(&mut rcc);

        // ADC
        let dma = device.DMA.split(&mut rcc, device.DMAMUX);
        let mut ch1 = dma.ch1;
        ch1.mux().select_peripheral(DmaMuxIndex::ADC);
        let adc = Adc::new(
            device.ADC,
            AdcConfig::new(gpioa.pa0, ch1),
            &mut rcc,
            &mut delay,
        );

        // SD card, re-clocked to the working frequency once it is up
        let spi = device.SPI1.spi(
            (gpioa.pa1, gpioa.pa6, gpioa.pa7),
            spi::MODE_0,
            SD_SPI_INIT_FREQ_KHZ.khz(),
            &mut rcc,
        );
        let cs = gpioa.pa4.into_push_pull_output();
        let storage = match init_storage(spi, cs, delay) {
            Ok(storage) => storage,
            Err(e) => defmt::panic!("SD mount failed: {}", defmt::Debug2Format(&e)),
        };
        let mut sink = TextSink::new(storage);
        if let Err(e) = sink.write_banner() {
            defmt::panic!("banner write failed: {}", defmt::Debug2Format(&e));
        }

        // Capture
        let (filler, drainer) = cx.local.buffers.split();
        let mut sampler = Sampler::new(filler, adc);
        sampler.start();
        sampler.engine_mut().start_conversions();
        defmt::info!("sampling started");

        (
            Shared {},
            Local {
                sampler,
                drain: DrainLoop::new(drainer, sink),
            },
            init::Monotonics(),
        )
    }

    #[idle(local = [drain])]
    fn idle(cx: idle::Context) -> ! {
        match cx.local.drain.run() {
            Ok(never) => match never {},
            Err(e) => defmt::panic!("storage failure: {}", defmt::Debug2Format(&e)),
        }
    }

    #[task(binds = DMA_CHANNEL1, priority = 1, local = [sampler])]
    fn dma(cx: dma::Context) {
        cx.local.sampler.sample();
    }
}

// The firmware only exists for the device, host builds get an empty binary
#[cfg(not(target_os = "none"))]
fn main() {}
