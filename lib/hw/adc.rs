use core::sync::atomic::{compiler_fence, Ordering};
use stm32g0xx_hal::analog::adc::Adc as HalAdc;
use stm32g0xx_hal::dma::{Channel as DmaChannel, Direction, Event, Priority, WordSize};
use stm32g0xx_hal::hal::adc::Channel as AdcChannel;
use stm32g0xx_hal::hal::blocking::delay::DelayUs;
use stm32g0xx_hal::rcc::Rcc;
use stm32g0xx_hal::stm32g0::stm32g070::{ADC, RCC};

use crate::hw::TransferEngine;
use crate::Sample;

// The DMA transfer counter is 16 bits wide
const _: () = assert!(crate::config::CAPTURE_DEPTH <= u16::MAX as usize);

pub struct AdcConfig<I, C> {
    input: I,
    dma_channel: C,
}

impl<I, C> AdcConfig<I, C>
where
    I: AdcChannel<HalAdc, ID = u8>,
    C: DmaChannel,
{
    pub fn new(input: I, dma_channel: C) -> Self {
        AdcConfig { input, dma_channel }
    }
}

// Free running ADC feeding one DMA channel, one byte per conversion
pub struct AdcDma<I, C> {
    adc: InnerAdc<I>,
    dma: Dma<C>,
}

impl<I, C> AdcDma<I, C>
where
    I: AdcChannel<HalAdc, ID = u8>,
    C: DmaChannel,
{
    pub fn new<D: DelayUs<u8>>(
        pac_adc: ADC,
        config: AdcConfig<I, C>,
        rcc: &mut Rcc,
        delay: &mut D,
    ) -> Self {
        let dma = Dma::new(config.dma_channel, InnerAdc::<I>::get_dma_address());
        let adc = InnerAdc::new(pac_adc, config.input, rcc, delay);
        AdcDma { adc, dma }
    }

    // The armed DMA transfer picks the conversions up
    pub fn start_conversions(&mut self) {
        self.adc.start();
    }
}

impl<I, C> TransferEngine for AdcDma<I, C>
where
    I: AdcChannel<HalAdc, ID = u8>,
    C: DmaChannel,
{
    unsafe fn arm(&mut self, target: *mut Sample, len: usize) {
        self.dma.retarget(target as u32, len as u16);
    }

    fn start(&mut self) {
        self.dma.start();
    }

    fn acknowledge(&mut self) {
        self.dma.unpend();
    }
}

// Owning the channel is the claim: `DMA.split()` hands out each channel
// typestate exactly once
struct Dma<C> {
    channel: C,
}

impl<C> Dma<C>
where
    C: DmaChannel,
{
    fn new(channel: C, peripheral_addr: u32) -> Self {
        let mut dma = Dma { channel };
        dma.configure(peripheral_addr);
        dma
    }

    fn retarget(&mut self, memory_addr: u32, len: u16) {
        // Addresses and count only latch while the channel is off
        self.channel.disable();
        self.channel.set_memory_address(memory_addr, true);
        self.channel.set_transfer_length(len);
    }

    fn start(&mut self) {
        self.channel.clear_event(Event::TransferComplete);
        self.channel.listen(Event::TransferComplete);
        compiler_fence(Ordering::SeqCst);
        self.channel.enable();
    }

    fn unpend(&mut self) {
        self.channel.clear_event(Event::TransferComplete);
    }

    fn configure(&mut self, peripheral_addr: u32) {
        self.channel.set_priority_level(Priority::VeryHigh);
        self.channel.set_word_size(WordSize::BITS8);
        self.channel.set_direction(Direction::FromPeripheral);
        self.channel.set_peripheral_address(peripheral_addr, false);
        // Stops after one buffer, the interrupt re-arms it
        self.channel.set_circular_mode(false);
    }
}

struct InnerAdc<I> {
    adc: ADC,
    _input: I,
}

impl<I> InnerAdc<I>
where
    I: AdcChannel<HalAdc, ID = u8>,
{
    pub fn new<D: DelayUs<u8>>(pac_adc: ADC, input: I, rcc: &mut Rcc, delay: &mut D) -> Self {
        InnerAdc::<I>::enable_clock_and_reset(rcc);
        let mut adc = InnerAdc {
            adc: pac_adc,
            _input: input,
        };
        adc.disable();
        adc.select_clock();
        adc.enable_vreg(delay);
        adc.calibrate();
        adc.enable();
        adc.configure();
        adc
    }

    pub fn start(&mut self) {
        self.adc.isr.write(|w| {
            w.eoc().set_bit();
            w.ovr().set_bit()
        });
        self.adc.cr.modify(|_, w| w.adstart().set_bit());
    }

    pub fn get_dma_address() -> u32 {
        unsafe { &(*ADC::ptr()).dr as *const _ as u32 }
    }

    fn configure(&mut self) {
        self.adc.cfgr1.write(|w| unsafe {
            // Software start, convert back to back
            w.exten().bits(0b00);
            w.cont().set_bit();
            // Keep converting while DMA is re-armed
            w.ovrmod().set_bit();
            // Right alignment
            w.align().clear_bit();
            // 8-bit resolution
            w.res().bits(0b10);
            // Keep issuing DMA requests past the end of a transfer
            w.dmacfg().set_bit();
            // Enable DMA requests
            w.dmaen().set_bit()
        });
        // Shortest sampling time, 1.5 cycles
        self.adc.smpr.write(|w| unsafe { w.smp1().bits(0b000) });
        self.adc
            .chselr()
            .write(|w| unsafe { w.chsel().bits(1 << I::channel()) });
    }

    fn select_clock(&mut self) {
        // PCLK / 2 = 32 MHz, below the 35 MHz limit
        self.adc.cfgr2.modify(|_, w| unsafe { w.ckmode().bits(0b01) });
    }

    fn enable_clock_and_reset(_: &mut Rcc) {
        let rcc = unsafe { &(*RCC::ptr()) };
        rcc.apbenr2.modify(|_, w| w.adcen().set_bit());
        rcc.apbrstr2.modify(|_, w| w.adcrst().set_bit());
        rcc.apbrstr2.modify(|_, w| w.adcrst().clear_bit());
    }

    fn enable_vreg<D: DelayUs<u8>>(&mut self, delay: &mut D) {
        self.adc.cr.modify(|_, w| w.advregen().set_bit());
        // Max starting time declared by stm32g070 datasheet is 20 us
        delay.delay_us(20);
    }

    fn enable(&mut self) {
        self.adc.isr.write(|w| w.adrdy().set_bit());
        self.adc.cr.modify(|_, w| w.aden().set_bit());
        while self.adc.isr.read().adrdy().bit_is_clear() {}
    }

    fn disable(&mut self) {
        let cr = self.adc.cr.read();
        if cr.aden().bit_is_clear() {
            return;
        }
        if cr.adstart().bit_is_set() {
            self.adc.cr.modify(|_, w| w.adstp().set_bit());
        }
        self.adc.cr.modify(|_, w| w.addis().set_bit());
        while self.adc.cr.read().aden().bit_is_set() {}
        self.adc.isr.write(|w| w.adrdy().set_bit());
    }

    fn calibrate(&mut self) {
        self.adc.cr.modify(|_, w| w.adcal().set_bit());
        while self.adc.isr.read().eocal().bit_is_clear() {}
        self.adc.isr.write(|w| w.eocal().set_bit());
    }
}
