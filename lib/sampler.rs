use crate::buffer::{Completion, Filler, Slot};
use crate::hw::TransferEngine;

// Lives in the DMA completion interrupt
pub struct Sampler<'a, E, const N: usize> {
    filler: Filler<'a, N>,
    engine: E,
}

impl<'a, E, const N: usize> Sampler<'a, E, N>
where
    E: TransferEngine,
{
    pub fn new(filler: Filler<'a, N>, engine: E) -> Self {
        Sampler { filler, engine }
    }

    pub fn start(&mut self) {
        debug!("arming on {}", self.filler.active());
        self.rearm();
    }

    pub fn sample(&mut self) -> Completion {
        self.engine.acknowledge();
        let completion = self.filler.complete();
        match completion {
            Completion::Swapped { settled } => trace!("buffer {} settled", settled),
            Completion::Overrun { dropped } => trace!("overrun, {} batches dropped", dropped),
        }
        self.rearm();
        completion
    }

    pub fn active(&self) -> Slot {
        self.filler.active()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    fn rearm(&mut self) {
        let (target, len) = self.filler.target();
        // The filler only hands out the active buffer, which the drainer
        // cannot reach until the next completion settles it
        unsafe { self.engine.arm(target, len) };
        self.engine.start();
    }
}
