use core::convert::Infallible;

use crate::buffer::Drainer;
use crate::error::Result;
use crate::hw::Storage;
use crate::sink::TextSink;

pub struct DrainLoop<'a, S, const N: usize> {
    drainer: Drainer<'a, N>,
    sink: TextSink<S>,
    drained: u32,
}

impl<'a, S, const N: usize> DrainLoop<'a, S, N>
where
    S: Storage,
{
    pub fn new(drainer: Drainer<'a, N>, sink: TextSink<S>) -> Self {
        DrainLoop {
            drainer,
            sink,
            drained: 0,
        }
    }

    /// Polls once. Returns `true` when a buffer was written out.
    pub fn drain_once(&mut self) -> Result<bool, S::Error> {
        let settled = match self.drainer.poll() {
            Some(settled) => settled,
            None => return Ok(false),
        };
        trace!("draining buffer {}", settled.slot());
        self.sink.append(&settled[..])?;
        // Releasing the buffer allows the next swap
        drop(settled);

        self.drained = self.drained.wrapping_add(1);
        debug!(
            "batch {} stored, {} dropped so far",
            self.drained,
            self.drainer.dropped_batches()
        );
        Ok(true)
    }

    // Returns only on a storage failure
    pub fn run(&mut self) -> Result<Infallible, S::Error> {
        info!("drain loop started");
        loop {
            self.drain_once()?;
        }
    }

    pub fn drained(&self) -> u32 {
        self.drained
    }

    pub fn dropped(&self) -> u32 {
        self.drainer.dropped_batches()
    }

    pub fn sink(&self) -> &TextSink<S> {
        &self.sink
    }
}
