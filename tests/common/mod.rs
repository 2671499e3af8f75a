//! Shared test infrastructure for the logger integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use lib::hw::{Storage, TransferEngine};
use lib::Sample;

// ============================================================================
// Mock DMA engine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    Arm(usize),
    Start,
    Acknowledge,
}

/// Stands in for the DMA channel. `deliver` plays the part of the hardware
/// and copies samples to wherever the channel was last armed.
pub struct MockEngine {
    // Addresses kept as integers so the engine can move to another thread
    armed: Option<(usize, usize)>,
    running: bool,
    events: Vec<EngineEvent>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            armed: None,
            running: false,
            events: Vec::new(),
        }
    }

    /// Completes one transfer: fills the armed region and stops the channel.
    /// The caller raises the completion by calling `Sampler::sample`.
    pub fn deliver(&mut self, samples: &[Sample]) {
        assert!(self.running, "transfer delivered while the channel is stopped");
        let (address, len) = self.armed.expect("transfer delivered before arming");
        assert_eq!(samples.len(), len, "a transfer always fills the whole buffer");
        unsafe { core::ptr::copy_nonoverlapping(samples.as_ptr(), address as *mut Sample, len) };
        self.running = false;
    }

    pub fn armed_address(&self) -> Option<usize> {
        self.armed.map(|(address, _)| address)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl TransferEngine for MockEngine {
    unsafe fn arm(&mut self, target: *mut Sample, len: usize) {
        self.armed = Some((target as usize, len));
        self.running = false;
        self.events.push(EngineEvent::Arm(target as usize));
    }

    fn start(&mut self) {
        self.running = true;
        self.events.push(EngineEvent::Start);
    }

    fn acknowledge(&mut self) {
        self.events.push(EngineEvent::Acknowledge);
    }
}

// ============================================================================
// In-memory storage
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Open,
    Write,
    Close,
    NotOpen,
    AlreadyOpen,
}

/// Append-only file in RAM with switchable failures.
pub struct MemoryStorage {
    contents: Vec<u8>,
    open: bool,
    pub opens: usize,
    pub closes: usize,
    pub writes: usize,
    pub fail_open: bool,
    pub fail_write: bool,
    pub fail_close: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            contents: Vec::new(),
            open: false,
            opens: 0,
            closes: 0,
            writes: 0,
            fail_open: false,
            fail_write: false,
            fail_close: false,
        }
    }

    pub fn text(&self) -> &str {
        std::str::from_utf8(&self.contents).expect("sink wrote non UTF-8 text")
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Storage for MemoryStorage {
    type Error = Fault;

    fn open_append(&mut self) -> Result<(), Fault> {
        if self.fail_open {
            return Err(Fault::Open);
        }
        if self.open {
            return Err(Fault::AlreadyOpen);
        }
        self.open = true;
        self.opens += 1;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Fault> {
        if !self.open {
            return Err(Fault::NotOpen);
        }
        if self.fail_write {
            return Err(Fault::Write);
        }
        self.contents.extend_from_slice(bytes);
        self.writes += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Fault> {
        if !self.open {
            return Err(Fault::NotOpen);
        }
        self.open = false;
        if self.fail_close {
            return Err(Fault::Close);
        }
        self.closes += 1;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Decodes the sink output back into samples.
pub fn decode(text: &str) -> Vec<Sample> {
    text.split(',')
        .filter(|token| !token.is_empty())
        .map(|token| token.parse().expect("token is not an unsigned byte"))
        .collect()
}
