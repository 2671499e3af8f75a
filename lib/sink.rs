use core::fmt::Write;
use heapless::String;

use crate::config::{BANNER, SEPARATOR, SINK_CHUNK_SIZE};
use crate::error::{Error, Result};
use crate::hw::Storage;
use crate::Sample;

// "255,"
const MAX_TOKEN_LEN: usize = 4;
const _: () = assert!(SINK_CHUNK_SIZE >= MAX_TOKEN_LEN);

// Every call opens the file, appends and closes it again
pub struct TextSink<S> {
    storage: S,
    chunk: String<SINK_CHUNK_SIZE>,
}

impl<S> TextSink<S>
where
    S: Storage,
{
    pub fn new(storage: S) -> Self {
        TextSink {
            storage,
            chunk: String::new(),
        }
    }

    pub fn write_banner(&mut self) -> Result<(), S::Error> {
        self.session(|storage, _| storage.write(BANNER.as_bytes()).map_err(Error::Write))
    }

    pub fn append(&mut self, samples: &[Sample]) -> Result<(), S::Error> {
        self.session(|storage, chunk| {
            for &sample in samples {
                if chunk.capacity() - chunk.len() < MAX_TOKEN_LEN {
                    flush(storage, chunk)?;
                }
                // Room for a whole token was made above
                let pushed = write!(chunk, "{}{}", sample, SEPARATOR);
                debug_assert!(pushed.is_ok());
            }
            flush(storage, chunk)
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn session<F>(&mut self, body: F) -> Result<(), S::Error>
    where
        F: FnOnce(&mut S, &mut String<SINK_CHUNK_SIZE>) -> Result<(), S::Error>,
    {
        self.chunk.clear();
        self.storage.open_append().map_err(Error::Open)?;
        let written = body(&mut self.storage, &mut self.chunk);
        let closed = self.storage.close().map_err(Error::Close);
        written.and(closed)
    }
}

fn flush<S: Storage>(storage: &mut S, chunk: &mut String<SINK_CHUNK_SIZE>) -> Result<(), S::Error> {
    if !chunk.is_empty() {
        storage.write(chunk.as_bytes()).map_err(Error::Write)?;
        chunk.clear();
    }
    Ok(())
}
