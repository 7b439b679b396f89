use super::hooks::RewriteHookSet;
use super::policy;
use crate::codec::TextCodec;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use tracing::{debug, trace, warn};

/// Byte-sink decorator that rewrites, buffers or observes response bytes on
/// their way to the wrapped sink.
///
/// One instance serves one response cycle at a time: any number of writes
/// followed by exactly one [`complete`](Self::complete). The cache is emptied
/// after each completed cycle so the instance can be reused. Dropping the
/// filter mid-cycle discards whatever was withheld.
pub struct ResponseRewriteFilter<W: Write> {
    inner: W,
    hooks: RewriteHookSet,
    codec: TextCodec,
    cache: Cursor<Vec<u8>>,
    position: u64,
}

impl<W: Write> ResponseRewriteFilter<W> {
    pub fn new(inner: W, hooks: RewriteHookSet) -> Self {
        Self::with_codec(inner, hooks, TextCodec::utf8())
    }

    pub fn with_codec(inner: W, hooks: RewriteHookSet, codec: TextCodec) -> Self {
        debug!(?hooks, encoding = codec.name(), "Response rewrite filter attached");
        Self {
            inner,
            hooks,
            codec,
            cache: Cursor::new(Vec::new()),
            position: 0,
        }
    }

    pub fn hooks(&self) -> &RewriteHookSet {
        &self.hooks
    }

    pub fn codec(&self) -> TextCodec {
        self.codec
    }

    pub fn is_captured(&self) -> bool {
        policy::is_captured(&self.hooks)
    }

    pub fn is_output_delayed(&self) -> bool {
        policy::is_output_delayed(&self.hooks)
    }

    /// Bytes accepted since the last completed cycle.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn set_position(&mut self, position: u64) {
        self.position = position;
    }

    /// Bytes currently held in the cache.
    pub fn cached_len(&self) -> usize {
        self.cache.get_ref().len()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Unwrap the downstream sink. Anything still cached is discarded.
    pub fn into_inner(self) -> W {
        if !self.cache.get_ref().is_empty() {
            debug!(
                cached = self.cache.get_ref().len(),
                "Filter abandoned with withheld bytes"
            );
        }
        self.inner
    }

    /// Resize the cache, zero-filling when it grows.
    pub fn set_len(&mut self, len: u64) -> io::Result<()> {
        let len = usize::try_from(len).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cache length {} exceeds addressable memory", len),
            )
        })?;

        let cache = self.cache.get_mut();
        if let Some(additional) = len.checked_sub(cache.len()) {
            cache
                .try_reserve(additional)
                .map_err(|e| io::Error::new(io::ErrorKind::OutOfMemory, e))?;
        }
        cache.resize(len, 0);
        Ok(())
    }

    /// Accept one chunk from the producer.
    ///
    /// The untransformed bytes go to the cache when captured. Chunk-level
    /// transforms then run on the copy headed downstream, which is written
    /// immediately unless output is delayed.
    pub fn write_chunk(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.is_captured() {
            self.cache.write_all(buf)?;
        }
        self.position += buf.len() as u64;

        let mut chunk = buf.to_vec();
        if let Some(hook) = self.hooks.transform_chunk.as_mut() {
            chunk = hook(chunk);
        }
        if let Some(hook) = self.hooks.transform_final_text.as_mut() {
            match self.codec.transform(&chunk, |text| hook(text)) {
                Ok(transformed) => chunk = transformed,
                Err(e) => debug!("Chunk text transform skipped: {}", e),
            }
        }

        if self.is_output_delayed() {
            trace!(len = buf.len(), cached = self.cached_len(), "Chunk withheld");
            return Ok(());
        }

        trace!(len = chunk.len(), "Chunk passed through");
        self.inner.write_all(&chunk)
    }

    /// Terminal flush for the current cycle.
    ///
    /// Runs the whole-buffer transforms and captures over the cache, emits
    /// the cache if output was delayed, then empties it. The downstream sink
    /// is flushed in every case.
    pub fn complete(&mut self) -> io::Result<()> {
        if self.is_captured() && !self.cache.get_ref().is_empty() {
            let mut buffer = std::mem::take(self.cache.get_mut());

            if let Some(hook) = self.hooks.transform_final_bytes.as_mut() {
                buffer = hook(buffer);
            }
            if let Some(hook) = self.hooks.transform_final_text.as_mut() {
                match self.codec.transform(&buffer, |text| hook(text)) {
                    Ok(transformed) => buffer = transformed,
                    Err(e) => warn!("Final text transform skipped: {}", e),
                }
            }

            if let Some(hook) = self.hooks.capture_bytes.as_mut() {
                hook(buffer.as_slice());
            }
            if let Some(hook) = self.hooks.capture_text.as_mut() {
                match self.codec.decode(&buffer) {
                    Ok(text) => hook(text.as_ref()),
                    Err(e) => warn!("Text capture skipped: {}", e),
                }
            }

            self.cache = Cursor::new(Vec::new());
            if self.is_output_delayed() {
                debug!(len = buffer.len(), "Emitting withheld output");
                self.inner.write_all(&buffer)?;
            }
        }

        self.position = 0;
        self.inner.flush()
    }
}

impl<W: Write> Write for ResponseRewriteFilter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_chunk(buf)?;
        Ok(buf.len())
    }

    /// Completes the current cycle.
    fn flush(&mut self) -> io::Result<()> {
        self.complete()
    }
}

impl<W: Write + Read> Read for ResponseRewriteFilter<W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<W: Write> Seek for ResponseRewriteFilter<W> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.cache.seek(pos)
    }
}
