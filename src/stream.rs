// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! A buffered byte reader with bounded skips.
//!
//! [`StreamReader`] is the thin layer between the binary decoder and an
//! [`std::io::Read`]. It reads ahead into an [`oval::Buffer`] so that the
//! decoder's many one-byte varint reads do not each hit the underlying
//! stream, and it supports skipping without materialising the skipped
//! bytes.

use oval::Buffer;
use std::io::{self, Read};

const READER_BUFFER_CAPACITY: usize = 8 * 1024;

pub struct StreamReader<R> {
    inner: R,
    buffer: Buffer,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buffer: Buffer::with_capacity(READER_BUFFER_CAPACITY),
        }
    }

    /// Read a single byte.
    pub fn read_byte(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// Skip exactly `n` bytes, erroring with `UnexpectedEof` when the
    /// stream ends early.
    pub fn skip(&mut self, n: usize) -> io::Result<()> {
        let buffered = self.buffer.available_data().min(n);
        self.buffer.consume(buffered);
        let mut remaining = (n - buffered) as u64;
        while remaining > 0 {
            let copied = io::copy(&mut (&mut self.inner).take(remaining), &mut io::sink())?;
            if copied == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended while skipping",
                ));
            }
            remaining -= copied;
        }
        Ok(())
    }

    /// Discard any read-ahead so the next read starts at the underlying
    /// stream's current position.
    pub fn drain(&mut self) {
        let pending = self.buffer.available_data();
        self.buffer.consume(pending);
    }

    /// Unwrap the underlying reader. Read-ahead bytes are discarded.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for StreamReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.buffer.available_data() == 0 {
            // Large reads bypass the buffer entirely.
            if buf.len() >= self.buffer.capacity() {
                return self.inner.read(buf);
            }
            self.buffer.shift();
            let n = self.inner.read(self.buffer.space())?;
            self.buffer.fill(n);
        }
        let n = buf.len().min(self.buffer.available_data());
        buf[..n].copy_from_slice(&self.buffer.data()[..n]);
        self.buffer.consume(n);
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_and_skip() -> io::Result<()> {
        let data: Vec<u8> = (0u8..=255).collect();
        let mut reader = StreamReader::new(&data[..]);

        assert_eq!(reader.read_byte()?, 0);
        reader.skip(10)?;
        assert_eq!(reader.read_byte()?, 11);

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;
        assert_eq!(rest, (12u8..=255).collect::<Vec<u8>>());
        Ok(())
    }

    #[test]
    fn test_skip_past_end() {
        let data = [1u8, 2, 3];
        let mut reader = StreamReader::new(&data[..]);
        let err = reader.skip(10).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_skip_larger_than_buffer() -> io::Result<()> {
        let data = vec![7u8; READER_BUFFER_CAPACITY * 2 + 5];
        let mut reader = StreamReader::new(&data[..]);
        reader.read_byte()?;
        reader.skip(READER_BUFFER_CAPACITY * 2)?;

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;
        assert_eq!(rest.len(), 4);
        Ok(())
    }

    #[test]
    fn test_drain_discards_read_ahead() -> io::Result<()> {
        let data = [1u8, 2, 3, 4];
        let mut reader = StreamReader::new(&data[..]);
        // The first read buffers the whole input.
        assert_eq!(reader.read_byte()?, 1);
        reader.drain();
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest)?;
        assert_eq!(rest, Vec::<u8>::new());
        Ok(())
    }
}
