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

//! Decoding of Avro's binary encoding.
//!
//! [`BinaryDecoder`] is a pull decoder: the caller drives it in schema
//! order and the decoder never consults a schema itself. Arrays and maps
//! are framed as blocks (see [`BinaryDecoder::array_start`]); everything
//! else is a direct transcription of the wire format.

use crate::AvroResult;
use crate::error::Details;
use crate::stream::StreamReader;
use crate::util::{safe_len, zag_i32, zag_i64};
use std::io::Read;

pub struct BinaryDecoder<R> {
    reader: StreamReader<R>,
}

/// Create a [`BinaryDecoder`] bound to `reader`.
///
/// Pass `&mut stream` to keep ownership of the stream on the caller's
/// side; the decoder must then not outlive it.
pub fn binary_decoder<R: Read>(reader: R) -> BinaryDecoder<R> {
    BinaryDecoder::new(reader)
}

impl<R: Read> BinaryDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: StreamReader::new(reader),
        }
    }

    /// Re-bind the decoder to a new stream, resetting internal buffering.
    /// The previously bound stream is dropped.
    pub fn init(&mut self, reader: R) {
        self.reader = StreamReader::new(reader);
    }

    /// `null` occupies no bytes on the wire.
    pub fn decode_null(&mut self) -> AvroResult<()> {
        Ok(())
    }

    pub fn decode_bool(&mut self) -> AvroResult<bool> {
        let byte = self.reader.read_byte().map_err(Details::ReadBoolean)?;
        match byte {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(Details::BoolValue(byte).into()),
        }
    }

    pub fn decode_int(&mut self) -> AvroResult<i32> {
        zag_i32(&mut self.reader)
    }

    pub fn decode_long(&mut self) -> AvroResult<i64> {
        zag_i64(&mut self.reader)
    }

    pub fn decode_float(&mut self) -> AvroResult<f32> {
        let mut bytes = [0u8; 4];
        self.reader
            .read_exact(&mut bytes)
            .map_err(Details::ReadFloat)?;
        Ok(f32::from_le_bytes(bytes))
    }

    pub fn decode_double(&mut self) -> AvroResult<f64> {
        let mut bytes = [0u8; 8];
        self.reader
            .read_exact(&mut bytes)
            .map_err(Details::ReadDouble)?;
        Ok(f64::from_le_bytes(bytes))
    }

    pub fn decode_string(&mut self) -> AvroResult<String> {
        let len = self.decode_len()?;
        let mut buf = vec![0u8; len];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadString)?;
        String::from_utf8(buf).map_err(|e| Details::ConvertToUtf8(e).into())
    }

    pub fn skip_string(&mut self) -> AvroResult<()> {
        let len = self.decode_len()?;
        self.reader
            .skip(len)
            .map_err(|e| Details::SkipBytes(e, len).into())
    }

    pub fn decode_bytes(&mut self) -> AvroResult<Vec<u8>> {
        let len = self.decode_len()?;
        let mut buf = vec![0u8; len];
        self.reader
            .read_exact(&mut buf)
            .map_err(Details::ReadBytes)?;
        Ok(buf)
    }

    pub fn skip_bytes(&mut self) -> AvroResult<()> {
        let len = self.decode_len()?;
        self.reader
            .skip(len)
            .map_err(|e| Details::SkipBytes(e, len).into())
    }

    /// Read exactly `n` bytes of a `fixed` value.
    pub fn decode_fixed(&mut self, n: usize) -> AvroResult<Vec<u8>> {
        let mut buf = vec![0u8; safe_len(n)?];
        self.reader
            .read_exact(&mut buf)
            .map_err(|e| Details::ReadFixed(e, n))?;
        Ok(buf)
    }

    pub fn skip_fixed(&mut self, n: usize) -> AvroResult<()> {
        self.reader
            .skip(n)
            .map_err(|e| Details::SkipBytes(e, n).into())
    }

    pub fn decode_enum(&mut self) -> AvroResult<usize> {
        Ok(self.decode_long()? as usize)
    }

    pub fn decode_union_index(&mut self) -> AvroResult<usize> {
        Ok(self.decode_long()? as usize)
    }

    /// Begin an array: absorb the first block header and return its item
    /// count, `0` for an empty array. On a size-annotated (negative count)
    /// block the trailing byte length is consumed and discarded, as the
    /// items are about to be decoded rather than skipped.
    pub fn array_start(&mut self) -> AvroResult<usize> {
        self.decode_item_count()
    }

    /// Next block header as the raw count cast to `usize`.
    ///
    /// Unlike [`array_start`](Self::array_start), the count of a
    /// size-annotated block comes back unnormalised; a `0` means end of
    /// array.
    pub fn array_next(&mut self) -> AvroResult<usize> {
        Ok(self.decode_long()? as usize)
    }

    /// Skip size-annotated blocks without decoding their items. Returns
    /// the count of the first block that carries no byte length, `0` at
    /// the end of the array; the caller must still skip that many items
    /// value by value.
    pub fn skip_array(&mut self) -> AvroResult<usize> {
        loop {
            let r = self.decode_long()?;
            if r < 0 {
                let n = self.decode_long()? as usize;
                self.reader
                    .skip(n)
                    .map_err(|e| Details::SkipBytes(e, n))?;
            } else {
                return Ok(r as usize);
            }
        }
    }

    pub fn map_start(&mut self) -> AvroResult<usize> {
        self.decode_item_count()
    }

    pub fn map_next(&mut self) -> AvroResult<usize> {
        self.decode_item_count()
    }

    pub fn skip_map(&mut self) -> AvroResult<usize> {
        self.skip_array()
    }

    /// Discard the stream reader's read-ahead, handing the underlying
    /// stream back at the decoder's current position.
    pub fn drain(&mut self) {
        self.reader.drain();
    }

    fn decode_len(&mut self) -> AvroResult<usize> {
        let len = self.decode_int()?;
        if len < 0 {
            return Err(Details::NegativeLength(len as i64).into());
        }
        safe_len(len as usize)
    }

    fn decode_item_count(&mut self) -> AvroResult<usize> {
        let result = self.decode_long()?;
        if result < 0 {
            // Consume and discard the byte length of the block.
            self.decode_long()?;
            Ok(result.unsigned_abs() as usize)
        } else {
            Ok(result as usize)
        }
    }
}
