// Licensed under the Apache-2.0 license

//! Generic CBOR encoding functionality
//!
//! This module provides a no_std compatible CBOR encoder over a fixed buffer.
//! It implements the core CBOR data types according to RFC 8949, plus the
//! nesting operations the attestation token needs: arrays and maps whose
//! length is only known when they are closed, and byte strings that wrap
//! other encoded items (`bstr .cbor`).
//!
//! Definite-length headers are inserted when a container is closed, so the
//! content written so far is shifted right by the header size. An encoder
//! created with [`CborEncoder::size_only`] performs the same bookkeeping
//! without storing any bytes, which lets callers compute the exact encoded
//! size of a structure without a buffer.

use crate::error::EatError;
use arrayvec::ArrayVec;
use core::ops::Range;

/// Maximum number of simultaneously open arrays, maps and byte-string wraps.
pub const CBOR_MAX_NESTING: usize = 8;

/// Maximum size of a CBOR head (initial byte plus 8-byte argument).
const CBOR_MAX_HEAD_SIZE: usize = 9;

/// CBOR major types (RFC 8949)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MajorType {
    UnsignedInt = 0,
    NegativeInt = 1,
    ByteString = 2,
    TextString = 3,
    Array = 4,
    Map = 5,
    Tag = 6,
    Simple = 7,
}

impl From<MajorType> for u8 {
    fn from(val: MajorType) -> Self {
        val as u8
    }
}

/// Construct a CBOR initial byte from major type and additional info
#[inline]
pub const fn cbor_initial_byte(major_type: MajorType, additional_info: u8) -> u8 {
    ((major_type as u8) << 5) | additional_info
}

/// Trait for types that can be encoded to CBOR format
pub trait CborEncodable {
    /// Encode this value into the provided CBOR encoder
    fn encode(&self, encoder: &mut CborEncoder) -> Result<(), EatError>;
}

// Allow references to types that are already CborEncodable
impl<T: CborEncodable + ?Sized> CborEncodable for &T {
    fn encode(&self, encoder: &mut CborEncoder) -> Result<(), EatError> {
        (*self).encode(encoder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Array,
    Map,
    ByteStringWrap,
}

#[derive(Debug, Clone, Copy)]
struct Nest {
    container: Container,
    /// Offset of the first content byte; the head is inserted here on close.
    start: usize,
    /// Number of data items written directly inside this container.
    items: u64,
}

enum Sink<'a> {
    Buffer(&'a mut [u8]),
    SizeOnly,
}

/// CBOR encoder with fixed buffer
pub struct CborEncoder<'a> {
    sink: Sink<'a>,
    pos: usize,
    nesting: ArrayVec<Nest, CBOR_MAX_NESTING>,
}

impl<'a> CborEncoder<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self {
            sink: Sink::Buffer(buffer),
            pos: 0,
            nesting: ArrayVec::new(),
        }
    }

    /// Create an encoder that only tracks the encoded length.
    pub fn size_only() -> Self {
        Self {
            sink: Sink::SizeOnly,
            pos: 0,
            nesting: ArrayVec::new(),
        }
    }

    /// Bytes written at `range`, or `None` for a size-only encoder.
    pub fn encoded(&self, range: Range<usize>) -> Option<&[u8]> {
        match &self.sink {
            Sink::Buffer(buf) if range.end <= self.pos => buf.get(range),
            _ => None,
        }
    }

    /// Check that every open container has been closed and return the
    /// total encoded length.
    pub fn finish(&self) -> Result<usize, EatError> {
        if !self.nesting.is_empty() {
            return Err(EatError::UnbalancedNesting);
        }
        Ok(self.pos)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EatError> {
        let end_pos = self
            .pos
            .checked_add(bytes.len())
            .ok_or(EatError::BufferTooSmall)?;
        if let Sink::Buffer(buffer) = &mut self.sink {
            let buf_slice = buffer
                .get_mut(self.pos..end_pos)
                .ok_or(EatError::BufferTooSmall)?;
            buf_slice.copy_from_slice(bytes);
        }
        self.pos = end_pos;
        Ok(())
    }

    // Encode major type + additional info according to CBOR rules
    fn head(major_type: MajorType, value: u64) -> ([u8; CBOR_MAX_HEAD_SIZE], usize) {
        let major: u8 = u8::from(major_type) << 5;
        let mut head = [0u8; CBOR_MAX_HEAD_SIZE];

        let len = if value <= 23 {
            head[0] = major | value as u8;
            1
        } else if value <= 0xff {
            head[0] = major | 24;
            head[1] = value as u8;
            2
        } else if value <= 0xffff {
            head[0] = major | 25;
            head[1..3].copy_from_slice(&(value as u16).to_be_bytes());
            3
        } else if value <= 0xffffffff {
            head[0] = major | 26;
            head[1..5].copy_from_slice(&(value as u32).to_be_bytes());
            5
        } else {
            head[0] = major | 27;
            head[1..9].copy_from_slice(&value.to_be_bytes());
            9
        };
        (head, len)
    }

    fn encode_type_value(&mut self, major_type: MajorType, value: u64) -> Result<(), EatError> {
        let (head, len) = Self::head(major_type, value);
        self.write_bytes(&head[..len])
    }

    // Insert a head in front of already written content starting at `at`.
    fn insert_head(
        &mut self,
        at: usize,
        major_type: MajorType,
        value: u64,
    ) -> Result<(), EatError> {
        let (head, head_len) = Self::head(major_type, value);
        let end_pos = self
            .pos
            .checked_add(head_len)
            .ok_or(EatError::BufferTooSmall)?;
        if let Sink::Buffer(buffer) = &mut self.sink {
            if end_pos > buffer.len() || at > self.pos {
                return Err(EatError::BufferTooSmall);
            }
            buffer.copy_within(at..self.pos, at + head_len);
            let dst = buffer
                .get_mut(at..at + head_len)
                .ok_or(EatError::BufferTooSmall)?;
            dst.copy_from_slice(&head[..head_len]);
        }
        self.pos = end_pos;
        Ok(())
    }

    fn count_item(&mut self) {
        if let Some(nest) = self.nesting.last_mut() {
            nest.items = nest.items.saturating_add(1);
        }
    }

    fn open(&mut self, container: Container) -> Result<(), EatError> {
        self.nesting
            .try_push(Nest {
                container,
                start: self.pos,
                items: 0,
            })
            .map_err(|_| EatError::NestingTooDeep)
    }

    fn close(&mut self, container: Container) -> Result<Range<usize>, EatError> {
        let nest = match self.nesting.last() {
            Some(nest) if nest.container == container => *nest,
            _ => return Err(EatError::UnbalancedNesting),
        };
        self.nesting.pop();

        let (major_type, value) = match container {
            Container::Array => (MajorType::Array, nest.items),
            Container::Map => {
                if nest.items % 2 != 0 {
                    return Err(EatError::InvalidData);
                }
                (MajorType::Map, nest.items / 2)
            }
            Container::ByteStringWrap => (MajorType::ByteString, (self.pos - nest.start) as u64),
        };
        self.insert_head(nest.start, major_type, value)?;
        self.count_item();
        Ok(nest.start..self.pos)
    }

    // Major type 0: Unsigned integer
    pub fn encode_uint(&mut self, value: u64) -> Result<(), EatError> {
        self.encode_type_value(MajorType::UnsignedInt, value)?;
        self.count_item();
        Ok(())
    }

    // Major type 1: Negative integer (-1 - n)
    pub fn encode_nint(&mut self, value: i64) -> Result<(), EatError> {
        if value >= 0 {
            return Err(EatError::InvalidData);
        }
        // -1 - value cannot overflow for a negative value
        let positive_value = (-(value + 1)) as u64;
        self.encode_type_value(MajorType::NegativeInt, positive_value)?;
        self.count_item();
        Ok(())
    }

    // Encode integer (automatically choose positive or negative)
    pub fn encode_int(&mut self, value: i64) -> Result<(), EatError> {
        if value >= 0 {
            self.encode_uint(value as u64)
        } else {
            self.encode_nint(value)
        }
    }

    // Major type 2: Byte string
    pub fn encode_bytes(&mut self, bytes: &[u8]) -> Result<(), EatError> {
        self.encode_type_value(MajorType::ByteString, bytes.len() as u64)?;
        self.write_bytes(bytes)?;
        self.count_item();
        Ok(())
    }

    // Major type 3: Text string
    pub fn encode_text(&mut self, text: &str) -> Result<(), EatError> {
        let bytes = text.as_bytes();
        self.encode_type_value(MajorType::TextString, bytes.len() as u64)?;
        self.write_bytes(bytes)?;
        self.count_item();
        Ok(())
    }

    /// Copy an already encoded data item verbatim.
    ///
    /// The bytes must hold exactly one well-formed CBOR data item; they are
    /// counted as a single item of the enclosing container.
    pub fn encode_preencoded(&mut self, encoded: &[u8]) -> Result<(), EatError> {
        if encoded.is_empty() {
            return Err(EatError::InvalidData);
        }
        self.write_bytes(encoded)?;
        self.count_item();
        Ok(())
    }

    // Major type 4: Array with a known number of items. Only valid outside
    // open containers, whose item counts would not see the array content.
    pub fn encode_array_header(&mut self, len: u64) -> Result<(), EatError> {
        if !self.nesting.is_empty() {
            return Err(EatError::UnbalancedNesting);
        }
        self.encode_type_value(MajorType::Array, len)
    }

    // Major type 5: Map with a known number of pairs. Same restriction as
    // `encode_array_header`.
    pub fn encode_map_header(&mut self, len: u64) -> Result<(), EatError> {
        if !self.nesting.is_empty() {
            return Err(EatError::UnbalancedNesting);
        }
        self.encode_type_value(MajorType::Map, len)
    }

    // Major type 6: Tag. The tagged item that follows is the counted item.
    pub fn encode_tag(&mut self, tag: u64) -> Result<(), EatError> {
        self.encode_type_value(MajorType::Tag, tag)
    }

    // Encode with COSE_Sign1 tag (18)
    pub fn encode_cose_sign1_tag(&mut self) -> Result<(), EatError> {
        self.encode_tag(crate::cbor_tags::COSE_SIGN1)
    }

    /// Open an array whose length is set when it is closed.
    pub fn open_array(&mut self) -> Result<(), EatError> {
        self.open(Container::Array)
    }

    /// Close the innermost array, returning the span of the encoded array.
    pub fn close_array(&mut self) -> Result<Range<usize>, EatError> {
        self.close(Container::Array)
    }

    /// Open a map whose length is set when it is closed.
    pub fn open_map(&mut self) -> Result<(), EatError> {
        self.open(Container::Map)
    }

    /// Close the innermost map, returning the span of the encoded map.
    pub fn close_map(&mut self) -> Result<Range<usize>, EatError> {
        self.close(Container::Map)
    }

    /// Start a byte string whose content is the CBOR written until the
    /// matching [`CborEncoder::close_bstr_wrap`].
    pub fn open_bstr_wrap(&mut self) -> Result<(), EatError> {
        self.open(Container::ByteStringWrap)
    }

    /// Close the innermost byte-string wrap.
    ///
    /// The returned span covers the complete byte string, including its
    /// head, exactly as it appears in the output.
    pub fn close_bstr_wrap(&mut self) -> Result<Range<usize>, EatError> {
        self.close(Container::ByteStringWrap)
    }

    // Helper function to estimate size based on value (mirrors head logic)
    #[inline]
    fn estimate_type_value_size(value: u64) -> usize {
        if value <= 23 {
            1 // Major type + value in same byte
        } else if value <= 0xff {
            2 // Major type + 1 byte
        } else if value <= 0xffff {
            3 // Major type + 2 bytes
        } else if value <= 0xffffffff {
            5 // Major type + 4 bytes
        } else {
            9 // Major type + 8 bytes
        }
    }

    /// Estimate the encoded size of a CBOR unsigned integer
    #[inline]
    pub fn estimate_uint_size(value: u64) -> usize {
        Self::estimate_type_value_size(value)
    }

    /// Estimate the encoded size of a CBOR integer (positive or negative)
    #[inline]
    pub fn estimate_int_size(value: i64) -> usize {
        let abs_value = if value >= 0 {
            value as u64
        } else {
            // For negative integers, CBOR encodes as (-1 - value)
            (-(value + 1)) as u64
        };

        Self::estimate_type_value_size(abs_value)
    }

    /// Estimate the encoded size of a CBOR byte string (major type 2)
    ///
    /// Returns: header_size + data_length
    #[inline]
    pub fn estimate_bytes_string_size(data_len: usize) -> usize {
        Self::estimate_uint_size(data_len as u64) + data_len
    }

    /// Estimate the encoded size of a CBOR text string (major type 3)
    ///
    /// Returns: header_size + data_length
    #[inline]
    pub fn estimate_text_string_size(text_len: usize) -> usize {
        Self::estimate_uint_size(text_len as u64) + text_len
    }
}
