// prose-conference/conference-core
//
// Copyright: 2023, Marc Bauer <mb@nesium.com>
// License: Mozilla Public License v2.0 (MPL v2.0)

//! A strict field-order binary format used to persist rooms.
//!
//! Every field is prefixed with a one byte tag describing its wire type. Strings and collection
//! sizes are written as big-endian `u32` lengths. Fields carry no names, so encoder and decoder
//! must agree on the exact sequence, including fields that are only present conditionally.

use bytes::{Buf, BufMut, Bytes, BytesMut};

pub use decode_error::{DecodeError, WireType};

mod decode_error;

pub trait BinaryCodec: Sized {
    fn encode(&self, encoder: &mut Encoder);
    fn decode(decoder: &mut Decoder<'_>) -> Result<Self, DecodeError>;

    fn to_bytes(&self) -> Bytes {
        let mut encoder = Encoder::new();
        self.encode(&mut encoder);
        encoder.finish()
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(&mut Decoder::new(bytes))
    }
}

#[derive(Default)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(WireType::Bool.tag());
        self.buf.put_u8(value as u8);
    }

    pub fn put_str(&mut self, value: &str) {
        self.buf.put_u8(WireType::Str.tag());
        self.buf.put_u32(value.len() as u32);
        self.buf.put_slice(value.as_bytes());
    }

    pub fn put_count(&mut self, value: usize) {
        self.buf.put_u8(WireType::Count.tag());
        self.buf.put_u32(value as u32);
    }

    /// Writes a presence flag followed by the value, if any.
    pub fn put_opt_str(&mut self, value: Option<&str>) {
        self.put_bool(value.is_some());
        if let Some(value) = value {
            self.put_str(value);
        }
    }

    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

pub struct Decoder<'a> {
    buf: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Decoder { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn bool(&mut self) -> Result<bool, DecodeError> {
        self.expect_tag(WireType::Bool)?;
        self.ensure_remaining(1)?;
        match self.buf.get_u8() {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(DecodeError::InvalidBool(other)),
        }
    }

    pub fn string(&mut self) -> Result<String, DecodeError> {
        self.expect_tag(WireType::Str)?;
        let len = self.u32()? as usize;
        self.ensure_remaining(len)?;
        let bytes = self.buf.copy_to_bytes(len);
        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
    }

    pub fn count(&mut self) -> Result<usize, DecodeError> {
        self.expect_tag(WireType::Count)?;
        Ok(self.u32()? as usize)
    }

    pub fn opt_string(&mut self) -> Result<Option<String>, DecodeError> {
        if !self.bool()? {
            return Ok(None);
        }
        Ok(Some(self.string()?))
    }

    /// Decodes a string field and parses it with `FromStr`.
    pub fn parsed<T, E>(&mut self) -> Result<T, DecodeError>
    where
        T: std::str::FromStr<Err = E>,
        DecodeError: From<E>,
    {
        let value = self.string()?;
        Ok(T::from_str(&value)?)
    }

    fn u32(&mut self) -> Result<u32, DecodeError> {
        self.ensure_remaining(4)?;
        Ok(self.buf.get_u32())
    }

    fn expect_tag(&mut self, expected: WireType) -> Result<(), DecodeError> {
        self.ensure_remaining(1)?;
        let found = self.buf[0];
        if found != expected.tag() {
            return Err(DecodeError::UnexpectedWireType { expected, found });
        }
        self.buf.advance(1);
        Ok(())
    }

    fn ensure_remaining(&self, len: usize) -> Result<(), DecodeError> {
        if self.buf.remaining() < len {
            return Err(DecodeError::UnexpectedEof);
        }
        Ok(())
    }
}

impl From<strum::ParseError> for DecodeError {
    fn from(value: strum::ParseError) -> Self {
        DecodeError::InvalidEnumValue(value.to_string())
    }
}
