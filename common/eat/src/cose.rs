// Licensed under the Apache-2.0 license

//! COSE (CBOR Object Signing and Encryption) functionality
//!
//! This module provides the header, key and signature-input structures used
//! to build a COSE_Sign1 message as defined in RFC 8152. The message itself
//! is framed by the caller with a [`CborEncoder`], which lets the payload be
//! encoded in place instead of being copied through an intermediate buffer.

use crate::cbor::{CborEncodable, CborEncoder};
use crate::error::EatError;

/// COSE header label constants (RFC 8152)
pub mod header_params {
    pub const ALG: i32 = 1;
    pub const KID: i32 = 4;
}

/// COSE algorithm identifiers (IANA COSE Algorithms Registry)
pub mod cose_alg {
    pub const ES256: i32 = -7; // ECDSA using P-256 curve and SHA-256
}

/// COSE_Key labels and values (RFC 8152 section 13)
pub mod cose_key {
    pub const KTY: i64 = 1;
    pub const CRV: i64 = -1;
    pub const X: i64 = -2;
    pub const Y: i64 = -3;

    pub const KTY_EC2: u64 = 2;
}

/// Context string of the COSE_Sign1 signature input.
pub const SIGNATURE1_CONTEXT: &str = "Signature1";

/// Size of the empty byte string that stands in for the payload when the
/// signature input prefix is encoded.
pub const PAYLOAD_PLACEHOLDER_SIZE: usize = 1;

/// Upper bound of an encoded protected header.
pub const PROTECTED_HEADER_MAX_SIZE: usize = 16;

/// Upper bound of an encoded signature input without its payload.
pub const SIG_STRUCTURE_PREFIX_MAX_SIZE: usize = 64;

/// Upper bound of an encoded EC2 COSE_Key with 32-byte coordinates.
pub const COSE_KEY_MAX_SIZE: usize = 80;

/// COSE protected header structure
#[derive(Debug, Clone, Copy)]
pub struct ProtectedHeader {
    pub alg: i32, // Algorithm identifier
}

impl ProtectedHeader {
    /// Create a new protected header for ES256 (ECDSA with P-256 and SHA-256)
    pub fn new_es256() -> Self {
        Self {
            alg: cose_alg::ES256,
        }
    }

    /// Estimate the size required for encoding this protected header
    pub fn estimate_size(&self) -> usize {
        CborEncoder::estimate_uint_size(1)
            + CborEncoder::estimate_int_size(header_params::ALG as i64)
            + CborEncoder::estimate_int_size(self.alg as i64)
    }

    /// Encode the protected header into the provided buffer
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, EatError> {
        if buffer.len() < self.estimate_size() {
            return Err(EatError::BufferTooSmall);
        }

        let mut encoder = CborEncoder::new(buffer);
        encoder.encode_map_header(1)?;

        // alg (label 1): algorithm identifier
        encoder.encode_int(header_params::ALG as i64)?;
        encoder.encode_int(self.alg as i64)?;

        encoder.finish()
    }
}

/// COSE unprotected header structure
#[derive(Debug, Clone, Copy, Default)]
pub struct UnprotectedHeader<'a> {
    pub kid: Option<&'a [u8]>, // Key identifier
}

impl CborEncodable for UnprotectedHeader<'_> {
    fn encode(&self, encoder: &mut CborEncoder) -> Result<(), EatError> {
        encoder.open_map()?;
        if let Some(kid) = self.kid {
            encoder.encode_int(header_params::KID as i64)?;
            encoder.encode_bytes(kid)?;
        }
        encoder.close_map()?;
        Ok(())
    }
}

/// COSE_Sign1 signature input (RFC 8152 section 4.4)
///
/// ```text
/// Sig_structure = [
///    "Signature1",   // Context string for COSE_Sign1
///    protected,      // Protected header (serialized)
///    external_aad,   // Empty for basic use
///    payload         // The payload to be signed
/// ]
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SigStructure<'a> {
    pub protected: &'a [u8],
    pub external_aad: &'a [u8],
}

impl SigStructure<'_> {
    /// Encode the signature input with an empty payload and return the
    /// length of everything before that empty payload.
    ///
    /// Hashing the returned prefix followed by the payload byte string
    /// (including its head) yields the digest of the complete structure.
    pub fn encode_without_payload(&self, buffer: &mut [u8]) -> Result<usize, EatError> {
        let mut encoder = CborEncoder::new(buffer);

        encoder.encode_array_header(4)?;
        encoder.encode_text(SIGNATURE1_CONTEXT)?;
        encoder.encode_bytes(self.protected)?;
        encoder.encode_bytes(self.external_aad)?;
        encoder.encode_bytes(&[])?;

        let len = encoder.finish()?;
        Ok(len - PAYLOAD_PLACEHOLDER_SIZE)
    }
}

/// EC2 public key in COSE_Key form
#[derive(Debug, Clone, Copy)]
pub struct CoseKey<'a> {
    pub curve: u64,
    pub x: &'a [u8],
    pub y: &'a [u8],
}

impl CborEncodable for CoseKey<'_> {
    fn encode(&self, encoder: &mut CborEncoder) -> Result<(), EatError> {
        encoder.open_map()?;
        encoder.encode_int(cose_key::KTY)?;
        encoder.encode_uint(cose_key::KTY_EC2)?;
        encoder.encode_int(cose_key::CRV)?;
        encoder.encode_uint(self.curve)?;
        encoder.encode_int(cose_key::X)?;
        encoder.encode_bytes(self.x)?;
        encoder.encode_int(cose_key::Y)?;
        encoder.encode_bytes(self.y)?;
        encoder.close_map()?;
        Ok(())
    }
}
