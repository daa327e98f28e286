// Licensed under the Apache-2.0 license
#![cfg_attr(not(test), no_std)]

//! PSA initial attestation token encoder library
//!
//! This library provides a no_std compatible CBOR encoder and the COSE
//! building blocks needed to produce a COSE_Sign1 wrapped attestation token
//! without heap allocation.
//!
//! # Features
//!
//! - Definite-length arrays, maps and byte-string wraps whose length is
//!   fixed when they are closed
//! - Size-only encoding to compute token sizes without a buffer
//! - COSE_Sign1 signature input split around the payload, so the payload can
//!   be hashed where it was encoded

pub mod cbor;
pub mod claim_keys;
pub mod cose;
pub mod error;

/// CBOR tags used by attestation tokens (RFC 8152)
pub mod cbor_tags {
    /// COSE_Sign1 tag (RFC 8152)
    pub const COSE_SIGN1: u64 = 18;
}

// Re-export error types
pub use error::EatError;

// Re-export CBOR encoder and trait for custom encoding
pub use cbor::{CborEncodable, CborEncoder, CBOR_MAX_NESTING};

// Re-export PSA claim keys
pub use claim_keys::*;

// Re-export COSE Sign1 building blocks
pub use cose::{
    header_params,                 // COSE header parameter constants (ALG, KID)
    CoseKey,                       // EC2 public key, input of the key identifier
    ProtectedHeader,               // Protected header builder
    SigStructure,                  // Signature input without payload
    UnprotectedHeader,             // Unprotected header with optional kid
    COSE_KEY_MAX_SIZE,             // Encoded COSE_Key upper bound
    PAYLOAD_PLACEHOLDER_SIZE,      // Size of the empty payload placeholder
    PROTECTED_HEADER_MAX_SIZE,     // Encoded protected header upper bound
    SIG_STRUCTURE_PREFIX_MAX_SIZE, // Encoded signature input prefix upper bound
};
