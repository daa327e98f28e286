/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the attestation crypto drivers.

--*/

#![cfg_attr(not(feature = "std"), no_std)]

mod array;
mod ecc256;
pub mod printer;
mod sha256;

pub use array::{Array4x8, ARRAY_4X8_BYTE_SIZE, ARRAY_4X8_WORD_SIZE};
pub use ecc256::{
    P256PrivKey, P256PubKey, P256Scalar, P256Signature, COSE_CURVE_P256, P256,
    P256_PUB_KEY_SIZE, P256_SCALAR_SIZE, P256_SIGNATURE_SIZE,
};
pub use iat_error::{AttestError, AttestResult};
pub use sha256::{Sha256, Sha256Alg, Sha256DigestOp, Sha256DigestOpSw};
