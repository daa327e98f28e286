/*++

Licensed under the Apache-2.0 license.

File Name:

    ecc256.rs

Abstract:

    File contains API for ECDSA P-256 operations used to sign attestation
    tokens.

--*/

use crate::{Array4x8, AttestError, AttestResult};
use p256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p256::ecdsa::{Signature, SigningKey, VerifyingKey};
use p256::EncodedPoint;
use zeroize::Zeroize;

/// P-256 Coordinate
pub type P256Scalar = Array4x8;

/// COSE curve identifier of P-256 (RFC 9053, "Elliptic Curves" registry).
pub const COSE_CURVE_P256: i32 = 1;

/// Size of a P-256 scalar or coordinate in bytes.
pub const P256_SCALAR_SIZE: usize = 32;

/// Size of an uncompressed SEC1 encoded P-256 point.
pub const P256_PUB_KEY_SIZE: usize = 1 + 2 * P256_SCALAR_SIZE;

/// Size of the raw `r || s` signature.
pub const P256_SIGNATURE_SIZE: usize = 2 * P256_SCALAR_SIZE;

/// P-256 private key handle
///
/// The key material is zeroized when the handle is dropped.
pub struct P256PrivKey {
    key: SigningKey,
}

impl core::fmt::Debug for P256PrivKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("P256PrivKey(..)")
    }
}

/// P-256 Public Key
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct P256PubKey {
    /// X coordinate
    pub x: P256Scalar,

    /// Y coordinate
    pub y: P256Scalar,
}

impl P256PubKey {
    /// Return the SEC1 uncompressed encoding (`0x04 || x || y`)
    #[inline(never)]
    pub fn to_sec1(&self) -> [u8; P256_PUB_KEY_SIZE] {
        let mut out = [0u8; P256_PUB_KEY_SIZE];
        out[0] = 0x04;
        let x: [u8; P256_SCALAR_SIZE] = self.x.into();
        let y: [u8; P256_SCALAR_SIZE] = self.y.into();
        out[1..1 + P256_SCALAR_SIZE].copy_from_slice(&x);
        out[1 + P256_SCALAR_SIZE..].copy_from_slice(&y);
        out
    }

    fn from_encoded_point(point: &EncodedPoint) -> AttestResult<Self> {
        let (Some(x), Some(y)) = (point.x(), point.y()) else {
            return Err(AttestError::DRIVER_P256_INVALID_PUB_KEY);
        };
        let x: [u8; P256_SCALAR_SIZE] = (*x).into();
        let y: [u8; P256_SCALAR_SIZE] = (*y).into();
        Ok(Self {
            x: P256Scalar::from(&x),
            y: P256Scalar::from(&y),
        })
    }
}

/// P-256 Signature
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct P256Signature {
    /// Random point
    pub r: P256Scalar,

    /// Proof
    pub s: P256Scalar,
}

impl P256Signature {
    /// Return the raw `r || s` encoding used by COSE.
    pub fn to_bytes(&self) -> [u8; P256_SIGNATURE_SIZE] {
        let mut out = [0u8; P256_SIGNATURE_SIZE];
        let r: [u8; P256_SCALAR_SIZE] = self.r.into();
        let s: [u8; P256_SCALAR_SIZE] = self.s.into();
        out[..P256_SCALAR_SIZE].copy_from_slice(&r);
        out[P256_SCALAR_SIZE..].copy_from_slice(&s);
        out
    }

    pub fn zeroize(&mut self) {
        self.r.zeroize();
        self.s.zeroize();
    }
}

/// Elliptic Curve P-256 API
#[derive(Default)]
pub struct P256 {}

impl P256 {
    pub fn new() -> Self {
        Self {}
    }

    /// Import a raw private scalar
    ///
    /// # Arguments
    ///
    /// * `priv_key` - Big-endian private scalar
    ///
    /// # Returns
    ///
    /// * `P256PrivKey` - Handle usable for signing
    pub fn import_priv_key(&mut self, priv_key: &[u8]) -> AttestResult<P256PrivKey> {
        if priv_key.len() != P256_SCALAR_SIZE {
            return Err(AttestError::DRIVER_P256_INVALID_PRIV_KEY);
        }
        let key = SigningKey::from_slice(priv_key)
            .map_err(|_| AttestError::DRIVER_P256_INVALID_PRIV_KEY)?;
        Ok(P256PrivKey { key })
    }

    /// Derive the public key of a private key handle
    pub fn pub_key(&mut self, priv_key: &P256PrivKey) -> AttestResult<P256PubKey> {
        let point = priv_key.key.verifying_key().to_encoded_point(false);
        P256PubKey::from_encoded_point(&point)
    }

    /// Sign the digest with specified private key
    ///
    /// # Arguments
    ///
    /// * `priv_key` - Private key
    /// * `pub_key` - Public key of `priv_key`
    /// * `digest` - SHA-256 digest to sign
    ///
    /// # Returns
    ///
    /// * `P256Signature` - Generated signature
    pub fn sign(
        &mut self,
        priv_key: &P256PrivKey,
        pub_key: &P256PubKey,
        digest: &Array4x8,
    ) -> AttestResult<P256Signature> {
        let digest: [u8; P256_SCALAR_SIZE] = (*digest).into();
        let signature: Signature = priv_key
            .key
            .sign_prehash(&digest)
            .map_err(|_| AttestError::DRIVER_P256_SIGN_FAILED)?;
        let bytes = signature.to_bytes();

        let mut r = [0u8; P256_SCALAR_SIZE];
        let mut s = [0u8; P256_SCALAR_SIZE];
        r.copy_from_slice(&bytes[..P256_SCALAR_SIZE]);
        s.copy_from_slice(&bytes[P256_SCALAR_SIZE..]);
        let mut signature = P256Signature {
            r: P256Scalar::from(&r),
            s: P256Scalar::from(&s),
        };

        // Check the signature against the public key before releasing it.
        if !self.verify(pub_key, &P256Scalar::from(&digest), &signature)? {
            signature.zeroize();
            return Err(AttestError::DRIVER_P256_SIGN_FAILED);
        }

        Ok(signature)
    }

    /// Verify signature with specified public key and digest
    ///
    /// # Result
    ///
    /// *  `bool` - True if the signature verification passed else false
    pub fn verify(
        &mut self,
        pub_key: &P256PubKey,
        digest: &Array4x8,
        signature: &P256Signature,
    ) -> AttestResult<bool> {
        let verifying_key = VerifyingKey::from_sec1_bytes(&pub_key.to_sec1())
            .map_err(|_| AttestError::DRIVER_P256_INVALID_PUB_KEY)?;
        let Ok(signature) = Signature::from_slice(&signature.to_bytes()) else {
            return Ok(false);
        };
        let digest: [u8; P256_SCALAR_SIZE] = (*digest).into();
        Ok(verifying_key.verify_prehash(&digest, &signature).is_ok())
    }
}
