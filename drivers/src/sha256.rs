/*++

Licensed under the Apache-2.0 license.

File Name:

    sha256.rs

Abstract:

    File contains API for SHA-256 Cryptography operations

--*/

use crate::{Array4x8, AttestError, AttestResult};
use sha2::Digest;

const SHA256_MAX_DATA_SIZE: usize = 1024 * 1024;

pub trait Sha256DigestOp<'a> {
    fn update(&mut self, data: &[u8]) -> AttestResult<()>;

    /// # Arguments
    ///
    /// * `digest`  - result of the sha256 digest operation
    fn finalize(self, digest: &mut Array4x8) -> AttestResult<()>;
}

pub trait Sha256Alg {
    type DigestOp<'a>: Sha256DigestOp<'a>
    where
        Self: 'a;

    fn digest_init(&mut self) -> AttestResult<Self::DigestOp<'_>>;
    fn digest(&mut self, buf: &[u8]) -> AttestResult<Array4x8>;
}

/// SHA-256 engine backed by the `sha2` software implementation.
#[derive(Default)]
pub struct Sha256 {
    // Number of digest operations started; kept for diagnostics.
    ops: u32,
}

impl Sha256 {
    pub fn new() -> Self {
        Self { ops: 0 }
    }

    /// Number of digest operations started on this engine.
    pub fn ops(&self) -> u32 {
        self.ops
    }
}

impl Sha256Alg for Sha256 {
    type DigestOp<'a> = Sha256DigestOpSw<'a>;

    /// Initialize multi step digest operation
    ///
    /// # Returns
    ///
    /// * `Sha256DigestOpSw` - Object representing the digest operation
    fn digest_init(&mut self) -> AttestResult<Sha256DigestOpSw<'_>> {
        self.ops = self.ops.wrapping_add(1);
        Ok(Sha256DigestOpSw {
            _sha: self,
            state: Sha256DigestState::Init,
            hasher: sha2::Sha256::new(),
            data_size: 0,
        })
    }

    /// Calculate the digest of the buffer
    ///
    /// # Arguments
    ///
    /// * `buf` - Buffer to calculate the digest over
    fn digest(&mut self, buf: &[u8]) -> AttestResult<Array4x8> {
        if buf.len() > SHA256_MAX_DATA_SIZE {
            return Err(AttestError::DRIVER_SHA256_MAX_DATA);
        }

        let mut digest = Array4x8::default();
        let mut op = self.digest_init()?;
        op.update(buf)?;
        op.finalize(&mut digest)?;
        Ok(digest)
    }
}

/// SHA-256 digest state
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Sha256DigestState {
    /// Initial state
    Init,

    /// Pending state
    Pending,

    /// Final state
    Final,
}

/// Multi step SHA-256 digest operation
pub struct Sha256DigestOpSw<'a> {
    /// SHA-256 Engine
    _sha: &'a mut Sha256,

    /// State
    state: Sha256DigestState,

    /// Running hash
    hasher: sha2::Sha256,

    /// Data size
    data_size: usize,
}

impl<'a> Sha256DigestOp<'a> for Sha256DigestOpSw<'a> {
    /// Update the digest with data
    ///
    /// # Arguments
    ///
    /// * `data` - Data to used to update the digest
    fn update(&mut self, data: &[u8]) -> AttestResult<()> {
        if self.state == Sha256DigestState::Final {
            return Err(AttestError::DRIVER_SHA256_INVALID_STATE);
        }

        let data_size = self
            .data_size
            .checked_add(data.len())
            .ok_or(AttestError::DRIVER_SHA256_MAX_DATA)?;
        if data_size > SHA256_MAX_DATA_SIZE {
            return Err(AttestError::DRIVER_SHA256_MAX_DATA);
        }

        self.hasher.update(data);
        self.data_size = data_size;
        self.state = Sha256DigestState::Pending;
        Ok(())
    }

    /// Finalize the digest operations
    fn finalize(mut self, digest: &mut Array4x8) -> AttestResult<()> {
        if self.state == Sha256DigestState::Final {
            return Err(AttestError::DRIVER_SHA256_INVALID_STATE);
        }
        self.state = Sha256DigestState::Final;

        let out: [u8; 32] = self.hasher.finalize().into();
        *digest = Array4x8::from(&out);
        Ok(())
    }
}
