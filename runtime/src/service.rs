/*++

Licensed under the Apache-2.0 license.

File Name:

    service.rs

Abstract:

    File contains the caller facing Initial Attestation service: token,
    token size and public key requests.

--*/

use crate::boot_status::BootStatusStore;
use crate::claims::ClaimCollector;
use crate::error::TokenError;
use crate::key_manager::{KeyId, KeyManager};
use crate::platform::{AttestKeyProvider, AttestPlatform};
use crate::token::{TokenEncoder, TokenSigner, SHORT_CIRCUIT_KID};
use bitflags::bitflags;
use iat_drivers::{cprintln, AttestError, AttestResult, Sha256Alg, P256_PUB_KEY_SIZE};
use iat_eat::CborEncoder;

/// Accepted challenge sizes: SHA-256, SHA-384 and SHA-512 digests.
pub const CHALLENGE_SIZES: [usize; 3] = [32, 48, 64];

/// Upper bound of a token built with every optional claim enabled.
pub const MAX_TOKEN_SIZE: usize = 0x800;

bitflags! {
    /// Token build options
    #[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
    pub struct TokenOptions: u32 {
        /// Only include the challenge claim.
        const OMIT_CLAIMS = 0x1;
        /// Replace the signature with a digest derived value. Only accepted
        /// by builds with the `short-circuit-sig` feature.
        ///
        /// The key is not loaded in this mode, so the instance ID claim needs
        /// a public key memoized by an earlier request (`get_public_key` or a
        /// signed token). Without one the build fails with
        /// `CLAIM_INSTANCE_ID_UNAVAILABLE` unless `OMIT_CLAIMS` is also set.
        const SHORT_CIRCUIT_SIGN = 0x2;
    }
}

pub struct InitialAttestation<P: AttestPlatform, K: AttestKeyProvider, S: Sha256Alg> {
    platform: P,
    key_provider: K,
    sha: S,
    boot_status: BootStatusStore,
    key_manager: KeyManager,
}

impl<P: AttestPlatform, K: AttestKeyProvider, S: Sha256Alg> InitialAttestation<P, K, S> {
    /// Create the service and take the private copy of the boot status.
    pub fn new(mut platform: P, key_provider: K, sha: S) -> Self {
        let boot_status = BootStatusStore::load(&mut platform);
        Self {
            platform,
            key_provider,
            sha,
            boot_status,
            key_manager: KeyManager::new(),
        }
    }

    pub fn boot_status(&self) -> &BootStatusStore {
        &self.boot_status
    }

    pub fn key_manager(&self) -> &KeyManager {
        &self.key_manager
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn key_provider(&self) -> &K {
        &self.key_provider
    }

    pub fn key_provider_mut(&mut self) -> &mut K {
        &mut self.key_provider
    }

    pub fn sha(&self) -> &S {
        &self.sha
    }

    /// Build a signed token into `out`.
    ///
    /// # Arguments
    ///
    /// * `challenge` - Caller nonce, 32, 48 or 64 bytes
    /// * `options` - Build options
    /// * `out` - Output buffer
    ///
    /// # Returns
    ///
    /// * `usize` - Length of the token
    pub fn get_token(
        &mut self,
        challenge: &[u8],
        options: TokenOptions,
        out: &mut [u8],
    ) -> AttestResult<usize> {
        validate_request(challenge, options)?;
        let len = self.build(CborEncoder::new(out), challenge, options)?;
        cprintln!("[attest] Token built, len={}", len);
        Ok(len)
    }

    /// Size of the token `get_token` would build for the same request.
    pub fn get_token_size(
        &mut self,
        challenge: &[u8],
        options: TokenOptions,
    ) -> AttestResult<usize> {
        validate_request(challenge, options)?;
        self.build(CborEncoder::size_only(), challenge, options)
    }

    /// Copy the SEC1 uncompressed attestation public key into `out`.
    ///
    /// The key is loaded once if no token was built yet.
    ///
    /// # Returns
    ///
    /// * `(usize, i32)` - Key length and COSE curve identifier
    pub fn get_public_key(&mut self, out: &mut [u8]) -> AttestResult<(usize, i32)> {
        if out.len() < P256_PUB_KEY_SIZE {
            return Err(AttestError::SERVICE_BUFFER_TOO_SMALL);
        }

        if self.key_manager.public_key().is_err() {
            self.key_manager
                .register(&mut self.key_provider)
                .map_err(|e| log_failure(e.into()))?;
            self.key_manager
                .unregister()
                .map_err(|e| log_failure(e.into()))?;
        }

        let (pub_key, curve) = self
            .key_manager
            .public_key()
            .map_err(|e| log_failure(e.into()))?;
        out[..P256_PUB_KEY_SIZE].copy_from_slice(&pub_key.to_sec1());
        Ok((P256_PUB_KEY_SIZE, curve))
    }

    /// Build a token with the attestation key loaded for the duration of
    /// the build. The key is released on every path.
    fn build(
        &mut self,
        encoder: CborEncoder,
        challenge: &[u8],
        options: TokenOptions,
    ) -> AttestResult<usize> {
        if options.contains(TokenOptions::SHORT_CIRCUIT_SIGN) {
            return self
                .build_registered(encoder, challenge, options)
                .map_err(|e| log_failure(e.into()));
        }

        self.key_manager
            .register(&mut self.key_provider)
            .map_err(|e| log_failure(e.into()))?;
        let result = self.build_registered(encoder, challenge, options);
        let released = self.key_manager.unregister();

        let len = result.map_err(|e| log_failure(e.into()))?;
        released.map_err(|e| log_failure(e.into()))?;
        Ok(len)
    }

    fn build_registered(
        &mut self,
        encoder: CborEncoder,
        challenge: &[u8],
        options: TokenOptions,
    ) -> Result<usize, TokenError> {
        let short_circuit = options.contains(TokenOptions::SHORT_CIRCUIT_SIGN);
        let kid = self.kid(short_circuit);
        let mut token = TokenEncoder::start(encoder, kid.as_ref().map(|kid| &kid[..]))?;

        let pub_key = self.key_manager.public_key().ok().map(|(key, _)| *key);
        ClaimCollector::new(&self.boot_status, &self.platform).collect(
            &mut token,
            challenge,
            options,
            pub_key.as_ref(),
            &mut self.sha,
        )?;

        let signer = if short_circuit {
            TokenSigner::ShortCircuit
        } else {
            TokenSigner::Key(&mut self.key_manager)
        };
        token.finish(&mut self.sha, signer)
    }

    /// Key ID for the unprotected header. A key ID that cannot be computed
    /// is left out of the token.
    fn kid(&mut self, short_circuit: bool) -> Option<KeyId> {
        if short_circuit {
            return Some(SHORT_CIRCUIT_KID);
        }

        #[cfg(feature = "key-id")]
        {
            match self.key_manager.key_identifier(&mut self.sha) {
                Ok(kid) => return Some(kid),
                Err(e) => {
                    cprintln!(
                        "[attest] Key ID unavailable: 0x{:x}",
                        u32::from(AttestError::from(e))
                    );
                }
            }
        }

        None
    }
}

fn validate_request(challenge: &[u8], options: TokenOptions) -> AttestResult<()> {
    if !CHALLENGE_SIZES.contains(&challenge.len()) {
        cprintln!("[attest] Invalid challenge size {}", challenge.len());
        return Err(AttestError::SERVICE_INVALID_CHALLENGE_SIZE);
    }
    if options.contains(TokenOptions::SHORT_CIRCUIT_SIGN)
        && !cfg!(any(test, feature = "short-circuit-sig"))
    {
        cprintln!("[attest] Short-circuit signing disabled");
        return Err(AttestError::SERVICE_SHORT_CIRCUIT_DISABLED);
    }
    Ok(())
}

fn log_failure(err: AttestError) -> AttestError {
    cprintln!("[attest] Token request failed: 0x{:x}", u32::from(err));
    err
}
