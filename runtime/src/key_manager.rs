/*++

Licensed under the Apache-2.0 license.

File Name:

    key_manager.rs

Abstract:

    File contains the attestation key manager. It holds the single key slot
    used while a token is signed, and the public key and key identifier
    derived from the first key it loads.

--*/

use crate::error::KeyError;
use crate::platform::AttestKeyProvider;
use iat_drivers::{
    cprintln, Array4x8, P256PrivKey, P256PubKey, P256Signature, COSE_CURVE_P256, P256,
};
#[cfg(feature = "key-id")]
use iat_drivers::{printer::HexBytes, Sha256Alg};
#[cfg(feature = "key-id")]
use iat_eat::{CborEncodable, CborEncoder, CoseKey, COSE_KEY_MAX_SIZE};

/// Size of the key identifier.
pub const KEY_ID_SIZE: usize = 32;

pub type KeyId = [u8; KEY_ID_SIZE];

/// Attestation key slot
///
/// ```text
///   Unregistered --register()--> Registered --unregister()--> Unregistered
/// ```
#[derive(Default)]
pub struct KeyManager {
    p256: P256,

    /// Private key of the current registration
    priv_key: Option<P256PrivKey>,

    /// Public key and curve of the first successful registration
    pub_key: Option<(P256PubKey, i32)>,

    #[cfg(feature = "key-id")]
    key_id: Option<KeyId>,
}

impl KeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.priv_key.is_some()
    }

    /// Load the attestation key into the slot.
    ///
    /// # Arguments
    ///
    /// * `provider` - Source of the private key
    pub fn register<K: AttestKeyProvider>(&mut self, provider: &mut K) -> Result<(), KeyError> {
        if self.priv_key.is_some() {
            return Err(KeyError::AlreadyRegistered);
        }

        let material = provider.initial_attest_key().map_err(|e| {
            cprintln!("[attest] Key provisioning failed: 0x{:x}", u32::from(e));
            KeyError::SigningKeyUnavailable
        })?;
        if material.curve != COSE_CURVE_P256 {
            return Err(KeyError::ImportFailed);
        }

        let priv_key = self
            .p256
            .import_priv_key(&material.priv_key)
            .map_err(|_| KeyError::ImportFailed)?;
        if self.pub_key.is_none() {
            let pub_key = self
                .p256
                .pub_key(&priv_key)
                .map_err(|_| KeyError::ImportFailed)?;
            self.pub_key = Some((pub_key, material.curve));
        }
        self.priv_key = Some(priv_key);
        Ok(())
    }

    /// Release the private key. The public key and key identifier are kept.
    pub fn unregister(&mut self) -> Result<(), KeyError> {
        match self.priv_key.take() {
            Some(_) => Ok(()),
            None => Err(KeyError::NotRegistered),
        }
    }

    /// Public key and COSE curve of the attestation key.
    pub fn public_key(&self) -> Result<(&P256PubKey, i32), KeyError> {
        self.pub_key
            .as_ref()
            .map(|(key, curve)| (key, *curve))
            .ok_or(KeyError::NotAvailable)
    }

    /// SHA-256 of the public key encoded as a COSE_Key, computed once.
    #[cfg(feature = "key-id")]
    pub fn key_identifier<S: Sha256Alg>(&mut self, sha: &mut S) -> Result<KeyId, KeyError> {
        if let Some(key_id) = self.key_id {
            return Ok(key_id);
        }

        let (pub_key, curve) = self.public_key()?;
        let x: [u8; 32] = pub_key.x.into();
        let y: [u8; 32] = pub_key.y.into();

        let mut buf = [0u8; COSE_KEY_MAX_SIZE];
        let len = {
            let mut encoder = CborEncoder::new(&mut buf);
            CoseKey {
                curve: curve as u64,
                x: &x,
                y: &y,
            }
            .encode(&mut encoder)?;
            encoder.finish()?
        };

        let digest = sha
            .digest(&buf[..len])
            .map_err(KeyError::HashOrSignature)?;
        let key_id: KeyId = digest.into();
        cprintln!("[attest] Key ID {}", HexBytes(&key_id));
        self.key_id = Some(key_id);
        Ok(key_id)
    }

    /// Sign a SHA-256 digest with the registered key.
    pub fn sign(&mut self, digest: &Array4x8) -> Result<P256Signature, KeyError> {
        let priv_key = self.priv_key.as_ref().ok_or(KeyError::NotRegistered)?;
        let (pub_key, _) = self.pub_key.as_ref().ok_or(KeyError::NotAvailable)?;
        self.p256
            .sign(priv_key, pub_key, digest)
            .map_err(KeyError::HashOrSignature)
    }
}
