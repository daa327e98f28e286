/*++

Licensed under the Apache-2.0 license.

File Name:

    token.rs

Abstract:

    File contains the token encoder: it frames the claims as the payload of a
    COSE_Sign1 message and signs the message while streaming the signature
    input through SHA-256.

--*/

use crate::claims::ClaimValue;
use crate::error::TokenError;
use crate::key_manager::KeyManager;
use arrayvec::ArrayVec;
use iat_drivers::{Array4x8, Sha256Alg, Sha256DigestOp, P256_SIGNATURE_SIZE};
use iat_eat::{
    CborEncodable, CborEncoder, EatError, ProtectedHeader, SigStructure, UnprotectedHeader,
    PROTECTED_HEADER_MAX_SIZE, SIG_STRUCTURE_PREFIX_MAX_SIZE,
};

/// Key ID placed in tokens signed with a short-circuit signature.
pub const SHORT_CIRCUIT_KID: [u8; 32] = [
    0xEF, 0x95, 0x4B, 0x4B, 0xD9, 0xBD, 0xF6, 0x70, 0xD0, 0x33, 0x60, 0x82, 0xF5, 0xEF, 0x15, 0x2A,
    0xF8, 0xF3, 0x5B, 0x6A, 0x6C, 0x00, 0xEF, 0xA6, 0xA9, 0xA7, 0x1F, 0x49, 0x51, 0x7E, 0x18, 0xC6,
];

/// How the token signature is produced
pub enum TokenSigner<'a> {
    /// ECDSA P-256 with the registered attestation key
    Key(&'a mut KeyManager),

    /// Signature input digest repeated to the signature length; test only
    ShortCircuit,
}

/// COSE_Sign1 attestation token under construction
///
/// ```text
/// 18([
///     bstr .cbor { 1: -7 },   // protected header, ES256
///     { ? 4: kid },           // unprotected header
///     bstr .cbor { claims },  // payload
///     bstr(64)                // signature
/// ])
/// ```
pub struct TokenEncoder<'a> {
    encoder: CborEncoder<'a>,
    protected: ArrayVec<u8, PROTECTED_HEADER_MAX_SIZE>,
}

impl<'a> TokenEncoder<'a> {
    /// Write the envelope and headers, and open the claims map.
    ///
    /// # Arguments
    ///
    /// * `encoder` - Encoder over the output buffer, or a size-only encoder
    /// * `kid` - Key identifier for the unprotected header
    pub fn start(mut encoder: CborEncoder<'a>, kid: Option<&[u8]>) -> Result<Self, TokenError> {
        let mut header_buf = [0u8; PROTECTED_HEADER_MAX_SIZE];
        let header_len = ProtectedHeader::new_es256().encode(&mut header_buf)?;
        let protected = ArrayVec::try_from(&header_buf[..header_len])
            .map_err(|_| EatError::BufferTooSmall)?;

        encoder.encode_cose_sign1_tag()?;
        encoder.encode_array_header(4)?;
        encoder.encode_bytes(&protected)?;
        UnprotectedHeader { kid }.encode(&mut encoder)?;

        encoder.open_bstr_wrap()?;
        encoder.open_map()?;

        Ok(Self { encoder, protected })
    }

    fn encode_value(&mut self, value: ClaimValue) -> Result<(), TokenError> {
        match value {
            ClaimValue::Int(value) => self.encoder.encode_int(value)?,
            ClaimValue::Bytes(bytes) => self.encoder.encode_bytes(bytes)?,
            ClaimValue::Text(text) => self.encoder.encode_text(text)?,
            ClaimValue::Encoded(encoded) => self.encoder.encode_preencoded(encoded)?,
        }
        Ok(())
    }

    /// Append a claim to the claims map.
    pub fn add_claim(&mut self, label: i64, value: ClaimValue) -> Result<(), TokenError> {
        self.encoder.encode_int(label)?;
        self.encode_value(value)
    }

    /// Open an array valued claim.
    pub fn open_array(&mut self, label: i64) -> Result<(), TokenError> {
        self.encoder.encode_int(label)?;
        self.encoder.open_array()?;
        Ok(())
    }

    /// Append an item to the open array claim.
    pub fn add_array_item(&mut self, value: ClaimValue) -> Result<(), TokenError> {
        self.encode_value(value)
    }

    pub fn close_array(&mut self) -> Result<(), TokenError> {
        self.encoder.close_array()?;
        Ok(())
    }

    /// Close the claims, sign the message and close the envelope.
    ///
    /// # Returns
    ///
    /// * `usize` - Length of the encoded token
    pub fn finish<S: Sha256Alg>(
        mut self,
        sha: &mut S,
        signer: TokenSigner,
    ) -> Result<usize, TokenError> {
        self.encoder.close_map()?;
        let payload = self.encoder.close_bstr_wrap()?;

        // Everything before the payload, with an empty placeholder in its place
        let mut prefix = [0u8; SIG_STRUCTURE_PREFIX_MAX_SIZE];
        let prefix_len = SigStructure {
            protected: &self.protected,
            external_aad: &[],
        }
        .encode_without_payload(&mut prefix)?;

        let mut digest = Array4x8::default();
        let mut op = sha.digest_init().map_err(TokenError::HashOrSignature)?;
        op.update(&prefix[..prefix_len])
            .map_err(TokenError::HashOrSignature)?;
        // A size-only encoder holds no payload bytes
        if let Some(payload_bytes) = self.encoder.encoded(payload) {
            op.update(payload_bytes)
                .map_err(TokenError::HashOrSignature)?;
        }
        op.finalize(&mut digest)
            .map_err(TokenError::HashOrSignature)?;

        let signature = match signer {
            TokenSigner::Key(key_manager) => key_manager.sign(&digest)?.to_bytes(),
            TokenSigner::ShortCircuit => short_circuit_signature(&digest),
        };
        self.encoder.encode_bytes(&signature)?;

        Ok(self.encoder.finish()?)
    }
}

fn short_circuit_signature(digest: &Array4x8) -> [u8; P256_SIGNATURE_SIZE] {
    let digest: [u8; 32] = (*digest).into();
    let mut signature = [0u8; P256_SIGNATURE_SIZE];
    for chunk in signature.chunks_mut(digest.len()) {
        chunk.copy_from_slice(&digest[..chunk.len()]);
    }
    signature
}
