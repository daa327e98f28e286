// Licensed under the Apache-2.0 license

//! Error vocabularies of the token build pipeline.
//!
//! Each layer reports its own error type. They are only collapsed into an
//! [`AttestError`] code at the service boundary.

use crate::claims::Claim;
use iat_eat::EatError;
use iat_error::AttestError;

/// Boot status shared data decode errors
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BootStatusError {
    /// No shared data was copied in.
    Uninitialized,
    BadMagic,
    /// Total length is shorter than the header or longer than the copied data.
    BadTotalLength,
    /// Entry length is shorter than the entry header.
    EntryTooShort,
    /// Entry runs past the total length.
    EntryOverrun,
    /// Integer field is not 1, 2 or 4 bytes wide.
    InvalidIntWidth,
}

/// Claim collection errors
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClaimError {
    /// Neither the boot status nor the platform provides the claim.
    Unavailable(Claim),
    InvalidSize(Claim),
    InvalidSecurityLifecycle(u32),
    InvalidUtf8(Claim),
}

/// Attestation key lifecycle errors
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyError {
    AlreadyRegistered,
    NotRegistered,
    /// The key provider did not return a key.
    SigningKeyUnavailable,
    ImportFailed,
    /// No key was ever registered, so there is no public key.
    NotAvailable,
    Encoding(EatError),
    HashOrSignature(AttestError),
}

/// Any failure while building a token
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenError {
    BootStatus(BootStatusError),
    Encoder(EatError),
    Claim(ClaimError),
    Key(KeyError),
    HashOrSignature(AttestError),
}

impl From<BootStatusError> for TokenError {
    fn from(err: BootStatusError) -> Self {
        TokenError::BootStatus(err)
    }
}

impl From<EatError> for TokenError {
    fn from(err: EatError) -> Self {
        TokenError::Encoder(err)
    }
}

impl From<ClaimError> for TokenError {
    fn from(err: ClaimError) -> Self {
        TokenError::Claim(err)
    }
}

impl From<KeyError> for TokenError {
    fn from(err: KeyError) -> Self {
        TokenError::Key(err)
    }
}

impl From<EatError> for KeyError {
    fn from(err: EatError) -> Self {
        KeyError::Encoding(err)
    }
}

impl From<BootStatusError> for AttestError {
    fn from(err: BootStatusError) -> Self {
        match err {
            BootStatusError::Uninitialized => AttestError::BOOT_STATUS_UNINITIALIZED,
            BootStatusError::BadMagic => AttestError::BOOT_STATUS_BAD_MAGIC,
            BootStatusError::BadTotalLength => AttestError::BOOT_STATUS_BAD_TOTAL_LENGTH,
            BootStatusError::EntryTooShort => AttestError::BOOT_STATUS_ENTRY_TOO_SHORT,
            BootStatusError::EntryOverrun => AttestError::BOOT_STATUS_ENTRY_OVERRUN,
            BootStatusError::InvalidIntWidth => AttestError::BOOT_STATUS_INVALID_INT_WIDTH,
        }
    }
}

fn encoder_error(err: EatError) -> AttestError {
    match err {
        EatError::BufferTooSmall => AttestError::ENCODER_BUFFER_TOO_SMALL,
        EatError::InvalidData => AttestError::ENCODER_INVALID_DATA,
        EatError::NestingTooDeep => AttestError::ENCODER_NESTING_TOO_DEEP,
        EatError::UnbalancedNesting => AttestError::ENCODER_UNBALANCED_NESTING,
    }
}

fn claim_unavailable(claim: Claim) -> AttestError {
    match claim {
        Claim::Challenge => AttestError::CLAIM_CHALLENGE_UNAVAILABLE,
        Claim::BootSeed => AttestError::CLAIM_BOOT_SEED_UNAVAILABLE,
        Claim::InstanceId => AttestError::CLAIM_INSTANCE_ID_UNAVAILABLE,
        Claim::ImplementationId => AttestError::CLAIM_IMPLEMENTATION_ID_UNAVAILABLE,
        Claim::CallerId => AttestError::CLAIM_CALLER_ID_UNAVAILABLE,
        Claim::SecurityLifecycle => AttestError::CLAIM_SECURITY_LIFECYCLE_UNAVAILABLE,
        Claim::SwComponents => AttestError::CLAIM_SW_COMPONENTS_UNAVAILABLE,
        Claim::VerificationService => AttestError::CLAIM_VERIFICATION_SERVICE_UNAVAILABLE,
        Claim::ProfileDefinition => AttestError::CLAIM_PROFILE_DEFINITION_UNAVAILABLE,
        Claim::HwVersion => AttestError::CLAIM_HW_VERSION_UNAVAILABLE,
    }
}

impl From<ClaimError> for AttestError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::Unavailable(claim) => claim_unavailable(claim),
            ClaimError::InvalidSize(_) => AttestError::CLAIM_INVALID_SIZE,
            ClaimError::InvalidSecurityLifecycle(_) => {
                AttestError::CLAIM_INVALID_SECURITY_LIFECYCLE
            }
            ClaimError::InvalidUtf8(_) => AttestError::CLAIM_INVALID_UTF8,
        }
    }
}

impl From<KeyError> for AttestError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::AlreadyRegistered => AttestError::KEY_ALREADY_REGISTERED,
            KeyError::NotRegistered => AttestError::KEY_NOT_REGISTERED,
            KeyError::SigningKeyUnavailable => AttestError::KEY_SIGNING_KEY_UNAVAILABLE,
            KeyError::ImportFailed => AttestError::KEY_IMPORT_FAILED,
            KeyError::NotAvailable => AttestError::KEY_NOT_AVAILABLE,
            KeyError::Encoding(err) => encoder_error(err),
            KeyError::HashOrSignature(_) => AttestError::KEY_HASH_OR_SIGNATURE_FAILURE,
        }
    }
}

impl From<TokenError> for AttestError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::BootStatus(err) => err.into(),
            TokenError::Encoder(err) => encoder_error(err),
            TokenError::Claim(err) => err.into(),
            TokenError::Key(err) => err.into(),
            TokenError::HashOrSignature(_) => AttestError::KEY_HASH_OR_SIGNATURE_FAILURE,
        }
    }
}
