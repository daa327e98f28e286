/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    Status codes returned by the initial attestation service. Every layer of
    the service owns a distinct code range so a status seen at the service
    boundary still identifies the layer that failed.

--*/
#![cfg_attr(not(feature = "std"), no_std)]
use core::convert::From;
use core::num::{NonZeroU32, TryFromIntError};

/// Attestation Error Type
/// Derives debug, copy, clone, eq, and partial eq
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct AttestError(pub NonZeroU32);

/// Coarse classification of an [`AttestError`], matching the small set of
/// status values a caller of the attestation service can act on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AttestStatus {
    /// The caller-provided buffer cannot hold the result.
    BufferOverflow,
    /// A mandatory claim could not be obtained.
    ClaimUnavailable,
    /// The request itself was rejected.
    InvalidInput,
    /// The service could not be brought up.
    InitFailed,
    /// Any other failure.
    General,
}

/// Macro to define error constants ensuring uniqueness
///
/// This macro takes a list of (name, value, doc) tuples and generates
/// constant definitions for each error code.
#[macro_export]
macro_rules! define_error_constants {
    ($(($name:ident, $value:expr, $doc:expr)),* $(,)?) => {
        $(
            #[doc = $doc]
            pub const $name: AttestError = AttestError::new_const($value);
        )*

        #[cfg(test)]
        /// Returns a vector of all defined error constants for testing uniqueness
        pub fn all_constants() -> Vec<(&'static str, u32)> {
            vec![
                $(
                    (stringify!($name), $value),
                )*
            ]
        }
    };
}

/// Code range of the claim collector.
const CLAIM_COMPONENT: u32 = 0x0003;

impl AttestError {
    /// Create an attestation error; intended to only be used from const contexts, as we don't
    /// want runtime panics if val is zero. The preferred way to get an AttestError from a u32
    /// is to use `AttestError::try_from()` from the `TryFrom` trait impl.
    const fn new_const(val: u32) -> Self {
        match NonZeroU32::new(val) {
            Some(val) => Self(val),
            None => panic!("AttestError cannot be 0"),
        }
    }

    define_error_constants![
        (
            BOOT_STATUS_UNINITIALIZED,
            0x0001_0001,
            "Boot status Error: shared data was never copied in"
        ),
        (
            BOOT_STATUS_BAD_MAGIC,
            0x0001_0002,
            "Boot status Error: header magic is invalid"
        ),
        (
            BOOT_STATUS_BAD_TOTAL_LENGTH,
            0x0001_0003,
            "Boot status Error: total length is shorter than the header or exceeds the copied data"
        ),
        (
            BOOT_STATUS_ENTRY_TOO_SHORT,
            0x0001_0004,
            "Boot status Error: entry length is shorter than its header"
        ),
        (
            BOOT_STATUS_ENTRY_OVERRUN,
            0x0001_0005,
            "Boot status Error: entry runs past the total length"
        ),
        (
            BOOT_STATUS_INVALID_INT_WIDTH,
            0x0001_0006,
            "Boot status Error: integer field is not 1, 2 or 4 bytes wide"
        ),
        (
            ENCODER_BUFFER_TOO_SMALL,
            0x0002_0001,
            "Encoder Error: output buffer too small"
        ),
        (
            ENCODER_INVALID_DATA,
            0x0002_0002,
            "Encoder Error: value cannot be encoded"
        ),
        (
            ENCODER_NESTING_TOO_DEEP,
            0x0002_0003,
            "Encoder Error: too many open arrays or maps"
        ),
        (
            ENCODER_UNBALANCED_NESTING,
            0x0002_0004,
            "Encoder Error: close without matching open, or open left at finish"
        ),
        (
            CLAIM_BOOT_SEED_UNAVAILABLE,
            0x0003_0001,
            "Claim Error: boot seed unavailable"
        ),
        (
            CLAIM_INSTANCE_ID_UNAVAILABLE,
            0x0003_0002,
            "Claim Error: instance ID unavailable"
        ),
        (
            CLAIM_IMPLEMENTATION_ID_UNAVAILABLE,
            0x0003_0003,
            "Claim Error: implementation ID unavailable"
        ),
        (
            CLAIM_CALLER_ID_UNAVAILABLE,
            0x0003_0004,
            "Claim Error: caller ID unavailable"
        ),
        (
            CLAIM_SECURITY_LIFECYCLE_UNAVAILABLE,
            0x0003_0005,
            "Claim Error: security lifecycle unavailable"
        ),
        (
            CLAIM_HW_VERSION_UNAVAILABLE,
            0x0003_0006,
            "Claim Error: hardware version unavailable"
        ),
        (
            CLAIM_VERIFICATION_SERVICE_UNAVAILABLE,
            0x0003_0007,
            "Claim Error: verification service indicator unavailable"
        ),
        (
            CLAIM_PROFILE_DEFINITION_UNAVAILABLE,
            0x0003_0008,
            "Claim Error: profile definition unavailable"
        ),
        (
            CLAIM_CHALLENGE_UNAVAILABLE,
            0x0003_0009,
            "Claim Error: challenge unavailable"
        ),
        (
            CLAIM_SW_COMPONENTS_UNAVAILABLE,
            0x0003_000A,
            "Claim Error: software components unavailable"
        ),
        (
            CLAIM_INVALID_SIZE,
            0x0003_0010,
            "Claim Error: claim value has an invalid size"
        ),
        (
            CLAIM_INVALID_SECURITY_LIFECYCLE,
            0x0003_0011,
            "Claim Error: security lifecycle out of range"
        ),
        (
            CLAIM_INVALID_UTF8,
            0x0003_0012,
            "Claim Error: text claim is not valid UTF-8"
        ),
        (
            KEY_ALREADY_REGISTERED,
            0x0004_0001,
            "Key Error: attestation key already registered"
        ),
        (
            KEY_NOT_REGISTERED,
            0x0004_0002,
            "Key Error: attestation key not registered"
        ),
        (
            KEY_SIGNING_KEY_UNAVAILABLE,
            0x0004_0003,
            "Key Error: attestation key could not be provisioned"
        ),
        (
            KEY_IMPORT_FAILED,
            0x0004_0004,
            "Key Error: attestation key import failed"
        ),
        (
            KEY_NOT_AVAILABLE,
            0x0004_0005,
            "Key Error: public key not available"
        ),
        (
            KEY_HASH_OR_SIGNATURE_FAILURE,
            0x0004_0006,
            "Key Error: hashing or signing failed"
        ),
        (
            DRIVER_SHA256_INVALID_STATE,
            0x0005_0001,
            "Driver Error: SHA256 invalid state"
        ),
        (
            DRIVER_SHA256_MAX_DATA,
            0x0005_0002,
            "Driver Error: SHA256 max data exceeded"
        ),
        (
            DRIVER_P256_INVALID_PRIV_KEY,
            0x0005_0010,
            "Driver Error: P256 private key is invalid"
        ),
        (
            DRIVER_P256_INVALID_DIGEST,
            0x0005_0011,
            "Driver Error: P256 digest is invalid"
        ),
        (
            DRIVER_P256_SIGN_FAILED,
            0x0005_0012,
            "Driver Error: P256 signing failed"
        ),
        (
            DRIVER_P256_INVALID_PUB_KEY,
            0x0005_0013,
            "Driver Error: P256 public key is invalid"
        ),
        (
            SERVICE_INVALID_CHALLENGE_SIZE,
            0x0006_0001,
            "Service Error: challenge size is not supported"
        ),
        (
            SERVICE_SHORT_CIRCUIT_DISABLED,
            0x0006_0002,
            "Service Error: short-circuit signing is not enabled in this build"
        ),
        (
            SERVICE_BUFFER_TOO_SMALL,
            0x0006_0003,
            "Service Error: output buffer too small"
        ),
    ];

    /// Layer that produced this error.
    pub fn component(&self) -> u32 {
        self.0.get() >> 16
    }

    /// Collapse the error to the status reported to callers.
    pub fn status(&self) -> AttestStatus {
        if *self == Self::ENCODER_BUFFER_TOO_SMALL || *self == Self::SERVICE_BUFFER_TOO_SMALL {
            AttestStatus::BufferOverflow
        } else if *self == Self::SERVICE_INVALID_CHALLENGE_SIZE
            || *self == Self::SERVICE_SHORT_CIRCUIT_DISABLED
        {
            AttestStatus::InvalidInput
        } else if *self == Self::BOOT_STATUS_UNINITIALIZED {
            AttestStatus::InitFailed
        } else if self.component() == CLAIM_COMPONENT && self.0.get() & 0xffff < 0x10 {
            // 0x0003_0001..=0x0003_000f are the "unavailable" codes.
            AttestStatus::ClaimUnavailable
        } else {
            AttestStatus::General
        }
    }
}

impl From<core::num::NonZeroU32> for crate::AttestError {
    fn from(val: core::num::NonZeroU32) -> Self {
        crate::AttestError(val)
    }
}

impl From<AttestError> for core::num::NonZeroU32 {
    fn from(val: AttestError) -> Self {
        val.0
    }
}

impl From<AttestError> for u32 {
    fn from(val: AttestError) -> Self {
        core::num::NonZeroU32::from(val).get()
    }
}

impl TryFrom<u32> for AttestError {
    type Error = TryFromIntError;
    fn try_from(val: u32) -> Result<Self, TryFromIntError> {
        match NonZeroU32::try_from(val) {
            Ok(val) => Ok(AttestError(val)),
            Err(err) => Err(err),
        }
    }
}

pub type AttestResult<T> = Result<T, AttestError>;
