/*++

Licensed under the Apache-2.0 license.

File Name:

    lib.rs

Abstract:

    File contains exports for the Initial Attestation service library.

--*/
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod boot_status;
pub mod claims;
pub mod error;
pub mod key_manager;
pub mod platform;
mod service;
pub mod token;

pub use boot_status::{BootStatusStore, TlvCursor, TlvEntry};
pub use claims::{Claim, ClaimCollector, ClaimValue};
pub use error::{BootStatusError, ClaimError, KeyError, TokenError};
pub use iat_error::{AttestError, AttestResult, AttestStatus};
pub use key_manager::{KeyId, KeyManager, KEY_ID_SIZE};
pub use platform::{AttestKeyMaterial, AttestKeyProvider, AttestPlatform};
pub use service::{InitialAttestation, TokenOptions, CHALLENGE_SIZES, MAX_TOKEN_SIZE};
pub use token::{TokenEncoder, TokenSigner, SHORT_CIRCUIT_KID};
