/*++

Licensed under the Apache-2.0 license.

File Name:

    claims.rs

Abstract:

    File contains the claim collector. It gathers every claim of a token,
    preferring the values the boot loader recorded in the boot status and
    falling back to the platform, and writes them in their fixed order.

--*/

use crate::boot_status::{decode_uint, general_claim, sw_claim, BootStatusStore, SW_MODULE_MAX};
use crate::error::{ClaimError, TokenError};
#[cfg(feature = "hw-version")]
use crate::platform::HW_VERSION_MAX_SIZE;
use crate::platform::{security_lifecycle, AttestPlatform, CLAIM_ID_SIZE};
use crate::token::TokenEncoder;
use crate::TokenOptions;
use iat_drivers::{cprintln, P256PubKey, Sha256Alg};
use iat_eat::claim_keys::*;

/// Type byte of a random UEID (EAT instance ID).
pub const UEID_TYPE_RANDOM: u8 = 0x01;

/// Size of the instance ID claim.
pub const INSTANCE_ID_SIZE: usize = 1 + CLAIM_ID_SIZE;

/// Claims of an initial attestation token
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Claim {
    Challenge,
    BootSeed,
    InstanceId,
    ImplementationId,
    CallerId,
    SecurityLifecycle,
    SwComponents,
    VerificationService,
    ProfileDefinition,
    HwVersion,
}

impl Claim {
    /// Every claim, in token order.
    pub const ALL: [Claim; 10] = [
        Claim::Challenge,
        Claim::BootSeed,
        Claim::InstanceId,
        Claim::ImplementationId,
        Claim::CallerId,
        Claim::SecurityLifecycle,
        Claim::SwComponents,
        Claim::VerificationService,
        Claim::ProfileDefinition,
        Claim::HwVersion,
    ];

    /// Map key of the claim.
    pub fn label(&self) -> i64 {
        match self {
            Claim::Challenge => CLAIM_KEY_CHALLENGE,
            Claim::BootSeed => CLAIM_KEY_BOOT_SEED,
            Claim::InstanceId => CLAIM_KEY_INSTANCE_ID,
            Claim::ImplementationId => CLAIM_KEY_IMPLEMENTATION_ID,
            Claim::CallerId => CLAIM_KEY_CLIENT_ID,
            Claim::SecurityLifecycle => CLAIM_KEY_SECURITY_LIFECYCLE,
            Claim::SwComponents => CLAIM_KEY_SW_COMPONENTS,
            Claim::VerificationService => CLAIM_KEY_VERIFICATION_SERVICE,
            Claim::ProfileDefinition => CLAIM_KEY_PROFILE_DEFINITION,
            Claim::HwVersion => CLAIM_KEY_HW_VERSION,
        }
    }
}

/// Value of a claim
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClaimValue<'a> {
    Int(i64),
    Bytes(&'a [u8]),
    Text(&'a str),
    /// A complete CBOR data item, copied verbatim
    Encoded(&'a [u8]),
}

/// Compute the instance ID of a public key: the UEID type byte followed by
/// the SHA-256 of the SEC1 encoded key.
pub fn instance_id<S: Sha256Alg>(
    pub_key: &P256PubKey,
    sha: &mut S,
) -> Result<[u8; INSTANCE_ID_SIZE], ClaimError> {
    let digest = sha.digest(&pub_key.to_sec1()).map_err(|e| {
        cprintln!("[attest] Instance ID hash failed: 0x{:x}", u32::from(e));
        ClaimError::Unavailable(Claim::InstanceId)
    })?;
    let digest: [u8; CLAIM_ID_SIZE] = digest.into();

    let mut id = [0u8; INSTANCE_ID_SIZE];
    id[0] = UEID_TYPE_RANDOM;
    id[1..].copy_from_slice(&digest);
    Ok(id)
}

/// Claim collector over the boot status and the platform
pub struct ClaimCollector<'a, P: AttestPlatform> {
    boot_status: &'a BootStatusStore,
    platform: &'a P,
}

impl<'a, P: AttestPlatform> ClaimCollector<'a, P> {
    pub fn new(boot_status: &'a BootStatusStore, platform: &'a P) -> Self {
        Self {
            boot_status,
            platform,
        }
    }

    /// Write the claims of a token into the open claims map.
    ///
    /// # Arguments
    ///
    /// * `token` - Token with an open claims map
    /// * `challenge` - Caller supplied challenge
    /// * `options` - Build options; `OMIT_CLAIMS` limits the token to the challenge
    /// * `pub_key` - Attestation public key the instance ID is derived from
    /// * `sha` - SHA-256 engine
    pub fn collect<S: Sha256Alg>(
        &self,
        token: &mut TokenEncoder,
        challenge: &[u8],
        options: TokenOptions,
        pub_key: Option<&P256PubKey>,
        sha: &mut S,
    ) -> Result<(), TokenError> {
        token.add_claim(Claim::Challenge.label(), ClaimValue::Bytes(challenge))?;
        if options.contains(TokenOptions::OMIT_CLAIMS) {
            return Ok(());
        }

        self.add_boot_seed(token)?;
        self.add_instance_id(token, pub_key, sha)?;
        self.add_implementation_id(token)?;
        self.add_caller_id(token)?;
        self.add_security_lifecycle(token)?;
        self.add_sw_components(token)?;

        #[cfg(feature = "verification-service")]
        self.add_verification_service(token)?;
        #[cfg(feature = "profile-definition")]
        self.add_profile_definition(token)?;
        #[cfg(feature = "hw-version")]
        self.add_hw_version(token)?;

        Ok(())
    }

    /// Boot status payload of a general claim, required to be `CLAIM_ID_SIZE` bytes.
    fn stored_id(&self, claim_id: u8, claim: Claim) -> Result<Option<&'a [u8]>, TokenError> {
        match self.boot_status.find_by_id(claim_id)? {
            Some(data) if data.len() != CLAIM_ID_SIZE => {
                Err(ClaimError::InvalidSize(claim).into())
            }
            data => Ok(data),
        }
    }

    fn add_boot_seed(&self, token: &mut TokenEncoder) -> Result<(), TokenError> {
        let claim = Claim::BootSeed;
        let from_platform;
        let seed = match self.stored_id(general_claim::BOOT_SEED, claim)? {
            Some(seed) => seed,
            None => {
                from_platform = self
                    .platform
                    .boot_seed()
                    .ok_or(ClaimError::Unavailable(claim))?;
                &from_platform[..]
            }
        };
        token.add_claim(claim.label(), ClaimValue::Bytes(seed))
    }

    fn add_instance_id<S: Sha256Alg>(
        &self,
        token: &mut TokenEncoder,
        pub_key: Option<&P256PubKey>,
        sha: &mut S,
    ) -> Result<(), TokenError> {
        let claim = Claim::InstanceId;
        let pub_key = pub_key.ok_or(ClaimError::Unavailable(claim))?;
        let id = instance_id(pub_key, sha)?;
        token.add_claim(claim.label(), ClaimValue::Bytes(&id))
    }

    fn add_implementation_id(&self, token: &mut TokenEncoder) -> Result<(), TokenError> {
        let claim = Claim::ImplementationId;
        let from_platform;
        let id = match self.stored_id(general_claim::IMPLEMENTATION_ID, claim)? {
            Some(id) => id,
            None => {
                from_platform = self
                    .platform
                    .implementation_id()
                    .ok_or(ClaimError::Unavailable(claim))?;
                &from_platform[..]
            }
        };
        token.add_claim(claim.label(), ClaimValue::Bytes(id))
    }

    fn add_caller_id(&self, token: &mut TokenEncoder) -> Result<(), TokenError> {
        let claim = Claim::CallerId;
        let caller_id = self
            .platform
            .caller_id()
            .ok_or(ClaimError::Unavailable(claim))?;
        token.add_claim(claim.label(), ClaimValue::Int(i64::from(caller_id)))
    }

    fn add_security_lifecycle(&self, token: &mut TokenEncoder) -> Result<(), TokenError> {
        let claim = Claim::SecurityLifecycle;
        let value = match self.boot_status.find_by_id(general_claim::SECURITY_LIFECYCLE)? {
            Some(data) => decode_uint(data)?,
            None => self
                .platform
                .security_lifecycle()
                .ok_or(ClaimError::Unavailable(claim))?,
        };
        if value > security_lifecycle::MAX {
            return Err(ClaimError::InvalidSecurityLifecycle(value).into());
        }
        token.add_claim(claim.label(), ClaimValue::Int(i64::from(value)))
    }

    /// Add the boot record of each measured software component, or the
    /// "no software components" claim when there are none.
    ///
    /// A module contributes its first `SW_BOOT_RECORD` entry only.
    fn add_sw_components(&self, token: &mut TokenEncoder) -> Result<(), TokenError> {
        let claim = Claim::SwComponents;
        let mut components = 0usize;

        for module in 1..=SW_MODULE_MAX {
            let mut cursor = None;
            while let Some(entry) = self.boot_status.find_by_module(module, cursor)? {
                cursor = Some(entry.cursor());
                if entry.claim_id != sw_claim::SW_BOOT_RECORD {
                    continue;
                }
                if entry.data.is_empty() {
                    return Err(ClaimError::InvalidSize(claim).into());
                }
                if components == 0 {
                    token.open_array(claim.label())?;
                }
                token.add_array_item(ClaimValue::Encoded(entry.data))?;
                components += 1;
                break;
            }
        }

        if components == 0 {
            token.add_claim(
                CLAIM_KEY_NO_SW_COMPONENTS,
                ClaimValue::Int(NO_SW_COMPONENTS_VALUE as i64),
            )
        } else {
            token.close_array()
        }
    }

    #[cfg(feature = "verification-service")]
    fn add_verification_service(&self, token: &mut TokenEncoder) -> Result<(), TokenError> {
        let claim = Claim::VerificationService;
        let service = self
            .platform
            .verification_service()
            .ok_or(ClaimError::Unavailable(claim))?;
        token.add_claim(claim.label(), ClaimValue::Text(service))
    }

    #[cfg(feature = "profile-definition")]
    fn add_profile_definition(&self, token: &mut TokenEncoder) -> Result<(), TokenError> {
        let claim = Claim::ProfileDefinition;
        let profile = self
            .platform
            .profile_definition()
            .ok_or(ClaimError::Unavailable(claim))?;
        token.add_claim(claim.label(), ClaimValue::Text(profile))
    }

    #[cfg(feature = "hw-version")]
    fn add_hw_version(&self, token: &mut TokenEncoder) -> Result<(), TokenError> {
        let claim = Claim::HwVersion;
        let version = match self.boot_status.find_by_id(general_claim::HW_VERSION)? {
            Some(data) => {
                core::str::from_utf8(data).map_err(|_| ClaimError::InvalidUtf8(claim))?
            }
            None => self
                .platform
                .hw_version()
                .ok_or(ClaimError::Unavailable(claim))?,
        };
        if version.len() > HW_VERSION_MAX_SIZE {
            return Err(ClaimError::InvalidSize(claim).into());
        }
        token.add_claim(claim.label(), ClaimValue::Text(version))
    }
}
