/*++

Licensed under the Apache-2.0 license.

File Name:

    platform.rs

Abstract:

    File contains the interfaces the attestation service consumes from the
    platform: boot status shared data, claim values that are not recorded by
    the boot loader, and the provisioned attestation key.

--*/

use iat_drivers::{AttestResult, COSE_CURVE_P256, P256_SCALAR_SIZE};
use zeroize::Zeroize;

/// Size of the boot seed and implementation ID claims.
pub const CLAIM_ID_SIZE: usize = 32;

/// Maximum size of the hardware version claim.
pub const HW_VERSION_MAX_SIZE: usize = 32;

/// Profile definition reported when the platform does not override it.
pub const DEFAULT_PROFILE_DEFINITION: &str = "PSA_IOT_PROFILE_1";

/// Security lifecycle states (PSA Security Model)
pub mod security_lifecycle {
    pub const UNKNOWN: u32 = 0x0000;
    pub const ASSEMBLY_AND_TEST: u32 = 0x1000;
    pub const PSA_ROT_PROVISIONING: u32 = 0x2000;
    pub const SECURED: u32 = 0x3000;
    pub const NON_PSA_ROT_DEBUG: u32 = 0x4000;
    pub const RECOVERABLE_PSA_ROT_DEBUG: u32 = 0x5000;
    pub const DECOMMISSIONED: u32 = 0x6000;

    /// Largest valid value: the last state with any implementation defined sub-state.
    pub const MAX: u32 = DECOMMISSIONED | 0x00FF;
}

/// Private attestation key as handed out by the key provisioning layer.
///
/// The scalar is wiped when the value is dropped.
pub struct AttestKeyMaterial {
    /// Big-endian private scalar
    pub priv_key: [u8; P256_SCALAR_SIZE],

    /// COSE curve identifier
    pub curve: i32,
}

impl AttestKeyMaterial {
    pub fn p256(priv_key: [u8; P256_SCALAR_SIZE]) -> Self {
        Self {
            priv_key,
            curve: COSE_CURVE_P256,
        }
    }
}

impl Drop for AttestKeyMaterial {
    fn drop(&mut self) {
        self.priv_key.zeroize();
    }
}

/// Source of the initial attestation private key.
pub trait AttestKeyProvider {
    fn initial_attest_key(&mut self) -> AttestResult<AttestKeyMaterial>;
}

/// Platform services used while building a token.
///
/// Claim getters return `None` when the platform cannot supply the value.
pub trait AttestPlatform {
    /// Copy the boot status shared data into `buf`.
    ///
    /// # Returns
    ///
    /// * `usize` - Number of bytes copied
    fn read_boot_status(&mut self, buf: &mut [u8]) -> AttestResult<usize>;

    fn boot_seed(&self) -> Option<[u8; CLAIM_ID_SIZE]>;

    fn implementation_id(&self) -> Option<[u8; CLAIM_ID_SIZE]>;

    /// Identity of the partition requesting the token.
    fn caller_id(&self) -> Option<i32>;

    fn security_lifecycle(&self) -> Option<u32>;

    /// EAN-13 hardware version string
    fn hw_version(&self) -> Option<&str>;

    /// Hint where the token can be verified, usually a URL.
    fn verification_service(&self) -> Option<&str>;

    fn profile_definition(&self) -> Option<&str> {
        Some(DEFAULT_PROFILE_DEFINITION)
    }
}
