// Licensed under the Apache-2.0 license

// PSA initial attestation token claim keys (private-use range below -65536)
pub const CLAIM_KEY_PSA_BASE: i64 = -75000;
pub const CLAIM_KEY_PROFILE_DEFINITION: i64 = CLAIM_KEY_PSA_BASE;
pub const CLAIM_KEY_CLIENT_ID: i64 = CLAIM_KEY_PSA_BASE - 1;
pub const CLAIM_KEY_SECURITY_LIFECYCLE: i64 = CLAIM_KEY_PSA_BASE - 2;
pub const CLAIM_KEY_IMPLEMENTATION_ID: i64 = CLAIM_KEY_PSA_BASE - 3;
pub const CLAIM_KEY_BOOT_SEED: i64 = CLAIM_KEY_PSA_BASE - 4;
pub const CLAIM_KEY_HW_VERSION: i64 = CLAIM_KEY_PSA_BASE - 5;
pub const CLAIM_KEY_SW_COMPONENTS: i64 = CLAIM_KEY_PSA_BASE - 6;
pub const CLAIM_KEY_NO_SW_COMPONENTS: i64 = CLAIM_KEY_PSA_BASE - 7;
pub const CLAIM_KEY_CHALLENGE: i64 = CLAIM_KEY_PSA_BASE - 8;
pub const CLAIM_KEY_INSTANCE_ID: i64 = CLAIM_KEY_PSA_BASE - 9;
pub const CLAIM_KEY_VERIFICATION_SERVICE: i64 = CLAIM_KEY_PSA_BASE - 10;

/// Value of the "no software components" claim.
pub const NO_SW_COMPONENTS_VALUE: u64 = 1;
