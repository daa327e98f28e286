// Licensed under the Apache-2.0 license

use crate::common::{service, BootStatusBuilder, TestPlatform, CHALLENGE};
use iat_runtime::boot_status::{general_claim, sw_claim};
use iat_runtime::platform::security_lifecycle;
use iat_runtime::{AttestError, AttestStatus, TokenOptions, CHALLENGE_SIZES, MAX_TOKEN_SIZE};

fn token_error(service: &mut crate::common::TestService, options: TokenOptions) -> AttestError {
    let mut out = vec![0u8; MAX_TOKEN_SIZE];
    service
        .get_token(&CHALLENGE, options, &mut out)
        .expect_err("token build should fail")
}

#[test]
fn test_invalid_challenge_size() {
    let mut service = service(TestPlatform::default());
    for size in [0usize, 1, 31, 33, 47, 63, 65, 128] {
        assert!(!CHALLENGE_SIZES.contains(&size));
        let challenge = vec![0x33; size];
        let mut out = vec![0xEEu8; MAX_TOKEN_SIZE];

        let err = service
            .get_token(&challenge, TokenOptions::empty(), &mut out)
            .unwrap_err();
        assert_eq!(err, AttestError::SERVICE_INVALID_CHALLENGE_SIZE);
        assert_eq!(err.status(), AttestStatus::InvalidInput);
        assert!(out.iter().all(|&b| b == 0xEE));

        assert_eq!(
            service.get_token_size(&challenge, TokenOptions::OMIT_CLAIMS),
            Err(AttestError::SERVICE_INVALID_CHALLENGE_SIZE)
        );
    }
    assert_eq!(service.key_provider().calls, 0);
}

#[test]
fn test_missing_claim_releases_key() {
    let mut service = service(TestPlatform {
        caller_id: None,
        ..Default::default()
    });

    let err = token_error(&mut service, TokenOptions::empty());
    assert_eq!(err, AttestError::CLAIM_CALLER_ID_UNAVAILABLE);
    assert_eq!(err.status(), AttestStatus::ClaimUnavailable);
    assert!(!service.key_manager().is_registered());

    // A later request can register the key again
    service.platform_mut().caller_id = Some(7);
    let mut out = vec![0u8; MAX_TOKEN_SIZE];
    assert!(service
        .get_token(&CHALLENGE, TokenOptions::empty(), &mut out)
        .is_ok());
    assert!(!service.key_manager().is_registered());
    assert_eq!(service.key_provider().calls, 2);
}

#[test]
fn test_buffer_too_small_releases_key() {
    let mut service = service(TestPlatform::default());
    let size = service
        .get_token_size(&CHALLENGE, TokenOptions::empty())
        .unwrap();

    let mut out = vec![0u8; size - 1];
    let err = service
        .get_token(&CHALLENGE, TokenOptions::empty(), &mut out)
        .unwrap_err();
    assert_eq!(err, AttestError::ENCODER_BUFFER_TOO_SMALL);
    assert_eq!(err.status(), AttestStatus::BufferOverflow);
    assert!(!service.key_manager().is_registered());

    let mut out = vec![0u8; size];
    assert_eq!(
        service.get_token(&CHALLENGE, TokenOptions::empty(), &mut out),
        Ok(size)
    );
}

#[test]
fn test_key_provider_failure() {
    let mut service = service(TestPlatform::default());
    service.key_provider_mut().fail = true;

    let err = token_error(&mut service, TokenOptions::empty());
    assert_eq!(err, AttestError::KEY_SIGNING_KEY_UNAVAILABLE);
    assert_eq!(err.status(), AttestStatus::General);

    let mut out = [0u8; 65];
    assert_eq!(
        service.get_public_key(&mut out),
        Err(AttestError::KEY_SIGNING_KEY_UNAVAILABLE)
    );
    assert!(!service.key_manager().is_registered());
    assert_eq!(service.key_provider().calls, 2);
}

#[test]
fn test_bad_magic_fails_every_lookup() {
    let mut blob = BootStatusBuilder::new()
        .general(general_claim::BOOT_SEED, &[0xAA; 32])
        .build();
    blob[0] ^= 0xFF;
    let mut service = service(TestPlatform::with_boot_status(blob));
    assert!(service.boot_status().status().is_err());

    let err = token_error(&mut service, TokenOptions::empty());
    assert_eq!(err, AttestError::BOOT_STATUS_BAD_MAGIC);
    assert!(!service.key_manager().is_registered());

    // A token limited to the challenge never reads the store
    let mut out = vec![0u8; MAX_TOKEN_SIZE];
    assert!(service
        .get_token(&CHALLENGE, TokenOptions::OMIT_CLAIMS, &mut out)
        .is_ok());
}

#[test]
fn test_malformed_entries() {
    // Entry claims more bytes than the shared data holds
    let mut blob = BootStatusBuilder::new()
        .general(general_claim::BOOT_SEED, &[0xAA; 32])
        .build();
    let entry_len = (32u16 + 4 + 1).to_ne_bytes();
    blob[6..8].copy_from_slice(&entry_len);
    let mut service = service(TestPlatform::with_boot_status(blob));
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::BOOT_STATUS_ENTRY_OVERRUN
    );

    // Entry shorter than its own header
    let mut blob = BootStatusBuilder::new()
        .general(general_claim::BOOT_SEED, &[0xAA; 32])
        .build();
    blob[6..8].copy_from_slice(&2u16.to_ne_bytes());
    let mut service = crate::common::service(TestPlatform::with_boot_status(blob));
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::BOOT_STATUS_ENTRY_TOO_SHORT
    );

    // Total length beyond the copied data
    let mut blob = BootStatusBuilder::new().build();
    blob[2..4].copy_from_slice(&64u16.to_ne_bytes());
    let mut service = crate::common::service(TestPlatform::with_boot_status(blob));
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::BOOT_STATUS_BAD_TOTAL_LENGTH
    );
}

#[test]
fn test_boot_status_read_failure() {
    let mut service = service(TestPlatform {
        boot_status: Err(AttestError::DRIVER_SHA256_INVALID_STATE),
        ..Default::default()
    });
    let err = token_error(&mut service, TokenOptions::empty());
    assert_eq!(err, AttestError::BOOT_STATUS_UNINITIALIZED);
    assert_eq!(err.status(), AttestStatus::InitFailed);
}

#[test]
fn test_stored_claim_validation() {
    let blob = BootStatusBuilder::new()
        .general(general_claim::IMPLEMENTATION_ID, &[0xBB; 31])
        .build();
    let mut service = service(TestPlatform::with_boot_status(blob));
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::CLAIM_INVALID_SIZE
    );

    let blob = BootStatusBuilder::new()
        .general(
            general_claim::SECURITY_LIFECYCLE,
            &(security_lifecycle::MAX + 1).to_ne_bytes(),
        )
        .build();
    let mut service = crate::common::service(TestPlatform::with_boot_status(blob));
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::CLAIM_INVALID_SECURITY_LIFECYCLE
    );

    let blob = BootStatusBuilder::new()
        .general(general_claim::SECURITY_LIFECYCLE, &[0x00, 0x30, 0x00])
        .build();
    let mut service = crate::common::service(TestPlatform::with_boot_status(blob));
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::BOOT_STATUS_INVALID_INT_WIDTH
    );
}

#[cfg(feature = "hw-version")]
#[test]
fn test_stored_hw_version_validation() {
    let blob = BootStatusBuilder::new()
        .general(general_claim::HW_VERSION, &[0xFF, 0xFE, 0x30])
        .build();
    let mut service = service(TestPlatform::with_boot_status(blob));
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::CLAIM_INVALID_UTF8
    );

    let blob = BootStatusBuilder::new()
        .general(general_claim::HW_VERSION, &[b'1'; 33])
        .build();
    let mut service = crate::common::service(TestPlatform::with_boot_status(blob));
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::CLAIM_INVALID_SIZE
    );
}

#[test]
fn test_platform_lifecycle_out_of_range() {
    let mut service = service(TestPlatform {
        security_lifecycle: Some(0x7000),
        ..Default::default()
    });
    assert_eq!(
        token_error(&mut service, TokenOptions::empty()),
        AttestError::CLAIM_INVALID_SECURITY_LIFECYCLE
    );
}

#[test]
fn test_empty_sw_boot_record() {
    let blob = BootStatusBuilder::new()
        .sw(1, sw_claim::SW_BOOT_RECORD, &[])
        .build();
    let mut service = service(TestPlatform::with_boot_status(blob));
    let err = token_error(&mut service, TokenOptions::empty());
    assert_eq!(err, AttestError::CLAIM_INVALID_SIZE);
    assert_eq!(err.status(), AttestStatus::General);
    assert!(!service.key_manager().is_registered());
}
