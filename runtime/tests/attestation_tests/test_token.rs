// Licensed under the Apache-2.0 license

use crate::common::{
    claim, claims, get_token, parse_token, service, BootStatusBuilder, TestPlatform, CALLER_ID,
    CHALLENGE, PLATFORM_BOOT_SEED, PLATFORM_IMPLEMENTATION_ID,
};
use coset::{cbor::value::Value, iana, RegisteredLabelWithPrivate};
use iat_eat::claim_keys::*;
use iat_runtime::boot_status::{general_claim, sw_claim};
use iat_runtime::platform::security_lifecycle;
use iat_runtime::{TokenOptions, MAX_TOKEN_SIZE};
use p256::ecdsa::{signature::Verifier, Signature, VerifyingKey};
use sha2::{Digest, Sha256};

fn public_key(service: &mut crate::common::TestService) -> Vec<u8> {
    let mut out = [0u8; 65];
    let (len, _) = service.get_public_key(&mut out).unwrap();
    out[..len].to_vec()
}

fn bytes(value: Option<&Value>) -> &[u8] {
    match value {
        Some(Value::Bytes(bytes)) => bytes,
        other => panic!("expected a byte string, got {other:?}"),
    }
}

fn int(value: Option<&Value>) -> i128 {
    match value {
        Some(Value::Integer(i)) => i128::from(*i),
        other => panic!("expected an integer, got {other:?}"),
    }
}

#[test]
fn test_signature_verifies() {
    let mut service = service(TestPlatform::default());
    let token = get_token(&mut service, TokenOptions::empty());
    let cose_sign1 = parse_token(&token);

    assert_eq!(
        cose_sign1.protected.header.alg,
        Some(RegisteredLabelWithPrivate::Assigned(iana::Algorithm::ES256))
    );
    assert_eq!(cose_sign1.signature.len(), 64);

    let sec1 = public_key(&mut service);
    let verifying_key = VerifyingKey::from_sec1_bytes(&sec1).unwrap();
    let signature = Signature::from_slice(&cose_sign1.signature).unwrap();
    let tbs = cose_sign1.tbs_data(b"");
    assert!(verifying_key.verify(&tbs, &signature).is_ok());

    // Any change to the signed payload breaks the signature
    let mut tampered = tbs.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    assert!(verifying_key.verify(&tampered, &signature).is_err());
}

#[cfg(feature = "key-id")]
#[test]
fn test_kid_is_cose_key_hash() {
    let mut service = service(TestPlatform::default());
    let token = get_token(&mut service, TokenOptions::empty());
    let cose_sign1 = parse_token(&token);

    let sec1 = public_key(&mut service);
    let mut cose_key = vec![0xA4, 0x01, 0x02, 0x20, 0x01, 0x21, 0x58, 0x20];
    cose_key.extend_from_slice(&sec1[1..33]);
    cose_key.extend_from_slice(&[0x22, 0x58, 0x20]);
    cose_key.extend_from_slice(&sec1[33..65]);
    assert_eq!(cose_sign1.unprotected.key_id, Sha256::digest(&cose_key).to_vec());
}

#[cfg(feature = "key-id")]
#[test]
fn test_kid_computed_once() {
    let mut service = service(TestPlatform::default());

    let before = service.sha().ops();
    let first = get_token(&mut service, TokenOptions::empty());
    let first_ops = service.sha().ops() - before;

    let before = service.sha().ops();
    let second = get_token(&mut service, TokenOptions::empty());
    let second_ops = service.sha().ops() - before;

    // The second build skips the key ID hash
    assert_eq!(second_ops, first_ops - 1);
    assert_eq!(
        parse_token(&first).unprotected.key_id,
        parse_token(&second).unprotected.key_id
    );
}

#[cfg(all(
    feature = "verification-service",
    feature = "profile-definition",
    feature = "hw-version"
))]
#[test]
fn test_claims_from_platform() {
    let mut service = service(TestPlatform::default());
    let token = get_token(&mut service, TokenOptions::empty());
    let claims = claims(&parse_token(&token));

    let labels: Vec<i128> = claims.iter().map(|(label, _)| *label).collect();
    let expected: Vec<i128> = [
        CLAIM_KEY_CHALLENGE,
        CLAIM_KEY_BOOT_SEED,
        CLAIM_KEY_INSTANCE_ID,
        CLAIM_KEY_IMPLEMENTATION_ID,
        CLAIM_KEY_CLIENT_ID,
        CLAIM_KEY_SECURITY_LIFECYCLE,
        CLAIM_KEY_NO_SW_COMPONENTS,
        CLAIM_KEY_VERIFICATION_SERVICE,
        CLAIM_KEY_PROFILE_DEFINITION,
        CLAIM_KEY_HW_VERSION,
    ]
    .iter()
    .map(|label| *label as i128)
    .collect();
    assert_eq!(labels, expected);

    assert_eq!(bytes(claim(&claims, CLAIM_KEY_CHALLENGE)), &CHALLENGE);
    assert_eq!(bytes(claim(&claims, CLAIM_KEY_BOOT_SEED)), &PLATFORM_BOOT_SEED);
    assert_eq!(
        bytes(claim(&claims, CLAIM_KEY_IMPLEMENTATION_ID)),
        &PLATFORM_IMPLEMENTATION_ID
    );
    assert_eq!(int(claim(&claims, CLAIM_KEY_CLIENT_ID)), CALLER_ID as i128);
    assert_eq!(
        int(claim(&claims, CLAIM_KEY_SECURITY_LIFECYCLE)),
        security_lifecycle::SECURED as i128
    );
    assert_eq!(int(claim(&claims, CLAIM_KEY_NO_SW_COMPONENTS)), 1);
    assert_eq!(
        claim(&claims, CLAIM_KEY_PROFILE_DEFINITION),
        Some(&Value::Text("PSA_IOT_PROFILE_1".into()))
    );
    assert_eq!(
        claim(&claims, CLAIM_KEY_HW_VERSION),
        Some(&Value::Text(crate::common::HW_VERSION.into()))
    );
}

#[test]
fn test_instance_id_is_key_hash() {
    let mut service = service(TestPlatform::default());
    let token = get_token(&mut service, TokenOptions::empty());
    let claims = claims(&parse_token(&token));

    let sec1 = public_key(&mut service);
    let instance_id = bytes(claim(&claims, CLAIM_KEY_INSTANCE_ID));
    assert_eq!(instance_id.len(), 33);
    assert_eq!(instance_id[0], 0x01);
    assert_eq!(&instance_id[1..], Sha256::digest(&sec1).as_slice());
}

#[test]
fn test_boot_status_preferred() {
    let blob = BootStatusBuilder::new()
        .general(general_claim::BOOT_SEED, &[0xAA; 32])
        .general(general_claim::IMPLEMENTATION_ID, &[0xBB; 32])
        .general(
            general_claim::SECURITY_LIFECYCLE,
            &(security_lifecycle::NON_PSA_ROT_DEBUG as u16).to_ne_bytes(),
        )
        .general(general_claim::HW_VERSION, b"1234567890123")
        .build();
    let mut service = service(TestPlatform::with_boot_status(blob));
    let token = get_token(&mut service, TokenOptions::empty());
    let claims = claims(&parse_token(&token));

    assert_eq!(bytes(claim(&claims, CLAIM_KEY_BOOT_SEED)), &[0xAA; 32]);
    assert_eq!(bytes(claim(&claims, CLAIM_KEY_IMPLEMENTATION_ID)), &[0xBB; 32]);
    assert_eq!(
        int(claim(&claims, CLAIM_KEY_SECURITY_LIFECYCLE)),
        security_lifecycle::NON_PSA_ROT_DEBUG as i128
    );
    #[cfg(feature = "hw-version")]
    assert_eq!(
        claim(&claims, CLAIM_KEY_HW_VERSION),
        Some(&Value::Text("1234567890123".into()))
    );
}

#[test]
fn test_sw_components_in_module_order() {
    // { 1: "BL2", 4: "1.2.3" } and { 1: "SPE" }
    let bl2 = [0xA2, 0x01, 0x63, b'B', b'L', b'2', 0x04, 0x65, b'1', b'.', b'2', b'.', b'3'];
    let spe = [0xA1, 0x01, 0x63, b'S', b'P', b'E'];
    let blob = BootStatusBuilder::new()
        .sw(2, sw_claim::SW_BOOT_RECORD, &spe)
        .sw(1, sw_claim::SW_VERSION, b"ignored")
        .sw(1, sw_claim::SW_BOOT_RECORD, &bl2)
        .build();
    let mut service = service(TestPlatform::with_boot_status(blob));
    let token = get_token(&mut service, TokenOptions::empty());
    let claims = claims(&parse_token(&token));

    assert!(claim(&claims, CLAIM_KEY_NO_SW_COMPONENTS).is_none());
    let Some(Value::Array(components)) = claim(&claims, CLAIM_KEY_SW_COMPONENTS) else {
        panic!("software components should be an array");
    };
    assert_eq!(components.len(), 2);
    assert_eq!(
        components[0],
        Value::Map(vec![
            (Value::Integer(1.into()), Value::Text("BL2".into())),
            (Value::Integer(4.into()), Value::Text("1.2.3".into())),
        ])
    );
    assert_eq!(
        components[1],
        Value::Map(vec![(Value::Integer(1.into()), Value::Text("SPE".into()))])
    );
}

#[test]
fn test_omit_claims() {
    let mut service = service(TestPlatform {
        boot_seed: None,
        caller_id: None,
        ..Default::default()
    });
    let token = get_token(&mut service, TokenOptions::OMIT_CLAIMS);
    let claims = claims(&parse_token(&token));

    assert_eq!(claims.len(), 1);
    assert_eq!(bytes(claim(&claims, CLAIM_KEY_CHALLENGE)), &CHALLENGE);
}

#[test]
fn test_size_matches_token() {
    let blob = BootStatusBuilder::new()
        .general(general_claim::BOOT_SEED, &[0xAA; 32])
        .sw(1, sw_claim::SW_BOOT_RECORD, &[0xA1, 0x01, 0x61, b'x'])
        .build();
    let mut service = service(TestPlatform::with_boot_status(blob));

    for challenge_size in [32usize, 48, 64] {
        let challenge = vec![0x5C; challenge_size];
        for options in [TokenOptions::empty(), TokenOptions::OMIT_CLAIMS] {
            let size = service.get_token_size(&challenge, options).unwrap();
            let mut out = vec![0u8; MAX_TOKEN_SIZE];
            let len = service.get_token(&challenge, options, &mut out).unwrap();
            assert_eq!(size, len);
            assert!(len <= MAX_TOKEN_SIZE);
            // The token ends exactly where the signature does
            parse_token(&out[..len]);
        }
    }
}
