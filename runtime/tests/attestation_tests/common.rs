// Licensed under the Apache-2.0 license

use coset::{cbor::value::Value, CborSerializable, CoseSign1, TaggedCborSerializable};
use iat_drivers::Sha256;
use iat_runtime::boot_status::{tlv_type, SHARED_DATA_TLV_INFO_MAGIC, SW_GENERAL, TLV_MAJOR_IAS};
use iat_runtime::platform::{security_lifecycle, CLAIM_ID_SIZE};
use iat_runtime::{
    AttestError, AttestKeyMaterial, AttestKeyProvider, AttestPlatform, AttestResult,
    InitialAttestation, TokenOptions, MAX_TOKEN_SIZE,
};

// RFC 6979 A.2.5 P-256 test key
pub const PRIV_KEY: &str = "c9afa9d845ba75166b5c215767b1d6934e50c3db36e89b127b8a622b120f6721";

pub const CHALLENGE: [u8; 32] = [0x33; 32];
pub const PLATFORM_BOOT_SEED: [u8; CLAIM_ID_SIZE] = [0x44; CLAIM_ID_SIZE];
pub const PLATFORM_IMPLEMENTATION_ID: [u8; CLAIM_ID_SIZE] = [0x55; CLAIM_ID_SIZE];
pub const CALLER_ID: i32 = -3;
pub const HW_VERSION: &str = "0604565272829";
pub const VERIFICATION_SERVICE: &str = "www.trustedfirmware.org";

/// Shared data blob in the layout the boot loader produces
#[derive(Default)]
pub struct BootStatusBuilder {
    entries: Vec<(u16, Vec<u8>)>,
}

impl BootStatusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, tlv_type: u16, payload: &[u8]) -> Self {
        self.entries.push((tlv_type, payload.to_vec()));
        self
    }

    pub fn general(self, claim_id: u8, payload: &[u8]) -> Self {
        self.entry(tlv_type(TLV_MAJOR_IAS, SW_GENERAL, claim_id), payload)
    }

    pub fn sw(self, module: u8, claim_id: u8, payload: &[u8]) -> Self {
        self.entry(tlv_type(TLV_MAJOR_IAS, module, claim_id), payload)
    }

    pub fn build(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (tlv_type, payload) in &self.entries {
            body.extend_from_slice(&tlv_type.to_ne_bytes());
            body.extend_from_slice(&((payload.len() + 4) as u16).to_ne_bytes());
            body.extend_from_slice(payload);
        }
        let mut blob = Vec::new();
        blob.extend_from_slice(&SHARED_DATA_TLV_INFO_MAGIC.to_ne_bytes());
        blob.extend_from_slice(&((body.len() + 4) as u16).to_ne_bytes());
        blob.extend_from_slice(&body);
        blob
    }
}

pub struct TestPlatform {
    pub boot_status: AttestResult<Vec<u8>>,
    pub boot_seed: Option<[u8; CLAIM_ID_SIZE]>,
    pub implementation_id: Option<[u8; CLAIM_ID_SIZE]>,
    pub caller_id: Option<i32>,
    pub security_lifecycle: Option<u32>,
    pub hw_version: Option<&'static str>,
    pub verification_service: Option<&'static str>,
}

impl Default for TestPlatform {
    fn default() -> Self {
        Self {
            boot_status: Ok(BootStatusBuilder::new().build()),
            boot_seed: Some(PLATFORM_BOOT_SEED),
            implementation_id: Some(PLATFORM_IMPLEMENTATION_ID),
            caller_id: Some(CALLER_ID),
            security_lifecycle: Some(security_lifecycle::SECURED),
            hw_version: Some(HW_VERSION),
            verification_service: Some(VERIFICATION_SERVICE),
        }
    }
}

impl TestPlatform {
    pub fn with_boot_status(blob: Vec<u8>) -> Self {
        Self {
            boot_status: Ok(blob),
            ..Default::default()
        }
    }
}

impl AttestPlatform for TestPlatform {
    fn read_boot_status(&mut self, buf: &mut [u8]) -> AttestResult<usize> {
        let blob = self.boot_status.as_ref().map_err(|e| *e)?;
        let len = blob.len().min(buf.len());
        buf[..len].copy_from_slice(&blob[..len]);
        Ok(len)
    }

    fn boot_seed(&self) -> Option<[u8; CLAIM_ID_SIZE]> {
        self.boot_seed
    }

    fn implementation_id(&self) -> Option<[u8; CLAIM_ID_SIZE]> {
        self.implementation_id
    }

    fn caller_id(&self) -> Option<i32> {
        self.caller_id
    }

    fn security_lifecycle(&self) -> Option<u32> {
        self.security_lifecycle
    }

    fn hw_version(&self) -> Option<&str> {
        self.hw_version
    }

    fn verification_service(&self) -> Option<&str> {
        self.verification_service
    }
}

#[derive(Default)]
pub struct TestKey {
    pub calls: u32,
    pub fail: bool,
}

impl AttestKeyProvider for TestKey {
    fn initial_attest_key(&mut self) -> AttestResult<AttestKeyMaterial> {
        self.calls += 1;
        if self.fail {
            return Err(AttestError::DRIVER_P256_INVALID_PRIV_KEY);
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&hex::decode(PRIV_KEY).unwrap());
        Ok(AttestKeyMaterial::p256(key))
    }
}

pub type TestService = InitialAttestation<TestPlatform, TestKey, Sha256>;

pub fn service(platform: TestPlatform) -> TestService {
    InitialAttestation::new(platform, TestKey::default(), Sha256::new())
}

pub fn get_token(service: &mut TestService, options: TokenOptions) -> Vec<u8> {
    let mut out = vec![0u8; MAX_TOKEN_SIZE];
    let len = service
        .get_token(&CHALLENGE, options, &mut out)
        .expect("token build failed");
    out.truncate(len);
    out
}

pub fn parse_token(token: &[u8]) -> CoseSign1 {
    CoseSign1::from_tagged_slice(token).expect("token is not a tagged COSE_Sign1")
}

/// Claims map of a token, in encoding order
pub fn claims(cose_sign1: &CoseSign1) -> Vec<(i128, Value)> {
    let payload = cose_sign1
        .payload
        .as_ref()
        .expect("COSE_Sign1 payload should be present");
    let Value::Map(map) = Value::from_slice(payload).expect("claims are not CBOR") else {
        panic!("claims should be a CBOR map");
    };
    map.into_iter()
        .map(|(key, value)| match key {
            Value::Integer(label) => (i128::from(label), value),
            other => panic!("claim label {other:?} is not an integer"),
        })
        .collect()
}

pub fn claim(claims: &[(i128, Value)], label: i64) -> Option<&Value> {
    claims
        .iter()
        .find(|(key, _)| *key == label as i128)
        .map(|(_, value)| value)
}
