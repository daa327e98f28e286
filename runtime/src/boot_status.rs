/*++

Licensed under the Apache-2.0 license.

File Name:

    boot_status.rs

Abstract:

    File contains the boot status store: a private copy of the TLV encoded
    shared data the boot loader leaves for the attestation service, and
    lookups over its entries.

--*/

use crate::error::BootStatusError;
use crate::platform::AttestPlatform;
use iat_drivers::cprintln;
use zerocopy::{FromBytes, Immutable, KnownLayout};

/// Maximum number of shared data bytes copied into the store.
pub const BOOT_STATUS_MAX_SIZE: usize = 0x400;

/// Magic value of the shared data header.
pub const SHARED_DATA_TLV_INFO_MAGIC: u16 = 0x2016;

/// Size of the shared data header and of each entry header.
pub const SHARED_DATA_HEADER_SIZE: usize = 4;
pub const SHARED_DATA_ENTRY_HEADER_SIZE: usize = 4;

/// Major type of entries produced for initial attestation.
pub const TLV_MAJOR_IAS: u16 = 0x1;

/// Module of claims that do not belong to a software component.
pub const SW_GENERAL: u8 = 0x00;

/// Largest software component module index.
pub const SW_MODULE_MAX: u8 = 0x3F;

/// Claim IDs of the general module
pub mod general_claim {
    pub const BOOT_SEED: u8 = 0x00;
    pub const HW_VERSION: u8 = 0x01;
    pub const SECURITY_LIFECYCLE: u8 = 0x02;
    pub const IMPLEMENTATION_ID: u8 = 0x03;
}

/// Claim IDs of software component modules
pub mod sw_claim {
    pub const SW_VERSION: u8 = 0x00;
    pub const SW_SIGNER_ID: u8 = 0x01;
    pub const SW_TYPE: u8 = 0x03;
    pub const SW_MEASURE_VALUE: u8 = 0x08;
    pub const SW_MEASURE_TYPE: u8 = 0x09;
    /// Complete, CBOR encoded software component map
    pub const SW_BOOT_RECORD: u8 = 0x3F;
}

/// Compose an entry type from major type, module and claim ID.
pub const fn tlv_type(major: u16, module: u8, claim_id: u8) -> u16 {
    (major << 12) | (((module & 0x3F) as u16) << 6) | (claim_id & 0x3F) as u16
}

const fn tlv_major(tlv_type: u16) -> u16 {
    tlv_type >> 12
}

const fn tlv_module(tlv_type: u16) -> u8 {
    ((tlv_type >> 6) & 0x3F) as u8
}

const fn tlv_claim_id(tlv_type: u16) -> u8 {
    (tlv_type & 0x3F) as u8
}

// Both headers are in the byte order of the CPU that wrote them, which is
// the CPU reading them.
#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable)]
struct SharedDataTlvHeader {
    tlv_magic: u16,
    tlv_tot_len: u16,
}

#[repr(C)]
#[derive(FromBytes, KnownLayout, Immutable)]
struct SharedDataTlvEntry {
    tlv_type: u16,
    tlv_len: u16,
}

/// Position to resume a module scan from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TlvCursor {
    next: usize,
}

/// Entry returned by a lookup
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TlvEntry<'a> {
    pub module: u8,
    pub claim_id: u8,

    /// Entry payload, without the entry header
    pub data: &'a [u8],

    cursor: TlvCursor,
}

impl TlvEntry<'_> {
    /// Cursor that resumes a scan right after this entry.
    pub fn cursor(&self) -> TlvCursor {
        self.cursor
    }
}

/// Read-only copy of the boot status shared data
pub struct BootStatusStore {
    data: [u8; BOOT_STATUS_MAX_SIZE],

    /// Result of validating the data once: the total length or the error
    /// every lookup reports.
    state: Result<usize, BootStatusError>,
}

impl Default for BootStatusStore {
    fn default() -> Self {
        Self {
            data: [0u8; BOOT_STATUS_MAX_SIZE],
            state: Err(BootStatusError::Uninitialized),
        }
    }
}

impl BootStatusStore {
    /// Copy the shared data in from the platform.
    ///
    /// A failing platform leaves an uninitialized store; lookups on it
    /// report [`BootStatusError::Uninitialized`].
    pub fn load<P: AttestPlatform>(platform: &mut P) -> Self {
        let mut store = Self::default();
        match platform.read_boot_status(&mut store.data) {
            Ok(len) if len <= BOOT_STATUS_MAX_SIZE => {
                store.state = Self::validate(&store.data[..len]);
            }
            Ok(len) => {
                cprintln!("[attest] Boot status copy too large, len={}", len);
            }
            Err(e) => {
                cprintln!("[attest] Boot status copy failed: 0x{:x}", u32::from(e));
            }
        }
        if let Err(e) = store.state {
            cprintln!(
                "[attest] Boot status unusable: 0x{:x}",
                u32::from(iat_error::AttestError::from(e))
            );
        }
        store
    }

    /// Create a store over a copy of `bytes`, truncated to
    /// [`BOOT_STATUS_MAX_SIZE`].
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut store = Self::default();
        let len = bytes.len().min(BOOT_STATUS_MAX_SIZE);
        store.data[..len].copy_from_slice(&bytes[..len]);
        store.state = Self::validate(&store.data[..len]);
        store
    }

    /// Check the header and walk every entry once.
    fn validate(bytes: &[u8]) -> Result<usize, BootStatusError> {
        if bytes.is_empty() {
            return Err(BootStatusError::Uninitialized);
        }
        let Ok((header, _)) = SharedDataTlvHeader::read_from_prefix(bytes) else {
            return Err(BootStatusError::BadTotalLength);
        };
        if header.tlv_magic != SHARED_DATA_TLV_INFO_MAGIC {
            return Err(BootStatusError::BadMagic);
        }
        let tot_len = usize::from(header.tlv_tot_len);
        if tot_len < SHARED_DATA_HEADER_SIZE || tot_len > bytes.len() {
            return Err(BootStatusError::BadTotalLength);
        }

        let mut offset = SHARED_DATA_HEADER_SIZE;
        while offset < tot_len {
            let (_, end) = Self::entry_at(bytes, offset, tot_len)?;
            offset = end;
        }
        Ok(tot_len)
    }

    /// Parse the entry header at `offset`, returning its type and the
    /// offset of the next entry.
    fn entry_at(
        bytes: &[u8],
        offset: usize,
        tot_len: usize,
    ) -> Result<(u16, usize), BootStatusError> {
        let rest = bytes
            .get(offset..tot_len)
            .ok_or(BootStatusError::EntryOverrun)?;
        let Ok((entry, _)) = SharedDataTlvEntry::read_from_prefix(rest) else {
            return Err(BootStatusError::EntryOverrun);
        };
        let len = usize::from(entry.tlv_len);
        if len < SHARED_DATA_ENTRY_HEADER_SIZE {
            return Err(BootStatusError::EntryTooShort);
        }
        if len > rest.len() {
            return Err(BootStatusError::EntryOverrun);
        }
        Ok((entry.tlv_type, offset + len))
    }

    /// Validation result of the copied data
    pub fn status(&self) -> Result<(), BootStatusError> {
        self.state.map(|_| ())
    }

    /// Find the next initial attestation entry of `module`.
    ///
    /// # Arguments
    ///
    /// * `module` - Module to match
    /// * `cursor` - `None` to scan from the first entry, or the cursor of a
    ///   previously returned entry to continue after it
    ///
    /// # Returns
    ///
    /// * `Option<TlvEntry>` - Matching entry, `None` once the data is exhausted
    pub fn find_by_module(
        &self,
        module: u8,
        cursor: Option<TlvCursor>,
    ) -> Result<Option<TlvEntry<'_>>, BootStatusError> {
        let tot_len = self.state?;
        let mut offset = cursor.map_or(SHARED_DATA_HEADER_SIZE, |c| c.next);

        while offset < tot_len {
            let (tlv_type, end) = Self::entry_at(&self.data, offset, tot_len)?;
            if tlv_major(tlv_type) == TLV_MAJOR_IAS && tlv_module(tlv_type) == module {
                let data = self
                    .data
                    .get(offset + SHARED_DATA_ENTRY_HEADER_SIZE..end)
                    .ok_or(BootStatusError::EntryOverrun)?;
                return Ok(Some(TlvEntry {
                    module,
                    claim_id: tlv_claim_id(tlv_type),
                    data,
                    cursor: TlvCursor { next: end },
                }));
            }
            offset = end;
        }
        Ok(None)
    }

    /// Find the first general claim with `claim_id` and return its payload.
    pub fn find_by_id(&self, claim_id: u8) -> Result<Option<&[u8]>, BootStatusError> {
        let mut cursor = None;
        while let Some(entry) = self.find_by_module(SW_GENERAL, cursor)? {
            if entry.claim_id == claim_id {
                return Ok(Some(entry.data));
            }
            cursor = Some(entry.cursor());
        }
        Ok(None)
    }
}

/// Decode a 1, 2 or 4 byte unsigned integer written in native byte order.
pub fn decode_uint(bytes: &[u8]) -> Result<u32, BootStatusError> {
    match bytes.len() {
        1 => Ok(u32::from(bytes[0])),
        2 => Ok(u32::from(u16::from_ne_bytes([bytes[0], bytes[1]]))),
        4 => Ok(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])),
        _ => Err(BootStatusError::InvalidIntWidth),
    }
}
