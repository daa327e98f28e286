// Licensed under the Apache-2.0 license

//! Common error types for the EAT encoder library

/// Error type for EAT, COSE and CBOR encoding operations
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EatError {
    /// The output buffer cannot hold the encoded item.
    BufferTooSmall,
    /// The value cannot be represented (e.g. a map with a dangling key).
    InvalidData,
    /// More arrays, maps or byte-string wraps are open than the encoder tracks.
    NestingTooDeep,
    /// A close did not match the innermost open, or an open was left at finish.
    UnbalancedNesting,
}
