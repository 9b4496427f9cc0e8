// SPDX-License-Identifier: MIT OR Apache-2.0
//! Verification error kinds.
//!
//! Every kind is fatal at the verification boundary: callers get a single
//! binary verdict and the first failure wins. The distinctions exist for
//! diagnostics, not for recovery.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// Buffer is smaller than the fixed headers that must be read.
    #[error("image too small to hold the mandatory headers")]
    TooSmall,
    /// DOS header present but `e_lfanew` points outside the image.
    #[error("DOS header with invalid PE offset")]
    MalformedDos,
    #[error("malformed PE/COFF header")]
    MalformedPe,
    /// Optional-header magic is neither PE32 nor PE32+.
    #[error("unsupported optional-header magic")]
    UnsupportedMachine,
    #[error("image has relocations stripped")]
    RelocsStripped,
    #[error("malformed section table")]
    MalformedSections,
    #[error("malformed or missing Apple signature directory")]
    MalformedSecurityDir,
    #[error("malformed fat container")]
    MalformedFat,
    #[error("fat arch slice offset or size out of bounds")]
    WrongArchOffset,
    /// The embedded public key hashes to no entry in the trusted set.
    #[error("public key is not in the trusted set")]
    UnknownKey,
    #[error("RSA signature does not match the image digest")]
    SignatureMismatch,
}
