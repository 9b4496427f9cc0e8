// SPDX-License-Identifier: MIT OR Apache-2.0
//! Verification of Apple-signed EFI boot images.
//!
//! An input is either a single PE/COFF image carrying an Apple signature
//! directory, or an Apple "fat" container multiplexing several PE images by
//! CPU architecture. [`verify`] re-computes the Apple Authenticode SHA-256
//! over each x86/x86_64 image, checks the embedded RSA-2048 public key
//! against the builtin trusted set, and verifies the signature against the
//! digest.
//!
//! The whole buffer is treated as attacker-controlled: every offset is
//! range-checked at the point of use and all on-disk integers are read
//! explicitly little-endian. Verification is a pure function of the input
//! bytes and the compile-time key table.

pub mod authenticode;
pub mod error;
pub mod formats;
pub mod inspect;
pub mod keys;
pub mod verify;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::VerifyError;
pub use verify::{verify, verify_with_keys, ImageReport, Report};
