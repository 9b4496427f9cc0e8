// SPDX-License-Identifier: MIT OR Apache-2.0
//! The Apple signature directory.
//!
//! The Security data-directory entry of an Apple-signed image points (by
//! file offset) at a fixed-layout trailer:
//!
//! | offset | field |
//! |--------|-------|
//! | 0      | image size (u32) |
//! | 4      | signature directory size (u32) |
//! | 8      | signature size (u32) |
//! | 12     | compression type (u16) |
//! | 14     | EFI signature marker (u16) |
//! | 16     | unknown GUID |
//! | 32     | certificate-type GUID |
//! | 48     | RSA-2048 public key, little-endian |
//! | 304    | RSA-2048 signature, little-endian |
//!
//! Extraction copies the key and signature and mirrors them byte-reversed
//! for consumers that want big-endian number form. The preamble fields are
//! not semantically validated here; the hasher only reads the embedded
//! directory size for its skip accounting.

use super::{pe::PeContext, read_u32};
use crate::error::VerifyError;

pub const RSA_KEY_SIZE: usize = 256;
pub const PUBLIC_KEY_OFFSET: usize = 48;
pub const SIGNATURE_OFFSET: usize = PUBLIC_KEY_OFFSET + RSA_KEY_SIZE;
pub const SIG_DIR_TOTAL_SIZE: usize = SIGNATURE_OFFSET + RSA_KEY_SIZE;

const DIRECTORY_SIZE_FIELD_OFFSET: usize = 4;

/// Key and signature in both byte orders. Deliberately has no `Debug` impl:
/// diagnostics must not carry key material.
pub struct SignatureBlobs {
    pub public_key_le: [u8; RSA_KEY_SIZE],
    pub public_key_be: [u8; RSA_KEY_SIZE],
    pub signature_le: [u8; RSA_KEY_SIZE],
    pub signature_be: [u8; RSA_KEY_SIZE],
}

/// Copy the public key and signature out of the signature directory.
pub fn extract(image: &[u8], ctx: &PeContext) -> Result<SignatureBlobs, VerifyError> {
    let base = ctx.security_dir.virtual_address as usize;
    let end = base
        .checked_add(SIG_DIR_TOTAL_SIZE)
        .ok_or(VerifyError::MalformedSecurityDir)?;
    let dir = image.get(base..end).ok_or(VerifyError::MalformedSecurityDir)?;

    let mut blobs = SignatureBlobs {
        public_key_le: [0; RSA_KEY_SIZE],
        public_key_be: [0; RSA_KEY_SIZE],
        signature_le: [0; RSA_KEY_SIZE],
        signature_be: [0; RSA_KEY_SIZE],
    };
    blobs
        .public_key_le
        .copy_from_slice(&dir[PUBLIC_KEY_OFFSET..SIGNATURE_OFFSET]);
    blobs
        .signature_le
        .copy_from_slice(&dir[SIGNATURE_OFFSET..SIG_DIR_TOTAL_SIZE]);
    for i in 0..RSA_KEY_SIZE {
        blobs.public_key_be[RSA_KEY_SIZE - 1 - i] = blobs.public_key_le[i];
        blobs.signature_be[RSA_KEY_SIZE - 1 - i] = blobs.signature_le[i];
    }
    Ok(blobs)
}

/// The `signature_directory_size` field at directory offset 4, used by the
/// hasher to skip past the signed blob.
pub fn embedded_directory_size(image: &[u8], directory_offset: usize) -> Option<u32> {
    read_u32(image, directory_offset.checked_add(DIRECTORY_SIZE_FIELD_OFFSET)?)
}
