// SPDX-License-Identifier: MIT OR Apache-2.0
//! Top-level verification: fat-container walk plus the per-image pipeline
//! parse → extract → hash → key lookup → RSA verify.
//!
//! One pass per image, no retries, no partial success: the first failing
//! check decides the verdict. Re-entering from another thread on a disjoint
//! buffer is safe; nothing here is shared but the read-only key table.

use rsa::Pkcs1v15Sign;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::authenticode;
use crate::error::VerifyError;
use crate::formats::{fat, pe, sigdir};
use crate::keys::{self, TrustedKey};

/// Verification outcome for an accepted input. Carries no key material and
/// no digests, only what identifies the verified images.
#[derive(Debug, serde::Serialize)]
pub struct Report {
    pub fat: bool,
    pub images: Vec<ImageReport>,
}

#[derive(Debug, serde::Serialize)]
pub struct ImageReport {
    /// Machine label of the verified image, e.g. "x86_64".
    pub arch: String,
    pub pe32_plus: bool,
    /// Byte offset of the image within the input buffer (0 for a bare PE).
    pub offset: u64,
    pub size: u64,
    /// Name of the trusted key that signed the image.
    pub key: String,
}

/// Verify `image` against the builtin trust set.
///
/// The buffer may be a single PE image or an Apple fat container; for a
/// container every x86/x86_64 slice must verify and the slices must tile
/// the buffer exactly.
pub fn verify(image: &[u8]) -> Result<Report, VerifyError> {
    verify_with_keys(image, keys::builtin_keys())
}

/// Same as [`verify`] with a caller-provided trust set.
pub fn verify_with_keys(image: &[u8], keys: &[TrustedKey]) -> Result<Report, VerifyError> {
    if image.len() < fat::FAT_HEADER_SIZE {
        return Err(VerifyError::TooSmall);
    }
    if !fat::is_fat(image) {
        debug!("no fat magic, verifying as a single PE image");
        let report = verify_pe(image, 0, keys)?;
        return Ok(Report {
            fat: false,
            images: vec![report],
        });
    }

    let image_size = image.len() as u64;
    let num_archs = fat::num_archs(image)?;
    let mut expected_next =
        fat::FAT_HEADER_SIZE as u64 + num_archs as u64 * fat::FAT_ARCH_SIZE as u64;
    if expected_next > image_size {
        return Err(VerifyError::MalformedFat);
    }

    let mut images = Vec::new();
    for index in 0..num_archs {
        let arch = fat::arch_at(image, index)?;
        let (offset, size) = (arch.offset as u64, arch.size as u64);
        if arch.is_x86() {
            debug!(index, cpu_type = arch.cpu_type, offset, size, "verifying fat slice");
            if offset < expected_next || offset >= image_size || offset + size > image_size {
                return Err(VerifyError::WrongArchOffset);
            }
            let slice = &image[offset as usize..(offset + size) as usize];
            let report = verify_pe(slice, offset, keys).inspect_err(|error| {
                debug!(index, cpu_type = arch.cpu_type, %error, "fat slice failed");
            })?;
            images.push(report);
        } else {
            debug!(index, cpu_type = arch.cpu_type, "skipping non-x86 fat slice");
        }
        // Skipped slices advance the tiling cursor too; the final equality
        // is the only thing that constrains them.
        expected_next = offset + size;
    }

    if expected_next != image_size {
        return Err(VerifyError::MalformedFat);
    }
    Ok(Report { fat: true, images })
}

/// Verify a single PE image slice. `file_offset` is only reporting context.
fn verify_pe(
    image: &[u8],
    file_offset: u64,
    keys: &[TrustedKey],
) -> Result<ImageReport, VerifyError> {
    let ctx = pe::parse(image)?;
    let blobs = sigdir::extract(image, &ctx)?;
    let digest = authenticode::digest(image, &ctx)?;

    let key_hash: [u8; 32] = Sha256::digest(blobs.public_key_le).into();
    let key = keys::find(keys, &key_hash).ok_or(VerifyError::UnknownKey)?;

    key.public()
        .verify(
            Pkcs1v15Sign::new::<Sha256>(),
            &digest.sha256,
            &blobs.signature_be,
        )
        .map_err(|_| VerifyError::SignatureMismatch)?;

    debug!(
        bytes_hashed = digest.bytes_hashed,
        key = key.name(),
        "image signature verified"
    );

    Ok(ImageReport {
        arch: pe::machine_label(ctx.machine).to_string(),
        pe32_plus: ctx.magic == pe::MAGIC_PE32_PLUS,
        offset: file_offset,
        size: image.len() as u64,
        key: key.name().to_string(),
    })
}
