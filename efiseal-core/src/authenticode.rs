// SPDX-License-Identifier: MIT OR Apache-2.0
//! The Apple Authenticode digest.
//!
//! A close variant of Microsoft Authenticode: the `CheckSum` field and the
//! Security data-directory entry are excluded, sections are consumed in
//! ascending file-offset order, inter-section gaps ("codecaves") are hashed,
//! and the signature directory contributes its preamble while the key and
//! signature blobs are skipped by the byte accounting.
//!
//! The byte order is fixed and every range is re-validated against the
//! buffer before it is fed to the hash; a range that leaves the buffer
//! aborts with the matching error kind.

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::VerifyError;
use crate::formats::pe::{
    PeContext, DIRECTORY_ENTRY_SECURITY, DIRECTORY_ENTRY_SIZE, DOS_HEADER_SIZE,
    SECTION_HEADER_SIZE,
};
use crate::formats::{read_u32, sigdir};

/// Digest plus the byte accounting the trailer step is based on;
/// `bytes_hashed` is the post-preamble value, which excludes streamed gap
/// bytes and the skipped signature blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppleDigest {
    pub sha256: [u8; 32],
    pub bytes_hashed: u64,
}

#[derive(Debug, Clone, Copy)]
struct SectionExtent {
    raw_ptr: u32,
    raw_size: u32,
}

/// Compute the Apple Authenticode SHA-256 of `image`.
pub fn digest(image: &[u8], ctx: &PeContext) -> Result<AppleDigest, VerifyError> {
    let mut hasher = Sha256::new();
    let image_size = image.len() as u64;

    // DOS header, even when absent; a stub-less image simply contributes
    // whatever occupies its first 64 bytes.
    hash_range(&mut hasher, image, 0, DOS_HEADER_SIZE as u64, VerifyError::MalformedPe)?;

    // PE header up to (not including) the 4-byte CheckSum.
    hash_range(
        &mut hasher,
        image,
        ctx.pe_hdr_offset as u64,
        ctx.checksum_offset as u64,
        VerifyError::MalformedPe,
    )?;

    let size_of_headers = ctx.size_of_headers as u64;
    if ctx.number_of_rva_and_sizes <= DIRECTORY_ENTRY_SECURITY {
        // No Security entry in the directory table: resume at the CheckSum
        // and run to the end of the image headers.
        hash_range(
            &mut hasher,
            image,
            ctx.checksum_offset as u64,
            size_of_headers,
            VerifyError::MalformedPe,
        )?;
    } else {
        // Skip the CheckSum, stop short of the Security entry.
        hash_range(
            &mut hasher,
            image,
            ctx.checksum_offset as u64 + 4,
            ctx.security_dir_offset as u64,
            VerifyError::MalformedPe,
        )?;
        // Resume one directory slot later, run to the end of the headers.
        hash_range(
            &mut hasher,
            image,
            ctx.reloc_dir_offset as u64,
            size_of_headers,
            VerifyError::MalformedPe,
        )?;
    }

    let mut bytes_hashed = size_of_headers;

    // Sections in ascending file-offset order, via a sorted copy; the
    // on-disk table is left untouched. The sort is stable, so equal raw
    // pointers (only zero-sized sections) cannot reorder.
    let mut sections = Vec::with_capacity(ctx.num_sections as usize);
    for index in 0..ctx.num_sections as usize {
        let header = ctx.first_section_offset + index * SECTION_HEADER_SIZE;
        sections.push(SectionExtent {
            raw_size: read_u32(image, header + 16).ok_or(VerifyError::MalformedSections)?,
            raw_ptr: read_u32(image, header + 20).ok_or(VerifyError::MalformedSections)?,
        });
    }
    sections.sort_by_key(|s| s.raw_ptr);

    let mut codecave_end: u64 = 0;
    for (index, section) in sections.iter().enumerate() {
        if section.raw_size == 0 {
            continue;
        }
        let start = section.raw_ptr as u64;
        let end = start + section.raw_size as u64;
        if index > 0 && start > codecave_end {
            // Unclaimed bytes between sections are part of the signed image.
            hash_range(&mut hasher, image, codecave_end, start, VerifyError::MalformedSections)?;
        }
        hash_range(&mut hasher, image, start, end, VerifyError::MalformedSections)?;
        codecave_end = end;
        // Gap bytes are streamed into the hash but never counted here.
        bytes_hashed += section.raw_size as u64;
    }

    // Signature-directory preamble: `security_dir.size` bytes immediately
    // before the directory. The accounting then jumps the key and signature
    // blobs via the directory's own size field.
    if image_size > bytes_hashed {
        let dir_base = ctx.security_dir.virtual_address as u64;
        let preamble_start = dir_base
            .checked_sub(ctx.security_dir.size as u64)
            .ok_or(VerifyError::MalformedSecurityDir)?;
        hash_range(
            &mut hasher,
            image,
            preamble_start,
            dir_base,
            VerifyError::MalformedSecurityDir,
        )?;
        bytes_hashed += ctx.security_dir.size as u64 + DIRECTORY_ENTRY_SIZE as u64;
        let directory_size = sigdir::embedded_directory_size(image, dir_base as usize)
            .ok_or(VerifyError::MalformedSecurityDir)?;
        bytes_hashed += directory_size as u64;
    }

    // Trailing data past the signed blob.
    if image_size > bytes_hashed {
        hash_range(
            &mut hasher,
            image,
            bytes_hashed,
            image_size,
            VerifyError::MalformedSecurityDir,
        )?;
    }

    debug!(bytes_hashed, image_size, "authenticode digest computed");

    Ok(AppleDigest {
        sha256: hasher.finalize().into(),
        bytes_hashed,
    })
}

fn hash_range(
    hasher: &mut Sha256,
    image: &[u8],
    start: u64,
    end: u64,
    err: VerifyError,
) -> Result<(), VerifyError> {
    if start > end {
        return Err(err);
    }
    let start = usize::try_from(start).map_err(|_| err)?;
    let end = usize::try_from(end).map_err(|_| err)?;
    let chunk = image.get(start..end).ok_or(err)?;
    hasher.update(chunk);
    Ok(())
}
