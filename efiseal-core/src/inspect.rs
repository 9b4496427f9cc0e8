// SPDX-License-Identifier: MIT OR Apache-2.0
//! Read-only introspection of EFI boot images (fat or single PE).
//!
//! The friendly, non-verifying view: it reports what a container holds
//! without judging signatures. Parsing here goes through `goblin` and is
//! deliberately lenient; the verification path in [`crate::verify`] does
//! its own strict parsing and never consults this module.

use anyhow::{Context, Result};
use goblin::pe::{options::ParseOptions, PE};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, debug_span};

use crate::formats::pe::{MAGIC_PE32, MAGIC_PE32_PLUS};
use crate::formats::{fat, read_u16, read_u32};

#[derive(Debug)]
pub struct InspectOptions {
    /// Path to the image to inspect
    pub file: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct Report {
    pub fat: bool,
    pub slices: Vec<SliceReport>,
}

#[derive(Debug, serde::Serialize)]
pub struct SliceReport {
    pub arch: String, // e.g. "x86_64"
    pub pe32_plus: bool,
    /// Fat arch record cpu type, absent for a bare PE.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_type: Option<u32>,
    pub offset: usize,
    pub size: usize,
    pub sections: usize,
    /// A Security data-directory entry exists. Presence is not validity.
    pub has_signature_dir: bool,
}

pub fn inspect(InspectOptions { file }: InspectOptions) -> Result<Report> {
    let _span = debug_span!("inspect", path = %file.display()).entered();

    let t0 = Instant::now();
    let bytes = std::fs::read(&file).with_context(|| format!("read {}", file.display()))?;
    debug!(
        len = bytes.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "read_file"
    );

    inspect_bytes(&bytes)
}

/// Inspect an in-memory image.
pub fn inspect_bytes(bytes: &[u8]) -> Result<Report> {
    if !fat::is_fat(bytes) {
        let slice = summarize(bytes, 0)?;
        return Ok(Report {
            fat: false,
            slices: vec![slice],
        });
    }

    let num_archs = fat::num_archs(bytes).map_err(|_| anyhow::anyhow!("truncated fat header"))?;
    let mut slices = Vec::new();
    for index in 0..num_archs {
        let arch = fat::arch_at(bytes, index)
            .map_err(|_| anyhow::anyhow!("fat arch table truncated at record {index}"))?;
        let (offset, size) = (arch.offset as usize, arch.size as usize);
        let slice = bytes
            .get(offset..offset.saturating_add(size))
            .with_context(|| format!("fat slice {index} leaves the file"))?;
        let mut report = summarize(slice, offset)
            .with_context(|| format!("fat slice {index} ({})", arch.arch_label()))?;
        report.cpu_type = Some(arch.cpu_type);
        slices.push(report);
    }
    Ok(Report { fat: true, slices })
}

fn summarize(slice: &[u8], offset: usize) -> Result<SliceReport> {
    use goblin::pe::header::*;

    let t = Instant::now();
    let mut opts = ParseOptions::default();
    // Apple signature directories are not WIN_CERTIFICATE tables; goblin
    // must not try to parse them as such.
    opts.parse_attribute_certificates = false;
    let pe = PE::parse_with_opts(slice, &opts).context("not a valid PE/EFI image")?;
    let arch = match pe.header.coff_header.machine {
        COFF_MACHINE_X86_64 => "x86_64",
        COFF_MACHINE_ARM64 => "aarch64",
        COFF_MACHINE_ARM => "arm",
        COFF_MACHINE_X86 => "i386",
        _ => "unknown",
    };
    debug!(
        arch,
        pe32_plus = pe.is_64,
        sections = pe.sections.len(),
        elapsed_ms = t.elapsed().as_millis(),
        "parse_pe"
    );

    Ok(SliceReport {
        arch: arch.to_string(),
        pe32_plus: pe.is_64,
        cpu_type: None,
        offset,
        size: slice.len(),
        sections: pe.sections.len(),
        has_signature_dir: has_security_entry(slice),
    })
}

/// Byte-level probe for a non-empty Security data-directory entry. Kept
/// manual because the entry holds a file offset, which goblin would resolve
/// as if it were an RVA.
fn has_security_entry(slice: &[u8]) -> bool {
    let pe_off = if read_u16(slice, 0) == Some(0x5A4D) {
        match read_u32(slice, 0x3C) {
            Some(value) => value as usize,
            None => return false,
        }
    } else {
        0
    };
    let opt = pe_off + 24;
    let dirs_offset = match read_u16(slice, opt) {
        Some(MAGIC_PE32) => 96,
        Some(MAGIC_PE32_PLUS) => 112,
        _ => return false,
    };
    let ndirs_offset = if dirs_offset == 96 { 92 } else { 108 };
    match read_u32(slice, opt + ndirs_offset) {
        Some(count) if count > 4 => {}
        _ => return false,
    }
    matches!(read_u32(slice, opt + dirs_offset + 32), Some(va) if va != 0)
}
