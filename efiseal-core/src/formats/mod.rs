// SPDX-License-Identifier: MIT OR Apache-2.0
//! On-disk formats: the Apple fat container, PE/COFF headers, and the Apple
//! signature directory.
//!
//! All integers in these formats are little-endian regardless of host. The
//! readers below are the only way the crate pulls integers out of an image
//! buffer: a `None` means the read would have left the slice.

pub mod fat;
pub mod pe;
pub mod sigdir;

pub(crate) fn read_u16(image: &[u8], offset: usize) -> Option<u16> {
    let bytes = image.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_le_bytes(bytes.try_into().ok()?))
}

pub(crate) fn read_u32(image: &[u8], offset: usize) -> Option<u32> {
    let bytes = image.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

pub(crate) fn read_u64(image: &[u8], offset: usize) -> Option<u64> {
    let bytes = image.get(offset..offset.checked_add(8)?)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
}
