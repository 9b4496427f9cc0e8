// SPDX-License-Identifier: MIT OR Apache-2.0
//! Synthetic signed images for tests.
//!
//! Everything here is deterministic: the buffers are patterned byte-by-byte
//! and the signing key is a fixed RSA-2048 keypair embedded as components,
//! so no test depends on an RNG or on fixture files.

use rsa::{BigUint, Pkcs1v15Sign, RsaPrivateKey};
use sha2::Sha256;

use crate::authenticode;
use crate::formats::pe;
use crate::keys::{modulus_bytes, TrustedKey};

const TEST_KEY_N: &str = "97B3F5AF1ADA23C537903E64A18FFA0728783618E400FD026E20AE292921448ED2F81CA34CF080ADE610686AA90C71ADEA1271DB2F08D796D5EAD8C21044665833EE650CD3A711D3299355B1D4598C2559950B2710C684AA99137CA4F4A1ABA71210A82CB15FCB9FDDE4DC2D3D4A215FEE31C4C7DF8A752204E3FD545C17FE0DE162F39E119A0D3EA0DBDBA853692E54FEF5468F16A39224A195FD770E02019BCB712543CECC21385105E1F9C339CB61175973441A2B631DF6244A4CEFB3167092B12B36DFF5B66BAE098F12D168350590E3F14164F51E0CA7F1C69FB1DE4C02BE3B6ADE0D15CBBB8A0EFA1FBD9D8F821663A1E902F9AF4B944567F0D95A7D91";
const TEST_KEY_D: &str = "62DD1EE1CCE818A3B0404AC91E194C6259D76DB9EEED4DF5C57B7AC4CC4F27F4C43C79BD5AA8E9D36AB98AB2E8147A0953204E1EFF9A0D95F93721A7E71E0C6CB2FB4BD37E23C5140E663C54B604DDB681990639A14F1EAA673431E8F69C5DD7758871711EEF452E9C5747BE1BD131CAE8DA7A599FAF0602F398F9417EFB0BCF52DB400FDF673EF195C2591ACBF350F7A950B98EEDC714484D945C51815B26A979BFAE76C0C668C4789B61E907822D7BAF599DEB6AEDF6A0273CFC7C5B4E53F8597CBF098C5A40EFA51609939BDD7B4F87DD0F3B4ECDB71885EEA64C33FE235B66C3903E6C2DD7D12E28FFEB0B44BEBB05A9BDE9D33F7DF6D3F0C7094719C981";
const TEST_KEY_P: &str = "BCF9E7DDE3B8788CDB9DE7162B4AA4DC4D4FBAC369A0929EAB00A16C1AF3616489BD369CFF837222EB09FF2A38354767C0FC3A80D11CAE55F7C62685DF65E23060EDA51C5958615EEC6014A967E2CF1C0904D04703A5D9C1E02D984505B7C5D85EB42D39C22B5F8A897E8287E57C20C6260CB77A8A0783834243FFCDDAFBA2A9";
const TEST_KEY_Q: &str = "CD81D4CAB21CB6F66EB9EDA295F067002797B1E51E3361718C7CB9A4FEB492BCDED8256BDEC0D421F72225E461A0E0F6DFF6EF1A7ACF856173599F3B6E4520EF2F157B40BC14DAE80FC6CEF3B8152F5C8F129F38399FB1956C1FD6AE9F17FC9BA5383F39681ABEDD84E5979CC39EE5AAAF9CD7E081730E8DE46A484BF488BCA9";
const TEST_KEY_E: u32 = 0x10001;

fn big(hex: &str) -> BigUint {
    BigUint::parse_bytes(hex.as_bytes(), 16).expect("test key hex")
}

pub(crate) fn test_private_key() -> RsaPrivateKey {
    RsaPrivateKey::from_components(
        big(TEST_KEY_N),
        BigUint::from(TEST_KEY_E),
        big(TEST_KEY_D),
        vec![big(TEST_KEY_P), big(TEST_KEY_Q)],
    )
    .expect("test key components are consistent")
}

pub(crate) fn test_trusted_key() -> TrustedKey {
    TrustedKey::from_modulus_be("test-signing", &modulus_bytes(TEST_KEY_N), TEST_KEY_E)
        .expect("test key modulus is valid")
}

pub(crate) struct Fixture {
    pub image: Vec<u8>,
    /// File offset of the Apple signature directory.
    pub sig_dir_offset: usize,
}

impl Fixture {
    pub fn put_u16(&mut self, offset: usize, value: u16) {
        self.image[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    pub fn put_u32(&mut self, offset: usize, value: u32) {
        self.image[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    fn put_u64(&mut self, offset: usize, value: u64) {
        self.image[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }
}

pub(crate) fn read_u16_at(image: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([image[offset], image[offset + 1]])
}

/// Position-dependent filler so byte flips always change content.
fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i as u8).wrapping_mul(31).wrapping_add(7)).collect()
}

/// A complete Apple-signed PE32+ image, 0x980 bytes:
///
/// ```text
/// 0x000  DOS header, e_lfanew = 0x80
/// 0x080  PE signature, file header (x86_64, 2 sections)
/// 0x098  PE32+ optional header, 16 data directories,
///        Security entry = (0x730, 48)
/// 0x188  section table: .data (0x600+0x100) listed before .text
///        (0x400+0x200) to exercise the file-offset sort
/// 0x400  .text raw data        0x600  .data raw data
/// 0x700  48-byte hashed preamble
/// 0x730  Apple signature directory (560 bytes, skipped by accounting)
/// 0x960  trailer, hashed
/// ```
pub(crate) fn signed_pe32plus() -> Fixture {
    let mut fx = Fixture {
        image: patterned(0x980),
        sig_dir_offset: 0x730,
    };

    // DOS header.
    fx.image[0] = b'M';
    fx.image[1] = b'Z';
    fx.put_u32(0x3C, 0x80);

    // PE signature and file header.
    fx.image[0x80..0x84].copy_from_slice(b"PE\0\0");
    fx.put_u16(0x84, 0x8664); // machine: x86_64
    fx.put_u16(0x86, 2); // sections
    fx.put_u16(0x94, 240); // optional header: fixed body + 16 slots
    fx.put_u16(0x96, 0x2022); // characteristics, relocations kept

    // PE32+ optional header.
    let opt = 0x98;
    fx.put_u16(opt, pe::MAGIC_PE32_PLUS);
    fx.put_u32(opt + 16, 0x1000); // entry point
    fx.put_u64(opt + 24, 0x1000_0000); // image base
    fx.put_u32(opt + 56, 0x980); // size of image
    fx.put_u32(opt + 60, 0x400); // size of headers
    fx.put_u32(opt + 64, 0); // checksum, excluded from the hash
    fx.put_u32(opt + 108, 16); // directory entries
    for slot in 0..16usize {
        fx.put_u32(opt + 112 + slot * 8, 0);
        fx.put_u32(opt + 112 + slot * 8 + 4, 0);
    }
    fx.put_u32(opt + 112 + 4 * 8, 0x730); // Security: directory file offset
    fx.put_u32(opt + 112 + 4 * 8 + 4, 48); // Security: preamble length

    // Section table, deliberately not in file-offset order.
    write_section(&mut fx, 0x188, b".data\0\0\0", 0x2000, 0x100, 0x600);
    write_section(&mut fx, 0x188 + 40, b".text\0\0\0", 0x1000, 0x200, 0x400);

    // Signature directory preamble fields.
    let dir = fx.sig_dir_offset;
    fx.put_u32(dir, 0x980); // recorded image size
    fx.put_u32(dir + 4, 552); // directory size past its first 8 bytes
    fx.put_u32(dir + 8, 256); // signature size
    fx.put_u16(dir + 12, 0); // compression type
    fx.put_u16(dir + 14, 1); // EFI signature marker

    // Public key, little-endian on disk.
    let mut key_le = modulus_bytes(TEST_KEY_N);
    key_le.reverse();
    fx.image[dir + 48..dir + 304].copy_from_slice(&key_le);

    // Sign the Authenticode digest and store the signature little-endian.
    // The signature field lies in the skipped blob, so writing it does not
    // change the digest.
    let ctx = pe::parse(&fx.image).expect("fixture header is valid");
    let digest = authenticode::digest(&fx.image, &ctx).expect("fixture hashes");
    let mut signature = test_private_key()
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest.sha256)
        .expect("test key signs");
    signature.reverse();
    fx.image[dir + 304..dir + 560].copy_from_slice(&signature);

    fx
}

/// A PE32+ image whose directory table stops at four entries, so the hash
/// takes the short prologue. One nameless section at 0x400+0x200 ends flush
/// with the 0x600-byte buffer; the bytes the parser reads as the Security
/// entry are the section header's zeroed name.
pub(crate) fn unsigned_pe32plus_four_dirs() -> Fixture {
    let mut fx = Fixture {
        image: patterned(0x600),
        sig_dir_offset: 0,
    };

    fx.image[0] = b'M';
    fx.image[1] = b'Z';
    fx.put_u32(0x3C, 0x80);

    fx.image[0x80..0x84].copy_from_slice(b"PE\0\0");
    fx.put_u16(0x84, 0x8664);
    fx.put_u16(0x86, 1);
    fx.put_u16(0x94, 144); // fixed body + 4 slots
    fx.put_u16(0x96, 0x2022);

    let opt = 0x98;
    fx.put_u16(opt, pe::MAGIC_PE32_PLUS);
    fx.put_u32(opt + 16, 0x1000);
    fx.put_u64(opt + 24, 0x1000_0000);
    fx.put_u32(opt + 56, 0x980);
    fx.put_u32(opt + 60, 0x400);
    fx.put_u32(opt + 64, 0);
    fx.put_u32(opt + 108, 4);
    for slot in 0..4usize {
        fx.put_u32(opt + 112 + slot * 8, 0);
        fx.put_u32(opt + 112 + slot * 8 + 4, 0);
    }

    write_section(&mut fx, 0x128, &[0; 8], 0x1000, 0x200, 0x400);
    fx
}

fn write_section(
    fx: &mut Fixture,
    offset: usize,
    name: &[u8; 8],
    virtual_address: u32,
    raw_size: u32,
    raw_ptr: u32,
) {
    fx.image[offset..offset + 8].copy_from_slice(name);
    fx.put_u32(offset + 8, raw_size); // virtual size
    fx.put_u32(offset + 12, virtual_address);
    fx.put_u32(offset + 16, raw_size);
    fx.put_u32(offset + 20, raw_ptr);
    for tail in (offset + 24..offset + 40).step_by(4) {
        fx.put_u32(tail, 0);
    }
}

/// Wrap slices in a fat container: header, arch table, then the slices
/// back to back so the container tiles exactly.
pub(crate) fn wrap_fat(slices: &[(u32, &[u8])]) -> Vec<u8> {
    use crate::formats::fat::{EFI_FAT_MAGIC, FAT_ARCH_SIZE, FAT_HEADER_SIZE};

    let table_end = FAT_HEADER_SIZE + slices.len() * FAT_ARCH_SIZE;
    let mut fat = EFI_FAT_MAGIC.to_le_bytes().to_vec();
    fat.extend_from_slice(&(slices.len() as u32).to_le_bytes());

    let mut offset = table_end;
    for (cpu_type, slice) in slices {
        for word in [*cpu_type, 3, offset as u32, slice.len() as u32, 0] {
            fat.extend_from_slice(&word.to_le_bytes());
        }
        offset += slice.len();
    }
    for (_, slice) in slices {
        fat.extend_from_slice(slice);
    }
    fat
}
