// SPDX-License-Identifier: MIT OR Apache-2.0
//! The trusted signing-key table.
//!
//! Trust is rooted directly here: a small static set of RSA-2048 public
//! keys, looked up by the SHA-256 of the key's little-endian on-disk image
//! (the `public_key` field of the signature directory). No certificate
//! chains. The lookup hash is derived from the modulus when the table is
//! built, so hash and key material cannot drift apart.

use std::sync::LazyLock;

use rsa::{BigUint, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::formats::sigdir::RSA_KEY_SIZE;

/// Public exponent shared by the EFI signing keys.
const PUBLIC_EXPONENT: u32 = 0x10001;

/// Big-endian moduli of the trusted signing keys.
const EFI_SIGNING_KEY_1_N: &str = "CD81BD2ECC29C4F633AC3652CD3417E2218E958BC779FB129D9A819CA84118244D91EC69D3ED980B3E758C8827385CE52C839EA252BAD61AF06234C1A7E6C09D33175081402679D347BF6374E4B32A5C8BBF5E12828C5E4BAFF4C2EA43394C28337B87FA54E960A24B2B735583DC6822EE405DBF674FED2350658100A70B28063B6199A631E1B2F01EF1471F01CB08E858B49237D8B1173E8268D1A87C04F826940018691257BA9529FDAAC17771124FBA5263CDD5FFBEF2FCFF4D80A2DC8224B8F95B7101699E46B332ABC510F3A30002C40376C72E7FF9611CB3C80524027D9D8E7CF6E592E4698A2BAF72E950EBD5704938E5C678C8A9585A55A99D4FB50F";
const EFI_SIGNING_KEY_2_N: &str = "96DDADE8F1FD28D4B45A6309638F76E8F1C932655BC815A3B454311B8006F911A4634DAE1B5A3974B3FE22A640490E48C8E231491F8E5C8F15112566C39E4919945AD55232F44169FA25905A43B83E9CBDFF4EE82DD0964A22FF435DA9DEA9E593C8188EB5E1818464F469D507EDF065990A8A791734ECF2EFD20F2E5732AB78B8285F3A5B6F8616A59728873547D77A885217256EEEB17F5B896A644CE00D151580DD0E08C21C2D3942562BC6386DA4E5715FD60AC150B8460E8E0306763EA6B3006218D338212AFE102FEA78ECD440968E8F0BDACCBD9463E17ACD4B9F2230D5BE76CAE8C66263EC7552A3425260311DEA6F4A66856080898685272F606C91";

/// One trusted key: lookup hash plus the material the RSA verify consumes.
pub struct TrustedKey {
    name: &'static str,
    key_hash: [u8; 32],
    public: RsaPublicKey,
}

impl TrustedKey {
    /// Build an entry from a big-endian modulus. The lookup hash is the
    /// SHA-256 of the key's little-endian on-disk image.
    pub fn from_modulus_be(
        name: &'static str,
        modulus_be: &[u8; RSA_KEY_SIZE],
        exponent: u32,
    ) -> Result<Self, rsa::Error> {
        let mut le = *modulus_be;
        le.reverse();
        let public = RsaPublicKey::new(
            BigUint::from_bytes_be(modulus_be),
            BigUint::from(exponent),
        )?;
        Ok(TrustedKey {
            name,
            key_hash: Sha256::digest(le).into(),
            public,
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key_hash(&self) -> &[u8; 32] {
        &self.key_hash
    }

    pub fn public(&self) -> &RsaPublicKey {
        &self.public
    }
}

static BUILTIN_KEYS: LazyLock<Vec<TrustedKey>> = LazyLock::new(|| {
    [
        ("efi-signing-1", EFI_SIGNING_KEY_1_N),
        ("efi-signing-2", EFI_SIGNING_KEY_2_N),
    ]
    .into_iter()
    .map(|(name, hex)| {
        TrustedKey::from_modulus_be(name, &modulus_bytes(hex), PUBLIC_EXPONENT)
            .expect("builtin key modulus is valid")
    })
    .collect()
});

/// Read-only view of the builtin trust set.
pub fn builtin_keys() -> &'static [TrustedKey] {
    &BUILTIN_KEYS
}

/// Linear lookup by little-endian key-image hash.
pub fn find<'a>(keys: &'a [TrustedKey], key_hash: &[u8; 32]) -> Option<&'a TrustedKey> {
    keys.iter().find(|key| &key.key_hash == key_hash)
}

/// Decode a big-endian hex modulus into its fixed 256-byte form.
pub(crate) fn modulus_bytes(hex: &str) -> [u8; RSA_KEY_SIZE] {
    let n = BigUint::parse_bytes(hex.as_bytes(), 16).expect("modulus is valid hex");
    let be = n.to_bytes_be();
    let mut out = [0u8; RSA_KEY_SIZE];
    let pad = out
        .len()
        .checked_sub(be.len())
        .expect("modulus fits 2048 bits");
    out[pad..].copy_from_slice(&be);
    out
}
