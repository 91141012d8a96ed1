use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Errors that can occur when selecting a hash function
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Unknown hash algorithm: {0} (expected fnv1a, crc32, sdbm or sha256)")]
    UnknownAlgorithm(String),
}

/// Signature shared by every digest function in this module
pub type HashFn = fn(&[u8]) -> u32;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;
const CRC_POLYNOMIAL: u32 = 0xedb8_8320;

/// FNV-1a, 32-bit variant
pub fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Reflected CRC-32, computed bit by bit without a lookup table
pub fn crc_32(bytes: &[u8]) -> u32 {
    let mut crc = 0xffff_ffff_u32;

    for &byte in bytes {
        let mut val = (crc ^ u32::from(byte)) & 0xff;
        for _ in 0..8 {
            val = if val & 1 == 1 {
                (val >> 1) ^ CRC_POLYNOMIAL
            } else {
                val >> 1
            };
        }
        crc = val ^ (crc >> 8);
    }

    crc ^ 0xffff_ffff
}

/// SDBM string hash
pub fn sdbm_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |hash, &byte| {
        u32::from(byte)
            .wrapping_add(hash << 6)
            .wrapping_add(hash << 16)
            .wrapping_sub(hash)
    })
}

/// First four bytes of SHA-256, read big-endian
pub fn sha256_32(bytes: &[u8]) -> u32 {
    let digest = Sha256::digest(bytes);
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Renders a digest as 8 lowercase, zero-padded hexadecimal digits
pub fn to_hex(digest: u32) -> String {
    hex::encode(digest.to_be_bytes())
}

/// The interchangeable 32-bit digest functions a block can be sealed with
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Fnv1a,
    Crc32,
    Sdbm,
    Sha256,
}

impl HashAlgorithm {
    /// All selectable algorithms
    pub const ALL: [HashAlgorithm; 4] = [
        HashAlgorithm::Fnv1a,
        HashAlgorithm::Crc32,
        HashAlgorithm::Sdbm,
        HashAlgorithm::Sha256,
    ];

    /// Gets the digest function backing this algorithm
    pub fn function(self) -> HashFn {
        match self {
            HashAlgorithm::Fnv1a => fnv1a_32,
            HashAlgorithm::Crc32 => crc_32,
            HashAlgorithm::Sdbm => sdbm_32,
            HashAlgorithm::Sha256 => sha256_32,
        }
    }

    /// Hashes the given bytes
    pub fn hash(self, bytes: &[u8]) -> u32 {
        (self.function())(bytes)
    }

    /// Short lowercase name, as accepted by `FromStr`
    pub fn name(self) -> &'static str {
        match self {
            HashAlgorithm::Fnv1a => "fnv1a",
            HashAlgorithm::Crc32 => "crc32",
            HashAlgorithm::Sdbm => "sdbm",
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();

        HashAlgorithm::ALL
            .into_iter()
            .find(|algorithm| algorithm.name() == wanted)
            .ok_or_else(|| HashError::UnknownAlgorithm(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_vectors() {
        assert_eq!(fnv1a_32(b""), 0x811c9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c292c);
        assert_eq!(fnv1a_32(b"foobar"), 0xbf9cf968);
    }

    #[test]
    fn test_crc32_vectors() {
        assert_eq!(crc_32(b""), 0);
        assert_eq!(crc_32(b"a"), 0xe8b7be43);
        assert_eq!(crc_32(b"123456789"), 0xcbf43926);
    }

    #[test]
    fn test_sdbm_vectors() {
        assert_eq!(sdbm_32(b""), 0);
        assert_eq!(sdbm_32(b"a"), 97);
        assert_eq!(sdbm_32(b"ab"), 6_363_201);
    }

    #[test]
    fn test_sha256_truncation() {
        assert_eq!(sha256_32(b""), 0xe3b0c442);
        assert_eq!(sha256_32(b"abc"), 0xba7816bf);
    }

    #[test]
    fn test_order_sensitive() {
        for algorithm in HashAlgorithm::ALL {
            assert_ne!(algorithm.hash(b"01"), algorithm.hash(b"10"), "{algorithm}");
        }
    }

    #[test]
    fn test_deterministic() {
        for algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.hash(b"0123"), algorithm.hash(b"0123"));
        }
    }

    #[test]
    fn test_default_is_fnv1a() {
        assert_eq!(HashAlgorithm::default(), HashAlgorithm::Fnv1a);
        assert_eq!(HashAlgorithm::default().hash(b"a"), 0xe40c292c);
    }

    #[test]
    fn test_to_hex_is_zero_padded() {
        assert_eq!(to_hex(0), "00000000");
        assert_eq!(to_hex(0x00ab_cdef), "00abcdef");
        assert_eq!(to_hex(0x811c_9dc5), "811c9dc5");
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!("fnv1a".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Fnv1a);
        assert_eq!("CRC32".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Crc32);
        assert_eq!(" sdbm ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sdbm);
        assert!(matches!(
            "md5".parse::<HashAlgorithm>(),
            Err(HashError::UnknownAlgorithm(name)) if name == "md5"
        ));

        for algorithm in HashAlgorithm::ALL {
            assert_eq!(algorithm.to_string().parse::<HashAlgorithm>().unwrap(), algorithm);
        }
    }
}
