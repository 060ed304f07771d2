use geogift_types::models::ClaimHash;
use sha3::{Digest, Keccak256};

/// Keccak-256 over raw bytes (the pre-standard padding Ethereum uses, not
/// SHA3-256).
pub fn keccak256(bytes: &[u8]) -> ClaimHash {
    let digest = Keccak256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    ClaimHash(out)
}

/// Hash the exact UTF-8 encoding of a string. No trimming or case folding.
pub fn hash_str(s: &str) -> ClaimHash {
    keccak256(s.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vectors() {
        assert_eq!(
            hash_str("").to_hex(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            hash_str("abc").to_hex(),
            "0x4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn hashes_utf8_not_folded() {
        assert_ne!(hash_str("Paris"), hash_str("paris"));
        assert_ne!(hash_str("paris "), hash_str("paris"));
        assert_eq!(hash_str("café"), keccak256("café".as_bytes()));
        assert_eq!(keccak256(&[0xc3, 0xa9]), hash_str("é"));
    }
}
