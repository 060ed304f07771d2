//! GeoGift commitment primitives.
//!
//! Claim codes are human-shareable strings; only their Keccak-256 digest is
//! ever committed on-chain. The escrow contract recomputes the same digest,
//! so everything here must stay bit-for-bit compatible with Solidity's
//! `keccak256` over UTF-8 bytes.

pub mod claim_code;
pub mod hash;

pub use claim_code::{ClaimCode, ClaimCodeGenerator, InvalidClaimCode};
pub use hash::{hash_str, keccak256};
