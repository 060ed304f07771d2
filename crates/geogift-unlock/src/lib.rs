//! Unlock dispatch, expiry arithmetic and the escrow boundary.
//!
//! Checks in this crate are advisory. The escrow contract behind
//! [`escrow::EscrowContract`] is the only authority on whether a claim
//! succeeds; [`client::GiftClient`] surfaces its rejections unmodified.

pub mod chain;
pub mod client;
pub mod dispatcher;
pub mod escrow;
pub mod expiry;
pub mod geo;
pub mod logging;
pub mod memory;

pub use client::{ChainReceipt, ClaimError, GiftClient, GiftReceipt};
pub use dispatcher::{
    PublicChallenge, UnlockChallenge, create_clue_hash, create_clue_hash_for_tag, prepare_unlock_data,
    prepare_unlock_data_for_tag, verify_unlock, verify_unlock_for_tag,
};
pub use escrow::{ChainStep, CreateChain, CreateGift, EscrowContract, EscrowRejection};
pub use memory::MemoryEscrow;
