//! Shared data model for the GeoGift claim/unlock toolkit.
//!
//! Everything here is plain data: commitments, unlock tags, claim inputs and
//! the JSON shapes spoken by the HTTP service. Behavior lives in
//! `geogift-crypto` and `geogift-unlock`.

pub mod api;
pub mod events;
pub mod models;
pub mod unlock;
