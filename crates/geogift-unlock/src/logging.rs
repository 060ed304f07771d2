//! Claim lifecycle logging.
//!
//! `GiftClient` reports every step of a claim through a `ClaimLogger`, so
//! embedders can forward events elsewhere or silence them in tests.

use geogift_types::events::GiftEvent;

pub trait ClaimLogger: Send + Sync {
    fn log(&self, event: &GiftEvent);
}

/// Logger that uses the `tracing` crate.
pub struct TracingLogger;

impl ClaimLogger for TracingLogger {
    fn log(&self, event: &GiftEvent) {
        let gift_id = event.gift_id().map(|id| id.0);
        let chain_id = event.chain_id().map(|id| id.0);
        // Outcomes at info, intermediate steps at debug
        match event {
            GiftEvent::Created { .. }
            | GiftEvent::Claimed { .. }
            | GiftEvent::ChainCreated { .. }
            | GiftEvent::StepClaimed { .. } => {
                tracing::info!(?gift_id, ?chain_id, "{}", event);
            }
            GiftEvent::ClaimRejected { .. } | GiftEvent::StepRejected { .. } => {
                tracing::warn!(?gift_id, ?chain_id, "{}", event);
            }
            GiftEvent::PreflightFailed { .. }
            | GiftEvent::ClaimSubmitted { .. }
            | GiftEvent::StepPreflightFailed { .. }
            | GiftEvent::StepSubmitted { .. } => {
                tracing::debug!(?gift_id, ?chain_id, "{}", event);
            }
        }
    }
}

/// No-op logger that discards all events.
pub struct NullLogger;

impl ClaimLogger for NullLogger {
    fn log(&self, _event: &GiftEvent) {}
}
