use geogift_crypto::hash_str;
use geogift_types::models::{ClaimHash, GeoError, GeoPoint};
use geogift_types::unlock::{ClaimInput, ClueData, PreflightError, UnlockPayload, UnlockType};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Preimage committed for GPS gifts. The commitment says nothing about the
/// target; the contract gates GPS claims on its separately stored
/// coordinates. Likely an accidental duplicate of that gating, kept so
/// existing contracts keep matching.
pub const GPS_CLUE_MARKER: &str = "GPS_LOCATION";

fn or_empty(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// -- Creation --

/// Commitment stored on-chain when a gift or chain step is created.
///
/// Missing fields hash as the empty string; creation-time validation
/// (see `chain::StepDraft`) is what rejects them.
pub fn create_clue_hash(unlock_type: UnlockType, data: &ClueData) -> ClaimHash {
    let preimage = match unlock_type {
        UnlockType::Gps => GPS_CLUE_MARKER,
        UnlockType::Password => or_empty(&data.password),
        UnlockType::Quiz => or_empty(&data.answer),
        UnlockType::Markdown => or_empty(&data.content),
        UnlockType::Video | UnlockType::Image | UnlockType::Url => or_empty(&data.url),
    };
    hash_str(preimage)
}

/// Same as [`create_clue_hash`] for an undeclared tag. Unknown tags commit to
/// the empty-string hash; callers should treat that as a configuration bug.
pub fn create_clue_hash_for_tag(tag: &str, data: &ClueData) -> ClaimHash {
    match tag.parse() {
        Ok(unlock_type) => create_clue_hash(unlock_type, data),
        Err(e) => {
            warn!("{}, committing to the empty hash", e);
            hash_str("")
        }
    }
}

// -- Claim --

/// Build the payload for the contract's claim call.
///
/// GPS coordinates pass through untouched (distance is the contract's job).
/// Password and quiz reveal the hash of whichever of `password`/`answer` is
/// filled in, in that order.
pub fn prepare_unlock_data(unlock_type: UnlockType, input: &ClaimInput) -> UnlockPayload {
    match unlock_type {
        UnlockType::Gps => UnlockPayload {
            lat: finite(input.lat).unwrap_or(0.0),
            lng: finite(input.lng).unwrap_or(0.0),
            unlock_bytes: None,
        },
        UnlockType::Password | UnlockType::Quiz => {
            let secret = non_empty(&input.password)
                .or_else(|| non_empty(&input.answer))
                .unwrap_or("");
            UnlockPayload {
                unlock_bytes: Some(hash_str(secret)),
                ..UnlockPayload::EMPTY
            }
        }
        UnlockType::Video | UnlockType::Image | UnlockType::Markdown | UnlockType::Url => {
            UnlockPayload::EMPTY
        }
    }
}

pub fn prepare_unlock_data_for_tag(tag: &str, input: &ClaimInput) -> UnlockPayload {
    match tag.parse() {
        Ok(unlock_type) => prepare_unlock_data(unlock_type, input),
        Err(e) => {
            warn!("{}, sending an empty payload", e);
            UnlockPayload::EMPTY
        }
    }
}

/// Local pre-flight check run before spending a transaction.
///
/// Passing says nothing about whether the contract will accept: a GPS
/// claim may still be too far away, a password may still be wrong.
pub fn verify_unlock(unlock_type: UnlockType, input: &ClaimInput) -> Result<(), PreflightError> {
    match unlock_type {
        UnlockType::Gps => {
            if finite(input.lat).is_none() || finite(input.lng).is_none() {
                return Err(PreflightError::LocationRequired);
            }
        }
        UnlockType::Password => {
            if non_empty(&input.password).is_none() {
                return Err(PreflightError::PasswordRequired);
            }
        }
        UnlockType::Quiz => {
            if non_empty(&input.answer).is_none() {
                return Err(PreflightError::AnswerRequired);
            }
        }
        UnlockType::Markdown | UnlockType::Video | UnlockType::Image | UnlockType::Url => {}
    }
    debug!(unlock_type = %unlock_type, "pre-flight passed");
    Ok(())
}

pub fn verify_unlock_for_tag(tag: &str, input: &ClaimInput) -> Result<(), PreflightError> {
    let unlock_type: UnlockType = tag.parse().map_err(|_| PreflightError::UnknownUnlockType)?;
    verify_unlock(unlock_type, input)
}

// -- Challenges --

/// Reference data a challenge carries besides its commitment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChallengeReference {
    /// Authoritative target, checked by the contract at claim time
    Location { target: GeoPoint, radius_meters: u32 },
    /// Password hint or quiz question; the answer itself is only committed
    Secret { prompt: Option<String> },
    Content { content: String },
    Media { url: String },
}

/// What a recipient may see before claiming. The GPS target stays with the
/// escrow; revealing it would let a claimant echo it back without going there.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublicChallenge {
    Location { radius_meters: u32 },
    Secret { prompt: Option<String> },
    Content { content: String },
    Media { url: String },
}

impl ChallengeReference {
    pub fn public(&self) -> PublicChallenge {
        match self {
            Self::Location { radius_meters, .. } => {
                PublicChallenge::Location { radius_meters: *radius_meters }
            }
            Self::Secret { prompt } => PublicChallenge::Secret { prompt: prompt.clone() },
            Self::Content { content } => PublicChallenge::Content { content: content.clone() },
            Self::Media { url } => PublicChallenge::Media { url: url.clone() },
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ChallengeError {
    #[error("GPS unlock requires a target location")]
    MissingTarget,
    #[error("GPS unlock radius must be positive")]
    ZeroRadius,
    #[error(transparent)]
    Geo(#[from] GeoError),
}

/// An unlock type bound to its creation data. The type cannot change for
/// the lifetime of the gift.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnlockChallenge {
    unlock_type: UnlockType,
    clue_hash: ClaimHash,
    reference: ChallengeReference,
}

impl UnlockChallenge {
    /// `location` is the GPS target and radius in meters; ignored for every
    /// other type.
    pub fn new(
        unlock_type: UnlockType,
        data: &ClueData,
        location: Option<(GeoPoint, u32)>,
    ) -> Result<Self, ChallengeError> {
        let reference = match unlock_type {
            UnlockType::Gps => {
                let (target, radius_meters) = location.ok_or(ChallengeError::MissingTarget)?;
                target.validate()?;
                if radius_meters == 0 {
                    return Err(ChallengeError::ZeroRadius);
                }
                ChallengeReference::Location { target, radius_meters }
            }
            UnlockType::Password => ChallengeReference::Secret { prompt: data.hint.clone() },
            UnlockType::Quiz => ChallengeReference::Secret { prompt: data.question.clone() },
            UnlockType::Markdown => ChallengeReference::Content {
                content: or_empty(&data.content).to_string(),
            },
            UnlockType::Video | UnlockType::Image | UnlockType::Url => ChallengeReference::Media {
                url: or_empty(&data.url).to_string(),
            },
        };

        Ok(Self {
            unlock_type,
            clue_hash: create_clue_hash(unlock_type, data),
            reference,
        })
    }

    pub fn unlock_type(&self) -> UnlockType {
        self.unlock_type
    }

    pub fn clue_hash(&self) -> ClaimHash {
        self.clue_hash
    }

    pub fn reference(&self) -> &ChallengeReference {
        &self.reference
    }

    pub fn verify(&self, input: &ClaimInput) -> Result<(), PreflightError> {
        verify_unlock(self.unlock_type, input)
    }

    pub fn prepare(&self, input: &ClaimInput) -> UnlockPayload {
        prepare_unlock_data(self.unlock_type, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clue_hash_per_type() {
        assert_eq!(create_clue_hash(UnlockType::Gps, &ClueData::default()), hash_str("GPS_LOCATION"));
        assert_eq!(create_clue_hash(UnlockType::Password, &ClueData::password("abc")), hash_str("abc"));
        assert_ne!(
            create_clue_hash(UnlockType::Password, &ClueData::password("abd")),
            hash_str("abc")
        );
        assert_eq!(
            create_clue_hash(UnlockType::Quiz, &ClueData::quiz("Capital of France?", "paris")),
            hash_str("paris")
        );
        assert_eq!(
            create_clue_hash(UnlockType::Markdown, &ClueData::content("# Hello")),
            hash_str("# Hello")
        );
        for t in [UnlockType::Video, UnlockType::Image, UnlockType::Url] {
            assert_eq!(
                create_clue_hash(t, &ClueData::url("https://example.com/a.mp4")),
                hash_str("https://example.com/a.mp4")
            );
        }
    }

    #[test]
    fn gps_clue_ignores_creation_data() {
        let data = ClueData { password: Some("x".into()), url: Some("y".into()), ..ClueData::default() };
        assert_eq!(
            create_clue_hash(UnlockType::Gps, &data),
            create_clue_hash(UnlockType::Gps, &ClueData::default())
        );
    }

    #[test]
    fn missing_fields_hash_as_empty() {
        assert_eq!(create_clue_hash(UnlockType::Password, &ClueData::default()), hash_str(""));
        assert_eq!(create_clue_hash(UnlockType::Url, &ClueData::default()), hash_str(""));
    }

    #[test]
    fn unknown_tag_degrades() {
        assert_eq!(create_clue_hash_for_tag("hologram", &ClueData::password("abc")), hash_str(""));
        assert_eq!(create_clue_hash_for_tag("Password", &ClueData::password("abc")), hash_str("abc"));
        assert_eq!(
            prepare_unlock_data_for_tag("hologram", &ClaimInput::location(1.0, 2.0)),
            UnlockPayload::EMPTY
        );
        assert_eq!(
            verify_unlock_for_tag("hologram", &ClaimInput::default()),
            Err(PreflightError::UnknownUnlockType)
        );
    }

    #[test]
    fn prepare_gps_passes_coordinates_through() {
        let payload = prepare_unlock_data(UnlockType::Gps, &ClaimInput::location(48.85, 2.35));
        assert_eq!(payload, UnlockPayload { lat: 48.85, lng: 2.35, unlock_bytes: None });
        let missing = prepare_unlock_data(UnlockType::Gps, &ClaimInput::default());
        assert_eq!(missing, UnlockPayload::EMPTY);
    }

    #[test]
    fn prepare_secret_types_hash_input() {
        let payload = prepare_unlock_data(UnlockType::Password, &ClaimInput::password("abc"));
        assert_eq!(payload.unlock_bytes, Some(hash_str("abc")));
        assert_eq!((payload.lat, payload.lng), (0.0, 0.0));

        let quiz = prepare_unlock_data(UnlockType::Quiz, &ClaimInput::answer("paris"));
        assert_eq!(quiz.unlock_bytes, Some(hash_str("paris")));

        let empty = prepare_unlock_data(UnlockType::Quiz, &ClaimInput::default());
        assert_eq!(empty.unlock_bytes, Some(hash_str("")));

        let location_ignored = ClaimInput { lat: Some(5.0), ..ClaimInput::password("abc") };
        let payload = prepare_unlock_data(UnlockType::Password, &location_ignored);
        assert_eq!(payload.lat, 0.0);
    }

    #[test]
    fn prepare_view_only_is_empty() {
        let input = ClaimInput { lat: Some(1.0), lng: Some(1.0), password: Some("p".into()), answer: None };
        for t in [UnlockType::Markdown, UnlockType::Video, UnlockType::Image, UnlockType::Url] {
            assert_eq!(prepare_unlock_data(t, &input), UnlockPayload::EMPTY);
        }
    }

    #[test]
    fn verify_gps_requires_both_coordinates() {
        assert_eq!(
            verify_unlock(UnlockType::Gps, &ClaimInput::default()),
            Err(PreflightError::LocationRequired)
        );
        let half = ClaimInput { lat: Some(1.0), ..ClaimInput::default() };
        assert_eq!(verify_unlock(UnlockType::Gps, &half), Err(PreflightError::LocationRequired));
        assert_eq!(verify_unlock(UnlockType::Gps, &ClaimInput::location(1.0, 2.0)), Ok(()));
        // The equator and prime meridian are real places.
        assert_eq!(verify_unlock(UnlockType::Gps, &ClaimInput::location(0.0, 0.0)), Ok(()));
        assert_eq!(
            verify_unlock(UnlockType::Gps, &ClaimInput::location(f64::NAN, 0.0)),
            Err(PreflightError::LocationRequired)
        );
    }

    #[test]
    fn verify_secrets_require_text() {
        assert_eq!(
            verify_unlock(UnlockType::Password, &ClaimInput::password("")),
            Err(PreflightError::PasswordRequired)
        );
        assert_eq!(verify_unlock(UnlockType::Password, &ClaimInput::password("x")), Ok(()));
        assert_eq!(
            verify_unlock(UnlockType::Quiz, &ClaimInput::default()),
            Err(PreflightError::AnswerRequired)
        );
        assert_eq!(verify_unlock(UnlockType::Quiz, &ClaimInput::answer("paris")), Ok(()));
    }

    #[test]
    fn verify_view_only_always_passes() {
        for t in [UnlockType::Markdown, UnlockType::Video, UnlockType::Image, UnlockType::Url] {
            assert_eq!(verify_unlock(t, &ClaimInput::default()), Ok(()));
        }
    }

    #[test]
    fn quiz_commitment_matches_only_the_right_answer() {
        let challenge =
            UnlockChallenge::new(UnlockType::Quiz, &ClueData::quiz("Capital of France?", "paris"), None)
                .unwrap();
        let right = challenge.prepare(&ClaimInput::answer("paris"));
        let wrong = challenge.prepare(&ClaimInput::answer("rome"));
        assert_eq!(right.unlock_bytes, Some(challenge.clue_hash()));
        assert_ne!(wrong.unlock_bytes, Some(challenge.clue_hash()));
        assert_eq!(
            challenge.reference(),
            &ChallengeReference::Secret { prompt: Some("Capital of France?".into()) }
        );
    }

    #[test]
    fn gps_challenge_needs_a_target() {
        assert_eq!(
            UnlockChallenge::new(UnlockType::Gps, &ClueData::default(), None),
            Err(ChallengeError::MissingTarget)
        );
        let target = GeoPoint { latitude: 40.0, longitude: -74.0 };
        assert_eq!(
            UnlockChallenge::new(UnlockType::Gps, &ClueData::default(), Some((target, 0))),
            Err(ChallengeError::ZeroRadius)
        );
        let bad = GeoPoint { latitude: 100.0, longitude: 0.0 };
        assert!(matches!(
            UnlockChallenge::new(UnlockType::Gps, &ClueData::default(), Some((bad, 50))),
            Err(ChallengeError::Geo(_))
        ));

        let challenge =
            UnlockChallenge::new(UnlockType::Gps, &ClueData::default(), Some((target, 50))).unwrap();
        assert_eq!(challenge.clue_hash(), hash_str(GPS_CLUE_MARKER));
        assert_eq!(challenge.verify(&ClaimInput::default()), Err(PreflightError::LocationRequired));
    }

    #[test]
    fn public_view_hides_the_gps_target() {
        let target = GeoPoint { latitude: 40.7128, longitude: -74.0060 };
        let challenge =
            UnlockChallenge::new(UnlockType::Gps, &ClueData::default(), Some((target, 10))).unwrap();
        let public = challenge.reference().public();
        assert_eq!(public, PublicChallenge::Location { radius_meters: 10 });

        let value = serde_json::to_value(&public).unwrap();
        assert_eq!(value, serde_json::json!({ "kind": "location", "radius_meters": 10 }));
        assert!(value.get("target").is_none());

        let quiz = ChallengeReference::Secret { prompt: Some("Capital of France?".into()) };
        assert_eq!(
            quiz.public(),
            PublicChallenge::Secret { prompt: Some("Capital of France?".into()) }
        );
    }
}
