use std::fmt;

use anyhow::{Result, bail};
use geogift_types::models::ClaimHash;
use rand::Rng;
use thiserror::Error;

use crate::hash::hash_str;

pub const DEFAULT_ADJECTIVES: &[&str] = &[
    "HAPPY", "LUCKY", "SUNNY", "BRIGHT", "MAGIC", "GOLDEN", "SWIFT", "COSMIC", "JOLLY", "BRAVE",
];

pub const DEFAULT_NOUNS: &[&str] = &[
    "GIFT", "TREASURE", "SURPRISE", "STAR", "PRIZE", "QUEST", "BOX", "COIN", "MAP", "GEM",
];

pub const DEFAULT_YEAR: &str = "2025";

const SUFFIX_ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 3;

/// A validated `ADJECTIVE-NOUN-YEAR-XXX` claim code.
///
/// The random suffix only carries 36^3 = 46,656 combinations. That is
/// accepted: the code is meant to be read aloud or typed from a card, and the
/// contract gates release on the hash commitment plus the gift's unlock
/// factor, not on the code being unguessable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClaimCode(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid claim code {cleaned:?}, expected ADJECTIVE-NOUN-YEAR-XXX")]
pub struct InvalidClaimCode {
    /// Input after normalization, so callers can show what was stripped.
    pub cleaned: String,
}

impl ClaimCode {
    /// Normalize free-text input and validate it.
    pub fn parse(input: &str) -> Result<Self, InvalidClaimCode> {
        let cleaned = clean_claim_code_input(input);
        if is_valid_claim_code(&cleaned) {
            Ok(Self(cleaned))
        } else {
            Err(InvalidClaimCode { cleaned })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn hash(&self) -> ClaimHash {
        generate_claim_hash(&self.0)
    }

    pub fn display(&self) -> String {
        format_claim_code_for_display(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ClaimCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ClaimCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Produces claim codes from fixed word lists and a fixed year.
#[derive(Debug, Clone)]
pub struct ClaimCodeGenerator {
    adjectives: Vec<String>,
    nouns: Vec<String>,
    year: String,
}

impl Default for ClaimCodeGenerator {
    fn default() -> Self {
        Self {
            adjectives: DEFAULT_ADJECTIVES.iter().map(|w| w.to_string()).collect(),
            nouns: DEFAULT_NOUNS.iter().map(|w| w.to_string()).collect(),
            year: DEFAULT_YEAR.to_string(),
        }
    }
}

impl ClaimCodeGenerator {
    /// Build a generator from custom word lists.
    ///
    /// Every word must be non-empty `A-Z` and the year exactly four ASCII
    /// digits, so generated codes always pass `is_valid_claim_code`.
    pub fn new<A, N>(adjectives: A, nouns: N, year: impl Into<String>) -> Result<Self>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        let adjectives: Vec<String> = adjectives.into_iter().map(Into::into).collect();
        let nouns: Vec<String> = nouns.into_iter().map(Into::into).collect();
        let year = year.into();

        check_words("adjective", &adjectives)?;
        check_words("noun", &nouns)?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            bail!("Claim code year must be four digits, got {:?}", year);
        }

        Ok(Self { adjectives, nouns, year })
    }

    /// Default word lists with a different year literal.
    pub fn with_year(year: impl Into<String>) -> Result<Self> {
        Self::new(DEFAULT_ADJECTIVES.iter().copied(), DEFAULT_NOUNS.iter().copied(), year)
    }

    pub fn year(&self) -> &str {
        &self.year
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> ClaimCode {
        let adjective = &self.adjectives[rng.random_range(0..self.adjectives.len())];
        let noun = &self.nouns[rng.random_range(0..self.nouns.len())];
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();

        ClaimCode(format!("{}-{}-{}-{}", adjective, noun, self.year, suffix))
    }
}

fn check_words(kind: &str, words: &[String]) -> Result<()> {
    if words.is_empty() {
        bail!("Claim code {} list is empty", kind);
    }
    if let Some(bad) = words.iter().find(|w| !is_word(w)) {
        bail!("Claim code {} {:?} must be non-empty A-Z", kind, bad);
    }
    Ok(())
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_uppercase())
}

/// Generate a code with the built-in word lists.
pub fn generate_claim_code<R: Rng + ?Sized>(rng: &mut R) -> ClaimCode {
    ClaimCodeGenerator::default().generate(rng)
}

/// On-chain commitment for a claim code.
pub fn generate_claim_hash(code: &str) -> ClaimHash {
    hash_str(code)
}

/// Full-string match against `[A-Z]+-[A-Z]+-\d{4}-[A-Z0-9]{3}`.
pub fn is_valid_claim_code(input: &str) -> bool {
    let mut parts = input.split('-');
    let (Some(adjective), Some(noun), Some(year), Some(suffix), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    is_word(adjective)
        && is_word(noun)
        && year.len() == 4
        && year.bytes().all(|b| b.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

/// Normalize free-text entry: drop whitespace, uppercase, keep only
/// `[A-Z0-9-]`. Run this before `is_valid_claim_code`.
pub fn clean_claim_code_input(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

/// Spaced-out form for humans. Never hash this.
pub fn format_claim_code_for_display(code: &str) -> String {
    code.replace('-', " - ")
}
