//! Versioned phrase lexicon used by the scorer.
//!
//! A lexicon holds three disjoint phrase sets (critical, high, medium).
//! Phrases are stored trimmed and lowercased and are matched as plain
//! substrings of the lowercased message. When a phrase is listed at more
//! than one tier, only the most severe entry survives.
//!
//! Lexicons load from JSON:
//!
//! ```json
//! {
//!   "version": "campus-2024-05",
//!   "critical": ["suicide", {"phrase": "kill myself", "label": "crisis:self-harm"}],
//!   "high": ["hopeless"],
//!   "medium": ["stressed"]
//! }
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::domain::{LexiconLoadError, RiskTier};

/// One phrase and the label recorded when it matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexiconEntry {
    pub phrase: String,
    pub label: String,
}

/// Immutable, validated phrase sets. Share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    version: String,
    critical: Vec<LexiconEntry>,
    high: Vec<LexiconEntry>,
    medium: Vec<LexiconEntry>,
}

/// Raw on-disk form, validated by [`Lexicon::from_document`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LexiconDocument {
    pub version: String,
    #[serde(default)]
    pub critical: Vec<EntrySpec>,
    #[serde(default)]
    pub high: Vec<EntrySpec>,
    #[serde(default)]
    pub medium: Vec<EntrySpec>,
}

/// A bare phrase, or a phrase with an explicit label.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Phrase(String),
    Labeled {
        phrase: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl EntrySpec {
    fn parts(&self) -> (&str, Option<&str>) {
        match self {
            Self::Phrase(p) => (p, None),
            Self::Labeled { phrase, label } => (phrase, label.as_deref()),
        }
    }
}

const BUILTIN_VERSION: &str = "builtin-1";

const BUILTIN_CRITICAL: &[&str] = &[
    "suicide",
    "kill myself",
    "end it all",
    "want to die",
    "harm myself",
    "self harm",
    "cut myself",
    "overdose",
    "not worth living",
    "better off dead",
    "end my life",
    "hurt myself",
    "can't go on",
    "hanging myself",
    "jump off",
    "pills",
    "razor",
    "rope",
    "cutting",
];

const BUILTIN_HIGH: &[&str] = &[
    "hopeless",
    "worthless",
    "trapped",
    "burden",
    "alone",
    "desperate",
    "cant take it",
    "can't take it",
    "give up",
    "nothing matters",
    "pointless",
    "no point",
    "useless",
];

const BUILTIN_MEDIUM: &[&str] = &[
    "depressed",
    "anxious",
    "stressed",
    "overwhelmed",
    "sad",
    "worried",
    "panic",
    "fear",
    "anxiety attack",
    "can't breathe",
    "lonely",
    "heart racing",
    "dizzy",
    "help me",
    "emergency",
    "urgent",
    "crisis",
];

/// Builtin phrases must already be in normalized form: non-empty, trimmed
/// and lowercase.
const fn normalized(phrases: &[&str]) -> bool {
    let mut i = 0;
    while i < phrases.len() {
        let bytes = phrases[i].as_bytes();
        if bytes.is_empty() || bytes[0] == b' ' || bytes[bytes.len() - 1] == b' ' {
            return false;
        }
        let mut j = 0;
        while j < bytes.len() {
            if bytes[j].is_ascii_uppercase() {
                return false;
            }
            j += 1;
        }
        i += 1;
    }
    true
}

const _: () = assert!(normalized(BUILTIN_CRITICAL), "builtin critical phrase not normalized");
const _: () = assert!(normalized(BUILTIN_HIGH), "builtin high phrase not normalized");
const _: () = assert!(normalized(BUILTIN_MEDIUM), "builtin medium phrase not normalized");

fn label_prefix(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Critical => "crisis",
        RiskTier::High => "high",
        RiskTier::Medium => "medium",
        RiskTier::None => "none",
    }
}

fn normalize_phrase(raw: &str) -> Option<String> {
    let phrase = raw.trim().to_lowercase();
    (!phrase.is_empty()).then_some(phrase)
}

/// Accumulates entries tier by tier, most severe first, dropping phrases
/// already claimed by a higher tier.
struct Builder {
    seen: HashSet<String>,
}

impl Builder {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Claim `phrase` for `tier`. `None` when a higher tier already has it.
    fn entry(
        &mut self,
        tier: RiskTier,
        phrase: String,
        label: Option<&str>,
    ) -> Option<LexiconEntry> {
        if !self.seen.insert(phrase.clone()) {
            debug!(
                phrase = %phrase,
                tier = %tier,
                "lexicon phrase already claimed, keeping higher-tier entry"
            );
            return None;
        }
        let label = label
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}:{}", label_prefix(tier), phrase));
        Some(LexiconEntry { phrase, label })
    }

    fn tier<'a>(
        &mut self,
        tier: RiskTier,
        specs: impl IntoIterator<Item = (usize, &'a str, Option<&'a str>)>,
    ) -> std::result::Result<Vec<LexiconEntry>, LexiconLoadError> {
        let mut out = Vec::new();
        for (index, raw, label) in specs {
            let phrase = normalize_phrase(raw).ok_or_else(|| LexiconLoadError::EmptyPhrase {
                tier: tier.to_string(),
                index,
            })?;
            out.extend(self.entry(tier, phrase, label));
        }
        Ok(out)
    }
}

impl Lexicon {
    /// The lexicon compiled into the engine.
    pub fn builtin() -> Self {
        let mut builder = Builder::new();
        let mut build = |tier: RiskTier, phrases: &[&str]| -> Vec<LexiconEntry> {
            phrases
                .iter()
                .filter_map(|p| builder.entry(tier, p.to_string(), None))
                .collect()
        };
        let critical = build(RiskTier::Critical, BUILTIN_CRITICAL);
        let high = build(RiskTier::High, BUILTIN_HIGH);
        let medium = build(RiskTier::Medium, BUILTIN_MEDIUM);
        Self {
            version: BUILTIN_VERSION.to_string(),
            critical,
            high,
            medium,
        }
    }

    /// Validate a raw document into a lexicon.
    ///
    /// # Errors
    ///
    /// Returns `LexiconLoadError` on an empty version, an empty phrase, or an
    /// empty critical tier. No partial lexicon is ever produced.
    pub fn from_document(doc: &LexiconDocument) -> std::result::Result<Self, LexiconLoadError> {
        let version = doc.version.trim();
        if version.is_empty() {
            return Err(LexiconLoadError::EmptyVersion);
        }

        let mut builder = Builder::new();
        let mut tier_specs = |tier: RiskTier, specs: &[EntrySpec]| {
            builder.tier(
                tier,
                specs.iter().enumerate().map(|(i, s)| {
                    let (phrase, label) = s.parts();
                    (i, phrase, label)
                }),
            )
        };
        let critical = tier_specs(RiskTier::Critical, &doc.critical)?;
        let high = tier_specs(RiskTier::High, &doc.high)?;
        let medium = tier_specs(RiskTier::Medium, &doc.medium)?;

        if critical.is_empty() {
            return Err(LexiconLoadError::NoCriticalPhrases);
        }

        Ok(Self {
            version: version.to_string(),
            critical,
            high,
            medium,
        })
    }

    /// Parse and validate a JSON lexicon.
    pub fn from_json_str(json: &str) -> std::result::Result<Self, LexiconLoadError> {
        let doc: LexiconDocument = serde_json::from_str(json)?;
        Self::from_document(&doc)
    }

    /// Read, parse and validate a JSON lexicon file.
    pub fn from_path(path: &Path) -> std::result::Result<Self, LexiconLoadError> {
        let data = std::fs::read_to_string(path).map_err(|source| LexiconLoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Entries at one tier. `RiskTier::None` has no entries.
    pub fn entries(&self, tier: RiskTier) -> &[LexiconEntry] {
        match tier {
            RiskTier::Critical => &self.critical,
            RiskTier::High => &self.high,
            RiskTier::Medium => &self.medium,
            RiskTier::None => &[],
        }
    }

    /// The tier a phrase belongs to, if any.
    pub fn tier_of(&self, phrase: &str) -> Option<RiskTier> {
        let phrase = normalize_phrase(phrase)?;
        RiskTier::DESCENDING
            .into_iter()
            .find(|t| self.entries(*t).iter().any(|e| e.phrase == phrase))
    }

    /// Total number of phrases across all tiers.
    pub fn len(&self) -> usize {
        self.critical.len() + self.high.len() + self.medium.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// SHA-256 hex digest over the normalized content, for audit trails.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.version.as_bytes());
        hasher.update(b"\n");
        for tier in [RiskTier::Critical, RiskTier::High, RiskTier::Medium] {
            for entry in self.entries(tier) {
                hasher.update(format!("{}\t{}\t{}\n", tier, entry.phrase, entry.label).as_bytes());
            }
        }
        hex::encode(hasher.finalize())
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::builtin()
    }
}
