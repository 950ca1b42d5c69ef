//! Historical statistics
//!
//! Aggregates derived from a corpus of previously labeled threads. A bundle
//! is built once per cache window and then only read by the classifier.

pub mod builder;
pub mod provider;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub use builder::{LabeledThread, StatisticsBuilder};
pub use provider::{CachedProvider, JsonFileSource, StaticProvider, StatisticsProvider, StatisticsSource};

/// A label and how often (percent, 0-100) it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SenderProfile {
    #[serde(default)]
    pub count: u64,
    /// Sorted descending by confidence
    #[serde(default)]
    pub top_labels: Vec<LabelCount>,
    #[serde(default)]
    pub is_internal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordProfile {
    #[serde(default)]
    pub count: u64,
    /// Sorted descending by confidence
    #[serde(default)]
    pub top_labels: Vec<LabelCount>,
}

impl KeywordProfile {
    pub fn top_label(&self) -> Option<&str> {
        self.top_labels.first().map(|l| l.label.as_str())
    }
}

/// Behavioral averages over all threads carrying a label. Rates are in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelProfile {
    #[serde(default)]
    pub avg_action_rate: f64,
    #[serde(default)]
    pub avg_urgent_rate: f64,
    #[serde(default)]
    pub avg_question_rate: f64,
    #[serde(default)]
    pub thread_volume: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalStatistics {
    #[serde(default)]
    pub sender_profiles: BTreeMap<String, SenderProfile>,
    #[serde(default)]
    pub keyword_profiles: BTreeMap<String, KeywordProfile>,
    #[serde(default)]
    pub label_profiles: BTreeMap<String, LabelProfile>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl HistoricalStatistics {
    /// Look up a sender by raw address first, then by its hashed key.
    pub fn sender_profile(&self, sender: &str) -> Option<&SenderProfile> {
        self.sender_profiles
            .get(sender)
            .or_else(|| self.sender_profiles.get(&sender_key(sender)))
    }

    pub fn is_empty(&self) -> bool {
        self.sender_profiles.is_empty()
            && self.keyword_profiles.is_empty()
            && self.label_profiles.is_empty()
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Privacy-preserving sender key: lowercase hex SHA-256 of the address.
pub fn sender_key(sender: &str) -> String {
    let digest = Sha256::digest(sender.to_lowercase().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
