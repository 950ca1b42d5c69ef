use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide triage settings, loaded once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default)]
    pub senders: SenderListsConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub rules: RuleConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub statistics: StatisticsConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// VIP and protected identities. Entries are matched case-insensitively.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SenderListsConfig {
    #[serde(default)]
    pub vip_senders: Vec<String>,
    #[serde(default)]
    pub vip_domains: Vec<String>,
    #[serde(default)]
    pub protected_senders: Vec<String>,
    #[serde(default)]
    pub protected_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Label decisions at or above this also archive (see `mailbox`)
    #[serde(default = "default_high_confidence")]
    pub high_confidence: f64,
    /// Historical results at or above this win over the rule fallback
    #[serde(default = "default_medium_confidence")]
    pub medium_confidence: f64,
    /// Historical results below this are reported as no match
    #[serde(default = "default_pattern_floor")]
    pub pattern_floor: f64,
}

fn default_high_confidence() -> f64 {
    0.8
}

fn default_medium_confidence() -> f64 {
    0.5
}

fn default_pattern_floor() -> f64 {
    0.3
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_confidence: default_high_confidence(),
            medium_confidence: default_medium_confidence(),
            pattern_floor: default_pattern_floor(),
        }
    }
}

/// Weights used by the historical pattern scorer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_important_label")]
    pub important_label: String,
    /// A sender seen more often than this is "high importance"
    #[serde(default = "default_important_sender_min_count")]
    pub important_sender_min_count: u64,
    #[serde(default = "default_important_sender_weight")]
    pub important_sender_weight: f64,
    #[serde(default = "default_keyword_factor")]
    pub keyword_factor: f64,
    /// Occurrence count at which a keyword reaches full weight
    #[serde(default = "default_keyword_saturation")]
    pub keyword_saturation: f64,
}

fn default_important_label() -> String {
    "Important".to_string()
}

fn default_important_sender_min_count() -> u64 {
    10
}

fn default_important_sender_weight() -> f64 {
    0.4
}

fn default_keyword_factor() -> f64 {
    0.3
}

fn default_keyword_saturation() -> f64 {
    100.0
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            important_label: default_important_label(),
            important_sender_min_count: default_important_sender_min_count(),
            important_sender_weight: default_important_sender_weight(),
            keyword_factor: default_keyword_factor(),
            keyword_saturation: default_keyword_saturation(),
        }
    }
}

/// Static keyword rules for the fallback classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Sender domains that unlock the meeting/student/department rules
    #[serde(default = "default_academic_domains")]
    pub academic_domains: Vec<String>,
    #[serde(default = "default_meeting_keywords")]
    pub meeting_keywords: Vec<String>,
    #[serde(default = "default_student_keywords")]
    pub student_keywords: Vec<String>,
    #[serde(default = "default_department_keywords")]
    pub department_keywords: Vec<String>,
    #[serde(default = "default_newsletter_keywords")]
    pub newsletter_keywords: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_academic_domains() -> Vec<String> {
    strings(&["alaska.edu"])
}

fn default_meeting_keywords() -> Vec<String> {
    strings(&[
        "meeting",
        "schedule",
        "calendar",
        "appointment",
        "zoom",
        "agenda",
    ])
}

fn default_student_keywords() -> Vec<String> {
    strings(&[
        "student",
        "grade",
        "assignment",
        "homework",
        "exam",
        "syllabus",
    ])
}

fn default_department_keywords() -> Vec<String> {
    strings(&["department", "faculty", "dean", "committee", "provost"])
}

fn default_newsletter_keywords() -> Vec<String> {
    strings(&[
        "unsubscribe",
        "newsletter",
        "mailing list",
        "weekly digest",
        "view in browser",
    ])
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            academic_domains: default_academic_domains(),
            meeting_keywords: default_meeting_keywords(),
            student_keywords: default_student_keywords(),
            department_keywords: default_department_keywords(),
            newsletter_keywords: default_newsletter_keywords(),
        }
    }
}

/// Mailbox side-effect policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Senders under these domains are never auto-archived
    #[serde(default = "default_never_archive_domains")]
    pub never_archive_domains: Vec<String>,
    /// Log planned actions without calling the mailbox at all
    #[serde(default)]
    pub preview: bool,
}

fn default_never_archive_domains() -> Vec<String> {
    strings(&["edu"])
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            never_archive_domains: default_never_archive_domains(),
            preview: false,
        }
    }
}

/// Where historical statistics come from and how they are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsConfig {
    pub path: Option<String>,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    /// Key sender profiles by SHA-256 digest instead of the raw address
    #[serde(default)]
    pub hash_senders: bool,
    #[serde(default)]
    pub internal_domains: Vec<String>,
    #[serde(default = "default_min_keyword_count")]
    pub min_keyword_count: u64,
    #[serde(default = "default_top_labels")]
    pub top_labels: usize,
}

fn default_cache_ttl_seconds() -> u64 {
    6 * 60 * 60
}

fn default_min_keyword_count() -> u64 {
    3
}

fn default_top_labels() -> usize {
    3
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            path: None,
            cache_ttl_seconds: default_cache_ttl_seconds(),
            hash_senders: false,
            internal_domains: Vec::new(),
            min_keyword_count: default_min_keyword_count(),
            top_labels: default_top_labels(),
        }
    }
}

/// Batch loop throttle. Zero `pause_every` disables pausing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_pause_every")]
    pub pause_every: usize,
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

fn default_pause_every() -> usize {
    10
}

fn default_pause_ms() -> u64 {
    1000
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pause_every: default_pause_every(),
            pause_ms: default_pause_ms(),
        }
    }
}

impl TriageConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: TriageConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let t = &self.thresholds;
        for (name, value) in [
            ("high_confidence", t.high_confidence),
            ("medium_confidence", t.medium_confidence),
            ("pattern_floor", t.pattern_floor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("thresholds.{name} must be within [0, 1], got {value}");
            }
        }
        if t.medium_confidence > t.high_confidence {
            bail!(
                "thresholds.medium_confidence ({}) exceeds high_confidence ({})",
                t.medium_confidence,
                t.high_confidence
            );
        }
        if self.scoring.keyword_saturation <= 0.0 {
            bail!("scoring.keyword_saturation must be positive");
        }
        if self.statistics.top_labels == 0 {
            bail!("statistics.top_labels must be at least 1");
        }
        Ok(())
    }
}

/// Load the file if it exists, otherwise fall back to defaults.
pub fn load_config_or_default(path: &str) -> anyhow::Result<TriageConfig> {
    if Path::new(path).exists() {
        let config = TriageConfig::from_file(path)?;
        log::info!("Loaded configuration from: {path}");
        Ok(config)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(TriageConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = TriageConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thresholds.high_confidence, 0.8);
        assert_eq!(config.thresholds.medium_confidence, 0.5);
        assert_eq!(config.statistics.cache_ttl_seconds, 21_600);
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
senders:
  vip_senders: ["boss@work.com"]
thresholds:
  medium_confidence: 0.6
"#;
        let config: TriageConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.senders.vip_senders, vec!["boss@work.com"]);
        assert!(config.senders.vip_domains.is_empty());
        assert_eq!(config.thresholds.medium_confidence, 0.6);
        assert_eq!(config.thresholds.high_confidence, 0.8);
        assert_eq!(config.rules.academic_domains, vec!["alaska.edu"]);
        assert!(!config.policy.preview);
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let mut config = TriageConfig::default();
        config.thresholds.medium_confidence = 0.9;
        assert!(config.validate().is_err());

        config.thresholds.medium_confidence = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triage.yaml");

        let mut config = TriageConfig::default();
        config.senders.protected_domains = vec!["family.net".to_string()];
        config.to_file(&path).unwrap();

        let loaded = TriageConfig::from_file(&path).unwrap();
        assert_eq!(loaded.senders.protected_domains, vec!["family.net"]);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "thresholds: [not, a, map]").unwrap();

        let err = TriageConfig::from_file(file.path()).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse YAML config"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = load_config_or_default("/nonexistent/triage.yaml").unwrap();
        assert_eq!(config.run.pause_every, 10);
    }
}
