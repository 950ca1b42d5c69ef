use super::{
    sender_key, HistoricalStatistics, KeywordProfile, LabelCount, LabelProfile, SenderProfile,
};
use crate::config::StatisticsConfig;
use crate::domain_utils::DomainUtils;
use crate::normalization::EmailSignal;
use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

const STOP_WORDS: &[&str] = &[
    "about", "after", "again", "also", "been", "before", "being", "could", "does", "each",
    "from", "have", "here", "into", "just", "more", "most", "only", "other", "over", "please",
    "some", "such", "than", "that", "their", "them", "then", "there", "these", "they", "this",
    "those", "very", "want", "were", "what", "when", "where", "which", "while", "will", "with",
    "would", "your",
];

/// One thread from the labeled corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabeledThread {
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Default)]
struct Tally {
    count: u64,
    labels: HashMap<String, u64>,
}

impl Tally {
    fn record(&mut self, labels: &[String]) {
        self.count += 1;
        for label in labels {
            *self.labels.entry(label.clone()).or_insert(0) += 1;
        }
    }

    fn top_labels(&self, k: usize) -> Vec<LabelCount> {
        let mut ranked: Vec<(&String, &u64)> = self.labels.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        ranked
            .into_iter()
            .take(k)
            .map(|(label, hits)| LabelCount {
                label: label.clone(),
                confidence: percent(*hits, self.count),
            })
            .collect()
    }
}

#[derive(Default)]
struct LabelTally {
    volume: u64,
    action: u64,
    urgent: u64,
    question: u64,
}

/// Aggregates a labeled corpus into sender, keyword and label profiles.
pub struct StatisticsBuilder {
    config: StatisticsConfig,
    token_regex: Regex,
    action_regex: Regex,
    urgent_regex: Regex,
}

impl StatisticsBuilder {
    pub fn new(config: StatisticsConfig) -> Self {
        Self {
            config,
            token_regex: Regex::new(r"[a-z][a-z0-9]{3,}").unwrap(),
            action_regex: Regex::new(
                r"(?i)\b(action required|can you|could you|need you to|deadline|due by|please review|rsvp)\b",
            )
            .unwrap(),
            urgent_regex: Regex::new(r"(?i)\b(urgent|asap|immediately|critical|time.sensitive)\b")
                .unwrap(),
        }
    }

    pub fn build(&self, threads: &[LabeledThread]) -> HistoricalStatistics {
        let mut senders: BTreeMap<String, Tally> = BTreeMap::new();
        let mut keywords: BTreeMap<String, Tally> = BTreeMap::new();
        let mut labels: BTreeMap<String, LabelTally> = BTreeMap::new();

        for thread in threads {
            let signal = EmailSignal::new(&thread.from, &thread.subject, &thread.snippet);
            let text = signal.text();

            senders
                .entry(signal.sender.clone())
                .or_default()
                .record(&thread.labels);

            for token in self.tokens(&text) {
                keywords.entry(token).or_default().record(&thread.labels);
            }

            let has_action = self.action_regex.is_match(&text);
            let is_urgent = self.urgent_regex.is_match(&text);
            let has_question = text.contains('?');
            for label in &thread.labels {
                let tally = labels.entry(label.clone()).or_default();
                tally.volume += 1;
                tally.action += has_action as u64;
                tally.urgent += is_urgent as u64;
                tally.question += has_question as u64;
            }
        }

        let k = self.config.top_labels;
        let sender_profiles = senders
            .into_iter()
            .map(|(sender, tally)| {
                let profile = SenderProfile {
                    count: tally.count,
                    top_labels: tally.top_labels(k),
                    is_internal: DomainUtils::sender_in_domains(
                        &sender,
                        &self.config.internal_domains,
                    ),
                };
                let key = if self.config.hash_senders {
                    sender_key(&sender)
                } else {
                    sender
                };
                (key, profile)
            })
            .collect();

        let keyword_profiles = keywords
            .into_iter()
            .filter(|(_, tally)| tally.count >= self.config.min_keyword_count)
            .map(|(keyword, tally)| {
                (
                    keyword,
                    KeywordProfile {
                        count: tally.count,
                        top_labels: tally.top_labels(k),
                    },
                )
            })
            .collect();

        let label_profiles = labels
            .into_iter()
            .map(|(label, tally)| {
                (
                    label,
                    LabelProfile {
                        avg_action_rate: rate(tally.action, tally.volume),
                        avg_urgent_rate: rate(tally.urgent, tally.volume),
                        avg_question_rate: rate(tally.question, tally.volume),
                        thread_volume: tally.volume,
                    },
                )
            })
            .collect();

        let stats = HistoricalStatistics {
            sender_profiles,
            keyword_profiles,
            label_profiles,
            generated_at: Some(chrono::Utc::now()),
        };

        log::info!(
            "Built historical statistics from {} threads: {} senders, {} keywords, {} labels",
            threads.len(),
            stats.sender_profiles.len(),
            stats.keyword_profiles.len(),
            stats.label_profiles.len()
        );

        stats
    }

    /// Distinct non-stop-word tokens of a lowercase text
    fn tokens(&self, text: &str) -> BTreeSet<String> {
        self.token_regex
            .find_iter(text)
            .map(|m| m.as_str())
            .filter(|token| !STOP_WORDS.contains(token))
            .map(str::to_string)
            .collect()
    }

    pub fn load_corpus<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<LabeledThread>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse corpus JSON: {}", path.display()))
    }
}

fn percent(hits: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (hits as f64 * 1000.0 / total as f64).round() / 10.0
}

fn rate(hits: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(from: &str, subject: &str, labels: &[&str]) -> LabeledThread {
        LabeledThread {
            from: from.to_string(),
            subject: subject.to_string(),
            snippet: String::new(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    fn builder() -> StatisticsBuilder {
        StatisticsBuilder::new(StatisticsConfig {
            min_keyword_count: 2,
            top_labels: 2,
            internal_domains: vec!["work.com".to_string()],
            ..Default::default()
        })
    }

    #[test]
    fn test_sender_profiles_rank_labels() {
        let corpus = vec![
            thread("Boss <boss@work.com>", "Budget", &["Finance"]),
            thread("boss@work.com", "Budget again", &["Finance", "Urgent"]),
            thread("boss@work.com", "Lunch", &["Social"]),
        ];
        let stats = builder().build(&corpus);

        let profile = &stats.sender_profiles["boss@work.com"];
        assert_eq!(profile.count, 3);
        assert!(profile.is_internal);
        assert_eq!(profile.top_labels.len(), 2);
        assert_eq!(profile.top_labels[0].label, "Finance");
        assert_eq!(profile.top_labels[0].confidence, 66.7);
        // Social and Urgent tie at one hit; name order decides
        assert_eq!(profile.top_labels[1].label, "Social");
    }

    #[test]
    fn test_keyword_profiles_respect_min_count() {
        let corpus = vec![
            thread("a@x.com", "Invoice attached", &["Finance"]),
            thread("b@x.com", "Your invoice", &["Finance"]),
            thread("c@x.com", "Picnic photos", &["Social"]),
        ];
        let stats = builder().build(&corpus);

        let invoice = &stats.keyword_profiles["invoice"];
        assert_eq!(invoice.count, 2);
        assert_eq!(invoice.top_label(), Some("Finance"));
        assert_eq!(invoice.top_labels[0].confidence, 100.0);
        assert!(!stats.keyword_profiles.contains_key("picnic"));
        assert!(!stats.keyword_profiles.contains_key("your"));
    }

    #[test]
    fn test_label_profiles_track_behavior() {
        let corpus = vec![
            thread("a@x.com", "URGENT: can you sign?", &["Admin"]),
            thread("b@x.com", "Minutes", &["Admin"]),
        ];
        let stats = builder().build(&corpus);

        let admin = &stats.label_profiles["Admin"];
        assert_eq!(admin.thread_volume, 2);
        assert_eq!(admin.avg_action_rate, 0.5);
        assert_eq!(admin.avg_urgent_rate, 0.5);
        assert_eq!(admin.avg_question_rate, 0.5);
        assert!(stats.generated_at.is_some());
    }

    #[test]
    fn test_hashed_sender_keys() {
        let builder = StatisticsBuilder::new(StatisticsConfig {
            hash_senders: true,
            ..Default::default()
        });
        let stats = builder.build(&[thread("alice@x.com", "hi", &[])]);

        assert!(!stats.sender_profiles.contains_key("alice@x.com"));
        assert_eq!(stats.sender_profile("alice@x.com").unwrap().count, 1);
    }

    #[test]
    fn test_load_corpus_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus.json");
        std::fs::write(
            &path,
            r#"[{"from": "a@x.com", "subject": "Hello", "labels": ["Social"]}]"#,
        )
        .unwrap();

        let corpus = StatisticsBuilder::load_corpus(&path).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus[0].snippet, "");
        assert!(StatisticsBuilder::load_corpus(dir.path().join("missing.json")).is_err());
    }
}
