//! Historical Pattern Scorer
//!
//! Blends sender reputation and keyword-to-label associations from the
//! historical statistics into a single best label.

use super::ClassificationDecision;
use crate::config::{ScoringConfig, ThresholdConfig};
use crate::history::HistoricalStatistics;
use crate::normalization::EmailSignal;
use std::collections::BTreeMap;

/// Per-label accumulation behind a historical decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternScore {
    pub scores: BTreeMap<String, f64>,
    pub total_weight: f64,
    pub evidence: Vec<String>,
}

impl PatternScore {
    fn add(&mut self, label: &str, weight: f64, evidence: String) {
        if weight <= 0.0 || !weight.is_finite() {
            return;
        }
        *self.scores.entry(label.to_string()).or_insert(0.0) += weight;
        self.total_weight += weight;
        self.evidence.push(evidence);
    }

    /// Highest-scoring label. Equal scores resolve to the smallest label name.
    pub fn best(&self) -> Option<(&str, f64)> {
        let mut best: Option<(&str, f64)> = None;
        for (label, score) in &self.scores {
            match best {
                Some((_, top)) if *score <= top => {}
                _ => best = Some((label.as_str(), *score)),
            }
        }
        best
    }

    pub fn confidence(&self) -> f64 {
        match self.best() {
            Some((_, score)) if self.total_weight > 0.0 => (score / self.total_weight).min(1.0),
            _ => 0.0,
        }
    }
}

pub struct PatternScorer {
    scoring: ScoringConfig,
    pattern_floor: f64,
}

impl PatternScorer {
    pub fn new(scoring: ScoringConfig, thresholds: &ThresholdConfig) -> Self {
        Self {
            scoring,
            pattern_floor: thresholds.pattern_floor,
        }
    }

    /// Accumulate label scores for one email
    pub fn score(&self, email: &EmailSignal, stats: &HistoricalStatistics) -> PatternScore {
        let mut score = PatternScore::default();

        if let Some(profile) = stats.sender_profile(&email.sender) {
            if profile.count > self.scoring.important_sender_min_count {
                score.add(
                    &self.scoring.important_label,
                    self.scoring.important_sender_weight,
                    format!("sender seen {} times", profile.count),
                );
            }
        }

        let text = email.text();
        for (keyword, profile) in &stats.keyword_profiles {
            if keyword.is_empty() || !text.contains(keyword.as_str()) {
                continue;
            }
            let Some(label) = profile.top_label() else {
                continue;
            };
            let weight = (profile.count as f64 / self.scoring.keyword_saturation).min(1.0);
            score.add(
                label,
                weight * self.scoring.keyword_factor,
                format!("keyword '{}' -> {}", keyword, label),
            );
        }

        score
    }

    pub fn classify(&self, email: &EmailSignal, stats: &HistoricalStatistics) -> ClassificationDecision {
        let score = self.score(email, stats);
        self.decide(&score)
    }

    pub fn decide(&self, score: &PatternScore) -> ClassificationDecision {
        let confidence = score.confidence();
        match score.best() {
            Some((label, _)) if confidence > 0.0 && confidence >= self.pattern_floor => {
                log::debug!(
                    "Historical match {} ({:.2}): {}",
                    label,
                    confidence,
                    score.evidence.join("; ")
                );
                ClassificationDecision::label(label, confidence, "Historical pattern match")
            }
            _ => ClassificationDecision::keep(0.0, "No pattern match"),
        }
    }
}
