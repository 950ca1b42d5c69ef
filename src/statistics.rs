use crate::components::{ClassificationDecision, TriageAction};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counters for one triage run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatistics {
    pub total_threads: u64,
    pub starred: u64,
    pub kept: u64,
    pub labeled: u64,
    pub archived: u64,
    pub errors: u64,
    pub labels: BTreeMap<String, u64>,
    pub reasons: BTreeMap<String, u64>,
    pub start_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum StatEvent {
    Classified(ClassificationDecision),
    Archived,
    ApplyFailed,
}

impl Default for RunStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStatistics {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            total_threads: 0,
            starred: 0,
            kept: 0,
            labeled: 0,
            archived: 0,
            errors: 0,
            labels: BTreeMap::new(),
            reasons: BTreeMap::new(),
            start_time: now,
            last_updated: now,
        }
    }

    pub fn record_event(&mut self, event: StatEvent) {
        self.last_updated = Utc::now();

        match event {
            StatEvent::Classified(decision) => {
                self.total_threads += 1;
                match decision.action {
                    TriageAction::Star => self.starred += 1,
                    TriageAction::Keep => self.kept += 1,
                    TriageAction::Label => self.labeled += 1,
                    TriageAction::Archive => self.archived += 1,
                }
                if let Some(label) = decision.label {
                    *self.labels.entry(label).or_insert(0) += 1;
                }
                *self.reasons.entry(decision.reason).or_insert(0) += 1;
            }
            StatEvent::Archived => self.archived += 1,
            StatEvent::ApplyFailed => self.errors += 1,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn print_summary(&self) {
        println!("📊 Triage Summary");
        println!("  Threads processed: {}", self.total_threads);
        println!("  Starred:  {}", self.starred);
        println!("  Labeled:  {}", self.labeled);
        println!("  Archived: {}", self.archived);
        println!("  Kept:     {}", self.kept);
        if self.errors > 0 {
            println!("  Errors:   {}", self.errors);
        }
        if !self.labels.is_empty() {
            println!("  Labels:");
            for (label, count) in &self.labels {
                println!("    {label}: {count}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_action_and_label() {
        let mut stats = RunStatistics::new();
        stats.record_event(StatEvent::Classified(ClassificationDecision::star(
            "VIP",
            1.0,
            "VIP sender",
        )));
        stats.record_event(StatEvent::Classified(ClassificationDecision::label(
            "Meetings",
            0.8,
            "Academic meeting",
        )));
        stats.record_event(StatEvent::Archived);
        stats.record_event(StatEvent::Classified(ClassificationDecision::keep(
            0.3,
            "No specific rule matched",
        )));
        stats.record_event(StatEvent::ApplyFailed);

        assert_eq!(stats.total_threads, 3);
        assert_eq!(stats.starred, 1);
        assert_eq!(stats.labeled, 1);
        assert_eq!(stats.kept, 1);
        assert_eq!(stats.archived, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.labels["VIP"], 1);
        assert_eq!(stats.labels["Meetings"], 1);
        assert_eq!(stats.reasons["No specific rule matched"], 1);
    }

    #[test]
    fn test_json_report() {
        let stats = RunStatistics::new();
        let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        assert_eq!(json["total_threads"], 0);
        assert!(json["start_time"].is_string());
    }
}
