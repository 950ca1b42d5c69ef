//! Classification components
//!
//! Each component turns an `EmailSignal` into a `ClassificationDecision`;
//! `crate::classifier::TriageClassifier` chains them.

pub mod pattern_scorer;
pub mod rule_classifier;
pub mod sender_lists;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use pattern_scorer::{PatternScore, PatternScorer};
pub use rule_classifier::RuleClassifier;
pub use sender_lists::SenderList;

/// What the mailbox should do with a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriageAction {
    Star,
    Keep,
    Label,
    Archive,
}

impl fmt::Display for TriageAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriageAction::Star => "star",
            TriageAction::Keep => "keep",
            TriageAction::Label => "label",
            TriageAction::Archive => "archive",
        };
        f.write_str(name)
    }
}

/// Classifier output.
///
/// `label` is set only for `Star` and `Label`; `confidence` is always in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDecision {
    pub action: TriageAction,
    pub label: Option<String>,
    pub confidence: f64,
    pub reason: String,
}

impl ClassificationDecision {
    pub fn star(label: &str, confidence: f64, reason: &str) -> Self {
        Self::with_label(TriageAction::Star, label, confidence, reason)
    }

    pub fn label(label: &str, confidence: f64, reason: &str) -> Self {
        Self::with_label(TriageAction::Label, label, confidence, reason)
    }

    pub fn keep(confidence: f64, reason: &str) -> Self {
        Self::without_label(TriageAction::Keep, confidence, reason)
    }

    pub fn archive(confidence: f64, reason: &str) -> Self {
        Self::without_label(TriageAction::Archive, confidence, reason)
    }

    fn with_label(action: TriageAction, label: &str, confidence: f64, reason: &str) -> Self {
        Self {
            action,
            label: Some(label.to_string()),
            confidence: clamp_confidence(confidence),
            reason: reason.to_string(),
        }
    }

    fn without_label(action: TriageAction, confidence: f64, reason: &str) -> Self {
        Self {
            action,
            label: None,
            confidence: clamp_confidence(confidence),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ClassificationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(
                f,
                "{} [{}] ({:.2}): {}",
                self.action, label, self.confidence, self.reason
            ),
            None => write!(f, "{} ({:.2}): {}", self.action, self.confidence, self.reason),
        }
    }
}

fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_enforce_label_invariant() {
        assert_eq!(
            ClassificationDecision::star("VIP", 1.0, "VIP sender").label.as_deref(),
            Some("VIP")
        );
        assert!(ClassificationDecision::keep(0.3, "x").label.is_none());
        assert!(ClassificationDecision::archive(0.9, "x").label.is_none());
    }

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(ClassificationDecision::label("A", 1.7, "x").confidence, 1.0);
        assert_eq!(ClassificationDecision::keep(-0.2, "x").confidence, 0.0);
        assert_eq!(ClassificationDecision::keep(f64::NAN, "x").confidence, 0.0);
    }

    #[test]
    fn test_serialized_shape() {
        let decision = ClassificationDecision::label("Meetings", 0.8, "Academic meeting");
        let json = serde_json::to_value(&decision).unwrap();

        assert_eq!(json["action"], "label");
        assert_eq!(json["label"], "Meetings");
        assert_eq!(
            format!("{decision}"),
            "label [Meetings] (0.80): Academic meeting"
        );
    }
}
