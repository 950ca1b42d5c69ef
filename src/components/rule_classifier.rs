use super::ClassificationDecision;
use crate::config::RuleConfig;
use crate::domain_utils::DomainUtils;
use crate::normalization::EmailSignal;

/// Static keyword/domain rules used when history is missing or weak.
///
/// The meeting, student and department rules only apply to senders from an
/// academic domain. The newsletter rule applies to every sender.
pub struct RuleClassifier {
    config: RuleConfig,
}

impl RuleClassifier {
    pub fn new(config: RuleConfig) -> Self {
        let lower = |words: Vec<String>| -> Vec<String> {
            words
                .into_iter()
                .map(|w| w.to_lowercase())
                .filter(|w| !w.is_empty())
                .collect()
        };
        Self {
            config: RuleConfig {
                academic_domains: config.academic_domains,
                meeting_keywords: lower(config.meeting_keywords),
                student_keywords: lower(config.student_keywords),
                department_keywords: lower(config.department_keywords),
                newsletter_keywords: lower(config.newsletter_keywords),
            },
        }
    }

    pub fn classify(&self, email: &EmailSignal) -> ClassificationDecision {
        let text = email.text();

        if DomainUtils::sender_in_domains(&email.sender, &self.config.academic_domains) {
            if contains_any(&text, &self.config.meeting_keywords) {
                return ClassificationDecision::label("Meetings", 0.8, "Academic meeting");
            }
            if contains_any(&text, &self.config.student_keywords) {
                return ClassificationDecision::label("Students", 0.8, "Student correspondence");
            }
            if contains_any(&text, &self.config.department_keywords) {
                return ClassificationDecision::label("Department", 0.7, "Department business");
            }
        }

        if contains_any(&text, &self.config.newsletter_keywords) {
            return ClassificationDecision::label("Newsletters", 0.9, "Newsletter or mailing list");
        }

        ClassificationDecision::keep(0.3, "No specific rule matched")
    }
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}
