//! Triage Classifier
//!
//! Entry point combining the sender lists, the historical pattern scorer and
//! the rule fallback. Classification is pure: the same inputs always produce
//! the same decision and nothing is mutated.

use crate::components::{
    ClassificationDecision, PatternScorer, RuleClassifier, SenderList, TriageAction,
};
use crate::config::TriageConfig;
use crate::history::{HistoricalStatistics, StatisticsProvider};
use crate::normalization::EmailSignal;

pub const VIP_LABEL: &str = "VIP";

pub struct TriageClassifier {
    vip: SenderList,
    protected: SenderList,
    scorer: PatternScorer,
    rules: RuleClassifier,
    medium_confidence: f64,
}

impl TriageClassifier {
    pub fn new(config: &TriageConfig) -> Self {
        let senders = &config.senders;
        Self {
            vip: SenderList::new(&senders.vip_senders, &senders.vip_domains),
            protected: SenderList::new(&senders.protected_senders, &senders.protected_domains),
            scorer: PatternScorer::new(config.scoring.clone(), &config.thresholds),
            rules: RuleClassifier::new(config.rules.clone()),
            medium_confidence: config.thresholds.medium_confidence,
        }
    }

    pub fn classify(
        &self,
        email: &EmailSignal,
        stats: Option<&HistoricalStatistics>,
    ) -> ClassificationDecision {
        let decision = self.decide(email, stats);
        log::debug!("{} -> {}", email.sender, decision);
        decision
    }

    /// Classify against whatever snapshot the provider currently holds
    pub fn classify_with(
        &self,
        email: &EmailSignal,
        provider: &dyn StatisticsProvider,
    ) -> ClassificationDecision {
        let snapshot = provider.snapshot();
        self.classify(email, snapshot.as_deref())
    }

    fn decide(
        &self,
        email: &EmailSignal,
        stats: Option<&HistoricalStatistics>,
    ) -> ClassificationDecision {
        if self.vip.contains(&email.sender) {
            return ClassificationDecision::star(VIP_LABEL, 1.0, "VIP sender");
        }

        if self.protected.contains(&email.sender) {
            return ClassificationDecision::keep(1.0, "Protected sender");
        }

        if let Some(stats) = stats {
            let historical = self.scorer.classify(email, stats);
            if historical.action == TriageAction::Label
                && historical.confidence >= self.medium_confidence
            {
                return historical;
            }
        }

        self.rules.classify(email)
    }
}
