//! Mailbox Action Applier
//!
//! Turns a classification decision into mailbox side effects. The archive
//! gate lives here rather than in the classifier.

use crate::classifier::VIP_LABEL;
use crate::components::{ClassificationDecision, TriageAction};
use crate::config::{PolicyConfig, ThresholdConfig};
use crate::domain_utils::DomainUtils;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Side effects derived from one decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPlan {
    pub star: bool,
    pub mark_important: bool,
    pub label: Option<String>,
    pub archive: bool,
}

impl ActionPlan {
    pub fn is_noop(&self) -> bool {
        !self.star && !self.mark_important && self.label.is_none() && !self.archive
    }
}

pub struct ActionPolicy {
    high_confidence: f64,
    never_archive_domains: Vec<String>,
}

impl ActionPolicy {
    pub fn new(thresholds: &ThresholdConfig, policy: &PolicyConfig) -> Self {
        Self {
            high_confidence: thresholds.high_confidence,
            never_archive_domains: policy.never_archive_domains.clone(),
        }
    }

    pub fn plan(&self, decision: &ClassificationDecision, sender: &str) -> ActionPlan {
        match decision.action {
            TriageAction::Star => ActionPlan {
                star: true,
                mark_important: true,
                label: Some(
                    decision
                        .label
                        .clone()
                        .unwrap_or_else(|| VIP_LABEL.to_string()),
                ),
                archive: false,
            },
            TriageAction::Label => ActionPlan {
                label: decision.label.clone(),
                archive: decision.confidence >= self.high_confidence
                    && !DomainUtils::sender_in_domains(sender, &self.never_archive_domains),
                ..ActionPlan::default()
            },
            TriageAction::Archive => ActionPlan {
                archive: true,
                ..ActionPlan::default()
            },
            TriageAction::Keep => ActionPlan::default(),
        }
    }
}

/// Mailbox operations on a thread.
pub trait Mailbox {
    fn star(&mut self, thread_id: &str) -> anyhow::Result<()>;
    fn mark_important(&mut self, thread_id: &str) -> anyhow::Result<()>;
    fn apply_label(&mut self, thread_id: &str, label: &str) -> anyhow::Result<()>;
    fn archive(&mut self, thread_id: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailboxOp {
    Star(String),
    MarkImportant(String),
    Label(String, String),
    Archive(String),
}

/// Records operations instead of touching a real mailbox.
#[derive(Debug, Default)]
pub struct DryRunMailbox {
    pub operations: Vec<MailboxOp>,
}

impl DryRunMailbox {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mailbox for DryRunMailbox {
    fn star(&mut self, thread_id: &str) -> anyhow::Result<()> {
        log::info!("[DRY RUN] star {thread_id}");
        self.operations.push(MailboxOp::Star(thread_id.to_string()));
        Ok(())
    }

    fn mark_important(&mut self, thread_id: &str) -> anyhow::Result<()> {
        log::info!("[DRY RUN] mark important {thread_id}");
        self.operations
            .push(MailboxOp::MarkImportant(thread_id.to_string()));
        Ok(())
    }

    fn apply_label(&mut self, thread_id: &str, label: &str) -> anyhow::Result<()> {
        log::info!("[DRY RUN] label {thread_id} as {label}");
        self.operations
            .push(MailboxOp::Label(thread_id.to_string(), label.to_string()));
        Ok(())
    }

    fn archive(&mut self, thread_id: &str) -> anyhow::Result<()> {
        log::info!("[DRY RUN] archive {thread_id}");
        self.operations.push(MailboxOp::Archive(thread_id.to_string()));
        Ok(())
    }
}

/// Executes action plans against a mailbox.
pub struct ActionApplier<M: Mailbox> {
    policy: ActionPolicy,
    mailbox: M,
    preview: bool,
}

impl<M: Mailbox> ActionApplier<M> {
    pub fn new(policy: ActionPolicy, mailbox: M, preview: bool) -> Self {
        Self {
            policy,
            mailbox,
            preview,
        }
    }

    /// Apply one decision; returns the plan that was (or would have been) run.
    pub fn apply(
        &mut self,
        thread_id: &str,
        decision: &ClassificationDecision,
        sender: &str,
    ) -> anyhow::Result<ActionPlan> {
        let plan = self.policy.plan(decision, sender);
        if plan.is_noop() {
            return Ok(plan);
        }
        if self.preview {
            log::info!("[PREVIEW] {thread_id}: {plan:?} ({decision})");
            return Ok(plan);
        }

        if plan.star {
            self.mailbox
                .star(thread_id)
                .with_context(|| format!("Failed to star thread {thread_id}"))?;
        }
        if plan.mark_important {
            self.mailbox
                .mark_important(thread_id)
                .with_context(|| format!("Failed to mark thread {thread_id} important"))?;
        }
        if let Some(label) = &plan.label {
            self.mailbox
                .apply_label(thread_id, label)
                .with_context(|| format!("Failed to label thread {thread_id} as {label}"))?;
        }
        if plan.archive {
            self.mailbox
                .archive(thread_id)
                .with_context(|| format!("Failed to archive thread {thread_id}"))?;
        }
        Ok(plan)
    }

    pub fn mailbox(&self) -> &M {
        &self.mailbox
    }

    pub fn into_mailbox(self) -> M {
        self.mailbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ActionPolicy {
        ActionPolicy::new(&ThresholdConfig::default(), &PolicyConfig::default())
    }

    #[test]
    fn test_high_confidence_label_archives() {
        let decision = ClassificationDecision::label("Newsletters", 0.9, "x");
        let plan = policy().plan(&decision, "news@shop.com");

        assert_eq!(plan.label.as_deref(), Some("Newsletters"));
        assert!(plan.archive);
    }

    #[test]
    fn test_archive_gate_is_inclusive() {
        let at = ClassificationDecision::label("A", 0.8, "x");
        let below = ClassificationDecision::label("A", 0.79, "x");

        assert!(policy().plan(&at, "a@shop.com").archive);
        assert!(!policy().plan(&below, "a@shop.com").archive);
    }

    #[test]
    fn test_academic_senders_never_archived() {
        let decision = ClassificationDecision::label("Newsletters", 0.9, "x");
        let plan = policy().plan(&decision, "news@alaska.edu");

        assert_eq!(plan.label.as_deref(), Some("Newsletters"));
        assert!(!plan.archive);
    }

    #[test]
    fn test_star_and_keep_plans() {
        let star = policy().plan(&ClassificationDecision::star("VIP", 1.0, "x"), "a@b.com");
        assert!(star.star && star.mark_important);
        assert_eq!(star.label.as_deref(), Some("VIP"));
        assert!(!star.archive);

        let keep = policy().plan(&ClassificationDecision::keep(1.0, "x"), "a@b.com");
        assert!(keep.is_noop());

        let archive = policy().plan(&ClassificationDecision::archive(0.2, "x"), "a@b.edu");
        assert!(archive.archive);
    }

    #[test]
    fn test_applier_executes_plan() {
        let mut applier = ActionApplier::new(policy(), DryRunMailbox::new(), false);
        applier
            .apply("t1", &ClassificationDecision::star("VIP", 1.0, "x"), "a@b.com")
            .unwrap();
        applier
            .apply("t2", &ClassificationDecision::label("News", 0.9, "x"), "a@b.com")
            .unwrap();

        assert_eq!(
            applier.mailbox().operations,
            vec![
                MailboxOp::Star("t1".to_string()),
                MailboxOp::MarkImportant("t1".to_string()),
                MailboxOp::Label("t1".to_string(), "VIP".to_string()),
                MailboxOp::Label("t2".to_string(), "News".to_string()),
                MailboxOp::Archive("t2".to_string()),
            ]
        );
    }

    #[test]
    fn test_preview_mode_has_no_side_effects() {
        let mut applier = ActionApplier::new(policy(), DryRunMailbox::new(), true);
        let plan = applier
            .apply("t1", &ClassificationDecision::label("News", 0.9, "x"), "a@b.com")
            .unwrap();

        assert!(plan.archive);
        assert!(applier.into_mailbox().operations.is_empty());
    }

    struct FailingMailbox;

    impl Mailbox for FailingMailbox {
        fn star(&mut self, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn mark_important(&mut self, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
        fn apply_label(&mut self, _: &str, _: &str) -> anyhow::Result<()> {
            anyhow::bail!("label quota exceeded")
        }
        fn archive(&mut self, _: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_mailbox_errors_carry_context() {
        let mut applier = ActionApplier::new(policy(), FailingMailbox, false);
        let err = applier
            .apply("t9", &ClassificationDecision::label("News", 0.5, "x"), "a@b.com")
            .unwrap_err();

        assert!(format!("{err:#}").contains("Failed to label thread t9 as News"));
        assert!(format!("{err:#}").contains("label quota exceeded"));
    }
}
