use crate::classifier::TriageClassifier;
use crate::components::ClassificationDecision;
use crate::config::RunConfig;
use crate::history::StatisticsProvider;
use crate::mailbox::{ActionApplier, ActionPlan, Mailbox};
use crate::normalization::EmailSignal;
use crate::statistics::{RunStatistics, StatEvent};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// One thread to triage, using its latest message's metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadInput {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub snippet: String,
}

impl ThreadInput {
    pub fn load_batch<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<ThreadInput>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse batch JSON: {}", path.display()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ThreadOutcome {
    pub id: String,
    pub sender: String,
    pub decision: ClassificationDecision,
    pub plan: Option<ActionPlan>,
    pub error: Option<String>,
}

pub struct TriageRunner<'a, M: Mailbox> {
    classifier: &'a TriageClassifier,
    provider: &'a dyn StatisticsProvider,
    applier: ActionApplier<M>,
    run: RunConfig,
    statistics: RunStatistics,
}

impl<'a, M: Mailbox> TriageRunner<'a, M> {
    pub fn new(
        classifier: &'a TriageClassifier,
        provider: &'a dyn StatisticsProvider,
        applier: ActionApplier<M>,
        run: RunConfig,
    ) -> Self {
        Self {
            classifier,
            provider,
            applier,
            run,
            statistics: RunStatistics::new(),
        }
    }

    /// Classify and apply every thread. Apply failures are recorded and the
    /// batch continues.
    pub fn run(&mut self, threads: &[ThreadInput]) -> Vec<ThreadOutcome> {
        let mut outcomes = Vec::with_capacity(threads.len());

        for (i, thread) in threads.iter().enumerate() {
            if i > 0 && self.run.pause_every > 0 && i % self.run.pause_every == 0 {
                log::debug!("Processed {i} threads, pausing {}ms", self.run.pause_ms);
                std::thread::sleep(Duration::from_millis(self.run.pause_ms));
            }
            outcomes.push(self.process(thread));
        }

        log::info!(
            "Triage run complete: {} threads, {} labeled, {} archived, {} errors",
            self.statistics.total_threads,
            self.statistics.labeled,
            self.statistics.archived,
            self.statistics.errors
        );
        outcomes
    }

    fn process(&mut self, thread: &ThreadInput) -> ThreadOutcome {
        let email = EmailSignal::new(&thread.from, &thread.subject, &thread.snippet);
        let decision = self.classifier.classify_with(&email, self.provider);
        self.statistics
            .record_event(StatEvent::Classified(decision.clone()));

        let (plan, error) = match self.applier.apply(&thread.id, &decision, &email.sender) {
            Ok(plan) => {
                if plan.archive {
                    self.statistics.record_event(StatEvent::Archived);
                }
                (Some(plan), None)
            }
            Err(e) => {
                log::warn!("Thread {}: {e:#}", thread.id);
                self.statistics.record_event(StatEvent::ApplyFailed);
                (None, Some(format!("{e:#}")))
            }
        };

        ThreadOutcome {
            id: thread.id.clone(),
            sender: email.sender,
            decision,
            plan,
            error,
        }
    }

    pub fn statistics(&self) -> &RunStatistics {
        &self.statistics
    }

    pub fn applier(&self) -> &ActionApplier<M> {
        &self.applier
    }
}
