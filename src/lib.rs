pub mod classifier;
pub mod components;
pub mod config;
pub mod domain_utils;
pub mod history;
pub mod mailbox;
pub mod normalization;
pub mod runner;
pub mod statistics;

pub use classifier::TriageClassifier;
pub use components::{ClassificationDecision, TriageAction};
pub use config::TriageConfig;
pub use history::{HistoricalStatistics, StatisticsProvider};
pub use normalization::EmailSignal;
pub use statistics::{RunStatistics, StatEvent};
