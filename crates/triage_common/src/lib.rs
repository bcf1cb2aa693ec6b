//! Ticket triage core.
//!
//! Classifies a free-text problem description into a support tier, computes
//! a priority from the urgency/impact matrix and picks an automated
//! remediation for known issues.
//!
//! Training: corpus → vectorizer (fit) → forest (train) → artifacts.
//! Inference: description → vectorizer (transform) → forest (predict) → tier.

pub mod actions;
pub mod artifact;
pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod forest;
pub mod priority;
pub mod ticket;
pub mod tier;
pub mod vectorizer;

pub use actions::{resolve_action, FixAction};
pub use artifact::TrainedModel;
pub use config::TriageConfig;
pub use engine::{train_pipeline, TrainingSummary, TriageEngine};
pub use error::{TriageError, UnavailableReason};
pub use evaluation::{evaluate, EvaluationReport};
pub use forest::{ForestParams, RandomForest};
pub use priority::{priority, Priority};
pub use ticket::{FixRunner, SystemInfoSource, TicketDraft, TriageTicket};
pub use tier::{Tier, TierVerdict};
pub use vectorizer::{FeatureVector, TfidfVectorizer, Vocabulary};
