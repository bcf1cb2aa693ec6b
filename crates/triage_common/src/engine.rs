//! Triage facade.
//!
//! The three calls a host needs: `classify`, `priority`, `resolve_action`.
//! The model pair is loaded on the first `classify` and shared read-only for
//! the rest of the process. A failed load is not cached, so artifacts that
//! appear later are picked up.
//!
//! Also hosts the offline training pipeline.

use crate::actions::{self, FixAction};
use crate::artifact::TrainedModel;
use crate::config::{ArtifactSettings, TrainingSettings};
use crate::corpus;
use crate::error::{Result, TriageError};
use crate::evaluation::{self, EvaluationReport};
use crate::priority::{self, Priority};
use crate::tier::{Tier, TierVerdict};
use once_cell::sync::OnceCell;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Fixed phrases checked after every training run
pub const SANITY_PHRASES: [(&str, Tier); 3] = [
    ("My printer is out of paper", Tier::L1),
    ("Excel freezes when I open macros", Tier::L2),
    ("The main SQL database is down", Tier::L3),
];

/// Inference surface with a lazily loaded, shared model
pub struct TriageEngine {
    artifacts: ArtifactSettings,
    model: OnceCell<Arc<TrainedModel>>,
}

impl TriageEngine {
    pub fn new(artifacts: ArtifactSettings) -> Self {
        Self {
            artifacts,
            model: OnceCell::new(),
        }
    }

    /// Engine over an already trained model; never touches disk
    pub fn with_model(artifacts: ArtifactSettings, model: TrainedModel) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(Arc::new(model));
        Self {
            artifacts,
            model: cell,
        }
    }

    pub fn artifacts(&self) -> &ArtifactSettings {
        &self.artifacts
    }

    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// Shared model, loading it on first use
    pub fn model(&self) -> Result<Arc<TrainedModel>> {
        self.model
            .get_or_try_init(|| {
                TrainedModel::load(&self.artifacts.model_path, &self.artifacts.vocab_path)
                    .map(Arc::new)
            })
            .map(Arc::clone)
    }

    /// Classification with the full error taxonomy
    pub fn try_classify(&self, description: &str) -> Result<Tier> {
        self.model()?.classify(description)
    }

    /// Tier for a description, or `Unavailable`. Never fails.
    pub fn classify(&self, description: &str) -> TierVerdict {
        match self.try_classify(description) {
            Ok(tier) => TierVerdict::Classified(tier),
            Err(e @ TriageError::ModelUnavailable { .. }) => {
                warn!("Classification unavailable: {}", e);
                TierVerdict::Unavailable
            }
            Err(e) => {
                error!("{}", failure_message(&e, &self.artifacts));
                TierVerdict::Unavailable
            }
        }
    }

    pub fn priority(&self, urgency: u8, impact: u8) -> Priority {
        priority::priority(urgency, impact)
    }

    pub fn resolve_action(&self, issue: &str) -> Option<FixAction> {
        actions::resolve_action(issue)
    }
}

/// Log line for a classification that failed with a model present
fn failure_message(err: &TriageError, artifacts: &ArtifactSettings) -> String {
    match err {
        TriageError::InputMismatch { .. } => format!(
            "Artifact pairing broken ({} / {}): {}",
            artifacts.model_path.display(),
            artifacts.vocab_path.display(),
            err
        ),
        _ => format!("Classification failed: {}", err),
    }
}

/// One sanity-check prediction
#[derive(Debug, Clone, PartialEq)]
pub struct SanityResult {
    pub phrase: &'static str,
    pub expected: Tier,
    pub predicted: Tier,
}

impl SanityResult {
    pub fn passed(&self) -> bool {
        self.expected == self.predicted
    }
}

/// Outcome of a training run
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    pub report: EvaluationReport,
    pub sanity: Vec<SanityResult>,
    pub model_path: PathBuf,
    pub vocab_path: PathBuf,
    pub model: TrainedModel,
}

impl TrainingSummary {
    pub fn sanity_passed(&self) -> bool {
        self.sanity.iter().all(SanityResult::passed)
    }
}

/// Run the fixed sanity phrases through a model
pub fn sanity_check(model: &TrainedModel) -> Result<Vec<SanityResult>> {
    SANITY_PHRASES
        .iter()
        .map(|&(phrase, expected)| {
            Ok(SanityResult {
                phrase,
                expected,
                predicted: model.classify(phrase)?,
            })
        })
        .collect()
}

/// Synthesize, fit, evaluate, sanity-check, save
pub fn train_pipeline(
    settings: &TrainingSettings,
    artifacts: &ArtifactSettings,
) -> Result<TrainingSummary> {
    info!("Generating synthetic dataset ({} records)", settings.samples);
    let examples = corpus::generate(settings.samples, settings.seed);

    let params = settings.forest_params();
    let evaluation = evaluation::evaluate_with_model(
        &examples,
        settings.effective_train_fraction(),
        settings.effective_max_features(),
        &params,
    )?;

    let sanity = sanity_check(&evaluation.model)?;
    for result in &sanity {
        if result.passed() {
            info!("Sanity: '{}' -> {}", result.phrase, result.predicted);
        } else {
            warn!(
                "Sanity: '{}' -> {} (expected {})",
                result.phrase, result.predicted, result.expected
            );
        }
    }

    evaluation
        .model
        .save(&artifacts.model_path, &artifacts.vocab_path)?;

    Ok(TrainingSummary {
        report: evaluation.report,
        sanity,
        model_path: artifacts.model_path.clone(),
        vocab_path: artifacts.vocab_path.clone(),
        model: evaluation.model,
    })
}
