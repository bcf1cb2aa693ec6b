//! Persisted model/vocabulary pair.
//!
//! Two JSON files, written and read as a unit. Both carry the vocabulary
//! fingerprint; a model is only ever loaded next to the vocabulary it was
//! trained on.

use crate::corpus::{self, LabeledExample};
use crate::error::{Result, TriageError, UnavailableReason};
use crate::forest::{ForestParams, RandomForest};
use crate::tier::Tier;
use crate::vectorizer::{FeatureVector, TfidfVectorizer, Vocabulary};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Current artifact format version
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Default model artifact file name
pub const MODEL_FILE: &str = "ticket_classifier.json";

/// Default vocabulary artifact file name
pub const VOCAB_FILE: &str = "vectorizer.json";

#[derive(Debug, Serialize, Deserialize)]
struct ModelArtifact {
    format_version: u32,
    created_at: DateTime<Utc>,
    vocab_fingerprint: String,
    forest: RandomForest,
}

#[derive(Debug, Serialize, Deserialize)]
struct VocabArtifact {
    format_version: u32,
    fingerprint: String,
    vocabulary: Vocabulary,
}

/// Classifier and the vocabulary its feature space was built from
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub forest: RandomForest,
    pub vocabulary: Vocabulary,
}

impl TrainedModel {
    /// Pair a forest with its vocabulary; widths must agree
    pub fn new(forest: RandomForest, vocabulary: Vocabulary) -> Result<Self> {
        if forest.n_features() != vocabulary.len() {
            return Err(TriageError::InputMismatch {
                expected: forest.n_features(),
                actual: vocabulary.len(),
            });
        }
        Ok(Self { forest, vocabulary })
    }

    /// Fit a vocabulary on the examples, then train the forest on their vectors
    pub fn fit(examples: &[LabeledExample], max_features: usize, params: &ForestParams) -> Result<Self> {
        let (descriptions, labels) = corpus::unzip(examples);
        let vocabulary = TfidfVectorizer::new(max_features).fit(&descriptions);
        let features = vocabulary.transform_all(&descriptions);
        let forest = RandomForest::train(&features, &labels, params)?;
        Self::new(forest, vocabulary)
    }

    pub fn vectorize(&self, text: &str) -> FeatureVector {
        self.vocabulary.transform(text)
    }

    /// Vectorize and predict one description
    pub fn classify(&self, text: &str) -> Result<Tier> {
        self.forest.predict(&self.vectorize(text))
    }

    pub fn save(&self, model_path: &Path, vocab_path: &Path) -> Result<()> {
        save(&self.forest, &self.vocabulary, model_path, vocab_path)
    }

    pub fn load(model_path: &Path, vocab_path: &Path) -> Result<Self> {
        let (forest, vocabulary) = load(model_path, vocab_path)?;
        Ok(Self { forest, vocabulary })
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string(value)?;
    fs::write(path, json)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(TriageError::unavailable(
            path,
            UnavailableReason::Missing,
            "artifact not found; run `triagectl train` first",
        ));
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| TriageError::unavailable(path, UnavailableReason::Corrupt, e.to_string()))?;
    serde_json::from_str(&contents)
        .map_err(|e| TriageError::unavailable(path, UnavailableReason::Corrupt, e.to_string()))
}

/// Write the model and vocabulary artifacts
pub fn save(
    forest: &RandomForest,
    vocabulary: &Vocabulary,
    model_path: &Path,
    vocab_path: &Path,
) -> Result<()> {
    if forest.n_features() != vocabulary.len() {
        return Err(TriageError::InputMismatch {
            expected: forest.n_features(),
            actual: vocabulary.len(),
        });
    }
    let fingerprint = vocabulary.fingerprint();

    write_json(
        vocab_path,
        &VocabArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            fingerprint: fingerprint.clone(),
            vocabulary: vocabulary.clone(),
        },
    )?;
    write_json(
        model_path,
        &ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            created_at: Utc::now(),
            vocab_fingerprint: fingerprint,
            forest: forest.clone(),
        },
    )?;

    info!(
        "Saved model to {} and vocabulary to {}",
        model_path.display(),
        vocab_path.display()
    );
    Ok(())
}

/// Read both artifacts and verify they belong together
pub fn load(model_path: &Path, vocab_path: &Path) -> Result<(RandomForest, Vocabulary)> {
    let vocab: VocabArtifact = read_json(vocab_path)?;
    let model: ModelArtifact = read_json(model_path)?;

    for (path, version) in [
        (vocab_path, vocab.format_version),
        (model_path, model.format_version),
    ] {
        if version != ARTIFACT_FORMAT_VERSION {
            return Err(TriageError::unavailable(
                path,
                UnavailableReason::Corrupt,
                format!(
                    "unsupported format version {} (expected {})",
                    version, ARTIFACT_FORMAT_VERSION
                ),
            ));
        }
    }

    let actual = vocab.vocabulary.fingerprint();
    if actual != vocab.fingerprint {
        return Err(TriageError::unavailable(
            vocab_path,
            UnavailableReason::Corrupt,
            "vocabulary contents do not match stored fingerprint",
        ));
    }
    if model.vocab_fingerprint != actual {
        return Err(TriageError::unavailable(
            model_path,
            UnavailableReason::Unpaired,
            "model was trained against a different vocabulary",
        ));
    }
    if model.forest.n_features() != vocab.vocabulary.len() || !model.forest.is_well_formed() {
        return Err(TriageError::unavailable(
            model_path,
            UnavailableReason::Corrupt,
            "tree structure does not fit the vocabulary",
        ));
    }

    info!(
        "Loaded model ({} trees, created {}) from {}",
        model.forest.trees().len(),
        model.created_at.to_rfc3339(),
        model_path.display()
    );
    Ok((model.forest, vocab.vocabulary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_model(corpus: &[&str]) -> TrainedModel {
        let vocab = TfidfVectorizer::default().fit(corpus);
        let xs = vocab.transform_all(corpus);
        let ys: Vec<Tier> = (0..corpus.len())
            .map(|i| Tier::from_index(i % 3).unwrap())
            .collect();
        let forest = RandomForest::train(&xs, &ys, &ForestParams::new(5, 9)).unwrap();
        TrainedModel::new(forest, vocab).unwrap()
    }

    fn corpus_a() -> Vec<&'static str> {
        vec!["mouse broken", "excel crashing", "server 500 error"]
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join("nested").join(MODEL_FILE);
        let vocab_path = dir.path().join(VOCAB_FILE);

        let model = small_model(&corpus_a());
        model.save(&model_path, &vocab_path).unwrap();
        let loaded = TrainedModel::load(&model_path, &vocab_path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let err = load(&dir.path().join("m.json"), &dir.path().join("v.json")).unwrap_err();
        assert_eq!(err.unavailable_reason(), Some(UnavailableReason::Missing));
    }

    #[test]
    fn test_corrupt_artifact() {
        let dir = TempDir::new().unwrap();
        let model_path = dir.path().join(MODEL_FILE);
        let vocab_path = dir.path().join(VOCAB_FILE);
        small_model(&corpus_a()).save(&model_path, &vocab_path).unwrap();

        fs::write(&model_path, "{ not json").unwrap();
        let err = load(&model_path, &vocab_path).unwrap_err();
        assert_eq!(err.unavailable_reason(), Some(UnavailableReason::Corrupt));
    }

    #[test]
    fn test_unpaired_artifacts() {
        let dir = TempDir::new().unwrap();
        let model_a = dir.path().join("a_model.json");
        let vocab_a = dir.path().join("a_vocab.json");
        let model_b = dir.path().join("b_model.json");
        let vocab_b = dir.path().join("b_vocab.json");

        small_model(&corpus_a()).save(&model_a, &vocab_a).unwrap();
        small_model(&["printer jam", "vpn drop", "dns failure"])
            .save(&model_b, &vocab_b)
            .unwrap();

        let err = load(&model_a, &vocab_b).unwrap_err();
        assert_eq!(err.unavailable_reason(), Some(UnavailableReason::Unpaired));
    }

    #[test]
    fn test_pairing_rejects_width_mismatch() {
        let model = small_model(&corpus_a());
        let other = TfidfVectorizer::default().fit(&["just one"]);
        assert!(matches!(
            TrainedModel::new(model.forest, other),
            Err(TriageError::InputMismatch { .. })
        ));
    }
}
