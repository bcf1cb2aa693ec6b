//! Evaluation harness.
//!
//! Stratified, seeded train/test split; fit on the train partition only;
//! score on the held-out partition. Offline only, never on the inference path.

use crate::artifact::TrainedModel;
use crate::corpus::LabeledExample;
use crate::error::Result;
use crate::forest::ForestParams;
use crate::tier::Tier;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default share of each tier used for training
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;

/// Train/test partition of a corpus
#[derive(Debug, Clone)]
pub struct Split {
    pub train: Vec<LabeledExample>,
    pub test: Vec<LabeledExample>,
}

/// Per-tier shuffle, first `floor(fraction × count)` go to train.
/// A tier with at least two examples keeps one on each side.
/// Both partitions preserve corpus order.
pub fn stratified_split(corpus: &[LabeledExample], train_fraction: f64, seed: u64) -> Split {
    let fraction = train_fraction.clamp(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut in_train = vec![false; corpus.len()];

    for tier in Tier::ALL {
        let mut indices: Vec<usize> = corpus
            .iter()
            .enumerate()
            .filter(|(_, e)| e.tier == tier)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);

        let count = indices.len();
        let mut n_train = (fraction * count as f64).floor() as usize;
        if count >= 2 {
            n_train = n_train.clamp(1, count - 1);
        }
        for &i in &indices[..n_train] {
            in_train[i] = true;
        }
    }

    let (train, test): (Vec<_>, Vec<_>) = corpus
        .iter()
        .cloned()
        .zip(in_train)
        .partition(|(_, train)| *train);

    Split {
        train: train.into_iter().map(|(e, _)| e).collect(),
        test: test.into_iter().map(|(e, _)| e).collect(),
    }
}

/// Row = true tier, column = predicted tier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    counts: [[usize; Tier::COUNT]; Tier::COUNT],
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[Tier], y_pred: &[Tier]) -> Self {
        let mut cm = Self::default();
        for (t, p) in y_true.iter().zip(y_pred) {
            cm.counts[t.index()][p.index()] += 1;
        }
        cm
    }

    pub fn get(&self, truth: Tier, predicted: Tier) -> usize {
        self.counts[truth.index()][predicted.index()]
    }

    pub fn rows(&self) -> &[[usize; Tier::COUNT]; Tier::COUNT] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn true_positives(&self, tier: Tier) -> usize {
        self.get(tier, tier)
    }

    /// Predicted as `tier` but wasn't
    pub fn false_positives(&self, tier: Tier) -> usize {
        Tier::ALL
            .iter()
            .filter(|&&t| t != tier)
            .map(|&t| self.get(t, tier))
            .sum()
    }

    /// Was `tier` but predicted otherwise
    pub fn false_negatives(&self, tier: Tier) -> usize {
        Tier::ALL
            .iter()
            .filter(|&&p| p != tier)
            .map(|&p| self.get(tier, p))
            .sum()
    }

    pub fn support(&self, tier: Tier) -> usize {
        self.counts[tier.index()].iter().sum()
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let correct: usize = Tier::ALL.iter().map(|&t| self.true_positives(t)).sum();
        correct as f64 / total as f64
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Precision/recall/F1 for one tier; undefined ratios are 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub tier: Tier,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    pub fn from_confusion(cm: &ConfusionMatrix, tier: Tier) -> Self {
        let tp = cm.true_positives(tier);
        let precision = ratio(tp, tp + cm.false_positives(tier));
        let recall = ratio(tp, tp + cm.false_negatives(tier));
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            tier,
            precision,
            recall,
            f1,
            support: cm.support(tier),
        }
    }
}

/// Scores on the held-out partition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub accuracy: f64,
    pub per_class: Vec<ClassMetrics>,
    pub confusion: ConfusionMatrix,
    pub train_size: usize,
    pub test_size: usize,
}

impl EvaluationReport {
    pub fn from_predictions(y_true: &[Tier], y_pred: &[Tier], train_size: usize) -> Self {
        let confusion = ConfusionMatrix::from_predictions(y_true, y_pred);
        let per_class = Tier::ALL
            .iter()
            .map(|&t| ClassMetrics::from_confusion(&confusion, t))
            .collect();
        Self {
            accuracy: confusion.accuracy(),
            per_class,
            test_size: confusion.total(),
            confusion,
            train_size,
        }
    }

    pub fn metrics(&self, tier: Tier) -> Option<&ClassMetrics> {
        self.per_class.iter().find(|m| m.tier == tier)
    }

    fn macro_avg(&self, pick: fn(&ClassMetrics) -> f64) -> f64 {
        if self.per_class.is_empty() {
            return 0.0;
        }
        self.per_class.iter().map(pick).sum::<f64>() / self.per_class.len() as f64
    }

    fn weighted_avg(&self, pick: fn(&ClassMetrics) -> f64) -> f64 {
        let total: usize = self.per_class.iter().map(|m| m.support).sum();
        if total == 0 {
            return 0.0;
        }
        self.per_class
            .iter()
            .map(|m| pick(m) * m.support as f64)
            .sum::<f64>()
            / total as f64
    }

    /// Fixed-width text report with confusion matrix
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:>12} {:>10} {:>10} {:>10} {:>10}\n",
            "", "precision", "recall", "f1-score", "support"
        ));
        out.push_str(&"-".repeat(56));
        out.push('\n');

        for m in &self.per_class {
            out.push_str(&format!(
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}\n",
                m.tier.as_str(),
                m.precision,
                m.recall,
                m.f1,
                m.support
            ));
        }

        out.push_str(&"-".repeat(56));
        out.push('\n');
        out.push_str(&format!(
            "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}\n",
            "macro avg",
            self.macro_avg(|m| m.precision),
            self.macro_avg(|m| m.recall),
            self.macro_avg(|m| m.f1),
            self.test_size
        ));
        out.push_str(&format!(
            "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}\n",
            "weighted avg",
            self.weighted_avg(|m| m.precision),
            self.weighted_avg(|m| m.recall),
            self.weighted_avg(|m| m.f1),
            self.test_size
        ));

        out.push_str(&format!(
            "\nAccuracy: {:.2}% ({} train / {} test)\n",
            self.accuracy * 100.0,
            self.train_size,
            self.test_size
        ));

        out.push_str("\nConfusion matrix (row = true, col = predicted):\n");
        out.push_str(&format!("{:>6}", ""));
        for tier in Tier::ALL {
            out.push_str(&format!("{:>7}", tier.as_str()));
        }
        out.push('\n');
        for tier in Tier::ALL {
            out.push_str(&format!("{:>6}", tier.as_str()));
            for count in &self.confusion.rows()[tier.index()] {
                out.push_str(&format!("{:>7}", count));
            }
            out.push('\n');
        }
        out
    }
}

/// Model trained on the train partition plus its held-out scores
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub model: TrainedModel,
    pub report: EvaluationReport,
}

/// Split, fit on train, score on test
pub fn evaluate_with_model(
    corpus: &[LabeledExample],
    train_fraction: f64,
    max_features: usize,
    params: &ForestParams,
) -> Result<Evaluation> {
    let split = stratified_split(corpus, train_fraction, params.seed);
    info!(
        "Evaluation split: {} train / {} test (fraction {:.2}, seed {})",
        split.train.len(),
        split.test.len(),
        train_fraction,
        params.seed
    );

    let model = TrainedModel::fit(&split.train, max_features, params)?;

    let y_true: Vec<Tier> = split.test.iter().map(|e| e.tier).collect();
    let y_pred = split
        .test
        .iter()
        .map(|e| model.classify(&e.description))
        .collect::<Result<Vec<Tier>>>()?;

    let report = EvaluationReport::from_predictions(&y_true, &y_pred, split.train.len());
    info!("Held-out accuracy: {:.4}", report.accuracy);
    Ok(Evaluation { model, report })
}

/// Scores only; the trained model is dropped
pub fn evaluate(
    corpus: &[LabeledExample],
    train_fraction: f64,
    seed: u64,
    max_features: usize,
    tree_count: usize,
) -> Result<EvaluationReport> {
    let params = ForestParams::new(tree_count, seed);
    evaluate_with_model(corpus, train_fraction, max_features, &params).map(|e| e.report)
}
