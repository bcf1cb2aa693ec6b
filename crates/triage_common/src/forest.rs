//! Bagged ensemble of CART decision trees.
//!
//! Each tree is grown on a bootstrap sample with its own RNG derived from
//! `(seed, tree index)`, so the same corpus, seed and params always give the
//! same trees. Splits minimise weighted Gini impurity over a random subset of
//! features; `value <= threshold` goes left. Prediction is a majority vote
//! with ties going to the lowest tier.

use crate::error::{Result, TriageError};
use crate::tier::Tier;
use crate::vectorizer::FeatureVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Default number of trees
pub const DEFAULT_TREE_COUNT: usize = 100;

/// Default training seed
pub const DEFAULT_SEED: u64 = 42;

/// Hyperparameters, persisted with the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub tree_count: usize,
    pub seed: u64,
    /// None grows every tree until its leaves are pure
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    /// Features examined per split; None means ceil(sqrt(n_features))
    #[serde(default)]
    pub max_features_per_split: Option<usize>,
}

fn default_min_samples_split() -> usize {
    2
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            tree_count: DEFAULT_TREE_COUNT,
            seed: DEFAULT_SEED,
            max_depth: None,
            min_samples_split: default_min_samples_split(),
            max_features_per_split: None,
        }
    }
}

impl ForestParams {
    pub fn new(tree_count: usize, seed: u64) -> Self {
        Self {
            tree_count,
            seed,
            ..Self::default()
        }
    }

    fn features_per_split(&self, n_features: usize) -> usize {
        match self.max_features_per_split {
            Some(m) => m.clamp(1, n_features.max(1)),
            None => ((n_features as f64).sqrt().ceil() as usize).max(1),
        }
    }

    /// RNG seed for one tree
    fn tree_seed(&self, tree_index: usize) -> u64 {
        self.seed
            .wrapping_add((tree_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

/// Tree node; children are indices into the owning tree's node list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Leaf {
        tier: Tier,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Single decision tree, root at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn predict(&self, x: &[f64]) -> Tier {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { tier } => return *tier,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], at: usize) -> usize {
            match &nodes[at] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }

    /// Structural check for trees read from disk
    fn is_well_formed(&self, n_features: usize) -> bool {
        !self.nodes.is_empty()
            && self.nodes.iter().enumerate().all(|(i, node)| match node {
                Node::Leaf { .. } => true,
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    *feature < n_features
                        && *left > i
                        && *right > i
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            })
    }
}

/// Trained ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    params: ForestParams,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Train on parallel feature/label slices
    pub fn train(features: &[FeatureVector], labels: &[Tier], params: &ForestParams) -> Result<Self> {
        if features.is_empty() {
            return Err(TriageError::InvalidTraining("no training examples".into()));
        }
        if features.len() != labels.len() {
            return Err(TriageError::InvalidTraining(format!(
                "{} feature vectors but {} labels",
                features.len(),
                labels.len()
            )));
        }
        if params.tree_count == 0 {
            return Err(TriageError::InvalidTraining("tree_count must be positive".into()));
        }
        let n_features = features[0].len();
        if let Some(bad) = features.iter().find(|v| v.len() != n_features) {
            return Err(TriageError::InvalidTraining(format!(
                "ragged feature matrix: expected {} components, found {}",
                n_features,
                bad.len()
            )));
        }

        info!(
            "Training forest: {} trees, {} examples, {} features, seed {}",
            params.tree_count,
            features.len(),
            n_features,
            params.seed
        );

        let trees: Vec<DecisionTree> = (0..params.tree_count)
            .map(|t| {
                let tree = TreeBuilder::new(features, labels, params, t).build();
                debug!(
                    "Tree {}: {} nodes, depth {}",
                    t,
                    tree.node_count(),
                    tree.depth()
                );
                tree
            })
            .collect();

        Ok(Self {
            n_features,
            params: params.clone(),
            trees,
        })
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn check_input(&self, x: &[f64]) -> Result<()> {
        if x.len() != self.n_features {
            return Err(TriageError::InputMismatch {
                expected: self.n_features,
                actual: x.len(),
            });
        }
        Ok(())
    }

    /// Per-tier vote counts, indexed by `Tier::index`
    pub fn votes(&self, x: &[f64]) -> Result<[usize; Tier::COUNT]> {
        self.check_input(x)?;
        let mut counts = [0; Tier::COUNT];
        for tree in &self.trees {
            counts[tree.predict(x).index()] += 1;
        }
        Ok(counts)
    }

    pub fn predict(&self, x: &[f64]) -> Result<Tier> {
        self.votes(x).map(|counts| Tier::majority(&counts))
    }

    pub fn predict_batch(&self, xs: &[FeatureVector]) -> Result<Vec<Tier>> {
        xs.iter().map(|x| self.predict(x)).collect()
    }

    /// True when every tree is structurally valid for this input width
    pub fn is_well_formed(&self) -> bool {
        !self.trees.is_empty() && self.trees.iter().all(|t| t.is_well_formed(self.n_features))
    }
}

/// Grows one tree
struct TreeBuilder<'a> {
    features: &'a [FeatureVector],
    labels: &'a [Tier],
    max_depth: Option<usize>,
    min_samples_split: usize,
    features_per_split: usize,
    rng: StdRng,
    /// Running permutation of feature indices for subset sampling
    feature_order: Vec<usize>,
    nodes: Vec<Node>,
}

/// Candidate split: weighted child impurity, feature, threshold
struct SplitCandidate {
    impurity: f64,
    feature: usize,
    threshold: f64,
}

fn class_counts(labels: &[Tier], samples: &[usize]) -> [usize; Tier::COUNT] {
    let mut counts = [0; Tier::COUNT];
    for &s in samples {
        counts[labels[s].index()] += 1;
    }
    counts
}

fn gini(counts: &[usize; Tier::COUNT], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / n;
            p * p
        })
        .sum::<f64>()
}

impl<'a> TreeBuilder<'a> {
    fn new(
        features: &'a [FeatureVector],
        labels: &'a [Tier],
        params: &ForestParams,
        tree_index: usize,
    ) -> Self {
        let n_features = features[0].len();
        Self {
            features,
            labels,
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split.max(2),
            features_per_split: params.features_per_split(n_features),
            rng: StdRng::seed_from_u64(params.tree_seed(tree_index)),
            feature_order: (0..n_features).collect(),
            nodes: Vec::new(),
        }
    }

    fn build(mut self) -> DecisionTree {
        let n = self.features.len();
        let mut samples: Vec<usize> = (0..n).map(|_| self.rng.gen_range(0..n)).collect();
        self.grow(&mut samples, 0);
        DecisionTree { nodes: self.nodes }
    }

    fn push_leaf(&mut self, tier: Tier) -> usize {
        self.nodes.push(Node::Leaf { tier });
        self.nodes.len() - 1
    }

    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let counts = class_counts(self.labels, samples);
        let majority = Tier::majority(&counts);
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let depth_reached = self.max_depth.map_or(false, |d| depth >= d);

        if pure || depth_reached || samples.len() < self.min_samples_split {
            return self.push_leaf(majority);
        }

        let Some(split) = self.best_split(samples) else {
            return self.push_leaf(majority);
        };

        let mut mid = 0;
        for i in 0..samples.len() {
            if self.features[samples[i]][split.feature] <= split.threshold {
                samples.swap(i, mid);
                mid += 1;
            }
        }
        if mid == 0 || mid == samples.len() {
            return self.push_leaf(majority);
        }

        // Reserve this node's slot; children always get higher indices
        let at = self.push_leaf(majority);
        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.grow(left_samples, depth + 1);
        let right = self.grow(right_samples, depth + 1);
        self.nodes[at] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        at
    }

    fn is_constant(&self, samples: &[usize], feature: usize) -> bool {
        let first = self.features[samples[0]][feature];
        samples
            .iter()
            .all(|&s| self.features[s][feature] == first)
    }

    /// Sample features without replacement until `features_per_split`
    /// non-constant ones have been scored, or all features are exhausted
    fn best_split(&mut self, samples: &[usize]) -> Option<SplitCandidate> {
        let n_features = self.feature_order.len();
        let mut scored = 0;
        let mut best: Option<SplitCandidate> = None;

        for i in 0..n_features {
            let j = self.rng.gen_range(i..n_features);
            self.feature_order.swap(i, j);
            let feature = self.feature_order[i];

            if self.is_constant(samples, feature) {
                continue;
            }
            if let Some(candidate) = self.best_threshold(samples, feature) {
                if best
                    .as_ref()
                    .map_or(true, |b| candidate.impurity < b.impurity)
                {
                    best = Some(candidate);
                }
            }
            scored += 1;
            if scored >= self.features_per_split {
                break;
            }
        }
        best
    }

    fn best_threshold(&self, samples: &[usize], feature: usize) -> Option<SplitCandidate> {
        let mut pairs: Vec<(f64, usize)> = samples
            .iter()
            .map(|&s| (self.features[s][feature], self.labels[s].index()))
            .collect();
        pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        let total = pairs.len();
        let mut right = [0usize; Tier::COUNT];
        for &(_, label) in &pairs {
            right[label] += 1;
        }
        let mut left = [0usize; Tier::COUNT];
        let mut best: Option<SplitCandidate> = None;

        for k in 0..total - 1 {
            let (value, label) = pairs[k];
            left[label] += 1;
            right[label] -= 1;

            let next = pairs[k + 1].0;
            if value == next {
                continue;
            }
            let n_left = k + 1;
            let n_right = total - n_left;
            let impurity = (n_left as f64 * gini(&left, n_left)
                + n_right as f64 * gini(&right, n_right))
                / total as f64;

            if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                let mut threshold = value + (next - value) / 2.0;
                if threshold >= next {
                    threshold = value;
                }
                best = Some(SplitCandidate {
                    impurity,
                    feature,
                    threshold,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three well-separated clusters on two features
    fn toy_data() -> (Vec<FeatureVector>, Vec<Tier>) {
        let mut xs = Vec::new();
        let mut ys = Vec::new();
        for i in 0..20 {
            let jitter = i as f64 * 0.01;
            xs.push(vec![0.1 + jitter, 0.0, 0.0]);
            ys.push(Tier::L1);
            xs.push(vec![0.0, 0.5 + jitter, 0.0]);
            ys.push(Tier::L2);
            xs.push(vec![0.0, 0.0, 0.9 + jitter]);
            ys.push(Tier::L3);
        }
        (xs, ys)
    }

    #[test]
    fn test_fits_separable_data() {
        let (xs, ys) = toy_data();
        let forest = RandomForest::train(&xs, &ys, &ForestParams::new(15, 7)).unwrap();
        let predicted = forest.predict_batch(&xs).unwrap();
        assert_eq!(predicted, ys);
        assert!(forest.is_well_formed());
    }

    #[test]
    fn test_same_seed_same_trees() {
        let (xs, ys) = toy_data();
        let a = RandomForest::train(&xs, &ys, &ForestParams::new(10, 3)).unwrap();
        let b = RandomForest::train(&xs, &ys, &ForestParams::new(10, 3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let (xs, ys) = toy_data();
        let forest = RandomForest::train(&xs, &ys, &ForestParams::new(5, 1)).unwrap();
        match forest.predict(&[0.1, 0.2]) {
            Err(TriageError::InputMismatch { expected, actual }) => {
                assert_eq!(expected, 3);
                assert_eq!(actual, 2);
            }
            other => panic!("expected InputMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_vector_predicts_without_error() {
        let (xs, ys) = toy_data();
        let forest = RandomForest::train(&xs, &ys, &ForestParams::new(5, 1)).unwrap();
        assert!(forest.predict(&[0.0, 0.0, 0.0]).is_ok());
    }

    #[test]
    fn test_votes_sum_to_tree_count() {
        let (xs, ys) = toy_data();
        let forest = RandomForest::train(&xs, &ys, &ForestParams::new(9, 2)).unwrap();
        let votes = forest.votes(&xs[0]).unwrap();
        assert_eq!(votes.iter().sum::<usize>(), 9);
    }

    #[test]
    fn test_max_depth_zero_gives_stumps_of_leaves() {
        let (xs, ys) = toy_data();
        let params = ForestParams {
            max_depth: Some(0),
            ..ForestParams::new(4, 5)
        };
        let forest = RandomForest::train(&xs, &ys, &params).unwrap();
        assert!(forest.trees().iter().all(|t| t.node_count() == 1));
    }

    #[test]
    fn test_rejects_bad_training_input() {
        let (xs, ys) = toy_data();
        assert!(matches!(
            RandomForest::train(&[], &[], &ForestParams::default()),
            Err(TriageError::InvalidTraining(_))
        ));
        assert!(matches!(
            RandomForest::train(&xs, &ys[..3], &ForestParams::default()),
            Err(TriageError::InvalidTraining(_))
        ));
        assert!(matches!(
            RandomForest::train(&xs, &ys, &ForestParams::new(0, 1)),
            Err(TriageError::InvalidTraining(_))
        ));
        let ragged = vec![vec![0.0, 1.0], vec![1.0]];
        assert!(matches!(
            RandomForest::train(&ragged, &[Tier::L1, Tier::L2], &ForestParams::new(1, 1)),
            Err(TriageError::InvalidTraining(_))
        ));
    }

    #[test]
    fn test_single_class_corpus() {
        let xs = vec![vec![0.1], vec![0.2], vec![0.3]];
        let ys = vec![Tier::L2; 3];
        let forest = RandomForest::train(&xs, &ys, &ForestParams::new(3, 1)).unwrap();
        assert_eq!(forest.predict(&[5.0]).unwrap(), Tier::L2);
    }

    #[test]
    fn test_features_per_split_default() {
        let params = ForestParams::default();
        assert_eq!(params.features_per_split(1000), 32);
        assert_eq!(params.features_per_split(0), 1);
        let fixed = ForestParams {
            max_features_per_split: Some(500),
            ..ForestParams::default()
        };
        assert_eq!(fixed.features_per_split(10), 10);
    }
}
