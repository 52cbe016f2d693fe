use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::error::{ForensicsError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub seed: u64,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            seed: 42,
            max_depth: None,
            min_samples_split: 2,
        }
    }
}

impl ForestConfig {
    pub fn with_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(ForensicsError::InvalidParameter(
                "a forest needs at least one tree".into(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(ForensicsError::InvalidParameter(
                "min_samples_split must be at least 2".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        p_real: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// CART tree stored as a flat node list; node 0 is the root and every child
/// index is greater than its parent's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn predict(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                Node::Leaf { p_real } => return *p_real,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    index = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(ForensicsError::ArtifactCorrupt("empty decision tree".into()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let valid = match node {
                Node::Leaf { p_real } => (0.0..=1.0).contains(p_real),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    *feature < n_features
                        && threshold.is_finite()
                        && *left > index
                        && *right > index
                        && *left < self.nodes.len()
                        && *right < self.nodes.len()
                }
            };

            if !valid {
                return Err(ForensicsError::ArtifactCorrupt(format!(
                    "invalid tree node {}: {:?}",
                    index, node
                )));
            }
        }

        Ok(())
    }
}

/// Bagged ensemble of Gini trees with `sqrt(d)` candidate features per split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn fit(rows: &[Vec<f64>], labels: &[u8], config: &ForestConfig) -> Result<Self> {
        config.validate()?;
        if rows.is_empty() || rows.len() != labels.len() {
            return Err(ForensicsError::InvalidParameter(format!(
                "got {} rows and {} labels",
                rows.len(),
                labels.len()
            )));
        }

        let n_features = rows[0].len();
        if n_features == 0 || rows.iter().any(|r| r.len() != n_features) {
            return Err(ForensicsError::InvalidParameter(
                "rows must share a non-zero width".into(),
            ));
        }

        let trees = (0..config.n_estimators)
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(tree_seed(config.seed, i));
                let bootstrap = (0..rows.len())
                    .map(|_| rng.gen_range(0..rows.len()))
                    .collect::<Vec<_>>();

                let mut builder = TreeBuilder {
                    rows,
                    labels,
                    config,
                    max_candidates: ((n_features as f64).sqrt() as usize).max(1),
                    nodes: Vec::new(),
                };
                builder.grow(bootstrap, 0, &mut rng);

                DecisionTree {
                    nodes: builder.nodes,
                }
            })
            .collect();

        Ok(Self { n_features, trees })
    }

    /// Mean of the trees' leaf fractions of label 1.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let total = self.trees.iter().map(|t| t.predict(row)).sum::<f64>();
        total / self.trees.len() as f64
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    pub(crate) fn validate(&self, expected_features: usize) -> Result<()> {
        if self.n_features != expected_features {
            return Err(ForensicsError::ArtifactCorrupt(format!(
                "forest expects {} features, extractor produces {}",
                self.n_features, expected_features
            )));
        }
        if self.trees.is_empty() {
            return Err(ForensicsError::ArtifactCorrupt("forest has no trees".into()));
        }

        self.trees
            .iter()
            .try_for_each(|tree| tree.validate(self.n_features))
    }
}

fn tree_seed(seed: u64, index: usize) -> u64 {
    seed.wrapping_add(index as u64)
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    labels: &'a [u8],
    config: &'a ForestConfig,
    max_candidates: usize,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> usize {
        let positives = samples.iter().filter(|&&i| self.labels[i] == 1).count();
        let p_real = positives as f64 / samples.len() as f64;

        let index = self.nodes.len();
        self.nodes.push(Node::Leaf { p_real });

        let pure = positives == 0 || positives == samples.len();
        let too_deep = self.config.max_depth.is_some_and(|max| depth >= max);
        if pure || too_deep || samples.len() < self.config.min_samples_split {
            return index;
        }

        let Some(split) = self.best_split(&samples, rng) else {
            return index;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.rows[i][split.feature] <= split.threshold);

        let left = self.grow(left, depth + 1, rng);
        let right = self.grow(right, depth + 1, rng);
        self.nodes[index] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };

        index
    }

    // Draws features in random order and keeps searching past `max_candidates`
    // only while no valid split has been found.
    fn best_split(&self, samples: &[usize], rng: &mut StdRng) -> Option<SplitCandidate> {
        let mut features = (0..self.rows[0].len()).collect::<Vec<_>>();
        features.shuffle(rng);

        let mut best: Option<SplitCandidate> = None;
        for (visited, &feature) in features.iter().enumerate() {
            if visited >= self.max_candidates && best.is_some() {
                break;
            }

            let Some(candidate) = self.best_split_on(samples, feature) else {
                continue;
            };
            if best.as_ref().is_none_or(|b| candidate.impurity < b.impurity) {
                best = Some(candidate);
            }
        }

        best
    }

    fn best_split_on(&self, samples: &[usize], feature: usize) -> Option<SplitCandidate> {
        let mut column = samples
            .iter()
            .map(|&i| (self.rows[i][feature], self.labels[i] == 1))
            .collect::<Vec<_>>();
        column.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = column.len();
        let total_pos = column.iter().filter(|(_, real)| *real).count();

        let mut best: Option<SplitCandidate> = None;
        let mut left_pos = 0;
        for i in 0..n - 1 {
            if column[i].1 {
                left_pos += 1;
            }
            let (value, next) = (column[i].0, column[i + 1].0);
            if value == next {
                continue;
            }

            let left_n = i + 1;
            let right_n = n - left_n;
            let impurity = (left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(total_pos - left_pos, right_n))
                / n as f64;

            if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                let midpoint = value + (next - value) / 2.0;
                let threshold = if midpoint < next { midpoint } else { value };
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }

        best
    }
}

fn gini(positives: usize, total: usize) -> f64 {
    let p = positives as f64 / total as f64;
    2.0 * p * (1.0 - p)
}
