use super::{Classifier, check_features, check_training_shapes};
use crate::error::{Result, SurveyError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;

/// Decision tree node
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Leaf holding the fraction of positive training rows that reached it
    Leaf { value: f64, n_samples: usize },
    /// Rows with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Gini impurity of a node with `pos` positives out of `n` rows.
fn gini(pos: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = pos as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// CART classification tree with Gini impurity.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features drawn at random per split; all features when `None`.
    pub max_features: Option<usize>,
    pub random_state: u64,
    n_features: usize,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: 42,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    fn build(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let pos = indices.iter().filter(|&&i| y[i] > 0.5).count();
        let leaf = TreeNode::Leaf {
            value: pos as f64 / n_samples as f64,
            n_samples,
        };

        if n_samples < self.min_samples_split
            || pos == 0
            || pos == n_samples
            || self.max_depth.is_some_and(|d| depth >= d)
        {
            return leaf;
        }

        let Some((feature_idx, threshold)) = self.best_split(x, y, indices, pos, rng) else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        TreeNode::Split {
            feature_idx,
            threshold,
            left: Box::new(self.build(x, y, &left_idx, depth + 1, rng)),
            right: Box::new(self.build(x, y, &right_idx, depth + 1, rng)),
            n_samples,
        }
    }

    /// Best `(feature, threshold)` by Gini gain among the candidate features,
    /// or `None` when no split improves impurity.
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        pos: usize,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64)> {
        let n = indices.len();
        let parent = gini(pos, n);

        let candidates: Vec<usize> = match self.max_features {
            Some(k) if k < self.n_features => {
                let mut picked = index::sample(rng, self.n_features, k.max(1)).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..self.n_features).collect(),
        };

        let mut best: Option<(usize, f64, f64)> = None;
        for feature_idx in candidates {
            let mut column: Vec<(f64, bool)> = indices
                .iter()
                .map(|&i| (x[[i, feature_idx]], y[i] > 0.5))
                .collect();
            column.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_pos = 0;
            for i in 0..n - 1 {
                if column[i].1 {
                    left_pos += 1;
                }
                if column[i].0 == column[i + 1].0 {
                    continue;
                }
                let left_n = i + 1;
                let right_n = n - left_n;
                if left_n < self.min_samples_leaf || right_n < self.min_samples_leaf {
                    continue;
                }

                let weighted = (left_n as f64 * gini(left_pos, left_n)
                    + right_n as f64 * gini(pos - left_pos, right_n))
                    / n as f64;
                let gain = parent - weighted;
                if gain > 1e-12 && best.is_none_or(|(_, _, g)| gain > g) {
                    let threshold = (column[i].0 + column[i + 1].0) / 2.0;
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best.map(|(f, t, _)| (f, t))
    }
}

impl Classifier for DecisionTree {
    fn name(&self) -> &'static str {
        "Decision Tree"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_shapes(x, y)?;
        self.n_features = x.ncols();

        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state);
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.root = Some(self.build(x, y, &indices, 0, &mut rng));
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(SurveyError::ModelNotFitted)?;
        check_features(x, self.n_features)?;
        Ok(x.rows().into_iter().map(|row| root.predict_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::threshold_data;
    use super::*;
    use ndarray::array;

    #[test]
    fn test_gini() {
        assert_eq!(gini(0, 4), 0.0);
        assert_eq!(gini(4, 4), 0.0);
        assert_eq!(gini(2, 4), 0.5);
        assert_eq!(gini(0, 0), 0.0);
    }

    #[test]
    fn test_tree_fits_threshold_exactly() {
        let (x, y) = threshold_data();
        let mut tree = DecisionTree::new().with_max_depth(5);
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict(&x).unwrap(), y);
        match tree.root().unwrap() {
            TreeNode::Split {
                feature_idx,
                threshold,
                ..
            } => {
                assert_eq!(*feature_idx, 0);
                assert_eq!(*threshold, 5.0);
            }
            TreeNode::Leaf { .. } => panic!("expected a split at the root"),
        }
    }

    #[test]
    fn test_tree_respects_max_depth() {
        let x = Array2::from_shape_fn((32, 1), |(i, _)| i as f64);
        let y = Array1::from_shape_fn(32, |i| (i % 2) as f64);
        let mut tree = DecisionTree::new().with_max_depth(3);
        tree.fit(&x, &y).unwrap();
        assert!(tree.root().unwrap().depth() <= 3);
    }

    #[test]
    fn test_tree_leaf_probability_is_positive_fraction() {
        // identical features, no split possible
        let x = array![[1.0], [1.0], [1.0], [1.0]];
        let y = array![1.0, 0.0, 1.0, 1.0];
        let mut tree = DecisionTree::new();
        tree.fit(&x, &y).unwrap();

        let proba = tree.predict_proba(&array![[1.0]]).unwrap();
        assert_eq!(proba[0], 0.75);
    }

    #[test]
    fn test_tree_not_fitted() {
        let err = DecisionTree::new().predict(&array![[1.0]]).unwrap_err();
        assert!(matches!(err, SurveyError::ModelNotFitted));
    }
}
