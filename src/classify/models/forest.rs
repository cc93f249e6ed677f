use super::tree::DecisionTree;
use super::{Classifier, check_features, check_training_shapes};
use crate::error::{Result, SurveyError};
use ndarray::{Array1, Array2, Axis};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Bagged ensemble of [`DecisionTree`]s with random feature subsets.
///
/// Tree `i` is trained on a bootstrap sample drawn with seed
/// `random_state + i` and considers `ceil(sqrt(n_features))` features per
/// split. Probabilities are the mean over trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub random_state: u64,
    n_features: usize,
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new(100)
    }
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            random_state: 42,
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn max_features(n_features: usize) -> usize {
        ((n_features as f64).sqrt().ceil() as usize).max(1)
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "Random Forest"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        check_training_shapes(x, y)?;
        if self.n_estimators == 0 {
            return Err(SurveyError::InvalidConfig(
                "random forest needs at least one tree".to_string(),
            ));
        }

        let n_samples = x.nrows();
        self.n_features = x.ncols();
        let max_features = Self::max_features(self.n_features);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for tree_idx in 0..self.n_estimators {
            let seed = self.random_state.wrapping_add(tree_idx as u64);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let sample: Vec<usize> = (0..n_samples)
                .map(|_| rng.random_range(0..n_samples))
                .collect();
            let x_boot = x.select(Axis(0), &sample);
            let y_boot = y.select(Axis(0), &sample);

            let mut tree = DecisionTree::new()
                .with_max_features(max_features)
                .with_random_state(seed);
            tree.max_depth = self.max_depth;
            tree.fit(&x_boot, &y_boot)?;
            trees.push(tree);
        }

        debug!(trees = trees.len(), max_features, "Random forest fitted");
        self.trees = trees;
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(SurveyError::ModelNotFitted);
        }
        check_features(x, self.n_features)?;

        let mut total = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            total += &tree.predict_proba(x)?;
        }
        Ok(total / self.trees.len() as f64)
    }
}
