//! Regression tree used as the boosting base learner

use crate::error::{ForecastError, Result};
use crate::models::Regressor;
use ndarray::{Array1, Array2};

/// Binary tree node
#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Regression tree with variance-reduction splits and mean-value leaves.
#[derive(Debug, Clone)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    max_depth: usize,
    min_samples_leaf: usize,
    n_features: usize,
}

impl DecisionTree {
    /// Create an unfitted tree with the given stopping parameters
    pub fn new(max_depth: usize, min_samples_leaf: usize) -> Self {
        Self {
            root: None,
            max_depth,
            min_samples_leaf: min_samples_leaf.max(1),
            n_features: 0,
        }
    }

    fn build_tree(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let stop = depth >= self.max_depth
            || indices.len() < 2 * self.min_samples_leaf
            || is_constant(&subset);
        if stop {
            return TreeNode::Leaf {
                value: mean(&subset),
            };
        }

        match self.find_best_split(x, y, indices) {
            Some((feature_idx, threshold)) => {
                let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&i| x[[i, feature_idx]] <= threshold);

                if left_indices.len() < self.min_samples_leaf
                    || right_indices.len() < self.min_samples_leaf
                {
                    return TreeNode::Leaf {
                        value: mean(&subset),
                    };
                }

                let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1));
                let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1));
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                }
            }
            None => TreeNode::Leaf {
                value: mean(&subset),
            },
        }
    }

    /// Scan every feature for the threshold with the largest variance
    /// reduction, accumulating sums incrementally rather than re-slicing the
    /// data per candidate.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let parent_impurity = variance(&subset);

        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in 0..x.ncols() {
            let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let mut left_count = 0usize;
                let mut left_sum = 0.0f64;
                let mut left_sq_sum = 0.0f64;
                let mut right_count = 0usize;
                let mut right_sum = 0.0f64;
                let mut right_sq_sum = 0.0f64;

                for &idx in indices {
                    let yi = y[idx];
                    if x[[idx, feature_idx]] <= threshold {
                        left_count += 1;
                        left_sum += yi;
                        left_sq_sum += yi * yi;
                    } else {
                        right_count += 1;
                        right_sum += yi;
                        right_sq_sum += yi * yi;
                    }
                }

                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }

                // Var = E[X^2] - E[X]^2 from the accumulated sums
                let left_var = left_sq_sum / left_count as f64 - (left_sum / left_count as f64).powi(2);
                let right_var =
                    right_sq_sum / right_count as f64 - (right_sum / right_count as f64).powi(2);
                let weighted =
                    (left_count as f64 * left_var + right_count as f64 * right_var) / n;

                let gain = parent_impurity - weighted;
                if gain > 0.0 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best.map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    fn predict_sample(node: &TreeNode, sample: ndarray::ArrayView1<f64>) -> f64 {
        match node {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature_idx,
                threshold,
                left,
                right,
            } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }
}

impl Regressor for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(ForecastError::DataError(format!(
                "Feature matrix has {} rows but target vector has {}",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(ForecastError::DataError(
                "Cannot fit a tree on an empty matrix".to_string(),
            ));
        }

        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.n_features = x.ncols();
        self.root = Some(self.build_tree(x, y, &indices, 0));
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self
            .root
            .as_ref()
            .ok_or_else(|| ForecastError::NotReady("Tree has not been fitted".to_string()))?;
        if x.ncols() != self.n_features {
            return Err(ForecastError::DataError(format!(
                "Input has {} features but the tree was fitted on {}",
                x.ncols(),
                self.n_features
            )));
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| Self::predict_sample(root, x.row(i)))
            .collect();
        Ok(Array1::from_vec(predictions))
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|&v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

fn is_constant(values: &[f64]) -> bool {
    match values.first() {
        None => true,
        Some(&first) => values.iter().all(|&v| (v - first).abs() < 1e-12),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn fits_a_step_function() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![0.0, 0.0, 0.0, 5.0, 5.0, 5.0];

        let mut tree = DecisionTree::new(3, 1);
        tree.fit(&x, &y).unwrap();

        let predictions = tree.predict(&x).unwrap();
        for (p, a) in predictions.iter().zip(y.iter()) {
            assert!((p - a).abs() < 1e-9, "predicted {} for actual {}", p, a);
        }
    }

    #[test]
    fn respects_max_depth_zero() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 2.0, 3.0, 4.0];

        let mut tree = DecisionTree::new(0, 1);
        tree.fit(&x, &y).unwrap();

        // Depth 0 collapses to a single mean leaf
        let predictions = tree.predict(&x).unwrap();
        for p in predictions.iter() {
            assert!((p - 2.5).abs() < 1e-9);
        }
    }

    #[test]
    fn predict_rejects_a_narrower_matrix() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut tree = DecisionTree::new(2, 1);
        tree.fit(&x, &y).unwrap();

        let narrow = array![[1.0]];
        assert!(tree.predict(&narrow).is_err());
    }

    #[test]
    fn predict_before_fit_is_an_error() {
        let tree = DecisionTree::new(3, 1);
        let x = array![[1.0]];
        assert!(tree.predict(&x).is_err());
    }
}
