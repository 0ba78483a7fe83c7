//! Binary decision trees over real valued and categorical features
//!
use std::collections::{BTreeSet, VecDeque};

use log::{debug, trace};
use ndarray::{Array1, ArrayBase, ArrayView1, Data, Ix1, Ix2};

use super::encoding::{contains_category, CategoryRanks};
use super::split::{gini_impurity, SplitFinder};
use super::NodeIter;
use super::Tikz;
use super::{DecisionTreeValidParams, FeatureType};
use crate::error::{CartError, Result};
use linfa::{dataset::AsSingleTargets, traits::*, DatasetBase, Float};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// The decision rule of an internal node
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum SplitRule<F> {
    /// Samples with `x < threshold` go to the left child
    Real { threshold: F },
    /// Samples whose category is one of `left_categories` go to the left child,
    /// every other category, including unseen ones, goes right
    Categorical { left_categories: Vec<F> },
}

impl<F: Float> SplitRule<F> {
    /// Returns true if a sample with feature value `value` is routed to the left child
    pub fn goes_left(&self, value: F) -> bool {
        match self {
            SplitRule::Real { threshold } => value < *threshold,
            SplitRule::Categorical { left_categories } => {
                contains_category(left_categories, value)
            }
        }
    }
}

/// A node in the decision tree
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode<F> {
    /// Leaf predicting a fixed class
    Terminal {
        prediction: usize,
        depth: usize,
        n_samples: usize,
    },
    /// Split on a single feature with exactly two children
    Internal {
        feature_idx: usize,
        split: SplitRule<F>,
        impurity_decrease: F,
        depth: usize,
        n_samples: usize,
        left: Box<TreeNode<F>>,
        right: Box<TreeNode<F>>,
    },
}

impl<F: Float> TreeNode<F> {
    fn terminal(prediction: usize, depth: usize, n_samples: usize) -> Self {
        TreeNode::Terminal {
            prediction,
            depth,
            n_samples,
        }
    }

    /// Returns true if the node has no children
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Terminal { .. })
    }

    /// Returns the depth of the node in the decision tree
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Terminal { depth, .. } | TreeNode::Internal { depth, .. } => *depth,
        }
    }

    /// Returns the number of training samples which reached this node
    pub fn n_samples(&self) -> usize {
        match self {
            TreeNode::Terminal { n_samples, .. } | TreeNode::Internal { n_samples, .. } => {
                *n_samples
            }
        }
    }

    /// Returns `Some(prediction)` for leaf nodes and `None` for internal nodes.
    pub fn prediction(&self) -> Option<usize> {
        match self {
            TreeNode::Terminal { prediction, .. } => Some(*prediction),
            TreeNode::Internal { .. } => None,
        }
    }

    /// Returns both children, first left then right
    pub fn children(&self) -> Option<(&TreeNode<F>, &TreeNode<F>)> {
        match self {
            TreeNode::Terminal { .. } => None,
            TreeNode::Internal { left, right, .. } => Some((&**left, &**right)),
        }
    }

    /// Return the split feature index, its rule and the impurity decrease of internal nodes
    pub fn split(&self) -> Option<(usize, &SplitRule<F>, F)> {
        match self {
            TreeNode::Terminal { .. } => None,
            TreeNode::Internal {
                feature_idx,
                split,
                impurity_decrease,
                ..
            } => Some((*feature_idx, split, *impurity_decrease)),
        }
    }
}

/// Winning split of a node, before its children are grown
struct Candidate<F> {
    feature_idx: usize,
    split: SplitRule<F>,
    gini: F,
}

/// Read-only state shared by every recursive call while growing a tree
struct TreeGrower<'a, F: Float, D: Data<Elem = F>> {
    records: &'a ArrayBase<D, Ix2>,
    targets: ArrayView1<'a, usize>,
    feature_types: &'a [FeatureType],
    hyperparameters: &'a DecisionTreeValidParams<F>,
    finder: SplitFinder,
}

impl<'a, F: Float, D: Data<Elem = F>> TreeGrower<'a, F, D> {
    /// Recursively fits the node on the samples with indices `rows`
    fn grow(&self, rows: Vec<usize>, depth: usize) -> Result<TreeNode<F>> {
        let labels: Vec<usize> = rows.iter().map(|&row| self.targets[row]).collect();
        let n_samples = rows.len();

        if let Some(&first) = labels.first() {
            if labels.iter().all(|&label| label == first) {
                return Ok(TreeNode::terminal(first, depth, n_samples));
            }
        }

        // set our prediction for this subset to the modal class
        let prediction = find_modal_class(&labels);

        // return a leaf when we don't have enough samples or the maximal depth is reached
        if self
            .hyperparameters
            .min_samples_split()
            .map(|min_samples| n_samples < min_samples)
            .unwrap_or(false)
            || self
                .hyperparameters
                .max_depth()
                .map(|max_depth| depth >= max_depth)
                .unwrap_or(false)
        {
            debug!(
                "stopping at depth {} with {} samples, predicting {}",
                depth, n_samples, prediction
            );
            return Ok(TreeNode::terminal(prediction, depth, n_samples));
        }

        let best = match self.find_best_candidate(&rows, &labels)? {
            Some(best) => best,
            None => {
                debug!(
                    "no usable split at depth {} with {} samples, predicting {}",
                    depth, n_samples, prediction
                );
                return Ok(TreeNode::terminal(prediction, depth, n_samples));
            }
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&row| best.split.goes_left(self.records[(row, best.feature_idx)]));
        debug_assert!(!left_rows.is_empty() && !right_rows.is_empty());

        let positive = labels.iter().filter(|&&label| label == 1).count();
        let parent_impurity = gini_impurity::<F>(n_samples, positive).unwrap_or_else(F::zero);
        let impurity_decrease = parent_impurity + best.gini;

        trace!(
            "splitting {} samples at depth {} on feature {}: {} left, {} right",
            n_samples,
            depth,
            best.feature_idx,
            left_rows.len(),
            right_rows.len()
        );

        let left = self.grow(left_rows, depth + 1)?;
        let right = self.grow(right_rows, depth + 1)?;

        Ok(TreeNode::Internal {
            feature_idx: best.feature_idx,
            split: best.split,
            impurity_decrease,
            depth,
            n_samples,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Searches every feature for its best threshold and keeps the first feature with
    /// the strictly highest score
    fn find_best_candidate(&self, rows: &[usize], labels: &[usize]) -> Result<Option<Candidate<F>>> {
        let mut best: Option<Candidate<F>> = None;

        for (feature_idx, feature_type) in self.feature_types.iter().enumerate() {
            let column: Vec<F> = rows
                .iter()
                .map(|&row| self.records[(row, feature_idx)])
                .collect();

            // categorical columns are searched on their per-node ranks
            let (encoded, ranks) = match feature_type {
                FeatureType::Real => (column, None),
                FeatureType::Categorical => {
                    let ranks = CategoryRanks::from_subset(&column, labels);
                    (ranks.encode(&column), Some(ranks))
                }
            };

            let constant = match &ranks {
                Some(ranks) => ranks.len() < 2,
                None => encoded.iter().all(|&value| value == encoded[0]),
            };
            if constant {
                trace!("feature {} skipped, it has a single value", feature_idx);
                continue;
            }

            let split = match self.finder.scan(&encoded, labels)? {
                Some(split) => split,
                None => {
                    trace!("feature {} has no threshold with large enough leaves", feature_idx);
                    continue;
                }
            };
            trace!(
                "feature {}: best threshold {} with score {}",
                feature_idx,
                split.best_threshold(),
                split.best_gini()
            );

            if best
                .as_ref()
                .map(|incumbent| split.best_gini() > incumbent.gini)
                .unwrap_or(true)
            {
                let rule = match ranks {
                    None => SplitRule::Real {
                        threshold: split.best_threshold(),
                    },
                    Some(ranks) => SplitRule::Categorical {
                        left_categories: ranks.categories_below(split.best_threshold()),
                    },
                };

                best = Some(Candidate {
                    feature_idx,
                    split: rule,
                    gini: split.best_gini(),
                });
            }
        }

        Ok(best)
    }
}

/// A fitted binary decision tree classifier.
///
/// ### Structure
/// A decision tree structure is a binary tree where:
/// * Each internal node specifies a decision on a single feature. For a real valued feature
/// all observations with `feature < threshold` fall in the left subtree, for a categorical
/// feature all observations whose category belongs to a stored set of categories do.
/// The others fall in the right subtree.
///
/// * leaf nodes make predictions, either 0 or 1
///
/// ### Algorithm
///
/// Starting with a single root node, decision trees are trained recursively by applying the following rule to every
/// node considered:
///
/// * If all observations have the same label, the node is a leaf predicting it;
/// * Find the best threshold for each feature by the Gini criterion. Categorical features are
///   ranked by their rate of positive labels in the node first, and split on that rank;
/// * Select the feature (and its best threshold) with the highest score, the first feature wins ties;
/// * Two child nodes are generated and trained on their part of the observations.
/// * If no feature can be split, the node is marked as leaf and predicts the most common label in the node;
///
/// ### Predictions
///
/// To predict the label of a sample, the tree is traversed from the root to a leaf, choosing between left and right children according to
/// the values of the features of the sample. Categories never seen at a node go to the right child.
///
/// ### Additional constraints
///
/// The growth can be limited by a maximal depth, a minimal number of samples to split a node and a
/// minimal number of samples in each leaf. See the [parameters](struct.DecisionTreeParams.html) page.
///
/// ### Example
///
/// ```rust
/// use linfa::prelude::*;
/// use linfa_cart::{DecisionTree, DecisionTreeParams};
/// use ndarray::array;
///
/// // the second column holds category codes
/// let records = array![[0.5, 1.], [1.5, 2.], [0.7, 3.], [2.5, 1.], [1.1, 3.], [0.2, 2.]];
/// let targets = array![0usize, 1, 0, 0, 0, 1];
/// let dataset = Dataset::new(records, targets);
///
/// let tree = DecisionTreeParams::from_feature_tags(&["real", "categorical"])
///     .unwrap()
///     .fit(&dataset)
///     .unwrap();
///
/// assert_eq!(&tree.predict(&dataset), dataset.targets());
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree<F: Float> {
    root_node: TreeNode<F>,
    feature_types: Vec<FeatureType>,
    params: DecisionTreeValidParams<F>,
}

impl<F: Float, D: Data<Elem = F>> PredictInplace<ArrayBase<D, Ix2>, Array1<usize>>
    for DecisionTree<F>
{
    /// Make predictions for each row of a matrix of features `x`.
    fn predict_inplace(&self, x: &ArrayBase<D, Ix2>, y: &mut Array1<usize>) {
        assert_eq!(
            x.nrows(),
            y.len(),
            "The number of data points must match the number of output targets."
        );
        assert_eq!(
            x.ncols(),
            self.num_features(),
            "The number of features must match the number of features seen during fitting."
        );

        for (row, target) in x.rows().into_iter().zip(y.iter_mut()) {
            *target = make_prediction(&row, &self.root_node);
        }
    }

    fn default_target(&self, x: &ArrayBase<D, Ix2>) -> Array1<usize> {
        Array1::zeros(x.nrows())
    }
}

impl<F: Float, D, T> Fit<ArrayBase<D, Ix2>, T, CartError> for DecisionTreeValidParams<F>
where
    D: Data<Elem = F>,
    T: AsSingleTargets<Elem = usize>,
{
    type Object = DecisionTree<F>;

    /// Fit a decision tree using `hyperparamters` on the dataset consisting of
    /// a matrix of features `x` and an array of 0/1 labels `y`.
    fn fit(&self, dataset: &DatasetBase<ArrayBase<D, Ix2>, T>) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets().as_single_targets();

        if x.nrows() != y.len() {
            return Err(CartError::MismatchedShapes(x.nrows(), y.len()));
        }
        if x.nrows() == 0 {
            return Err(CartError::NotEnoughSamples);
        }
        if let Some(&label) = y.iter().find(|&&label| label > 1) {
            return Err(CartError::InvalidLabel(label));
        }
        if let Some(((row, col), value)) = x.indexed_iter().find(|(_, value)| !value.is_finite()) {
            return Err(CartError::NonFiniteValue {
                row,
                col,
                value: value.to_f64().unwrap_or(f64::NAN),
            });
        }

        let feature_types = self.column_types(x.ncols())?;

        debug!(
            "fitting decision tree on {} samples with {} features",
            x.nrows(),
            x.ncols()
        );

        let grower = TreeGrower {
            records: x,
            targets: y,
            feature_types: &feature_types,
            hyperparameters: self,
            finder: SplitFinder::new(self.min_samples_leaf().unwrap_or(1)),
        };
        let root_node = grower.grow((0..x.nrows()).collect(), 0)?;

        let tree = DecisionTree {
            root_node,
            feature_types,
            params: self.clone(),
        };
        debug!(
            "fitted decision tree of depth {} with {} leaves",
            tree.max_depth(),
            tree.num_leaves()
        );

        Ok(tree)
    }
}

impl<F: Float> DecisionTree<F> {
    /// Create a node iterator in level-order (BFT)
    pub fn iter_nodes(&self) -> NodeIter<F> {
        // queue of nodes yet to explore
        let mut queue = VecDeque::new();
        queue.push_back(&self.root_node);

        NodeIter::new(queue)
    }

    /// Return the sorted indices of the features used by any split
    pub fn features(&self) -> Vec<usize> {
        self.iter_nodes()
            .filter_map(|node| node.split().map(|(feature_idx, _, _)| feature_idx))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Return the mean impurity decrease for each feature
    pub fn mean_impurity_decrease(&self) -> Vec<F> {
        // total impurity decrease for each feature
        let mut impurity_decrease = vec![F::zero(); self.num_features()];
        let mut num_nodes = vec![0; self.num_features()];

        for (feature_idx, _, decrease) in self.iter_nodes().filter_map(|node| node.split()) {
            // add feature impurity decrease to list
            impurity_decrease[feature_idx] += decrease;
            num_nodes[feature_idx] += 1;
        }

        impurity_decrease
            .into_iter()
            .zip(num_nodes.into_iter())
            .map(|(val, n)| if n == 0 { F::zero() } else { val / F::cast(n) })
            .collect()
    }

    /// Return the relative impurity decrease for each feature
    pub fn relative_impurity_decrease(&self) -> Vec<F> {
        let mean_impurity_decrease = self.mean_impurity_decrease();
        let sum: F = mean_impurity_decrease.iter().cloned().sum();

        // a tree without splits has no importances to normalize
        if sum == F::zero() {
            return mean_impurity_decrease;
        }

        mean_impurity_decrease
            .into_iter()
            .map(|x| x / sum)
            .collect()
    }

    /// Return the feature importance, i.e. the relative impurity decrease, for each feature
    pub fn feature_importance(&self) -> Vec<F> {
        self.relative_impurity_decrease()
    }

    /// Return root node of the tree
    pub fn root_node(&self) -> &TreeNode<F> {
        &self.root_node
    }

    /// Return max depth of the tree
    pub fn max_depth(&self) -> usize {
        self.iter_nodes()
            .fold(0, |max, node| usize::max(max, node.depth()))
    }

    /// Return the number of leaves in this tree
    pub fn num_leaves(&self) -> usize {
        self.iter_nodes().filter(|node| node.is_leaf()).count()
    }

    /// Return the number of features seen during fitting
    pub fn num_features(&self) -> usize {
        self.feature_types.len()
    }

    /// Return the resolved type of every feature
    pub fn feature_types(&self) -> &[FeatureType] {
        &self.feature_types
    }

    /// Return the parameters this tree was fitted with, exactly as they were constructed
    pub fn get_params(&self) -> &DecisionTreeValidParams<F> {
        &self.params
    }

    /// Generates a [`Tikz`](struct.Tikz.html) structure to print the
    /// fitted tree in Tex using tikz and forest, with the following default parameters:
    ///
    /// * `legend=false`
    /// * `complete=true`
    ///
    pub fn export_to_tikz(&self) -> Tikz<F> {
        Tikz::new(self)
    }
}

/// Classify a sample &x recursively using the tree node `node`.
fn make_prediction<F: Float>(x: &ArrayBase<impl Data<Elem = F>, Ix1>, node: &TreeNode<F>) -> usize {
    match node {
        TreeNode::Terminal { prediction, .. } => *prediction,
        TreeNode::Internal {
            feature_idx,
            split,
            left,
            right,
            ..
        } => {
            if split.goes_left(x[*feature_idx]) {
                make_prediction(x, left)
            } else {
                make_prediction(x, right)
            }
        }
    }
}

/// Finds the most frequent of the 0/1 `labels`. If both classes are equally
/// frequent then the label seen first is returned.
fn find_modal_class(labels: &[usize]) -> usize {
    let positive = labels.iter().filter(|&&label| label == 1).count();
    let negative = labels.len() - positive;

    if positive > negative {
        1
    } else if positive < negative {
        0
    } else {
        labels.first().copied().unwrap_or(0)
    }
}
