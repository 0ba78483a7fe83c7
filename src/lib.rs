//!
//! # Binary decision trees with categorical features
//! `linfa-cart` provides a pure Rust implementation of a CART style
//! binary classification tree, grown under the Gini impurity criterion.
//!
//! # The big picture
//!
//! `linfa-cart` is a crate in the [linfa](https://github.com/rust-ml/linfa) ecosystem,
//! an effort to create a toolkit for classical Machine Learning implemented in pure Rust, akin to Python's scikit-learn.
//!
//! The tree learns axis aligned decision rules from features which are either real valued or
//! categorical. A real valued feature is split by a threshold, a categorical feature by a set of
//! categories. The categories of a node are ordered by their rate of positive labels, which
//! turns the search for the best subset of categories into a search for the best threshold.
//!
//! # Current state
//!
//! `linfa-cart` provides an [implementation](DecisionTree) of single-tree fitting for 0/1 labels,
//! the underlying [split search](find_best_split) and a TikZ export of fitted trees.
//!
//! Training is deterministic: the same records, labels and feature types always produce the same tree.
//!

mod decision_trees;
mod error;

pub use decision_trees::*;
pub use error::{CartError, Result};
