use linfa::{Float, ParamGuard};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{CartError, Result};
use crate::DecisionTree;

/// How the values of a feature column are interpreted when searching for a split
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "lowercase")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeatureType {
    /// Ordered values, split by a scalar threshold `x < t`.
    Real,
    /// Unordered category codes. A node ranks the categories it sees by their rate of
    /// positive labels and sends the lower ranked ones to the left child.
    Categorical,
}

impl FromStr for FeatureType {
    type Err = CartError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "real" => Ok(FeatureType::Real),
            "categorical" => Ok(FeatureType::Categorical),
            other => Err(CartError::UnknownFeatureType(other.to_string())),
        }
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FeatureType::Real => write!(f, "real"),
            FeatureType::Categorical => write!(f, "categorical"),
        }
    }
}

/// The set of hyperparameters that can be specified for fitting a
/// [decision tree](struct.DecisionTree.html).
///
/// ### Example
///
/// ```rust
/// use linfa::prelude::*;
/// use linfa_cart::{DecisionTree, FeatureType};
/// use ndarray::array;
///
/// // first column is a measurement, second one a category code
/// let records = array![[1.0, 0.], [2.0, 1.], [3.0, 0.], [4.0, 1.]];
/// let targets = array![0usize, 1, 0, 1];
/// let dataset = Dataset::new(records, targets);
///
/// let params = DecisionTree::params()
///     .feature_types(vec![FeatureType::Real, FeatureType::Categorical])
///     .max_depth(Some(3));
///
/// let tree = params.fit(&dataset).unwrap();
/// assert_eq!(tree.predict(&dataset), array![0usize, 1, 0, 1]);
/// ```
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionTreeValidParams<F> {
    feature_types: Vec<FeatureType>,
    max_depth: Option<usize>,
    min_samples_split: Option<usize>,
    min_samples_leaf: Option<usize>,

    float_marker: PhantomData<F>,
}

impl<F: Float> DecisionTreeValidParams<F> {
    /// The configured feature types. Empty means that every column is real valued.
    pub fn feature_types(&self) -> &[FeatureType] {
        &self.feature_types
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    pub fn min_samples_split(&self) -> Option<usize> {
        self.min_samples_split
    }

    pub fn min_samples_leaf(&self) -> Option<usize> {
        self.min_samples_leaf
    }

    /// Resolves the feature types for a record matrix with `ncols` columns
    pub(crate) fn column_types(&self, ncols: usize) -> Result<Vec<FeatureType>> {
        if self.feature_types.is_empty() {
            Ok(vec![FeatureType::Real; ncols])
        } else if self.feature_types.len() != ncols {
            Err(CartError::FeatureTypesMismatch {
                expected: self.feature_types.len(),
                found: ncols,
            })
        } else {
            Ok(self.feature_types.clone())
        }
    }
}

#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Debug, PartialEq)]
pub struct DecisionTreeParams<F>(DecisionTreeValidParams<F>);

impl<F: Float> DecisionTreeParams<F> {
    pub fn new() -> Self {
        Self(DecisionTreeValidParams {
            feature_types: Vec::new(),
            max_depth: None,
            min_samples_split: None,
            min_samples_leaf: None,
            float_marker: PhantomData,
        })
    }

    /// Creates parameters from string feature type tags, `"real"` or `"categorical"`.
    ///
    /// Fails on the first unknown tag.
    pub fn from_feature_tags<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let feature_types = tags
            .into_iter()
            .map(|tag| tag.as_ref().parse())
            .collect::<Result<Vec<FeatureType>>>()?;

        Ok(Self::new().feature_types(feature_types))
    }

    /// Sets the type of every feature column, in column order
    pub fn feature_types(mut self, feature_types: Vec<FeatureType>) -> Self {
        self.0.feature_types = feature_types;
        self
    }

    /// Sets the optional limit to the depth of the decision tree
    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.0.max_depth = max_depth;
        self
    }

    /// Sets the optional minimum number of samples required to split a node
    pub fn min_samples_split(mut self, min_samples_split: Option<usize>) -> Self {
        self.0.min_samples_split = min_samples_split;
        self
    }

    /// Sets the optional minimum number of samples that a split has to place in each child.
    ///
    /// Thresholds violating it are not scored at all.
    pub fn min_samples_leaf(mut self, min_samples_leaf: Option<usize>) -> Self {
        self.0.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Returns the configuration exactly as it was constructed, without checking it
    pub fn get_params(&self) -> &DecisionTreeValidParams<F> {
        &self.0
    }
}

impl<F: Float> Default for DecisionTreeParams<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Float> DecisionTree<F> {
    /// Defaults are provided if the optional parameters are not specified:
    /// * `feature_types = []`, every column is real valued
    /// * `max_depth = None`
    /// * `min_samples_split = None`
    /// * `min_samples_leaf = None`
    // Violates the convention that new should return a value of type `Self`
    #[allow(clippy::new_ret_no_self)]
    pub fn params() -> DecisionTreeParams<F> {
        DecisionTreeParams::new()
    }
}

impl<F: Float> ParamGuard for DecisionTreeParams<F> {
    type Checked = DecisionTreeValidParams<F>;
    type Error = CartError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let limits = [
            ("max_depth", self.0.max_depth),
            ("min_samples_split", self.0.min_samples_split),
            ("min_samples_leaf", self.0.min_samples_leaf),
        ];

        for &(name, value) in limits.iter() {
            if value == Some(0) {
                return Err(CartError::NonPositiveParam { name, value: 0 });
            }
        }

        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}
