//! Gini split search over a single feature
//!
use std::cmp::Ordering;

use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

use crate::error::{CartError, Result};

/// Every candidate threshold of a feature together with its split score, and the
/// selected best pair.
///
/// The score of a threshold is the negative weighted Gini impurity of the two
/// groups it produces, `-(n_l / n) H_l - (n_r / n) H_r`, so higher is better and a
/// perfect split scores zero.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct BestSplit<F> {
    thresholds: Array1<F>,
    ginis: Array1<F>,
    best_threshold: F,
    best_gini: F,
}

impl<F: Float> BestSplit<F> {
    /// All candidate thresholds in ascending order
    pub fn thresholds(&self) -> &Array1<F> {
        &self.thresholds
    }

    /// Scores of the candidate thresholds, in the same order
    pub fn ginis(&self) -> &Array1<F> {
        &self.ginis
    }

    pub fn best_threshold(&self) -> F {
        self.best_threshold
    }

    pub fn best_gini(&self) -> F {
        self.best_gini
    }
}

/// Finds the Gini optimal threshold for a real valued feature and binary labels.
///
/// Samples with a value below the threshold go to the left group, the others to the
/// right group. Candidate thresholds are the midpoints between consecutive distinct
/// values, so both groups are never empty. Among equally good thresholds the
/// smallest one is selected.
///
/// ### Errors
///
/// Fails if the lengths differ, if there are no samples, if a value is NaN, if a
/// label is neither 0 nor 1 or if the feature is constant, as a constant feature
/// has no threshold at all.
///
/// ### Example
///
/// ```rust
/// use linfa_cart::find_best_split;
/// use ndarray::array;
///
/// let split = find_best_split(&array![1., 2., 3., 4.], &array![0, 0, 1, 1]).unwrap();
///
/// assert_eq!(split.best_threshold(), 2.5);
/// assert_eq!(split.best_gini(), 0.0);
/// ```
pub fn find_best_split<F: Float>(
    feature_values: &ArrayBase<impl Data<Elem = F>, Ix1>,
    labels: &ArrayBase<impl Data<Elem = usize>, Ix1>,
) -> Result<BestSplit<F>> {
    if feature_values.len() != labels.len() {
        return Err(CartError::MismatchedShapes(
            feature_values.len(),
            labels.len(),
        ));
    }
    if let Some(&label) = labels.iter().find(|&&label| label > 1) {
        return Err(CartError::InvalidLabel(label));
    }
    if let Some((row, value)) = feature_values
        .iter()
        .enumerate()
        .find(|(_, value)| value.is_nan())
    {
        return Err(CartError::NonFiniteValue {
            row,
            col: 0,
            value: value.to_f64().unwrap_or(f64::NAN),
        });
    }

    let values = feature_values.to_vec();
    let labels = labels.to_vec();

    SplitFinder::default()
        .scan(&values, &labels)?
        .ok_or(CartError::ConstantFeature)
}

/// Split search used while growing a tree.
///
/// Expects finite values and 0/1 labels, which are validated once before growing.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitFinder {
    min_samples_leaf: usize,
}

impl Default for SplitFinder {
    fn default() -> Self {
        SplitFinder {
            min_samples_leaf: 1,
        }
    }
}

impl SplitFinder {
    pub(crate) fn new(min_samples_leaf: usize) -> Self {
        SplitFinder {
            min_samples_leaf: min_samples_leaf.max(1),
        }
    }

    /// Scores every admissible threshold of `values` with a single sorted pass.
    ///
    /// Returns `Ok(None)` if thresholds exist but all of them leave fewer than
    /// `min_samples_leaf` samples on one side.
    pub(crate) fn scan<F: Float>(
        &self,
        values: &[F],
        labels: &[usize],
    ) -> Result<Option<BestSplit<F>>> {
        if values.len() != labels.len() {
            return Err(CartError::MismatchedShapes(values.len(), labels.len()));
        }
        if values.is_empty() {
            return Err(CartError::NotEnoughSamples);
        }

        let mut sorted: Vec<(F, usize)> = values
            .iter()
            .copied()
            .zip(labels.iter().copied())
            .collect();
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        if sorted[0].0 == sorted[sorted.len() - 1].0 {
            return Err(CartError::ConstantFeature);
        }

        let n_samples = sorted.len();
        let n_positive: usize = sorted.iter().map(|(_, label)| label).sum();

        let mut thresholds = Vec::new();
        let mut ginis: Vec<F> = Vec::new();
        // running count of positive labels among the first `i + 1` sorted samples
        let mut left_positive = 0;

        for i in 0..n_samples - 1 {
            let (value, label) = sorted[i];
            let next_value = sorted[i + 1].0;
            left_positive += label;

            // equal values always end up in the same group
            if value == next_value {
                continue;
            }

            let n_left = i + 1;
            let n_right = n_samples - n_left;
            if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                continue;
            }

            // halves are summed so that large finite values cannot overflow. The midpoint
            // of adjacent floats may round onto `value` and the one of opposite infinities
            // is NaN, the upper value then still separates both groups
            let half = F::cast(0.5);
            let mut threshold = value * half + next_value * half;
            if !(value < threshold && threshold <= next_value) {
                threshold = next_value;
            }

            thresholds.push(threshold);
            ginis.push(split_score(
                n_left,
                left_positive,
                n_right,
                n_positive - left_positive,
            ));
        }

        // strict maximum, the first (smallest) threshold wins ties
        let best = ginis
            .iter()
            .enumerate()
            .filter(|(_, gini)| gini.is_finite())
            .fold(None, |best: Option<(usize, F)>, (idx, &gini)| match best {
                Some((_, best_gini)) if best_gini >= gini => best,
                _ => Some((idx, gini)),
            });

        Ok(best.map(|(idx, best_gini)| BestSplit {
            best_threshold: thresholds[idx],
            best_gini,
            thresholds: Array1::from(thresholds),
            ginis: Array1::from(ginis),
        }))
    }
}

/// Gini impurity `1 - p^2 - (1 - p)^2` of a group with `n_positive` positive labels
/// out of `n_samples`. Returns `None` for an empty group.
pub(crate) fn gini_impurity<F: Float>(n_samples: usize, n_positive: usize) -> Option<F> {
    if n_samples == 0 {
        return None;
    }

    let p = F::cast(n_positive) / F::cast(n_samples);
    Some(F::one() - p * p - (F::one() - p) * (F::one() - p))
}

/// Negative size weighted impurity of a split, `-inf` if one of the groups is empty
fn split_score<F: Float>(
    n_left: usize,
    left_positive: usize,
    n_right: usize,
    right_positive: usize,
) -> F {
    let total = F::cast(n_left + n_right);

    match (
        gini_impurity::<F>(n_left, left_positive),
        gini_impurity::<F>(n_right, right_positive),
    ) {
        (Some(left), Some(right)) => {
            -(F::cast(n_left) / total) * left - (F::cast(n_right) / total) * right
        }
        _ => F::neg_infinity(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use proptest::collection::vec as prop_vec;
    use proptest::prelude::*;

    /// Scores a threshold by explicitly grouping every sample
    fn naive_score(values: &[f64], labels: &[usize], threshold: f64) -> f64 {
        let (left, right): (Vec<usize>, Vec<usize>) = {
            let mut left = Vec::new();
            let mut right = Vec::new();
            for (value, label) in values.iter().zip(labels) {
                if *value < threshold {
                    left.push(*label);
                } else {
                    right.push(*label);
                }
            }
            (left, right)
        };

        let impurity = |group: &[usize]| {
            let p = group.iter().sum::<usize>() as f64 / group.len() as f64;
            1.0 - p * p - (1.0 - p) * (1.0 - p)
        };
        let n = values.len() as f64;

        -(left.len() as f64 / n) * impurity(&left) - (right.len() as f64 / n) * impurity(&right)
    }

    #[test]
    fn perfect_split() {
        let split = find_best_split(&array![1., 2., 3., 4.], &array![0, 0, 1, 1]).unwrap();

        assert_eq!(split.thresholds(), &array![1.5, 2.5, 3.5]);
        assert_abs_diff_eq!(split.best_threshold(), 2.5);
        assert_abs_diff_eq!(split.best_gini(), 0.0);

        // one sample on the left, the remaining three (1/3 positive) on the right
        assert_abs_diff_eq!(split.ginis()[0], -1. / 3., epsilon = 1e-12);
    }

    #[test]
    fn unsorted_values_with_duplicates() {
        let split = find_best_split(
            &array![3.0f32, 1.0, 3.0, 2.0, 1.0],
            &array![1, 0, 1, 0, 0],
        )
        .unwrap();

        assert_eq!(split.thresholds(), &array![1.5f32, 2.5]);
        assert_abs_diff_eq!(split.best_threshold(), 2.5);
        assert_abs_diff_eq!(split.best_gini(), 0.0);
    }

    #[test]
    fn ties_select_smallest_threshold() {
        // splitting off either outer sample gives the same score
        let split = find_best_split(&array![0., 1., 2.], &array![0, 1, 0]).unwrap();

        assert_abs_diff_eq!(split.ginis()[0], split.ginis()[1]);
        assert_abs_diff_eq!(split.best_threshold(), 0.5);
    }

    #[test]
    fn constant_feature_is_rejected() {
        let result = find_best_split(&array![7., 7., 7.], &array![0, 1, 0]);
        assert!(matches!(result, Err(CartError::ConstantFeature)));
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            find_best_split(&array![1., 2.], &array![0]),
            Err(CartError::MismatchedShapes(2, 1))
        ));
        assert!(matches!(
            find_best_split(&array![1., 2.], &array![0, 2]),
            Err(CartError::InvalidLabel(2))
        ));
        assert!(matches!(
            find_best_split(&array![1., f64::NAN], &array![0, 1]),
            Err(CartError::NonFiniteValue { row: 1, .. })
        ));
        assert!(matches!(
            find_best_split(&Array1::<f64>::zeros(0), &Array1::<usize>::zeros(0)),
            Err(CartError::NotEnoughSamples)
        ));
    }

    #[test]
    fn adjacent_floats_still_separate() {
        let low = 1.0f32;
        let high = f32::from_bits(low.to_bits() + 1);
        let split = find_best_split(&array![low, high], &array![0, 1]).unwrap();

        assert!(low < split.best_threshold());
        assert!(split.best_threshold() <= high);
        assert_abs_diff_eq!(split.best_gini(), 0.0);
    }

    #[test]
    fn extreme_values_keep_threshold_between_samples() {
        let cases = [
            (1.7e308, 1.79e308),
            (-f64::MAX, f64::MAX),
            (f64::NEG_INFINITY, f64::INFINITY),
            (f64::MAX, f64::INFINITY),
        ];

        for &(low, high) in cases.iter() {
            let split = find_best_split(&array![high, low], &array![1, 0]).unwrap();

            assert!(low < split.best_threshold());
            assert!(split.best_threshold() <= high);
            assert_abs_diff_eq!(split.best_gini(), 0.0);
        }
    }

    #[test]
    fn min_samples_leaf_drops_candidates() {
        let finder = SplitFinder::new(2);
        let split = finder
            .scan(&[1., 2., 3., 4., 5.], &[0, 1, 1, 1, 1])
            .unwrap()
            .unwrap();

        // 1.5 would leave a single sample on the left
        assert_eq!(split.thresholds(), &array![2.5, 3.5]);
        assert_abs_diff_eq!(split.best_threshold(), 2.5);

        let none = SplitFinder::new(3).scan(&[1., 2., 3., 4.], &[0, 0, 1, 1]).unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn empty_group_scores_negative_infinity() {
        assert_eq!(split_score::<f64>(0, 0, 3, 1), f64::NEG_INFINITY);
        assert_eq!(gini_impurity::<f64>(0, 0), None);
        assert_abs_diff_eq!(gini_impurity::<f64>(4, 2).unwrap(), 0.5);
    }

    fn feature_and_labels() -> impl Strategy<Value = (Vec<f64>, Vec<usize>)> {
        (2usize..40).prop_flat_map(|n| {
            (
                prop_vec((-20i32..20).prop_map(|v| v as f64 / 4.0), n),
                prop_vec(0usize..2, n),
            )
        })
    }

    proptest! {
        #[test]
        fn best_split_is_argmax_between_observed_values((values, labels) in feature_and_labels()) {
            let distinct = values.iter().any(|v| *v != values[0]);
            prop_assume!(distinct);

            let split = find_best_split(&Array1::from(values.clone()), &Array1::from(labels.clone())).unwrap();

            let max = split.ginis().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(split.best_gini(), max);

            let below = values.iter().any(|v| *v < split.best_threshold());
            let above = values.iter().any(|v| *v >= split.best_threshold());
            prop_assert!(below && above);
            prop_assert!(!values.contains(&split.best_threshold()));

            let first_max = split.ginis().iter().position(|g| *g == max).unwrap();
            prop_assert_eq!(split.thresholds()[first_max], split.best_threshold());

            for pair in split.thresholds().windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
        }

        #[test]
        fn scores_match_naive_grouping((values, labels) in feature_and_labels()) {
            let distinct = values.iter().any(|v| *v != values[0]);
            prop_assume!(distinct);

            let split = find_best_split(&Array1::from(values.clone()), &Array1::from(labels.clone())).unwrap();

            for (threshold, gini) in split.thresholds().iter().zip(split.ginis()) {
                let expected = naive_score(&values, &labels, *threshold);
                prop_assert!((expected - gini).abs() < 1e-9);
            }
        }
    }
}
