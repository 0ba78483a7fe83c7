//! Ranking of categorical values by their positive label rate
//!
use std::cmp::Ordering;
use std::collections::HashMap;

use linfa::Float;

/// Hashable identity of a category code. `0.0` and `-0.0` are the same category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CategoryKey(u64, i16, i8);

impl CategoryKey {
    fn of<F: Float>(value: F) -> Self {
        let value = if value == F::zero() { F::zero() } else { value };
        let (mantissa, exponent, sign) = value.integer_decode();

        CategoryKey(mantissa, exponent, sign)
    }
}

#[derive(Debug, Clone)]
struct CategoryStats<F> {
    value: F,
    count: usize,
    positive: usize,
}

/// Mapping from raw category to its rank, computed from the samples of a single node.
///
/// Categories are ordered by ascending rate of positive labels, ties keep the order
/// of first appearance. A threshold on the ranks then corresponds to the optimal
/// two-way partition of the categories under the Gini criterion.
#[derive(Debug, Clone)]
pub(crate) struct CategoryRanks<F> {
    ranked: Vec<F>,
    ranks: HashMap<CategoryKey, usize>,
}

impl<F: Float> CategoryRanks<F> {
    /// Ranks the categories in `values`, with `labels` the 0/1 label of each value
    pub(crate) fn from_subset(values: &[F], labels: &[usize]) -> Self {
        let mut stats: Vec<CategoryStats<F>> = Vec::new();
        let mut index = HashMap::new();

        for (&value, &label) in values.iter().zip(labels) {
            let idx = *index.entry(CategoryKey::of(value)).or_insert_with(|| {
                stats.push(CategoryStats {
                    value,
                    count: 0,
                    positive: 0,
                });
                stats.len() - 1
            });

            stats[idx].count += 1;
            stats[idx].positive += label;
        }

        // compare positive / count exactly by cross multiplication, stable for ties
        stats.sort_by(|a, b| (a.positive * b.count).cmp(&(b.positive * a.count)));

        let ranks = stats
            .iter()
            .enumerate()
            .map(|(rank, stat)| (CategoryKey::of(stat.value), rank))
            .collect();

        CategoryRanks {
            ranked: stats.into_iter().map(|stat| stat.value).collect(),
            ranks,
        }
    }

    /// Number of distinct categories
    pub(crate) fn len(&self) -> usize {
        self.ranked.len()
    }

    pub(crate) fn rank(&self, value: F) -> Option<usize> {
        self.ranks.get(&CategoryKey::of(value)).copied()
    }

    /// Replaces every category of `values` by its rank
    pub(crate) fn encode(&self, values: &[F]) -> Vec<F> {
        values
            .iter()
            .map(|&value| self.rank(value).map(F::cast).unwrap_or_else(F::nan))
            .collect()
    }

    /// The raw categories whose rank lies below `threshold`, sorted by value
    pub(crate) fn categories_below(&self, threshold: F) -> Vec<F> {
        let mut categories: Vec<F> = self
            .ranked
            .iter()
            .enumerate()
            .take_while(|(rank, _)| F::cast(*rank) < threshold)
            .map(|(_, &value)| value)
            .collect();
        categories.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        categories
    }
}

/// Membership test on a category set sorted by [`CategoryRanks::categories_below`].
/// Values that were never seen, including NaN, are not members.
pub(crate) fn contains_category<F: Float>(categories: &[F], value: F) -> bool {
    categories
        .binary_search_by(|category| category.partial_cmp(&value).unwrap_or(Ordering::Less))
        .is_ok()
}
