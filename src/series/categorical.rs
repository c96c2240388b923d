use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;

use crate::core::error::{Error, Result};

/// Categorical order type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalOrder {
    /// Without order
    Unordered,
    /// With defined order for categories
    Ordered,
}

/// Structure representing categorical data
///
/// Values are stored as integer codes into a fixed category list. For ordered
/// data the position in that list is the rank on the scale, so `[3, 2, 1]`
/// means 3 is the lowest level and 1 the highest.
#[derive(Debug, Clone)]
pub struct Categorical<T>
where
    T: Debug + Clone + Eq + Hash + Display,
{
    /// Codes (integer indices) to actual category values, -1 for missing
    codes: Vec<i32>,

    /// List of category values in scale order
    categories: Vec<T>,

    /// Map from category to integer code
    category_map: HashMap<T, i32>,

    /// Category ordering
    ordered: CategoricalOrder,
}

impl<T> Categorical<T>
where
    T: Debug + Clone + Eq + Hash + Display,
{
    /// Create a new categorical data structure
    ///
    /// # Arguments
    /// * `values` - Original data values
    /// * `categories` - Categories to use (if None, unique values in arrival order)
    /// * `ordered` - Whether the category list defines a scale
    ///
    /// Values not in an explicit category list become missing.
    pub fn new(
        values: Vec<T>,
        categories: Option<Vec<T>>,
        ordered: Option<CategoricalOrder>,
    ) -> Result<Self> {
        let (categories, category_map) = match categories {
            Some(cats) => {
                let mut map = HashMap::with_capacity(cats.len());
                for (i, cat) in cats.iter().enumerate() {
                    if map.insert(cat.clone(), i as i32).is_some() {
                        return Err(Error::Consistency(format!(
                            "Category '{:?}' is duplicated",
                            cat
                        )));
                    }
                }
                (cats, map)
            }
            None => {
                let mut unique_cats = Vec::new();
                let mut map = HashMap::new();

                for value in &values {
                    if !map.contains_key(value) {
                        map.insert(value.clone(), unique_cats.len() as i32);
                        unique_cats.push(value.clone());
                    }
                }

                (unique_cats, map)
            }
        };

        let codes = values
            .iter()
            .map(|value| category_map.get(value).copied().unwrap_or(-1))
            .collect();

        Ok(Categorical {
            codes,
            categories,
            category_map,
            ordered: ordered.unwrap_or(CategoricalOrder::Unordered),
        })
    }

    /// Get the length of the data
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Check if data is empty
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Get the list of categories
    pub fn categories(&self) -> &[T] {
        &self.categories
    }

    /// Get the codes
    pub fn codes(&self) -> &[i32] {
        &self.codes
    }

    /// Get the value at a specific index
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.codes.get(index) {
            Some(&code) if code >= 0 => Some(&self.categories[code as usize]),
            _ => None,
        }
    }

    /// Number of missing entries
    pub fn missing_count(&self) -> usize {
        self.codes.iter().filter(|&&c| c < 0).count()
    }

    /// Occurrences of every category, in category order
    pub fn value_counts(&self) -> Vec<(T, usize)> {
        let mut counts = vec![0usize; self.categories.len()];
        for &code in &self.codes {
            if code >= 0 {
                counts[code as usize] += 1;
            }
        }
        self.categories.iter().cloned().zip(counts).collect()
    }

    /// Keep only the entries where `mask` is true
    pub fn filter(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.codes.len() {
            return Err(Error::InconsistentRowCount {
                expected: self.codes.len(),
                found: mask.len(),
            });
        }

        let codes = self
            .codes
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(&code, _)| code)
            .collect();

        Ok(Categorical {
            codes,
            categories: self.categories.clone(),
            category_map: self.category_map.clone(),
            ordered: self.ordered,
        })
    }

    /// Mask of entries ranked at or below `category` on the scale
    pub fn le(&self, category: &T) -> Result<Vec<bool>> {
        let rank = self.rank_of(category)?;
        Ok(self.codes.iter().map(|&c| c >= 0 && c <= rank).collect())
    }

    /// Mask of entries ranked at or above `category` on the scale
    pub fn ge(&self, category: &T) -> Result<Vec<bool>> {
        let rank = self.rank_of(category)?;
        Ok(self.codes.iter().map(|&c| c >= 0 && c >= rank).collect())
    }

    fn rank_of(&self, category: &T) -> Result<i32> {
        if self.ordered != CategoricalOrder::Ordered {
            return Err(Error::InvalidOperation(
                "Rank comparisons require ordered categorical data".into(),
            ));
        }
        self.category_map.get(category).copied().ok_or_else(|| {
            Error::InvalidValue(format!("'{}' is not one of the categories", category))
        })
    }
}

impl Categorical<i64> {
    /// Category values as floats, NaN for missing entries
    pub fn values_f64(&self) -> Vec<f64> {
        self.codes
            .iter()
            .map(|&code| {
                if code >= 0 {
                    self.categories[code as usize] as f64
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_categories_define_order() {
        let cat = Categorical::new(
            vec![1i64, 3, 2, 3],
            Some(vec![3, 2, 1]),
            Some(CategoricalOrder::Ordered),
        )
        .unwrap();

        assert_eq!(cat.codes(), &[2, 0, 1, 0]);
        assert_eq!(cat.get(1), Some(&3));
        assert_eq!(cat.value_counts(), vec![(3, 2), (2, 1), (1, 1)]);
    }

    #[test]
    fn test_unknown_values_become_missing() {
        let cat = Categorical::new(vec![1i64, 8], Some(vec![1, 2]), None).unwrap();
        assert_eq!(cat.get(1), None);
        assert_eq!(cat.missing_count(), 1);
        assert!(cat.values_f64()[1].is_nan());
    }

    #[test]
    fn test_duplicate_category_rejected() {
        assert!(Categorical::new(vec![1i64], Some(vec![1, 1]), None).is_err());
    }

    #[test]
    fn test_rank_comparisons() {
        let cat = Categorical::new(
            vec![1i64, 3, 4, 5, 7],
            Some((1..=7).collect()),
            Some(CategoricalOrder::Ordered),
        )
        .unwrap();

        assert_eq!(cat.le(&3).unwrap(), vec![true, true, false, false, false]);
        assert_eq!(cat.ge(&5).unwrap(), vec![false, false, false, true, true]);
        assert!(cat.le(&9).is_err());
    }

    #[test]
    fn test_unordered_rejects_comparison() {
        let cat = Categorical::new(vec![1i64, 2], None, None).unwrap();
        assert!(matches!(cat.le(&1), Err(Error::InvalidOperation(_))));
    }

    #[test]
    fn test_filter_keeps_categories() {
        let cat = Categorical::new(vec![1i64, 2, 3], Some(vec![1, 2, 3]), None).unwrap();
        let filtered = cat.filter(&[true, false, true]).unwrap();
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.categories(), &[1, 2, 3]);
        assert!(cat.filter(&[true]).is_err());
    }
}
