//! GSS extract layout
//!
//! Column positions, names, non-response codes and category scales for the
//! five survey items used by the analysis. The codebook ships with the
//! survey export; these constants mirror it.

use serde::{Deserialize, Serialize};

pub const HOW_FUNDAMENTALIST: &str = "how_fundamentalist";
pub const SHOULD_FUND_EDUCATION: &str = "should_fund_education";
pub const RESP_AGE: &str = "resp_age";
pub const TOTAL_FAMILY_INCOME: &str = "total_family_income";
pub const HOW_CONSERVATIVE: &str = "how_conservative";

/// Description of one selected column of the raw data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Column name assigned after loading
    pub name: String,
    /// Zero-based field position in each whitespace-separated line
    pub position: usize,
    /// Codes meaning "no answer", "don't know" or "not applicable"
    pub sentinels: Vec<i64>,
    /// Ordered category list for scale items, `None` for numeric items
    pub categories: Option<Vec<i64>>,
}

impl VariableSpec {
    pub fn numeric(name: &str, position: usize, sentinels: &[i64]) -> Self {
        VariableSpec {
            name: name.to_string(),
            position,
            sentinels: sentinels.to_vec(),
            categories: None,
        }
    }

    pub fn ordinal(name: &str, position: usize, sentinels: &[i64], categories: &[i64]) -> Self {
        VariableSpec {
            name: name.to_string(),
            position,
            sentinels: sentinels.to_vec(),
            categories: Some(categories.to_vec()),
        }
    }

    /// Whether `value` is one of this column's non-response codes
    pub fn is_sentinel(&self, value: f64) -> bool {
        self.sentinels.iter().any(|&code| code as f64 == value)
    }

    pub fn is_categorical(&self) -> bool {
        self.categories.is_some()
    }
}

/// The five items of the January 2023 GSS extract, in table order
pub fn gss_schema() -> Vec<VariableSpec> {
    vec![
        VariableSpec::ordinal(HOW_FUNDAMENTALIST, 7, &[9], &[3, 2, 1]),
        VariableSpec::ordinal(SHOULD_FUND_EDUCATION, 13, &[0, 8, 9], &[3, 2, 1]),
        VariableSpec::numeric(RESP_AGE, 20, &[89, 98, 99]),
        VariableSpec::ordinal(
            TOTAL_FAMILY_INCOME,
            23,
            &[0, 13, 98, 99],
            &[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12],
        ),
        VariableSpec::ordinal(HOW_CONSERVATIVE, 24, &[0, 8, 9], &[1, 2, 3, 4, 5, 6, 7]),
    ]
}

/// Predictors used for the conservatism regressions, in fitting order
pub const REGRESSION_PREDICTORS: [&str; 4] = [
    HOW_FUNDAMENTALIST,
    RESP_AGE,
    TOTAL_FAMILY_INCOME,
    SHOULD_FUND_EDUCATION,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_in_position_order() {
        let schema = gss_schema();
        let positions: Vec<usize> = schema.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![7, 13, 20, 23, 24]);
        assert_eq!(schema.iter().filter(|s| s.is_categorical()).count(), 4);
    }

    #[test]
    fn test_sentinel_lookup() {
        let schema = gss_schema();
        let income = schema.iter().find(|s| s.name == TOTAL_FAMILY_INCOME).unwrap();
        assert!(income.is_sentinel(98.0));
        assert!(income.is_sentinel(0.0));
        assert!(!income.is_sentinel(12.0));
    }
}
