//! Model formulas of the form `response ~ a + b`

use std::fmt;
use std::str::FromStr;

use crate::core::error::{Error, Result};
use crate::dataframe::SurveyFrame;

/// Name given to the constant column of every design matrix
pub const INTERCEPT: &str = "Intercept";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub response: String,
    pub predictors: Vec<String>,
}

/// Response vector and row-major design matrix built from a frame
#[derive(Debug, Clone)]
pub struct Design {
    pub response: Vec<f64>,
    pub matrix: Vec<Vec<f64>>,
    /// Column labels, `Intercept` first
    pub names: Vec<String>,
}

impl Formula {
    pub fn parse(formula: &str) -> Result<Self> {
        let (lhs, rhs) = formula
            .split_once('~')
            .ok_or_else(|| Error::Format(format!("Formula '{}' has no '~'", formula)))?;

        let response = lhs.trim();
        if response.is_empty() || !is_identifier(response) {
            return Err(Error::Format(format!(
                "Formula '{}' needs a single response variable",
                formula
            )));
        }

        let mut predictors: Vec<String> = Vec::new();
        for term in rhs.split('+') {
            let term = term.trim();
            if term.is_empty() || !is_identifier(term) {
                return Err(Error::Format(format!(
                    "Invalid term '{}' in formula '{}'",
                    term, formula
                )));
            }
            if term == "1" {
                continue;
            }
            if !predictors.iter().any(|p| p == term) {
                predictors.push(term.to_string());
            }
        }

        if predictors.is_empty() {
            return Err(Error::Format(format!(
                "Formula '{}' has no predictors",
                formula
            )));
        }

        Ok(Formula {
            response: response.to_string(),
            predictors,
        })
    }

    /// Build the response and design matrix; missing values are an error
    pub fn design(&self, df: &SurveyFrame) -> Result<Design> {
        let response = df.numeric_values(&self.response)?;
        let columns = self
            .predictors
            .iter()
            .map(|name| df.numeric_values(name))
            .collect::<Result<Vec<_>>>()?;

        let n = df.row_count();
        let mut matrix = Vec::with_capacity(n);
        for row in 0..n {
            let mut values = Vec::with_capacity(columns.len() + 1);
            values.push(1.0);
            values.extend(columns.iter().map(|c| c[row]));
            matrix.push(values);
        }

        if response.iter().any(|v| !v.is_finite())
            || matrix.iter().flatten().any(|v| !v.is_finite())
        {
            return Err(Error::InvalidValue(format!(
                "Missing values in variables of '{}'",
                self
            )));
        }

        let mut names = vec![INTERCEPT.to_string()];
        names.extend(self.predictors.iter().cloned());

        Ok(Design {
            response,
            matrix,
            names,
        })
    }
}

fn is_identifier(term: &str) -> bool {
    term == "1" || term.chars().all(|c| c.is_alphanumeric() || c == '_')
}

impl FromStr for Formula {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Formula::parse(s)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.response, self.predictors.join(" + "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataframe::ColumnData;

    #[test]
    fn test_parse() {
        let f: Formula = "y ~ a + b_2 + 1 + a".parse().unwrap();
        assert_eq!(f.response, "y");
        assert_eq!(f.predictors, vec!["a", "b_2"]);
        assert_eq!(f.to_string(), "y ~ a + b_2");
    }

    #[test]
    fn test_malformed() {
        for bad in ["y a", "~ a", "y ~", "y ~ a +", "y ~ a * b", "y z ~ a", "y ~ 1"] {
            assert!(
                matches!(Formula::parse(bad), Err(Error::Format(_))),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_design() {
        let mut df = SurveyFrame::new();
        df.add_column("y", ColumnData::Numeric(vec![1.0, 2.0, 3.0]))
            .unwrap();
        df.add_column("x", ColumnData::Numeric(vec![3.0, 2.0, 1.0]))
            .unwrap();
        df.recode_ordered("x", &[3, 2, 1]).unwrap();

        let design = Formula::parse("y ~ x").unwrap().design(&df).unwrap();
        assert_eq!(design.names, vec!["Intercept", "x"]);
        assert_eq!(design.response, vec![1.0, 2.0, 3.0]);
        assert_eq!(design.matrix[0], vec![1.0, 3.0]);
        assert_eq!(design.matrix[2], vec![1.0, 1.0]);

        let missing = Formula::parse("y ~ nope").unwrap().design(&df);
        assert!(matches!(missing, Err(Error::ColumnNotFound(_))));
    }
}
