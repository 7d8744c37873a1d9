//! Coordinate Validator
//!
//! Checks every position of a coordinate against the membership oracle. All
//! positions are checked, so callers learn every bad element at once.

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::backend::DimensionMembershipOracle;
use crate::error::{Result, Tm1Error};
use crate::model::CoordinateTuple;

/// One coordinate position naming an element its dimension does not have.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionFailure {
    pub position: usize,
    pub dimension: String,
    pub element: String,
}

impl fmt::Display for PositionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "position {}: '{}' is not an element of '{}'", self.position, self.element, self.dimension)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub failures: Vec<PositionFailure>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct CoordinateValidator {
    oracle: Arc<dyn DimensionMembershipOracle>,
    concurrency: usize,
}

impl CoordinateValidator {
    pub fn new(oracle: Arc<dyn DimensionMembershipOracle>, concurrency: usize) -> Self {
        Self {
            oracle,
            concurrency: concurrency.max(1),
        }
    }

    /// Validate one coordinate against the cube's ordered dimensions.
    pub async fn validate(&self, dimensions: &[String], coordinate: &CoordinateTuple) -> Result<ValidationResult> {
        let mut results = self.validate_many(dimensions, std::iter::once(coordinate)).await?;
        Ok(results.pop().unwrap_or_default())
    }

    /// Validate many coordinates for the same cube.
    ///
    /// Each distinct (position, element) pair is looked up once, no matter how
    /// many coordinates share it. Results are returned in input order.
    pub async fn validate_many<'a, I>(&self, dimensions: &[String], coordinates: I) -> Result<Vec<ValidationResult>>
    where
        I: IntoIterator<Item = &'a CoordinateTuple>,
    {
        let coordinates: Vec<&CoordinateTuple> = coordinates.into_iter().collect();
        for coordinate in &coordinates {
            if coordinate.len() != dimensions.len() {
                return Err(Tm1Error::ShapeMismatch {
                    expected: dimensions.len(),
                    actual: coordinate.len(),
                });
            }
        }

        let pairs: Vec<(usize, String)> = {
            let mut seen: HashSet<(usize, &str)> = HashSet::new();
            coordinates
                .iter()
                .flat_map(|coordinate| coordinate.iter().enumerate())
                .filter(|pair| seen.insert(*pair))
                .map(|(position, element)| (position, element.to_string()))
                .collect()
        };
        debug!(
            "Validating {} coordinate(s) with {} distinct membership check(s)",
            coordinates.len(),
            pairs.len()
        );

        let membership: HashMap<(usize, String), bool> = stream::iter(pairs)
            .map(|(position, element)| {
                let oracle = Arc::clone(&self.oracle);
                let dimension = dimensions[position].clone();
                async move {
                    let exists = oracle.element_exists(&dimension, &element).await?;
                    Ok::<_, Tm1Error>(((position, element), exists))
                }
            })
            .buffer_unordered(self.concurrency)
            .try_collect()
            .await?;

        let results = coordinates
            .iter()
            .map(|coordinate| ValidationResult {
                failures: coordinate
                    .iter()
                    .enumerate()
                    .filter(|(position, element)| {
                        !membership
                            .get(&(*position, element.to_string()))
                            .copied()
                            .unwrap_or(false)
                    })
                    .map(|(position, element)| PositionFailure {
                        position,
                        dimension: dimensions[position].clone(),
                        element: element.to_string(),
                    })
                    .collect(),
            })
            .collect();

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SetOracle {
        members: HashMap<String, Vec<String>>,
        calls: AtomicUsize,
    }

    impl SetOracle {
        fn new(dims: &[(&str, &[&str])]) -> Self {
            Self {
                members: dims
                    .iter()
                    .map(|(d, els)| (d.to_string(), els.iter().map(|e| e.to_string()).collect()))
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DimensionMembershipOracle for SetOracle {
        async fn element_exists(&self, dimension: &str, element: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.members
                .get(dimension)
                .map(|els| els.iter().any(|e| e == element))
                .ok_or_else(|| Tm1Error::not_found("dimension", dimension))
        }
    }

    fn sales_dims() -> Vec<String> {
        vec!["Month".to_string(), "City".to_string(), "Measure".to_string()]
    }

    fn sales_oracle() -> Arc<SetOracle> {
        Arc::new(SetOracle::new(&[
            ("Month", &["Jan", "Feb"]),
            ("City", &["Tokyo", "Cairo"]),
            ("Measure", &["Revenue"]),
        ]))
    }

    #[tokio::test]
    async fn test_valid_coordinate() {
        let validator = CoordinateValidator::new(sales_oracle(), 4);
        let coord = CoordinateTuple::new(["Jan", "Tokyo", "Revenue"]).unwrap();
        assert!(validator.validate(&sales_dims(), &coord).await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_reports_every_failing_position() {
        let validator = CoordinateValidator::new(sales_oracle(), 4);
        let coord = CoordinateTuple::new(["Mar", "Berlin", "Revenue"]).unwrap();
        let result = validator.validate(&sales_dims(), &coord).await.unwrap();

        assert!(!result.is_valid());
        let names: Vec<_> = result.failures.iter().map(|f| (f.dimension.as_str(), f.element.as_str())).collect();
        assert_eq!(names, vec![("Month", "Mar"), ("City", "Berlin")]);
    }

    #[tokio::test]
    async fn test_swapped_order_is_invalid() {
        let validator = CoordinateValidator::new(sales_oracle(), 4);
        let coord = CoordinateTuple::new(["Tokyo", "Jan", "Revenue"]).unwrap();
        let result = validator.validate(&sales_dims(), &coord).await.unwrap();
        assert_eq!(result.failures.len(), 2);
    }

    #[tokio::test]
    async fn test_shape_mismatch() {
        let validator = CoordinateValidator::new(sales_oracle(), 4);
        let coord = CoordinateTuple::new(["Jan", "Tokyo"]).unwrap();
        let err = validator.validate(&sales_dims(), &coord).await.unwrap_err();
        assert!(matches!(err, Tm1Error::ShapeMismatch { expected: 3, actual: 2 }));
    }

    #[tokio::test]
    async fn test_empty_coordinate_on_zero_dimensions() {
        let validator = CoordinateValidator::new(sales_oracle(), 4);
        let coord = CoordinateTuple::new(Vec::<String>::new()).unwrap();
        assert!(validator.validate(&[], &coord).await.unwrap().is_valid());
    }

    #[tokio::test]
    async fn test_missing_dimension_propagates() {
        let validator = CoordinateValidator::new(sales_oracle(), 4);
        let dims = vec!["Month".to_string(), "Region".to_string()];
        let coord = CoordinateTuple::new(["Jan", "North"]).unwrap();
        let err = validator.validate(&dims, &coord).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_many_deduplicates_lookups() {
        let oracle = sales_oracle();
        let validator = CoordinateValidator::new(oracle.clone(), 2);
        let coords = vec![
            CoordinateTuple::new(["Jan", "Tokyo", "Revenue"]).unwrap(),
            CoordinateTuple::new(["Feb", "Tokyo", "Revenue"]).unwrap(),
            CoordinateTuple::new(["Jan", "Cairo", "Revenue"]).unwrap(),
        ];
        let results = validator.validate_many(&sales_dims(), &coords).await.unwrap();

        assert!(results.iter().all(ValidationResult::is_valid));
        // Jan, Feb, Tokyo, Cairo, Revenue
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 5);
    }
}
