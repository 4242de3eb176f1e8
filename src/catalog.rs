//! Catalog
//!
//! Test and health package records as published by the lab catalog, and a
//! YAML-backed [`Catalog`] for looking them up by id.

use std::{fs, path::Path};

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pricing::DiscountPercentage;

/// Catalog loading errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading the catalog file
    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// The same id was used by more than one test or package
    #[error("Duplicate catalog id: {0}")]
    DuplicateId(String),

    /// A test or package was listed with a price below zero
    #[error("Negative price for catalog id: {0}")]
    NegativePrice(String),
}

/// A single diagnostic test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    /// Catalog id
    pub id: String,

    /// Display name
    pub name: String,

    /// Lab test code, e.g. `CBC`
    pub code: String,

    /// Department or grouping
    pub category: String,

    /// List price
    pub price: Decimal,

    /// Turnaround, free text (e.g. "24 hours")
    pub duration: String,

    /// Long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Product image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A bundle of tests sold at a discounted aggregate price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthPackage {
    /// Catalog id
    pub id: String,

    /// Display name
    pub name: String,

    /// Department or grouping
    pub category: String,

    /// Long description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ids of the tests included in this package
    #[serde(default)]
    pub test_ids: Vec<String>,

    /// Report turnaround, free text
    pub report_time: String,

    /// Pre-discount price
    pub original_price: Decimal,

    /// Package discount; absent means no discount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<DiscountPercentage>,

    /// Whether the package is currently on sale
    pub is_active: bool,

    /// Product image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl HealthPackage {
    /// The package discount, treating an absent value as no discount.
    pub fn discount(&self) -> DiscountPercentage {
        self.discount_percentage.unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    tests: Vec<LabTest>,

    #[serde(default)]
    packages: Vec<HealthPackage>,
}

/// Tests and packages available for sale.
#[derive(Debug, Default)]
pub struct Catalog {
    tests: Vec<LabTest>,
    packages: Vec<HealthPackage>,
    test_index: FxHashMap<String, usize>,
    package_index: FxHashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-parsed records.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if an id is used twice (tests and
    /// packages share one id space) or [`CatalogError::NegativePrice`] if any
    /// price is below zero.
    pub fn new(tests: Vec<LabTest>, packages: Vec<HealthPackage>) -> Result<Self, CatalogError> {
        let mut test_index = FxHashMap::default();
        let mut package_index = FxHashMap::default();

        for (idx, test) in tests.iter().enumerate() {
            if test.price < Decimal::ZERO {
                return Err(CatalogError::NegativePrice(test.id.clone()));
            }

            if test_index.insert(test.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateId(test.id.clone()));
            }
        }

        for (idx, package) in packages.iter().enumerate() {
            if package.original_price < Decimal::ZERO {
                return Err(CatalogError::NegativePrice(package.id.clone()));
            }

            if test_index.contains_key(&package.id)
                || package_index.insert(package.id.clone(), idx).is_some()
            {
                return Err(CatalogError::DuplicateId(package.id.clone()));
            }
        }

        Ok(Self {
            tests,
            packages,
            test_index,
            package_index,
        })
    }

    /// Parse a catalog from a YAML document with `tests` and `packages` lists.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML is invalid or the records fail validation.
    pub fn from_yaml_str(contents: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_norway::from_str(contents)?;

        Self::new(file.tests, file.packages)
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Look up a test by id.
    pub fn test(&self, id: &str) -> Option<&LabTest> {
        self.test_index
            .get(id)
            .and_then(|&idx| self.tests.get(idx))
    }

    /// Look up a package by id.
    pub fn package(&self, id: &str) -> Option<&HealthPackage> {
        self.package_index
            .get(id)
            .and_then(|&idx| self.packages.get(idx))
    }

    /// All tests, in catalog order.
    pub fn tests(&self) -> &[LabTest] {
        &self.tests
    }

    /// All packages, in catalog order.
    pub fn packages(&self) -> &[HealthPackage] {
        &self.packages
    }

    /// The catalog tests a package contains. Unknown ids are skipped.
    pub fn package_tests<'a>(
        &'a self,
        package: &'a HealthPackage,
    ) -> impl Iterator<Item = &'a LabTest> + 'a {
        package.test_ids.iter().filter_map(|id| self.test(id))
    }
}
