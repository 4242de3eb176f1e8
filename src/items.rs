//! Items
//!
//! A [`CartItem`] is a frozen snapshot of a catalog test or package taken at
//! the moment it was added to the cart. Prices on an item never change after
//! creation, even if the catalog does.

use std::slice;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{
    catalog::{HealthPackage, LabTest},
    pricing::{DiscountPercentage, final_price},
};

/// Inline capacity for a package's test ids.
pub type PackageTestIds = SmallVec<[String; 8]>;

/// Whether a line item is a single test or a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// A single diagnostic test
    Test,

    /// A bundle of tests
    Package,
}

/// One line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    id: String,

    #[serde(rename = "type")]
    kind: ItemKind,

    name: String,

    original_price: Decimal,

    discount_percentage: DiscountPercentage,

    final_price: Decimal,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    test_ids: Option<PackageTestIds>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl CartItem {
    /// Snapshot a single test. Tests are never discounted.
    pub fn from_test(test: &LabTest) -> Self {
        Self {
            id: test.id.clone(),
            kind: ItemKind::Test,
            name: test.name.clone(),
            original_price: test.price,
            discount_percentage: DiscountPercentage::NONE,
            final_price: test.price,
            test_ids: None,
            category: Some(test.category.clone()),
            image_url: test.image_url.clone(),
        }
    }

    /// Snapshot a package, pricing it with the package's current discount.
    pub fn from_package(package: &HealthPackage) -> Self {
        let discount = package.discount();

        Self {
            id: package.id.clone(),
            kind: ItemKind::Package,
            name: package.name.clone(),
            original_price: package.original_price,
            discount_percentage: discount,
            final_price: final_price(package.original_price, discount),
            test_ids: Some(package.test_ids.iter().cloned().collect()),
            category: Some(package.category.clone()),
            image_url: package.image_url.clone(),
        }
    }

    /// Catalog id of the underlying test or package
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Test or package
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Display name at the time of adding
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price before discount
    pub fn original_price(&self) -> Decimal {
        self.original_price
    }

    /// Discount applied when the item was added
    pub fn discount_percentage(&self) -> DiscountPercentage {
        self.discount_percentage
    }

    /// Price charged
    pub fn final_price(&self) -> Decimal {
        self.final_price
    }

    /// Display category
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Display image
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// The tests this line item stands for.
    ///
    /// A test item yields its own id. A package yields its included test ids,
    /// or nothing if it carries none.
    pub fn test_ids(&self) -> &[String] {
        match self.kind {
            ItemKind::Test => slice::from_ref(&self.id),
            ItemKind::Package => self.test_ids.as_deref().unwrap_or_default(),
        }
    }

    /// Whether the item is internally consistent.
    ///
    /// The id is non-empty, both prices are non-negative and the final price
    /// does not exceed the original price.
    pub fn is_well_formed(&self) -> bool {
        !self.id.is_empty()
            && self.original_price >= Decimal::ZERO
            && self.final_price >= Decimal::ZERO
            && self.final_price <= self.original_price
    }
}
