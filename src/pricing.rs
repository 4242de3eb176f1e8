//! Pricing
//!
//! Discount arithmetic and cart totals. Everything in here is pure: prices in,
//! prices out, no cart state involved.

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::items::CartItem;

/// Errors that can occur while building pricing values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    /// Discount percentage was above 100.
    #[error("discount percentage {0} is out of range (0-100)")]
    OutOfRange(u32),

    /// Summing prices overflowed.
    #[error("price total overflowed")]
    Overflow,
}

/// A whole-number discount percentage between 0 and 100 inclusive.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u32", into = "u32")]
pub struct DiscountPercentage(u8);

impl DiscountPercentage {
    /// No discount.
    pub const NONE: Self = Self(0);

    /// Create a discount percentage.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::OutOfRange`] when `value` is greater than 100.
    pub fn new(value: u32) -> Result<Self, PricingError> {
        match u8::try_from(value) {
            Ok(points) if points <= 100 => Ok(Self(points)),
            _ => Err(PricingError::OutOfRange(value)),
        }
    }

    /// Percent points, e.g. `20` for 20% off.
    pub fn points(self) -> u8 {
        self.0
    }

    /// Whether this is a zero discount.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// The discount as a fraction of the price (20% becomes 0.2).
    pub fn as_fraction(self) -> Percentage {
        Percentage::from(Decimal::from(self.0) / Decimal::ONE_HUNDRED)
    }
}

impl TryFrom<u32> for DiscountPercentage {
    type Error = PricingError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DiscountPercentage> for u32 {
    fn from(value: DiscountPercentage) -> Self {
        u32::from(value.0)
    }
}

impl fmt::Display for DiscountPercentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Calculates the price after applying a percentage discount.
///
/// Returns `original_price * (1 - discount / 100)` exactly. Amounts are only
/// rounded when they are displayed.
pub fn final_price(original_price: Decimal, discount: DiscountPercentage) -> Decimal {
    if discount.is_none() {
        return original_price;
    }

    original_price - discount.as_fraction() * original_price
}

/// Aggregate prices over a set of cart items.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of pre-discount prices.
    pub original_total: Decimal,

    /// Sum of prices actually charged.
    pub final_total: Decimal,

    /// `original_total - final_total`
    pub discount_amount: Decimal,
}

impl CartTotals {
    /// Sum the original and final prices of `items`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if either sum does not fit in a
    /// [`Decimal`].
    pub fn try_from_items(items: &[CartItem]) -> Result<Self, PricingError> {
        let (original_total, final_total) = items.iter().try_fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(original, fin), item| {
                Some((
                    original.checked_add(item.original_price())?,
                    fin.checked_add(item.final_price())?,
                ))
            },
        )
        .ok_or(PricingError::Overflow)?;

        Ok(Self::new(original_total, final_total))
    }

    /// Sum the original and final prices of `items`, saturating at
    /// [`Decimal::MAX`] instead of overflowing.
    pub fn from_items(items: &[CartItem]) -> Self {
        let (original_total, final_total) = items.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(original, fin), item| {
                (
                    original.saturating_add(item.original_price()),
                    fin.saturating_add(item.final_price()),
                )
            },
        );

        Self::new(original_total, final_total)
    }

    fn new(original_total: Decimal, final_total: Decimal) -> Self {
        Self {
            original_total,
            final_total,
            discount_amount: original_total.saturating_sub(final_total),
        }
    }

    /// Savings as a fraction of the original total.
    ///
    /// Zero when nothing is in the cart.
    pub fn savings_percent(&self) -> Percentage {
        let fraction = self
            .discount_amount
            .checked_div(self.original_total)
            .unwrap_or(Decimal::ZERO);

        Percentage::from(fraction)
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::catalog::{HealthPackage, LabTest};

    use super::*;

    fn test(id: &str, price: i64) -> LabTest {
        LabTest {
            id: id.to_string(),
            name: format!("Test {id}"),
            code: id.to_uppercase(),
            category: "Haematology".to_string(),
            price: Decimal::from(price),
            duration: "24 hours".to_string(),
            description: None,
            image_url: None,
        }
    }

    fn package(id: &str, price: i64, discount: u32) -> TestResult<HealthPackage> {
        Ok(HealthPackage {
            id: id.to_string(),
            name: format!("Package {id}"),
            category: "Wellness".to_string(),
            description: None,
            test_ids: vec!["t1".to_string()],
            report_time: "48 hours".to_string(),
            original_price: Decimal::from(price),
            discount_percentage: Some(DiscountPercentage::new(discount)?),
            is_active: true,
            image_url: None,
        })
    }

    #[test]
    fn discount_percentage_accepts_bounds() -> TestResult {
        assert_eq!(DiscountPercentage::new(0)?.points(), 0);
        assert_eq!(DiscountPercentage::new(100)?.points(), 100);

        Ok(())
    }

    #[test]
    fn discount_percentage_rejects_above_one_hundred() {
        assert_eq!(
            DiscountPercentage::new(101),
            Err(PricingError::OutOfRange(101))
        );
        assert_eq!(
            DiscountPercentage::new(u32::MAX),
            Err(PricingError::OutOfRange(u32::MAX))
        );
    }

    #[test]
    fn discount_percentage_deserialize_rejects_out_of_range() {
        let parsed: Result<DiscountPercentage, _> = serde_json::from_str("150");

        assert!(parsed.is_err(), "150% should not deserialize");
    }

    #[test]
    fn final_price_twenty_percent_off_one_thousand() -> TestResult {
        let price = final_price(Decimal::from(1000), DiscountPercentage::new(20)?);

        assert_eq!(price, Decimal::from(800));

        Ok(())
    }

    #[test]
    fn final_price_without_discount_is_unchanged() {
        let original = Decimal::new(45_050, 2);

        assert_eq!(final_price(original, DiscountPercentage::NONE), original);
    }

    #[test]
    fn final_price_full_discount_is_free() -> TestResult {
        let price = final_price(Decimal::from(999), DiscountPercentage::new(100)?);

        assert_eq!(price, Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn final_price_keeps_sub_minor_precision() -> TestResult {
        let original = Decimal::new(1005, 2);

        let price = final_price(original, DiscountPercentage::new(33)?);

        assert_eq!(price, Decimal::new(67_335, 4));
        assert_eq!(
            price,
            original * (Decimal::ONE - Decimal::from(33) / Decimal::ONE_HUNDRED)
        );
        assert_eq!(
            final_price(Decimal::new(999, 2), DiscountPercentage::new(15)?),
            Decimal::new(84_915, 4)
        );

        Ok(())
    }

    #[test]
    fn totals_of_empty_cart_are_zero() {
        let totals = CartTotals::from_items(&[]);

        assert_eq!(totals, CartTotals::default());
        assert_eq!(totals.savings_percent(), Percentage::from(Decimal::ZERO));
    }

    #[test]
    fn totals_sum_original_and_final_prices() -> TestResult {
        let items = [
            CartItem::from_test(&test("t1", 300)),
            CartItem::from_package(&package("p1", 1000, 20)?),
        ];

        let totals = CartTotals::from_items(&items);

        assert_eq!(totals.original_total, Decimal::from(1300));
        assert_eq!(totals.final_total, Decimal::from(1100));
        assert_eq!(totals.discount_amount, Decimal::from(200));
        assert!(totals.final_total <= totals.original_total, "final above original");

        Ok(())
    }

    fn priced_test(id: &str, price: Decimal) -> LabTest {
        LabTest {
            price,
            ..test(id, 0)
        }
    }

    #[test]
    fn try_from_items_reports_overflow() -> TestResult {
        let half_max: Decimal = "50000000000000000000000000000".parse()?;
        let items = [
            CartItem::from_test(&priced_test("a", half_max)),
            CartItem::from_test(&priced_test("b", half_max)),
        ];

        assert_eq!(CartTotals::try_from_items(&items), Err(PricingError::Overflow));

        let totals = CartTotals::from_items(&items);

        assert_eq!(totals.original_total, Decimal::MAX);
        assert_eq!(totals.final_total, Decimal::MAX);
        assert_eq!(totals.discount_amount, Decimal::ZERO);

        Ok(())
    }

    #[test]
    fn try_from_items_matches_from_items() -> TestResult {
        let items = [
            CartItem::from_test(&test("t1", 300)),
            CartItem::from_package(&package("p1", 1000, 20)?),
        ];

        assert_eq!(CartTotals::try_from_items(&items)?, CartTotals::from_items(&items));

        Ok(())
    }

    #[test]
    fn savings_percent_is_fraction_of_original() -> TestResult {
        let items = [CartItem::from_package(&package("p1", 1000, 25)?)];

        let totals = CartTotals::from_items(&items);

        assert_eq!(totals.savings_percent(), Percentage::from(Decimal::new(25, 2)));

        Ok(())
    }
}
