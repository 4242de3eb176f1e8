//! Summary
//!
//! Renders the cart as a table of line items followed by a totals block.

use std::io;

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{Alignment, Style, Theme, object::Columns},
};
use thiserror::Error;

use crate::{
    cart::Cart,
    items::{CartItem, ItemKind},
    pricing::CartTotals,
    storage::KeyValueStore,
};

/// Errors that can occur when rendering a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Currency code is not one the lab prices in.
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Amount too large to express in minor units.
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(Decimal),

    /// Writing the output failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Resolve a supported ISO currency code.
///
/// # Errors
///
/// Returns [`SummaryError::UnknownCurrency`] for anything other than `INR`,
/// `GBP`, `USD` or `EUR`.
pub fn parse_currency(code: &str) -> Result<&'static Currency, SummaryError> {
    match code.to_ascii_uppercase().as_str() {
        "INR" => Ok(iso::INR),
        "GBP" => Ok(iso::GBP),
        "USD" => Ok(iso::USD),
        "EUR" => Ok(iso::EUR),
        _ => Err(SummaryError::UnknownCurrency(code.to_string())),
    }
}

/// Printable view of a cart.
#[derive(Debug)]
pub struct CartSummary<'c> {
    items: &'c [CartItem],
    totals: CartTotals,
    currency: &'static Currency,
}

impl<'c> CartSummary<'c> {
    /// Summarise `cart`, pricing amounts in `currency`.
    pub fn new<S: KeyValueStore>(cart: &'c Cart<S>, currency: &'static Currency) -> Self {
        Self {
            items: cart.items(),
            totals: cart.totals(),
            currency,
        }
    }

    /// Write the item table and totals.
    ///
    /// # Errors
    ///
    /// Returns an error if an amount cannot be formatted or the output cannot
    /// be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), SummaryError> {
        if self.items.is_empty() {
            writeln!(out, "Cart is empty")?;
            return Ok(());
        }

        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Type", "Price", "Discount", "Final Price"]);

        for (idx, item) in self.items.iter().enumerate() {
            builder.push_record(self.item_row(idx, item)?);
        }

        let mut table = builder.build();
        let mut theme = Theme::from(Style::modern_rounded());

        theme.remove_horizontal_lines();
        theme.insert_horizontal_line(
            1,
            HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
        );

        table.with(theme);
        table.modify(Columns::new(3..6), Alignment::right());

        writeln!(out, "\n{table}")?;

        self.write_totals(&mut out)
    }

    fn item_row(&self, idx: usize, item: &CartItem) -> Result<[String; 6], SummaryError> {
        let kind = match item.kind() {
            ItemKind::Test => "Test".to_string(),
            ItemKind::Package => format!("Package ({} tests)", item.test_ids().len()),
        };

        let discount = if item.discount_percentage().is_none() {
            String::new()
        } else {
            item.discount_percentage().to_string()
        };

        Ok([
            format!("#{:<3}", idx + 1),
            item.name().to_string(),
            kind,
            self.money(item.original_price())?,
            discount,
            self.money(item.final_price())?,
        ])
    }

    fn write_totals(&self, out: &mut impl io::Write) -> Result<(), SummaryError> {
        let savings_points = (self.totals.savings_percent() * Decimal::ONE_HUNDRED).round_dp(2);

        let rows = [
            ("Subtotal:", self.money(self.totals.original_total)?),
            (
                "Savings:",
                format!(
                    "({savings_points:.2}%) {}",
                    self.money(self.totals.discount_amount)?
                ),
            ),
            ("Total:", self.money(self.totals.final_total)?),
        ];

        let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        let value_width = rows
            .iter()
            .map(|(_, value)| value.chars().count())
            .max()
            .unwrap_or(0);

        for (label, value) in rows {
            writeln!(out, " {label:>label_width$}  {value:>value_width$}")?;
        }

        writeln!(out)?;

        Ok(())
    }

    fn money(&self, amount: Decimal) -> Result<String, SummaryError> {
        let minor = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|value| value.round_dp(0).to_i64())
            .ok_or(SummaryError::AmountOutOfRange(amount))?;

        Ok(Money::from_minor(minor, self.currency).to_string())
    }
}
