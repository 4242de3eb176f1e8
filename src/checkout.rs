//! Checkout
//!
//! Turns a cart into the request handed to the booking service. Preparing a
//! checkout reads the cart but never changes it.

use serde::Serialize;
use thiserror::Error;

use crate::{
    cart::Cart,
    pricing::CartTotals,
    session::{PatientId, SessionGate},
    storage::KeyValueStore,
};

/// Reasons a checkout cannot be started.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    /// Nobody is logged in.
    #[error("a patient must be logged in to check out")]
    NotAuthenticated,

    /// There is nothing to book.
    #[error("cart is empty")]
    EmptyCart,
}

/// Booking request built from the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Patient the booking is for
    pub patient_id: PatientId,

    /// De-duplicated test ids to collect samples for, sorted
    pub test_ids: Vec<String>,

    /// Cart line item ids, in cart order
    pub item_ids: Vec<String>,

    /// Cart totals at the time of checkout
    pub totals: CartTotals,
}

/// Build a [`CheckoutRequest`] for the logged-in patient.
///
/// # Errors
///
/// - [`CheckoutError::NotAuthenticated`]: no patient is logged in.
/// - [`CheckoutError::EmptyCart`]: the cart has no items.
pub fn prepare_checkout<S, G>(cart: &Cart<S>, session: &G) -> Result<CheckoutRequest, CheckoutError>
where
    S: KeyValueStore,
    G: SessionGate + ?Sized,
{
    let patient_id = session
        .current_patient()
        .ok_or(CheckoutError::NotAuthenticated)?
        .clone();

    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut test_ids: Vec<String> = cart.all_test_ids().into_iter().collect();
    test_ids.sort_unstable();

    Ok(CheckoutRequest {
        patient_id,
        test_ids,
        item_ids: cart.items().iter().map(|item| item.id().to_string()).collect(),
        totals: cart.totals(),
    })
}
