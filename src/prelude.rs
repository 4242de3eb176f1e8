//! Pathlab Cart prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{CART_STORAGE_KEY, Cart, CartError},
    catalog::{Catalog, CatalogError, HealthPackage, LabTest},
    checkout::{CheckoutError, CheckoutRequest, prepare_checkout},
    items::{CartItem, ItemKind},
    pricing::{CartTotals, DiscountPercentage, PricingError, final_price},
    session::{PatientId, SessionGate, StaticSession},
    storage::{FileStore, KeyValueStore, MemoryStore, StorageError},
    summary::{CartSummary, SummaryError, parse_currency},
};
