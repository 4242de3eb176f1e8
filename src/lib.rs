//! Pathlab Cart
//!
//! Cart pricing and reconciliation for a diagnostic pathology lab storefront.
//!
//! A [`cart::Cart`] holds frozen snapshots of catalog tests and health
//! packages, prices packages with their discount at the moment they are added,
//! persists itself through a pluggable [`storage::KeyValueStore`] and resolves
//! its contents into the de-duplicated set of tests a booking needs.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod items;
pub mod prelude;
pub mod pricing;
pub mod session;
pub mod storage;
pub mod summary;
