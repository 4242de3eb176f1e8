//! Cart
//!
//! The cart engine: an ordered, id-unique collection of [`CartItem`]s that
//! writes itself through to a [`KeyValueStore`] on every change.

use rustc_hash::FxHashSet;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    catalog::{HealthPackage, LabTest},
    items::CartItem,
    pricing::{CartTotals, PricingError},
    storage::{KeyValueStore, StorageError},
};

/// Key the cart snapshot is stored under.
pub const CART_STORAGE_KEY: &str = "cart";

/// Errors from explicitly persisting the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// The store rejected the write.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The snapshot could not be encoded.
    #[error("failed to encode cart snapshot: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Reasons a persisted snapshot is thrown away on load.
#[derive(Debug, Error)]
enum SnapshotError {
    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("item {0:?} has inconsistent prices")]
    InconsistentItem(String),

    #[error(transparent)]
    Totals(#[from] PricingError),
}

/// Shopping cart
///
/// Created once at start-up with the store it persists to, then passed to
/// whatever needs it. Mutations never fail: if the write-through to the store
/// fails, the in-memory cart still reflects the change and the failure is
/// logged.
#[derive(Debug)]
pub struct Cart<S: KeyValueStore> {
    items: Vec<CartItem>,
    store: S,
}

impl<S: KeyValueStore> Cart<S> {
    /// Open the cart persisted in `store`.
    ///
    /// A missing, unreadable or malformed snapshot yields an empty cart.
    pub fn open(store: S) -> Self {
        let items = load_snapshot(&store);

        debug!(items = items.len(), "cart opened");

        Cart { items, store }
    }

    /// Add a test. Returns `false` without touching the cart if an item with
    /// the same id is already present or the cart total would overflow.
    pub fn add_test(&mut self, test: &LabTest) -> bool {
        if self.contains(&test.id) {
            debug!(id = %test.id, "test already in cart");
            return false;
        }

        self.push(CartItem::from_test(test))
    }

    /// Add a package, priced with its current discount. Returns `false`
    /// without touching the cart if an item with the same id is already
    /// present or the cart total would overflow.
    pub fn add_package(&mut self, package: &HealthPackage) -> bool {
        if self.contains(&package.id) {
            debug!(id = %package.id, "package already in cart");
            return false;
        }

        self.push(CartItem::from_package(package))
    }

    /// Remove the item with the given id. Returns `false` if it was not in the
    /// cart.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();

        self.items.retain(|item| item.id() != id);

        if self.items.len() == before {
            return false;
        }

        debug!(id, "removed cart item");
        self.persist();

        true
    }

    /// Empty the cart and delete its persisted snapshot.
    pub fn clear(&mut self) {
        self.items.clear();

        if let Err(err) = self.store.delete(CART_STORAGE_KEY) {
            warn!(error = %err, "failed to delete persisted cart");
        }

        debug!("cart cleared");
    }

    /// Original total, final total and discount across all items.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from_items(&self.items)
    }

    /// Number of line items. Tests inside packages are not counted.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether an item with this id is in the cart.
    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    /// Items in the order they were added.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Every test id the cart stands for.
    ///
    /// Standalone tests contribute their own id and packages contribute their
    /// included tests. A test that is both standalone and inside a package,
    /// or inside several packages, appears once.
    pub fn all_test_ids(&self) -> FxHashSet<String> {
        self.items
            .iter()
            .flat_map(CartItem::test_ids)
            .cloned()
            .collect()
    }

    /// Write the current snapshot to the store.
    ///
    /// # Errors
    ///
    /// Returns a [`CartError`] if the snapshot cannot be encoded or stored.
    pub fn flush(&mut self) -> Result<(), CartError> {
        let snapshot = serde_json::to_string(&self.items)?;

        self.store.set(CART_STORAGE_KEY, &snapshot)?;

        Ok(())
    }

    /// Consume the cart and hand back its store.
    pub fn into_store(self) -> S {
        self.store
    }

    fn push(&mut self, item: CartItem) -> bool {
        self.items.push(item);

        if let Err(err) = CartTotals::try_from_items(&self.items) {
            if let Some(item) = self.items.pop() {
                warn!(id = item.id(), error = %err, "refusing cart item");
            }

            return false;
        }

        if let Some(item) = self.items.last() {
            debug!(id = item.id(), kind = ?item.kind(), "added cart item");
        }

        self.persist();

        true
    }

    fn persist(&mut self) {
        if let Err(err) = self.flush() {
            warn!(error = %err, "failed to persist cart");
        }
    }
}

fn load_snapshot<S: KeyValueStore>(store: &S) -> Vec<CartItem> {
    let raw = match store.get(CART_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            warn!(error = %err, "failed to read persisted cart, starting empty");
            return Vec::new();
        }
    };

    match parse_snapshot(&raw) {
        Ok(items) => items,
        Err(err) => {
            warn!(error = %err, "discarding malformed persisted cart");
            Vec::new()
        }
    }
}

/// Decode a snapshot, keeping the first occurrence of any repeated id.
fn parse_snapshot(raw: &str) -> Result<Vec<CartItem>, SnapshotError> {
    let decoded: Vec<CartItem> = serde_json::from_str(raw)?;

    if let Some(bad) = decoded.iter().find(|item| !item.is_well_formed()) {
        return Err(SnapshotError::InconsistentItem(bad.id().to_string()));
    }

    let mut seen = FxHashSet::default();
    let items: Vec<CartItem> = decoded
        .into_iter()
        .filter(|item| seen.insert(item.id().to_string()))
        .collect();

    CartTotals::try_from_items(&items)?;

    Ok(items)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use crate::{pricing::DiscountPercentage, storage::MemoryStore};

    use super::*;

    fn test(id: &str, price: i64) -> LabTest {
        LabTest {
            id: id.to_string(),
            name: format!("Test {id}"),
            code: id.to_uppercase(),
            category: "Biochemistry".to_string(),
            price: Decimal::from(price),
            duration: "24 hours".to_string(),
            description: None,
            image_url: None,
        }
    }

    fn package(id: &str, price: i64, discount: u32, tests: &[&str]) -> TestResult<HealthPackage> {
        Ok(HealthPackage {
            id: id.to_string(),
            name: format!("Package {id}"),
            category: "Wellness".to_string(),
            description: None,
            test_ids: tests.iter().map(ToString::to_string).collect(),
            report_time: "48 hours".to_string(),
            original_price: Decimal::from(price),
            discount_percentage: Some(DiscountPercentage::new(discount)?),
            is_active: true,
            image_url: None,
        })
    }

    /// Store whose writes always fail.
    #[derive(Debug, Default)]
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }

        fn delete(&mut self, key: &str) -> Result<(), StorageError> {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }

    #[test]
    fn open_empty_store_gives_empty_cart() {
        let cart = Cart::open(MemoryStore::new());

        assert!(cart.is_empty(), "new cart should be empty");
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn add_test_appends_and_persists() -> TestResult {
        let mut cart = Cart::open(MemoryStore::new());

        assert!(cart.add_test(&test("t1", 300)), "first add changes cart");
        assert!(cart.contains("t1"), "t1 should be in cart");

        let store = cart.into_store();
        let raw = store.get(CART_STORAGE_KEY)?.ok_or("snapshot missing")?;

        assert!(raw.contains("\"t1\""), "snapshot should mention t1: {raw}");

        Ok(())
    }

    #[test]
    fn adding_same_id_twice_is_a_no_op() -> TestResult {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_test(&test("t1", 300));
        assert!(!cart.add_test(&test("t1", 999)), "second add is ignored");
        cart.add_package(&package("p1", 1000, 20, &["t1"])?);
        assert!(
            !cart.add_package(&package("p1", 1, 0, &[])?),
            "second package add is ignored"
        );

        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.totals().original_total, Decimal::from(1300));

        Ok(())
    }

    #[test]
    fn package_and_test_share_one_id_space() -> TestResult {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_test(&test("x", 100));
        assert!(!cart.add_package(&package("x", 500, 0, &[])?), "id taken");

        assert_eq!(cart.item_count(), 1);

        Ok(())
    }

    #[test]
    fn items_keep_insertion_order() -> TestResult {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_test(&test("b", 1));
        cart.add_package(&package("a", 10, 0, &[])?);
        cart.add_test(&test("c", 1));

        let ids: Vec<&str> = cart.items().iter().map(CartItem::id).collect();

        assert_eq!(ids, ["b", "a", "c"]);

        Ok(())
    }

    #[test]
    fn remove_item_drops_matching_item() {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_test(&test("t1", 100));
        cart.add_test(&test("t2", 200));

        assert!(cart.remove_item("t1"), "t1 removed");
        assert!(!cart.contains("t1"), "t1 gone");
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn remove_missing_id_changes_nothing() {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_test(&test("t1", 100));
        let before = cart.items().to_vec();

        assert!(!cart.remove_item("nope"), "nothing to remove");
        assert_eq!(cart.items(), before.as_slice());
    }

    #[test]
    fn clear_deletes_snapshot() -> TestResult {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_test(&test("t1", 100));
        cart.clear();

        assert_eq!(cart.item_count(), 0);

        let store = cart.into_store();

        assert_eq!(store.get(CART_STORAGE_KEY)?, None);
        assert_eq!(Cart::open(store).item_count(), 0);

        Ok(())
    }

    #[test]
    fn all_test_ids_deduplicates_across_items() -> TestResult {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_test(&test("t1", 100));
        cart.add_package(&package("p1", 1000, 20, &["t1", "t2"])?);

        let ids = cart.all_test_ids();

        assert_eq!(ids.len(), 2);
        assert!(ids.contains("t1"), "t1 present");
        assert!(ids.contains("t2"), "t2 present");

        Ok(())
    }

    #[test]
    fn all_test_ids_deduplicates_overlapping_packages() -> TestResult {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_package(&package("p1", 1000, 0, &["t1", "t2"])?);
        cart.add_package(&package("p2", 1000, 0, &["t2", "t3"])?);
        cart.add_package(&package("p3", 1000, 0, &[])?);

        assert_eq!(cart.all_test_ids().len(), 3);

        Ok(())
    }

    #[test]
    fn totals_track_discounts() -> TestResult {
        let mut cart = Cart::open(MemoryStore::new());

        cart.add_test(&test("t1", 250));
        cart.add_package(&package("p1", 1000, 20, &["t2"])?);

        let totals = cart.totals();

        assert_eq!(totals.original_total, Decimal::from(1250));
        assert_eq!(totals.final_total, Decimal::from(1050));
        assert_eq!(
            totals.discount_amount,
            totals.original_total - totals.final_total
        );

        Ok(())
    }

    #[test]
    fn failed_writes_keep_in_memory_state() {
        let mut cart = Cart::open(ReadOnlyStore);

        assert!(cart.add_test(&test("t1", 100)), "add still applies");
        assert!(cart.contains("t1"), "t1 kept in memory");

        cart.clear();
        assert!(cart.is_empty(), "clear still applies");
    }

    #[test]
    fn flush_surfaces_write_errors() {
        let mut cart = Cart::open(ReadOnlyStore);

        assert!(
            matches!(cart.flush(), Err(CartError::Storage(StorageError::InvalidKey(_)))),
            "flush should report the store error"
        );
    }

    #[test]
    fn parse_snapshot_keeps_first_duplicate() -> TestResult {
        let raw = r#"[
            {"id":"t1","type":"test","name":"First","originalPrice":"1","discountPercentage":0,"finalPrice":"1"},
            {"id":"t1","type":"test","name":"Second","originalPrice":"2","discountPercentage":0,"finalPrice":"2"}
        ]"#;

        let items = parse_snapshot(raw)?;

        assert_eq!(items.len(), 1);
        assert_eq!(items.first().map(CartItem::name), Some("First"));

        Ok(())
    }

    #[test]
    fn parse_snapshot_rejects_inconsistent_prices() {
        let raw = r#"[{"id":"t1","type":"test","name":"T","originalPrice":"1","discountPercentage":0,"finalPrice":"-1"}]"#;

        assert!(
            matches!(parse_snapshot(raw), Err(SnapshotError::InconsistentItem(id)) if id == "t1"),
            "negative final price should be rejected"
        );
    }

    /// Two items whose prices are each valid but whose sum exceeds `Decimal::MAX`.
    const OVERFLOWING_SNAPSHOT: &str = r#"[
        {"id":"a","type":"test","name":"A","originalPrice":"50000000000000000000000000000","discountPercentage":0,"finalPrice":"50000000000000000000000000000"},
        {"id":"b","type":"test","name":"B","originalPrice":"50000000000000000000000000000","discountPercentage":0,"finalPrice":"50000000000000000000000000000"}
    ]"#;

    #[test]
    fn parse_snapshot_rejects_overflowing_totals() {
        assert!(
            matches!(parse_snapshot(OVERFLOWING_SNAPSHOT), Err(SnapshotError::Totals(PricingError::Overflow))),
            "overflowing snapshot should be rejected"
        );
    }

    #[test]
    fn overflowing_snapshot_opens_empty() -> TestResult {
        let mut store = MemoryStore::new();
        store.set(CART_STORAGE_KEY, OVERFLOWING_SNAPSHOT)?;

        let cart = Cart::open(store);

        assert!(cart.is_empty(), "overflowing snapshot should open empty");
        assert_eq!(cart.totals(), CartTotals::default());

        Ok(())
    }

    #[test]
    fn add_refuses_item_that_would_overflow_totals() -> TestResult {
        let half_max: Decimal = "50000000000000000000000000000".parse()?;
        let mut cart = Cart::open(MemoryStore::new());

        assert!(cart.add_test(&LabTest { price: half_max, ..test("a", 0) }), "first fits");
        assert!(!cart.add_test(&LabTest { price: half_max, ..test("b", 0) }), "second overflows");

        assert_eq!(cart.item_count(), 1);
        assert!(!cart.contains("b"), "refused item is not kept");
        assert_eq!(cart.totals().original_total, half_max);

        let reloaded = Cart::open(cart.into_store());

        assert_eq!(reloaded.item_count(), 1);

        Ok(())
    }

    #[test]
    fn malformed_snapshots_open_empty() -> TestResult {
        for raw in [
            "not json",
            "{}",
            r#"{"items": []}"#,
            r#"[{"id": 1}]"#,
            r#"[{"id":"t","type":"test","name":"T","originalPrice":"1","discountPercentage":101,"finalPrice":"1"}]"#,
        ] {
            let mut store = MemoryStore::new();
            store.set(CART_STORAGE_KEY, raw)?;

            let cart = Cart::open(store);

            assert!(cart.is_empty(), "{raw:?} should open empty");
        }

        Ok(())
    }
}
