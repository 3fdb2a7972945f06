//! Persistence boundary.
//!
//! Everything above this module talks to a [`Store`]; the diesel-backed
//! [`PgStore`] is what the binaries use, [`MemoryStore`] keeps the same
//! uniqueness and referential-integrity rules in process.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

use crate::insertables::{NewAccount, NewOrder, NewOrderLine, NewProduct, NewProfile};
use crate::models::{
    Account, Category, LineDetails, Manufacturer, Order, OrderLine, OrderSummary, PickupPoint,
    Product, ProductDetails, Profile, Supplier,
};
use rust_decimal::Decimal;
use strum::Display;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Entity {
    Category,
    Manufacturer,
    Supplier,
    Product,
    Account,
    Profile,
    PickupPoint,
    Order,
    OrderLine,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} {id} is referenced by other records and cannot be deleted")]
    Protected { entity: Entity, id: i32 },
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i32 },
    #[error("{entity} `{key}` already exists")]
    Conflict { entity: Entity, key: String },
    #[error("referenced record does not exist: {0}")]
    MissingReference(String),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("cannot connect to database: {0}")]
    Connection(#[from] diesel::ConnectionError),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

/// Catalog filter. Every field is optional; an empty query lists everything by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductQuery {
    /// Case-insensitive substring over name, description, manufacturer, supplier and article.
    pub search: Option<String>,
    pub supplier_id: Option<i32>,
    /// Ascending stock instead of name order.
    pub sort_by_stock: bool,
}

pub trait Store {
    /// Returns the pickup point and whether it was created by this call.
    fn get_or_create_pickup_point(
        &mut self,
        address: &str,
    ) -> Result<(PickupPoint, bool), StoreError>;

    /// All pickup points in insertion (id) order.
    fn pickup_points(&mut self) -> Result<Vec<PickupPoint>, StoreError>;

    fn get_or_create_category(&mut self, name: &str) -> Result<Category, StoreError>;
    fn get_or_create_manufacturer(&mut self, name: &str) -> Result<Manufacturer, StoreError>;
    fn get_or_create_supplier(&mut self, name: &str) -> Result<Supplier, StoreError>;
    fn suppliers(&mut self) -> Result<Vec<Supplier>, StoreError>;

    fn product(&mut self, id: i32) -> Result<Option<Product>, StoreError>;
    fn product_by_article(&mut self, article: &str) -> Result<Option<Product>, StoreError>;
    fn create_product(&mut self, product: &NewProduct) -> Result<Product, StoreError>;
    fn update_product(&mut self, id: i32, product: &NewProduct) -> Result<Product, StoreError>;
    fn product_details(&mut self, query: &ProductQuery)
        -> Result<Vec<ProductDetails>, StoreError>;

    fn account_by_username(&mut self, username: &str) -> Result<Option<Account>, StoreError>;
    /// First account (lowest id) whose profile carries exactly this full name.
    fn account_by_full_name(&mut self, full_name: &str) -> Result<Option<Account>, StoreError>;
    fn create_account(&mut self, account: &NewAccount) -> Result<Account, StoreError>;
    fn profile(&mut self, account_id: i32) -> Result<Option<Profile>, StoreError>;
    /// Keyed by account; an existing profile is returned unchanged.
    fn get_or_create_profile(&mut self, profile: &NewProfile)
        -> Result<(Profile, bool), StoreError>;

    /// Keyed by (account, order date); an existing order is returned unchanged.
    fn get_or_create_order(&mut self, order: &NewOrder) -> Result<(Order, bool), StoreError>;
    fn set_order_total(&mut self, order_id: i32, total: Decimal) -> Result<Order, StoreError>;
    fn create_order_line(&mut self, line: &NewOrderLine) -> Result<OrderLine, StoreError>;
    /// Orders newest first, with the customer's username and the pickup address.
    fn order_summaries(&mut self) -> Result<Vec<OrderSummary>, StoreError>;
    fn order_lines(&mut self, order_ids: &[i32]) -> Result<Vec<LineDetails>, StoreError>;

    fn count(&mut self, entity: Entity) -> Result<i64, StoreError>;

    /// Fails with [`StoreError::Protected`] while dependents reference the row.
    /// Deleting an account removes its profile with it.
    fn delete(&mut self, entity: Entity, id: i32) -> Result<(), StoreError>;
}
