use crate::schema::{
    accounts, categories, manufacturers, order_lines, orders, pickup_points, products, profiles,
    suppliers,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Access level attached to a profile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Guest,
    Client,
    Manager,
    Admin,
}

impl Role {
    /// Managers and admins see the full catalog tooling and the order list.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Manager | Role::Admin)
    }

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    New,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = categories)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = manufacturers)]
pub struct Manufacturer {
    pub id: i32,
    pub name: String,
    pub country: String,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = suppliers)]
pub struct Supplier {
    pub id: i32,
    pub name: String,
    pub contact_info: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Clone, Debug, PartialEq)]
#[diesel(belongs_to(Category))]
#[diesel(belongs_to(Manufacturer))]
#[diesel(belongs_to(Supplier))]
#[diesel(table_name = products)]
pub struct Product {
    pub id: i32,
    pub article: String,
    pub name: String,
    pub unit: String,
    pub category_id: i32,
    pub manufacturer_id: i32,
    pub supplier_id: i32,
    pub description: String,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub discount: i32,
    pub image: Option<String>,
}

impl Product {
    pub fn discounted_price(&self) -> Decimal {
        discounted_price(self.price, self.discount)
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock_quantity == 0
    }
}

/// `price * (100 - discount) / 100` for a positive discount, otherwise `price`.
pub fn discounted_price(price: Decimal, discount: i32) -> Decimal {
    if discount > 0 {
        price * Decimal::from(100 - discount) / Decimal::ONE_HUNDRED
    } else {
        price
    }
}

/// Rounds an amount to whole cents, the precision of every money column.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Money columns are `NUMERIC(10, 2)`: eight integer digits.
const MONEY_LIMIT: i64 = 100_000_000;

/// Whether `amount`, once rounded to cents, fits a money column.
pub fn fits_money_column(amount: Decimal) -> bool {
    round_currency(amount).abs() < Decimal::from(MONEY_LIMIT)
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq)]
#[diesel(table_name = accounts)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Clone, Debug, PartialEq)]
#[diesel(belongs_to(Account))]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: i32,
    pub account_id: i32,
    pub role: String,
    pub full_name: String,
}

impl Profile {
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Client)
    }
}

#[derive(Queryable, Selectable, Identifiable, Serialize, Clone, Debug, PartialEq, Eq)]
#[diesel(table_name = pickup_points)]
pub struct PickupPoint {
    pub id: i32,
    pub address: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Clone, Debug, PartialEq)]
#[diesel(belongs_to(Account))]
#[diesel(belongs_to(PickupPoint))]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: i32,
    pub account_id: i32,
    pub order_date: NaiveDateTime,
    pub delivery_date: Option<NaiveDate>,
    pub pickup_point_id: i32,
    pub pickup_code: String,
    pub status: String,
    pub total_amount: Decimal,
}

impl Order {
    pub fn status(&self) -> OrderStatus {
        self.status.parse().unwrap_or(OrderStatus::New)
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Serialize, Clone, Debug, PartialEq)]
#[diesel(belongs_to(Order))]
#[diesel(belongs_to(Product))]
#[diesel(table_name = order_lines)]
pub struct OrderLine {
    pub id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}

impl OrderLine {
    pub fn subtotal(&self) -> Decimal {
        self.price_at_purchase * Decimal::from(self.quantity)
    }
}

/// Catalog row: a product together with the names of what it references.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub category: String,
    pub manufacturer: String,
    pub supplier: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub customer: String,
    pub pickup_address: String,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct LineDetails {
    #[serde(flatten)]
    pub line: OrderLine,
    pub product_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn discount_applies_exactly() {
        assert_eq!(discounted_price(dec!(100.00), 25), dec!(75.00));
        assert_eq!(discounted_price(dec!(19.99), 0), dec!(19.99));
        assert_eq!(discounted_price(dec!(10), 100), Decimal::ZERO);
    }

    #[test]
    fn currency_rounds_half_away_from_zero() {
        assert_eq!(round_currency(discounted_price(dec!(99.99), 15)), dec!(84.99));
        assert_eq!(round_currency(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn money_columns_hold_eight_integer_digits() {
        assert!(fits_money_column(dec!(99999999.99)));
        assert!(!fits_money_column(dec!(99999999.995)));
        assert!(!fits_money_column(dec!(100000000)));
    }

    #[test]
    fn unknown_stored_codes_fall_back() {
        let profile = Profile {
            id: 1,
            account_id: 1,
            role: "superuser".to_string(),
            full_name: "Ivanov Ivan".to_string(),
        };
        assert_eq!(profile.role(), Role::Client);
        assert_eq!("in_progress".parse::<OrderStatus>().ok(), Some(OrderStatus::InProgress));
        assert_eq!(Role::Manager.to_string(), "manager");
    }
}
