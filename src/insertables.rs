use crate::models::{OrderStatus, Product, Role};
use crate::schema::{
    accounts, categories, manufacturers, order_lines, orders, pickup_points, products, profiles,
    suppliers,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::{AsChangeset, Insertable};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name=categories)]
pub struct NewCategory<'a> {
    pub name: &'a str,
    pub description: &'a str,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name=manufacturers)]
pub struct NewManufacturer<'a> {
    pub name: &'a str,
    pub country: &'a str,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name=suppliers)]
pub struct NewSupplier<'a> {
    pub name: &'a str,
    pub contact_info: &'a str,
}

/// Product fields shared by creation and full updates.
#[derive(Insertable, AsChangeset, Serialize, Deserialize, Clone, Debug, PartialEq)]
#[diesel(table_name=products)]
#[diesel(treat_none_as_null = true)]
pub struct NewProduct {
    pub article: String,
    pub name: String,
    pub unit: String,
    pub category_id: i32,
    pub manufacturer_id: i32,
    pub supplier_id: i32,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub discount: i32,
    /// Set only through an image upload.
    #[serde(skip_deserializing)]
    pub image: Option<String>,
}

impl From<&Product> for NewProduct {
    fn from(product: &Product) -> Self {
        Self {
            article: product.article.clone(),
            name: product.name.clone(),
            unit: product.unit.clone(),
            category_id: product.category_id,
            manufacturer_id: product.manufacturer_id,
            supplier_id: product.supplier_id,
            description: product.description.clone(),
            price: product.price,
            stock_quantity: product.stock_quantity,
            discount: product.discount,
            image: product.image.clone(),
        }
    }
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name=accounts)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>,
}

impl NewAccount {
    /// An account with no credential and no contact details.
    pub fn bare(username: String) -> Self {
        Self {
            username,
            email: String::new(),
            first_name: String::new(),
            last_name: String::new(),
            password_hash: None,
        }
    }
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name=profiles)]
pub struct NewProfile {
    pub account_id: i32,
    pub role: String,
    pub full_name: String,
}

impl NewProfile {
    pub fn new(account_id: i32, role: Role, full_name: &str) -> Self {
        Self {
            account_id,
            role: role.to_string(),
            full_name: full_name.to_owned(),
        }
    }
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name=pickup_points)]
pub struct NewPickupPoint<'a> {
    pub address: &'a str,
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name=orders)]
pub struct NewOrder {
    pub account_id: i32,
    pub order_date: NaiveDateTime,
    pub delivery_date: Option<NaiveDate>,
    pub pickup_point_id: i32,
    pub pickup_code: String,
    pub status: String,
    pub total_amount: Decimal,
}

impl NewOrder {
    pub fn new(
        account_id: i32,
        order_date: NaiveDateTime,
        delivery_date: Option<NaiveDate>,
        pickup_point_id: i32,
        pickup_code: String,
        status: OrderStatus,
    ) -> Self {
        Self {
            account_id,
            order_date,
            delivery_date,
            pickup_point_id,
            pickup_code,
            status: status.to_string(),
            total_amount: Decimal::ZERO,
        }
    }
}

#[derive(Insertable, Clone, Debug)]
#[diesel(table_name=order_lines)]
pub struct NewOrderLine {
    pub order_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
}
