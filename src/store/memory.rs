use super::{Entity, ProductQuery, Store, StoreError};
use crate::insertables::{NewAccount, NewOrder, NewOrderLine, NewProduct, NewProfile};
use crate::models::{
    Account, Category, LineDetails, Manufacturer, Order, OrderLine, OrderSummary, PickupPoint,
    Product, ProductDetails, Profile, Supplier,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// In-process [`Store`] with the same unique keys, foreign keys and delete
/// restrictions as the PostgreSQL schema. Ids start at 1 per table.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sequences: HashMap<Entity, i32>,
    categories: Vec<Category>,
    manufacturers: Vec<Manufacturer>,
    suppliers: Vec<Supplier>,
    products: Vec<Product>,
    accounts: Vec<Account>,
    profiles: Vec<Profile>,
    pickup_points: Vec<PickupPoint>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self, entity: Entity) -> i32 {
        let id = self.sequences.entry(entity).or_insert(0);
        *id += 1;
        *id
    }

    fn name_of<T>(rows: &[T], id: i32, row_id: impl Fn(&T) -> i32, name: impl Fn(&T) -> &str) -> String {
        rows.iter()
            .find(|row| row_id(row) == id)
            .map(|row| name(row).to_owned())
            .unwrap_or_default()
    }

    fn check_product_refs(&self, product: &NewProduct) -> Result<(), StoreError> {
        if !self.categories.iter().any(|c| c.id == product.category_id) {
            return Err(StoreError::MissingReference(format!(
                "category {}",
                product.category_id
            )));
        }
        if !self
            .manufacturers
            .iter()
            .any(|m| m.id == product.manufacturer_id)
        {
            return Err(StoreError::MissingReference(format!(
                "manufacturer {}",
                product.manufacturer_id
            )));
        }
        if !self.suppliers.iter().any(|s| s.id == product.supplier_id) {
            return Err(StoreError::MissingReference(format!(
                "supplier {}",
                product.supplier_id
            )));
        }
        Ok(())
    }

    fn product_row(id: i32, product: &NewProduct) -> Product {
        Product {
            id,
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

    fn matches_search(&self, product: &Product, needle: &str) -> bool {
        let manufacturer = Self::name_of(&self.manufacturers, product.manufacturer_id, |m| m.id, |m| &m.name);
        let supplier = Self::name_of(&self.suppliers, product.supplier_id, |s| s.id, |s| &s.name);
        [
            product.name.as_str(),
            product.description.as_str(),
            manufacturer.as_str(),
            supplier.as_str(),
            product.article.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

fn remove_by_id<T>(rows: &mut Vec<T>, id: i32, row_id: impl Fn(&T) -> i32) -> bool {
    let before = rows.len();
    rows.retain(|row| row_id(row) != id);
    rows.len() != before
}

impl Store for MemoryStore {
    fn get_or_create_pickup_point(
        &mut self,
        address: &str,
    ) -> Result<(PickupPoint, bool), StoreError> {
        if let Some(point) = self.pickup_points.iter().find(|p| p.address == address) {
            return Ok((point.clone(), false));
        }
        let point = PickupPoint {
            id: self.next_id(Entity::PickupPoint),
            address: address.to_owned(),
        };
        self.pickup_points.push(point.clone());
        Ok((point, true))
    }

    fn pickup_points(&mut self) -> Result<Vec<PickupPoint>, StoreError> {
        let mut points = self.pickup_points.clone();
        points.sort_by_key(|p| p.id);
        Ok(points)
    }

    fn get_or_create_category(&mut self, name: &str) -> Result<Category, StoreError> {
        if let Some(category) = self.categories.iter().find(|c| c.name == name) {
            return Ok(category.clone());
        }
        let category = Category {
            id: self.next_id(Entity::Category),
            name: name.to_owned(),
            description: String::new(),
        };
        self.categories.push(category.clone());
        Ok(category)
    }

    fn get_or_create_manufacturer(&mut self, name: &str) -> Result<Manufacturer, StoreError> {
        if let Some(manufacturer) = self.manufacturers.iter().find(|m| m.name == name) {
            return Ok(manufacturer.clone());
        }
        let manufacturer = Manufacturer {
            id: self.next_id(Entity::Manufacturer),
            name: name.to_owned(),
            country: String::new(),
        };
        self.manufacturers.push(manufacturer.clone());
        Ok(manufacturer)
    }

    fn get_or_create_supplier(&mut self, name: &str) -> Result<Supplier, StoreError> {
        if let Some(supplier) = self.suppliers.iter().find(|s| s.name == name) {
            return Ok(supplier.clone());
        }
        let supplier = Supplier {
            id: self.next_id(Entity::Supplier),
            name: name.to_owned(),
            contact_info: String::new(),
        };
        self.suppliers.push(supplier.clone());
        Ok(supplier)
    }

    fn suppliers(&mut self) -> Result<Vec<Supplier>, StoreError> {
        let mut all_suppliers = self.suppliers.clone();
        all_suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all_suppliers)
    }

    fn product(&mut self, id: i32) -> Result<Option<Product>, StoreError> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    fn product_by_article(&mut self, article: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products.iter().find(|p| p.article == article).cloned())
    }

    fn create_product(&mut self, product: &NewProduct) -> Result<Product, StoreError> {
        if self.products.iter().any(|p| p.article == product.article) {
            return Err(StoreError::Conflict {
                entity: Entity::Product,
                key: product.article.clone(),
            });
        }
        self.check_product_refs(product)?;
        let created = Self::product_row(self.next_id(Entity::Product), product);
        self.products.push(created.clone());
        Ok(created)
    }

    fn update_product(&mut self, id: i32, product: &NewProduct) -> Result<Product, StoreError> {
        if !self.products.iter().any(|p| p.id == id) {
            return Err(StoreError::NotFound {
                entity: Entity::Product,
                id,
            });
        }
        if self
            .products
            .iter()
            .any(|p| p.id != id && p.article == product.article)
        {
            return Err(StoreError::Conflict {
                entity: Entity::Product,
                key: product.article.clone(),
            });
        }
        self.check_product_refs(product)?;
        let updated = Self::product_row(id, product);
        for row in self.products.iter_mut().filter(|p| p.id == id) {
            *row = updated.clone();
        }
        Ok(updated)
    }

    fn product_details(
        &mut self,
        query: &ProductQuery,
    ) -> Result<Vec<ProductDetails>, StoreError> {
        let needle = query
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let mut selected: Vec<Product> = self
            .products
            .iter()
            .filter(|p| query.supplier_id.map_or(true, |id| p.supplier_id == id))
            .filter(|p| needle.as_deref().map_or(true, |n| self.matches_search(p, n)))
            .cloned()
            .collect();
        if query.sort_by_stock {
            selected.sort_by(|a, b| {
                a.stock_quantity
                    .cmp(&b.stock_quantity)
                    .then_with(|| a.name.cmp(&b.name))
            });
        } else {
            selected.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(selected
            .into_iter()
            .map(|product| ProductDetails {
                category: Self::name_of(&self.categories, product.category_id, |c| c.id, |c| &c.name),
                manufacturer: Self::name_of(
                    &self.manufacturers,
                    product.manufacturer_id,
                    |m| m.id,
                    |m| &m.name,
                ),
                supplier: Self::name_of(&self.suppliers, product.supplier_id, |s| s.id, |s| &s.name),
                product,
            })
            .collect())
    }

    fn account_by_username(&mut self, username: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.iter().find(|a| a.username == username).cloned())
    }

    fn account_by_full_name(&mut self, full_name: &str) -> Result<Option<Account>, StoreError> {
        let account_id = self
            .profiles
            .iter()
            .filter(|p| p.full_name == full_name)
            .map(|p| p.account_id)
            .min();
        Ok(account_id.and_then(|id| self.accounts.iter().find(|a| a.id == id).cloned()))
    }

    fn create_account(&mut self, account: &NewAccount) -> Result<Account, StoreError> {
        if self.accounts.iter().any(|a| a.username == account.username) {
            return Err(StoreError::Conflict {
                entity: Entity::Account,
                key: account.username.clone(),
            });
        }
        let created = Account {
            id: self.next_id(Entity::Account),
            username: account.username.clone(),
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            password_hash: account.password_hash.clone(),
        };
        self.accounts.push(created.clone());
        Ok(created)
    }

    fn profile(&mut self, account_id: i32) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .profiles
            .iter()
            .find(|p| p.account_id == account_id)
            .cloned())
    }

    fn get_or_create_profile(
        &mut self,
        profile: &NewProfile,
    ) -> Result<(Profile, bool), StoreError> {
        if let Some(existing) = self
            .profiles
            .iter()
            .find(|p| p.account_id == profile.account_id)
        {
            return Ok((existing.clone(), false));
        }
        if !self.accounts.iter().any(|a| a.id == profile.account_id) {
            return Err(StoreError::MissingReference(format!(
                "account {}",
                profile.account_id
            )));
        }
        let created = Profile {
            id: self.next_id(Entity::Profile),
            account_id: profile.account_id,
            role: profile.role.clone(),
            full_name: profile.full_name.clone(),
        };
        self.profiles.push(created.clone());
        Ok((created, true))
    }

    fn get_or_create_order(&mut self, order: &NewOrder) -> Result<(Order, bool), StoreError> {
        if let Some(existing) = self
            .orders
            .iter()
            .find(|o| o.account_id == order.account_id && o.order_date == order.order_date)
        {
            return Ok((existing.clone(), false));
        }
        if !self.accounts.iter().any(|a| a.id == order.account_id) {
            return Err(StoreError::MissingReference(format!(
                "account {}",
                order.account_id
            )));
        }
        if !self
            .pickup_points
            .iter()
            .any(|p| p.id == order.pickup_point_id)
        {
            return Err(StoreError::MissingReference(format!(
                "pickup_point {}",
                order.pickup_point_id
            )));
        }
        let created = Order {
            id: self.next_id(Entity::Order),
            account_id: order.account_id,
            order_date: order.order_date,
            delivery_date: order.delivery_date,
            pickup_point_id: order.pickup_point_id,
            pickup_code: order.pickup_code.clone(),
            status: order.status.clone(),
            total_amount: order.total_amount,
        };
        self.orders.push(created.clone());
        Ok((created, true))
    }

    fn set_order_total(&mut self, order_id: i32, total: Decimal) -> Result<Order, StoreError> {
        let order = self
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(StoreError::NotFound {
                entity: Entity::Order,
                id: order_id,
            })?;
        order.total_amount = total;
        Ok(order.clone())
    }

    fn create_order_line(&mut self, line: &NewOrderLine) -> Result<OrderLine, StoreError> {
        if !self.orders.iter().any(|o| o.id == line.order_id) {
            return Err(StoreError::MissingReference(format!("order {}", line.order_id)));
        }
        if !self.products.iter().any(|p| p.id == line.product_id) {
            return Err(StoreError::MissingReference(format!(
                "product {}",
                line.product_id
            )));
        }
        let created = OrderLine {
            id: self.next_id(Entity::OrderLine),
            order_id: line.order_id,
            product_id: line.product_id,
            quantity: line.quantity,
            price_at_purchase: line.price_at_purchase,
        };
        self.order_lines.push(created.clone());
        Ok(created)
    }

    fn order_summaries(&mut self) -> Result<Vec<OrderSummary>, StoreError> {
        let mut all_orders = self.orders.clone();
        all_orders.sort_by(|a, b| {
            b.order_date
                .cmp(&a.order_date)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(all_orders
            .into_iter()
            .map(|order| OrderSummary {
                customer: Self::name_of(&self.accounts, order.account_id, |a| a.id, |a| &a.username),
                pickup_address: Self::name_of(
                    &self.pickup_points,
                    order.pickup_point_id,
                    |p| p.id,
                    |p| &p.address,
                ),
                order,
            })
            .collect())
    }

    fn order_lines(&mut self, order_ids: &[i32]) -> Result<Vec<LineDetails>, StoreError> {
        Ok(self
            .order_lines
            .iter()
            .filter(|line| order_ids.contains(&line.order_id))
            .map(|line| LineDetails {
                line: line.clone(),
                product_name: Self::name_of(&self.products, line.product_id, |p| p.id, |p| &p.name),
            })
            .collect())
    }

    fn count(&mut self, entity: Entity) -> Result<i64, StoreError> {
        let total = match entity {
            Entity::Category => self.categories.len(),
            Entity::Manufacturer => self.manufacturers.len(),
            Entity::Supplier => self.suppliers.len(),
            Entity::Product => self.products.len(),
            Entity::Account => self.accounts.len(),
            Entity::Profile => self.profiles.len(),
            Entity::PickupPoint => self.pickup_points.len(),
            Entity::Order => self.orders.len(),
            Entity::OrderLine => self.order_lines.len(),
        };
        Ok(total as i64)
    }

    fn delete(&mut self, entity: Entity, id: i32) -> Result<(), StoreError> {
        let referenced = match entity {
            Entity::Category => self.products.iter().any(|p| p.category_id == id),
            Entity::Manufacturer => self.products.iter().any(|p| p.manufacturer_id == id),
            Entity::Supplier => self.products.iter().any(|p| p.supplier_id == id),
            Entity::Product => self.order_lines.iter().any(|l| l.product_id == id),
            Entity::Account => self.orders.iter().any(|o| o.account_id == id),
            Entity::PickupPoint => self.orders.iter().any(|o| o.pickup_point_id == id),
            Entity::Order => self.order_lines.iter().any(|l| l.order_id == id),
            Entity::Profile | Entity::OrderLine => false,
        };
        if referenced {
            return Err(StoreError::Protected { entity, id });
        }

        let removed = match entity {
            Entity::Category => remove_by_id(&mut self.categories, id, |c| c.id),
            Entity::Manufacturer => remove_by_id(&mut self.manufacturers, id, |m| m.id),
            Entity::Supplier => remove_by_id(&mut self.suppliers, id, |s| s.id),
            Entity::Product => remove_by_id(&mut self.products, id, |p| p.id),
            Entity::Account => {
                let removed = remove_by_id(&mut self.accounts, id, |a| a.id);
                if removed {
                    self.profiles.retain(|p| p.account_id != id);
                }
                removed
            }
            Entity::Profile => remove_by_id(&mut self.profiles, id, |p| p.id),
            Entity::PickupPoint => remove_by_id(&mut self.pickup_points, id, |p| p.id),
            Entity::Order => remove_by_id(&mut self.orders, id, |o| o.id),
            Entity::OrderLine => remove_by_id(&mut self.order_lines, id, |l| l.id),
        };
        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound { entity, id })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn seeded() -> (MemoryStore, Product) {
        let mut store = MemoryStore::new();
        let category = store.get_or_create_category("Paper").unwrap();
        let manufacturer = store.get_or_create_manufacturer("Erich Krause").unwrap();
        let supplier = store.get_or_create_supplier("Kanc Trade").unwrap();
        let product = store
            .create_product(&NewProduct {
                article: "A112T4".to_string(),
                name: "Notebook".to_string(),
                unit: "pcs".to_string(),
                category_id: category.id,
                manufacturer_id: manufacturer.id,
                supplier_id: supplier.id,
                description: String::new(),
                price: dec!(120.00),
                stock_quantity: 6,
                discount: 0,
                image: None,
            })
            .unwrap();
        (store, product)
    }

    #[test]
    fn get_or_create_is_keyed_by_name() {
        let mut store = MemoryStore::new();
        let first = store.get_or_create_category("Paper").unwrap();
        let again = store.get_or_create_category("Paper").unwrap();
        let other = store.get_or_create_category("paper").unwrap();
        assert_eq!(first, again);
        assert_ne!(first.id, other.id);
        assert_eq!(store.count(Entity::Category).unwrap(), 2);
    }

    #[test]
    fn category_in_use_is_protected() {
        let (mut store, product) = seeded();
        let err = store
            .delete(Entity::Category, product.category_id)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Protected {
                entity: Entity::Category,
                ..
            }
        ));
        store.delete(Entity::Product, product.id).unwrap();
        store.delete(Entity::Category, product.category_id).unwrap();
    }

    #[test]
    fn duplicate_article_conflicts() {
        let (mut store, product) = seeded();
        let duplicate = NewProduct {
            article: product.article.clone(),
            name: "Other".to_string(),
            unit: "pcs".to_string(),
            category_id: product.category_id,
            manufacturer_id: product.manufacturer_id,
            supplier_id: product.supplier_id,
            description: String::new(),
            price: dec!(1),
            stock_quantity: 0,
            discount: 0,
            image: None,
        };
        assert!(matches!(
            store.create_product(&duplicate),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn deleting_account_drops_profile_unless_ordered() {
        let (mut store, _) = seeded();
        let account = store.create_account(&NewAccount::bare("petrov".into())).unwrap();
        store
            .get_or_create_profile(&NewProfile::new(account.id, crate::models::Role::Client, "Petrov Petr"))
            .unwrap();
        let (point, _) = store.get_or_create_pickup_point("Lenina 1").unwrap();
        let order_date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let (order, created) = store
            .get_or_create_order(&NewOrder::new(
                account.id,
                order_date,
                None,
                point.id,
                "901".into(),
                crate::models::OrderStatus::New,
            ))
            .unwrap();
        assert!(created);
        assert!(matches!(
            store.delete(Entity::Account, account.id),
            Err(StoreError::Protected { .. })
        ));
        store.delete(Entity::Order, order.id).unwrap();
        store.delete(Entity::Account, account.id).unwrap();
        assert_eq!(store.count(Entity::Profile).unwrap(), 0);
    }
}
