use super::{Entity, ProductQuery, Store, StoreError};
use crate::insertables::{
    NewAccount, NewCategory, NewManufacturer, NewOrder, NewOrderLine, NewPickupPoint, NewProduct,
    NewProfile, NewSupplier,
};
use crate::models::{
    Account, Category, LineDetails, Manufacturer, Order, OrderLine, OrderSummary, PickupPoint,
    Product, ProductDetails, Profile, Supplier,
};
use crate::schema::{
    accounts, categories, manufacturers, order_lines, orders, pickup_points, products, profiles,
    suppliers,
};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rust_decimal::Decimal;

/// [`Store`] over a single PostgreSQL connection.
pub struct PgStore<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> PgStore<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }
}

fn write_error(err: DieselError, entity: Entity, key: &str) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => StoreError::Conflict {
            entity,
            key: key.to_owned(),
        },
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            StoreError::MissingReference(info.message().to_owned())
        }
        err => StoreError::Database(err),
    }
}

impl Store for PgStore<'_> {
    fn get_or_create_pickup_point(
        &mut self,
        address: &str,
    ) -> Result<(PickupPoint, bool), StoreError> {
        let inserted = diesel::insert_into(pickup_points::table)
            .values(&NewPickupPoint { address })
            .on_conflict(pickup_points::address)
            .do_nothing()
            .execute(self.conn)?;
        let point = pickup_points::table
            .filter(pickup_points::address.eq(address))
            .select(PickupPoint::as_select())
            .first(self.conn)?;
        Ok((point, inserted > 0))
    }

    fn pickup_points(&mut self) -> Result<Vec<PickupPoint>, StoreError> {
        let points = pickup_points::table
            .order(pickup_points::id.asc())
            .select(PickupPoint::as_select())
            .load(self.conn)?;
        Ok(points)
    }

    fn get_or_create_category(&mut self, name: &str) -> Result<Category, StoreError> {
        diesel::insert_into(categories::table)
            .values(&NewCategory {
                name,
                description: "",
            })
            .on_conflict(categories::name)
            .do_nothing()
            .execute(self.conn)?;
        let category = categories::table
            .filter(categories::name.eq(name))
            .select(Category::as_select())
            .first(self.conn)?;
        Ok(category)
    }

    fn get_or_create_manufacturer(&mut self, name: &str) -> Result<Manufacturer, StoreError> {
        diesel::insert_into(manufacturers::table)
            .values(&NewManufacturer { name, country: "" })
            .on_conflict(manufacturers::name)
            .do_nothing()
            .execute(self.conn)?;
        let manufacturer = manufacturers::table
            .filter(manufacturers::name.eq(name))
            .select(Manufacturer::as_select())
            .first(self.conn)?;
        Ok(manufacturer)
    }

    fn get_or_create_supplier(&mut self, name: &str) -> Result<Supplier, StoreError> {
        diesel::insert_into(suppliers::table)
            .values(&NewSupplier {
                name,
                contact_info: "",
            })
            .on_conflict(suppliers::name)
            .do_nothing()
            .execute(self.conn)?;
        let supplier = suppliers::table
            .filter(suppliers::name.eq(name))
            .select(Supplier::as_select())
            .first(self.conn)?;
        Ok(supplier)
    }

    fn suppliers(&mut self) -> Result<Vec<Supplier>, StoreError> {
        let all_suppliers = suppliers::table
            .order(suppliers::name.asc())
            .select(Supplier::as_select())
            .load(self.conn)?;
        Ok(all_suppliers)
    }

    fn product(&mut self, id: i32) -> Result<Option<Product>, StoreError> {
        let product = products::table
            .find(id)
            .select(Product::as_select())
            .first(self.conn)
            .optional()?;
        Ok(product)
    }

    fn product_by_article(&mut self, article: &str) -> Result<Option<Product>, StoreError> {
        let product = products::table
            .filter(products::article.eq(article))
            .select(Product::as_select())
            .first(self.conn)
            .optional()?;
        Ok(product)
    }

    fn create_product(&mut self, product: &NewProduct) -> Result<Product, StoreError> {
        diesel::insert_into(products::table)
            .values(product)
            .returning(Product::as_returning())
            .get_result(self.conn)
            .map_err(|err| write_error(err, Entity::Product, &product.article))
    }

    fn update_product(&mut self, id: i32, product: &NewProduct) -> Result<Product, StoreError> {
        diesel::update(products::table.find(id))
            .set(product)
            .returning(Product::as_returning())
            .get_result(self.conn)
            .optional()
            .map_err(|err| write_error(err, Entity::Product, &product.article))?
            .ok_or(StoreError::NotFound {
                entity: Entity::Product,
                id,
            })
    }

    fn product_details(
        &mut self,
        query: &ProductQuery,
    ) -> Result<Vec<ProductDetails>, StoreError> {
        let mut statement = products::table
            .inner_join(categories::table)
            .inner_join(manufacturers::table)
            .inner_join(suppliers::table)
            .select((
                Product::as_select(),
                categories::name,
                manufacturers::name,
                suppliers::name,
            ))
            .into_boxed();

        if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            statement = statement.filter(
                products::name
                    .ilike(pattern.clone())
                    .or(products::description.ilike(pattern.clone()))
                    .or(manufacturers::name.ilike(pattern.clone()))
                    .or(suppliers::name.ilike(pattern.clone()))
                    .or(products::article.ilike(pattern)),
            );
        }
        if let Some(supplier_id) = query.supplier_id {
            statement = statement.filter(products::supplier_id.eq(supplier_id));
        }
        statement = if query.sort_by_stock {
            statement.order((products::stock_quantity.asc(), products::name.asc()))
        } else {
            statement.order(products::name.asc())
        };

        let rows = statement.load::<(Product, String, String, String)>(self.conn)?;
        Ok(rows
            .into_iter()
            .map(|(product, category, manufacturer, supplier)| ProductDetails {
                product,
                category,
                manufacturer,
                supplier,
            })
            .collect())
    }

    fn account_by_username(&mut self, username: &str) -> Result<Option<Account>, StoreError> {
        let account = accounts::table
            .filter(accounts::username.eq(username))
            .select(Account::as_select())
            .first(self.conn)
            .optional()?;
        Ok(account)
    }

    fn account_by_full_name(&mut self, full_name: &str) -> Result<Option<Account>, StoreError> {
        let account = accounts::table
            .inner_join(profiles::table)
            .filter(profiles::full_name.eq(full_name))
            .order(accounts::id.asc())
            .select(Account::as_select())
            .first(self.conn)
            .optional()?;
        Ok(account)
    }

    fn create_account(&mut self, account: &NewAccount) -> Result<Account, StoreError> {
        diesel::insert_into(accounts::table)
            .values(account)
            .returning(Account::as_returning())
            .get_result(self.conn)
            .map_err(|err| write_error(err, Entity::Account, &account.username))
    }

    fn profile(&mut self, account_id: i32) -> Result<Option<Profile>, StoreError> {
        let profile = profiles::table
            .filter(profiles::account_id.eq(account_id))
            .select(Profile::as_select())
            .first(self.conn)
            .optional()?;
        Ok(profile)
    }

    fn get_or_create_profile(
        &mut self,
        profile: &NewProfile,
    ) -> Result<(Profile, bool), StoreError> {
        let inserted = diesel::insert_into(profiles::table)
            .values(profile)
            .on_conflict(profiles::account_id)
            .do_nothing()
            .execute(self.conn)
            .map_err(|err| write_error(err, Entity::Profile, &profile.full_name))?;
        let stored = profiles::table
            .filter(profiles::account_id.eq(profile.account_id))
            .select(Profile::as_select())
            .first(self.conn)?;
        Ok((stored, inserted > 0))
    }

    fn get_or_create_order(&mut self, order: &NewOrder) -> Result<(Order, bool), StoreError> {
        let inserted = diesel::insert_into(orders::table)
            .values(order)
            .on_conflict((orders::account_id, orders::order_date))
            .do_nothing()
            .execute(self.conn)
            .map_err(|err| write_error(err, Entity::Order, &order.order_date.to_string()))?;
        let stored = orders::table
            .filter(orders::account_id.eq(order.account_id))
            .filter(orders::order_date.eq(order.order_date))
            .select(Order::as_select())
            .first(self.conn)?;
        Ok((stored, inserted > 0))
    }

    fn set_order_total(&mut self, order_id: i32, total: Decimal) -> Result<Order, StoreError> {
        diesel::update(orders::table.find(order_id))
            .set(orders::total_amount.eq(total))
            .returning(Order::as_returning())
            .get_result(self.conn)
            .optional()?
            .ok_or(StoreError::NotFound {
                entity: Entity::Order,
                id: order_id,
            })
    }

    fn create_order_line(&mut self, line: &NewOrderLine) -> Result<OrderLine, StoreError> {
        diesel::insert_into(order_lines::table)
            .values(line)
            .returning(OrderLine::as_returning())
            .get_result(self.conn)
            .map_err(|err| write_error(err, Entity::OrderLine, &line.order_id.to_string()))
    }

    fn order_summaries(&mut self) -> Result<Vec<OrderSummary>, StoreError> {
        let rows = orders::table
            .inner_join(accounts::table)
            .inner_join(pickup_points::table)
            .order((orders::order_date.desc(), orders::id.desc()))
            .select((Order::as_select(), accounts::username, pickup_points::address))
            .load::<(Order, String, String)>(self.conn)?;
        Ok(rows
            .into_iter()
            .map(|(order, customer, pickup_address)| OrderSummary {
                order,
                customer,
                pickup_address,
            })
            .collect())
    }

    fn order_lines(&mut self, order_ids: &[i32]) -> Result<Vec<LineDetails>, StoreError> {
        let rows = order_lines::table
            .inner_join(products::table)
            .filter(order_lines::order_id.eq_any(order_ids))
            .order(order_lines::id.asc())
            .select((OrderLine::as_select(), products::name))
            .load::<(OrderLine, String)>(self.conn)?;
        Ok(rows
            .into_iter()
            .map(|(line, product_name)| LineDetails { line, product_name })
            .collect())
    }

    fn count(&mut self, entity: Entity) -> Result<i64, StoreError> {
        let conn = &mut *self.conn;
        let total: i64 = match entity {
            Entity::Category => categories::table.count().get_result(conn)?,
            Entity::Manufacturer => manufacturers::table.count().get_result(conn)?,
            Entity::Supplier => suppliers::table.count().get_result(conn)?,
            Entity::Product => products::table.count().get_result(conn)?,
            Entity::Account => accounts::table.count().get_result(conn)?,
            Entity::Profile => profiles::table.count().get_result(conn)?,
            Entity::PickupPoint => pickup_points::table.count().get_result(conn)?,
            Entity::Order => orders::table.count().get_result(conn)?,
            Entity::OrderLine => order_lines::table.count().get_result(conn)?,
        };
        Ok(total)
    }

    fn delete(&mut self, entity: Entity, id: i32) -> Result<(), StoreError> {
        let conn = &mut *self.conn;
        let deleted = match entity {
            Entity::Category => diesel::delete(categories::table.find(id)).execute(conn),
            Entity::Manufacturer => diesel::delete(manufacturers::table.find(id)).execute(conn),
            Entity::Supplier => diesel::delete(suppliers::table.find(id)).execute(conn),
            Entity::Product => diesel::delete(products::table.find(id)).execute(conn),
            Entity::Account => diesel::delete(accounts::table.find(id)).execute(conn),
            Entity::Profile => diesel::delete(profiles::table.find(id)).execute(conn),
            Entity::PickupPoint => diesel::delete(pickup_points::table.find(id)).execute(conn),
            Entity::Order => diesel::delete(orders::table.find(id)).execute(conn),
            Entity::OrderLine => diesel::delete(order_lines::table.find(id)).execute(conn),
        };
        match deleted {
            Ok(0) => Err(StoreError::NotFound { entity, id }),
            Ok(_) => Ok(()),
            Err(DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _)) => {
                Err(StoreError::Protected { entity, id })
            }
            Err(err) => Err(err.into()),
        }
    }
}
