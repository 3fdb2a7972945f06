use super::labels::StatusLabel;
use super::sheet::{cell_datetime, cell_integer, SheetRow, ORDER_SHEET};
use super::{Decoded, ImportError, Importer, RowSkip, Stage, StageReport, Workbook};
use crate::insertables::{NewAccount, NewOrder, NewOrderLine, NewProfile};
use crate::models::{round_currency, Account, PickupPoint, Role};
use crate::store::{Entity, Store, StoreError};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

const ORDER_NUMBER: usize = 0;
const ITEMS: usize = 1;
const ORDER_DATE: usize = 2;
const DELIVERY_DATE: usize = 3;
const PICKUP_INDEX: usize = 4;
const CUSTOMER: usize = 5;
const PICKUP_CODE: usize = 6;
const STATUS: usize = 7;

const ITEM_DELIMITER: char = ',';
const USERNAME_MAX_CHARS: usize = 30;
const USERNAME_ATTEMPTS: u32 = 100;
const PICKUP_CODE_MAX_CHARS: usize = 10;
const FULL_NAME_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedItem {
    pub article: String,
    pub quantity: i32,
}

/// Splits `"A112T4, 2, F635R4, 1"` into article/quantity pairs. A trailing
/// article without a quantity is ordered once.
pub fn parse_packed_items(packed: &str) -> Result<Vec<PackedItem>, String> {
    let tokens: Vec<&str> = packed
        .split(ITEM_DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();
    tokens
        .chunks(2)
        .map(|pair| -> Result<PackedItem, String> {
            let article = pair[0];
            let quantity = match pair.get(1) {
                Some(token) => token
                    .parse::<i32>()
                    .ok()
                    .filter(|quantity| *quantity >= 1)
                    .ok_or_else(|| {
                        format!("quantity `{token}` for {article} is not a positive whole number")
                    })?,
                None => 1,
            };
            Ok(PackedItem {
                article: article.to_owned(),
                quantity,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickupResolution {
    Exact(PickupPoint),
    /// The index was outside the collection; the first pickup point is used instead.
    Fallback { requested: i64, point: PickupPoint },
}

impl PickupResolution {
    pub fn point(&self) -> &PickupPoint {
        match self {
            PickupResolution::Exact(point) => point,
            PickupResolution::Fallback { point, .. } => point,
        }
    }
}

/// Resolves a 1-based position into `points`. `None` only when `points` is empty.
pub fn resolve_pickup_point(points: &[PickupPoint], index: i64) -> Option<PickupResolution> {
    let first = points.first()?;
    let exact = usize::try_from(index)
        .ok()
        .and_then(|index| index.checked_sub(1))
        .and_then(|position| points.get(position));
    Some(match exact {
        Some(point) => PickupResolution::Exact(point.clone()),
        None => PickupResolution::Fallback {
            requested: index,
            point: first.clone(),
        },
    })
}

/// Username for a customer known only by name: lower-cased, spaces to
/// underscores, at most 30 characters.
pub fn customer_username(full_name: &str) -> String {
    full_name
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .take(USERNAME_MAX_CHARS)
        .collect()
}

/// The `attempt`-th username to try for `full_name`. The first attempt is
/// [`customer_username`]; later ones end in `_<attempt>` and are shortened to
/// stay within 30 characters.
pub fn customer_username_candidate(full_name: &str, attempt: u32) -> String {
    let base = customer_username(full_name);
    if attempt <= 1 {
        return base;
    }
    let suffix = format!("_{attempt}");
    let mut candidate: String = base
        .chars()
        .take(USERNAME_MAX_CHARS - suffix.chars().count())
        .collect();
    candidate.push_str(&suffix);
    candidate
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub line: usize,
    pub items: Vec<PackedItem>,
    pub order_date: NaiveDateTime,
    pub delivery_date: Option<NaiveDate>,
    pub pickup_index: i64,
    pub customer: String,
    pub pickup_code: String,
    pub status: StatusLabel,
}

impl OrderRow {
    pub fn decode(row: &SheetRow<'_>) -> Result<Decoded<Self>, ImportError> {
        if row.text(ORDER_NUMBER).is_empty() {
            return Ok(Decoded::Skip(RowSkip::EmptyKey("order number")));
        }
        let items = match parse_packed_items(&row.text(ITEMS)) {
            Ok(items) => items,
            Err(reason) => return Ok(Decoded::Skip(RowSkip::BadItems(reason))),
        };

        let order_date = cell_datetime(row.cell(ORDER_DATE))
            .map_err(|reason| row.invalid("order_date", reason))?
            .ok_or_else(|| row.invalid("order_date", "order date is required"))?;
        let delivery_date = cell_datetime(row.cell(DELIVERY_DATE))
            .map_err(|reason| row.invalid("delivery_date", reason))?
            .map(|delivered| delivered.date());
        let pickup_index = cell_integer(row.cell(PICKUP_INDEX))
            .map_err(|reason| row.invalid("pickup_point", reason))?
            .ok_or_else(|| row.invalid("pickup_point", "pickup point number is required"))?;
        let customer = row.bounded_text(CUSTOMER, "customer", FULL_NAME_MAX_CHARS)?;
        if customer.is_empty() {
            return Err(row.invalid("customer", "customer name is required"));
        }
        let pickup_code = row.bounded_text(PICKUP_CODE, "pickup_code", PICKUP_CODE_MAX_CHARS)?;

        Ok(Decoded::Row(Self {
            line: row.line,
            items,
            order_date,
            delivery_date,
            pickup_index,
            customer,
            pickup_code,
            status: StatusLabel::parse(&row.text(STATUS)),
        }))
    }
}

impl<S: Store> Importer<'_, S> {
    pub fn import_orders(&mut self, workbook: &Workbook) -> Result<StageReport, ImportError> {
        let mut report = StageReport::new(Stage::Orders);
        for row in workbook.data_rows(ORDER_SHEET)? {
            report.rows += 1;
            match OrderRow::decode(&row)? {
                Decoded::Row(order) => self.load_order(&order, &mut report)?,
                Decoded::Skip(reason) => report.skip(ORDER_SHEET, row.line, reason),
            }
        }
        self.finish(report, Entity::Order)
    }

    /// Upserts the order by (customer, order date). Lines and the total are
    /// written only when this call created the order.
    pub fn load_order(&mut self, row: &OrderRow, report: &mut StageReport) -> Result<(), ImportError> {
        let customer = self.resolve_customer(&row.customer)?;

        let points = self.store.pickup_points()?;
        let pickup = resolve_pickup_point(&points, row.pickup_index).ok_or(ImportError::NoPickupPoints)?;
        if let PickupResolution::Fallback { requested, point } = &pickup {
            report.warn(format_args!(
                "{ORDER_SHEET} row {}: pickup point {requested} does not exist, using `{}`",
                row.line, point.address
            ));
        }
        if let StatusLabel::Unmapped(label) = &row.status {
            report.warn(format_args!(
                "{ORDER_SHEET} row {}: unknown status `{label}`, using {}",
                row.line,
                row.status.status()
            ));
        }

        let (order, created) = self.store.get_or_create_order(&NewOrder::new(
            customer.id,
            row.order_date,
            row.delivery_date,
            pickup.point().id,
            row.pickup_code.clone(),
            row.status.status(),
        ))?;
        report.record(created);
        if !created || row.items.is_empty() {
            return Ok(());
        }

        let mut total = Decimal::ZERO;
        for item in &row.items {
            let Some(product) = self.store.product_by_article(&item.article)? else {
                report.warn(format_args!(
                    "{ORDER_SHEET} row {}: product {} not found",
                    row.line, item.article
                ));
                continue;
            };
            let price = round_currency(product.discounted_price());
            self.store.create_order_line(&NewOrderLine {
                order_id: order.id,
                product_id: product.id,
                quantity: item.quantity,
                price_at_purchase: price,
            })?;
            total += price * Decimal::from(item.quantity);
        }
        self.store.set_order_total(order.id, total)?;
        Ok(())
    }

    /// The first account whose profile carries `full_name`, or a new bare
    /// client account for it. A synthesized username already held by someone
    /// else is never reused; the next numbered candidate is tried instead.
    fn resolve_customer(&mut self, full_name: &str) -> Result<Account, ImportError> {
        if let Some(account) = self.store.account_by_full_name(full_name)? {
            return Ok(account);
        }
        for attempt in 1..=USERNAME_ATTEMPTS {
            let username = customer_username_candidate(full_name, attempt);
            let account = match self.store.account_by_username(&username)? {
                // Left without a profile by an interrupted run.
                Some(account) if self.store.profile(account.id)?.is_none() => account,
                Some(_) => continue,
                None => {
                    log::info!("creating customer account `{username}` for {full_name}");
                    self.store.create_account(&NewAccount::bare(username))?
                }
            };
            self.store
                .get_or_create_profile(&NewProfile::new(account.id, Role::Client, full_name))?;
            return Ok(account);
        }
        Err(StoreError::Conflict {
            entity: Entity::Account,
            key: customer_username(full_name),
        }
        .into())
    }
}
