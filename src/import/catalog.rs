use super::sheet::{cell_decimal, cell_integer, SheetRow, PRODUCT_SHEET};
use super::{Decoded, ImportError, Importer, RowSkip, Stage, StageReport, Workbook};
use crate::insertables::NewProduct;
use crate::models::{fits_money_column, round_currency};
use crate::store::{Entity, Store};
use rust_decimal::Decimal;

const ARTICLE: usize = 0;
const NAME: usize = 1;
const UNIT: usize = 2;
const PRICE: usize = 3;
const SUPPLIER: usize = 4;
const MANUFACTURER: usize = 5;
const CATEGORY: usize = 6;
const DISCOUNT: usize = 7;
const STOCK: usize = 8;
const DESCRIPTION: usize = 9;

const ARTICLE_MAX_CHARS: usize = 50;
const NAME_MAX_CHARS: usize = 300;
const UNIT_MAX_CHARS: usize = 50;
const REFERENCE_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub line: usize,
    pub article: String,
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    pub supplier: String,
    pub manufacturer: String,
    pub category: String,
    pub discount: i32,
    pub stock_quantity: i32,
    pub description: String,
}

impl ProductRow {
    pub fn decode(row: &SheetRow<'_>) -> Result<Decoded<Self>, ImportError> {
        if row.text(ARTICLE).is_empty() {
            return Ok(Decoded::Skip(RowSkip::EmptyKey("article")));
        }

        let price = cell_decimal(row.cell(PRICE))
            .map_err(|reason| row.invalid("price", reason))?
            .ok_or_else(|| row.invalid("price", "price is required"))?;
        if price <= Decimal::ZERO {
            return Err(row.invalid("price", format!("{price} is not a positive price")));
        }
        if !fits_money_column(price) {
            return Err(row.invalid("price", format!("{price} is too large")));
        }
        // Stored with cent precision.
        let price = round_currency(price);
        let discount = cell_integer(row.cell(DISCOUNT))
            .map_err(|reason| row.invalid("discount", reason))?
            .unwrap_or(0);
        if !(0..=100).contains(&discount) {
            return Err(row.invalid("discount", format!("{discount} is outside 0..=100")));
        }
        let stock_quantity = cell_integer(row.cell(STOCK))
            .map_err(|reason| row.invalid("stock_quantity", reason))?
            .unwrap_or(0);
        let stock_quantity = i32::try_from(stock_quantity)
            .ok()
            .filter(|stock| *stock >= 0)
            .ok_or_else(|| row.invalid("stock_quantity", format!("{stock_quantity} is not a stock level")))?;

        let required = |column: usize, name: &'static str, max_chars: usize| -> Result<String, ImportError> {
            let value = row.bounded_text(column, name, max_chars)?;
            if value.is_empty() {
                Err(row.invalid(name, format!("{name} is required")))
            } else {
                Ok(value)
            }
        };

        Ok(Decoded::Row(Self {
            line: row.line,
            article: required(ARTICLE, "article", ARTICLE_MAX_CHARS)?,
            name: required(NAME, "name", NAME_MAX_CHARS)?,
            unit: row.bounded_text(UNIT, "unit", UNIT_MAX_CHARS)?,
            price,
            supplier: required(SUPPLIER, "supplier", REFERENCE_MAX_CHARS)?,
            manufacturer: required(MANUFACTURER, "manufacturer", REFERENCE_MAX_CHARS)?,
            category: required(CATEGORY, "category", REFERENCE_MAX_CHARS)?,
            discount: discount as i32,
            stock_quantity,
            description: row.text(DESCRIPTION),
        }))
    }
}

impl<S: Store> Importer<'_, S> {
    pub fn import_products(&mut self, workbook: &Workbook) -> Result<StageReport, ImportError> {
        let mut report = StageReport::new(Stage::Products);
        for row in workbook.data_rows(PRODUCT_SHEET)? {
            report.rows += 1;
            match ProductRow::decode(&row)? {
                Decoded::Row(product) => self.load_product(&product, &mut report)?,
                Decoded::Skip(reason) => report.skip(PRODUCT_SHEET, row.line, reason),
            }
        }
        self.finish(report, Entity::Product)
    }

    /// Creates the product unless its article is already known; an existing
    /// product is never modified.
    pub fn load_product(
        &mut self,
        row: &ProductRow,
        report: &mut StageReport,
    ) -> Result<(), ImportError> {
        let category = self.store.get_or_create_category(&row.category)?;
        let manufacturer = self.store.get_or_create_manufacturer(&row.manufacturer)?;
        let supplier = self.store.get_or_create_supplier(&row.supplier)?;

        if self.store.product_by_article(&row.article)?.is_some() {
            report.record(false);
            return Ok(());
        }
        self.store.create_product(&NewProduct {
            article: row.article.clone(),
            name: row.name.clone(),
            unit: row.unit.clone(),
            category_id: category.id,
            manufacturer_id: manufacturer.id,
            supplier_id: supplier.id,
            description: row.description.clone(),
            price: row.price,
            stock_quantity: row.stock_quantity,
            discount: row.discount,
            image: None,
        })?;
        report.record(true);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::Data;
    use rust_decimal_macros::dec;

    fn cells(values: [Data; 10]) -> Vec<Data> {
        values.to_vec()
    }

    fn text(value: &str) -> Data {
        Data::String(value.to_string())
    }

    #[test]
    fn decodes_defaults_for_optional_columns() {
        let cells = cells([
            text("A112T4"),
            text("Notebook"),
            text("pcs"),
            Data::Float(499.9),
            text("Kanc Trade"),
            text("Erich Krause"),
            text("Paper"),
            Data::Empty,
            Data::Empty,
            Data::Empty,
        ]);
        let row = SheetRow::new(PRODUCT_SHEET, 2, &cells);
        let Decoded::Row(product) = ProductRow::decode(&row).unwrap() else {
            panic!("row should decode");
        };
        assert_eq!(product.price, dec!(499.9));
        assert_eq!(product.discount, 0);
        assert_eq!(product.stock_quantity, 0);
        assert_eq!(product.description, "");
    }

    #[test]
    fn empty_article_is_skipped() {
        let cells = vec![Data::Empty, text("Notebook")];
        let row = SheetRow::new(PRODUCT_SHEET, 3, &cells);
        assert!(matches!(
            ProductRow::decode(&row),
            Ok(Decoded::Skip(RowSkip::EmptyKey("article")))
        ));
    }

    #[test]
    fn unreadable_price_is_fatal() {
        let cells = cells([
            text("A112T4"),
            text("Notebook"),
            text("pcs"),
            text("free"),
            text("Kanc Trade"),
            text("Erich Krause"),
            text("Paper"),
            Data::Int(5),
            Data::Int(3),
            Data::Empty,
        ]);
        let row = SheetRow::new(PRODUCT_SHEET, 4, &cells);
        assert!(matches!(
            ProductRow::decode(&row),
            Err(ImportError::Cell {
                column: "price",
                line: 4,
                ..
            })
        ));
    }

    fn priced(price: Data) -> Vec<Data> {
        cells([
            text("A112T4"),
            text("Notebook"),
            text("pcs"),
            price,
            text("Kanc Trade"),
            text("Erich Krause"),
            text("Paper"),
            Data::Empty,
            Data::Empty,
            Data::Empty,
        ])
    }

    #[test]
    fn prices_must_be_positive_and_fit_the_column() {
        for price in [Data::Int(0), Data::Float(-3.5), Data::Float(1e9)] {
            let cells = priced(price);
            let row = SheetRow::new(PRODUCT_SHEET, 6, &cells);
            assert!(matches!(
                ProductRow::decode(&row),
                Err(ImportError::Cell {
                    column: "price",
                    ..
                })
            ));
        }
    }

    #[test]
    fn prices_are_rounded_to_cents() {
        let cells = priced(Data::Float(12.345));
        let row = SheetRow::new(PRODUCT_SHEET, 6, &cells);
        let Decoded::Row(product) = ProductRow::decode(&row).unwrap() else {
            panic!("row should decode");
        };
        assert_eq!(product.price, dec!(12.35));
    }

    #[test]
    fn overlong_article_is_fatal() {
        let mut cells = priced(Data::Int(10));
        cells[0] = text(&"A".repeat(51));
        let row = SheetRow::new(PRODUCT_SHEET, 8, &cells);
        assert!(matches!(
            ProductRow::decode(&row),
            Err(ImportError::Cell {
                column: "article",
                ..
            })
        ));
    }

    #[test]
    fn discount_over_hundred_is_fatal() {
        let cells = cells([
            text("A112T4"),
            text("Notebook"),
            text("pcs"),
            Data::Int(10),
            text("Kanc Trade"),
            text("Erich Krause"),
            text("Paper"),
            Data::Int(120),
            Data::Int(3),
            Data::Empty,
        ]);
        let row = SheetRow::new(PRODUCT_SHEET, 5, &cells);
        assert!(matches!(
            ProductRow::decode(&row),
            Err(ImportError::Cell {
                column: "discount",
                ..
            })
        ));
    }
}
