#![allow(dead_code)]

use calamine::{Data, Range};
use shop_backoffice::import::sheet::{ORDER_SHEET, PICKUP_POINT_SHEET, PRODUCT_SHEET, USER_SHEET};
use shop_backoffice::import::{ImportReport, Importer, Workbook};
use shop_backoffice::store::MemoryStore;

pub const PRODUCT_HEADER: [&str; 10] = [
    "Article", "Name", "Unit", "Price", "Supplier", "Manufacturer", "Category", "Discount",
    "Stock", "Description",
];
pub const ORDER_HEADER: [&str; 8] = [
    "Number", "Items", "Ordered", "Delivered", "Pickup point", "Customer", "Code", "Status",
];

pub fn text(value: &str) -> Data {
    Data::String(value.to_string())
}

/// A worksheet whose first row is `header`.
pub fn sheet(header: &[&str], rows: Vec<Vec<Data>>) -> Range<Data> {
    let width = rows
        .iter()
        .map(Vec::len)
        .chain([header.len()])
        .max()
        .unwrap_or(1) as u32;
    let height = rows.len() as u32 + 1;
    let mut range = Range::new((0, 0), (height - 1, width - 1));
    for (column, title) in header.iter().enumerate() {
        range.set_value((0, column as u32), text(title));
    }
    for (row, cells) in rows.into_iter().enumerate() {
        for (column, cell) in cells.into_iter().enumerate() {
            range.set_value((row as u32 + 1, column as u32), cell);
        }
    }
    range
}

pub fn product(article: &str, name: &str, price: f64, supplier: &str, discount: i64, stock: i64) -> Vec<Data> {
    vec![
        text(article),
        text(name),
        text("pcs"),
        Data::Float(price),
        text(supplier),
        text("Erich Krause"),
        text("Stationery"),
        Data::Int(discount),
        Data::Int(stock),
        text(""),
    ]
}

#[allow(clippy::too_many_arguments)]
pub fn order(
    number: i64,
    items: &str,
    date: &str,
    delivered: &str,
    pickup: i64,
    customer: &str,
    code: f64,
    status: &str,
) -> Vec<Data> {
    vec![
        Data::Int(number),
        text(items),
        text(date),
        text(delivered),
        Data::Int(pickup),
        text(customer),
        Data::Float(code),
        text(status),
    ]
}

/// Three pickup points, three products, three users (one from a foreign
/// domain, one with an unknown role) and two orders.
pub fn shop_sheets() -> Vec<(String, Range<Data>)> {
    let pickup_points = sheet(
        &["Address"],
        vec![
            vec![text("Lenina 1")],
            vec![text("Mira 7")],
            vec![Data::Empty],
            vec![text("Sadovaya 3")],
        ],
    );
    let products = sheet(
        &PRODUCT_HEADER,
        vec![
            product("A1", "Notebook", 10.0, "Kanc Trade", 0, 5),
            product("B2", "Pen", 5.0, "Office Line", 0, 12),
            product("C3", "Album", 100.0, "Kanc Trade", 25, 0),
        ],
    );
    let users = sheet(
        &["Role", "Full name", "Login", "Password"],
        vec![
            vec![
                text("Администратор"),
                text("Никифорова Весения Николаевна"),
                text("admin@kancmail.com"),
                text("secret"),
            ],
            vec![
                text("Суперпользователь"),
                text("Иванов Иван"),
                text("ivanov@kancmail.com"),
                text(""),
            ],
            vec![
                text("Клиент"),
                text("Петров Пётр"),
                text("petrov@gmail.com"),
                text("x"),
            ],
        ],
    );
    let orders = sheet(
        &ORDER_HEADER,
        vec![
            order(1, "A1, 2, B2, 3", "2022-02-27", "2022-04-20", 2, "Иванов Иван", 901.0, "Новый"),
            order(2, "A1, 1, ZZZ9, 4", "2022-03-01", "", 99, "Сидоров Сидор", 902.0, "Завершен"),
        ],
    );
    vec![
        (PICKUP_POINT_SHEET.to_string(), pickup_points),
        (PRODUCT_SHEET.to_string(), products),
        (USER_SHEET.to_string(), users),
        (ORDER_SHEET.to_string(), orders),
    ]
}

/// The shop workbook with some sheets swapped for `replacements`.
pub fn shop_workbook_with(replacements: Vec<(&str, Range<Data>)>) -> Workbook {
    let mut sheets = shop_sheets();
    for (name, range) in replacements {
        if let Some(slot) = sheets.iter_mut().find(|(existing, _)| existing == name) {
            slot.1 = range;
        }
    }
    Workbook::from_sheets(sheets)
}

pub fn shop_workbook() -> Workbook {
    Workbook::from_sheets(shop_sheets())
}

pub fn import(store: &mut MemoryStore) -> ImportReport {
    Importer::new(store, vec!["kancmail.com".to_string()])
        .run(&shop_workbook(), |_| {})
        .unwrap()
}
