//! Workbook importer.
//!
//! Four stages run in dependency order, each reading one sheet:
//! pickup points, products (with their categories, manufacturers and
//! suppliers), users, and orders. Every write is a get-or-create, so running
//! the same workbook twice adds nothing the second time. The run is not a
//! transaction; a fatal error leaves whatever earlier rows already wrote.

mod catalog;
mod labels;
mod orders;
mod pickup_points;
pub mod sheet;
mod users;

pub use catalog::ProductRow;
pub use labels::{RoleLabel, StatusLabel};
pub use orders::{
    customer_username, customer_username_candidate, parse_packed_items, resolve_pickup_point,
    OrderRow, PackedItem, PickupResolution,
};
pub use pickup_points::PickupPointRow;
pub use sheet::Workbook;
pub use users::{split_full_name, username_from_email, UserRow};

use crate::store::{Entity, Store, StoreError};
use std::fmt;
use std::path::PathBuf;
use strum::Display;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        source: calamine::Error,
    },
    #[error("sheet `{0}` is missing from the workbook")]
    MissingSheet(String),
    #[error("sheet `{sheet}` row {line}, column `{column}`: {reason}")]
    Cell {
        sheet: &'static str,
        line: usize,
        column: &'static str,
        reason: String,
    },
    #[error("orders reference pickup points but none exist")]
    NoPickupPoints,
    #[error("cannot hash password: {0}")]
    Credential(#[from] argon2::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a row was left out without failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowSkip {
    #[error("empty {0}")]
    EmptyKey(&'static str),
    #[error("email `{0}` is not in an allowed domain")]
    ForeignDomain(String),
    #[error("unreadable packed items: {0}")]
    BadItems(String),
}

pub enum Decoded<T> {
    Row(T),
    Skip(RowSkip),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Stage {
    #[strum(serialize = "pickup points")]
    PickupPoints,
    #[strum(serialize = "products")]
    Products,
    #[strum(serialize = "users")]
    Users,
    #[strum(serialize = "orders")]
    Orders,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub rows: usize,
    pub created: usize,
    pub existing: usize,
    pub skipped: usize,
    pub warnings: usize,
    /// Rows of the stage's entity in the store once the stage finished.
    pub total: i64,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            rows: 0,
            created: 0,
            existing: 0,
            skipped: 0,
            warnings: 0,
            total: 0,
        }
    }

    pub(crate) fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.existing += 1;
        }
    }

    pub(crate) fn skip(&mut self, sheet: &str, line: usize, reason: RowSkip) {
        self.skipped += 1;
        match &reason {
            RowSkip::EmptyKey(_) => log::debug!("{sheet} row {line} skipped: {reason}"),
            _ => log::warn!("{sheet} row {line} skipped: {reason}"),
        }
    }

    pub(crate) fn warn(&mut self, message: fmt::Arguments<'_>) {
        self.warnings += 1;
        log::warn!("{message}");
    }
}

fn counted(count: usize, one: &'static str, many: &'static str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imported {} {}", self.total, self.stage)?;
        if self.skipped > 0 || self.warnings > 0 {
            write!(
                f,
                " ({} skipped, {})",
                counted(self.skipped, "row", "rows"),
                counted(self.warnings, "warning", "warnings")
            )?;
        }
        Ok(())
    }
}

/// What [`Importer::run`] reports while it works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress<'r> {
    Started(Stage),
    Finished(&'r StageReport),
}

impl fmt::Display for Progress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Progress::Started(stage) => write!(f, "Importing {stage}..."),
            Progress::Finished(report) => write!(f, "{report}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub stages: Vec<StageReport>,
}

impl ImportReport {
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|report| report.stage == stage)
    }
}

/// Runs the import stages against a [`Store`].
pub struct Importer<'a, S: Store> {
    store: &'a mut S,
    email_domains: Vec<String>,
}

impl<'a, S: Store> Importer<'a, S> {
    /// `email_domains` lists the domains usernames may be derived from.
    pub fn new(store: &'a mut S, email_domains: Vec<String>) -> Self {
        Self {
            store,
            email_domains: email_domains
                .into_iter()
                .map(|domain| domain.to_lowercase())
                .collect(),
        }
    }

    /// Runs all four stages in order, telling `on_progress` when each starts
    /// and finishes.
    pub fn run(
        &mut self,
        workbook: &Workbook,
        mut on_progress: impl FnMut(Progress<'_>),
    ) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::default();
        for stage in [Stage::PickupPoints, Stage::Products, Stage::Users, Stage::Orders] {
            on_progress(Progress::Started(stage));
            let stage_report = match stage {
                Stage::PickupPoints => self.import_pickup_points(workbook)?,
                Stage::Products => self.import_products(workbook)?,
                Stage::Users => self.import_users(workbook)?,
                Stage::Orders => self.import_orders(workbook)?,
            };
            on_progress(Progress::Finished(&stage_report));
            report.stages.push(stage_report);
        }
        Ok(report)
    }

    fn finish(&mut self, mut report: StageReport, entity: Entity) -> Result<StageReport, ImportError> {
        report.total = self.store.count(entity)?;
        log::debug!(
            "{}: {} rows, {} created, {} existing",
            report.stage,
            report.rows,
            report.created,
            report.existing
        );
        Ok(report)
    }
}
