use super::sheet::{SheetRow, PICKUP_POINT_SHEET};
use super::{Decoded, ImportError, Importer, RowSkip, Stage, StageReport, Workbook};
use crate::store::{Entity, Store};

const ADDRESS: usize = 0;
const ADDRESS_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupPointRow {
    pub line: usize,
    pub address: String,
}

impl PickupPointRow {
    pub fn decode(row: &SheetRow<'_>) -> Result<Decoded<Self>, ImportError> {
        let address = row.bounded_text(ADDRESS, "address", ADDRESS_MAX_CHARS)?;
        if address.is_empty() {
            return Ok(Decoded::Skip(RowSkip::EmptyKey("address")));
        }
        Ok(Decoded::Row(Self {
            line: row.line,
            address,
        }))
    }
}

impl<S: Store> Importer<'_, S> {
    pub fn import_pickup_points(&mut self, workbook: &Workbook) -> Result<StageReport, ImportError> {
        let mut report = StageReport::new(Stage::PickupPoints);
        for row in workbook.data_rows(PICKUP_POINT_SHEET)? {
            report.rows += 1;
            match PickupPointRow::decode(&row)? {
                Decoded::Row(point) => self.load_pickup_point(&point, &mut report)?,
                Decoded::Skip(reason) => report.skip(PICKUP_POINT_SHEET, row.line, reason),
            }
        }
        self.finish(report, Entity::PickupPoint)
    }

    pub fn load_pickup_point(
        &mut self,
        row: &PickupPointRow,
        report: &mut StageReport,
    ) -> Result<(), ImportError> {
        let (_, created) = self.store.get_or_create_pickup_point(&row.address)?;
        report.record(created);
        Ok(())
    }
}
