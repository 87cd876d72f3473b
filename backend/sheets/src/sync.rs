use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    client::SheetsClient,
    error::SheetsError,
    grouper::GroupedResult,
    layout::sheet_range,
    locator::{TargetColumn, candidates, locate},
    value::CellValue,
};

/// Request to overwrite one cell of the row belonging to `name` within `group`.
#[derive(Debug, Clone)]
pub struct CellUpdate<'a> {
    pub spreadsheet_id: &'a str,
    pub sheet: &'a str,
    pub group: &'a str,
    pub name: &'a str,
    pub column: &'a str,
    pub value: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub updated_cell: String,
    /// The value as requested, before numeric coercion.
    pub new_value: String,
    pub written: CellValue,
}

impl SheetsClient {
    pub async fn read_groups(
        &self,
        spreadsheet_id: &str,
        sheet: &str,
    ) -> Result<GroupedResult, SheetsError> {
        let rows = self.fetch_range(spreadsheet_id, &sheet_range(sheet)).await?;

        if rows.is_empty() {
            info!("No data found in {sheet}");
        }

        Ok(GroupedResult::from_rows(&rows))
    }

    pub async fn update_cell(&self, update: &CellUpdate<'_>) -> Result<UpdateOutcome, SheetsError> {
        let column = TargetColumn::resolve(update.column)?;

        let rows = self
            .fetch_range(update.spreadsheet_id, &sheet_range(update.sheet))
            .await?;
        if rows.is_empty() {
            return Err(SheetsError::EmptyRange);
        }

        debug!(
            "Looking for \"{}\" in {} across {} rows",
            update.name,
            update.group,
            rows.len()
        );

        let target = locate(&rows, update.group, update.name, column).inspect_err(|_| {
            warn!("\"{}\" not found in {}", update.name, update.group);
            debug!(
                "Names available in {}: {:?}",
                update.group,
                candidates(&rows, update.group, column.name_index)
            );
        })?;

        let address = target.address(update.sheet);
        let written = CellValue::coerce(update.value);

        self.write_cell(update.spreadsheet_id, &address, &written)
            .await?;

        info!("Updated {address} for \"{}\" in {}", update.name, update.group);

        Ok(UpdateOutcome {
            updated_cell: address,
            new_value: update.value.to_string(),
            written,
        })
    }
}
