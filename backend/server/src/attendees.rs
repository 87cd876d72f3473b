use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State as AxumState, rejection::JsonRejection},
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value, json};
use sheets::{CellUpdate, ColumnInfo, GroupedResult};
use tracing::{info, warn};

use crate::{config::SheetKind, error::AppError, state::State, utils::payload};

pub const DEFAULT_SHEET: &str = "Hoja1";

#[derive(Debug, Default, Deserialize)]
pub struct SheetQuery {
    pub tipo: Option<String>,
    pub sheet: Option<String>,
}

impl SheetQuery {
    /// Unknown or missing types read the men's spreadsheet.
    fn kind(&self) -> SheetKind {
        match self.tipo.as_deref().map(str::parse::<SheetKind>) {
            Some(Ok(kind)) => kind,
            Some(Err(_)) => {
                warn!("Unknown tipo {:?}, reading hombres", self.tipo);
                SheetKind::Hombres
            }
            None => SheetKind::Hombres,
        }
    }

    fn sheet(&self) -> &str {
        sheet_or_default(self.sheet.as_deref())
    }
}

fn sheet_or_default(sheet: Option<&str>) -> &str {
    sheet
        .map(str::trim)
        .filter(|sheet| !sheet.is_empty())
        .unwrap_or(DEFAULT_SHEET)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    pub success: bool,
    pub ciudades: GroupedResult,
    pub total_registros: usize,
    pub ciudades_disponibles: Vec<String>,
    pub total_por_ciudad: IndexMap<String, usize>,
    pub columnas: IndexMap<String, ColumnInfo>,
    pub spreadsheet_id: String,
    pub sheet: String,
}

impl SheetData {
    fn new(ciudades: GroupedResult, spreadsheet_id: &str, sheet: &str) -> Self {
        Self {
            success: true,
            total_registros: ciudades.total_records(),
            ciudades_disponibles: ciudades.group_names(),
            total_por_ciudad: ciudades.counts(),
            columnas: ciudades.columns(),
            ciudades,
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet: sheet.to_string(),
        }
    }
}

async fn read_sheet(state: &State, kind: SheetKind, sheet: &str) -> Result<SheetData, AppError> {
    let spreadsheet_id = state.config.spreadsheet_ids.get(kind);
    let ciudades = state.sheets()?.read_groups(spreadsheet_id, sheet).await?;

    info!(
        "Read {} records in {} cities from {} {sheet}",
        ciudades.total_records(),
        ciudades.groups().len(),
        kind.as_str()
    );

    Ok(SheetData::new(ciudades, spreadsheet_id, sheet))
}

pub async fn hombres_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<SheetQuery>,
) -> Result<Json<SheetData>, AppError> {
    read_sheet(&state, SheetKind::Hombres, query.sheet())
        .await
        .map(Json)
}

pub async fn mujeres_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<SheetQuery>,
) -> Result<Json<SheetData>, AppError> {
    read_sheet(&state, SheetKind::Mujeres, query.sheet())
        .await
        .map(Json)
}

pub async fn data_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<SheetQuery>,
) -> Result<Json<SheetData>, AppError> {
    read_sheet(&state, query.kind(), query.sheet())
        .await
        .map(Json)
}

pub async fn worksheets_handler(
    AxumState(state): AxumState<Arc<State>>,
    Query(query): Query<SheetQuery>,
) -> Result<Json<Value>, AppError> {
    let kind = query.kind();
    let spreadsheet_id = state.config.spreadsheet_ids.get(kind);
    let sheets = state.sheets()?.worksheet_names(spreadsheet_id).await?;

    Ok(Json(json!({
        "success": true,
        "tipo": kind,
        "spreadsheetId": spreadsheet_id,
        "sheets": sheets,
    })))
}

pub async fn check_connection_handler(
    AxumState(state): AxumState<Arc<State>>,
) -> Result<Json<Value>, AppError> {
    state.sheets()?.check_connection().await?;

    Ok(Json(json!({
        "success": true,
        "message": "Connected to Google Sheets",
        "spreadsheetIds": state.config.spreadsheet_ids,
    })))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CellInput {
    Text(String),
    Number(Number),
    Bool(bool),
}

impl CellInput {
    fn to_json(&self) -> Value {
        match self {
            CellInput::Text(text) => Value::String(text.clone()),
            CellInput::Number(n) => Value::Number(n.clone()),
            CellInput::Bool(b) => Value::Bool(*b),
        }
    }

    fn into_text(self) -> String {
        match self {
            CellInput::Text(text) => text,
            CellInput::Number(n) => n.to_string(),
            CellInput::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub tipo: Option<String>,
    pub ciudad: Option<String>,
    pub nombre_persona: Option<String>,
    pub columna: Option<String>,
    pub valor: Option<CellInput>,
    pub sheet: Option<String>,
}

/// An update request with every required field present.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidUpdate {
    pub kind: SheetKind,
    pub city: String,
    pub name: String,
    pub column: String,
    pub value: String,
    /// `valor` as sent, echoed back as `newValue`.
    pub echo: Value,
    pub sheet: String,
}

fn required(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl UpdateRequest {
    pub fn validate(self) -> Result<ValidUpdate, AppError> {
        let sheet = sheet_or_default(self.sheet.as_deref()).to_string();

        let (Some(tipo), Some(city), Some(name), Some(column), Some(value)) = (
            required(self.tipo),
            required(self.ciudad),
            required(self.nombre_persona),
            required(self.columna),
            self.valor,
        ) else {
            return Err(AppError::MalformedPayload(
                "tipo, ciudad, nombrePersona, columna and valor are required".to_string(),
            ));
        };

        Ok(ValidUpdate {
            kind: tipo.parse()?,
            city: city.to_uppercase(),
            name,
            column,
            echo: value.to_json(),
            value: value.into_text(),
            sheet,
        })
    }
}

pub async fn update_handler(
    AxumState(state): AxumState<Arc<State>>,
    request: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let update = payload(request)?.validate()?;
    let client = state.sheets()?;

    let outcome = client
        .update_cell(&CellUpdate {
            spreadsheet_id: state.config.spreadsheet_ids.get(update.kind),
            sheet: &update.sheet,
            group: &update.city,
            name: &update.name,
            column: &update.column,
            value: &update.value,
        })
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("{} updated for {}", update.column, update.name),
        "updatedCell": outcome.updated_cell,
        "newValue": update.echo,
    })))
}
