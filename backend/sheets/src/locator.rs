use std::sync::LazyLock;

use regex::Regex;

use crate::{
    error::SheetsError,
    layout::{cell_address, column_index, name_column},
    scan::{Line, scan},
};

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Column being written and the column holding the name it is matched by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetColumn {
    pub index: usize,
    pub name_index: usize,
}

impl TargetColumn {
    pub fn resolve(label: &str) -> Result<Self, SheetsError> {
        let index = column_index(label).ok_or_else(|| SheetsError::UnknownColumn(label.to_string()))?;
        let name_index = name_column(label).ok_or_else(|| SheetsError::NoNameColumn(label.to_string()))?;

        Ok(Self { index, name_index })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellTarget {
    /// Position in the fetched range, the header being 0.
    pub row_index: usize,
    pub column_index: usize,
}

impl CellTarget {
    pub fn address(&self, sheet: &str) -> String {
        cell_address(sheet, self.column_index, self.row_index)
    }
}

pub fn normalize_name(name: &str) -> String {
    WHITESPACE.replace_all(name, " ").trim().to_uppercase()
}

/// Finds the first row of `group` whose name column matches `name`.
pub fn locate(
    rows: &[Vec<String>],
    group: &str,
    name: &str,
    column: TargetColumn,
) -> Result<CellTarget, SheetsError> {
    let wanted = normalize_name(name);

    group_names(rows, group, column.name_index)
        .find(|(_, candidate)| normalize_name(candidate) == wanted)
        .map(|(row_index, _)| CellTarget {
            row_index,
            column_index: column.index,
        })
        .ok_or_else(|| SheetsError::NotFound {
            group: group.to_string(),
            name: name.to_string(),
        })
}

/// Names in `group` that an update could match, for diagnostics.
pub fn candidates(rows: &[Vec<String>], group: &str, name_index: usize) -> Vec<String> {
    group_names(rows, group, name_index)
        .map(|(_, name)| name.trim().to_string())
        .collect()
}

fn group_names<'a>(
    rows: &'a [Vec<String>],
    group: &'a str,
    name_index: usize,
) -> impl Iterator<Item = (usize, &'a str)> {
    scan(rows).filter_map(move |line| match line {
        Line::Data {
            index,
            group: current,
            cells,
        } if current == group && cells.len() > 1 => {
            Some((index, cells.get(name_index).map_or("", String::as_str)))
        }
        _ => None,
    })
}
