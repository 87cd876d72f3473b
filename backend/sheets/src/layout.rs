//! Fixed shape of the attendee spreadsheets.

pub const HEADERS: [&str; 7] = [
    "CREYENTES",
    "HOMBRES",
    "MANILLA",
    "MENORES DE EDAD Y ACOMPAÑANTES",
    "MANILLA_2",
    "PERSONAS CON DISCAPACIDAD REDUCIDA Y ACOMPAÑANTE",
    "MANILLA_3",
];

pub const KNOWN_GROUPS: [&str; 6] = [
    "CARTAGENA",
    "MURCIA",
    "CASTELLÓN",
    "ELCHE",
    "TORREVIEJA",
    "BENIDORM",
];

pub const DEFAULT_GROUP: &str = KNOWN_GROUPS[0];

/// Columns whose value can be updated by person, paired with the column holding that person's name.
pub const NAME_COLUMNS: [(&str, usize); 3] = [("MANILLA", 1), ("MANILLA_2", 3), ("MANILLA_3", 5)];

pub const DATA_BOUNDS: &str = "A1:G1000";

pub fn sheet_range(sheet: &str) -> String {
    format!("{sheet}!{DATA_BOUNDS}")
}

pub fn column_index(label: &str) -> Option<usize> {
    HEADERS.iter().position(|header| *header == label)
}

pub fn name_column(label: &str) -> Option<usize> {
    NAME_COLUMNS
        .iter()
        .find(|(column, _)| *column == label)
        .map(|(_, index)| *index)
}

/// Known group named by the row's first cell, if any.
pub fn sentinel_group(row: &[String]) -> Option<&'static str> {
    let first = row.first()?.trim().to_uppercase();

    KNOWN_GROUPS.iter().copied().find(|group| *group == first)
}

pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();

    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }

    letters.iter().rev().collect()
}

/// A1 address of a cell, `row_index` counting the header as row 0.
pub fn cell_address(sheet: &str, column: usize, row_index: usize) -> String {
    format!("{sheet}!{}{}", column_letter(column), row_index + 1)
}
