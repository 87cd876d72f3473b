use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::{
    layout::{DEFAULT_GROUP, HEADERS},
    scan::{Line, scan},
};

/// One attendee row, always carrying a value for each of the fixed headers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    values: [String; HEADERS.len()],
}

impl Record {
    /// Missing cells become empty strings, cells past column G are dropped.
    pub fn from_cells(cells: &[String]) -> Self {
        Self {
            values: std::array::from_fn(|i| cells.get(i).cloned().unwrap_or_default()),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        HEADERS
            .iter()
            .position(|header| *header == label)
            .map(|i| self.values[i].as_str())
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        HEADERS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(HEADERS.len()))?;
        for (label, value) in self.iter() {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub present: bool,
}

/// Records partitioned by city, in the order the cities first appear.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct GroupedResult {
    groups: IndexMap<String, Vec<Record>>,
}

impl GroupedResult {
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let mut groups: IndexMap<String, Vec<Record>> = IndexMap::new();

        if rows.is_empty() {
            return Self { groups };
        }

        groups.insert(DEFAULT_GROUP.to_string(), Vec::new());

        for line in scan(rows) {
            match line {
                Line::Sentinel(group) => {
                    groups.entry(group.to_string()).or_default();
                }
                Line::Data { group, cells, .. } => {
                    groups
                        .entry(group.to_string())
                        .or_default()
                        .push(Record::from_cells(cells));
                }
            }
        }

        Self { groups }
    }

    pub fn groups(&self) -> &IndexMap<String, Vec<Record>> {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&[Record]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn counts(&self) -> IndexMap<String, usize> {
        self.groups
            .iter()
            .map(|(name, records)| (name.clone(), records.len()))
            .collect()
    }

    pub fn total_records(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// Columns seen on the first record of the first group, empty when that group has no records.
    pub fn columns(&self) -> IndexMap<String, ColumnInfo> {
        let Some(first) = self.groups.values().next().and_then(|records| records.first()) else {
            return IndexMap::new();
        };

        first
            .iter()
            .map(|(label, _)| {
                (
                    label.to_string(),
                    ColumnInfo {
                        name: label.to_string(),
                        present: true,
                    },
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    fn header() -> &'static [&'static str] {
        &["CREYENTES", "HOMBRES", "MANILLA", "x", "y", "z", "w"]
    }

    #[test]
    fn test_groups_by_city() {
        let rows = rows(&[
            header(),
            &["CARTAGENA"],
            &["Juan", "Pedro", "X", "", "", "", ""],
            &["MURCIA"],
            &["Ana", "Luis", "Y", "", "", "", ""],
        ]);
        let result = GroupedResult::from_rows(&rows);

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "CARTAGENA": [{
                    "CREYENTES": "Juan",
                    "HOMBRES": "Pedro",
                    "MANILLA": "X",
                    "MENORES DE EDAD Y ACOMPAÑANTES": "",
                    "MANILLA_2": "",
                    "PERSONAS CON DISCAPACIDAD REDUCIDA Y ACOMPAÑANTE": "",
                    "MANILLA_3": ""
                }],
                "MURCIA": [{
                    "CREYENTES": "Ana",
                    "HOMBRES": "Luis",
                    "MANILLA": "Y",
                    "MENORES DE EDAD Y ACOMPAÑANTES": "",
                    "MANILLA_2": "",
                    "PERSONAS CON DISCAPACIDAD REDUCIDA Y ACOMPAÑANTE": "",
                    "MANILLA_3": ""
                }]
            })
        );
        assert_eq!(result.group_names(), vec!["CARTAGENA", "MURCIA"]);
        assert_eq!(result.total_records(), 2);
    }

    #[test]
    fn test_rows_before_sentinel_use_default_group() {
        let rows = rows(&[header(), &["Early"], &["ELCHE"], &["Late"]]);
        let result = GroupedResult::from_rows(&rows);

        assert_eq!(result.group("CARTAGENA").unwrap()[0].get("CREYENTES"), Some("Early"));
        assert_eq!(result.group("ELCHE").unwrap()[0].get("CREYENTES"), Some("Late"));
    }

    #[test]
    fn test_sentinel_with_extra_cells_is_not_a_record() {
        let rows = rows(&[header(), &[" benidorm ", "Pedro", "X"], &["Ana"]]);
        let result = GroupedResult::from_rows(&rows);

        assert_eq!(result.group("CARTAGENA").unwrap().len(), 0);
        assert_eq!(result.group("BENIDORM").unwrap().len(), 1);
        assert_eq!(result.total_records(), 1);
    }

    #[test]
    fn test_ragged_rows_padded_and_truncated() {
        let rows = rows(&[
            header(),
            &["Solo"],
            &["a", "b", "c", "d", "e", "f", "g", "h", "i"],
        ]);
        let result = GroupedResult::from_rows(&rows);
        let records = result.group("CARTAGENA").unwrap();

        assert!(records.iter().all(|record| record.values().len() == 7));
        assert_eq!(records[0].get("HOMBRES"), Some(""));
        assert_eq!(records[0].get("MANILLA_3"), Some(""));
        assert_eq!(records[1].get("MANILLA_3"), Some("g"));
    }

    #[test]
    fn test_unknown_tokens_and_empty_rows() {
        let rows = rows(&[header(), &[], &["MADRID", "Luis"], &[]]);
        let result = GroupedResult::from_rows(&rows);

        assert_eq!(result.group("CARTAGENA").unwrap()[0].get("CREYENTES"), Some("MADRID"));
        assert_eq!(result.total_records(), 1);
    }

    #[test]
    fn test_header_is_never_a_label_source() {
        let rows = rows(&[&["MURCIA", "foo"], &["Juan"]]);
        let result = GroupedResult::from_rows(&rows);

        assert_eq!(result.group_names(), vec!["CARTAGENA"]);
        assert_eq!(result.group("CARTAGENA").unwrap()[0].get("CREYENTES"), Some("Juan"));
    }

    #[test]
    fn test_empty_and_header_only() {
        assert!(GroupedResult::from_rows(&[]).groups().is_empty());

        let only_header = GroupedResult::from_rows(&rows(&[header()]));
        assert_eq!(only_header.counts().get("CARTAGENA"), Some(&0));
        assert!(only_header.columns().is_empty());
    }

    #[test]
    fn test_repeated_sentinel_appends() {
        let rows = rows(&[header(), &["MURCIA"], &["a"], &["ELCHE"], &["b"], &["MURCIA"], &["c"]]);
        let result = GroupedResult::from_rows(&rows);

        assert_eq!(result.group_names(), vec!["CARTAGENA", "MURCIA", "ELCHE"]);
        assert_eq!(result.counts().get("MURCIA"), Some(&2));
        assert_eq!(result, GroupedResult::from_rows(&rows));
    }

    #[test]
    fn test_columns_from_first_record() {
        let rows = rows(&[header(), &["Juan"]]);
        let columns = GroupedResult::from_rows(&rows).columns();

        assert_eq!(columns.len(), 7);
        assert_eq!(columns.get_index(2).unwrap().0, "MANILLA");
        assert!(columns.values().all(|info| info.present));
    }
}
