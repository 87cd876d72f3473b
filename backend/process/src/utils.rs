use sheets::{GroupedResult, Record};

/// One `CITY: count` line per city, padded so the counts line up.
pub fn city_lines(result: &GroupedResult) -> Vec<String> {
    let width = result
        .groups()
        .keys()
        .map(|city| city.chars().count())
        .max()
        .unwrap_or_default();

    result
        .counts()
        .into_iter()
        .map(|(city, count)| format!("{city:<width$}  {count}"))
        .collect()
}

/// Non-empty cells as `LABEL=value`, separated by ` | `.
pub fn record_line(record: &Record) -> String {
    record
        .iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(label, value)| format!("{label}={}", value.trim()))
        .collect::<Vec<_>>()
        .join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_city_lines_aligned() {
        let result = GroupedResult::from_rows(&rows(&[
            &["CREYENTES"],
            &["Juan", "Pedro"],
            &["MURCIA"],
            &["Ana"],
            &["Eva"],
        ]));

        assert_eq!(result.group_names(), vec!["CARTAGENA", "MURCIA"]);
        assert_eq!(city_lines(&result), vec!["CARTAGENA  1", "MURCIA     2"]);
    }

    #[test]
    fn test_record_line_skips_blank_cells() {
        let record = Record::from_cells(&["Juan".to_string(), " ".to_string(), "X ".to_string()]);

        assert_eq!(record_line(&record), "CREYENTES=Juan | MANILLA=X");
    }

    #[test]
    fn test_empty_sheet() {
        let result = GroupedResult::from_rows(&[]);

        assert!(city_lines(&result).is_empty());
    }
}
