use std::{iter::Enumerate, iter::Skip, slice::Iter};

use crate::layout::{DEFAULT_GROUP, sentinel_group};

/// One meaningful row of a range, as seen by a top-to-bottom walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// A city row, every following data row belongs to this group.
    Sentinel(&'static str),
    Data {
        /// Position in the fetched range, the header being 0.
        index: usize,
        group: &'static str,
        cells: &'a [String],
    },
}

/// Walks the rows after the header, tracking the group in effect. Empty rows are skipped.
pub struct Scan<'a> {
    rows: Skip<Enumerate<Iter<'a, Vec<String>>>>,
    group: &'static str,
}

pub fn scan(rows: &[Vec<String>]) -> Scan<'_> {
    Scan {
        rows: rows.iter().enumerate().skip(1),
        group: DEFAULT_GROUP,
    }
}

impl<'a> Iterator for Scan<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, row) in self.rows.by_ref() {
            if row.is_empty() {
                continue;
            }

            if let Some(group) = sentinel_group(row) {
                self.group = group;
                return Some(Line::Sentinel(group));
            }

            return Some(Line::Data {
                index,
                group: self.group,
                cells: row,
            });
        }

        None
    }
}
