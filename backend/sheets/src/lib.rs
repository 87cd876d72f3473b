//! # Sheets
//!
//! Google Sheets synchronization for the attendee spreadsheets.
//!
//! ## Sheet Layout
//!
//! - Columns A-G, read as `<sheet>!A1:G1000`
//! - Row 1 is a header and is always discarded, the labels come from [`layout::HEADERS`]
//! - A row whose first cell is a known city (see [`layout::KNOWN_GROUPS`]) opens a new group
//! - Every other non-empty row is a record of the group currently open
//! - Rows before the first city row belong to `CARTAGENA`
//!
//! ## Reading
//!
//! [`SheetsClient::read_groups`] fetches the range and partitions it into a [`GroupedResult`].
//! Nothing is cached, every call goes back to the spreadsheet.
//!
//! ## Updating
//!
//! [`SheetsClient::update_cell`] fetches the range again, walks the same groups, and looks for the
//! row whose name column matches the requested person. Names are compared after collapsing
//! whitespace and uppercasing, nothing fuzzier than that.
//!
//! ### Known Race
//!
//! Rows are located by re-scanning at update time. There is no row id or version check, so if the
//! sheet is edited between the caller's read and the update (rows inserted, a person renamed), the
//! write lands on whatever row matches at that moment.

pub mod auth;
pub mod client;
pub mod error;
pub mod grouper;
pub mod layout;
pub mod locator;
pub mod scan;
pub mod sync;
pub mod value;

pub use client::SheetsClient;
pub use error::SheetsError;
pub use grouper::{ColumnInfo, GroupedResult, Record};
pub use sync::{CellUpdate, UpdateOutcome};
pub use value::CellValue;
