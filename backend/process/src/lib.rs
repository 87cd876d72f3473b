//! # Sheets Dump
//!
//! Offline check of the attendee spreadsheets, without starting the server.
//!
//! 1. Authenticate with the same service account file the server uses.
//!
//! 2. List the worksheets of the spreadsheet, so a typo in `--sheet` is easy to spot.
//!
//! 3. Read every requested worksheet (all of them with `--all`) and group it by city.
//!
//! 4. Print the count per city and the first `--sample` records of each.
use std::path::Path;

use anyhow::{Context, bail};
use indicatif::{ProgressBar, ProgressStyle};
use sheets::{GroupedResult, SheetsClient};

pub mod utils;

use utils::{city_lines, record_line};

pub struct DumpOptions<'a> {
    pub spreadsheet_id: &'a str,
    pub credentials: &'a Path,
    pub sheets: Vec<String>,
    pub all: bool,
    pub sample: usize,
}

pub async fn dump(options: DumpOptions<'_>) -> anyhow::Result<()> {
    let client = SheetsClient::from_credentials_file(options.credentials)
        .await
        .with_context(|| format!("loading {}", options.credentials.display()))?;

    let available = client.worksheet_names(options.spreadsheet_id).await?;
    println!("Worksheets: {}\n", available.join(", "));

    let targets = if options.all {
        available.clone()
    } else {
        options.sheets
    };

    if let Some(missing) = targets.iter().find(|sheet| !available.contains(sheet)) {
        bail!("worksheet {missing} not found in {}", options.spreadsheet_id);
    }

    let results = read_all(&client, options.spreadsheet_id, &targets).await?;

    for (sheet, result) in targets.iter().zip(&results) {
        print_sheet(sheet, result, options.sample);
    }

    Ok(())
}

async fn read_all(
    client: &SheetsClient,
    spreadsheet_id: &str,
    sheets: &[String],
) -> anyhow::Result<Vec<GroupedResult>> {
    let pb = ProgressBar::new(sheets.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        )?
        .progress_chars("=> "),
    );

    let mut results = Vec::with_capacity(sheets.len());

    for sheet in sheets {
        pb.set_message(format!("Reading {sheet}"));

        let result = client
            .read_groups(spreadsheet_id, sheet)
            .await
            .with_context(|| format!("reading {sheet}"))?;
        results.push(result);

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    Ok(results)
}

fn print_sheet(sheet: &str, result: &GroupedResult, sample: usize) {
    println!("\n== {sheet} ==");
    println!("Total Records: {}", result.total_records());

    for line in city_lines(result) {
        println!("{line}");
    }

    if sample == 0 {
        return;
    }

    for (city, records) in result.groups() {
        for record in records.iter().take(sample) {
            println!("  {city}: {}", record_line(record));
        }
    }
}
