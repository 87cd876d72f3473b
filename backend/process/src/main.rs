use std::path::PathBuf;

use clap::Parser;
use process::{DumpOptions, dump};

/// Prints the attendee spreadsheet grouped by city.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    spreadsheet_id: String,

    #[arg(long, default_value = "config/google-credentials.json")]
    credentials: PathBuf,

    /// Worksheet to read, repeatable.
    #[arg(long = "sheet", default_value = "Hoja1")]
    sheets: Vec<String>,

    /// Read every worksheet in the spreadsheet.
    #[arg(long)]
    all: bool,

    /// Records to print per city.
    #[arg(long, default_value_t = 3)]
    sample: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dump(DumpOptions {
        spreadsheet_id: &args.spreadsheet_id,
        credentials: &args.credentials,
        sheets: args.sheets,
        all: args.all,
        sample: args.sample,
    })
    .await
}
