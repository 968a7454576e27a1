use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::model::{Catalog, Coin, Command, Product, UnknownName};
use crate::Engine;

/// Errors that can occur when reading command scripts
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("failed to open command script: {0}")]
    Open(#[from] io::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized command '{command}'")]
    UnrecognizedCommand { line: usize, command: String },

    #[error("line {line}: {command} missing argument")]
    MissingArgument { line: usize, command: String },

    #[error("line {line}: {source}")]
    UnknownName { line: usize, source: UnknownName },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    command: String,
    arg: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    kind: &'a str,
    name: &'a str,
    quantity: u64,
}

/// Read commands from a csv file
pub fn read_commands(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<Command, CsvError>>, CsvError> {
    let file = File::open(path)?;
    Ok(read_commands_from(file))
}

/// Read commands from any csv source with a `command,arg` header
pub fn read_commands_from<R: io::Read>(
    reader: R,
) -> impl Iterator<Item = Result<Command, CsvError>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            parse_row(line, row)
        })
}

fn parse_row(line: usize, row: InputRow) -> Result<Command, CsvError> {
    let command = row.command.to_ascii_lowercase();
    let arg = || {
        row.arg
            .as_deref()
            .filter(|arg| !arg.is_empty())
            .ok_or_else(|| CsvError::MissingArgument {
                line,
                command: command.clone(),
            })
    };
    let unknown = |source| CsvError::UnknownName { line, source };

    match command.as_str() {
        "select" => Ok(Command::Select(arg()?.parse::<Product>().map_err(unknown)?)),
        "insert" => Ok(Command::Insert(arg()?.parse::<Coin>().map_err(unknown)?)),
        "collect" => Ok(Command::Collect),
        "refund" => Ok(Command::Refund),
        "reset" => Ok(Command::Reset),
        _ => Err(CsvError::UnrecognizedCommand {
            line,
            command: row.command.clone(),
        }),
    }
}

/// Write the stock and sales report in csv format
pub fn write_report(engine: &Engine, writer: impl io::Write) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);

    for (product, count) in engine.product_inventory().iter() {
        writer.serialize(ReportRow {
            kind: "product",
            name: product.name(),
            quantity: count.into(),
        })?;
    }

    for (coin, count) in engine.coin_inventory().iter() {
        writer.serialize(ReportRow {
            kind: "coin",
            name: coin.name(),
            quantity: count.into(),
        })?;
    }

    writer.serialize(ReportRow {
        kind: "sales",
        name: "total",
        quantity: engine.total_sales().cents(),
    })?;

    writer.flush()?;
    Ok(())
}
