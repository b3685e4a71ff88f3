//! Output formatting helpers for the `folio` CLI.
//!
//! Provides JSON output and a plain-text rendering of interpreted
//! worksheets: markup verbatim, tables and records as aligned columns.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::Value;

use folio_core::token::tokens_to_string;
use folio_interpret::{CellValue, InterpretResult, RenderedItem};

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Print an interpreted worksheet, followed by any pending commands.
pub fn output_result(result: &InterpretResult, commands: &[Vec<String>]) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = write_result(&mut handle, result, commands);
}

/// Write an interpreted worksheet as plain text.
pub fn write_result<W: Write>(
    out: &mut W,
    result: &InterpretResult,
    commands: &[Vec<String>],
) -> io::Result<()> {
    if let Some(title) = &result.title {
        writeln!(out, "# {}", title)?;
        writeln!(out)?;
    }

    for item in &result.items {
        match item {
            RenderedItem::Markup { text } => writeln!(out, "{}", text)?,
            RenderedItem::Reference { display, value, .. } => {
                writeln!(out, "[{}] {}", display, cell_text(value))?;
            }
            RenderedItem::Record { header, rows, .. } => {
                let rows: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| vec![row.key.clone(), cell_text(&row.value)])
                    .collect();
                write_table(out, &[header.0.as_str(), header.1.as_str()], &rows)?;
                writeln!(out)?;
            }
            RenderedItem::Table { header, rows, .. } => {
                let headers: Vec<&str> = header.iter().map(String::as_str).collect();
                let rows: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| {
                        header
                            .iter()
                            .map(|column| row.get(column).map(cell_text).unwrap_or_default())
                            .collect()
                    })
                    .collect();
                write_table(out, &headers, &rows)?;
                writeln!(out)?;
            }
            RenderedItem::Worksheet { worksheet } => {
                writeln!(out, "[worksheet {}]{{{{{}}}}}", worksheet.name, worksheet.uuid)?;
            }
            RenderedItem::Search(block) => {
                writeln!(out, "% search {}", tokens_to_string(&block.keywords))?;
            }
        }
    }

    if !commands.is_empty() {
        writeln!(out)?;
        writeln!(out, "Pending commands:")?;
        for command in commands {
            writeln!(out, "  {}", tokens_to_string(command))?;
        }
    }
    Ok(())
}

/// Display text of a cell: strings bare, null empty, deferred values as
/// the file they point at.
pub fn cell_text(cell: &CellValue) -> String {
    match cell {
        CellValue::Deferred(deferred) => format!("<{}{}>", deferred.bundle_uuid, deferred.genpath),
        CellValue::Value(Value::Null) => String::new(),
        CellValue::Value(Value::String(s)) => s.clone(),
        CellValue::Value(other) => other.to_string(),
    }
}

/// Write rows as aligned columns under a header and a dashed separator.
///
/// Nothing is written if `rows` is empty.
pub fn write_table<W: Write>(out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let line = |cells: &mut dyn Iterator<Item = String>| -> String {
        cells
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(&mut headers.iter().map(|h| h.to_string())))?;
    writeln!(out, "{}", line(&mut widths.iter().map(|w| "-".repeat(*w))))?;
    for row in rows {
        writeln!(out, "{}", line(&mut row.iter().cloned()))?;
    }
    Ok(())
}
