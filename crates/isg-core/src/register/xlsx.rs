use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use rust_decimal::Decimal;

use super::{ParsedRegister, RegisterEntry, SkippedRow};
use crate::error::IsgError;
use crate::values::{f64_to_decimal, parse_decimal};

/// Rows searched for the header line.
const HEADER_SEARCH_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Hazard,
    Risk,
    Probability,
    Severity,
    Frequency,
    Score,
}

/// Checked in order: "Risk Skoru" is a score column, not a risk column.
const HEADER_KEYWORDS: &[(Column, &[&str])] = &[
    (Column::Score, &["score", "skor", "puan"]),
    (Column::Probability, &["probability", "likelihood", "olasılık", "olasilik"]),
    (Column::Frequency, &["frequency", "exposure", "frekans"]),
    (Column::Severity, &["severity", "consequence", "şiddet", "siddet"]),
    (Column::Hazard, &["hazard", "tehlike"]),
    (Column::Risk, &["risk"]),
];

#[derive(Debug, Default, PartialEq, Eq)]
struct ColumnMap {
    hazard: Option<usize>,
    risk: Option<usize>,
    probability: Option<usize>,
    severity: Option<usize>,
    frequency: Option<usize>,
    score: Option<usize>,
}

/// Parse the first worksheet of a risk register workbook.
///
/// The header row is found by column names (English or Turkish); data rows
/// follow it until the first row without a hazard.
pub fn parse_register_xlsx(bytes: &[u8]) -> Result<ParsedRegister, IsgError> {
    let cursor = Cursor::new(bytes);
    let mut workbook: Xlsx<_> = calamine::open_workbook_from_rs(cursor)
        .map_err(|e| IsgError::Register(format!("failed to open xlsx: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IsgError::Register("workbook has no worksheets".into()))?;
    let sheet = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| IsgError::Register(format!("sheet '{sheet_name}' unreadable: {e}")))?;
    let first_row = sheet.start().map(|(r, _)| r).unwrap_or(0);

    let rows: Vec<&[Data]> = sheet.rows().collect();
    let (header_idx, columns) = rows
        .iter()
        .take(HEADER_SEARCH_ROWS)
        .enumerate()
        .find_map(|(i, row)| locate_columns(row).map(|cols| (i, cols)))
        .ok_or_else(|| {
            IsgError::Register(format!(
                "no header row with a hazard column in the first {HEADER_SEARCH_ROWS} rows of '{sheet_name}'"
            ))
        })?;

    let mut entries = Vec::new();
    let mut skipped = Vec::new();

    for (offset, row) in rows.iter().enumerate().skip(header_idx + 1) {
        let hazard = match columns.hazard.and_then(|c| row.get(c)).and_then(cell_as_string) {
            Some(h) => h,
            None => break,
        };
        let source_row = first_row + offset as u32 + 1;

        let mut entry = RegisterEntry {
            hazard,
            risk: columns.risk.and_then(|c| row.get(c)).and_then(cell_as_string),
            source_row: Some(source_row),
            ..Default::default()
        };

        let numeric = [
            (columns.probability, &mut entry.probability, "probability"),
            (columns.severity, &mut entry.severity, "severity"),
            (columns.frequency, &mut entry.frequency, "frequency"),
            (columns.score, &mut entry.score, "score"),
        ];
        let mut problem = None;
        for (col, slot, name) in numeric {
            let Some(cell) = col.and_then(|c| row.get(c)) else {
                continue;
            };
            match cell_as_decimal(cell) {
                Ok(value) => *slot = value,
                Err(text) => {
                    problem = Some(format!("non-numeric {name} '{text}'"));
                    break;
                }
            }
        }

        match problem {
            Some(reason) => skipped.push(SkippedRow {
                row_text: format!("row {}: {}", source_row, entry.hazard),
                reason,
            }),
            None => entries.push(entry),
        }
    }

    if entries.is_empty() && skipped.is_empty() {
        return Err(IsgError::Register(format!(
            "no register rows found in '{sheet_name}'"
        )));
    }

    Ok(ParsedRegister { entries, skipped })
}

fn classify_header(text: &str) -> Option<Column> {
    let header = text.trim().to_lowercase();
    HEADER_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| header.contains(w)))
        .map(|(column, _)| *column)
}

/// Map header cells to columns. A row only qualifies with a hazard column.
fn locate_columns(row: &[Data]) -> Option<ColumnMap> {
    let mut map = ColumnMap::default();
    for (i, cell) in row.iter().enumerate() {
        let Some(text) = cell_as_string(cell) else {
            continue;
        };
        let slot = match classify_header(&text) {
            Some(Column::Hazard) => &mut map.hazard,
            Some(Column::Risk) => &mut map.risk,
            Some(Column::Probability) => &mut map.probability,
            Some(Column::Severity) => &mut map.severity,
            Some(Column::Frequency) => &mut map.frequency,
            Some(Column::Score) => &mut map.score,
            None => continue,
        };
        // First matching column wins.
        slot.get_or_insert(i);
    }
    map.hazard.is_some().then_some(map)
}

fn cell_as_string(cell: &Data) -> Option<String> {
    match cell {
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Empty => None,
        _ => Some(format!("{cell}")),
    }
}

/// Empty cells are `Ok(None)`; text that is not a number is `Err(text)`.
fn cell_as_decimal(cell: &Data) -> Result<Option<Decimal>, String> {
    match cell {
        Data::Float(f) => Ok(Some(f64_to_decimal(*f))),
        Data::Int(i) => Ok(Some(Decimal::from(*i))),
        Data::Empty => Ok(None),
        Data::String(s) if s.trim().is_empty() => Ok(None),
        Data::String(s) => parse_decimal(s).map(Some).map_err(|_| s.clone()),
        other => Err(format!("{other}")),
    }
}
