// src/extractors/table.rs
//
// Recovers logical structure from legacy filing tables, where header rows
// are as often bold centered <td> cells as real <th> markup.

use crate::utils::error::ExtractError;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Selector};
use std::collections::{BTreeMap, HashSet};

static TR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr").expect("Failed to compile TR_SELECTOR"));
static TD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("td").expect("Failed to compile TD_SELECTOR"));
static TH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("th").expect("Failed to compile TH_SELECTOR"));
static BOLD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("b").expect("Failed to compile BOLD_SELECTOR"));

fn cell_text(cell: ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn has_bold(cell: ElementRef) -> bool {
    cell.select(&BOLD_SELECTOR).next().is_some()
}

/// Returns the explicit headers of a table: the trimmed `<th>` texts of the
/// first row. Authoritative when present. Later rows marked up with `<th>`
/// are left to `logical_headers`, which treats them as wrapped header
/// continuations.
pub fn headers(table: ElementRef) -> Vec<String> {
    match table.select(&TR_SELECTOR).next() {
        Some(row) => row.select(&TH_SELECTOR).map(cell_text).collect(),
        None => Vec::new(),
    }
}

/// Infers column headers when no explicit `<th>` markup exists.
///
/// A cell counts as a header fragment iff it is center-aligned (for `<th>`
/// fallback cells, any `align` attribute) and contains bold text. Fragments
/// accumulate per column index across rows, space-joined, which recovers
/// wrapped headers rendered as stacked cells. Headers are assumed
/// contiguous from the top: the first non-qualifying cell at an
/// accumulated index closes that index for good.
pub fn logical_headers(table: ElementRef) -> Vec<String> {
    let explicit = headers(table);
    if !explicit.is_empty() {
        return explicit;
    }

    let mut fragments: BTreeMap<usize, String> = BTreeMap::new();
    let mut closed: HashSet<usize> = HashSet::new();

    for row in table.select(&TR_SELECTOR).skip(1) {
        let tds: Vec<ElementRef> = row.select(&TD_SELECTOR).collect();
        if tds.is_empty() {
            let ths: Vec<ElementRef> = row.select(&TH_SELECTOR).collect();
            accumulate_row(&ths, is_header_th, &mut fragments, &mut closed);
        } else {
            accumulate_row(&tds, is_header_td, &mut fragments, &mut closed);
        }
    }
    fragments.into_values().collect()
}

fn is_header_td(cell: ElementRef) -> bool {
    cell.value().attr("align") == Some("center") && has_bold(cell)
}

fn is_header_th(cell: ElementRef) -> bool {
    cell.value().attr("align").is_some() && has_bold(cell)
}

fn accumulate_row(
    cells: &[ElementRef],
    qualifies: fn(ElementRef) -> bool,
    fragments: &mut BTreeMap<usize, String>,
    closed: &mut HashSet<usize>,
) {
    for (idx, cell) in cells.iter().enumerate() {
        if qualifies(*cell) {
            if !closed.contains(&idx) {
                let txt = cell_text(*cell);
                fragments
                    .entry(idx)
                    .and_modify(|existing| {
                        existing.push(' ');
                        existing.push_str(&txt);
                    })
                    .or_insert(txt);
            }
        } else if fragments.contains_key(&idx) {
            closed.insert(idx);
            break;
        }
    }
}

/// Collects data rows: every row after the first, cell texts trimmed, with
/// lone `"$"` cells dropped. Rows may be ragged; no padding is performed.
/// Legacy tables occasionally mark data cells as `<th>`, so those serve as
/// a fallback when a row has no `<td>` at all.
pub fn rows(table: ElementRef) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    for row in table.select(&TR_SELECTOR).skip(1) {
        let mut cells: Vec<String> = row.select(&TD_SELECTOR).map(cell_text).collect();
        if cells.is_empty() {
            cells = row.select(&TH_SELECTOR).map(cell_text).collect();
        }
        cells.retain(|c| c != "$");
        out.push(cells);
    }
    out
}

/// Serializes the table as comma-delimited text, quote-qualified where
/// needed: the explicit header row first, then the data rows.
pub fn serialize(table: ElementRef) -> Result<String, ExtractError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    write_record(&mut writer, &headers(table))?;
    for row in rows(table) {
        write_record(&mut writer, &row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ExtractError::TableSerialize(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExtractError::TableSerialize(e.to_string()))
}

fn write_record<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    cells: &[String],
) -> Result<(), ExtractError> {
    // The csv writer rejects zero-field records; a header-less table (or a
    // row reduced to nothing) serializes as a blank line instead.
    let result = if cells.is_empty() {
        writer.write_record([""])
    } else {
        writer.write_record(cells)
    };
    result.map_err(|e| ExtractError::TableSerialize(e.to_string()))
}
