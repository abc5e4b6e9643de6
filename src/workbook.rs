use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use tracing::debug;

use crate::error::{Error, Result};

/// Read the requested A1-style addresses from the workbook's first sheet and
/// normalize each to a display string. Values are the stored calculated
/// results; formulas are never re-evaluated.
///
/// Failures are isolated per cell: a bad address or unreadable cell yields ""
/// for that address only. Only failing to open the workbook or its first
/// sheet fails the whole call.
pub fn read_cells(path: &Path, addresses: &[String]) -> Result<HashMap<String, String>> {
    let mut workbook: Xlsx<_> = open_workbook(path)
        .map_err(|e| Error::Workbook(format!("failed to open {}: {e}", path.display())))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| Error::Workbook(format!("{} has no sheets", path.display())))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| Error::Workbook(format!("failed to read sheet {sheet_name}: {e}")))?;

    let mut out = HashMap::new();
    for addr in addresses {
        out.insert(addr.clone(), read_one(&range, addr));
    }
    debug!(sheet = %sheet_name, cells = out.len(), "workbook read");
    Ok(out)
}

fn read_one(range: &Range<Data>, addr: &str) -> String {
    match parse_a1(addr) {
        Some((row, col)) => range.get_value((row, col)).map(format_cell).unwrap_or_default(),
        None => String::new(),
    }
}

/// Parse an A1-style address ("E21") into zero-based (row, col).
fn parse_a1(addr: &str) -> Option<(u32, u32)> {
    let addr = addr.trim();
    let split = addr.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = addr.split_at(split);
    if letters.is_empty() || digits.is_empty() {
        return None;
    }

    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col
            .checked_mul(26)?
            .checked_add(c.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
    }

    let row: u32 = digits.parse().ok()?;
    if row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Render one cell value the way the form expects it: integer-valued numbers
/// without a fractional part, text with thousands separators stripped.
fn format_cell(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => (*f as i64).to_string(),
        Data::String(s) => normalize_text(s),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => (dt.as_f64() as i64).to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => normalize_text(s),
        Data::Error(_) => String::new(),
    }
}

/// Strip separators and render as an integer when the text is numeric-like;
/// otherwise pass the stripped text through.
fn normalize_text(s: &str) -> String {
    let stripped = s.trim().replace(',', "");
    match stripped.parse::<f64>() {
        Ok(n) if n.is_finite() => (n as i64).to_string(),
        _ => stripped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_valued_floats_lose_the_fraction() {
        assert_eq!(format_cell(&Data::Float(50000.0)), "50000");
        assert_eq!(format_cell(&Data::Float(1200000.0)), "1200000");
    }

    #[test]
    fn fractions_truncate_without_rounding() {
        assert_eq!(format_cell(&Data::Float(1234.99)), "1234");
    }

    #[test]
    fn thousands_separators_are_stripped_before_parse() {
        assert_eq!(normalize_text("50,000"), "50000");
        assert_eq!(normalize_text(" 1,200,000.75 "), "1200000");
    }

    #[test]
    fn non_numeric_text_passes_through_stripped() {
        assert_eq!(normalize_text("  Monthly  "), "Monthly");
        assert_eq!(normalize_text("12 LPA"), "12 LPA");
    }

    #[test]
    fn empty_and_error_cells_are_blank() {
        assert_eq!(format_cell(&Data::Empty), "");
        assert_eq!(format_cell(&Data::Error(calamine::CellErrorType::Div0)), "");
    }

    #[test]
    fn a1_addresses_parse_to_zero_based_coordinates() {
        assert_eq!(parse_a1("A1"), Some((0, 0)));
        assert_eq!(parse_a1("E21"), Some((20, 4)));
        assert_eq!(parse_a1("d6"), Some((5, 3)));
        assert_eq!(parse_a1("AA10"), Some((9, 26)));
    }

    #[test]
    fn malformed_addresses_are_rejected() {
        assert_eq!(parse_a1(""), None);
        assert_eq!(parse_a1("21"), None);
        assert_eq!(parse_a1("E"), None);
        assert_eq!(parse_a1("E0"), None);
        assert_eq!(parse_a1("E-1"), None);
    }

    #[test]
    fn reads_cells_from_a_real_workbook() {
        use rust_xlsxwriter::Workbook;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offer.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_number(20, 4, 1200000.0).unwrap(); // E21
        sheet.write_string(5, 3, "50,000").unwrap(); // D6
        sheet.write_string(6, 3, "per month").unwrap(); // D7
        workbook.save(&path).unwrap();

        let addresses: Vec<String> = ["E21", "D6", "D7", "D8", "NOPE"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let values = read_cells(&path, &addresses).unwrap();

        assert_eq!(values["E21"], "1200000");
        assert_eq!(values["D6"], "50000");
        assert_eq!(values["D7"], "per month");
        // Missing cell and unparseable address both isolate to "".
        assert_eq!(values["D8"], "");
        assert_eq!(values["NOPE"], "");
    }

    #[test]
    fn missing_workbook_is_an_error() {
        let err = read_cells(Path::new("/nonexistent/offer.xlsx"), &["A1".into()]);
        assert!(err.is_err());
    }
}
