use calamine::{Data, Range, Reader, Xls, Xlsx};
use std::io::{Cursor, Read, Seek};

use super::{ExtractionError, FormatTag};

/// Render every sheet as tab-separated lines, sheets separated by a blank line.
pub(super) fn extract_text(bytes: &[u8], format: FormatTag) -> Result<String, ExtractionError> {
    let cursor = Cursor::new(bytes);
    match format {
        FormatTag::LegacySpreadsheet => {
            let workbook = Xls::new(cursor)
                .map_err(|error| ExtractionError::failed(format, error.to_string()))?;
            render_workbook(workbook)
        }
        _ => {
            let workbook = Xlsx::new(cursor)
                .map_err(|error| ExtractionError::failed(format, error.to_string()))?;
            render_workbook(workbook)
        }
    }
}

fn render_workbook<RS, R>(mut workbook: R) -> Result<String, ExtractionError>
where
    RS: Read + Seek,
    R: Reader<RS>,
{
    let sheet_names = workbook.sheet_names();
    let mut sheets = Vec::with_capacity(sheet_names.len());

    for name in &sheet_names {
        match workbook.worksheet_range(name) {
            Ok(range) => sheets.push(render_sheet(&range)),
            Err(error) => {
                tracing::warn!(sheet = %name, error = ?error, "Skipping unreadable worksheet");
            }
        }
    }

    Ok(sheets.join("\n\n"))
}

fn render_sheet(range: &Range<Data>) -> String {
    range
        .rows()
        .map(|row| row.iter().map(render_cell).collect::<Vec<_>>().join("\t"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        Data::Bool(value) => value.to_string(),
        Data::DateTime(value) => value
            .as_datetime()
            .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| value.as_f64().to_string()),
        Data::Error(error) => format!("#ERR: {error:?}"),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sheets_render_as_tab_separated_blocks_in_order() {
        let xlsx = fixtures::build_xlsx(&[
            (
                "Budget",
                vec![vec!["Item", "Cost"], vec!["Rails", "1200"]],
            ),
            ("Staff", vec![vec!["Name", "Role"], vec!["Ana", "Engineer"]]),
        ]);

        let text = extract_text(&xlsx, FormatTag::Spreadsheet).expect("xlsx text");
        assert_eq!(text, "Item\tCost\nRails\t1200\n\nName\tRole\nAna\tEngineer");
    }

    #[test]
    fn cells_render_without_spurious_decimals() {
        assert_eq!(render_cell(&Data::Float(42.0)), "42");
        assert_eq!(render_cell(&Data::Float(2.5)), "2.5");
        assert_eq!(render_cell(&Data::Bool(true)), "true");
        assert_eq!(render_cell(&Data::Empty), "");
    }

    #[test]
    fn corrupt_legacy_workbook_is_rejected() {
        let error =
            extract_text(b"not an xls file", FormatTag::LegacySpreadsheet).expect_err("corrupt");
        assert!(matches!(
            error,
            ExtractionError::Failed {
                format: FormatTag::LegacySpreadsheet,
                ..
            }
        ));
    }
}
