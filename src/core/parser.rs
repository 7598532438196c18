use crate::core::grid::{normalize_column, HeaderSource, RectangularGrid};
use crate::core::schema::is_known_column;
use crate::utils::error::{IngestError, Result};
use csv::ReaderBuilder;

const POSITIONAL_LAYOUTS: [&[&str]; 5] = [
    &["name"],
    &["id", "name"],
    &["id", "name", "department_id"],
    &["id", "name", "hired_at", "department_id"],
    &["id", "name", "hired_at", "department_id", "job_id"],
];

/// 無標題列時依欄位數決定欄位名稱
pub fn positional_layout(width: usize) -> Option<&'static [&'static str]> {
    width
        .checked_sub(1)
        .and_then(|index| POSITIONAL_LAYOUTS.get(index))
        .copied()
}

/// Decodes CSV bytes into a `RectangularGrid`.
///
/// A first row counts as a header when none of its cells is numeric and at
/// least one of them names a known column. Otherwise the columns are named
/// from `positional_layout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabularParser;

impl TabularParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, bytes: &[u8]) -> Result<RectangularGrid> {
        let text = std::str::from_utf8(bytes).map_err(|e| IngestError::FormatError {
            message: format!("input is not valid UTF-8: {}", e),
        })?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        if let Some(line) = unterminated_quote_line(text) {
            return Err(IngestError::FormatError {
                message: format!("unterminated quoted field starting on line {}", line),
            });
        }

        tracing::debug!(
            "CSV content preview: {}",
            text.chars().take(200).collect::<String>()
        );

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(false)
            .from_reader(text.as_bytes());

        let mut rows: Vec<Vec<String>> = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|e| IngestError::FormatError {
                message: e.to_string(),
            })?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        if rows.is_empty() {
            tracing::debug!("CSV input has no rows");
            return Ok(RectangularGrid::empty());
        }

        let grid = if looks_like_header(&rows[0]) {
            let columns = rows.remove(0);
            RectangularGrid::new(columns, rows, HeaderSource::Declared)?
        } else {
            let width = rows[0].len();
            let layout = positional_layout(width).ok_or_else(|| IngestError::FormatError {
                message: format!(
                    "cannot infer column names for {}-column input without a header row",
                    width
                ),
            })?;
            let columns = layout.iter().map(|c| c.to_string()).collect();
            RectangularGrid::new(columns, rows, HeaderSource::Positional)?
        };

        tracing::debug!(
            "Parsed grid: {} rows x {} columns {:?} ({:?} header)",
            grid.len(),
            grid.width(),
            grid.columns(),
            grid.header_source()
        );
        Ok(grid)
    }
}

fn is_numeric(cell: &str) -> bool {
    let cell = cell.trim();
    cell.chars().any(|c| c.is_ascii_digit()) && cell.parse::<f64>().is_ok()
}

fn looks_like_header(row: &[String]) -> bool {
    if row.iter().any(|cell| is_numeric(cell)) {
        return false;
    }
    row.iter().any(|cell| is_known_column(&normalize_column(cell)))
}

/// Returns the 1-based line where an unclosed quoted field begins.
fn unterminated_quote_line(text: &str) -> Option<usize> {
    let mut line = 1;
    let mut field_start = true;
    let mut open_at: Option<usize> = None;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match (open_at, c) {
            (Some(_), '"') => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                } else {
                    open_at = None;
                    field_start = false;
                }
            }
            (Some(_), '\n') => line += 1,
            (Some(_), _) => {}
            (None, '"') if field_start => {
                open_at = Some(line);
            }
            (None, ',') => field_start = true,
            (None, '\n') => {
                line += 1;
                field_start = true;
            }
            (None, '\r') => {}
            (None, _) => field_start = false,
        }
    }
    open_at
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<RectangularGrid> {
        TabularParser::new().parse(input.as_bytes())
    }

    #[test]
    fn test_declared_header_is_used() {
        let grid = parse("name,department_id\nSoftware Engineer,1\nMarketing Manager,2").unwrap();
        assert_eq!(grid.header_source(), HeaderSource::Declared);
        assert_eq!(grid.columns(), &["name".to_string(), "department_id".to_string()]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.get(1, "name"), Some("Marketing Manager"));
    }

    #[test]
    fn test_header_names_are_normalized() {
        let grid = parse(" Name , Department_ID \nSales,1").unwrap();
        assert_eq!(grid.columns(), &["name".to_string(), "department_id".to_string()]);
    }

    #[test]
    fn test_headerless_positional_layouts() {
        let grid = parse("Engineering\nSales\n").unwrap();
        assert_eq!(grid.header_source(), HeaderSource::Positional);
        assert_eq!(grid.columns(), &["name".to_string()]);
        assert_eq!(grid.len(), 2);

        let grid = parse("1,Product Management\n2,Sales").unwrap();
        assert_eq!(grid.columns(), &["id".to_string(), "name".to_string()]);

        let grid = parse("1,Harold,2021-11-07T02:48:42Z,2\n").unwrap();
        assert_eq!(
            grid.columns(),
            &["id", "name", "hired_at", "department_id"].map(String::from)
        );

        let grid = parse("1,Harold,2021-11-07T02:48:42Z,2,96\n").unwrap();
        assert_eq!(grid.width(), 5);
        assert_eq!(grid.get(0, "job_id"), Some("96"));
    }

    #[test]
    fn test_department_named_like_job_title_is_not_sniffed() {
        // a department literally called "Manager" stays a plain name column
        let grid = parse("1,Manager\n2,Sales Manager").unwrap();
        assert_eq!(grid.columns(), &["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn test_unsupported_width_without_header() {
        let err = parse("a,b,c,d,e,f\n").unwrap_err();
        assert!(matches!(err, IngestError::FormatError { .. }));
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let err = TabularParser::new().parse(&[0x6e, 0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, IngestError::FormatError { .. }));
    }

    #[test]
    fn test_ragged_rows_are_format_error() {
        let err = parse("name,department_id\nEngineer,1,extra\n").unwrap_err();
        assert!(matches!(err, IngestError::FormatError { .. }));
    }

    #[test]
    fn test_unterminated_quote_is_format_error() {
        let err = parse("name\n\"Engineering\nSales").unwrap_err();
        match err {
            IngestError::FormatError { message } => assert!(message.contains("line 2")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_quoted_fields_keep_delimiters() {
        let grid = parse("name,department_id\n\"Research, Development\",3\n\"Say \"\"hi\"\"\",4").unwrap();
        assert_eq!(grid.get(0, "name"), Some("Research, Development"));
        assert_eq!(grid.get(1, "name"), Some("Say \"hi\""));
    }

    #[test]
    fn test_blank_trailing_row_is_kept_for_validation() {
        let grid = parse("name,hired_at,department_id,job_id\nJohn Doe,2023-01-15T09:00:00,1,1\n,,,").unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.get(1, "name"), Some(""));
    }

    #[test]
    fn test_empty_input_yields_empty_grid() {
        assert!(parse("").unwrap().is_empty());
        let header_only = parse("name\n").unwrap();
        assert!(header_only.is_empty());
        assert_eq!(header_only.columns(), &["name".to_string()]);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let input = b"1,Engineering\n2,Sales\n";
        let parser = TabularParser::new();
        assert_eq!(parser.parse(input).unwrap(), parser.parse(input).unwrap());
    }
}
