use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::schema::{RawRow, RawTable};
use crate::types::RawRecord;
use crate::util::{is_null, parse_f64_safe, parse_i32_safe};
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const YEAR_COLUMN: &str = "year";
pub const COUNTRY_COLUMN: &str = "country";
/// Column name reported for rows with more fields than the header.
pub const EXTRA_FIELDS: &str = "<extra fields>";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub files: usize,
    pub total_rows: usize,
    pub null_rows: usize,
    pub malformed_rows: usize,
    pub loaded_rows: usize,
}

/// Read a CSV source into an untyped table. Empty cells become `None`;
/// non-empty fields past the last header are kept aside in `extra`.
pub fn read_table<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        let mut cells: Vec<Option<String>> = record
            .iter()
            .map(|c| (!c.is_empty()).then(|| c.to_string()))
            .collect();
        let extra: Vec<String> = if cells.len() > headers.len() {
            cells.split_off(headers.len()).into_iter().flatten().collect()
        } else {
            Vec::new()
        };
        cells.resize(headers.len(), None);
        rows.push(RawRow { line, cells, extra });
    }
    Ok(RawTable { headers, rows })
}

fn required_column(table: &RawTable, name: &str) -> Result<usize> {
    table
        .column_index(name)
        .ok_or_else(|| PipelineError::MissingColumn(name.to_string()))
}

/// Turn a normalized table into typed records.
///
/// A row with extra fields (an unquoted `1,000` splits the count), a missing
/// or non-integer year and a non-numeric count are malformed.
/// In strict mode the first malformed row fails the load; otherwise it is
/// skipped and counted.
pub fn extract_records(
    table: &RawTable,
    config: &PipelineConfig,
    report: &mut LoadReport,
) -> Result<Vec<RawRecord>> {
    let year_idx = required_column(table, YEAR_COLUMN)?;
    let country_idx = required_column(table, COUNTRY_COLUMN)?;
    let count_idx = required_column(table, &config.count_column)?;

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let cell = |i: usize| row.cells.get(i).and_then(|c| c.as_deref());

        let year = parse_i32_safe(cell(year_idx));
        let count_cell = cell(count_idx);
        let count = parse_f64_safe(count_cell);

        let bad: Option<(&str, String)> = if !row.extra.is_empty() {
            Some((EXTRA_FIELDS, row.extra.join(",")))
        } else {
            match year {
                None => Some((YEAR_COLUMN, cell(year_idx).unwrap_or("").to_string())),
                Some(_) if count.is_none() && !is_null(count_cell) => Some((
                    config.count_column.as_str(),
                    count_cell.unwrap_or("").to_string(),
                )),
                Some(_) => None,
            }
        };

        if let (Some(year), None) = (year, &bad) {
            records.push(RawRecord {
                year,
                country: cell(country_idx).map(str::to_string),
                number_of_issued: count,
            });
        } else if let Some((column, value)) = bad {
            let err = PipelineError::MalformedRow {
                line: row.line,
                column: column.to_string(),
                value,
            };
            if config.strict {
                return Err(err);
            }
            warn!("skipping row: {}", err);
            report.malformed_rows += 1;
        }
    }
    Ok(records)
}

/// Load one CSV source: read, normalize headers, drop fully-null rows and
/// extract typed records.
pub fn load_reader<R: Read>(
    reader: R,
    config: &PipelineConfig,
    report: &mut LoadReport,
) -> Result<Vec<RawRecord>> {
    let table = read_table(reader)?;
    let total = table.rows.len();
    let table = table.normalize()?;
    report.total_rows += total;
    report.null_rows += total - table.rows.len();

    let records = extract_records(&table, config, report)?;
    report.loaded_rows += records.len();
    Ok(records)
}

/// CSV files to read for `path`: the file itself, or every `*.csv` in the
/// directory sorted by name.
pub fn input_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .map_or(false, |ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no CSV files in {}", path.display()),
        )));
    }
    Ok(files)
}

pub fn load_and_clean(path: &Path, config: &PipelineConfig) -> Result<(Vec<RawRecord>, LoadReport)> {
    let mut report = LoadReport::default();
    let mut records = Vec::new();
    for file in input_files(path)? {
        let f = std::fs::File::open(&file)?;
        let mut loaded = load_reader(f, config, &mut report)?;
        info!(path = %file.display(), rows = loaded.len(), "loaded input file");
        records.append(&mut loaded);
        report.files += 1;
    }
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
year,country,number of issued,number of issued numerical
2017,China,\"1,000\",1000
2017,Andra,12,12
,,,
2016,,5,5
2016,Japan,n/a,
";

    #[test]
    fn test_load_reader_normalizes_and_types_rows() {
        let config = PipelineConfig::default();
        let mut report = LoadReport::default();
        let records = load_reader(SAMPLE.as_bytes(), &config, &mut report).unwrap();

        assert_eq!(report.total_rows, 5);
        assert_eq!(report.null_rows, 1);
        assert_eq!(report.loaded_rows, 4);
        assert_eq!(records[0].country.as_deref(), Some("China"));
        assert_eq!(records[0].number_of_issued, Some(1000.0));
        assert_eq!(records[2].country, None);
        assert_eq!(records[3].number_of_issued, None);
    }

    #[test]
    fn test_missing_count_column() {
        let config = PipelineConfig {
            count_column: "applications".to_string(),
            ..PipelineConfig::default()
        };
        let mut report = LoadReport::default();
        let err = load_reader(SAMPLE.as_bytes(), &config, &mut report).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn(c) if c == "applications"));
    }

    #[test]
    fn test_malformed_row_strict_and_lenient() {
        let input = "year,country,number_of_issued_numerical\n2017,China,10\n2017,Japan,many\n";

        let config = PipelineConfig::default();
        let mut report = LoadReport::default();
        let err = load_reader(input.as_bytes(), &config, &mut report).unwrap_err();
        match err {
            PipelineError::MalformedRow { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, "number_of_issued_numerical");
                assert_eq!(value, "many");
            }
            other => panic!("unexpected error: {other}"),
        }

        let config = PipelineConfig {
            strict: false,
            ..PipelineConfig::default()
        };
        let mut report = LoadReport::default();
        let records = load_reader(input.as_bytes(), &config, &mut report).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.malformed_rows, 1);
    }

    #[test]
    fn test_unquoted_thousands_separator_is_malformed() {
        let input = "year,country,number_of_issued_numerical\n2017,Japan,5\n2017,China,1,000\n";

        let config = PipelineConfig::default();
        let mut report = LoadReport::default();
        let err = load_reader(input.as_bytes(), &config, &mut report).unwrap_err();
        match err {
            PipelineError::MalformedRow { line, column, value } => {
                assert_eq!(line, 3);
                assert_eq!(column, EXTRA_FIELDS);
                assert_eq!(value, "000");
            }
            other => panic!("unexpected error: {other}"),
        }

        let config = PipelineConfig {
            strict: false,
            ..PipelineConfig::default()
        };
        let mut report = LoadReport::default();
        let records = load_reader(input.as_bytes(), &config, &mut report).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].country.as_deref(), Some("Japan"));
        assert_eq!(report.malformed_rows, 1);
        assert_eq!(report.loaded_rows, 1);
    }

    #[test]
    fn test_trailing_empty_field_is_not_malformed() {
        let input = "year,country,number_of_issued_numerical\n2017,Japan,5,\n";
        let config = PipelineConfig::default();
        let mut report = LoadReport::default();
        let records = load_reader(input.as_bytes(), &config, &mut report).unwrap();
        assert_eq!(records[0].number_of_issued, Some(5.0));
    }

    #[test]
    fn test_missing_year_is_malformed() {
        let input = "year,country,number_of_issued_numerical\n,China,10\n";
        let config = PipelineConfig::default();
        let mut report = LoadReport::default();
        assert!(matches!(
            load_reader(input.as_bytes(), &config, &mut report),
            Err(PipelineError::MalformedRow { .. })
        ));
    }
}
