//! Tabular sources: rows of named cells read from CSV or JSON.
//!
//! A CSV file is a single sheet with a header row. A JSON file is either an
//! array of row objects (a single sheet) or an object mapping sheet names to
//! such arrays. A spreadsheet workbook has one sheet per worksheet, each with
//! a header row. Reading is all-or-nothing: any malformed record fails the
//! whole source before a single row is handed to the importer.

use std::{collections::HashMap, fs::File, io::Read, path::Path};

use calamine::{Data, Reader as _};
use serde_json::Value;

use crate::{Error, Result};

/// A raw cell value, before any field-specific interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Empty,
  Text(String),
  Number(f64),
}

/// One data row. `line` is 1-based and counts the header row for CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
  pub line:  usize,
  pub cells: HashMap<String, Cell>,
}

impl Row {
  pub fn new(line: usize) -> Self { Self { line, cells: HashMap::new() } }

  /// Builder used mostly by tests: add a text cell.
  pub fn with(mut self, column: &str, value: &str) -> Self {
    self.cells.insert(column.to_owned(), Cell::Text(value.to_owned()));
    self
  }

  /// Builder used mostly by tests: add a numeric cell.
  pub fn with_number(mut self, column: &str, value: f64) -> Self {
    self.cells.insert(column.to_owned(), Cell::Number(value));
    self
  }

  pub fn get(&self, column: &str) -> Option<&Cell> { self.cells.get(column) }
}

/// Read every row of `path`, choosing a sheet with `sheet` (a name or a
/// zero-based index; the first sheet when `None`).
pub fn read_rows(path: &Path, sheet: Option<&str>) -> Result<Vec<Row>> {
  let extension = path
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
    .unwrap_or_default();

  let open = || {
    File::open(path).map_err(|source| Error::Io { path: path.to_path_buf(), source })
  };

  match extension.as_str() {
    "csv" => {
      if let Some(sheet) = sheet {
        let stem = path.file_stem().and_then(|s| s.to_str());
        if sheet != "0" && Some(sheet) != stem {
          return Err(Error::SheetNotFound(sheet.to_owned()));
        }
      }
      read_csv(open()?)
    }
    "json" => {
      let mut text = String::new();
      open()?
        .read_to_string(&mut text)
        .map_err(|source| Error::Io { path: path.to_path_buf(), source })?;
      read_json(&text, sheet)
    }
    "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path, sheet),
    other => Err(Error::UnsupportedFormat(other.to_owned())),
  }
}

/// Read a CSV document with a header row. Cells are trimmed; empty cells
/// become [`Cell::Empty`].
pub fn read_csv(reader: impl Read) -> Result<Vec<Row>> {
  let mut reader = csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(reader);

  let headers = reader.headers()?.clone();

  let mut rows = Vec::new();
  for (idx, record) in reader.records().enumerate() {
    let record = record?;
    // +2: records start after the header, and lines are 1-based.
    let mut row = Row::new(idx + 2);
    for (column, value) in headers.iter().zip(record.iter()) {
      let cell = if value.is_empty() {
        Cell::Empty
      } else {
        Cell::Text(value.to_owned())
      };
      row.cells.insert(column.to_owned(), cell);
    }
    rows.push(row);
  }
  Ok(rows)
}

/// Read one worksheet of a workbook, chosen by name or zero-based index.
///
/// Date-formatted cells become their spreadsheet serial number, which
/// [`crate::resolve::record_date`] understands.
pub fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<Row>> {
  let mut workbook = calamine::open_workbook_auto(path)?;
  let names = workbook.sheet_names();

  let name = match sheet {
    None => names.first(),
    Some(name) if names.iter().any(|n| n == name) => names.iter().find(|n| *n == name),
    Some(index) => index.parse::<usize>().ok().and_then(|i| names.get(i)),
  };
  let Some(name) = name.cloned() else {
    return Err(Error::SheetNotFound(sheet.unwrap_or("0").to_owned()));
  };

  let range = workbook.worksheet_range(&name)?;
  // Leading blank rows are not part of the range.
  let first_line = range.start().map_or(1, |(row, _)| row as usize + 1);

  let mut rows = range.rows();
  let Some(header) = rows.next() else {
    return Ok(Vec::new());
  };
  let headers: Vec<String> = header.iter().map(|c| c.to_string().trim().to_owned()).collect();

  Ok(
    rows
      .enumerate()
      .map(|(idx, cells)| {
        let mut row = Row::new(first_line + idx + 1);
        for (column, data) in headers.iter().zip(cells) {
          if !column.is_empty() {
            row.cells.insert(column.clone(), workbook_cell(data));
          }
        }
        row
      })
      .collect(),
  )
}

fn workbook_cell(data: &Data) -> Cell {
  match data {
    Data::Empty | Data::Error(_) => Cell::Empty,
    Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    Data::Float(n) => Cell::Number(*n),
    Data::Int(n) => Cell::Number(*n as f64),
    Data::Bool(b) => Cell::Text(b.to_string()),
    Data::DateTime(dt) => Cell::Number(dt.as_f64()),
  }
}

/// Read a JSON document: an array of row objects, or an object of named
/// sheets each holding such an array.
pub fn read_json(text: &str, sheet: Option<&str>) -> Result<Vec<Row>> {
  let document: Value = serde_json::from_str(text)?;

  let rows = match document {
    Value::Array(rows) => match sheet {
      None | Some("0") => rows,
      Some(other) => return Err(Error::SheetNotFound(other.to_owned())),
    },
    Value::Object(mut sheets) => {
      let key = match sheet {
        None => sheets.keys().next().cloned(),
        Some(name) if sheets.contains_key(name) => Some(name.to_owned()),
        Some(index) => index
          .parse::<usize>()
          .ok()
          .and_then(|i| sheets.keys().nth(i).cloned()),
      };
      let Some(key) = key else {
        return Err(Error::SheetNotFound(sheet.unwrap_or("0").to_owned()));
      };
      match sheets.remove(&key) {
        Some(Value::Array(rows)) => rows,
        _ => {
          return Err(Error::MalformedRow {
            line:   0,
            reason: format!("sheet {key:?} is not an array of rows"),
          });
        }
      }
    }
    _ => {
      return Err(Error::MalformedRow {
        line:   0,
        reason: "expected an array of rows or an object of sheets".into(),
      });
    }
  };

  rows
    .into_iter()
    .enumerate()
    .map(|(idx, value)| json_row(idx + 1, value))
    .collect()
}

fn json_row(line: usize, value: Value) -> Result<Row> {
  let Value::Object(object) = value else {
    return Err(Error::MalformedRow { line, reason: "row is not an object".into() });
  };

  let mut row = Row::new(line);
  for (column, value) in object {
    let cell = match value {
      Value::Null => Cell::Empty,
      Value::String(s) => Cell::Text(s),
      Value::Number(n) => n.as_f64().map_or(Cell::Empty, Cell::Number),
      Value::Bool(b) => Cell::Text(b.to_string()),
      nested => Cell::Text(nested.to_string()),
    };
    row.cells.insert(column, cell);
  }
  Ok(row)
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn csv_rows_are_trimmed_and_numbered() {
    let data = "name,nav,date\n Alpha , 12.5 ,2024-01-01\nBeta,,\n";
    let rows = read_csv(data.as_bytes()).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].line, 2);
    assert_eq!(rows[0].get("name"), Some(&Cell::Text("Alpha".into())));
    assert_eq!(rows[0].get("nav"), Some(&Cell::Text("12.5".into())));
    assert_eq!(rows[1].get("nav"), Some(&Cell::Empty));
  }

  #[test]
  fn json_array_is_a_single_sheet() {
    let rows = read_json(r#"[{"Name": "Alpha", "NAV": 12.5, "cagr": null}]"#, None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("NAV"), Some(&Cell::Number(12.5)));
    assert_eq!(rows[0].get("cagr"), Some(&Cell::Empty));

    let err = read_json("[]", Some("Funds")).unwrap_err();
    assert!(matches!(err, Error::SheetNotFound(ref s) if s == "Funds"));
  }

  #[test]
  fn json_sheets_select_by_name_or_index() {
    let doc = r#"{
      "Summary": [{"name": "ignored"}],
      "History": [{"name": "Alpha"}, {"name": "Beta"}]
    }"#;

    assert_eq!(read_json(doc, None).unwrap().len(), 1);
    assert_eq!(read_json(doc, Some("History")).unwrap().len(), 2);
    assert_eq!(read_json(doc, Some("1")).unwrap().len(), 2);
    assert!(matches!(
      read_json(doc, Some("7")).unwrap_err(),
      Error::SheetNotFound(_)
    ));
  }

  #[test]
  fn non_object_row_fails_the_whole_source() {
    let err = read_json(r#"[{"name": "Alpha"}, 3]"#, None).unwrap_err();
    assert!(matches!(err, Error::MalformedRow { line: 2, .. }));
  }

  #[test]
  fn read_rows_dispatches_on_extension() {
    let dir = tempfile::tempdir().unwrap();

    let csv_path = dir.path().join("funds.csv");
    let mut file = File::create(&csv_path).unwrap();
    writeln!(file, "name,nav\nAlpha,1").unwrap();
    assert_eq!(read_rows(&csv_path, None).unwrap().len(), 1);
    assert_eq!(read_rows(&csv_path, Some("funds")).unwrap().len(), 1);
    assert!(matches!(
      read_rows(&csv_path, Some("other")).unwrap_err(),
      Error::SheetNotFound(_)
    ));

    let txt_path = dir.path().join("funds.txt");
    File::create(&txt_path).unwrap();
    assert!(matches!(
      read_rows(&txt_path, None).unwrap_err(),
      Error::UnsupportedFormat(ref e) if e == "txt"
    ));

    let missing = dir.path().join("missing.csv");
    assert!(matches!(read_rows(&missing, None).unwrap_err(), Error::Io { .. }));
  }

  #[test]
  fn workbook_sheets_select_by_name_or_index() {
    use rust_xlsxwriter::Workbook;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.xlsx");

    let mut workbook = Workbook::new();
    let summary = workbook.add_worksheet();
    summary.set_name("Summary").unwrap();
    summary.write_string(0, 0, "name").unwrap();
    summary.write_string(1, 0, "ignored").unwrap();

    let history = workbook.add_worksheet();
    history.set_name("History").unwrap();
    for (col, header) in ["Name", "NAV", "Date"].into_iter().enumerate() {
      history.write_string(0, col as u16, header).unwrap();
    }
    history.write_string(1, 0, "Alpha").unwrap();
    history.write_number(1, 1, 12.5).unwrap();
    history.write_number(1, 2, 45382.0).unwrap();
    history.write_string(2, 0, "Beta").unwrap();
    history.write_string(2, 2, "2024-04-01").unwrap();
    workbook.save(&path).unwrap();

    assert_eq!(read_rows(&path, None).unwrap().len(), 1);
    assert_eq!(read_rows(&path, Some("1")).unwrap().len(), 2);

    let rows = read_rows(&path, Some("History")).unwrap();
    assert_eq!(rows[0].line, 2);
    assert_eq!(rows[0].get("Name"), Some(&Cell::Text("Alpha".into())));
    assert_eq!(rows[0].get("NAV"), Some(&Cell::Number(12.5)));
    assert_eq!(rows[0].get("Date"), Some(&Cell::Number(45382.0)));
    assert_eq!(rows[1].line, 3);
    assert_eq!(rows[1].get("Date"), Some(&Cell::Text("2024-04-01".into())));

    assert!(matches!(
      read_rows(&path, Some("Funds")).unwrap_err(),
      Error::SheetNotFound(ref s) if s == "Funds"
    ));
  }
}
