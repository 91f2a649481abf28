use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, FormatBorder, Workbook};
use tracing::{info, warn};

use crate::error::{Result, ScrapeError};
use crate::table::{Cell, Table};

pub const SHEET_NAME: &str = "Sheet1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Leading column of 0-based row numbers under an empty header.
    pub index: bool,
    pub header: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            index: false,
            header: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Targets {
    pub csv: PathBuf,
    pub xlsx: PathBuf,
}

/// Render both documents, then write both files.
///
/// Nothing touches the disk until both renderings succeed. If the second
/// write fails the first file is removed again.
pub fn export(table: &Table, targets: &Targets, opts: ExportOptions) -> Result<()> {
    let csv = render_csv(table, opts)?;
    let xlsx = render_xlsx(table, opts)?;

    write(&targets.csv, &csv)?;
    if let Err(e) = write(&targets.xlsx, &xlsx) {
        if let Err(cleanup) = fs::remove_file(&targets.csv) {
            warn!("Could not remove {}: {}", targets.csv.display(), cleanup);
        }
        return Err(e);
    }

    info!(
        "Wrote {} rows to {} and {}",
        table.len(),
        targets.csv.display(),
        targets.xlsx.display()
    );
    Ok(())
}

pub fn render_csv(table: &Table, opts: ExportOptions) -> Result<Vec<u8>> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    if opts.header {
        let mut header: Vec<&str> = Vec::new();
        if opts.index {
            header.push("");
        }
        header.extend(Table::headers());
        wtr.write_record(&header)?;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let mut record: Vec<String> = Vec::new();
        if opts.index {
            record.push(i.to_string());
        }
        record.extend(row.cells().iter().map(Cell::render));
        wtr.write_record(&record)?;
    }

    wtr.into_inner()
        .map_err(|e| ScrapeError::Csv(e.into_error().into()))
}

pub fn render_xlsx(table: &Table, opts: ExportOptions) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    // Fixed creation time keeps repeated runs byte-identical.
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

    let bold = Format::new().set_bold().set_border(FormatBorder::Thin);
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let offset: u16 = if opts.index { 1 } else { 0 };
    let mut first_row: u32 = 0;

    if opts.header {
        for (col, name) in Table::headers().enumerate() {
            sheet.write_string_with_format(0, col as u16 + offset, name, &bold)?;
        }
        first_row = 1;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let r = first_row + i as u32;
        if opts.index {
            sheet.write_number_with_format(r, 0, i as f64, &bold)?;
        }
        for (col, cell) in row.cells().into_iter().enumerate() {
            let c = col as u16 + offset;
            match cell {
                Cell::Text(s) => {
                    sheet.write_string(r, c, &s)?;
                }
                Cell::Int(n) => {
                    sheet.write_number(r, c, n as f64)?;
                }
                Cell::Float(f) => {
                    sheet.write_number(r, c, f)?;
                }
                Cell::Empty => {}
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(path, bytes).map_err(|e| ScrapeError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::sample_table;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Cursor;

    fn csv_string(opts: ExportOptions) -> String {
        String::from_utf8(render_csv(&sample_table(), opts).unwrap()).unwrap()
    }

    #[test]
    fn csv_header_without_index() {
        let out = csv_string(ExportOptions::default());
        let first = out.lines().next().unwrap();
        assert_eq!(
            first,
            "Movie Title,Year,Score,Adjusted Score,Director,Synopsis,Cast,Consensus"
        );
        assert_eq!(out.lines().count(), 3);
    }

    #[test]
    fn csv_quotes_only_when_needed() {
        let out = csv_string(ExportOptions::default());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[2],
            "Die Hard,1988,94,90.0,, New York cop John McClane.,Bruce Willis,Its many imitators never topped it."
        );
        assert!(lines[1].contains("\"Keanu Reeves, Patrick Swayze\""));
        assert!(lines[1].contains("\"\"surfers\"\""));
    }

    #[test]
    fn csv_with_index_and_no_header() {
        let out = csv_string(ExportOptions {
            index: true,
            header: false,
        });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0,Point Break,1991,70,87.3,"));
        assert!(lines[1].starts_with("1,Die Hard,"));
    }

    #[test]
    fn csv_index_header_is_blank() {
        let out = csv_string(ExportOptions {
            index: true,
            header: true,
        });
        assert!(out.starts_with(",Movie Title,Year,"));
    }

    #[test]
    fn csv_reads_back_to_the_same_values() {
        let table = sample_table();
        let bytes = render_csv(&table, ExportOptions::default()).unwrap();
        let mut rdr = csv::Reader::from_reader(bytes.as_slice());
        let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), table.len());

        for (record, row) in records.iter().zip(table.rows()) {
            assert_eq!(&record[0], row.title);
            assert_eq!(record[1].parse::<i64>().unwrap(), row.year);
            assert_eq!(record[2].parse::<i64>().unwrap(), row.score);
            assert_eq!(record[3].parse::<f64>().unwrap(), row.adjusted_score);
            let director = Some(&record[4]).filter(|d| !d.is_empty()).map(str::to_string);
            assert_eq!(director, row.director);
            assert_eq!(&record[5], row.synopsis);
            assert_eq!(&record[6], row.cast_joined());
            assert_eq!(&record[7], row.consensus);
        }
    }

    #[test]
    fn csv_is_deterministic() {
        let a = render_csv(&sample_table(), ExportOptions::default()).unwrap();
        let b = render_csv(&sample_table(), ExportOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn xlsx_is_deterministic() {
        let a = render_xlsx(&sample_table(), ExportOptions::default()).unwrap();
        // Cross a second boundary so a wall-clock timestamp would differ.
        std::thread::sleep(std::time::Duration::from_millis(1100));
        let b = render_xlsx(&sample_table(), ExportOptions::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn xlsx_reads_back() {
        let bytes = render_xlsx(&sample_table(), ExportOptions::default()).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.height(), 3);
        assert_eq!(range.width(), 8);

        assert_eq!(range.get((0, 0)), Some(&Data::String("Movie Title".into())));
        assert_eq!(range.get((0, 7)), Some(&Data::String("Consensus".into())));
        assert_eq!(range.get((1, 0)), Some(&Data::String("Point Break".into())));
        assert_eq!(range.get((1, 1)), Some(&Data::Float(1991.0)));
        assert_eq!(range.get((1, 3)), Some(&Data::Float(87.3)));
        assert_eq!(
            range.get((1, 6)),
            Some(&Data::String("Keanu Reeves, Patrick Swayze".into()))
        );
        assert!(matches!(range.get((2, 4)), None | Some(Data::Empty)));
    }

    #[test]
    fn xlsx_index_column() {
        let opts = ExportOptions {
            index: true,
            header: true,
        };
        let bytes = render_xlsx(&sample_table(), opts).unwrap();
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.get((2, 0)), Some(&Data::Float(1.0)));
        assert_eq!(range.get((0, 1)), Some(&Data::String("Movie Title".into())));
    }

    #[test]
    fn export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let targets = Targets {
            csv: dir.path().join("movies_info.csv"),
            xlsx: dir.path().join("movies_info.xlsx"),
        };
        export(&sample_table(), &targets, ExportOptions::default()).unwrap();
        let csv = fs::read_to_string(&targets.csv).unwrap();
        assert!(csv.starts_with("Movie Title,"));
        assert!(fs::metadata(&targets.xlsx).unwrap().len() > 0);
    }

    #[test]
    fn unwritable_target_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let targets = Targets {
            csv: dir.path().join("movies_info.csv"),
            xlsx: dir.path().join("missing").join("movies_info.xlsx"),
        };
        let err = export(&sample_table(), &targets, ExportOptions::default()).unwrap_err();
        assert!(matches!(err, ScrapeError::Io { .. }));
        assert!(!targets.csv.exists());
        assert!(!targets.xlsx.exists());
    }
}
