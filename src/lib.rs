use crate::loader::RawTable;
use log::warn;
use std::fmt;
pub mod bench_plot;
pub mod error;
pub mod loader;
pub mod plot;
pub mod utils;

pub use crate::error::BenchPlotError;

// constants
pub const VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");
pub const COL_LIBRARY: &str = "Библиотека";
pub const COL_FILE: &str = "Файл";
pub const COL_RUN: &str = "Запуск";
pub const COL_READ_MS: &str = "Чтение(мс)";
pub const COL_WRITE_MS: &str = "Запись(мс)";
pub const EXPECTED_COLUMNS: [&str; 5] = [COL_LIBRARY, COL_FILE, COL_RUN, COL_READ_MS, COL_WRITE_MS];

/// One benchmark run of a library on an input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub library: String,
    pub file: String,
    pub run: u32,
    pub read_ms: f64,
    pub write_ms: f64,
}

/// The main struct for the benchmark results, rows in source order.
#[derive(Debug, Clone, Default)]
pub struct MeasurementTable {
    pub rows: Vec<Measurement>,
}

impl MeasurementTable {
    pub fn new(rows: Vec<Measurement>) -> MeasurementTable {
        MeasurementTable { rows }
    }

    /// Build the typed table from the raw CSV,
    /// failing if any of the expected columns is missing.
    /// Rows with an invalid run are skipped,
    /// invalid or missing times are set to NAN.
    pub fn from_raw(raw: &RawTable) -> Result<MeasurementTable, BenchPlotError> {
        let indices: Vec<usize> = match EXPECTED_COLUMNS
            .iter()
            .map(|c| raw.column_index(c))
            .collect::<Option<Vec<usize>>>()
        {
            Some(indices) => indices,
            None => {
                return Err(BenchPlotError::Schema {
                    found: raw.headers.clone(),
                    expected: EXPECTED_COLUMNS.to_vec(),
                })
            }
        };
        let (i_lib, i_file, i_run, i_read, i_write) =
            (indices[0], indices[1], indices[2], indices[3], indices[4]);
        let mut rows = Vec::with_capacity(raw.records.len());
        for (n, record) in raw.records.iter().enumerate() {
            // header is line 1
            let line = n + 2;
            let cell = |i: usize| record.get(i).unwrap_or("");
            let run = match cell(i_run).trim().parse::<u32>() {
                Ok(run) => run,
                Err(e) => {
                    warn!(
                        "Could not parse run: {:?}, at line {}, skipping row. Error: {}",
                        cell(i_run),
                        line,
                        e
                    );
                    continue;
                }
            };
            let read_ms = parse_ms(cell(i_read), COL_READ_MS, line);
            let write_ms = parse_ms(cell(i_write), COL_WRITE_MS, line);
            rows.push(Measurement {
                library: cell(i_lib).to_owned(),
                file: cell(i_file).to_owned(),
                run,
                read_ms,
                write_ms,
            });
        }
        return Ok(MeasurementTable { rows });
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct file identifiers, in the order they first appear.
    pub fn files(&self) -> Vec<&str> {
        distinct(self.rows.iter().map(|m| m.file.as_str()))
    }

    /// Distinct libraries, in the order they first appear.
    pub fn libraries(&self) -> Vec<&str> {
        distinct(self.rows.iter().map(|m| m.library.as_str()))
    }

    /// The rows measured on the given file, keeping the source order.
    pub fn for_file(&self, file: &str) -> MeasurementTable {
        let rows = self.rows.iter().filter(|m| m.file == file).cloned().collect();
        MeasurementTable { rows }
    }

    /// The rows of the given library, keeping the source order.
    pub fn for_library(&self, library: &str) -> impl Iterator<Item = &Measurement> + '_ {
        let library = library.to_owned();
        self.rows.iter().filter(move |m| m.library == library)
    }
}

fn distinct<'a, I>(values: I) -> Vec<&'a str>
where
    I: Iterator<Item = &'a str>,
{
    let mut seen: Vec<&str> = Vec::new();
    for v in values {
        if !seen.contains(&v) {
            seen.push(v);
        }
    }
    return seen;
}

fn parse_ms(s: &str, column: &str, line: usize) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(v) => v,
        Err(e) => {
            warn!(
                "Could not parse {}: {:?}, at line {}, setting NAN. Error: {}",
                column, s, line, e
            );
            f64::NAN
        }
    }
}

impl fmt::Display for MeasurementTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", EXPECTED_COLUMNS.join(","))?;
        for m in self.rows.iter() {
            writeln!(
                f,
                "{},{},{},{},{}",
                m.library, m.file, m.run, m.read_ms, m.write_ms
            )?;
        }
        Ok(())
    }
}
