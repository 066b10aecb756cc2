use crate::error::{BenchPlotError, DecodeAttempt, DecodeAttempts};
use csv::StringRecord;
use encoding_rs::{UTF_8, WINDOWS_1251};
use log::{debug, info};
use std::borrow::Cow;
use std::fs;
use std::path::Path;

/// Text encodings the results file may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, a leading byte order mark is stripped.
    Utf8Sig,
    /// Windows-1251, the Cyrillic code page.
    Windows1251,
    /// Strict UTF-8, a byte order mark is kept as part of the text.
    Utf8,
}

const CP1251_UNDEFINED: u8 = 0x98;

/// The order in which the encodings are tried.
pub const CANDIDATE_ENCODINGS: [TextEncoding; 3] = [
    TextEncoding::Utf8Sig,
    TextEncoding::Windows1251,
    TextEncoding::Utf8,
];

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8Sig => "utf-8-sig",
            TextEncoding::Windows1251 => "cp1251",
            TextEncoding::Utf8 => "utf-8",
        }
    }

    /// Decode the whole input, None if any byte sequence is malformed.
    pub fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            TextEncoding::Utf8Sig => {
                let (text, had_errors) = UTF_8.decode_with_bom_removal(bytes);
                if had_errors {
                    None
                } else {
                    Some(text)
                }
            }
            // 0x98 is unassigned in cp1251 but decodes to U+0098 under the WHATWG index
            TextEncoding::Windows1251 => {
                if bytes.contains(&CP1251_UNDEFINED) {
                    return None;
                }
                WINDOWS_1251.decode_without_bom_handling_and_without_replacement(bytes)
            }
            TextEncoding::Utf8 => UTF_8.decode_without_bom_handling_and_without_replacement(bytes),
        }
    }
}

/// The CSV as read from disk: header names and string records, no schema.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<StringRecord>,
    pub encoding: TextEncoding,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Read the CSV at the given path.
/// The existence of the path is checked before reading,
/// then the encodings are tried in order and the first parsable table is returned.
pub fn load(path: &Path) -> Result<RawTable, BenchPlotError> {
    if !path.exists() {
        return Err(BenchPlotError::NotFound(path.to_path_buf()));
    }
    let bytes = fs::read(path).map_err(|source| BenchPlotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = from_bytes(&bytes).map_err(|attempts| BenchPlotError::Decode {
        path: path.to_path_buf(),
        attempts,
    })?;
    info!(
        "read {} records from {:?} as {}",
        table.records.len(),
        path,
        table.encoding.label()
    );
    Ok(table)
}

/// Try every candidate encoding on the raw bytes.
/// On failure, return all the attempts in the order they were made.
pub fn from_bytes(bytes: &[u8]) -> Result<RawTable, DecodeAttempts> {
    let mut attempts = DecodeAttempts::default();
    for encoding in CANDIDATE_ENCODINGS {
        let outcome = match encoding.decode(bytes) {
            Some(text) => parse_csv(&text),
            None => Err(String::from("malformed byte sequence")),
        };
        match outcome {
            Ok((headers, records)) => {
                return Ok(RawTable {
                    headers,
                    records,
                    encoding,
                })
            }
            Err(reason) => {
                debug!("could not read as {}: {}", encoding.label(), reason);
                attempts.0.push(DecodeAttempt {
                    encoding: encoding.label(),
                    reason,
                });
            }
        }
    }
    Err(attempts)
}

// Short records are kept and their missing cells handled at conversion,
// records longer than the header are an error.
fn parse_csv(text: &str) -> Result<(Vec<String>, Vec<StringRecord>), String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| e.to_string())?
        .iter()
        .map(String::from)
        .collect();
    if headers.is_empty() {
        return Err(String::from("no columns to parse from file"));
    }
    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        if record.len() > headers.len() {
            let line = record.position().map_or(0, |p| p.line());
            return Err(format!(
                "expected {} fields in line {}, saw {}",
                headers.len(),
                line,
                record.len()
            ));
        }
        records.push(record);
    }
    Ok((headers, records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Библиотека,Файл,Запуск,Чтение(мс),Запись(мс)";

    fn sample() -> String {
        format!("{}\npugixml,small.xml,1,10,20\ntinyxml2,small.xml,1,15,25\n", HEADER)
    }

    #[test]
    fn reads_utf8_with_bom_stripping_it() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(sample().as_bytes());
        let table = from_bytes(&bytes).unwrap();
        assert_eq!(table.encoding, TextEncoding::Utf8Sig);
        assert_eq!(table.headers[0], "Библиотека");
        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn reads_plain_utf8_in_the_first_attempt() {
        let table = from_bytes(sample().as_bytes()).unwrap();
        assert_eq!(table.encoding, TextEncoding::Utf8Sig);
        assert_eq!(table.column_index("Запись(мс)"), Some(4));
    }

    #[test]
    fn falls_back_to_cp1251() {
        let text = sample();
        let (bytes, _, unmappable) = WINDOWS_1251.encode(&text);
        assert!(!unmappable);
        assert!(std::str::from_utf8(&bytes).is_err());
        let table = from_bytes(&bytes).unwrap();
        assert_eq!(table.encoding, TextEncoding::Windows1251);
        assert_eq!(table.headers[1], "Файл");
        assert_eq!(&table.records[1][0], "tinyxml2");
    }

    #[test]
    fn reports_every_failed_attempt() {
        let text = format!("{}\npugixml,small.xml,1,10,20,extra\n", HEADER);
        let attempts = from_bytes(text.as_bytes()).unwrap_err();
        let labels: Vec<&str> = attempts.0.iter().map(|a| a.encoding).collect();
        assert_eq!(labels, vec!["utf-8-sig", "cp1251", "utf-8"]);
        assert_eq!(attempts.last().unwrap().encoding, "utf-8");
        assert!(attempts.last().unwrap().reason.contains("expected 5 fields"));
    }

    #[test]
    fn undecodable_bytes_fail_every_encoding() {
        let mut bytes = sample().into_bytes();
        bytes.extend_from_slice(&[0xC1, 0x98, b'\n']);
        let attempts = from_bytes(&bytes).unwrap_err();
        let labels: Vec<&str> = attempts.0.iter().map(|a| a.encoding).collect();
        assert_eq!(labels, vec!["utf-8-sig", "cp1251", "utf-8"]);
        assert!(attempts
            .0
            .iter()
            .all(|a| a.reason == "malformed byte sequence"));
    }

    #[test]
    fn cp1251_rejects_its_undefined_byte() {
        assert!(TextEncoding::Windows1251.decode(b"abc\x98").is_none());
        assert_eq!(
            TextEncoding::Windows1251.decode(&[0xC1, 0xE8]).as_deref(),
            Some("Би")
        );
    }

    #[test]
    fn empty_input_has_no_columns() {
        let attempts = from_bytes(b"").unwrap_err();
        assert_eq!(attempts.0.len(), 3);
        assert!(attempts.0[0].reason.contains("no columns"));
    }

    #[test]
    fn short_records_are_kept() {
        let text = format!("{}\npugixml,small.xml,1,10\n", HEADER);
        let table = from_bytes(text.as_bytes()).unwrap();
        assert_eq!(table.records[0].len(), 4);
    }

    #[test]
    fn missing_path_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("build").join("Release").join("results.csv");
        match load(&missing) {
            Err(BenchPlotError::NotFound(p)) => assert_eq!(p, missing),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(sample().as_bytes()).unwrap();
        let table = load(file.path()).unwrap();
        assert_eq!(table.headers.len(), 5);
        assert_eq!(table.records.len(), 2);
    }

    #[test]
    fn load_failure_names_the_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"a,b\n1,2,3\n").unwrap();
        let err = load(file.path()).unwrap_err();
        assert!(err.is_load_error());
        assert!(err.to_string().contains(&format!("{:?}", file.path())));
    }
}
