use std::fmt;
use std::path::PathBuf;

/// Errors that stop the benchmark plotting.
#[derive(Debug, thiserror::Error)]
pub enum BenchPlotError {
    /// The resolved CSV path does not exist
    #[error("File not found: {0:?}")]
    NotFound(PathBuf),

    /// I/O error reading the CSV file
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No candidate encoding produced a parsable table
    #[error("Could not parse {path:?} with any candidate encoding: {attempts}")]
    Decode {
        path: PathBuf,
        attempts: DecodeAttempts,
    },

    /// Required columns missing after a successful load
    #[error(
        "unexpected column names received: {found:?}; \
        make sure the CSV contains columns: {expected:?}"
    )]
    Schema {
        found: Vec<String>,
        expected: Vec<&'static str>,
    },

    #[error("Failed to create output directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render {path:?}: {source}")]
    Render {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl BenchPlotError {
    /// True for the failures that happen before a table is available.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            BenchPlotError::NotFound(_) | BenchPlotError::Io { .. } | BenchPlotError::Decode { .. }
        )
    }
}

/// One failed attempt to decode and parse the CSV with a given encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodeAttempt {
    pub encoding: &'static str,
    pub reason: String,
}

/// The failed attempts, in the order they were tried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodeAttempts(pub Vec<DecodeAttempt>);

impl DecodeAttempts {
    pub fn last(&self) -> Option<&DecodeAttempt> {
        self.0.last()
    }
}

impl fmt::Display for DecodeAttempts {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, attempt) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{} ({})", attempt.encoding, attempt.reason)?;
        }
        Ok(())
    }
}
