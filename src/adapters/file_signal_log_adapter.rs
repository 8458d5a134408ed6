//! Append-only signal log file.
//!
//! The external log viewer tails this file, so lines arrive pre-formatted
//! from the domain and are written verbatim, one per append.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::domain::error::TurtlescanError;
use crate::ports::signal_log_port::SignalLogPort;

pub struct FileSignalLogAdapter {
    log_path: PathBuf,
}

impl FileSignalLogAdapter {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }
}

impl SignalLogPort for FileSignalLogAdapter {
    fn append(&self, line: &str) -> Result<(), TurtlescanError> {
        if let Some(parent) = self.log_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}
