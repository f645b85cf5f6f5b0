//! RunLogger - append-only log file scoped to one run

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use contracts::{ChannelKind, LogRecord, LoggingError};
use tracing::{debug, instrument};

/// Upper bound on `_<n>` suffixes tried for one start second
const MAX_NAME_SUFFIX: u32 = 10_000;

/// How the file is claimed on first write
#[derive(Debug)]
enum Naming {
    /// `<stem>.log`, then `<stem>_2.log`, ... until a name is free
    Unique { directory: PathBuf, stem: String },
    /// Exactly this path, appending to whatever is there
    Fixed,
}

/// Append-only run log.
///
/// Nothing touches the filesystem until the first `append`; the directory
/// and file are created then. Records are only ever appended. Runs sharing a
/// start second get distinct files.
#[derive(Debug)]
pub struct RunLogger {
    path: PathBuf,
    naming: Naming,
    file: Option<File>,
    created: bool,
    written: u64,
}

impl RunLogger {
    /// Logger for a run of `channel` started at `started_at`, writing under `directory`
    pub fn new(directory: impl AsRef<Path>, channel: ChannelKind, started_at: DateTime<Local>) -> Self {
        let directory = directory.as_ref().to_path_buf();
        let stem = format!(
            "{}_{}",
            channel.log_prefix(),
            started_at.format("%Y%m%d_%H%M%S")
        );
        Self {
            path: directory.join(format!("{stem}.log")),
            naming: Naming::Unique { directory, stem },
            file: None,
            created: false,
            written: 0,
        }
    }

    /// Logger writing to an explicit file
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            naming: Naming::Fixed,
            file: None,
            created: false,
            written: 0,
        }
    }

    /// Log file path; final once `is_created` is true
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records successfully appended
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Whether this logger has created (or claimed) its file
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Append one record as one line.
    ///
    /// A failure leaves the logger usable: the handle is dropped and the next
    /// append reopens the file.
    #[instrument(
        name = "run_logger_append",
        skip(self, record),
        fields(path = %self.path.display(), outcome = %record.outcome)
    )]
    pub fn append(&mut self, record: &LogRecord) -> Result<(), LoggingError> {
        let mut line = record.to_line();
        line.push('\n');

        let result = self.open().and_then(|file| {
            file.write_all(line.as_bytes())?;
            file.flush()
        });

        match result {
            Ok(()) => {
                self.written += 1;
                Ok(())
            }
            Err(e) => {
                self.file = None;
                Err(LoggingError::new(&self.path, e))
            }
        }
    }

    fn open(&mut self) -> std::io::Result<&mut File> {
        let file = match self.file.take() {
            Some(file) => file,
            None => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let file = if self.created {
                    OpenOptions::new().append(true).open(&self.path)?
                } else {
                    self.claim()?
                };
                self.created = true;
                debug!(path = %self.path.display(), "Run log opened");
                file
            }
        };
        Ok(self.file.insert(file))
    }

    /// First open: pick a file name no other run holds
    fn claim(&mut self) -> std::io::Result<File> {
        let (directory, stem) = match &self.naming {
            Naming::Fixed => {
                return OpenOptions::new().create(true).append(true).open(&self.path);
            }
            Naming::Unique { directory, stem } => (directory.clone(), stem.clone()),
        };

        let mut suffix = 1;
        loop {
            match OpenOptions::new().create_new(true).append(true).open(&self.path) {
                Err(e) if e.kind() == ErrorKind::AlreadyExists && suffix < MAX_NAME_SUFFIX => {
                    suffix += 1;
                    self.path = directory.join(format!("{stem}_{suffix}.log"));
                }
                result => return result,
            }
        }
    }
}
