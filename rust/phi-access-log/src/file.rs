use crate::{Level, LogSink, PhiAccessLogError, format_line};
use chrono::Local;
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Default size at which a log file is rotated, when rotation is enabled.
pub const DEFAULT_ROTATION_SIZE: u64 = 1_048_576;

/// Size based rotation policy for [`FileSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    /// How many rotated files to retain. `0` disables rotation.
    pub keep: usize,
    /// Size in bytes a file may reach before it is rotated.
    pub max_bytes: u64,
}

impl Rotation {
    /// Never rotate; the file grows without bound.
    pub fn disabled() -> Self {
        Self {
            keep: 0,
            max_bytes: DEFAULT_ROTATION_SIZE,
        }
    }

    /// Keep `keep` rotated files of at most `max_bytes` each.
    pub fn new(keep: usize, max_bytes: u64) -> Self {
        Self { keep, max_bytes }
    }

    /// Whether this policy ever rotates.
    pub fn is_enabled(&self) -> bool {
        self.keep > 0
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::disabled()
    }
}

#[derive(Debug)]
struct OpenFile {
    file: File,
    size: u64,
}

/// Appends formatted audit lines to a file.
///
/// With rotation enabled, a write that would push the file past
/// [`Rotation::max_bytes`] first shifts `path` to `path.0`, `path.0` to
/// `path.1` and so on, dropping anything beyond [`Rotation::keep`] files.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    rotation: Rotation,
    open: Mutex<OpenFile>,
}

impl FileSink {
    /// Open (or create) `path` for appending.
    pub fn open(path: impl Into<PathBuf>, rotation: Rotation) -> Result<Self, PhiAccessLogError> {
        let path = path.into();
        let open = open_append(&path)?;
        Ok(Self {
            path,
            rotation,
            open: Mutex::new(open),
        })
    }

    /// Path of the active log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rotation policy in effect.
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Path of the `index`-th rotated file (`0` is the most recent).
    pub fn rotated_path(&self, index: usize) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    /// Append a single, already formatted line.
    pub fn append(&self, line: &str) -> Result<(), PhiAccessLogError> {
        let mut open = self.open.lock();
        let incoming = line.len() as u64;

        if self.rotation.is_enabled()
            && open.size > 0
            && open.size + incoming > self.rotation.max_bytes
        {
            self.shift()?;
            *open = open_append(&self.path)?;
        }

        open.file
            .write_all(line.as_bytes())
            .and_then(|_| open.file.flush())
            .map_err(|source| PhiAccessLogError::Write {
                path: self.path.clone(),
                source,
            })?;
        open.size += incoming;
        Ok(())
    }

    fn shift(&self) -> Result<(), PhiAccessLogError> {
        let rotate = |source: io::Error| PhiAccessLogError::Rotate {
            path: self.path.clone(),
            source,
        };

        let oldest = self.rotated_path(self.rotation.keep - 1);
        if oldest.exists() {
            fs::remove_file(&oldest).map_err(rotate)?;
        }
        for index in (0..self.rotation.keep - 1).rev() {
            let from = self.rotated_path(index);
            if from.exists() {
                fs::rename(&from, self.rotated_path(index + 1)).map_err(rotate)?;
            }
        }
        fs::rename(&self.path, self.rotated_path(0)).map_err(rotate)
    }
}

impl LogSink for FileSink {
    fn write(&self, level: Level, tags: &[String], message: &str) {
        let line = format_line(&Local::now(), level, tags, message);
        if let Err(error) = self.append(&line) {
            tracing::warn!(%error, "Dropped PHI access log line");
        }
    }
}

fn open_append(path: &Path) -> Result<OpenFile, PhiAccessLogError> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| PhiAccessLogError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let size = file
        .metadata()
        .map_err(|source| PhiAccessLogError::Open {
            path: path.to_path_buf(),
            source,
        })?
        .len();
    Ok(OpenFile { file, size })
}
