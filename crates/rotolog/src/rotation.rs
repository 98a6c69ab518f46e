//! Size-based rotation of the active log file
//!
//! The chain for `logs/app.log` is `logs/app.log` (index 0, active),
//! `logs/app.1.log`, `logs/app.2.log`, ... up to index `max_files - 1`.
//! Higher indices are older.

use crate::config::RotationPolicy;
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Naming scheme of the files in a rotation chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationChain {
    dir: PathBuf,
    stem: OsString,
    extension: Option<OsString>,
}

impl RotationChain {
    /// Derive the chain from the active file's path
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self {
            dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
            stem: path.file_stem().map(OsString::from).unwrap_or_default(),
            extension: path.extension().map(OsString::from),
        }
    }

    /// Path of rotation index `index`; index 0 is the active file
    pub fn path(&self, index: u32) -> PathBuf {
        let mut name = self.stem.clone();
        if index > 0 {
            name.push(format!(".{index}"));
        }
        if let Some(extension) = &self.extension {
            name.push(".");
            name.push(extension);
        }
        self.dir.join(name)
    }

    /// Path of the active file
    pub fn active_path(&self) -> PathBuf {
        self.path(0)
    }

    /// Directory holding the chain, empty for the working directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Move every file one index up, oldest first, so that index 0 is free.
    ///
    /// The file at `max_files - 1` is overwritten. Missing files and failed
    /// renames are skipped.
    pub fn shift(&self, max_files: u32) {
        for index in (0..max_files.saturating_sub(1)).rev() {
            let _ = fs::rename(self.path(index), self.path(index + 1));
        }
    }
}

/// The active file of a rotation chain and the bytes written to it
#[derive(Debug)]
pub struct RotatingFile {
    chain: RotationChain,
    policy: RotationPolicy,
    buffer_capacity: usize,
    writer: Option<BufWriter<File>>,
    size: u64,
    lost_records: u64,
}

impl RotatingFile {
    /// Open the active file for appending, creating missing directories.
    ///
    /// The byte count starts from the size of any existing file.
    pub fn open(
        chain: RotationChain,
        policy: RotationPolicy,
        buffer_capacity: usize,
    ) -> Result<Self> {
        let dir = chain.dir();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|source| Error::CreateDirectory {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let path = chain.active_path();
        let size = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| Error::Open { path, source })?;

        Ok(Self {
            chain,
            policy,
            buffer_capacity,
            writer: Some(BufWriter::with_capacity(buffer_capacity, file)),
            size,
            lost_records: 0,
        })
    }

    /// Bytes written to the active file, including what is still buffered
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Whether the active file is open
    pub const fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Naming scheme of the chain
    pub const fn chain(&self) -> &RotationChain {
        &self.chain
    }

    /// Rotation policy in effect
    pub const fn policy(&self) -> RotationPolicy {
        self.policy
    }

    /// Append one record, rotating first if it would cross the threshold.
    ///
    /// Returns whether a rotation happened.
    pub fn append(&mut self, record: &[u8]) -> io::Result<bool> {
        if self.writer.is_none() {
            return Err(closed());
        }

        let rotated = self.maybe_rotate(record.len() as u64)?;
        let writer = self.writer.as_mut().ok_or_else(closed)?;
        match writer.write_all(record) {
            Ok(()) => {
                self.size += record.len() as u64;
                Ok(rotated)
            }
            Err(e) => {
                // Part of the record may have reached the file or the buffer.
                let on_disk = writer.get_ref().metadata().map(|meta| meta.len());
                if let Ok(on_disk) = on_disk {
                    self.size = on_disk + writer.buffer().len() as u64;
                }
                Err(e)
            }
        }
    }

    /// Rotate if a record of `next_len` bytes would cross the threshold
    pub fn maybe_rotate(&mut self, next_len: u64) -> io::Result<bool> {
        if !self.policy.should_rotate(self.size, next_len) {
            return Ok(false);
        }
        self.rotate()?;
        Ok(true)
    }

    /// Close the active file, shift the chain and reopen the active file.
    ///
    /// A single-file chain starts over empty. Otherwise the active file is
    /// reopened for appending, so its records survive a failed rename and
    /// the byte count continues from its size. If the file cannot be
    /// reopened the logger stays closed.
    pub fn rotate(&mut self) -> io::Result<()> {
        let RotationPolicy::Size { max_files, .. } = self.policy else {
            return Ok(());
        };

        if let Some(writer) = self.writer.take() {
            self.lost_records += finish(writer);
        }

        self.chain.shift(max_files);
        self.size = 0;

        let mut options = OpenOptions::new();
        options.create(true);
        if max_files == 1 {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        let file = options.open(self.chain.active_path())?;
        self.size = file.metadata().map(|meta| meta.len()).unwrap_or(0);
        self.writer = Some(BufWriter::with_capacity(self.buffer_capacity, file));
        Ok(())
    }

    /// Records that were buffered for a rotated-out file but could not be
    /// flushed, reset to zero by the call
    pub fn take_lost_records(&mut self) -> u64 {
        std::mem::take(&mut self.lost_records)
    }

    /// Flush buffered records to the active file
    pub fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }

    /// Flush and close the active file
    pub fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Flush and drop `writer`, returning how many records stayed unwritten
fn finish(mut writer: BufWriter<File>) -> u64 {
    if writer.flush().is_ok() {
        return 0;
    }
    let unwritten = match writer.into_parts() {
        (_, Ok(buffer)) => buffer,
        (_, Err(panicked)) => panicked.into_inner(),
    };
    unwritten.iter().filter(|&&byte| byte == b'\n').count() as u64
}

fn closed() -> io::Error {
    io::Error::other("log file is closed")
}
