//! Timestamped output directories
//!
//! Files are written into `<name>.partial` first. The directory only gets its
//! final name once everything was written; dropping an uncommitted
//! [`OutputDir`] removes it.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const OUTPUT_PREFIX: &str = "Output-";
const PARTIAL_SUFFIX: &str = ".partial";

/// `Output-YYYYMMDDHHMMSS`
pub fn timestamp_dir_name<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    format!("{OUTPUT_PREFIX}{}", now.format("%Y%m%d%H%M%S"))
}

/// `Mutant0.cs`, `Mutant1.cs`, ...
pub fn mutant_file_name(index: usize) -> String {
    format!("Mutant{index}.cs")
}

#[derive(Debug)]
pub struct OutputDir {
    partial: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl OutputDir {
    /// Starts a new output directory `root/name`. If that name is taken, a
    /// numeric suffix is appended.
    pub fn create(root: &Path, name: &str) -> Result<Self> {
        fs::create_dir_all(root).with_context(|| format!("creating output directory {}", root.display()))?;

        let mut target = root.join(name);
        let mut attempt = 1;
        while target.exists() {
            if attempt > 100 {
                bail!("no free output directory name under {}", root.display());
            }
            target = root.join(format!("{name}-{attempt}"));
            attempt += 1;
        }

        let mut partial = target.clone().into_os_string();
        partial.push(PARTIAL_SUFFIX);
        let partial = PathBuf::from(partial);
        if partial.exists() {
            fs::remove_dir_all(&partial)
                .with_context(|| format!("removing stale directory {}", partial.display()))?;
        }
        fs::create_dir(&partial).with_context(|| format!("creating {}", partial.display()))?;
        debug!(path = %partial.display(), "created output directory");

        Ok(Self {
            partial,
            target,
            committed: false,
        })
    }

    /// Where files go until the directory is committed.
    pub fn path(&self) -> &Path {
        &self.partial
    }

    /// Final location after [`OutputDir::commit`].
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn write(&self, file_name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.partial.join(file_name);
        fs::write(&path, contents).with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }

    pub fn commit(mut self) -> Result<PathBuf> {
        fs::rename(&self.partial, &self.target).with_context(|| {
            format!(
                "renaming {} to {}",
                self.partial.display(),
                self.target.display()
            )
        })?;
        self.committed = true;
        Ok(self.target.clone())
    }
}

impl Drop for OutputDir {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(err) = fs::remove_dir_all(&self.partial) {
                warn!(path = %self.partial.display(), %err, "could not remove partial output");
            }
        }
    }
}
