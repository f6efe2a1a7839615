//! Serialization of the cost tables.
//!
//! Tables are dumped as raw bytes, one write per call so a dump can serve
//! as a checkpoint. Failures carry the stage they occurred in, letting the
//! command line tools report distinct exit codes per stage.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Stage of a table dump.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SaveStage {
    Create,
    Write,
    Close,
}

#[derive(Debug)]
pub struct SaveError {
    pub stage: SaveStage,
    pub path: PathBuf,
    source: io::Error,
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self.stage {
            SaveStage::Create => "create",
            SaveStage::Write => "write to",
            SaveStage::Close => "close",
        };
        write!(f, "cannot {} file {}", verb, self.path.display())
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Writes `bytes` to `path`, truncating any previous content.
pub fn save_bytes(bytes: &[u8], path: &Path) -> Result<(), SaveError> {
    let fail = |stage, source| SaveError {
        stage,
        path: path.to_owned(),
        source,
    };
    let mut file = File::create(path).map_err(|e| fail(SaveStage::Create, e))?;
    file.write_all(bytes).map_err(|e| fail(SaveStage::Write, e))?;
    file.sync_all().map_err(|e| fail(SaveStage::Close, e))?;
    Ok(())
}
