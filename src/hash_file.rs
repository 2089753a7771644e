use crate::error::{HashJobError, Result};
use crate::hash_job::HashJobResult;
use crate::{create_file, HashType};
use chrono::{DateTime, Local};
use regex::{Captures, Regex};
use std::convert::Infallible;
use std::env;
use std::fs;
use std::io::{prelude::Write, BufWriter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

pub const OUTPUT_FOLDER_NAME: &str = "HASHOutput";
const SAFE_NAME_LENGTH: usize = 10;

/// Where the `HASHOutput` folder is created.
#[derive(Clone, Debug, PartialEq)]
pub enum OutputBase {
    CurrentDir,
    Documents,
    Path(PathBuf),
}

impl Default for OutputBase {
    fn default() -> Self {
        OutputBase::CurrentDir
    }
}

impl FromStr for OutputBase {
    type Err = Infallible;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Ok(match s {
            "cwd" => OutputBase::CurrentDir,
            "documents" => OutputBase::Documents,
            path => OutputBase::Path(PathBuf::from(path)),
        })
    }
}

impl OutputBase {
    pub fn resolve(&self) -> Result<PathBuf> {
        match self {
            OutputBase::CurrentDir => env::current_dir().map_err(|why| {
                HashJobError::SaveFailure(format!("couldn't get the current directory: {}", why))
            }),
            OutputBase::Documents => home_dir()
                .map(|home| home.join("Documents"))
                .ok_or_else(|| {
                    HashJobError::SaveFailure("couldn't locate the documents directory".into())
                }),
            OutputBase::Path(path) => Ok(path.clone()),
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
}

fn unsafe_characters() -> &'static Regex {
    static UNSAFE_CHARACTERS: OnceLock<Regex> = OnceLock::new();
    UNSAFE_CHARACTERS.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("valid pattern"))
}

/// Keeps the first ten characters of `file_name` and replaces everything
/// outside `[A-Za-z0-9_.-]` with `_<code point>_`.
///
/// Distinct names may map to the same result.
pub fn clean_file_name(file_name: &str) -> String {
    let truncated: String = file_name.chars().take(SAFE_NAME_LENGTH).collect();
    unsafe_characters()
        .replace_all(&truncated, |caps: &Captures| {
            caps[0]
                .chars()
                .map(|c| format!("_{}_", c as u32))
                .collect::<String>()
        })
        .into_owned()
}

/// A successful hash job rendered as a single human-readable line.
pub struct HashFile {
    hash_type: HashType,
    source_name: String,
    digest: String,
    elapsed: Duration,
    timestamp: DateTime<Local>,
}

impl HashFile {
    pub fn new(result: &HashJobResult) -> Result<Self> {
        let digest = result
            .outcome
            .digest()
            .ok_or_else(|| HashJobError::SaveFailure("no hash to save".into()))?;
        let source_name = result
            .file_path
            .file_name()
            .unwrap_or_else(|| result.file_path.as_os_str())
            .to_string_lossy()
            .into_owned();
        Ok(HashFile {
            hash_type: result.hash_type,
            source_name,
            digest: digest.to_owned(),
            elapsed: result.elapsed,
            timestamp: Local::now(),
        })
    }

    pub fn file_name(&self) -> String {
        format!("HASHof{}.txt", clean_file_name(&self.source_name))
    }

    pub fn line(&self) -> String {
        format!(
            "{} hash of {} is {}. Computed in {:.3} seconds on {}.",
            self.hash_type,
            self.source_name,
            self.digest,
            self.elapsed.as_secs_f64(),
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        )
    }

    /// Writes the line to `<base_path>/HASHOutput/HASHof<name>.txt`, replacing
    /// any previous file of that name.
    pub fn save(&self, base_path: &Path) -> Result<PathBuf> {
        let folder_path = base_path.join(OUTPUT_FOLDER_NAME);
        fs::create_dir_all(&folder_path).map_err(|why| {
            HashJobError::SaveFailure(format!(
                "couldn't create {}: {}",
                folder_path.display(),
                why
            ))
        })?;

        let file_path = folder_path.join(self.file_name());
        let file = create_file(&file_path)?;
        let mut writer = BufWriter::new(&file);
        writeln!(writer, "{}", self.line())
            .and_then(|_| writer.flush())
            .map_err(|why| {
                HashJobError::SaveFailure(format!(
                    "couldn't write to {}: {}",
                    file_path.display(),
                    why
                ))
            })?;

        Ok(file_path)
    }
}
