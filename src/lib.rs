use crate::block_hasher::BlockHasher;
use crate::error::{HashJobError, Result};
use crate::file_hash::FileHash;
use blake2::Blake2b512;
use crossbeam::channel::Sender;
use md5::Md5;
use sha1::Sha1;
use sha2::{Sha256, Sha512};
use std::fs::File;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use tokio_util::sync::CancellationToken;
mod block_hasher;
pub mod error;
mod file_hash;
pub mod hash_file;
pub mod hash_job;
mod output;
mod speed;
pub mod ui;

pub use crate::block_hasher::{HashOutcome, HashProgress};
pub use crate::file_hash::CHUNK_SIZE;
pub use crate::hash_job::{HashEvent, HashJobController, HashJobOptions, HashJobResult};

/// Algorithm selector. Parsing is case-sensitive and accepts exactly the
/// names below.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, IntoStaticStr, PartialEq, Eq)]
pub enum HashType {
    #[strum(serialize = "MD5")]
    MD5,
    #[strum(serialize = "SHA-1")]
    SHA1,
    #[strum(serialize = "SHA-256")]
    SHA256,
    #[strum(serialize = "SHA-512")]
    SHA512,
    #[strum(serialize = "BLAKE2b")]
    Blake2b,
}

impl Default for HashType {
    fn default() -> Self {
        HashType::SHA256
    }
}

pub fn get_hash_types() -> Vec<&'static str> {
    HashType::iter().map(|ht| ht.into()).collect()
}

pub fn get_hash_type_from_str(type_str: &str) -> Result<HashType> {
    type_str
        .parse()
        .map_err(|_| HashJobError::UnsupportedAlgorithm(type_str.to_owned()))
}

/// Opens a regular file for hashing and returns it with its current size.
fn open_file(file_path: &Path) -> Result<(File, u64)> {
    let access_error = |reason: String| HashJobError::FileAccess {
        path: file_path.display().to_string(),
        reason,
    };
    let file = File::open(file_path).map_err(|why| access_error(why.to_string()))?;
    let metadata = file
        .metadata()
        .map_err(|why| access_error(why.to_string()))?;
    if !metadata.is_file() {
        return Err(access_error("not a regular file".into()));
    }

    Ok((file, metadata.len()))
}

fn create_file(file_path: &Path) -> Result<File> {
    File::create(file_path).map_err(|why| {
        HashJobError::SaveFailure(format!("couldn't create {}: {}", file_path.display(), why))
    })
}

fn get_md5_file_hasher(file_path: &Path, buffer_size: usize) -> Result<FileHash<Md5>> {
    FileHash::new_with_buffer_size(file_path, buffer_size)
}

fn get_sha1_file_hasher(file_path: &Path, buffer_size: usize) -> Result<FileHash<Sha1>> {
    FileHash::new_with_buffer_size(file_path, buffer_size)
}

fn get_sha256_file_hasher(file_path: &Path, buffer_size: usize) -> Result<FileHash<Sha256>> {
    FileHash::new_with_buffer_size(file_path, buffer_size)
}

fn get_sha512_file_hasher(file_path: &Path, buffer_size: usize) -> Result<FileHash<Sha512>> {
    FileHash::new_with_buffer_size(file_path, buffer_size)
}

fn get_blake2b_file_hasher(
    file_path: &Path,
    buffer_size: usize,
) -> Result<FileHash<Blake2b512>> {
    FileHash::new_with_buffer_size(file_path, buffer_size)
}

fn get_file_hasher(
    hash_type: HashType,
    file_path: &Path,
    buffer_size: usize,
) -> Result<Box<dyn BlockHasher>> {
    Ok(match hash_type {
        HashType::MD5 => Box::new(get_md5_file_hasher(file_path, buffer_size)?),
        HashType::SHA1 => Box::new(get_sha1_file_hasher(file_path, buffer_size)?),
        HashType::SHA256 => Box::new(get_sha256_file_hasher(file_path, buffer_size)?),
        HashType::SHA512 => Box::new(get_sha512_file_hasher(file_path, buffer_size)?),
        HashType::Blake2b => Box::new(get_blake2b_file_hasher(file_path, buffer_size)?),
    })
}

/// Hashes `file_path` in `buffer_size` chunks.
///
/// Progress goes to `progress_sender` every `notification_block_size` bytes
/// (every chunk when `None`). Open failures are reported as
/// `HashOutcome::Failed` before any chunk is read.
pub fn compute_file_hash_with_options(
    file_path: &Path,
    hash_type: HashType,
    cancellation_token: &CancellationToken,
    progress_sender: Option<Sender<HashEvent>>,
    buffer_size: usize,
    notification_block_size: Option<u64>,
) -> HashOutcome {
    let mut file_hash = match get_file_hasher(hash_type, file_path, buffer_size) {
        Ok(file_hash) => file_hash,
        Err(error) => return HashOutcome::Failed(error),
    };

    if let Some(sender) = progress_sender {
        match notification_block_size {
            Some(block_size) => {
                file_hash.set_progress_event_sender_with_notification_block_size(sender, block_size)
            }
            None => file_hash.set_progress_event_sender(sender),
        }
    }

    file_hash.compute(cancellation_token)
}

pub fn compute_file_hash(
    file_path: &Path,
    hash_type: HashType,
    cancellation_token: &CancellationToken,
    progress_sender: Option<Sender<HashEvent>>,
) -> HashOutcome {
    compute_file_hash_with_options(
        file_path,
        hash_type,
        cancellation_token,
        progress_sender,
        CHUNK_SIZE,
        None,
    )
}

#[cfg(test)]
extern crate test_shared;
