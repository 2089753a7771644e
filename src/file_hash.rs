use crate::block_hasher::{BlockHasher, HashProgress};
use crate::error::Result;
use crate::hash_job::HashEvent;
use crate::open_file;
use crossbeam::channel::Sender;
use digest::Digest;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

/// Bytes read from the source per chunk.
pub const CHUNK_SIZE: usize = 4_096;

pub struct FileHash<T: Digest + digest::FixedOutputReset> {
    file_path: PathBuf,
    file_size: u64,
    reader: BufReader<std::fs::File>,
    hasher: T,
    buffer: Vec<u8>,
    buffer_size: usize,
    progress_event: Option<Sender<HashEvent>>,
    notification_block_size: u64,
}

impl<T: Digest + digest::FixedOutputReset> FileHash<T> {
    pub fn new_with_buffer_size(file_path: &Path, buffer_size: usize) -> Result<Self> {
        let (file, file_size) = open_file(file_path)?;
        let buffer_size = buffer_size.max(1);
        Ok(FileHash {
            file_path: file_path.to_path_buf(),
            file_size,
            reader: BufReader::with_capacity(buffer_size, file),
            hasher: T::new(),
            buffer: Vec::with_capacity(buffer_size),
            buffer_size,
            progress_event: None,
            notification_block_size: 0,
        })
    }
    pub fn new(file_path: &Path) -> Result<Self> {
        FileHash::new_with_buffer_size(file_path, CHUNK_SIZE)
    }
}

impl<T: Digest + digest::FixedOutputReset> BlockHasher for FileHash<T> {
    fn read(&mut self) -> io::Result<usize> {
        self.buffer.clear();
        let mut adaptor = (&mut self.reader).take(self.buffer_size as u64);
        adaptor.read_to_end(&mut self.buffer)
    }
    fn update(&mut self, byte_count: usize) {
        Digest::update(&mut self.hasher, &self.buffer[..byte_count]);
    }
    fn digest(&mut self) -> String {
        hex::encode(self.hasher.finalize_reset())
    }
    fn file_path(&self) -> &Path {
        &self.file_path
    }
    fn file_size(&self) -> u64 {
        self.file_size
    }
    fn set_progress_event_sender(&mut self, sender: Sender<HashEvent>) {
        let notification_block_size = self.buffer_size as u64;
        self.set_progress_event_sender_with_notification_block_size(
            sender,
            notification_block_size,
        )
    }
    fn set_progress_event_sender_with_notification_block_size(
        &mut self,
        sender: Sender<HashEvent>,
        notification_block_size: u64,
    ) {
        self.progress_event = Some(sender);
        self.notification_block_size = notification_block_size.max(1);
    }
    fn notification_block_size(&self) -> u64 {
        self.notification_block_size
    }
    fn is_progress_event_sender_defined(&self) -> bool {
        self.progress_event.is_some()
    }
    fn handle_progress_event(&self, progress: HashProgress) {
        if let Some(sender) = &self.progress_event {
            // A caller that dropped its receiver no longer wants progress.
            let _ = sender.send(HashEvent::Progress(progress));
        }
    }
}
