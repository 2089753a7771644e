use crate::error::HashJobError;
use crate::hash_job::HashEvent;
use crossbeam::channel::Sender;
use std::io;
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HashProgress {
    pub bytes_processed: u64,
    pub file_size: u64,
}

impl HashProgress {
    /// Share of the file hashed so far, in `[0, 100]`.
    ///
    /// `file_size` is the size observed when the file was opened. Bytes
    /// appended afterwards are hashed but clamp the value at 100; an empty
    /// file is complete by definition.
    pub fn percent(&self) -> f64 {
        if self.bytes_processed >= self.file_size {
            return 100.0;
        }

        self.bytes_processed as f64 * 100.0 / self.file_size as f64
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HashOutcome {
    Success(String),
    Cancelled,
    Failed(HashJobError),
}

impl HashOutcome {
    pub fn digest(&self) -> Option<&str> {
        match self {
            HashOutcome::Success(digest) => Some(digest),
            _ => None,
        }
    }
}

pub trait BlockHasher {
    fn read(&mut self) -> io::Result<usize>;
    fn update(&mut self, byte_count: usize);
    fn digest(&mut self) -> String;
    fn file_path(&self) -> &Path;
    fn file_size(&self) -> u64;
    fn set_progress_event_sender(&mut self, sender: Sender<HashEvent>);
    fn set_progress_event_sender_with_notification_block_size(
        &mut self,
        sender: Sender<HashEvent>,
        notification_block_size: u64,
    );
    fn notification_block_size(&self) -> u64;
    fn is_progress_event_sender_defined(&self) -> bool;
    fn handle_progress_event(&self, progress: HashProgress);

    /// Hashes the source to its end, one chunk per `read`.
    ///
    /// The token is checked after every read, including the final empty one,
    /// and before the chunk reaches the accumulator. A cancel request therefore
    /// costs at most one extra chunk read and never an extra `update`.
    fn compute(&mut self, cancellation_token: &CancellationToken) -> HashOutcome {
        let file_size = self.file_size();
        let notification_block_size = self.notification_block_size();
        let notify = self.is_progress_event_sender_defined() && notification_block_size > 0;
        let mut bytes_processed = 0u64;
        let mut running_notification_block_size = 0u64;
        let mut last_percent: Option<f64> = None;
        loop {
            let bytes_read = match self.read() {
                Ok(bytes_read) => bytes_read,
                Err(why) => {
                    return HashOutcome::Failed(HashJobError::IoFailure {
                        path: self.file_path().display().to_string(),
                        reason: why.to_string(),
                    })
                }
            };

            if cancellation_token.is_cancelled() {
                return HashOutcome::Cancelled;
            }

            if bytes_read == 0 {
                break;
            }

            self.update(bytes_read);
            bytes_processed += bytes_read as u64;
            if notify {
                running_notification_block_size += bytes_read as u64;
                if running_notification_block_size >= notification_block_size {
                    running_notification_block_size %= notification_block_size;
                    let progress = HashProgress {
                        bytes_processed,
                        file_size,
                    };
                    last_percent = Some(progress.percent());
                    self.handle_progress_event(progress);
                }
            }
        }

        // The file may have shrunk since it was measured, or the last block
        // may have been below the notification threshold.
        if notify && last_percent.map_or(true, |percent| percent < 100.0) {
            self.handle_progress_event(HashProgress {
                bytes_processed,
                file_size: bytes_processed,
            });
        }

        HashOutcome::Success(self.digest())
    }
}
