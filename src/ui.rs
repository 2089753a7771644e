use std::path::{Path, PathBuf};

use crate::error::{HashJobError, Result};
use crate::hash_job::{HashEvent, HashJobCanceller, HashJobController, HashJobResult};
use crate::output::Output;
use crate::HashOutcome;

pub struct UI {
    controller: HashJobController,
    silent: bool,
}

impl UI {
    pub fn new(controller: HashJobController, silent: bool) -> UI {
        UI { controller, silent }
    }
    pub fn canceller(&self) -> HashJobCanceller {
        self.controller.canceller()
    }
    /// Starts a job on `file_path` and renders its events until the terminal
    /// one arrives.
    pub fn run(&self, file_path: &Path) -> Result<HashJobResult> {
        let event_receiver = self.controller.event_receiver();
        self.controller.start(file_path)?;

        let display_path = file_path.display().to_string();
        let mut output = Output::new();
        if !self.silent {
            output.write_init();
        }

        for event in event_receiver.iter() {
            match event {
                HashEvent::Progress(progress) => {
                    if !self.silent {
                        output.write_progress(&display_path, &progress);
                    }
                }
                HashEvent::Finished(result) => {
                    if !self.silent {
                        match &result.outcome {
                            HashOutcome::Success(digest) => {
                                output.clear_line();
                                output.write_result(format!(
                                    "{} *{} ({})",
                                    digest, display_path, result.hash_type
                                ));
                            }
                            HashOutcome::Cancelled => output.clear_line(),
                            HashOutcome::Failed(error) => {
                                output.write_error(&display_path, error)
                            }
                        }
                    }

                    return Ok(result);
                }
            }
        }

        Err(HashJobError::Disconnected)
    }
    pub fn save(&self) -> Result<PathBuf> {
        self.controller.save_result()
    }
}
