use crossbeam::channel::Receiver;
use std::fs;
use std::time::Duration;

use hshjob::error::HashJobError;
use hshjob::hash_file::{OutputBase, OUTPUT_FOLDER_NAME};
use hshjob::{
    HashEvent, HashJobController, HashJobOptions, HashJobResult, HashOutcome, HashProgress,
    HashType,
};

extern crate test_shared;

static DATA_SHA256: &str = "3a6eb0790f39ac87c94f3856b2dd2c5d110e6811602261a9a923d3bb23adc8b7";
static EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
static EVENT_TIMEOUT: Duration = Duration::from_secs(30);
static QUIET_PERIOD: Duration = Duration::from_millis(100);

// Large enough, with small chunks, that a job outlives the calls made right
// after `start`.
const LONG_FILE_SIZE: usize = 8 * 1_048_576;
const LONG_CHUNK_SIZE: usize = 64;

fn wait_for_result(receiver: &Receiver<HashEvent>) -> (Vec<HashProgress>, HashJobResult) {
    let mut progress = Vec::new();
    loop {
        match receiver
            .recv_timeout(EVENT_TIMEOUT)
            .expect("No terminal event received.")
        {
            HashEvent::Progress(args) => progress.push(args),
            HashEvent::Finished(result) => return (progress, result),
        }
    }
}

fn long_job_controller(options: HashJobOptions) -> HashJobController {
    HashJobController::new(HashJobOptions {
        chunk_size: Some(LONG_CHUNK_SIZE),
        notification_block_size: Some(1_048_576),
        ..options
    })
}

#[test]
fn hash_job_success() {
    let file = test_shared::create_tmp_file("data");
    let controller = HashJobController::new(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    let (progress, result) = wait_for_result(&receiver);
    assert_eq!(result.outcome, HashOutcome::Success(DATA_SHA256.into()));
    assert_eq!(result.hash_type, HashType::SHA256);
    assert_eq!(result.file_path, file);
    assert_eq!(1, progress.len());
    assert_eq!(100.0, progress[0].percent());
    assert!(receiver.recv_timeout(QUIET_PERIOD).is_err());
    assert!(!controller.is_running());
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_progress_is_non_decreasing() {
    let file = test_shared::create_tmp_file_with_size(100_000);
    let controller = HashJobController::new(HashJobOptions {
        hash_type: Some(HashType::MD5),
        ..Default::default()
    });
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    let (progress, result) = wait_for_result(&receiver);
    assert!(result.outcome.digest().is_some());
    assert!(progress.len() > 1);
    assert!(progress
        .windows(2)
        .all(|pair| pair[0].percent() <= pair[1].percent()));
    assert_eq!(100.0, progress.last().unwrap().percent());
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_empty_file() {
    let file = test_shared::create_tmp_file("");
    let controller = HashJobController::new(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    let (progress, result) = wait_for_result(&receiver);
    assert_eq!(result.outcome, HashOutcome::Success(EMPTY_SHA256.into()));
    assert_eq!(1, progress.len());
    assert_eq!(100.0, progress[0].percent());
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_missing_file() {
    let dir = test_shared::create_tmp_dir();
    let controller = HashJobController::new(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(dir.join("missing")).unwrap();
    let (progress, result) = wait_for_result(&receiver);
    assert!(progress.is_empty());
    assert!(matches!(
        result.outcome,
        HashOutcome::Failed(HashJobError::FileAccess { .. })
    ));
    drop(controller);
    fs::remove_dir_all(dir).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_empty_path_is_rejected() {
    let controller = HashJobController::new(HashJobOptions::default());
    let receiver = controller.event_receiver();
    assert!(matches!(
        controller.start(""),
        Err(HashJobError::FileAccess { .. })
    ));
    assert!(!controller.is_running());
    assert!(receiver.recv_timeout(QUIET_PERIOD).is_err());
}

#[test]
fn hash_job_whitespace_file_name() {
    let dir = test_shared::create_tmp_dir();
    let file = test_shared::create_file_with_content(&dir, " ", "data");
    let controller = HashJobController::new(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    let (_, result) = wait_for_result(&receiver);
    assert_eq!(result.outcome, HashOutcome::Success(DATA_SHA256.into()));
    // A bare whitespace name is a path like any other; it just doesn't exist here.
    controller.start(" ").unwrap();
    let (progress, result) = wait_for_result(&receiver);
    assert!(progress.is_empty());
    assert!(matches!(
        result.outcome,
        HashOutcome::Failed(HashJobError::FileAccess { .. })
    ));
    drop(controller);
    fs::remove_dir_all(dir).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_set_algorithm() {
    let mut controller = HashJobController::new(HashJobOptions::default());
    controller.set_algorithm("SHA-512").unwrap();
    assert_eq!(controller.hash_type(), HashType::SHA512);
    assert_eq!(
        controller.set_algorithm("whirlpool"),
        Err(HashJobError::UnsupportedAlgorithm("whirlpool".into()))
    );
    assert_eq!(controller.hash_type(), HashType::SHA512);
}

#[test]
fn hash_job_start_while_running_is_rejected() {
    let file = test_shared::create_tmp_file_with_size(LONG_FILE_SIZE);
    let other = test_shared::create_tmp_file("data");
    let controller = long_job_controller(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    assert!(controller.is_running());
    assert_eq!(controller.start(&other), Err(HashJobError::AlreadyRunning));
    let (_, result) = wait_for_result(&receiver);
    assert_eq!(result.file_path, file);
    assert!(result.outcome.digest().is_some());
    // The rejected request never produces events.
    assert!(receiver.recv_timeout(QUIET_PERIOD).is_err());
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
    fs::remove_dir_all(other.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_cancel() {
    let file = test_shared::create_tmp_file_with_size(LONG_FILE_SIZE);
    let controller = long_job_controller(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    controller.cancel();
    controller.cancel();
    let (progress, result) = wait_for_result(&receiver);
    assert_eq!(result.outcome, HashOutcome::Cancelled);
    assert!(progress.iter().all(|args| args.percent() < 100.0));
    assert!(receiver.recv_timeout(QUIET_PERIOD).is_err());
    assert!(controller.last_result().is_none());
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_cancel_without_job() {
    let controller = HashJobController::new(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.cancel();
    controller.canceller().cancel();
    assert!(receiver.recv_timeout(QUIET_PERIOD).is_err());
}

#[test]
fn hash_job_restart_after_cancel() {
    let file = test_shared::create_tmp_file_with_size(LONG_FILE_SIZE);
    let data = test_shared::create_tmp_file("data");
    let controller = long_job_controller(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    controller.cancel();
    let (_, result) = wait_for_result(&receiver);
    assert_eq!(result.outcome, HashOutcome::Cancelled);
    controller.start(&data).unwrap();
    let (_, result) = wait_for_result(&receiver);
    assert_eq!(result.outcome, HashOutcome::Success(DATA_SHA256.into()));
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
    fs::remove_dir_all(data.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_is_deterministic() {
    let file = test_shared::create_tmp_file_with_size(50_000);
    let controller = HashJobController::new(HashJobOptions {
        hash_type: Some(HashType::Blake2b),
        ..Default::default()
    });
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    let (first_progress, first) = wait_for_result(&receiver);
    controller.start(&file).unwrap();
    let (second_progress, second) = wait_for_result(&receiver);
    assert!(first.outcome.digest().is_some());
    assert_eq!(first.outcome, second.outcome);
    assert_eq!(first_progress, second_progress);
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_algorithm_change_applies_to_next_job() {
    let file = test_shared::create_tmp_file("data");
    let mut controller = HashJobController::new(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.set_algorithm("MD5").unwrap();
    controller.start(&file).unwrap();
    let (_, result) = wait_for_result(&receiver);
    assert_eq!(result.hash_type, HashType::MD5);
    assert_eq!(
        result.outcome,
        HashOutcome::Success("8d777f385d3dfec8815d20f7496026dc".into())
    );
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_timeout() {
    let file = test_shared::create_tmp_file_with_size(LONG_FILE_SIZE);
    let controller = long_job_controller(HashJobOptions {
        timeout: Some(Duration::from_millis(1)),
        ..Default::default()
    });
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    let (_, result) = wait_for_result(&receiver);
    assert_eq!(result.outcome, HashOutcome::Cancelled);
    drop(controller);
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_drop_cancels_running_job() {
    let file = test_shared::create_tmp_file_with_size(LONG_FILE_SIZE);
    let controller = long_job_controller(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    drop(controller);
    let (_, result) = wait_for_result(&receiver);
    assert_eq!(result.outcome, HashOutcome::Cancelled);
    // The worker is gone along with its sender.
    assert!(receiver.recv().is_err());
    fs::remove_dir_all(file.parent().unwrap()).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_save_result() {
    let dir = test_shared::create_tmp_dir();
    let file = test_shared::create_file_with_content(&dir, "My File's Data?!.bin", "data");
    let controller = HashJobController::new(HashJobOptions {
        output_base: Some(OutputBase::Path(dir.clone())),
        ..Default::default()
    });
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    let _ = wait_for_result(&receiver);
    let saved_path = controller.save_result().unwrap();
    assert_eq!(
        saved_path,
        dir.join(OUTPUT_FOLDER_NAME)
            .join("HASHofMy_32_File_39_s_32_.txt")
    );
    let saved_name = saved_path.file_name().unwrap().to_str().unwrap();
    assert!(saved_name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-'));
    let content = test_shared::get_file_string_content(&saved_path);
    assert!(content.starts_with(&format!(
        "SHA-256 hash of My File's Data?!.bin is {}.",
        DATA_SHA256
    )));
    drop(controller);
    fs::remove_dir_all(dir).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_save_without_result() {
    let dir = test_shared::create_tmp_dir();
    let controller = HashJobController::new(HashJobOptions::default());
    assert!(matches!(
        controller.save_result_to(&dir),
        Err(HashJobError::SaveFailure(_))
    ));
    assert!(!dir.join(OUTPUT_FOLDER_NAME).exists());
    fs::remove_dir_all(dir).expect("Failed to remove test directory.");
}

#[test]
fn hash_job_save_keeps_last_success_after_failure() {
    let dir = test_shared::create_tmp_dir();
    let file = test_shared::create_file_with_content(&dir, "file", "data");
    let controller = HashJobController::new(HashJobOptions::default());
    let receiver = controller.event_receiver();
    controller.start(&file).unwrap();
    let _ = wait_for_result(&receiver);
    controller.start(dir.join("missing")).unwrap();
    let (_, result) = wait_for_result(&receiver);
    assert!(matches!(result.outcome, HashOutcome::Failed(_)));
    let last_result = controller.last_result().unwrap();
    assert_eq!(last_result.file_path, file);
    let saved_path = controller.save_result_to(&dir).unwrap();
    assert!(saved_path.ends_with("HASHoffile.txt"));
    drop(controller);
    fs::remove_dir_all(dir).expect("Failed to remove test directory.");
}
