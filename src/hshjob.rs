use clap::{command, value_parser, Arg};
use std::io::{Error, ErrorKind};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use hshjob::hash_file::OutputBase;
use hshjob::{
    get_hash_type_from_str, get_hash_types, ui, HashJobController, HashJobOptions, HashOutcome,
};

fn run() -> Result<(), Box<dyn (::std::error::Error)>> {
    let matches = command!()
        .arg(Arg::new("file").required(true).help("File to hash"))
        .arg(
            Arg::new("type")
                .short('t')
                .long("type")
                .value_parser(get_hash_types())
                .default_value("SHA-256")
                .help("Hash type"),
        )
        .arg(
            Arg::new("save")
                .short('w')
                .long("save")
                .action(clap::ArgAction::SetTrue)
                .help("Save the result to a HASHOutput folder"),
        )
        .arg(
            Arg::new("base")
                .short('b')
                .long("base")
                .value_name("cwd|documents|path")
                .default_value("cwd")
                .help("Directory that holds the HASHOutput folder"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("seconds")
                .value_parser(value_parser!(u64))
                .help("Cancel the hash job after this many seconds"),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .action(clap::ArgAction::SetTrue)
                .help("Don't output to stdout"),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let file_path = PathBuf::from(matches.get_one::<String>("file").unwrap());
    let hash_type = get_hash_type_from_str(matches.get_one::<String>("type").unwrap())?;
    let output_base: OutputBase = matches.get_one::<String>("base").unwrap().parse()?;
    let silent = matches.get_flag("silent");

    let controller = HashJobController::new(HashJobOptions {
        hash_type: Some(hash_type),
        timeout: matches
            .get_one::<u64>("timeout")
            .map(|seconds| Duration::from_secs(*seconds)),
        output_base: Some(output_base),
        ..Default::default()
    });
    let ui = ui::UI::new(controller, silent);

    let canceller = ui.canceller();
    ctrlc::set_handler(move || {
        canceller.cancel();
    })
    .expect("Failed to set Ctrl-C handler.");

    let result = ui.run(&file_path)?;
    match result.outcome {
        HashOutcome::Success(_) => {
            if matches.get_flag("save") {
                let saved_path = ui.save()?;
                if !silent {
                    println!("Saved to {}", saved_path.display());
                }
            }

            Ok(())
        }
        HashOutcome::Cancelled => Err(Box::new(Error::new(
            ErrorKind::Interrupted,
            "The hash job was cancelled.",
        ))),
        HashOutcome::Failed(error) => Err(Box::new(error)),
    }
}

fn main() {
    if let Err(error) = run() {
        if let Some(clap_error) = error.downcast_ref::<clap::Error>() {
            eprint!("{}", clap_error); // `clap` errors already have newlines

            match clap_error.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    // The exit code should not indicate an error for --help / --version
                    std::process::exit(0)
                }
                _ => (),
            }
        } else {
            eprintln!("{}", error);
        }

        std::process::exit(1);
    }
}
