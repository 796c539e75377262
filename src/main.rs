use std::{path::PathBuf, process::ExitCode};

use files_service::{
    application::{
        services::{StorageBackendWrapper, TransferService},
        validation::FileValidator,
    },
    domain::{
        config::AppConfig,
        models::file::{DeleteRequest, FileSource},
    },
    services,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: files-service upload <destination> <file>... | delete <key>...";

enum Command {
    Upload {
        destination: String,
        files: Vec<PathBuf>,
    },
    Delete {
        keys: Vec<String>,
    },
}

fn parse_args(args: &[String]) -> Option<Command> {
    match args {
        [cmd, destination, files @ ..] if cmd == "upload" && !files.is_empty() => {
            Some(Command::Upload {
                destination: destination.clone(),
                files: files.iter().map(PathBuf::from).collect(),
            })
        }
        [cmd, keys @ ..] if cmd == "delete" && !keys.is_empty() => Some(Command::Delete {
            keys: keys.to_vec(),
        }),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = parse_args(&args) else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    match run(command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    let backend = services::create_storage_backend(&config.local, &config.secrets)?;
    info!("Starting files-service with {} storage", config.local.provider);

    let transfers = TransferService::new(StorageBackendWrapper::new(backend), &config.global);

    match command {
        Command::Upload { destination, files } => {
            let validator = FileValidator::new(&config.global);
            let mut requests = Vec::with_capacity(files.len());

            for path in files {
                let size = tokio::fs::metadata(&path).await?.len();
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                requests.push(validator.prepare_upload(
                    &destination,
                    &name,
                    size,
                    FileSource::Path(path),
                )?);
            }

            let results = transfers.upload_files(requests).await?;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Delete { keys } => {
            let count = keys.len();
            let requests = keys.into_iter().map(DeleteRequest::new).collect();
            transfers.delete_files(requests).await?;
            info!("Deleted {} files", count);
        }
    }

    Ok(())
}
