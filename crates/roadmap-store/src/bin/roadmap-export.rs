use std::process::ExitCode;

use clap::Parser;

use roadmap_store::export_job::{report_failure, run_export, ExportArgs};

#[tokio::main]
async fn main() -> ExitCode {
    let args = ExportArgs::parse();

    let log_dir = args.log_dir_or_default();
    if let Err(e) = rolling_logger::init_logger(&log_dir, "roadmap-export") {
        eprintln!("Logging disabled: {}", e);
    }

    match run_export(&args, chrono::Utc::now()).await {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            if let Err(log_err) = report_failure(&e) {
                eprintln!("Failed to record export failure in log: {}", log_err);
            }
            ExitCode::FAILURE
        }
    }
}
