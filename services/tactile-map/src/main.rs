//! tactile-map: render an image as a tactile map.

use clap::Parser;
use std::process::ExitCode;
use tactile_common::TactileError;
use tactile_map::Args;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if args.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    if args.legend {
        for line in tactile_renderer::legend() {
            println!("{}", line);
        }
        return ExitCode::SUCCESS;
    }

    if args.print_config {
        return match args.resolve_config().map(|c| serde_yaml::to_string(&c)) {
            Ok(Ok(yaml)) => {
                print!("{}", yaml);
                ExitCode::SUCCESS
            }
            Ok(Err(e)) => {
                error!(error = %e, "cannot serialize configuration");
                ExitCode::FAILURE
            }
            Err(e) => {
                error!(error = %e, "invalid configuration");
                ExitCode::from(e.exit_code() as u8)
            }
        };
    }

    match tactile_map::run(&args) {
        Ok(summary) => {
            info!(
                width = summary.width,
                height = summary.height,
                blocks = summary.blocks,
                shapes = summary.shapes,
                tactile = %summary.outputs.tactile.display(),
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %format!("{:#}", e), "tactile-map failed");
            let code = e
                .downcast_ref::<TactileError>()
                .map(|t| t.exit_code())
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}
