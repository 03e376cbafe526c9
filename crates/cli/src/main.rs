//! s3conn - S3-compatible object store check
//!
//! Authenticates against an S3-compatible endpoint and runs one fixed
//! sequence of bucket and object operations.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use s3conn::cli::{execute, report_setup_error, Cli};
use s3conn::output::Formatter;
use s3conn_core::credentials::load_dotenv;

#[tokio::main]
async fn main() {
    // .env may provide S3_BUCKET, so it is loaded before arguments are parsed
    let dotenv = load_dotenv();
    let cli = Cli::parse();

    // --debug overrides RUST_LOG for the workspace crates
    let filter = if cli.debug {
        EnvFilter::new("s3conn=debug,s3conn_core=debug,s3conn_s3=debug")
    } else {
        EnvFilter::from_default_env()
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = match dotenv {
        Ok(path) => {
            if let Some(path) = path {
                tracing::debug!(path = %path.display(), "loaded .env file");
            }
            execute(cli).await
        }
        Err(e) => report_setup_error(&Formatter::new(cli.output_config()), &e),
    };

    std::process::exit(exit_code.as_i32());
}
