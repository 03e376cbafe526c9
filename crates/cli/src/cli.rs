//! Command line definition and execution
//!
//! s3conn takes no subcommands: one invocation runs one session.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use s3conn_core::{
    session, BucketLookup, Checks, Credentials, Error, ObjectRef, SessionPlan, Step, StepOutcome,
};
use s3conn_s3::S3Client;

use crate::exit_code::ExitCode;
use crate::output::report::render_checks;
use crate::output::{Formatter, OutputConfig};
use crate::reporter::Reporter;

/// Key written when `--key` is not given
pub const DEFAULT_KEY: &str = "s3conn-probe.txt";

/// s3conn - check an S3-compatible object store
///
/// Reads S3_URL, AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY from the
/// environment (or a .env file), then lists buckets, lists the bucket,
/// uploads one object, lists again and reads the object back.
#[derive(Parser, Debug)]
#[command(name = "s3conn")]
#[command(author, version, about, long_about)]
pub struct Cli {
    /// Bucket to write the probe object into
    #[arg(env = "S3_BUCKET")]
    pub bucket: String,

    /// Key of the probe object
    #[arg(short, long, default_value = DEFAULT_KEY)]
    pub key: String,

    /// Object body as text (default: empty)
    #[arg(long, conflicts_with = "file")]
    pub body: Option<String>,

    /// Read the object body from a file
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Content type of the upload (default: guessed from the key)
    #[arg(long)]
    pub content_type: Option<String>,

    /// Delete the object after reading it back
    #[arg(long)]
    pub delete: bool,

    /// Bucket addressing style
    #[arg(long, value_enum, default_value_t = LookupArg::Auto)]
    pub bucket_lookup: LookupArg,

    /// Signing region (overrides S3_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Exit non-zero when a consistency check fails
    #[arg(long)]
    pub strict: bool,

    /// Output format: human-readable or JSON
    #[arg(long, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, default_value = "false")]
    pub no_color: bool,

    /// Disable spinners
    #[arg(long, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub debug: bool,
}

/// Bucket addressing style as given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupArg {
    Auto,
    Path,
    Dns,
}

impl From<LookupArg> for BucketLookup {
    fn from(arg: LookupArg) -> Self {
        match arg {
            LookupArg::Auto => BucketLookup::Auto,
            LookupArg::Path => BucketLookup::Path,
            LookupArg::Dns => BucketLookup::Dns,
        }
    }
}

impl Cli {
    pub fn output_config(&self) -> OutputConfig {
        OutputConfig {
            json: self.json,
            no_color: self.no_color,
            no_progress: self.no_progress,
            quiet: self.quiet,
        }
    }

    /// Build the session plan from the arguments
    pub fn plan(&self) -> Result<SessionPlan, Error> {
        let object = ObjectRef::new(&self.bucket, &self.key)?;

        let body = match (&self.file, &self.body) {
            (Some(path), _) => std::fs::read(path).map_err(|e| {
                Error::Config(format!("Failed to read {}: {e}", path.display()))
            })?,
            (None, Some(text)) => text.clone().into_bytes(),
            (None, None) => Vec::new(),
        };

        let content_type = self.content_type.clone().or_else(|| {
            mime_guess::from_path(&self.key)
                .first_raw()
                .map(str::to_string)
        });

        Ok(SessionPlan {
            object,
            body,
            content_type,
            delete_after: self.delete,
        })
    }
}

/// JSON document printed in `--json` mode
#[derive(Debug, Serialize)]
struct SessionOutput<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<&'a str>,
    steps: &'a [StepOutcome],
    #[serde(skip_serializing_if = "Option::is_none")]
    checks: Option<Checks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorOutput>,
}

#[derive(Debug, Serialize)]
struct ErrorOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<Step>,
    message: String,
    exit_code: i32,
}

/// Report a failure that happened before any request was sent
pub fn report_setup_error(formatter: &Formatter, error: &Error) -> ExitCode {
    let code = ExitCode::from_error(error);
    if formatter.is_json() {
        formatter.json(&SessionOutput {
            endpoint: None,
            steps: &[],
            checks: None,
            error: Some(ErrorOutput {
                step: None,
                message: error.to_string(),
                exit_code: code.as_i32(),
            }),
        });
    }
    formatter.error(&error.to_string());
    code
}

/// Execute the session and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let formatter = Formatter::new(cli.output_config());

    let plan = match cli.plan() {
        Ok(p) => p,
        Err(e) => return report_setup_error(&formatter, &e),
    };

    let mut credentials = match Credentials::from_env() {
        Ok(c) => c.with_bucket_lookup(cli.bucket_lookup.into()),
        Err(e) => return report_setup_error(&formatter, &e),
    };
    if let Some(region) = &cli.region {
        credentials = credentials.with_region(region);
    }
    tracing::debug!(?credentials, object = %plan.object, "starting session");

    let client = match S3Client::new(&credentials).await {
        Ok(c) => c,
        Err(e) => return report_setup_error(&formatter, &e),
    };

    let mut reporter = Reporter::new(formatter.clone());
    let endpoint = Some(credentials.endpoint.as_str());

    match session::run(&client, &plan, &mut reporter).await {
        Ok(report) => {
            if formatter.is_json() {
                formatter.json(&SessionOutput {
                    endpoint,
                    steps: &report.steps,
                    checks: Some(report.checks),
                    error: None,
                });
            } else {
                formatter.println("");
                formatter.println(&render_checks(&report.checks, formatter.colors_enabled()));
            }

            if report.checks.passed() {
                formatter.success("Session completed");
                ExitCode::Success
            } else if cli.strict {
                formatter.error("Consistency check failed");
                ExitCode::CheckFailed
            } else {
                formatter.warning("Session completed with failed consistency checks");
                ExitCode::Success
            }
        }
        Err(failure) => {
            let code = ExitCode::from_error(&failure.source);
            if formatter.is_json() {
                formatter.json(&SessionOutput {
                    endpoint,
                    steps: reporter.completed(),
                    checks: None,
                    error: Some(ErrorOutput {
                        step: Some(failure.step),
                        message: failure.source.to_string(),
                        exit_code: code.as_i32(),
                    }),
                });
            }
            formatter.error(&failure.to_string());
            code
        }
    }
}
