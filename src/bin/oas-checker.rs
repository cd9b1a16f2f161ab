//! OAS Checker CLI
//!
//! Standalone checker: lint a specification document, or replay a recorded
//! request/response pair against it.

use std::path::PathBuf;
use std::process::ExitCode;

use bytes::Bytes;
use clap::{Parser, Subcommand};
use oas_checker::{Analyzer, CheckError, Request, Response, Specs};

#[derive(Parser)]
#[command(name = "oas-checker")]
#[command(about = "Validate HTTP traffic against an OpenAPI contract")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a specification document for structural errors
    Lint {
        /// Specification file (Swagger 2.0 JSON)
        specs: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Check one request (and optionally its response) against the specs
    Check {
        /// Specification file (Swagger 2.0 JSON)
        specs: PathBuf,

        /// HTTP method of the request
        #[arg(long, short, default_value = "GET")]
        method: String,

        /// Request path, with query string (e.g. "/pet/42?verbose=true")
        #[arg(long, short)]
        url: String,

        /// Request header, "name: value"; repeatable
        #[arg(long = "header", short = 'H')]
        headers: Vec<String>,

        /// File containing the request body
        #[arg(long)]
        body: Option<PathBuf>,

        /// Response status code; enables response validation
        #[arg(long)]
        status: Option<u16>,

        /// File containing the response body
        #[arg(long, requires = "status")]
        response_body: Option<PathBuf>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Lint { specs, json } => run_lint(&specs, json),

        Commands::Check {
            specs,
            method,
            url,
            headers,
            body,
            status,
            response_body,
            json,
        } => run_check(CheckArgs {
            specs,
            method,
            url,
            headers,
            body,
            status,
            response_body,
            json_output: json,
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_lint(path: &std::path::Path, json_output: bool) -> Result<(), u8> {
    let specs = Specs::from_file(path).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    match specs.validate() {
        Ok(()) => {
            let info = &specs.document().info;
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid: {} {}", info.title, info.version);
            }
            Ok(())
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

struct CheckArgs {
    specs: PathBuf,
    method: String,
    url: String,
    headers: Vec<String>,
    body: Option<PathBuf>,
    status: Option<u16>,
    response_body: Option<PathBuf>,
    json_output: bool,
}

fn run_check(args: CheckArgs) -> Result<(), u8> {
    let CheckArgs {
        specs: specs_path,
        method,
        url,
        headers,
        body,
        status,
        response_body,
        json_output,
    } = args;

    let specs = Specs::from_file(&specs_path).map_err(|e| {
        report_error(json_output, &e.to_string());
        e.exit_code() as u8
    })?;

    let request = build_request(&method, &url, &headers, body.as_deref())
        .map_err(|reason| {
            report_error(json_output, &reason);
            2u8
        })?;

    let response = match status {
        Some(status) => Some(
            build_response(status, response_body.as_deref()).map_err(|reason| {
                report_error(json_output, &reason);
                2u8
            })?,
        ),
        None => None,
    };

    let analyzer = Analyzer::new(std::sync::Arc::new(specs));

    match analyzer.analyze(&request, response.as_ref()) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(CheckError::Invalid { violations }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": violations
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for violation in violations {
                    eprintln!("  {}", violation);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn build_request(
    method: &str,
    url: &str,
    headers: &[String],
    body: Option<&std::path::Path>,
) -> Result<Request, String> {
    let mut builder = http::Request::builder()
        .method(
            http::Method::from_bytes(method.as_bytes())
                .map_err(|_| format!("invalid method {:?}", method))?,
        )
        .uri(url);

    for header in headers {
        let (name, value) = header
            .split_once(':')
            .ok_or_else(|| format!("invalid header {:?}, expected \"name: value\"", header))?;
        builder = builder.header(name.trim(), value.trim());
    }

    let bytes = match body {
        Some(path) => Bytes::from(
            std::fs::read(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?,
        ),
        None => Bytes::new(),
    };

    builder
        .body(bytes)
        .map(Request::from)
        .map_err(|e| format!("invalid request: {}", e))
}

fn build_response(status: u16, body: Option<&std::path::Path>) -> Result<Response, String> {
    let bytes = match body {
        Some(path) => Bytes::from(
            std::fs::read(path).map_err(|e| format!("cannot read {}: {}", path.display(), e))?,
        ),
        None => Bytes::new(),
    };

    http::Response::builder()
        .status(status)
        .body(bytes)
        .map(Response::from)
        .map_err(|e| format!("invalid response: {}", e))
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        let output = serde_json::json!({ "valid": false, "error": msg });
        println!("{}", output);
    } else {
        eprintln!("Error: {}", msg);
    }
}
