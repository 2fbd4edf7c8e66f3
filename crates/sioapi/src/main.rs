//! sioapi command line.
//!
//! Checks rendered AsyncAPI documents for referential integrity, converts
//! them between YAML and JSON, and scaffolds new documents.

use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use sioapi::{AsyncApiSocket, SocketConfig};
use sioapi_spec::{parse_document_file, DocFormat, SpecError, SpecificationDocument};
use sioapi_telemetry::{init_logging, LogFormat, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "sioapi", about = "AsyncAPI tooling for Socket.IO event servers", version)]
struct Cli {
    /// Log level (RUST_LOG takes precedence).
    #[arg(long, global = true, default_value = "warn", env = "SIOAPI_LOG_LEVEL")]
    log_level: String,

    /// Log format (json or pretty).
    #[arg(long, global = true, default_value = "json", env = "SIOAPI_LOG_FORMAT")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse AsyncAPI document(s) and verify their references.
    ///
    /// Reports parse errors (E2006), unsupported documents (E2007),
    /// dangling or out-of-components references (E2003, E2004) and messages
    /// not referenced exactly once from the channel (E2005).
    Check {
        /// Input document file(s) (YAML or JSON).
        #[arg(short, long, required = true, num_args = 1..)]
        spec: Vec<String>,

        /// Output format (text or json).
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Re-render a document as YAML or JSON.
    Convert {
        /// Input document file (YAML or JSON).
        #[arg(short, long)]
        spec: String,

        /// Target format (yaml or json); guessed from the output file name when omitted.
        #[arg(long)]
        to: Option<String>,

        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Write an empty document for a new server.
    Init {
        /// API title.
        #[arg(long, default_value = "Demo Chat API")]
        title: String,

        /// API version.
        #[arg(long, default_value = "1.0.0")]
        api_version: String,

        /// API description.
        #[arg(long, default_value = "Demo Chat API")]
        description: String,

        /// Server URL.
        #[arg(long, default_value = "http://localhost:5000")]
        server_url: String,

        /// Server name.
        #[arg(long, default_value = "BACKEND")]
        server_name: String,

        /// Server protocol.
        #[arg(long, default_value = "socketio")]
        protocol: String,

        /// Output format (yaml or json); guessed from the output file name when omitted.
        #[arg(long)]
        to: Option<String>,

        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Check result for a single document.
#[derive(Debug, Serialize)]
struct CheckResult {
    file: String,
    valid: bool,
    errors: Vec<CheckIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<DocSummary>,
}

#[derive(Debug, Serialize)]
struct CheckIssue {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
struct DocSummary {
    title: String,
    publish: usize,
    subscribe: usize,
    schemas: usize,
}

impl CheckIssue {
    fn from_error(err: &SpecError) -> Self {
        let code = match err {
            SpecError::DuplicateMessageName(_) => "E2001",
            SpecError::SchemaConflict(_) => "E2002",
            SpecError::UnresolvedRef(_) => "E2003",
            SpecError::RefOutsideComponents(_) => "E2004",
            SpecError::MessageReferenceCount { .. } => "E2005",
            SpecError::ParseError(_) => "E2006",
            SpecError::Unsupported(_) => "E2007",
            SpecError::Render(_) | SpecError::Io(_) => "E2000",
        };
        Self {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

fn check_file(spec_path: &str) -> CheckResult {
    let path = Path::new(spec_path);
    if !path.exists() {
        return CheckResult {
            file: spec_path.to_string(),
            valid: false,
            errors: vec![CheckIssue {
                code: "E2000".to_string(),
                message: format!("file not found: {}", spec_path),
            }],
            summary: None,
        };
    }

    let outcome = parse_document_file(path).and_then(|doc| doc.verify().map(|_| doc));
    match outcome {
        Ok(doc) => CheckResult {
            file: spec_path.to_string(),
            valid: true,
            errors: Vec::new(),
            summary: Some(DocSummary {
                title: doc.info.title.clone(),
                publish: doc.publish_messages().len(),
                subscribe: doc.subscribe_messages().len(),
                schemas: doc.components.schemas.len(),
            }),
        },
        Err(e) => CheckResult {
            file: spec_path.to_string(),
            valid: false,
            errors: vec![CheckIssue::from_error(&e)],
            summary: None,
        },
    }
}

/// Run the check command.
fn run_check(specs: &[String], output_format: &str) -> ExitCode {
    let results: Vec<CheckResult> = specs.iter().map(|s| check_file(s)).collect();
    let has_errors = results.iter().any(|r| !r.valid);

    if output_format == "json" {
        let output = serde_json::json!({
            "results": results,
            "summary": {
                "total": results.len(),
                "valid": results.iter().filter(|r| r.valid).count(),
                "invalid": results.iter().filter(|r| !r.valid).count(),
            }
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("error: failed to render results: {}", e);
                return ExitCode::from(1);
            }
        }
    } else {
        for result in &results {
            match &result.summary {
                Some(summary) if result.valid => eprintln!(
                    "✓ {} is valid ({}: {} publish, {} subscribe, {} schema(s))",
                    result.file,
                    summary.title,
                    summary.publish,
                    summary.subscribe,
                    summary.schemas
                ),
                _ if result.valid => eprintln!("✓ {} is valid", result.file),
                _ => eprintln!("✗ {} has {} error(s)", result.file, result.errors.len()),
            }

            for err in &result.errors {
                eprintln!("  {}: {}", err.code, err.message);
            }
        }

        let valid_count = results.iter().filter(|r| r.valid).count();
        let total = results.len();
        eprintln!();
        eprintln!(
            "checked {} document(s): {} valid, {} invalid",
            total,
            valid_count,
            total - valid_count
        );
    }

    if has_errors {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

/// Write rendered text to a file, or stdout when no path is given.
fn write_output(text: &str, output: Option<&str>) -> ExitCode {
    match output {
        Some(path) => match std::fs::write(path, text) {
            Ok(()) => {
                eprintln!("wrote {}", path);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("error: failed to write {}: {}", path, e);
                ExitCode::from(1)
            }
        },
        None => {
            print!("{}", text);
            if !text.ends_with('\n') {
                println!();
            }
            ExitCode::SUCCESS
        }
    }
}

/// Pick the output format: `--to` when given, else the output file's extension, else YAML.
fn output_format(to: Option<&str>, output: Option<&str>) -> Result<DocFormat, SpecError> {
    match to {
        Some(to) => to.parse(),
        None => Ok(output.map(|p| DocFormat::from_path(Path::new(p))).unwrap_or_default()),
    }
}

fn render(doc: &SpecificationDocument, to: Option<&str>, output: Option<&str>) -> ExitCode {
    let format = match output_format(to, output) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    match doc.render(format) {
        Ok(text) => write_output(&text, output),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Run the convert command.
fn run_convert(spec: &str, to: Option<&str>, output: Option<&str>) -> ExitCode {
    let path = Path::new(spec);
    if !path.exists() {
        eprintln!("error: document not found: {}", spec);
        return ExitCode::from(1);
    }

    match parse_document_file(path) {
        Ok(doc) => render(&doc, to, output),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Run the init command.
fn run_init(config: SocketConfig, to: Option<&str>, output: Option<&str>) -> ExitCode {
    let socket = AsyncApiSocket::new(config);
    render(socket.asyncapi_doc(), to, output)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_format = match LogFormat::parse(&cli.log_format) {
        Some(f) => f,
        None => {
            eprintln!("error: invalid log format: {}", cli.log_format);
            return ExitCode::from(2);
        }
    };
    let telemetry = TelemetryConfig::new()
        .with_log_level(cli.log_level)
        .with_log_format(log_format);
    if let Err(e) = init_logging(&telemetry) {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    match cli.command {
        Commands::Check { spec, format } => run_check(&spec, &format),
        Commands::Convert { spec, to, output } => {
            run_convert(&spec, to.as_deref(), output.as_deref())
        }
        Commands::Init {
            title,
            api_version,
            description,
            server_url,
            server_name,
            protocol,
            to,
            output,
        } => {
            let config = SocketConfig::new()
                .with_title(title)
                .with_version(api_version)
                .with_description(description)
                .with_server(server_url, server_name)
                .with_protocol(protocol);
            run_init(config, to.as_deref(), output.as_deref())
        }
    }
}
