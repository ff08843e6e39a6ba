//! Cleansheet CLI - clean backlink sheets
//!
//! # Main Commands
//!
//! ```bash
//! cleansheet serve                        # Start HTTP server (port 3000)
//! cleansheet clean links.xlsx             # Write datos_limpios.csv
//! cleansheet clean links.csv -f xlsx      # Write datos_limpios.xlsx
//! cleansheet preview links.csv            # Print cleaned rows as JSON
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! cleansheet parse links.csv              # Print the parsed input table
//! ```

use clap::{Parser, Subcommand};
use cleansheet::server::{start_server, ServerConfig};
use cleansheet::{clean_file, parse_file, ExportFormat};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cleansheet")]
#[command(about = "Clean backlink sheets into Content URL / rating / traffic / contacts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean a .csv/.xlsx file and write the result
    Clean {
        /// Input file (.csv or .xlsx)
        input: PathBuf,

        /// Output file (default: datos_limpios.<format>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: csv or xlsx (default: from output extension, else csv)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Print the cleaned table as JSON
    Preview {
        /// Input file (.csv or .xlsx)
        input: PathBuf,

        /// Number of rows to show
        #[arg(long, default_value = "20")]
        rows: usize,
    },

    /// Parse a file and print the raw input table as JSON
    Parse {
        /// Input file (.csv or .xlsx)
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Address to bind
        #[arg(long, env = "CLEANSHEET_HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(short, long, env = "CLEANSHEET_PORT", default_value = "3000")]
        port: u16,

        /// Largest accepted upload, in megabytes
        #[arg(long, env = "CLEANSHEET_MAX_UPLOAD_MB", default_value = "25")]
        max_upload_mb: usize,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Clean { input, output, format } => {
            cmd_clean(&input, output.as_deref(), format.as_deref())
        }

        Commands::Preview { input, rows } => cmd_preview(&input, rows),

        Commands::Parse { input } => cmd_parse(&input),

        Commands::Serve { host, port, max_upload_mb } => {
            cmd_serve(ServerConfig {
                host,
                port,
                max_upload_bytes: upload_limit_bytes(max_upload_mb),
            })
            .await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Megabytes to bytes, capped at `usize::MAX` instead of wrapping.
fn upload_limit_bytes(max_upload_mb: usize) -> usize {
    max_upload_mb.saturating_mul(1024 * 1024)
}

/// Pick the export format: explicit flag, then output extension, then CSV.
fn resolve_format(
    format: Option<&str>,
    output: Option<&Path>,
) -> Result<ExportFormat, Box<dyn std::error::Error>> {
    if let Some(f) = format {
        return Ok(f.parse()?);
    }

    let from_ext = output
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .and_then(|e| e.parse::<ExportFormat>().ok());

    Ok(from_ext.unwrap_or(ExportFormat::Csv))
}

fn cmd_clean(
    input: &Path,
    output: Option<&Path>,
    format: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let format = resolve_format(format, output)?;
    let report = clean_file(input)?;

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }

    let download = report.export(format)?;
    let target = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(download.file_name()));

    fs::write(&target, &download.bytes)?;
    eprintln!("Wrote {} rows to {}", report.table.row_count(), target.display());

    Ok(())
}

fn cmd_preview(input: &Path, rows: usize) -> Result<(), Box<dyn std::error::Error>> {
    let report = clean_file(input)?;
    let records = report.table.to_records();

    let preview = json!({
        "columns": report.table.columns(),
        "totalRows": records.len(),
        "rows": records.iter().take(rows).collect::<Vec<_>>(),
        "warnings": report.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&preview)?);
    Ok(())
}

fn cmd_parse(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let result = parse_file(input)?;

    eprintln!("   Kind: {}", result.kind);
    if let Some(ref encoding) = result.encoding {
        eprintln!("   Encoding: {}", encoding);
    }
    if let Some(d) = result.delimiter {
        eprintln!("   Delimiter: '{}'", format_delimiter(d));
    }
    eprintln!("   Columns: {}", result.table.columns().join(", "));
    eprintln!("   Rows: {}", result.table.row_count());

    println!("{}", serde_json::to_string_pretty(&result.table.to_records())?);
    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

async fn cmd_serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    start_server(config).await?;
    Ok(())
}
