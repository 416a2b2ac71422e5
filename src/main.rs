//! # labelpress CLI
//!
//! Command-line interface for label export.
//!
//! ## Usage
//!
//! ```bash
//! # List label stock
//! labelpress labels
//!
//! # Export a design document to PDF at 300 DPI
//! labelpress export design.json --format pdf --dpi 300
//!
//! # One PNG per row of data
//! labelpress batch template.json rows.json --format png --out-dir out/
//!
//! # Run the HTTP server
//! labelpress serve --listen 0.0.0.0:8080 --token s3cret
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

use labelpress::{
    Bindings, Document, LabelError,
    assets::{AssetContext, DEFAULT_USER_AGENT, HttpImageSource},
    batch::{BatchDriver, RowOutcome},
    export::{ExportEngine, ExportFormat, ExportOptions},
    label::LabelCatalog,
    server::{self, ServerConfig},
    units::Dpi,
};

/// labelpress - Label rendering and print-exact export
#[derive(Parser, Debug)]
#[command(name = "labelpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the built-in label stock
    Labels,

    /// Export a design document (JSON) to a file
    Export {
        /// Design document JSON file
        input: PathBuf,

        /// Output format: pdf, png or jpeg
        #[arg(long, default_value = "pdf")]
        format: String,

        /// Output resolution: 203 or 300
        #[arg(long, default_value = "203")]
        dpi: u32,

        /// Output file (defaults to the document name plus extension)
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Fail instead of exporting with image placeholders
        #[arg(long)]
        strict: bool,

        /// Image fetch timeout in seconds
        #[arg(long, default_value = "15")]
        fetch_timeout: u64,
    },

    /// Export one artifact per data row
    Batch {
        /// Template design document JSON file
        template: PathBuf,

        /// JSON array of row objects
        rows: PathBuf,

        /// Output format: pdf, png or jpeg
        #[arg(long, default_value = "pdf")]
        format: String,

        /// Output resolution: 203 or 300
        #[arg(long, default_value = "203")]
        dpi: u32,

        /// Directory for the artifacts
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Image fetch timeout in seconds
        #[arg(long, default_value = "15")]
        fetch_timeout: u64,
    },

    /// Start the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        /// Accepted bearer token (repeatable). Without any, requests are anonymous.
        #[arg(long = "token", value_name = "TOKEN")]
        tokens: Vec<String>,

        /// Image fetch timeout in seconds
        #[arg(long, default_value = "15")]
        fetch_timeout: u64,

        /// Maximum rows accepted in one batch request
        #[arg(long, default_value = "1000")]
        max_batch_rows: usize,

        /// User agent for image fetches
        #[arg(long, default_value = DEFAULT_USER_AGENT)]
        user_agent: String,

        /// Seconds a persisted batch artifact stays downloadable
        #[arg(long, default_value = "3600")]
        artifact_ttl: u64,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), LabelError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Labels => {
            for label in LabelCatalog::built_in().all() {
                let p203 = label.pixels(Dpi::Dpi203);
                let p300 = label.pixels(Dpi::Dpi300);
                println!(
                    "{:<8} {:>6.1} x {:<6.1} mm  {:>4}x{:<4} @203  {:>4}x{:<4} @300  {}",
                    label.id,
                    label.width_mm,
                    label.height_mm,
                    p203.width,
                    p203.height,
                    p300.width,
                    p300.height,
                    label.name
                );
            }
        }

        Commands::Export {
            input,
            format,
            dpi,
            output,
            strict,
            fetch_timeout,
        } => {
            let document: Document = read_json(&input)?;
            let mut options = ExportOptions::new(Dpi::try_from(dpi)?, format.parse::<ExportFormat>()?);
            if strict {
                options = options.strict();
            }

            let engine = engine(fetch_timeout)?;
            let artifact = engine.export_with(&document, options).await?;
            for d in &artifact.degradations {
                eprintln!("warning: element {} drawn as placeholder: {}", d.element_index, d.detail);
            }

            let path = output.unwrap_or_else(|| PathBuf::from(&artifact.filename));
            std::fs::write(&path, &artifact.bytes)?;
            println!(
                "Saved {} ({}x{} px, {:.1}x{:.1} mm) to {}",
                artifact.format,
                artifact.width_px,
                artifact.height_px,
                artifact.width_mm,
                artifact.height_mm,
                path.display()
            );
        }

        Commands::Batch {
            template,
            rows,
            format,
            dpi,
            out_dir,
            fetch_timeout,
        } => {
            let template: Document = read_json(&template)?;
            let rows: Vec<Bindings> = read_json(&rows)?;
            let options = ExportOptions::new(Dpi::try_from(dpi)?, format.parse::<ExportFormat>()?);

            std::fs::create_dir_all(&out_dir)?;
            let driver = BatchDriver::new(engine(fetch_timeout)?);
            let result = driver.run_batch(&template, &rows, options).await;

            for (index, outcome) in result.rows.iter().enumerate() {
                let row = index + 1;
                match outcome {
                    RowOutcome::Success(artifact) => {
                        let path = out_dir.join(format!(
                            "{:04}-{}",
                            row, artifact.filename
                        ));
                        std::fs::write(&path, &artifact.bytes)?;
                        println!("row {}: {}", row, path.display());
                    }
                    RowOutcome::Failed(e) => println!("row {}: FAILED ({})", row, e),
                }
            }
            println!(
                "Batch {} {:?}: {} succeeded, {} failed",
                result.job_id,
                result.status,
                result.succeeded(),
                result.failed()
            );
        }

        Commands::Serve {
            listen,
            tokens,
            fetch_timeout,
            max_batch_rows,
            user_agent,
            artifact_ttl,
        } => {
            let config = ServerConfig {
                listen_addr: listen,
                tokens,
                user_agent,
                fetch_timeout_secs: Some(fetch_timeout),
                max_batch_rows,
                artifact_ttl_secs: artifact_ttl,
            };
            server::serve(config).await?;
        }
    }

    Ok(())
}

/// Local exports may reference images on disk with `file://` URLs.
fn engine(fetch_timeout: u64) -> Result<ExportEngine, LabelError> {
    let source = HttpImageSource::new(DEFAULT_USER_AGENT, Some(Duration::from_secs(fetch_timeout)))
        .map_err(|e| LabelError::Server(format!("Failed to build image client: {}", e)))?
        .with_local_files();
    Ok(ExportEngine::new(AssetContext::standard(source)))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LabelError> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| LabelError::InvalidDesign(format!("{}: {}", path.display(), e)))
}
