use clap::{Parser, Subcommand, ValueEnum};
use shipment_parser::config::{self, Config};
use shipment_parser::shipment::{self, Dictionary};
use shipment_parser::{extract, render};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    /// HTML readout as sent to chat clients
    Summary,
}

#[derive(Parser)]
#[command(name = "shipment-parser")]
#[command(version)]
#[command(about = "Turn freeform PDF shipment instructions into structured shipments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one or more shipment instruction PDFs
    Parse {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[arg(long, short = 'f', value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print the extracted text of a PDF
    Text { path: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = Config::load_or_default(config::config_path())?;

    // init tracing
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_filter))?;
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse { paths, format } => parse_documents(cfg, paths, format).await,
        Commands::Text { path } => {
            let text = extract::extract_text(&path, &cfg.extraction)?;
            print!("{text}");
            Ok(())
        }
    }
}

/// Parse every document on the blocking pool and print the results in
/// the order given.
async fn parse_documents(
    cfg: Config,
    paths: Vec<PathBuf>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Arc::new(cfg);
    let dictionary = Arc::new(Dictionary::standard());
    let mut set = JoinSet::new();

    for (idx, path) in paths.into_iter().enumerate() {
        let cfg = Arc::clone(&cfg);
        let dictionary = Arc::clone(&dictionary);
        set.spawn_blocking(move || {
            let result =
                shipment::parse_shipment(&path, &cfg.extraction, &dictionary, &cfg.parser);
            (idx, path, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = set.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(idx, _, _)| *idx);

    let mut failed = 0;
    for (_, path, result) in results {
        match result {
            Ok(parsed) => match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&parsed)?),
                OutputFormat::Summary => println!("{}", render::shipment_readout(&parsed)),
            },
            Err(e) => {
                error!(path = %path.display(), error = %e, "Extraction failed");
                failed += 1;
            }
        }
    }

    info!(failed, "Done");
    if failed > 0 {
        return Err(format!("{failed} document(s) could not be read").into());
    }
    Ok(())
}
