use clap::{Parser, Subcommand};
use photo_intake::catalog::Catalogs;
use photo_intake::ingest::IngestPipeline;
use photo_intake::naming::file_extension;
use photo_intake::types::{IncomingFile, UploadRequest};
use photo_intake::validation::media_type_for_extension;
use photo_intake::{config, output, server, telemetry};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photo-intake")]
#[command(about = "Photographer registry and photo intake service")]
#[command(long_about = "\
Photographer registry and photo intake service

Uploaded photos are validated, cover-cropped to one fixed print geometry
(240x320 by default) and stored per photographer:

  public/
  ├── uploads/fotograflar/
  │   └── <photographer>/
  │       └── foto_<millis>-<random>.jpeg
  ├── temp/                        # Staged uploads, emptied after every request
  └── data/
      ├── photographers.json       # Photographer registry
      ├── photo-records.json       # Photo catalog (shared with the browser client)
      └── print-history.json       # Certificate prints

Run 'photo-intake gen-config' to generate a documented photo-intake.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Log as JSON lines instead of human-readable text
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Override `server.bind`
        #[arg(long)]
        bind: Option<String>,
    },
    /// Normalize and catalog local image files for one photographer
    Ingest {
        /// Photographer name (also the output directory name)
        #[arg(long)]
        owner: String,
        /// Photographer id stored on each record
        #[arg(long)]
        owner_id: Option<String>,
        /// Image files, in catalog order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print a stock photo-intake.toml with all options documented
    GenConfig,
    /// Load and validate the config, then print a summary
    CheckConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    telemetry::init_tracing(cli.json_logs);
    let mut service_config = config::load_config(&cli.config)?;

    match cli.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                service_config.server.bind = bind;
                service_config.validate()?;
            }
            init_thread_pool(&service_config.processing);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(service_config))?;
        }
        Command::Ingest {
            owner,
            owner_id,
            files,
        } => {
            init_thread_pool(&service_config.processing);
            let catalogs = Catalogs::open(&service_config.storage.data_dir);
            catalogs.ensure_all()?;
            let pipeline = IngestPipeline::from_config(&service_config, &catalogs);

            let files = files
                .iter()
                .map(|path| read_incoming(path))
                .collect::<Result<Vec<_>, _>>()?;
            let outcome = pipeline.ingest(UploadRequest {
                owner_name: owner,
                owner_id,
                files,
            })?;
            output::print_ingest_outcome(&outcome);
        }
        Command::CheckConfig => {
            output::print_config_check(&service_config, &cli.config);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Read a local file as if it had been uploaded, deriving the declared media
/// type from its extension.
fn read_incoming(path: &Path) -> std::io::Result<IncomingFile> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let media_type = file_extension(&name)
        .map(|ext| media_type_for_extension(&ext))
        .unwrap_or("application/octet-stream");
    Ok(IncomingFile::new(name, media_type, bytes))
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
