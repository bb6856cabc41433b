use clap::Parser;
use cropwise_api::RestApi;
use cropwise_engine::{Engine, EngineConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Crop recommendation service
#[derive(Parser, Debug)]
#[command(name = "cropwise")]
#[command(about = "Ranks crops for a field observation", long_about = None)]
struct Args {
    /// Reference dataset (CSV)
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Trained model (JSON)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Feature columns and class labels (JSON)
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Engine config file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP API port
    #[arg(long, default_value_t = 5000)]
    http_port: u16,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Load artifacts before serving instead of on the first request
    #[arg(long)]
    eager: bool,
}

impl Args {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::from_file(path)?,
            None => EngineConfig::default(),
        };
        if let Some(dataset) = &self.dataset {
            config.artifacts.dataset = dataset.clone();
        }
        if let Some(model) = &self.model {
            config.artifacts.model = model.clone();
        }
        if let Some(metadata) = &self.metadata {
            config.artifacts.metadata = metadata.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Cropwise v{}", env!("CARGO_PKG_VERSION"));

    let config = args.engine_config()?;
    info!("Dataset: {:?}", config.artifacts.dataset);
    info!("Model: {:?}", config.artifacts.model);
    info!("Metadata: {:?}", config.artifacts.metadata);
    info!("HTTP API port: {}", args.http_port);

    let engine = Arc::new(Engine::new(config));
    if args.eager {
        engine.initialize()?;
        info!("Engine initialized");
    } else {
        info!("Artifacts will load on the first request");
    }

    let engine_http = engine.clone();
    let http_port = args.http_port;
    let http_handle = std::thread::spawn(move || {
        info!("Starting HTTP server on port {}", http_port);
        let sys = actix_web::rt::System::new();
        sys.block_on(async {
            if let Err(e) = RestApi::start(engine_http, http_port).await {
                error!("HTTP server error: {}", e);
            }
        })
    });

    info!("Cropwise started successfully");
    info!("HTTP API: http://localhost:{}/", args.http_port);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        _ = tokio::task::spawn_blocking(move || {
            http_handle.join().ok();
        }) => {
            warn!("HTTP server stopped");
        }
    }

    info!("Shutting down...");
    Ok(())
}
