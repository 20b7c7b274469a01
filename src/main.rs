//! Vision Worker CLI
//!
//! Runs the queue-driven classification worker, or classifies a single local
//! image for smoke-testing a model.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use vision_worker::worker::{
    setup_signal_handler, MalformedPolicy, MessageProcessor, WorkerConfig, WorkerRunner,
};
use vision_worker::{
    classify_file, AppConfig, HttpObjectStore, HttpObjectStoreConfig, ObjectFetcher,
    OnnxClassifier, SqsQueueClient, SqsQueueConfig, DEFAULT_TOP_K,
};

#[derive(Parser)]
#[command(name = "vision-worker")]
#[command(about = "Classify images from an object store, driven by a message queue")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as worker, polling the queue for object-created events
    Worker {
        /// Poll interval in seconds when the queue is empty (default: 5)
        #[arg(short, long, default_value = "5")]
        poll_interval: u64,

        /// Visibility timeout in seconds for received messages (default: 120)
        #[arg(long, default_value = "120")]
        visibility_timeout: u64,

        /// Max messages per poll, up to the backend cap of 10 (default: 10)
        #[arg(short, long, default_value = "10")]
        batch_size: u32,

        /// Messages processed concurrently within a batch (default: 1)
        #[arg(short, long, default_value = "1")]
        concurrency: usize,

        /// Per-message processing timeout in seconds (default: 60)
        #[arg(short, long, default_value = "60")]
        timeout: u64,

        /// What to do with unparseable messages: drop or redeliver
        #[arg(long, default_value = "drop")]
        malformed: String,

        /// Delete failing messages after this many deliveries
        #[arg(long)]
        max_receives: Option<u32>,

        /// Process a single batch and exit (for testing)
        #[arg(long)]
        once: bool,
    },

    /// Classify a single local image (no queue, no store)
    Classify {
        /// Path to the image
        #[arg(short, long)]
        image: PathBuf,

        /// Path to the ONNX model
        #[arg(short, long, default_value = "models/resnet50.onnx")]
        model: PathBuf,

        /// Path to the class label file
        #[arg(short, long, default_value = "models/imagenet_classes.txt")]
        labels: PathBuf,

        /// Number of predictions to print (default: 3)
        #[arg(short, long, default_value = "3")]
        top: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Worker {
            poll_interval,
            visibility_timeout,
            batch_size,
            concurrency,
            timeout,
            malformed,
            max_receives,
            once,
        } => {
            // Load .env file if present
            dotenvy::dotenv().ok();

            info!("Initializing worker...");
            let app = AppConfig::from_env()?;

            let malformed_policy = match malformed.as_str() {
                "drop" => MalformedPolicy::Drop,
                "redeliver" => MalformedPolicy::Redeliver,
                other => anyhow::bail!(
                    "unknown malformed policy: {} (expected drop or redeliver)",
                    other
                ),
            };

            let config = WorkerConfig::builder()
                .poll_interval_secs(poll_interval)
                .visibility_timeout(Duration::from_secs(visibility_timeout))
                .message_timeout(Duration::from_secs(timeout))
                .batch_size(batch_size)
                .concurrency(concurrency)
                .malformed_policy(malformed_policy)
                .max_receive_count(max_receives)
                .build();

            // Model and clients are constructed once and shared for the life
            // of the process.
            let classifier = Arc::new(OnnxClassifier::load(
                &app.model_path,
                &app.labels_path,
                DEFAULT_TOP_K,
            )?);
            info!("Model ready");

            let store = Arc::new(HttpObjectStore::new(HttpObjectStoreConfig {
                endpoint: app.store_endpoint.clone(),
                ..Default::default()
            })?);
            let fetcher = ObjectFetcher::new(store, app.scratch_dir.clone())?;

            let queue = Arc::new(SqsQueueClient::new(SqsQueueConfig {
                endpoint: app.queue_endpoint.clone(),
                queue_url: app.queue_url.clone(),
                ..Default::default()
            })?);
            info!("Queue client ready: {}", app.queue_url);

            let processor = MessageProcessor::new(fetcher, classifier, app.bucket.clone());
            let runner = WorkerRunner::new(queue, config, processor);

            if once {
                // Single-batch mode
                match runner.run_once().await {
                    Ok(0) => println!("No messages available"),
                    Ok(count) => println!("Processed batch of {} messages", count),
                    Err(e) => {
                        eprintln!("Error processing batch: {}", e);
                        return Err(e.into());
                    }
                }
            } else {
                // Setup graceful shutdown
                let shutdown = runner.shutdown_handle();
                setup_signal_handler(shutdown);

                // Run continuous worker loop
                runner.run().await?;
            }
        }

        Commands::Classify {
            image,
            model,
            labels,
            top,
            json,
        } => {
            info!("Classifying: {}", image.display());

            let predictions = classify_file(&model, &labels, &image, top).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&predictions)?);
            } else {
                println!("Predictions for {}:", image.display());
                for prediction in &predictions {
                    println!("  {:<30} {:.4}", prediction.label, prediction.confidence);
                }
            }
        }
    }

    Ok(())
}
