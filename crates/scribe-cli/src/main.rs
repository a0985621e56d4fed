use clap::{Parser, Subcommand};

use anyhow::Context;
use scribe_core::{PipelineMetrics, QueueBackend, ScribeConfig};
use scribe_queue::create_queues;
use scribe_search::create_search_index;
use scribe_server::{ApiServer, AppState};
use scribe_store::create_store;
use scribe_worker::{WorkerContext, WorkerPool};

use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "scribe", version, about = "Scribe audit-log pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP ingress. With the memory queue the consumer workers run
    /// in-process, since no other process can see that queue.
    Serve {
        /// Path to the configuration file
        #[arg(long, default_value = "scribe.yaml")]
        config: PathBuf,

        /// Override the configured listen address, e.g. 127.0.0.1:9090
        #[arg(long)]
        listen: Option<String>,
    },

    /// Run a standalone consumer worker pool against a shared queue backend.
    Worker {
        /// Path to the configuration file
        #[arg(long, default_value = "scribe.yaml")]
        config: PathBuf,
    },

    /// Validate a configuration file and print the effective settings.
    Check {
        /// Path to the configuration file
        #[arg(long, default_value = "scribe.yaml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Serve { config, listen } => run_serve(&config, listen).await?,
        Command::Worker { config } => run_worker(&config).await?,
        Command::Check { config } => run_check(&config)?,
    }

    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<ScribeConfig> {
    let config = ScribeConfig::from_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;
    Ok(())
}

// -----------------------------
// serve
// -----------------------------

async fn run_serve(config_path: &Path, listen: Option<String>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(listen) = listen {
        config.server.listen = listen;
    }

    let metrics = Arc::new(PipelineMetrics::new());
    let queues = create_queues(&config.queue).await?;
    let store = create_store(&config.store).await?;
    let search = create_search_index(&config.search)?;

    let state = AppState::new(
        queues.clone(),
        store.clone(),
        search.clone(),
        metrics.clone(),
        &config.ingest,
    );

    // A memory queue is invisible outside this process, so its consumers
    // must live here. Shared backends get dedicated `scribe worker`
    // processes instead.
    let pool = match config.queue.backend {
        QueueBackend::Memory => Some(WorkerPool::start(WorkerContext {
            queues,
            store,
            search,
            metrics,
            config: config.worker.clone(),
        })),
        QueueBackend::Postgres => None,
    };

    let server = ApiServer::new(config.server.clone(), state);

    tokio::select! {
        result = server.run() => result?,
        result = shutdown_signal() => {
            result?;
            tracing::info!("received shutdown signal");
        }
    }

    if let Some(pool) = pool {
        pool.shutdown().await;
    }

    Ok(())
}

// -----------------------------
// worker
// -----------------------------

async fn run_worker(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if config.queue.backend == QueueBackend::Memory {
        return Err(anyhow::anyhow!(
            "queue.backend is 'memory', which only exists inside the serving process. \
             Standalone workers need queue.backend = postgres."
        ));
    }

    let metrics = Arc::new(PipelineMetrics::new());
    let queues = create_queues(&config.queue).await?;
    let store = create_store(&config.store).await?;
    let search = create_search_index(&config.search)?;

    let pool = WorkerPool::start(WorkerContext {
        queues,
        store,
        search,
        metrics,
        config: config.worker.clone(),
    });

    shutdown_signal().await?;
    tracing::info!("received shutdown signal");
    pool.shutdown().await;

    Ok(())
}

// -----------------------------
// check
// -----------------------------

fn run_check(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    println!("configuration ok: {}", config_path.display());
    println!();
    print!("{}", serde_yaml::to_string(&config)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_config_applies_defaults() {
        let file = write_config(
            r#"
server:
  listen: 127.0.0.1:9090
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.listen, "127.0.0.1:9090");
        assert_eq!(config.queue.backend, QueueBackend::Memory);
        assert_eq!(config.queue.max_attempts, 5);
        assert_eq!(config.worker.workers, 4);
    }

    #[test]
    fn test_load_config_rejects_postgres_queue_without_url() {
        let file = write_config(
            r#"
queue:
  backend: postgres
"#,
        );

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("queue.url"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/scribe.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to load configuration"));
    }
}
