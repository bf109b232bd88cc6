use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tonal_core::app::{StartupError, TaskService, TaskServiceBuilder};
use tonal_core::config::{RealEnv, WorkerConfig};
use tonal_core::impls::{AmqpTaskQueue, OnnxSentimentEngine, RedisResultStore};

/// 設定 → モデル → Redis → RabbitMQ の順に繋ぐ（どれか失敗したら exit 1）
async fn start(config: &WorkerConfig) -> Result<TaskService, StartupError> {
    let engine = OnnxSentimentEngine::load(
        &config.model_path,
        &config.tokenizer_path,
        config.max_sequence_length,
    )?;
    let store = RedisResultStore::connect(&config.redis_url).await?;
    let queue = AmqpTaskQueue::connect(
        &config.rabbitmq_url,
        config.prefetch_count,
        config.identity.as_str(),
    )
    .await?;

    let mut builder = TaskServiceBuilder::new()
        .identity(config.identity.clone())
        .queue_name(config.task_queue.clone())
        .store(Arc::new(store))
        .engine(Arc::new(engine));

    if let Some(dead_letter_queue) = &config.dead_letter_queue {
        let sink = queue.dead_letter(dead_letter_queue).await?;
        info!(queue = %dead_letter_queue, "dropped payloads go to dead-letter queue");
        builder = builder.dead_letter(Arc::new(sink));
    }

    Ok(builder.queue(Arc::new(queue)).build()?)
}

/// SIGINT / SIGTERM で shutdown を送る
async fn wait_for_signal(shutdown_tx: watch::Sender<bool>) {
    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = interrupt => info!("received SIGINT, finishing current task"),
        _ = terminate => info!("received SIGTERM, finishing current task"),
    }
    // ignore send error: the loop may already be gone
    let _ = shutdown_tx.send(true);
}

async fn bootstrap() -> anyhow::Result<TaskService> {
    let config = WorkerConfig::from_env(&RealEnv)
        .map_err(StartupError::from)
        .context("invalid configuration")?;
    info!(
        worker = %config.identity,
        queue = %config.task_queue,
        model = %config.model_path.display(),
        "starting sentiment worker"
    );
    start(&config).await.context("startup failed")
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let service = match bootstrap().await {
        Ok(service) => service,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(1);
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signals = tokio::spawn(wait_for_signal(shutdown_tx));

    let result = service.run(shutdown_rx).await;
    signals.abort();

    match result {
        Ok(stats) => {
            info!(
                acknowledged = stats.acknowledged,
                dropped = stats.dropped,
                unacknowledged = stats.unacknowledged,
                "worker stopped"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "worker stopped");
            ExitCode::from(e.exit_code())
        }
    }
}
