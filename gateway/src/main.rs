//! The gateway binary: parses CLI flags, loads layered configuration,
//! wires up the quota ledger, upload pipeline, upstream client,
//! generation controller, and task engine, then serves the HTTP surface
//! until shutdown (spec §4.10).

use clap::Parser;
use gateway_controller::GenerationController;
use gateway_quota::QuotaLedger;
use gateway_server::config::{self, GatewayConfig, MirrorConfig};
use gateway_server::runners::{CompositionTaskRunner, ImageTaskRunner, VideoTaskRunner};
use gateway_server::state::AppState;
use gateway_server::{logging, router};
use gateway_session::Region;
use gateway_task::{SchedulerConfig, TaskRunner, TaskScheduler, TaskStore, TaskType};
use gateway_upload::{RegionEndpoints, ReqwestUploadTransport, UploadPipeline};
use gateway_upstream::ReqwestUpstreamClient;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// A gateway process fronting the image/video generation upstream with
/// quota enforcement, synchronous and async generation endpoints, and
/// an OpenAI-compatible chat-completions passthrough.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to a YAML config file, layered over compiled-in defaults and
    /// itself overridden by environment variables.
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Overrides the configured listen address (`host:port`).
    #[arg(long)]
    listen_addr: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let mut config = match config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            std::process::exit(1);
        }
    };
    if let Some(addr) = args.listen_addr {
        config.listen_addr = addr;
    }

    logging::init(config.log_format);

    if let Err(err) = run(config).await {
        tracing::error!(error = %err, "gateway exited with an error");
        std::process::exit(1);
    }
}

async fn run(config: GatewayConfig) -> Result<(), String> {
    let config = Arc::new(config);

    let quota = Arc::new(
        QuotaLedger::open(config.quota_path.clone(), config.quota.to_service_limits())
            .await
            .map_err(|e| format!("opening quota ledger: {e}"))?,
    );

    let http_client = build_http_client(&config)?;
    let upstream = Arc::new(ReqwestUpstreamClient::new(
        http_client.clone(),
        region_endpoints_fn(config.mirrors.clone()),
    ));
    let upload = Arc::new(UploadPipeline::new(
        Arc::new(ReqwestUploadTransport::new(http_client, region_endpoints_fn(config.mirrors.clone()))),
        Arc::new(region_endpoints_fn(config.mirrors.clone())),
    ));
    let controller = Arc::new(GenerationController::new(Arc::clone(&quota), upload, upstream));

    let tasks = TaskStore::new();
    let mut runners: HashMap<TaskType, Arc<dyn TaskRunner>> = HashMap::new();
    runners.insert(TaskType::ImageGeneration, Arc::new(ImageTaskRunner::new(Arc::clone(&controller))));
    runners.insert(
        TaskType::ImageComposition,
        Arc::new(CompositionTaskRunner::new(Arc::clone(&controller))),
    );
    runners.insert(TaskType::VideoGeneration, Arc::new(VideoTaskRunner::new(Arc::clone(&controller))));

    let scheduler = Arc::new(TaskScheduler::new(
        Arc::clone(&tasks),
        runners,
        SchedulerConfig {
            max_concurrency: config.task.max_concurrent,
            reap_retention: config.task.reap_retention(),
        },
    ));
    let scheduler_cancel = CancellationToken::new();
    let scheduler_handle = tokio::spawn({
        let scheduler = Arc::clone(&scheduler);
        let cancel = scheduler_cancel.clone();
        async move { scheduler.run(cancel).await }
    });

    let state = AppState::new(controller, Arc::clone(&tasks), quota, Arc::clone(&config));
    let app = router::build(state);

    let listener = tokio::net::TcpListener::bind(config.listen_addr.as_str())
        .await
        .map_err(|e| format!("binding {}: {e}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("server error: {e}"))?;

    info!("stopping task scheduler");
    scheduler_cancel.cancel();
    let _ = scheduler_handle.await;

    Ok(())
}

fn build_http_client(config: &GatewayConfig) -> Result<reqwest::Client, String> {
    let mut builder = reqwest::Client::builder().timeout(Duration::from_secs(30));
    if config.proxy.enabled {
        let url = format!("socks5://{}:{}", config.proxy.host, config.proxy.port);
        let mut proxy = reqwest::Proxy::all(url.as_str()).map_err(|e| format!("invalid proxy url {url}: {e}"))?;
        if let Some(auth) = &config.proxy.auth {
            if let Some((user, pass)) = auth.split_once(':') {
                proxy = proxy.basic_auth(user, pass);
            }
        }
        builder = builder.proxy(proxy);
    }
    builder.build().map_err(|e| format!("building http client: {e}"))
}

/// Closure the upload pipeline and upstream client resolve region
/// endpoints through, with any configured `*_MIRROR` overrides applied
/// (spec §6, §11).
fn region_endpoints_fn(mirrors: MirrorConfig) -> impl Fn(Region) -> RegionEndpoints + Send + Sync + 'static {
    move |region: Region| {
        let base = RegionEndpoints::for_region(region);
        match region {
            Region::Us => base.with_mirror_overrides(
                mirrors.imagex_us_mirror.as_deref(),
                mirrors.dreamina_us_mirror.as_deref(),
            ),
            Region::Hk => base.with_mirror_overrides(
                mirrors.imagex_hk_mirror.as_deref(),
                mirrors.dreamina_hk_mirror.as_deref(),
            ),
            Region::Cn => base.with_mirror_overrides(
                mirrors.imagex_cn_mirror.as_deref(),
                mirrors.jimeng_cn_mirror.as_deref(),
            ),
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
