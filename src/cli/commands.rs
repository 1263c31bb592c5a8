//! Implementação dos comandos CLI do calcwire.

use std::path::PathBuf;
use std::sync::Arc;

use super::demo::{demo_expression, DEMO_NAMES};
use super::interactive::run_client_menu;
use crate::cache::ResponseCache;
use crate::client::{render_trace, CalcClient, Computation, RequestOptions};
use crate::eval::evaluate;
use crate::protocol::WireCodec;
use crate::proxy::{CachingIntermediary, IntermediaryService, TcpOrigin};
use crate::server::{EvaluatorService, Listener};
use crate::types::config::Config;
use crate::{CalcError, CalcResult};

/// Completa no primeiro Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Ctrl-C received");
}

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> CalcResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    // Create directory if it doesn't exist
    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("calcwire.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        return Ok(());
    }

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("calcwire initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Start the evaluator:    calcwire serve");
    println!("  2. Start the intermediary: calcwire proxy");
    println!(
        "  3. Send expressions:       calcwire client --port {}",
        config.proxy.port
    );

    Ok(())
}

/// Starts the evaluator role.
pub async fn serve(host: Option<String>, port: Option<u16>, config: &Config) -> CalcResult<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let codec = WireCodec::new(config.protocol.max_frame_bytes);

    let listener = Listener::bind(&host, port, codec).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        cache_result = config.server.cache_result,
        cache_control = config.server.cache_control,
        "Evaluator ready"
    );

    let service = EvaluatorService::from_config(&config.server);
    listener.serve(move |_peer| service, shutdown_signal()).await
}

/// Starts the caching intermediary role.
pub async fn proxy(
    host: Option<String>,
    port: Option<u16>,
    upstream_host: Option<String>,
    upstream_port: Option<u16>,
    config: &Config,
) -> CalcResult<()> {
    let host = host.unwrap_or_else(|| config.proxy.host.clone());
    let port = port.unwrap_or(config.proxy.port);
    let upstream_host = upstream_host.unwrap_or_else(|| config.proxy.upstream_host.clone());
    let upstream_port = upstream_port.unwrap_or(config.proxy.upstream_port);
    let timeout = config.proxy.origin_timeout();
    let codec = WireCodec::new(config.protocol.max_frame_bytes);

    let listener = Listener::bind(&host, port, codec).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        upstream = %format!("{upstream_host}:{upstream_port}"),
        "Intermediary ready"
    );

    let intermediary = Arc::new(CachingIntermediary::new(Arc::new(ResponseCache::new())));
    let shared = Arc::clone(&intermediary);
    let result = listener
        .serve(
            move |_peer| {
                let origin = TcpOrigin::new(upstream_host.clone(), upstream_port, codec)
                    .with_timeout(timeout);
                IntermediaryService::new(Arc::clone(&shared), origin)
            },
            shutdown_signal(),
        )
        .await;

    let stats = intermediary.cache().stats();
    tracing::info!(
        entries = stats.entries,
        hits = stats.hits,
        misses = stats.misses,
        stores = stats.stores,
        "Final cache stats"
    );
    result
}

/// Connects as a requester and sends demo expressions.
pub async fn client(
    host: Option<String>,
    port: Option<u16>,
    expr: Option<String>,
    options: RequestOptions,
    config: &Config,
) -> CalcResult<()> {
    let host = host.unwrap_or_else(|| config.client.host.clone());
    let port = port.unwrap_or(config.client.port);
    let codec = WireCodec::new(config.protocol.max_frame_bytes);

    let mut client = CalcClient::connect(&host, port, codec).await?;

    match expr {
        Some(name) => {
            let expr = lookup_demo(&name)?;
            println!("{name}: {expr}");
            let outcome = client.submit(&expr, options).await;
            let termination = client.terminate().await;
            println!("{}", finish_one_shot(outcome, termination)?.render());
        }
        None => {
            run_client_menu(&mut client, options).await?;
            client.terminate().await?;
        }
    }

    Ok(())
}

/// Evaluates a demo expression locally.
pub fn eval(name: &str) -> CalcResult<()> {
    let expr = lookup_demo(name)?;
    let evaluation = evaluate(&expr)?;

    println!("{name}: {expr}");
    println!("Result: {}", evaluation.value);
    if let Some(trace) = render_trace(&evaluation.rendered_steps()) {
        println!("Steps:");
        println!("{trace}");
    }

    Ok(())
}

/// Shows version information.
pub fn version() {
    println!("calcwire {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Remote step-tracing calculator with a caching intermediary");
}

/// Picks the outcome of a one-shot session.
///
/// A submit error takes precedence; a failed termination is only logged.
fn finish_one_shot(
    outcome: CalcResult<Computation>,
    termination: CalcResult<()>,
) -> CalcResult<Computation> {
    if let Err(e) = termination {
        tracing::warn!(error = %e, "Failed to terminate session");
    }
    outcome
}

fn lookup_demo(name: &str) -> CalcResult<crate::expr::Expression> {
    demo_expression(name).ok_or_else(|| {
        CalcError::other(format!(
            "unknown expression `{name}` (expected one of: {})",
            DEMO_NAMES.join(", ")
        ))
    })
}
