//! Nebula - autopiloted peers sharing one in-process broadcast domain

use engine::ai::{bot_name, Autopilot};
use engine::{BroadcastDomain, Config, LogRenderer, Peer, Transport};
use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Nebula Blobs v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Arc::new(Config::load()?);
    info!("Loaded configuration");
    info!("  Arena: {}x{}", config.arena.map_size, config.arena.map_size);
    info!("  Channel: {}", config.sync.channel);
    info!("  Peers: {}", config.demo.peers);

    let domain = BroadcastDomain::new(config.sync.channel.clone(), config.sync.capacity);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut peers = Vec::with_capacity(config.demo.peers);
    for index in 0..config.demo.peers {
        let transport: Arc<dyn Transport> = Arc::new(domain.join());
        peers.push(tokio::spawn(run_peer(
            index,
            config.clone(),
            transport,
            shutdown_rx.clone(),
        )));
    }

    let run_secs = config.demo.run_secs;
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for Ctrl-C: {}", e);
            }
            info!("Shutting down");
        }
        _ = async {
            if run_secs == 0 {
                std::future::pending::<()>().await
            } else {
                sleep(Duration::from_secs(run_secs)).await
            }
        } => info!("Run time of {}s elapsed", run_secs),
    }

    let _ = shutdown_tx.send(true);
    for handle in peers {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Peer stopped with error: {:#}", e),
            Err(e) => warn!("Peer task failed: {}", e),
        }
    }

    info!("All peers left {}", domain.name());
    Ok(())
}

/// Play sessions back to back until shutdown, rejoining after each elimination.
async fn run_peer(
    index: usize,
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut rng = StdRng::from_os_rng();
    let name = bot_name(&mut rng, index);
    let viewport = Vec2::from(config.demo.viewport);
    let respawn_delay = Duration::from_millis(config.demo.respawn_delay_ms);
    let mut peer = Peer::with_rng(config.clone(), transport, StdRng::from_rng(&mut rng));

    loop {
        let input = Autopilot::new(config.clone(), viewport, StdRng::from_rng(&mut rng));
        let mut renderer = LogRenderer::new(name.clone(), config.demo.leaderboard_size);
        // One reporter is enough.
        if index == 0 {
            renderer = renderer.with_report(Duration::from_secs(config.demo.report_secs));
        }
        peer.start_session(&name, Box::new(input), Box::new(renderer)).await?;

        tokio::select! {
            status = peer.wait_for_end() => info!("{} session ended: {:?}", name, status),
            _ = shutdown.changed() => break,
        }
        tokio::select! {
            _ = sleep(respawn_delay) => {}
            _ = shutdown.changed() => break,
        }
        peer.reset().await;
    }

    peer.shutdown().await;
    info!("{} left", name);
    Ok(())
}
