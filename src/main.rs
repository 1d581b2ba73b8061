//! The ndnd daemon: wires the transport channels to the forwarding core
//! and drives everything from a single event loop task.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use rust_ndnd_common::name::Name;
use rust_ndnd_common::uri::{FaceUri, Scheme};
use rust_ndnd_fwd::{Forwarder, ForwarderConfig};
use rust_ndnd_net::{mailbox, tcp, udp, unix, FwInput, FwSender};
use rust_ndnd_fwd::face::{FaceId, FaceIdAllocator};
use std::path::PathBuf;
use std::time::Instant;

mod config;

use crate::config::DaemonConfig;

/// NDN forwarding daemon
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the configuration file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Additional face URIs to listen on (tcp4://, udp4://, unix://)
    #[clap(short, long)]
    listen: Vec<String>,

    /// Sets the level of verbosity
    #[clap(short, long)]
    verbose: bool,
}

fn strategy_name(name: &str) -> Name {
    if name.starts_with('/') {
        Name::from_string(name)
    } else {
        Name::from_string(&format!("/localhost/ndnd/strategy/{}", name))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(
        if cli.verbose { "debug" } else { "info" },
    ))
    .init();

    let mut cfg = DaemonConfig::load(cli.config.as_deref())?;
    cfg.listen.extend(cli.listen);

    run(cfg).await
}

async fn run(cfg: DaemonConfig) -> Result<()> {
    let (fw_tx, mut fw_rx) = mailbox();

    let mut forwarder = Forwarder::new(ForwarderConfig {
        cs_capacity: cfg.cs_capacity,
        pit_capacity: cfg.pit_capacity,
        admit_unsolicited: cfg.admit_unsolicited,
        rng_seed: None,
    });
    let allocator = forwarder.face_id_allocator();

    // Channels for incoming faces.
    for uri_str in &cfg.listen {
        let uri = FaceUri::parse(uri_str)?;
        listen_on(&uri, &fw_tx, &allocator).await?;
    }

    // Static routes: dial each next-hop once and point the FIB at it.
    for route in &cfg.routes {
        let uri = FaceUri::parse(&route.nexthop)?;
        let face = connect_to(&uri, &fw_tx, &allocator).await?;
        let prefix = Name::from_string(&route.prefix);
        forwarder.fib_insert(&prefix, face, route.cost);
        info!("route {} -> {} (cost {})", prefix, uri, route.cost);
    }

    // Strategy choices.
    for choice in &cfg.strategies {
        let prefix = Name::from_string(&choice.prefix);
        let strategy = strategy_name(&choice.strategy);
        forwarder
            .set_strategy_choice(&prefix, &strategy)
            .with_context(|| format!("cannot set strategy for {}", prefix))?;
        info!("strategy {} -> {}", prefix, strategy);
    }

    info!("ndnd running");

    loop {
        forwarder.advance_clock(Instant::now());
        let deadline = forwarder
            .next_deadline()
            .map(tokio::time::Instant::from_std);

        tokio::select! {
            input = fw_rx.recv() => {
                let Some(input) = input else { break };
                forwarder.advance_clock(Instant::now());
                dispatch(&mut forwarder, input);
            }
            _ = sleep_until_or_forever(deadline) => {
                // Timers fire on the next advance_clock at loop top.
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, shutting down");
                break;
            }
        }
    }

    // Teardown: close the faces, then let the tables drop with the
    // forwarder.
    let face_ids: Vec<FaceId> = forwarder.faces().map(|f| f.id()).collect();
    for id in face_ids {
        forwarder.remove_face(id);
    }
    let metrics = forwarder.metrics();
    info!(
        "served {} Interests, {} Data, CS hits {}",
        metrics.interests_received.value(),
        metrics.data_received.value(),
        metrics.cs_hits.value(),
    );
    Ok(())
}

async fn sleep_until_or_forever(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn dispatch(forwarder: &mut Forwarder, input: FwInput) {
    match input {
        FwInput::NewFace {
            id,
            transport,
            persistency,
        } => {
            forwarder.add_face_with_id(id, transport, persistency);
        }
        FwInput::Packet { id, wire } => forwarder.handle_packet(id, wire),
        FwInput::FaceClosed { id, reason } => forwarder.handle_face_closed(id, &reason),
    }
}

async fn listen_on(uri: &FaceUri, fw_tx: &FwSender, allocator: &FaceIdAllocator) -> Result<()> {
    match uri.scheme {
        Scheme::Tcp4 | Scheme::Tcp6 => {
            tcp::listen(uri, fw_tx.clone(), allocator.clone()).await?;
        }
        Scheme::Udp4 | Scheme::Udp6 => {
            udp::listen(uri, fw_tx.clone(), allocator.clone()).await?;
        }
        Scheme::Unix => {
            unix::listen(uri, fw_tx.clone(), allocator.clone()).await?;
        }
        Scheme::Ether | Scheme::Ws => {
            warn!("no driver for {}, skipping", uri);
        }
    }
    Ok(())
}

async fn connect_to(
    uri: &FaceUri,
    fw_tx: &FwSender,
    allocator: &FaceIdAllocator,
) -> Result<FaceId> {
    match uri.scheme {
        Scheme::Tcp4 | Scheme::Tcp6 => tcp::connect(uri, fw_tx.clone(), allocator.clone()).await,
        Scheme::Udp4 | Scheme::Udp6 => udp::connect(uri, fw_tx.clone(), allocator.clone()).await,
        Scheme::Unix => unix::connect(uri, fw_tx.clone(), allocator.clone()).await,
        other => {
            debug!("unsupported next-hop scheme {:?}", other);
            bail!("no driver for scheme {}", other.as_str())
        }
    }
}
