//! Serve command: a tiny producer answering Interests under a prefix.
//!
//! Point a daemon route at this listener to publish content, e.g.
//! `routes = [{ prefix = "/demo", nexthop = "tcp4://127.0.0.1:7000" }]`.

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use log::{debug, info, warn};
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Data, Packet};
use rust_ndnd_common::uri::FaceUri;
use rust_ndnd_net::codec::FrameDecoder;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub async fn serve(prefix: String, content: String, listen: String, freshness: u64) -> Result<()> {
    let uri = FaceUri::parse(&listen)?;
    let prefix = Name::from_string(&prefix);
    if prefix.is_empty() {
        bail!("prefix must be non-empty");
    }

    let listener = TcpListener::bind(uri.host_port()?)
        .await
        .with_context(|| format!("failed to bind {}", uri))?;
    info!("serving {} on {}", prefix, uri);

    let content = Bytes::from(content.into_bytes());
    loop {
        let (stream, peer) = listener.accept().await?;
        debug!("connection from {}", peer);
        let prefix = prefix.clone();
        let content = content.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, prefix, content, freshness).await {
                warn!("connection from {} ended: {}", peer, err);
            }
        });
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    prefix: Name,
    content: Bytes,
    freshness: u64,
) -> Result<()> {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        decoder.extend(&chunk[..n]);

        while let Some(wire) = decoder.next_frame()? {
            match Packet::from_wire(&wire) {
                Ok(Packet::Interest(interest)) => {
                    if !prefix.is_prefix_of(&interest.name) {
                        debug!("ignoring Interest {} outside {}", interest.name, prefix);
                        continue;
                    }
                    let data = Data::new(interest.name.clone(), content.clone())
                        .with_freshness_period(freshness);
                    stream.write_all(&data.to_wire()).await?;
                    info!("answered {}", interest.name);
                }
                Ok(other) => debug!("ignoring {:?}", other),
                Err(err) => debug!("ignoring malformed packet: {}", err),
            }
        }
    }
}
