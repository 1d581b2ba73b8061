//! Interest command: express one Interest over TCP and await the Data.

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use rust_ndnd_common::name::Name;
use rust_ndnd_common::packet::{Interest, Packet};
use rust_ndnd_common::uri::FaceUri;
use rust_ndnd_net::codec::FrameDecoder;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

fn make_nonce() -> u32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    (now.as_nanos() % u32::MAX as u128) as u32
}

pub async fn send_interest(
    name: String,
    router: String,
    timeout_ms: u64,
    can_be_prefix: bool,
    must_be_fresh: bool,
) -> Result<()> {
    let uri = FaceUri::parse(&router)?;
    let name = Name::from_string(&name);
    if name.is_empty() {
        bail!("name must be non-empty");
    }

    let mut stream = TcpStream::connect(uri.host_port()?)
        .await
        .with_context(|| format!("failed to connect to {}", uri))?;
    debug!("connected to {}", uri);

    let interest = Interest::new(name.clone())
        .with_nonce(make_nonce())
        .with_lifetime(timeout_ms)
        .with_can_be_prefix(can_be_prefix)
        .with_must_be_fresh(must_be_fresh);
    stream.write_all(&interest.to_wire()).await?;
    debug!("sent Interest {}", name);

    let result = timeout(
        Duration::from_millis(timeout_ms),
        await_answer(&mut stream, &name, can_be_prefix),
    )
    .await;

    match result {
        Ok(answer) => answer,
        Err(_) => Err(anyhow!("Interest timed out after {}ms", timeout_ms)),
    }
}

async fn await_answer(stream: &mut TcpStream, name: &Name, can_be_prefix: bool) -> Result<()> {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            bail!("connection closed before an answer arrived");
        }
        decoder.extend(&chunk[..n]);

        while let Some(wire) = decoder.next_frame()? {
            match Packet::from_wire(&wire) {
                Ok(Packet::Data(data)) => {
                    let matches = if can_be_prefix {
                        name.is_prefix_of(&data.name)
                    } else {
                        &data.name == name
                    };
                    if !matches {
                        continue;
                    }
                    println!("Data: {}", data.name);
                    println!("  freshness: {}ms", data.freshness_period_ms);
                    println!("  content ({} bytes):", data.content.len());
                    println!("{}", String::from_utf8_lossy(&data.content));
                    return Ok(());
                }
                Ok(Packet::Nack(nack)) => {
                    bail!("Nack: {}", nack.reason);
                }
                Ok(other) => debug!("ignoring {:?}", other),
                Err(err) => debug!("ignoring malformed packet: {}", err),
            }
        }
    }
}
