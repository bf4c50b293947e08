//! One query-with-retry sequence over a list of servers.

use std::net::SocketAddr;

use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::config::ResolverConfig;
use crate::dns::enums::DNSResourceType;
use crate::dns::{DNSPacket, build_query};
use crate::error::Result;
use crate::transport::DatagramTransport;

/// Ask `servers` in order for `name`/`qtype` until one returns a parseable
/// response.
///
/// The sequence owns a single ephemeral socket and a single random ID. Each
/// server gets `config.attempts` tries with waits of `initial_timeout`
/// doubling up to `max_timeout`. Datagrams that fail to parse or carry the
/// wrong ID are dropped and the wait continues. `Ok(None)` means every server
/// stayed silent; failing to open the socket is returned as an error at once.
pub async fn exchange(
    transport: &dyn DatagramTransport,
    config: &ResolverConfig,
    servers: &[SocketAddr],
    name: &str,
    qtype: DNSResourceType,
    recursive: bool,
) -> Result<Option<DNSPacket>> {
    let id = rand::random::<u16>();
    let query = build_query(id, name, qtype, recursive)?;
    let mut socket = transport.open().await?;

    for server in servers {
        for attempt in 0..config.attempts {
            let wait = config.attempt_timeout(attempt);
            trace!(
                "Query {} {} to {} (id={}, attempt {}, wait {:?})",
                name,
                qtype,
                server,
                id,
                attempt + 1,
                wait
            );

            if let Err(e) = socket.send_to(*server, &query).await {
                warn!("Failed to send query to {}: {}", server, e);
                break;
            }

            let deadline = Instant::now() + wait;
            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    break;
                }
                let bytes = match socket.recv(remaining).await {
                    Ok(Some(bytes)) => bytes,
                    Ok(None) => break,
                    Err(e) => {
                        debug!("Receive from {} failed: {}", server, e);
                        break;
                    }
                };
                match DNSPacket::parse_response(&bytes, id) {
                    Ok(packet) => {
                        if attempt > 0 {
                            debug!("Query succeeded on retry {}", attempt);
                        }
                        return Ok(Some(packet));
                    }
                    Err(e) => trace!("Dropping datagram while waiting on {}: {}", server, e),
                }
            }
            debug!("Attempt {} to {} timed out", attempt + 1, server);
        }
        warn!("No usable response from {} for {} {}", server, name, qtype);
    }

    Ok(None)
}
