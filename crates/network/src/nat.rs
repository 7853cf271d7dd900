//! NAT exposure probing
//!
//! Determines whether this node's locally bound port is reachable from the
//! outside by asking public STUN servers for the reflexive address. A probe
//! walks an ordered candidate list until a server answers, then compares
//! the externally observed port against the local one. No answer from any
//! candidate degrades to [`Exposure::Unknown`], which callers must treat as
//! unreachable.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpStream, UdpSocket};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{NetworkError, Result};
use crate::stun;

/// Reachability classification of the local port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    /// External port equals the locally bound port
    Exposed,
    /// A NAT rewrote the port; direct inbound connections will not arrive
    NotExposed,
    /// No usable server response; must not be treated as reachable
    Unknown,
}

impl Exposure {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Exposure::Exposed)
    }
}

/// Phase of one probe attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProbePhase {
    /// Walking the candidate list, waiting for any server to answer
    SearchingServer,
    /// Got a reflexive address, comparing ports
    CheckingPortMapping,
}

/// Candidate servers reachable over UDP, list version 1
pub const UDP_SERVERS_V1: &[&str] = &[
    "stun.l.google.com:19302",
    "stun1.l.google.com:19302",
    "stun.cloudflare.com:3478",
];

/// Candidate servers accepting STUN over TCP, list version 1
pub const TCP_SERVERS_V1: &[&str] = &[
    "stun.l.google.com:19302",
    "stunserver.stunprotocol.org:3478",
];

/// UDP answers fast or not at all
pub const UDP_TIMEOUT: Duration = Duration::from_millis(700);

/// TCP needs the extra budget for connection setup
pub const TCP_TIMEOUT: Duration = Duration::from_millis(1200);

/// Ordered candidate list with a cursor; `next()` returns `None` once
/// exhausted and the probe concludes `Unknown`.
pub struct ServerList {
    servers: Vec<String>,
    cursor: usize,
}

impl ServerList {
    pub fn new<I, S>(servers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            servers: servers.into_iter().map(Into::into).collect(),
            cursor: 0,
        }
    }

    pub fn next(&mut self) -> Option<&str> {
        let server = self.servers.get(self.cursor)?;
        self.cursor += 1;
        Some(server)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.servers.len()
    }
}

/// Reachability prober over a fixed candidate list
///
/// Each probe is independent and idempotent: it binds a transient socket,
/// asks, classifies, and discards everything.
pub struct NatProbe {
    udp_servers: Vec<String>,
    tcp_servers: Vec<String>,
    udp_timeout: Duration,
    tcp_timeout: Duration,
}

impl NatProbe {
    pub fn new() -> Self {
        Self {
            udp_servers: UDP_SERVERS_V1.iter().map(|s| s.to_string()).collect(),
            tcp_servers: TCP_SERVERS_V1.iter().map(|s| s.to_string()).collect(),
            udp_timeout: UDP_TIMEOUT,
            tcp_timeout: TCP_TIMEOUT,
        }
    }

    pub fn with_servers(udp_servers: Vec<String>, tcp_servers: Vec<String>) -> Self {
        Self {
            udp_servers,
            tcp_servers,
            udp_timeout: UDP_TIMEOUT,
            tcp_timeout: TCP_TIMEOUT,
        }
    }

    pub fn timeouts(mut self, udp: Duration, tcp: Duration) -> Self {
        self.udp_timeout = udp;
        self.tcp_timeout = tcp;
        self
    }

    /// Probe reachability over UDP, degrading any failure to `Unknown`.
    pub async fn probe_udp(&self) -> Exposure {
        match self.try_probe_udp().await {
            Ok(exposure) => exposure,
            Err(e) => {
                warn!(error = %e, "udp probe failed");
                Exposure::Unknown
            }
        }
    }

    /// Probe reachability over UDP, surfacing the failure cause.
    pub async fn try_probe_udp(&self) -> Result<Exposure> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        let local_port = socket.local_addr()?.port();

        let mut phase = ProbePhase::SearchingServer;
        let mut candidates = ServerList::new(self.udp_servers.iter().cloned());
        while let Some(server) = candidates.next() {
            match self.udp_attempt(&socket, server).await {
                Ok(mapped) => {
                    phase = ProbePhase::CheckingPortMapping;
                    debug!(%server, %mapped, ?phase, "server answered");
                    return Ok(classify(local_port, mapped.port()));
                }
                Err(e) => {
                    debug!(%server, error = %e, ?phase, "candidate failed");
                }
            }
        }

        Err(NetworkError::ProbeExhausted)
    }

    /// Probe reachability over TCP, degrading any failure to `Unknown`.
    pub async fn probe_tcp(&self) -> Exposure {
        match self.try_probe_tcp().await {
            Ok(exposure) => exposure,
            Err(e) => {
                warn!(error = %e, "tcp probe failed");
                Exposure::Unknown
            }
        }
    }

    /// Probe reachability over TCP, surfacing the failure cause.
    pub async fn try_probe_tcp(&self) -> Result<Exposure> {
        let mut phase = ProbePhase::SearchingServer;
        let mut candidates = ServerList::new(self.tcp_servers.iter().cloned());
        while let Some(server) = candidates.next() {
            match timeout(self.tcp_timeout, tcp_attempt(server)).await {
                Ok(Ok((local_port, mapped))) => {
                    phase = ProbePhase::CheckingPortMapping;
                    debug!(%server, %mapped, ?phase, "server answered");
                    return Ok(classify(local_port, mapped.port()));
                }
                Ok(Err(e)) => {
                    debug!(%server, error = %e, ?phase, "candidate failed");
                }
                Err(_) => {
                    debug!(%server, timeout = ?self.tcp_timeout, ?phase, "candidate timed out");
                }
            }
        }

        Err(NetworkError::ProbeExhausted)
    }

    async fn udp_attempt(&self, socket: &UdpSocket, server: &str) -> Result<SocketAddr> {
        let server_addr = resolve(server).await?;
        let txn_id = stun::new_transaction_id();
        let request = stun::build_binding_request(&txn_id);
        socket.send_to(&request, server_addr).await?;

        let mut buf = [0u8; 576];
        let (len, _) = timeout(self.udp_timeout, socket.recv_from(&mut buf))
            .await
            .map_err(|_| NetworkError::ProbeTimeout(self.udp_timeout))??;

        stun::parse_binding_response(&buf[..len], &txn_id)
    }
}

impl Default for NatProbe {
    fn default() -> Self {
        Self::new()
    }
}

async fn tcp_attempt(server: &str) -> Result<(u16, SocketAddr)> {
    let server_addr = resolve(server).await?;
    let mut stream = TcpStream::connect(server_addr).await?;
    let local_port = stream.local_addr()?.port();

    let txn_id = stun::new_transaction_id();
    stream.write_all(&stun::build_binding_request(&txn_id)).await?;

    let response = stun::read_stream_message(&mut stream).await?;
    let mapped = stun::parse_binding_response(&response, &txn_id)?;
    Ok((local_port, mapped))
}

async fn resolve(server: &str) -> Result<SocketAddr> {
    if let Ok(addr) = server.parse() {
        return Ok(addr);
    }
    tokio::net::lookup_host(server)
        .await
        .map_err(|_| NetworkError::ServerResolution(server.to_string()))?
        .next()
        .ok_or_else(|| NetworkError::ServerResolution(server.to_string()))
}

fn classify(local_port: u16, external_port: u16) -> Exposure {
    if external_port == local_port {
        Exposure::Exposed
    } else {
        Exposure::NotExposed
    }
}
