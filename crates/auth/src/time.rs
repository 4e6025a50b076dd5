//! Trusted time over SNTP.
//!
//! # Wire format (RFC 4330)
//!
//! ```text
//! REQUEST (client -> server), 48 bytes:
//!   byte 0: LI=0, VN=4, Mode=3 (client)  => 0x23
//!   bytes 1..48: zero
//!
//! REPLY (server -> client), 48 bytes:
//!   byte 0 low 3 bits: Mode, 4 (server) or 5 (broadcast)
//!   byte 1: stratum, 0 means kiss-o'-death
//!   bytes 40..44: transmit timestamp seconds since 1900 (BE)
//!   bytes 44..48: transmit timestamp fraction (BE, 1/2^32 s)
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use sealpost_http::BoxFuture;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

use crate::AuthError;

/// Servers queried in order when no list is configured.
pub const DEFAULT_NTP_SERVERS: [&str; 4] = [
    "no.pool.ntp.org",
    "0.pool.ntp.org",
    "1.pool.ntp.org",
    "2.pool.ntp.org",
];

/// Per-server reply timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const NTP_PORT: u16 = 123;
const PACKET_LEN: usize = 48;
const CLIENT_REQUEST: u8 = 0x23;
/// Seconds between 1900-01-01 and 1970-01-01.
const NTP_UNIX_OFFSET: i64 = 2_208_988_800;

/// Source of "now" for expiry decisions.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> BoxFuture<'_, Result<DateTime<Utc>, AuthError>>;
}

#[derive(Debug, thiserror::Error)]
enum QueryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not resolve {0}")]
    Resolve(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("invalid reply: {0}")]
    InvalidReply(&'static str),
}

/// Asks NTP servers in order and returns the first valid answer.
///
/// Not lowest-latency and not a quorum: one good reply is enough, and the
/// call only fails when every server failed.
#[derive(Debug, Clone)]
pub struct NtpTimeSource {
    servers: Vec<String>,
    timeout: Duration,
}

impl Default for NtpTimeSource {
    fn default() -> Self {
        Self::new(DEFAULT_NTP_SERVERS.iter().map(|s| s.to_string()).collect())
    }
}

impl NtpTimeSource {
    /// `servers` entries are `host` or `host:port`.
    pub fn new(servers: Vec<String>) -> Self {
        Self {
            servers,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    async fn query(&self, server: &str) -> Result<DateTime<Utc>, QueryError> {
        let (host, port) = split_host_port(server);
        let addr = tokio::net::lookup_host((host, port))
            .await?
            .next()
            .ok_or_else(|| QueryError::Resolve(server.to_string()))?;

        let bind: SocketAddr = if addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(addr).await?;

        let mut request = [0u8; PACKET_LEN];
        request[0] = CLIENT_REQUEST;
        socket.send(&request).await?;

        let mut reply = [0u8; PACKET_LEN];
        let n = tokio::time::timeout(self.timeout, socket.recv(&mut reply))
            .await
            .map_err(|_| QueryError::Timeout(self.timeout))??;
        parse_reply(&reply[..n])
    }
}

impl TimeSource for NtpTimeSource {
    fn now(&self) -> BoxFuture<'_, Result<DateTime<Utc>, AuthError>> {
        Box::pin(async move {
            for server in &self.servers {
                match self.query(server).await {
                    Ok(now) => {
                        debug!(server = %server, now = %now, "trusted time resolved");
                        return Ok(now);
                    }
                    Err(e) => {
                        warn!(server = %server, error = %e, "time server failed, trying next");
                    }
                }
            }
            Err(AuthError::TimeUnavailable {
                servers: self.servers.join(", "),
            })
        })
    }
}

fn split_host_port(server: &str) -> (&str, u16) {
    match server.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host, port),
            Err(_) => (server, NTP_PORT),
        },
        _ => (server, NTP_PORT),
    }
}

fn parse_reply(reply: &[u8]) -> Result<DateTime<Utc>, QueryError> {
    if reply.len() < PACKET_LEN {
        return Err(QueryError::InvalidReply("short packet"));
    }
    let mode = reply[0] & 0x07;
    if mode != 4 && mode != 5 {
        return Err(QueryError::InvalidReply("not a server reply"));
    }
    if reply[1] == 0 {
        return Err(QueryError::InvalidReply("kiss-o'-death"));
    }

    let seconds = u32::from_be_bytes([reply[40], reply[41], reply[42], reply[43]]);
    let fraction = u32::from_be_bytes([reply[44], reply[45], reply[46], reply[47]]);
    if seconds == 0 && fraction == 0 {
        return Err(QueryError::InvalidReply("empty transmit timestamp"));
    }

    // Era 1 starts in 2036; timestamps with the top bit clear belong to it.
    let mut ntp_seconds = i64::from(seconds);
    if seconds & 0x8000_0000 == 0 {
        ntp_seconds += 1 << 32;
    }
    let nanos = ((u64::from(fraction) * 1_000_000_000) >> 32) as u32;

    DateTime::from_timestamp(ntp_seconds - NTP_UNIX_OFFSET, nanos)
        .ok_or(QueryError::InvalidReply("timestamp out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reply_for(unix_seconds: i64, fraction: u32) -> [u8; PACKET_LEN] {
        let mut pkt = [0u8; PACKET_LEN];
        pkt[0] = 0x24; // VN=4, Mode=4
        pkt[1] = 2;
        let secs = (unix_seconds + NTP_UNIX_OFFSET) as u32;
        pkt[40..44].copy_from_slice(&secs.to_be_bytes());
        pkt[44..48].copy_from_slice(&fraction.to_be_bytes());
        pkt
    }

    /// Answers every request with the given time until dropped.
    async fn mock_ntp_server(unix_seconds: i64) -> String {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(async move {
            let mut buf = [0u8; PACKET_LEN];
            while let Ok((n, peer)) = socket.recv_from(&mut buf).await {
                if n == PACKET_LEN && buf[0] == CLIENT_REQUEST {
                    let _ = socket.send_to(&reply_for(unix_seconds, 0), peer).await;
                }
            }
        });
        addr.to_string()
    }

    /// A bound socket that never answers.
    async fn silent_server() -> (String, UdpSocket) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        (socket.local_addr().unwrap().to_string(), socket)
    }

    #[test]
    fn parses_transmit_timestamp() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let parsed = parse_reply(&reply_for(expected.timestamp(), 1 << 31)).unwrap();
        assert_eq!(parsed.timestamp(), expected.timestamp());
        assert_eq!(parsed.timestamp_subsec_millis(), 500);
    }

    #[test]
    fn rejects_client_mode_reply() {
        let mut pkt = reply_for(1_700_000_000, 0);
        pkt[0] = CLIENT_REQUEST;
        assert!(parse_reply(&pkt).is_err());
    }

    #[test]
    fn rejects_kiss_of_death() {
        let mut pkt = reply_for(1_700_000_000, 0);
        pkt[1] = 0;
        assert!(parse_reply(&pkt).is_err());
    }

    #[test]
    fn rejects_short_and_empty_replies() {
        assert!(parse_reply(&[0x24; 20]).is_err());
        let mut pkt = [0u8; PACKET_LEN];
        pkt[0] = 0x24;
        pkt[1] = 1;
        assert!(parse_reply(&pkt).is_err());
    }

    #[test]
    fn splits_host_and_port() {
        assert_eq!(split_host_port("0.pool.ntp.org"), ("0.pool.ntp.org", 123));
        assert_eq!(split_host_port("127.0.0.1:1123"), ("127.0.0.1", 1123));
        assert_eq!(split_host_port("::1"), ("::1", 123));
    }

    #[tokio::test]
    async fn first_reachable_server_wins() {
        let (silent, _keep) = silent_server().await;
        let good = mock_ntp_server(1_700_000_000).await;
        let other = mock_ntp_server(1_800_000_000).await;

        let source = NtpTimeSource::new(vec![silent, good, other])
            .with_timeout(Duration::from_millis(200));
        let now = source.now().await.unwrap();
        assert_eq!(now.timestamp(), 1_700_000_000);
    }

    #[tokio::test]
    async fn all_servers_failing_is_error() {
        let (a, _keep_a) = silent_server().await;
        let (b, _keep_b) = silent_server().await;

        let source =
            NtpTimeSource::new(vec![a.clone(), b.clone()]).with_timeout(Duration::from_millis(100));
        match source.now().await {
            Err(AuthError::TimeUnavailable { servers }) => {
                assert!(servers.contains(&a));
                assert!(servers.contains(&b));
            }
            other => panic!("expected TimeUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_server_list_is_error() {
        let source = NtpTimeSource::new(Vec::new());
        assert!(matches!(
            source.now().await,
            Err(AuthError::TimeUnavailable { .. })
        ));
    }

    #[test]
    fn default_lists_pool_servers_in_order() {
        let source = NtpTimeSource::default();
        assert_eq!(source.servers()[0], "no.pool.ntp.org");
        assert_eq!(source.servers().len(), 4);
    }
}
