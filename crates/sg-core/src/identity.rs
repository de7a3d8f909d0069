//! Client identity resolution for rate limiting.
//!
//! The identity is the caller's apparent IP address. Proxy headers are
//! consulted first, in a fixed priority order, and a header value is only
//! trusted when it is a syntactically valid, publicly routable address.
//! Resolution is total: malformed or missing headers are skipped and the
//! result falls back to the transport peer, then to [`UNKNOWN_CLIENT_IP`].

use std::collections::HashMap;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Sentinel address used when nothing resolvable is attached to a request.
pub const UNKNOWN_CLIENT_IP: &str = "0.0.0.0";

/// Proxy headers checked for the originating address, highest priority first.
pub const PROXY_HEADERS: &[&str] = &[
    "CF-Connecting-IP",
    "X-Forwarded-For",
    "X-Forwarded",
    "X-Cluster-Client-IP",
    "Forwarded-For",
    "Forwarded",
];

/// Case-insensitive, typed header access decoupled from any web framework.
pub trait HeaderLookup {
    /// Return the first value of `name`, if present and valid UTF-8.
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderLookup for http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }
}

impl HeaderLookup for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Where a resolved address came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trust {
    /// Taken from the named proxy header.
    ProxyHeader(&'static str),
    /// The transport-layer peer address.
    Direct,
    /// Nothing was resolvable; the sentinel is used.
    Fallback,
}

/// The caller identity used to key rate-limit windows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub raw_ip: String,
    pub trust: Trust,
}

impl ClientIdentity {
    /// Counter-store key for this client.
    pub fn client_id(&self) -> String {
        format!("ip_{}", self.raw_ip)
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_ip)
    }
}

/// Resolve the calling client's identity from proxy headers and the peer.
///
/// Returns the first candidate, in [`PROXY_HEADERS`] order followed by the
/// peer, that is a valid public IPv4/IPv6 address. Comma-separated lists only
/// contribute their first entry. When no candidate qualifies the peer is
/// returned verbatim, even if private, and without a peer the sentinel
/// [`UNKNOWN_CLIENT_IP`] is returned.
pub fn resolve_client_identity(headers: &impl HeaderLookup, peer: Option<&str>) -> ClientIdentity {
    for &name in PROXY_HEADERS {
        if let Some(ip) = headers.header(name).and_then(public_candidate) {
            return ClientIdentity {
                raw_ip: ip,
                trust: Trust::ProxyHeader(name),
            };
        }
    }

    if let Some(ip) = peer.and_then(public_candidate) {
        return ClientIdentity {
            raw_ip: ip,
            trust: Trust::Direct,
        };
    }

    match peer.map(str::trim).filter(|p| !p.is_empty()) {
        Some(p) => ClientIdentity {
            raw_ip: p.to_string(),
            trust: Trust::Direct,
        },
        None => ClientIdentity {
            raw_ip: UNKNOWN_CLIENT_IP.to_string(),
            trust: Trust::Fallback,
        },
    }
}

/// First comma-separated entry of `value`, if it is a public address.
fn public_candidate(value: &str) -> Option<String> {
    let first = value.split(',').next()?.trim();
    let ip: IpAddr = first.parse().ok()?;
    is_public(ip).then(|| first.to_string())
}

/// True when `ip` is neither in a private nor a reserved range.
pub fn is_public(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => is_public_v6(v6),
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    let private = a == 10
        || (a == 172 && (16..=31).contains(&b))
        || (a == 192 && b == 168)
        || (a == 100 && (64..=127).contains(&b));
    let reserved = a == 0 || a == 127 || (a == 169 && b == 254) || a >= 240;
    !private && !reserved
}

fn is_public_v6(ip: Ipv6Addr) -> bool {
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_public_v4(v4);
    }
    let first = ip.segments()[0];
    let unique_local = first & 0xfe00 == 0xfc00;
    let link_local = first & 0xffc0 == 0xfe80;
    !(ip.is_unspecified() || ip.is_loopback() || unique_local || link_local)
}
