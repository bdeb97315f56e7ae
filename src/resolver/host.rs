// ABOUTME: Finds an address other machines can use to reach this host.
// ABOUTME: Resolves the machine's hostname and prefers a non-loopback IPv4 address.

use std::net::{IpAddr, ToSocketAddrs};

/// Non-loopback address of this host, if its hostname resolves to one.
pub fn host_ip() -> Option<IpAddr> {
    let hostname = gethostname::gethostname();
    let hostname = hostname.to_str()?;

    let addrs: Vec<IpAddr> = (hostname, 0)
        .to_socket_addrs()
        .ok()?
        .map(|addr| addr.ip())
        .filter(|ip| !ip.is_loopback())
        .collect();

    tracing::debug!(hostname, ?addrs, "resolved host addresses");

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
}
