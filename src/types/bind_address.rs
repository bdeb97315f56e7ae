// ABOUTME: Host address the registry port is published on.
// ABOUTME: Accepts a literal IP or a hostname that resolves to one.

use std::fmt;
use std::net::{IpAddr, ToSocketAddrs};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BindAddressError {
    #[error("bind ip cannot be empty")]
    Empty,

    #[error("bind ip '{0}' is not a valid IP address or a domain name that resolves to an IP address")]
    Unresolvable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAddress(IpAddr);

impl BindAddress {
    /// Parse a literal address, falling back to a DNS lookup of the input.
    pub fn resolve(input: &str) -> Result<Self, BindAddressError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(BindAddressError::Empty);
        }

        if let Ok(ip) = input.parse::<IpAddr>() {
            return Ok(Self(ip));
        }

        (input, 0)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .map(|addr| Self(addr.ip()))
            .ok_or_else(|| BindAddressError::Unresolvable(input.to_string()))
    }

    pub fn ip(&self) -> IpAddr {
        self.0
    }
}

impl Default for BindAddress {
    fn default() -> Self {
        Self(IpAddr::from([127, 0, 0, 1]))
    }
}

impl From<IpAddr> for BindAddress {
    fn from(ip: IpAddr) -> Self {
        Self(ip)
    }
}

impl fmt::Display for BindAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
