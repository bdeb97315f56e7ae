// ABOUTME: Renders and writes the dnsmasq configuration for the local resolver.
// ABOUTME: Wildcard address rules send the ingress domain and extras to one target.

use std::fs;
use std::io;
use std::net::IpAddr;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Address used when no target is configured and the host has none.
pub const FALLBACK_TARGET: &str = "127.0.0.1";

const HEADER: &str = "#log-queries
no-resolv
server=1.0.0.1
server=1.1.1.1
strict-order
";

/// Render the resolver configuration.
///
/// Each distinct domain gets exactly one `address=` rule, primary domain
/// first, extras in the order given. Blank names are skipped: `address=//`
/// would match every domain.
pub fn render(domain: &str, target: &str, extra_domains: &[String]) -> String {
    let mut config = String::from(HEADER);
    config.push('\n');

    let mut seen: Vec<&str> = Vec::with_capacity(extra_domains.len() + 1);
    for name in std::iter::once(domain).chain(extra_domains.iter().map(String::as_str)) {
        let name = name.trim();
        if name.is_empty() || seen.contains(&name) {
            continue;
        }
        seen.push(name);
        config.push_str(&format!("address=/{}/{}\n", name, target));
    }

    config
}

/// The address DNS answers point at.
///
/// An empty `target` means the host itself; `lookup` finds its address and
/// loopback is used when it cannot.
pub fn resolve_target(target: &str, lookup: impl FnOnce() -> Option<IpAddr>) -> String {
    let target = target.trim();
    if !target.is_empty() {
        return target.to_string();
    }

    match lookup() {
        Some(ip) => ip.to_string(),
        None => {
            tracing::warn!("unable to determine host address, using {}", FALLBACK_TARGET);
            FALLBACK_TARGET.to_string()
        }
    }
}

/// Write `content` to `path`, readable by the resolver container.
pub fn write_config(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    // An existing file keeps its old mode on write.
    fs::set_permissions(path, fs::Permissions::from_mode(0o644))
}
