// src/net.rs

//! Identify which configured node is the machine we are running on.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, ToSocketAddrs};

use tracing::{debug, warn};

use crate::config::Node;

/// Identity of the local machine used for node matching.
#[derive(Debug, Clone, Default)]
pub struct LocalIdentity {
    pub hostname: Option<String>,
    pub addresses: HashSet<IpAddr>,
}

impl LocalIdentity {
    /// Collect the machine's hostname and every address it is known by:
    /// loopback, the address of each network interface, and whatever the
    /// hostname resolves to.
    ///
    /// Does blocking I/O (interface enumeration, DNS). From async code use
    /// [`detect_local_node`].
    pub fn discover() -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok());

        let mut addresses = interface_addresses();
        if let Some(ref name) = hostname {
            addresses.extend(resolve(name));
        }

        Self::from_parts(hostname, addresses)
    }

    /// Identity built from known parts. Loopback addresses are always added.
    pub fn from_parts(
        hostname: Option<String>,
        addresses: impl IntoIterator<Item = IpAddr>,
    ) -> Self {
        let mut addresses: HashSet<IpAddr> = addresses.into_iter().collect();
        addresses.insert(IpAddr::V4(Ipv4Addr::LOCALHOST));
        addresses.insert(IpAddr::V6(Ipv6Addr::LOCALHOST));

        debug!(?hostname, ?addresses, "discovered local identity");
        Self {
            hostname,
            addresses,
        }
    }

    /// Whether `host` (a hostname or IP literal) refers to this machine.
    pub fn is_local_host(&self, host: &str) -> bool {
        let host = host.trim();
        if host.eq_ignore_ascii_case("localhost") {
            return true;
        }
        if let Some(ref name) = self.hostname {
            if host.eq_ignore_ascii_case(name) {
                return true;
            }
        }
        // IPv6 literals may be written bracketed, as in URLs.
        let literal = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if let Ok(ip) = literal.parse::<IpAddr>() {
            return self.addresses.contains(&ip);
        }
        resolve(host).iter().any(|ip| self.addresses.contains(ip))
    }
}

fn resolve(host: &str) -> Vec<IpAddr> {
    match (host, 0).to_socket_addrs() {
        Ok(addrs) => addrs.map(|a| a.ip()).collect(),
        Err(e) => {
            debug!(host = %host, error = %e, "could not resolve host");
            Vec::new()
        }
    }
}

/// Addresses of every network interface, IPv4 and IPv6.
fn interface_addresses() -> Vec<IpAddr> {
    match if_addrs::get_if_addrs() {
        Ok(ifaces) => ifaces
            .into_iter()
            .map(|iface| {
                debug!(interface = %iface.name, ip = %iface.ip(), "found interface address");
                iface.ip()
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "could not enumerate network interfaces");
            Vec::new()
        }
    }
}

/// Pick the single node whose host is local.
///
/// No match or several matches both yield `None`.
pub fn select_local_node(nodes: &[Node], identity: &LocalIdentity) -> Option<Node> {
    let matches: Vec<&Node> = nodes
        .iter()
        .filter(|node| identity.is_local_host(&node.host))
        .collect();

    match matches.as_slice() {
        [] => None,
        [node] => Some((*node).clone()),
        many => {
            let names: Vec<_> = many.iter().map(|n| n.name.as_str()).collect();
            warn!(?names, "several nodes match this machine; treating none as local");
            None
        }
    }
}

/// Discover the local identity and select the local node from `nodes`.
pub fn find_local_node(nodes: &[Node]) -> Option<Node> {
    if nodes.is_empty() {
        return None;
    }
    select_local_node(nodes, &LocalIdentity::discover())
}

/// [`find_local_node`] on the blocking thread pool, for use inside the
/// runtime.
pub async fn detect_local_node(nodes: Vec<Node>) -> Option<Node> {
    match tokio::task::spawn_blocking(move || find_local_node(&nodes)).await {
        Ok(node) => node,
        Err(e) => {
            warn!(error = %e, "local node detection did not complete");
            None
        }
    }
}
