//! `/etc/hosts` style static name table.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, trace};

use crate::dns::name::names_equal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostsEntry {
    pub address: IpAddr,
    /// Canonical name first, then aliases, as written in the file.
    pub names: Vec<String>,
}

/// Parsed hosts table. Lookups return the first matching line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostsFile {
    entries: Vec<HostsEntry>,
}

impl HostsFile {
    pub fn new(entries: Vec<HostsEntry>) -> Self {
        Self { entries }
    }

    /// Parse hosts-file text. Comments start with `#`; malformed lines are skipped.
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();

        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let Some(address) = fields.next() else {
                continue;
            };
            let Ok(address) = address.parse::<IpAddr>() else {
                trace!("Skipping hosts line {}: bad address {:?}", line_no + 1, address);
                continue;
            };

            let names: Vec<String> = fields.map(|n| n.trim_end_matches('.').to_string()).collect();
            if names.is_empty() {
                continue;
            }
            entries.push(HostsEntry { address, names });
        }

        debug!("Loaded {} hosts entries", entries.len());
        Self { entries }
    }

    pub fn entries(&self) -> &[HostsEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, name: &str, want: impl Fn(&IpAddr) -> bool) -> Option<IpAddr> {
        self.entries
            .iter()
            .filter(|e| want(&e.address))
            .find(|e| e.names.iter().any(|n| names_equal(n, name)))
            .map(|e| e.address)
    }

    pub fn lookup_v4(&self, name: &str) -> Option<Ipv4Addr> {
        match self.find(name, IpAddr::is_ipv4)? {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        }
    }

    pub fn lookup_v6(&self, name: &str) -> Option<Ipv6Addr> {
        match self.find(name, IpAddr::is_ipv6)? {
            IpAddr::V6(ip) => Some(ip),
            IpAddr::V4(_) => None,
        }
    }
}
