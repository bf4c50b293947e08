use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::dns::constants::DNS_PORT;
use crate::error::ConfigError;

/// IPv4 addresses of the root servers a through j (IANA root hints).
pub const ROOT_HINTS: [Ipv4Addr; 10] = [
    Ipv4Addr::new(198, 41, 0, 4),
    Ipv4Addr::new(170, 247, 170, 2),
    Ipv4Addr::new(192, 33, 4, 12),
    Ipv4Addr::new(199, 7, 91, 13),
    Ipv4Addr::new(192, 203, 230, 10),
    Ipv4Addr::new(192, 5, 5, 241),
    Ipv4Addr::new(192, 112, 36, 4),
    Ipv4Addr::new(198, 97, 190, 53),
    Ipv4Addr::new(192, 36, 148, 17),
    Ipv4Addr::new(192, 58, 128, 30),
];

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Nameservers for stub resolution, tried in order
    pub nameservers: Vec<IpAddr>,

    /// Destination port for nameserver and root queries
    pub port: u16,

    /// Starting points for iterative resolution
    pub root_hints: Vec<Ipv4Addr>,

    /// Rate of the cache clock
    pub ticks_per_second: u64,

    /// Wait for the first attempt of an exchange
    pub initial_timeout: Duration,

    /// Upper bound for the doubled per-attempt wait
    pub max_timeout: Duration,

    /// Attempts per nameserver before moving on
    pub attempts: u32,

    /// CNAME follows allowed in one resolution
    pub max_cname_hops: usize,

    /// Delegation steps allowed in one iterative walk
    pub max_iterations: usize,

    /// Seconds a negative answer is remembered
    pub negative_ttl: u32,

    /// TTL given to answers served from the hosts table
    pub hosts_ttl: u32,

    pub hosts_path: PathBuf,

    pub resolv_conf_path: PathBuf,

    /// Whether `Resolver::from_config` loads hosts and resolv.conf at startup
    pub use_system_files: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            nameservers: vec![
                IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
                IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
            ],
            port: DNS_PORT,
            root_hints: ROOT_HINTS.to_vec(),
            ticks_per_second: 100,
            initial_timeout: Duration::from_secs(1),
            max_timeout: Duration::from_secs(8),
            attempts: 3,
            max_cname_hops: 10,
            max_iterations: 20,
            negative_ttl: 60,
            hosts_ttl: 3600,
            hosts_path: PathBuf::from("/etc/hosts"),
            resolv_conf_path: PathBuf::from("/etc/resolv.conf"),
            use_system_files: false,
        }
    }
}

impl ResolverConfig {
    /// Create a ResolverConfig from `WAYFINDER_*` environment variables
    /// Returns Err if critical configuration is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(servers) = lookup("WAYFINDER_NAMESERVERS") {
            let servers: Result<Vec<IpAddr>, _> = servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse::<IpAddr>()
                        .map_err(|_| ConfigError::InvalidNameserver(s.to_string()))
                })
                .collect();
            let servers = servers?;
            if servers.is_empty() {
                return Err(ConfigError::InvalidNameserver(
                    "No valid nameservers provided".to_string(),
                ));
            }
            config.nameservers = servers;
        }

        if let Some(port) = lookup("WAYFINDER_PORT") {
            config.port = port
                .parse::<u16>()
                .map_err(|_| ConfigError::ParseError(format!("Invalid port: {}", port)))?;
        }

        if let Some(timeout) = lookup("WAYFINDER_INITIAL_TIMEOUT_MS") {
            config.initial_timeout = parse_millis(&timeout)?;
        }

        if let Some(timeout) = lookup("WAYFINDER_MAX_TIMEOUT_MS") {
            config.max_timeout = parse_millis(&timeout)?;
        }

        if let Some(attempts) = lookup("WAYFINDER_ATTEMPTS") {
            config.attempts = attempts
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidRetries(attempts.clone()))?;
        }

        if let Some(tps) = lookup("WAYFINDER_TICKS_PER_SECOND") {
            config.ticks_per_second = tps
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTickRate(tps.clone()))?;
        }

        if let Some(hops) = lookup("WAYFINDER_MAX_CNAME_HOPS") {
            config.max_cname_hops = hops.parse::<usize>().map_err(|_| {
                ConfigError::ParseError(format!("Invalid max CNAME hops: {}", hops))
            })?;
        }

        if let Some(iterations) = lookup("WAYFINDER_MAX_ITERATIONS") {
            config.max_iterations = iterations.parse::<usize>().map_err(|_| {
                ConfigError::ParseError(format!("Invalid max iterations: {}", iterations))
            })?;
        }

        if let Some(ttl) = lookup("WAYFINDER_NEGATIVE_TTL") {
            config.negative_ttl = ttl
                .parse::<u32>()
                .map_err(|_| ConfigError::ParseError(format!("Invalid negative TTL: {}", ttl)))?;
        }

        if let Some(ttl) = lookup("WAYFINDER_HOSTS_TTL") {
            config.hosts_ttl = ttl
                .parse::<u32>()
                .map_err(|_| ConfigError::ParseError(format!("Invalid hosts TTL: {}", ttl)))?;
        }

        if let Some(path) = lookup("WAYFINDER_HOSTS_FILE") {
            config.hosts_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("WAYFINDER_RESOLV_CONF") {
            config.resolv_conf_path = PathBuf::from(path);
        }

        if let Some(use_system) = lookup("WAYFINDER_USE_SYSTEM_FILES") {
            config.use_system_files = parse_bool(&use_system, false);
        }

        // Validate the final configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticks_per_second == 0 {
            return Err(ConfigError::InvalidTickRate(
                "Ticks per second must be greater than 0".to_string(),
            ));
        }

        if self.initial_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "Initial timeout must be greater than 0".to_string(),
            ));
        }

        if self.max_timeout < self.initial_timeout {
            return Err(ConfigError::InvalidTimeout(format!(
                "Max timeout {:?} is below initial timeout {:?}",
                self.max_timeout, self.initial_timeout
            )));
        }

        if self.attempts == 0 || self.attempts > 10 {
            return Err(ConfigError::InvalidRetries(format!(
                "Attempts must be between 1 and 10, got {}",
                self.attempts
            )));
        }

        if self.max_iterations == 0 || self.max_iterations > 64 {
            return Err(ConfigError::ParseError(
                "Max iterations must be between 1 and 64".to_string(),
            ));
        }

        Ok(())
    }

    /// Wait before attempt `attempt` (0-based): initial timeout doubled per
    /// attempt, capped at the max timeout.
    pub fn attempt_timeout(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.initial_timeout
            .checked_mul(factor)
            .map_or(self.max_timeout, |t| t.min(self.max_timeout))
    }
}

fn parse_millis(value: &str) -> Result<Duration, ConfigError> {
    let millis = value
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidTimeout(value.to_string()))?;
    if millis == 0 {
        return Err(ConfigError::InvalidTimeout(
            "Timeout must be greater than 0".to_string(),
        ));
    }
    Ok(Duration::from_millis(millis))
}

/// Parse a boolean from a string, with a default value for invalid input
fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => default,
    }
}

/// Extract `nameserver <ip>` entries from resolv.conf text, in file order.
pub fn parse_resolv_conf(text: &str) -> Vec<IpAddr> {
    let mut servers = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut fields = line.split_whitespace();
        if fields.next() != Some("nameserver") {
            continue;
        }
        match fields.next().map(str::parse::<IpAddr>) {
            Some(Ok(ip)) => servers.push(ip),
            Some(Err(_)) | None => warn!("Ignoring malformed resolv.conf line: {}", line),
        }
    }
    servers
}
