use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{info, warn};

use crate::normalizer::normalize_pack_sizes;
use crate::optimizer::PlanningConfig;
use crate::registry::PackSizeRegistry;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub planner: PlannerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            planner: PlannerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;
    const HOST_VAR: &'static str = "PACK_PLANNER_API_HOST";
    const PORT_VAR: &'static str = "PACK_PLANNER_API_PORT";
    const PLATFORM_PORT_VAR: &'static str = "PORT";

    fn from_env() -> Self {
        let host_value = env_string(Self::HOST_VAR);
        let port_value = env_string(Self::PORT_VAR)
            .map(|raw| (Self::PORT_VAR, raw))
            .or_else(|| {
                env_string(Self::PLATFORM_PORT_VAR).map(|raw| (Self::PLATFORM_PORT_VAR, raw))
            });
        Self::from_values(host_value, port_value)
    }

    fn from_values(host_value: Option<String>, port_value: Option<(&str, String)>) -> Self {
        let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let (bind_ip, display_host) = match host_value {
            Some(host) => match host.parse::<IpAddr>() {
                Ok(ip) => (ip, host),
                Err(err) => {
                    warn!(
                        "⚠️ Could not parse {} ('{}'): {}. Using {}.",
                        Self::HOST_VAR,
                        host,
                        err,
                        Self::DEFAULT_HOST
                    );
                    (default_ip, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (default_ip, Self::DEFAULT_HOST.to_string()),
        };

        let port = match port_value {
            Some((var_name, raw)) => parse_port(&raw, var_name).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    /// Configured port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for pack planning: startup pack sizes and table limits.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    default_pack_sizes: Vec<i64>,
    planning: PlanningConfig,
}

impl PlannerConfig {
    const PACK_SIZES_VAR: &'static str = "PACK_PLANNER_DEFAULT_PACK_SIZES";
    const MAX_TABLE_ENTRIES_VAR: &'static str = "PACK_PLANNER_MAX_TABLE_ENTRIES";

    fn from_env() -> Self {
        Self::from_values(
            env_string(Self::PACK_SIZES_VAR),
            env_string(Self::MAX_TABLE_ENTRIES_VAR),
        )
    }

    fn from_values(pack_sizes: Option<String>, max_table_entries: Option<String>) -> Self {
        let default_pack_sizes = pack_sizes
            .and_then(|raw| parse_pack_size_list(&raw, Self::PACK_SIZES_VAR))
            .unwrap_or_else(|| PackSizeRegistry::DEFAULT_PACK_SIZES.to_vec());

        let max_table_entries = max_table_entries
            .and_then(|raw| parse_table_entries(&raw, Self::MAX_TABLE_ENTRIES_VAR))
            .unwrap_or(PlanningConfig::DEFAULT_MAX_TABLE_ENTRIES);
        if max_table_entries != PlanningConfig::DEFAULT_MAX_TABLE_ENTRIES {
            info!(
                "⚠️ Table size ceiling adjusted ({} = {}); large orders may be rejected or slow",
                Self::MAX_TABLE_ENTRIES_VAR,
                max_table_entries
            );
        }

        let planning = PlanningConfig::builder()
            .max_table_entries(max_table_entries)
            .build();

        Self {
            default_pack_sizes,
            planning,
        }
    }

    /// Pack sizes the registry starts with.
    pub fn default_pack_sizes(&self) -> &[i64] {
        &self.default_pack_sizes
    }

    /// Returns the configured PlanningConfig.
    pub fn planning_config(&self) -> PlanningConfig {
        self.planning
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("⚠️ Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_port(raw: &str, var_name: &str) -> Option<u16> {
    match raw.trim().parse::<u16>() {
        Ok(0) => {
            warn!("⚠️ {} must not be 0. Using default port.", var_name);
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using default port.",
                var_name, raw, err
            );
            None
        }
    }
}

fn parse_table_entries(raw: &str, var_name: &str) -> Option<usize> {
    match raw.trim().replace('_', "").parse::<usize>() {
        Ok(0) => {
            warn!(
                "⚠️ {} must be greater than 0. Using default value.",
                var_name
            );
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}') as number: {}. Using default value.",
                var_name, raw, err
            );
            None
        }
    }
}

/// Parses a comma-separated list of pack sizes and checks it would normalize.
fn parse_pack_size_list(raw: &str, var_name: &str) -> Option<Vec<i64>> {
    let parsed = raw
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::parse::<i64>)
        .collect::<Result<Vec<_>, _>>();

    let sizes = match parsed {
        Ok(sizes) => sizes,
        Err(err) => {
            warn!(
                "⚠️ Could not parse {} ('{}'): {}. Using default pack sizes.",
                var_name, raw, err
            );
            return None;
        }
    };

    match normalize_pack_sizes(&sizes) {
        Ok(_) => Some(sizes),
        Err(err) => {
            warn!(
                "⚠️ {} contains invalid pack sizes: {}. Using default pack sizes.",
                var_name, err
            );
            None
        }
    }
}
