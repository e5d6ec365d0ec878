use std::env;
use std::fmt::Display;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::packer::PackingConfig;
use crate::selection::Selection;

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub catalog: CatalogConfig,
    pub packing: PackingSettings,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(&|name: &str| env::var(name).ok())
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Self {
        let source = Source { lookup };
        Self {
            api: ApiConfig::from_source(&source),
            catalog: CatalogConfig::from_source(&source),
            packing: PackingSettings::from_source(&source),
        }
    }
}

/// Variable lookup with trimming; empty values count as unset.
struct Source<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Source<'_> {
    fn string(&self, name: &str) -> Option<String> {
        let value = (self.lookup)(name)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    }

    /// Parses and validates a value, falling back to `default` with a warning.
    fn parsed<T>(&self, name: &str, default: T, validator: impl Fn(&T) -> bool, hint: &str) -> T
    where
        T: FromStr + Display + Copy,
        T::Err: Display,
    {
        let Some(raw) = self.string(name) else {
            return default;
        };
        match raw.parse::<T>() {
            Ok(value) if validator(&value) => value,
            Ok(_) => {
                warn!(var = name, value = %raw, "invalid value: {hint}, using {default}");
                default
            }
            Err(err) => {
                warn!(var = name, value = %raw, error = %err, "could not parse value, using {default}");
                default
            }
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
    const HOST_VAR: &'static str = "PACK_IT_NOW_API_HOST";
    const PORT_VAR: &'static str = "PACK_IT_NOW_API_PORT";
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_source(source: &Source<'_>) -> Self {
        let default_ip = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
        let (bind_ip, display_host) = match source.string(Self::HOST_VAR) {
            Some(host) => match host.parse::<IpAddr>() {
                Ok(ip) => (ip, host),
                Err(err) => {
                    warn!(
                        var = Self::HOST_VAR,
                        value = %host,
                        error = %err,
                        "could not parse host, using {}",
                        Self::DEFAULT_HOST
                    );
                    (default_ip, Self::DEFAULT_HOST.to_string())
                }
            },
            None => (default_ip, Self::DEFAULT_HOST.to_string()),
        };

        let port = source.parsed(
            Self::PORT_VAR,
            Self::DEFAULT_PORT,
            |port| *port != 0,
            "must not be 0",
        );

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
}

/// Locations of the product and box catalogs; `None` selects the built-in data.
#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    pub products_file: Option<PathBuf>,
    pub boxes_file: Option<PathBuf>,
}

impl CatalogConfig {
    const PRODUCTS_FILE_VAR: &'static str = "PACK_IT_NOW_PRODUCTS_FILE";
    const BOXES_FILE_VAR: &'static str = "PACK_IT_NOW_BOXES_FILE";

    fn from_source(source: &Source<'_>) -> Self {
        Self {
            products_file: source.string(Self::PRODUCTS_FILE_VAR).map(PathBuf::from),
            boxes_file: source.string(Self::BOXES_FILE_VAR).map(PathBuf::from),
        }
    }
}

/// Settings for the packing engine and the request-side unit cap.
#[derive(Clone, Copy, Debug)]
pub struct PackingSettings {
    max_units: u32,
    packing: PackingConfig,
}

impl PackingSettings {
    const MAX_UNITS_VAR: &'static str = "PACK_IT_NOW_MAX_UNITS";
    const EPSILON_VAR: &'static str = "PACK_IT_NOW_PACKING_EPSILON";

    fn from_source(source: &Source<'_>) -> Self {
        let max_units = source.parsed(
            Self::MAX_UNITS_VAR,
            Selection::DEFAULT_MAX_UNITS,
            |value| *value > 0,
            "must be greater than 0",
        );

        let general_epsilon = source.parsed(
            Self::EPSILON_VAR,
            PackingConfig::DEFAULT_GENERAL_EPSILON,
            |value: &f64| value.is_finite() && *value > 0.0,
            "must be greater than 0",
        );

        Self {
            max_units,
            packing: PackingConfig::builder()
                .general_epsilon(general_epsilon)
                .build(),
        }
    }

    /// Maximum number of units accepted in a single request.
    pub fn max_units(&self) -> u32 {
        self.max_units
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

impl Default for PackingSettings {
    fn default() -> Self {
        Self {
            max_units: Selection::DEFAULT_MAX_UNITS,
            packing: PackingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(&|name: &str| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]);
        assert_eq!(config.api.port(), 8080);
        assert_eq!(config.api.display_host(), "0.0.0.0");
        assert!(config.api.binds_to_all_interfaces());
        assert!(config.catalog.products_file.is_none());
        assert!(config.catalog.boxes_file.is_none());
        assert_eq!(config.packing.max_units(), 10);
        assert_eq!(
            config.packing.packing_config().general_epsilon,
            PackingConfig::DEFAULT_GENERAL_EPSILON
        );
    }

    #[test]
    fn test_reads_values() {
        let config = config_from(&[
            ("PACK_IT_NOW_API_HOST", "127.0.0.1"),
            ("PACK_IT_NOW_API_PORT", " 9090 "),
            ("PACK_IT_NOW_BOXES_FILE", "/etc/pack/boxes.json"),
            ("PACK_IT_NOW_MAX_UNITS", "25"),
            ("PACK_IT_NOW_PACKING_EPSILON", "0.001"),
        ]);
        assert_eq!(config.api.socket_addr(), "127.0.0.1:9090".parse::<SocketAddr>().unwrap());
        assert!(!config.api.binds_to_all_interfaces());
        assert_eq!(
            config.catalog.boxes_file,
            Some(PathBuf::from("/etc/pack/boxes.json"))
        );
        assert_eq!(config.packing.max_units(), 25);
        assert_eq!(config.packing.packing_config().general_epsilon, 0.001);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_from(&[
            ("PACK_IT_NOW_API_HOST", "not-an-ip"),
            ("PACK_IT_NOW_API_PORT", "0"),
            ("PACK_IT_NOW_MAX_UNITS", "-3"),
            ("PACK_IT_NOW_PACKING_EPSILON", "NaN"),
        ]);
        assert_eq!(config.api.display_host(), "0.0.0.0");
        assert_eq!(config.api.port(), 8080);
        assert_eq!(config.packing.max_units(), 10);
        assert_eq!(
            config.packing.packing_config().general_epsilon,
            PackingConfig::DEFAULT_GENERAL_EPSILON
        );
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = config_from(&[("PACK_IT_NOW_PRODUCTS_FILE", "   ")]);
        assert!(config.catalog.products_file.is_none());
    }
}
