use std::path::PathBuf;
use std::str::FromStr;

/// Process configuration, read from `HALLBOOK_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    pub max_connections: usize,
    /// Prometheus exporter port; `None` leaves metrics uninstalled.
    pub metrics_port: Option<u16>,
    /// JSON hall catalog; `None` uses the built-in halls.
    pub catalog_path: Option<PathBuf>,
    pub max_line_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 7878,
            max_connections: 256,
            metrics_port: None,
            catalog_path: None,
            max_line_len: 64 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values fall back to the default for that key.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind: lookup("HALLBOOK_BIND").unwrap_or(defaults.bind),
            port: parse_var(&lookup, "HALLBOOK_PORT").unwrap_or(defaults.port),
            max_connections: parse_var(&lookup, "HALLBOOK_MAX_CONNECTIONS")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_connections),
            metrics_port: parse_var(&lookup, "HALLBOOK_METRICS_PORT"),
            catalog_path: lookup("HALLBOOK_CATALOG")
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            max_line_len: parse_var(&lookup, "HALLBOOK_MAX_LINE_LEN")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_line_len),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}
