//! Runtime configuration, read from the environment the Functions host prepares.

use std::{
    env,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    str::FromStr,
};

/// Port the host expects the custom handler to listen on.
pub const PORT_VAR: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";
/// Address to bind, for running outside the host.
pub const BIND_ADDR_VAR: &str = "AZFN_BIND_ADDR";
/// How multiple assignments to one output binding are reported.
pub const OUTPUT_MODE_VAR: &str = "AZFN_OUTPUT_MODE";

const DEFAULT_PORT: u16 = 8080;

/// Errors raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable was set to something that cannot be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        /// Name of the offending variable.
        var: &'static str,
        /// The value found.
        value: String,
        /// What was expected instead.
        reason: String,
    },
}

/// What the host receives for an output binding assigned more than once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// The binding is a single-value slot: only the last assignment is reported.
    #[default]
    Last,
    /// Every assignment is reported, in order, as a JSON array.
    All,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "last" => Ok(OutputMode::Last),
            "all" => Ok(OutputMode::All),
            _ => Err("expected one of: last, all".to_string()),
        }
    }
}

/// Configuration of the runtime.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Address the invocation server binds to.
    pub addr: SocketAddr,
    /// Reporting policy for multi-write output bindings.
    pub output_mode: OutputMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), DEFAULT_PORT),
            output_mode: OutputMode::default(),
        }
    }
}

impl Config {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Reads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let port = parse_var(&lookup, PORT_VAR)?.unwrap_or(DEFAULT_PORT);
        let ip = parse_var(&lookup, BIND_ADDR_VAR)?.unwrap_or_else(|| defaults.addr.ip());
        let output_mode = parse_var(&lookup, OUTPUT_MODE_VAR)?.unwrap_or(defaults.output_mode);

        Ok(Config {
            addr: SocketAddr::new(ip, port),
            output_mode,
        })
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: ToString,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
    }
}
