//! Configuration for the MCP OAuth gateway.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;

/// Default values.
pub mod defaults {
    use std::time::Duration;

    /// Client id accepted when `OAUTH_CLIENT_ID` is not set.
    pub const CLIENT_ID: &str = "mcp-client";

    /// Bind address.
    pub const HOST: &str = "0.0.0.0";

    /// Bind port.
    pub const PORT: u16 = 8001;

    /// Scope granted when the authorization request names none.
    pub const SCOPE: &str = "mcp:read mcp:write";

    /// Scopes advertised in the discovery document.
    pub const SUPPORTED_SCOPES: &[&str] = &["mcp:read", "mcp:write"];

    /// Authorization code lifetime (10 minutes).
    pub const CODE_TTL: Duration = Duration::from_secs(600);

    /// Access token lifetime (1 hour).
    pub const TOKEN_TTL: Duration = Duration::from_secs(3600);

    /// Default result count for document search.
    pub const SEARCH_TOP_K: usize = 4;
}

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The single OAuth client allowed to use the gateway.
    pub client_id: String,

    /// Secret of that client.
    pub client_secret: String,

    /// Redirect URI the client must use, if pinned.
    pub allowed_redirect_uri: Option<String>,

    /// Bind host.
    pub host: String,

    /// Bind port.
    pub port: u16,

    /// Public base URL for the discovery document (derived from `Host` if unset).
    pub public_base_url: Option<String>,

    /// Authorization code lifetime.
    pub code_ttl: Duration,

    /// Access token lifetime.
    pub token_ttl: Duration,

    /// Scope used when the authorization request omits one.
    pub default_scope: String,

    /// Interval of the background credential sweep. `None` keeps expiry lazy.
    pub sweep_interval: Option<Duration>,

    /// Directory of processed `.txt` documents backing the document tools.
    pub documents_dir: Option<PathBuf>,
}

impl Config {
    /// Create a configuration for one client with default lifetimes.
    #[must_use]
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            allowed_redirect_uri: None,
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            public_base_url: None,
            code_ttl: defaults::CODE_TTL,
            token_ttl: defaults::TOKEN_TTL,
            default_scope: defaults::SCOPE.to_string(),
            sweep_interval: None,
            documents_dir: None,
        }
    }

    /// Create a test configuration with fixed credentials.
    #[must_use]
    pub fn for_testing() -> Self {
        let mut config = Self::new("test-client", "test-secret");
        config.host = "127.0.0.1".to_string();
        config.port = 0;
        config
    }

    /// Create configuration from environment variables.
    ///
    /// Reads the same variables as the binary's flags (see [`ConfigArgs`]).
    ///
    /// # Errors
    ///
    /// Returns error if `OAUTH_CLIENT_SECRET` is unset or a numeric variable
    /// does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        let args = ConfigArgs::try_parse_from([env!("CARGO_PKG_NAME")])
            .context("invalid gateway configuration in environment")?;
        Ok(args.into())
    }

    /// Authorization code lifetime as a `chrono` duration.
    #[must_use]
    pub fn code_lifetime(&self) -> chrono::Duration {
        to_chrono(self.code_ttl)
    }

    /// Access token lifetime as a `chrono` duration.
    #[must_use]
    pub fn token_lifetime(&self) -> chrono::Duration {
        to_chrono(self.token_ttl)
    }

    /// Check a pair of client credentials against the configured client.
    #[must_use]
    pub fn client_matches(&self, client_id: &str, client_secret: &str) -> bool {
        self.client_id == client_id && self.client_secret == client_secret
    }
}

/// Command-line and environment settings, shared by the binary and [`Config::from_env`].
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    /// Bind host
    #[arg(long, default_value = defaults::HOST, env = "HOST")]
    pub host: String,

    /// Bind port
    #[arg(long, default_value_t = defaults::PORT, env = "PORT")]
    pub port: u16,

    /// OAuth client id
    #[arg(long, default_value = defaults::CLIENT_ID, env = "OAUTH_CLIENT_ID")]
    pub client_id: String,

    /// OAuth client secret
    #[arg(long, env = "OAUTH_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Only redirect URI accepted by /oauth/authorize (any when unset)
    #[arg(long, env = "OAUTH_REDIRECT_URI")]
    pub redirect_uri: Option<String>,

    /// Public base URL for the discovery document (e.g., https://mcp.example.com)
    #[arg(long, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// Directory of processed .txt documents; enables the document tools
    #[arg(long, env = "DOCUMENTS_DIR")]
    pub documents_dir: Option<PathBuf>,

    /// Seconds between expired-credential sweeps (0 disables)
    #[arg(long, default_value_t = 0, env = "OAUTH_SWEEP_INTERVAL_SECS")]
    pub sweep_interval_secs: u64,
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        let mut config = Self::new(args.client_id, args.client_secret);
        config.host = args.host;
        config.port = args.port;
        config.allowed_redirect_uri = args.redirect_uri;
        config.public_base_url = args.base_url;
        config.documents_dir = args.documents_dir;
        config.sweep_interval =
            (args.sweep_interval_secs > 0).then(|| Duration::from_secs(args.sweep_interval_secs));
        config
    }
}

fn to_chrono(d: Duration) -> chrono::Duration {
    chrono::Duration::from_std(d).unwrap_or(chrono::Duration::MAX)
}
