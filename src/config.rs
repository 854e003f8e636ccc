use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub warehouse: WarehouseConfig,
    pub cache: CacheConfig,
    pub llm: LlmConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Metadata store (questions and insights)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL; empty disables persistence (questions stay in memory)
    pub url: String,
    /// Connection pool size (default: 5)
    pub pool_size: u32,
    /// Per-operation timeout in seconds (default: 2)
    pub timeout_secs: u64,
}

/// Columnar analytical warehouse (read-only)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// MySQL-protocol URL; empty disables the adapter (all reads come back empty)
    pub url: String,
    /// Connection pool size (default: 10)
    pub pool_size: u32,
    /// Per-query timeout in seconds (default: 10)
    pub timeout_secs: u64,
}

/// Response cache (Redis)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Redis URL; empty disables the cache (every lookup is a miss)
    pub url: String,
    /// Default TTL in seconds for unnamespaced entries (default: 3600)
    pub default_ttl_secs: u64,
    /// Per-operation timeout in milliseconds (default: 100)
    pub timeout_ms: u64,
}

/// Outbound LLM channel
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key; empty disables the gateway and forces the fallback path
    pub api_key: String,
    /// OpenAI-compatible endpoint base
    pub api_base: String,
    pub model: String,
    /// Ledger rate in dollars per 1k tokens (default: 0.002)
    pub cost_per_1k_tokens: f64,
    /// Minimum spacing between outbound requests in milliseconds (default: 100)
    pub min_interval_ms: u64,
    /// Request timeout in seconds, including any rate-limit wait (default: 30)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Overall cap per process() call in seconds (default: 60)
    pub timeout_secs: u64,
}

/// Command line arguments for configuration overrides
#[derive(Parser, Debug, Clone)]
#[command(name = "prism")]
#[command(version, about = "Prism - Natural Language Business Intelligence")]
pub struct CommandLineArgs {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Server host (overrides config file)
    #[arg(long, value_name = "HOST")]
    pub server_host: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Metadata database URL (overrides config file)
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Warehouse URL (overrides config file)
    #[arg(long, value_name = "URL")]
    pub warehouse_url: Option<String>,

    /// Cache URL (overrides config file)
    #[arg(long, value_name = "URL")]
    pub cache_url: Option<String>,

    /// Logging level (overrides config file, e.g., "info,prism=debug")
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with command line, environment variable, and file support
    ///
    /// Loading order (priority from highest to lowest):
    /// 1. Command line arguments
    /// 2. Environment variables
    /// 3. Configuration file (config.toml)
    /// 4. Default values
    pub fn load() -> Result<Self, anyhow::Error> {
        let cli_args = CommandLineArgs::parse();
        Self::load_with_args(&cli_args)
    }

    /// Load without touching process arguments (for tests and embedding)
    pub fn load_with_args(cli_args: &CommandLineArgs) -> Result<Self, anyhow::Error> {
        // 1. Load from config file (use CLI --config if provided, otherwise find default)
        let config_path = cli_args.config.clone().or_else(Self::find_config_file);
        let mut config = if let Some(config_path) = config_path {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        // 2. Override with environment variables
        config.apply_env_overrides();

        // 3. Override with command line arguments (highest priority)
        config.apply_cli_overrides(cli_args);

        // 4. Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT: bind address
    /// - APP_LOG_LEVEL: logging level (e.g., "info,prism=debug")
    /// - METADATA_DB_URL: metadata store URL; unset/empty keeps questions in memory
    /// - WAREHOUSE_URL: analytical store URL; unset/empty forces empty contexts
    /// - CACHE_URL: Redis URL; unset/empty disables caching
    /// - CACHE_DEFAULT_TTL_S: default cache TTL in seconds
    /// - LLM_API_KEY: credential; unset/empty forces the fallback path
    /// - LLM_API_BASE / LLM_MODEL: provider endpoint and model
    /// - LLM_COST_PER_1K_TOKENS: ledger rate
    /// - LLM_MIN_INTERVAL_MS: inter-request spacing
    /// - REQUEST_TIMEOUT_S: overall cap per pipeline run
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(db_url) = std::env::var("METADATA_DB_URL") {
            self.database.url = db_url;
            tracing::info!("Override database.url from env");
        }

        if let Ok(url) = std::env::var("WAREHOUSE_URL") {
            self.warehouse.url = url;
            tracing::info!("Override warehouse.url from env");
        }

        if let Ok(url) = std::env::var("CACHE_URL") {
            self.cache.url = url;
            tracing::info!("Override cache.url from env");
        }

        if let Ok(ttl) = std::env::var("CACHE_DEFAULT_TTL_S") {
            match ttl.parse() {
                Ok(val) => {
                    self.cache.default_ttl_secs = val;
                    tracing::info!(
                        "Override cache.default_ttl_secs from env: {}",
                        self.cache.default_ttl_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid CACHE_DEFAULT_TTL_S '{}': {} (keep {})",
                    ttl,
                    e,
                    self.cache.default_ttl_secs
                ),
            }
        }

        if let Ok(key) = std::env::var("LLM_API_KEY") {
            self.llm.api_key = key;
            tracing::info!("Override llm.api_key from env");
        }

        if let Ok(base) = std::env::var("LLM_API_BASE") {
            self.llm.api_base = base;
            tracing::info!("Override llm.api_base from env: {}", self.llm.api_base);
        }

        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
            tracing::info!("Override llm.model from env: {}", self.llm.model);
        }

        if let Ok(cost) = std::env::var("LLM_COST_PER_1K_TOKENS") {
            match cost.parse() {
                Ok(val) => {
                    self.llm.cost_per_1k_tokens = val;
                    tracing::info!(
                        "Override llm.cost_per_1k_tokens from env: {}",
                        self.llm.cost_per_1k_tokens
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid LLM_COST_PER_1K_TOKENS '{}': {} (keep {})",
                    cost,
                    e,
                    self.llm.cost_per_1k_tokens
                ),
            }
        }

        if let Ok(interval) = std::env::var("LLM_MIN_INTERVAL_MS") {
            match interval.parse() {
                Ok(val) => {
                    self.llm.min_interval_ms = val;
                    tracing::info!(
                        "Override llm.min_interval_ms from env: {}",
                        self.llm.min_interval_ms
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid LLM_MIN_INTERVAL_MS '{}': {} (keep {})",
                    interval,
                    e,
                    self.llm.min_interval_ms
                ),
            }
        }

        if let Ok(timeout) = std::env::var("REQUEST_TIMEOUT_S") {
            match timeout.parse() {
                Ok(val) => {
                    self.request.timeout_secs = val;
                    tracing::info!(
                        "Override request.timeout_secs from env: {}",
                        self.request.timeout_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid REQUEST_TIMEOUT_S '{}': {} (keep {})",
                    timeout,
                    e,
                    self.request.timeout_secs
                ),
            }
        }
    }

    /// Apply command line argument overrides (highest priority)
    fn apply_cli_overrides(&mut self, args: &CommandLineArgs) {
        if let Some(host) = &args.server_host {
            self.server.host = host.clone();
            tracing::info!("Override server.host from CLI: {}", self.server.host);
        }

        if let Some(port) = args.server_port {
            self.server.port = port;
            tracing::info!("Override server.port from CLI: {}", self.server.port);
        }

        if let Some(db_url) = &args.database_url {
            self.database.url = db_url.clone();
            tracing::info!("Override database.url from CLI");
        }

        if let Some(url) = &args.warehouse_url {
            self.warehouse.url = url.clone();
            tracing::info!("Override warehouse.url from CLI");
        }

        if let Some(url) = &args.cache_url {
            self.cache.url = url.clone();
            tracing::info!("Override cache.url from CLI");
        }

        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
            tracing::info!("Override logging.level from CLI: {}", self.logging.level);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if self.llm.api_key.is_empty() {
            tracing::warn!("LLM_API_KEY not set; intent and insights will use fallbacks");
        }

        if self.llm.cost_per_1k_tokens < 0.0 {
            anyhow::bail!("llm.cost_per_1k_tokens must be >= 0");
        }

        if self.request.timeout_secs == 0 {
            anyhow::bail!("request.timeout_secs must be > 0");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { url: "sqlite://data/prism.db".to_string(), pool_size: 5, timeout_secs: 2 }
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self { url: String::new(), pool_size: 10, timeout_secs: 10 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { url: String::new(), default_ttl_secs: 3600, timeout_ms: 100 }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            cost_per_1k_tokens: 0.002,
            min_interval_ms: 100,
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,prism=debug".to_string(), file: Some("logs/prism.log".to_string()) }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { timeout_secs: 60 }
    }
}
