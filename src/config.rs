use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// PostgreSQL database connection URL. Recipes are kept in memory when unset.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Redis connection URL. The top-rated cache is disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory recipe photos are written to
    #[serde(default = "default_file_upload_path")]
    pub file_upload_path: String,

    /// Maximum accepted photo size in bytes
    #[serde(default = "default_max_file_upload")]
    pub max_file_upload: u64,

    /// Lifetime of the cached top-rated listing in seconds
    #[serde(default = "default_top_rated_cache_ttl")]
    pub top_rated_cache_ttl: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_file_upload_path() -> String {
    "./public/uploads".to_string()
}

fn default_max_file_upload() -> u64 {
    1_000_000
}

fn default_top_rated_cache_ttl() -> u64 {
    300
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Socket address the HTTP server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
