use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// SQLite database connection URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Directory holding the seed CSV and Pinterest export files.
    /// When set, the catalog is (re)ingested at startup; when unset the
    /// database is assumed to be populated already.
    #[serde(default)]
    pub seed_dir: Option<String>,

    /// Images sampled per category during the refined similarity pass
    #[serde(default = "default_similarity_sample")]
    pub similarity_sample_per_category: u32,

    /// Same-category peers each sampled image is compared against
    #[serde(default = "default_similarity_peers")]
    pub similarity_peers_per_image: u32,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_database_url() -> String {
    "sqlite://data/bathscape.db".to_string()
}

fn default_similarity_sample() -> u32 {
    50
}

fn default_similarity_peers() -> u32 {
    20
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
