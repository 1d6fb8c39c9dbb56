use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use domain_nfts::{EmbeddingConfig, MoralisConfig, PineconeConfig, PipelineConfig};

// Import MongoDB config from the database library
use database::mongodb::MongoConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application-specific configuration
/// Composes shared config components with the NFT domain's client settings
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    pub moralis: MoralisConfig,
    pub embedding: EmbeddingConfig,
    pub pinecone: PineconeConfig,
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let app = app_info!();
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?.with_app_name(app.name);
        let server = ServerConfig::from_env()?;

        Ok(Self {
            app,
            mongodb,
            server,
            environment,
            moralis: MoralisConfig::from_env()?,
            embedding: EmbeddingConfig::from_env()?,
            pinecone: PineconeConfig::from_env()?,
            pipeline: PipelineConfig::from_env()?,
        })
    }
}
