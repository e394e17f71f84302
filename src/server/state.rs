use crate::catalog::Catalogs;
use crate::config::ServiceConfig;
use crate::ingest::IngestPipeline;
use crate::proxy::{ProxyClient, ProxyError};
use std::sync::Arc;

/// Shared handler state. Cloning is cheap; every clone shares the same
/// collections and therefore the same writer locks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub catalogs: Catalogs,
    pub pipeline: Arc<IngestPipeline>,
    pub proxy: ProxyClient,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Result<Self, ProxyError> {
        let catalogs = Catalogs::open(&config.storage.data_dir);
        let pipeline = Arc::new(IngestPipeline::from_config(&config, &catalogs));
        let proxy = ProxyClient::new(&config.proxy)?;
        Ok(Self {
            config: Arc::new(config),
            catalogs,
            pipeline,
            proxy,
        })
    }
}
