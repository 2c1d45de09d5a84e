use pbmc_core::PbmcControlPlane;
use pbmc_core::upstream::{HttpFetcher, HttpFetcherConfig};

use crate::config::PbmcConfig;

pub type UpstreamControl = PbmcControlPlane<HttpFetcher>;

/// Builds the reqwest-backed control plane for the configured atlas.
pub fn build_control_plane(
    config: &PbmcConfig,
) -> Result<UpstreamControl, Box<dyn std::error::Error + Send + Sync>> {
    let fetcher_config = HttpFetcherConfig::new()
        .with_timeout(config.http_timeout)
        .with_user_agent(config.user_agent.clone());
    let fetcher = HttpFetcher::new(&fetcher_config)?;
    Ok(PbmcControlPlane::new(fetcher, config.upstream.clone()))
}
