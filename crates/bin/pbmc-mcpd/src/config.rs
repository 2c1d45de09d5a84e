use clap::{Parser, builder::BoolishValueParser};
use pbmc_core::query::UpstreamUrls;
use pbmc_model::schema::{DEFAULT_API_DOCS_URL, DEFAULT_API_URL};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_MCP_HTTP_ADDR: &str = "127.0.0.1:3002";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USER_AGENT: &str = concat!("pbmc-mcpd/", env!("CARGO_PKG_VERSION"));
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "pbmc-mcpd", version, about = "PBMCpedia atlas MCP daemon.")]
struct CliArgs {
    #[arg(long, env = "PBMC_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[arg(long, env = "PBMC_API_DOCS_URL", default_value = DEFAULT_API_DOCS_URL)]
    api_docs_url: String,

    #[arg(
        long = "stdio",
        env = "PBMC_ENABLE_STDIO",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    enable_stdio: bool,

    #[arg(long, env = "PBMC_MCP_HTTP_ADDR", default_value = DEFAULT_MCP_HTTP_ADDR)]
    mcp_http_addr: SocketAddr,

    #[arg(
        long,
        env = "PBMC_MCP_STATEFUL",
        default_value_t = false,
        value_parser = BoolishValueParser::new()
    )]
    mcp_stateful: bool,

    #[arg(
        long,
        env = "PBMC_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_HTTP_TIMEOUT_SECS
    )]
    http_timeout_secs: u64,

    #[arg(long, env = "PBMC_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    #[arg(long, env = "PBMC_LOG", default_value = DEFAULT_LOG_FILTER)]
    log: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct PbmcConfig {
    pub upstream: UpstreamUrls,
    pub enable_stdio: bool,
    pub mcp_http_addr: SocketAddr,
    pub mcp_stateful: bool,
    pub http_timeout: Duration,
    pub user_agent: String,
    pub log_filter: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name} value: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

impl PbmcConfig {
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }
}

fn validate_base_url(name: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    let has_host = ["http://", "https://"]
        .iter()
        .find_map(|scheme| trimmed.strip_prefix(scheme))
        .is_some_and(|rest| !rest.is_empty());
    if !has_host {
        return Err(ConfigError::InvalidSetting { name, value });
    }
    Ok(trimmed.to_string())
}

impl TryFrom<CliArgs> for PbmcConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let api_url = validate_base_url("PBMC_API_URL", args.api_url)?;
        let api_docs_url = validate_base_url("PBMC_API_DOCS_URL", args.api_docs_url)?;

        if args.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "PBMC_HTTP_TIMEOUT_SECS",
                value: args.http_timeout_secs.to_string(),
            });
        }

        if args.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidSetting {
                name: "PBMC_USER_AGENT",
                value: args.user_agent,
            });
        }

        Ok(Self {
            upstream: UpstreamUrls::new(api_url, api_docs_url),
            enable_stdio: args.enable_stdio,
            mcp_http_addr: args.mcp_http_addr,
            mcp_stateful: args.mcp_stateful,
            http_timeout: Duration::from_secs(args.http_timeout_secs),
            user_agent: args.user_agent,
            log_filter: args.log,
        })
    }
}
