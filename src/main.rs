use std::sync::Arc;

use clap::Parser;
use lmg::{
    app_context::AppContext,
    config::GatewayConfig,
    logging::{init_logging, LoggingConfig},
    server,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::parse();

    init_logging(&LoggingConfig {
        level: config.log_level.clone(),
        json_format: config.log_json,
    })?;

    let ctx = Arc::new(AppContext::new(config)?);
    server::serve(ctx).await
}
