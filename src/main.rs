mod telemetry;

use anyhow::Context;
use tracing::info;

use crate::telemetry::{Telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; a malformed one is not.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("failed to load .env");
        }
    }

    let telemetry = Telemetry::init(TelemetryConfig::from_env())?;
    info!(target: "atlas", filter = telemetry.filter(), "starting atlas backend");

    api::start(api::ApiConfig::from_env())
        .await
        .context("api server failed")?;
    Ok(())
}
