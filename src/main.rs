use anyhow::Context;
use folio_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load folio settings")?;
    folio_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        strict_fetch = settings.fetch.strict,
        "folio-app bootstrap starting"
    );

    folio_app::serve(settings).await
}
