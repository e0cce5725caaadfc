mod cli;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use clap::Parser;
use folio_app::modules::ebook::models::{PdfRequest, ZipRequest};
use folio_app::modules::ebook::{EbookService, Generated};
use folio_http::error::FieldError;
use folio_kernel::settings::Settings;
use serde::de::DeserializeOwned;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load folio settings")?;
    folio_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Commands::Serve => folio_app::serve(settings).await,
        Commands::Render { request, output } => {
            let service = EbookService::from_settings(&settings)?;
            let job = read_request::<PdfRequest>(&request)?
                .into_job(service.defaults())
                .map_err(invalid)?;
            let generated = service.generate_pdf(job).await?;
            write_output(generated, output)
        }
        Commands::Bundle { request, output } => {
            let service = EbookService::from_settings(&settings)?;
            let job = read_request::<ZipRequest>(&request)?
                .into_job(service.defaults())
                .map_err(invalid)?;
            let generated = service.generate_bundle(job).await?;
            write_output(generated, output)
        }
    }
}

fn read_request<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("request file {} is not a valid request", path.display()))
}

fn invalid(fields: Vec<FieldError>) -> anyhow::Error {
    let listed: Vec<String> = fields
        .iter()
        .map(|field| format!("{} ({})", field.field, field.error))
        .collect();
    anyhow!("invalid request fields: {}", listed.join(", "))
}

fn write_output(generated: Generated, output: Option<PathBuf>) -> anyhow::Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(&generated.filename));
    std::fs::write(&path, &generated.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = generated.bytes.len(), "wrote output");
    println!("{}", path.display());
    Ok(())
}
