use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use folio_http::download::Download;
use folio_http::error::AppError;

use super::models::{PdfRequest, ZipRequest};
use super::service::EbookService;

/// `POST /generate-pdf`
pub async fn generate_pdf(
    State(service): State<EbookService>,
    payload: Result<Json<PdfRequest>, JsonRejection>,
) -> Result<Download, AppError> {
    let Json(request) = payload?;
    let job = request
        .into_job(service.defaults())
        .map_err(AppError::invalid_fields)?;

    tracing::info!(
        title = %job.title,
        content_len = job.content.len(),
        keywords = job.keywords.len(),
        toc_items = job.toc.len(),
        infographics = job.infographic_urls.len(),
        "generating PDF"
    );

    let pdf = service.generate_pdf(job).await?;
    Ok(Download::pdf(pdf.bytes, pdf.filename))
}

/// `POST /generate-zip`
pub async fn generate_zip(
    State(service): State<EbookService>,
    payload: Result<Json<ZipRequest>, JsonRejection>,
) -> Result<Download, AppError> {
    let Json(request) = payload?;
    let job = request
        .into_job(service.defaults())
        .map_err(AppError::invalid_fields)?;

    tracing::info!(
        title = %job.document.title,
        content_len = job.document.content.len(),
        mockup = job.mockup_url.is_some(),
        blog_post = job.blog_post.is_some(),
        shop_description = job.shop_description.is_some(),
        "generating ZIP bundle"
    );

    let bundle = service.generate_bundle(job).await?;
    Ok(Download::zip(bundle.bytes, bundle.filename))
}
