//! Ebook generation endpoints: Markdown in, PDF or ZIP bundle out.

pub mod archive;
pub mod assets;
pub mod models;
pub mod routes;
pub mod service;

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::{routing::post, Router};
use folio_kernel::{InitCtx, Module};

pub use service::{EbookService, Generated, ServiceError};

/// Serves `/generate-pdf` and `/generate-zip` at the root path.
pub struct EbookModule {
    service: OnceLock<EbookService>,
}

impl EbookModule {
    /// A module whose service is built from settings during `init`.
    pub fn new() -> Self {
        Self {
            service: OnceLock::new(),
        }
    }

    /// A module with a ready service, used by tests and the CLI.
    pub fn with_service(service: EbookService) -> Self {
        Self {
            service: OnceLock::from(service),
        }
    }
}

impl Default for EbookModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for EbookModule {
    fn name(&self) -> &'static str {
        "ebook"
    }

    fn base_path(&self) -> Option<&'static str> {
        Some("/")
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        if self.service.get().is_none() {
            let service = EbookService::from_settings(ctx.settings)?;
            // A concurrent init losing the race keeps the first service.
            let _ = self.service.set(service);
        }

        tracing::info!(
            module = self.name(),
            strict_fetch = ctx.settings.fetch.strict,
            bold_mode = ?ctx.settings.formatting.bold_mode,
            "ebook module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        let Some(service) = self.service.get() else {
            tracing::error!(module = self.name(), "routes requested before init, nothing mounted");
            return Router::new();
        };

        Router::new()
            .route("/generate-pdf", post(routes::generate_pdf))
            .route("/generate-zip", post(routes::generate_zip))
            .with_state(service.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let toc_item = serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "page": { "type": "integer", "minimum": 0 }
            },
            "required": ["title", "page"]
        });
        let document_properties = serde_json::json!({
            "content": { "type": "string", "description": "Markdown body" },
            "title": { "type": "string" },
            "subtitle": { "type": "string", "default": "Poradnik" },
            "author": { "type": "string", "default": "FOTZ Studio" },
            "toc_items": { "type": "array", "items": { "$ref": "#/components/schemas/TocItem" } },
            "keywords_to_bold": { "type": "array", "items": { "type": "string" } },
            "cover_url": { "type": "string", "format": "uri" },
            "infographic_urls": { "type": "array", "items": { "type": "string", "format": "uri" } },
            "logo_url": { "type": "string", "format": "uri" }
        });

        let mut zip_properties = document_properties.clone();
        if let Some(properties) = zip_properties.as_object_mut() {
            properties.insert(
                "pdf_content".to_string(),
                serde_json::json!({ "type": "string", "description": "Legacy name of content" }),
            );
            properties.insert("mockup_url".to_string(), serde_json::json!({ "type": "string", "format": "uri" }));
            properties.insert("blog_post".to_string(), serde_json::json!({ "type": "string" }));
            properties.insert("shop_description".to_string(), serde_json::json!({ "type": "string" }));
        }

        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let binary = |content_type: &str, description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    content_type: { "schema": { "type": "string", "format": "binary" } }
                }
            })
        };

        Some(serde_json::json!({
            "paths": {
                "/generate-pdf": {
                    "post": {
                        "summary": "Render Markdown into a branded PDF",
                        "tags": ["Ebook"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/PdfRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": binary("application/pdf", "The rendered PDF"),
                            "400": error("Malformed JSON"),
                            "422": error("Missing or invalid fields"),
                            "500": error("Rendering failed"),
                            "502": error("An image could not be fetched (strict mode)")
                        }
                    }
                },
                "/generate-zip": {
                    "post": {
                        "summary": "Render the PDF and bundle it with its assets",
                        "tags": ["Ebook"],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ZipRequest" }
                                }
                            }
                        },
                        "responses": {
                            "200": binary("application/zip", "ZIP bundle"),
                            "400": error("Malformed JSON"),
                            "422": error("Missing or invalid fields"),
                            "500": error("Rendering or packaging failed"),
                            "502": error("An image could not be fetched (strict mode)")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "TocItem": toc_item,
                    "PdfRequest": {
                        "type": "object",
                        "properties": document_properties,
                        "required": ["content", "title"]
                    },
                    "ZipRequest": {
                        "type": "object",
                        "properties": zip_properties,
                        "required": ["title"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "ebook module stopped");
        Ok(())
    }
}

/// Create the module for registration.
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(EbookModule::new())
}
