//! Folio application library
//!
//! Markdown formatting, the ebook module and the server bootstrap shared by
//! the `folio-app` binary and the `folio` CLI.

pub mod formatting;
pub mod modules;
pub mod utils;

use folio_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Re-export commonly used types
pub use modules::*;

/// Run every module and serve HTTP until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry);

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    let served = folio_http::start_server(&registry, &settings).await;

    registry.stop_all().await?;
    served
}
