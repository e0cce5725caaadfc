use async_trait::async_trait;
use axum::Router;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Core module trait that all folio modules must implement
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Path the module router is mounted under.
    /// `None` mounts under `/api/{module_name}`, `Some("/")` merges at the root.
    fn base_path(&self) -> Option<&'static str> {
        None
    }

    /// Initialize the module with the provided context
    /// Called during application startup before the server binds
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Return the Axum router for this module's routes
    fn routes(&self) -> Router {
        Router::new()
    }

    /// Return OpenAPI specification fragment for this module as JSON
    /// Will be merged with other modules' specs
    fn openapi(&self) -> Option<serde_json::Value> {
        None
    }

    /// Start background tasks for this module
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Stop the module and clean up resources
    /// Called during application shutdown
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Resolve the mount path of a module's router.
pub fn mount_path(module: &dyn Module) -> String {
    match module.base_path() {
        Some(path) => path.to_string(),
        None => format!("/api/{}", module.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Nested;
    struct Rooted;

    impl Module for Nested {
        fn name(&self) -> &'static str {
            "nested"
        }
    }

    impl Module for Rooted {
        fn name(&self) -> &'static str {
            "rooted"
        }

        fn base_path(&self) -> Option<&'static str> {
            Some("/")
        }
    }

    #[test]
    fn modules_default_to_api_prefix() {
        assert_eq!(mount_path(&Nested), "/api/nested");
        assert_eq!(mount_path(&Rooted), "/");
    }
}
