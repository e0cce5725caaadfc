//! Core traits, settings, and module registry shared by the folio crates.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{mount_path, InitCtx, Module};
pub use registry::ModuleRegistry;
