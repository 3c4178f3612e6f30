//! Versioned template registry (§3, §4.9): templates, activation gates,
//! fixture runner, ROI validator, and SSOT enforcement. The pipeline only
//! talks to [`registry::TemplateRegistry`]; the other modules are its
//! internals.

pub mod activation;
pub mod default_template;
pub mod fixtures;
pub mod registry;
pub mod roi;
pub mod store;
pub mod types;

pub use activation::ActivationReport;
pub use registry::TemplateRegistry;
pub use store::{FileRegistryStore, InMemoryRegistryStore, RegistryStore};
pub use types::{SsotMode, Template, TemplateVersion};
