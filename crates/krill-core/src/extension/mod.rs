//! Extension surface.
//!
//! Extensions contribute event handlers, tools, commands, and typed
//! custom entries through one registration surface, and the host
//! drives their lifecycle. Name collisions are install-time errors;
//! a failed install leaves nothing behind.

pub mod api;
pub mod host;

pub use api::{Command, CustomEntryHandle, Extension};
pub use host::{ExtensionApi, ExtensionHost, ForkResult};

use thiserror::Error;

use crate::tools::RegistryError;

/// Why an extension failed to install.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("extension '{extension}' failed to set up: {source}")]
    Setup {
        extension: String,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("command '{name}' is already registered by extension '{owner}'")]
    DuplicateCommand { name: String, owner: String },

    #[error("custom entry type '{custom_type}' is already claimed by extension '{owner}'")]
    DuplicateCustomType { custom_type: String, owner: String },

    #[error("extension '{name}' is already installed")]
    DuplicateExtension { name: String },
}
