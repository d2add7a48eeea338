use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(#[from] serde_json::Error),

    #[error("Surface '{0}' is declared more than once")]
    DuplicateSurface(String),

    #[error("Surface '{0}' has a slot with an empty id")]
    EmptySlotId(String),

    #[error("Surface '{surface}' declares slot '{slot}' more than once")]
    DuplicateSlot { surface: String, slot: String },

    #[error("Surface '{surface}' has a parent cycle through slot '{slot}'")]
    SlotCycle { surface: String, slot: String },

    #[error("Surface '{surface}' has no slot '{slot}'")]
    UnknownSlot { surface: String, slot: String },
}
