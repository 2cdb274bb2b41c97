//! Built-in artifact catalog
//!
//! Known model artifacts an embedding application can offer out of the box.
//! Pure data: callers pick an entry and hand its [`ArtifactSpec`] to the
//! acquirer.

use serde::{Deserialize, Serialize};

use crate::types::ArtifactSpec;

/// Default model file name
pub const DEFAULT_MODEL_NAME: &str = "tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf";

/// Default model download URL
pub const DEFAULT_MODEL_URL: &str =
    "https://huggingface.co/TheBloke/TinyLlama-1.1B-Chat-v1.0-GGUF/resolve/main/tinyllama-1.1b-chat-v1.0.Q4_K_M.gguf";

/// Approximate size of the default model in bytes (669 MiB)
pub const DEFAULT_MODEL_SIZE_BYTES: u64 = 669 * 1024 * 1024;

/// A catalog entry: an acquirable artifact plus display metadata
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// The acquirable artifact
    pub spec: ArtifactSpec,
    /// Human-readable name for UI display
    pub display_name: String,
    /// One-line description
    pub description: String,
}

/// The default artifact: a lightweight chat model
pub fn default_artifact() -> ArtifactSpec {
    ArtifactSpec::new(
        DEFAULT_MODEL_NAME,
        DEFAULT_MODEL_URL,
        DEFAULT_MODEL_SIZE_BYTES,
    )
}

/// All built-in catalog entries
pub fn builtin_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            spec: default_artifact(),
            display_name: "TinyLlama 1.1B (Default)".to_string(),
            description: "Lightweight, fast model".to_string(),
        },
        CatalogEntry {
            spec: ArtifactSpec::new(
                "phi-2-dpo-gguf",
                "https://huggingface.co/microsoft/phi-2/resolve/main/model.gguf",
                1600 * 1024 * 1024,
            ),
            display_name: "Phi-2 DPO (2.7B)".to_string(),
            description: "Larger, more capable model".to_string(),
        },
    ]
}
