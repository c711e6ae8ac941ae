//! Project context assembly for agent prompts
//!
//! Gathers the configured context files into two text blobs, one per side of
//! the project. A file that cannot be read contributes a placeholder line
//! instead of failing the run; generation quality degrades, delivery does not.

use ferry_core::FerryConfig;
use std::path::Path;
use tracing::debug;

/// Codebase summaries handed to the planning and generation calls
#[derive(Debug, Clone, Default)]
pub struct ProjectContext {
    pub backend: String,
    pub frontend: String,
}

impl ProjectContext {
    /// Read the configured context files relative to their roots
    pub async fn load(config: &FerryConfig) -> Self {
        let backend_root = config
            .workspace
            .backend_root
            .as_deref()
            .unwrap_or(&config.workspace.root);

        Self {
            backend: read_blob(backend_root, &config.context.backend_files).await,
            frontend: read_blob(&config.workspace.root, &config.context.frontend_files).await,
        }
    }

    /// Both blobs as one repository context, for the generation prompt
    pub fn combined(&self) -> String {
        format!(
            "### Backend\n\n{}\n### Frontend\n\n{}",
            self.backend, self.frontend
        )
    }
}

async fn read_blob(root: &Path, files: &[String]) -> String {
    let mut blob = String::new();
    for name in files {
        let path = root.join(name);
        blob.push_str(&format!("--- {} ---\n", name));
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => blob.push_str(&text),
            Err(e) => {
                debug!("Context file {} unreadable: {}", path.display(), e);
                blob.push_str(&format!("(file not found: {})", path.display()));
            }
        }
        blob.push('\n');
    }
    blob
}
