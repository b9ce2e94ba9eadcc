//! Final-code result file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::io::config::write_atomic;

/// Replace the result file with `source`, atomically.
pub fn write_final_code(path: &Path, source: &str) -> Result<()> {
    let mut contents = source.to_string();
    if !contents.ends_with('\n') {
        contents.push('\n');
    }
    write_atomic(path, &contents)
        .with_context(|| format!("write final code {}", path.display()))?;
    info!(path = %path.display(), bytes = contents.len(), "final code written");
    Ok(())
}
