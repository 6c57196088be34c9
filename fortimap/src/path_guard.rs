use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Refuse to write `output` over any of `inputs`.
pub fn ensure_output_not_input(output: &Path, inputs: &[&Path]) -> Result<()> {
    let target = comparable(output)?;
    for input in inputs {
        if comparable(input)? == target {
            bail!(
                "refusing to overwrite input file: output {} is also read from {}",
                output.display(),
                input.display()
            );
        }
    }
    Ok(())
}

fn comparable(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return path
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", path.display()));
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    Ok(cwd.join(path))
}
