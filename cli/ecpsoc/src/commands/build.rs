//! `ecpsoc build`: assemble a target and write its exports.

use std::path::Path;

use anyhow::{Context, Result};

use ecpsoc_target::assemble;
use ecpsoc_target::export::{write_exports, ManifestFormat};
use ecpsoc_target::parse::resolve_target;

pub fn run(project_dir: &Path, name: &str, out_dir: &Path, format: ManifestFormat) -> Result<()> {
    let config = resolve_target(name, project_dir)?;
    let target = assemble(&config).with_context(|| format!("assembling target '{name}'"))?;
    let written = write_exports(&target, out_dir, format)
        .with_context(|| format!("exporting to {}", out_dir.display()))?;

    println!("Built {} ({})", target.name(), target.fingerprint()?);
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}
