//! `ecpsoc list|describe|validate|template`: target inspection.

use std::path::Path;

use anyhow::{bail, Context, Result};

use ecpsoc_core::units::{format_bytes, format_hz};
use ecpsoc_target::parse::{
    check_target, discover_targets, generate_template, resolve_target, target_to_toml,
    validate_target,
};
use ecpsoc_target::{assemble, AssembledTarget, PRESETS};

/// List built-in presets and the project's target files.
pub fn list(project_dir: &Path) -> Result<()> {
    println!("Built-in presets:");
    for name in PRESETS {
        let config = resolve_target(name, project_dir)?;
        println!(
            "  {name:<12} {} sys, {} DRAM{}{}",
            format_hz(config.sys_clk_hz),
            config.dram.timing.rate(),
            if config.ethernet.is_some() { ", ethernet" } else { "" },
            config
                .spi_flash
                .as_ref()
                .map(|f| format!(", {} flash", f.mode.as_str()))
                .unwrap_or_default(),
        );
    }

    let files = discover_targets(project_dir)?;
    if !files.is_empty() {
        println!();
        println!("Project targets:");
        for (name, path) in files {
            println!("  {name:<12} {}", path.display());
        }
    }
    println!();
    println!("Use 'ecpsoc describe <name>' for details.");
    Ok(())
}

/// Assemble and print a target.
pub fn describe(project_dir: &Path, name: &str, as_toml: bool) -> Result<()> {
    let config = resolve_target(name, project_dir)?;
    if as_toml {
        print!("{}", target_to_toml(&config)?);
        return Ok(());
    }
    let target = assemble(&config).with_context(|| format!("assembling target '{name}'"))?;
    print!("{}", summary(&target));
    Ok(())
}

fn summary(target: &AssembledTarget) -> String {
    let mut out = String::new();
    let config = &target.config;
    out.push_str(&format!("=== Target: {} ===\n", config.name));
    out.push_str(&format!("Ident:  {}\n", config.ident));
    out.push_str(&format!(
        "Board:  {} {} ({})\n",
        config.board.name, config.board.revision, config.board.device
    ));
    out.push_str(&format!("CPU:    {} {}\n\n", config.cpu.kind, config.cpu.variant));

    out.push_str("--- Clock domains ---\n");
    for d in &target.clocks.domains {
        out.push_str(&format!(
            "  {:<10} {:>14} (want {}) @ {:>3} deg  {}\n",
            d.name,
            format_hz(d.achieved_hz),
            format_hz(d.hz),
            d.phase_deg,
            d.pll
        ));
    }
    for reset in &target.clocks.resets {
        out.push_str(&format!("  reset {:<6} {}\n", reset.name, reset.expression()));
    }

    out.push_str("\n--- Memory map ---\n");
    for r in target.map.regions() {
        let size = if r.populated {
            format_bytes(r.size)
        } else {
            "(free)".to_string()
        };
        out.push_str(&format!("  {:<10} 0x{:08X}  {size}\n", r.name, r.base));
    }

    out.push_str("\n--- Peripherals ---\n");
    for b in &target.bindings {
        out.push_str(&format!(
            "  {:<10} {:<10} domain {} region {}\n",
            b.peripheral,
            b.kind.as_str(),
            b.domain,
            b.region
        ));
    }
    out
}

/// Validate a target definition, then assemble it.
pub fn validate(project_dir: &Path, name: &str) -> Result<()> {
    let config = resolve_target(name, project_dir)?;
    if let Err(issues) = validate_target(&config) {
        for issue in &issues {
            eprintln!("{}: {}", issue.severity, issue.message);
        }
    }
    check_target(&config)?;
    let target = assemble(&config).with_context(|| format!("assembling target '{name}'"))?;
    println!("{name}: ok ({})", target.fingerprint()?);
    Ok(())
}

/// Write `targets/<name>.target.toml`.
pub fn template(project_dir: &Path, name: &str, force: bool) -> Result<()> {
    let dir = project_dir.join("targets");
    let path = dir.join(format!("{name}.target.toml"));
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
    std::fs::write(&path, generate_template(name)?)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ecpsoc_target::TargetError;

    #[test]
    fn describe_known_targets() {
        let dir = tempfile::tempdir().unwrap();
        for name in PRESETS {
            describe(dir.path(), name, false).unwrap();
        }
    }

    #[test]
    fn describe_unknown_target() {
        let dir = tempfile::tempdir().unwrap();
        assert!(describe(dir.path(), "nonexistent", false).is_err());
    }

    #[test]
    fn summary_lists_domains_and_regions() {
        let config = resolve_target("rev3", Path::new("/nonexistent")).unwrap();
        let text = summary(&assemble(&config).unwrap());
        assert!(text.contains("sys2x_ps"));
        assert!(text.contains("main_ram   0x40000000  2 MiB"));
        assert!(text.contains("~main_pll.locked"));
    }

    #[test]
    fn validate_rejects_broken_target_file() {
        let dir = tempfile::tempdir().unwrap();
        template(dir.path(), "broken", false).unwrap();
        let path = dir.path().join("targets/broken.target.toml");
        let mut config = ecpsoc_target::parse::load_target_toml(&path).unwrap();
        config.sys_clk_hz = 0;
        std::fs::write(&path, target_to_toml(&config).unwrap()).unwrap();

        let err = validate(dir.path(), "broken").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TargetError>(),
            Some(TargetError::Validation { .. })
        ));
    }

    #[test]
    fn template_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        template(dir.path(), "custom", false).unwrap();
        assert!(template(dir.path(), "custom", false).is_err());
        template(dir.path(), "custom", true).unwrap();
        validate(dir.path(), "custom").unwrap();
        list(dir.path()).unwrap();
    }
}
