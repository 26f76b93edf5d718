//! TOML parsing, serialization, validation, and discovery for target definitions.
//!
//! Custom targets are stored as `.target.toml` files in the `targets/`
//! directory of a project. A name that matches neither a file nor a
//! built-in preset is an [`TargetError::UnknownTarget`].

use std::path::{Path, PathBuf};

use ecpsoc_core::layout::{CSR, ETHMAC, MAIN_RAM, ROM, SPIFLASH, SRAM};
use ecpsoc_core::TargetConfiguration;

use crate::error::{Result, TargetError};
use crate::presets;

const TARGET_SUFFIX: &str = ".target.toml";

/// A validation issue found in a target definition.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity: "error" or "warning".
    pub severity: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: "error",
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: "warning",
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == "error"
    }
}

/// Load a target from a `.target.toml` file.
pub fn load_target_toml(path: &Path) -> Result<TargetConfiguration> {
    if !path.exists() {
        return Err(TargetError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_target_toml(&content)
}

/// Parse a target from a TOML string.
pub fn parse_target_toml(toml_str: &str) -> Result<TargetConfiguration> {
    let config: TargetConfiguration = toml::from_str(toml_str)?;
    Ok(config)
}

/// Serialize a target to pretty TOML.
pub fn target_to_toml(config: &TargetConfiguration) -> Result<String> {
    let toml_str = toml::to_string_pretty(config)?;
    Ok(toml_str)
}

/// Validate a target definition before assembly.
///
/// Catches what can be checked without deriving clocks or allocating the
/// map. Returns `Err(issues)` if anything was found, warnings included.
pub fn validate_target(config: &TargetConfiguration) -> std::result::Result<(), Vec<ValidationIssue>> {
    let mut issues = Vec::new();
    let board = &config.board;

    if config.sys_clk_hz == 0 {
        issues.push(ValidationIssue::error("system clock frequency is zero"));
    }
    if config.ident.is_empty() {
        issues.push(ValidationIssue::warning("ident string is empty"));
    }
    if !board.has_pad(&board.reference.pad, 0) {
        issues.push(ValidationIssue::error(format!(
            "reference clock pad '{}' is not on board {}",
            board.reference.pad, board.name
        )));
    }
    if let Some(reset) = &config.reset {
        if !board.has_pad(&reset.pad, 0) {
            issues.push(ValidationIssue::error(format!(
                "reset pad '{}' is not on board {}",
                reset.pad, board.name
            )));
        }
    }

    for (name, size) in [
        ("integrated ROM", config.integrated_rom_bytes),
        ("integrated SRAM", config.integrated_sram_bytes),
    ] {
        if size == 0 {
            issues.push(ValidationIssue::error(format!("{name} size is zero")));
        }
    }

    // Region table
    let entries = &config.memory_map.entries;
    for pair in entries.windows(2) {
        if pair[0].base >= pair[1].base {
            issues.push(ValidationIssue::error(format!(
                "memory map entry '{}' (0x{:08X}) is not above '{}' (0x{:08X})",
                pair[1].name, pair[1].base, pair[0].name, pair[0].base
            )));
        }
    }
    for (i, entry) in entries.iter().enumerate() {
        if entries[..i].iter().any(|e| e.name == entry.name) {
            issues.push(ValidationIssue::error(format!(
                "memory map entry '{}' declared twice",
                entry.name
            )));
        }
    }
    let mut required = vec![ROM, SRAM, MAIN_RAM, CSR];
    if config.spi_flash.is_some() {
        required.push(SPIFLASH);
    }
    if config.ethernet.is_some() {
        required.push(ETHMAC);
    }
    for name in required {
        if config.memory_map.entry(name).is_none() {
            issues.push(ValidationIssue::error(format!(
                "memory map has no '{name}' region"
            )));
        }
    }

    // DRAM
    let capacity = config.dram.module.capacity_bytes(board.sdram_data_width);
    match config.dram.size_cap {
        Some(0) => issues.push(ValidationIssue::error("main RAM size cap is zero")),
        Some(cap) if cap > capacity => issues.push(ValidationIssue::warning(format!(
            "main RAM cap 0x{cap:X} exceeds the {} capacity 0x{capacity:X}",
            config.dram.module.name
        ))),
        _ => {}
    }

    if let Some(eth) = &config.ethernet {
        for pad in ["eth_clocks", "eth"] {
            if !board.has_pad(pad, eth.port) {
                issues.push(ValidationIssue::error(format!(
                    "Ethernet port {} has no '{pad}' pads",
                    eth.port
                )));
            }
        }
    }

    if let Some(flash) = &config.spi_flash {
        if !board.has_pad(flash.mode.pad_name(), 0) {
            issues.push(ValidationIssue::error(format!(
                "SPI flash {} mode needs pad '{}'",
                flash.mode.as_str(),
                flash.mode.pad_name()
            )));
        }
        if flash.dummy_cycles == 0 {
            issues.push(ValidationIssue::error("SPI flash dummy cycles is zero"));
        }
        if !flash.size_bytes.is_power_of_two() {
            issues.push(ValidationIssue::error(format!(
                "SPI flash size 0x{:X} is not a power of two",
                flash.size_bytes
            )));
        }
        if flash.boot_reserved_bytes >= flash.size_bytes {
            issues.push(ValidationIssue::error(format!(
                "boot prefix 0x{:X} leaves no room in 0x{:X} bytes of flash",
                flash.boot_reserved_bytes, flash.size_bytes
            )));
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Like [`validate_target`], but only errors fail, as a
/// [`TargetError::Validation`] listing every one of them.
pub fn check_target(config: &TargetConfiguration) -> Result<()> {
    let Err(issues) = validate_target(config) else {
        return Ok(());
    };
    let errors: Vec<String> = issues
        .into_iter()
        .filter(ValidationIssue::is_error)
        .map(|i| i.message)
        .collect();
    if errors.is_empty() {
        return Ok(());
    }
    Err(TargetError::Validation {
        detail: format!("target '{}': {}", config.name, errors.join("; ")),
    })
}

/// Generate a template `.target.toml` for a new target.
///
/// Seeds from the newest built-in revision with the given name.
pub fn generate_template(name: &str) -> Result<String> {
    let mut config = presets::rev3();
    config.name = name.into();
    config.ident = format!("ecpsoc {name}");
    target_to_toml(&config)
}

/// Discover all `.target.toml` files in a project's `targets/` directory.
///
/// Returns a list of (target_name, file_path) pairs.
pub fn discover_targets(project_dir: &Path) -> Result<Vec<(String, PathBuf)>> {
    let targets_dir = project_dir.join("targets");
    if !targets_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut targets = Vec::new();
    for entry in std::fs::read_dir(&targets_dir)? {
        let path = entry?.path();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_suffix(TARGET_SUFFIX))
            .map(String::from);
        if let Some(name) = name {
            targets.push((name, path));
        }
    }
    targets.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(targets)
}

/// Resolve a target by name: a project target file wins over a preset.
pub fn resolve_target(name: &str, project_dir: &Path) -> Result<TargetConfiguration> {
    let path = project_dir
        .join("targets")
        .join(format!("{name}{TARGET_SUFFIX}"));
    if path.is_file() {
        return load_target_toml(&path);
    }
    presets::preset(name).ok_or_else(|| TargetError::UnknownTarget { name: name.into() })
}
