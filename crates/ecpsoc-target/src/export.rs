//! Register-map and header export of an assembled target.
//!
//! Output layout under the build directory:
//!
//! ```text
//! <out>/<target>.json | <target>.toml   manifest
//! <out>/csr.csv                         register map
//! <out>/software/include/generated/     mem.h, soc.h, csr.h
//! ```

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use ecpsoc_core::layout::CSR;
use ecpsoc_core::ConstantValue;

use crate::composer::AssembledTarget;
use crate::error::Result;

/// Serialization format of the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifestFormat {
    #[default]
    Json,
    Toml,
}

impl ManifestFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ManifestFormat::Json => "json",
            ManifestFormat::Toml => "toml",
        }
    }
}

/// Render the full assembled target.
pub fn manifest(target: &AssembledTarget, format: ManifestFormat) -> Result<String> {
    Ok(match format {
        ManifestFormat::Json => serde_json::to_string_pretty(target)?,
        ManifestFormat::Toml => toml::to_string_pretty(target)?,
    })
}

/// Render `csr.csv`: CSR page bases, constants and populated memory regions.
pub fn csr_csv(target: &AssembledTarget) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "#{}", "-".repeat(78))?;
    writeln!(out, "# {} ({})", target.config.ident, target.name())?;
    writeln!(out, "#{}", "-".repeat(78))?;
    for slot in &target.csr {
        writeln!(out, "csr_base,{},0x{:08x},,", slot.name, slot.base)?;
    }
    for c in &target.constants {
        let value = match &c.value {
            ConstantValue::Int(v) => v.to_string(),
            ConstantValue::Str(s) => s.clone(),
        };
        writeln!(out, "constant,{},{value},,", c.name.to_lowercase())?;
    }
    for region in target.map.regions().iter().filter(|r| r.populated) {
        let kind = if region.kind.is_cached() { "cached" } else { "io" };
        writeln!(
            out,
            "memory_region,{},0x{:08x},{},{kind}",
            region.name, region.base, region.size
        )?;
    }
    Ok(out)
}

fn header(guard: &str, body: &str) -> String {
    format!("#ifndef {guard}\n#define {guard}\n\n{body}\n#endif\n")
}

/// Render `mem.h` with the base and size of every populated region.
pub fn mem_h(target: &AssembledTarget) -> Result<String> {
    let mut body = String::new();
    for region in target.map.regions().iter().filter(|r| r.populated && r.name != CSR) {
        let name = region.name.to_uppercase();
        writeln!(body, "#ifndef {name}_BASE")?;
        writeln!(body, "#define {name}_BASE 0x{:08x}L", region.base)?;
        writeln!(body, "#define {name}_SIZE 0x{:08x}", region.size)?;
        writeln!(body, "#endif\n")?;
    }
    Ok(header("__GENERATED_MEM_H", &body))
}

fn is_address(name: &str) -> bool {
    ["_BASE", "_ADDR", "_ADDRESS"]
        .iter()
        .any(|suffix| name.ends_with(suffix))
}

/// Render `soc.h` with every build constant.
pub fn soc_h(target: &AssembledTarget) -> Result<String> {
    let mut body = String::new();
    for c in &target.constants {
        match &c.value {
            ConstantValue::Int(v) if is_address(&c.name) => {
                writeln!(body, "#define {} 0x{v:08x}L", c.name)?;
            }
            ConstantValue::Int(v) => {
                writeln!(body, "#define {} {v}", c.name)?;
            }
            ConstantValue::Str(s) => {
                writeln!(body, "#define {} \"{}\"", c.name, s.replace('"', "\\\""))?;
            }
        }
    }
    Ok(header("__GENERATED_SOC_H", &body))
}

/// Render `csr.h` with the base address of every CSR page.
pub fn csr_h(target: &AssembledTarget) -> Result<String> {
    let mut body = String::new();
    for slot in &target.csr {
        writeln!(
            body,
            "#define CSR_{}_BASE 0x{:08x}L",
            slot.name.to_uppercase(),
            slot.base
        )?;
    }
    Ok(header("__GENERATED_CSR_H", &body))
}

/// Write every export of `target` below `out_dir`, returning the written paths.
pub fn write_exports(
    target: &AssembledTarget,
    out_dir: &Path,
    format: ManifestFormat,
) -> Result<Vec<PathBuf>> {
    let generated = out_dir.join("software").join("include").join("generated");
    std::fs::create_dir_all(&generated)?;

    let files = [
        (
            out_dir.join(format!("{}.{}", target.name(), format.extension())),
            manifest(target, format)?,
        ),
        (out_dir.join("csr.csv"), csr_csv(target)?),
        (generated.join("mem.h"), mem_h(target)?),
        (generated.join("soc.h"), soc_h(target)?),
        (generated.join("csr.h"), csr_h(target)?),
    ];
    let mut written = Vec::with_capacity(files.len());
    for (path, content) in files {
        std::fs::write(&path, content)?;
        debug!(path = %path.display(), "export written");
        written.push(path);
    }
    info!(target = %target.name(), out = %out_dir.display(), files = written.len(), "exports written");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::assemble;
    use crate::presets::{rev1, rev2, rev3};

    #[test]
    fn csv_lists_pages_constants_and_regions() {
        let target = assemble(&rev2()).unwrap();
        let csv = csr_csv(&target).unwrap();
        assert!(csv.contains("csr_base,ctrl,0xf0000000,,"));
        assert!(csv.contains("csr_base,spiflash,0xf0002800,,"));
        assert!(csv.contains("constant,config_clock_frequency,65625000,,"));
        assert!(csv.contains("constant,flash_boot_address,537919488,,"));
        assert!(csv.contains("memory_region,main_ram,0x40000000,4194304,cached"));
        assert!(!csv.contains("memory_region,ethmac"));
    }

    #[test]
    fn io_regions_are_uncached() {
        let target = assemble(&rev1()).unwrap();
        let csv = csr_csv(&target).unwrap();
        assert!(csv.contains("memory_region,ethmac,0xb0000000,8192,io"));
        assert!(csv.contains("memory_region,csr,0xf0000000,"));
    }

    #[test]
    fn headers() {
        let target = assemble(&rev2()).unwrap();
        let mem = mem_h(&target).unwrap();
        assert!(mem.starts_with("#ifndef __GENERATED_MEM_H"));
        assert!(mem.contains("#define SPIFLASH_BASE 0x20000000L"));
        assert!(mem.contains("#define MAIN_RAM_SIZE 0x00400000"));
        assert!(!mem.contains("CSR_BASE"));

        let soc = soc_h(&target).unwrap();
        assert!(soc.contains("#define FLASH_BOOT_ADDRESS 0x20100000L"));
        assert!(soc.contains("#define CONFIG_CLOCK_FREQUENCY 65625000"));
        assert!(soc.contains("#define SPIFLASH_MODE \"1x\""));

        assert!(csr_h(&target).unwrap().contains("#define CSR_SDRAM_BASE 0xf0002000L"));
    }

    #[test]
    fn headers_render_for_every_revision() {
        for config in [rev1(), rev2(), rev3()] {
            let target = assemble(&config).unwrap();
            for text in [mem_h(&target), soc_h(&target), csr_h(&target)] {
                let text = text.unwrap();
                assert!(text.starts_with("#ifndef __GENERATED_"));
                assert!(text.ends_with("#endif\n"));
            }
            let soc = soc_h(&target).unwrap();
            assert_eq!(soc.matches("#define ").count(), target.constants.len() + 1);
        }
    }

    #[test]
    fn manifests_round_trip() {
        let target = assemble(&rev1()).unwrap();
        let json = manifest(&target, ManifestFormat::Json).unwrap();
        let back: AssembledTarget = serde_json::from_str(&json).unwrap();
        assert_eq!(back, target);
        let toml_str = manifest(&target, ManifestFormat::Toml).unwrap();
        assert!(toml_str.contains("name = \"rev1\""));
    }

    #[test]
    fn write_exports_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = assemble(&rev1()).unwrap();
        let written = write_exports(&target, dir.path(), ManifestFormat::Json).unwrap();
        assert_eq!(written.len(), 5);
        assert!(dir.path().join("rev1.json").is_file());
        assert!(dir.path().join("csr.csv").is_file());
        assert!(dir
            .path()
            .join("software/include/generated/soc.h")
            .is_file());
    }
}
