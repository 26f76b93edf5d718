//! `ecpsoc doctor`: toolchain diagnostics.

use std::path::Path;
use std::process::Command;

use anyhow::Result;

use ecpsoc_target::parse::discover_targets;
use ecpsoc_target::PRESETS;

/// Print toolchain diagnostic information.
pub fn run(project_dir: &Path) -> Result<()> {
    println!("=== ecpsoc doctor ===");
    println!();
    println!("ecpsoc version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("--- FPGA toolchain ---");
    print_tool_status("yosys", &["-V"]);
    print_tool_status("nextpnr-ecp5", &["--version"]);
    print_tool_status("ecppack", &["--help"]);
    print_tool_status("openFPGALoader", &["--Version"]);
    println!();

    println!("--- Targets ---");
    println!("  presets: {}", PRESETS.join(", "));
    match discover_targets(project_dir) {
        Ok(files) if files.is_empty() => println!("  targets/: none"),
        Ok(files) => {
            for (name, path) in files {
                println!("  {name}: {}", path.display());
            }
        }
        Err(e) => println!("  targets/: error: {e}"),
    }
    Ok(())
}

fn print_tool_status(name: &str, args: &[&str]) {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            let text = if output.stdout.is_empty() {
                String::from_utf8_lossy(&output.stderr)
            } else {
                String::from_utf8_lossy(&output.stdout)
            };
            let first_line = text.lines().next().unwrap_or("(unknown version)");
            println!("  {name}: {first_line}");
        }
        Err(_) => {
            println!("  {name}: not found");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn doctor_runs_without_error() {
        let dir = tempfile::tempdir().unwrap();
        super::run(dir.path()).unwrap();
    }
}
