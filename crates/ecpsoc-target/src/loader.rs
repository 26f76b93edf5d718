//! Device programming through an external loader.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Probe used when none is given.
pub const DEFAULT_CABLE: &str = "ft2232";

/// Gateware file of a target inside its build directory.
pub fn bitstream_path(gateware_dir: &Path, target: &str) -> PathBuf {
    gateware_dir.join(format!("{target}.bit"))
}

/// A loader invocation: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl LoadCommand {
    /// `openFPGALoader -c <cable> <bitstream>`.
    pub fn open_fpga_loader(cable: &str, bitstream: &Path) -> Self {
        Self {
            program: "openFPGALoader".into(),
            args: vec![
                "-c".into(),
                cable.into(),
                bitstream.display().to_string(),
            ],
        }
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for LoadCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_fpga_loader_arguments() {
        let bit = bitstream_path(Path::new("build/gateware"), "rev2");
        let cmd = LoadCommand::open_fpga_loader(DEFAULT_CABLE, &bit);
        assert_eq!(cmd.to_string(), "openFPGALoader -c ft2232 build/gateware/rev2.bit");
        assert_eq!(cmd.to_command().get_program(), "openFPGALoader");
    }
}
