//! `ecpsoc load`: program the board with openFPGALoader.

use std::path::Path;

use anyhow::{bail, Context, Result};

use ecpsoc_target::loader::{bitstream_path, LoadCommand};

pub fn run(name: &str, gateware_dir: &Path, cable: &str, dry_run: bool) -> Result<()> {
    let bitstream = bitstream_path(gateware_dir, name);
    let cmd = LoadCommand::open_fpga_loader(cable, &bitstream);
    if dry_run {
        println!("{cmd}");
        return Ok(());
    }
    if !bitstream.is_file() {
        bail!("bitstream {} not found; run synthesis first", bitstream.display());
    }

    tracing::info!(command = %cmd, "loading bitstream");
    let status = cmd
        .to_command()
        .status()
        .with_context(|| format!("running {}", cmd.program))?;
    if !status.success() {
        bail!("{} exited with {status}", cmd.program);
    }
    Ok(())
}
