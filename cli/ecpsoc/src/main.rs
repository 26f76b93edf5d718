//! ecpsoc CLI: compose Colorlight 5A-75B SoC targets and export their register maps.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use ecpsoc_target::export::ManifestFormat;
use ecpsoc_target::loader::DEFAULT_CABLE;

#[derive(Parser)]
#[command(name = "ecpsoc", version, about = "SoC composer for the Colorlight 5A-75B")]
struct Cli {
    /// Log composition stages (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project directory holding targets/*.target.toml
    #[arg(long, global = true, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Toml,
}

impl From<Format> for ManifestFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => ManifestFormat::Json,
            Format::Toml => ManifestFormat::Toml,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in presets and project targets
    List,
    /// Assemble a target and print its clocks, memory map and peripherals
    Describe {
        /// Target name (preset or targets/<name>.target.toml)
        name: String,
        /// Print the target definition as TOML instead
        #[arg(long)]
        toml: bool,
    },
    /// Validate a target definition and try to assemble it
    Validate {
        /// Target name
        name: String,
    },
    /// Write a new targets/<name>.target.toml seeded from the newest revision
    Template {
        /// Name of the new target
        name: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Assemble a target and write its manifest, csr.csv and C headers
    Build {
        /// Target name
        name: String,
        /// Output directory (default: build/<name>)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Manifest format
        #[arg(long, value_enum, default_value = "json")]
        format: Format,
        /// Program the board after exporting
        #[arg(long)]
        load: bool,
        /// JTAG cable model
        #[arg(long, default_value = DEFAULT_CABLE)]
        cable: String,
    },
    /// Program a built bitstream with openFPGALoader
    Load {
        /// Target name
        name: String,
        /// Directory holding <name>.bit (default: build/<name>/gateware)
        #[arg(long)]
        gateware: Option<PathBuf>,
        /// JTAG cable model
        #[arg(long, default_value = DEFAULT_CABLE)]
        cable: String,
        /// Print the loader command without running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Check for the FPGA toolchain and list known targets
    Doctor,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let project = cli.project;
    match cli.command {
        Commands::List => commands::target::list(&project),
        Commands::Describe { name, toml } => commands::target::describe(&project, &name, toml),
        Commands::Validate { name } => commands::target::validate(&project, &name),
        Commands::Template { name, force } => commands::target::template(&project, &name, force),
        Commands::Build {
            name,
            out,
            format,
            load,
            cable,
        } => {
            let out = out.unwrap_or_else(|| default_build_dir(&project, &name));
            commands::build::run(&project, &name, &out, format.into())?;
            if load {
                commands::load::run(&name, &out.join("gateware"), &cable, false)?;
            }
            Ok(())
        }
        Commands::Load {
            name,
            gateware,
            cable,
            dry_run,
        } => {
            let gateware =
                gateware.unwrap_or_else(|| default_build_dir(&project, &name).join("gateware"));
            commands::load::run(&name, &gateware, &cable, dry_run)
        }
        Commands::Doctor => commands::doctor::run(&project),
    }
}

fn default_build_dir(project: &std::path::Path, name: &str) -> PathBuf {
    project.join("build").join(name)
}
