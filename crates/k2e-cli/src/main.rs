use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod convert;
mod error;

use crate::convert::NamingArgs;
use crate::error::{CliError, ErrorCode};

#[derive(Parser)]
#[command(name = "kicad2ergogen", version, about, long_about = None)]
struct Cli {
    /// Log conversion details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a footprint into an ergogen footprint module
    Convert {
        /// KiCad footprint file (.kicad_mod)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Write the module here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Print the pad to net table to stderr
        #[arg(long)]
        net_map: bool,

        #[command(flatten)]
        naming: NamingArgs,
    },
    /// List the footprint's pads with the net names they would get
    Pads {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[command(flatten)]
        naming: NamingArgs,
    },
    /// Convert, then render the module for one placement (needs the js-preview feature)
    Preview {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Side to place the footprint on
        #[arg(long, default_value = "F")]
        side: String,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        x: f64,

        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        y: f64,

        /// Rotation in degrees
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        r: f64,

        #[command(flatten)]
        naming: NamingArgs,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Convert {
            input,
            output,
            net_map,
            naming,
        } => convert::run_convert(&input, output.as_deref(), &naming, net_map),
        Command::Pads { input, naming } => convert::run_pads(&input, &naming),
        Command::Preview {
            input,
            side,
            x,
            y,
            r,
            naming,
        } => convert::run_preview(&input, &naming, (x, y, r), side),
    }
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // help and version go to stdout and are not failures
            let code = if err.use_stderr() {
                ErrorCode::Usage as i32
            } else {
                0
            };
            std::process::exit(code);
        }
    };

    init_logging(cli.verbose);
    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(err.code as i32);
    }
}
