use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use k2e_sexpr::parse_str;
use k2e_writer::{ConverterConfig, NetNamer, convert, scan_pad_names};
use tracing::debug;

use crate::error::CliError;

/// Flags that shape net names and params, layered over `--config`.
#[derive(Debug, Args)]
pub struct NamingArgs {
    /// Converter config file (YAML or JSON)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Prefix for generated net names
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,

    /// Prefix every pad identifier, not only the ones starting with a digit
    #[arg(long)]
    pub prefix_all: bool,

    /// Use NET as the net name of pad PAD (repeatable)
    #[arg(long = "net", value_name = "PAD=NET", value_parser = parse_net_override)]
    pub nets: Vec<(String, String)>,

    /// Default value of the designator param
    #[arg(long, value_name = "DESIGNATOR")]
    pub designator: Option<String>,
}

fn parse_net_override(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((pad, net)) if !net.is_empty() => Ok((pad.to_string(), net.to_string())),
        _ => Err(format!("expected PAD=NET, got `{raw}`")),
    }
}

impl NamingArgs {
    pub fn resolve(&self) -> Result<ConverterConfig, CliError> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = read_text(path)?;
                ConverterConfig::from_yaml_str(&raw).map_err(|e| {
                    CliError::input(format!("Could not parse config {}: {e}", path.display()))
                })?
            }
            None => ConverterConfig::default(),
        };
        if let Some(prefix) = &self.prefix {
            config.pad_prefix.clone_from(prefix);
        }
        if self.prefix_all {
            config.prefix_number_pads_only = false;
        }
        for (pad, net) in &self.nets {
            config.net_name_overrides.insert(pad.clone(), net.clone());
        }
        if let Some(designator) = &self.designator {
            config.designator.clone_from(designator);
        }
        debug!(?config, "resolved converter config");
        Ok(config)
    }
}

fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))
        .map_err(|e| CliError::input(format!("{e:#}")))
}

/// Compares resolved paths so `./fp.kicad_mod` and `fp.kicad_mod` are one file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

pub fn run_convert(
    input: &Path,
    output: Option<&Path>,
    naming: &NamingArgs,
    show_net_map: bool,
) -> Result<(), CliError> {
    if output.is_some_and(|out| same_file(out, input)) {
        return Err(CliError::usage(format!(
            "refusing to overwrite the input footprint {}",
            input.display()
        )));
    }
    let config = naming.resolve()?;
    let footprint = parse_str(&read_text(input)?)
        .map_err(|e| CliError::input(format!("{}: {e}", input.display())))?;
    let conversion = convert(&footprint, &config)?;

    match output {
        Some(path) => std::fs::write(path, &conversion.code)
            .with_context(|| format!("Could not write {}", path.display()))
            .map_err(|e| CliError::processing(format!("{e:#}")))?,
        None => std::io::stdout()
            .write_all(conversion.code.as_bytes())
            .context("Could not write to stdout")
            .map_err(|e| CliError::processing(format!("{e:#}")))?,
    }

    if show_net_map {
        for (pad, net) in &conversion.net_map {
            eprintln!("{pad}\t{net}");
        }
    }
    Ok(())
}

/// Lists each connected pad beside the net name it would get.
pub fn run_pads(input: &Path, naming: &NamingArgs) -> Result<(), CliError> {
    let config = naming.resolve()?;
    let footprint = parse_str(&read_text(input)?)
        .map_err(|e| CliError::input(format!("{}: {e}", input.display())))?;
    let mut namer = NetNamer::new(&config);
    for pad in scan_pad_names(&footprint)? {
        println!("{pad}\t{}", namer.net_name(&pad));
    }
    Ok(())
}

#[cfg(feature = "js-preview")]
pub fn run_preview(
    input: &Path,
    naming: &NamingArgs,
    (x, y, r): (f64, f64, f64),
    side: String,
) -> Result<(), CliError> {
    use k2e_writer::preview::{Placement, load_template};

    let config = naming.resolve()?;
    let footprint = parse_str(&read_text(input)?)
        .map_err(|e| CliError::input(format!("{}: {e}", input.display())))?;
    let conversion = convert(&footprint, &config)?;

    let mut template =
        load_template(&conversion.code).map_err(|e| CliError::processing(e.to_string()))?;
    // nets keep their param names so the preview reads like the template
    let nets: indexmap::IndexMap<String, String> = template
        .net_params()
        .map(|name| (name.to_string(), name.to_string()))
        .collect();
    let rendered = template
        .render(&Placement { x, y, r, side }, &nets)
        .map_err(|e| CliError::input(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(not(feature = "js-preview"))]
pub fn run_preview(
    _input: &Path,
    _naming: &NamingArgs,
    _at: (f64, f64, f64),
    _side: String,
) -> Result<(), CliError> {
    Err(CliError::usage(
        "preview is not available: kicad2ergogen was built without the js-preview feature",
    ))
}
