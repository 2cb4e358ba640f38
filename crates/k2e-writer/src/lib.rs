//! Turns a parsed KiCad footprint into an ergogen footprint module.
//!
//! The generated module declares one `net` param per connected pad and builds the
//! footprint text at placement time, mirroring it when placed on the opposite face.

mod assemble;
pub mod classify;
mod config;
pub mod context;
mod error;
pub mod js;
mod nets;
#[cfg(feature = "js-preview")]
pub mod preview;
pub mod rules;

pub use assemble::{Conversion, Side};
pub use config::ConverterConfig;
pub use error::ConvertError;
pub use nets::{NetNamer, scan_pad_names};

use k2e_sexpr::{Node, parse_str};

/// Converts a footprint tree. Each call starts from a fresh net namer, so repeated
/// conversions of the same input are byte-identical.
pub fn convert(footprint: &Node, config: &ConverterConfig) -> Result<Conversion, ConvertError> {
    assemble::assemble(footprint, config)
}

/// Tokenizes, parses and converts `.kicad_mod` text.
pub fn convert_str(text: &str, config: &ConverterConfig) -> Result<Conversion, ConvertError> {
    let footprint = parse_str(text)?;
    convert(&footprint, config)
}
