use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Prepended to pad identifiers to form net names.
    pub pad_prefix: String,
    /// Only prefix identifiers starting with a digit; `false` prefixes every pad.
    pub prefix_number_pads_only: bool,
    /// Pad identifier -> net name, taking precedence over every naming rule.
    pub net_name_overrides: IndexMap<String, String>,
    /// Default value of the generated `designator` param.
    pub designator: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            pad_prefix: "P".to_string(),
            prefix_number_pads_only: true,
            net_name_overrides: IndexMap::new(),
            designator: "XX".to_string(),
        }
    }
}

impl ConverterConfig {
    /// Reads a YAML (or JSON) config; omitted keys keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConvertError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}
