use std::collections::{BTreeSet, HashSet};

use indexmap::{IndexMap, IndexSet};
use k2e_sexpr::{Node, unquote};
use tracing::debug;

use crate::config::ConverterConfig;
use crate::error::ConvertError;

/// Assigns one net name per pad identifier for a single conversion.
///
/// Names are stable once assigned. A candidate that clashes with a name already in use
/// (including override targets) gets the first free `_1`, `_2`, ... suffix.
#[derive(Debug, Clone)]
pub struct NetNamer {
    prefix: String,
    prefix_number_pads_only: bool,
    overrides: IndexMap<String, String>,
    assigned: IndexMap<String, String>,
    taken: HashSet<String>,
}

impl NetNamer {
    #[must_use]
    pub fn new(config: &ConverterConfig) -> Self {
        Self {
            prefix: config.pad_prefix.clone(),
            prefix_number_pads_only: config.prefix_number_pads_only,
            overrides: config.net_name_overrides.clone(),
            assigned: IndexMap::new(),
            taken: config.net_name_overrides.values().cloned().collect(),
        }
    }

    pub fn net_name(&mut self, pad: &str) -> String {
        if let Some(net) = self.overrides.get(pad) {
            let net = net.clone();
            self.assigned
                .entry(pad.to_string())
                .or_insert_with(|| net.clone());
            return net;
        }
        if let Some(net) = self.assigned.get(pad) {
            return net.clone();
        }

        let candidate = if !self.prefix_number_pads_only
            || pad.starts_with(|c: char| c.is_ascii_digit())
        {
            format!("{}{}", self.prefix, pad)
        } else {
            pad.to_string()
        };

        let mut net = candidate.clone();
        let mut suffix = 0;
        while self.taken.contains(&net) {
            suffix += 1;
            net = format!("{candidate}_{suffix}");
        }
        debug!(pad, net = %net, collision = suffix > 0, "assigned net name");

        self.taken.insert(net.clone());
        self.assigned.insert(pad.to_string(), net.clone());
        net
    }

    /// Pad identifier -> net name for every pad named so far, in first-seen order.
    #[must_use]
    pub fn assigned(&self) -> &IndexMap<String, String> {
        &self.assigned
    }

    #[must_use]
    pub fn into_assigned(self) -> IndexMap<String, String> {
        self.assigned
    }

    /// Distinct net names in use, sorted.
    #[must_use]
    pub fn param_names(&self) -> BTreeSet<&str> {
        self.assigned.values().map(String::as_str).collect()
    }
}

/// Distinct pad identifiers of a footprint, quotes stripped, in first-seen order.
/// Unconnected pads (empty identifier) are left out.
pub fn scan_pad_names(footprint: &Node) -> Result<Vec<String>, ConvertError> {
    let mut names = IndexSet::new();
    for pad in footprint.nodes().filter(|n| n.kind == "pad") {
        let raw = pad
            .first_atom()
            .ok_or_else(|| ConvertError::shape(&pad.kind, "a pad identifier as the first item"))?;
        let name = unquote(raw);
        if !name.is_empty() {
            names.insert(name.to_string());
        }
    }
    Ok(names.into_iter().collect())
}
