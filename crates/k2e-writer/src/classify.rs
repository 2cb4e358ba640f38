use std::collections::BTreeMap;

use indexmap::IndexMap;
use k2e_sexpr::{Node, unquote};
use tracing::debug;

const UNKNOWN_LAYER: &str = "Unknown Layer";

/// Output groups, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKind {
    WellKnown,
    Unknown,
    Pads,
    Drawings,
    Zones,
    Models,
    Properties,
}

impl GroupKind {
    /// `None` for the footprint's own placement and layer, which the assembler writes
    /// itself.
    #[must_use]
    pub fn of(kind: &str) -> Option<Self> {
        Some(match kind {
            "at" | "layer" => return None,
            "attr" | "tags" | "descr" => GroupKind::WellKnown,
            "pad" => GroupKind::Pads,
            "fp_text" | "fp_text_box" | "fp_line" | "fp_rect" | "fp_circle" | "fp_arc"
            | "fp_poly" | "fp_curve" => GroupKind::Drawings,
            "zone" => GroupKind::Zones,
            "model" => GroupKind::Models,
            "property" => GroupKind::Properties,
            _ => GroupKind::Unknown,
        })
    }

    /// Header comment for the group; drawings are labelled per layer instead.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GroupKind::WellKnown => "",
            GroupKind::Unknown => "Unknown",
            GroupKind::Pads => "Pads",
            GroupKind::Drawings => "Drawings",
            GroupKind::Zones => "Zones",
            GroupKind::Models => "3D Models",
            GroupKind::Properties => "Properties",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Group<'a> {
    pub kind: GroupKind,
    pub label: String,
    pub nodes: Vec<&'a Node>,
}

/// Partitions the footprint's child nodes into labelled groups, keeping source order
/// inside each group. Drawings are split by their own layer and the layer groups are
/// ordered by the layer name read back to front (`F.Cu` sorts as `Cu.F`).
#[must_use]
pub fn classify(footprint: &Node) -> Vec<Group<'_>> {
    let mut by_kind: BTreeMap<GroupKind, Vec<&Node>> = BTreeMap::new();
    for node in footprint.nodes() {
        if let Some(kind) = GroupKind::of(&node.kind) {
            by_kind.entry(kind).or_default().push(node);
        }
    }

    let mut groups = Vec::new();
    for (kind, nodes) in by_kind {
        if kind == GroupKind::Drawings {
            groups.extend(drawing_groups(nodes));
        } else {
            groups.push(Group {
                kind,
                label: kind.label().to_string(),
                nodes,
            });
        }
    }
    debug!(
        groups = groups.len(),
        labels = ?groups.iter().map(|g| g.label.as_str()).collect::<Vec<_>>(),
        "classified footprint children"
    );
    groups
}

fn drawing_groups(drawings: Vec<&Node>) -> Vec<Group<'_>> {
    let mut by_layer: IndexMap<&str, Vec<&Node>> = IndexMap::new();
    for drawing in drawings {
        let layer = drawing
            .child("layer")
            .and_then(Node::first_atom)
            .map_or(UNKNOWN_LAYER, unquote);
        by_layer.entry(layer).or_default().push(drawing);
    }

    let mut layers: Vec<(&str, Vec<&Node>)> = by_layer.into_iter().collect();
    layers.sort_by_cached_key(|(layer, _)| {
        let key = layer_sort_key(layer);
        (key.to_lowercase(), key)
    });
    layers
        .into_iter()
        .map(|(layer, nodes)| Group {
            kind: GroupKind::Drawings,
            label: format!("Drawings on {layer}"),
            nodes,
        })
        .collect()
}

/// `F.SilkS` -> `SilkS.F`, so layers of one family sort together.
#[must_use]
pub fn layer_sort_key(layer: &str) -> String {
    layer.split('.').rev().collect::<Vec<_>>().join(".")
}
