//! The ordered writer rule table.
//!
//! For every node the first rule whose `matches` returns true writes it. Rules emit
//! template text: geometry and layer identity that depend on the mounting face are
//! written as `${...}` expressions over the runtime `flip` flag rather than resolved
//! here.

use std::sync::LazyLock;

use k2e_sexpr::{Item, Node, unquote};
use regex::Regex;
use tracing::trace;

use crate::context::WriterContext;
use crate::error::ConvertError;
use crate::js::{property_access, string_literal};

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:(?:0|[1-9]\d*)(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid number regex")
});
static ZERO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?0(?:\.0+)?$").expect("valid zero regex"));

const COORDINATE_KINDS: [&str; 5] = ["start", "end", "mid", "center", "xy"];

/// File-provenance identifiers that must not be carried into regenerated footprints.
const SKIPPED_KINDS: [&str; 7] = [
    "version",
    "uuid",
    "group",
    "tedit",
    "tstamp",
    "generator",
    "generator_version",
];

/// How the output of a rule is placed in the assembled module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Emit,
    /// Nothing is written, not even a separator.
    Skip,
    /// Written as a commented-out statement at top level.
    Disabled,
}

pub struct Rule {
    pub name: &'static str,
    pub disposition: Disposition,
    pub matches: fn(&WriterContext<'_>) -> bool,
    pub write: fn(&mut WriterContext<'_>) -> Result<(), ConvertError>,
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "pad",
        disposition: Disposition::Emit,
        matches: |ctx| ctx.node.kind == "pad",
        write: write_pad,
    },
    Rule {
        name: "xy",
        disposition: Disposition::Emit,
        matches: |ctx| COORDINATE_KINDS.contains(&ctx.node.kind.as_str()),
        write: write_xy,
    },
    Rule {
        name: "layer",
        disposition: Disposition::Emit,
        matches: |ctx| ctx.node.kind == "layer",
        write: write_layer,
    },
    Rule {
        name: "layers",
        disposition: Disposition::Emit,
        matches: |ctx| ctx.node.kind == "layers",
        write: write_layers,
    },
    Rule {
        // KiCad 5 spelling of a 3D model offset: `(at (xyz x y z))`
        name: "model offset",
        disposition: Disposition::Emit,
        matches: |ctx| ctx.node.kind == "at" && ctx.ancestry.parent() == Some("model"),
        write: write_generic,
    },
    Rule {
        name: "at",
        disposition: Disposition::Emit,
        matches: |ctx| ctx.node.kind == "at",
        write: write_at,
    },
    Rule {
        name: "effects",
        disposition: Disposition::Emit,
        matches: |ctx| ctx.node.kind == "effects",
        write: write_effects,
    },
    Rule {
        name: "justify",
        disposition: Disposition::Emit,
        matches: |ctx| ctx.node.kind == "justify",
        write: write_justify,
    },
    Rule {
        // the pad's net comes from the generated net param
        name: "pad net",
        disposition: Disposition::Skip,
        matches: |ctx| ctx.node.kind == "net" && ctx.ancestry.parent() == Some("pad"),
        write: write_nothing,
    },
    Rule {
        name: "skip",
        disposition: Disposition::Skip,
        matches: |ctx| SKIPPED_KINDS.contains(&ctx.node.kind.as_str()),
        write: write_nothing,
    },
    Rule {
        name: "property",
        disposition: Disposition::Disabled,
        matches: |ctx| ctx.node.kind == "property",
        write: write_generic,
    },
    Rule {
        name: "fallback",
        disposition: Disposition::Emit,
        matches: |_| true,
        write: write_generic,
    },
];

pub fn select(ctx: &WriterContext<'_>) -> Result<&'static Rule, ConvertError> {
    select_from(RULES, ctx)
}

pub(crate) fn select_from<'r>(
    rules: &'r [Rule],
    ctx: &WriterContext<'_>,
) -> Result<&'r Rule, ConvertError> {
    let rule = rules
        .iter()
        .find(|rule| (rule.matches)(ctx))
        .ok_or_else(|| ConvertError::NoRule {
            kind: ctx.node.kind.clone(),
            ancestors: ctx.ancestry.to_vec(),
        })?;
    trace!(rule = rule.name, kind = %ctx.node.kind, "selected writer rule");
    Ok(rule)
}

/// The X coordinate on the other face: a leading `-` is dropped, otherwise one is added.
#[must_use]
pub fn mirror_x(x: &str) -> String {
    match x.strip_prefix('-') {
        Some(positive) => positive.to_string(),
        None => format!("-{x}"),
    }
}

/// `F.xxx` <-> `B.xxx`; `None` for layers not tied to a face.
#[must_use]
pub fn swap_face(layer: &str) -> Option<String> {
    if let Some(rest) = layer.strip_prefix("F.") {
        Some(format!("B.{rest}"))
    } else {
        layer.strip_prefix("B.").map(|rest| format!("F.{rest}"))
    }
}

fn flip_x(x: &str) -> String {
    format!("${{(flip ? {} : {x})}}", mirror_x(x))
}

/// `items` as number literals, requiring `min..=max` of them.
fn numbers<'n>(
    kind: &str,
    items: &'n [Item],
    min: usize,
    max: usize,
    expected: &'static str,
) -> Result<Vec<&'n str>, ConvertError> {
    let values: Vec<&str> = items
        .iter()
        .map(|item| item.as_atom().filter(|atom| NUMBER.is_match(atom)))
        .collect::<Option<_>>()
        .ok_or_else(|| ConvertError::shape(kind, expected))?;
    if values.len() < min || values.len() > max {
        return Err(ConvertError::shape(kind, expected));
    }
    Ok(values)
}

fn write_nothing(_ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    Ok(())
}

fn write_generic(ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    let node = ctx.node;
    ctx.push_raw("(");
    ctx.push_literal(&node.kind);
    ctx.write_items(&node.items)?;
    ctx.push_raw(")");
    Ok(())
}

fn write_pad(ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    let node = ctx.node;
    let pad = node
        .first_atom()
        .map(unquote)
        .ok_or_else(|| ConvertError::shape(&node.kind, "a pad identifier as the first item"))?;
    // an empty identifier marks an unconnected pad
    let net = (!pad.is_empty()).then(|| ctx.net_name(pad));

    ctx.push_raw("(pad \"");
    ctx.push_literal(pad);
    ctx.push_raw("\"");
    ctx.write_items(&node.items[1..])?;
    if let Some(net) = net {
        ctx.push_raw(&format!(" ${{{}}}", property_access("p", &net)));
    }
    ctx.push_raw(")");
    Ok(())
}

fn write_xy(ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    let node = ctx.node;
    let xy = numbers(&node.kind, &node.items, 2, 2, "exactly two numbers (x y)")?;
    ctx.push_raw(&format!("({} {} {})", node.kind, flip_x(xy[0]), xy[1]));
    Ok(())
}

fn write_layer(ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    let node = ctx.node;
    let name = node
        .first_atom()
        .map(unquote)
        .ok_or_else(|| ConvertError::shape(&node.kind, "a layer name as the first item"))?;

    ctx.push_raw("(layer ");
    match swap_face(name) {
        Some(swapped) => ctx.push_raw(&format!(
            "\"${{(flip ? {} : {})}}\"",
            string_literal(&swapped),
            string_literal(name)
        )),
        None => {
            ctx.push_raw("\"");
            ctx.push_literal(name);
            ctx.push_raw("\"");
        }
    }
    // trailing flags such as `knockout`
    ctx.write_items(&node.items[1..])?;
    ctx.push_raw(")");
    Ok(())
}

fn write_layers(ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    let node = ctx.node;
    let layers: Vec<&str> = node
        .items
        .iter()
        .map(|item| item.as_atom().map(unquote))
        .collect::<Option<_>>()
        .ok_or_else(|| ConvertError::shape(&node.kind, "only layer names"))?;

    ctx.push_raw("(layers");
    for layer in layers {
        ctx.push_raw(" \"");
        if let Some(rest) = layer.strip_prefix('F').filter(|r| r.starts_with('.')) {
            ctx.push_raw("${(flip ? \"B\" : \"F\")}");
            ctx.push_literal(rest);
        } else if let Some(rest) = layer.strip_prefix('B').filter(|r| r.starts_with('.')) {
            ctx.push_raw("${(flip ? \"F\" : \"B\")}");
            ctx.push_literal(rest);
        } else {
            ctx.push_literal(layer);
        }
        ctx.push_raw("\"");
    }
    ctx.push_raw(")");
    Ok(())
}

fn write_at(ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    let node = ctx.node;
    // numeric x y [rotation], optionally followed by flags such as `unlocked`
    let split = node
        .items
        .iter()
        .position(|item| item.as_atom().is_some_and(|a| !NUMBER.is_match(a)))
        .unwrap_or(node.items.len());
    let (values, flags) = node.items.split_at(split);
    let values = numbers(&node.kind, values, 2, 3, "x y and an optional rotation")?;
    if flags.iter().any(|item| matches!(item, Item::Node(_))) {
        return Err(ConvertError::shape(&node.kind, "x y and an optional rotation"));
    }

    let (x, y) = (values[0], values[1]);
    let x = if ZERO.is_match(x) {
        x.to_string()
    } else {
        flip_x(x)
    };
    let rotation = match values.get(2) {
        Some(delta) => format!("${{(((p.r + {delta}) % 360) + 360) % 360}}"),
        None => "${p.r}".to_string(),
    };
    ctx.push_raw(&format!("(at {x} {y} {rotation}"));
    ctx.write_items(flags)?;
    ctx.push_raw(")");
    Ok(())
}

fn write_effects(ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    let node = ctx.node;
    ctx.push_raw("(effects");
    ctx.write_items(&node.items)?;
    if node.child("justify").is_none() {
        ctx.write_child(&Node::new("justify", Vec::new()), " ")?;
    }
    ctx.push_raw(")");
    Ok(())
}

fn write_justify(ctx: &mut WriterContext<'_>) -> Result<(), ConvertError> {
    let node = ctx.node;
    let mirrored = node.atoms().any(|atom| atom == "mirror");
    ctx.push_raw("(justify");
    for item in &node.items {
        match item {
            Item::Atom(atom) if atom == "mirror" => {}
            Item::Atom(atom) => {
                ctx.push_raw(" ");
                ctx.push_literal(atom);
            }
            Item::Node(child) => ctx.write_child(child, " ")?,
        }
    }
    // flipping an already mirrored text un-mirrors it
    if mirrored {
        ctx.push_raw("${ flip ? \"\" : \" mirror\"}");
    } else {
        ctx.push_raw("${ flip ? \" mirror\" : \"\"}");
    }
    ctx.push_raw(")");
    Ok(())
}
