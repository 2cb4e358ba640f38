use indexmap::IndexMap;
use k2e_sexpr::{Node, unquote};
use tracing::info;

use crate::classify::classify;
use crate::config::ConverterConfig;
use crate::context::{Ancestry, Link, WriterContext};
use crate::error::ConvertError;
use crate::js::{escape_template, property_key, single_quoted};
use crate::nets::NetNamer;
use crate::rules::{self, Disposition};

/// Board face a footprint is authored for or placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
}

impl Side {
    /// Face implied by a footprint layer name; anything not on the back is front.
    #[must_use]
    pub fn of_layer(layer: &str) -> Self {
        if layer.starts_with("B.") {
            Side::Back
        } else {
            Side::Front
        }
    }

    #[must_use]
    pub fn letter(self) -> &'static str {
        match self {
            Side::Front => "F",
            Side::Back => "B",
        }
    }

    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Side::Front => Side::Back,
            Side::Back => Side::Front,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    /// The generated ergogen footprint module.
    pub code: String,
    /// Pad identifier -> net name for every connected pad, in first-seen order.
    pub net_map: IndexMap<String, String>,
    pub default_side: Side,
}

pub(crate) fn assemble(
    footprint: &Node,
    config: &ConverterConfig,
) -> Result<Conversion, ConvertError> {
    if !matches!(footprint.kind.as_str(), "footprint" | "module") {
        return Err(ConvertError::NotAFootprint {
            kind: footprint.kind.clone(),
        });
    }

    let own_layer = footprint.child("layer");
    let default_side = own_layer
        .and_then(Node::first_atom)
        .map_or(Side::Front, |layer| Side::of_layer(unquote(layer)));
    let mirror_side = default_side.opposite();

    let mut namer = NetNamer::new(config);
    let mut body = String::new();
    body.push_str(&format!(
        "const flip = p.side === \"{}\";\n",
        mirror_side.letter()
    ));
    body.push_str(&format!(
        "if (!flip && p.side !== \"{}\") throw new Error('unsupported side: ' + p.side);\n\n",
        default_side.letter()
    ));

    body.push_str("fp.push(`(");
    body.push_str(&escape_template(&footprint.kind));
    for atom in footprint.atoms() {
        body.push(' ');
        body.push_str(&escape_template(atom));
    }
    body.push_str("`);\n");
    body.push_str("fp.push(p.at);\n");

    let root = Link::new(&footprint.kind, Ancestry::root());
    let ancestry = Ancestry::with(&root);
    if let Some(layer) = own_layer {
        write_statement(layer, ancestry, &mut namer, &mut body)?;
    }

    let groups = classify(footprint);
    for group in &groups {
        body.push('\n');
        if !group.label.is_empty() {
            body.push_str(&format!("// {}\n", group.label));
        }
        for node in &group.nodes {
            write_statement(node, ancestry, &mut namer, &mut body)?;
        }
    }

    let code = render_module(config, default_side, &namer, &body);
    info!(
        pads = namer.assigned().len(),
        groups = groups.len(),
        bytes = code.len(),
        "converted footprint"
    );
    Ok(Conversion {
        code,
        net_map: namer.into_assigned(),
        default_side,
    })
}

/// One `fp.push(...)` line for a direct child of the footprint.
fn write_statement(
    node: &Node,
    ancestry: Ancestry<'_>,
    namer: &mut NetNamer,
    out: &mut String,
) -> Result<(), ConvertError> {
    let mut statement = String::new();
    let mut ctx = WriterContext::new(node, ancestry, namer, &mut statement);
    let rule = rules::select(&ctx)?;
    if rule.disposition == Disposition::Skip {
        return Ok(());
    }
    ctx.push_raw("fp.push(`");
    (rule.write)(&mut ctx)?;
    ctx.push_raw("`);");

    match rule.disposition {
        Disposition::Disabled => comment_out(&statement, out),
        _ => {
            out.push_str(&statement);
            out.push('\n');
        }
    }
    Ok(())
}

/// Writes `text` as line comments. Quoted source strings may span lines, so every
/// line terminator JavaScript recognises starts a new `// ` line.
fn comment_out(text: &str, out: &mut String) {
    for line in text.split_inclusive(['\n', '\r', '\u{2028}', '\u{2029}']) {
        out.push_str("// ");
        out.push_str(line);
    }
    if !text.ends_with(['\n', '\r', '\u{2028}', '\u{2029}']) {
        out.push('\n');
    }
}

fn render_module(
    config: &ConverterConfig,
    default_side: Side,
    namer: &NetNamer,
    body: &str,
) -> String {
    let mut params = String::new();
    for net in namer.param_names() {
        params.push_str(&format!(
            "    {}: {{ type: 'net', value: undefined }},\n",
            property_key(net)
        ));
    }

    format!(
        "module.exports = {{
  params: {{
    designator: {designator},
    side: '{side}',
{params}  }},
  body: p => {{
    const fp = [];
    {body}
    fp.push(')');
    return fp.join('\\n');
  }}
}}
",
        designator = single_quoted(&config.designator),
        side = default_side.letter(),
        body = body.trim_end_matches('\n'),
    )
}
