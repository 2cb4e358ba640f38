//! Runs a generated template in an embedded JavaScript engine, the way ergogen would
//! when placing the footprint.

use boa_engine::{
    Context, JsError, JsResult, JsString, JsValue, NativeFunction, Source, js_string,
    object::ObjectInitializer, property::Attribute,
};
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("template script failed: {0}")]
    Script(String),
    #[error("invalid template params: expected object")]
    ParamsNotObject,
    #[error("invalid template param `{0}`: {1}")]
    ParamInvalid(String, &'static str),
}

impl From<JsError> for PreviewError {
    fn from(err: JsError) -> Self {
        PreviewError::Script(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Net,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<JsonValue>,
}

/// Reads a template's `params` object: `{ type, value }` declarations or bare defaults.
/// Generated templates only declare nets and string defaults.
pub fn parse_params(value: &JsonValue) -> Result<IndexMap<String, ParamSpec>, PreviewError> {
    let obj = value.as_object().ok_or(PreviewError::ParamsNotObject)?;
    obj.iter()
        .map(|(name, val)| Ok((name.clone(), parse_param(name, val)?)))
        .collect()
}

fn parse_param(name: &str, value: &JsonValue) -> Result<ParamSpec, PreviewError> {
    let invalid = |why| PreviewError::ParamInvalid(name.to_string(), why);

    let Some(obj) = value.as_object() else {
        return match value {
            JsonValue::String(_) => Ok(ParamSpec {
                kind: ParamKind::String,
                required: false,
                default: Some(value.clone()),
            }),
            JsonValue::Null => Ok(ParamSpec {
                kind: ParamKind::Net,
                required: false,
                default: None,
            }),
            _ => Err(invalid("unsupported default type")),
        };
    };

    let kind = match obj.get("type").map(JsonValue::as_str) {
        None => return Err(invalid("missing type")),
        Some(None) => return Err(invalid("type must be string")),
        Some(Some("net")) => ParamKind::Net,
        Some(Some("string")) => ParamKind::String,
        Some(Some(_)) => return Err(invalid("unknown type")),
    };
    // `value: undefined` disappears on the way to JSON, leaving the param required
    let default = obj.get("value").filter(|v| !v.is_null()).cloned();
    if default.as_ref().is_some_and(|v| !v.is_string()) {
        return Err(invalid("default type mismatch"));
    }
    Ok(ParamSpec {
        kind,
        required: default.is_none(),
        default,
    })
}

/// Where a footprint instance lands on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub r: f64,
    /// Passed through untouched; templates reject faces they do not support.
    pub side: String,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            r: 0.0,
            side: "F".to_string(),
        }
    }
}

pub struct LoadedTemplate {
    pub params: IndexMap<String, ParamSpec>,
    body: JsValue,
    ctx: Context,
}

/// Evaluates a CommonJS-style template and picks up its `params` and `body`.
pub fn load_template(code: &str) -> Result<LoadedTemplate, PreviewError> {
    let mut ctx = Context::default();
    let wrapped = format!(
        "globalThis.module = {{ exports: {{}} }}; globalThis.exports = module.exports;\n{code}\nmodule.exports;"
    );
    let exports = ctx.eval(Source::from_bytes(wrapped.as_bytes()))?;
    let exports = exports
        .as_object()
        .ok_or_else(|| PreviewError::Script("module.exports must be an object".to_string()))?;

    let params = exports.get(js_string!("params"), &mut ctx)?;
    let params = if params.is_null() || params.is_undefined() {
        JsonValue::Null
    } else {
        params.to_json(&mut ctx)?
    };
    let params = parse_params(&params)?;
    let body = exports.get(js_string!("body"), &mut ctx)?;

    Ok(LoadedTemplate { params, body, ctx })
}

impl LoadedTemplate {
    /// Names of the declared `net` params, in declaration order.
    pub fn net_params(&self) -> impl Iterator<Item = &str> + '_ {
        self.params
            .iter()
            .filter(|(_, spec)| spec.kind == ParamKind::Net)
            .map(|(name, _)| name.as_str())
    }

    /// Calls `body(p)` for one placement. `nets` maps net params to board net names;
    /// an unmapped net param falls back to its default, then to its own name.
    pub fn render(
        &mut self,
        placement: &Placement,
        nets: &IndexMap<String, String>,
    ) -> Result<String, PreviewError> {
        let mut index = NetIndex::default();
        let mut resolved = Vec::with_capacity(self.params.len());
        for (name, spec) in &self.params {
            if name == "side" {
                continue;
            }
            let value = if spec.kind == ParamKind::Net {
                let net = nets
                    .get(name)
                    .map(String::as_str)
                    .or_else(|| spec.default.as_ref().and_then(JsonValue::as_str))
                    .unwrap_or(name.as_str());
                net_to_js(&mut self.ctx, net, index.ensure(net))?
            } else {
                match &spec.default {
                    Some(value) => JsValue::from_json(value, &mut self.ctx)?,
                    None => JsValue::Undefined,
                }
            };
            resolved.push((name.as_str(), value));
        }

        let at = format!(
            "(at {} {} {})",
            fmt_num(placement.x),
            fmt_num(placement.y),
            fmt_num(placement.r)
        );
        let mut builder = ObjectInitializer::new(&mut self.ctx);
        builder
            .property(js_string!("at"), JsString::from(at.as_str()), Attribute::all())
            .property(js_string!("r"), JsValue::from(placement.r), Attribute::all())
            .property(js_string!("rot"), JsValue::from(placement.r), Attribute::all())
            .property(
                js_string!("side"),
                JsString::from(placement.side.as_str()),
                Attribute::all(),
            );
        for (name, value) in resolved {
            builder.property(JsString::from(name), value, Attribute::all());
        }
        let p: JsValue = builder.build().into();

        let body = self
            .body
            .as_object()
            .ok_or_else(|| PreviewError::Script("footprint body must be a function".to_string()))?;
        let result = body.call(&JsValue::Undefined, &[p], &mut self.ctx)?;
        let rendered = result
            .as_string()
            .ok_or_else(|| PreviewError::Script("footprint body must return a string".to_string()))?
            .to_std_string()
            .map_err(|e| PreviewError::Script(e.to_string()))?;
        debug!(side = %placement.side, nets = index.order.len(), "rendered preview");
        Ok(rendered)
    }
}

#[derive(Debug, Default)]
struct NetIndex {
    order: Vec<String>,
}

impl NetIndex {
    /// 1-based board net number; the empty net is always 0.
    fn ensure(&mut self, name: &str) -> usize {
        if name.is_empty() {
            return 0;
        }
        if let Some(idx) = self.order.iter().position(|n| n == name) {
            return idx + 1;
        }
        self.order.push(name.to_string());
        self.order.len()
    }
}

/// A net object that stringifies to `(net <index> "<name>")` inside template literals.
fn net_to_js(ctx: &mut Context, name: &str, index: usize) -> JsResult<JsValue> {
    let text = format!("(net {index} {})", serde_json::Value::String(name.to_string()));
    let to_string = NativeFunction::from_copy_closure(|this, _args, ctx| {
        if let Some(obj) = this.as_object() {
            return obj.get(js_string!("str"), ctx);
        }
        Ok(JsValue::from(js_string!("")))
    });
    let mut builder = ObjectInitializer::new(ctx);
    builder
        .property(js_string!("name"), JsString::from(name), Attribute::all())
        .property(js_string!("index"), JsValue::from(index as f64), Attribute::all())
        .property(js_string!("str"), JsString::from(text.as_str()), Attribute::all())
        .function(to_string, js_string!("toString"), 0);
    Ok(builder.build().into())
}

fn fmt_num(v: f64) -> String {
    let v = if v.abs() < 1e-12 { 0.0 } else { v };
    format!("{v}")
}
