use k2e_sexpr::SexprError;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Sexpr(#[from] SexprError),

    #[error("invalid converter config: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("expected a footprint (or legacy module) at the root, found ({kind} ...)")]
    NotAFootprint { kind: String },

    #[error("malformed ({kind} ...) node: expected {expected}")]
    Shape { kind: String, expected: &'static str },

    #[error("no writer rule handles ({kind} ...) under [{}]", ancestors.join(", "))]
    NoRule { kind: String, ancestors: Vec<String> },
}

impl ConvertError {
    pub(crate) fn shape(kind: &str, expected: &'static str) -> Self {
        Self::Shape {
            kind: kind.to_string(),
            expected,
        }
    }
}
