//! Parameter binding (spec §4.2 "Parameter binding", §9 "Parameter
//! indexing", "Inline vs parameterised").

use crate::render::value::render_scalar_inline;
use crate::value::{Scalar, Value};

#[derive(Debug, Clone, Copy)]
pub struct BindOptions {
    pub inline: bool,
}

/// Accumulates bound parameters for a single statement, handing back
/// either a `?N` placeholder (parameterised mode, the default) or the
/// value serialised and quoted inline.
#[derive(Debug, Default)]
pub struct ParamSink {
    params: Vec<Value>,
    inline: bool,
}

impl ParamSink {
    pub fn new(opts: BindOptions) -> Self {
        Self {
            params: Vec::new(),
            inline: opts.inline,
        }
    }

    /// Bind a literal or null value, returning the SQL text to splice in.
    /// Explicit 1-based indices (`?1`, `?2`, ...) are used even for
    /// repeated values, so the params vector stays in lockstep with the
    /// source of truth (spec §9).
    pub fn bind_scalar(&mut self, scalar: Option<&Scalar>) -> String {
        match scalar {
            None => {
                if self.inline {
                    "NULL".to_string()
                } else {
                    self.params.push(Value::Null);
                    format!("?{}", self.params.len())
                }
            }
            Some(s) => {
                if self.inline {
                    render_scalar_inline(s)
                } else {
                    self.params.push(Value::Literal(s.clone()));
                    format!("?{}", self.params.len())
                }
            }
        }
    }

    pub fn into_params(self) -> Vec<Value> {
        self.params
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }
}
