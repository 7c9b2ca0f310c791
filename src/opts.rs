//! Rendering options forwarded to whichever renderer runs.
//!
//! All fields are optional; only options that were explicitly set appear in
//! the object produced by [`Opts::to_json`], so renderers see their own
//! defaults for everything else. Field semantics follow the upstream KaTeX
//! option set (<https://katex.org/docs/options.html>), with a few
//! Temml-specific additions (<https://temml.org/docs/en/administration#options>).

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};

/// Which output format a renderer should produce.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputType {
    /// Visual HTML only.
    Html,
    /// MathML only. This is the output type that routes to the MathML
    /// renderer when one is registered.
    Mathml,
    /// HTML for visual rendering plus MathML for accessibility.
    HtmlAndMathml,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputType::Html => "html",
            OutputType::Mathml => "mathml",
            OutputType::HtmlAndMathml => "htmlAndMathml",
        })
    }
}

/// Where the MathML renderer may insert soft line breaks.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WrapMode {
    /// Break after every top-level relation and binary operator.
    Tex,
    /// Break after every top-level `=` except the first.
    Equals,
    /// No soft line breaks.
    None,
}

impl fmt::Display for WrapMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WrapMode::Tex => "tex",
            WrapMode::Equals => "=",
            WrapMode::None => "none",
        })
    }
}

/// Options passed alongside the source markup on every render call.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    display_mode: Option<bool>,
    output_type: Option<OutputType>,
    leqno: Option<bool>,
    fleqn: Option<bool>,
    throw_on_error: Option<bool>,
    error_color: Option<String>,
    macros: HashMap<String, String>,
    min_rule_thickness: Option<f64>,
    max_size: Option<f64>,
    max_expand: Option<i32>,
    trust: Option<bool>,
    annotate: Option<bool>,
    wrap: Option<WrapMode>,
    xml: Option<bool>,
}

impl Opts {
    pub fn builder() -> OptsBuilder {
        OptsBuilder::default()
    }

    /// Whether the requested output is MathML only. Drives registry dispatch:
    /// MathML-only requests go to the MathML renderer when one is present.
    pub fn is_mathml_only(&self) -> bool {
        self.output_type == Some(OutputType::Mathml)
    }

    /// Serialize the explicitly set options to a camelCase JSON object, the
    /// shape both vendored renderers accept as their second argument.
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        if let Some(v) = self.display_mode {
            obj.insert("displayMode".to_owned(), Value::Bool(v));
        }
        if let Some(v) = self.output_type {
            obj.insert("output".to_owned(), Value::String(v.to_string()));
        }
        if let Some(v) = self.leqno {
            obj.insert("leqno".to_owned(), Value::Bool(v));
        }
        if let Some(v) = self.fleqn {
            obj.insert("fleqn".to_owned(), Value::Bool(v));
        }
        if let Some(v) = self.throw_on_error {
            obj.insert("throwOnError".to_owned(), Value::Bool(v));
        }
        if let Some(v) = &self.error_color {
            obj.insert("errorColor".to_owned(), Value::String(v.clone()));
        }
        if !self.macros.is_empty() {
            let macros = self
                .macros
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            obj.insert("macros".to_owned(), Value::Object(macros));
        }
        if let Some(v) = self.min_rule_thickness {
            obj.insert("minRuleThickness".to_owned(), serde_json::json!(v));
        }
        if let Some(v) = self.max_size {
            obj.insert("maxSize".to_owned(), serde_json::json!(v));
        }
        if let Some(v) = self.max_expand {
            obj.insert("maxExpand".to_owned(), serde_json::json!(v));
        }
        if let Some(v) = self.trust {
            obj.insert("trust".to_owned(), Value::Bool(v));
        }
        if let Some(v) = self.annotate {
            obj.insert("annotate".to_owned(), Value::Bool(v));
        }
        if let Some(v) = self.wrap {
            obj.insert("wrap".to_owned(), Value::String(v.to_string()));
        }
        if let Some(v) = self.xml {
            obj.insert("xml".to_owned(), Value::Bool(v));
        }
        Value::Object(obj)
    }
}

impl AsRef<Opts> for Opts {
    fn as_ref(&self) -> &Opts {
        self
    }
}

/// Fluent builder for [`Opts`].
#[derive(Clone, Debug, Default)]
pub struct OptsBuilder {
    opts: Opts,
}

impl OptsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render in display (block) mode instead of inline.
    pub fn display_mode(mut self, flag: bool) -> Self {
        self.opts.display_mode = Some(flag);
        self
    }

    /// Which format(s) to emit.
    pub fn output_type(mut self, output_type: OutputType) -> Self {
        self.opts.output_type = Some(output_type);
        self
    }

    /// Place equation tags on the left (LaTeX `leqno`).
    pub fn leqno(mut self, flag: bool) -> Self {
        self.opts.leqno = Some(flag);
        self
    }

    /// Left-align display math instead of centering (LaTeX `fleqn`).
    pub fn fleqn(mut self, flag: bool) -> Self {
        self.opts.fleqn = Some(flag);
        self
    }

    /// Whether invalid input raises an error instead of producing styled
    /// error nodes.
    pub fn throw_on_error(mut self, flag: bool) -> Self {
        self.opts.throw_on_error = Some(flag);
        self
    }

    /// CSS color applied to invalid input segments when `throw_on_error`
    /// is off.
    pub fn error_color(mut self, color: impl Into<String>) -> Self {
        self.opts.error_color = Some(color.into());
        self
    }

    /// Add one custom macro mapping. Duplicate names are overwritten by
    /// later calls.
    pub fn add_macro(mut self, name: impl Into<String>, expansion: impl Into<String>) -> Self {
        self.opts.macros.insert(name.into(), expansion.into());
        self
    }

    /// Replace the whole macro table.
    pub fn macros(mut self, macros: HashMap<String, String>) -> Self {
        self.opts.macros = macros;
        self
    }

    /// Minimum thickness, in ems, for fraction lines and rules.
    pub fn min_rule_thickness(mut self, value: f64) -> Self {
        self.opts.min_rule_thickness = Some(value);
        self
    }

    /// Maximum size, in ems, for user-specified sizes.
    pub fn max_size(mut self, value: f64) -> Self {
        self.opts.max_size = Some(value);
        self
    }

    /// Limit macro expansions to the given count.
    pub fn max_expand(mut self, value: i32) -> Self {
        self.opts.max_expand = Some(value);
        self
    }

    /// Effectively remove the macro expansion limit (`i32::MAX` expansions).
    pub fn max_expand_unlimited(mut self) -> Self {
        self.opts.max_expand = Some(i32::MAX);
        self
    }

    /// Trust user input for potentially unsafe commands (`\url{}` etc.).
    /// Keep off for untrusted sources.
    pub fn trust(mut self, flag: bool) -> Self {
        self.opts.trust = Some(flag);
        self
    }

    /// MathML-specific: annotate the output with the source markup.
    pub fn annotate(mut self, flag: bool) -> Self {
        self.opts.annotate = Some(flag);
        self
    }

    /// MathML-specific: soft line break placement.
    pub fn wrap(mut self, mode: WrapMode) -> Self {
        self.opts.wrap = Some(mode);
        self
    }

    /// MathML-specific: include the XML namespace on `<math>` elements.
    pub fn xml(mut self, flag: bool) -> Self {
        self.opts.xml = Some(flag);
        self
    }

    pub fn build(self) -> Opts {
        self.opts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn unset_opts_serialize_to_empty_object() {
        assert_eq!(Opts::default().to_json(), json!({}));
    }

    #[test]
    fn set_opts_serialize_camel_case() {
        let opts = Opts::builder()
            .display_mode(true)
            .output_type(OutputType::HtmlAndMathml)
            .throw_on_error(false)
            .error_color("#cc0000")
            .max_expand(64)
            .build();
        assert_eq!(
            opts.to_json(),
            json!({
                "displayMode": true,
                "output": "htmlAndMathml",
                "throwOnError": false,
                "errorColor": "#cc0000",
                "maxExpand": 64,
            })
        );
    }

    #[test]
    fn macros_only_emitted_when_present() {
        let opts = Opts::builder()
            .add_macro(r"\RR", r"\mathbb{R}")
            .build();
        assert_eq!(
            opts.to_json(),
            json!({ "macros": { r"\RR": r"\mathbb{R}" } })
        );
    }

    #[test]
    fn max_expand_unlimited_emits_i32_max() {
        let opts = Opts::builder().max_expand_unlimited().build();
        assert_eq!(opts.to_json(), json!({ "maxExpand": i32::MAX }));
    }

    #[test]
    fn mathml_only_detection() {
        assert!(!Opts::default().is_mathml_only());
        assert!(!Opts::builder()
            .output_type(OutputType::Html)
            .build()
            .is_mathml_only());
        assert!(Opts::builder()
            .output_type(OutputType::Mathml)
            .build()
            .is_mathml_only());
    }

    #[test]
    fn wrap_mode_display_strings() {
        assert_eq!(WrapMode::Tex.to_string(), "tex");
        assert_eq!(WrapMode::Equals.to_string(), "=");
        assert_eq!(WrapMode::None.to_string(), "none");
    }
}
