//! Explicit registration of math renderers.
//!
//! Instead of mutating any ambient namespace, callers construct a [`Registry`]
//! from one or two render functions at initialization time. The capability set
//! (render-only vs render + MathML) is decided exactly once, at construction;
//! the registry is immutable afterwards, so the registered function references
//! stay stable for the life of the process. Callers who need process-wide
//! reach can [`install`] a registry into a once-only global slot.

use std::sync::{Arc, OnceLock};

use crate::errors::{GlueError, Result};
use crate::opts::Opts;

/// Alias under which the primary renderer is always reachable.
pub const PRIMARY_ALIAS: &str = "katexRenderToString";

/// Alias under which the MathML renderer is reachable when registered.
pub const MATHML_ALIAS: &str = "temmlRenderToString";

/// Trait for pluggable render-to-string functions.
///
/// A renderer takes source markup and options and returns the rendered
/// string, with no side effects.
pub trait Renderer: Send + Sync {
    fn name(&self) -> &'static str;
    fn render_to_string(&self, source: &str, opts: &Opts) -> Result<String>;
}

struct FnRenderer<F> {
    name: &'static str,
    f: F,
}

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&str, &Opts) -> Result<String> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn render_to_string(&self, source: &str, opts: &Opts) -> Result<String> {
        (self.f)(source, opts)
    }
}

/// Wrap a plain function or closure as a [`Renderer`].
pub fn from_fn<F>(name: &'static str, f: F) -> Arc<dyn Renderer>
where
    F: Fn(&str, &Opts) -> Result<String> + Send + Sync + 'static,
{
    Arc::new(FnRenderer { name, f })
}

/// Immutable set of renderers, resolved once at construction.
#[derive(Clone)]
pub struct Registry {
    primary: Arc<dyn Renderer>,
    mathml: Option<Arc<dyn Renderer>>,
}

impl Registry {
    /// Render-only capability set: the primary renderer handles everything.
    pub fn new(primary: Arc<dyn Renderer>) -> Self {
        Self {
            primary,
            mathml: None,
        }
    }

    /// Extended capability set: MathML-only requests are routed to the
    /// dedicated MathML renderer.
    pub fn with_mathml(primary: Arc<dyn Renderer>, mathml: Arc<dyn Renderer>) -> Self {
        Self {
            primary,
            mathml: Some(mathml),
        }
    }

    /// Whether a MathML renderer was supplied at construction.
    pub fn has_mathml(&self) -> bool {
        self.mathml.is_some()
    }

    /// Look up a renderer by its fixed alias. [`PRIMARY_ALIAS`] always
    /// resolves; [`MATHML_ALIAS`] resolves iff the MathML renderer was
    /// supplied at construction.
    pub fn get(&self, alias: &str) -> Option<Arc<dyn Renderer>> {
        if alias == PRIMARY_ALIAS {
            Some(Arc::clone(&self.primary))
        } else if alias == MATHML_ALIAS {
            self.mathml.as_ref().map(Arc::clone)
        } else {
            None
        }
    }

    /// Like [`get`](Self::get) but reports unknown or absent aliases as an
    /// error instead of `None`.
    pub fn resolve(&self, alias: &str) -> Result<Arc<dyn Renderer>> {
        self.get(alias)
            .ok_or_else(|| GlueError::UnknownAlias(alias.to_owned()))
    }

    /// Render source markup, dispatching on the requested output type: the
    /// MathML renderer is used iff one is registered and the options ask for
    /// MathML-only output, otherwise the primary renderer runs.
    pub fn render(&self, source: &str, opts: impl AsRef<Opts>) -> Result<String> {
        let opts = opts.as_ref();
        match &self.mathml {
            Some(mathml) if opts.is_mathml_only() => mathml.render_to_string(source, opts),
            _ => self.primary.render_to_string(source, opts),
        }
    }
}

/// Once-only global registry slot.
static GLOBAL: OnceLock<Registry> = OnceLock::new();

/// Install a registry as the process-wide default. The first install wins;
/// returns `false` (leaving the existing registry untouched) if one was
/// already installed.
pub fn install(registry: Registry) -> bool {
    GLOBAL.set(registry).is_ok()
}

/// The process-wide registry, if one has been installed.
pub fn global() -> Option<&'static Registry> {
    GLOBAL.get()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_primary() -> Arc<dyn Renderer> {
        from_fn("fake-katex", |src, _| Ok(format!("<span>{src}</span>")))
    }

    fn fake_mathml() -> Arc<dyn Renderer> {
        from_fn("fake-temml", |src, _| Ok(format!("<math>{src}</math>")))
    }

    #[test]
    fn primary_alias_resolves_to_registered_reference() {
        let primary = fake_primary();
        let reg = Registry::new(Arc::clone(&primary));
        let got = reg.get(PRIMARY_ALIAS).unwrap();
        assert!(Arc::ptr_eq(&got, &primary));
    }

    #[test]
    fn mathml_alias_absent_without_capability() {
        let reg = Registry::new(fake_primary());
        assert!(!reg.has_mathml());
        assert!(reg.get(MATHML_ALIAS).is_none());
        assert!(matches!(
            reg.resolve(MATHML_ALIAS),
            Err(GlueError::UnknownAlias(_))
        ));
    }

    #[test]
    fn mathml_alias_resolves_when_supplied() {
        let mathml = fake_mathml();
        let reg = Registry::with_mathml(fake_primary(), Arc::clone(&mathml));
        let got = reg.get(MATHML_ALIAS).unwrap();
        assert!(Arc::ptr_eq(&got, &mathml));
    }

    #[test]
    fn unknown_alias_is_rejected() {
        let reg = Registry::new(fake_primary());
        assert!(reg.get("renderToString").is_none());
    }

    #[test]
    fn dispatch_prefers_mathml_only_for_mathml_output() {
        use crate::opts::{Opts, OutputType};

        let reg = Registry::with_mathml(fake_primary(), fake_mathml());
        let inline = reg.render("x", Opts::default()).unwrap();
        assert_eq!(inline, "<span>x</span>");

        let mathml_opts = Opts::builder().output_type(OutputType::Mathml).build();
        let mathml = reg.render("x", &mathml_opts).unwrap();
        assert_eq!(mathml, "<math>x</math>");

        // Without the capability, MathML-only requests still hit the primary.
        let render_only = Registry::new(fake_primary());
        assert_eq!(render_only.render("x", &mathml_opts).unwrap(), "<span>x</span>");
    }
}
