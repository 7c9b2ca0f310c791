//! Glue for embedding math renderers: an explicit [`registry::Registry`] of
//! render-to-string functions (one primary renderer, plus an optional
//! MathML-only renderer decided once at construction), and the
//! [`fetch`] module behind the `texglue-vendor` binary that stages pinned
//! Temml release artifacts into the local vendor directory.

pub mod errors;
pub mod fetch;
pub mod opts;
pub mod registry; // explicit registration, replaces ambient-global exposure

pub use errors::{GlueError, Result};
pub use opts::{Opts, OptsBuilder, OutputType, WrapMode};
pub use registry::{from_fn, global, install, Registry, Renderer, MATHML_ALIAS, PRIMARY_ALIAS};
