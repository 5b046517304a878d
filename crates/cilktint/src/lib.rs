pub mod annotator;
pub mod diagnostics;
pub mod scope;
pub mod stack;
pub mod subtoken;
pub mod symbols;
pub mod theme;
pub mod token;

pub use annotator::{annotate, Annotated};
pub use diagnostics::{render_anomalies, Anomaly, AnomalyKind};
pub use stack::{ScopeStack, SemanticScope};
pub use symbols::SymbolTable;
pub use theme::{Theme, ThemeError, ThemeRegistry};
pub use token::{Explanation, ScopeMatch, ThemedToken};
