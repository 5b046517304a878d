use serde::{Deserialize, Serialize};

use crate::theme::ThemeSetting;

/// Font style bits as emitted by the tokenizer: 0 is plain text.
pub mod font_style {
    pub const NONE: i32 = 0;
    pub const ITALIC: i32 = 1;
    pub const BOLD: i32 = 2;
    pub const UNDERLINE: i32 = 4;
}

/// One styled run of source text as produced by the lexical tokenizer.
///
/// When the tokenizer ran with explanations enabled, `explanation` records
/// the sub-spans of `content` together with the lexical scope path that
/// matched each of them. The explanations partition `content` contiguously.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemedToken {
    pub content: String,
    #[serde(default)]
    pub offset: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub font_style: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Vec<Explanation>>,
}

/// A sub-span of a token's content with the scopes that matched it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub content: String,
    pub scopes: Vec<ScopeMatch>,
}

/// A lexical scope name plus the theme rules that matched it, ordered from
/// least to most specific within the owning explanation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeMatch {
    pub scope_name: String,
    #[serde(default)]
    pub theme_matches: Vec<ThemeSetting>,
}

impl ThemedToken {
    /// A token with no explanation is passed through annotation untouched.
    pub fn has_explanation(&self) -> bool {
        self.explanation.as_ref().is_some_and(|list| !list.is_empty())
    }
}
