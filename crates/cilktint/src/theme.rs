use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::token::font_style;

/// A resolved color theme: an ordered list of scope-selector rules.
///
/// Rule order is significant. `explain_theme_scope` collects matches in
/// declaration order and callers apply the last (most specific) one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub settings: Vec<ThemeSetting>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeSetting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<ScopeSelector>,
    #[serde(default)]
    pub settings: StyleSettings,
}

/// Theme JSON writes a selector either as one comma-separated string or as a
/// list of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeSelector {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_style: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ThemeError {
    #[error("invalid theme JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl Theme {
    pub fn from_json(json: &str) -> Result<Self, ThemeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The themeless fallback: annotation still appends semantic scopes, it
    /// just never restyles a token.
    pub fn empty() -> Self {
        Theme {
            name: "none".to_string(),
            settings: Vec::new(),
        }
    }
}

impl ScopeSelector {
    /// The comma-separated alternatives of this selector. Each alternative
    /// may still carry space-separated ancestor qualifiers.
    pub fn alternatives(&self) -> Vec<&str> {
        match self {
            ScopeSelector::One(raw) => raw.split(',').map(str::trim).collect(),
            ScopeSelector::Many(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

impl StyleSettings {
    /// Parse the theme's font style word list ("italic bold underline") into
    /// the tokenizer's numeric bits. An absent or unrecognized style is none.
    pub fn font_style_bits(&self) -> i32 {
        let Some(words) = &self.font_style else {
            return font_style::NONE;
        };
        let mut bits = font_style::NONE;
        for word in words.split_whitespace() {
            match word {
                "italic" => bits |= font_style::ITALIC,
                "bold" => bits |= font_style::BOLD,
                "underline" => bits |= font_style::UNDERLINE,
                _ => {}
            }
        }
        bits
    }
}

/// Caller-owned cache of parsed themes.
///
/// Replaces any notion of a process-global theme: the owner decides the
/// lifetime, and the `Arc` handles can be shared freely across concurrent
/// annotation calls because themes are read-only once built.
#[derive(Debug, Default)]
pub struct ThemeRegistry {
    themes: HashMap<String, Arc<Theme>>,
}

impl ThemeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, theme: Theme) -> Arc<Theme> {
        let name = theme.name.clone();
        let shared = Arc::new(theme);
        self.themes.insert(name, Arc::clone(&shared));
        shared
    }

    pub fn get(&self, name: &str) -> Option<Arc<Theme>> {
        self.themes.get(name).cloned()
    }

    /// Return the cached theme for `name`, parsing and caching `json` on the
    /// first request.
    pub fn get_or_load(&mut self, name: &str, json: &str) -> Result<Arc<Theme>, ThemeError> {
        if let Some(theme) = self.themes.get(name) {
            return Ok(Arc::clone(theme));
        }
        let mut theme = Theme::from_json(json)?;
        if theme.name.is_empty() {
            theme.name = name.to_string();
        }
        let shared = Arc::new(theme);
        self.themes.insert(name.to_string(), Arc::clone(&shared));
        Ok(shared)
    }
}
