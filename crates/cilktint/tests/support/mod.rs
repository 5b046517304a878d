#![allow(dead_code)]

use cilktint::{Explanation, ScopeMatch, Theme, ThemedToken};

/// Token with a single explanation span, the common tokenizer output shape.
pub fn tok(content: &str, scopes: &[&str]) -> ThemedToken {
    multi(&[(content, scopes)])
}

/// Token with one explanation span per entry, concatenating to the content.
pub fn multi(spans: &[(&str, &[&str])]) -> ThemedToken {
    let content: String = spans.iter().map(|(text, _)| *text).collect();
    ThemedToken {
        content,
        offset: 0,
        color: Some("#D4D4D4".to_string()),
        font_style: 0,
        explanation: Some(
            spans
                .iter()
                .map(|(text, scopes)| Explanation {
                    content: text.to_string(),
                    scopes: scopes
                        .iter()
                        .map(|name| ScopeMatch {
                            scope_name: name.to_string(),
                            theme_matches: Vec::new(),
                        })
                        .collect(),
                })
                .collect(),
        ),
    }
}

/// Token the tokenizer produced without explanations.
pub fn plain(content: &str) -> ThemedToken {
    ThemedToken {
        content: content.to_string(),
        offset: 0,
        color: Some("#D4D4D4".to_string()),
        font_style: 0,
        explanation: None,
    }
}

pub fn line_text(line: &[ThemedToken]) -> String {
    line.iter().map(|token| token.content.as_str()).collect()
}

pub fn flat_scopes(token: &ThemedToken) -> Vec<String> {
    token
        .explanation
        .iter()
        .flatten()
        .flat_map(|explained| explained.scopes.iter())
        .map(|scope| scope.scope_name.clone())
        .collect()
}

pub fn has_scope(token: &ThemedToken, selector: &str) -> bool {
    flat_scopes(token)
        .iter()
        .any(|scope| cilktint::scope::matches_one(selector, scope))
}

/// Find the first token whose trimmed content equals `content`.
pub fn find_token<'a>(lines: &'a [Vec<ThemedToken>], content: &str) -> &'a ThemedToken {
    lines
        .iter()
        .flatten()
        .find(|token| token.content.trim() == content)
        .unwrap_or_else(|| panic!("no token with content {content:?}"))
}

/// Walk the output in order and check that tokens with the expected contents
/// appear in sequence, each carrying every listed scope selector.
pub fn assert_scope_sequence(lines: &[Vec<ThemedToken>], expected: &[(&str, &[&str])]) {
    let mut pending = expected.iter();
    let mut current = pending.next();
    for token in lines.iter().flatten() {
        let Some((content, selectors)) = current else {
            return;
        };
        if token.content.trim() == *content {
            for selector in *selectors {
                assert!(
                    has_scope(token, selector),
                    "token {:?} missing scope {selector:?}, has {:?}",
                    token.content,
                    flat_scopes(token)
                );
            }
            current = pending.next();
        }
    }
    if let Some((content, _)) = current {
        panic!("expected token {content:?} never appeared");
    }
}

pub fn test_theme() -> Theme {
    Theme::from_json(
        r##"{
            "name": "cilkbook",
            "settings": [
                { "settings": { "foreground": "#D4D4D4" } },
                { "scope": "comment", "settings": { "foreground": "#6A9955", "fontStyle": "italic" } },
                { "scope": "keyword.control", "settings": { "foreground": "#C586C0" } },
                { "scope": "storage.type", "settings": { "foreground": "#569CD6" } },
                { "scope": "entity.name.type, entity.name.type.defined",
                  "settings": { "foreground": "#4EC9B0" } },
                { "scope": "entity.name.function", "settings": { "foreground": "#DCDCAA" } },
                { "scope": "entity.name.function.definition",
                  "settings": { "foreground": "#DCDCAA", "fontStyle": "bold" } },
                { "scope": "meta.definition.variable.name", "settings": { "foreground": "#9CDCFE" } },
                { "scope": "storage.modifier.pointer, storage.modifier.reference",
                  "settings": { "foreground": "#D16969" } },
                { "scope": "punctuation.section.angle-brackets", "settings": { "foreground": "#808080" } },
                { "scope": "constant.numeric", "settings": { "foreground": "#B5CEA8" } }
            ]
        }"##,
    )
    .expect("test theme JSON")
}
