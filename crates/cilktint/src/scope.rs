use crate::theme::{Theme, ThemeSetting};

/// TextMate selector semantics: a selector matches itself and any
/// dot-separated descendant of itself.
pub fn matches_one(selector: &str, scope: &str) -> bool {
    match scope.strip_prefix(selector) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

/// True if any selector matches any scope in the path. Scanned from the most
/// specific scope down; only the boolean is observable.
pub fn matches_any(selectors: &[&str], scopes: &[String]) -> bool {
    selectors
        .iter()
        .any(|selector| scopes.iter().rev().any(|scope| matches_one(selector, scope)))
}

/// True if any selector matches the most specific scope of the path.
pub fn matches_leaf(selectors: &[&str], scopes: &[String]) -> bool {
    scopes
        .last()
        .is_some_and(|leaf| selectors.iter().any(|selector| matches_one(selector, leaf)))
}

/// Match a qualified selector against a scope and its ancestor chain.
///
/// Ancestor qualifiers are consumed right to left and may skip over actual
/// ancestors (descendant combinator, not child combinator). The match
/// succeeds only if every qualifier found a home.
pub fn matches(
    selector: &str,
    selector_ancestors: &[&str],
    scope: &str,
    ancestors: &[String],
) -> bool {
    if !matches_one(selector, scope) {
        return false;
    }
    let mut pending = selector_ancestors.iter().rev().peekable();
    for ancestor in ancestors.iter().rev() {
        let Some(qualifier) = pending.peek() else {
            break;
        };
        if matches_one(qualifier, ancestor) {
            pending.next();
        }
    }
    pending.next().is_none()
}

/// Collect, in declaration order, every theme rule whose selector matches
/// `scope` in the context of `ancestors`. The caller treats the last match
/// as the effective style.
pub fn explain_theme_scope<'t>(
    theme: &'t Theme,
    scope: &str,
    ancestors: &[String],
) -> Vec<&'t ThemeSetting> {
    let mut result = Vec::new();
    for setting in &theme.settings {
        let Some(selector) = &setting.scope else {
            continue;
        };
        for alternative in selector.alternatives() {
            let mut pieces: Vec<&str> = alternative.split(' ').collect();
            let Some(leaf) = pieces.pop() else {
                continue;
            };
            if matches(leaf, &pieces, scope, ancestors) {
                result.push(setting);
                break;
            }
        }
    }
    result
}
