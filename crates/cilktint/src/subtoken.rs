use crate::scope::{explain_theme_scope, matches_any};
use crate::theme::Theme;
use crate::token::{Explanation, ScopeMatch, ThemedToken};

/// One explanation of a token lifted out as the annotator's unit of work.
///
/// The subtoken list for a token is a live partition of the token's content:
/// splits grow the list but the concatenated text never changes.
#[derive(Debug, Clone)]
pub struct Subtoken {
    pub explanation: Explanation,
    pub scopes: Vec<String>,
}

impl Subtoken {
    pub fn content(&self) -> &str {
        &self.explanation.content
    }

    pub fn is_comment(&self) -> bool {
        matches_any(&["comment"], &self.scopes)
    }
}

/// Lift a token's explanations into subtokens, or `None` when the token has
/// no explanation and must be passed through untouched.
pub fn explained_subtokens(token: &ThemedToken) -> Option<Vec<Subtoken>> {
    let explanation = token.explanation.as_ref()?;
    Some(
        explanation
            .iter()
            .map(|explained| Subtoken {
                scopes: explained
                    .scopes
                    .iter()
                    .map(|scope| scope.scope_name.clone())
                    .collect(),
                explanation: explained.clone(),
            })
            .collect(),
    )
}

/// Split `subtokens[index]` at `byte_index`. The left part replaces the
/// original in place and the right part is inserted immediately after it.
/// Refused (returning false) when the right part would be empty or the index
/// does not lie on a character boundary.
pub fn split_at(subtokens: &mut Vec<Subtoken>, index: usize, byte_index: usize) -> bool {
    let content = subtokens[index].content();
    if byte_index == 0 || byte_index >= content.len() || !content.is_char_boundary(byte_index) {
        return false;
    }
    let mut right = subtokens[index].clone();
    right.explanation.content = content[byte_index..].to_string();
    subtokens[index].explanation.content.truncate(byte_index);
    subtokens.insert(index + 1, right);
    true
}

/// Rebuild `subtokens[index]` as a standalone token.
///
/// The offset is the owning token's offset plus the length of every subtoken
/// preceding this one in the live partition. With `new_scope` set, a
/// synthetic `<scope>.sema` match is appended to the carried explanation and
/// the style is re-resolved against the theme: the last matching rule wins
/// and a rule without a font style resets the style to none.
pub fn build_token(
    token: &ThemedToken,
    subtokens: &[Subtoken],
    index: usize,
    new_scope: Option<(&str, &Theme)>,
) -> ThemedToken {
    let offset = token.offset
        + subtokens[..index]
            .iter()
            .map(|subtoken| subtoken.content().chars().count())
            .sum::<usize>();

    let subtoken = &subtokens[index];
    let mut explanation = subtoken.explanation.clone();
    let mut color = token.color.clone();
    let mut font_style = token.font_style;

    if let Some((name, theme)) = new_scope {
        let theme_matches = explain_theme_scope(theme, name, &subtoken.scopes);
        if let Some(last) = theme_matches.last() {
            color = last.settings.foreground.clone();
            font_style = last.settings.font_style_bits();
        }
        explanation.scopes.push(ScopeMatch {
            scope_name: format!("{name}.sema"),
            theme_matches: theme_matches.into_iter().cloned().collect(),
        });
    }

    ThemedToken {
        content: subtoken.content().to_string(),
        offset,
        color,
        font_style,
        explanation: Some(vec![explanation]),
    }
}

/// Append the plain rebuilds of every unflushed subtoken before `upto`,
/// skipping comment spans. Keeps the output aligned with the partition when
/// the state machine consumed subtokens without emitting them.
pub fn backfill(
    output: &mut Vec<ThemedToken>,
    flushed: &mut usize,
    token: &ThemedToken,
    upto: usize,
    subtokens: &[Subtoken],
) {
    for index in *flushed..upto {
        if subtokens[index].is_comment() {
            continue;
        }
        output.push(build_token(token, subtokens, index, None));
    }
    if upto > *flushed {
        *flushed = upto;
    }
}

/// Append `built` (the rebuild of `subtokens[index]`), backfilling everything
/// skipped since the last emission first.
pub fn emit(
    output: &mut Vec<ThemedToken>,
    flushed: &mut usize,
    token: &ThemedToken,
    built: ThemedToken,
    index: usize,
    subtokens: &[Subtoken],
) {
    backfill(output, flushed, token, index, subtokens);
    output.push(built);
    *flushed = index + 1;
}
