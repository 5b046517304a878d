#![no_main]

use libfuzzer_sys::fuzz_target;

use cilktint::{Explanation, ScopeMatch, Theme, ThemedToken};

// Scope names that drive the annotator's transitions, so mutated inputs
// reach deep into the state machine instead of falling through everywhere.
const SCOPE_POOL: &[&str] = &[
    "source.cilkcpp",
    "comment.line.double-slash.cilkcpp",
    "storage.type.built-in.primitive.cilkcpp",
    "storage.type.struct.cilkcpp",
    "storage.type.template.cilkcpp",
    "storage.type.template.argument.typename.cilkcpp",
    "storage.type.namespace.definition.cilkcpp",
    "entity.name.type.template.cilkcpp",
    "entity.name.type.alias.cilkcpp",
    "entity.name.function.cilkcpp",
    "keyword.other.typedef.cilkcpp",
    "keyword.operator.assignment.cilkcpp",
    "keyword.operator.cast.static.cilkcpp",
    "meta.function.definition.cilkcpp",
    "meta.function.definition.parameters.cilkcpp",
    "meta.block.cilkcpp",
    "punctuation.section.block.begin.bracket.curly.cilkcpp",
    "punctuation.section.block.end.bracket.curly.cilkcpp",
    "punctuation.section.block.end.bracket.curly.namespace.cilkcpp",
    "punctuation.section.angle-brackets.begin.template.cilkcpp",
    "punctuation.section.angle-brackets.end.template.cilkcpp",
    "punctuation.section.parens.begin.bracket.round.cilkcpp",
    "punctuation.section.parens.end.bracket.round.cilkcpp",
    "punctuation.terminator.statement.cilkcpp",
    "punctuation.separator.delimiter.cilkcpp",
    "punctuation.definition.begin.bracket.square.cilkcpp",
    "punctuation.definition.end.bracket.square.cilkcpp",
];

fn synthesize_lines(text: &str) -> Vec<Vec<ThemedToken>> {
    let mut lines = Vec::new();
    for (line_index, line) in text.lines().take(256).enumerate() {
        let mut tokens = Vec::new();
        let mut offset = 0usize;
        for (word_index, word) in line.split_inclusive(' ').take(256).enumerate() {
            let pick = line_index
                .wrapping_mul(31)
                .wrapping_add(word_index.wrapping_mul(7))
                .wrapping_add(word.len());
            tokens.push(ThemedToken {
                content: word.to_string(),
                offset,
                color: None,
                font_style: 0,
                explanation: Some(vec![Explanation {
                    content: word.to_string(),
                    scopes: vec![
                        ScopeMatch {
                            scope_name: "source.cilkcpp".to_string(),
                            theme_matches: Vec::new(),
                        },
                        ScopeMatch {
                            scope_name: SCOPE_POOL[pick % SCOPE_POOL.len()].to_string(),
                            theme_matches: Vec::new(),
                        },
                    ],
                }]),
            });
            offset += word.chars().count();
        }
        lines.push(tokens);
    }
    lines
}

fuzz_target!(|data: &[u8]| {
    if data.len() > 64 * 1024 {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let theme = Theme::empty();

    // Token-stream JSON when the input parses as one, otherwise tokens
    // synthesized from the raw text. Annotation must terminate without
    // panicking either way; anomalies are the only acceptable complaint.
    let lines = match serde_json::from_str::<Vec<Vec<ThemedToken>>>(text) {
        Ok(lines) => lines,
        Err(_) => synthesize_lines(text),
    };
    let annotated = cilktint::annotate(&lines, &theme);
    assert_eq!(annotated.lines.len(), lines.len());
});
