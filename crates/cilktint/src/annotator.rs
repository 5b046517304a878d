use serde::Serialize;

use crate::diagnostics::Anomaly;
use crate::scope::{matches_any, matches_leaf};
use crate::stack::{ScopeStack, SemanticScope};
use crate::subtoken::{backfill, build_token, emit, explained_subtokens, split_at, Subtoken};
use crate::symbols::SymbolTable;
use crate::theme::Theme;
use crate::token::ThemedToken;

/// Result of one annotation pass: the rewritten token lines plus the
/// anomalies observed along the way.
#[derive(Debug, Serialize)]
pub struct Annotated {
    pub lines: Vec<Vec<ThemedToken>>,
    pub anomalies: Vec<Anomaly>,
}

/// Re-derive semantic roles for a lexically tokenized source.
///
/// Walks the token lines left to right, tracking declarations in a scope
/// stack and symbol table built as they are seen. Tokens that trigger no
/// rule pass through untouched; reclassified tokens get a `.sema` scope
/// appended and their style re-resolved against `theme`. Comment spans are
/// dropped. The pass never fails: malformed input degrades to pass-through
/// plus anomalies.
pub fn annotate(lines: &[Vec<ThemedToken>], theme: &Theme) -> Annotated {
    Annotator::new(theme).run(lines)
}

const TYPE_DEFINED: &str = "entity.name.type.defined";
const VARIABLE_NAME: &str = "meta.definition.variable.name";
const FUNCTION_DEFINITION: &str = "entity.name.function.definition";
const POINTER_MODIFIER: &str = "storage.modifier.pointer";
const REFERENCE_MODIFIER: &str = "storage.modifier.reference";
const ANGLE_BEGIN: &str = "punctuation.section.angle-brackets.begin.template";
const ANGLE_END: &str = "punctuation.section.angle-brackets.end.template";

/// Leaf scopes marking the residual text of a statement body, where a bare
/// identifier in a declaration is the declared name.
const STATEMENT_TAIL_LEAVES: &[&str] = &[
    "meta.body.function",
    "meta.body.struct",
    "meta.tail.struct",
    "meta.body.class",
    "meta.block",
    "meta.parens",
    "source",
];

enum Flow {
    /// Advance to the next subtoken.
    Next,
    /// Re-examine the same subtoken under the state a pop just exposed.
    Revisit,
}

struct TokenRun<'t> {
    token: &'t ThemedToken,
    subs: Vec<Subtoken>,
    rebuilt: Vec<ThemedToken>,
    flushed: usize,
    dropped_comment: bool,
}

struct Annotator<'t> {
    theme: &'t Theme,
    stack: ScopeStack,
    symbols: SymbolTable,
    pending_params: Vec<String>,
    pending_type: String,
    anomalies: Vec<Anomaly>,
    line: usize,
}

impl<'t> Annotator<'t> {
    fn new(theme: &'t Theme) -> Self {
        Annotator {
            theme,
            stack: ScopeStack::new(),
            symbols: SymbolTable::new(),
            pending_params: Vec::new(),
            pending_type: String::new(),
            anomalies: Vec::new(),
            line: 0,
        }
    }

    fn run(mut self, lines: &[Vec<ThemedToken>]) -> Annotated {
        let mut out_lines = Vec::with_capacity(lines.len());
        for (line_index, line) in lines.iter().enumerate() {
            self.line = line_index + 1;
            let mut out_line = Vec::with_capacity(line.len());
            for token in line {
                self.annotate_token(token, &mut out_line);
            }
            out_lines.push(out_line);
        }
        if self.stack.depth() != 0 {
            self.anomalies
                .push(Anomaly::unbalanced_scope_stack(&self.stack.open_labels()));
        }
        Annotated {
            lines: out_lines,
            anomalies: self.anomalies,
        }
    }

    fn annotate_token(&mut self, token: &ThemedToken, out_line: &mut Vec<ThemedToken>) {
        let Some(subs) = explained_subtokens(token) else {
            out_line.push(token.clone());
            return;
        };
        let mut run = TokenRun {
            token,
            subs,
            rebuilt: Vec::new(),
            flushed: 0,
            dropped_comment: false,
        };

        let mut index = 0;
        while index < run.subs.len() {
            match self.dispatch(&mut run, index) {
                Flow::Next => index += 1,
                Flow::Revisit => {}
            }
        }

        if run.rebuilt.is_empty() && !run.dropped_comment {
            out_line.push(token.clone());
        } else {
            let upto = run.subs.len();
            backfill(&mut run.rebuilt, &mut run.flushed, token, upto, &run.subs);
            out_line.extend(run.rebuilt);
        }
    }

    /// One subtoken through the state blocks, in fixed priority order.
    /// Blocks for states the declaration scanner also covers fall through
    /// into it; bracket bookkeeping at the bottom catches what remains.
    fn dispatch(&mut self, run: &mut TokenRun, index: usize) -> Flow {
        let content = run.subs[index].content().to_string();
        let trimmed = content.trim().to_string();
        let scopes = run.subs[index].scopes.clone();

        if matches_any(&["comment"], &scopes) {
            run.dropped_comment = true;
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::Structure {
            if matches_any(&["punctuation.section.block.end.bracket.curly"], &scopes) {
                self.pop_scope(&content);
                self.maybe_pop_template();
                return Flow::Next;
            }
            if matches_any(&["storage.type.struct"], &scopes) {
                self.stack.push(SemanticScope::VarDef);
                self.stack.push(SemanticScope::StructName);
                return Flow::Next;
            }
        }

        if self.stack.top() == SemanticScope::Block
            && matches_any(&["punctuation.section.block.end"], &scopes)
        {
            self.pop_scope(&content);
            if matches_any(
                &["punctuation.section.block.end.bracket.curly.namespace"],
                &scopes,
            ) {
                self.pop_scope(&content);
            }
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::Template {
            if matches_any(&["storage.type.template.argument.typename"], &scopes) {
                self.stack.push(SemanticScope::Typename);
                return Flow::Next;
            }
            if matches_any(&[ANGLE_END], &scopes) {
                self.flush_pending_params();
                // The closing angle itself falls through to the scanner.
            } else if self.symbols.is_known_type(&content) {
                self.split_known_type(run, index);
                self.emit_with_scope(run, index, TYPE_DEFINED);
                self.stack.push(SemanticScope::VarDef);
                return Flow::Next;
            }
        }

        if self.stack.top() == SemanticScope::TemplateSpec {
            if trimmed == ">" {
                self.pop_scope(&content);
                return Flow::Revisit;
            }
            if self.symbols.is_known_type(&content) {
                self.split_known_type(run, index);
                self.emit_with_scope(run, index, TYPE_DEFINED);
            } else if trimmed == "*" {
                self.emit_with_scope(run, index, POINTER_MODIFIER);
            } else if trimmed == "&" {
                self.emit_with_scope(run, index, REFERENCE_MODIFIER);
            }
            return Flow::Next;
        }

        // Declaration scanner for the states where statements begin.
        if matches!(
            self.stack.top(),
            SemanticScope::Source
                | SemanticScope::Block
                | SemanticScope::Structure
                | SemanticScope::Template
        ) {
            if matches_any(&["meta.function.definition"], &scopes) {
                self.stack.push(SemanticScope::FunctionHead);
            } else if matches_any(&["storage.type.namespace.definition"], &scopes) {
                self.stack.push(SemanticScope::Namespace);
            } else if matches_any(&["storage.type.template"], &scopes) {
                self.stack.push(SemanticScope::Template);
            } else if matches_any(&["entity.name.scope-resolution"], &scopes) {
                // Qualified names stay whatever the grammar said they are.
            } else if matches_any(&["storage.type.struct"], &scopes) {
                self.stack.push(SemanticScope::VarDef);
                self.stack.push(SemanticScope::StructName);
            } else if self.symbols.is_known_type(&content) {
                self.split_known_type(run, index);
                self.emit_with_scope(run, index, TYPE_DEFINED);
                self.stack.push(SemanticScope::VarDef);
            } else if matches_any(&["storage.type.built-in"], &scopes) {
                self.stack.push(SemanticScope::VarDef);
            } else if matches_any(&["keyword.other.using", "keyword.other.typedef"], &scopes) {
                self.stack.push(SemanticScope::Typedef);
            } else if matches_any(
                &[
                    "punctuation.section.block.begin.bracket.curly.struct",
                    "punctuation.section.block.begin.bracket.curly.class",
                ],
                &scopes,
            ) {
                self.stack.push(SemanticScope::Structure);
            } else if matches_any(&["entity.name.type.alias", "entity.name.type.class"], &scopes) {
                self.symbols.learn(&content);
            }
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::Typename {
            if matches_any(&["entity.name.type.template"], &scopes) {
                self.pending_params.push(trimmed);
            } else if content == "," {
                self.pop_scope(&content);
            } else if matches_any(&[ANGLE_END], &scopes) {
                self.flush_pending_params();
                self.pop_scope(&content);
                return Flow::Revisit;
            }
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::Typedef {
            if matches_any(&["entity.name.type"], &scopes) {
                self.pending_type = trimmed;
            } else if matches_leaf(STATEMENT_TAIL_LEAVES, &scopes) {
                let fallback = self.split_known_type(run, index);
                self.emit_with_scope(run, index, TYPE_DEFINED);
                if let Some(word) = fallback {
                    if !word.is_empty() {
                        self.pending_type = word;
                    }
                }
            } else if matches_any(&["punctuation.terminator.statement"], &scopes) {
                if !self.pending_type.is_empty() {
                    let pending = std::mem::take(&mut self.pending_type);
                    self.symbols.learn(&pending);
                }
                self.pop_scope(&content);
                self.maybe_pop_template();
            } else if matches_any(&["keyword.operator.assignment"], &scopes) {
                self.stack.push(SemanticScope::AssignmentRhs);
            } else if matches_any(&["storage.type.struct"], &scopes) {
                self.stack.push(SemanticScope::StructName);
            } else if matches_any(&["punctuation.section.block.begin.bracket.curly"], &scopes) {
                self.stack.push(SemanticScope::Structure);
            } else if self.symbols.is_known_type(&content) {
                self.split_known_type(run, index);
                self.emit_with_scope(run, index, TYPE_DEFINED);
            } else if matches_any(&["variable.other.definition.pointer.function"], &scopes) {
                self.emit_with_scope(run, index, TYPE_DEFINED);
            }
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::StructName {
            if !matches_any(&["entity.name.type"], &scopes) {
                self.emit_with_scope(run, index, "entity.name.type");
            }
            self.pop_scope(&content);
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::FunctionHead {
            if matches_any(&["punctuation.terminator.statement"], &scopes) {
                // Prototype without a body.
                self.pop_scope(&content);
                self.maybe_pop_template();
            } else if matches_any(&["punctuation.section.block.begin.bracket.curly"], &scopes) {
                self.pop_scope(&content);
                self.stack.push(SemanticScope::FunctionBody);
            }
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::FunctionBody {
            if matches_any(&["punctuation.section.block.begin.bracket.curly"], &scopes) {
                self.stack.push(SemanticScope::FunctionBody);
            } else if matches_any(&["punctuation.section.block.end.bracket.curly"], &scopes) {
                self.pop_scope(&content);
                self.maybe_pop_template();
            } else if matches_any(&["keyword.operator.cast"], &scopes) {
                self.stack.push(SemanticScope::Cast);
            } else if matches_any(&["entity.name.scope-resolution"], &scopes) {
            } else if matches_any(&["storage.type"], &scopes) {
                self.stack.push(SemanticScope::VarDef);
            } else if self.symbols.is_known_type(&content) {
                self.emit_with_scope(run, index, TYPE_DEFINED);
                self.stack.push(SemanticScope::VarDef);
            }
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::VarDef {
            if matches_any(&["entity.name.function"], &scopes) {
                self.emit_with_scope(run, index, FUNCTION_DEFINITION);
                self.pop_scope(&content);
                self.stack.push(SemanticScope::FunctionHead);
            } else if matches_any(&["meta.function.definition.parameters"], &scopes) {
                self.pop_scope(&content);
                self.stack.push(SemanticScope::FunctionHead);
            } else if matches_any(&["punctuation.section.block.begin.bracket.curly"], &scopes) {
                self.stack.push(SemanticScope::Structure);
            } else if matches_any(&["punctuation.terminator.statement"], &scopes) {
                self.pop_scope(&content);
            } else if trimmed == "<" {
                self.emit_with_scope(run, index, ANGLE_BEGIN);
                self.stack.push(SemanticScope::TemplateSpec);
            } else if self.stack.ancestor(1) == Some(SemanticScope::Template) && trimmed == ">" {
                self.pop_scope(&content);
                return Flow::Revisit;
            } else if matches_any(&["keyword.operator.assignment"], &scopes) {
                self.stack.push(SemanticScope::AssignmentRhs);
            } else if matches_any(&["punctuation.definition.begin.bracket.square"], &scopes) {
                self.stack.push(SemanticScope::ArrayIdx);
            } else if matches_leaf(&["variable.other.object", "variable.object"], &scopes) {
                self.emit_with_scope(run, index, VARIABLE_NAME);
            } else if matches_leaf(STATEMENT_TAIL_LEAVES, &scopes) {
                self.emit_declared_name(run, index, &content, &scopes);
            } else if content == "*" {
                self.emit_with_scope(run, index, POINTER_MODIFIER);
            } else if content == "&" {
                self.emit_with_scope(run, index, REFERENCE_MODIFIER);
            }
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::Parens {
            if matches_any(&["punctuation.section.parens.end.bracket.round"], &scopes) {
                self.pop_scope(&content);
                return Flow::Next;
            }
            if self.symbols.is_known_type(&content) {
                self.split_known_type(run, index);
                self.emit_with_scope(run, index, TYPE_DEFINED);
                return Flow::Next;
            }
            if trimmed == "<" {
                self.emit_with_scope(run, index, ANGLE_BEGIN);
                self.stack.push(SemanticScope::TemplateSpec);
                return Flow::Next;
            }
        }

        if self.stack.top() == SemanticScope::AssignmentRhs {
            if matches_any(&["punctuation.terminator.statement"], &scopes) {
                self.pop_scope(&content);
                return Flow::Revisit;
            }
            if matches_any(&["punctuation.separator.delimiter"], &scopes) {
                self.pop_scope(&content);
                return Flow::Next;
            }
            if matches_any(&["punctuation.section.parens.begin"], &scopes) {
                self.stack.push(SemanticScope::Parens);
                return Flow::Next;
            }
            if self.stack.ancestor(1) == Some(SemanticScope::Template) && trimmed == ">" {
                self.pop_scope(&content);
                return Flow::Revisit;
            }
            if self.symbols.is_known_type(&content) {
                self.split_known_type(run, index);
                self.emit_with_scope(run, index, TYPE_DEFINED);
                return Flow::Next;
            }
            if trimmed == "<" {
                self.emit_with_scope(run, index, ANGLE_BEGIN);
                self.stack.push(SemanticScope::TemplateSpec);
                return Flow::Next;
            }
        }

        if self.stack.top() == SemanticScope::Cast {
            if trimmed == "<" {
                self.emit_with_scope(run, index, ANGLE_BEGIN);
                self.stack.push(SemanticScope::TemplateSpec);
            } else if trimmed == ">" {
                self.emit_with_scope(run, index, ANGLE_END);
                self.pop_scope(&content);
                self.maybe_pop_template();
            }
            return Flow::Next;
        }

        if self.stack.top() == SemanticScope::ArrayIdx
            && matches_any(&["punctuation.definition.end.bracket.square"], &scopes)
        {
            self.pop_scope(&content);
            return Flow::Next;
        }

        // Bracket bookkeeping for everything the state blocks let through.
        if matches_any(&["punctuation.section.block.begin"], &scopes) {
            self.stack.push(SemanticScope::Block);
        } else if matches_any(&["punctuation.section.block.end"], &scopes) {
            self.pop_scope(&content);
            if matches_any(
                &["punctuation.section.block.end.bracket.curly.namespace"],
                &scopes,
            ) {
                self.pop_scope(&content);
            }
        } else if matches_any(&[ANGLE_BEGIN], &scopes) {
            self.stack.push(SemanticScope::Template);
        } else if matches_any(&[ANGLE_END], &scopes) {
            self.flush_pending_params();
            self.pop_scope(&content);
        }
        Flow::Next
    }

    /// The tail of a declaration statement: split a bitfield width or array
    /// extent off first, then mark what remains as the declared name.
    fn emit_declared_name(
        &mut self,
        run: &mut TokenRun,
        index: usize,
        content: &str,
        scopes: &[String],
    ) {
        if matches_leaf(&["meta.body.struct", "meta.body.class", "meta.block"], scopes) {
            let delimiter = match content.find(':') {
                Some(position) => Some(position),
                None => content.find('['),
            };
            match delimiter {
                Some(0) => return,
                Some(position) => {
                    split_at(&mut run.subs, index, position);
                }
                None => {}
            }
        }
        self.emit_with_scope(run, index, VARIABLE_NAME);
    }

    /// Split the known type word off the front of `subs[index]`, leaving the
    /// remainder for the next dispatch round. When the symbol table has no
    /// match the first word is returned as a best-effort new-type candidate
    /// and the mismatch is recorded.
    fn split_known_type(&mut self, run: &mut TokenRun, index: usize) -> Option<String> {
        let content = run.subs[index].content().to_string();
        match self.symbols.known_type(&content) {
            Some(word) => {
                let word = word.to_string();
                if let Some(position) = content.find(&word) {
                    split_at(&mut run.subs, index, position + word.len());
                }
                None
            }
            None => {
                self.anomalies
                    .push(Anomaly::unresolved_type_split(self.line, &content));
                Some(
                    SymbolTable::first_word(&content)
                        .unwrap_or_default()
                        .to_string(),
                )
            }
        }
    }

    fn emit_with_scope(&mut self, run: &mut TokenRun, index: usize, scope_name: &str) {
        let built = build_token(run.token, &run.subs, index, Some((scope_name, self.theme)));
        emit(
            &mut run.rebuilt,
            &mut run.flushed,
            run.token,
            built,
            index,
            &run.subs,
        );
    }

    fn pop_scope(&mut self, content: &str) {
        if self.stack.pop().is_none() {
            self.anomalies
                .push(Anomaly::scope_stack_underflow(self.line, content));
        }
    }

    /// A `template` state wraps the declaration that follows it; whoever
    /// closes that declaration pops the template and its parameter list.
    fn maybe_pop_template(&mut self) {
        if self.stack.top() == SemanticScope::Template {
            self.stack.pop();
            self.symbols.pop_template_params();
        }
    }

    fn flush_pending_params(&mut self) {
        if !self.pending_params.is_empty() {
            let params = std::mem::take(&mut self.pending_params);
            self.symbols.push_template_params(params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::AnomalyKind;
    use crate::token::{Explanation, ScopeMatch};

    fn tok(content: &str, scopes: &[&str]) -> ThemedToken {
        ThemedToken {
            content: content.to_string(),
            offset: 0,
            color: None,
            font_style: 0,
            explanation: Some(vec![Explanation {
                content: content.to_string(),
                scopes: scopes
                    .iter()
                    .map(|name| ScopeMatch {
                        scope_name: name.to_string(),
                        theme_matches: Vec::new(),
                    })
                    .collect(),
            }]),
        }
    }

    #[test]
    fn comment_only_tokens_are_dropped() {
        let lines = vec![vec![
            tok("int", &["source.cilkc", "storage.type.built-in.primitive.cilkc"]),
            tok(" x", &["source.cilkc"]),
            tok(";", &["source.cilkc", "punctuation.terminator.statement.cilkc"]),
            tok(" // count", &["source.cilkc", "comment.line.double-slash.cilkc"]),
        ]];
        let annotated = annotate(&lines, &Theme::empty());
        let contents: Vec<&str> = annotated.lines[0]
            .iter()
            .map(|token| token.content.as_str())
            .collect();
        assert_eq!(contents, vec!["int", " x", ";"]);
    }

    #[test]
    fn unbalanced_input_reports_an_anomaly_and_still_returns_output() {
        let lines = vec![vec![
            tok("int", &["source.cilkc", "storage.type.built-in.primitive.cilkc"]),
            tok(" x", &["source.cilkc"]),
        ]];
        let annotated = annotate(&lines, &Theme::empty());
        assert_eq!(annotated.lines.len(), 1);
        assert_eq!(annotated.lines[0].len(), 2);
        assert!(
            annotated
                .anomalies
                .iter()
                .any(|anomaly| anomaly.kind == AnomalyKind::UnbalancedScopeStack),
            "anomalies: {:?}",
            annotated.anomalies
        );
    }

    #[test]
    fn namespace_close_without_open_brace_reports_underflow() {
        let lines = vec![vec![
            tok("namespace", &["source.cilkcpp", "storage.type.namespace.definition.cilkcpp"]),
            tok(" util", &["source.cilkcpp", "entity.name.namespace.cilkcpp"]),
            tok(
                "}",
                &["source.cilkcpp", "punctuation.section.block.end.bracket.curly.namespace.cilkcpp"],
            ),
        ]];
        let annotated = annotate(&lines, &Theme::empty());
        assert!(
            annotated
                .anomalies
                .iter()
                .any(|anomaly| anomaly.kind == AnomalyKind::ScopeStackUnderflow),
            "anomalies: {:?}",
            annotated.anomalies
        );
    }
}
