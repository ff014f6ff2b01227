//! The four whitelisted rewrite passes.
//!
//! Each pass is a pure function `(text) -> (text, operations)`; [`Rewriter`]
//! composes them in a fixed order:
//!
//! 1. glossary normalization
//! 2. language-error correction
//! 3. immediate-repetition removal
//! 4. light punctuation
//!
//! Map keys are matched case-insensitively between Unicode word boundaries
//! (`\b` of the `regex` crate, where accented letters are word characters).
//! The matched span is replaced by the literal canonical form.
//!
//! Within a pass, a span matched by a longer key is claimed: shorter keys never
//! match inside it, even when the longer key's replacement left it unchanged.

use super::mapping::{AliasMap, ErrorMap};
use super::operation::{OpKind, Operation};
use regex::{Regex, RegexBuilder};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::warn;

/// Characters accepted as terminal punctuation.
pub const END_PUNCT: [char; 5] = ['.', '!', '?', '…', ':'];

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("literal pattern"));

fn is_word_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    WORD.is_match(c.encode_utf8(&mut buf))
}

/// A compiled `key -> replacement` rule.
#[derive(Debug, Clone)]
pub struct ReplacementRule {
    key: String,
    replacement: String,
    pattern: Regex,
}

impl ReplacementRule {
    /// Compile a rule for a normalized key.
    ///
    /// Words of the key may be separated by any whitespace run in the text.
    /// A word boundary is required on each edge of the key that is a word
    /// character.
    pub fn compile(key: &str, replacement: &str) -> Result<Self, regex::Error> {
        let body = key
            .split(' ')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(r"\s+");

        let starts_with_word = key.chars().next().is_some_and(is_word_char);
        let ends_with_word = key.chars().last().is_some_and(is_word_char);
        let pattern = format!(
            "{}{}{}",
            if starts_with_word { r"\b" } else { "" },
            body,
            if ends_with_word { r"\b" } else { "" },
        );

        let pattern = RegexBuilder::new(&pattern).case_insensitive(true).build()?;

        Ok(Self {
            key: key.to_string(),
            replacement: replacement.to_string(),
            pattern,
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Non-overlapping matches, left to right, that avoid every claimed span.
    fn unclaimed_matches(&self, text: &str, claimed: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut found = Vec::new();
        let mut pos = 0;

        while pos <= text.len() {
            let Some(m) = self.pattern.find_at(text, pos) else {
                break;
            };
            let overlaps = claimed.iter().any(|c| m.start() < c.end && c.start < m.end());
            pos = if overlaps || m.is_empty() {
                next_char(text, m.start())
            } else {
                m.end()
            };
            if !overlaps && !m.is_empty() {
                found.push(m.range());
            }
        }
        found
    }
}

fn next_char(text: &str, at: usize) -> usize {
    text[at..].chars().next().map_or(text.len() + 1, |c| at + c.len_utf8())
}

/// Replace `matches` (sorted, non-overlapping) with `replacement`.
///
/// Returns the new text and the claimed spans rebased onto it, including the
/// spans just written.
fn splice(
    text: &str,
    matches: &[Range<usize>],
    replacement: &str,
    claimed: &[Range<usize>],
) -> (String, Vec<Range<usize>>) {
    let mut result = String::with_capacity(text.len());
    let mut written = Vec::with_capacity(matches.len());
    let mut copied_to = 0;

    for m in matches {
        result.push_str(&text[copied_to..m.start]);
        let start = result.len();
        result.push_str(replacement);
        written.push(start..result.len());
        copied_to = m.end;
    }
    result.push_str(&text[copied_to..]);

    // Claimed spans never overlap a match, so each one shifts by the size
    // change of the matches before it.
    let rebase = |pos: usize| -> usize {
        matches
            .iter()
            .take_while(|m| m.end <= pos)
            .fold(pos, |p, m| p + replacement.len() - m.len())
    };
    let mut spans: Vec<Range<usize>> = claimed
        .iter()
        .map(|c| rebase(c.start)..rebase(c.end))
        .collect();
    spans.extend(written);

    (result, spans)
}

/// Compile rules longest key first (ties in key order).
///
/// A key whose pattern fails to compile is skipped on its own.
pub fn compile_rules(map: &BTreeMap<String, String>) -> Vec<ReplacementRule> {
    let mut keys: Vec<(&String, &String)> = map.iter().filter(|(k, _)| !k.is_empty()).collect();
    keys.sort_by_key(|(k, _)| Reverse(k.chars().count()));

    keys.into_iter()
        .filter_map(|(key, replacement)| match ReplacementRule::compile(key, replacement) {
            Ok(rule) => Some(rule),
            Err(e) => {
                let preview: String = key.chars().take(80).collect();
                warn!("Skipping mapping '{}': {}", preview, e);
                None
            }
        })
        .collect()
}

fn replace_with_rules(text: &str, rules: &[ReplacementRule], kind: OpKind) -> (String, Vec<Operation>) {
    let mut result = text.to_string();
    let mut claimed: Vec<Range<usize>> = Vec::new();
    let mut operations = Vec::new();

    for rule in rules {
        let matches = rule.unclaimed_matches(&result, &claimed);
        if matches.is_empty() {
            continue;
        }

        let (after, spans) = splice(&result, &matches, &rule.replacement, &claimed);
        claimed = spans;
        if after != result {
            operations.push(Operation::new(
                kind,
                format!("'{}' → '{}'", rule.key, rule.replacement),
                &result,
                &after,
            ));
            result = after;
        }
    }

    (result, operations)
}

/// Pass 1: replace glossary aliases with their canonical term.
pub fn normalize_glossary(text: &str, rules: &[ReplacementRule]) -> (String, Vec<Operation>) {
    replace_with_rules(text, rules, OpKind::GlossaryNormalization)
}

/// Pass 2: replace flagged incorrect phrases with their corrected form.
pub fn correct_language_errors(text: &str, rules: &[ReplacementRule]) -> (String, Vec<Operation>) {
    replace_with_rules(text, rules, OpKind::LanguageErrorFix)
}

/// Pass 3: collapse a word immediately repeated after whitespace (ignoring
/// case) into its first occurrence.
pub fn deduplicate(text: &str) -> (String, Vec<Operation>) {
    let tokens: Vec<_> = WORD.find_iter(text).collect();
    let mut result = String::with_capacity(text.len());
    let mut copied_to = 0;
    let mut i = 0;

    while i < tokens.len() {
        let first = tokens[i];
        let mut run_end = first.end();
        let mut j = i + 1;

        while j < tokens.len() {
            let gap = &text[run_end..tokens[j].start()];
            let repeated = !gap.is_empty()
                && gap.chars().all(char::is_whitespace)
                && first.as_str().to_lowercase() == tokens[j].as_str().to_lowercase();
            if !repeated {
                break;
            }
            run_end = tokens[j].end();
            j += 1;
        }

        if j > i + 1 {
            result.push_str(&text[copied_to..first.end()]);
            copied_to = run_end;
        }
        i = j;
    }
    result.push_str(&text[copied_to..]);

    if result == text {
        return (result, Vec::new());
    }
    let op = Operation::new(OpKind::Deduplication, "Removed immediate repetition", text, &result);
    (result, vec![op])
}

/// Pass 4: trim, capitalize an alphabetic first character, and end with
/// terminal punctuation.
pub fn punctuate(text: &str) -> (String, Vec<Operation>) {
    let trimmed = text.trim();
    let mut result = String::with_capacity(trimmed.len() + 1);

    let mut chars = trimmed.chars();
    if let Some(first) = chars.next() {
        if first.is_alphabetic() {
            result.extend(first.to_uppercase());
        } else {
            result.push(first);
        }
        result.push_str(chars.as_str());
    }

    if let Some(last) = result.chars().last() {
        if !END_PUNCT.contains(&last) {
            result.push('.');
        }
    }

    if result == text {
        return (result, Vec::new());
    }
    let op = Operation::new(
        OpKind::Punctuation,
        "Capitalization + ending punctuation",
        text,
        &result,
    );
    (result, vec![op])
}

/// Rewritten text and the ordered operations that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    pub text: String,
    pub operations: Vec<Operation>,
}

/// Compiled glossary and error rules, shared read-only across segments.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    glossary: Vec<ReplacementRule>,
    errors: Vec<ReplacementRule>,
}

impl Rewriter {
    pub fn new(alias_map: &AliasMap, error_map: &ErrorMap) -> Self {
        Self {
            glossary: compile_rules(alias_map),
            errors: compile_rules(error_map),
        }
    }

    pub fn glossary_rules(&self) -> &[ReplacementRule] {
        &self.glossary
    }

    pub fn error_rules(&self) -> &[ReplacementRule] {
        &self.errors
    }

    /// Run the four passes in order, each over the previous output.
    pub fn apply(&self, text: &str) -> Rewrite {
        let mut operations = Vec::new();

        let (text, ops) = normalize_glossary(text, &self.glossary);
        operations.extend(ops);
        let (text, ops) = correct_language_errors(&text, &self.errors);
        operations.extend(ops);
        let (text, ops) = deduplicate(&text);
        operations.extend(ops);
        let (text, ops) = punctuate(&text);
        operations.extend(ops);

        Rewrite { text, operations }
    }
}

/// Apply all safe transformations to one segment's text.
pub fn apply_fixes(text: &str, alias_map: &AliasMap, error_map: &ErrorMap) -> (String, Vec<Operation>) {
    let rewrite = Rewriter::new(alias_map, error_map).apply(text);
    (rewrite.text, rewrite.operations)
}
