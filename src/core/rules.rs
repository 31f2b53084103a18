//! Header text to tagset resolution
//!
//! A [`RuleTable`] maps header texts to rule nodes. A node is either a
//! literal tag string, a list of alternative tag strings, or a decision
//! node that picks a branch depending on the table's language, part of
//! speech, nesting depth, invoking template, or tags already accumulated
//! for the cell. Tables are validated eagerly when built or loaded, so
//! resolution itself cannot fail on malformed rules; a header with no
//! applicable rule resolves to the unrecognized-form marker.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::core::tagset::{or_tagsets, remove_useless_tags, sorted_combo, Tagset};
use crate::data::policies::LangPolicy;
use crate::data::tags::{markers, TagVocab, IGNORED_COLVALUES, PARTS_OF_SPEECH};
use crate::utils::diagnostics::{Diagnostic, DiagnosticLevel, DiagnosticSink};
use crate::utils::error::{ConfigError, ConfigResult};
use crate::utils::text::split_outside_parens;

lazy_static! {
    static ref TRAILING_PAREN_RE: Regex =
        Regex::new(r"[,/]?\s+\([^)]*\)\s*$").unwrap();
}

/// The tags listed in an `if` condition, tested against the cell's
/// accumulated base tags.
#[derive(Debug, Clone)]
pub struct IfTags {
    /// Any listed tag suffices, instead of requiring all of them
    pub any: bool,
    pub tags: Vec<String>,
}

impl IfTags {
    /// Parse from rule syntax: a space-separated tag list, optionally
    /// prefixed with `any:`.
    pub fn parse(spec: &str) -> Self {
        if let Some(rest) = spec.strip_prefix("any: ") {
            Self {
                any: true,
                tags: rest.split_whitespace().map(str::to_string).collect(),
            }
        } else {
            Self {
                any: false,
                tags: spec.split_whitespace().map(str::to_string).collect(),
            }
        }
    }

    fn matches(&self, base_tags: &[String]) -> bool {
        if self.any {
            self.tags.iter().any(|t| base_tags.iter().any(|b| b == t))
        } else {
            self.tags.iter().all(|t| base_tags.iter().any(|b| b == t))
        }
    }
}

/// A conditional rule node. Condition fields that are present are tested
/// in declaration order; the node takes `then` if all pass, otherwise
/// `else`, otherwise the recorded `default`.
#[derive(Debug, Clone, Default)]
pub struct Decision {
    pub lang: Option<Vec<String>>,
    pub depth: Option<Vec<usize>>,
    pub template: Option<Vec<String>>,
    pub pos: Option<Vec<String>>,
    pub if_tags: Option<IfTags>,
    /// Fallback tag string remembered for deeper nodes in the chain
    pub default: Option<String>,
    pub then: Option<RuleNode>,
    pub else_: Option<RuleNode>,
}

impl Decision {
    fn has_condition(&self) -> bool {
        self.lang.is_some()
            || self.depth.is_some()
            || self.template.is_some()
            || self.pos.is_some()
            || self.if_tags.is_some()
    }
}

/// One rule-table value.
#[derive(Debug, Clone)]
pub enum RuleNode {
    /// Space-separated tags
    Literal(String),
    /// Alternative tag strings, each space-separated
    Alternatives(Vec<String>),
    Decision(Box<Decision>),
}

impl RuleNode {
    pub fn literal(tags: &str) -> Self {
        RuleNode::Literal(tags.to_string())
    }

    pub fn alternatives(alts: &[&str]) -> Self {
        RuleNode::Alternatives(alts.iter().map(|s| s.to_string()).collect())
    }
}

/// Context a header is resolved in.
#[derive(Debug, Clone, Copy)]
pub struct ResolveCtx<'a> {
    pub lang: &'a str,
    pub pos: &'a str,
    /// Name of the template that produced the table, when known
    pub template: Option<&'a str>,
    /// Nesting depth of the table, 0 for top level
    pub depth: usize,
}

/// Resolution behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOpts {
    /// Suppress diagnostics (used for speculative probes)
    pub silent: bool,
    /// Treat `if` conditions as satisfied; used when probing whether a
    /// data cell could be a header
    pub ignore_tags: bool,
}

/// Header-text to rule-node mapping with exact and prefix entries.
/// Entries keep declaration order, so validation reports problems in the
/// order rules were added.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    exact: IndexMap<String, RuleNode>,
    prefix: IndexMap<String, RuleNode>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an exact-match rule.
    pub fn insert(&mut self, key: &str, node: RuleNode) {
        self.exact.insert(key.to_string(), node);
    }

    /// Add a prefix rule. It matches any header that starts with the key
    /// followed by whitespace.
    pub fn insert_prefix(&mut self, key: &str, node: RuleNode) {
        self.prefix.insert(key.to_string(), node);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.exact.contains_key(key)
    }

    /// True when a prefix rule would match the start of `text`.
    pub fn matches_prefix(&self, text: &str) -> bool {
        self.prefix_lookup(text).is_some()
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.prefix.is_empty()
    }

    /// Longest prefix key that matches the start of `text` with a
    /// whitespace boundary after it.
    fn prefix_lookup(&self, text: &str) -> Option<&RuleNode> {
        let mut best: Option<(&str, &RuleNode)> = None;
        for (key, node) in &self.prefix {
            if text.len() > key.len()
                && text.starts_with(key.as_str())
                && text[key.len()..].starts_with(char::is_whitespace)
                && best.map_or(true, |(b, _)| key.len() > b.len())
            {
                best = Some((key, node));
            }
        }
        best.map(|(_, node)| node)
    }

    /// Validate every rule against the tag vocabulary and part-of-speech
    /// set. All problems are collected.
    pub fn validate(&self, vocab: &TagVocab) -> ConfigResult<()> {
        let mut errors = Vec::new();
        for (key, node) in self.exact.iter().chain(self.prefix.iter()) {
            if key.trim().is_empty() {
                errors.push(ConfigError::EmptyRuleKey);
            }
            validate_node(key, node, vocab, &mut errors);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Resolve a header text to a tagset. `base_tags` are the already
    /// accumulated row and column tags for the cell, which `if`
    /// conditions may consult.
    pub fn resolve(
        &self,
        policy: &LangPolicy,
        vocab: &TagVocab,
        ctx: ResolveCtx<'_>,
        text: &str,
        base_tags: &[String],
        opts: ResolveOpts,
        sink: &mut DiagnosticSink,
    ) -> Tagset {
        let mut combined: Tagset = Vec::new();
        for part in split_outside_parens(text, &[";"]) {
            let part = part.as_str();
            if part.is_empty() {
                continue;
            }
            let node = if let Some(node) = self.exact.get(part) {
                Some(node)
            } else if let Some(node) = self.prefix_lookup(part) {
                // A prefix rule consumes the remainder of the header
                Some(node)
            } else if part.starts_with("Notes") {
                combined = or_tagsets(
                    policy,
                    vocab,
                    &combined,
                    &vec![vec![markers::SKIP_THIS.to_string()]],
                );
                continue;
            } else if IGNORED_COLVALUES.contains(part) {
                combined = or_tagsets(
                    policy,
                    vocab,
                    &combined,
                    &vec![vec![markers::IGNORE_SKIPPED.to_string()]],
                );
                continue;
            } else {
                // Retry without a trailing parenthesized qualifier
                let stripped = TRAILING_PAREN_RE.replace(part, "");
                self.exact.get(stripped.as_ref())
            };
            let tagset = match node {
                Some(node) => {
                    evaluate_node(policy, vocab, ctx, part, node, base_tags, opts, sink)
                }
                None => {
                    if !opts.silent {
                        sink.add(
                            Diagnostic::new(
                                DiagnosticLevel::Warning,
                                "unrecognized inflection table header",
                            )
                            .with_text(part),
                        );
                    }
                    vec![vec![markers::ERROR_UNRECOGNIZED.to_string()]]
                }
            };
            combined = or_tagsets(policy, vocab, &combined, &tagset);
        }
        if combined.is_empty() {
            combined.push(Vec::new());
        }
        combined
    }
}

#[allow(clippy::too_many_arguments)]
fn evaluate_node(
    policy: &LangPolicy,
    vocab: &TagVocab,
    ctx: ResolveCtx<'_>,
    text: &str,
    node: &RuleNode,
    base_tags: &[String],
    opts: ResolveOpts,
    sink: &mut DiagnosticSink,
) -> Tagset {
    let mut default_then: Option<String> = None;
    let mut current = node.clone();
    loop {
        match current {
            RuleNode::Literal(tags) => {
                let mut set: std::collections::BTreeSet<String> =
                    tags.split_whitespace().map(str::to_string).collect();
                remove_useless_tags(policy, &mut set);
                return vec![set.into_iter().collect()];
            }
            RuleNode::Alternatives(alts) => {
                let mut tagset: Tagset = Vec::new();
                for alt in alts {
                    let mut set: std::collections::BTreeSet<String> =
                        alt.split_whitespace().map(str::to_string).collect();
                    remove_useless_tags(policy, &mut set);
                    let combo = sorted_combo(set);
                    if !tagset.contains(&combo) {
                        tagset.push(combo);
                    }
                }
                return tagset;
            }
            RuleNode::Decision(decision) => {
                let mut cond = true;
                if let Some(ref langs) = decision.lang {
                    cond = langs.iter().any(|l| l == ctx.lang);
                }
                if cond {
                    if let Some(ref depths) = decision.depth {
                        cond = depths.contains(&ctx.depth);
                    }
                }
                if cond {
                    if let Some(ref templates) = decision.template {
                        cond = match ctx.template {
                            Some(name) => templates.iter().any(|t| t == name),
                            None => false,
                        };
                    }
                }
                if cond {
                    if let Some(ref poses) = decision.pos {
                        cond = poses.iter().any(|p| p == ctx.pos);
                    }
                }
                if cond && !opts.ignore_tags {
                    if let Some(ref if_tags) = decision.if_tags {
                        cond = if_tags.matches(base_tags);
                    }
                }
                if let Some(ref default) = decision.default {
                    default_then = Some(default.clone());
                }
                if !decision.has_condition() && default_then.is_none() && !opts.silent {
                    sink.add(
                        Diagnostic::new(
                            DiagnosticLevel::Warning,
                            "decision rule with no condition",
                        )
                        .with_text(text),
                    );
                }
                if cond {
                    current = decision
                        .then
                        .unwrap_or_else(|| RuleNode::Literal(String::new()));
                } else if let Some(else_) = decision.else_ {
                    current = else_;
                } else if let Some(default) = default_then.take() {
                    current = RuleNode::Literal(default);
                } else {
                    if !opts.silent {
                        sink.add(
                            Diagnostic::new(
                                DiagnosticLevel::Warning,
                                "no applicable branch for conditional header rule",
                            )
                            .with_text(text),
                        );
                    }
                    current = RuleNode::Literal(markers::ERROR_UNRECOGNIZED.to_string());
                }
            }
        }
    }
}

fn validate_node(
    key: &str,
    node: &RuleNode,
    vocab: &TagVocab,
    errors: &mut Vec<ConfigError>,
) {
    match node {
        RuleNode::Literal(tags) => {
            validate_tag_string(key, tags, vocab, errors);
        }
        RuleNode::Alternatives(alts) => {
            for alt in alts {
                validate_tag_string(key, alt, vocab, errors);
            }
        }
        RuleNode::Decision(decision) => {
            if let Some(ref poses) = decision.pos {
                for pos in poses {
                    if !PARTS_OF_SPEECH.contains(pos.as_str()) {
                        errors.push(ConfigError::UnknownPartOfSpeech {
                            rule: key.to_string(),
                            pos: pos.clone(),
                        });
                    }
                }
            }
            if let Some(ref if_tags) = decision.if_tags {
                for tag in &if_tags.tags {
                    if !vocab.contains(tag) {
                        errors.push(ConfigError::unknown_tag(key, tag.clone()));
                    }
                }
            }
            if let Some(ref default) = decision.default {
                validate_tag_string(key, default, vocab, errors);
            }
            if decision.then.is_none()
                && decision.else_.is_none()
                && decision.default.is_none()
            {
                errors.push(ConfigError::DeadDecisionBranch {
                    rule: key.to_string(),
                });
            }
            if let Some(ref then) = decision.then {
                validate_node(key, then, vocab, errors);
            }
            if let Some(ref else_) = decision.else_ {
                validate_node(key, else_, vocab, errors);
            }
        }
    }
}

fn validate_tag_string(
    key: &str,
    tags: &str,
    vocab: &TagVocab,
    errors: &mut Vec<ConfigError>,
) {
    for tag in tags.split_whitespace() {
        if !vocab.contains(tag) {
            errors.push(ConfigError::unknown_tag(key, tag));
        }
    }
}

#[cfg(feature = "data-loading")]
mod loading {
    use super::*;
    use serde_json::Value;

    impl RuleTable {
        /// Load additional rules from a JSON object. String values are
        /// literals, arrays are alternatives, and objects are decision
        /// nodes with `lang`, `pos`, `nested-table-depth`,
        /// `inflection-template`, `if`, `default`, `then` and `else`
        /// keys. Keys ending in ` *` become prefix rules.
        pub fn load_json(&mut self, data: &str) -> ConfigResult<()> {
            let value: Value = serde_json::from_str(data)
                .map_err(|e| vec![ConfigError::invalid(e.to_string())])?;
            let obj = value
                .as_object()
                .ok_or_else(|| vec![ConfigError::invalid("expected a JSON object")])?;
            let mut errors = Vec::new();
            for (key, v) in obj {
                match parse_node(key, v) {
                    Ok(node) => {
                        if let Some(prefix) = key.strip_suffix(" *") {
                            self.insert_prefix(prefix, node);
                        } else {
                            self.insert(key, node);
                        }
                    }
                    Err(e) => errors.push(e),
                }
            }
            if errors.is_empty() {
                Ok(())
            } else {
                Err(errors)
            }
        }
    }

    fn parse_node(key: &str, v: &Value) -> Result<RuleNode, ConfigError> {
        match v {
            Value::String(s) => Ok(RuleNode::Literal(s.clone())),
            Value::Array(items) => {
                let mut alts = Vec::new();
                for item in items {
                    match item.as_str() {
                        Some(s) => alts.push(s.to_string()),
                        None => {
                            return Err(ConfigError::invalid(format!(
                                "rule {:?}: alternatives must be strings",
                                key
                            )))
                        }
                    }
                }
                Ok(RuleNode::Alternatives(alts))
            }
            Value::Object(map) => {
                let mut d = Decision::default();
                for (k, val) in map {
                    match k.as_str() {
                        "lang" => d.lang = Some(string_list(key, val)?),
                        "pos" => d.pos = Some(string_list(key, val)?),
                        "inflection-template" => d.template = Some(string_list(key, val)?),
                        "nested-table-depth" => d.depth = Some(int_list(key, val)?),
                        "if" => {
                            let s = val.as_str().ok_or_else(|| {
                                ConfigError::invalid(format!(
                                    "rule {:?}: \"if\" must be a string",
                                    key
                                ))
                            })?;
                            d.if_tags = Some(IfTags::parse(s));
                        }
                        "default" => {
                            let s = val.as_str().ok_or_else(|| {
                                ConfigError::invalid(format!(
                                    "rule {:?}: \"default\" must be a string",
                                    key
                                ))
                            })?;
                            d.default = Some(s.to_string());
                        }
                        "then" => d.then = Some(parse_node(key, val)?),
                        "else" => d.else_ = Some(parse_node(key, val)?),
                        other => {
                            return Err(ConfigError::invalid(format!(
                                "rule {:?}: unknown key {:?}",
                                key, other
                            )))
                        }
                    }
                }
                Ok(RuleNode::Decision(Box::new(d)))
            }
            _ => Err(ConfigError::invalid(format!(
                "rule {:?}: unsupported value type",
                key
            ))),
        }
    }

    fn string_list(key: &str, v: &Value) -> Result<Vec<String>, ConfigError> {
        match v {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ConfigError::invalid(format!(
                            "rule {:?}: expected string list",
                            key
                        ))
                    })
                })
                .collect(),
            _ => Err(ConfigError::invalid(format!(
                "rule {:?}: expected string or string list",
                key
            ))),
        }
    }

    fn int_list(key: &str, v: &Value) -> Result<Vec<usize>, ConfigError> {
        match v {
            Value::Number(n) => n
                .as_u64()
                .map(|n| vec![n as usize])
                .ok_or_else(|| {
                    ConfigError::invalid(format!("rule {:?}: expected integer", key))
                }),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64().map(|n| n as usize).ok_or_else(|| {
                        ConfigError::invalid(format!(
                            "rule {:?}: expected integer list",
                            key
                        ))
                    })
                })
                .collect(),
            _ => Err(ConfigError::invalid(format!(
                "rule {:?}: expected integer or integer list",
                key
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>() -> ResolveCtx<'a> {
        ResolveCtx {
            lang: "English",
            pos: "verb",
            template: None,
            depth: 0,
        }
    }

    fn fixture() -> (RuleTable, LangPolicy, TagVocab) {
        let mut table = RuleTable::new();
        table.insert("singular", RuleNode::literal("singular"));
        table.insert("plural", RuleNode::literal("plural"));
        table.insert("present", RuleNode::literal("present"));
        table.insert(
            "masc./fem.",
            RuleNode::alternatives(&["masculine", "feminine"]),
        );
        table.insert(
            "second-person singular",
            RuleNode::Decision(Box::new(Decision {
                lang: Some(vec!["Spanish".to_string()]),
                then: Some(RuleNode::literal("second-person singular informal")),
                else_: Some(RuleNode::literal("second-person singular")),
                ..Decision::default()
            })),
        );
        table.insert_prefix("with infinitive", RuleNode::literal("infinitive"));
        (table, LangPolicy::default(), TagVocab::builtin())
    }

    #[test]
    fn test_exact_resolution() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "singular",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert_eq!(ts, vec![vec!["singular".to_string()]]);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_alternatives() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "masc./fem.",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        // Both genders in the same category merge into one alternative
        assert_eq!(
            ts,
            vec![vec!["feminine".to_string(), "masculine".to_string()]]
        );
    }

    #[test]
    fn test_decision_by_lang() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        let es = ResolveCtx {
            lang: "Spanish",
            ..ctx()
        };
        let ts = table.resolve(
            &policy,
            &vocab,
            es,
            "second-person singular",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert!(ts[0].contains(&"informal".to_string()));
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "second-person singular",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert!(!ts[0].contains(&"informal".to_string()));
    }

    #[test]
    fn test_prefix_rule() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "with infinitive of the main verb",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert_eq!(ts, vec![vec!["infinitive".to_string()]]);
    }

    #[test]
    fn test_unrecognized_header() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "frobnicative",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert_eq!(ts, vec![vec![markers::ERROR_UNRECOGNIZED.to_string()]]);
        assert_eq!(sink.warnings(), 1);
    }

    #[test]
    fn test_silent_suppresses_diagnostics() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        table.resolve(
            &policy,
            &vocab,
            ctx(),
            "frobnicative",
            &[],
            ResolveOpts {
                silent: true,
                ..Default::default()
            },
            &mut sink,
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn test_placeholder_and_notes() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "—",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert_eq!(ts, vec![vec![markers::IGNORE_SKIPPED.to_string()]]);
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "Notes:",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert_eq!(ts, vec![vec![markers::SKIP_THIS.to_string()]]);
    }

    #[test]
    fn test_semicolon_parts_or_merge() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "singular; plural",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        // singular+plural covers the number inventory and cancels out
        assert_eq!(ts, vec![Vec::<String>::new()]);
    }

    #[test]
    fn test_trailing_paren_retry() {
        let (table, policy, vocab) = fixture();
        let mut sink = DiagnosticSink::new();
        let ts = table.resolve(
            &policy,
            &vocab,
            ctx(),
            "plural (colloquial)",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert_eq!(ts, vec![vec!["plural".to_string()]]);
    }

    #[test]
    fn test_if_condition_and_ignore_tags() {
        let mut table = RuleTable::new();
        table.insert(
            "stressed",
            RuleNode::Decision(Box::new(Decision {
                if_tags: Some(IfTags::parse("genitive")),
                then: Some(RuleNode::literal("stressed")),
                else_: Some(RuleNode::literal(markers::ERROR_UNRECOGNIZED)),
                ..Decision::default()
            })),
        );
        let policy = LangPolicy::default();
        let vocab = TagVocab::builtin();
        let mut sink = DiagnosticSink::new();
        let base = vec!["genitive".to_string()];
        let ts = table.resolve(
            &policy, &vocab, ctx(), "stressed", &base,
            ResolveOpts::default(), &mut sink,
        );
        assert_eq!(ts, vec![vec!["stressed".to_string()]]);
        let ts = table.resolve(
            &policy, &vocab, ctx(), "stressed", &[],
            ResolveOpts::default(), &mut sink,
        );
        assert_eq!(ts, vec![vec![markers::ERROR_UNRECOGNIZED.to_string()]]);
        // The header probe pretends if-conditions hold
        let ts = table.resolve(
            &policy, &vocab, ctx(), "stressed", &[],
            ResolveOpts { ignore_tags: true, ..Default::default() }, &mut sink,
        );
        assert_eq!(ts, vec![vec!["stressed".to_string()]]);
    }

    #[test]
    fn test_validation_catches_bad_rules() {
        let mut table = RuleTable::new();
        table.insert("good", RuleNode::literal("singular"));
        table.insert("bad tag", RuleNode::literal("not-a-real-tag"));
        table.insert(
            "bad pos",
            RuleNode::Decision(Box::new(Decision {
                pos: Some(vec!["gerund-phrase".to_string()]),
                then: Some(RuleNode::literal("singular")),
                ..Decision::default()
            })),
        );
        table.insert(
            "dead",
            RuleNode::Decision(Box::new(Decision {
                lang: Some(vec!["English".to_string()]),
                ..Decision::default()
            })),
        );
        let errors = table.validate(&TagVocab::builtin()).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_validation_errors_follow_declaration_order() {
        let mut table = RuleTable::new();
        table.insert("first bad", RuleNode::literal("frobnicative"));
        table.insert("second bad", RuleNode::literal("zorblative"));
        table.insert_prefix("third bad", RuleNode::literal("quuxative"));
        let errors = table.validate(&TagVocab::builtin()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ConfigError::unknown_tag("first bad", "frobnicative"),
                ConfigError::unknown_tag("second bad", "zorblative"),
                ConfigError::unknown_tag("third bad", "quuxative"),
            ]
        );
    }

    #[cfg(feature = "data-loading")]
    #[test]
    fn test_load_json() {
        let mut table = RuleTable::new();
        table
            .load_json(
                r#"{
                    "singular": "singular",
                    "sg./pl.": ["singular", "plural"],
                    "past *": "past",
                    "short form": {
                        "lang": ["Russian"],
                        "then": "short-form",
                        "else": "error-unrecognized-form"
                    }
                }"#,
            )
            .unwrap();
        assert!(table.validate(&TagVocab::builtin()).is_ok());
        let mut sink = DiagnosticSink::new();
        let ts = table.resolve(
            &LangPolicy::default(),
            &TagVocab::builtin(),
            ctx(),
            "past habitual",
            &[],
            ResolveOpts::default(),
            &mut sink,
        );
        assert_eq!(ts, vec![vec!["past".to_string()]]);
    }
}
