//! Locate endpoints named in free text and render their docs

use crate::error::{SpecError, SpecResult};
use crate::types::{EndpointRecord, ExtractOptions, MatchMode};
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// `METHOD /path` occurrences inside arbitrary text
fn query_regex() -> &'static Regex {
    static QUERY: OnceLock<Regex> = OnceLock::new();
    QUERY.get_or_init(|| {
        Regex::new(r"\b(GET|POST|PATCH|DELETE|PUT)\s+(/\S*)").expect("query pattern is valid")
    })
}

/// `{param}` segments inside a path template
fn template_param_regex() -> &'static Regex {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    PARAM.get_or_init(|| Regex::new(r"\{[^}]*\}").expect("template pattern is valid"))
}

/// Characters that close the sentence or quote around a path in prose
const TRAILING_PUNCTUATION: &[char] = &[',', '.', ';', ':', ')', '`', '\'', '"'];

/// Finds endpoint docs for `METHOD /path` queries
pub struct SpecExtractor;

impl SpecExtractor {
    /// Pull normalized `"METHOD /path"` queries out of `text`, in order.
    /// Anything from the first `?` of a path onward is dropped, as is trailing
    /// punctuation such as the `.` in "call GET /pcm/products.".
    pub fn queries(text: &str) -> Vec<String> {
        query_regex()
            .captures_iter(text)
            .map(|caps| {
                let path = &caps[2];
                let path = path.split('?').next().unwrap_or(path);
                let path = path.trim_end_matches(TRAILING_PUNCTUATION);
                format!("{} {}", &caps[1], path)
            })
            .collect()
    }

    /// Compile a record name into a matcher. Each `{param}` accepts exactly one
    /// non-empty path segment; everything else is literal.
    pub fn compile_pattern(name: &str, mode: MatchMode) -> Regex {
        let mut pattern = String::from("^");
        let mut last = 0;
        for param in template_param_regex().find_iter(name) {
            pattern.push_str(&regex::escape(&name[last..param.start()]));
            pattern.push_str("[^/]+");
            last = param.end();
        }
        pattern.push_str(&regex::escape(&name[last..]));
        if mode == MatchMode::Exact {
            pattern.push('$');
        }

        Regex::new(&pattern).expect("escaped template is a valid pattern")
    }

    /// Records whose name matches `query`
    pub fn matching<'a>(
        query: &str,
        records: &'a [EndpointRecord],
        mode: MatchMode,
    ) -> Vec<&'a EndpointRecord> {
        records
            .iter()
            .filter(|record| Self::compile_pattern(&record.name, mode).is_match(query))
            .collect()
    }

    /// Render docs for every query found in `text`.
    ///
    /// Each query contributes a `== Docs for <query> ==` header followed by the YAML
    /// docs of every matching record. A query without a match fails the whole call.
    pub fn extract(
        text: &str,
        records: &[EndpointRecord],
        options: &ExtractOptions,
    ) -> SpecResult<String> {
        let queries = Self::queries(text);
        debug!("Extracting docs for {} queries", queries.len());

        let patterns: Vec<(Regex, &EndpointRecord)> = records
            .iter()
            .map(|record| (Self::compile_pattern(&record.name, options.mode), record))
            .collect();

        let mut docs = String::new();
        for query in &queries {
            let found: Vec<&EndpointRecord> = patterns
                .iter()
                .filter(|(pattern, _)| pattern.is_match(query))
                .map(|(_, record)| *record)
                .collect();

            if found.is_empty() {
                return Err(SpecError::EndpointNotFound(query.clone()));
            }

            if options.reject_ambiguous && found.len() > 1 {
                return Err(SpecError::AmbiguousMatch {
                    query: query.clone(),
                    candidates: found.iter().map(|r| r.name.clone()).collect(),
                });
            }

            for record in found {
                docs.push_str(&format!("== Docs for {} ==\n{}\n", query, Self::render(record)?));
            }
        }

        Ok(docs)
    }

    /// YAML text of a record's docs
    fn render(record: &EndpointRecord) -> SpecResult<String> {
        serde_yaml::to_string(&record.docs)
            .map_err(|e| SpecError::RenderError(format!("{}: {}", record.name, e)))
    }
}
