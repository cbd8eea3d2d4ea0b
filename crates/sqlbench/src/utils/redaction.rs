use std::sync::OnceLock;

use regex::{Captures, Regex};

pub const REDACTION_TOKEN: &str = "[REDACTED]";

struct RegexRedactionMatcher {
    regex: fn() -> &'static Regex,
    replacement: for<'a> fn(&Captures<'a>) -> String,
}

/// Strips provider credentials from free-form error text before it is
/// printed or persisted.
#[must_use]
pub fn redact_credentials_text(value: &str) -> String {
    redaction_matcher_catalog()
        .iter()
        .fold(value.to_string(), |text, matcher| {
            (matcher.regex)()
                .replace_all(&text, matcher.replacement)
                .into_owned()
        })
}

fn redaction_matcher_catalog() -> &'static [RegexRedactionMatcher] {
    static CATALOG: OnceLock<Vec<RegexRedactionMatcher>> = OnceLock::new();
    CATALOG.get_or_init(|| {
        vec![
            RegexRedactionMatcher {
                regex: bearer_token_regex,
                replacement: replace_bearer_token,
            },
            RegexRedactionMatcher {
                regex: api_token_regex,
                replacement: replace_with_redaction,
            },
            RegexRedactionMatcher {
                regex: secret_assignment_regex,
                replacement: replace_secret_assignment,
            },
            RegexRedactionMatcher {
                regex: url_query_token_regex,
                replacement: replace_url_query_token,
            },
        ]
    })
}

fn bearer_token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)\bbearer\s+[A-Za-z0-9._=\-]{8,}")
            .expect("bearer token regex should compile")
    })
}

fn api_token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"\b(?:sk-[A-Za-z0-9_\-]{8,}|AIza[A-Za-z0-9_\-]{20,})")
            .expect("api token regex should compile")
    })
}

fn secret_assignment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"(?i)\b(api[_\-]?key|secret|token)\b(\s*[:=]\s*)([^\s,;"']+)"#)
            .expect("secret assignment regex should compile")
    })
}

fn url_query_token_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"(?i)([?&](?:access_token|token|key|api_key)=)([^&\s]+)")
            .expect("url query token regex should compile")
    })
}

fn replace_with_redaction(_captures: &Captures<'_>) -> String {
    REDACTION_TOKEN.to_string()
}

fn replace_bearer_token(_captures: &Captures<'_>) -> String {
    format!("Bearer {REDACTION_TOKEN}")
}

fn replace_secret_assignment(captures: &Captures<'_>) -> String {
    format!("{}{}{}", &captures[1], &captures[2], REDACTION_TOKEN)
}

fn replace_url_query_token(captures: &Captures<'_>) -> String {
    format!("{}{}", &captures[1], REDACTION_TOKEN)
}
