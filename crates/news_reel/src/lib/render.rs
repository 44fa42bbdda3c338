//! # Template renderer
//!
//! Deterministic `{{NAME}}` substitution over static HTML templates. Values
//! are treated as opaque text: nothing is HTML-escaped, so callers own the
//! markup safety of whatever they bind. A placeholder with no mapping entry
//! is left in the output verbatim; it is the caller's job to decide whether
//! leftovers are acceptable (see [`unresolved`]).

use std::{collections::BTreeMap, sync::LazyLock};

use regex::{Captures, Regex};

/// Placeholder-name-to-value bindings for a render call.
pub type Mapping = BTreeMap<String, String>;

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Z][A-Z0-9_]*)\}\}").unwrap());

/// Replaces every `{{NAME}}` occurrence in `template` with its value from
/// `mapping`.
///
/// Single pass over the template: replacement values are never re-scanned,
/// so a value containing placeholder-shaped text comes through untouched.
/// Tokens without a mapping entry stay literal, and mapping keys without a
/// token in the template have no effect.
pub fn render(template: &str, mapping: &Mapping) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match mapping.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder names still present in `html`, in document order.
pub fn unresolved(html: &str) -> Vec<&str> {
    PLACEHOLDER_RE
        .captures_iter(html)
        .map(|caps| caps.get(1).unwrap().as_str())
        .collect()
}

/// Convenience for building a [`Mapping`] from `(name, value)` pairs.
pub fn mapping<N, V>(pairs: impl IntoIterator<Item = (N, V)>) -> Mapping
where
    N: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(n, v)| (n.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_every_occurrence() {
        let out = render(
            "<p>{{TITLE}}</p><p>{{TITLE}}</p>",
            &mapping([("TITLE", "Hello")]),
        );
        assert_eq!(out, "<p>Hello</p><p>Hello</p>");
    }

    #[test]
    fn test_full_mapping_is_deterministic() {
        let template = "<h1>{{DATE}}</h1><div>{{NEWS_ITEMS}}</div>";
        let m = mapping([("DATE", "2024年01月01日"), ("NEWS_ITEMS", "<p>A</p>")]);

        let first = render(template, &m);
        assert_eq!(first, "<h1>2024年01月01日</h1><div><p>A</p></div>");
        // same template + same mapping => byte-identical output
        assert_eq!(render(template, &m), first);
    }

    #[test]
    fn test_missing_key_leaves_token_literal() {
        let template = "<title>{{TITLE}}</title>";
        assert_eq!(render(template, &Mapping::new()), template);
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let template = "<p>{{SUMMARY}}</p>";
        let m = mapping([("SUMMARY", "text"), ("UNUSED", "never seen")]);
        assert_eq!(render(template, &m), "<p>text</p>");
    }

    #[test]
    fn test_non_placeholder_text_preserved_verbatim() {
        let template = "  <div>\n\t{{CONTENT}} }} {{ {not_a_token}\n</div>  ";
        let out = render(template, &mapping([("CONTENT", "x")]));
        assert_eq!(out, "  <div>\n\tx }} {{ {not_a_token}\n</div>  ");
    }

    #[test]
    fn test_values_are_opaque_and_not_rescanned() {
        let m = mapping([("CONTENT", "{{TITLE}}"), ("TITLE", "never")]);
        assert_eq!(render("{{CONTENT}}", &m), "{{TITLE}}");
    }

    #[test]
    fn test_unresolved_reports_leftover_tokens() {
        let html = "<h1>{{TITLE}}</h1><p>done</p><span>{{NUMBER}}</span>";
        assert_eq!(unresolved(html), vec!["TITLE", "NUMBER"]);
        assert!(unresolved("<p>clean</p>").is_empty());
    }
}
