use once_cell::sync::Lazy;
use regex::Regex;

use crate::ir::DocTag;

static LINE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\*? ?").unwrap());
static TAG_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@([A-Za-z][\w-]*)\s*(.*)$").unwrap());

/// Parsed `/** ... */` comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsDoc {
    pub description: Option<String>,
    pub tags: Vec<DocTag>,
}

impl JsDoc {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.tags.is_empty()
    }
}

/// Split a doc comment into its free-text description and `@tag` entries.
/// Continuation lines belong to the tag above them.
pub fn parse(raw: &str) -> JsDoc {
    let body = strip_delimiters(raw);

    let mut description: Vec<&str> = Vec::new();
    let mut tags: Vec<(String, Vec<String>)> = Vec::new();

    for line in body.lines() {
        let line = LINE_PREFIX.find(line).map_or(line, |m| &line[m.end()..]);
        let trimmed = line.trim_end();
        if let Some(caps) = TAG_LINE.captures(trimmed.trim_start()) {
            let name = caps[1].to_string();
            let first = caps.get(2).map_or("", |m| m.as_str()).to_string();
            tags.push((name, vec![first]));
            continue;
        }
        match tags.last_mut() {
            Some((_, text)) => text.push(trimmed.to_string()),
            None => description.push(trimmed),
        }
    }

    JsDoc {
        description: non_empty(description.join("\n")),
        tags: tags
            .into_iter()
            .map(|(tag_name, lines)| DocTag { tag_name, text: non_empty(lines.join("\n")) })
            .collect(),
    }
}

fn strip_delimiters(raw: &str) -> &str {
    let s = raw.trim();
    let s = s.strip_prefix("/**").or_else(|| s.strip_prefix("/*")).unwrap_or(s);
    s.strip_suffix("*/").unwrap_or(s)
}

fn non_empty(s: String) -> Option<String> {
    let t = s.trim();
    if t.is_empty() { None } else { Some(t.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn description_and_tags() {
        let doc = parse(
            "/**\n * Renders a button.\n * Use sparingly.\n *\n * @param props - the props\n * @deprecated\n */",
        );
        assert_eq!(doc.description.as_deref(), Some("Renders a button.\nUse sparingly."));
        assert_eq!(doc.tags.len(), 2);
        assert_eq!(doc.tags[0].tag_name, "param");
        assert_eq!(doc.tags[0].text.as_deref(), Some("props - the props"));
        assert_eq!(doc.tags[1].tag_name, "deprecated");
        assert_eq!(doc.tags[1].text, None);
    }

    #[test]
    fn single_line_comment() {
        let doc = parse("/** The current count. */");
        assert_eq!(doc.description.as_deref(), Some("The current count."));
        assert!(doc.tags.is_empty());
    }

    #[test]
    fn multi_line_tag_text_is_kept_together() {
        let doc = parse("/**\n * @example\n * const a = 1\n * const b = 2\n */");
        assert_eq!(doc.description, None);
        assert_eq!(doc.tags[0].tag_name, "example");
        assert_eq!(doc.tags[0].text.as_deref(), Some("const a = 1\nconst b = 2"));
    }

    #[test]
    fn empty_comment_is_empty() {
        assert!(parse("/** */").is_empty());
        assert!(parse("/**\n *\n */").is_empty());
    }
}
