use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use super::{decode, NoteDocument};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];

pub fn extract_md(bytes: &[u8], path: &Path, stem: &str) -> NoteDocument {
    let text = decode(bytes);
    let (frontmatter_src, body) = split_frontmatter(&text);
    let frontmatter = frontmatter_src
        .map(|src| parse_frontmatter(src, path))
        .unwrap_or_default();
    let body = body.trim();

    let title = frontmatter
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| stem.to_string());

    NoteDocument {
        path: path.to_path_buf(),
        file_type: "md".to_string(),
        title,
        body: body.to_string(),
        wikilinks: extract_wikilinks(body),
        tags: extract_tags(body, &frontmatter),
        headings: extract_headings(body),
        created_at: frontmatter.get("created").and_then(parse_date),
        modified_at: frontmatter.get("modified").and_then(parse_date),
        frontmatter,
    }
}

/// Split leading `---` delimited front-matter from the body.
fn split_frontmatter(text: &str) -> (Option<&str>, &str) {
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    let Some(after_open) = trimmed
        .strip_prefix("---\n")
        .or_else(|| trimmed.strip_prefix("---\r\n"))
    else {
        return (None, text);
    };

    // Empty front-matter: the closing delimiter immediately follows.
    if let Some(rest) = after_open.strip_prefix("---") {
        return (Some(""), rest);
    }

    match after_open.find("\n---") {
        Some(end) => {
            let rest = &after_open[end + 4..];
            // Drop the remainder of the delimiter line.
            let body = rest.find('\n').map(|i| &rest[i + 1..]).unwrap_or("");
            (Some(&after_open[..end]), body)
        }
        None => (None, text),
    }
}

fn parse_frontmatter(src: &str, path: &Path) -> Map<String, Value> {
    if src.trim().is_empty() {
        return Map::new();
    }
    match serde_yaml::from_str::<Value>(src) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(path = %path.display(), kind = ?other, "front-matter is not a mapping, ignoring");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid YAML front-matter, ignoring");
            Map::new()
        }
    }
}

/// Targets of `[[Note]]`, `[[Note|alias]]` and `[[Note#Section]]` links.
fn extract_wikilinks(content: &str) -> Vec<String> {
    let mut links = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find("[[") {
        let after = &rest[open + 2..];
        let Some(close) = after.find("]]") else {
            break;
        };
        let inner = &after[..close];
        // An unclosed `[[` before this link: parse from the innermost opener.
        let inner = inner.rfind("[[").map_or(inner, |i| &inner[i + 2..]);
        let target = inner.split('|').next().unwrap_or("");
        let target = target.split('#').next().unwrap_or("").trim();
        if !target.is_empty() && !target.contains('[') {
            links.push(target.to_string());
        }
        rest = &after[close + 2..];
    }
    links
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-')
}

/// Inline `#tags` (at line start or after whitespace) plus front-matter `tags`.
fn extract_tags(content: &str, frontmatter: &Map<String, Value>) -> Vec<String> {
    let mut tags = BTreeSet::new();
    let mut prev: Option<char> = None;

    for (i, c) in content.char_indices() {
        if c == '#' && prev.map_or(true, char::is_whitespace) {
            let tag: String = content[i + 1..].chars().take_while(|&c| is_tag_char(c)).collect();
            if !tag.is_empty() {
                tags.insert(tag);
            }
        }
        prev = Some(c);
    }

    match frontmatter.get("tags") {
        Some(Value::String(tag)) => {
            tags.insert(tag.trim_matches('#').to_string());
        }
        Some(Value::Array(items)) => {
            for tag in items.iter().filter_map(Value::as_str) {
                tags.insert(tag.trim_matches('#').to_string());
            }
        }
        _ => {}
    }
    tags.retain(|t| !t.is_empty());
    tags.into_iter().collect()
}

fn extract_headings(content: &str) -> Vec<String> {
    content
        .lines()
        .filter(|line| {
            let hashes = line.chars().take_while(|&c| c == '#').count();
            hashes > 0 && line[hashes..].starts_with(' ')
        })
        .map(|line| line.trim_start_matches('#').trim().to_string())
        .collect()
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    fn parse(content: &str) -> NoteDocument {
        extract_md(content.as_bytes(), Path::new("vault/Note.md"), "Note")
    }

    #[test]
    fn extract_headings_from_body() {
        let note = parse("# Title\n\nSome text.\n\n## Section 1\n\nMore text.\n\n### Subsection\n#notaheading");
        assert_eq!(note.headings, vec!["Title", "Section 1", "Subsection"]);
    }

    #[test]
    fn frontmatter_is_stripped_from_body() {
        let note = parse("---\ntitle: Custom\naliases: [x]\n---\n\nBody starts here.");
        assert_eq!(note.title, "Custom");
        assert_eq!(note.body, "Body starts here.");
        assert_eq!(note.frontmatter["aliases"], json!(["x"]));
    }

    #[test]
    fn title_falls_back_to_stem() {
        let note = parse("Just plain text without any headings.");
        assert_eq!(note.title, "Note");
        assert!(note.frontmatter.is_empty());
        assert_eq!(note.body, "Just plain text without any headings.");
    }

    #[test]
    fn invalid_frontmatter_is_ignored() {
        let note = parse("---\ntitle: [unclosed\n---\nBody");
        assert!(note.frontmatter.is_empty());
        assert_eq!(note.title, "Note");
        assert_eq!(note.body, "Body");
    }

    #[test]
    fn empty_frontmatter_block() {
        let note = parse("---\n---\nBody");
        assert!(note.frontmatter.is_empty());
        assert_eq!(note.body, "Body");
    }

    #[test]
    fn unterminated_frontmatter_is_body() {
        let note = parse("---\nnot closed");
        assert!(note.frontmatter.is_empty());
        assert_eq!(note.body, "---\nnot closed");
    }

    #[test]
    fn wikilink_forms() {
        let note = parse("See [[Alpha]], [[Beta|the beta]], [[Gamma#Intro]] and [[Delta#Part|alias]]. [[ ]]");
        assert_eq!(note.wikilinks, vec!["Alpha", "Beta", "Gamma", "Delta"]);
    }

    #[test]
    fn unclosed_opener_does_not_hide_next_link() {
        let note = parse("[[ [[Real]] and [[broken [[Other|alias]] then [[Last]]");
        assert_eq!(note.wikilinks, vec!["Real", "Other", "Last"]);
    }

    #[test]
    fn tags_from_content_and_frontmatter() {
        let note = parse("---\ntags:\n  - \"#project\"\n  - review\n---\n#inbox first line\nText with #area/work and #to_do-list. Not a tag: a#b, ## heading");
        assert_eq!(note.tags, vec!["area/work", "inbox", "project", "review", "to_do-list"]);
    }

    #[test]
    fn single_string_tag() {
        let note = parse("---\ntags: \"#solo\"\n---\nbody");
        assert_eq!(note.tags, vec!["solo"]);
    }

    #[test]
    fn frontmatter_dates() {
        let note = parse("---\ncreated: 2024-03-05\nmodified: 2024-03-06T10:20:30Z\n---\nbody");
        let created = note.created_at.unwrap();
        assert_eq!((created.year(), created.month(), created.day()), (2024, 3, 5));
        let modified = note.modified_at.unwrap();
        assert_eq!((modified.hour(), modified.minute(), modified.second()), (10, 20, 30));
    }

    #[test]
    fn unparsable_dates_are_ignored() {
        let note = parse("---\ncreated: last tuesday\nmodified: 5\n---\nbody");
        assert!(note.created_at.is_none());
        assert!(note.modified_at.is_none());
    }

    #[test]
    fn day_first_dates() {
        assert!(parse_date(&json!("05/03/2024")).is_some());
        assert!(parse_date(&json!("05-03-2024")).is_some());
        assert!(parse_date(&json!("2024-03-05 08:00:00")).is_some());
    }

    #[test]
    fn empty_markdown() {
        let note = parse("");
        assert_eq!(note.body, "");
        assert!(note.headings.is_empty());
        assert!(note.wikilinks.is_empty());
        assert!(note.tags.is_empty());
    }
}
