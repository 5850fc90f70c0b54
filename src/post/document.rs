//! The line-oriented post document.
//!
//! ```text
//! TITLE: Hello
//! CATEGORY: News
//! -----
//! BODY:
//! First paragraph.
//! -----
//! EXTENDED BODY:
//! More.
//! ```

use std::fmt::Write as _;
use std::io::BufRead;

use super::date::parse_display;
use super::{CategoryList, PostCategory, PostRecord};
use crate::error::{Error, Result};

const SEPARATOR: &str = "-----";

/// Everything a post document carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDocument {
    pub post: PostRecord,
    pub categories: CategoryList,
    /// False only when `STATUS` is present and is not `publish`.
    pub publish: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Header,
    SectionSelect,
    Accumulate(Section),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Body,
    ExtendedBody,
    Excerpt,
}

impl Section {
    fn from_marker(line: &str) -> Option<Section> {
        match line.to_uppercase().as_str() {
            "BODY:" => Some(Section::Body),
            "EXTENDED BODY:" => Some(Section::ExtendedBody),
            "EXCERPT:" => Some(Section::Excerpt),
            _ => None,
        }
    }

    fn field(self, post: &mut PostRecord) -> &mut Option<String> {
        match self {
            Section::Body => &mut post.description,
            Section::ExtendedBody => &mut post.text_more,
            Section::Excerpt => &mut post.excerpt,
        }
    }
}

/// Parse a post document.
///
/// # Arguments
///
/// * `reader` - The document source, read to the end.
///
/// # Returns
///
/// * `Result<PostDocument>` - The decoded post, or a format error naming the
///   first offending line.
pub fn decode<R: BufRead>(reader: R) -> Result<PostDocument> {
    let mut post = PostRecord::default();
    let mut categories = CategoryList::new();
    let mut publish = true;
    let mut state = State::Header;

    for line in reader.lines() {
        let line = line?;
        let control = line.trim_end();

        state = match state {
            State::Header => {
                if control == SEPARATOR {
                    State::SectionSelect
                } else {
                    if !control.trim().is_empty() {
                        apply_header(control, &mut post, &mut categories, &mut publish)?;
                    }
                    State::Header
                }
            }
            State::SectionSelect => match Section::from_marker(control) {
                Some(section) => State::Accumulate(section),
                None => {
                    return Err(Error::format(format!(
                        "Invalid line in the current state: {}",
                        line
                    )));
                }
            },
            State::Accumulate(section) => {
                if !control.is_empty() && control.bytes().all(|b| b == b'-') {
                    State::SectionSelect
                } else {
                    let field = section.field(&mut post);
                    if let Some(text) = field.as_mut() {
                        text.push('\n');
                        text.push_str(&line);
                    } else {
                        *field = Some(line);
                    }
                    State::Accumulate(section)
                }
            }
        };
    }

    Ok(PostDocument {
        post,
        categories,
        publish,
    })
}

fn apply_header(
    line: &str,
    post: &mut PostRecord,
    categories: &mut CategoryList,
    publish: &mut bool,
) -> Result<()> {
    let (key, value) = line
        .split_once(':')
        .ok_or_else(|| Error::format(format!("Invalid header line: {}", line)))?;
    let key = key.trim().to_uppercase();
    let value = value.trim();

    match key.as_str() {
        "TITLE" => post.title = Some(value.to_string()),
        "DATE" => post.date_created = Some(parse_display(value)?),
        "STATUS" => *publish = value.to_lowercase() == "publish",
        "ALLOW COMMENTS" => {
            let allow = value
                .parse::<u8>()
                .ok()
                .filter(|allow| *allow <= 2)
                .ok_or_else(|| Error::format("ALLOW COMMENTS must be either 0, 1 or 2"))?;
            post.allow_comments = Some(allow);
        }
        "ALLOW PINGS" => {
            let allow = value.parse::<i32>().map_err(|_| {
                Error::format(format!("ALLOW PINGS must be an integer, got \"{}\"", value))
            })?;
            post.allow_pings = Some(allow);
        }
        "PING" => post.ping_urls.push(value.to_string()),
        "CONVERT BREAKS" => post.convert_breaks = Some(value.to_string()),
        "POSTID" => post.post_id = Some(value.to_string()),
        "PRIMARY CATEGORY" => categories.insert(0, value.to_lowercase()),
        "CATEGORY" => categories.push(value.to_lowercase()),
        "KEYWORDS" => post.keywords = Some(value.to_string()),
        _ => return Err(Error::format(format!("Invalid field key: {}", key))),
    }

    Ok(())
}

/// Render a post back into document form for editing.
///
/// `STATUS` is always `publish`: the read API does not report publish state
/// uniformly, so a draft fetched from the server prints as published.
pub fn encode(post: &PostRecord, categories: &[PostCategory]) -> String {
    let mut out = String::new();

    if let Some(title) = &post.title {
        let _ = writeln!(out, "TITLE: {}", title);
    }
    if let Some(date) = &post.date_created {
        let _ = writeln!(out, "DATE: {}", date.to_display());
    }

    for category in categories.iter().filter(|c| c.primary) {
        let _ = writeln!(out, "PRIMARY CATEGORY: {}", category.name);
    }
    for category in categories.iter().filter(|c| !c.primary) {
        let _ = writeln!(out, "CATEGORY: {}", category.name);
    }

    out.push_str("STATUS: publish\n");

    if let Some(allow) = post.allow_comments {
        let _ = writeln!(out, "ALLOW COMMENTS: {}", allow);
    }
    if let Some(allow) = post.allow_pings {
        let _ = writeln!(out, "ALLOW PINGS: {}", allow);
    }
    if let Some(convert) = &post.convert_breaks {
        let _ = writeln!(out, "CONVERT BREAKS: {}", convert);
    }
    if let Some(keywords) = post.keywords.as_deref().filter(|k| !k.is_empty()) {
        let _ = writeln!(out, "KEYWORDS: {}", keywords);
    }
    for url in &post.ping_urls {
        let _ = writeln!(out, "PING: {}", url);
    }
    if let Some(post_id) = &post.post_id {
        let _ = writeln!(out, "POSTID: {}", post_id);
    }

    for (marker, text) in [
        ("BODY:", &post.description),
        ("EXTENDED BODY:", &post.text_more),
        ("EXCERPT:", &post.excerpt),
    ] {
        if let Some(text) = text.as_deref().filter(|t| !t.is_empty()) {
            let _ = writeln!(out, "{}\n{}\n{}", SEPARATOR, marker, text);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const FULL: &str = "\
TITLE: A day out
DATE: 11/19/2005 08:30:00 PM
CATEGORY: Tech
PRIMARY CATEGORY: News
CATEGORY: Life
STATUS: Draft
ALLOW COMMENTS: 2
ALLOW PINGS: 1
CONVERT BREAKS: markdown
KEYWORDS: beach, sun
PING: http://a.example.com/tb
PING: http://b.example.com/tb
POSTID: 42
-----
BODY:
First line.

Third line.
-----
EXTENDED BODY:
More text.
-----
EXCERPT:
Short.
";

    fn decode_str(text: &str) -> Result<PostDocument> {
        decode(text.as_bytes())
    }

    #[test]
    fn test_decode_full_document() {
        let doc = decode_str(FULL).unwrap();
        let post = &doc.post;

        assert_eq!(post.title.as_deref(), Some("A day out"));
        assert_eq!(
            post.date_created.map(|d| d.to_wire()).as_deref(),
            Some("20051119T20:30:00")
        );
        assert_eq!(doc.categories, vec!["news", "tech", "life"]);
        assert!(!doc.publish);
        assert_eq!(post.allow_comments, Some(2));
        assert_eq!(post.allow_pings, Some(1));
        assert_eq!(post.convert_breaks.as_deref(), Some("markdown"));
        assert_eq!(post.keywords.as_deref(), Some("beach, sun"));
        assert_eq!(
            post.ping_urls,
            vec!["http://a.example.com/tb", "http://b.example.com/tb"]
        );
        assert_eq!(post.post_id.as_deref(), Some("42"));
        assert_eq!(
            post.description.as_deref(),
            Some("First line.\n\nThird line.")
        );
        assert_eq!(post.text_more.as_deref(), Some("More text."));
        assert_eq!(post.excerpt.as_deref(), Some("Short."));
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let doc = decode_str("TITLE: Only a title\n").unwrap();
        assert!(doc.publish);
        assert!(doc.categories.is_empty());
        assert_eq!(
            doc.post,
            PostRecord {
                title: Some("Only a title".to_string()),
                ..PostRecord::default()
            }
        );
    }

    #[test]
    fn test_unknown_key_is_fatal() {
        let err = decode_str("TITLE: x\nFOO: bar\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("FOO"));
    }

    #[test]
    fn test_keys_are_case_insensitive_and_trimmed() {
        let doc = decode_str("  title :  Spaced  \nStatus: PUBLISH\n").unwrap();
        assert_eq!(doc.post.title.as_deref(), Some("Spaced"));
        assert!(doc.publish);
    }

    #[test]
    fn test_header_line_without_colon_is_fatal() {
        let err = decode_str("TITLE: x\njust words\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_blank_header_lines_are_skipped() {
        let doc = decode_str("\nTITLE: x\n   \n").unwrap();
        assert_eq!(doc.post.title.as_deref(), Some("x"));
    }

    #[test]
    fn test_primary_category_goes_first() {
        let doc = decode_str("CATEGORY: Tech\nPRIMARY CATEGORY: News\n").unwrap();
        assert_eq!(doc.categories, vec!["news", "tech"]);
    }

    #[test]
    fn test_last_title_wins() {
        let doc = decode_str("TITLE: one\nTITLE: two\n").unwrap();
        assert_eq!(doc.post.title.as_deref(), Some("two"));
    }

    #[test]
    fn test_allow_comments_range() {
        for value in ["3", "-1", "yes"] {
            let err = decode_str(&format!("ALLOW COMMENTS: {}\n", value)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "{:?}", value);
        }
        let doc = decode_str("ALLOW COMMENTS: 0\n").unwrap();
        assert_eq!(doc.post.allow_comments, Some(0));
    }

    #[test]
    fn test_allow_pings_is_not_range_checked() {
        let doc = decode_str("ALLOW PINGS: 7\n").unwrap();
        assert_eq!(doc.post.allow_pings, Some(7));
        assert!(decode_str("ALLOW PINGS: maybe\n").is_err());
    }

    #[test]
    fn test_bad_date_is_fatal() {
        let err = decode_str("DATE: tomorrow\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_unexpected_section_marker() {
        let err = decode_str("TITLE: x\n-----\nFOOTER:\ntext\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
        assert!(err.to_string().contains("FOOTER:"));
    }

    #[test]
    fn test_section_markers_are_case_insensitive_in_any_order() {
        let doc = decode_str("-----\nexcerpt:\nE\n-----\nBody:\nB\n").unwrap();
        assert_eq!(doc.post.excerpt.as_deref(), Some("E"));
        assert_eq!(doc.post.description.as_deref(), Some("B"));
    }

    #[test]
    fn test_any_run_of_dashes_ends_a_section() {
        let doc = decode_str("-----\nBODY:\na\n---\nEXCERPT:\nb\n").unwrap();
        assert_eq!(doc.post.description.as_deref(), Some("a"));
        assert_eq!(doc.post.excerpt.as_deref(), Some("b"));
    }

    #[test]
    fn test_end_of_input_mid_section_keeps_text() {
        let doc = decode_str("-----\nBODY:\nunterminated").unwrap();
        assert_eq!(doc.post.description.as_deref(), Some("unterminated"));

        let doc = decode_str("-----\n").unwrap();
        assert_eq!(doc.post.description, None);
    }

    #[test]
    fn test_leading_blank_body_line_is_kept() {
        let doc = decode_str("-----\nBODY:\n\nafter blank\n").unwrap();
        assert_eq!(doc.post.description.as_deref(), Some("\nafter blank"));
    }

    #[test]
    fn test_crlf_input() {
        let doc = decode_str("TITLE: x\r\n-----\r\nBODY:\r\nline\r\n").unwrap();
        assert_eq!(doc.post.title.as_deref(), Some("x"));
        assert_eq!(doc.post.description.as_deref(), Some("line"));
    }

    #[test]
    fn test_encode_layout() {
        let doc = decode_str(FULL).unwrap();
        let text = encode(&doc.post, &PostCategory::from_names(&doc.categories));

        let expected = "\
TITLE: A day out
DATE: 11/19/2005 20:30:00
PRIMARY CATEGORY: news
CATEGORY: tech
CATEGORY: life
STATUS: publish
ALLOW COMMENTS: 2
ALLOW PINGS: 1
CONVERT BREAKS: markdown
KEYWORDS: beach, sun
PING: http://a.example.com/tb
PING: http://b.example.com/tb
POSTID: 42
-----
BODY:
First line.

Third line.
-----
EXTENDED BODY:
More text.
-----
EXCERPT:
Short.
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_encode_skips_empty_optional_parts() {
        let post = PostRecord {
            title: Some("t".to_string()),
            keywords: Some(String::new()),
            description: Some("body".to_string()),
            text_more: Some(String::new()),
            post_id: Some("7".to_string()),
            ..PostRecord::default()
        };
        let text = encode(&post, &[]);
        assert_eq!(
            text,
            "TITLE: t\nSTATUS: publish\nPOSTID: 7\n-----\nBODY:\nbody\n"
        );
    }

    #[test]
    fn test_status_always_reads_back_as_publish() {
        let draft = decode_str("TITLE: t\nSTATUS: draft\n").unwrap();
        assert!(!draft.publish);

        let text = encode(&draft.post, &[]);
        assert!(text.contains("STATUS: publish\n"));
        assert!(decode_str(&text).unwrap().publish);
    }

    #[test]
    fn test_round_trip_preserves_fields() {
        let first = decode_str(FULL).unwrap();
        let text = encode(&first.post, &PostCategory::from_names(&first.categories));
        let second = decode_str(&text).unwrap();

        assert_eq!(second.post, first.post);
        assert_eq!(second.categories, first.categories);
    }
}
