//! Persona document parsing and rendering
//!
//! # Format
//!
//! ```markdown
//! # Tech Guru
//!
//! You are a seasoned engineer who explains things simply.
//!
//! ## Characteristics
//! - ...
//!
//! ## Metadata
//! - image: https://example.com/guru.png
//! - entry_message: Hi all!
//! - cartesia_voice_id: 1234
//! - gender: MALE
//! - relevant_links: https://a.example https://b.example
//! ```
//!
//! Only the title, the first paragraph and the `Metadata` section are read.
//! Every other section is regenerated from shared constants on render.

use std::fmt::Write;

use super::error::{PersonaError, Result};
use super::prompts::{DEFAULT_CHARACTERISTICS, DEFAULT_VOICE_CHARACTERISTICS};
use super::{Gender, PersonaRecord};

/// A line starting with `## ` opens a new section
pub(crate) const SECTION_DELIMITER: &str = "\n## ";
const METADATA_HEADING: &str = "Metadata";

/// Parse a persona document into a record
///
/// Fails when the title line or the prompt paragraph is missing.
/// `additional_content` is always `None`; sibling documents are attached by
/// the catalog.
pub fn parse(content: &str) -> Result<PersonaRecord> {
    let content = content.replace("\r\n", "\n");
    let sections: Vec<&str> = content.split(SECTION_DELIMITER).collect();
    let preamble = sections.first().copied().unwrap_or_default();

    let title = preamble.lines().next().unwrap_or_default();
    let name = title.trim().trim_start_matches("# ").trim().to_string();
    if name.is_empty() {
        return Err(PersonaError::Malformed("missing title line".to_string()));
    }

    let prompt = preamble
        .split_once("\n\n")
        .map(|(_, body)| body.trim().to_string())
        .unwrap_or_default();
    if prompt.is_empty() {
        return Err(PersonaError::Malformed(format!("'{}' has no prompt paragraph", name)));
    }

    let mut record = PersonaRecord {
        name,
        prompt,
        image: String::new(),
        entry_message: String::new(),
        voice_id: String::new(),
        gender: None,
        relevant_links: Vec::new(),
        additional_content: None,
    };

    if let Some(metadata) = sections.iter().find(|s| s.starts_with(METADATA_HEADING)) {
        apply_metadata(&mut record, metadata);
    }

    Ok(record)
}

fn apply_metadata(record: &mut PersonaRecord, section: &str) {
    for line in section.lines() {
        let Some(pair) = line.strip_prefix("- ") else {
            continue;
        };
        let Some((key, value)) = pair.split_once(": ") else {
            continue;
        };
        let value = value.trim();

        match key {
            "image" => record.image = value.to_string(),
            "entry_message" => record.entry_message = value.to_string(),
            "cartesia_voice_id" => record.voice_id = value.to_string(),
            "gender" => {
                record.gender = if value.is_empty() {
                    None
                } else {
                    match value.parse::<Gender>() {
                        Ok(gender) => Some(gender),
                        Err(e) => {
                            log::warn!("Ignoring gender for '{}': {}", record.name, e);
                            None
                        }
                    }
                }
            }
            "relevant_links" => {
                record.relevant_links = value.split_whitespace().map(str::to_string).collect();
            }
            _ => {}
        }
    }
}

/// Render a record with the standard persona template
///
/// `additional_content` is not written; it lives in sibling documents.
pub fn render(record: &PersonaRecord) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(out, "# {}", record.name);
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", record.prompt);
    let _ = writeln!(out);

    let _ = writeln!(out, "## Characteristics");
    for item in DEFAULT_CHARACTERISTICS {
        let _ = writeln!(out, "- {}", item);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## Voice");
    let _ = writeln!(out, "{} speaks with:", record.name);
    for item in DEFAULT_VOICE_CHARACTERISTICS {
        let _ = writeln!(out, "- {}", item);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "## {}", METADATA_HEADING);
    let _ = writeln!(out, "- image: {}", record.image);
    let _ = writeln!(out, "- entry_message: {}", record.entry_message);
    let _ = writeln!(out, "- cartesia_voice_id: {}", record.voice_id);
    let _ = writeln!(
        out,
        "- gender: {}",
        record.gender.map(|g| g.as_str()).unwrap_or_default()
    );
    let _ = writeln!(out, "- relevant_links: {}", record.relevant_links.join(" "));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"# Tech Guru

You are a seasoned engineer.
You explain things simply.

## Characteristics
- Patient

## Metadata
- image: https://utfs.uploadthing.com/guru.png
- entry_message: Hello, nerds!
- cartesia_voice_id: abc-123
- gender: MALE
- relevant_links: https://a.example   https://b.example
- favourite_color: blue
"#;

    #[test]
    fn test_parse_full_document() {
        let record = parse(FULL).unwrap();
        assert_eq!(record.name, "Tech Guru");
        assert_eq!(record.prompt, "You are a seasoned engineer.\nYou explain things simply.");
        assert_eq!(record.image, "https://utfs.uploadthing.com/guru.png");
        assert_eq!(record.entry_message, "Hello, nerds!");
        assert_eq!(record.voice_id, "abc-123");
        assert_eq!(record.gender, Some(Gender::Male));
        assert_eq!(record.relevant_links, vec!["https://a.example", "https://b.example"]);
        assert!(record.additional_content.is_none());
    }

    #[test]
    fn test_parse_without_metadata() {
        let record = parse("# Coach\n\nBe encouraging.\n").unwrap();
        assert_eq!(record.name, "Coach");
        assert_eq!(record.prompt, "Be encouraging.");
        assert_eq!(record.image, "");
        assert_eq!(record.entry_message, "");
        assert_eq!(record.voice_id, "");
        assert_eq!(record.gender, None);
        assert!(record.relevant_links.is_empty());
    }

    #[test]
    fn test_parse_skips_malformed_metadata_lines() {
        let doc = "# A\n\nPrompt\n\n## Metadata\n- image https://no-colon\n- gender: FEMALE\nnot a bullet: x\n";
        let record = parse(doc).unwrap();
        assert_eq!(record.image, "");
        assert_eq!(record.gender, Some(Gender::Female));
    }

    #[test]
    fn test_parse_links_are_not_comma_split() {
        let doc = "# A\n\nPrompt\n\n## Metadata\n- relevant_links: https://a.example,https://b.example\n";
        let record = parse(doc).unwrap();
        assert_eq!(record.relevant_links, vec!["https://a.example,https://b.example"]);
    }

    #[test]
    fn test_parse_unknown_gender_is_unset() {
        let doc = "# A\n\nPrompt\n\n## Metadata\n- gender: robot\n";
        let record = parse(doc).unwrap();
        assert_eq!(record.gender, None);
    }

    #[test]
    fn test_parse_title_without_prompt_fails() {
        let result = parse("# Lonely Title\n## Metadata\n- image: x\n");
        assert!(matches!(result, Err(PersonaError::Malformed(_))));
    }

    #[test]
    fn test_parse_empty_document_fails() {
        assert!(matches!(parse(""), Err(PersonaError::Malformed(_))));
    }

    #[test]
    fn test_parse_crlf_document() {
        let doc = "# Windows Person\r\n\r\nPrompt line\r\n\r\n## Metadata\r\n- gender: FEMALE\r\n";
        let record = parse(doc).unwrap();
        assert_eq!(record.name, "Windows Person");
        assert_eq!(record.prompt, "Prompt line");
        assert_eq!(record.gender, Some(Gender::Female));
    }

    #[test]
    fn test_render_contains_template_sections() {
        let record = parse(FULL).unwrap();
        let rendered = render(&record);

        assert!(rendered.starts_with("# Tech Guru\n\n"));
        assert!(rendered.contains("## Characteristics\n"));
        assert!(rendered.contains("## Voice\nTech Guru speaks with:\n"));
        assert!(rendered.contains("- cartesia_voice_id: abc-123\n"));
        assert!(rendered.contains("- relevant_links: https://a.example https://b.example\n"));
        assert!(!rendered.contains("favourite_color"));
    }

    #[test]
    fn test_render_then_parse_is_stable() {
        for doc in [FULL, "# Coach\n\nBe encouraging.\n"] {
            let first = parse(doc).unwrap();
            let second = parse(&render(&first)).unwrap();
            assert_eq!(first, second);
        }
    }
}
