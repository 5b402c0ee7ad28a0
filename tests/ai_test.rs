//! AI drafting through configuration and the command generator.

use folio::ai::{ChapterRequest, OutlineRequest, TextGenerator, generate_chapter_content, generate_outline};
use folio::{Config, Error};

struct Echo(&'static str);

impl TextGenerator for Echo {
    fn generate(&self, _prompt: &str) -> folio::Result<String> {
        Ok(self.0.to_string())
    }
}

#[test]
fn test_outline_tolerates_chatter() {
    let response = "Sure! Here is your outline:\n```json\n[\n  {\"title\": \"Getting Started\", \"description\": \"Basics.\"},\n  {\"title\": \"Going Further\", \"description\": \"Depth.\"}\n]\n```\nEnjoy.";
    let outline = generate_outline(&Echo(response), &OutlineRequest::new("Gardening")).unwrap();
    assert_eq!(outline.len(), 2);
    assert_eq!(outline[1].title, "Going Further");
}

#[test]
fn test_outline_rejects_blank_topic_before_generating() {
    let err = generate_outline(&Echo("[]"), &OutlineRequest::new("   ")).unwrap_err();
    assert!(matches!(err, Error::Validation(ref m) if m == "Please provide a topic"));
}

#[test]
fn test_outline_request_json_defaults() {
    let request: OutlineRequest = serde_json::from_str(r#"{"topic": "Bees", "numChapters": 0}"#).unwrap();
    assert_eq!(request.style, "Informative");
    assert_eq!(request.chapter_count(), 5);
}

#[test]
fn test_chapter_content_is_verbatim() {
    let text = "  # Heading\n\nBody with trailing space.  \n";
    let content = generate_chapter_content(&Echo(text), &ChapterRequest::new("Intro")).unwrap();
    assert_eq!(content, text);
}

#[cfg(unix)]
#[test]
fn test_configured_command_generator() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("folio.toml");
    std::fs::write(
        &path,
        r#"
[ai]
command = "sh"
args = ["-c", "cat > /dev/null; printf '[{\"title\": \"One\", \"description\": \"First.\"}]'"]
"#,
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let generator = config.generator().unwrap();
    let outline = generate_outline(&generator, &OutlineRequest::new("Bees").with_chapters(1)).unwrap();
    assert_eq!(outline[0].title, "One");
    assert_eq!(outline[0].description, "First.");
}

#[cfg(unix)]
#[test]
fn test_failing_command_is_upstream_error() {
    let config = Config::from_toml("[ai]\ncommand = \"false\"\n").unwrap();
    let generator = config.generator().unwrap();
    let err = generate_chapter_content(&generator, &ChapterRequest::new("Intro")).unwrap_err();
    assert!(matches!(err, Error::Upstream(_)));
}
