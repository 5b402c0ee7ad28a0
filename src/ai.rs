//! AI-assisted drafting: chapter outlines and chapter prose.
//!
//! The model itself sits behind [`TextGenerator`]. Outlines are requested as
//! a JSON array and recovered from the raw response by slicing from the
//! first `[` to the last `]`, so chatter around the array is tolerated.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

const DEFAULT_CHAPTERS: u32 = 5;
const DEFAULT_STYLE: &str = "Informative";

/// Produces text for a prompt.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutlineRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_chapters")]
    pub num_chapters: u32,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterRequest {
    #[serde(default)]
    pub chapter_title: String,
    #[serde(default)]
    pub chapter_description: Option<String>,
    #[serde(default = "default_style")]
    pub style: String,
}

/// One proposed chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

fn default_chapters() -> u32 {
    DEFAULT_CHAPTERS
}

/// `Some(trimmed)` for a non-blank optional field.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl OutlineRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            style: default_style(),
            num_chapters: DEFAULT_CHAPTERS,
            description: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn with_chapters(mut self, n: u32) -> Self {
        self.num_chapters = n;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Requested chapter count; zero means the default.
    pub fn chapter_count(&self) -> u32 {
        if self.num_chapters == 0 {
            DEFAULT_CHAPTERS
        } else {
            self.num_chapters
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic.trim().is_empty() {
            return Err(Error::Validation("Please provide a topic".to_string()));
        }
        Ok(())
    }
}

impl ChapterRequest {
    pub fn new(chapter_title: impl Into<String>) -> Self {
        Self {
            chapter_title: chapter_title.into(),
            chapter_description: None,
            style: default_style(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.chapter_description = Some(description.into());
        self
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chapter_title.trim().is_empty() {
            return Err(Error::Validation("Please provide a chapter title".to_string()));
        }
        Ok(())
    }
}

pub fn outline_prompt(request: &OutlineRequest) -> String {
    let n = request.chapter_count();
    let style = &request.style;
    let description = non_blank(&request.description)
        .map(|d| format!("Description: {d}"))
        .unwrap_or_default();

    format!(
        r#"You are an expert book outline generator. Create a comprehensive book outline based on the following requirements:

Topic: "{topic}"
{description}
Writing Style: {style}
Number of Chapters: {n}

Requirements:
1. Generate exactly {n} chapters
2. Each chapter title should be clear, engaging, and follow a logical progression
3. Each chapter description should be 2-3 sentences explaining what the chapter covers
4. Ensure chapters build upon each other coherently
5. Match the "{style}" writing style in your titles and descriptions

Output Format:
Return ONLY a valid JSON array with no additional text, markdown, or formatting. Each object must have exactly two keys: "title" and "description".

Example structure:
[
  {{
    "title": "Chapter 1: Introduction to the Topic",
    "description": "A comprehensive overview introducing the main concepts. Sets the foundation for understanding the subject matter."
  }},
  {{
    "title": "Chapter 2: Core Principles",
    "description": "Explores the fundamental principles and theories. Provides detailed examples and real-world applications."
  }}
]

Generate the outline now:"#,
        topic = request.topic.trim(),
    )
}

pub fn chapter_prompt(request: &ChapterRequest) -> String {
    let style = &request.style;
    let tone = style.to_lowercase();
    let description = non_blank(&request.chapter_description);
    let description_line = description
        .map(|d| format!("Chapter Description: {d}"))
        .unwrap_or_default();
    let coverage = if description.is_some() {
        "6. Cover all points mentioned in the chapter description"
    } else {
        ""
    };

    format!(
        r#"You are an expert writer specializing in {style} content. Write a complete chapter for a book with the following specifications:

Chapter Title: "{title}"
{description_line}
Writing Style: {style}
Target Length: Comprehensive and detailed (aim for 1500-2500 words)

Requirements:
1. Write in a {tone} tone throughout the chapter
2. Structure the content with clear sections and smooth transitions
3. Include relevant examples, explanations, or anecdotes as appropriate for the style
4. Ensure the content flows logically from introduction to conclusion
5. Make the content engaging and valuable to readers
{coverage}

Format Guidelines:
- Start with a compelling opening paragraph
- Use clear paragraph breaks for readability
- Include subheadings if appropriate for the content length
- End with a strong conclusion or transition to the next chapter
- Write in plain text without markdown formatting

Begin writing the chapter content now:"#,
        title = request.chapter_title.trim(),
    )
}

/// Extract the outline array from a raw model response.
pub fn parse_outline(raw: &str) -> Result<Vec<OutlineEntry>> {
    let bytes = raw.as_bytes();
    let span = memchr::memchr(b'[', bytes)
        .zip(memchr::memrchr(b']', bytes))
        .filter(|(start, end)| start < end);
    let Some((start, end)) = span else {
        log::error!("could not find JSON array in AI response: {raw:?}");
        return Err(Error::InvalidAiResponse(
            "Failed to parse AI response, no JSON array found.".to_string(),
        ));
    };

    serde_json::from_str(&raw[start..=end]).map_err(|e| {
        log::error!("failed to parse AI response ({e}): {:?}", &raw[start..=end]);
        Error::InvalidAiResponse(
            "Failed to generate a valid outline. The AI response was not valid JSON.".to_string(),
        )
    })
}

pub fn generate_outline<G: TextGenerator + ?Sized>(
    generator: &G,
    request: &OutlineRequest,
) -> Result<Vec<OutlineEntry>> {
    request.validate()?;
    let raw = generator.generate(&outline_prompt(request))?;
    let outline = parse_outline(&raw)?;
    log::debug!("outline for {:?}: {} chapters", request.topic, outline.len());
    Ok(outline)
}

/// Chapter prose, returned exactly as generated.
pub fn generate_chapter_content<G: TextGenerator + ?Sized>(
    generator: &G,
    request: &ChapterRequest,
) -> Result<String> {
    request.validate()?;
    generator.generate(&chapter_prompt(request))
}

/// [`TextGenerator`] that runs an external command, writing the prompt to
/// its stdin and reading the response from its stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl TextGenerator for CommandGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        let upstream = |e: std::io::Error| Error::Upstream(format!("{}: {e}", self.program));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(upstream)?;

        // stdin is fed while stdout drains; prompts can exceed the pipe buffer.
        let writer = child.stdin.take().map(|mut stdin| {
            let prompt = prompt.as_bytes().to_vec();
            thread::spawn(move || stdin.write_all(&prompt))
        });
        let output = child.wait_with_output().map_err(upstream)?;

        if let Some(writer) = writer {
            let written = writer
                .join()
                .map_err(|_| Error::Upstream(format!("{}: stdin writer panicked", self.program)))?;
            // A generator may exit without reading its input; its status decides.
            if let Err(e) = written {
                if e.kind() != ErrorKind::BrokenPipe {
                    return Err(upstream(e));
                }
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Upstream(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns a canned response and remembers the prompts it saw.
    struct Canned {
        response: std::result::Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    impl Canned {
        fn ok(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl TextGenerator for Canned {
        fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.response.clone().map_err(Error::Upstream)
        }
    }

    #[test]
    fn test_parse_outline_with_surrounding_text() {
        let raw = "Sure! Here it is:\n```json\n[{\"title\": \"One\", \"description\": \"First.\"}, {\"title\": \"Two\"}]\n```";
        let outline = parse_outline(raw).unwrap();
        assert_eq!(outline.len(), 2);
        assert_eq!(outline[0].title, "One");
        assert_eq!(outline[1].description, "");
    }

    #[test]
    fn test_parse_outline_errors() {
        for raw in ["no array here", "] backwards [", ""] {
            let err = parse_outline(raw).unwrap_err();
            assert!(matches!(&err, Error::InvalidAiResponse(m) if m.contains("no JSON array")), "{raw}");
        }
        let err = parse_outline("[{\"title\": }]").unwrap_err();
        assert!(matches!(&err, Error::InvalidAiResponse(m) if m.contains("not valid JSON")));
    }

    #[test]
    fn test_request_defaults_from_json() {
        let request: OutlineRequest = serde_json::from_str(r#"{"topic": "Rust"}"#).unwrap();
        assert_eq!(request.num_chapters, 5);
        assert_eq!(request.style, "Informative");

        let request: OutlineRequest =
            serde_json::from_str(r#"{"topic": "Rust", "numChapters": 0}"#).unwrap();
        assert_eq!(request.chapter_count(), 5);

        let request: ChapterRequest =
            serde_json::from_str(r#"{"chapterTitle": "Intro", "style": "Casual"}"#).unwrap();
        assert_eq!(request.chapter_title, "Intro");
        assert_eq!(request.chapter_description, None);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            OutlineRequest::new("  ").validate(),
            Err(Error::Validation(m)) if m == "Please provide a topic"
        ));
        assert!(matches!(
            ChapterRequest::new("").validate(),
            Err(Error::Validation(m)) if m == "Please provide a chapter title"
        ));
        assert!(OutlineRequest::new("Gardening").validate().is_ok());
    }

    #[test]
    fn test_outline_prompt_content() {
        let prompt = outline_prompt(
            &OutlineRequest::new("Gardening")
                .with_style("Casual")
                .with_chapters(7)
                .with_description("For balconies"),
        );
        assert!(prompt.contains("Topic: \"Gardening\""));
        assert!(prompt.contains("Description: For balconies"));
        assert!(prompt.contains("Generate exactly 7 chapters"));
        assert!(prompt.contains("Match the \"Casual\" writing style"));
        assert!(prompt.contains("{\n    \"title\": \"Chapter 1"));

        let bare = outline_prompt(&OutlineRequest::new("Gardening"));
        assert!(!bare.contains("Description:"));
        assert!(bare.contains("Number of Chapters: 5"));
    }

    #[test]
    fn test_chapter_prompt_content() {
        let prompt = chapter_prompt(&ChapterRequest::new("Roots").with_style("Academic"));
        assert!(prompt.contains("specializing in Academic content"));
        assert!(prompt.contains("Write in a academic tone"));
        assert!(!prompt.contains("6. Cover all points"));

        let prompt = chapter_prompt(&ChapterRequest::new("Roots").with_description("Soil and water"));
        assert!(prompt.contains("Chapter Description: Soil and water"));
        assert!(prompt.contains("6. Cover all points"));
    }

    #[test]
    fn test_generate_outline_and_chapter() {
        let generator = Canned::ok("[{\"title\": \"A\", \"description\": \"B\"}]");
        let outline = generate_outline(&generator, &OutlineRequest::new("Topic")).unwrap();
        assert_eq!(outline, vec![OutlineEntry { title: "A".into(), description: "B".into() }]);

        let generator = Canned::ok("  Verbatim *prose*\n");
        let content = generate_chapter_content(&generator, &ChapterRequest::new("Ch")).unwrap();
        assert_eq!(content, "  Verbatim *prose*\n");
    }

    #[test]
    fn test_invalid_request_never_calls_generator() {
        let generator = Canned::ok("[]");
        assert!(generate_outline(&generator, &OutlineRequest::new("")).is_err());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_upstream_failure_is_distinct() {
        let generator = Canned {
            response: Err("quota exceeded".to_string()),
            prompts: Mutex::new(Vec::new()),
        };
        let err = generate_outline(&generator, &OutlineRequest::new("Topic")).unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_generator() {
        let echo = CommandGenerator::new("cat");
        assert_eq!(echo.generate("hello prompt").unwrap(), "hello prompt");

        let failing = CommandGenerator::new("sh").with_args(["-c", "echo boom >&2; exit 3"]);
        let err = failing.generate("x").unwrap_err();
        assert!(matches!(&err, Error::Upstream(m) if m.contains("boom")));

        let missing = CommandGenerator::new("/nonexistent/generator");
        assert!(matches!(missing.generate("x"), Err(Error::Upstream(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_generator_streams_large_prompt() {
        // Larger than any pipe buffer; `cat` writes back while still reading.
        let prompt = "x".repeat(1 << 21);
        let echoed = CommandGenerator::new("cat").generate(&prompt).unwrap();
        assert_eq!(echoed.len(), prompt.len());
    }
}
