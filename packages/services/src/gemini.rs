//! Gemini client: article extraction, summarization, titles and thumbnails.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use scribe_core::{
    CapabilityFuture, Length, StageError, Summarizer, Summary, ThumbnailGenerator, TitleGenerator,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GeminiConfig;
use crate::error::{Result, ServiceError, check_status};

const TITLE_SNIPPET_CHARS: usize = 1000;
const THUMBNAIL_SNIPPET_CHARS: usize = 500;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
}

impl GenerateResponse {
    fn parts(self) -> Vec<ResponsePart> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default()
    }

    fn first_text(self) -> Result<String> {
        self.parts()
            .into_iter()
            .find_map(|p| p.text)
            .ok_or_else(|| ServiceError::InvalidResponse("no content in response".into()))
    }

    fn first_image(self) -> Result<Vec<u8>> {
        let data = self
            .parts()
            .into_iter()
            .find_map(|p| p.inline_data)
            .ok_or_else(|| ServiceError::InvalidResponse("no image data in response".into()))?;
        Ok(STANDARD.decode(data.data)?)
    }
}

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<GenerateResponse> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart { text: prompt }],
            }],
        };

        debug!(model, prompt_chars = prompt.len(), "Requesting Gemini completion");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let response = check_status("gemini", response).await?;
        Ok(response.json().await?)
    }

    /// Fetch the page behind `url` and return only the article text.
    pub async fn extract_article(&self, url: &str) -> Result<String> {
        let prompt = extraction_prompt(url);
        let text = self
            .generate(&self.config.text_model, &prompt)
            .await?
            .first_text()?;
        Ok(text.trim().to_string())
    }

    pub async fn summarize_content(
        &self,
        content: &str,
        length: Length,
        language: &str,
        style: &str,
    ) -> Result<String> {
        let prompt = summary_prompt(content, length, language, style);
        let text = self
            .generate(&self.config.text_model, &prompt)
            .await?
            .first_text()?;
        Ok(text.trim().to_string())
    }

    pub async fn title(&self, content: &str) -> Result<String> {
        let prompt = title_prompt(content);
        let text = self
            .generate(&self.config.text_model, &prompt)
            .await?
            .first_text()?;
        Ok(clean_title(&text))
    }

    pub async fn thumbnail(&self, summary: &str) -> Result<Vec<u8>> {
        let prompt = thumbnail_prompt(summary);
        self.generate(&self.config.image_model, &prompt)
            .await?
            .first_image()
    }
}

impl Summarizer for GeminiClient {
    fn summarize<'a>(
        &'a self,
        url: &'a str,
        length: Length,
        language: &'a str,
        style: &'a str,
    ) -> CapabilityFuture<'a, Summary> {
        Box::pin(async move {
            let full_text = self
                .extract_article(url)
                .await
                .map_err(|e| StageError::Extraction(e.to_string()))?;
            info!(url, chars = full_text.len(), "Extracted article content");

            let summary = self
                .summarize_content(&full_text, length, language, style)
                .await
                .map_err(|e| StageError::Summarization(e.to_string()))?;

            Ok(Summary { full_text, summary })
        })
    }
}

impl TitleGenerator for GeminiClient {
    fn generate_title<'a>(&'a self, content: &'a str) -> CapabilityFuture<'a, String> {
        Box::pin(async move {
            let title = self
                .title(content)
                .await
                .map_err(|e| StageError::Title(e.to_string()))?;
            if title.is_empty() {
                return Err(StageError::Title("empty title in response".into()));
            }
            Ok(title)
        })
    }
}

impl ThumbnailGenerator for GeminiClient {
    fn generate_thumbnail<'a>(&'a self, summary: &'a str) -> CapabilityFuture<'a, Vec<u8>> {
        Box::pin(async move {
            self.thumbnail(summary)
                .await
                .map_err(|e| StageError::Thumbnail(e.to_string()))
        })
    }
}

fn extraction_prompt(url: &str) -> String {
    format!(
        "Extract the main article content from this URL: {url}

Please:
1. Remove all navigation menus, headers, footers, ads, and other non-article content
2. Keep only the article title and main body text
3. Preserve paragraph structure
4. Remove any JavaScript, CSS, or HTML tags
5. Return clean, readable text

Return only the extracted article content."
    )
}

fn length_instruction(length: Length) -> &'static str {
    match length {
        Length::Short => "approximately 1 minute of reading time (about 150-200 words)",
        Length::Medium => "approximately 5 minutes of reading time (about 750-1000 words)",
        Length::Long => "keep the full article content, but clean it up and organize it well",
    }
}

fn style_instruction(style: &str) -> &'static str {
    match style {
        "explain" => "Explain the key concepts and ideas in detail, making them easy to understand.",
        "simplify" => {
            "Simplify the content using plain language, making it accessible to everyone."
        }
        "detailed" => {
            "Provide a detailed analysis with key points, insights, and important details."
        }
        "bullet" => {
            "Present the main points in a clear, structured way, highlighting key takeaways."
        }
        "story" => {
            "Present the content as an engaging narrative, making it compelling and interesting."
        }
        _ => "Summarize the main points and key ideas concisely.",
    }
}

fn is_english(language: &str) -> bool {
    let language = language.trim().to_ascii_lowercase();
    language.is_empty() || language == "en" || language.starts_with("en-")
}

pub(crate) fn summary_prompt(content: &str, length: Length, language: &str, style: &str) -> String {
    let language_line = if is_english(language) {
        String::new()
    } else {
        format!("- Write the summary in the language with code \"{language}\"\n")
    };

    format!(
        "{style} Target length: {length}.

IMPORTANT: This summary will be converted to speech, so:
- Use only spoken language and natural phrasing
- Avoid special characters, symbols, URLs, hashtags, and markdown formatting
- Avoid parentheses, brackets, asterisks, underscores, and other punctuation marks that aren't naturally spoken
- Use periods for natural pauses between sentences
- Use commas for shorter pauses within sentences
- Spell out numbers, percentages, and abbreviations (e.g., \"ten percent\" not \"10%\", \"doctor\" not \"Dr.\")
- Write out acronyms on first use, then use the full term
- Use complete sentences with clear, natural flow
- Organize with paragraph breaks (blank lines) to indicate longer pauses between topics
- Be conversational and engaging, as if explaining to a listener
{language_line}- Return ONLY the summary text, nothing else

Article content:
{content}

Summary:",
        style = style_instruction(style),
        length = length_instruction(length),
    )
}

pub(crate) fn title_prompt(content: &str) -> String {
    format!(
        "Generate a concise, engaging title (maximum 10 words) for the following article content. The title should be clear, informative, and capture the main topic. Return ONLY the title, nothing else.

Article content:
{}

Title:",
        snippet(content, TITLE_SNIPPET_CHARS)
    )
}

pub(crate) fn thumbnail_prompt(summary: &str) -> String {
    format!(
        "Create a professional, visually appealing thumbnail image for an article. The image should be abstract and artistic, representing the following content: {}. Style: modern, clean, professional, eye-catching.",
        snippet(summary, THUMBNAIL_SNIPPET_CHARS)
    )
}

/// At most `max_chars` characters from the start of `text`.
fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn clean_title(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}
