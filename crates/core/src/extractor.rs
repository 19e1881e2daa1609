use crate::error::ExtractError;
use crate::pdf::PageSource;
use crate::traits::CompletionClient;
use crate::NewCompany;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

pub const EXPECTED_KEYWORDS: usize = 15;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(1);

const PROMPT_TEMPLATE: &str = r#"Extract the following information from this company profile text and return it as a JSON object. Do not include any markdown formatting or additional text:
{
    "company_name": "string (exact text from source)",
    "about": "string (exact text from source)",
    "example_projects": "string (exact text from source)",
    "business_model": "string (exact text from source)",
    "majors_hiring": ["array", "of", "string", "majors", "exact", "text"],
    "keywords": ["array", "of", "exactly", "15", "single", "word", "keywords"]
}
Requirements:
- Keep all text exactly as it appears in the source for company_name, about, example_projects, business_model, and majors_hiring
- For keywords: Generate EXACTLY 15 single-word keywords that best describe this company, its industry, and technologies used
- Ensure keywords array contains exactly 15 elements
- Each keyword must be a single word (no spaces)
- If a field is missing from the source text, use an empty string
- The response must be a valid JSON object
- Do not include any explanation or additional text outside the JSON object
Source text:
"#;

#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Upper bound on pages sent to the model; `None` processes every page.
    pub page_limit: Option<usize>,
    /// Pause between consecutive pages.
    pub page_delay: Duration,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            page_limit: None,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Shape the model is asked to return. Every field except
/// `example_projects` must be present.
#[derive(Debug, Clone, Deserialize)]
struct ExtractedCompany {
    company_name: String,
    about: String,
    #[serde(default)]
    example_projects: Option<String>,
    business_model: String,
    majors_hiring: Vec<String>,
    keywords: Vec<String>,
}

impl ExtractedCompany {
    fn validate(self) -> Result<NewCompany, ExtractError> {
        let name = self.company_name.trim();
        if name.is_empty() {
            return Err(ExtractError::Validation("company_name is empty".to_string()));
        }

        if self.keywords.len() != EXPECTED_KEYWORDS {
            return Err(ExtractError::Validation(format!(
                "expected {EXPECTED_KEYWORDS} keywords, got {}",
                self.keywords.len()
            )));
        }

        if let Some(keyword) = self
            .keywords
            .iter()
            .find(|keyword| keyword.is_empty() || keyword.chars().any(char::is_whitespace))
        {
            return Err(ExtractError::Validation(format!(
                "keyword {keyword:?} is not a single word"
            )));
        }

        Ok(NewCompany {
            name: name.to_string(),
            about: self.about,
            example_projects: self
                .example_projects
                .filter(|projects| !projects.trim().is_empty()),
            business_model: self.business_model,
            majors_hiring: self.majors_hiring,
            keywords: self.keywords,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedPage {
    pub page: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub pages_in_document: usize,
    pub pages_processed: usize,
    pub companies: Vec<NewCompany>,
    pub skipped: Vec<SkippedPage>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct CompanyExtractor<C> {
    client: C,
    options: ExtractionOptions,
}

impl<C: CompletionClient> CompanyExtractor<C> {
    pub fn new(client: C, options: ExtractionOptions) -> Self {
        Self { client, options }
    }

    /// Sends each page to the model in order. A failing page is logged and
    /// recorded in `skipped`; it never stops the batch.
    pub async fn extract<P: PageSource + ?Sized>(&self, pages: &P) -> ExtractionReport {
        let started_at = Utc::now();
        let pages_in_document = pages.page_count();
        let pages_processed = self
            .options
            .page_limit
            .map_or(pages_in_document, |limit| limit.min(pages_in_document));

        let mut companies = Vec::new();
        let mut skipped = Vec::new();

        for index in 0..pages_processed {
            if index > 0 && !self.options.page_delay.is_zero() {
                tokio::time::sleep(self.options.page_delay).await;
            }

            let page = (index + 1) as u32;
            info!(page, total = pages_processed, "processing page");

            match self.extract_page(pages, page).await {
                Ok(company) => {
                    info!(page, company = %company.name, "extracted company");
                    companies.push(company);
                }
                Err(error) => {
                    warn!(page, error = %error, "skipping page");
                    skipped.push(SkippedPage {
                        page,
                        reason: error.to_string(),
                    });
                }
            }
        }

        ExtractionReport {
            pages_in_document,
            pages_processed,
            companies,
            skipped,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn extract_page<P: PageSource + ?Sized>(
        &self,
        pages: &P,
        page: u32,
    ) -> Result<NewCompany, ExtractError> {
        let text = pages.page_text(page)?;
        if text.trim().is_empty() {
            return Err(ExtractError::PdfParse(format!("page {page} has no readable text")));
        }

        let reply = self.client.complete(&build_prompt(&text)).await?;
        parse_company(&reply)
    }
}

pub fn build_prompt(page_text: &str) -> String {
    format!("{PROMPT_TEMPLATE}{page_text}")
}

/// Decodes one model reply into a validated company record.
pub fn parse_company(reply: &str) -> Result<NewCompany, ExtractError> {
    let payload = strip_code_fences(reply)?;
    let extracted: ExtractedCompany = serde_json::from_str(&payload)?;
    extracted.validate()
}

/// Removes a surrounding markdown fence and a bare `json` label.
pub fn strip_code_fences(reply: &str) -> Result<String, ExtractError> {
    let fence = Regex::new(r"(?s)```[A-Za-z]*[ \t]*\r?\n?(.*?)```")?;
    let trimmed = reply.trim();

    let inner = fence
        .captures(trimmed)
        .and_then(|captures| captures.get(1))
        .map_or(trimmed, |body| body.as_str())
        .trim();

    let inner = inner
        .strip_prefix("json")
        .map(str::trim_start)
        .filter(|rest| rest.starts_with('{'))
        .unwrap_or(inner);

    Ok(inner.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedCompletion {
        replies: Mutex<VecDeque<Result<String, ExtractError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        fn new(replies: Vec<Result<String, ExtractError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedCompletion {
        async fn complete(&self, prompt: &str) -> Result<String, ExtractError> {
            self.prompts
                .lock()
                .expect("prompt log lock")
                .push(prompt.to_string());
            self.replies
                .lock()
                .expect("reply script lock")
                .pop_front()
                .unwrap_or_else(|| Err(ExtractError::CompletionFailed("script exhausted".into())))
        }
    }

    struct FakePages(Vec<String>);

    impl PageSource for FakePages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_text(&self, number: u32) -> Result<String, ExtractError> {
            self.0
                .get(number as usize - 1)
                .cloned()
                .ok_or_else(|| ExtractError::InvalidArgument(format!("no page {number}")))
        }
    }

    fn reply(name: &str, keyword_count: usize) -> String {
        let keywords: Vec<String> = (0..keyword_count).map(|index| format!("kw{index}")).collect();
        json!({
            "company_name": name,
            "about": "Builds things.",
            "example_projects": "",
            "business_model": "B2B",
            "majors_hiring": ["Computer Science"],
            "keywords": keywords,
        })
        .to_string()
    }

    fn no_delay(page_limit: Option<usize>) -> ExtractionOptions {
        ExtractionOptions {
            page_limit,
            page_delay: Duration::ZERO,
        }
    }

    fn pages(count: usize) -> FakePages {
        FakePages((0..count).map(|index| format!("Company profile {index}")).collect())
    }

    #[tokio::test]
    async fn only_pages_with_exactly_fifteen_keywords_are_kept() {
        let client = ScriptedCompletion::new(vec![
            Ok(reply("Fourteen", 14)),
            Ok(reply("Fifteen", 15)),
            Ok(reply("Sixteen", 16)),
        ]);
        let extractor = CompanyExtractor::new(client, no_delay(None));

        let report = extractor.extract(&pages(3)).await;

        assert_eq!(report.companies.len(), 1);
        assert_eq!(report.companies[0].name, "Fifteen");
        assert_eq!(report.companies[0].example_projects, None);
        let skipped: Vec<u32> = report.skipped.iter().map(|page| page.page).collect();
        assert_eq!(skipped, vec![1, 3]);
    }

    #[tokio::test]
    async fn page_limit_caps_the_pages_sent_to_the_model() {
        let client = ScriptedCompletion::new(vec![
            Ok(reply("One", 15)),
            Ok(reply("Two", 15)),
            Ok(reply("Three", 15)),
        ]);
        let extractor = CompanyExtractor::new(client, no_delay(Some(2)));

        let report = extractor.extract(&pages(5)).await;

        assert_eq!(report.pages_in_document, 5);
        assert_eq!(report.pages_processed, 2);
        assert_eq!(report.companies.len(), 2);
        assert_eq!(extractor.client.prompts.lock().expect("prompt log lock").len(), 2);
    }

    #[tokio::test]
    async fn failed_call_skips_the_page_and_continues() {
        let client = ScriptedCompletion::new(vec![
            Err(ExtractError::CompletionFailed("503".to_string())),
            Ok(format!("```json\n{}\n```", reply("Recovered", 15))),
        ]);
        let extractor = CompanyExtractor::new(client, no_delay(None));

        let report = extractor.extract(&pages(2)).await;

        assert_eq!(report.companies.len(), 1);
        assert_eq!(report.companies[0].name, "Recovered");
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].page, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_separates_pages_but_does_not_trail_the_last() {
        let client = ScriptedCompletion::new(vec![
            Ok(reply("One", 15)),
            Err(ExtractError::CompletionFailed("503".to_string())),
            Ok(reply("Three", 15)),
        ]);
        let delay = Duration::from_secs(1);
        let extractor = CompanyExtractor::new(
            client,
            ExtractionOptions {
                page_limit: None,
                page_delay: delay,
            },
        );

        let started = tokio::time::Instant::now();
        let report = extractor.extract(&pages(3)).await;

        assert_eq!(started.elapsed(), delay * 2);
        assert_eq!(report.companies.len(), 2);
        assert_eq!(report.skipped.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn single_page_run_never_waits() {
        let client = ScriptedCompletion::new(vec![Ok(reply("Solo", 15))]);
        let extractor = CompanyExtractor::new(client, ExtractionOptions::default());

        let started = tokio::time::Instant::now();
        extractor.extract(&pages(1)).await;

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn blank_pages_are_skipped_without_calling_the_model() {
        let client = ScriptedCompletion::new(vec![Ok(reply("Only", 15))]);
        let extractor = CompanyExtractor::new(client, no_delay(None));

        let report = extractor
            .extract(&FakePages(vec!["   ".to_string(), "Profile".to_string()]))
            .await;

        assert_eq!(report.companies.len(), 1);
        assert_eq!(extractor.client.prompts.lock().expect("prompt log lock").len(), 1);
    }

    #[tokio::test]
    async fn prompt_embeds_the_page_text() {
        let client = ScriptedCompletion::new(vec![Ok(reply("Acme", 15))]);
        let extractor = CompanyExtractor::new(client, no_delay(None));

        extractor
            .extract(&FakePages(vec!["Acme builds rockets".to_string()]))
            .await;

        let prompts = extractor.client.prompts.lock().expect("prompt log lock");
        assert!(prompts[0].ends_with("Source text:\nAcme builds rockets"));
        assert!(prompts[0].contains("\"keywords\""));
    }

    #[test]
    fn multi_word_keyword_is_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_str(&reply("Acme", 15)).expect("fixture is json");
        value["keywords"][3] = json!("machine learning");

        let result = parse_company(&value.to_string());
        assert!(matches!(result, Err(ExtractError::Validation(_))));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let result = parse_company(r#"{"company_name": "Acme", "keywords": []}"#);
        assert!(matches!(result, Err(ExtractError::Json(_))));
    }

    #[test]
    fn fences_and_json_labels_are_stripped() {
        let body = r#"{"a": 1}"#;
        for wrapped in [
            format!("```json\n{body}\n```"),
            format!("```\n{body}\n```"),
            format!("json\n{body}"),
            format!("  {body}  "),
        ] {
            assert_eq!(strip_code_fences(&wrapped).expect("regex compiles"), body);
        }
    }
}
