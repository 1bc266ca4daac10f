use std::time::Duration;

use serde::{Deserialize, Serialize};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Categories a suggested term may be filed under.
const CATEGORIES: &[&str] = &[
    "devops",
    "docker-kubernetes",
    "ci-cd",
    "terraform",
    "ansible",
    "aws",
    "azure",
    "networking",
    "security",
    "databases",
    "system-design",
    "api-design",
    "git",
    "linux",
    "cdn-caching",
    "agile-methodology",
    "swe",
];

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("request to AI collaborator failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("AI collaborator returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("AI collaborator returned a malformed response: {0}")]
    Malformed(String),
}

/// Verdict of the grading collaborator for one submitted answer.
#[derive(Debug, Deserialize)]
pub struct Grade {
    pub score: i32,
    pub feedback: String,
}

/// Verdict of the term-validation collaborator. `category` through
/// `difficulty` are generated content, present only on approval.
#[derive(Debug, Deserialize)]
pub struct TermVerdict {
    pub approved: bool,
    pub reason: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub formal_definition: Option<String>,
    #[serde(default)]
    pub simple_definition: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub why_it_matters: Option<String>,
    #[serde(default)]
    pub difficulty: Option<i32>,
}

/// Generated catalog content for an approved suggestion.
#[derive(Debug)]
pub struct GeneratedTerm {
    pub category: String,
    pub formal_definition: String,
    pub simple_definition: String,
    pub example: String,
    pub why_it_matters: String,
    pub difficulty: i32,
}

impl TermVerdict {
    /// Split an approving verdict into its reason and the generated content.
    /// An approval with any generated field missing is a contract violation.
    pub fn into_generated(self) -> Result<(String, GeneratedTerm), AiError> {
        fn require<T>(value: Option<T>, field: &str) -> Result<T, AiError> {
            value.ok_or_else(|| {
                AiError::Malformed(format!("approved verdict is missing '{field}'"))
            })
        }

        let difficulty = require(self.difficulty, "difficulty")?;
        if !(1..=5).contains(&difficulty) {
            return Err(AiError::Malformed(format!(
                "difficulty {difficulty} is outside 1..=5"
            )));
        }

        let generated = GeneratedTerm {
            category: require(self.category, "category")?,
            formal_definition: require(self.formal_definition, "formal_definition")?,
            simple_definition: require(self.simple_definition, "simple_definition")?,
            example: require(self.example, "example")?,
            why_it_matters: require(self.why_it_matters, "why_it_matters")?,
            difficulty,
        };
        Ok((self.reason, generated))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the hosted model behind grading and term validation.
/// Constructed once at startup and injected through AppState; calls are
/// bounded by the configured timeout with a single retry on transport
/// failure and none on malformed payloads.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client for AI collaborator");
        Self {
            http,
            api_key,
            model,
        }
    }

    /// Grade a user's explanation of a term against the reference definition.
    pub async fn grade_answer(
        &self,
        term: &str,
        correct_definition: &str,
        user_answer: &str,
    ) -> Result<Grade, AiError> {
        let prompt = grading_prompt(term, correct_definition, user_answer);
        let raw = self.generate(prompt).await?;
        decode_grade(&raw)
    }

    /// Ask the collaborator whether a suggested term is a genuine, novel
    /// concept, and for generated content when it is. `context_terms` is the
    /// (already capped) duplicate-detection context.
    pub async fn validate_term(
        &self,
        candidate: &str,
        context_terms: &[String],
    ) -> Result<TermVerdict, AiError> {
        let prompt = validation_prompt(candidate, context_terms);
        let raw = self.generate(prompt).await?;
        decode_verdict(&raw)
    }

    async fn generate(&self, prompt: String) -> Result<String, AiError> {
        let url = format!(
            "{GEMINI_BASE_URL}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = match self.http.post(&url).json(&body).send().await {
            Ok(response) => response,
            Err(err) if err.is_timeout() || err.is_connect() => {
                tracing::warn!("AI request failed ({err}), retrying once");
                self.http.post(&url).json(&body).send().await?
            }
            Err(err) => return Err(err.into()),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "AI collaborator returned an error");
            return Err(AiError::Status(status));
        }

        let decoded: GenerateContentResponse = response.json().await.map_err(|err| {
            AiError::Malformed(format!("response envelope was not valid JSON: {err}"))
        })?;

        let text: String = decoded
            .candidates
            .first()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AiError::Malformed("response contained no text".to_string()));
        }

        Ok(strip_code_fences(&text))
    }
}

/// Truncate the duplicate-detection context to the configured cap. Terms
/// beyond the cap are invisible to the collaborator, so a large catalog can
/// miss a fuzzy duplicate; the exact-match pre-check already covered them.
pub fn duplicate_context(terms: &[String], cap: usize) -> &[String] {
    &terms[..terms.len().min(cap)]
}

/// The model is asked for raw JSON but may still wrap it in markdown fences.
fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

fn decode_grade(raw: &str) -> Result<Grade, AiError> {
    let grade: Grade = serde_json::from_str(raw).map_err(|err| {
        tracing::error!(raw = %raw, "grading response was not the expected JSON shape");
        AiError::Malformed(format!("grading response: {err}"))
    })?;
    if !(0..=100).contains(&grade.score) {
        return Err(AiError::Malformed(format!(
            "score {} is outside 0..=100",
            grade.score
        )));
    }
    Ok(grade)
}

fn decode_verdict(raw: &str) -> Result<TermVerdict, AiError> {
    serde_json::from_str(raw).map_err(|err| {
        tracing::error!(raw = %raw, "validation response was not the expected JSON shape");
        AiError::Malformed(format!("validation response: {err}"))
    })
}

fn grading_prompt(term: &str, correct_definition: &str, user_answer: &str) -> String {
    format!(
        r#"You are an expert AI assistant for software, devops, cloud, cybersecurity, system, and network engineers. Evaluate a user's explanation of a technical term and provide a score and constructive feedback.

**Technical Term:**
{term}

**Correct Definition:**
{correct_definition}

**User's Answer:**
{user_answer}

**Instructions:**
1. Compare the "User's Answer" to the "Correct Definition".
2. Score the user's answer from 0 to 100 based on accuracy and completeness.
3. Provide clear, constructive feedback highlighting strengths and weaknesses.
4. Return your evaluation in strict JSON with two keys: "score" (an integer) and "feedback" (a string).

**IMPORTANT: Your entire response must be only the raw JSON object, with no extra text or formatting.**"#
    )
}

fn validation_prompt(candidate: &str, context_terms: &[String]) -> String {
    let existing = context_terms.join(", ");
    let categories = CATEGORIES.join(", ");
    format!(
        r#"You are an expert technical term curator for a software engineering, DevOps, cloud, and cybersecurity learning platform.

**User's Suggested Term:**
{candidate}

**Existing Terms in Database (check for duplicates):**
{existing}

**Available Categories:**
{categories}

**Your Task:**
1. Check whether this term already exists in the database (STRICT fuzzy match: consider synonyms, abbreviations, and similar meanings).
2. Determine whether it is relevant to software engineering, DevOps, cloud, networking, security, or system design.
3. Determine whether it fits one of the available categories.
4. If approved, generate comprehensive content for the term.

**Duplicate Detection Rules:**
- REJECT if the term is semantically identical to an existing term.
- REJECT if it is a rephrased version of an existing term.
- REJECT if the meaning is the same even when the wording differs slightly.
- REJECT if only punctuation, capitalization, or minor wording differs.

**Approval Criteria:**
- Not already in the database (including semantically similar terms).
- A genuinely distinct technical concept, not a rewording.
- Relevant to tech/software/DevOps/cloud/security domains.
- Fits at least one of the available categories.
- A real technical concept, not slang or a joke.

**IMPORTANT: Return ONLY valid JSON with this exact structure:**
{{
    "approved": true/false,
    "reason": "Brief explanation of approval/rejection",
    "category": "one of the categories listed above (only if approved)",
    "formal_definition": "Academic/formal definition (only if approved)",
    "simple_definition": "Simple 1-sentence explanation (only if approved)",
    "example": "Real-world example or use case (only if approved)",
    "why_it_matters": "Why engineers should know this (only if approved)",
    "difficulty": 1-5 integer (only if approved, 1=beginner, 5=expert)
}}

If rejected, only include "approved" and "reason" and set the other fields to null."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped_before_decoding() {
        let raw = "```json\n{\"score\": 82, \"feedback\": \"Solid.\"}\n```";
        let grade = decode_grade(&strip_code_fences(raw)).unwrap();
        assert_eq!(grade.score, 82);
        assert_eq!(grade.feedback, "Solid.");
    }

    #[test]
    fn bare_json_grade_decodes() {
        let grade = decode_grade(r#"{"score": 45, "feedback": "Missing the control plane."}"#)
            .unwrap();
        assert_eq!(grade.score, 45);
    }

    #[test]
    fn grade_missing_fields_is_malformed() {
        assert!(matches!(
            decode_grade(r#"{"score": 45}"#),
            Err(AiError::Malformed(_))
        ));
        assert!(matches!(
            decode_grade("The answer was pretty good."),
            Err(AiError::Malformed(_))
        ));
    }

    #[test]
    fn out_of_range_score_is_malformed() {
        assert!(matches!(
            decode_grade(r#"{"score": 140, "feedback": "??"}"#),
            Err(AiError::Malformed(_))
        ));
        assert!(matches!(
            decode_grade(r#"{"score": -1, "feedback": "??"}"#),
            Err(AiError::Malformed(_))
        ));
    }

    #[test]
    fn rejected_verdict_needs_only_approved_and_reason() {
        let verdict =
            decode_verdict(r#"{"approved": false, "reason": "Duplicate of Docker"}"#).unwrap();
        assert!(!verdict.approved);
        assert_eq!(verdict.reason, "Duplicate of Docker");
    }

    #[test]
    fn approved_verdict_with_all_fields_splits_into_content() {
        let verdict = decode_verdict(
            r#"{
                "approved": true,
                "reason": "Novel concept",
                "category": "devops",
                "formal_definition": "A pattern for extending Kubernetes.",
                "simple_definition": "Custom controller for Kubernetes resources.",
                "example": "The Prometheus Operator manages monitoring stacks.",
                "why_it_matters": "Operators automate day-2 operations.",
                "difficulty": 4
            }"#,
        )
        .unwrap();
        let (reason, generated) = verdict.into_generated().unwrap();
        assert_eq!(reason, "Novel concept");
        assert_eq!(generated.category, "devops");
        assert_eq!(generated.difficulty, 4);
    }

    #[test]
    fn approved_verdict_missing_generated_fields_is_malformed() {
        let verdict = decode_verdict(r#"{"approved": true, "reason": "Looks new"}"#).unwrap();
        assert!(matches!(
            verdict.into_generated(),
            Err(AiError::Malformed(_))
        ));
    }

    #[test]
    fn approved_verdict_with_bad_difficulty_is_malformed() {
        let verdict = decode_verdict(
            r#"{
                "approved": true,
                "reason": "ok",
                "category": "devops",
                "formal_definition": "d",
                "simple_definition": "d",
                "example": "d",
                "why_it_matters": "d",
                "difficulty": 9
            }"#,
        )
        .unwrap();
        assert!(matches!(
            verdict.into_generated(),
            Err(AiError::Malformed(_))
        ));
    }

    #[test]
    fn duplicate_context_caps_the_term_list() {
        let terms: Vec<String> = (0..60).map(|i| format!("term-{i}")).collect();
        assert_eq!(duplicate_context(&terms, 50).len(), 50);
        assert_eq!(duplicate_context(&terms, 100).len(), 60);

        let prompt = validation_prompt("GitOps", duplicate_context(&terms, 50));
        assert!(prompt.contains("term-49"));
        assert!(!prompt.contains("term-50"));
    }
}
