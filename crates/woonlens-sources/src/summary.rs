//! LLM summary of the finished composite record.
//!
//! Runs after every other adapter so the model sees the whole record. The
//! serialised composite is clamped to 30 KiB before prompting — that cap is
//! a contract with the upstream model, enforced here at the boundary.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use woonlens_core::{AiSummary, CompositeRecord, SourceEndpoints};
use woonlens_fetch::{Fetcher, SourceError};

const MAX_PAYLOAD_BYTES: usize = 30 * 1024;
const MAX_OUTPUT_TOKENS: u32 = 200;
const TEMPERATURE: f64 = 0.7;

const PROMPT_TEMPLATE: &str = "\
You are a Dutch real-estate analyst. Summarise the property data below for a \
prospective buyer or investor. Cover exactly these sections:

1. Investment potential
2. Business suitability
3. Liveability
4. Risks

Be concrete and quantitative where the data allows. Data:

";

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f64,
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
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Generates the natural-language summary of the composite.
///
/// # Errors
///
/// `ConfigMissing` without a URL and API key; `Decode` when the model
/// returns no candidate text; otherwise the underlying fetch errors. All of
/// them are soft at the engine.
pub async fn fetch_ai_summary(
    fetcher: &Fetcher,
    cfg: &SourceEndpoints,
    deadline: Instant,
    record: &CompositeRecord,
) -> Result<AiSummary, SourceError> {
    let (Some(base), Some(api_key)) = (cfg.gemini_url.as_deref(), cfg.gemini_api_key.as_deref())
    else {
        return Err(SourceError::ConfigMissing);
    };

    let serialised = serde_json::to_string(record).map_err(|e| SourceError::Decode {
        context: "composite record serialisation".to_owned(),
        reason: e.to_string(),
    })?;
    let clamped = clamp_to_bytes(&serialised, MAX_PAYLOAD_BYTES);

    let request = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: format!("{PROMPT_TEMPLATE}{clamped}"),
            }],
        }],
        generation_config: GenerationConfig {
            max_output_tokens: MAX_OUTPUT_TOKENS,
            temperature: TEMPERATURE,
        },
    };

    let mut url = reqwest::Url::parse(base).map_err(|e| SourceError::Decode {
        context: format!("summary base URL '{base}'"),
        reason: e.to_string(),
    })?;
    url.query_pairs_mut().append_pair("key", api_key);

    let response: GenerateResponse = fetcher
        .post_json(deadline, "ai_summary", url.as_str(), &[], &request)
        .await?;

    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty());

    let Some(summary) = text else {
        return Err(SourceError::Decode {
            context: "summary response".to_owned(),
            reason: "empty response: no candidate text".to_owned(),
        });
    };

    Ok(AiSummary {
        summary,
        generated: true,
        error: None,
    })
}

/// Truncates to at most `max` bytes, backing off to a char boundary so the
/// clamp never splits a code point.
fn clamp_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
