// src/services/ai_client.rs
// DOCUMENTATION: AI text-extraction collaborator client
// PURPOSE: Ask the extraction service about a URL and turn its untrusted,
// best-effort answer into a completion that only carries usable fields

use crate::errors::SpotsError;
use crate::models::{non_blank_list, normalize_tags, SpotDraft, SpotPatch};
use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::num::NonZeroU32;

const PROMPT: &str = "Search the web for the place at the URL below and reply with only a JSON object \
with the keys name, address, phone, openingHours (list), tags (list), memo, priceMin, priceMax, \
paymentMethods (list), recommendations and access.";

/// Fields an extraction may fill in; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiCompletion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_methods: Option<Vec<String>>,
}

fn text_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn list_field(value: &Value, key: &str) -> Option<Vec<String>> {
    let items: Vec<String> = value
        .get(key)?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Accepts numbers and numeric strings such as "1,000"
fn int_field(value: &Value, key: &str) -> Option<i32> {
    match value.get(key)? {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i32),
        Value::String(s) => s.replace(',', "").trim().parse().ok(),
        _ => None,
    }
}

/// Pull the JSON object out of a fenced ```json block or the outermost braces
pub fn extract_json(text: &str) -> Option<Value> {
    if let Some(start) = text.find("```json") {
        let body = &text[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            if let Ok(value) = serde_json::from_str(body[..end].trim()) {
                return Some(value);
            }
        }
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

impl AiCompletion {
    /// Keep present, non-empty fields; recommendations and access are appended to the memo
    pub fn from_extracted(value: &Value) -> Self {
        let mut memo = text_field(value, "memo").unwrap_or_default();
        if let Some(recommendations) = text_field(value, "recommendations") {
            memo.push_str(&format!("\n\n[Recommendations]\n{}", recommendations));
        }
        if let Some(access) = text_field(value, "access") {
            memo.push_str(&format!("\n\n[Access]\n{}", access));
        }
        let memo = memo.trim().to_string();

        AiCompletion {
            name: text_field(value, "name"),
            address: text_field(value, "address"),
            phone: text_field(value, "phone"),
            opening_hours: list_field(value, "openingHours"),
            tags: list_field(value, "tags"),
            memo: if memo.is_empty() { None } else { Some(memo) },
            price_min: int_field(value, "priceMin"),
            price_max: int_field(value, "priceMax"),
            payment_methods: list_field(value, "paymentMethods"),
        }
    }

    /// No usable field at all, reported as "no new information"
    pub fn is_empty(&self) -> bool {
        self == &AiCompletion::default()
    }

    /// Patch of an existing spot touching exactly the present fields
    pub fn to_patch(&self) -> SpotPatch {
        SpotPatch {
            name: self.name.clone(),
            address: self.address.clone().map(Some),
            phone: self.phone.clone().map(Some),
            opening_hours: non_blank_list(&self.opening_hours).map(Some),
            tags: self
                .tags
                .as_deref()
                .map(normalize_tags)
                .filter(|t| !t.is_empty()),
            memo: self.memo.clone().map(Some),
            price_min: self.price_min.map(Some),
            price_max: self.price_max.map(Some),
            payment_methods: non_blank_list(&self.payment_methods).map(Some),
            ..Default::default()
        }
    }

    /// Fill a new-spot draft: present fields replace, tags are unioned
    pub fn merge_into_draft(&self, draft: &mut SpotDraft) {
        if let Some(name) = &self.name {
            draft.name = name.clone();
        }
        if let Some(address) = &self.address {
            draft.address = Some(address.clone());
        }
        if let Some(phone) = &self.phone {
            draft.phone = Some(phone.clone());
        }
        if let Some(memo) = &self.memo {
            draft.memo = Some(memo.clone());
        }
        if let Some(hours) = &self.opening_hours {
            draft.opening_hours = Some(hours.clone());
        }
        if let Some(min) = self.price_min {
            draft.price_min = Some(min);
        }
        if let Some(max) = self.price_max {
            draft.price_max = Some(max);
        }
        if let Some(methods) = &self.payment_methods {
            draft.payment_methods = Some(methods.clone());
        }
        draft.tags.extend(self.tags.iter().flatten().cloned());
        draft.tags = normalize_tags(&draft.tags);
    }
}

/// Given a URL, return a best-effort completion
#[async_trait]
pub trait AiExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<AiCompletion, SpotsError>;
}

#[derive(Serialize)]
struct ExtractionRequest<'a> {
    url: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ExtractionResponse {
    text: Option<String>,
}

/// HTTP client of the extraction service, throttled locally
pub struct HttpAiExtractor {
    client: Client,
    api_url: String,
    api_key: String,
    limiter: DefaultDirectRateLimiter,
}

impl HttpAiExtractor {
    pub fn new(api_url: String, api_key: String, requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            client: Client::new(),
            api_url,
            api_key,
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        }
    }
}

#[async_trait]
impl AiExtractor for HttpAiExtractor {
    async fn extract(&self, url: &str) -> Result<AiCompletion, SpotsError> {
        if self.api_url.is_empty() {
            return Err(SpotsError::CollaboratorUnavailable(
                "AI extraction is not configured".to_string(),
            ));
        }
        if self.limiter.check().is_err() {
            log::warn!("AI extraction throttled locally");
            return Err(SpotsError::RateLimitExceeded);
        }

        log::debug!("AI extraction for {}", url);
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&ExtractionRequest {
                url,
                prompt: PROMPT,
            })
            .send()
            .await
            .map_err(|e| {
                log::error!("AI extraction request failed: {}", e);
                SpotsError::CollaboratorUnavailable(format!("request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            log::error!("AI extraction returned {}", status);
            return Err(SpotsError::CollaboratorUnavailable(format!(
                "extraction service returned {}",
                status
            )));
        }

        let body: ExtractionResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse AI extraction response: {}", e);
            SpotsError::CollaboratorUnavailable(format!("parse error: {}", e))
        })?;

        let value = body
            .text
            .as_deref()
            .and_then(extract_json)
            .ok_or_else(|| {
                SpotsError::CollaboratorUnavailable("could not parse AI response".to_string())
            })?;

        Ok(AiCompletion::from_extracted(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_json_from_fence_and_bare_text() {
        let fenced = "Here you go\n```json\n{\"name\": \"Cafe A\"}\n```\nthanks";
        assert_eq!(extract_json(fenced).unwrap()["name"], "Cafe A");

        let bare = "result: {\"phone\": \"03-1234-5678\"} end";
        assert_eq!(extract_json(bare).unwrap()["phone"], "03-1234-5678");

        assert!(extract_json("no json here").is_none());
    }

    #[test]
    fn test_memo_sections_are_merged() {
        let completion = AiCompletion::from_extracted(&json!({
            "memo": "Quiet cafe",
            "recommendations": "Cheesecake",
            "access": "3 min from the station"
        }));
        assert_eq!(
            completion.memo.as_deref(),
            Some("Quiet cafe\n\n[Recommendations]\nCheesecake\n\n[Access]\n3 min from the station")
        );
    }

    #[test]
    fn test_empty_and_malformed_fields_are_dropped() {
        let completion = AiCompletion::from_extracted(&json!({
            "name": "  ",
            "tags": [],
            "priceMin": "1,000",
            "priceMax": {"amount": 2000},
            "openingHours": ["", "Mon-Fri 10:00-18:00"]
        }));
        assert_eq!(completion.name, None);
        assert_eq!(completion.tags, None);
        assert_eq!(completion.price_min, Some(1000));
        assert_eq!(completion.price_max, None);
        assert_eq!(
            completion.opening_hours,
            Some(vec!["Mon-Fri 10:00-18:00".to_string()])
        );
        assert!(AiCompletion::from_extracted(&json!({})).is_empty());
    }

    #[test]
    fn test_patch_touches_only_present_fields() {
        let completion = AiCompletion {
            address: Some("Shibuya".into()),
            ..Default::default()
        };
        let patch = completion.to_patch();
        assert_eq!(patch.address, Some(Some("Shibuya".into())));
        assert_eq!(patch.name, None);
        assert_eq!(patch.memo, None);
    }

    #[test]
    fn test_patch_lists_are_normalized() {
        let completion = AiCompletion {
            tags: Some(vec![" ramen ".into(), "ramen".into(), "late night".into()]),
            payment_methods: Some(vec!["  ".into()]),
            ..Default::default()
        };
        let patch = completion.to_patch();
        assert_eq!(
            patch.tags,
            Some(vec!["ramen".to_string(), "late night".to_string()])
        );
        assert_eq!(patch.payment_methods, None);
    }

    #[test]
    fn test_draft_merge_unions_tags() {
        let mut draft = SpotDraft {
            name: "typed name".into(),
            tags: vec!["cafe".into()],
            ..Default::default()
        };
        let completion = AiCompletion {
            tags: Some(vec!["cafe".into(), "wifi".into()]),
            phone: Some("03-0000-0000".into()),
            ..Default::default()
        };
        completion.merge_into_draft(&mut draft);
        assert_eq!(draft.name, "typed name");
        assert_eq!(draft.tags, vec!["cafe".to_string(), "wifi".to_string()]);
        assert_eq!(draft.phone.as_deref(), Some("03-0000-0000"));
    }

    #[tokio::test]
    async fn test_unconfigured_client_is_unavailable() {
        let client = HttpAiExtractor::new(String::new(), String::new(), 10);
        assert!(matches!(
            client.extract("https://example.com").await,
            Err(SpotsError::CollaboratorUnavailable(_))
        ));
    }
}
