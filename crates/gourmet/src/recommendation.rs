use lazy_static::lazy_static;
use regex::Regex;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").unwrap();
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendationError {
    #[error("The answer is not a list of recommendations: {0}")]
    Malformed(String),
}

/// One restaurant suggestion taken from the model's final answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub name: String,
    #[serde(alias = "genre_name")]
    pub genre: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    /// Opening hours; venues carry these as `open`, which models often echo back
    #[serde(
        default,
        alias = "open",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

// Models like to write budgets as bare numbers
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// Parse the model's final text as a JSON array of recommendations.
///
/// A Markdown code fence around the array is tolerated. Anything else that is not
/// exactly an array of records is `Malformed`; deciding whether to retry is up to
/// the caller.
pub fn extract_recommendations(text: &str) -> Result<Vec<RecommendationRecord>, RecommendationError> {
    let trimmed = text.trim();
    let body = CODE_FENCE
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed);

    serde_json::from_str(body).map_err(|e| RecommendationError::Malformed(e.to_string()))
}

/// What the user gets back for a prompt
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Recommendations(Vec<RecommendationRecord>),
    Text(String),
}

impl Answer {
    pub fn classify(text: &str) -> Self {
        match extract_recommendations(text) {
            Ok(records) => Answer::Recommendations(records),
            Err(_) => Answer::Text(text.to_string()),
        }
    }

    /// The answer as sent to the browser: a JSON-encoded array or plain prose
    pub fn content(&self) -> String {
        match self {
            Answer::Recommendations(records) => {
                serde_json::to_string(records).unwrap_or_else(|_| String::new())
            }
            Answer::Text(text) => text.clone(),
        }
    }
}
