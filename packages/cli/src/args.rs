// ABOUTME: Parsing helpers for command-line values
// ABOUTME: Mood hints, render props, and generation request assembly

use thiserror::Error;

use adapt_core::{ContextItem, GenerateComponentRequest, Mood};

#[derive(Debug, Error, PartialEq)]
pub enum ArgError {
    #[error("Invalid mood '{0}': expected label:score, e.g. calm:7")]
    InvalidMood(String),

    #[error("Mood score must be between 0 and 10, got {0}")]
    MoodOutOfRange(f32),

    #[error("Invalid props JSON: {0}")]
    InvalidProps(String),
}

/// Parse `label:score` where score is 0 to 10
pub fn parse_mood(value: &str) -> Result<Mood, ArgError> {
    let (label, score) = value
        .rsplit_once(':')
        .ok_or_else(|| ArgError::InvalidMood(value.to_string()))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(ArgError::InvalidMood(value.to_string()));
    }

    let score: f32 = score
        .trim()
        .parse()
        .map_err(|_| ArgError::InvalidMood(value.to_string()))?;
    if !(0.0..=10.0).contains(&score) {
        return Err(ArgError::MoodOutOfRange(score));
    }

    Ok(Mood {
        label: label.to_string(),
        score,
    })
}

/// Props must be a JSON object; absent means `{}`
pub fn parse_props(value: Option<&str>) -> Result<serde_json::Value, ArgError> {
    let Some(raw) = value else {
        return Ok(serde_json::json!({}));
    };
    let props: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| ArgError::InvalidProps(e.to_string()))?;
    if !props.is_object() {
        return Err(ArgError::InvalidProps("props must be an object".to_string()));
    }
    Ok(props)
}

pub fn build_request(
    prompt: &str,
    mood: Option<Mood>,
    context: &[String],
) -> GenerateComponentRequest {
    let context: Vec<ContextItem> = context
        .iter()
        .filter(|c| !c.trim().is_empty())
        .map(|c| ContextItem { content: c.clone() })
        .collect();

    GenerateComponentRequest {
        prompt: prompt.to_string(),
        mood,
        context: (!context.is_empty()).then_some(context),
    }
}
