//! Action wire contract between a decision backend and the loop.
//!
//! A backend reply is free text that should contain one JSON object of the
//! shape `{"click": [x, y], "modifiers": {"shift": bool}, "reason": "..."}`.
//! Everything that can go wrong between sending the request and holding a
//! schema-valid [`Action`] is a [`DecisionError`], and [`resolve`] is the only
//! place that turns one into the fallback centre click.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logger;

pub const FALLBACK_REASON: &str = "fallback centre click";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
}

/// A click in observation-local coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub click: [i32; 2],
    pub modifiers: Modifiers,
    pub reason: String,
}

impl Action {
    pub fn new(x: i32, y: i32, shift: bool, reason: impl Into<String>) -> Self {
        Self {
            click: [x, y],
            modifiers: Modifiers { shift },
            reason: reason.into(),
        }
    }

    /// Centre of a `width`×`height` observation, no modifiers.
    pub fn fallback(width: u32, height: u32) -> Self {
        Self::new((width / 2) as i32, (height / 2) as i32, false, FALLBACK_REASON)
    }

    pub fn x(&self) -> i32 { self.click[0] }
    pub fn y(&self) -> i32 { self.click[1] }

    pub fn is_fallback(&self) -> bool {
        self.reason == FALLBACK_REASON
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }
}

/// Recoverable failure on the way from observation to action.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {0}")]
    Status(u16),

    #[error("could not encode observation: {0}")]
    Encode(String),

    #[error("no JSON object in response: {0:?}")]
    NoJson(String),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Locate the embedded JSON object in backend text and validate it.
pub fn parse_action(text: &str) -> Result<Action, DecisionError> {
    let trimmed = text.trim();
    let json = extract_json(trimmed).ok_or_else(|| DecisionError::NoJson(abbreviate(trimmed)))?;
    Ok(serde_json::from_str(json)?)
}

/// Collapse any decision failure into the fallback action.
pub fn resolve(result: Result<Action, DecisionError>, width: u32, height: u32) -> Action {
    match result {
        Ok(action) => action,
        Err(e) => {
            logger::warn(&format!("decision failed, using fallback: {}", e));
            Action::fallback(width, height)
        }
    }
}

fn abbreviate(text: &str) -> String {
    const MAX: usize = 80;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_object() {
        let a = parse_action(r#"{"click":[123,456],"modifiers":{"shift":false},"reason":"test"}"#).unwrap();
        assert_eq!(a, Action::new(123, 456, false, "test"));
    }

    #[test]
    fn parses_object_wrapped_in_text() {
        let text = "garbage {\"click\":[10,20],\"modifiers\":{\"shift\":true},\"reason\":\"ok\"} more garbage";
        assert_eq!(parse_action(text).unwrap(), Action::new(10, 20, true, "ok"));
    }

    #[test]
    fn parses_markdown_fence() {
        let text = "Sure:\n```json\n{\"click\": [5, 6], \"modifiers\": {\"shift\": false}, \"reason\": \"bank\"}\n```\n";
        assert_eq!(parse_action(text).unwrap(), Action::new(5, 6, false, "bank"));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let text = r#"{"click":[1,2],"modifiers":{"shift":false,"ctrl":true},"reason":"r","confidence":0.4}"#;
        assert_eq!(parse_action(text).unwrap(), Action::new(1, 2, false, "r"));
    }

    #[test]
    fn rejects_missing_reason() {
        let err = parse_action(r#"{"click":[1,2],"modifiers":{"shift":false}}"#).unwrap_err();
        assert!(matches!(err, DecisionError::Json(_)));
    }

    #[test]
    fn rejects_missing_shift() {
        assert!(parse_action(r#"{"click":[1,2],"modifiers":{},"reason":"r"}"#).is_err());
    }

    #[test]
    fn rejects_non_integer_click() {
        assert!(parse_action(r#"{"click":["x","y"],"modifiers":{"shift":false},"reason":"bad"}"#).is_err());
        assert!(parse_action(r#"{"click":[1.5,2],"modifiers":{"shift":false},"reason":"bad"}"#).is_err());
    }

    #[test]
    fn rejects_wrong_click_arity() {
        assert!(parse_action(r#"{"click":[1],"modifiers":{"shift":false},"reason":"r"}"#).is_err());
        assert!(parse_action(r#"{"click":[1,2,3],"modifiers":{"shift":false},"reason":"r"}"#).is_err());
    }

    #[test]
    fn rejects_text_without_braces() {
        assert!(matches!(parse_action("I would click the tree"), Err(DecisionError::NoJson(_))));
        assert!(matches!(parse_action(""), Err(DecisionError::NoJson(_))));
        assert!(matches!(parse_action("} backwards {"), Err(DecisionError::NoJson(_))));
    }

    #[test]
    fn round_trips_through_json() {
        let a = Action::new(-4, 223, true, "drop logs");
        let back = parse_action(&a.to_json()).unwrap();
        assert_eq!(back, a);
    }

    #[test]
    fn fallback_is_centre_click() {
        for text in ["", "not json", "{\"click\": oops}", "{}"] {
            let a = resolve(parse_action(text), 224, 224);
            assert_eq!(a.click, [112, 112]);
            assert!(!a.modifiers.shift);
            assert_eq!(a.reason, FALLBACK_REASON);
        }
    }

    #[test]
    fn fallback_rounds_down_odd_sizes() {
        assert_eq!(Action::fallback(765, 503).click, [382, 251]);
    }

    #[test]
    fn abbreviates_long_text() {
        let long = "x".repeat(200);
        let msg = abbreviate(&long);
        assert!(msg.chars().count() <= 81);
    }
}
