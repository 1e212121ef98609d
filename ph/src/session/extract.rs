//! Plan extraction from agent replies
//!
//! A reply carries a plan when it contains the `PLAN_READY` sentinel or a
//! ```` ```json ```` fence. The JSON after the last sentinel (or the whole
//! reply) is parsed and run through the validator.

use thiserror::Error;
use tracing::debug;

use crate::domain::{PlanDocument, PlanError};

/// Marker the model writes before the final plan JSON
pub const PLAN_SENTINEL: &str = "PLAN_READY";

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Why a signalled plan could not be accepted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("The reply signalled a plan but contained no JSON")]
    Empty,

    #[error(transparent)]
    Plan(#[from] PlanError),
}

/// True when the reply itself carries a plan payload
pub fn has_payload(text: &str) -> bool {
    text.contains(PLAN_SENTINEL) || text.contains(JSON_FENCE)
}

/// True when the turn should move to plan extraction
pub fn should_extract(text: &str, published: bool) -> bool {
    published || has_payload(text)
}

/// Parse and validate the plan carried by a reply
pub fn attempt_extraction(text: &str) -> Result<PlanDocument, ExtractionError> {
    debug!(len = text.len(), "attempt_extraction: called");
    let after_sentinel = match text.rfind(PLAN_SENTINEL) {
        Some(pos) => &text[pos + PLAN_SENTINEL.len()..],
        None => text,
    };

    let body = fenced_body(after_sentinel).unwrap_or(after_sentinel);

    let body = body.trim();
    if body.is_empty() {
        debug!("attempt_extraction: empty payload");
        return Err(ExtractionError::Empty);
    }

    Ok(PlanDocument::from_json_str(body)?)
}

/// Text the user should see: everything before the plan payload
pub fn conversational_part(text: &str) -> &str {
    let cut = [text.find(PLAN_SENTINEL), text.find(FENCE)]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(text.len());
    text[..cut].trim()
}

/// Body of the ```` ```json ```` fence, else of the first fence of any kind
fn fenced_body(text: &str) -> Option<&str> {
    if let Some(pos) = text.find(JSON_FENCE) {
        let rest = &text[pos + JSON_FENCE.len()..];
        return Some(rest.find(FENCE).map_or(rest, |end| &rest[..end]));
    }
    text.split(FENCE).nth(1).map(strip_language_tag)
}

fn strip_language_tag(fenced: &str) -> &str {
    fenced.trim_start_matches(|c: char| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{
        "project_name": "Coin",
        "description": "A token",
        "contracts": [{
            "name": "Coin",
            "description": "ERC-20 token",
            "erc_template": "ERC-20",
            "dependencies": [],
            "constructor": {"description": "", "inputs": []},
            "functions": []
        }]
    }"#;

    #[test]
    fn test_extract_after_sentinel() {
        let reply = format!("Here is your plan.\nPLAN_READY\n{}", PLAN);
        let plan = attempt_extraction(&reply).unwrap();
        assert_eq!(plan.project_name, "Coin");
    }

    #[test]
    fn test_extract_fenced_with_tag() {
        let reply = format!("PLAN_READY\n```json\n{}\n```\nLet me know!", PLAN);
        assert!(attempt_extraction(&reply).is_ok());
    }

    #[test]
    fn test_extract_fenced_without_sentinel() {
        let reply = format!("Draft below\n```json\n{}\n```", PLAN);
        assert!(has_payload(&reply));
        assert!(attempt_extraction(&reply).is_ok());
    }

    #[test]
    fn test_extract_skips_code_fences_before_the_plan() {
        let reply = format!(
            "PLAN_READY\nThe mint function will look like:\n```solidity\nfunction mint(address to) external {{}}\n```\n\
             Full plan:\n```json\n{}\n```",
            PLAN
        );
        let plan = attempt_extraction(&reply).unwrap();
        assert_eq!(plan.project_name, "Coin");
    }

    #[test]
    fn test_extract_untagged_fence() {
        let reply = format!("PLAN_READY\n```\n{}\n```", PLAN);
        assert!(attempt_extraction(&reply).is_ok());
    }

    #[test]
    fn test_extract_uses_last_sentinel() {
        let reply = format!("I will write PLAN_READY when done.\nPLAN_READY\n{}", PLAN);
        assert!(attempt_extraction(&reply).is_ok());
    }

    #[test]
    fn test_extract_empty_payload() {
        assert_eq!(attempt_extraction("All set! PLAN_READY"), Err(ExtractionError::Empty));
    }

    #[test]
    fn test_extract_malformed_json() {
        let err = attempt_extraction("PLAN_READY\n{\"project_name\": ").unwrap_err();
        assert!(matches!(err, ExtractionError::Plan(PlanError::Malformed(_))));
    }

    #[test]
    fn test_extract_reports_schema_path() {
        let err = attempt_extraction("PLAN_READY\n{\"description\": \"x\", \"contracts\": []}").unwrap_err();
        match err {
            ExtractionError::Plan(e) => assert_eq!(e.path(), Some("project_name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_should_extract() {
        assert!(should_extract("PLAN_READY {}", false));
        assert!(should_extract("Published!", true));
        assert!(!should_extract("What should the token be called?", false));
        // A plain fence without the json tag is not a signal
        assert!(!should_extract("```solidity\ncontract A {}\n```", false));
    }

    #[test]
    fn test_conversational_part() {
        assert_eq!(conversational_part("Great, all set.\nPLAN_READY\n{}"), "Great, all set.");
        assert_eq!(conversational_part("Here:\n```json\n{}\n```"), "Here:");
        assert_eq!(conversational_part("PLAN_READY {}"), "");
        assert_eq!(conversational_part("Which standard?"), "Which standard?");
    }
}
