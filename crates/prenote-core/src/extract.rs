//! Extraction of a single JSON object from raw model text.
//!
//! Models are instructed to emit exactly one bare object, but real outputs
//! arrive wrapped in incidental text (fences, preambles, sign-offs). The
//! first-`{`-to-last-`}` heuristic strips that noise and nothing more:
//! malformed JSON inside the span is rejected and drives a re-prompt,
//! never a string patch.

use serde_json::Value;

use crate::errors::ParseError;

/// Extract the single top-level JSON object from `raw`.
///
/// Rejects anything that is not exactly one object between the first `{`
/// and the last `}`: multiple top-level objects, arrays, and broken syntax
/// all surface as `MalformedJson`.
pub fn extract_output_object(raw: &str) -> Result<Value, ParseError> {
    let start = raw.find('{').ok_or(ParseError::NoJsonObjectFound)?;
    let end = raw.rfind('}').ok_or(ParseError::NoJsonObjectFound)?;
    if end < start {
        return Err(ParseError::NoJsonObjectFound);
    }

    let candidate = &raw[start..=end];
    let value: Value =
        serde_json::from_str(candidate).map_err(|e| ParseError::MalformedJson(e.to_string()))?;

    if !value.is_object() {
        return Err(ParseError::MalformedJson(
            "top-level JSON value is not an object".to_string(),
        ));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_bare_object() {
        let v = extract_output_object(r#"{"summary": "ok"}"#).unwrap();
        assert_eq!(v, json!({"summary": "ok"}));
    }

    #[test]
    fn strips_leading_and_trailing_noise() {
        let raw = "Sure, here is the JSON you asked for:\n```json\n{\"a\": 1, \"b\": [2, 3]}\n```\nLet me know if you need anything else.";
        // The fence's closing backticks sit after the last `}`, so the span
        // is exactly the object.
        let v = extract_output_object(raw).unwrap();
        assert_eq!(v, json!({"a": 1, "b": [2, 3]}));
    }

    #[test]
    fn roundtrips_nested_objects_with_noise() {
        let original = json!({
            "summary": "short",
            "safety": {"no_diagnosis_or_treatment": true},
            "missing_info": ["a", "b"]
        });
        let raw = format!("prefix text {} suffix text", original);
        let v = extract_output_object(&raw).unwrap();
        assert_eq!(v, original);
    }

    #[test]
    fn no_braces_is_no_json_object_found() {
        let err = extract_output_object("I cannot answer that.").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObjectFound));
    }

    #[test]
    fn close_before_open_is_no_json_object_found() {
        let err = extract_output_object("} nothing here {").unwrap_err();
        assert!(matches!(err, ParseError::NoJsonObjectFound));
    }

    #[test]
    fn broken_syntax_is_malformed_not_repaired() {
        let err = extract_output_object(r#"{"summary": "unterminated}"#);
        assert!(matches!(err, Err(ParseError::MalformedJson(_))));
    }

    #[test]
    fn two_top_level_objects_rejected() {
        let err = extract_output_object(r#"{"a": 1} {"b": 2}"#).unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson(_)));
    }

    #[test]
    fn top_level_array_of_objects_rejected() {
        let err = extract_output_object(r#"[{"a": 1}, {"b": 2}]"#).unwrap_err();
        assert!(matches!(err, ParseError::MalformedJson(_)));
    }

    #[test]
    fn braces_inside_strings_survive() {
        let original = json!({"draft_note": "patient wrote {unclear} in form"});
        let raw = format!("note: {}", original);
        let v = extract_output_object(&raw).unwrap();
        assert_eq!(v, original);
    }
}
