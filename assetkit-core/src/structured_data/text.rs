// Text node values: chooser encoding and per-type validation

use super::definition::{FieldDefinition, TextType};
use crate::error::{PropertyError, Result};
use chrono::NaiveDate;

pub const CHECKBOX_PREFIX: &str = "::CONTENT-XML-CHECKBOX::";
pub const SELECTOR_PREFIX: &str = "::CONTENT-XML-SELECTOR::";

/// Calendar fields store `MM-DD-YYYY`
pub const CALENDAR_FORMAT: &str = "%m-%d-%Y";

fn prefix_of(text_type: TextType) -> Option<&'static str> {
    match text_type {
        TextType::Checkbox => Some(CHECKBOX_PREFIX),
        TextType::Multiselect => Some(SELECTOR_PREFIX),
        _ => None,
    }
}

/// Stored text for a set of selections
///
/// Single-value choosers keep the first value only.
pub fn encode_selections(text_type: TextType, values: &[&str]) -> String {
    match prefix_of(text_type) {
        Some(prefix) => values
            .iter()
            .filter(|v| !v.is_empty())
            .map(|v| format!("{}{}", prefix, v))
            .collect(),
        None => values.first().map(|v| v.to_string()).unwrap_or_default(),
    }
}

/// Selections held by stored text, in stored order
pub fn decode_selections(text_type: TextType, text: &str) -> Vec<String> {
    match prefix_of(text_type) {
        Some(prefix) => text
            .split(prefix)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
        None if text.is_empty() => Vec::new(),
        None => vec![text.to_string()],
    }
}

/// Epoch milliseconds, digits only
pub fn is_valid_datetime(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

pub fn is_valid_calendar(text: &str) -> bool {
    NaiveDate::parse_from_str(text, CALENDAR_FORMAT).is_ok()
}

/// Selections not among the field's possible values
pub fn phantom_selections(field: &FieldDefinition, text_type: TextType, text: &str) -> Vec<String> {
    if !text_type.is_chooser() {
        return Vec::new();
    }
    decode_selections(text_type, text)
        .into_iter()
        .filter(|v| !field.possible_values.contains(v))
        .collect()
}

/// Check a text value against its field before storing it
pub fn validate(fqi: &str, field: &FieldDefinition, text_type: TextType, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        if field.required {
            return Err(PropertyError::EmptyValue {
                field: fqi.to_string(),
            });
        }
        return Ok(());
    }
    match text_type {
        TextType::Datetime if !is_valid_datetime(text) => Err(PropertyError::invalid(
            fqi,
            text,
            "expected epoch milliseconds",
        )),
        TextType::Calendar if !is_valid_calendar(text) => {
            Err(PropertyError::invalid(fqi, text, "expected MM-DD-YYYY"))
        }
        t if t.is_chooser() => match phantom_selections(field, t, text).first() {
            Some(value) => Err(PropertyError::invalid(
                fqi,
                value.as_str(),
                "not a possible value",
            )),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured_data::definition::FieldKind;

    fn chooser(text_type: TextType) -> FieldDefinition {
        let mut field = FieldDefinition::new("choice", FieldKind::Text(text_type));
        field.possible_values = vec!["red".into(), "green".into(), "blue".into()];
        field
    }

    #[test]
    fn test_checkbox_encoding() {
        let text = encode_selections(TextType::Checkbox, &["red", "blue"]);
        assert_eq!(
            text,
            "::CONTENT-XML-CHECKBOX::red::CONTENT-XML-CHECKBOX::blue"
        );
        assert_eq!(
            decode_selections(TextType::Checkbox, &text),
            vec!["red", "blue"]
        );
        assert!(decode_selections(TextType::Checkbox, "").is_empty());
    }

    #[test]
    fn test_single_choosers_keep_plain_text() {
        assert_eq!(encode_selections(TextType::Radio, &["green", "red"]), "green");
        assert_eq!(encode_selections(TextType::Dropdown, &[]), "");
        assert_eq!(decode_selections(TextType::Dropdown, "green"), vec!["green"]);
    }

    #[test]
    fn test_validate_choosers() {
        let field = chooser(TextType::Multiselect);
        let ok = encode_selections(TextType::Multiselect, &["red"]);
        assert!(validate("choice;0", &field, TextType::Multiselect, &ok).is_ok());
        let bad = encode_selections(TextType::Multiselect, &["red", "purple"]);
        let err = validate("choice;0", &field, TextType::Multiselect, &bad).unwrap_err();
        assert!(matches!(err, PropertyError::InvalidValue { ref value, .. } if value == "purple"));
        assert_eq!(
            phantom_selections(&field, TextType::Multiselect, &bad),
            vec!["purple"]
        );
    }

    #[test]
    fn test_validate_dates() {
        let field = FieldDefinition::new("when", FieldKind::Text(TextType::Calendar));
        assert!(validate("when;0", &field, TextType::Calendar, "02-29-2024").is_ok());
        assert!(validate("when;0", &field, TextType::Calendar, "2024-02-29").is_err());
        assert!(validate("when;0", &field, TextType::Calendar, "02-30-2024").is_err());

        assert!(is_valid_datetime("1714557600000"));
        assert!(!is_valid_datetime("17145576OO000"));
        assert!(!is_valid_datetime(""));
    }

    #[test]
    fn test_required_rejects_blank() {
        let mut field = FieldDefinition::new("title", FieldKind::Text(TextType::Plain));
        assert!(validate("title", &field, TextType::Plain, "").is_ok());
        field.required = true;
        let err = validate("title", &field, TextType::Plain, "  ").unwrap_err();
        assert!(matches!(err, PropertyError::EmptyValue { .. }));
    }
}
