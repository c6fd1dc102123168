//! Task settings validation and normalization

use itertools::Itertools;

use super::model::TaskSettings;
use crate::core::config::limits;

/// Result of validating a task settings record.
///
/// Holds every violated constraint, not just the first one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    errors: Vec<String>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }
}

/// Checks a record against the task settings invariants.
pub fn validate(settings: &TaskSettings) -> Validation {
    let mut errors = Vec::new();

    if settings.delay_min < 0 {
        errors.push("Minimum delay cannot be negative".to_string());
    }
    if settings.delay_max < settings.delay_min {
        errors.push(format!(
            "Maximum delay ({}s) must not be less than minimum delay ({}s)",
            settings.delay_max, settings.delay_min
        ));
    }
    if settings.delay_max > limits::MAX_DELAY_SECS {
        errors.push(format!("Maximum delay cannot exceed {} seconds", limits::MAX_DELAY_SECS));
    }

    if settings.max_message_length < 1 || settings.max_message_length > limits::MAX_MESSAGE_LENGTH {
        errors.push(format!(
            "Message length must be between 1 and {} characters",
            limits::MAX_MESSAGE_LENGTH
        ));
    }

    if settings.keyword_filters.len() > limits::MAX_KEYWORD_FILTERS {
        errors.push(format!("Maximum {} keyword filters allowed", limits::MAX_KEYWORD_FILTERS));
    }
    if settings.replace_text.len() > limits::MAX_REPLACEMENTS {
        errors.push(format!("Maximum {} text replacement rules allowed", limits::MAX_REPLACEMENTS));
    }

    if let Some(caption) = &settings.custom_caption {
        if caption.chars().count() > limits::MAX_CAPTION_CHARS {
            errors.push(format!(
                "Custom caption cannot exceed {} characters",
                limits::MAX_CAPTION_CHARS
            ));
        }
    }

    Validation { errors }
}

/// Canonical form of an accepted record: keywords trimmed and de-duplicated,
/// blank keywords, blank replacement keys and blank captions dropped.
pub fn normalize(settings: &TaskSettings) -> TaskSettings {
    let mut normalized = settings.clone();

    normalized.keyword_filters = settings
        .keyword_filters
        .iter()
        .map(|kw| kw.trim())
        .filter(|kw| !kw.is_empty())
        .unique()
        .map(str::to_string)
        .collect();

    normalized.replace_text = settings
        .replace_text
        .iter()
        .filter(|(from, _)| !from.trim().is_empty())
        .map(|(from, to)| (from.clone(), to.clone()))
        .collect();

    normalized.custom_caption = settings
        .custom_caption
        .as_deref()
        .map(str::trim)
        .filter(|caption| !caption.is_empty())
        .map(str::to_string);

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inverted_delays_rejected_with_relationship_message() {
        let settings = TaskSettings {
            delay_min: 10,
            delay_max: 5,
            ..TaskSettings::default()
        };
        let result = validate(&settings);
        assert!(!result.is_valid());
        assert!(result
            .errors()
            .iter()
            .any(|e| e.contains("Maximum delay") && e.contains("minimum delay")));
    }

    #[test]
    fn test_message_length_over_limit_rejected() {
        let settings = TaskSettings {
            max_message_length: 5000,
            ..TaskSettings::default()
        };
        assert!(!validate(&settings).is_valid());

        let zero = TaskSettings {
            max_message_length: 0,
            ..TaskSettings::default()
        };
        assert!(!validate(&zero).is_valid());
    }

    #[test]
    fn test_valid_boundaries_pass() {
        let settings = TaskSettings {
            delay_min: 0,
            delay_max: 5,
            max_message_length: 4096,
            ..TaskSettings::default()
        };
        assert_eq!(validate(&settings).errors().len(), 0);
    }

    #[test]
    fn test_all_violations_accumulated() {
        let settings = TaskSettings {
            delay_min: -1,
            delay_max: 301,
            max_message_length: 0,
            keyword_filters: (0..101).map(|i| format!("kw{}", i)).collect(),
            replace_text: (0..51).map(|i| (format!("a{}", i), "b".to_string())).collect(),
            custom_caption: Some("x".repeat(1025)),
            ..TaskSettings::default()
        };
        let errors = validate(&settings).into_errors();
        assert_eq!(errors.len(), 6, "{:?}", errors);
    }

    #[test]
    fn test_caption_counts_characters_not_bytes() {
        let settings = TaskSettings {
            custom_caption: Some("ж".repeat(1024)),
            ..TaskSettings::default()
        };
        assert!(validate(&settings).is_valid());
    }

    #[test]
    fn test_normalize_cleans_lists() {
        let settings = TaskSettings {
            keyword_filters: vec![" spam ".into(), "spam".into(), "".into(), "ads".into()],
            replace_text: [(" ".to_string(), "x".to_string()), ("foo".to_string(), "bar".to_string())]
                .into_iter()
                .collect(),
            custom_caption: Some("   ".into()),
            ..TaskSettings::default()
        };
        let normalized = normalize(&settings);
        assert_eq!(normalized.keyword_filters, vec!["spam".to_string(), "ads".to_string()]);
        assert_eq!(normalized.replace_text.len(), 1);
        assert_eq!(normalized.custom_caption, None);
    }
}
