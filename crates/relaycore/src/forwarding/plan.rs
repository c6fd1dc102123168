//! Decides whether and how a source message is relayed under a task's settings

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use std::time::Duration;

use crate::settings::{ForwardMode, TaskSettings};

/// URLs, t.me links, @mentions, #hashtags and bare domains.
static LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://|t\.me/|@\w+|#\w+|www\.|\.(com|org|net|edu|gov)\b").expect("link regex")
});

/// The parts of a source message the filters look at.
#[derive(Debug, Clone, Copy, Default)]
pub struct IncomingMessage<'a> {
    /// Text or caption
    pub text: Option<&'a str>,
    pub has_media: bool,
    pub is_forwarded: bool,
    /// Set by the caller's duplicate tracker
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Media,
    Text,
    Forwarded,
    Links,
    Keyword(String),
    Duplicate,
    TooLong { chars: usize, limit: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForwardDecision {
    Skip(SkipReason),
    Relay { mode: ForwardMode, delay: Duration },
}

pub fn contains_link(text: &str) -> bool {
    LINK_RE.is_match(text)
}

/// Applies the task's filters in order (media, text, forwarded, links,
/// keywords, duplicates, length) and picks a delay for messages that pass.
pub fn plan_forward(settings: &TaskSettings, message: &IncomingMessage<'_>) -> ForwardDecision {
    match skip_reason(settings, message) {
        Some(reason) => {
            log::debug!("Message skipped: {:?}", reason);
            ForwardDecision::Skip(reason)
        }
        None => ForwardDecision::Relay {
            mode: settings.forward_mode,
            delay: pick_delay(settings.delay_min, settings.delay_max),
        },
    }
}

fn skip_reason(settings: &TaskSettings, message: &IncomingMessage<'_>) -> Option<SkipReason> {
    let text = message.text.unwrap_or_default();

    if settings.filter_media && message.has_media {
        return Some(SkipReason::Media);
    }
    if settings.filter_text && !message.has_media && !text.is_empty() {
        return Some(SkipReason::Text);
    }
    if settings.filter_forwarded && message.is_forwarded {
        return Some(SkipReason::Forwarded);
    }
    if settings.filter_links && contains_link(text) {
        return Some(SkipReason::Links);
    }

    let lowered = text.to_lowercase();
    if let Some(keyword) = settings
        .keyword_filters
        .iter()
        .find(|kw| !kw.is_empty() && lowered.contains(&kw.to_lowercase()))
    {
        return Some(SkipReason::Keyword(keyword.clone()));
    }

    if settings.duplicate_check && message.is_duplicate {
        return Some(SkipReason::Duplicate);
    }

    let chars = text.chars().count();
    if usize::try_from(settings.max_message_length).is_ok_and(|limit| chars > limit) {
        return Some(SkipReason::TooLong {
            chars,
            limit: settings.max_message_length,
        });
    }
    None
}

/// Uniform delay in `[min, max]` seconds; negative bounds count as zero.
pub fn pick_delay(min_secs: i64, max_secs: i64) -> Duration {
    let min = min_secs.max(0) as f64;
    let max = (max_secs.max(0) as f64).max(min);
    if max <= min {
        return Duration::from_secs_f64(min);
    }
    Duration::from_secs_f64(rand::thread_rng().gen_range(min..=max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(t: &str) -> IncomingMessage<'_> {
        IncomingMessage {
            text: Some(t),
            ..IncomingMessage::default()
        }
    }

    #[test]
    fn test_defaults_relay_in_copy_mode() {
        let decision = plan_forward(&TaskSettings::default(), &text("hello"));
        match decision {
            ForwardDecision::Relay { mode, delay } => {
                assert_eq!(mode, ForwardMode::Copy);
                assert!(delay <= Duration::from_secs(5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_filters() {
        let settings = TaskSettings {
            filter_links: true,
            keyword_filters: vec!["Casino".into()],
            ..TaskSettings::default()
        };
        assert_eq!(
            plan_forward(&settings, &text("visit https://x.y")),
            ForwardDecision::Skip(SkipReason::Links)
        );
        assert_eq!(
            plan_forward(&settings, &text("best CASINO deals")),
            ForwardDecision::Skip(SkipReason::Keyword("Casino".into()))
        );

        let media_only = TaskSettings {
            filter_media: true,
            ..TaskSettings::default()
        };
        let photo = IncomingMessage {
            has_media: true,
            ..IncomingMessage::default()
        };
        assert_eq!(plan_forward(&media_only, &photo), ForwardDecision::Skip(SkipReason::Media));
    }

    #[test]
    fn test_duplicates_only_skipped_when_checked() {
        let duplicate = IncomingMessage {
            text: Some("again"),
            is_duplicate: true,
            ..IncomingMessage::default()
        };
        assert_eq!(
            plan_forward(&TaskSettings::default(), &duplicate),
            ForwardDecision::Skip(SkipReason::Duplicate)
        );

        let unchecked = TaskSettings {
            duplicate_check: false,
            ..TaskSettings::default()
        };
        assert!(matches!(plan_forward(&unchecked, &duplicate), ForwardDecision::Relay { .. }));
    }

    #[test]
    fn test_length_limit_counts_chars() {
        let settings = TaskSettings {
            max_message_length: 3,
            ..TaskSettings::default()
        };
        assert!(matches!(plan_forward(&settings, &text("жжж")), ForwardDecision::Relay { .. }));
        assert_eq!(
            plan_forward(&settings, &text("жжжж")),
            ForwardDecision::Skip(SkipReason::TooLong { chars: 4, limit: 3 })
        );
    }

    #[test]
    fn test_pick_delay_bounds() {
        for _ in 0..100 {
            let delay = pick_delay(2, 4);
            assert!(delay >= Duration::from_secs(2) && delay <= Duration::from_secs(4));
        }
        assert_eq!(pick_delay(3, 3), Duration::from_secs(3));
        assert_eq!(pick_delay(-5, -1), Duration::ZERO);
    }
}
