//! Change detection
//!
//! Classifies a fresh observation against the stored state of an item and
//! says which write the scheduler has to make.

/// Classification of one observation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// No fingerprint was stored yet; becomes the baseline silently
    FirstObservation,
    Unchanged,
    Changed {
        previous: Option<String>,
        current: String,
    },
}

/// Persistence needed after a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateUpdate {
    /// Advance the checked-at timestamp only
    TouchCheckedAt,
    /// Store new content and fingerprint, advancing checked-at and changed-at
    Replace,
}

impl Detection {
    pub fn state_update(&self) -> StateUpdate {
        match self {
            Detection::Unchanged => StateUpdate::TouchCheckedAt,
            Detection::FirstObservation | Detection::Changed { .. } => StateUpdate::Replace,
        }
    }

    /// Whether subscribers should hear about this observation
    pub fn should_notify(&self) -> bool {
        matches!(self, Detection::Changed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Detection::FirstObservation => "baseline",
            Detection::Unchanged => "unchanged",
            Detection::Changed { .. } => "changed",
        }
    }
}

/// Compare a new observation with the stored fingerprint and content
pub fn detect(
    previous_fingerprint: Option<&str>,
    previous_content: Option<&str>,
    new_content: &str,
    new_fingerprint: &str,
) -> Detection {
    match previous_fingerprint {
        None => Detection::FirstObservation,
        Some(previous) if previous == new_fingerprint => Detection::Unchanged,
        Some(_) => Detection::Changed {
            previous: previous_content.map(str::to_string),
            current: new_content.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::fingerprint::fingerprint;

    #[test]
    fn test_first_observation() {
        let detection = detect(None, None, "Hello World", &fingerprint("Hello World"));

        assert_eq!(detection, Detection::FirstObservation);
        assert_eq!(detection.state_update(), StateUpdate::Replace);
        assert!(!detection.should_notify());
    }

    #[test]
    fn test_first_observation_ignores_stale_content() {
        let detection = detect(None, Some("old"), "new", &fingerprint("new"));

        assert_eq!(detection, Detection::FirstObservation);
    }

    #[test]
    fn test_unchanged() {
        let fp = fingerprint("$19.99");

        let detection = detect(Some(&fp), Some("$19.99"), "$19.99", &fp);

        assert_eq!(detection, Detection::Unchanged);
        assert_eq!(detection.state_update(), StateUpdate::TouchCheckedAt);
        assert!(!detection.should_notify());
    }

    #[test]
    fn test_changed_carries_both_contents() {
        let old = fingerprint("$19.99");

        let detection = detect(Some(&old), Some("$19.99"), "$17.99", &fingerprint("$17.99"));

        assert_eq!(
            detection,
            Detection::Changed {
                previous: Some("$19.99".to_string()),
                current: "$17.99".to_string(),
            }
        );
        assert_eq!(detection.state_update(), StateUpdate::Replace);
        assert!(detection.should_notify());
        assert_eq!(detection.label(), "changed");
    }

    #[test]
    fn test_changed_to_empty_text() {
        let old = fingerprint("in stock");

        let detection = detect(Some(&old), Some("in stock"), "", &fingerprint(""));

        assert!(matches!(detection, Detection::Changed { ref current, .. } if current.is_empty()));
    }

    #[test]
    fn test_changed_without_stored_content() {
        let detection = detect(Some("123"), None, "abc", &fingerprint("abc"));

        assert_eq!(
            detection,
            Detection::Changed {
                previous: None,
                current: "abc".to_string(),
            }
        );
    }
}
