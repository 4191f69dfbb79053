//! Presentation view model.
//!
//! The core never draws anything; it hands the host a [`WidgetView`] with
//! everything a renderer needs: the usage values (or an error message), the
//! color tier for the percentage, a freshness flag for gray-out, and the
//! render timestamp.

use chrono::{DateTime, Utc};
use core_usage::UsageSummary;
use serde::{Deserialize, Serialize};

/// Escalation tier for the used-percentage color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageTier {
    /// Under 75 percent used.
    Normal,
    /// 75 percent or more used.
    Warning,
    /// 90 percent or more used.
    Critical,
}

impl UsageTier {
    /// Both thresholds are inclusive.
    pub fn for_percentage(used_percentage: u32) -> Self {
        if used_percentage >= 90 {
            UsageTier::Critical
        } else if used_percentage >= 75 {
            UsageTier::Warning
        } else {
            UsageTier::Normal
        }
    }
}

/// What the widget shows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WidgetBody {
    Usage(UsageSummary),
    Error { message: String },
}

/// One rendered widget state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetView {
    /// False when the values did not come from the provider this render;
    /// hosts gray the content out.
    pub fresh: bool,
    /// When this view was produced, shown as the refresh timestamp.
    pub rendered_at: DateTime<Utc>,
    pub body: WidgetBody,
}

impl WidgetView {
    pub fn fresh(summary: UsageSummary, rendered_at: DateTime<Utc>) -> Self {
        Self {
            fresh: true,
            rendered_at,
            body: WidgetBody::Usage(summary),
        }
    }

    pub fn stale(summary: UsageSummary, rendered_at: DateTime<Utc>) -> Self {
        Self {
            fresh: false,
            rendered_at,
            body: WidgetBody::Usage(summary),
        }
    }

    pub fn error(message: impl Into<String>, rendered_at: DateTime<Utc>) -> Self {
        Self {
            fresh: false,
            rendered_at,
            body: WidgetBody::Error {
                message: message.into(),
            },
        }
    }

    /// Color tier for the percentage, when there is one to color.
    pub fn tier(&self) -> Option<UsageTier> {
        match &self.body {
            WidgetBody::Usage(summary) => {
                Some(UsageTier::for_percentage(summary.used_percentage))
            }
            WidgetBody::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn summary(used_percentage: u32) -> UsageSummary {
        UsageSummary {
            used_percentage,
            used_volume: "5 GB".to_string(),
            initial_volume: "10 GB".to_string(),
            remaining_time: None,
        }
    }

    #[test]
    fn test_tier_boundaries_are_inclusive() {
        assert_eq!(UsageTier::for_percentage(74), UsageTier::Normal);
        assert_eq!(UsageTier::for_percentage(75), UsageTier::Warning);
        assert_eq!(UsageTier::for_percentage(89), UsageTier::Warning);
        assert_eq!(UsageTier::for_percentage(90), UsageTier::Critical);
        assert_eq!(UsageTier::for_percentage(113), UsageTier::Critical);
    }

    #[test]
    fn test_view_tier_follows_body() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            WidgetView::fresh(summary(91), at).tier(),
            Some(UsageTier::Critical)
        );
        assert_eq!(WidgetView::error("boom", at).tier(), None);
    }

    #[test]
    fn test_error_view_is_never_fresh() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let view = WidgetView::error("sign-in failed", at);
        assert!(!view.fresh);
        assert!(matches!(view.body, WidgetBody::Error { message } if message == "sign-in failed"));
    }
}
