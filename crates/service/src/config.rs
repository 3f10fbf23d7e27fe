//! Report tuning knobs read from the environment.

use assess_report_core::constants::{DEFAULT_MAX_CONCURRENCY, DEFAULT_WINDOW_SECS, MAX_PAGE_SIZE};
use assess_report_core::{env_parse_optional, env_parse_with_default};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportConfig {
    /// Completion window applied when a schedule has no explicit due date.
    pub default_window_secs: i64,
    /// Score ratio at or above which an unrecorded outcome counts as achieved.
    pub outcome_score_threshold: Option<f64>,
    /// Bound on concurrently running initializers within one detail level.
    pub max_concurrency: usize,
    pub max_page_size: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            default_window_secs: DEFAULT_WINDOW_SECS,
            outcome_score_threshold: None,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

impl ReportConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let threshold = env_parse_optional::<f64>("ASSESS_REPORT_OUTCOME_SCORE_THRESHOLD")
            .filter(|t| {
                let valid = (0.0..=1.0).contains(t);
                if !valid {
                    tracing::warn!(threshold = t, "outcome score threshold outside 0..=1, ignoring");
                }
                valid
            });
        Self {
            default_window_secs: env_parse_with_default(
                "ASSESS_REPORT_DEFAULT_WINDOW_SECS",
                defaults.default_window_secs,
            )
            .max(0),
            outcome_score_threshold: threshold,
            max_concurrency: env_parse_with_default(
                "ASSESS_REPORT_MAX_CONCURRENCY",
                defaults.max_concurrency,
            )
            .max(1),
            max_page_size: env_parse_with_default("ASSESS_REPORT_MAX_PAGE_SIZE", defaults.max_page_size)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}
