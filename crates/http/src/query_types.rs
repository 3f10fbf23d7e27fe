//! Request/query types (Deserialize)

use assess_report_core::constants::DEFAULT_PAGE_SIZE;
use assess_report_core::{SubjectKind, SubjectStatus};
use assess_report_storage::{Pager, SubjectFilter};
use serde::Deserialize;

const fn default_page() -> usize {
    1
}

const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// `GET /api/assessments` query. `kinds` and `statuses` are comma-separated
/// wire names.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    pub kinds: Option<String>,
    pub statuses: Option<String>,
    pub teacher_id: Option<String>,
    pub title: Option<String>,
}

impl PageQuery {
    pub fn filter(&self) -> Result<SubjectFilter, String> {
        Ok(SubjectFilter {
            kinds: parse_list::<SubjectKind>(self.kinds.as_deref())?,
            statuses: parse_list::<SubjectStatus>(self.statuses.as_deref())?,
            teacher_id: self.teacher_id.clone().filter(|t| !t.is_empty()),
            title: self.title.clone().filter(|t| !t.is_empty()),
        })
    }

    pub fn pager(&self) -> Pager {
        Pager::new(self.page, self.page_size)
    }
}

fn parse_list<T>(raw: Option<&str>) -> Result<Vec<T>, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| e.to_string()))
        .collect()
}
