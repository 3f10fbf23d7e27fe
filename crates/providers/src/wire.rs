//! Request and response envelopes shared by every provider endpoint.

use std::collections::HashMap;

use assess_report_core::{RoomInfo, RoomOptions};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct BatchRequest<'a> {
    pub ids: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct RoomRequest<'a> {
    pub schedule_ids: &'a [String],
    #[serde(flatten)]
    pub options: RoomOptions,
}

#[derive(Debug, Deserialize)]
pub struct RoomEntry {
    pub schedule_id: String,
    #[serde(flatten)]
    pub info: RoomInfo,
}

#[derive(Debug, Deserialize)]
pub struct LatestIdEntry {
    pub id: String,
    pub latest_id: String,
}

#[derive(Debug, Serialize)]
pub struct CommandRequest<'a, T> {
    pub requests: &'a [T],
}

pub fn key_by<T>(items: Vec<T>, key: impl Fn(&T) -> &str) -> HashMap<String, T> {
    items.into_iter().map(|item| (key(&item).to_owned(), item)).collect()
}

pub fn group_by<T>(items: Vec<T>, key: impl Fn(&T) -> &str) -> HashMap<String, Vec<T>> {
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(key(&item).to_owned()).or_default().push(item);
    }
    grouped
}
