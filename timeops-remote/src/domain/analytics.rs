use serde::Deserialize;

/// Server-computed usage summaries, bucketed by period and by tag.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsReport {
    pub day: Vec<AnalyticsItem>,
    pub week: Vec<AnalyticsItem>,
    pub month: Vec<AnalyticsItem>,
    pub tags: Vec<AnalyticsItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsItem {
    pub label: String,
    pub value: String,
}
