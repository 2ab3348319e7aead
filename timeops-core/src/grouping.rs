use std::collections::BTreeMap;

use crate::models::Entry;
use crate::time_utils::{format_duration, SECONDS_PER_DAY, WEEK};

/// Week buckets keyed by how many weeks back from the anchor they start.
/// Only non-empty weeks are present, so the keys can be sparse.
pub type GroupedEntries = BTreeMap<u32, WeekGroup>;

#[derive(Debug, Clone, PartialEq)]
pub struct WeekGroup {
    pub start: i64,
    /// Non-empty day buckets in Sunday-to-Monday order.
    pub days: Vec<DayGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    pub start: i64,
    pub entries: Vec<Entry>,
}

impl WeekGroup {
    pub fn duration_secs(&self) -> i64 {
        self.days.iter().map(DayGroup::duration_secs).sum()
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.duration_secs())
    }
}

impl DayGroup {
    pub fn duration_secs(&self) -> i64 {
        self.entries.iter().map(Entry::duration_secs).sum()
    }

    pub fn duration_label(&self) -> String {
        format_duration(self.duration_secs())
    }
}

/// Partitions entries into week buckets anchored at `week_start`, and day
/// buckets within each week. A bucket owns the timestamps in
/// `[start, start + len)`, so an entry exactly on a boundary belongs to the
/// bucket starting there. Entries past the anchor week's end have no bucket
/// and are dropped.
///
/// Each entry's bucket is computed directly from its timestamp, one pass
/// over the input. Entries keep their input order within a day bucket.
pub fn group_entries(entries: &[Entry], week_start: i64) -> GroupedEntries {
    let mut weeks: BTreeMap<u32, BTreeMap<i64, Vec<Entry>>> = BTreeMap::new();

    for entry in entries {
        let t = entry.start_time_utc;
        if t >= week_start + WEEK {
            continue;
        }

        let weeks_back = if t >= week_start {
            0
        } else {
            ((week_start - t - 1) / WEEK + 1) as u32
        };
        let bucket_start = week_start - i64::from(weeks_back) * WEEK;
        let day_start = bucket_start + (t - bucket_start) / SECONDS_PER_DAY * SECONDS_PER_DAY;

        weeks
            .entry(weeks_back)
            .or_default()
            .entry(day_start)
            .or_default()
            .push(entry.clone());
    }

    weeks
        .into_iter()
        .map(|(weeks_back, days)| {
            let start = week_start - i64::from(weeks_back) * WEEK;
            let days = days
                .into_iter()
                .rev()
                .map(|(day_start, entries)| DayGroup {
                    start: day_start,
                    entries,
                })
                .collect();
            (weeks_back, WeekGroup { start, days })
        })
        .collect()
}

pub fn total_duration_secs(entries: &[Entry]) -> i64 {
    entries.iter().map(Entry::duration_secs).sum()
}
