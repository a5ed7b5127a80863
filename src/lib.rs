use chrono::prelude::*;
use std::collections::BTreeMap;
pub mod aggregate;
pub mod error;
pub mod load;
pub mod plot;
pub mod render;

pub use error::{Error, Result};

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const COL_DATE: &str = "Date";
pub const COL_CHANNEL: &str = "Channel";
pub const COL_VIEWS: &str = "Views";

/// Date spellings accepted in the `Date` column, tried in order.
pub const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%b %d, %Y", "%d %b %Y"];

/// Datetime spellings accepted in the `Date` column; the time of day is dropped.
pub const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Whether the daily series is kept as is or re-bucketed into calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Default for Granularity {
    fn default() -> Self {
        Granularity::Daily
    }
}

/// Per-channel lines (the export has a `Channel` column) or a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    PerChannel,
    Single,
}

/// One non-zero row of the export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRecord {
    pub date: NaiveDate,
    pub channel: Option<String>,
    pub views: u64,
}

/// One `(date, channel)` group of the aggregated series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedRow {
    pub date: NaiveDate,
    pub channel: Option<String>,
    pub views: u64,
}

/// The views summed per `(date, channel)`, ordered by date and then channel.
/// Each key appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregatedSeries {
    rows: Vec<AggregatedRow>,
}

impl AggregatedSeries {
    /// Builds the series from already grouped rows, restoring the ordering.
    pub fn from_rows(mut rows: Vec<AggregatedRow>) -> AggregatedSeries {
        rows.sort_by(|a, b| (a.date, &a.channel).cmp(&(b.date, &b.channel)));
        AggregatedSeries { rows }
    }

    pub fn rows(&self) -> &[AggregatedRow] {
        &self.rows[..]
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// distinct channels, sorted; `None` is the unlabeled single-line series
    pub fn channels(&self) -> Vec<Option<String>> {
        let mut channels: Vec<Option<String>> = Vec::new();
        for row in self.rows.iter() {
            if !channels.contains(&row.channel) {
                channels.push(row.channel.clone());
            }
        }
        channels.sort();
        channels
    }

    /// the rows of one channel, in chronological order
    pub fn channel_rows<'a>(
        &'a self,
        channel: &'a Option<String>,
    ) -> impl Iterator<Item = &'a AggregatedRow> + 'a {
        self.rows.iter().filter(move |r| &r.channel == channel)
    }

    /// `None` if the total does not fit in a `u64`
    pub fn total_views(&self) -> Option<u64> {
        self.rows
            .iter()
            .try_fold(0u64, |acc, r| acc.checked_add(r.views))
    }

    /// `None` if a channel total does not fit in a `u64`
    pub fn views_by_channel(&self) -> Option<BTreeMap<Option<String>, u64>> {
        let mut totals = BTreeMap::new();
        for row in self.rows.iter() {
            let total: &mut u64 = totals.entry(row.channel.clone()).or_insert(0);
            *total = total.checked_add(row.views)?;
        }
        Some(totals)
    }

    /// Turns the rows back into records, e.g. to group them again.
    pub fn records(&self) -> Vec<ViewRecord> {
        self.rows
            .iter()
            .map(|r| ViewRecord {
                date: r.date,
                channel: r.channel.clone(),
                views: r.views,
            })
            .collect()
    }

    pub fn variant(&self) -> Variant {
        if self.rows.iter().any(|r| r.channel.is_some()) {
            Variant::PerChannel
        } else {
            Variant::Single
        }
    }
}

impl std::fmt::Display for AggregatedSeries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{}\n", COL_DATE, COL_CHANNEL, COL_VIEWS)?;
        for r in self.rows.iter() {
            write!(
                f,
                "{},{},{}\n",
                r.date,
                r.channel.as_deref().unwrap_or(""),
                r.views
            )?
        }
        Ok(())
    }
}

/// Parses a `Date` cell with the first matching format.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    for fmt in DATE_FORMATS.iter() {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    for fmt in DATETIME_FORMATS.iter() {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// last calendar day of the month containing d
pub fn month_end(d: NaiveDate) -> NaiveDate {
    let (y, m) = if d.month() == 12 {
        (d.year() + 1, 1)
    } else {
        (d.year(), d.month() + 1)
    };
    match NaiveDate::from_ymd_opt(y, m, 1).and_then(|first| first.pred_opt()) {
        Some(last) => last,
        None => d,
    }
}

/// Returns `None` for an empty slice.
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

pub fn suitable_xfmt(d: chrono::Duration) -> &'static str {
    if d > chrono::Duration::days(730) {
        "%Y-%m"
    } else if d > chrono::Duration::days(60) {
        "%y-%m-%d"
    } else {
        "%m-%d"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_common_date_spellings() {
        let jan = ymd(2024, 1, 5);
        assert_eq!(parse_date("2024-01-05"), Some(jan));
        assert_eq!(parse_date("2024/01/05"), Some(jan));
        assert_eq!(parse_date("01/05/2024"), Some(jan));
        assert_eq!(parse_date("Jan 5, 2024"), Some(jan));
        assert_eq!(parse_date("5 Jan 2024"), Some(jan));
        assert_eq!(parse_date("2024-01-05 13:45:00"), Some(jan));
        assert_eq!(parse_date("2024-01-05T13:45:00"), Some(jan));
        assert_eq!(parse_date("2024-01-05T13:45:00+00:00"), Some(jan));
        assert_eq!(parse_date("Total"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn month_end_handles_leap_years_and_december() {
        assert_eq!(month_end(ymd(2024, 2, 10)), ymd(2024, 2, 29));
        assert_eq!(month_end(ymd(2023, 2, 1)), ymd(2023, 2, 28));
        assert_eq!(month_end(ymd(2024, 12, 31)), ymd(2024, 12, 31));
        assert_eq!(month_end(ymd(2024, 4, 30)), ymd(2024, 4, 30));
    }

    #[test]
    fn totals_report_overflow_instead_of_wrapping() {
        let row = |d: u32, c: &str| AggregatedRow {
            date: ymd(2024, 1, d),
            channel: Some(c.to_string()),
            views: u64::MAX,
        };
        let series = AggregatedSeries::from_rows(vec![row(1, "A"), row(1, "B")]);
        assert_eq!(series.total_views(), None);
        assert_eq!(series.views_by_channel().map(|t| t.len()), Some(2));
        let series = AggregatedSeries::from_rows(vec![row(1, "A"), row(2, "A")]);
        assert_eq!(series.views_by_channel(), None);
    }

    #[test]
    fn min_and_max_of_slice() {
        assert_eq!(min_and_max(&[3, 1, 4, 1, 5][..]), Some((1, 5)));
        assert_eq!(min_and_max::<u64>(&[][..]), None);
    }

    #[test]
    fn series_is_ordered_by_date_then_channel() {
        let row = |d: u32, c: &str, v: u64| AggregatedRow {
            date: ymd(2024, 1, d),
            channel: Some(c.to_string()),
            views: v,
        };
        let series =
            AggregatedSeries::from_rows(vec![row(2, "A", 1), row(1, "B", 2), row(1, "A", 3)]);
        let keys: Vec<(u32, &str)> = series
            .rows()
            .iter()
            .map(|r| (r.date.day(), r.channel.as_deref().unwrap()))
            .collect();
        assert_eq!(keys, vec![(1, "A"), (1, "B"), (2, "A")]);
        assert_eq!(series.channels(), vec![Some("A".to_string()), Some("B".to_string())]);
        assert_eq!(series.total_views(), Some(6));
        assert_eq!(
            series.views_by_channel().unwrap()[&Some("A".to_string())],
            4
        );
        assert_eq!(series.variant(), Variant::PerChannel);
        assert_eq!(
            series.to_string(),
            "Date,Channel,Views\n2024-01-01,A,3\n2024-01-01,B,2\n2024-01-02,A,1\n"
        );
    }
}
