use crate::error::{Error, Result};
use crate::load::RawTable;
use crate::{
    month_end, parse_date, AggregatedRow, AggregatedSeries, Granularity, ViewRecord, COL_CHANNEL,
    COL_DATE, COL_VIEWS,
};
use chrono::prelude::*;
use log::info;
use std::collections::{BTreeMap, BTreeSet};

/// Extracts the non-zero rows of the table as typed records.
/// Zero-view rows are dropped before their date is looked at;
/// any other unparseable date fails the whole table.
pub fn view_records(table: &RawTable) -> Result<Vec<ViewRecord>> {
    let i_date = table.require_column(COL_DATE)?;
    let i_views = table.require_column(COL_VIEWS)?;
    let i_channel = table.column(COL_CHANNEL);
    let mut records = Vec::with_capacity(table.len());
    let mut dropped = 0;
    for (row, &line) in table.rows.iter().zip(table.lines.iter()) {
        let views_str = &row[i_views];
        let views: u64 = views_str.parse().map_err(|_| {
            Error::MalformedInput(format!(
                "`{}` is not a non-negative view count on line {}",
                views_str, line
            ))
        })?;
        if views == 0 {
            dropped += 1;
            continue;
        }
        let date = parse_date(&row[i_date]).ok_or_else(|| Error::UnparseableDate {
            line,
            value: row[i_date].clone(),
        })?;
        records.push(ViewRecord {
            date,
            channel: i_channel.map(|i| row[i].clone()),
            views,
        });
    }
    info!(
        "kept {} rows with views, dropped {} zero-view rows",
        records.len(),
        dropped
    );
    Ok(records)
}

/// adds views to a running group total, a sum past `u64::MAX` is malformed input
fn add_views(
    total: &mut u64,
    views: u64,
    date: NaiveDate,
    channel: &Option<String>,
) -> Result<()> {
    *total = total.checked_add(views).ok_or_else(|| {
        Error::MalformedInput(format!(
            "view total overflows on {} for channel `{}`",
            date,
            channel.as_deref().unwrap_or("")
        ))
    })?;
    Ok(())
}

/// Sums the views per `(date, channel)`.
/// Grouping an already grouped series gives it back unchanged.
pub fn group_views<I>(records: I) -> Result<AggregatedSeries>
where
    I: IntoIterator<Item = ViewRecord>,
{
    let mut groups: BTreeMap<(NaiveDate, Option<String>), u64> = BTreeMap::new();
    for r in records {
        let total = groups.entry((r.date, r.channel.clone())).or_insert(0);
        add_views(total, r.views, r.date, &r.channel)?;
    }
    Ok(AggregatedSeries::from_rows(
        groups
            .into_iter()
            .map(|((date, channel), views)| AggregatedRow {
                date,
                channel,
                views,
            })
            .collect(),
    ))
}

/// Re-buckets a daily series into calendar months, each dated on its last day.
/// Every channel gets one row per month from the first to the last month of the
/// whole series, months without views are zero.
pub fn resample_monthly(series: &AggregatedSeries) -> Result<AggregatedSeries> {
    let dates: Vec<NaiveDate> = series.rows().iter().map(|r| r.date).collect();
    let (first, last) = match crate::min_and_max(&dates[..]) {
        Some(v) => v,
        None => return Ok(AggregatedSeries::default()),
    };
    let months = month_ends_between(first, last);
    let channels: BTreeSet<Option<String>> = series.channels().into_iter().collect();

    let mut buckets: BTreeMap<(NaiveDate, Option<String>), u64> = BTreeMap::new();
    for m in months.iter() {
        for c in channels.iter() {
            buckets.insert((*m, c.clone()), 0);
        }
    }
    for r in series.rows().iter() {
        let month = month_end(r.date);
        let total = buckets.entry((month, r.channel.clone())).or_insert(0);
        add_views(total, r.views, month, &r.channel)?;
    }
    Ok(AggregatedSeries::from_rows(
        buckets
            .into_iter()
            .map(|((date, channel), views)| AggregatedRow {
                date,
                channel,
                views,
            })
            .collect(),
    ))
}

/// month ends from the month of `first` to the month of `last`, inclusive
pub fn month_ends_between(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let last = month_end(last);
    let mut m = month_end(first);
    while m <= last {
        months.push(m);
        m = match m.succ_opt() {
            Some(next) => month_end(next),
            None => break,
        };
    }
    months
}

/// Filters and groups the raw table, optionally resampled to months.
pub fn filter_table(table: &RawTable, granularity: Granularity) -> Result<AggregatedSeries> {
    let records = view_records(table)?;
    let daily = group_views(records)?;
    info!(
        "aggregated {} daily rows over {} channel(s)",
        daily.len(),
        daily.channels().len()
    );
    match granularity {
        Granularity::Daily => Ok(daily),
        Granularity::Monthly => {
            let monthly = resample_monthly(&daily)?;
            info!("resampled to {} monthly rows", monthly.len());
            Ok(monthly)
        }
    }
}
