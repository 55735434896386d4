//! Recency buckets for the sidebar.
//!
//! Conversations are bucketed by calendar day in the time zone of the
//! injected `now`, never by elapsed seconds: something created at 23:50
//! is "Yesterday" ten minutes after midnight. Buckets are a stable
//! partition of the input, emitted in a fixed order, empty ones dropped.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone};

use super::Conversation;

/// One of the four fixed recency buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateGroup {
    Today,
    Yesterday,
    Previous7Days,
    Older,
}

impl DateGroup {
    /// Emission order.
    pub const ORDER: [DateGroup; 4] = [
        DateGroup::Today,
        DateGroup::Yesterday,
        DateGroup::Previous7Days,
        DateGroup::Older,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DateGroup::Today => "Today",
            DateGroup::Yesterday => "Yesterday",
            DateGroup::Previous7Days => "Previous 7 Days",
            DateGroup::Older => "Older",
        }
    }

    fn slot(self) -> usize {
        match self {
            DateGroup::Today => 0,
            DateGroup::Yesterday => 1,
            DateGroup::Previous7Days => 2,
            DateGroup::Older => 3,
        }
    }
}

/// A non-empty bucket of conversations, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct DateBucket<'a> {
    pub group: DateGroup,
    pub conversations: Vec<&'a Conversation>,
}

/// A timestamp as the backend wrote it.
enum RawTimestamp {
    /// Carries its own offset.
    Fixed(DateTime<FixedOffset>),
    /// Wall-clock only; read in the viewer's zone.
    Naive(NaiveDateTime),
}

fn parse_raw(raw: &str) -> Option<RawTimestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(RawTimestamp::Fixed(dt));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(RawTimestamp::Naive(naive));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(RawTimestamp::Naive(date.and_hms_opt(0, 0, 0)?))
}

/// Wall-clock time in `tz`. Ambiguous times take the earlier instant;
/// times skipped by a forward transition land just past the gap.
fn localize<Tz: TimeZone>(naive: &NaiveDateTime, tz: &Tz) -> DateTime<Tz> {
    if let Some(dt) = tz.from_local_datetime(naive).earliest() {
        return dt;
    }
    let before = tz.offset_from_utc_datetime(&(*naive - Duration::days(1))).fix();
    let utc = *naive - Duration::seconds(i64::from(before.local_minus_utc()));
    tz.from_utc_datetime(&utc)
}

/// Parse a backend timestamp into `tz`.
///
/// Offset-carrying RFC 3339 values are converted; offset-less date-times
/// and bare dates are read as wall-clock values in `tz`.
pub fn parse_created_at<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<DateTime<Tz>> {
    match parse_raw(raw)? {
        RawTimestamp::Fixed(dt) => Some(dt.with_timezone(tz)),
        RawTimestamp::Naive(naive) => Some(localize(&naive, tz)),
    }
}

/// Calendar date of a backend timestamp in `tz`. Wall-clock values keep
/// their written date, even inside a DST gap.
fn created_date<Tz: TimeZone>(raw: &str, tz: &Tz) -> Option<NaiveDate> {
    match parse_raw(raw)? {
        RawTimestamp::Fixed(dt) => Some(dt.with_timezone(tz).date_naive()),
        RawTimestamp::Naive(naive) => Some(naive.date()),
    }
}

/// Classify a single timestamp relative to `now`.
///
/// Day difference 0 is Today, 1 is Yesterday, 2..=6 is Previous 7 Days.
/// Everything else is Older: seven or more days back, future dates
/// (negative difference), and unparsable input.
pub fn classify<Tz: TimeZone>(created_at: &str, now: &DateTime<Tz>) -> DateGroup {
    let Some(created) = created_date(created_at, &now.timezone()) else {
        return DateGroup::Older;
    };
    let days = now
        .date_naive()
        .signed_duration_since(created)
        .num_days();
    match days {
        0 => DateGroup::Today,
        1 => DateGroup::Yesterday,
        2..=6 => DateGroup::Previous7Days,
        _ => DateGroup::Older,
    }
}

/// Bucket conversations by recency.
pub fn group_by_date<'a, Tz: TimeZone>(
    conversations: &'a [Conversation],
    now: &DateTime<Tz>,
) -> Vec<DateBucket<'a>> {
    let mut slots: [Vec<&'a Conversation>; 4] = Default::default();
    for conv in conversations {
        slots[classify(&conv.created_at, now).slot()].push(conv);
    }

    DateGroup::ORDER
        .into_iter()
        .zip(slots)
        .filter(|(_, convs)| !convs.is_empty())
        .map(|(group, conversations)| DateBucket {
            group,
            conversations,
        })
        .collect()
}

/// A row in the flattened sidebar list.
#[derive(Debug, Clone, PartialEq)]
pub enum SidebarRow<'a> {
    Header(DateGroup),
    Conversation(&'a Conversation),
}

/// Flatten buckets into header + conversation rows for list rendering.
pub fn sidebar_rows<'a, Tz: TimeZone>(
    conversations: &'a [Conversation],
    now: &DateTime<Tz>,
) -> Vec<SidebarRow<'a>> {
    let mut rows = Vec::with_capacity(conversations.len() + DateGroup::ORDER.len());
    for bucket in group_by_date(conversations, now) {
        rows.push(SidebarRow::Header(bucket.group));
        rows.extend(bucket.conversations.into_iter().map(SidebarRow::Conversation));
    }
    rows
}

/// Conversations in sidebar display order (what the selection cursor walks).
pub fn display_order<'a, Tz: TimeZone>(
    conversations: &'a [Conversation],
    now: &DateTime<Tz>,
) -> Vec<&'a Conversation> {
    group_by_date(conversations, now)
        .into_iter()
        .flat_map(|b| b.conversations)
        .collect()
}

/// `HH:MM` of the creation time in `tz`, or `--:--` when unparsable.
pub fn format_time_of_day<Tz: TimeZone>(created_at: &str, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match parse_created_at(created_at, tz) {
        Some(dt) => dt.format("%H:%M").to_string(),
        None => "--:--".into(),
    }
}
