use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    File,
    Folder,
    Link,
}

/// One line of a `LIST` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub entry_type: EntryType,
    pub size: u64,
    pub time: DateTime<Utc>,
}

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

fn month(field: &str) -> Option<u32> {
    let index = MONTHS.iter().position(|m| field.eq_ignore_ascii_case(m))?;
    u32::try_from(index).ok().map(|m| m + 1)
}

/// Whitespace separated fields together with their byte offset, so the
/// file name can be sliced out of the line with its inner spaces intact.
fn fields(line: &str) -> Vec<(usize, &str)> {
    let mut fields = Vec::new();
    let mut start = None;

    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                fields.push((s, &line[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }

    if let Some(s) = start {
        fields.push((s, &line[s..]));
    }

    fields
}

fn utc(date: NaiveDate, hour: u32, min: u32) -> Option<DateTime<Utc>> {
    date.and_hms_opt(hour, min, 0).map(|t| Utc.from_utc_datetime(&t))
}

/// `HH:MM` means "within the last six months", so the year is the current
/// one unless that would put the entry in the future.
fn unix_time(
    month: u32,
    day: u32,
    clock_or_year: &str,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    let Some((hour, min)) = clock_or_year.split_once(':') else {
        let year = clock_or_year.parse().ok()?;
        return utc(NaiveDate::from_ymd_opt(year, month, day)?, 0, 0);
    };

    let (hour, min) = (hour.parse().ok()?, min.parse().ok()?);
    let at = |year: i32| utc(NaiveDate::from_ymd_opt(year, month, day)?, hour, min);

    match at(now.year()) {
        Some(time) if time <= now + Duration::days(1) => Some(time),
        _ => at(now.year() - 1),
    }
}

fn parse_unix(line: &str, now: DateTime<Utc>) -> Option<Entry> {
    let fields = fields(line);
    let perms = fields.first()?.1;
    if perms.len() < 10 {
        return None;
    }

    let entry_type = match perms.as_bytes()[0] {
        b'd' => EntryType::Folder,
        b'l' => EntryType::Link,
        b'-' | b'b' | b'c' | b'p' | b's' => EntryType::File,
        _ => return None,
    };

    // the group column is optional, so anchor on "<size> <month>"
    let at = (3..fields.len().saturating_sub(3))
        .find(|&i| month(fields[i].1).is_some() && fields[i - 1].1.parse::<u64>().is_ok())?;

    let size = fields[at - 1].1.parse().ok()?;
    let day = fields[at + 1].1.parse().ok()?;
    let time = unix_time(month(fields[at].1)?, day, fields[at + 2].1, now)?;

    let mut name = &line[fields[at + 3].0..];
    if entry_type == EntryType::Link {
        if let Some((link, _target)) = name.split_once(" -> ") {
            name = link;
        }
    }

    Some(Entry {
        name: name.to_owned(),
        entry_type,
        size,
        time,
    })
}

fn parse_dos(line: &str) -> Option<Entry> {
    let fields = fields(line);
    if fields.len() < 4 {
        return None;
    }

    let stamp = format!("{} {}", fields[0].1, fields[1].1);
    let time = NaiveDateTime::parse_from_str(&stamp, "%m-%d-%y %I:%M%p").ok()?;

    let (entry_type, size) = if fields[2].1.eq_ignore_ascii_case("<DIR>") {
        (EntryType::Folder, 0)
    } else {
        (EntryType::File, fields[2].1.parse().ok()?)
    };

    Some(Entry {
        name: line[fields[3].0..].to_owned(),
        entry_type,
        size,
        time: Utc.from_utc_datetime(&time),
    })
}

/// Parses a whole `LIST` response, skipping lines in unknown formats.
pub fn parse_listing(text: &str, now: DateTime<Utc>) -> Vec<Entry> {
    text.lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && !line.starts_with("total "))
        .filter_map(|line| parse_unix(line, now).or_else(|| parse_dos(line)))
        .collect()
}
