//! Heuristic parsing of the date strings people type into slash commands,
//! e.g. "tomorrow at 3pm", "next friday 7:30pm", "December 25th at 2pm",
//! "in 2 hours" or "2024-03-15 14:30". Everything is interpreted in the
//! caller's time zone and returned in UTC.

use chrono::{
    DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
    Weekday,
};
use chrono_tz::Tz;

const EXACT_DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M",
];
const EXACT_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

fn hm(hour: u32, minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

fn noon() -> NaiveTime {
    NaiveTime::MIN + Duration::hours(12)
}

/// Resolves a local wall-clock time, stepping past a DST gap if needed.
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn parse_when(text: &str, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    parse_exact(trimmed, tz).or_else(|| parse_natural(&trimmed.to_lowercase(), now, tz))
}

fn parse_exact(text: &str, tz: Tz) -> Option<DateTime<Utc>> {
    if text.len() >= 10 && text.chars().all(|c| c.is_ascii_digit()) {
        let value: i64 = text.parse().ok()?;
        return if text.len() >= 13 {
            DateTime::from_timestamp_millis(value)
        } else {
            DateTime::from_timestamp(value, 0)
        };
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in EXACT_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return localize(naive, tz);
        }
    }
    for format in EXACT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return localize(date.and_time(noon()), tz);
        }
    }
    None
}

fn parse_natural(lower: &str, now: DateTime<Utc>, tz: Tz) -> Option<DateTime<Utc>> {
    let local_now = now.with_timezone(&tz);
    let today = local_now.date_naive();
    let cleaned = lower.replace(',', " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();

    if tokens.as_slice() == ["now"] {
        return Some(now);
    }
    if let Some(amount) = relative_amount(&tokens) {
        return amount.and_then(|offset| now.checked_add_signed(offset));
    }

    let mut date: Option<NaiveDate> = None;
    let mut time: Option<NaiveTime> = None;
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];
        match token {
            "today" => date = Some(today),
            "tonight" => {
                date = Some(today);
                time = time.or(hm(20, 0));
            }
            "tomorrow" | "tmrw" => date = Some(today + Duration::days(1)),
            "noon" | "midday" => time = hm(12, 0),
            "midnight" => time = hm(0, 0),
            "morning" => time = time.or(hm(9, 0)),
            "afternoon" => time = time.or(hm(15, 0)),
            "evening" => time = time.or(hm(18, 0)),
            "next" | "this" => {
                let next = token == "next";
                match tokens.get(i + 1).copied() {
                    Some(unit) if weekday(unit).is_some() => {
                        date = weekday(unit).map(|wd| upcoming(today, wd, next));
                        i += 1;
                    }
                    Some("week") if next => {
                        date = Some(today + Duration::days(7));
                        i += 1;
                    }
                    Some("month") if next => {
                        date = today.checked_add_months(Months::new(1));
                        i += 1;
                    }
                    _ => {}
                }
            }
            _ => {
                if let Some(wd) = weekday(token) {
                    date = Some(upcoming(today, wd, false));
                } else if let Some(month) = month(token) {
                    let following = tokens.get(i + 1).and_then(|t| day_of_month(t));
                    let preceding = i
                        .checked_sub(1)
                        .and_then(|p| tokens.get(p))
                        .and_then(|t| day_of_month(t));
                    let mut next_index = i + 1;
                    if following.is_some() {
                        next_index += 1;
                    }
                    let year = tokens.get(next_index).and_then(|t| year(t));
                    if year.is_some() {
                        next_index += 1;
                    }
                    let day = following.or(preceding).unwrap_or(1);
                    date = month_day(today, month, day, year);
                    i = next_index;
                    continue;
                } else {
                    let after_at = i > 0 && tokens[i - 1] == "at";
                    if let Some((clock, consumed_next)) =
                        clock_time(token, tokens.get(i + 1).copied(), after_at)
                    {
                        time = Some(clock);
                        if consumed_next {
                            i += 1;
                        }
                    }
                }
            }
        }
        i += 1;
    }

    let naive = match (date, time) {
        (None, None) => return None,
        (Some(day), time) => day.and_time(time.unwrap_or_else(noon)),
        (None, Some(time)) => {
            let candidate = today.and_time(time);
            if candidate <= local_now.naive_local() {
                candidate + Duration::days(1)
            } else {
                candidate
            }
        }
    };
    localize(naive, tz)
}

/// "in 2 hours", "in an hour", "in ten minutes". The inner `None` is a
/// recognised phrase whose amount does not fit a `Duration`.
fn relative_amount(tokens: &[&str]) -> Option<Option<Duration>> {
    tokens.windows(3).find_map(|w| {
        if w[0] != "in" {
            return None;
        }
        let amount = count(w[1])?;
        let unit = w[2].trim_end_matches('s');
        match unit {
            "minute" | "min" => Some(Duration::try_minutes(amount)),
            "hour" | "hr" => Some(Duration::try_hours(amount)),
            "day" => Some(Duration::try_days(amount)),
            "week" => Some(Duration::try_weeks(amount)),
            _ => None,
        }
    })
}

fn count(token: &str) -> Option<i64> {
    if let Ok(n) = token.parse::<i64>() {
        return (n > 0).then_some(n);
    }
    let words = [
        "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
        "twelve",
    ];
    match token {
        "a" | "an" => Some(1),
        _ => words.iter().position(|w| *w == token).map(|p| p as i64 + 1),
    }
}

fn weekday(token: &str) -> Option<Weekday> {
    match token {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

fn month(token: &str) -> Option<u32> {
    let months = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    months
        .iter()
        .position(|m| token.len() >= 3 && m.starts_with(token))
        .map(|p| p as u32 + 1)
}

fn day_of_month(token: &str) -> Option<u32> {
    let digits = token
        .trim_end_matches("st")
        .trim_end_matches("nd")
        .trim_end_matches("rd")
        .trim_end_matches("th");
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

fn year(token: &str) -> Option<i32> {
    if token.len() != 4 {
        return None;
    }
    token.parse().ok().filter(|y| (1970..=9999).contains(y))
}

/// The given weekday on or after today; with `next`, the one a week later.
fn upcoming(today: NaiveDate, target: Weekday, next: bool) -> NaiveDate {
    let ahead = (target.num_days_from_monday() + 7 - today.weekday().num_days_from_monday()) % 7;
    let ahead = if next { ahead + 7 } else { ahead };
    today + Duration::days(i64::from(ahead))
}

/// Month/day with an optional year; without one the next occurrence is used.
fn month_day(today: NaiveDate, month: u32, day: u32, year: Option<i32>) -> Option<NaiveDate> {
    if let Some(year) = year {
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

/// Parses "3pm", "7:30pm", "15:00", "5 pm" and a bare hour after "at".
/// Returns the time and whether the following token (a detached am/pm) was
/// consumed.
fn clock_time(token: &str, next: Option<&str>, after_at: bool) -> Option<(NaiveTime, bool)> {
    let (body, meridiem, consumed_next) = if let Some(body) = token.strip_suffix("am") {
        (body, Some(false), false)
    } else if let Some(body) = token.strip_suffix("pm") {
        (body, Some(true), false)
    } else {
        match next {
            Some("am" | "a.m.") => (token, Some(false), true),
            Some("pm" | "p.m.") => (token, Some(true), true),
            _ => (token, None, false),
        }
    };

    let (hour, minute, has_colon) = match body.split_once(':') {
        Some((h, m)) if m.len() == 2 => (h.parse::<u32>().ok()?, m.parse::<u32>().ok()?, true),
        Some(_) => return None,
        None if !body.is_empty() && body.len() <= 2 => (body.parse::<u32>().ok()?, 0, false),
        None => return None,
    };
    if minute > 59 {
        return None;
    }

    let hour = match meridiem {
        Some(pm) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (pm, hour) {
                (false, 12) => 0,
                (true, 12) => 12,
                (true, h) => h + 12,
                (false, h) => h,
            }
        }
        None if has_colon => hour,
        // "at 5" means the afternoon; nobody schedules a picnic at 5am.
        None if after_at && (1..=7).contains(&hour) => hour + 12,
        None if after_at => hour,
        None => return None,
    };
    Some((hm(hour, minute)?, consumed_next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::New_York;

    // Tuesday 2026-02-10 09:00 in New York.
    fn now() -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(2026, 2, 10, 9, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn parse(text: &str) -> Option<DateTime<Utc>> {
        parse_when(text, now(), New_York)
    }

    #[test]
    fn parses_relative_days_with_times() {
        assert_eq!(parse("tomorrow at 3pm"), Some(local(2026, 2, 11, 15, 0)));
        assert_eq!(parse("today 7:30 pm"), Some(local(2026, 2, 10, 19, 30)));
        assert_eq!(parse("tonight"), Some(local(2026, 2, 10, 20, 0)));
        assert_eq!(parse("tomorrow"), Some(local(2026, 2, 11, 12, 0)));
    }

    #[test]
    fn parses_weekdays() {
        assert_eq!(parse("monday 9am"), Some(local(2026, 2, 16, 9, 0)));
        assert_eq!(parse("this friday"), Some(local(2026, 2, 13, 12, 0)));
        assert_eq!(parse("next friday at 7:30pm"), Some(local(2026, 2, 20, 19, 30)));
        assert_eq!(parse("tuesday at noon"), Some(local(2026, 2, 10, 12, 0)));
    }

    #[test]
    fn parses_month_dates() {
        assert_eq!(parse("December 25th at 2pm"), Some(local(2026, 12, 25, 14, 0)));
        assert_eq!(parse("25 dec"), Some(local(2026, 12, 25, 12, 0)));
        assert_eq!(parse("jan 5"), Some(local(2027, 1, 5, 12, 0)));
        assert_eq!(parse("March 3, 2028 at 10am"), Some(local(2028, 3, 3, 10, 0)));
    }

    #[test]
    fn parses_offsets_and_exact_formats() {
        assert_eq!(parse("in 2 hours"), Some(now() + Duration::hours(2)));
        assert_eq!(parse("in an hour"), Some(now() + Duration::hours(1)));
        assert_eq!(parse("next week"), Some(local(2026, 2, 17, 12, 0)));
        assert_eq!(parse("2024-03-15 14:30"), Some(local(2024, 3, 15, 14, 30)));
        assert_eq!(
            parse("2025-08-03T12:00:00.000Z"),
            Some(Utc.with_ymd_and_hms(2025, 8, 3, 12, 0, 0).unwrap())
        );
        assert_eq!(
            parse("1754222400000"),
            Some(Utc.with_ymd_and_hms(2025, 8, 3, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn bare_time_rolls_forward_when_passed() {
        assert_eq!(parse("8am"), Some(local(2026, 2, 11, 8, 0)));
        assert_eq!(parse("at 5"), Some(local(2026, 2, 10, 17, 0)));
        assert_eq!(parse("15:00"), Some(local(2026, 2, 10, 15, 0)));
    }

    #[test]
    fn huge_offsets_resolve_to_nothing() {
        assert_eq!(parse("in 99999999 weeks"), None);
        assert_eq!(parse("in 9223372036854775807 minutes"), None);
        assert_eq!(parse("in 999999999999 days"), None);
    }

    #[test]
    fn rejects_text_without_dates() {
        assert_eq!(parse("invalid date string"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("13pm"), None);
        assert_eq!(parse("buy milk"), None);
    }
}
