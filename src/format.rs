//! Moment.js-style date formats, as used by Obsidian for daily-note names and
//! `{{date:...}}` template variables.
//!
//! A format string is compiled once into a [`DateFormat`] (a flat list of
//! literal and token segments) and can then be rendered for any point in time.
//! Alphabetic runs that do not start a known token are kept as literals, so a
//! typo never blocks note creation. `[...]` escapes its content verbatim and
//! `\X` escapes a single character.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// `YYYY`
    Year,
    /// `YY`
    YearShort,
    /// `MMMM`
    MonthName,
    /// `MMM`
    MonthAbbrev,
    /// `MM`
    MonthPadded,
    /// `M`
    Month,
    /// `DD`
    DayPadded,
    /// `D`
    Day,
    /// `Do`
    DayOrdinal,
    /// `DDDD`
    DayOfYearPadded,
    /// `DDD`
    DayOfYear,
    /// `dddd`
    WeekdayName,
    /// `ddd`
    WeekdayAbbrev,
    /// `dd`
    WeekdayMin,
    /// `d`, Sunday is 0.
    Weekday,
    /// `E`, Monday is 1.
    IsoWeekday,
    /// `ww`
    WeekPadded,
    /// `w`
    Week,
    /// `WW`
    IsoWeekPadded,
    /// `W`
    IsoWeek,
    /// `gggg`
    WeekYear,
    /// `GGGG`
    IsoWeekYear,
    /// `Q`
    Quarter,
    /// `HH`
    HourPadded,
    /// `H`
    Hour,
    /// `hh`
    Hour12Padded,
    /// `h`
    Hour12,
    /// `mm`
    MinutePadded,
    /// `m`
    Minute,
    /// `ss`
    SecondPadded,
    /// `s`
    Second,
    /// `A`
    MeridiemUpper,
    /// `a`
    MeridiemLower,
}

/// Recognized tokens, longest first. The scanner takes the first entry that
/// matches at the current position.
const TOKENS: &[(&str, Token)] = &[
    ("YYYY", Token::Year),
    ("MMMM", Token::MonthName),
    ("DDDD", Token::DayOfYearPadded),
    ("dddd", Token::WeekdayName),
    ("gggg", Token::WeekYear),
    ("GGGG", Token::IsoWeekYear),
    ("MMM", Token::MonthAbbrev),
    ("DDD", Token::DayOfYear),
    ("ddd", Token::WeekdayAbbrev),
    ("YY", Token::YearShort),
    ("MM", Token::MonthPadded),
    ("Do", Token::DayOrdinal),
    ("DD", Token::DayPadded),
    ("dd", Token::WeekdayMin),
    ("ww", Token::WeekPadded),
    ("WW", Token::IsoWeekPadded),
    ("HH", Token::HourPadded),
    ("hh", Token::Hour12Padded),
    ("mm", Token::MinutePadded),
    ("ss", Token::SecondPadded),
    ("M", Token::Month),
    ("D", Token::Day),
    ("d", Token::Weekday),
    ("E", Token::IsoWeekday),
    ("w", Token::Week),
    ("W", Token::IsoWeek),
    ("Q", Token::Quarter),
    ("H", Token::Hour),
    ("h", Token::Hour12),
    ("m", Token::Minute),
    ("s", Token::Second),
    ("A", Token::MeridiemUpper),
    ("a", Token::MeridiemLower),
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Token(Token),
}

/// A compiled date format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    source: String,
    segments: Vec<Segment>,
}

impl DateFormat {
    pub fn compile(format: &str) -> Result<Self> {
        if format.is_empty() {
            return Err(Error::format(format, "format is empty"));
        }

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = format;

        'scan: while let Some(ch) = rest.chars().next() {
            if ch == '\\' {
                // `\X` emits `X`; a trailing `\` emits nothing.
                let escaped = rest[1..].chars().next();
                if let Some(next) = escaped {
                    literal.push(next);
                }
                rest = &rest[1 + escaped.map_or(0, char::len_utf8)..];
                continue;
            }

            if ch == '[' {
                match rest[1..].find(['[', ']']).map(|i| (i + 1, rest.as_bytes()[i + 1])) {
                    Some((end, b']')) => {
                        literal.push_str(&rest[1..end]);
                        rest = &rest[end + 1..];
                    }
                    // A second `[` before any `]`: this one is a plain character.
                    Some(_) => {
                        literal.push('[');
                        rest = &rest[1..];
                    }
                    None => return Err(Error::format(format, "unterminated '[' escape")),
                }
                continue;
            }

            for (pattern, token) in TOKENS {
                if let Some(tail) = rest.strip_prefix(pattern) {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Token(*token));
                    rest = tail;
                    continue 'scan;
                }
            }

            literal.push(ch);
            rest = &rest[ch.len_utf8()..];
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: format.to_string(),
            segments,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn render(&self, at: NaiveDateTime) -> String {
        let mut out = String::with_capacity(self.source.len() + 8);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Token(token) => token.render_into(at, &mut out),
            }
        }
        out
    }
}

impl FromStr for DateFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Token {
    fn render_into(self, at: NaiveDateTime, out: &mut String) {
        let date = at.date();
        // Writing into a String cannot fail.
        let _ = match self {
            Token::Year => write!(out, "{:04}", date.year()),
            Token::YearShort => write!(out, "{:02}", date.year().rem_euclid(100)),
            Token::MonthName => write!(out, "{}", MONTH_NAMES[date.month0() as usize]),
            Token::MonthAbbrev => write!(out, "{}", &MONTH_NAMES[date.month0() as usize][..3]),
            Token::MonthPadded => write!(out, "{:02}", date.month()),
            Token::Month => write!(out, "{}", date.month()),
            Token::DayPadded => write!(out, "{:02}", date.day()),
            Token::Day => write!(out, "{}", date.day()),
            Token::DayOrdinal => write!(out, "{}{}", date.day(), ordinal_suffix(date.day())),
            Token::DayOfYearPadded => write!(out, "{:03}", date.ordinal()),
            Token::DayOfYear => write!(out, "{}", date.ordinal()),
            Token::WeekdayName => write!(out, "{}", weekday_name(date)),
            Token::WeekdayAbbrev => write!(out, "{}", &weekday_name(date)[..3]),
            Token::WeekdayMin => write!(out, "{}", &weekday_name(date)[..2]),
            Token::Weekday => write!(out, "{}", date.weekday().num_days_from_sunday()),
            Token::IsoWeekday => write!(out, "{}", date.weekday().number_from_monday()),
            Token::WeekPadded => write!(out, "{:02}", locale_week(date).1),
            Token::Week => write!(out, "{}", locale_week(date).1),
            Token::IsoWeekPadded => write!(out, "{:02}", date.iso_week().week()),
            Token::IsoWeek => write!(out, "{}", date.iso_week().week()),
            Token::WeekYear => write!(out, "{:04}", locale_week(date).0),
            Token::IsoWeekYear => write!(out, "{:04}", date.iso_week().year()),
            Token::Quarter => write!(out, "{}", date.month0() / 3 + 1),
            Token::HourPadded => write!(out, "{:02}", at.hour()),
            Token::Hour => write!(out, "{}", at.hour()),
            Token::Hour12Padded => write!(out, "{:02}", hour12(at.hour())),
            Token::Hour12 => write!(out, "{}", hour12(at.hour())),
            Token::MinutePadded => write!(out, "{:02}", at.minute()),
            Token::Minute => write!(out, "{}", at.minute()),
            Token::SecondPadded => write!(out, "{:02}", at.second()),
            Token::Second => write!(out, "{}", at.second()),
            Token::MeridiemUpper => write!(out, "{}", if at.hour() < 12 { "AM" } else { "PM" }),
            Token::MeridiemLower => write!(out, "{}", if at.hour() < 12 { "am" } else { "pm" }),
        };
    }
}

fn weekday_name(date: NaiveDate) -> &'static str {
    WEEKDAY_NAMES[date.weekday().num_days_from_sunday() as usize]
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn hour12(hour: u32) -> u32 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

/// Week-year and week number for the `en` locale: weeks start on Sunday and
/// week 1 is the week containing January 1st, so the week's Saturday decides
/// which year it belongs to.
fn locale_week(date: NaiveDate) -> (i32, u32) {
    let to_saturday = 6 - i64::from(date.weekday().num_days_from_sunday());
    let saturday = date
        .checked_add_signed(Duration::days(to_saturday))
        .unwrap_or(date);
    (saturday.year(), saturday.ordinal0() / 7 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, ss)
            .unwrap()
    }

    fn render(format: &str, when: NaiveDateTime) -> String {
        DateFormat::compile(format).unwrap().render(when)
    }

    #[test]
    fn common_daily_note_formats() {
        let when = at(2024, 3, 5, 14, 7, 9);
        assert_eq!(render("MMM DD YYYY", when), "Mar 05 2024");
        assert_eq!(render("YYYY-MM-DD", when), "2024-03-05");
        assert_eq!(render("D MMMM YY", when), "5 March 24");
        assert_eq!(render("HH:mm", when), "14:07");
    }

    #[test]
    fn longest_token_wins() {
        let program = DateFormat::compile("MMMMM").unwrap();
        assert_eq!(
            program.segments(),
            &[Segment::Token(Token::MonthName), Segment::Token(Token::Month)]
        );
        assert_eq!(render("YYYYYY", at(2024, 3, 5, 0, 0, 0)), "202424");
    }

    #[test]
    fn extended_tokens() {
        let when = at(2024, 3, 5, 14, 7, 9);
        assert_eq!(render("dddd ddd dd d E", when), "Tuesday Tue Tu 2 2");
        assert_eq!(render("DDDD DDD Do", when), "065 65 5th");
        assert_eq!(render("ww w WW W Q", when), "10 10 10 10 1");
        assert_eq!(render("H h hh A a", when), "14 2 02 PM pm");
        assert_eq!(render("m ss s M", when), "7 09 9 3");
    }

    #[test]
    fn midnight_is_twelve_am() {
        assert_eq!(render("h:mm A", at(2024, 3, 5, 0, 30, 0)), "12:30 AM");
        assert_eq!(render("hh a", at(2024, 3, 5, 12, 0, 0)), "12 pm");
    }

    #[test]
    fn ordinals() {
        let cases = [(1, "1st"), (2, "2nd"), (3, "3rd"), (4, "4th"), (11, "11th")];
        for (day, expected) in cases {
            assert_eq!(render("Do", at(2024, 1, day, 0, 0, 0)), expected);
        }
        assert_eq!(render("Do", at(2024, 1, 12, 0, 0, 0)), "12th");
        assert_eq!(render("Do", at(2024, 1, 13, 0, 0, 0)), "13th");
        assert_eq!(render("Do", at(2024, 1, 21, 0, 0, 0)), "21st");
        assert_eq!(render("Do", at(2024, 1, 22, 0, 0, 0)), "22nd");
    }

    #[test]
    fn week_years_cross_calendar_years() {
        // Sunday 2023-12-31 starts the week containing 2024-01-01.
        assert_eq!(render("gggg-[W]ww", at(2023, 12, 31, 0, 0, 0)), "2024-W01");
        // Monday 2024-12-30 is in ISO week 1 of 2025.
        assert_eq!(render("GGGG-[W]WW", at(2024, 12, 30, 0, 0, 0)), "2025-W01");
    }

    #[test]
    fn unknown_letters_and_punctuation_are_literal() {
        let when = at(2024, 3, 5, 0, 0, 0);
        assert_eq!(render("YYYY.MM.DD (x)", when), "2024.03.05 (x)");
        assert_eq!(render("YYYY/MM/YYYY-MM-DD", when), "2024/03/2024-03-05");
        assert_eq!(render("📅 YYYY", when), "📅 2024");
    }

    #[test]
    fn bracket_escapes_are_emitted_without_brackets() {
        let when = at(2024, 3, 5, 0, 0, 0);
        assert_eq!(render("[Week] ww", when), "Week 10");
        assert_eq!(render("YYYY [Daily Log]", when), "2024 Daily Log");
        assert_eq!(render("[]YYYY", when), "2024");
    }

    #[test]
    fn backslash_escapes_a_single_character() {
        let when = at(2024, 3, 5, 0, 0, 0);
        assert_eq!(render("YYYY \\Week", when), "2024 Week");
        assert_eq!(render("\\D\\a\\y D", when), "Day 5");
        assert_eq!(render("YYYY\\", when), "2024");
        assert_eq!(render("\\[YYYY]", when), "[2024]");
    }

    #[test]
    fn inner_bracket_ends_an_escape_attempt() {
        let when = at(2024, 3, 5, 9, 0, 0);
        assert_eq!(render("[a[b]", when), "[amb");
        assert_eq!(render("[Day] D [of] MMMM", when), "Day 5 of March");
    }

    #[test]
    fn malformed_formats_are_rejected() {
        assert!(matches!(
            DateFormat::compile("YYYY [oops"),
            Err(Error::Format { .. })
        ));
        assert!(matches!(DateFormat::compile(""), Err(Error::Format { .. })));
    }

    #[test]
    fn source_round_trips_through_display() {
        let program: DateFormat = "MMM DD YYYY".parse().unwrap();
        assert_eq!(program.to_string(), "MMM DD YYYY");
        assert_eq!(program.source(), "MMM DD YYYY");
    }
}
