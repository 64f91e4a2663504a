//! Period detection and path computation for strftime templates.

use std::{fmt, fmt::Write as _, path::PathBuf};

use chrono::{
    format::{Item, StrftimeItems},
    Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike,
};

use crate::error::{Result, TargetError};

/// First day of a week-granular period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WeekStart {
    Sunday,
    Monday,
}

/// Length of a rotation period, ordered finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Periodicity {
    Second,
    Minute,
    Hour,
    Day,
    Week(WeekStart),
    Month,
    Year,
}

impl Periodicity {
    /// The unit a single strftime conversion character varies with, if any.
    pub fn for_specifier(spec: char) -> Option<Self> {
        let unit = match spec {
            'S' | 's' | 'T' | 'X' | 'r' | 'c' | '+' => Periodicity::Second,
            'M' | 'R' => Periodicity::Minute,
            'H' | 'I' | 'k' | 'l' | 'p' | 'P' => Periodicity::Hour,
            'd' | 'e' | 'j' | 'a' | 'A' | 'u' | 'w' | 'D' | 'F' | 'x' | 'v' => Periodicity::Day,
            'U' => Periodicity::Week(WeekStart::Sunday),
            'W' | 'V' | 'G' | 'g' => Periodicity::Week(WeekStart::Monday),
            'm' | 'b' | 'B' | 'h' => Periodicity::Month,
            'Y' | 'y' | 'C' => Periodicity::Year,
            _ => return None,
        };
        Some(unit)
    }

    /// Finest unit used by `template`, or `None` when it has no time conversion.
    pub fn of_template(template: &str) -> Option<Self> {
        let mut finest: Option<Periodicity> = None;
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                continue;
            }
            // Padding flags, fraction widths and `%:z`-style modifiers.
            while chars.peek().is_some_and(|&f| {
                matches!(f, '-' | '_' | '^' | '#' | '.' | ':') || f.is_ascii_digit()
            }) {
                chars.next();
            }
            let Some(spec) = chars.next() else {
                break;
            };
            if let Some(unit) = Periodicity::for_specifier(spec) {
                finest = Some(finest.map_or(unit, |current| current.min(unit)));
            }
        }

        finest
    }

    /// Start of the period containing `now`.
    pub fn start_of(&self, now: NaiveDateTime) -> NaiveDateTime {
        let date = now.date();
        let midnight = |d: NaiveDate| d.and_time(NaiveTime::MIN);

        match self {
            Periodicity::Second => now.with_nanosecond(0).unwrap_or(now),
            Periodicity::Minute => date.and_time(
                NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(NaiveTime::MIN),
            ),
            Periodicity::Hour => {
                date.and_time(NaiveTime::from_hms_opt(now.hour(), 0, 0).unwrap_or(NaiveTime::MIN))
            }
            Periodicity::Day => midnight(date),
            Periodicity::Week(start) => {
                let back = match start {
                    WeekStart::Sunday => date.weekday().num_days_from_sunday(),
                    WeekStart::Monday => date.weekday().num_days_from_monday(),
                };
                midnight(date.checked_sub_days(Days::new(u64::from(back))).unwrap_or(date))
            }
            Periodicity::Month => midnight(date.with_day(1).unwrap_or(date)),
            Periodicity::Year => midnight(date.with_ordinal(1).unwrap_or(date)),
        }
    }
}

/// Identifies one rotation period: its start, in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodKey(NaiveDateTime);

impl PeriodKey {
    pub fn start(&self) -> NaiveDateTime {
        self.0
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
    }
}

/// A validated strftime template and the period it rotates on.
#[derive(Debug, Clone)]
pub struct RotationPolicy {
    template: String,
    periodicity: Periodicity,
}

impl RotationPolicy {
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: &str| TargetError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if StrftimeItems::new(template).any(|item| matches!(item, Item::Error)) {
            return Err(invalid("unrecognised conversion specifier"));
        }
        let periodicity =
            Periodicity::of_template(template).ok_or_else(|| invalid("no time conversion"))?;

        Ok(Self {
            template: template.to_string(),
            periodicity,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn periodicity(&self) -> Periodicity {
        self.periodicity
    }

    /// Key of the period containing `now`. Pure arithmetic, no I/O.
    pub fn period_key(&self, now: NaiveDateTime) -> PeriodKey {
        PeriodKey(self.periodicity.start_of(now))
    }

    /// The template rendered at the start of `key`'s period.
    pub fn concrete_path(&self, key: PeriodKey) -> Result<PathBuf> {
        let mut rendered = String::new();
        write!(rendered, "{}", key.0.format(&self.template)).map_err(|_| {
            TargetError::InvalidTemplate {
                template: self.template.clone(),
                reason: "conversion needs a time zone".to_string(),
            }
        })?;
        Ok(PathBuf::from(rendered))
    }
}
