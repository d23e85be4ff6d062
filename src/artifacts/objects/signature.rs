//! Author, committer and tagger identities
//!
//! A signature line has the shape `name <email> <unix-seconds> <±hhmm>`.
//! Identities are read from the usual git environment variables when a
//! caller does not build one explicitly.

use crate::errors::{RepositoryError, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Which identity to load from the environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureRole {
    Author,
    Committer,
}

impl SignatureRole {
    fn env_prefix(&self) -> &'static str {
        match self {
            SignatureRole::Author => "GIT_AUTHOR",
            SignatureRole::Committer => "GIT_COMMITTER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    name: String,
    email: String,
    /// Seconds since the Unix epoch
    time: i64,
    /// Offset from UTC in minutes
    offset_minutes: i32,
}

impl Signature {
    /// Build a signature; characters that would break the wire format are dropped
    pub fn new(name: &str, email: &str, time: i64, offset_minutes: i32) -> Self {
        Signature {
            name: Self::sanitize(name),
            email: Self::sanitize(email),
            time,
            offset_minutes,
        }
    }

    pub fn with_timestamp(name: &str, email: &str, timestamp: DateTime<FixedOffset>) -> Self {
        Self::new(
            name,
            email,
            timestamp.timestamp(),
            timestamp.offset().local_minus_utc() / 60,
        )
    }

    /// Signature stamped with the current local time
    pub fn now(name: &str, email: &str) -> Self {
        Self::with_timestamp(name, email, chrono::Local::now().fixed_offset())
    }

    /// Load an identity from `GIT_<ROLE>_NAME`, `GIT_<ROLE>_EMAIL` and `GIT_<ROLE>_DATE`
    ///
    /// The committer falls back to the author variables when its own are unset.
    pub fn load_from_env(role: SignatureRole) -> Result<Self> {
        let var = |suffix: &str| std::env::var(format!("{}_{suffix}", role.env_prefix())).ok();
        let fallback = |suffix: &str| match role {
            SignatureRole::Committer => std::env::var(format!("GIT_AUTHOR_{suffix}")).ok(),
            SignatureRole::Author => None,
        };

        let name = var("NAME")
            .or_else(|| fallback("NAME"))
            .ok_or_else(|| RepositoryError::not_found("identity", "GIT_AUTHOR_NAME"))?;
        let email = var("EMAIL")
            .or_else(|| fallback("EMAIL"))
            .ok_or_else(|| RepositoryError::not_found("identity", "GIT_AUTHOR_EMAIL"))?;
        let timestamp = var("DATE")
            .or_else(|| fallback("DATE"))
            .and_then(|date| Self::parse_date(&date));

        Ok(match timestamp {
            Some(timestamp) => Self::with_timestamp(&name, &email, timestamp),
            None => Self::now(&name, &email),
        })
    }

    fn parse_date(date: &str) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc2822(date)
            .or_else(|_| DateTime::parse_from_str(date, "%Y-%m-%d %H:%M:%S %z"))
            .ok()
    }

    fn sanitize(value: &str) -> String {
        value
            .chars()
            .filter(|c| !matches!(c, '<' | '>' | '\n' | '\0'))
            .collect::<String>()
            .trim()
            .to_string()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset_minutes
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.offset_minutes * 60).unwrap_or(Utc.fix());
        DateTime::from_timestamp(self.time, 0)
            .unwrap_or_default()
            .with_timezone(&offset)
    }

    /// `Name <email>`
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// Timezone in git's `±hhmm` form
    pub fn offset_string(&self) -> String {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let minutes = self.offset_minutes.abs();
        format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
    }

    /// Human-readable timestamp, e.g. "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp()
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    /// Wire representation used inside commit and tag objects
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.time,
            self.offset_string()
        )
    }

    fn parse_offset(value: &str) -> Option<i32> {
        let (sign, digits) = match value.as_bytes().first()? {
            b'+' => (1, &value[1..]),
            b'-' => (-1, &value[1..]),
            _ => return None,
        };
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let hours = digits[..2].parse::<i32>().ok()?;
        let minutes = digits[2..].parse::<i32>().ok()?;
        Some(sign * (hours * 60 + minutes))
    }
}

impl TryFrom<&str> for Signature {
    type Error = RepositoryError;

    fn try_from(value: &str) -> Result<Self> {
        // Format: "name <email> timestamp timezone"
        // Split from the right to get timezone and timestamp first
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(RepositoryError::corrupt(format!(
                "invalid signature '{value}'"
            )));
        }

        let offset_minutes = Self::parse_offset(parts[0])
            .ok_or_else(|| RepositoryError::corrupt(format!("invalid timezone '{}'", parts[0])))?;
        let time = parts[1]
            .parse::<i64>()
            .map_err(|_| RepositoryError::corrupt(format!("invalid timestamp '{}'", parts[1])))?;
        let name_email = parts[2];

        let email_start = name_email
            .find('<')
            .ok_or_else(|| RepositoryError::corrupt("invalid signature: missing '<'"))?;
        let email_end = name_email
            .rfind('>')
            .filter(|end| *end > email_start)
            .ok_or_else(|| RepositoryError::corrupt("invalid signature: missing '>'"))?;

        Ok(Signature {
            name: name_email[..email_start].trim().to_string(),
            email: name_email[email_start + 1..email_end].to_string(),
            time,
            offset_minutes,
        })
    }
}
