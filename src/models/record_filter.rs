use std::{fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};

use super::TokenClaim;

/// A calendar month such as `2024-05`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Month {
    first_day: NaiveDate,
}

impl Month {
    /// First day of the month, inclusive
    pub fn start(&self) -> NaiveDate {
        self.first_day
    }

    /// First day of the following month, exclusive
    pub fn end(&self) -> NaiveDate {
        let (year, month) = match self.first_day.month() {
            12 => (self.first_day.year() + 1, 1),
            m => (self.first_day.year(), m + 1),
        };
        // day 1 of a valid month always exists
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date < self.end()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.first_day.year(), self.first_day.month())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct InvalidMonth;

impl FromStr for Month {
    type Err = InvalidMonth;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s.trim().split_once('-').ok_or(InvalidMonth)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(InvalidMonth);
        }
        if !year.bytes().chain(month.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(InvalidMonth);
        }
        let year: i32 = year.parse().map_err(|_| InvalidMonth)?;
        let month: u32 = month.parse().map_err(|_| InvalidMonth)?;
        let first_day = NaiveDate::from_ymd_opt(year, month, 1).ok_or(InvalidMonth)?;
        Ok(Month { first_day })
    }
}

/// Criteria for listing records. Every field that is set narrows the result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub user_id: Option<i32>,
    pub date: Option<NaiveDate>,
    pub month: Option<Month>,
    pub search: Option<String>,
}

/// Outcome of restricting a filter to what the caller may see
#[derive(Debug, PartialEq, Eq)]
pub enum Scope {
    Allowed(RecordFilter),
    Forbidden,
}

impl RecordFilter {
    pub fn for_user(user_id: i32) -> Self {
        RecordFilter {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }

    pub fn with_month(mut self, month: Option<Month>) -> Self {
        self.month = month;
        self
    }

    /// Blank search text is ignored
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self
    }

    /// Admins keep the filter as asked. Anyone else is pinned to their own records,
    /// and naming another user is forbidden.
    pub fn scoped_to(mut self, caller: &TokenClaim) -> Scope {
        if caller.is_admin() {
            return Scope::Allowed(self);
        }
        match self.user_id {
            Some(id) if id != caller.id => Scope::Forbidden,
            _ => {
                self.user_id = Some(caller.id);
                Scope::Allowed(self)
            }
        }
    }
}

/// Escapes `%`, `_` and `\` so the needle matches literally inside a LIKE pattern
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_covers_half_open_range() {
        let may: Month = "2024-05".parse().unwrap();
        assert_eq!(may.start(), date(2024, 5, 1));
        assert_eq!(may.end(), date(2024, 6, 1));
        assert!(may.contains(date(2024, 5, 1)));
        assert!(may.contains(date(2024, 5, 31)));
        assert!(!may.contains(date(2024, 6, 1)));
        assert!(!may.contains(date(2024, 4, 30)));
        assert_eq!(may.to_string(), "2024-05");
    }

    #[test]
    fn december_rolls_into_next_year() {
        let december: Month = "2023-12".parse().unwrap();
        assert_eq!(december.end(), date(2024, 1, 1));
    }

    #[test]
    fn rejects_malformed_months() {
        for input in ["2024-13", "2024-00", "2024-5", "24-05", "2024/05", "2024-05-01", "", "abcd-ef"] {
            assert_eq!(input.parse::<Month>(), Err(InvalidMonth), "{input}");
        }
    }

    #[test]
    fn admin_scope_is_unchanged() {
        let admin = TokenClaim::new(1, Role::Admin, Utc::now());
        let filter = RecordFilter::for_user(7);
        assert_eq!(filter.clone().scoped_to(&admin), Scope::Allowed(filter));
        assert_eq!(
            RecordFilter::default().scoped_to(&admin),
            Scope::Allowed(RecordFilter::default())
        );
    }

    #[test]
    fn user_is_pinned_to_own_records() {
        let caller = TokenClaim::new(3, Role::User, Utc::now());
        assert_eq!(
            RecordFilter::default().scoped_to(&caller),
            Scope::Allowed(RecordFilter::for_user(3))
        );
        assert_eq!(
            RecordFilter::for_user(3).scoped_to(&caller),
            Scope::Allowed(RecordFilter::for_user(3))
        );
    }

    #[test]
    fn user_asking_for_someone_else_is_forbidden() {
        let caller = TokenClaim::new(3, Role::User, Utc::now());
        assert_eq!(RecordFilter::for_user(4).scoped_to(&caller), Scope::Forbidden);
    }

    #[test]
    fn blank_search_is_dropped() {
        let filter = RecordFilter::default().with_search(Some("   ".to_string()));
        assert_eq!(filter.search, None);
        let filter = RecordFilter::default().with_search(Some(" report ".to_string()));
        assert_eq!(filter.search.as_deref(), Some("report"));
    }

    #[test]
    fn escapes_like_wildcards() {
        assert_eq!(escape_like("50%_done\\"), "50\\%\\_done\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
