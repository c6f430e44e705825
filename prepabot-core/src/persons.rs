// File: src/persons.rs

use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use prepabot_common::models::PersonalInformation;
use prepabot_common::Error;

/// Read-only, file-backed people register. Another collaborator owns the
/// data; the bot only reads it at startup.
pub struct PersonStore {
    persons: Vec<PersonalInformation>,
}

impl PersonStore {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let persons: Vec<PersonalInformation> = serde_json::from_str(&raw)?;
        Ok(Self { persons })
    }

    pub fn from_records(persons: Vec<PersonalInformation>) -> Self {
        Self { persons }
    }

    pub fn len(&self) -> usize {
        self.persons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonalInformation> {
        self.persons.iter()
    }

    pub fn get(&self, user_id: u64) -> Option<&PersonalInformation> {
        self.persons.iter().find(|p| p.user_id == Some(user_id))
    }

    /// Whether the user's stored birthdate matches `today`. False when the
    /// user is unknown.
    pub fn is_birthday(&self, user_id: u64, today: NaiveDate) -> bool {
        self.get(user_id)
            .map(|p| p.has_birthday_on(today))
            .unwrap_or(false)
    }

    /// People ordered by next birthday occurrence: dates already passed this
    /// year roll over to next year.
    pub fn upcoming_birthdays(&self, today: NaiveDate) -> Vec<(&PersonalInformation, NaiveDate)> {
        let mut rows: Vec<(&PersonalInformation, NaiveDate)> = self
            .persons
            .iter()
            .map(|p| (p, next_occurrence(p.birthdate, today)))
            .collect();
        rows.sort_by_key(|(_, next)| *next);
        rows
    }
}

/// Next calendar occurrence of `birthdate` on or after `today`.
/// Feb 29 birthdays fall back to Mar 1 in non-leap years.
pub fn next_occurrence(birthdate: NaiveDate, today: NaiveDate) -> NaiveDate {
    let at_year = |year: i32| {
        NaiveDate::from_ymd_opt(year, birthdate.month(), birthdate.day())
            .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
            .unwrap_or(today)
    };

    let this_year = at_year(today.year());
    if this_year < today {
        at_year(today.year() + 1)
    } else {
        this_year
    }
}
