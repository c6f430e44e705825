use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One record of the read-only people register. Owned by another
/// collaborator; this crate only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalInformation {
    /// Discord snowflake; absent for people who never joined the guild.
    pub user_id: Option<u64>,

    pub first_name: String,

    /// How the person is shown in announcements.
    pub display: String,

    /// Cohort label ("MP2I 2023", ...), free-form.
    #[serde(default)]
    pub origin: String,

    pub birthdate: NaiveDate,
}

impl PersonalInformation {
    /// Whether the stored birthdate's day and month match the given date.
    pub fn has_birthday_on(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        self.birthdate.day() == date.day() && self.birthdate.month() == date.month()
    }
}
