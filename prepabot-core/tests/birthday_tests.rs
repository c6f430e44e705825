// File: prepabot-core/tests/birthday_tests.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use prepabot_common::models::PersonalInformation;
use prepabot_common::Error;
use prepabot_core::persons::{next_occurrence, PersonStore};
use prepabot_core::tasks::birthday::{
    announce_birthdays, spawn_birthday_task, BirthdayNotifier, BirthdayTaskConfig,
};

fn person(user_id: Option<u64>, display: &str, year: i32, month: u32, day: u32) -> PersonalInformation {
    PersonalInformation {
        user_id,
        first_name: display.to_string(),
        display: display.to_string(),
        origin: "MP2I 2023".to_string(),
        birthdate: NaiveDate::from_ymd_opt(year, month, day).unwrap(),
    }
}

#[test]
fn birthday_matches_on_day_and_month_only() {
    let p = person(Some(1), "Alice", 2004, 5, 10);
    assert!(p.has_birthday_on(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap()));
    assert!(!p.has_birthday_on(NaiveDate::from_ymd_opt(2024, 5, 11).unwrap()));
    assert!(!p.has_birthday_on(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()));
}

#[test]
fn store_lookup_by_user_id() {
    let store = PersonStore::from_records(vec![
        person(Some(1), "Alice", 2004, 5, 10),
        person(None, "Bob", 2003, 1, 2),
    ]);

    let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    assert!(store.is_birthday(1, today));
    assert!(!store.is_birthday(2, today), "unknown user is never a birthday");
    assert_eq!(store.get(1).unwrap().display, "Alice");
    assert!(store.get(99).is_none());
}

#[test]
fn next_occurrence_rolls_passed_dates_to_next_year() {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    let upcoming = next_occurrence(NaiveDate::from_ymd_opt(2004, 7, 3).unwrap(), today);
    assert_eq!(upcoming, NaiveDate::from_ymd_opt(2024, 7, 3).unwrap());

    let passed = next_occurrence(NaiveDate::from_ymd_opt(2004, 2, 3).unwrap(), today);
    assert_eq!(passed, NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());

    // Today's own date counts as upcoming, not passed.
    let today_bd = next_occurrence(NaiveDate::from_ymd_opt(2002, 6, 1).unwrap(), today);
    assert_eq!(today_bd, today);
}

#[test]
fn upcoming_birthdays_sorted_by_next_occurrence() {
    let store = PersonStore::from_records(vec![
        person(Some(1), "Janvier", 2004, 1, 15),
        person(Some(2), "Juillet", 2004, 7, 15),
        person(Some(3), "Juin", 2004, 6, 20),
    ]);

    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let order: Vec<&str> = store
        .upcoming_birthdays(today)
        .into_iter()
        .map(|(p, _)| p.display.as_str())
        .collect();

    // June and July are still ahead this year; January rolled to 2025.
    assert_eq!(order, vec!["Juin", "Juillet", "Janvier"]);
}

#[test]
fn leap_day_falls_back_to_march_first() {
    let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
    let next = next_occurrence(NaiveDate::from_ymd_opt(2004, 2, 29).unwrap(), today);
    assert_eq!(next, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
}

/// Records announcements instead of talking to Discord.
#[derive(Default)]
struct RecordingNotifier {
    roles: HashMap<u64, Vec<u64>>,
    plain: Mutex<Vec<(u64, String)>>,
    with_button: Mutex<Vec<(u64, u64)>>,
}

#[async_trait]
impl BirthdayNotifier for RecordingNotifier {
    async fn member_roles(&self, _guild_id: u64, user_id: u64) -> Result<Option<Vec<u64>>, Error> {
        Ok(self.roles.get(&user_id).cloned())
    }

    async fn send_plain(&self, channel_id: u64, text: &str) -> Result<(), Error> {
        self.plain.lock().unwrap().push((channel_id, text.to_string()));
        Ok(())
    }

    async fn send_with_button(
        &self,
        channel_id: u64,
        _text: &str,
        user_id: u64,
    ) -> Result<(), Error> {
        self.with_button.lock().unwrap().push((channel_id, user_id));
        Ok(())
    }
}

fn paris() -> Tz {
    "Europe/Paris".parse().unwrap()
}

fn task_config() -> BirthdayTaskConfig {
    BirthdayTaskConfig {
        guild_id: 1,
        channel_id: 500,
        hour: 7,
        timezone: paris(),
        current_member_roles: vec![10],
    }
}

/// A birthdate in year 2000 (leap, so Feb 29 is constructible) landing on
/// today's Paris date.
fn birthdate_today() -> NaiveDate {
    let today = Utc::now().with_timezone(&paris()).date_naive();
    NaiveDate::from_ymd_opt(2000, today.month(), today.day()).unwrap()
}

#[tokio::test]
async fn current_students_get_the_button_and_alumni_do_not() {
    let bd = birthdate_today();
    let store = PersonStore::from_records(vec![
        PersonalInformation {
            user_id: Some(1),
            first_name: "Alice".into(),
            display: "Alice".into(),
            origin: "MP2I 2023".into(),
            birthdate: bd,
        },
        PersonalInformation {
            user_id: Some(2),
            first_name: "Bob".into(),
            display: "Bob".into(),
            origin: "MPI 2022".into(),
            birthdate: bd,
        },
        PersonalInformation {
            user_id: None,
            first_name: "Chloé".into(),
            display: "Chloé".into(),
            origin: "MP2I 2023".into(),
            birthdate: bd,
        },
        person(Some(4), "NotToday", 2004, 1, 1),
    ]);

    let mut notifier = RecordingNotifier::default();
    notifier.roles.insert(1, vec![10, 20]); // current student
    notifier.roles.insert(2, vec![99]); // alumnus

    announce_birthdays(&notifier, &store, &task_config())
        .await
        .unwrap();

    assert_eq!(*notifier.with_button.lock().unwrap(), vec![(500, 1)]);
    let plain = notifier.plain.lock().unwrap();
    assert_eq!(plain.len(), 2, "alumnus and unlinked person go without button");
    assert!(plain.iter().all(|(ch, _)| *ch == 500));
    assert!(plain.iter().any(|(_, text)| text.contains("Bob")));
    assert!(plain.iter().any(|(_, text)| text.contains("Chloé")));
}

#[tokio::test(start_paused = true)]
async fn birthday_task_checks_once_right_after_startup() {
    let store = Arc::new(PersonStore::from_records(vec![PersonalInformation {
        user_id: None,
        first_name: "Alice".into(),
        display: "Alice".into(),
        origin: "MP2I 2023".into(),
        birthdate: birthdate_today(),
    }]));
    let notifier = Arc::new(RecordingNotifier::default());

    let task = spawn_birthday_task(notifier.clone(), store, task_config());

    // No clock advance to the configured hour: the startup check alone
    // must already have announced.
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    assert_eq!(notifier.plain.lock().unwrap().len(), 1);

    task.abort();
}
