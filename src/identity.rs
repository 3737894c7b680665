//! Task identity: recyclable usage ids and permanent global ids.
//!
//! A usage id is the small number users type on the command line. It is unique
//! within one collection and is handed out again once the task holding it is
//! deleted. A global id is computed once, when the task is created, and never
//! changes afterwards; it is what correlates a task across journal and archive
//! and what names its note file.

use chrono::{Datelike, Local, NaiveDate, TimeZone};

/// Identifier of a task (usage id or global id).
pub type TaskId = u64;

/// Sentinel parent id meaning "no parent".
pub const NO_PARENT: TaskId = 0;

/// Multiplier that shifts the `YYYYMMDD` date above the 10 checksum digits.
const GLOBAL_ID_DATE_SHIFT: u64 = 10_000_000_000;

/// Return the smallest positive id that is not present in `existing`.
///
/// The scan walks the ids in ascending order and stops at the first gap, so
/// `{1,2,4}` yields 3, `{4,5}` yields 1 and `{1,2,3}` yields 4.
pub fn allocate_free_usage_id<I>(existing: I) -> TaskId
where
    I: IntoIterator<Item = TaskId>,
{
    let mut ids: Vec<TaskId> = existing.into_iter().collect();
    ids.sort_unstable();
    let mut free: TaskId = 1;
    for id in ids {
        if id < free {
            continue;
        }
        if id > free {
            return free;
        }
        free = id + 1;
    }
    free
}

/// Compute the permanent global id of a task.
///
/// The local creation date occupies the high-order digits and the CRC-32 of
/// `"{usage_id} [{timestamp}]: {description}"` the ten low-order digits.
pub fn compute_global_id(usage_id: TaskId, timestamp: i64, description: &str) -> TaskId {
    let fingerprint = format!("{usage_id} [{timestamp}]: {description}");
    let checksum = crc32fast::hash(fingerprint.as_bytes());
    date_int(timestamp) * GLOBAL_ID_DATE_SHIFT + u64::from(checksum)
}

/// Local calendar date of a unix timestamp.
pub fn local_date(timestamp: i64) -> Option<NaiveDate> {
    Local
        .timestamp_opt(timestamp, 0)
        .single()
        .map(|dt| dt.date_naive())
}

/// Integer form `YYYYMMDD` of the local date of `timestamp` (0 if unrepresentable).
pub fn date_int(timestamp: i64) -> u64 {
    match local_date(timestamp) {
        Some(date) => {
            let year = date.year().max(0) as u64;
            year * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day())
        }
        None => 0,
    }
}

/// Current time as unix seconds.
pub fn now_timestamp() -> i64 {
    Local::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_id_of_empty_set_is_one() {
        assert_eq!(allocate_free_usage_id(Vec::new()), 1);
    }

    #[test]
    fn free_id_fills_the_first_gap() {
        assert_eq!(allocate_free_usage_id(vec![1, 2, 4, 5, 6]), 3);
        assert_eq!(allocate_free_usage_id(vec![4, 5, 6, 8, 9]), 1);
        assert_eq!(allocate_free_usage_id(vec![6, 2, 1, 3]), 4);
    }

    #[test]
    fn free_id_without_gap_is_max_plus_one() {
        assert_eq!(allocate_free_usage_id(vec![1, 2, 3, 4, 5]), 6);
        assert_eq!(allocate_free_usage_id(vec![5, 3, 1, 2, 4]), 6);
    }

    #[test]
    fn free_id_is_never_in_the_input() {
        let sets: [&[TaskId]; 4] = [&[1], &[2], &[1, 3, 5, 7], &[2, 3, 4, 10, 11]];
        for set in sets {
            let free = allocate_free_usage_id(set.iter().copied());
            assert!(!set.contains(&free), "{free} found in {set:?}");
            assert!((1..free).all(|id| set.contains(&id)), "{free} is not the smallest for {set:?}");
        }
    }

    #[test]
    fn global_id_is_deterministic() {
        let a = compute_global_id(3, 1_700_000_000, "Write the docs");
        let b = compute_global_id(3, 1_700_000_000, "Write the docs");
        assert_eq!(a, b);
    }

    #[test]
    fn global_id_changes_with_each_input() {
        let base = compute_global_id(3, 1_700_000_000, "Write the docs");
        assert_ne!(base, compute_global_id(4, 1_700_000_000, "Write the docs"));
        assert_ne!(base, compute_global_id(3, 1_700_000_001, "Write the docs"));
        assert_ne!(base, compute_global_id(3, 1_700_000_000, "Write the doc"));
    }

    #[test]
    fn global_id_carries_the_date_in_high_digits() {
        let timestamp = 1_700_000_000;
        let gid = compute_global_id(1, timestamp, "task");
        assert_eq!(gid / GLOBAL_ID_DATE_SHIFT, date_int(timestamp));
        let checksum = crc32fast::hash(format!("1 [{timestamp}]: task").as_bytes());
        assert_eq!(gid % GLOBAL_ID_DATE_SHIFT, u64::from(checksum));
    }

    #[test]
    fn date_int_is_year_month_day() {
        let timestamp = 1_700_000_000;
        let date = local_date(timestamp).expect("valid date");
        let expected = format!("{:04}{:02}{:02}", date.year(), date.month(), date.day());
        assert_eq!(date_int(timestamp).to_string(), expected);
    }
}
