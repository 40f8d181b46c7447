use chrono::{DateTime, Local, TimeZone};
use uuid::Uuid;

/// Id for a task whose document left `id` out: `task-<YYYYMMDDHHmmss>-<8 hex>`.
pub fn generate_task_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    task_id_at(&Local::now(), &suffix[..8])
}

fn task_id_at<Tz: TimeZone>(at: &DateTime<Tz>, suffix: &str) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("task-{}-{suffix}", at.format("%Y%m%d%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    #[test]
    fn id_embeds_timestamp_and_suffix() {
        let at = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(task_id_at(&at, "0badcafe"), "task-20260304050607-0badcafe");
    }

    #[test]
    fn generated_ids_match_the_task_id_pattern() {
        let id = generate_task_id();
        let (ts, hex) = id
            .strip_prefix("task-")
            .and_then(|rest| rest.split_once('-'))
            .unwrap();
        assert_eq!(ts.len(), 14);
        assert!(ts.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(hex.len(), 8);
        assert!(hex.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_ids_do_not_collide() {
        let ids: HashSet<String> = (0..200).map(|_| generate_task_id()).collect();
        assert_eq!(ids.len(), 200);
    }
}
