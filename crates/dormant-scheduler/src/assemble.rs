use dormant_core::course::Schedule;
use dormant_core::types::{ScheduleId, UserId};

use crate::types::{Combination, CourseBucket};

/// Turn search results into schedule records owned by `user_id`.
///
/// Each schedule gets a fresh UUIDv7, the name `Schedule N` (1-based, in
/// emission order) and its sections in requested-course order. No conflict
/// re-check happens here: combinations come straight from the search.
pub fn assemble(
    buckets: &[CourseBucket],
    combinations: &[Combination],
    user_id: &UserId,
) -> Vec<Schedule> {
    combinations
        .iter()
        .enumerate()
        .map(|(n, combo)| Schedule {
            id: ScheduleId::new().into_string(),
            user_id: user_id.to_string(),
            name: format!("Schedule {}", n + 1),
            sections: combo.sections(buckets).into_iter().cloned().collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use dormant_core::course::Section;

    use super::*;

    fn buckets() -> Vec<CourseBucket> {
        vec![
            CourseBucket::new(
                "CS100",
                vec![Section::new("A", "CS100"), Section::new("B", "CS100")],
            ),
            CourseBucket::new("MATH100", vec![Section::new("D", "MATH100")]),
        ]
    }

    #[test]
    fn sections_follow_course_order() {
        let buckets = buckets();
        let combos = vec![Combination(vec![1, 0]), Combination(vec![0, 0])];
        let schedules = assemble(&buckets, &combos, &UserId::from("u-1"));

        assert_eq!(schedules.len(), 2);
        assert_eq!(schedules[0].section_ids(), vec!["B", "D"]);
        assert_eq!(schedules[1].section_ids(), vec!["A", "D"]);
        assert_eq!(schedules[0].name, "Schedule 1");
        assert_eq!(schedules[1].name, "Schedule 2");
        assert!(schedules.iter().all(|s| s.user_id == "u-1"));
    }

    #[test]
    fn identifiers_are_unique_within_request() {
        let buckets = buckets();
        let combos: Vec<_> = (0..50).map(|i| Combination(vec![i % 2, 0])).collect();
        let schedules = assemble(&buckets, &combos, &UserId::from("u-1"));
        let ids: HashSet<_> = schedules.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn no_combinations_no_schedules() {
        assert!(assemble(&buckets(), &[], &UserId::from("u-1")).is_empty());
    }
}
