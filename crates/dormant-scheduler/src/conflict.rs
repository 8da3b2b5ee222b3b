use dormant_core::course::{Meeting, Section};

/// Whether two weekly meetings overlap.
///
/// Meetings on different days never collide. On the same day the meetings
/// are half-open intervals `[start, end)`, so one ending exactly when the
/// other begins is not a conflict.
#[inline]
pub fn conflicts(a: &Meeting, b: &Meeting) -> bool {
    if a.day != b.day {
        return false;
    }
    a.start_time < b.end_time && b.start_time < a.end_time
}

/// Whether any meeting of `a` overlaps any meeting of `b`.
///
/// Short-circuits on the first hit. A section without meetings (async)
/// never conflicts with anything.
pub fn sections_conflict(a: &Section, b: &Section) -> bool {
    first_conflict(a, b).is_some()
}

/// The first overlapping meeting pair between two sections, in meeting order.
pub fn first_conflict<'a>(a: &'a Section, b: &'a Section) -> Option<(&'a Meeting, &'a Meeting)> {
    a.meetings
        .iter()
        .find_map(|ma| b.meetings.iter().find(|mb| conflicts(ma, mb)).map(|mb| (ma, mb)))
}
