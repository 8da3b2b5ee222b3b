//! End-to-end generator tests against in-memory collaborators.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dormant_core::config::SchedulerConfig;
use dormant_core::course::{Meeting, Schedule, Section};
use dormant_core::types::UserId;
use dormant_scheduler::{
    ErrorKind, InMemorySectionRepository, RepositoryError, ScheduleGenerator, SchedulePersistence,
    SchedulerError, SectionRepository,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const MON: u8 = 1;
const TUE: u8 = 2;

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

fn section(id: &str, course: &str, day: u8, start: u16, end: u16) -> Section {
    Section::new(id, course).with_meeting(Meeting::new(day, start, end))
}

/// CS100 {A: Mon 9:00-9:50, B: Mon 10:00-10:50},
/// MATH100 {C: Mon 9:30-10:20, D: Tue 9:00-9:50}.
fn two_course_catalog() -> InMemorySectionRepository {
    InMemorySectionRepository::from_sections([
        section("A", "CS100", MON, 540, 590),
        section("B", "CS100", MON, 600, 650),
        section("C", "MATH100", MON, 570, 620),
        section("D", "MATH100", TUE, 540, 590),
    ])
}

fn generator(repo: impl SectionRepository + 'static) -> ScheduleGenerator {
    ScheduleGenerator::new(Arc::new(repo), SchedulerConfig::default())
}

fn section_ids(schedules: &[Schedule]) -> Vec<Vec<String>> {
    schedules
        .iter()
        .map(|s| s.section_ids().into_iter().map(String::from).collect())
        .collect()
}

struct FailingRepository;

#[async_trait]
impl SectionRepository for FailingRepository {
    async fn fetch_sections_for_courses(
        &self,
        _course_ids: &[String],
    ) -> Result<HashMap<String, Vec<Section>>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".into()))
    }
}

/// Answers only for the first requested course.
struct ForgetfulRepository;

#[async_trait]
impl SectionRepository for ForgetfulRepository {
    async fn fetch_sections_for_courses(
        &self,
        course_ids: &[String],
    ) -> Result<HashMap<String, Vec<Section>>, RepositoryError> {
        let mut map = HashMap::new();
        if let Some(first) = course_ids.first() {
            map.insert(first.clone(), vec![Section::new("1", first.as_str())]);
        }
        Ok(map)
    }
}

/// Never answers; used to exercise cancellation and the budget during the fetch.
struct StalledRepository;

#[async_trait]
impl SectionRepository for StalledRepository {
    async fn fetch_sections_for_courses(
        &self,
        _course_ids: &[String],
    ) -> Result<HashMap<String, Vec<Section>>, RepositoryError> {
        std::future::pending().await
    }
}

struct RecordingPersistence {
    tx: mpsc::UnboundedSender<(UserId, usize)>,
}

#[async_trait]
impl SchedulePersistence for RecordingPersistence {
    async fn save_generated(
        &self,
        user_id: &UserId,
        schedules: &[Schedule],
    ) -> Result<(), RepositoryError> {
        let _ = self.tx.send((user_id.clone(), schedules.len()));
        Ok(())
    }
}

#[tokio::test]
async fn two_courses_yield_exactly_the_compatible_pairs() {
    let gen = generator(two_course_catalog());
    let result = gen
        .generate(&ids(&["CS100", "MATH100"]), &UserId::from("u-1"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(section_ids(&result.schedules), vec![vec!["A", "D"], vec!["B", "D"]]);
    assert!(!result.truncated);
    assert_eq!(result.stats.search_space, 4);
    assert_eq!(result.schedules[0].name, "Schedule 1");
    assert!(result.schedules.iter().all(|s| s.user_id == "u-1"));
    assert_ne!(result.schedules[0].id, result.schedules[1].id);
}

#[tokio::test]
async fn course_without_sections_is_an_empty_success() {
    let gen = generator(two_course_catalog());
    let result = gen
        .generate(&ids(&["CS100", "ART999"]), &UserId::new(), &CancellationToken::new())
        .await
        .unwrap();
    assert!(result.schedules.is_empty());
    assert!(!result.truncated);
}

#[tokio::test]
async fn too_many_courses_is_an_input_error() {
    let gen = generator(two_course_catalog());
    let eight: Vec<String> = (0..8).map(|i| format!("C{i}")).collect();
    let err = gen
        .generate(&eight, &UserId::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::TooManyCourses { requested: 8, max: 7 }));
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[tokio::test]
async fn empty_request_is_rejected() {
    let gen = generator(two_course_catalog());
    let err = gen
        .generate(&[], &UserId::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Input);
}

#[tokio::test]
async fn repository_failure_is_upstream() {
    let gen = generator(FailingRepository);
    let err = gen
        .generate(&ids(&["CS100"]), &UserId::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Repository(_)));
    assert_eq!(err.kind(), ErrorKind::Upstream);
}

#[tokio::test]
async fn omitted_course_is_upstream() {
    let gen = generator(ForgetfulRepository);
    let err = gen
        .generate(&ids(&["CS100", "MATH100"]), &UserId::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::MissingCourse { ref course_id } if course_id == "MATH100"));
    assert_eq!(err.kind(), ErrorKind::Upstream);
}

#[tokio::test]
async fn malformed_meeting_is_upstream() {
    let repo = InMemorySectionRepository::from_sections([section("X", "CS100", MON, 700, 600)]);
    let err = generator(repo)
        .generate(&ids(&["CS100"]), &UserId::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidSectionData(_)));
}

#[tokio::test]
async fn pre_cancelled_request_returns_cancelled() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = generator(two_course_catalog())
        .generate(&ids(&["CS100", "MATH100"]), &UserId::new(), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Cancelled));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn cancel_while_fetching() {
    let gen = generator(StalledRepository);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(5),
        gen.generate(&ids(&["CS100"]), &UserId::new(), &cancel),
    )
    .await
    .expect("generate should observe cancellation")
    .unwrap_err();
    assert!(matches!(err, SchedulerError::Cancelled));
}

#[tokio::test]
async fn zero_budget_times_out() {
    let config = SchedulerConfig {
        search_timeout_ms: 0,
        ..SchedulerConfig::default()
    };
    let gen = ScheduleGenerator::new(Arc::new(two_course_catalog()), config);
    let err = gen
        .generate(&ids(&["CS100", "MATH100"]), &UserId::new(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Timeout { ms: 0 }));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn stalled_fetch_runs_out_of_budget() {
    let config = SchedulerConfig {
        search_timeout_ms: 50,
        ..SchedulerConfig::default()
    };
    let gen = ScheduleGenerator::new(Arc::new(StalledRepository), config);

    let err = tokio::time::timeout(
        Duration::from_secs(2),
        gen.generate(&ids(&["CS100"]), &UserId::new(), &CancellationToken::new()),
    )
    .await
    .expect("fetch should be bounded by the time budget")
    .unwrap_err();
    assert!(matches!(err, SchedulerError::Timeout { ms: 50 }));
    assert_eq!(err.kind(), ErrorKind::Cancelled);
}

#[tokio::test]
async fn cap_truncates_to_a_stable_prefix() {
    // Three courses, four non-clashing sections each: 64 schedules.
    let mut repo = InMemorySectionRepository::new();
    for (c, day) in [("C1", 1u8), ("C2", 2), ("C3", 3)] {
        for i in 0..4u16 {
            repo.insert(section(&format!("{c}-{i}"), c, day, 480 + i * 60, 530 + i * 60));
        }
    }
    let uncapped = ScheduleGenerator::new(Arc::new(repo.clone()), SchedulerConfig::default());
    let capped = ScheduleGenerator::new(
        Arc::new(repo),
        SchedulerConfig {
            max_results: 10,
            ..SchedulerConfig::default()
        },
    );
    let courses = ids(&["C1", "C2", "C3"]);

    let full = uncapped
        .generate(&courses, &UserId::new(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(full.schedules.len(), 64);
    assert!(!full.truncated);

    let cut = capped
        .generate(&courses, &UserId::new(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(cut.schedules.len(), 10);
    assert!(cut.truncated);
    assert_eq!(section_ids(&cut.schedules), section_ids(&full.schedules[..10]));
}

#[tokio::test]
async fn repeated_requests_are_deterministic() {
    let gen = generator(two_course_catalog());
    let courses = ids(&["MATH100", "CS100"]);
    let first = gen
        .generate(&courses, &UserId::new(), &CancellationToken::new())
        .await
        .unwrap();
    let second = gen
        .generate(&courses, &UserId::new(), &CancellationToken::new())
        .await
        .unwrap();

    // Sections follow request order, so MATH100 comes first.
    assert_eq!(section_ids(&first.schedules), vec![vec!["D", "A"], vec!["D", "B"]]);
    assert_eq!(section_ids(&first.schedules), section_ids(&second.schedules));
}

#[tokio::test]
async fn generated_schedules_are_handed_off() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let gen = ScheduleGenerator::new(
        Arc::new(two_course_catalog()),
        SchedulerConfig {
            persist_generated: true,
            ..SchedulerConfig::default()
        },
    )
    .with_persistence(Arc::new(RecordingPersistence { tx }));

    let user = UserId::from("u-42");
    let result = gen
        .generate(&ids(&["CS100", "MATH100"]), &user, &CancellationToken::new())
        .await
        .unwrap();

    let (saved_for, count) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("persistence was not called")
        .expect("channel closed");
    assert_eq!(saved_for, user);
    assert_eq!(count, result.schedules.len());
}

#[tokio::test]
async fn hand_off_is_skipped_when_disabled() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = SchedulerConfig {
        persist_generated: false,
        ..SchedulerConfig::default()
    };
    let gen = ScheduleGenerator::new(Arc::new(two_course_catalog()), config)
        .with_persistence(Arc::new(RecordingPersistence { tx }));

    gen.generate(&ids(&["CS100", "MATH100"]), &UserId::new(), &CancellationToken::new())
        .await
        .unwrap();
    drop(gen);

    // Sender dropped with the generator and nothing was sent.
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn infeasible_generation_clears_previous_set() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let repo = InMemorySectionRepository::from_sections([
        section("A", "CS100", MON, 540, 590),
        section("E", "ENGL100", TUE, 600, 650),
        section("M", "MATH100", MON, 560, 600),
    ]);
    let gen = ScheduleGenerator::new(
        Arc::new(repo),
        SchedulerConfig {
            persist_generated: true,
            ..SchedulerConfig::default()
        },
    )
    .with_persistence(Arc::new(RecordingPersistence { tx }));
    let user = UserId::from("u-7");
    let cancel = CancellationToken::new();

    let mut handed_off = Vec::new();
    for courses in [["CS100", "ENGL100"], ["CS100", "MATH100"]] {
        gen.generate(&ids(&courses), &user, &cancel).await.unwrap();
        let (_, count) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("persistence was not called")
            .expect("channel closed");
        handed_off.push(count);
    }
    assert_eq!(handed_off, [1, 0]);
}
