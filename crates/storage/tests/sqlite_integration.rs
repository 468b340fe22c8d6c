use chrono::Duration;
use quiz_core::model::{
    Question, QuestionId, Subject, SubmissionKey, Test, TestDraft, TestId, TestResult, User,
    UserId, UserRole,
};
use quiz_core::scoring::Score;
use quiz_core::time::fixed_now;
use storage::repository::{
    ResultRepository, StorageError, TestRepository, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn draft(title: &str, subject: Subject) -> TestDraft {
    TestDraft {
        title: title.into(),
        subject,
        grade: 5,
        duration_minutes: 10,
        questions: vec![
            Question::new(
                QuestionId::new(1),
                "2 + 2?",
                vec!["3".into(), "4".into(), "5".into()],
                1,
            )
            .unwrap(),
            Question::new(
                QuestionId::new(2),
                "3 * 3?",
                vec!["9".into(), "6".into()],
                0,
            )
            .unwrap(),
        ],
    }
}

fn student(id: u64, name: &str) -> User {
    User::new(UserId::new(id), UserRole::Student, name, Some(5), None).unwrap()
}

#[tokio::test]
async fn tests_roundtrip_with_questions() {
    let repo = connect("memdb_tests_roundtrip").await;

    let id = repo
        .insert_new_test(&draft("Kasrlar", Subject::Math))
        .await
        .expect("insert");
    let fetched = repo.get_test(id).await.unwrap().expect("present");
    assert_eq!(fetched.title(), "Kasrlar");
    assert_eq!(fetched.subject(), Subject::Math);
    assert_eq!(fetched.question_count(), 2);
    assert_eq!(fetched.questions()[0].correct_index(), 1);

    let mut edited = fetched.to_draft();
    edited.title = "Kasrlar 2".into();
    let updated = Test::new(id, edited).unwrap();
    repo.upsert_test(&updated).await.unwrap();
    assert_eq!(repo.list_tests().await.unwrap(), vec![updated]);

    repo.delete_test(id).await.unwrap();
    assert!(repo.get_test(id).await.unwrap().is_none());
    assert!(matches!(
        repo.delete_test(id).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn results_list_newest_first_and_clear() {
    let repo = connect("memdb_results_order").await;
    let user = UserId::new(7);
    let test = TestId::new(1);

    let older = TestResult::new(
        user,
        test,
        Subject::Physics,
        Score { correct: 1, total: 2 },
        fixed_now(),
    )
    .unwrap();
    let newer = TestResult::new(
        user,
        test,
        Subject::Physics,
        Score { correct: 2, total: 2 },
        fixed_now() + Duration::minutes(5),
    )
    .unwrap();
    let other = TestResult::new(
        UserId::new(8),
        test,
        Subject::Physics,
        Score { correct: 0, total: 2 },
        fixed_now() + Duration::minutes(1),
    )
    .unwrap();

    let first = repo
        .append_result(SubmissionKey::generate(), &older)
        .await
        .unwrap();
    let second = repo
        .append_result(SubmissionKey::generate(), &newer)
        .await
        .unwrap();
    repo.append_result(SubmissionKey::generate(), &other)
        .await
        .unwrap();
    assert_ne!(first, second);

    let mine = repo.list_user_results(user).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0].id, second);
    assert_eq!(mine[0].result.score(), 2);
    assert_eq!(mine[0].result.completed_at(), newer.completed_at());

    let recent = repo.list_recent_results(2).await.unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[1].result.user_id(), UserId::new(8));

    assert_eq!(repo.clear_results().await.unwrap(), 3);
    assert!(repo.list_recent_results(5).await.unwrap().is_empty());
}

#[tokio::test]
async fn credit_points_accumulates_and_ranks() {
    let repo = connect("memdb_user_points").await;
    for (id, name) in [(1, "Ali"), (2, "Vali"), (3, "Guli")] {
        repo.upsert_user(&student(id, name)).await.unwrap();
    }

    assert_eq!(repo.credit_points(UserId::new(2), 10).await.unwrap(), 10);
    assert_eq!(repo.credit_points(UserId::new(2), 5).await.unwrap(), 15);
    assert_eq!(repo.credit_points(UserId::new(3), 15).await.unwrap(), 15);
    assert!(matches!(
        repo.credit_points(UserId::new(99), 5).await,
        Err(StorageError::NotFound)
    ));

    let ranked = repo.list_users_by_points(10).await.unwrap();
    let ids: Vec<u64> = ranked.iter().map(|u| u.id().value()).collect();
    assert_eq!(ids, vec![2, 3, 1]);

    assert_eq!(repo.reset_points().await.unwrap(), 3);
    let reloaded = repo.get_user(UserId::new(2)).await.unwrap().unwrap();
    assert_eq!(reloaded.points(), 0);
    assert_eq!(reloaded.display_name(), "Vali");
}

#[tokio::test]
async fn deleted_ids_are_not_reused() {
    let repo = connect("memdb_id_reuse").await;

    repo.insert_new_test(&draft("Birinchi", Subject::Math))
        .await
        .unwrap();
    let last = repo
        .insert_new_test(&draft("Ikkinchi", Subject::Math))
        .await
        .unwrap();
    repo.delete_test(last).await.unwrap();
    let next = repo
        .insert_new_test(&draft("Uchinchi", Subject::Math))
        .await
        .unwrap();
    assert!(next > last);

    let result = TestResult::new(
        UserId::new(1),
        next,
        Subject::Math,
        Score { correct: 1, total: 2 },
        fixed_now(),
    )
    .unwrap();
    let before = repo
        .append_result(SubmissionKey::generate(), &result)
        .await
        .unwrap();
    repo.clear_results().await.unwrap();
    let after = repo
        .append_result(SubmissionKey::generate(), &result)
        .await
        .unwrap();
    assert!(after > before);
}

#[tokio::test]
async fn replayed_submission_key_keeps_one_row() {
    let repo = connect("memdb_submission_key").await;
    let result = TestResult::new(
        UserId::new(4),
        TestId::new(1),
        Subject::English,
        Score { correct: 2, total: 2 },
        fixed_now(),
    )
    .unwrap();

    let key = SubmissionKey::generate();
    let first = repo.append_result(key, &result).await.unwrap();
    let replay = repo.append_result(key, &result).await.unwrap();
    assert_eq!(first, replay);
    assert_eq!(repo.list_user_results(UserId::new(4)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn profile_update_leaves_points_alone() {
    let repo = connect("memdb_profile_update").await;
    let registered = student(5, "Malika");
    repo.insert_new_user(&registered).await.unwrap();
    assert!(matches!(
        repo.insert_new_user(&registered).await,
        Err(StorageError::Conflict)
    ));

    repo.credit_points(UserId::new(5), 20).await.unwrap();
    let edited = registered
        .with_profile("Malika Karimova", Some(9), Some("🦋".into()))
        .unwrap();
    repo.update_profile(&edited).await.unwrap();

    let stored = repo.get_user(UserId::new(5)).await.unwrap().unwrap();
    assert_eq!(stored.display_name(), "Malika Karimova");
    assert_eq!(stored.grade(), Some(9));
    assert_eq!(stored.avatar(), Some("🦋"));
    assert_eq!(stored.points(), 20);

    assert!(matches!(
        repo.update_profile(&student(77, "Nobody")).await,
        Err(StorageError::NotFound)
    ));
}

#[tokio::test]
async fn credit_points_saturates_at_u32_max() {
    let repo = connect("memdb_points_clamp").await;
    let user = User::from_persisted(
        UserId::new(6),
        UserRole::Student,
        "Bobur",
        Some(8),
        None,
        u32::MAX - 2,
    )
    .unwrap();
    repo.upsert_user(&user).await.unwrap();

    assert_eq!(repo.credit_points(UserId::new(6), 5).await.unwrap(), u32::MAX);
    let stored = repo.get_user(UserId::new(6)).await.unwrap().unwrap();
    assert_eq!(stored.points(), u32::MAX);
}
