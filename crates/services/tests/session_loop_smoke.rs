use std::sync::Arc;

use quiz_core::model::{Question, QuestionId, Subject, TestDraft, TestId, User, UserId, UserRole};
use quiz_core::time::fixed_now;
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{
    AppServices, Clock, ExpiryPolicy, ProfileUpdate, QuizConfig, SessionError, SessionEvent,
    SessionIntent, SessionLoopService, SessionState, SessionView,
};
use storage::repository::{InMemoryRepository, ResultRepository, TestRepository, UserRepository};

async fn seeded_repo() -> (InMemoryRepository, TestId, UserId) {
    let repo = InMemoryRepository::new();
    let draft = TestDraft {
        title: "Present Simple Quiz".into(),
        subject: Subject::English,
        grade: 6,
        duration_minutes: 1,
        questions: vec![
            Question::new(
                QuestionId::new(1),
                "He ___ to school every day.",
                vec!["go".into(), "goes".into(), "going".into(), "went".into()],
                1,
            )
            .unwrap(),
            Question::new(
                QuestionId::new(2),
                "They ___ football on Sundays.",
                vec!["play".into(), "plays".into(), "playing".into(), "player".into()],
                0,
            )
            .unwrap(),
        ],
    };
    let test_id = repo.insert_new_test(&draft).await.unwrap();

    let user_id = UserId::new(42);
    let user = User::new(user_id, UserRole::Student, "Ali", Some(6), None).unwrap();
    repo.upsert_user(&user).await.unwrap();

    (repo, test_id, user_id)
}

fn loop_service(repo: &InMemoryRepository) -> SessionLoopService {
    SessionLoopService::new(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

#[tokio::test]
async fn answering_everything_correctly_persists_and_credits() {
    let (repo, test_id, user_id) = seeded_repo().await;
    let svc = loop_service(&repo);

    let mut session = svc
        .start_session_with_rng(test_id, user_id, &mut StdRng::seed_from_u64(11))
        .await
        .unwrap();

    loop {
        let correct = session.current_question().unwrap().correct_index();
        svc.dispatch(&mut session, SessionIntent::SelectOption(correct))
            .await
            .unwrap();
        if SessionView::from_session(&session).can_submit() {
            break;
        }
        assert_eq!(
            svc.dispatch(&mut session, SessionIntent::Next).await.unwrap(),
            SessionEvent::Updated
        );
    }

    let event = svc
        .dispatch(&mut session, SessionIntent::Submit)
        .await
        .unwrap();
    let SessionEvent::Finished(outcome) = event else {
        panic!("expected finished, got {event:?}");
    };
    assert_eq!(outcome.result.score(), 2);
    assert_eq!(outcome.result.total_questions(), 2);
    assert_eq!(outcome.result.subject(), Subject::English);
    assert_eq!(outcome.result.completed_at(), fixed_now());
    assert_eq!(outcome.points_awarded, 10);
    assert_eq!(outcome.total_points, 10);
    assert_eq!(session.state(), SessionState::Finished);

    let stored = repo.list_user_results(user_id).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, outcome.result_id);
    assert_eq!(repo.get_user(user_id).await.unwrap().unwrap().points(), 10);
}

#[tokio::test]
async fn finishing_twice_is_a_no_op() {
    let (repo, test_id, user_id) = seeded_repo().await;
    let svc = loop_service(&repo);
    let mut session = svc.start_session(test_id, user_id).await.unwrap();

    let first = svc.finish(&mut session).await.unwrap();
    let second = svc.finish(&mut session).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.result.score(), 0);

    assert_eq!(repo.list_user_results(user_id).await.unwrap().len(), 1);
    assert_eq!(repo.get_user(user_id).await.unwrap().unwrap().points(), 0);

    assert!(matches!(
        svc.dispatch(&mut session, SessionIntent::SelectOption(0))
            .await,
        Err(SessionError::Finished)
    ));
    assert_eq!(
        svc.dispatch(&mut session, SessionIntent::Tick).await.unwrap(),
        SessionEvent::Unchanged
    );
}

#[tokio::test]
async fn unknown_test_is_not_found() {
    let (repo, _test_id, user_id) = seeded_repo().await;
    let svc = loop_service(&repo);
    let err = svc
        .start_session(TestId::new(999), user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::TestNotFound(id) if id == TestId::new(999)));
}

#[tokio::test]
async fn expiry_auto_submits_by_default() {
    let (repo, test_id, user_id) = seeded_repo().await;
    let svc = loop_service(&repo);
    let mut session = svc.start_session(test_id, user_id).await.unwrap();

    let correct = session.current_question().unwrap().correct_index();
    session.select_option(correct).unwrap();

    for _ in 0..59 {
        assert_eq!(
            svc.tick(&mut session).await.unwrap(),
            SessionEvent::Updated
        );
    }
    let event = svc.tick(&mut session).await.unwrap();
    let SessionEvent::Finished(outcome) = event else {
        panic!("expected auto-submit, got {event:?}");
    };
    assert_eq!(outcome.result.score(), 1);
    assert_eq!(repo.get_user(user_id).await.unwrap().unwrap().points(), 5);
}

#[tokio::test]
async fn overtime_policy_keeps_the_session_open() {
    let (repo, test_id, user_id) = seeded_repo().await;
    let svc = loop_service(&repo).with_expiry_policy(ExpiryPolicy::AllowOvertime);
    let mut session = svc.start_session(test_id, user_id).await.unwrap();

    for _ in 0..59 {
        svc.tick(&mut session).await.unwrap();
    }
    assert_eq!(
        svc.tick(&mut session).await.unwrap(),
        SessionEvent::Overtime
    );
    assert_eq!(session.remaining_secs(), 0);
    assert_eq!(session.state(), SessionState::Active);
    session.select_option(0).unwrap();
    assert!(repo.list_user_results(user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn abandoning_leaves_the_store_untouched() {
    let (repo, test_id, user_id) = seeded_repo().await;
    let svc = loop_service(&repo);
    let mut session = svc.start_session(test_id, user_id).await.unwrap();
    session.select_option(0).unwrap();
    session.abandon();

    assert!(repo.list_user_results(user_id).await.unwrap().is_empty());
    assert_eq!(repo.get_user(user_id).await.unwrap().unwrap().points(), 0);
}

#[tokio::test]
async fn registered_student_keeps_points_across_a_profile_edit() {
    let app = AppServices::in_memory(&QuizConfig::default(), Clock::fixed(fixed_now()));
    let test_id = app
        .catalog()
        .create_test(TestDraft {
            title: "Alifbo quvonchi".into(),
            subject: Subject::NativeLanguage,
            grade: 1,
            duration_minutes: 5,
            questions: vec![
                Question::new(
                    QuestionId::new(1),
                    "\"Olma\" so'zi qaysi harf bilan boshlanadi?",
                    vec!["O".into(), "A".into(), "L".into()],
                    0,
                )
                .unwrap(),
            ],
        })
        .await
        .unwrap();

    let user_id = UserId::new(21);
    let profiles = app.profiles();
    profiles
        .register(
            user_id,
            ProfileUpdate {
                display_name: "Zarina".into(),
                grade: Some(1),
                avatar: None,
            },
        )
        .await
        .unwrap();

    let svc = app.session_loop();
    let mut session = svc.start_session(test_id, user_id).await.unwrap();
    let correct = session.current_question().unwrap().correct_index();
    session.select_option(correct).unwrap();
    assert_eq!(svc.finish(&mut session).await.unwrap().total_points, 5);

    let edited = profiles
        .update_profile(
            user_id,
            ProfileUpdate {
                display_name: "Zarina Aliyeva".into(),
                grade: Some(2),
                avatar: Some("👧".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.points(), 5);
    assert_eq!(app.leaderboard().rank_of(user_id).await.unwrap(), Some(1));
}
