use curio_core::db::open_db_in_memory;
use curio_core::{
    AcceptService, InteractionPolicy, PostService, ServiceError, SqliteUserRepository, UserId,
    UserRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Thread {
    asker: UserId,
    answerer: UserId,
    question: curio_core::Question,
    answer: curio_core::Answer,
}

fn seed_thread(conn: &Connection) -> Thread {
    let posts = PostService::new(conn);
    let asker = posts.register_user("asker").unwrap();
    let answerer = posts.register_user("answerer").unwrap();
    let question = posts
        .post_question(asker.uuid, "wal checkpoints", "when does WAL checkpoint?")
        .unwrap();
    let answer = posts
        .post_answer(question.uuid, answerer.uuid, "on the default autocheckpoint")
        .unwrap();
    Thread {
        asker: asker.uuid,
        answerer: answerer.uuid,
        question,
        answer,
    }
}

fn reputation_of(conn: &Connection, user: UserId) -> i64 {
    let users = SqliteUserRepository::try_new(conn).unwrap();
    users.get_user(user).unwrap().unwrap().reputation
}

#[test]
fn author_accepts_an_answer_and_the_answerer_earns_the_bonus() {
    let conn = open_db_in_memory().unwrap();
    let thread = seed_thread(&conn);

    let question = AcceptService::new(&conn)
        .accept_answer(thread.question.uuid, thread.answer.uuid, thread.asker)
        .unwrap();

    assert_eq!(question.accepted_answer_uuid, Some(thread.answer.uuid));
    assert_eq!(reputation_of(&conn, thread.answerer), 15);
}

#[test]
fn only_the_question_author_may_accept() {
    let conn = open_db_in_memory().unwrap();
    let thread = seed_thread(&conn);

    let err = AcceptService::new(&conn)
        .accept_answer(thread.question.uuid, thread.answer.uuid, thread.answerer)
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotAuthorized { .. }));
    assert_eq!(reputation_of(&conn, thread.answerer), 0);
}

#[test]
fn accepting_an_answer_of_a_different_question_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let thread = seed_thread(&conn);
    let posts = PostService::new(&conn);

    let other_question = posts
        .post_question(thread.asker, "other", "unrelated question")
        .unwrap();
    let stray = posts
        .post_answer(other_question.uuid, thread.answerer, "stray answer")
        .unwrap();

    let err = AcceptService::new(&conn)
        .accept_answer(thread.question.uuid, stray.uuid, thread.asker)
        .unwrap_err();
    assert!(matches!(err, ServiceError::AnswerNotFound(id) if id == stray.uuid));
}

#[test]
fn accepting_a_missing_answer_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let thread = seed_thread(&conn);

    let ghost = Uuid::new_v4();
    let err = AcceptService::new(&conn)
        .accept_answer(thread.question.uuid, ghost, thread.asker)
        .unwrap_err();
    assert!(matches!(err, ServiceError::AnswerNotFound(id) if id == ghost));
}

#[test]
fn re_accepting_the_same_answer_is_a_noop_without_a_second_bonus() {
    let conn = open_db_in_memory().unwrap();
    let thread = seed_thread(&conn);
    let accepts = AcceptService::new(&conn);

    accepts
        .accept_answer(thread.question.uuid, thread.answer.uuid, thread.asker)
        .unwrap();
    let question = accepts
        .accept_answer(thread.question.uuid, thread.answer.uuid, thread.asker)
        .unwrap();

    assert_eq!(question.accepted_answer_uuid, Some(thread.answer.uuid));
    assert_eq!(reputation_of(&conn, thread.answerer), 15);
}

#[test]
fn accepting_a_different_answer_overwrites_the_marker_and_keeps_the_earlier_bonus() {
    let conn = open_db_in_memory().unwrap();
    let thread = seed_thread(&conn);
    let posts = PostService::new(&conn);
    let accepts = AcceptService::new(&conn);

    let second_author = posts.register_user("second").unwrap();
    let second = posts
        .post_answer(thread.question.uuid, second_author.uuid, "a better take")
        .unwrap();

    accepts
        .accept_answer(thread.question.uuid, thread.answer.uuid, thread.asker)
        .unwrap();
    let question = accepts
        .accept_answer(thread.question.uuid, second.uuid, thread.asker)
        .unwrap();

    assert_eq!(question.accepted_answer_uuid, Some(second.uuid));
    assert_eq!(reputation_of(&conn, thread.answerer), 15);
    assert_eq!(reputation_of(&conn, second_author.uuid), 15);
}

#[test]
fn revoke_policy_retracts_the_superseded_bonus() {
    let conn = open_db_in_memory().unwrap();
    let thread = seed_thread(&conn);
    let posts = PostService::new(&conn);

    let policy = InteractionPolicy {
        revoke_superseded_acceptance: true,
        ..InteractionPolicy::default()
    };
    let accepts = AcceptService::with_policy(&conn, policy);

    let second_author = posts.register_user("second").unwrap();
    let second = posts
        .post_answer(thread.question.uuid, second_author.uuid, "a better take")
        .unwrap();

    accepts
        .accept_answer(thread.question.uuid, thread.answer.uuid, thread.asker)
        .unwrap();
    accepts
        .accept_answer(thread.question.uuid, second.uuid, thread.asker)
        .unwrap();

    assert_eq!(reputation_of(&conn, thread.answerer), 0);
    assert_eq!(reputation_of(&conn, second_author.uuid), 15);
}
