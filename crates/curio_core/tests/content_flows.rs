use curio_core::db::open_db_in_memory;
use curio_core::{
    PostService, QuestionListQuery, RepoError, ServiceError, SqlitePostRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn blank_required_fields_are_rejected_before_any_write() {
    let conn = open_db_in_memory().unwrap();
    let posts = PostService::new(&conn);

    assert!(matches!(
        posts.register_user("   ").unwrap_err(),
        ServiceError::BlankField("display name")
    ));

    let user = posts.register_user("author").unwrap();
    assert!(matches!(
        posts.post_question(user.uuid, "", "body").unwrap_err(),
        ServiceError::BlankField("title")
    ));
    assert!(matches!(
        posts.post_question(user.uuid, "title", "\n").unwrap_err(),
        ServiceError::BlankField("body")
    ));

    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM questions;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn posting_under_missing_parents_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let posts = PostService::new(&conn);
    let user = posts.register_user("author").unwrap();

    let ghost = Uuid::new_v4();
    assert!(matches!(
        posts.post_answer(ghost, user.uuid, "into the void").unwrap_err(),
        ServiceError::QuestionNotFound(_)
    ));
    assert!(matches!(
        posts
            .post_comment(curio_core::PostRef::Answer(ghost), user.uuid, "hello", None)
            .unwrap_err(),
        ServiceError::AnswerNotFound(_)
    ));
}

#[test]
fn replies_must_target_a_comment_of_the_same_post() {
    let conn = open_db_in_memory().unwrap();
    let posts = PostService::new(&conn);
    let user = posts.register_user("author").unwrap();

    let first = posts
        .post_question(user.uuid, "first", "first body")
        .unwrap();
    let second = posts
        .post_question(user.uuid, "second", "second body")
        .unwrap();
    let comment = posts
        .post_comment(first.post_ref(), user.uuid, "on the first", None)
        .unwrap();

    let err = posts
        .post_comment(
            second.post_ref(),
            user.uuid,
            "cross thread",
            Some(comment.uuid),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::ReplyOutsideThread { reply_to } if reply_to == comment.uuid
    ));
}

#[test]
fn viewing_a_question_bumps_the_counter_and_plain_get_does_not() {
    let conn = open_db_in_memory().unwrap();
    let posts = PostService::new(&conn);
    let user = posts.register_user("author").unwrap();
    let question = posts
        .post_question(user.uuid, "views", "count my views")
        .unwrap();
    assert_eq!(question.views, 0);

    let viewed = posts.view_question(question.uuid).unwrap();
    assert_eq!(viewed.views, 1);
    let viewed = posts.view_question(question.uuid).unwrap();
    assert_eq!(viewed.views, 2);

    let fetched = posts.get_question(question.uuid).unwrap();
    assert_eq!(fetched.views, 2);
}

#[test]
fn question_listing_is_paginated_and_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let posts = PostService::new(&conn);
    let user = posts.register_user("author").unwrap();

    for index in 0..5 {
        let question = posts
            .post_question(user.uuid, &format!("q{index}"), "body")
            .unwrap();
        // Timestamps resolve to seconds; spread them so ordering is observable.
        conn.execute(
            "UPDATE questions SET created_at = ?1 WHERE uuid = ?2;",
            rusqlite::params![1_700_000_000_000_i64 + index, question.uuid.to_string()],
        )
        .unwrap();
    }

    let page = posts
        .list_questions(&QuestionListQuery {
            limit: Some(2),
            offset: 0,
        })
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].title, "q4");
    assert_eq!(page[1].title, "q3");

    let next = posts
        .list_questions(&QuestionListQuery {
            limit: Some(2),
            offset: 2,
        })
        .unwrap();
    assert_eq!(next[0].title, "q2");

    // Oversized limits clamp instead of failing.
    let all = posts
        .list_questions(&QuestionListQuery {
            limit: Some(10_000),
            offset: 0,
        })
        .unwrap();
    assert_eq!(all.len(), 5);
}

#[test]
fn answers_list_in_creation_order_and_comments_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let posts = PostService::new(&conn);
    let user = posts.register_user("author").unwrap();
    let question = posts
        .post_question(user.uuid, "ordering", "answer and comment order")
        .unwrap();

    for (index, body) in ["first", "second"].iter().enumerate() {
        let answer = posts.post_answer(question.uuid, user.uuid, body).unwrap();
        conn.execute(
            "UPDATE answers SET created_at = ?1 WHERE uuid = ?2;",
            rusqlite::params![1_700_000_000_000_i64 + index as i64, answer.uuid.to_string()],
        )
        .unwrap();
    }
    let answers = posts.list_answers(question.uuid).unwrap();
    assert_eq!(answers[0].body, "first");
    assert_eq!(answers[1].body, "second");

    for (index, body) in ["older", "newer"].iter().enumerate() {
        let comment = posts
            .post_comment(question.post_ref(), user.uuid, body, None)
            .unwrap();
        conn.execute(
            "UPDATE comments SET created_at = ?1 WHERE uuid = ?2;",
            rusqlite::params![1_700_000_000_000_i64 + index as i64, comment.uuid.to_string()],
        )
        .unwrap();
    }
    let comments = posts.list_comments(question.post_ref()).unwrap();
    assert_eq!(comments[0].comment.body, "newer");
    assert_eq!(comments[1].comment.body, "older");
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqlitePostRepository::try_new(&conn).unwrap_err();
    assert!(matches!(
        err,
        RepoError::UninitializedConnection { .. } | RepoError::MissingRequiredTable(_)
    ));
}
