use curio_core::db::open_db_in_memory;
use curio_core::{
    AcceptService, DeleteService, PostService, ServiceError, UserId, VoteService,
};
use rusqlite::Connection;

fn seed_users(conn: &Connection) -> (UserId, UserId) {
    let posts = PostService::new(conn);
    let asker = posts.register_user("asker").unwrap();
    let helper = posts.register_user("helper").unwrap();
    (asker.uuid, helper.uuid)
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn deleting_a_question_removes_answers_comments_replies_and_votes() {
    let conn = open_db_in_memory().unwrap();
    let (asker, helper) = seed_users(&conn);
    let posts = PostService::new(&conn);
    let votes = VoteService::new(&conn);

    let question = posts
        .post_question(asker, "cascade", "what goes when a question goes?")
        .unwrap();
    let answer = posts
        .post_answer(question.uuid, helper, "everything beneath it")
        .unwrap();
    let comment = posts
        .post_comment(answer.post_ref(), asker, "source?", None)
        .unwrap();
    let reply = posts
        .post_comment(answer.post_ref(), helper, "the docs", Some(comment.uuid))
        .unwrap();
    posts
        .post_comment(answer.post_ref(), asker, "thanks", Some(reply.uuid))
        .unwrap();

    votes.vote_post(question.post_ref(), helper, 1).unwrap();
    votes.vote_post(answer.post_ref(), asker, 1).unwrap();
    votes.vote_comment(comment.uuid, helper, 1).unwrap();

    let outcome = DeleteService::new(&conn)
        .delete_question(question.uuid, asker)
        .unwrap();

    assert_eq!(outcome.answers_removed, 1);
    assert_eq!(outcome.comments_removed, 3);
    assert_eq!(count(&conn, "questions"), 0);
    assert_eq!(count(&conn, "answers"), 0);
    assert_eq!(count(&conn, "comments"), 0);
    assert_eq!(count(&conn, "post_votes"), 0);
    assert_eq!(count(&conn, "comment_votes"), 0);
}

#[test]
fn only_the_author_may_delete() {
    let conn = open_db_in_memory().unwrap();
    let (asker, helper) = seed_users(&conn);
    let posts = PostService::new(&conn);

    let question = posts
        .post_question(asker, "ownership", "who may delete this?")
        .unwrap();
    let answer = posts
        .post_answer(question.uuid, helper, "the author")
        .unwrap();
    let comment = posts
        .post_comment(question.post_ref(), helper, "agreed", None)
        .unwrap();

    let deletes = DeleteService::new(&conn);
    assert!(matches!(
        deletes.delete_question(question.uuid, helper).unwrap_err(),
        ServiceError::NotAuthorized { .. }
    ));
    assert!(matches!(
        deletes
            .delete_answer(question.uuid, answer.uuid, asker)
            .unwrap_err(),
        ServiceError::NotAuthorized { .. }
    ));
    assert!(matches!(
        deletes.delete_comment(comment.uuid, asker).unwrap_err(),
        ServiceError::NotAuthorized { .. }
    ));

    assert_eq!(count(&conn, "questions"), 1);
    assert_eq!(count(&conn, "answers"), 1);
    assert_eq!(count(&conn, "comments"), 1);
}

#[test]
fn deleting_the_accepted_answer_clears_the_acceptance_marker() {
    let conn = open_db_in_memory().unwrap();
    let (asker, helper) = seed_users(&conn);
    let posts = PostService::new(&conn);

    let question = posts
        .post_question(asker, "marker", "does acceptance survive deletion?")
        .unwrap();
    let answer = posts
        .post_answer(question.uuid, helper, "no, the marker clears")
        .unwrap();
    AcceptService::new(&conn)
        .accept_answer(question.uuid, answer.uuid, asker)
        .unwrap();

    DeleteService::new(&conn)
        .delete_answer(question.uuid, answer.uuid, helper)
        .unwrap();

    let question = PostService::new(&conn).get_question(question.uuid).unwrap();
    assert_eq!(question.accepted_answer_uuid, None);
}

#[test]
fn deleting_a_comment_removes_its_reply_tree_but_not_siblings() {
    let conn = open_db_in_memory().unwrap();
    let (asker, helper) = seed_users(&conn);
    let posts = PostService::new(&conn);

    let question = posts
        .post_question(asker, "threads", "sibling comments should survive")
        .unwrap();
    let root = posts
        .post_comment(question.post_ref(), helper, "root", None)
        .unwrap();
    let reply = posts
        .post_comment(question.post_ref(), asker, "reply", Some(root.uuid))
        .unwrap();
    posts
        .post_comment(question.post_ref(), helper, "nested", Some(reply.uuid))
        .unwrap();
    let sibling = posts
        .post_comment(question.post_ref(), asker, "sibling", None)
        .unwrap();

    let outcome = DeleteService::new(&conn)
        .delete_comment(root.uuid, helper)
        .unwrap();

    assert_eq!(outcome.comments_removed, 3);
    let remaining = posts.list_comments(question.post_ref()).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].comment.uuid, sibling.uuid);
}

#[test]
fn deleting_missing_content_surfaces_not_found_without_writes() {
    let conn = open_db_in_memory().unwrap();
    let (asker, _) = seed_users(&conn);
    let deletes = DeleteService::new(&conn);

    let ghost = uuid::Uuid::new_v4();
    assert!(matches!(
        deletes.delete_question(ghost, asker).unwrap_err(),
        ServiceError::QuestionNotFound(_)
    ));
    assert!(matches!(
        deletes.delete_comment(ghost, asker).unwrap_err(),
        ServiceError::CommentNotFound(_)
    ));
}

#[test]
fn orphan_repair_sweeps_stranded_comment_trees_to_a_fixpoint() {
    let conn = open_db_in_memory().unwrap();
    let (asker, helper) = seed_users(&conn);
    let posts = PostService::new(&conn);

    let question = posts
        .post_question(asker, "strand", "comments about to be stranded")
        .unwrap();
    let root = posts
        .post_comment(question.post_ref(), helper, "root", None)
        .unwrap();
    posts
        .post_comment(question.post_ref(), asker, "reply", Some(root.uuid))
        .unwrap();

    // Strand the comments by removing the question row directly, as an
    // interrupted cascade would.
    conn.execute(
        "DELETE FROM questions WHERE uuid = ?1;",
        [question.uuid.to_string()],
    )
    .unwrap();

    let removed = DeleteService::new(&conn).repair_orphan_comments().unwrap();
    assert_eq!(removed, 2);
    assert_eq!(count(&conn, "comments"), 0);

    // A clean database repairs nothing.
    assert_eq!(DeleteService::new(&conn).repair_orphan_comments().unwrap(), 0);
}
