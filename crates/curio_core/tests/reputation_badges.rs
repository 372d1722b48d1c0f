use curio_core::db::open_db_in_memory;
use curio_core::service::badge_service;
use curio_core::{
    AcceptService, Badge, PostService, SqliteUserRepository, UserId, UserRepository, VoteService,
};
use rusqlite::Connection;

fn seed_thread(conn: &Connection) -> (UserId, UserId, curio_core::Question, curio_core::Answer) {
    let posts = PostService::new(conn);
    let asker = posts.register_user("asker").unwrap();
    let answerer = posts.register_user("answerer").unwrap();
    let question = posts
        .post_question(asker.uuid, "pragma order", "does busy_timeout apply per statement?")
        .unwrap();
    let answer = posts
        .post_answer(question.uuid, answerer.uuid, "yes, per lock acquisition")
        .unwrap();
    (asker.uuid, answerer.uuid, question, answer)
}

fn set_reputation(conn: &Connection, user: UserId, value: i64) {
    conn.execute(
        "UPDATE users SET reputation = ?1 WHERE uuid = ?2;",
        rusqlite::params![value, user.to_string()],
    )
    .unwrap();
}

#[test]
fn new_users_start_with_zero_reputation_and_no_badges() {
    let conn = open_db_in_memory().unwrap();
    let user = PostService::new(&conn).register_user("fresh").unwrap();

    assert_eq!(user.reputation, 0);
    assert!(user.badges.is_empty());
}

#[test]
fn upvote_crossing_the_bronze_threshold_awards_the_badge_in_the_same_mutation() {
    let conn = open_db_in_memory().unwrap();
    let (asker, answerer, _, answer) = seed_thread(&conn);
    set_reputation(&conn, answerer, 95);

    VoteService::new(&conn)
        .vote_post(answer.post_ref(), asker, 1)
        .unwrap();

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let user = users.get_user(answerer).unwrap().unwrap();
    assert_eq!(user.reputation, 105);
    assert!(user.has_badge(Badge::Bronze));
    assert!(!user.has_badge(Badge::Silver));
}

#[test]
fn acceptance_bonus_can_cross_a_threshold() {
    let conn = open_db_in_memory().unwrap();
    let (asker, answerer, question, answer) = seed_thread(&conn);
    set_reputation(&conn, answerer, 490);

    AcceptService::new(&conn)
        .accept_answer(question.uuid, answer.uuid, asker)
        .unwrap();

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let user = users.get_user(answerer).unwrap().unwrap();
    assert_eq!(user.reputation, 505);
    assert_eq!(user.badges, vec![Badge::Bronze, Badge::Silver]);
}

#[test]
fn a_single_jump_awards_every_crossed_badge() {
    let conn = open_db_in_memory().unwrap();
    let climber = PostService::new(&conn).register_user("climber").unwrap().uuid;

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let reputation = users.adjust_reputation(climber, 1200).unwrap();
    badge_service::award_missing(&users, climber, reputation).unwrap();

    assert_eq!(
        users.badges(climber).unwrap(),
        vec![Badge::Bronze, Badge::Silver, Badge::Gold]
    );
}

#[test]
fn badges_survive_a_reputation_drop() {
    let conn = open_db_in_memory().unwrap();
    let (asker, answerer, _, answer) = seed_thread(&conn);
    set_reputation(&conn, answerer, 95);

    let votes = VoteService::new(&conn);
    votes.vote_post(answer.post_ref(), asker, 1).unwrap();

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    assert!(users.badges(answerer).unwrap().contains(&Badge::Bronze));

    // Toggle the upvote off; reputation falls back below the threshold.
    votes.vote_post(answer.post_ref(), asker, 1).unwrap();

    let user = users.get_user(answerer).unwrap().unwrap();
    assert_eq!(user.reputation, 95);
    assert!(user.has_badge(Badge::Bronze));
}

#[test]
fn reputation_may_go_negative() {
    let conn = open_db_in_memory().unwrap();
    let (asker, answerer, _, answer) = seed_thread(&conn);

    VoteService::new(&conn)
        .vote_post(answer.post_ref(), asker, -1)
        .unwrap();

    let users = SqliteUserRepository::try_new(&conn).unwrap();
    assert_eq!(users.get_user(answerer).unwrap().unwrap().reputation, -2);
}
