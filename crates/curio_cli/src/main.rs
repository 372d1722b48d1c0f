//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `curio_core` linkage.
//! - Walk one interaction scenario against an in-memory database and keep
//!   the output deterministic for quick local sanity checks.

use curio_core::{
    open_db_in_memory, AcceptService, PostService, VoteService,
};
use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("curio smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    println!("curio_core version={}", curio_core::core_version());

    let conn = open_db_in_memory()?;
    let posts = PostService::new(&conn);
    let votes = VoteService::new(&conn);
    let accepts = AcceptService::new(&conn);

    let asker = posts.register_user("asker")?;
    let answerer = posts.register_user("answerer")?;

    let question = posts.post_question(
        asker.uuid,
        "How do immediate transactions behave?",
        "Looking for the locking semantics of BEGIN IMMEDIATE.",
    )?;
    let answer = posts.post_answer(
        question.uuid,
        answerer.uuid,
        "They take the write lock up front.",
    )?;

    let outcome = votes.vote_post(answer.post_ref(), asker.uuid, 1)?;
    println!("answer score={}", outcome.tally.score());

    let question = accepts.accept_answer(question.uuid, answer.uuid, asker.uuid)?;
    println!(
        "accepted={}",
        question.accepted_answer_uuid == Some(answer.uuid)
    );

    Ok(())
}
