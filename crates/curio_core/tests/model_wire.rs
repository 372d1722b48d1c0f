use curio_core::{Direction, NotificationKind, PostRef};
use serde_json::json;
use uuid::Uuid;

#[test]
fn post_ref_serializes_as_tagged_kind_and_id() {
    let id = Uuid::parse_str("11111111-2222-4333-8444-555555555555").unwrap();

    let value = serde_json::to_value(PostRef::Question(id)).unwrap();
    assert_eq!(value, json!({ "kind": "question", "id": id.to_string() }));

    let value = serde_json::to_value(PostRef::Answer(id)).unwrap();
    assert_eq!(value, json!({ "kind": "answer", "id": id.to_string() }));

    let parsed: PostRef =
        serde_json::from_value(json!({ "kind": "answer", "id": id.to_string() })).unwrap();
    assert_eq!(parsed, PostRef::Answer(id));
}

#[test]
fn direction_and_kind_use_snake_case_wire_names() {
    assert_eq!(serde_json::to_value(Direction::Up).unwrap(), json!("up"));
    assert_eq!(serde_json::to_value(Direction::Down).unwrap(), json!("down"));

    assert_eq!(
        serde_json::to_value(NotificationKind::Accepted).unwrap(),
        json!("accepted")
    );
    let parsed: NotificationKind = serde_json::from_value(json!("upvote")).unwrap();
    assert_eq!(parsed, NotificationKind::Upvote);
}
