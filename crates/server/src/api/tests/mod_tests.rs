use super::*;
use shared::{error::ErrorCode, protocol::{ResponseType, Trigger}};

fn form(pairs: &[(&str, &str)]) -> Vec<u8> {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
        .into_bytes()
}

#[test]
fn url_verification_is_echoed() {
    let body = serde_json::json!({
        "token": "legacy",
        "challenge": "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P",
        "type": "url_verification"
    });
    let disposition = decode_event(body.to_string().as_bytes()).expect("event");
    assert_eq!(
        disposition,
        EventDisposition::Challenge(
            "3eZbrw1aBm2rZgRNFdxV2595E9CY3gmdALWMmHkvFXO7tYXAYM8P".to_string()
        )
    );
}

#[test]
fn home_tab_open_dispatches_surface_opened() {
    let body = serde_json::json!({
        "type": "event_callback",
        "event": { "type": "app_home_opened", "user": "U1", "tab": "home" }
    });
    let disposition = decode_event(body.to_string().as_bytes()).expect("event");
    assert_eq!(
        disposition,
        EventDisposition::Dispatch(InboundAction::surface_opened(UserId::new("U1")))
    );
}

#[test]
fn messages_tab_and_unknown_events_are_ignored() {
    let messages_tab = serde_json::json!({
        "type": "event_callback",
        "event": { "type": "app_home_opened", "user": "U1", "tab": "messages" }
    });
    assert_eq!(
        decode_event(messages_tab.to_string().as_bytes()).expect("event"),
        EventDisposition::Ignore
    );

    let rate_limited = serde_json::json!({ "type": "app_rate_limited", "minute_rate_limited": 1 });
    assert_eq!(
        decode_event(rate_limited.to_string().as_bytes()).expect("event"),
        EventDisposition::Ignore
    );
}

#[test]
fn non_json_event_is_a_validation_error() {
    let err = decode_event(b"not json").expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[test]
fn block_action_payload_decodes_from_form_body() {
    let payload = serde_json::json!({
        "type": "block_actions",
        "user": { "id": "UADMIN" },
        "view": { "private_metadata": "UBOB", "state": { "values": {} } },
        "actions": [ { "action_id": "delete_record", "value": "12" } ]
    });
    let body = form(&[("payload", payload.to_string().as_str())]);
    let action = decode_interaction(&body).expect("decode").expect("action");
    assert_eq!(action.actor, UserId::new("UADMIN"));
    assert_eq!(action.trigger, Trigger::DeleteRecord);
    assert_eq!(action.metadata, "UBOB");
    assert_eq!(action.value.as_deref(), Some("12"));
}

#[test]
fn other_interaction_types_decode_to_nothing() {
    let payload = serde_json::json!({ "type": "view_closed", "user": { "id": "U1" } });
    let body = form(&[("payload", payload.to_string().as_str())]);
    assert!(decode_interaction(&body).expect("decode").is_none());
}

#[test]
fn interaction_without_payload_is_rejected() {
    let err = decode_interaction(&form(&[("token", "x")])).expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);

    let err = decode_interaction(&form(&[("payload", "{")])).expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}

#[test]
fn hello_command_gets_the_greeting() {
    let body = form(&[("command", "/hello"), ("text", ""), ("user_id", "U1")]);
    let command = decode_command(&body).expect("command");
    assert_eq!(command.user_id, UserId::new("U1"));

    let reply = reply_to_command(&command);
    assert_eq!(reply.response_type, ResponseType::Ephemeral);
    assert_eq!(reply.text, HELLO_REPLY);
}

#[test]
fn unknown_command_gets_usage_hint() {
    let body = form(&[("command", "/lift"), ("user_id", "U1")]);
    let reply = reply_to_command(&decode_command(&body).expect("command"));
    assert!(reply.text.contains("/lift"));
    assert!(reply.text.contains(HELLO_COMMAND));
}

#[test]
fn command_without_user_is_rejected() {
    let err = decode_command(&form(&[("command", "/hello")])).expect_err("should fail");
    assert_eq!(err.code, ErrorCode::Validation);
}
