use super::OutgoingFrame;
use super::StreamFragment;
use crate::domain::models::ClientError;

#[test]
fn it_decodes_stream_fragments() {
    let fragment = StreamFragment::decode(r#"{"type":"stream","content":"Hi","done":false}"#).unwrap();
    assert_eq!(fragment, StreamFragment::stream("Hi", false));
    assert!(!fragment.is_done());

    let done = StreamFragment::decode(r#"{"type":"stream","content":"","done":true}"#).unwrap();
    assert!(done.is_done());
}

#[test]
fn it_defaults_missing_done_to_false() {
    let fragment = StreamFragment::decode(r#"{"type":"stream","content":"Hi"}"#).unwrap();
    assert_eq!(fragment, StreamFragment::stream("Hi", false));
}

#[test]
fn it_decodes_error_fragments() {
    let fragment = StreamFragment::decode(r#"{"type":"error","content":"rate limited"}"#).unwrap();
    assert_eq!(fragment, StreamFragment::error("rate limited"));
    assert!(!fragment.is_done());
}

#[test]
fn it_rejects_malformed_payloads() {
    for payload in ["not json", r#"{"type":"ping"}"#, r#"{"content":"x"}"#, ""] {
        let res = StreamFragment::decode(payload);
        assert!(
            matches!(res, Err(ClientError::MalformedFragment(_))),
            "payload {payload:?} should be rejected"
        );
    }
}

#[test]
fn it_encodes_outgoing_frames() {
    let frame = OutgoingFrame::new("p1", "Say hi");
    insta::assert_snapshot!(frame.encode().unwrap(), @r###"{"persona_id":"p1","content":"Say hi"}"###);
}
