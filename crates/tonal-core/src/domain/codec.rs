//! Codec - queue payload と Task の相互変換
//!
//! # 設計原則
//! - decode は純粋関数（副作用なし、ログも出さない）
//! - 失敗時は可能なら task id を拾っておく（後から調査できるように）
//! - encode は store に書く record をそのまま作る（同じ JSON 形式）

use super::errors::MalformedTaskError;
use super::task::Task;

/// payload を Task にデコード
///
/// 以下のいずれかで `MalformedTaskError`:
/// - UTF-8 / JSON として不正
/// - `id` がない
/// - `messages` がない
/// - `messageText` を持たない message がある
pub fn decode(payload: &[u8]) -> Result<Task, MalformedTaskError> {
    serde_json::from_slice::<Task>(payload).map_err(|e| MalformedTaskError {
        task_id: recover_task_id(payload),
        payload_len: payload.len(),
        reason: e.to_string(),
    })
}

/// Task を store に書く record にエンコード
pub fn encode(task: &Task) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(task)
}

/// 構造が壊れていても `id` が文字列として読めればそれを返す
fn recover_task_id(payload: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(payload).ok()?;
    value.get("id")?.as_str().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassId, Message};
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn decodes_minimal_payload() {
        let task = decode(br#"{"id":"t1","messages":[{"messageText":"hi"}]}"#).unwrap();
        assert_eq!(task.id, "t1");
        assert_eq!(task.messages, vec![Message::new("hi")]);
    }

    #[rstest]
    #[case::not_json(&b"not json"[..], None)]
    #[case::invalid_utf8(&[0xff, 0xfe, 0x00][..], None)]
    #[case::missing_id(&br#"{"messages":[]}"#[..], None)]
    #[case::missing_messages(&br#"{"id":"t9"}"#[..], Some("t9"))]
    #[case::message_without_text(&br#"{"id":"t7","messages":[{"text":"x"}]}"#[..], Some("t7"))]
    #[case::id_not_a_string(&br#"{"id":42,"messages":[]}"#[..], None)]
    #[case::messages_not_a_list(&br#"{"id":"t3","messages":"oops"}"#[..], Some("t3"))]
    fn rejects_malformed_payloads(#[case] payload: &[u8], #[case] expected_id: Option<&str>) {
        let err = decode(payload).unwrap_err();
        assert_eq!(err.task_id.as_deref(), expected_id);
        assert_eq!(err.payload_len, payload.len());
    }

    #[test]
    fn passthrough_fields_survive_roundtrip() {
        let payload = json!({
            "id": "t2",
            "type": "bin",
            "messages": [
                {"userID": "u1", "submitDate": "2024-01-01", "messageText": "ok"}
            ]
        });
        let task = decode(&serde_json::to_vec(&payload).unwrap()).unwrap();
        let task = task.annotate(vec![ClassId::Positive]).unwrap();

        let stored: serde_json::Value = serde_json::from_slice(&encode(&task).unwrap()).unwrap();
        assert_eq!(
            stored,
            json!({
                "id": "t2",
                "type": "bin",
                "messages": [
                    {"userID": "u1", "submitDate": "2024-01-01", "messageText": "ok", "result": 1}
                ]
            })
        );
    }

    #[test]
    fn unclassified_messages_encode_without_result() {
        let bytes = encode(&Task::new("t", vec![Message::new("x")])).unwrap();
        assert_eq!(bytes, br#"{"id":"t","messages":[{"messageText":"x"}]}"#.to_vec());
    }
}
