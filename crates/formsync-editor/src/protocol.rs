//! JSON records exchanged with the visual designer.
//!
//! Outbound: `{"type": "update", "info": <FormChange>, "filename": ...}`.
//! Inbound: `{"type": ..., "filename": ..., "message": ...}` where `type`
//! selects how `message` is read. Message framing is the transport's job.

use crate::diff::FormChange;
use crate::patch::NewComponent;
use formsync_core::LayoutRect;
use formsync_core::emitter::format_number;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize)]
pub struct UpdateMessage<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub info: &'a FormChange,
    pub filename: &'a str,
}

impl<'a> UpdateMessage<'a> {
    pub fn new(info: &'a FormChange, filename: &'a str) -> Self {
        Self {
            kind: "update",
            info,
            filename,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Inbound message before its body is interpreted.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub message: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewComponentMessage {
    pub name: String,
    #[serde(rename = "type")]
    pub constructor: String,
    pub layout: LayoutRect,
    #[serde(default)]
    pub args: Vec<Value>,
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyChange {
    pub component: String,
    pub property: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteTarget {
    pub fullname: String,
}

/// A decoded designer request.
#[derive(Debug, Clone, PartialEq)]
pub enum DesignerRequest {
    NewComponent(NewComponentMessage),
    ComponentsChanges(Vec<PropertyChange>),
    DeleteComponent(Vec<DeleteTarget>),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed designer message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown designer message type `{0}`")]
    UnknownType(String),
}

impl DesignerRequest {
    /// Decode a raw message body. Returns the file it targets as well.
    pub fn decode(json: &str) -> Result<(String, DesignerRequest), ProtocolError> {
        let envelope: Envelope = serde_json::from_str(json)?;
        let request = match envelope.kind.as_str() {
            "newcomponent" => {
                DesignerRequest::NewComponent(serde_json::from_value(envelope.message)?)
            }
            "componentschanges" => {
                DesignerRequest::ComponentsChanges(serde_json::from_value(envelope.message)?)
            }
            "deletecomponent" => {
                DesignerRequest::DeleteComponent(serde_json::from_value(envelope.message)?)
            }
            other => return Err(ProtocolError::UnknownType(other.to_string())),
        };
        Ok((envelope.filename, request))
    }
}

impl NewComponentMessage {
    pub fn to_request(&self) -> NewComponent {
        NewComponent {
            owner: self.owner.clone(),
            name: self.name.clone(),
            constructor: self.constructor.clone(),
            args: self.args.iter().map(value_text).collect(),
            layout: self.layout,
        }
    }
}

/// Source text for a JSON value sent by the designer. Strings are taken
/// as already written in script syntax.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{Change, ChangeKind, ChangeState};
    use formsync_core::id::{Name, parse_dotted};
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_new_component() {
        let json = r#"{
            "type": "newcomponent",
            "filename": "main.js",
            "message": {
                "name": "Button", "type": "NewButton", "owner": "Form1",
                "layout": {"left": 10, "top": 20, "width": 75, "height": 25},
                "args": ["'OK'", 3]
            }
        }"#;
        let (file, request) = DesignerRequest::decode(json).unwrap();
        assert_eq!(file, "main.js");
        let DesignerRequest::NewComponent(msg) = request else {
            panic!("expected newcomponent");
        };
        let req = msg.to_request();
        assert_eq!(req.constructor, "NewButton");
        assert_eq!(req.args, vec!["'OK'".to_string(), "3".to_string()]);
        assert_eq!(req.layout, LayoutRect::new(10.0, 20.0, 75.0, 25.0));
    }

    #[test]
    fn decode_changes_and_deletes() {
        let json = r#"{"type":"componentschanges","filename":"a.js",
            "message":[{"component":"b","property":"Left","value":12.0}]}"#;
        let (_, request) = DesignerRequest::decode(json).unwrap();
        let DesignerRequest::ComponentsChanges(changes) = request else {
            panic!("expected componentschanges");
        };
        assert_eq!(changes[0].property, "Left");
        assert_eq!(value_text(&changes[0].value), "12");

        let json = r#"{"type":"deletecomponent","filename":"a.js","message":[{"fullname":"b"}]}"#;
        let (_, request) = DesignerRequest::decode(json).unwrap();
        assert_eq!(
            request,
            DesignerRequest::DeleteComponent(vec![DeleteTarget {
                fullname: "b".into()
            }])
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = DesignerRequest::decode(r#"{"type":"resize","message":{}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownType(t) if t == "resize"));
        assert!(DesignerRequest::decode("not json").is_err());
    }

    #[test]
    fn update_message_shape() {
        let info = FormChange {
            name: "f".into(),
            changes: vec![Change {
                kind: ChangeKind::Value,
                state: ChangeState::Modified,
                name: Name::intern("Caption"),
                full_name: parse_dotted("f.Caption"),
                owner: parse_dotted("f"),
                value: Some("b".into()),
                reference: None,
                constructor: None,
                component_owner: None,
                args: vec![],
            }],
        };
        let json = UpdateMessage::new(&info, "main.js").to_json().unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "update");
        assert_eq!(parsed["filename"], "main.js");
        assert_eq!(parsed["info"]["name"], "f");
        assert_eq!(parsed["info"]["changes"][0]["state"], "modified");
        assert_eq!(parsed["info"]["changes"][0]["fullName"], serde_json::json!(["f", "Caption"]));
    }
}
