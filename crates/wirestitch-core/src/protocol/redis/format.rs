//! Array rendering policy.
//!
//! - Responses: JSON array of the element payloads.
//! - Requests: if the array head names a known command, the remaining
//!   elements are rendered as that command's argument object; otherwise a
//!   JSON array of every element.

use serde_json::Value;

use crate::frame::MessageType;

use super::cmd_args::lookup_command;

/// Rendered array payload plus the detected command name (requests only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArray {
    pub payload: String,
    pub command: Option<String>,
}

pub fn json_array(items: &[String]) -> String {
    Value::Array(items.iter().cloned().map(Value::String).collect()).to_string()
}

pub fn format_array(msg_type: MessageType, items: &[String]) -> RenderedArray {
    if msg_type == MessageType::Response {
        return RenderedArray {
            payload: json_array(items),
            command: None,
        };
    }

    let Some((cmd, name_len)) = lookup_command(items) else {
        return RenderedArray {
            payload: json_array(items),
            command: None,
        };
    };

    let args = items.get(name_len..).unwrap_or_default();
    let payload = match cmd.fmt_args(args) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!(cmd = cmd.name(), error = %e, "argument shape mismatch");
            json_array(args)
        }
    };
    RenderedArray {
        payload,
        command: Some(cmd.name().to_string()),
    }
}
