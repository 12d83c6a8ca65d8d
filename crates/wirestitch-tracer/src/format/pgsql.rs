use std::borrow::Cow;

use wirestitch_core::cursor::ByteCursor;
use wirestitch_core::protocol::pgsql::{parse_data_row, parse_row_desc, RegularFrame, Tag};

/// Error field type carrying the human-readable message.
const HUMAN_READABLE_MESSAGE: u8 = b'M';

/// Command tag prefix of row-returning commands.
const SELECT_CMD: &[u8] = b"SELECT";

/// Rendered in place of NULL column values.
pub const NULL_VALUE: &str = "[NULL]";

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Human-readable message of an ErrorResponse payload, or the whole payload.
///
/// Payload layout: repeated `type (u8) | value\0`, terminated by a zero type.
pub fn format_error_resp(payload: &[u8]) -> &[u8] {
    let mut cur = ByteCursor::new(payload);
    while cur.remaining_size() >= 2 {
        let Ok(field_type) = cur.extract_char() else {
            break;
        };
        if field_type == 0 {
            break;
        }
        let Ok(value) = cur.extract_delimited_string(b"\0") else {
            break;
        };
        if field_type == HUMAN_READABLE_MESSAGE {
            return value;
        }
    }
    payload
}

/// Header of column names followed by one line per data row.
fn format_select_resp(group: &[&RegularFrame]) -> String {
    let mut res = String::new();

    match group.iter().find(|f| f.tag == Tag::ROW_DESC) {
        Some(row_desc) => {
            let names: Vec<Cow<'_, str>> = parse_row_desc(&row_desc.payload)
                .into_iter()
                .map(lossy)
                .collect();
            res.push_str(&names.join(","));
            res.push('\n');
        }
        None => tracing::debug!("no row description in SELECT response"),
    }

    // Data rows may be interleaved with other frames in extended-query exchanges.
    let body = group.split_last().map(|(_, rest)| rest).unwrap_or_default();
    for frame in body.iter().filter(|f| f.tag == Tag::DATA_ROW) {
        let values: Vec<Cow<'_, str>> = parse_data_row(&frame.payload)
            .into_iter()
            .map(|v| v.map_or(Cow::Borrowed(NULL_VALUE), lossy))
            .collect();
        res.push_str(&values.join(","));
        res.push('\n');
    }
    res
}

/// Render a response group ending in CommandComplete or ErrorResponse.
pub fn format_cmd_resp(group: &[&RegularFrame]) -> String {
    let Some(last) = group.last() else {
        return String::new();
    };
    if last.tag == Tag::ERR_RESP {
        return lossy(format_error_resp(&last.payload)).into_owned();
    }
    if group.len() == 1 {
        return lossy(&last.payload).into_owned();
    }

    let mut res = String::new();
    if last.payload.starts_with(SELECT_CMD) {
        res = format_select_resp(group);
    }
    res.push_str(&lossy(&last.payload));
    res
}
