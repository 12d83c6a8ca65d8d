#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::VecDeque;

use wirestitch_core::protocol::pgsql::{RegularFrame, Tag};
use wirestitch_tracer::stitch::pgsql::{assemble_response_group, collect_until_marker};
use wirestitch_tracer::stitch::{PgsqlStitcher, StitchError, Stitcher};

mod common;
use common::{data_row, pg, query, row_desc};

fn select_group(start_ts: u64, value: &str) -> Vec<RegularFrame> {
    vec![
        pg(Tag::ROW_DESC, start_ts, &row_desc(&["?column?"])),
        pg(Tag::DATA_ROW, start_ts + 1, &data_row(&[Some(value)])),
        pg(Tag::CMD_COMPLETE, start_ts + 2, &query("SELECT 1")),
    ]
}

#[test]
fn two_queries_pair_with_their_own_rows() {
    let mut reqs: VecDeque<_> = [
        pg(Tag::QUERY, 1, &query("SELECT 1")),
        pg(Tag::QUERY, 10, &query("SELECT 2")),
    ]
    .into();
    let mut resps: VecDeque<_> = select_group(2, "1")
        .into_iter()
        .chain(select_group(11, "2"))
        .collect();

    let out = PgsqlStitcher::default().stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 0);
    assert_eq!(out.records.len(), 2);

    assert_eq!(out.records[0].req, "SELECT 1");
    assert_eq!(out.records[0].resp, "?column?\n1\nSELECT 1");
    assert_eq!(out.records[0].timestamp_ns, 1);
    assert_eq!(out.records[0].resp_timestamp_ns, 2);

    assert_eq!(out.records[1].req, "SELECT 2");
    assert_eq!(out.records[1].resp, "?column?\n2\nSELECT 1");
    assert_eq!(out.records[1].latency_ns(), 1);

    assert!(reqs.is_empty());
    assert!(resps.is_empty());
}

#[test]
fn extended_query_keeps_parse_payload_only() {
    let mut reqs: VecDeque<_> = [
        pg(Tag::PARSE, 1, b"\0SELECT name FROM t WHERE id=$1\0\0\0"),
        pg(Tag::BIND, 1, b"\0\0\0\0\0\x01\0\0\0\x017\0\0"),
        pg(Tag::DESCRIBE, 1, b"P\0"),
        pg(Tag::EXECUTE, 1, b"\0\0\0\0\0"),
        pg(Tag::SYNC, 1, b""),
    ]
    .into();
    let mut resps: VecDeque<_> = [
        pg(Tag::PARSE_COMPLETE, 2, b""),
        pg(Tag::BIND_COMPLETE, 2, b""),
        pg(Tag::ROW_DESC, 2, &row_desc(&["name"])),
        pg(Tag::DATA_ROW, 2, &data_row(&[Some("bob")])),
        pg(Tag::CMD_COMPLETE, 3, &query("SELECT 1")),
        pg(Tag::READY_FOR_QUERY, 3, b"I"),
    ]
    .into();

    let out = PgsqlStitcher::default().stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 0);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].req, "SELECT name FROM t WHERE id=$1");
    assert_eq!(out.records[0].resp, "name\nbob\nSELECT 1");
    assert!(reqs.is_empty());
    assert_eq!(resps.len(), 1);
}

#[test]
fn corrupted_response_costs_one_exchange() {
    let mut stitcher = PgsqlStitcher::default();
    let mut reqs: VecDeque<_> = [
        pg(Tag::QUERY, 1, &query("SELECT 1")),
        pg(Tag::QUERY, 10, &query("SELECT 2")),
    ]
    .into();
    let mut resps: VecDeque<_> = select_group(2, "1").into();
    // Command complete of the second exchange was lost to garbage.
    resps.push_back(pg(Tag::DATA_ROW, 11, b"\xff\xff\xff"));

    let out = stitcher.stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 1);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].req, "SELECT 1");
    assert!(reqs.is_empty());

    reqs.push_back(pg(Tag::QUERY, 20, &query("SELECT 3")));
    resps.extend(select_group(21, "3"));

    let out = stitcher.stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 0);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].req, "SELECT 3");
    assert_eq!(out.records[0].resp, "?column?\n3\nSELECT 1");
    assert_eq!(out.records[0].resp_timestamp_ns, 21);
    assert!(reqs.is_empty());
    assert!(resps.is_empty());
}

#[test]
fn ready_for_query_between_groups_joins_the_next_group() {
    let mut reqs: VecDeque<_> = [
        pg(Tag::QUERY, 1, &query("SELECT 1")),
        pg(Tag::QUERY, 2, &query("SELECT 2")),
    ]
    .into();
    let mut resps: VecDeque<_> = select_group(5, "1").into();
    resps.push_back(pg(Tag::READY_FOR_QUERY, 8, b"I"));
    resps.extend(select_group(9, "2"));
    resps.push_back(pg(Tag::READY_FOR_QUERY, 12, b"I"));

    let out = PgsqlStitcher::default().stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 0);
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[1].resp, "?column?\n2\nSELECT 1");
    assert_eq!(out.records[1].resp_timestamp_ns, 8);
    assert_eq!(resps.len(), 1);
}

#[test]
fn ready_for_query_inside_a_group_does_not_end_it() {
    let mut reqs: VecDeque<_> = [pg(Tag::QUERY, 1, &query("SELECT 1"))].into();
    let mut resps: VecDeque<_> = [
        pg(Tag::ROW_DESC, 2, &row_desc(&["?column?"])),
        pg(Tag::READY_FOR_QUERY, 3, b"I"),
        pg(Tag::CMD_COMPLETE, 4, &query("SELECT 0")),
    ]
    .into();

    let out = PgsqlStitcher::default().stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 0);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].resp_timestamp_ns, 2);
    assert!(resps.is_empty());
}

#[test]
fn query_without_terminator_is_dropped_and_counted() {
    let mut stitcher = PgsqlStitcher::default();
    let mut reqs: VecDeque<_> = [
        pg(Tag::QUERY, 1, &query("SELECT 1")),
        pg(Tag::QUERY, 10, &query("SELECT 2")),
    ]
    .into();
    let mut resps: VecDeque<_> = select_group(2, "1").into();
    resps.push_back(pg(Tag::ROW_DESC, 11, &row_desc(&["?column?"])));
    resps.push_back(pg(Tag::DATA_ROW, 12, &data_row(&[Some("2")])));

    let out = stitcher.stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 1);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].req, "SELECT 1");
    assert!(reqs.is_empty());
    assert_eq!(resps.len(), 2);

    // The late terminator has no request left to answer.
    resps.push_back(pg(Tag::CMD_COMPLETE, 13, &query("SELECT 1")));
    let again = stitcher.stitch(&mut reqs, &mut resps);
    assert_eq!(again, Default::default());
    assert_eq!(resps.len(), 3);
}

#[test]
fn responses_before_the_request_are_skipped() {
    let mut reqs: VecDeque<_> = [pg(Tag::QUERY, 10, &query("BEGIN"))].into();
    let mut resps: VecDeque<_> = [
        pg(Tag::READY_FOR_QUERY, 1, b"I"),
        pg(Tag::CMD_COMPLETE, 11, &query("BEGIN")),
    ]
    .into();

    let out = PgsqlStitcher::default().stitch(&mut reqs, &mut resps);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].resp, "BEGIN");
    assert!(resps.is_empty());
}

#[test]
fn error_response_renders_message_field() {
    let mut reqs: VecDeque<_> = [pg(Tag::QUERY, 1, &query("SELEC 1"))].into();
    let mut resps: VecDeque<_> = [
        pg(
            Tag::ERR_RESP,
            2,
            b"SERROR\0VERROR\0C42601\0Msyntax error at or near \"SELEC\"\0P1\0\0",
        ),
        pg(Tag::READY_FOR_QUERY, 3, b"I"),
    ]
    .into();

    let out = PgsqlStitcher::default().stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 0);
    assert_eq!(out.records[0].resp, "syntax error at or near \"SELEC\"");
}

#[test]
fn password_and_unhandled_tags_are_not_errors() {
    let mut reqs: VecDeque<_> = [
        pg(Tag::PASSWD, 1, b"md5abc\0"),
        pg(Tag::FUNCTION_CALL, 3, b"\0\0\0\x01"),
        pg(Tag::QUERY, 5, &query("BEGIN")),
    ]
    .into();
    let mut resps: VecDeque<_> = [
        pg(Tag::AUTH, 2, b"\0\0\0\0"),
        pg(Tag::FUNCTION_CALL_RESP, 4, b"\xff\xff\xff\xff"),
        pg(Tag::READY_FOR_QUERY, 4, b"I"),
        pg(Tag::CMD_COMPLETE, 6, &query("BEGIN")),
    ]
    .into();

    let out = PgsqlStitcher::default().stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 0);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].req, "BEGIN");
}

#[test]
fn extended_query_without_response_terminator_skips_past_execute() {
    let mut stitcher = PgsqlStitcher::default();
    let mut reqs: VecDeque<_> = [
        pg(Tag::PARSE, 1, b"\0SELECT 1\0\0\0"),
        pg(Tag::BIND, 1, b"\0\0\0\0\0\0\0"),
        pg(Tag::EXECUTE, 1, b"\0\0\0\0\0"),
    ]
    .into();
    let mut resps: VecDeque<_> = [
        pg(Tag::PARSE_COMPLETE, 2, b""),
        pg(Tag::BIND_COMPLETE, 2, b""),
    ]
    .into();

    let out = stitcher.stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 1);
    assert!(out.records.is_empty());
    assert!(reqs.is_empty());
    assert_eq!(resps.len(), 2);

    reqs.push_back(pg(Tag::QUERY, 10, &query("BEGIN")));
    resps.push_back(pg(Tag::CMD_COMPLETE, 11, &query("BEGIN")));

    let out = stitcher.stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 0);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].req, "BEGIN");
    assert_eq!(out.records[0].resp, "BEGIN");
    assert!(resps.is_empty());
}

#[test]
fn extended_query_without_execute_stops_the_pass() {
    let mut reqs: VecDeque<_> = [
        pg(Tag::PARSE, 1, b"\0SELECT 1\0\0\0"),
        pg(Tag::BIND, 1, b"\0\0"),
    ]
    .into();
    let mut resps: VecDeque<_> = [pg(Tag::PARSE_COMPLETE, 2, b"")].into();

    let out = PgsqlStitcher::default().stitch(&mut reqs, &mut resps);
    assert_eq!(out.error_count, 1);
    assert!(out.records.is_empty());
    assert_eq!(reqs.len(), 2);
    assert_eq!(resps.len(), 1);
}

#[test]
fn assemble_and_collect_primitives() {
    let resps: VecDeque<_> = select_group(2, "1").into();
    let mut pos = 0;
    let group = assemble_response_group(&resps, &mut pos).unwrap();
    assert_eq!(pos, 3);
    assert_eq!(group.timestamp_ns, 2);

    let mut pos = 0;
    let partial: VecDeque<_> = [pg(Tag::ROW_DESC, 2, &row_desc(&["a"]))].into();
    assert_eq!(
        assemble_response_group(&partial, &mut pos),
        Err(StitchError::NoResponseTerminator)
    );
    assert_eq!(pos, 0);

    let reqs: VecDeque<_> = [pg(Tag::EXECUTE, 1, b"\0\0\0\0\0")].into();
    let mut pos = 0;
    assert_eq!(
        collect_until_marker(&reqs, &mut pos, Tag::EXECUTE),
        Err(StitchError::EmptyRequestGroup)
    );
    assert_eq!(pos, 1);

    let reqs: VecDeque<_> = [
        pg(Tag::PARSE, 1, b""),
        pg(Tag::BIND, 1, b""),
        pg(Tag::EXECUTE, 1, b""),
    ]
    .into();
    let mut pos = 0;
    assert_eq!(collect_until_marker(&reqs, &mut pos, Tag::EXECUTE), Ok(0..2));
    assert_eq!(pos, 3);

    let mut pos = 0;
    assert_eq!(
        collect_until_marker(&reqs, &mut pos, Tag::SYNC),
        Err(StitchError::NoRequestTerminator)
    );
    assert_eq!(pos, 0);
}
