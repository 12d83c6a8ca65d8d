//! PostgreSQL stitching.
//!
//! Query modes:
//! - Simple query: one `Query` frame answered by a response group ending in
//!   CommandComplete or ErrorResponse.
//! - Extended query: `Parse`, `Bind`, `Describe`, ... up to `Execute`,
//!   answered by one response group. Only the `Parse` payload is kept.
//! - Batches of either kind: responses come back in request order.
//!
//! A request whose response group has no terminator yet is counted as an
//! error and dropped.
//! Pipelined extended queries without an `Execute` per group are not handled.

use std::collections::{HashSet, VecDeque};
use std::ops::Range;

use wirestitch_core::protocol::pgsql::{RegularFrame, Tag};

use super::{Record, RecordsWithErrorCount, StitchError, Stitcher};
use crate::config::PgsqlSection;
use crate::format::pgsql::format_cmd_resp;
use crate::format::strip_nul;

/// Rendered response group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResponse {
    /// Capture time of the first frame of the group.
    pub timestamp_ns: u64,
    pub payload: String,
}

/// Skip responses captured before `ts`: they cannot answer a request sent at `ts`.
fn advance_beyond_timestamp(resps: &VecDeque<RegularFrame>, pos: &mut usize, ts: u64) {
    while resps.get(*pos).is_some_and(|f| f.timestamp_ns < ts) {
        *pos += 1;
    }
}

/// Render `[pos, first CommandComplete/ErrorResponse]` and move `pos` past it.
///
/// Fails with `NoResponseTerminator`, leaving `pos` untouched, when no
/// terminator is queued.
pub fn assemble_response_group(
    resps: &VecDeque<RegularFrame>,
    pos: &mut usize,
) -> Result<AssembledResponse, StitchError> {
    let end = resps
        .iter()
        .skip(*pos)
        .position(|f| matches!(f.tag, Tag::CMD_COMPLETE | Tag::ERR_RESP))
        .map(|i| *pos + i)
        .ok_or(StitchError::NoResponseTerminator)?;

    let group: Vec<&RegularFrame> = resps.range(*pos..=end).collect();
    let timestamp_ns = group.first().map(|f| f.timestamp_ns).unwrap_or_default();
    let payload = format_cmd_resp(&group);
    *pos = end + 1;

    Ok(AssembledResponse {
        timestamp_ns,
        payload,
    })
}

/// Index range of the frames before the next `terminator`; moves `pos` past it.
///
/// `pos` stays put when the terminator is missing. An empty group still
/// consumes the terminator.
pub fn collect_until_marker(
    reqs: &VecDeque<RegularFrame>,
    pos: &mut usize,
    terminator: Tag,
) -> Result<Range<usize>, StitchError> {
    let end = reqs
        .iter()
        .skip(*pos)
        .position(|f| f.tag == terminator)
        .map(|i| *pos + i)
        .ok_or(StitchError::NoRequestTerminator)?;
    let start = *pos;
    *pos = end + 1;
    if end == start {
        return Err(StitchError::EmptyRequestGroup);
    }
    Ok(start..end)
}

fn make_record(req: &RegularFrame, resp: AssembledResponse) -> Record {
    Record {
        timestamp_ns: req.timestamp_ns,
        resp_timestamp_ns: resp.timestamp_ns,
        command: None,
        req: strip_nul(&String::from_utf8_lossy(&req.payload)).to_string(),
        resp: strip_nul(&resp.payload).to_string(),
    }
}

pub struct PgsqlStitcher {
    unhandled_tag_log_limit: usize,
    logged_tags: HashSet<u8>,
}

impl PgsqlStitcher {
    pub fn new(cfg: &PgsqlSection) -> Self {
        Self {
            unhandled_tag_log_limit: cfg.unhandled_tag_log_limit,
            logged_tags: HashSet::new(),
        }
    }

    /// Warn once per distinct tag, for at most `unhandled_tag_log_limit` tags.
    fn log_unhandled(&mut self, tag: Tag) {
        if self.logged_tags.len() >= self.unhandled_tag_log_limit
            || !self.logged_tags.insert(tag.0)
        {
            return;
        }
        tracing::warn!(protocol = "pgsql", tag = %tag.as_char(), "unhandled request tag");
    }
}

impl Default for PgsqlStitcher {
    fn default() -> Self {
        Self::new(&PgsqlSection::default())
    }
}

impl Stitcher for PgsqlStitcher {
    type Frame = RegularFrame;

    fn protocol(&self) -> &'static str {
        "pgsql"
    }

    fn stitch(
        &mut self,
        reqs: &mut VecDeque<RegularFrame>,
        resps: &mut VecDeque<RegularFrame>,
    ) -> RecordsWithErrorCount {
        let mut out = RecordsWithErrorCount::default();
        let mut req_pos = 0;
        let mut resp_pos = 0;

        while req_pos < reqs.len() && resp_pos < resps.len() {
            let Some(req) = reqs.get(req_pos) else {
                break;
            };
            advance_beyond_timestamp(resps, &mut resp_pos, req.timestamp_ns);

            match req.tag {
                // Auth exchanges are skipped, not validated. A Sync left
                // over from a finished extended query carries nothing.
                Tag::READY_FOR_QUERY | Tag::PASSWD | Tag::SYNC => {
                    tracing::debug!(tag = %req.tag.as_char(), "skipping request frame");
                    req_pos += 1;
                }
                Tag::QUERY => {
                    match assemble_response_group(resps, &mut resp_pos) {
                        Ok(resp) => out.records.push(make_record(req, resp)),
                        Err(e) => {
                            out.error_count += 1;
                            tracing::debug!(error = %e, "failed to assemble query response");
                        }
                    }
                    req_pos += 1;
                }
                Tag::PARSE => {
                    let mut next_req = req_pos;
                    let collected = collect_until_marker(reqs, &mut next_req, Tag::EXECUTE);
                    if next_req == req_pos {
                        // No Execute queued: the group cannot be judged in this pass.
                        out.error_count += 1;
                        tracing::debug!("extended query has no execute request");
                        break;
                    }
                    req_pos = next_req;
                    let collected = match collected {
                        Ok(c) => c,
                        Err(e) => {
                            out.error_count += 1;
                            tracing::debug!(
                                error = %e,
                                "failed to collect extended query requests"
                            );
                            continue;
                        }
                    };
                    match assemble_response_group(resps, &mut resp_pos) {
                        Ok(resp) => {
                            if let Some(first) = reqs.get(collected.start) {
                                out.records.push(make_record(first, resp));
                            }
                        }
                        Err(e) => {
                            out.error_count += 1;
                            tracing::debug!(
                                error = %e,
                                "failed to assemble extended query response"
                            );
                        }
                    }
                }
                tag => {
                    self.log_unhandled(tag);
                    req_pos += 1;
                }
            }
        }

        reqs.drain(..req_pos);
        resps.drain(..resp_pos);
        out
    }
}
