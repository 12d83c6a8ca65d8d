//! Redis stitching.
//!
//! Redis answers requests in order, one response message each, so the
//! response queue drives: every response pairs with the oldest pending
//! request. Pub/sub pushes are unsolicited and become records on their own.

use std::collections::VecDeque;

use wirestitch_core::protocol::redis::Message;

use super::{Record, RecordsWithErrorCount, StitchError, Stitcher};

/// Command reported for pub/sub push records.
pub const PUSH_PUB_COMMAND: &str = "PUSH PUB";

#[derive(Debug, Default)]
pub struct RedisStitcher;

impl RedisStitcher {
    pub fn new() -> Self {
        Self
    }
}

impl Stitcher for RedisStitcher {
    type Frame = Message;

    fn protocol(&self) -> &'static str {
        "redis"
    }

    fn stitch(
        &mut self,
        reqs: &mut VecDeque<Message>,
        resps: &mut VecDeque<Message>,
    ) -> RecordsWithErrorCount {
        let mut out = RecordsWithErrorCount::default();
        let mut req_pos = 0;
        let mut resp_pos = 0;

        while let Some(resp) = resps.get(resp_pos) {
            if resp.is_published_message {
                out.records.push(Record {
                    timestamp_ns: resp.timestamp_ns,
                    resp_timestamp_ns: resp.timestamp_ns,
                    command: Some(PUSH_PUB_COMMAND.to_string()),
                    req: String::new(),
                    resp: resp.payload.clone(),
                });
                resp_pos += 1;
                continue;
            }

            // The request may still be in flight in the other direction.
            let Some(req) = reqs.get(req_pos) else {
                break;
            };

            if req.timestamp_ns > resp.timestamp_ns {
                out.error_count += 1;
                tracing::debug!(
                    error = %StitchError::OrphanResponse,
                    resp_ts = resp.timestamp_ns,
                    "dropping response"
                );
                resp_pos += 1;
                continue;
            }

            out.records.push(Record {
                timestamp_ns: req.timestamp_ns,
                resp_timestamp_ns: resp.timestamp_ns,
                command: req.command.clone(),
                req: req.payload.clone(),
                resp: resp.payload.clone(),
            });
            req_pos += 1;
            resp_pos += 1;
        }

        reqs.drain(..req_pos);
        resps.drain(..resp_pos);
        out
    }
}
