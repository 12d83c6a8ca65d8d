//! Per-command argument shapes used to render request arrays.
//!
//! Descriptor text forms:
//! - `name`             required, exactly one argument
//! - `[name]`           optional, zero or one argument
//! - `name [name ...]`  zero or more arguments (must be the last slot)

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgFormat {
    Required,
    List,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDesc {
    pub name: String,
    pub format: ArgFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgMatchError {
    #[error("missing required argument '{name}'")]
    MissingRequired { name: String },
    #[error("{count} arguments left unmatched")]
    UnconsumedArgs { count: usize },
    #[error("command has no supported argument descriptors")]
    UnsupportedDescriptor,
}

/// One parsed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue<'a> {
    Single(&'a str),
    List(&'a [String]),
}

/// Argument shape of one command.
#[derive(Debug, Clone)]
pub struct CmdArgs {
    name: &'static str,
    descs: Option<Vec<ArgDesc>>,
}

impl CmdArgs {
    /// Compile descriptor strings. Unsupported shapes leave the command
    /// without descriptors; it is then always rendered as a plain array.
    pub fn new(name: &'static str, raw: &[&str]) -> Self {
        let descs: Option<Vec<ArgDesc>> = raw.iter().map(|r| parse_arg_desc(r)).collect();
        let descs = descs.filter(|d| {
            d.iter()
                .position(|a| a.format == ArgFormat::List)
                .map_or(true, |i| i + 1 == d.len())
        });
        if descs.is_none() {
            tracing::debug!(cmd = name, "unsupported argument descriptors");
        }
        Self { name, descs }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn descs(&self) -> Option<&[ArgDesc]> {
        self.descs.as_deref()
    }

    /// Attribute `args` to descriptor slots in order.
    pub fn match_args<'a>(
        &'a self,
        args: &'a [String],
    ) -> Result<Vec<(&'a str, ArgValue<'a>)>, ArgMatchError> {
        let descs = self.descs.as_ref().ok_or(ArgMatchError::UnsupportedDescriptor)?;
        let mut out = Vec::with_capacity(descs.len());
        let mut i = 0;
        for desc in descs {
            match desc.format {
                ArgFormat::Required => {
                    let arg = args.get(i).ok_or_else(|| ArgMatchError::MissingRequired {
                        name: desc.name.clone(),
                    })?;
                    out.push((desc.name.as_str(), ArgValue::Single(arg.as_str())));
                    i += 1;
                }
                ArgFormat::Optional => {
                    if let Some(arg) = args.get(i) {
                        out.push((desc.name.as_str(), ArgValue::Single(arg.as_str())));
                        i += 1;
                    }
                }
                ArgFormat::List => {
                    let rest = args.get(i..).unwrap_or_default();
                    out.push((desc.name.as_str(), ArgValue::List(rest)));
                    i = args.len();
                }
            }
        }
        if i < args.len() {
            return Err(ArgMatchError::UnconsumedArgs { count: args.len() - i });
        }
        Ok(out)
    }

    /// Render matched arguments as a JSON object keyed by slot name, in
    /// declaration order. Empty lists are left out.
    pub fn fmt_args(&self, args: &[String]) -> Result<String, ArgMatchError> {
        let matched = self.match_args(args)?;
        let mut obj = Map::new();
        for (name, value) in matched {
            let v = match value {
                ArgValue::Single(s) => Value::String(s.to_string()),
                ArgValue::List([]) => continue,
                ArgValue::List(l) => Value::Array(l.iter().cloned().map(Value::String).collect()),
            };
            obj.insert(name.to_string(), v);
        }
        Ok(Value::Object(obj).to_string())
    }
}

fn parse_arg_desc(raw: &str) -> Option<ArgDesc> {
    let raw = raw.trim();
    if let Some(head) = raw.strip_suffix("...]") {
        let name = match head.strip_prefix('[') {
            Some(inner) => inner.trim(),
            // `field value [field value ...]` is keyed by its first word.
            None => head.split_whitespace().next()?,
        };
        return valid_name(name).then(|| ArgDesc {
            name: name.to_string(),
            format: ArgFormat::List,
        });
    }
    if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        let name = inner.trim();
        return valid_name(name).then(|| ArgDesc {
            name: name.to_string(),
            format: ArgFormat::Optional,
        });
    }
    valid_name(raw).then(|| ArgDesc {
        name: raw.to_string(),
        format: ArgFormat::Required,
    })
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['[', ']'])
}

macro_rules! cmd_table {
    ($($name:literal => [$($arg:literal),* $(,)?]),* $(,)?) => {
        [$(CmdArgs::new($name, &[$($arg),*])),*]
    };
}

static COMMANDS: Lazy<HashMap<&'static str, CmdArgs>> = Lazy::new(|| {
    let table = cmd_table! {
        "APPEND" => ["key", "value"],
        "CLIENT LIST" => [],
        "CLIENT SETNAME" => ["connection-name"],
        "CONFIG GET" => ["parameter"],
        "CONFIG SET" => ["parameter", "value"],
        "DBSIZE" => [],
        "DECR" => ["key"],
        "DECRBY" => ["key", "decrement"],
        "DEL" => ["key [key ...]"],
        "DISCARD" => [],
        "EVAL" => ["script", "numkeys", "[arg ...]"],
        "EVALSHA" => ["sha1", "numkeys", "[arg ...]"],
        "EXEC" => [],
        "EXISTS" => ["key [key ...]"],
        "EXPIRE" => ["key", "seconds"],
        "FLUSHALL" => ["[mode]"],
        "GET" => ["key"],
        "GETSET" => ["key", "value"],
        "HDEL" => ["key", "field [field ...]"],
        "HGET" => ["key", "field"],
        "HGETALL" => ["key"],
        "HMGET" => ["key", "field [field ...]"],
        "HMSET" => ["key", "field value [field value ...]"],
        "HSET" => ["key", "field value [field value ...]"],
        "INCR" => ["key"],
        "INCRBY" => ["key", "increment"],
        "INFO" => ["[section ...]"],
        "KEYS" => ["pattern"],
        "LINDEX" => ["key", "index"],
        "LLEN" => ["key"],
        "LPOP" => ["key", "[count]"],
        "LPUSH" => ["key", "element [element ...]"],
        "LRANGE" => ["key", "start", "stop"],
        "MGET" => ["key [key ...]"],
        "MSET" => ["key value [key value ...]"],
        "MULTI" => [],
        "PING" => ["[message]"],
        "PSUBSCRIBE" => ["pattern [pattern ...]"],
        "PUBLISH" => ["channel", "message"],
        "QUIT" => [],
        "RPOP" => ["key", "[count]"],
        "RPUSH" => ["key", "element [element ...]"],
        "SADD" => ["key", "member [member ...]"],
        "SCARD" => ["key"],
        "SCRIPT LOAD" => ["script"],
        "SELECT" => ["index"],
        "SET" => ["key", "value", "[option ...]"],
        "SETEX" => ["key", "seconds", "value"],
        "SETNX" => ["key", "value"],
        "SMEMBERS" => ["key"],
        "SREM" => ["key", "member [member ...]"],
        "SUBSCRIBE" => ["channel [channel ...]"],
        "TTL" => ["key"],
        "TYPE" => ["key"],
        "UNSUBSCRIBE" => ["[channel ...]"],
        "WATCH" => ["key [key ...]"],
        "ZRANGE" => ["key", "start", "stop", "[option ...]"],
        "ZSCORE" => ["key", "member"],
    };
    table.into_iter().map(|c| (c.name(), c)).collect()
});

/// Look up a command by name (upper case; two-word commands joined by one space).
pub fn command(name: &str) -> Option<&'static CmdArgs> {
    COMMANDS.get(name)
}

/// Find the command named by the head of a request array.
///
/// Two-word commands (`CONFIG GET`) win over one-word ones. Returns the
/// command and the number of array elements its name spans.
pub fn lookup_command(items: &[String]) -> Option<(&'static CmdArgs, usize)> {
    let first = items.first()?.to_ascii_uppercase();
    if let Some(second) = items.get(1) {
        let two = format!("{first} {}", second.to_ascii_uppercase());
        if let Some(cmd) = command(&two) {
            return Some((cmd, 2));
        }
    }
    command(&first).map(|cmd| (cmd, 1))
}
