//! Batch input format for a reference driver.
//!
//! Grounded on `original_source/spicy/toolchain/bin/spicy-batch-extract.cc`'s
//! `processPreBatchedInput`: a `!spicy-batch v2` text header followed by
//! directive lines, with `@data` directives carrying their payload inline
//! as raw bytes rather than a text-escaped form. [`read_batch`] parses the
//! whole stream into [`BatchDirective`]s; [`select`] mirrors the original
//! tool's needle-driven filtering, which pulls in both ends of a
//! connection once its id matches.

use std::collections::HashSet;
use std::io::BufRead;

use spicy_runtime::{Failure, Result};

pub const MAGIC: &str = "!spicy-batch v2";

/// One line of a batch file, already split into its fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchDirective {
    BeginFlow { id: String, parser: String, unit_type: String },
    BeginConn { cid: String, unit_type: String, orig_id: String, orig_parser: String, resp_id: String, resp_parser: String },
    Data { id: String, bytes: Vec<u8> },
    EndFlow { id: String },
    EndConn { cid: String },
}

/// Reads a complete `!spicy-batch v2` stream, failing on a missing/wrong
/// header, a malformed directive, an unrecognized directive name, or a
/// `@data` payload truncated before its declared size. Unknown directives
/// are fatal.
pub fn read_batch<R: BufRead>(mut input: R) -> Result<Vec<BatchDirective>> {
    let mut magic = String::new();
    read_line(&mut input, &mut magic)?;
    if magic.trim_end_matches(['\r', '\n']) != MAGIC {
        return Err(Failure::InvalidValue("input is not a Spicy batch file".into()));
    }

    let mut directives = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        let n = read_line(&mut input, &mut line)?;
        if n == 0 {
            break;
        }
        let cmd = line.trim();
        if cmd.is_empty() {
            continue;
        }

        let parts: Vec<&str> = cmd.split_whitespace().collect();
        directives.push(match parts[0] {
            "@begin-flow" => {
                let [id, parser, unit_type] = require_fields(&parts, "@begin-flow")?;
                BatchDirective::BeginFlow { id, parser, unit_type }
            }
            "@begin-conn" => {
                let fields = require_fields_n::<6>(&parts, "@begin-conn")?;
                let [cid, unit_type, orig_id, orig_parser, resp_id, resp_parser] = fields;
                BatchDirective::BeginConn { cid, unit_type, orig_id, orig_parser, resp_id, resp_parser }
            }
            "@data" => {
                let [id, size] = require_fields(&parts, "@data")?;
                let size: usize = size
                    .parse()
                    .map_err(|_| Failure::InvalidValue(format!("invalid @data size '{size}'")))?;
                let mut bytes = vec![0u8; size];
                std::io::Read::read_exact(&mut input, &mut bytes)
                    .map_err(|e| Failure::InvalidValue(format!("premature end of @data: {e}")))?;
                let mut newline = [0u8; 1];
                std::io::Read::read_exact(&mut input, &mut newline)
                    .map_err(|e| Failure::InvalidValue(format!("premature end of @data: {e}")))?;
                BatchDirective::Data { id, bytes }
            }
            "@end-flow" => {
                let [id] = require_fields(&parts, "@end-flow")?;
                BatchDirective::EndFlow { id }
            }
            "@end-conn" => {
                let [cid] = require_fields(&parts, "@end-conn")?;
                BatchDirective::EndConn { cid }
            }
            other => return Err(Failure::InvalidValue(format!("unknown batch directive '{other}'"))),
        });
    }
    Ok(directives)
}

fn read_line<R: BufRead>(input: &mut R, buf: &mut String) -> Result<usize> {
    input.read_line(buf).map_err(|e| Failure::InvalidValue(format!("batch read error: {e}")))
}

/// Checks `parts` (including the directive name at index 0) carries
/// exactly `N + 1` fields and returns the trailing `N` as owned strings.
fn require_fields<const N: usize>(parts: &[&str], directive: &str) -> Result<[String; N]> {
    require_fields_n::<N>(parts, directive)
}

fn require_fields_n<const N: usize>(parts: &[&str], directive: &str) -> Result<[String; N]> {
    if parts.len() != N + 1 {
        return Err(Failure::InvalidValue(format!("unexpected number of arguments for {directive}")));
    }
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, field) in out.iter_mut().zip(&parts[1..]) {
        *slot = field.to_string();
    }
    Ok(out)
}

/// Filters `directives` down to the subset reachable from `needle`,
/// mirroring `spicy-batch-extract`'s behavior: matching a `@begin-conn`
/// pulls both its originator and responder flow ids into the needle set
/// for the rest of the scan.
pub fn select(directives: &[BatchDirective], needle: &str) -> Vec<BatchDirective> {
    let mut needles: HashSet<String> = HashSet::new();
    needles.insert(needle.to_string());
    let mut out = Vec::new();

    for directive in directives {
        let keep = match directive {
            BatchDirective::BeginFlow { id, .. } | BatchDirective::Data { id, .. } | BatchDirective::EndFlow { id } => {
                needles.contains(id)
            }
            BatchDirective::BeginConn { cid, orig_id, resp_id, .. } => {
                let matched = needles.contains(cid);
                if matched {
                    needles.insert(orig_id.clone());
                    needles.insert(resp_id.clone());
                }
                matched
            }
            BatchDirective::EndConn { cid } => needles.contains(cid),
        };
        if keep {
            out.push(directive.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> &'static str {
        "!spicy-batch v2\n\
         @begin-conn c1 TCP f1 MyParser f2 MyParser\n\
         @data f1 5\n\
         hello\n\
         @end-conn c1\n"
    }

    #[test]
    fn reads_every_directive_in_order() {
        let directives = read_batch(Cursor::new(sample().as_bytes())).unwrap();
        assert_eq!(directives.len(), 3);
        assert!(matches!(&directives[0], BatchDirective::BeginConn { cid, .. } if cid == "c1"));
        assert!(matches!(&directives[1], BatchDirective::Data { id, bytes } if id == "f1" && bytes == b"hello"));
        assert!(matches!(&directives[2], BatchDirective::EndConn { cid } if cid == "c1"));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let err = read_batch(Cursor::new(b"not a batch\n".as_slice())).unwrap_err();
        assert!(matches!(err, Failure::InvalidValue(_)));
    }

    #[test]
    fn unknown_directive_is_fatal() {
        let input = "!spicy-batch v2\n@unknown x\n";
        let err = read_batch(Cursor::new(input.as_bytes())).unwrap_err();
        assert!(matches!(err, Failure::InvalidValue(_)));
    }

    #[test]
    fn truncated_data_payload_is_an_error() {
        let input = "!spicy-batch v2\n@data f1 10\nshort\n";
        let err = read_batch(Cursor::new(input.as_bytes())).unwrap_err();
        assert!(matches!(err, Failure::InvalidValue(_)));
    }

    #[test]
    fn select_follows_connection_into_both_flow_ids() {
        let directives = read_batch(Cursor::new(sample().as_bytes())).unwrap();
        let selected = select(&directives, "c1");
        assert_eq!(selected.len(), directives.len());
    }

    #[test]
    fn select_drops_directives_for_other_ids() {
        let input = "!spicy-batch v2\n\
                      @begin-flow f1 MyParser Foo\n\
                      @begin-flow f2 MyParser Bar\n\
                      @end-flow f1\n\
                      @end-flow f2\n";
        let directives = read_batch(Cursor::new(input.as_bytes())).unwrap();
        let selected = select(&directives, "f1");
        assert_eq!(selected.len(), 2);
    }
}
