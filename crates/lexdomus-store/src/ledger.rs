//! Append-only, hash-chained audit ledger (JSONL).
//!
//! Each line is one analysis:
//! `{input, output, nodes, ts, prev_hash, hash}` where
//! `hash = sha256(canonical({"rec": <line without hash>, "prev": prev_hash}))`
//! in lowercase hex. Canonical JSON sorts object keys and has no whitespace.
//! The first record has `prev_hash: null`.

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lexdomus_core::{AnalysisResult, EeeScore, Flag, RetrievalStatus};
use ring::digest::{SHA256, digest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("line {line}: stored hash does not match record contents")]
    Tampered { line: usize },

    #[error("line {line}: prev_hash does not match the preceding record")]
    BrokenChain { line: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerInput {
    pub clause: String,
    pub jurisdiction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerOutput {
    #[serde(rename = "EEE")]
    pub eee: EeeScore,
    pub flags: Vec<Flag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerNode {
    pub question: String,
    pub status: RetrievalStatus,
    pub citations: Vec<String>,
}

/// The audited content of one analysis, before chaining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub input: LedgerInput,
    pub output: LedgerOutput,
    pub nodes: Vec<LedgerNode>,
}

impl From<&AnalysisResult> for LedgerEntry {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            input: LedgerInput {
                clause: result.clause.clone(),
                jurisdiction: result.jurisdiction.to_string(),
            },
            output: LedgerOutput {
                eee: result.eee,
                flags: result.flags.clone(),
            },
            nodes: result
                .per_node
                .iter()
                .map(|n| LedgerNode {
                    question: n.node.question.clone(),
                    status: n.retrieval.status,
                    citations: n.retrieval.citations.iter().map(|c| c.doc_id.clone()).collect(),
                })
                .collect(),
        }
    }
}

/// A ledger file plus the hash of its last record.
///
/// Appends are serialised: the hash of each record depends on the previous one.
pub struct Ledger {
    path: PathBuf,
    last_hash: Mutex<Option<String>>,
}

impl Ledger {
    /// Open (or prepare to create) a ledger, resuming the chain from the last
    /// record if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let last_hash = if path.exists() { last_hash(&path)? } else { None };
        info!(path = %path.display(), resumed = last_hash.is_some(), "opened audit ledger");
        Ok(Self {
            path,
            last_hash: Mutex::new(last_hash),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record and return its hash.
    pub fn append(&self, entry: &LedgerEntry) -> Result<String, LedgerError> {
        let mut last = self.last_hash.lock().unwrap_or_else(|p| p.into_inner());

        let mut record = Map::new();
        record.insert("input".into(), serde_json::to_value(&entry.input)?);
        record.insert("output".into(), serde_json::to_value(&entry.output)?);
        record.insert("nodes".into(), serde_json::to_value(&entry.nodes)?);
        record.insert("ts".into(), Value::from(chrono::Utc::now().timestamp()));
        record.insert(
            "prev_hash".into(),
            last.clone().map_or(Value::Null, Value::String),
        );

        let hash = record_hash(&record, last.as_deref());
        record.insert("hash".into(), Value::String(hash.clone()));

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(&Value::Object(record))?;
        line.push('\n');
        file.write_all(line.as_bytes())?;

        debug!(hash = %hash, "appended ledger record");
        *last = Some(hash.clone());
        Ok(hash)
    }
}

/// Recompute every hash and check every link. Returns the record count.
pub fn verify(path: &Path) -> Result<usize, LedgerError> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut prev: Option<String> = None;
    let mut count = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (record, stored) = split_hash(&line, line_no)?;

        let linked = match record.get("prev_hash") {
            Some(Value::Null) | None => prev.is_none(),
            Some(Value::String(p)) => prev.as_deref() == Some(p.as_str()),
            Some(_) => false,
        };
        if !linked {
            return Err(LedgerError::BrokenChain { line: line_no });
        }
        if record_hash(&record, prev.as_deref()) != stored {
            return Err(LedgerError::Tampered { line: line_no });
        }

        prev = Some(stored);
        count += 1;
    }
    Ok(count)
}

fn last_hash(path: &Path) -> Result<Option<String>, LedgerError> {
    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut last = None;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        last = Some(split_hash(&line, idx + 1)?.1);
    }
    Ok(last)
}

fn split_hash(line: &str, line_no: usize) -> Result<(Map<String, Value>, String), LedgerError> {
    let malformed = |reason: &str| LedgerError::Malformed {
        line: line_no,
        reason: reason.to_string(),
    };
    let Value::Object(mut record) = serde_json::from_str(line)? else {
        return Err(malformed("record is not a JSON object"));
    };
    match record.remove("hash") {
        Some(Value::String(h)) => Ok((record, h)),
        _ => Err(malformed("missing hash")),
    }
}

fn record_hash(record: &Map<String, Value>, prev: Option<&str>) -> String {
    let mut payload = Map::new();
    payload.insert("rec".into(), Value::Object(record.clone()));
    payload.insert("prev".into(), prev.map_or(Value::Null, |p| Value::String(p.into())));

    let mut canonical = String::new();
    write_canonical(&Value::Object(payload), &mut canonical);
    hex_encode(digest(&SHA256, canonical.as_bytes()).as_ref())
}

/// Compact JSON with object keys sorted at every level.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        leaf => out.push_str(&leaf.to_string()),
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
