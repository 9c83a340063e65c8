//! Read-only view over the decoded object graph.
//!
//! An external decoder turns the record stream into JSON: a tree of
//! record objects carrying `RecordTypeEnum`, `ObjectId`, `Values`
//! (where a value may be `{"IdRef": n}`) and `ClassInfo/MemberNames`.
//! This module indexes that tree once per load and resolves a named
//! member slot down to the concrete (record-type tag, object ID) pair
//! whose literal encoding anchors the deck in the raw buffer.

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use crate::records::RecordType;
use crate::{EditError, Result};

pub struct Graph {
    root: Value,
    /// Every string value in the tree, mapped to the JSON-pointer paths
    /// where it occurs, in traversal order.
    string_paths: HashMap<String, Vec<String>>,
    /// First record seen carrying each ObjectId.
    object_paths: HashMap<u32, String>,
}

impl Graph {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let root: Value = serde_json::from_str(&text)?;
        Ok(Graph::new(root))
    }

    pub fn new(root: Value) -> Self {
        let mut string_paths: HashMap<String, Vec<String>> = HashMap::new();
        let mut object_paths: HashMap<u32, String> = HashMap::new();

        // Iterative walk; the decoder's output can nest deeply and the
        // indexes only need one pass.
        let mut stack: Vec<(String, &Value)> = vec![(String::new(), &root)];
        while let Some((path, value)) = stack.pop() {
            match value {
                Value::String(s) => {
                    string_paths.entry(s.clone()).or_default().push(path);
                }
                Value::Object(map) => {
                    if let Some(id) = map.get("ObjectId").and_then(Value::as_u64) {
                        object_paths.entry(id as u32).or_insert_with(|| path.clone());
                    }
                    // Reverse so the stack pops in document order.
                    for (key, child) in map.iter().rev() {
                        stack.push((format!("{path}/{}", escape_pointer(key)), child));
                    }
                }
                Value::Array(list) => {
                    for (i, child) in list.iter().enumerate().rev() {
                        stack.push((format!("{path}/{i}"), child));
                    }
                }
                _ => {}
            }
        }

        Graph {
            root,
            string_paths,
            object_paths,
        }
    }

    /// The record containing the given ObjectId, whether the id sits on
    /// the record itself or inside its ClassInfo.
    pub fn object(&self, id: u32) -> Option<&Value> {
        let path = self.object_paths.get(&id)?;
        self.record_at(path)
    }

    /// Resolves a logical member slot (for example "PersonalQuestDeck")
    /// to the terminal (record-type tag, object ID) pair: read the
    /// member's IdRef out of the owning record's Values, then follow
    /// first-value references until an object whose first value is not
    /// a reference. That object is the array record itself.
    pub fn resolve_slot(&self, member: &str) -> Result<(u8, u32)> {
        let paths = self
            .string_paths
            .get(member)
            .ok_or_else(|| unresolved(member))?;
        let mut start_ref: Option<u32> = None;
        for path in paths {
            // Only occurrences inside a class member list name a slot.
            let Some((prefix, index)) = member_name_position(path) else {
                continue;
            };
            let Some(record) = self.record_at(&prefix) else {
                continue;
            };
            if let Some(id) = record
                .pointer(&format!("/Values/{index}"))
                .and_then(id_ref)
            {
                start_ref = Some(id);
                break;
            }
        }
        let mut id = start_ref.ok_or_else(|| unresolved(member))?;

        // A malformed dump can contain a reference cycle; refuse to
        // revisit an id rather than spin.
        let mut visited: HashSet<u32> = HashSet::new();
        loop {
            if !visited.insert(id) {
                return Err(unresolved(member));
            }
            let record = self.object(id).ok_or_else(|| unresolved(member))?;
            match record.pointer("/Values/0").and_then(id_ref) {
                Some(next) => id = next,
                None => {
                    let tag = record
                        .get("RecordTypeEnum")
                        .and_then(Value::as_str)
                        .and_then(RecordType::from_name)
                        .ok_or_else(|| unresolved(member))?;
                    return Ok((tag.tag(), id));
                }
            }
        }
    }

    /// Walks up from `path` to the nearest enclosing record object (one
    /// with a RecordTypeEnum), falling back to the value at the path.
    fn record_at(&self, path: &str) -> Option<&Value> {
        let mut current = path.to_string();
        loop {
            if let Some(v) = self.root.pointer(&current) {
                if v.get("RecordTypeEnum").is_some() {
                    return Some(v);
                }
            }
            match current.rfind('/') {
                Some(pos) => current.truncate(pos),
                None => break,
            }
            if current.is_empty() {
                break;
            }
        }
        self.root.pointer(path)
    }
}

fn unresolved(member: &str) -> EditError {
    EditError::UnresolvedReference(member.to_string())
}

fn id_ref(value: &Value) -> Option<u32> {
    value.get("IdRef").and_then(Value::as_u64).map(|v| v as u32)
}

/// For a pointer ending in `.../ClassInfo/MemberNames/<i>`, returns the
/// record prefix and the member index `i`.
fn member_name_position(path: &str) -> Option<(String, usize)> {
    let (rest, index) = path.rsplit_once('/')?;
    let index: usize = index.parse().ok()?;
    let (rest, names) = rest.rsplit_once('/')?;
    if names != "MemberNames" {
        return None;
    }
    let (prefix, class_info) = rest.rsplit_once('/')?;
    if class_info != "ClassInfo" {
        return None;
    }
    Some((prefix.to_string(), index))
}

fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}
