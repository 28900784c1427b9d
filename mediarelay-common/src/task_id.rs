//! Pull an upstream task id out of an arbitrarily shaped JSON reply.

use serde_json::Value;

/// Ids this short are treated as noise (status codes, counters, ...).
const MIN_ID_LEN: usize = 4;

/// Paths checked before falling back to a full walk of the document.
const PREFERRED_PATHS: &[&[&str]] = &[
    &["data", "taskId"],
    &["taskId"],
    &["result", "taskId"],
    &["data", "task_id"],
    &["task_id"],
    &["result", "task_id"],
    &["id"],
];

/// Case-insensitive key matcher for the recursive search.
#[derive(Debug, Clone)]
pub struct TaskIdPattern {
    keys: Vec<String>,
}

impl TaskIdPattern {
    /// Build a matcher from key names. Keys are normalised by lowercasing and
    /// dropping `_` and `-`, so `task_id`, `taskId` and `task-id` are the same key.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keys: keys.into_iter().map(|k| normalize_key(k.as_ref())).collect(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        let key = normalize_key(key);
        self.keys.iter().any(|k| *k == key)
    }
}

impl Default for TaskIdPattern {
    fn default() -> Self {
        Self::new(["taskid", "requestid", "id"])
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn as_id(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (s.len() >= MIN_ID_LEN).then_some(s)
}

fn at_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

fn scan(value: &Value, pattern: &TaskIdPattern) -> Option<String> {
    match value {
        Value::Object(map) => map.iter().find_map(|(k, v)| {
            if pattern.matches(k) {
                if let Some(id) = as_id(v) {
                    return Some(id);
                }
            }
            scan(v, pattern)
        }),
        Value::Array(items) => items.iter().find_map(|v| scan(v, pattern)),
        _ => None,
    }
}

/// Find the task id in an upstream reply.
///
/// Well-known locations whose final key `pattern` accepts are tried first, then
/// the document is walked depth-first and the first key accepted by `pattern`
/// holding a string or number wins.
pub fn find_task_id(value: &Value, pattern: &TaskIdPattern) -> Option<String> {
    PREFERRED_PATHS
        .iter()
        .filter(|path| path.last().is_some_and(|key| pattern.matches(key)))
        .filter_map(|path| at_path(value, path))
        .find_map(as_id)
        .or_else(|| scan(value, pattern))
}
