/// Durable item store. `position` preserves collection order across loads.
pub const ITEMS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY,
    position INTEGER NOT NULL,
    data BLOB NOT NULL
);
"#;

/// Response cache, one row per (partition, request key).
pub const RESPONSES_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    partition TEXT NOT NULL,
    key_hash TEXT NOT NULL,
    request_key TEXT NOT NULL,
    status INTEGER NOT NULL,
    url TEXT NOT NULL,
    headers TEXT NOT NULL,
    body BLOB NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (partition, key_hash)
);

CREATE INDEX IF NOT EXISTS idx_responses_partition ON responses(partition);
"#;
