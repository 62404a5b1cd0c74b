//! SQL migration definitions for the copydesk database.
//!
//! Migrations are applied in order on database open. Each migration has a
//! version number and a batch of SQL statements.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: generations, enrichment_cache",
            sql: r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Generated product content history
CREATE TABLE IF NOT EXISTS generations (
    id           TEXT PRIMARY KEY,
    code         TEXT NOT NULL,
    title        TEXT NOT NULL,
    category     TEXT NOT NULL,
    content_json TEXT NOT NULL,
    confidence   REAL NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL,
    used         INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_generations_code ON generations(code);
CREATE INDEX IF NOT EXISTS idx_generations_created ON generations(created_at);

-- Manufacturer scrape / search cache
CREATE TABLE IF NOT EXISTS enrichment_cache (
    cache_key    TEXT PRIMARY KEY,
    source       TEXT NOT NULL,
    payload_json TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "Record when a generation was marked used",
            sql: r#"
ALTER TABLE generations ADD COLUMN used_at TEXT;

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}
