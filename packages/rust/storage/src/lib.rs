//! libSQL storage layer (local file).
//!
//! The [`Storage`] struct wraps a libSQL database holding the history of
//! generated product content and a cache of enrichment lookups.
//!
//! **Access rules:**
//! - `generate`: read-write via [`Storage::open`]
//! - inspection commands (`history list/show`): read-only via [`Storage::open_readonly`]

mod migrations;

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use copydesk_shared::{CopydeskError, GeneratedContent, GenerationId, Result};
use libsql::{Connection, Database, params};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// One row of generation history, without the content body.
#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub id: String,
    pub code: String,
    pub title: String,
    pub category: String,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
    pub used: bool,
}

/// A stored generation with its full content.
#[derive(Debug, Clone)]
pub struct GenerationRecord {
    pub summary: GenerationSummary,
    pub used_at: Option<DateTime<Utc>>,
    pub content: GeneratedContent,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| CopydeskError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open an existing database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CopydeskError::file_not_found(path));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    CopydeskError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(CopydeskError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Generation history
    // -----------------------------------------------------------------------

    /// Store a generated content set. Returns its new ID.
    pub async fn insert_generation(&self, content: &GeneratedContent) -> Result<GenerationId> {
        self.check_writable()?;
        let id = GenerationId::new();
        let json = serde_json::to_string(content).map_err(|e| CopydeskError::Storage(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO generations (id, code, title, category, content_json, confidence, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    id.to_string(),
                    content.code.as_str(),
                    content.title.as_str(),
                    content.category.as_str(),
                    json,
                    content.style_confidence,
                    content.generated_at.to_rfc3339_opts(SecondsFormat::Micros, true),
                ],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(%id, code = %content.code, "stored generation");
        Ok(id)
    }

    /// Fetch one generation with its content.
    pub async fn get_generation(&self, id: &str) -> Result<Option<GenerationRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, code, title, category, confidence, created_at, used, used_at, content_json
                 FROM generations WHERE id = ?1",
                params![id],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => {
                let summary = row_to_summary(&row)?;
                let used_at = row
                    .get::<String>(7)
                    .ok()
                    .map(|s| parse_timestamp(&s))
                    .transpose()?;
                let json: String = row.get(8).map_err(storage_err)?;
                let content = serde_json::from_str(&json).map_err(|e| {
                    CopydeskError::Storage(format!("corrupt content for generation {id}: {e}"))
                })?;
                Ok(Some(GenerationRecord {
                    summary,
                    used_at,
                    content,
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Most recent generations first, optionally for one product code.
    pub async fn list_generations(
        &self,
        code: Option<&str>,
        limit: u32,
    ) -> Result<Vec<GenerationSummary>> {
        let mut rows = match code {
            Some(code) => {
                self.conn
                    .query(
                        "SELECT id, code, title, category, confidence, created_at, used
                         FROM generations WHERE UPPER(code) = UPPER(?1)
                         ORDER BY created_at DESC, id DESC LIMIT ?2",
                        params![code.trim(), limit],
                    )
                    .await
            }
            None => {
                self.conn
                    .query(
                        "SELECT id, code, title, category, confidence, created_at, used
                         FROM generations ORDER BY created_at DESC, id DESC LIMIT ?1",
                        params![limit],
                    )
                    .await
            }
        }
        .map_err(storage_err)?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            results.push(row_to_summary(&row)?);
        }
        Ok(results)
    }

    /// Flag a generation as published. Returns `false` for an unknown ID.
    pub async fn mark_generation_used(&self, id: &str) -> Result<bool> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        let affected = self
            .conn
            .execute(
                "UPDATE generations SET used = 1, used_at = ?1 WHERE id = ?2",
                params![now.as_str(), id],
            )
            .await
            .map_err(storage_err)?;
        Ok(affected > 0)
    }

    // -----------------------------------------------------------------------
    // Enrichment cache
    // -----------------------------------------------------------------------

    /// Get a cached enrichment payload.
    pub async fn get_enrichment_cache(&self, cache_key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT payload_json FROM enrichment_cache WHERE cache_key = ?1",
                params![cache_key],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row.get::<String>(0).map_err(storage_err)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Store an enrichment payload (upserts).
    pub async fn set_enrichment_cache(
        &self,
        cache_key: &str,
        source: &str,
        payload_json: &str,
    ) -> Result<()> {
        self.check_writable()?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO enrichment_cache (cache_key, source, payload_json, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(cache_key) DO UPDATE SET
                   source = excluded.source,
                   payload_json = excluded.payload_json,
                   created_at = excluded.created_at",
                params![cache_key, source, payload_json, now.as_str()],
            )
            .await
            .map_err(storage_err)?;
        Ok(())
    }

    /// Drop every cached enrichment entry. Returns the number removed.
    pub async fn clear_enrichment_cache(&self) -> Result<u64> {
        self.check_writable()?;
        self.conn
            .execute("DELETE FROM enrichment_cache", params![])
            .await
            .map_err(storage_err)
    }
}

fn storage_err(e: libsql::Error) -> CopydeskError {
    CopydeskError::Storage(e.to_string())
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CopydeskError::Storage(format!("invalid date: {e}")))
}

/// Convert the first seven columns of a generations row.
fn row_to_summary(row: &libsql::Row) -> Result<GenerationSummary> {
    Ok(GenerationSummary {
        id: row.get::<String>(0).map_err(storage_err)?,
        code: row.get::<String>(1).map_err(storage_err)?,
        title: row.get::<String>(2).map_err(storage_err)?,
        category: row.get::<String>(3).map_err(storage_err)?,
        confidence: row.get::<f64>(4).unwrap_or(0.0),
        created_at: parse_timestamp(&row.get::<String>(5).map_err(storage_err)?)?,
        used: row.get::<i64>(6).unwrap_or(0) != 0,
    })
}
