//! SQL schema migrations.
//!
//! Migration definitions live on disk as plain SQL files and are applied
//! through the [`Executor`] boundary, so the same migration set works on any
//! backend. History is tracked in a `schema_migrations` table
//! (version, name, applied_at).
//!
//! Supported file names:
//! - `V1__init.sql` (up)
//! - `V2__add_users.up.sql` (up)
//! - `V2__add_users.down.sql` (down)

use crate::client::{Executor, Row};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MIGRATION_TABLE: &str = "schema_migrations";

#[derive(Debug, Clone, PartialEq, Eq)]
enum MigrationFileKind {
    Up,
    Down,
}

/// Migration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskMigration {
    pub version: i64,
    pub name: String,
    pub up_path: PathBuf,
    pub down_path: Option<PathBuf>,
}

/// Applied migration row from the history table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_on: Option<DateTime<Utc>>,
}

/// Computed migration status for a directory + database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    pub local: Vec<DiskMigration>,
    pub applied: Vec<AppliedMigration>,
    pub pending: Vec<DiskMigration>,
    pub missing_local: Vec<AppliedMigration>,
}

fn parse_version_and_name_with_suffix(file_name: &str, suffix: &str) -> Option<(i64, String)> {
    if !file_name.starts_with('V') {
        return None;
    }
    let stem = file_name.strip_suffix(suffix)?;
    let (version_str, name) = stem[1..].split_once("__")?;
    if name.is_empty() {
        return None;
    }
    let version = version_str.parse::<i64>().ok()?;
    if version <= 0 {
        return None;
    }
    Some((version, name.to_string()))
}

fn parse_migration_filename(file_name: &str) -> Option<(i64, String, MigrationFileKind)> {
    if let Some((version, name)) = parse_version_and_name_with_suffix(file_name, ".down.sql") {
        return Some((version, name, MigrationFileKind::Down));
    }
    if let Some((version, name)) = parse_version_and_name_with_suffix(file_name, ".up.sql") {
        return Some((version, name, MigrationFileKind::Up));
    }
    parse_version_and_name_with_suffix(file_name, ".sql")
        .map(|(version, name)| (version, name, MigrationFileKind::Up))
}

#[derive(Debug, Clone)]
struct PartialDiskMigration {
    name: String,
    up_path: Option<PathBuf>,
    down_path: Option<PathBuf>,
}

/// Scan a migrations directory, pairing up/down files by version.
pub fn scan_migrations_dir(dir: impl AsRef<Path>) -> OrmResult<Vec<DiskMigration>> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| {
        OrmError::Migration(format!(
            "failed to read migrations dir {}: {e}",
            dir.display()
        ))
    })?;

    let mut by_version: BTreeMap<i64, PartialDiskMigration> = BTreeMap::new();

    for entry in entries {
        let entry = entry.map_err(|e| {
            OrmError::Migration(format!("failed to read entry in {}: {e}", dir.display()))
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };

        let Some((version, name, kind)) = parse_migration_filename(file_name) else {
            continue;
        };

        let slot = by_version
            .entry(version)
            .or_insert_with(|| PartialDiskMigration {
                name: name.clone(),
                up_path: None,
                down_path: None,
            });

        if slot.name != name {
            return Err(OrmError::Migration(format!(
                "conflicting migration names for version {version}: '{}' vs '{}'",
                slot.name, name
            )));
        }

        match kind {
            MigrationFileKind::Up => {
                if slot.up_path.is_some() {
                    return Err(OrmError::Migration(format!(
                        "duplicate up migration for version {version}"
                    )));
                }
                slot.up_path = Some(path);
            }
            MigrationFileKind::Down => {
                if slot.down_path.is_some() {
                    return Err(OrmError::Migration(format!(
                        "duplicate down migration for version {version}"
                    )));
                }
                slot.down_path = Some(path);
            }
        }
    }

    let mut out = Vec::with_capacity(by_version.len());
    for (version, partial) in by_version {
        let Some(up_path) = partial.up_path else {
            return Err(OrmError::Migration(format!(
                "migration V{version}__{} has down.sql but no up.sql",
                partial.name
            )));
        };
        out.push(DiskMigration {
            version,
            name: partial.name,
            up_path,
            down_path: partial.down_path,
        });
    }

    Ok(out)
}

fn read_sql_file(path: &Path) -> OrmResult<String> {
    fs::read_to_string(path)
        .map_err(|e| OrmError::Migration(format!("failed to read migration {}: {e}", path.display())))
}

fn applied_from_row(row: &Row) -> OrmResult<AppliedMigration> {
    let applied_on = match row.get("applied_at") {
        None | Some(Value::Null) => None,
        Some(_) => Some(row.try_timestamp("applied_at")?),
    };
    Ok(AppliedMigration {
        version: row.try_i64("version")?,
        name: row.try_str("name")?.to_string(),
        applied_on,
    })
}

/// Applies and rolls back directory migrations over an [`Executor`].
pub struct MigrationRunner<'a, E: Executor> {
    conn: &'a E,
    dialect: Arc<dyn Dialect>,
}

impl<'a, E: Executor> MigrationRunner<'a, E> {
    /// Create a runner bound to an executor and the backend's dialect.
    pub fn new(conn: &'a E, dialect: Arc<dyn Dialect>) -> Self {
        Self { conn, dialect }
    }

    fn table(&self) -> String {
        self.dialect.quote_identifier(MIGRATION_TABLE)
    }

    /// Create the history table when absent.
    pub async fn ensure_history_table(&self) -> OrmResult<()> {
        let d = self.dialect.as_ref();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} ({} BIGINT PRIMARY KEY, {} TEXT NOT NULL, {} TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
            self.table(),
            d.quote_identifier("version"),
            d.quote_identifier("name"),
            d.quote_identifier("applied_at"),
        );
        self.conn.execute(&sql, &[]).await?;
        Ok(())
    }

    async fn fetch_applied(&self) -> OrmResult<Vec<AppliedMigration>> {
        let d = self.dialect.as_ref();
        let sql = format!(
            "SELECT {v}, {n}, {a} FROM {t} ORDER BY {v} ASC",
            v = d.quote_identifier("version"),
            n = d.quote_identifier("name"),
            a = d.quote_identifier("applied_at"),
            t = self.table(),
        );
        let rows = self.conn.query(&sql, &[]).await?;
        rows.iter().map(applied_from_row).collect()
    }

    async fn record(&self, migration: &DiskMigration) -> OrmResult<()> {
        let d = self.dialect.as_ref();
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES ({}, {})",
            self.table(),
            d.quote_identifier("version"),
            d.quote_identifier("name"),
            d.placeholder(1),
            d.placeholder(2),
        );
        let params = [
            Value::Int(migration.version),
            Value::Text(migration.name.clone()),
        ];
        self.conn.execute(&sql, &params).await?;
        Ok(())
    }

    async fn remove_record(&self, version: i64) -> OrmResult<()> {
        let d = self.dialect.as_ref();
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.table(),
            d.quote_identifier("version"),
            d.placeholder(1),
        );
        let affected = self.conn.execute(&sql, &[Value::Int(version)]).await?;
        if affected == 0 {
            return Err(OrmError::Migration(format!(
                "failed to update migration history for version {version}"
            )));
        }
        Ok(())
    }

    /// Apply all pending up migrations from a directory, in version order.
    ///
    /// Returns the migrations that were applied by this call.
    pub async fn up_dir(&self, dir: impl AsRef<Path>) -> OrmResult<Vec<DiskMigration>> {
        self.ensure_history_table().await?;
        let local = scan_migrations_dir(&dir)?;
        let applied_versions: HashSet<i64> = self
            .fetch_applied()
            .await?
            .iter()
            .map(|m| m.version)
            .collect();

        let mut applied = Vec::new();
        for migration in local {
            if applied_versions.contains(&migration.version) {
                continue;
            }
            let sql = read_sql_file(&migration.up_path)?;
            self.conn.execute(&sql, &[]).await.map_err(|e| {
                OrmError::Migration(format!(
                    "migration V{}__{} failed: {e}",
                    migration.version, migration.name
                ))
            })?;
            self.record(&migration).await?;
            tracing::info!(
                version = migration.version,
                name = %migration.name,
                "applied migration"
            );
            applied.push(migration);
        }
        Ok(applied)
    }

    /// Compute migration status for a directory.
    pub async fn status(&self, dir: impl AsRef<Path>) -> OrmResult<MigrationStatus> {
        self.ensure_history_table().await?;
        let local = scan_migrations_dir(&dir)?;
        let applied = self.fetch_applied().await?;

        let applied_versions: HashSet<i64> = applied.iter().map(|m| m.version).collect();
        let local_versions: HashSet<i64> = local.iter().map(|m| m.version).collect();

        let pending = local
            .iter()
            .filter(|m| !applied_versions.contains(&m.version))
            .cloned()
            .collect();
        let missing_local = applied
            .iter()
            .filter(|m| !local_versions.contains(&m.version))
            .cloned()
            .collect();

        Ok(MigrationStatus {
            local,
            applied,
            pending,
            missing_local,
        })
    }

    /// Return the pending migration list for a directory.
    pub async fn plan(&self, dir: impl AsRef<Path>) -> OrmResult<Vec<DiskMigration>> {
        Ok(self.status(dir).await?.pending)
    }

    /// Build a SQL draft composed from pending up migrations.
    pub async fn diff_pending_sql(&self, dir: impl AsRef<Path>) -> OrmResult<String> {
        let st = self.status(&dir).await?;
        if st.pending.is_empty() {
            return Ok("-- no pending migrations\n".to_string());
        }

        let mut out = String::new();
        for m in st.pending {
            let sql = read_sql_file(&m.up_path)?;
            out.push_str(&format!("-- V{}__{}\n", m.version, m.name));
            out.push_str(sql.trim_end());
            out.push_str("\n\n");
        }
        Ok(out)
    }

    /// Roll back the latest `steps` migrations using `*.down.sql` files.
    ///
    /// Returns the migrations rolled back, in rollback order (newest first).
    pub async fn down_steps(
        &self,
        dir: impl AsRef<Path>,
        steps: usize,
    ) -> OrmResult<Vec<AppliedMigration>> {
        if steps == 0 {
            return Ok(Vec::new());
        }

        let local = scan_migrations_dir(&dir)?;
        let local_by_version: HashMap<i64, DiskMigration> =
            local.into_iter().map(|m| (m.version, m)).collect();

        let applied = self.fetch_applied().await?;
        if steps > applied.len() {
            return Err(OrmError::Migration(format!(
                "cannot rollback {steps} step(s): only {} applied migration(s)",
                applied.len()
            )));
        }

        let to_rollback: Vec<AppliedMigration> =
            applied.iter().rev().take(steps).cloned().collect();

        for applied in &to_rollback {
            let Some(local) = local_by_version.get(&applied.version) else {
                return Err(OrmError::Migration(format!(
                    "cannot rollback V{}__{}: migration file not found in local dir",
                    applied.version, applied.name
                )));
            };
            let Some(down_path) = &local.down_path else {
                return Err(OrmError::Migration(format!(
                    "cannot rollback V{}__{}: missing down migration (.down.sql)",
                    local.version, local.name
                )));
            };

            let down_sql = read_sql_file(down_path)?;
            self.conn.execute(&down_sql, &[]).await.map_err(|e| {
                OrmError::Migration(format!(
                    "rollback of V{}__{} failed: {e}",
                    applied.version, applied.name
                ))
            })?;
            self.remove_record(applied.version).await?;
            tracing::info!(
                version = applied.version,
                name = %applied.name,
                "rolled back migration"
            );
        }

        Ok(to_rollback)
    }

    /// Roll back migrations until `target_version` is the latest applied.
    pub async fn down_to(
        &self,
        dir: impl AsRef<Path>,
        target_version: i64,
    ) -> OrmResult<Vec<AppliedMigration>> {
        let applied = self.fetch_applied().await?;
        let steps = applied
            .iter()
            .filter(|m| m.version > target_version)
            .count();
        if steps == 0 {
            return Ok(Vec::new());
        }
        self.down_steps(dir, steps).await
    }
}
