//! Versioned schema migrations.
//!
//! Every migration belongs to an app, has a name unique within that app and
//! may depend on migrations of any app. [plan] orders them so dependencies
//! always run first, [migrate] applies whatever has not been recorded in the
//! `schema_migrations` table yet. Applied migrations are never edited, schema
//! changes get a new entry at the end of [MIGRATIONS].

use anyhow::Result;
use sqlx::{FromRow, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

use crate::types::timestamp::Timestamp;

#[derive(Debug, PartialEq, Eq)]
pub struct Migration {
    pub app:          &'static str,
    pub name:         &'static str,
    pub dependencies: &'static [(&'static str, &'static str)],
    pub statements:   &'static [&'static str],
}

impl Migration {
    pub fn key(&self) -> (&'static str, &'static str) {
        (self.app, self.name)
    }
}

impl std::fmt::Display for Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.app, self.name)
    }
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        app:          "author",
        name:         "0001_initial",
        dependencies: &[],
        statements:   &[r#"
            CREATE TABLE authors (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL
            );"#],
    },
    Migration {
        app:          "articles",
        name:         "0001_schema__initial_model_fields",
        dependencies: &[],
        statements:   &[r#"
            CREATE TABLE articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT ''
            );"#],
    },
    Migration {
        app:          "articles",
        name:         "0002_article_authors",
        dependencies: &[
            ("author", "0001_initial"),
            ("articles", "0001_schema__initial_model_fields"),
        ],
        statements:   &[
            r#"
            CREATE TABLE article_author (
                article_id INTEGER NOT NULL REFERENCES articles (id) ON DELETE CASCADE,
                author_id INTEGER NOT NULL REFERENCES authors (id) ON DELETE CASCADE,
                PRIMARY KEY (article_id, author_id)
            );"#,
            "CREATE INDEX article_author_author_id ON article_author (author_id);",
        ],
    },
];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MigrationError {
    #[error("migration {migration} depends on unknown migration {app}.{name}")]
    UnknownDependency {
        migration: String,
        app:       String,
        name:      String,
    },

    #[error("circular dependency between migrations: {0}")]
    Cycle(String),
}

/// Orders `migrations` so that each one comes after all of its dependencies.
/// Among migrations that are ready at the same time, declaration order wins.
pub fn plan(migrations: &[Migration]) -> Result<Vec<&Migration>, MigrationError> {
    for migration in migrations {
        for &(app, name) in migration.dependencies {
            if !migrations.iter().any(|other| other.key() == (app, name)) {
                return Err(MigrationError::UnknownDependency {
                    migration: migration.to_string(),
                    app:       app.to_string(),
                    name:      name.to_string(),
                });
            }
        }
    }

    let mut ordered: Vec<&Migration> = Vec::with_capacity(migrations.len());
    let mut remaining: Vec<&Migration> = migrations.iter().collect();
    while !remaining.is_empty() {
        let ready = remaining.iter().position(|migration| {
            migration
                .dependencies
                .iter()
                .all(|dep| ordered.iter().any(|done| done.key() == *dep))
        });
        match ready {
            Some(index) => ordered.push(remaining.remove(index)),
            None => {
                let stuck = remaining
                    .iter()
                    .map(|migration| migration.to_string())
                    .collect::<Vec<String>>()
                    .join(", ");
                return Err(MigrationError::Cycle(stuck));
            }
        }
    }
    Ok(ordered)
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AppliedMigration {
    pub app:        String,
    pub name:       String,
    pub applied_at: Timestamp,
}

async fn ensure_migrations_table(conn: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
            app TEXT NOT NULL,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL,
            UNIQUE (app, name)
        );"#,
    )
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn applied(conn: &SqlitePool) -> Result<Vec<AppliedMigration>> {
    ensure_migrations_table(conn).await?;
    Ok(sqlx::query_as::<_, AppliedMigration>(
        "SELECT app, name, applied_at FROM schema_migrations ORDER BY id",
    )
    .fetch_all(conn)
    .await?)
}

/// Every known migration in execution order, paired with when it was applied.
pub async fn status(
    conn: &SqlitePool,
    migrations: &'static [Migration],
) -> Result<Vec<(&'static Migration, Option<Timestamp>)>> {
    let applied = applied(conn).await?;
    Ok(plan(migrations)?
        .into_iter()
        .map(|migration| {
            let applied_at = applied
                .iter()
                .find(|record| record.app == migration.app && record.name == migration.name)
                .map(|record| record.applied_at.clone());
            (migration, applied_at)
        })
        .collect())
}

/// Applies every pending migration, each in its own transaction. Returns the
/// migrations that were applied by this call.
pub async fn migrate(
    conn: &SqlitePool,
    migrations: &'static [Migration],
) -> Result<Vec<&'static Migration>> {
    let mut newly_applied = vec![];
    for (migration, applied_at) in status(conn, migrations).await? {
        if applied_at.is_some() {
            debug!("Migration {} already applied.", migration);
            continue;
        }
        info!("Applying migration {}.", migration);
        let mut tx = conn.begin().await?;
        for statement in migration.statements {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        sqlx::query("INSERT INTO schema_migrations ( app, name, applied_at ) VALUES ( ?1, ?2, ?3 )")
            .bind(migration.app)
            .bind(migration.name)
            .bind(Timestamp::now())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        newly_applied.push(migration);
    }
    if newly_applied.is_empty() {
        info!("No migrations to apply.");
    }
    Ok(newly_applied)
}
