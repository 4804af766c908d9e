use anyhow::Result;
use sqlx::{sqlite::SqliteRow, FromRow, SqliteConnection, SqlitePool};

use crate::types::id::Id;

/// Static table metadata, usually generated by `#[derive(DbTable)]`.
pub trait DbTable {
    const NAME_SINGULAR: &'static str;
    const NAME_PLURAL: &'static str;
    const TABLE_NAME: &'static str;
    /// Stored columns in declaration order; the first one is the primary key.
    const COLUMNS: &'static [&'static str];

    fn select_sql() -> String {
        format!(
            "SELECT {} FROM {}",
            Self::COLUMNS.join(", "),
            Self::TABLE_NAME
        )
    }
}

pub trait Queryable: DbTable + for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    async fn get_all(conn: &SqlitePool) -> Result<Vec<Self>> {
        Ok(
            sqlx::query_as::<_, Self>(&format!("{} ORDER BY id", Self::select_sql()))
                .fetch_all(conn)
                .await?,
        )
    }

    async fn get_by_id(conn: &SqlitePool, id: &Id) -> Result<Option<Self>> {
        Ok(
            sqlx::query_as::<_, Self>(&format!("{} WHERE id = ?1", Self::select_sql()))
                .bind(id)
                .fetch_optional(conn)
                .await?,
        )
    }

    async fn count(conn: &SqlitePool) -> Result<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", Self::TABLE_NAME))
                .fetch_one(conn)
                .await?,
        )
    }
}

pub trait Insertable: DbTable {
    /// Stores a new row and returns the id it was given.
    async fn insert(&self, conn: &mut SqliteConnection) -> Result<Id>;
}

pub trait Updateable: DbTable {
    /// Overwrites the row carrying `self.id`. `false` if there is no such row.
    async fn update(&self, conn: &mut SqliteConnection) -> Result<bool>;
}

pub trait Removeable: DbTable {
    async fn remove(conn: &mut SqliteConnection, id: &Id) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?1", Self::TABLE_NAME))
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Many-to-many relation between `A` and `B`, stored as id pairs.
pub trait JunctionTable<A: DbTable, B: DbTable>:
    for<'r> FromRow<'r, SqliteRow> + Send + Unpin
{
    const TABLE_NAME: &'static str;
    const COLUMN_A: &'static str;
    const COLUMN_B: &'static str;

    fn new(id_a: Id, id_b: Id) -> Self;

    fn get_id_a(&self) -> &Id;

    fn get_id_b(&self) -> &Id;

    async fn get_all(conn: &mut SqliteConnection) -> Result<Vec<Self>> {
        Ok(sqlx::query_as::<_, Self>(&format!(
            "SELECT {a}, {b} FROM {table} ORDER BY {a}, {b}",
            a = Self::COLUMN_A,
            b = Self::COLUMN_B,
            table = Self::TABLE_NAME
        ))
        .fetch_all(&mut *conn)
        .await?)
    }

    /// Ids on the `B` side related to `id_a`, ascending.
    async fn ids_for_a(conn: &mut SqliteConnection, id_a: &Id) -> Result<Vec<Id>> {
        Ok(sqlx::query_scalar::<_, Id>(&format!(
            "SELECT {b} FROM {table} WHERE {a} = ?1 ORDER BY {b}",
            a = Self::COLUMN_A,
            b = Self::COLUMN_B,
            table = Self::TABLE_NAME
        ))
        .bind(id_a)
        .fetch_all(&mut *conn)
        .await?)
    }

    /// Replaces every pair for `id_a` with one pair per entry of `ids_b`.
    async fn set_for_a(conn: &mut SqliteConnection, id_a: &Id, ids_b: &[Id]) -> Result<()> {
        sqlx::query(&format!(
            "DELETE FROM {table} WHERE {a} = ?1",
            a = Self::COLUMN_A,
            table = Self::TABLE_NAME
        ))
        .bind(id_a)
        .execute(&mut *conn)
        .await?;
        for id_b in ids_b {
            Self::new(*id_a, *id_b).insert(conn).await?;
        }
        Ok(())
    }

    async fn insert(&self, conn: &mut SqliteConnection) -> Result<()> {
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO {table} ( {a}, {b} ) VALUES ( ?1, ?2 )",
            a = Self::COLUMN_A,
            b = Self::COLUMN_B,
            table = Self::TABLE_NAME
        ))
        .bind(self.get_id_a())
        .bind(self.get_id_b())
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
