use std::fmt::Display;

use anyhow::Result;
use derives::DbTable;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection};

use crate::{
    error::ValidationErrors,
    traits::*,
    types::{
        id::Id,
        text::{Text, TextField},
    },
};

#[derive(Default, Debug, Clone, PartialEq, Eq, FromRow, DbTable, Serialize, Deserialize)]
pub struct Author {
    pub id:         Id,
    pub first_name: Text,
    pub last_name:  Text,
}

impl Author {
    pub const FIRST_NAME: TextField = TextField::char_field("first_name", 255);
    pub const LAST_NAME: TextField = TextField::char_field("last_name", 255);
}

/// Author fields as submitted in a request body. Absent keys are `None`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorPayload {
    pub first_name: Option<String>,
    pub last_name:  Option<String>,
}

impl AuthorPayload {
    /// Builds a not yet stored author; every field must be present.
    pub fn create(self, errors: &mut ValidationErrors) -> Option<Author> {
        let first_name = Author::FIRST_NAME.clean_required(self.first_name, errors);
        let last_name = Author::LAST_NAME.clean_required(self.last_name, errors);
        Some(Author {
            id: Id::default(),
            first_name: first_name?,
            last_name: last_name?,
        })
    }

    /// Applies the present fields on top of `old`.
    pub fn update(self, old: &Author, errors: &mut ValidationErrors) -> Option<Author> {
        let first_name = match self.first_name {
            Some(value) => Author::FIRST_NAME.clean(value, errors),
            None => Some(old.first_name.clone()),
        };
        let last_name = match self.last_name {
            Some(value) => Author::LAST_NAME.clean(value, errors),
            None => Some(old.last_name.clone()),
        };
        Some(Author {
            id: old.id,
            first_name: first_name?,
            last_name: last_name?,
        })
    }
}

impl Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {} ({})", self.last_name, self.first_name, self.id)
    }
}

impl Queryable for Author {}

impl Removeable for Author {}

impl Insertable for Author {
    async fn insert(&self, conn: &mut SqliteConnection) -> Result<Id> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} ( first_name, last_name )
            VALUES ( ?1, ?2 )
            "#,
            Self::TABLE_NAME
        ))
        .bind(&self.first_name)
        .bind(&self.last_name)
        .execute(&mut *conn)
        .await?;
        Ok(Id(result.last_insert_rowid()))
    }
}

impl Updateable for Author {
    async fn update(&self, conn: &mut SqliteConnection) -> Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET
                first_name = ?2,
                last_name = ?3
            WHERE
                id = ?1;
            "#,
            Self::TABLE_NAME
        ))
        .bind(&self.id)
        .bind(&self.first_name)
        .bind(&self.last_name)
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
