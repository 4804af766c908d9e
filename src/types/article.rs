use std::collections::{BTreeSet, HashMap};

use anyhow::Result;
use derives::DbTable;
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, FromRow, Row, SqliteConnection, SqlitePool};

use crate::{
    error::ValidationErrors,
    traits::*,
    types::{
        author::Author,
        id::Id,
        junction_tables::article_author::ArticleAuthor,
        text::{Text, TextField},
    },
};

#[derive(Default, Debug, Clone, PartialEq, Eq, DbTable, Serialize, Deserialize)]
pub struct Article {
    pub id:      Id,
    pub title:   Text,
    pub content: Text,
    /// Related author ids, ascending and without duplicates.
    #[relation]
    pub authors: Vec<Id>,
}

impl Article {
    pub const TITLE: TextField = TextField::char_field("title", 255);
    pub const CONTENT: TextField = TextField::text_field("content");
}

impl FromRow<'_, SqliteRow> for Article {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id:      row.try_get("id")?,
            title:   row.try_get("title")?,
            content: row.try_get("content")?,
            authors: vec![],
        })
    }
}

/// Article fields as submitted in a request body. Absent keys are `None`.
#[derive(Default, Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArticlePayload {
    pub title:   Option<String>,
    pub content: Option<String>,
    pub authors: Option<Vec<Id>>,
}

impl ArticlePayload {
    pub fn create(self, errors: &mut ValidationErrors) -> Option<Article> {
        let title = Article::TITLE.clean_required(self.title, errors);
        let content = Article::CONTENT.clean_required(self.content, errors);
        Some(Article {
            id:      Id::default(),
            title:   title?,
            content: content?,
            authors: normalize_ids(self.authors.unwrap_or_default()),
        })
    }

    /// Applies the present fields on top of `old`. Present `authors` replace
    /// the whole relation.
    pub fn update(self, old: &Article, errors: &mut ValidationErrors) -> Option<Article> {
        let title = match self.title {
            Some(value) => Article::TITLE.clean(value, errors),
            None => Some(old.title.clone()),
        };
        let content = match self.content {
            Some(value) => Article::CONTENT.clean(value, errors),
            None => Some(old.content.clone()),
        };
        Some(Article {
            id:      old.id,
            title:   title?,
            content: content?,
            authors: match self.authors {
                Some(authors) => normalize_ids(authors),
                None => old.authors.clone(),
            },
        })
    }
}

fn normalize_ids(ids: Vec<Id>) -> Vec<Id> {
    ids.into_iter().collect::<BTreeSet<Id>>().into_iter().collect()
}

/// Records an error for every id in `authors` without a stored author.
pub async fn check_authors_exist(
    conn: &mut SqliteConnection,
    authors: &[Id],
    errors: &mut ValidationErrors,
) -> Result<()> {
    for id in authors.iter().collect::<BTreeSet<&Id>>() {
        let found = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM {} WHERE id = ?1",
            Author::TABLE_NAME
        ))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        if found == 0 {
            errors.add(
                "authors",
                format!("Invalid pk \"{id}\" - object does not exist."),
            );
        }
    }
    Ok(())
}

impl Article {
    /// Every article with its authors. Run inside a transaction so both
    /// reads see the same snapshot.
    pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Self>> {
        let mut articles =
            sqlx::query_as::<_, Self>(&format!("{} ORDER BY id", Self::select_sql()))
                .fetch_all(&mut *conn)
                .await?;
        let mut authors: HashMap<Id, Vec<Id>> = HashMap::new();
        for pair in <ArticleAuthor as JunctionTable<Article, Author>>::get_all(conn).await? {
            authors.entry(pair.article_id).or_default().push(pair.author_id);
        }
        for article in articles.iter_mut() {
            article.authors = authors.remove(&article.id).unwrap_or_default();
        }
        Ok(articles)
    }

    pub async fn fetch_by_id(conn: &mut SqliteConnection, id: &Id) -> Result<Option<Self>> {
        let article =
            sqlx::query_as::<_, Self>(&format!("{} WHERE id = ?1", Self::select_sql()))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;
        match article {
            Some(mut article) => {
                article.authors = ArticleAuthor::ids_for_a(conn, id).await?;
                Ok(Some(article))
            }
            None => Ok(None),
        }
    }
}

impl Queryable for Article {
    async fn get_all(conn: &SqlitePool) -> Result<Vec<Self>> {
        let mut tx = conn.begin().await?;
        let articles = Self::fetch_all(&mut tx).await?;
        tx.commit().await?;
        Ok(articles)
    }

    async fn get_by_id(conn: &SqlitePool, id: &Id) -> Result<Option<Self>> {
        let mut tx = conn.begin().await?;
        let article = Self::fetch_by_id(&mut tx, id).await?;
        tx.commit().await?;
        Ok(article)
    }
}

impl Insertable for Article {
    async fn insert(&self, conn: &mut SqliteConnection) -> Result<Id> {
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {} ( title, content )
            VALUES ( ?1, ?2 )
            "#,
            Self::TABLE_NAME
        ))
        .bind(&self.title)
        .bind(&self.content)
        .execute(&mut *conn)
        .await?;
        let id = Id(result.last_insert_rowid());
        ArticleAuthor::set_for_a(conn, &id, &self.authors).await?;
        Ok(id)
    }
}

impl Updateable for Article {
    async fn update(&self, conn: &mut SqliteConnection) -> Result<bool> {
        let result = sqlx::query(&format!(
            r#"
            UPDATE {}
            SET
                title = ?2,
                content = ?3
            WHERE
                id = ?1;
            "#,
            Self::TABLE_NAME
        ))
        .bind(&self.id)
        .bind(&self.title)
        .bind(&self.content)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }
        ArticleAuthor::set_for_a(conn, &self.id, &self.authors).await?;
        Ok(true)
    }
}

impl Removeable for Article {}
