use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    traits::*,
    types::{article::Article, author::Author, junction_tables::article_author::ArticleAuthor},
};

/// Contains the entire state of the database
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub authors:  Vec<Author>,
    pub articles: Vec<Article>,
}

impl State {
    /// Generate [State] struct from database
    pub async fn load(conn: &sqlx::SqlitePool) -> Result<Self> {
        Ok(Self {
            authors:  Author::get_all(conn).await?,
            articles: Article::get_all(conn).await?,
        })
    }

    /// Sort all fields on [State]
    pub fn sort(&mut self) {
        self.authors.sort_by_key(|x| x.id);
        self.articles.sort_by_key(|x| x.id);
        for article in self.articles.iter_mut() {
            article.authors.sort();
            article.authors.dedup();
        }
    }

    /// Serialize the state to a string
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from a string to state
    pub fn deserialize(s: &str) -> Result<State> {
        Ok(serde_json::from_str(s)?)
    }

    /// Rebuild the database from state, keeping every id. The database has to
    /// be migrated and empty.
    pub async fn rebuild(&self, conn: &sqlx::SqlitePool) -> Result<()> {
        if Author::count(conn).await? != 0 || Article::count(conn).await? != 0 {
            anyhow::bail!("Refusing to load into a database that already contains records");
        }

        let mut tx = conn.begin().await?;
        for author in &self.authors {
            sqlx::query(&format!(
                "INSERT INTO {} ( id, first_name, last_name ) VALUES ( ?1, ?2, ?3 )",
                Author::TABLE_NAME
            ))
            .bind(&author.id)
            .bind(&author.first_name)
            .bind(&author.last_name)
            .execute(&mut *tx)
            .await?;
        }
        for article in &self.articles {
            sqlx::query(&format!(
                "INSERT INTO {} ( id, title, content ) VALUES ( ?1, ?2, ?3 )",
                Article::TABLE_NAME
            ))
            .bind(&article.id)
            .bind(&article.title)
            .bind(&article.content)
            .execute(&mut *tx)
            .await?;
            ArticleAuthor::set_for_a(&mut tx, &article.id, &article.authors).await?;
        }
        tx.commit().await?;
        info!(
            "Loaded {} authors and {} articles.",
            self.authors.len(),
            self.articles.len()
        );
        Ok(())
    }
}
