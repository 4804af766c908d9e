use const_format::formatcp;
use sqlx::FromRow;

use crate::{
    traits::*,
    types::{article::Article, author::Author, id::Id},
};

#[derive(Default, Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ArticleAuthor {
    pub article_id: Id,
    pub author_id:  Id,
}

impl JunctionTable<Article, Author> for ArticleAuthor {
    const TABLE_NAME: &'static str =
        formatcp!("{}_{}", Article::NAME_SINGULAR, Author::NAME_SINGULAR);
    const COLUMN_A: &'static str = formatcp!("{}_id", Article::NAME_SINGULAR);
    const COLUMN_B: &'static str = formatcp!("{}_id", Author::NAME_SINGULAR);

    fn new(id_a: Id, id_b: Id) -> Self {
        Self {
            article_id: id_a,
            author_id:  id_b,
        }
    }

    fn get_id_a(&self) -> &Id {
        &self.article_id
    }

    fn get_id_b(&self) -> &Id {
        &self.author_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_the_related_tables() {
        assert_eq!(
            <ArticleAuthor as JunctionTable<Article, Author>>::TABLE_NAME,
            "article_author"
        );
        assert_eq!(
            <ArticleAuthor as JunctionTable<Article, Author>>::COLUMN_A,
            "article_id"
        );
        assert_eq!(
            <ArticleAuthor as JunctionTable<Article, Author>>::COLUMN_B,
            "author_id"
        );
    }
}
