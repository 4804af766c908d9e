pub mod article_author;
