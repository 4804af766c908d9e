pub mod id;
pub mod text;
pub mod timestamp;

pub mod article;
pub mod author;
pub mod junction_tables;
