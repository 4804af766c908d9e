use std::path::Path;

use pretty_assertions::assert_eq;
use sqlx::SqlitePool;

use techtest::{
    backup::State,
    db::{
        connect_to_db,
        migrations::{migrate, MIGRATIONS},
        IN_MEMORY,
    },
    traits::*,
    types::{article::Article, author::Author, id::Id, text::Text},
};

async fn migrated_db() -> SqlitePool {
    let conn = connect_to_db(Path::new(IN_MEMORY)).await.unwrap();
    migrate(&conn, MIGRATIONS).await.unwrap();
    conn
}

async fn seed(conn: &SqlitePool) {
    let mut db = conn.acquire().await.unwrap();
    let mut ids = vec![];
    for (first_name, last_name) in [("Natan", "Morais"), ("NS", "Morais"), ("Tulio", "Jander")] {
        let author = Author {
            id:         Id::default(),
            first_name: Text::from(first_name),
            last_name:  Text::from(last_name),
        };
        ids.push(author.insert(&mut db).await.unwrap());
    }
    // leaves a gap in the id sequence
    Author::remove(&mut db, &ids[1]).await.unwrap();

    Article {
        id:      Id::default(),
        title:   Text::from("Dump me"),
        content: Text::from("Carefully."),
        authors: vec![ids[0], ids[2]],
    }
    .insert(&mut db)
    .await
    .unwrap();
}

#[tokio::test]
async fn dump_and_load_preserve_records_and_ids() {
    let source = migrated_db().await;
    seed(&source).await;
    let mut state = State::load(&source).await.unwrap();
    state.sort();
    let dump = state.serialize().unwrap();

    let target = migrated_db().await;
    State::deserialize(&dump)
        .unwrap()
        .rebuild(&target)
        .await
        .unwrap();

    let reloaded = State::load(&target).await.unwrap();
    assert_eq!(reloaded, state);
    assert_eq!(reloaded.authors.len(), 2);
    assert_eq!(reloaded.articles[0].authors.len(), 2);
}

#[tokio::test]
async fn refuses_to_load_over_existing_records() {
    let conn = migrated_db().await;
    seed(&conn).await;
    let state = State::load(&conn).await.unwrap();
    assert!(state.rebuild(&conn).await.is_err());
    assert_eq!(Author::count(&conn).await.unwrap(), 2);
}

#[tokio::test]
async fn a_dangling_author_reference_rolls_back() {
    let conn = migrated_db().await;
    let state = State {
        authors:  vec![],
        articles: vec![Article {
            id:      Id(1),
            title:   Text::from("Lonely"),
            content: Text::default(),
            authors: vec![Id(5)],
        }],
    };
    assert!(state.rebuild(&conn).await.is_err());
    assert_eq!(Article::count(&conn).await.unwrap(), 0);
}
