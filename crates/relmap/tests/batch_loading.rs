mod common;

use common::{Post, RecordingConnection, User, blog, post_row, user};
use proptest::prelude::*;
use relmap::prelude::*;

#[test]
fn test_children_grouped_by_parent_and_orphans_dropped() {
    let db = blog(vec![
        post_row(10, 1),
        post_row(11, 1),
        post_row(20, 2),
        post_row(21, 2),
        post_row(99, 99),
    ]);
    let mut users = vec![user(1), user(2), user(3)];

    db.load_association(&mut users, "posts").unwrap();

    let ids = |u: &User| u.posts.iter().map(|p| p.id).collect::<Vec<_>>();
    assert_eq!(ids(&users[0]), vec![10, 11]);
    assert_eq!(ids(&users[1]), vec![20, 21]);
    assert!(users[2].posts.is_empty());
    assert_eq!(db.connection().queries_against("posts"), 1);
}

#[test]
fn test_one_query_regardless_of_parent_count() {
    for k in [0_i64, 1, 100] {
        let db = blog(vec![post_row(1, 1)]);
        let mut users: Vec<User> = (1..=k).map(user).collect();

        db.load_association(&mut users, "posts").unwrap();

        assert_eq!(db.connection().queries_against("posts"), 1, "k = {k}");
        assert_eq!(db.connection().statements().len(), 1, "k = {k}");
    }
}

#[test]
fn test_zero_parents_query_matches_nothing() {
    let db = blog(Vec::new());
    let mut users: Vec<User> = Vec::new();
    db.load_association(&mut users, "posts").unwrap();

    let statements = db.connection().statements();
    assert!(statements[0].sql.ends_with("WHERE 1 = 0"), "{}", statements[0].sql);
    assert!(statements[0].params.is_empty());
}

#[test]
fn test_in_list_binds_distinct_ids() {
    let db = blog(Vec::new());
    let mut users = vec![user(1), user(2), user(1)];
    db.load_association(&mut users, "posts").unwrap();

    let statement = &db.connection().statements()[0];
    assert!(
        statement
            .sql
            .ends_with(r#"WHERE "posts"."user_id" IN (:p1_0, :p1_1)"#),
        "{}",
        statement.sql
    );
    assert_eq!(statement.param("p1_0"), Some(&Value::BigInt(1)));
    assert_eq!(statement.param("p1_1"), Some(&Value::BigInt(2)));
}

#[test]
fn test_parents_sharing_an_id_each_receive_children() {
    let db = blog(vec![post_row(10, 1)]);
    let mut users = vec![user(1), user(1)];
    db.load_association(&mut users, "posts").unwrap();
    assert_eq!(users[0].posts, users[1].posts);
    assert_eq!(users[0].posts.len(), 1);
}

#[test]
fn test_stale_collections_are_replaced() {
    let db = blog(Vec::new());
    let mut stale = user(1);
    stale.posts.push(Post::default());
    let mut users = vec![stale];

    db.load_association(&mut users, "posts").unwrap();

    assert!(users[0].posts.is_empty());
}

#[derive(Debug, Default, Clone)]
struct Author {
    id: i64,
    drafts: Vec<Post>,
    notes: Vec<Post>,
    excerpts: Vec<Post>,
}

impl Entity for Author {
    const TABLE_NAME: &'static str = "authors";

    fn describe(b: &mut EntityBuilder<Self>) {
        b.field("id", |a| &a.id, |a| &mut a.id);
        b.has_many("drafts", |a| &mut a.drafts);
        b.has_many("notes", |a| &mut a.notes).foreign_key("authorId");
        b.has_many("excerpts", |a| &mut a.excerpts)
            .foreign_key("userId")
            .columns(&["title"]);
    }
}

fn authors_db() -> Database<RecordingConnection> {
    let db = Database::new(
        RecordingConnection::new().with_rows("posts", vec![post_row(5, 7)]),
        DatabaseConfig::default(),
    );
    db.register::<Author>().unwrap();
    db.register::<Post>().unwrap();
    db
}

#[test]
fn test_missing_foreign_key_fails_before_query() {
    let db = authors_db();
    let mut authors = vec![Author::default()];
    let err = db.load_association(&mut authors, "drafts").unwrap_err();
    assert!(matches!(
        err,
        Error::Config(ConfigError::AssociationMisconfigured { ref association, .. })
            if association == "drafts"
    ));
    assert!(db.connection().statements().is_empty());
}

#[test]
fn test_foreign_key_without_column_fails_before_query() {
    let db = authors_db();
    let mut authors = vec![Author::default()];
    let err = db.load_association(&mut authors, "notes").unwrap_err();
    assert!(err.to_string().contains("authorId"), "{err}");
    assert!(db.connection().statements().is_empty());
}

#[test]
fn test_restricted_columns_always_fetch_foreign_key() {
    let db = authors_db();
    let mut authors = vec![Author {
        id: 7,
        ..Author::default()
    }];
    db.load_association(&mut authors, "excerpts").unwrap();

    let sql = &db.connection().statements()[0].sql;
    assert!(
        sql.starts_with(r#"SELECT "posts"."title" AS "title", "posts"."user_id" AS "user_id" FROM "posts""#),
        "{sql}"
    );
    assert_eq!(authors[0].excerpts.len(), 1);
}

#[test]
fn test_single_parent_loop_is_flagged() {
    let db = blog(Vec::new());
    let mut users: Vec<User> = (1..=4).map(user).collect();
    for u in &mut users {
        db.load_association(std::slice::from_mut(u), "posts").unwrap();
    }
    assert_eq!(db.n1_count("User", "posts"), 4);
    assert_eq!(db.n1_stats().potential_n1, 1);
    assert_eq!(db.connection().queries_against("posts"), 4);
}

#[test]
fn test_repository_load_delegates() {
    let db = blog(vec![post_row(1, 1)]);
    let repo = db.repository::<User>().unwrap();
    let mut users = vec![user(1), user(2)];
    repo.load(&mut users, "posts").unwrap();
    assert_eq!(users[0].posts.len(), 1);
    assert_eq!(db.n1_stats().total_loads, 0);
}

#[test]
fn test_works_without_registering_parent() {
    let db = Database::new(
        RecordingConnection::new().with_rows("posts", vec![post_row(1, 1)]),
        DatabaseConfig::default(),
    );
    db.register::<Post>().unwrap();
    let mut users = vec![user(1)];
    db.load_association(&mut users, "posts").unwrap();
    assert_eq!(users[0].posts.len(), 1);
}

proptest! {
    #[test]
    fn prop_every_child_lands_on_its_parents(
        parent_ids in prop::collection::vec(1_i64..20, 0..30),
        child_fks in prop::collection::vec(1_i64..25, 0..60),
    ) {
        let rows = child_fks
            .iter()
            .enumerate()
            .map(|(i, fk)| post_row(i64::try_from(i).unwrap(), *fk))
            .collect();
        let db = blog(rows);
        let mut users: Vec<User> = parent_ids.iter().copied().map(user).collect();

        db.load_association(&mut users, "posts").unwrap();

        prop_assert_eq!(db.connection().queries_against("posts"), 1);
        for u in &users {
            let expected = child_fks.iter().filter(|fk| **fk == u.id).count();
            prop_assert_eq!(u.posts.len(), expected);
            prop_assert!(u.posts.iter().all(|p| p.user_id == u.id));
        }
    }
}
