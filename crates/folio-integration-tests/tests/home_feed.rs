//! Integration test: home feed over the SQLite catalog.
//!
//! Exercises the feed end to end:
//! 1. Seed books, workspaces and reading history
//! 2. Build a grouped feed and check group order and contents
//! 3. Check anonymous visitors and private books
//! 4. Build ranked-merge pages and check history comes first without duplicates
//! 5. Check private books read earlier stay hidden without a role
//! 6. Break the membership table and check the page degrades to one bucket

use std::sync::Arc;

use folio_catalog::{FeedOptions, HomeFeedAggregator, SqliteCatalog, WorkspaceMembershipIndex};
use folio_db::queries::books::NewBook;
use folio_db::{Db, DbError};
use folio_types::{BookId, FeedMode, UNGROUPED_WORKSPACE};

struct Fixture {
    db: Db,
    catalog: Arc<SqliteCatalog>,
    memberships: WorkspaceMembershipIndex,
    feed: HomeFeedAggregator,
}

fn fixture() -> Fixture {
    let db = Db::open_memory().expect("open db");
    let catalog = Arc::new(SqliteCatalog::new(db.clone()));
    let memberships = WorkspaceMembershipIndex::new(db.clone());
    let feed = HomeFeedAggregator::new(
        catalog.clone(),
        catalog.clone(),
        catalog.clone(),
        memberships.clone(),
        FeedOptions::default(),
    );
    Fixture {
        db,
        catalog,
        memberships,
        feed,
    }
}

fn add_book(fx: &Fixture, title: &str, private: bool, order_index: i64) -> BookId {
    let identify = title.to_lowercase().replace(' ', "-");
    fx.catalog
        .add_book(&NewBook {
            title,
            identify: &identify,
            description: None,
            private,
            order_index,
            created_at: 1,
        })
        .expect("add book")
}

fn ids(books: &[folio_types::Book]) -> Vec<BookId> {
    books.iter().map(|b| b.book_id).collect()
}

#[test]
fn grouped_feed_orders_history_workspaces_first() {
    let fx = fixture();
    let ws_a = fx.memberships.create_workspace("Guides", 1).expect("ws a");
    let ws_b = fx.memberships.create_workspace("Reference", 1).expect("ws b");

    // Catalog order: b1, b2, b3, b4 (descending order index).
    let b1 = add_book(&fx, "Intro", false, 40);
    let b2 = add_book(&fx, "Api", false, 30);
    let b3 = add_book(&fx, "Loose notes", false, 20);
    let b4 = add_book(&fx, "Cookbook", false, 10);

    fx.memberships.assign(b1, &[ws_b], 1).expect("assign b1");
    fx.memberships.assign(b2, &[ws_a], 1).expect("assign b2");
    fx.memberships.assign(b4, &[ws_a, ws_b], 1).expect("assign b4");

    // Member 7 read b2 most recently, then b1.
    fx.catalog.record_read(7, b1, 100).expect("read b1");
    fx.catalog.record_read(7, b2, 200).expect("read b2");

    let feed = fx
        .feed
        .build_feed_with_mode(7, 1, 18, FeedMode::Grouped)
        .expect("feed");

    assert_eq!(feed.total_count, 4);
    assert_eq!(ids(&feed.books), vec![b1, b2, b3, b4]);
    assert_eq!(feed.group_order, vec![ws_a, ws_b, UNGROUPED_WORKSPACE]);
    assert_eq!(ids(feed.group(ws_a)), vec![b2, b4]);
    assert_eq!(ids(feed.group(ws_b)), vec![b1, b4]);
    assert_eq!(ids(feed.group(UNGROUPED_WORKSPACE)), vec![b3]);
    assert_eq!(feed.workspace_names.get(&ws_a).map(String::as_str), Some("Guides"));
}

#[test]
fn anonymous_feed_hides_private_books() {
    let fx = fixture();
    let public = add_book(&fx, "Public", false, 2);
    let private = add_book(&fx, "Private", true, 1);
    fx.catalog.grant_book_role(private, 3, 0).expect("grant");

    let anonymous = fx.feed.build_feed(0, 1, 18).expect("anonymous feed");
    assert_eq!(ids(&anonymous.books), vec![public]);
    assert_eq!(anonymous.group_order, vec![UNGROUPED_WORKSPACE]);

    let owner = fx.feed.build_feed(3, 1, 18).expect("owner feed");
    assert_eq!(ids(&owner.books), vec![public, private]);
}

#[test]
fn team_access_reveals_private_books() {
    let fx = fixture();
    let private = add_book(&fx, "Team handbook", true, 1);
    fx.catalog.grant_team_access(9, 5, private, 1).expect("team");

    assert!(fx.feed.build_feed(5, 1, 18).expect("member").books.len() == 1);
    assert!(fx.feed.build_feed(6, 1, 18).expect("outsider").books.is_empty());
}

#[test]
fn ranked_merge_puts_history_first_without_duplicates() {
    let fx = fixture();
    let books: Vec<BookId> = (0..6)
        .map(|i| add_book(&fx, &format!("Book {i}"), false, 100 - i))
        .collect();

    // History: books[4] newest, then books[1].
    fx.catalog.record_read(2, books[1], 10).expect("read");
    fx.catalog.record_read(2, books[4], 20).expect("read");

    let first = fx
        .feed
        .build_feed_with_mode(2, 1, 3, FeedMode::RankedMerge)
        .expect("page 1");
    assert_eq!(ids(&first.books), vec![books[4], books[1], books[0]]);
    assert!(first.groups.is_none());

    let second = fx
        .feed
        .build_feed_with_mode(2, 2, 3, FeedMode::RankedMerge)
        .expect("page 2");
    assert_eq!(ids(&second.books), vec![books[2], books[3], books[5]]);

    let past_end = fx
        .feed
        .build_feed_with_mode(2, 5, 3, FeedMode::RankedMerge)
        .expect("past end");
    assert!(past_end.books.is_empty());
}

#[test]
fn repeated_reads_move_book_to_front() {
    let fx = fixture();
    let a = add_book(&fx, "A", false, 2);
    let b = add_book(&fx, "B", false, 1);
    fx.catalog.record_read(4, a, 10).expect("read a");
    fx.catalog.record_read(4, b, 20).expect("read b");
    let entry = fx.catalog.record_read(4, a, 30).expect("read a again");
    assert_eq!(entry.read_count, 2);

    let feed = fx
        .feed
        .build_feed_with_mode(4, 1, 2, FeedMode::RankedMerge)
        .expect("feed");
    assert_eq!(ids(&feed.books), vec![a, b]);
}

#[test]
fn zero_page_size_is_rejected() {
    let fx = fixture();
    add_book(&fx, "A", false, 1);
    assert!(matches!(
        fx.feed.build_feed(0, 1, 0),
        Err(folio_catalog::CatalogError::InvalidParameter(_))
    ));
}

#[test]
fn history_of_private_book_without_role_stays_hidden() {
    let fx = fixture();
    let public = add_book(&fx, "Public", false, 1);
    let secret = add_book(&fx, "Secret", true, 2);
    fx.catalog.record_read(9, secret, 50).expect("read secret");

    for mode in [FeedMode::Grouped, FeedMode::RankedMerge] {
        let feed = fx.feed.build_feed_with_mode(9, 1, 18, mode).expect("feed");
        assert_eq!(ids(&feed.books), vec![public], "mode {mode}");
        assert_eq!(feed.total_count, 1);
    }

    // Once granted, the read moves the book to the front.
    fx.catalog.grant_book_role(secret, 9, 1).expect("grant");
    let feed = fx
        .feed
        .build_feed_with_mode(9, 1, 18, FeedMode::RankedMerge)
        .expect("feed");
    assert_eq!(ids(&feed.books), vec![secret, public]);
}

#[test]
fn membership_failure_lists_page_ungrouped() {
    let fx = fixture();
    let ws = fx.memberships.create_workspace("Guides", 1).expect("ws");
    let a = add_book(&fx, "A", false, 2);
    let b = add_book(&fx, "B", false, 1);
    fx.memberships.assign(a, &[ws], 1).expect("assign");
    fx.catalog.record_read(1, a, 10).expect("read");

    fx.db
        .with_conn(|conn: &mut rusqlite::Connection| -> Result<(), DbError> {
            conn.execute_batch("DROP TABLE book_workspaces")?;
            Ok(())
        })
        .expect("drop memberships");

    let feed = fx.feed.build_feed(1, 1, 18).expect("feed still builds");
    assert_eq!(ids(&feed.books), vec![a, b]);
    assert_eq!(feed.group_order, vec![UNGROUPED_WORKSPACE]);
    assert_eq!(ids(feed.group(UNGROUPED_WORKSPACE)), vec![a, b]);
}

#[test]
fn feed_serializes_groups_with_string_keys() {
    let fx = fixture();
    let ws = fx.memberships.create_workspace("Guides", 1).expect("ws");
    let a = add_book(&fx, "A", false, 2);
    let b = add_book(&fx, "B", false, 1);
    fx.memberships.assign(a, &[ws], 1).expect("assign");

    let feed = fx.feed.build_feed(0, 1, 18).expect("feed");
    let json = serde_json::to_value(&feed).expect("serialize");

    assert_eq!(json["mode"], "grouped");
    assert_eq!(json["total_count"], 2);
    assert_eq!(json["group_order"], serde_json::json!([ws, 0]));
    assert_eq!(json["groups"][ws.to_string()][0]["book_id"], a);
    assert_eq!(json["groups"]["0"][0]["book_id"], b);
    assert_eq!(json["workspace_names"][ws.to_string()], "Guides");

    let back: folio_types::FeedResult = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, feed);
}
