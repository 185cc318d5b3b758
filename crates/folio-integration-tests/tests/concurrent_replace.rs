//! Integration test: concurrent id-based label replaces on one book.
//!
//! Several threads replace the same book's labels with disjoint sets. Every
//! replace is atomic, so the book must end with exactly one complete set and
//! label counts must agree with the edge table.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::thread;

use folio_catalog::{BookLabelAssociation, LabelOptions, LabelStore, SqliteCatalog};
use folio_db::queries::books::NewBook;
use folio_db::Db;
use folio_types::LabelId;

#[test]
fn concurrent_replaces_leave_one_complete_set() {
    let db = Db::open_memory().expect("open db");
    let catalog = Arc::new(SqliteCatalog::new(db.clone()));
    let labels = LabelStore::new(db.clone(), LabelOptions::default());
    let book_labels = BookLabelAssociation::new(db, labels.clone(), catalog.clone(), catalog.clone());

    let book = catalog
        .add_book(&NewBook {
            title: "Shared",
            identify: "shared",
            description: None,
            private: false,
            order_index: 1,
            created_at: 1,
        })
        .expect("add book");

    let sets: Vec<Vec<LabelId>> = (0..4)
        .map(|t| {
            (0..5)
                .map(|i| {
                    labels
                        .insert_or_attach(&format!("t{t}-l{i}"))
                        .expect("label")
                        .label_id
                })
                .collect()
        })
        .collect();

    let handles: Vec<_> = sets
        .iter()
        .cloned()
        .map(|set| {
            let book_labels = book_labels.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    book_labels.replace_labels_by_ids(book, &set).expect("replace");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("thread");
    }

    let final_ids: BTreeSet<LabelId> = book_labels
        .label_ids_for_book(book)
        .expect("ids")
        .into_iter()
        .collect();
    let matching = sets
        .iter()
        .filter(|set| set.iter().copied().collect::<BTreeSet<_>>() == final_ids)
        .count();
    assert_eq!(matching, 1, "book ended with a mixed set: {final_ids:?}");

    let page = labels.list_page(1, 50).expect("list");
    let attached: u32 = page.items.iter().map(|l| l.book_count).sum();
    assert_eq!(attached, 5);
}
