#![expect(missing_docs)]

mod common;

use std::thread;

use jsonmarshal::{FieldLookup, Reflect, from_str};

use crate::common::{Blog, FLAT_BLOG, Post};

#[test]
fn field_tables_build_once_across_threads() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            thread::spawn(|| {
                let table = Post::field_table().unwrap();
                let blog: Blog = from_str(FLAT_BLOG).unwrap();
                (std::ptr::from_ref(table).addr(), blog.posts.len())
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(results[0].1, 1);
}

#[test]
fn table_agrees_with_linear_scan() {
    let table = Post::field_table().unwrap();
    for (index, field) in Post::fields().iter().enumerate() {
        assert_eq!(table.find(field.name, FieldLookup::PerfectHash), Some(index));
        assert_eq!(table.find(field.name, FieldLookup::Linear), Some(index));
    }
    assert_eq!(table.find("titles", FieldLookup::PerfectHash), None);
    assert_eq!(table.find("", FieldLookup::Auto), None);
}
