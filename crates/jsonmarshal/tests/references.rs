#![expect(missing_docs)]

mod common;

use std::rc::Rc;

use jsonmarshal::{ErrorKind, Value, from_str, from_tree, path, to_string, to_tree};

use crate::common::{Attachment, Author, BLOG, Blog, FLAT_BLOG, Post, Status};

fn blog_tree() -> Value {
    BLOG.parse().unwrap()
}

#[test]
fn shared_authors_are_aliased() {
    let blog: Blog = from_tree(&blog_tree()).unwrap();
    let [first, second] = blog.posts.as_slice() else {
        panic!("expected two posts, got {}", blog.posts.len());
    };
    assert!(Rc::ptr_eq(&first.author, &blog.owner));
    assert!(Rc::ptr_eq(&second.author, &first.reviewers[0]));
    assert!(Rc::ptr_eq(&second.reviewers[0], &blog.owner));
    assert_eq!(second.author.name, "Grace");
    assert_eq!(first.attachments, [Attachment::Size(42), Attachment::Link("https://example.com/a.png".into())]);
}

#[test]
fn reserializing_restores_the_document() {
    let tree = blog_tree();
    let blog: Blog = from_tree(&tree).unwrap();
    assert_eq!(to_tree(&blog).unwrap(), tree);
}

#[test]
fn each_shared_author_is_written_once() {
    let ada = Rc::new(Author {
        name: "Ada".into(),
        email: None,
    });
    let blog = Blog {
        name: "b".into(),
        owner: Rc::clone(&ada),
        posts: vec![
            Post {
                title: "one".into(),
                author: Rc::clone(&ada),
                ..Post::default()
            },
            Post {
                title: "two".into(),
                status: Some(Status::Draft),
                author: ada,
                ..Post::default()
            },
        ],
    };
    let text = to_string(&blog).unwrap();
    assert_eq!(text.matches(r#""name":"Ada""#).count(), 1);
    assert_eq!(text.matches(r#"{"$ref":"/owner"}"#).count(), 2);
}

#[test]
fn forward_references_fail() {
    let tree: Value = r#"{
        "name": "b",
        "posts": [{"title": "t", "author": {"$ref": "/owner"}}],
        "owner": {"name": "Ada"}
    }"#
    .parse()
    .unwrap();
    let err = from_tree::<Blog>(&tree).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnresolvedReference("/owner".into()));
    assert_eq!(err.path, path!["posts", 0, "author"]);
}

#[test]
fn streaming_decoder_reads_references_as_objects() {
    let err = from_str::<Blog>(BLOG).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MissingField("name"));

    let blog: Blog = from_str(FLAT_BLOG).unwrap();
    assert_eq!(blog.posts[0].author, blog.owner);
    assert!(!Rc::ptr_eq(&blog.posts[0].author, &blog.owner));
    let tags: Vec<_> = blog.posts[0].tags.iter().map(String::as_str).collect();
    assert_eq!(tags, ["intro", "rust"]);
}
