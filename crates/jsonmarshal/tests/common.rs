#![allow(missing_docs, dead_code)]

use std::{collections::BTreeSet, rc::Rc};

use chrono::NaiveDate;
use jsonmarshal::{reflect, reflect_enum, reflect_union};

#[derive(Debug, Default, PartialEq)]
pub struct Author {
    pub name: String,
    pub email: Option<String>,
}

reflect!(Author {
    #[required] name: String,
    email: Option<String>,
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    Draft,
    Published,
}

reflect_enum!(Status { Draft => "draft", Published => "published" });

#[derive(Debug, PartialEq)]
pub enum Attachment {
    Size(u64),
    Link(String),
}

reflect_union!(Attachment { Size(u64), Link(String) });

#[derive(Debug, Default, PartialEq)]
pub struct Post {
    pub title: String,
    pub status: Option<Status>,
    pub author: Rc<Author>,
    pub reviewers: Vec<Rc<Author>>,
    pub tags: BTreeSet<String>,
    pub published: Option<NaiveDate>,
    pub attachments: Vec<Attachment>,
}

reflect!(Post {
    #[required] title: String,
    status: Option<Status>,
    #[required] author: Rc<Author>,
    reviewers: Vec<Rc<Author>>,
    tags: BTreeSet<String>,
    published: Option<NaiveDate>,
    attachments: Vec<Attachment>,
});

#[derive(Debug, Default, PartialEq)]
pub struct Blog {
    pub name: String,
    pub owner: Rc<Author>,
    pub posts: Vec<Post>,
}

reflect!(Blog {
    #[required] name: String,
    #[required] owner: Rc<Author>,
    posts: Vec<Post>,
});

/// A blog whose authors are shared between posts.
pub const BLOG: &str = r#"{
    "name": "notes",
    "owner": {"name": "Ada", "email": "ada@example.com"},
    "posts": [
        {
            "title": "First",
            "status": "published",
            "author": {"$ref": "/owner"},
            "reviewers": [{"name": "Grace"}],
            "tags": ["intro", "rust"],
            "published": "2024-02-29",
            "attachments": [42, "https://example.com/a.png"]
        },
        {
            "title": "Second",
            "status": "draft",
            "author": {"$ref": "/posts/0/reviewers/0"},
            "reviewers": [{"$ref": "/owner"}],
            "tags": [],
            "attachments": []
        }
    ]
}"#;

/// [`BLOG`] without back-references, as the streaming decoder expects it.
pub const FLAT_BLOG: &str = r#"{
    "name": "notes",
    "owner": {"name": "Ada", "email": "ada@example.com"},
    "posts": [
        {
            "title": "First",
            "status": "published",
            "author": {"name": "Ada", "email": "ada@example.com"},
            "reviewers": [{"name": "Grace"}],
            "tags": ["rust", "intro"],
            "published": "2024-02-29",
            "attachments": [42, "https://example.com/a.png"]
        }
    ]
}"#;
