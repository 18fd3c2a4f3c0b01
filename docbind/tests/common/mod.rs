#![allow(dead_code)]

use docbind::{bson::Bson, memory::InMemoryStore, prelude::*};
use serde::{Deserialize, Serialize};

pub const TEST_DB: &str = "jc_test";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
pub struct ImplicitID {
    #[serde(skip)]
    binding: Binding,
    pub data: String,
}

impl ImplicitID {
    pub fn new(data: &str) -> Self {
        Self { data: data.to_string(), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
pub struct ExplicitID {
    #[serde(skip)]
    binding: Binding,
    #[serde(rename = "_id")]
    pub my_id: i32,
    pub data: String,
}

impl ExplicitID {
    pub fn new(my_id: i32, data: &str) -> Self {
        Self { my_id, data: data.to_string(), ..Default::default() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
pub struct ExplicitCollection {
    #[serde(skip)]
    #[record(collection = "my_collection")]
    binding: Binding,
    pub data: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
pub struct ImplicitCollection {
    #[serde(skip)]
    binding: Binding,
    pub data: String,
}

impl ImplicitCollection {
    pub fn new(data: &str) -> Self {
        Self { data: data.to_string(), ..Default::default() }
    }
}

/// Two fields claim the identity; `first` is declared first and holds it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
pub struct TwoIds {
    #[serde(skip)]
    binding: Binding,
    #[record(id)]
    pub first: i32,
    #[serde(rename = "_id")]
    pub second: i32,
    pub data: String,
}

impl TwoIds {
    pub fn new(first: i32, second: i32, data: &str) -> Self {
        Self { first, second, data: data.to_string(), ..Default::default() }
    }
}

/// Mixes visibility, exclusion and a codec field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Record)]
pub struct Profile {
    #[serde(skip)]
    binding: Binding,
    #[record(id)]
    pub handle: String,
    pub token: UuidField,
    pub visits: i64,
    #[serde(skip)]
    pub cache: Vec<u8>,
    #[serde(default)]
    #[record(skip)]
    pub draft: Option<String>,
    note: String,
}

impl Profile {
    pub fn new(handle: &str, note: &str) -> Self {
        Self {
            handle: handle.to_string(),
            token: UuidField::new(),
            note: note.to_string(),
            ..Default::default()
        }
    }

    pub fn note(&self) -> &str {
        &self.note
    }
}

pub async fn memory_session() -> Session {
    Session::connect(InMemoryStore::builder().database(TEST_DB))
        .await
        .unwrap()
}

/// Saves `num` bound [`ImplicitID`] records carrying `data` and returns their identities.
pub async fn prepare_simple_records(session: &Session, num: usize, data: &str) -> Vec<Bson> {
    let mut ids = Vec::with_capacity(num);
    for _ in 0..num {
        let mut doc = ImplicitID::new(data);
        doc.bind(session).unwrap();
        doc.save(session, LeaseKind::Shared).await.unwrap();
        ids.push(doc.id().unwrap().unwrap());
    }
    ids
}

pub async fn drop_test_db(session: &Session) {
    session
        .lease(LeaseKind::Shared)
        .await
        .unwrap()
        .drop_database(&session.default_database().unwrap())
        .await
        .unwrap();
}
