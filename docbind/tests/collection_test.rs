mod common;

use docbind::{
    bson::{Bson, doc},
    error::{ConnectionError, IdentityError, SchemaError},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use common::*;

#[ctor::ctor]
fn init() {
    colog::init();
}

#[tokio::test]
async fn test_single_document_init() {
    let session = memory_session().await;
    let mut doc = ExplicitID::new(1001, "jc_test");

    assert!(!doc.is_initialized());
    doc.bind(&session).unwrap();
    assert!(doc.is_initialized());
}

#[tokio::test]
async fn test_implicit_collection_name() {
    #[derive(Default, Serialize, Deserialize, Record)]
    #[allow(non_camel_case_types)]
    struct camelCased {
        #[serde(skip)]
        binding: Binding,
    }

    #[derive(Default, Serialize, Deserialize, Record)]
    struct TrueCamelCased {
        #[serde(skip)]
        binding: Binding,
    }

    #[derive(Default, Serialize, Deserialize, Record)]
    #[allow(non_camel_case_types)]
    struct snake_cased {
        #[serde(skip)]
        binding: Binding,
    }

    #[derive(Default, Serialize, Deserialize, Record)]
    #[allow(non_camel_case_types)]
    struct plain {
        #[serde(skip)]
        binding: Binding,
    }

    let session = memory_session().await;

    let mut cc = camelCased::default();
    cc.bind(&session).unwrap();
    assert_eq!(cc.collection_name(), "camel_cased");

    let mut tcc = TrueCamelCased::default();
    tcc.bind(&session).unwrap();
    assert_eq!(tcc.collection_name(), "true_camel_cased");

    let mut sc = snake_cased::default();
    sc.bind(&session).unwrap();
    assert_eq!(sc.collection_name(), "snake_cased");

    let mut p = plain::default();
    p.bind(&session).unwrap();
    assert_eq!(p.collection_name(), "plain");

    let mut explicit = ExplicitID::default();
    explicit.bind(&session).unwrap();
    assert_eq!(explicit.collection_name(), "explicit_i_d");
}

#[tokio::test]
async fn test_explicit_collection_name() {
    #[derive(Default, Serialize, Deserialize, Record)]
    struct BoringStruct {
        #[serde(skip)]
        #[record(collection = "my_awesome_collection")]
        binding: Binding,
        pub data: String,
    }

    let session = memory_session().await;
    let mut doc = BoringStruct { data: "Boring data".into(), ..Default::default() };
    doc.bind(&session).unwrap();

    assert_eq!(doc.collection_name(), "my_awesome_collection");
}

#[tokio::test]
async fn test_empty_collection_override_falls_back() {
    #[derive(Default, Serialize, Deserialize, Record)]
    struct Fallback {
        #[serde(skip)]
        #[record(collection = "")]
        binding: Binding,
    }

    let session = memory_session().await;
    let mut doc = Fallback::default();
    doc.bind(&session).unwrap();

    assert_eq!(doc.collection_name(), "fallback");
}

#[tokio::test]
async fn test_default_db() {
    let session = memory_session().await;
    let mut doc = ImplicitID::new("TestDefaultDB");
    doc.bind(&session).unwrap();

    assert_eq!(doc.database(), TEST_DB);
}

#[tokio::test]
async fn test_db_change() {
    let session = memory_session().await;
    let mut doc = ImplicitID::new("TestDBChange");
    doc.bind(&session).unwrap();

    let new_db = format!("{TEST_DB}_fancy");
    doc.set_database(&new_db);

    assert_eq!(doc.database(), new_db);
}

#[test]
fn test_bind_without_session_degrades() {
    let mut doc = ImplicitID::new("no session");

    let result = doc.bind(&Session::uninitialized());

    assert!(matches!(
        result,
        Err(DocumentStoreError::Connection(ConnectionError::NotInitialized))
    ));
    assert!(doc.is_initialized());
    assert_eq!(doc.database(), "");
    assert_eq!(doc.collection_name(), "implicit_i_d");
}

#[tokio::test]
async fn test_get_field() {
    let session = memory_session().await;
    let mut doc = ImplicitID::new("TestGetField");
    doc.bind(&session).unwrap();

    assert_eq!(doc.get_field("data").unwrap(), Bson::String("TestGetField".into()));
}

#[tokio::test]
async fn test_get_field_protect_unexported() {
    let mut doc = Profile::new("ann", "Unexported");
    doc.bind(&memory_session().await).unwrap();

    assert!(matches!(
        doc.get_field("note"),
        Err(DocumentStoreError::Schema(SchemaError::UnexportedField(_)))
    ));
    assert_eq!(doc.get_field("handle").unwrap(), Bson::String("ann".into()));
}

#[tokio::test]
async fn test_get_field_reads_excluded_fields() {
    let mut doc = Profile::new("ann", "Excluded");
    doc.cache = vec![1, 2];
    doc.draft = Some("unsaved".into());
    doc.bind(&memory_session().await).unwrap();

    assert!(matches!(doc.get_field("cache").unwrap(), Bson::Array(items) if items.len() == 2));
    assert_eq!(doc.get_field("draft").unwrap(), Bson::String("unsaved".into()));
}

#[tokio::test]
async fn test_get_field_missing() {
    let mut doc = ImplicitID::new("TestGetFieldMissing");
    doc.bind(&memory_session().await).unwrap();

    assert!(matches!(
        doc.get_field("DefinitelyNotPresent"),
        Err(DocumentStoreError::Schema(SchemaError::FieldNotFound(_)))
    ));
}

#[tokio::test]
async fn test_insert_explicit_id_collection() {
    let session = memory_session().await;
    let mut doc = ExplicitID::new(666, "TestInsertExplicitIDCollection");
    doc.bind(&session).unwrap();

    let ack = doc.save(&session, LeaseKind::Shared).await.unwrap();
    assert_eq!(ack, WriteAck { matched: 0, inserted: 1 });

    let stored = session
        .lease(LeaseKind::Shared)
        .await
        .unwrap()
        .find_by_id(TEST_DB, "explicit_i_d", &Bson::Int32(666))
        .await
        .unwrap();
    assert_eq!(stored, Some(doc! { "_id": 666, "data": "TestInsertExplicitIDCollection" }));
}

#[tokio::test]
async fn test_insert_implicit_id_collection() {
    let session = memory_session().await;
    let mut doc = ImplicitID::new("TestInsertImplicitIDCollection");
    doc.bind(&session).unwrap();

    assert_eq!(doc.id().unwrap(), None);
    doc.save(&session, LeaseKind::Dedicated).await.unwrap();

    let id = doc.id().unwrap().unwrap();
    assert!(matches!(id, Bson::ObjectId(_)));

    let stored = session
        .lease(LeaseKind::Shared)
        .await
        .unwrap()
        .find_by_id(TEST_DB, "implicit_i_d", &id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.get_str("data").unwrap(), "TestInsertImplicitIDCollection");
}

#[tokio::test]
async fn test_new_implicit_id() {
    let session = memory_session().await;
    let mut doc = ImplicitID::new("TestNewImplicitID");
    doc.bind(&session).unwrap();
    doc.save(&session, LeaseKind::Shared).await.unwrap();

    let old_id = doc.id().unwrap();
    let new_id = doc.new_implicit_id().unwrap();

    assert_ne!(old_id, Some(Bson::ObjectId(new_id)));
    assert_eq!(doc.id().unwrap(), Some(Bson::ObjectId(new_id)));
}

#[tokio::test]
async fn test_new_implicit_id_on_explicit_record() {
    let session = memory_session().await;
    let mut doc = ExplicitID::new(7, "TestNewImplicitIDExplicit");
    doc.bind(&session).unwrap();

    assert!(matches!(
        doc.new_implicit_id(),
        Err(DocumentStoreError::Identity(IdentityError::ExplicitIdentity(_, _)))
    ));
}

#[tokio::test]
async fn test_save_unbound_record_fails() {
    let session = memory_session().await;
    let mut doc = ImplicitID::new("unbound");

    assert!(matches!(
        doc.save(&session, LeaseKind::Shared).await,
        Err(DocumentStoreError::Schema(SchemaError::Unbound(_)))
    ));
}

#[tokio::test]
async fn test_upsert_idempotence() {
    let session = memory_session().await;
    let mut doc = ExplicitID::new(42, "first");
    doc.bind(&session).unwrap();
    doc.save(&session, LeaseKind::Shared).await.unwrap();

    doc.data = "second".into();
    let ack = doc.save(&session, LeaseKind::Shared).await.unwrap();
    assert_eq!(ack, WriteAck { matched: 1, inserted: 0 });

    let stored = Query::<Vec<ExplicitID>>::new(&session)
        .unwrap()
        .fetch(LeaseKind::Shared)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].data, "second");
}

#[tokio::test]
async fn test_saved_document_omits_excluded_fields() {
    let session = memory_session().await;
    let mut doc = Profile::new("bob", "kept");
    doc.cache = vec![1, 2, 3];
    doc.draft = Some("never stored".into());
    doc.visits = 3;
    doc.bind(&session).unwrap();
    doc.save(&session, LeaseKind::Shared).await.unwrap();

    let stored = session
        .lease(LeaseKind::Shared)
        .await
        .unwrap()
        .find_by_id(TEST_DB, "profile", &Bson::String("bob".into()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        stored.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["_id", "token", "visits", "note"]
    );
}

#[tokio::test]
async fn test_info() {
    let session = memory_session().await;
    let mut doc = ExplicitID::new(5, "TestInfo");
    doc.bind(&session).unwrap();

    let info = doc.info().unwrap();

    assert_eq!(info.database, TEST_DB);
    assert_eq!(info.collection, "explicit_i_d");
    assert_eq!(info.record["_id"], 5);
    assert!(info.to_string().contains("Collection explicit_i_d"));
}

#[tokio::test]
async fn test_global_session_binds_records() {
    let mut doc = ImplicitID::new("global");
    // Nothing installed in this test binary
    assert!(matches!(
        doc.bind(&docbind::session::current()),
        Err(DocumentStoreError::Connection(ConnectionError::NotInitialized))
    ));
}

#[tokio::test]
async fn test_second_identity_field_is_stored_as_ordinary_field() {
    let session = memory_session().await;
    let mut doc = TwoIds::new(1, 2, "X");
    doc.bind(&session).unwrap();
    doc.save(&session, LeaseKind::Shared).await.unwrap();

    assert_eq!(doc.id().unwrap(), Some(Bson::Int32(1)));
    let stored = session
        .lease(LeaseKind::Shared)
        .await
        .unwrap()
        .find_by_id(TEST_DB, "two_ids", &Bson::Int32(1))
        .await
        .unwrap();
    assert_eq!(stored, Some(doc! { "_id": 1, "data": "X", "second": 2 }));

    let found = Query::<Option<TwoIds>>::new(&session)
        .unwrap()
        .filter(Filter::eq("second", 2))
        .fetch(LeaseKind::Shared)
        .await
        .unwrap()
        .unwrap();
    assert_eq!((found.first, found.second, found.data.as_str()), (1, 2, "X"));
}
