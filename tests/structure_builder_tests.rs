mod common;

use std::sync::Arc;
use common::{Customer, Order, customer};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use structdb::codec::{DocumentCodec, JsonCodec};
use structdb::schema::StructureSchema;
use structdb::structure::{BuildStrategy, SequentialIdentitySource, StructureBuilder};
use structdb::{DbError, StructureId, Value};
use uuid::Uuid;

fn builder() -> StructureBuilder {
    StructureBuilder::new(Arc::new(SequentialIdentitySource::new()))
}

#[test]
fn test_missing_identities_are_assigned_and_existing_kept() {
    let schema = StructureSchema::<Customer>::derive().unwrap();
    let mut items = vec![customer("Ann", 30), customer("Bob", 41), customer("Cid", 52)];
    items[1].id = 42;

    let structures = builder().build_structures(&mut items, &schema).unwrap();

    let ids: Vec<StructureId> = structures.iter().map(|s| s.id.clone()).collect();
    assert_eq!(
        ids,
        vec![StructureId::Identity(1), StructureId::Identity(42), StructureId::Identity(2)]
    );
    assert_eq!(items.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 42, 2]);
}

#[test]
fn test_seeded_source_continues_sequence() {
    let schema = StructureSchema::<Customer>::derive().unwrap();
    let builder = StructureBuilder::new(Arc::new(SequentialIdentitySource::seeded(schema.hash(), 100)));
    let mut item = customer("Ann", 30);

    let structure = builder.build_structure(&mut item, &schema).unwrap();

    assert_eq!(structure.id, StructureId::Identity(101));
    assert_eq!(item.id, 101);
}

#[test]
fn test_guid_identities_are_generated() {
    let schema = StructureSchema::<Order>::derive().unwrap();
    let mut items = vec![Order::default(), Order::default()];

    let structures = builder().build_structures(&mut items, &schema).unwrap();

    assert!(items.iter().all(|o| !o.order_id.is_nil()));
    assert_ne!(items[0].order_id, items[1].order_id);
    assert_eq!(structures[0].id, StructureId::Guid(items[0].order_id));
}

#[test]
fn test_batch_shares_one_timestamp() {
    let schema = StructureSchema::<Customer>::derive().unwrap();
    let mut items: Vec<Customer> = (0..20).map(|i| customer("Batch", i)).collect();

    let structures = builder()
        .strategy(BuildStrategy::Parallel { workers: 4 })
        .build_structures(&mut items, &schema)
        .unwrap();

    let stamp = items[0].updated_at.expect("timestamp stamped");
    assert!(items.iter().all(|c| c.updated_at == Some(stamp)));
    assert!(structures
        .iter()
        .all(|s| s.index_value("updated_at") == Some(&Value::Timestamp(stamp))));
}

#[test]
fn test_indexes_follow_declared_members() {
    let schema = StructureSchema::<Customer>::derive().unwrap();
    let mut item = customer("Ann", 30);
    item.tags = vec!["vip".into()];

    let structure = builder().build_structure(&mut item, &schema).unwrap();

    let paths: Vec<&str> = structure.indexes.iter().map(|i| i.member_path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["customer_no", "name", "age", "is_active", "address.street", "address.zip", "updated_at"]
    );
    assert_eq!(structure.index_value("address.zip"), Some(&Value::Text("12345".into())));
    let uniques: Vec<&str> = structure.uniques().map(|i| i.member_path.as_str()).collect();
    assert_eq!(uniques, vec!["customer_no"]);
    assert!(structure.json.contains("\"tags\":[\"vip\"]"));
}

#[test]
fn test_parallel_build_matches_sequential() {
    let schema = StructureSchema::<Order>::derive().unwrap();
    let orders: Vec<Order> = (0..64)
        .map(|i| Order {
            order_id: Uuid::new_v4(),
            customer_id: i,
            total: i as f64 * 1.25,
        })
        .collect();

    let mut sequential_items = orders.clone();
    let sequential = builder()
        .strategy(BuildStrategy::Sequential)
        .build_structures(&mut sequential_items, &schema)
        .unwrap();

    let mut parallel_items = orders.clone();
    let parallel = builder()
        .strategy(BuildStrategy::Parallel { workers: 5 })
        .build_structures(&mut parallel_items, &schema)
        .unwrap();

    assert_eq!(sequential, parallel);
    assert_eq!(parallel_items, orders);
}

#[test]
fn test_empty_string_identity_is_unavailable() {
    use serde::{Deserialize, Serialize};
    use structdb::Document;

    #[derive(Debug, Default, Serialize, Deserialize, Document)]
    struct Tag {
        id: String,
        label: String,
    }

    let schema = StructureSchema::<Tag>::derive().unwrap();
    let mut tag = Tag::default();
    let err = builder().build_structure(&mut tag, &schema).unwrap_err();
    assert!(matches!(err, DbError::IdentityUnavailable(_)));
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize, structdb::Document)]
struct Ticket {
    id: i32,
    title: String,
    #[document(timestamp)]
    stamped_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn near_i32_limit(schema: &StructureSchema<Ticket>) -> StructureBuilder {
    StructureBuilder::new(Arc::new(SequentialIdentitySource::seeded(
        schema.hash(),
        i64::from(i32::MAX) - 1,
    )))
}

#[test]
fn test_failed_batch_leaves_items_untouched() {
    let schema = StructureSchema::<Ticket>::derive().unwrap();
    let earlier = chrono::Utc::now() - chrono::Duration::days(1);
    let mut items = vec![
        Ticket {
            stamped_at: Some(earlier),
            ..Ticket::default()
        },
        Ticket::default(),
        Ticket::default(),
    ];
    let before = items.clone();

    let err = near_i32_limit(&schema)
        .strategy(BuildStrategy::Sequential)
        .build_structures(&mut items, &schema)
        .unwrap_err();

    assert!(matches!(err, DbError::TypeMismatch(_)));
    assert_eq!(items, before);
}

#[test]
fn test_failed_parallel_batch_undoes_finished_runs() {
    let schema = StructureSchema::<Ticket>::derive().unwrap();
    let mut items = vec![Ticket::default(), Ticket::default(), Ticket::default()];

    let err = near_i32_limit(&schema)
        .strategy(BuildStrategy::Parallel { workers: 3 })
        .build_structures(&mut items, &schema)
        .unwrap_err();

    assert!(matches!(err, DbError::TypeMismatch(_)));
    assert!(items.iter().all(|t| t.id == 0 && t.stamped_at.is_none()));
}

proptest! {
    #[test]
    fn built_body_decodes_to_the_stored_item(
        name in "[A-Za-z ]{0,24}",
        age in 0i32..120,
        street in "[A-Za-z0-9 ]{0,32}",
        active in any::<bool>(),
    ) {
        let schema = StructureSchema::<Customer>::derive().unwrap();
        let mut item = customer(&name, age);
        item.is_active = active;
        item.address.street = street;

        let structure = builder().build_structure(&mut item, &schema).unwrap();
        let decoded: Customer = JsonCodec.decode(&structure.json).unwrap();

        prop_assert_eq!(decoded, item);
    }
}
