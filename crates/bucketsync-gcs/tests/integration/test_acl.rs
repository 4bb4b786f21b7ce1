//! Object ACL reads and writes

use std::sync::Arc;

use bucketsync_core::domain::{
    AccessGrant, AclEntry, IdType, ObjectAddress, Permission,
};
use bucketsync_core::ports::IObjectStore;
use bucketsync_core::usecases::AccessPolicyUseCase;
use serde_json::json;
use wiremock::{
    matchers::{body_json, method, path, query_param},
    Mock, ResponseTemplate,
};

use crate::common::{object_json, object_path, setup_store, BUCKET};

async fn mount_acl(server: &wiremock::MockServer, name: &str, acl: serde_json::Value) {
    let mut resource = object_json(name, b"data", 5);
    resource["acl"] = acl;
    Mock::given(method("GET"))
        .and(path(object_path(name)))
        .and(query_param("projection", "full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(resource))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_grants_parses_entities() {
    let (server, store) = setup_store().await;
    mount_acl(
        &server,
        "obj",
        json!([
            {"entity": "project-owners-123", "role": "OWNER", "projectTeam": {"team": "owners"}},
            {"entity": "user-bob@example.com", "role": "READER", "email": "bob@example.com"},
            {"entity": "domain-example.com", "role": "OWNER", "domain": "example.com"},
            {"entity": "allUsers", "role": "READER"}
        ]),
    )
    .await;

    let entries = store.get_grants(BUCKET, "obj").await.unwrap();

    assert_eq!(
        entries,
        vec![
            AclEntry::Other {
                entity: "project-owners-123".into(),
                role: "OWNER".into()
            },
            AccessGrant::new(IdType::UserByEmail, "bob@example.com", Permission::Read).into(),
            AccessGrant::new(IdType::GroupByDomain, "example.com", Permission::Owner).into(),
            AclEntry::Other {
                entity: "allUsers".into(),
                role: "READER".into()
            },
        ]
    );
}

#[tokio::test]
async fn test_set_grants_patches_full_list() {
    let (server, store) = setup_store().await;

    Mock::given(method("PATCH"))
        .and(path(object_path("obj")))
        .and(body_json(json!({"acl": [
            {"entity": "allUsers", "role": "READER"},
            {"entity": "group-00b4903a97", "role": "WRITER"}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(object_json("obj", b"data", 6)))
        .expect(1)
        .mount(&server)
        .await;

    store
        .set_grants(
            BUCKET,
            "obj",
            &[
                AclEntry::Other {
                    entity: "allUsers".into(),
                    role: "READER".into(),
                },
                AccessGrant::new(IdType::GroupById, "00b4903a97", Permission::Write).into(),
                AccessGrant::new(IdType::UserById, "ignored", Permission::Empty).into(),
            ],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_set_acl_replaces_entry_and_keeps_others() {
    let (server, store) = setup_store().await;
    mount_acl(
        &server,
        "dir%2Fobj",
        json!([
            {"entity": "project-owners-123", "role": "OWNER"},
            {"entity": "user-bob@example.com", "role": "READER"}
        ]),
    )
    .await;
    Mock::given(method("PATCH"))
        .and(path(object_path("dir%2Fobj")))
        .and(body_json(json!({"acl": [
            {"entity": "project-owners-123", "role": "OWNER"},
            {"entity": "user-bob@example.com", "role": "OWNER"}
        ]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(object_json("dir/obj", b"data", 6)))
        .expect(1)
        .mount(&server)
        .await;

    let access = AccessPolicyUseCase::new(Arc::new(store));
    let object = ObjectAddress::parse(&format!("gs://{BUCKET}/dir/obj")).unwrap();

    assert_eq!(
        access
            .get_acl(&object, IdType::UserByEmail, "bob@example.com")
            .await
            .unwrap(),
        Permission::Read
    );
    access
        .set_acl(&object, IdType::UserByEmail, "bob@example.com", Permission::Owner)
        .await
        .unwrap();
}
