use remote_model::mock::{MockService, Operation};
use remote_model::query::{FieldDescriptor, Sort, SortDirective};
use remote_model::{Attributes, Error, Fault, FindRequest, Key, Record, Related};
use serde_json::{json, Value};

fn attributes(value: Value) -> Attributes {
    value.as_object().cloned().expect("attributes must be an object")
}

fn model(mock: &MockService, type_name: &str) -> Record {
    mock.client().model(type_name).expect("valid type name")
}

#[test]
fn test_primary_key_guessing_falls_back_progressively() {
    let mock = MockService::new();
    let mut bar = model(&mock, "Bar");
    bar.set("primaryKey", 9);
    bar.set("id", 99);
    bar.set("foo", 999);
    bar.set("bar", "99999");

    assert_eq!(bar.key(None).unwrap(), Key::Int(9));
    bar.unset("primaryKey");
    assert_eq!(bar.key(None).unwrap(), Key::Int(99));
    bar.unset("id");
    assert_eq!(bar.key(None).unwrap(), Key::from("99999"));
    assert_eq!(bar.key(Some("foo")).unwrap(), Key::Int(999));
}

#[test]
fn test_set_related_record_stores_its_key() {
    let mock = MockService::new();
    let csr = model(&mock, "CSR").hydrate(attributes(json!({"id": 3})));
    let mut job = model(&mock, "Job");

    job.set_related("csr", &csr).unwrap();
    assert_eq!(job.get("csr"), Some(&json!(3)));
}

#[tokio::test]
async fn test_read_hydrates_persisted_record() {
    let mock = MockService::new();
    mock.expect_read("CSR", 3).return_ok(Some(attributes(json!({"id": 3, "name": "Jane"}))));

    let csr = model(&mock, "CSR").read(3).await.unwrap().expect("CSR found");
    assert!(csr.exists());
    assert!(!csr.is_dirty());
    assert_eq!(csr.get("name"), Some(&json!("Jane")));
    mock.verify();
}

#[tokio::test]
async fn test_read_with_null_key_skips_service() {
    let mock = MockService::new();
    let csr = model(&mock, "CSR");

    assert!(csr.read(0).await.unwrap().is_none());
    assert!(csr.read("").await.unwrap().is_none());
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_read_translates_missing_object() {
    let mock = MockService::new();
    mock.expect_read("Job", "404")
        .return_err(Fault::new("soap:Server", "Unable to locate object: Job 404"));

    assert!(model(&mock, "Job").read("404").await.unwrap().is_none());
    mock.verify();
}

#[tokio::test]
async fn test_read_propagates_other_faults() {
    let mock = MockService::new();
    mock.expect_read("Job", "1")
        .return_err(Fault::new("soap:Server", "Permission denied"));

    let result = model(&mock, "Job").read("1").await;
    assert!(matches!(result, Err(Error::Fault(fault)) if fault.message == "Permission denied"));
}

#[tokio::test]
async fn test_read_or_fail() {
    let mock = MockService::new();
    mock.expect_read("SalesPerson", 5).return_ok(None);

    let err = model(&mock, "SalesPerson").read_or_fail(5).await.unwrap_err();
    assert_eq!(err.to_string(), "SalesPerson [5] does not exist");
}

#[tokio::test]
async fn test_save_creates_then_updates() {
    let mock = MockService::new();
    mock.expect_create("Customer")
        .with_attributes(json!({"custName": "Acme"}))
        .return_ok(attributes(json!({"id": "ACME", "custName": "Acme", "active": true})));
    mock.expect_update("Customer")
        .with_attributes(json!({"id": "ACME", "custName": "Acme Corp", "active": true}))
        .return_ok(attributes(json!({"id": "ACME", "custName": "Acme Corp", "active": true})));

    let mut customer = model(&mock, "Customer").new_instance(attributes(json!({"custName": "Acme"})));
    assert!(!customer.exists());

    customer.save().await.unwrap();
    assert!(customer.exists());
    assert!(!customer.is_dirty());
    assert_eq!(customer.get("active"), Some(&json!(true)));

    customer.set("custName", "Acme Corp");
    assert!(customer.is_dirty());
    customer.save().await.unwrap();
    assert!(!customer.is_dirty());

    mock.verify();
}

#[tokio::test]
async fn test_create_from_prototype() {
    let mock = MockService::new();
    mock.expect_create("Job")
        .return_ok(attributes(json!({"job": "1001", "description": "Brochure"})));

    let job = model(&mock, "Job")
        .create(attributes(json!({"description": "Brochure"})))
        .await
        .unwrap();
    assert!(job.exists());
    assert_eq!(job.key(None).unwrap(), Key::from("1001"));
}

#[tokio::test]
async fn test_delete() {
    let mock = MockService::new();
    mock.expect_delete("Job", "1001").return_ok(());

    let mut job = model(&mock, "Job").hydrate(attributes(json!({"job": "1001"})));
    assert!(job.delete(None).await.unwrap());
    assert!(!job.exists());

    // A deleted record is a no-op to delete again.
    assert!(!job.delete(None).await.unwrap());
    mock.verify();
}

#[tokio::test]
async fn test_duplicate_sends_original_and_dirty_overrides() {
    let mock = MockService::new();
    mock.expect_clone("Job")
        .with_attributes(json!({"job": "1001", "description": "Brochure"}))
        .with_overrides(json!({"description": "Brochure (copy)"}))
        .with_new_key(Some(Key::from("1002")))
        .return_ok(attributes(json!({"job": "1002", "description": "Brochure (copy)"})));

    let mut job = model(&mock, "Job").hydrate(attributes(json!({"job": "1001", "description": "Brochure"})));
    job.set("description", "Brochure (copy)");

    let copy = job
        .duplicate(Some(Key::from("1002")))
        .await
        .unwrap()
        .expect("duplicated");

    assert!(copy.exists());
    assert_eq!(copy.key(None).unwrap(), Key::from("1002"));
    assert!(!job.is_dirty());
    assert_eq!(job.get("description"), Some(&json!("Brochure")));
    mock.verify();
}

#[tokio::test]
async fn test_duplicate_and_fresh_require_existing_record() {
    let mock = MockService::new();
    let mut job = model(&mock, "Job").new_instance(attributes(json!({"job": "1001"})));

    assert!(job.duplicate(None).await.unwrap().is_none());
    assert!(job.fresh(None).await.unwrap().is_none());
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_fresh_rereads() {
    let mock = MockService::new();
    mock.expect_read("Job", "1001")
        .return_ok(Some(attributes(json!({"job": "1001", "adminStatus": "C"}))));

    let job = model(&mock, "Job").hydrate(attributes(json!({"job": "1001", "adminStatus": "O"})));
    let fresh = job.fresh(None).await.unwrap().expect("still exists");
    assert_eq!(fresh.get("adminStatus"), Some(&json!("C")));
    assert_eq!(job.get("adminStatus"), Some(&json!("O")));
}

#[tokio::test]
async fn test_belongs_to() {
    let mock = MockService::new();
    mock.expect_read("Customer", "HOUSE")
        .return_ok(Some(attributes(json!({"id": "HOUSE"}))));

    let job = model(&mock, "Job").hydrate(attributes(json!({"job": "1001", "customer": "HOUSE"})));
    let customer = job.belongs_to("Customer", "customer").await.unwrap().expect("customer");
    assert_eq!(customer.type_name().as_str(), "Customer");
    mock.verify();
}

#[tokio::test]
async fn test_belongs_to_compound_key() {
    let mock = MockService::new();
    mock.expect_read("JobPart", "12345:01")
        .return_ok(Some(attributes(json!({"primaryKey": "12345:01"}))));

    let material = model(&mock, "JobMaterial")
        .hydrate(attributes(json!({"id": 7, "job": "12345", "jobPart": "01"})));
    let part = material.belongs_to("JobPart", "job:jobPart").await.unwrap();
    assert!(part.is_some());
    mock.verify();
}

#[tokio::test]
async fn test_belongs_to_null_foreign_key_skips_read() {
    let mock = MockService::new();
    let job = model(&mock, "Job").hydrate(attributes(json!({"job": "1001", "salesPerson": 0})));

    assert!(job.belongs_to("SalesPerson", "salesPerson").await.unwrap().is_none());
    assert!(mock.calls().is_empty());
}

#[test]
fn test_has_many_compound_foreign_key() {
    let mock = MockService::new();
    let part = model(&mock, "JobPart").hydrate(attributes(json!({"primaryKey": "12345:01"})));

    let builder = part.has_many("JobMaterial", "job:jobPart", None).unwrap();
    assert_eq!(
        builder.to_filter_expression(),
        r#"@job = "12345" and @jobPart = "01""#
    );
}

#[test]
fn test_has_many_compound_foreign_key_rejects_short_key() {
    let mock = MockService::new();
    let part = model(&mock, "JobPart").hydrate(attributes(json!({"primaryKey": "12345"})));

    let err = part.has_many("JobMaterial", "job:jobPart", None).unwrap_err();
    assert!(matches!(
        err,
        Error::KeyMismatch { ref foreign_key, ref key, .. }
            if foreign_key == "job:jobPart" && *key == Key::from("12345")
    ));

    let part = model(&mock, "JobPart").hydrate(attributes(json!({"primaryKey": "12345:01:A"})));
    assert!(matches!(
        part.has_many("JobMaterial", "job:jobPart", None),
        Err(Error::KeyMismatch { .. })
    ));
}

#[test]
fn test_has_many_integer_key() {
    let mock = MockService::new();
    let customer = model(&mock, "Customer").hydrate(attributes(json!({"id": 42})));

    let builder = customer.has_many("Job", "customer", None).unwrap();
    assert_eq!(builder.to_filter_expression(), "@customer = 42");
}

#[test]
fn test_morph_many() {
    let mock = MockService::new();
    let job = model(&mock, "Job").hydrate(attributes(json!({"job": "12345"})));

    let builder = job.morph_many("FileAttachment").unwrap();
    assert_eq!(
        builder.to_filter_expression(),
        r#"@baseObject = "Job" and @baseObjectKey = "12345""#
    );

    let builder = job.morph_many_on("Note", "sourceObject", "sourceKey", None).unwrap();
    assert_eq!(
        builder.to_filter_expression(),
        r#"@sourceObject = "Job" and @sourceKey = "12345""#
    );
}

#[tokio::test]
async fn test_attachments() {
    let mock = MockService::new();
    mock.expect_find("FileAttachment")
        .with_filter(r#"@baseObject = "Job" and @baseObjectKey = "12345""#)
        .return_ok(vec![json!(81), json!(82)]);

    let job = model(&mock, "Job").hydrate(attributes(json!({"job": "12345"})));
    let attachments = job.attachments().await.unwrap();
    assert_eq!(attachments.keys(), &[Key::Int(81), Key::Int(82)][..]);
    mock.verify();
}

#[tokio::test]
async fn test_belongs_to_relation_is_memoised() {
    let mock = MockService::new();
    mock.expect_read("CSR", 3).return_ok(Some(attributes(json!({"id": 3}))));

    let mut job = model(&mock, "Job").hydrate(attributes(json!({"job": "1001", "csr": 3})));

    let first = job.relation("csr").await.unwrap().into_one().expect("csr");
    assert_eq!(first.type_name().as_str(), "CSR");
    assert!(job.relation_loaded("csr"));

    let second = job.relation("csr").await.unwrap().into_one().expect("csr");
    assert_eq!(second.key(None).unwrap(), Key::Int(3));

    let reads = mock.calls().iter().filter(|c| c.operation == Operation::Read).count();
    assert_eq!(reads, 1);
    mock.verify();
}

#[tokio::test]
async fn test_has_many_relation_by_convention() {
    let mock = MockService::new();
    let mut job = model(&mock, "Job").hydrate(attributes(json!({"job": "12345"})));

    let Related::Many(builder) = job.relation("jobParts").await.unwrap() else {
        panic!("expected a has-many builder");
    };
    assert_eq!(builder.record().map(|r| r.type_name().as_str()), Some("JobPart"));
    assert_eq!(builder.to_filter_expression(), r#"@job = "12345""#);

    let Related::Many(builder) = job.relation("jobStatuses").await.unwrap() else {
        panic!("expected a has-many builder");
    };
    assert_eq!(builder.record().map(|r| r.type_name().as_str()), Some("JobStatus"));

    assert!(!job.relation_loaded("jobParts"));
    assert!(mock.calls().is_empty());
}

#[tokio::test]
async fn test_has_many_relation_uses_irregular_owner_name() {
    let mock = MockService::new();
    let mut csr = model(&mock, "CSR").hydrate(attributes(json!({"id": 3})));

    let builder = csr.relation("customers").await.unwrap().into_many().expect("builder");
    assert_eq!(builder.to_filter_expression(), "@csr = 3");
}

#[tokio::test]
async fn test_find_loads_value_objects_with_field_limit() {
    let mock = MockService::new();
    mock.expect_find("Job")
        .with_filter(r#"@adminStatus = "O""#)
        .return_ok(vec![
            json!({"job": "1001", "description": "Brochure"}),
            json!({"job": "1002", "description": "Poster"}),
        ]);

    let jobs = model(&mock, "Job")
        .filter("@adminStatus", "O")
        .load(["@description"])
        .find()
        .await
        .unwrap();

    assert_eq!(jobs.count(), 2);
    let first = jobs.first().await.unwrap().expect("loaded");
    assert!(first.exists());
    assert_eq!(first.get("description"), Some(&json!("Brochure")));

    // Loaded objects are already cached; only the find reached the service.
    let calls = mock.calls();
    assert_eq!(calls.len(), 1);
    let request = calls[0].find.as_ref().expect("find request");
    assert_eq!(request.offset, Some(0));
    assert_eq!(request.limit, Some(1000));
    assert_eq!(
        request.fields,
        vec![FieldDescriptor {
            name: "description".to_string(),
            path: "@description".to_string(),
        }]
    );
    mock.verify();
}

#[tokio::test]
async fn test_find_forwards_sort_and_paging() {
    let mock = MockService::new();
    mock.expect_find("Job")
        .with_request(FindRequest {
            filter: r#"@adminStatus = "O""#.to_string(),
            sort: Some(SortDirective {
                sorts: vec![
                    Sort {
                        field: "@job".to_string(),
                        descending: true,
                    },
                    Sort {
                        field: "@description".to_string(),
                        descending: false,
                    },
                ],
            }),
            offset: Some(20),
            limit: Some(10),
            fields: Vec::new(),
        })
        .return_ok(vec![json!("1021"), json!("1022")]);

    let jobs = model(&mock, "Job")
        .filter("@adminStatus", "O")
        .sort("@job", true)
        .sort("@description", false)
        .paginate(3, 10)
        .find()
        .await
        .unwrap();

    assert_eq!(jobs.keys(), &[Key::from("1021"), Key::from("1022")][..]);
    mock.verify();
}

#[tokio::test]
async fn test_find_keeps_explicit_paging_with_fields() {
    let mock = MockService::new();
    mock.expect_find("Job").return_ok(Vec::new());

    model(&mock, "Job")
        .load(["@description"])
        .offset(50)
        .limit(5)
        .find()
        .await
        .unwrap();

    let request = mock.calls()[0].find.clone().expect("find request");
    assert_eq!((request.offset, request.limit), (Some(50), Some(5)));
    mock.verify();
}

#[tokio::test]
async fn test_first_or_fail_and_first_or_new() {
    let mock = MockService::new();
    mock.expect_find("Customer").return_ok(Vec::new());
    mock.expect_find("Customer").return_ok(Vec::new());

    let builder = model(&mock, "Customer").filter("@custName", "Nobody");
    let err = builder.first_or_fail().await.unwrap_err();
    assert_eq!(err.to_string(), "No filtered results for type [Customer]");

    let fresh = builder.first_or_new().await.unwrap();
    assert!(!fresh.exists());
    assert_eq!(fresh.type_name().as_str(), "Customer");
    mock.verify();
}
