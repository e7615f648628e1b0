use super::*;
use crate::access::TransitionRejection;
use crate::db::{DatabaseError, TekstStore};
use crate::models::ResourceType;
use crate::services::test_support::Fixture;

fn create_payload(fx: &Fixture, title: &str) -> ResourceCreate {
    ResourceCreate {
        resource_type: ResourceType::PlainText,
        title: title.to_string(),
        description: Some("  A   translation\nof the text ".to_string()),
        text_id: fx.text.id.clone(),
        level: 1,
        original_id: None,
        owner_id: None,
        citation: None,
        comment: None,
    }
}

async fn make_public(fx: &Fixture, service: &ResourceService, id: &str) {
    service
        .transition(id, &fx.owner, PublicationAction::Propose)
        .await
        .unwrap();
    service
        .transition(id, &fx.admin, PublicationAction::Publish)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_create_owned_by_creator() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());

    let read = service
        .create(&fx.owner, create_payload(&fx, "  My   translation "))
        .await
        .unwrap();
    assert_eq!(read.title, "My translation");
    assert_eq!(read.description.as_deref(), Some("A translation of the text"));
    assert_eq!(read.owner_id.as_deref(), Some(fx.owner.id.as_str()));
    assert!(!read.public && !read.proposed);
    assert!(read.writable);
    assert_eq!(read.shared_read, Some(Vec::new()));
}

#[tokio::test]
async fn test_create_rejects_unknown_text_and_empty_title() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());

    let mut payload = create_payload(&fx, "Title");
    payload.text_id = "nope".to_string();
    let err = service.create(&fx.owner, payload).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = service
        .create(&fx.owner, create_payload(&fx, "   "))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::TooShort { .. })));
}

#[tokio::test]
async fn test_superuser_owns_created_resource_by_default() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());

    let read = service
        .create(&fx.admin, create_payload(&fx, "Own"))
        .await
        .unwrap();
    assert_eq!(read.owner_id.as_deref(), Some(fx.admin.id.as_str()));

    let mut payload = create_payload(&fx, "For someone else");
    payload.owner_id = Some(fx.other.id.clone());
    let read = service.create(&fx.admin, payload).await.unwrap();
    assert_eq!(read.owner_id.as_deref(), Some(fx.other.id.as_str()));
}

#[tokio::test]
async fn test_create_rejects_level_missing_from_text() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());

    let mut payload = create_payload(&fx, "Too deep");
    payload.level = 4;
    let err = service.create(&fx.owner, payload).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::InvalidValue(_))));

    let mut payload = create_payload(&fx, "Root level");
    payload.level = 0;
    let read = service.create(&fx.owner, payload).await.unwrap();
    assert_eq!(read.level, 0);
}

#[tokio::test]
async fn test_get_hides_private_resources() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;

    assert!(matches!(
        service.get(&resource.id, None).await,
        Err(ServiceError::NotFound { .. })
    ));
    assert!(matches!(
        service.get(&resource.id, Some(&fx.other)).await,
        Err(ServiceError::NotFound { .. })
    ));
    assert!(service.get(&resource.id, Some(&fx.owner)).await.is_ok());
    assert!(service.get(&resource.id, Some(&fx.admin)).await.is_ok());
}

#[tokio::test]
async fn test_list_follows_read_predicate() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let private = fx.resource(ResourceType::PlainText, 1).await;
    let proposed = fx.resource(ResourceType::PlainText, 1).await;
    service
        .transition(&proposed.id, &fx.owner, PublicationAction::Propose)
        .await
        .unwrap();

    let ids = |reads: Vec<ResourceRead>| reads.into_iter().map(|r| r.id).collect::<Vec<_>>();

    assert!(service.list(None).await.unwrap().is_empty());
    assert_eq!(ids(service.list(Some(&fx.other)).await.unwrap()), vec![proposed.id.clone()]);
    let own = ids(service.list(Some(&fx.owner)).await.unwrap());
    assert!(own.contains(&private.id) && own.contains(&proposed.id));
}

#[tokio::test]
async fn test_shares_hidden_from_non_owners() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;
    let update = ResourceUpdate {
        shared_read: Some(vec![fx.other.id.clone()]),
        ..Default::default()
    };
    service.update(&resource.id, &fx.owner, update).await.unwrap();

    let read = service.get(&resource.id, Some(&fx.other)).await.unwrap();
    assert_eq!(read.shared_read, None);
    assert!(!read.writable);

    let read = service.get(&resource.id, Some(&fx.owner)).await.unwrap();
    assert_eq!(read.shared_read, Some(vec![fx.other.id.clone()]));
}

#[tokio::test]
async fn test_update_shares_dedup_and_validate() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;

    let update = ResourceUpdate {
        shared_write: Some(vec![fx.other.id.clone(), fx.other.id.clone()]),
        ..Default::default()
    };
    let read = service.update(&resource.id, &fx.owner, update).await.unwrap();
    assert_eq!(read.shared_write, Some(vec![fx.other.id.clone()]));

    let update = ResourceUpdate {
        shared_read: Some(vec!["ghost".to_string()]),
        ..Default::default()
    };
    let err = service.update(&resource.id, &fx.owner, update).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::UnknownUser(_))));
}

#[tokio::test]
async fn test_share_editor_cannot_change_shares() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;
    let share = ResourceUpdate {
        shared_write: Some(vec![fx.other.id.clone()]),
        ..Default::default()
    };
    service.update(&resource.id, &fx.owner, share).await.unwrap();

    let update = ResourceUpdate {
        title: Some("Renamed".to_string()),
        shared_write: Some(Vec::new()),
        ..Default::default()
    };
    let read = service.update(&resource.id, &fx.other, update).await.unwrap();
    assert_eq!(read.title, "Renamed");

    let stored = fx.store.get_resource(&resource.id).await.unwrap().unwrap();
    assert_eq!(stored.shared_write, vec![fx.other.id.clone()]);
}

#[tokio::test]
async fn test_share_update_on_public_resource_is_dropped() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;
    make_public(&fx, &service, &resource.id).await;

    let update = ResourceUpdate {
        shared_read: Some(vec![fx.other.id.clone()]),
        ..Default::default()
    };
    let read = service.update(&resource.id, &fx.admin, update).await.unwrap();
    assert_eq!(read.shared_read, Some(Vec::new()));
    assert!(read.public);
}

#[tokio::test]
async fn test_update_requires_write_access() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;
    service
        .transition(&resource.id, &fx.owner, PublicationAction::Propose)
        .await
        .unwrap();

    let update = ResourceUpdate {
        title: Some("Changed".to_string()),
        ..Default::default()
    };
    let err = service
        .update(&resource.id, &fx.other, update.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // Proposed resources are read-only for their owners, too
    let err = service.update(&resource.id, &fx.owner, update).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_publication_lifecycle() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;
    let share = ResourceUpdate {
        shared_read: Some(vec![fx.other.id.clone()]),
        ..Default::default()
    };
    service.update(&resource.id, &fx.owner, share).await.unwrap();

    let err = service
        .transition(&resource.id, &fx.admin, PublicationAction::Publish)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::IllegalTransition(TransitionRejection::NotProposed)
    ));

    let read = service
        .transition(&resource.id, &fx.owner, PublicationAction::Propose)
        .await
        .unwrap();
    assert!(read.proposed);

    // Repeating a proposal is accepted
    service
        .transition(&resource.id, &fx.owner, PublicationAction::Propose)
        .await
        .unwrap();

    let err = service
        .transition(&resource.id, &fx.owner, PublicationAction::Publish)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let read = service
        .transition(&resource.id, &fx.admin, PublicationAction::Publish)
        .await
        .unwrap();
    assert!(read.public && !read.proposed);
    assert_eq!(read.owner_id, None);
    assert_eq!(read.shared_read, Some(Vec::new()));

    let err = service
        .transition(&resource.id, &fx.admin, PublicationAction::Propose)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "resourceAlreadyPublic");

    let read = service
        .transition(&resource.id, &fx.admin, PublicationAction::Unpublish)
        .await
        .unwrap();
    assert!(!read.public && !read.proposed);

    let err = service
        .transition(&resource.id, &fx.admin, PublicationAction::Unpublish)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "resourceNotPublic");
}

#[tokio::test]
async fn test_unpropose_requires_proposal() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;

    let err = service
        .transition(&resource.id, &fx.owner, PublicationAction::Unpropose)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "resourceNotProposed");
}

#[tokio::test]
async fn test_transfer() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;

    let err = service
        .transfer(&resource.id, &fx.owner, "ghost")
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::UnknownUser(_))));

    let read = service
        .transfer(&resource.id, &fx.owner, &fx.owner.id)
        .await
        .unwrap();
    assert_eq!(read.owner_id.as_deref(), Some(fx.owner.id.as_str()));

    let read = service
        .transfer(&resource.id, &fx.owner, &fx.other.id)
        .await
        .unwrap();
    assert_eq!(read.owner_id.as_deref(), Some(fx.other.id.as_str()));

    // The previous owner lost access
    let err = service
        .transfer(&resource.id, &fx.owner, &fx.owner.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[tokio::test]
async fn test_transfer_public_resource_rejected() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;
    make_public(&fx, &service, &resource.id).await;

    let err = service
        .transfer(&resource.id, &fx.admin, &fx.other.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_delete_cascades_and_guards_state() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let mut resource = fx.resource(ResourceType::PlainText, 1).await;
    fx.cover(&mut resource, &fx.hymns[0]).await;

    service
        .transition(&resource.id, &fx.owner, PublicationAction::Propose)
        .await
        .unwrap();
    let err = service.delete(&resource.id, &fx.owner).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    service
        .transition(&resource.id, &fx.owner, PublicationAction::Unpropose)
        .await
        .unwrap();
    let err = service.delete(&resource.id, &fx.other).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    service.delete(&resource.id, &fx.owner).await.unwrap();
    assert!(fx.store.get_resource(&resource.id).await.unwrap().is_none());
    assert!(fx.store.find_contents(&resource.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_storage_failure_is_not_hidden() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;

    fx.store.set_unavailable(true);
    let err = service.get(&resource.id, Some(&fx.owner)).await.unwrap_err();
    assert!(matches!(err, ServiceError::Database(DatabaseError::Unavailable(_))));
}

#[tokio::test]
async fn test_export_formats() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let mut resource = fx.resource(ResourceType::PlainText, 1).await;
    fx.cover(&mut resource, &fx.hymns[1]).await;

    let file = service
        .export(&resource.id, Some(&fx.owner), ExportFormat::Csv)
        .await
        .unwrap();
    assert_eq!(file.mimetype, "text/csv");
    assert!(file.filename.starts_with("rigveda_resource_"));
    assert!(file.filename.ends_with("_export.csv"));
    assert!(file.body.contains("\"1, 2\",\"content at 2\""));

    let file = service
        .export(&resource.id, Some(&fx.owner), ExportFormat::Json)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&file.body).unwrap();
    assert_eq!(parsed["text"], "Rigveda");
    assert_eq!(parsed["data"][0]["location"], "1, 2");
    assert_eq!(parsed["data"][0]["text"], "content at 2");
    assert!(parsed["data"][0].get("resourceType").is_none());

    let file = service
        .export(&resource.id, Some(&fx.owner), ExportFormat::TekstJson)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&file.body).unwrap();
    assert_eq!(parsed["resource"]["id"], resource.id.as_str());
    assert_eq!(parsed["contents"].as_array().unwrap().len(), 1);

    let err = service
        .export(&resource.id, Some(&fx.owner), ExportFormat::Html)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Export(_)));
}

#[tokio::test]
async fn test_export_unreadable_is_not_found() {
    let fx = Fixture::new().await;
    let service = ResourceService::new(fx.ctx.clone());
    let resource = fx.resource(ResourceType::PlainText, 1).await;

    let err = service
        .export(&resource.id, None, ExportFormat::Json)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[test]
fn test_slug() {
    assert_eq!(slug("Rigveda"), "rigveda");
    assert_eq!(slug("  Ṛgveda Saṃhitā! "), "gveda-sa-hit");
    assert_eq!(slug("***"), "text");
}
