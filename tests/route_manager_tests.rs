mod common;

use assert_matches::assert_matches;
use common::{route_date, Fixture};
use uuid::Uuid;

use pool_routes::models::{Customer, RouteFilters, RouteStatus, RouteWithStops, StopStatus};
use pool_routes::services::{RouteAction, RouteBuilder, RouteManager};
use pool_routes::utils::errors::AppError;

async fn create_route(fixture: &Fixture, technician_id: Uuid, customers: &[&Customer]) -> RouteWithStops {
    let mut builder = RouteBuilder::new(route_date());
    builder
        .set_technician(fixture.store.as_ref(), technician_id)
        .await
        .unwrap();
    for customer in customers {
        builder.add_stop(customer).unwrap();
    }
    builder.save(fixture.store.as_ref()).await.unwrap()
}

fn filters(technician_id: Option<Uuid>) -> RouteFilters {
    RouteFilters {
        date: route_date(),
        technician_id,
    }
}

#[tokio::test]
async fn test_empty_day_renders_empty_state() {
    let fixture = Fixture::seeded().await;
    let manager = RouteManager::new(fixture.store.clone());

    let board = manager.list(&filters(Some(fixture.technician.id))).await.unwrap();
    assert!(board.is_empty());
    let empty = board.empty_state.expect("empty state");
    assert!(empty.offer_build);
    assert!(empty.message.contains("2025-06-02"));

    let board = manager.list(&filters(None)).await.unwrap();
    assert!(!board.empty_state.expect("empty state").offer_build);
}

#[tokio::test]
async fn test_list_filters_by_technician() {
    let fixture = Fixture::seeded().await;
    create_route(&fixture, fixture.technician.id, &[&fixture.alice]).await;
    create_route(&fixture, fixture.other_technician.id, &[&fixture.bob]).await;
    let manager = RouteManager::new(fixture.store.clone());

    assert_eq!(manager.list(&filters(None)).await.unwrap().cards.len(), 2);

    let board = manager
        .list(&filters(Some(fixture.other_technician.id)))
        .await
        .unwrap();
    assert_eq!(board.cards.len(), 1);
    assert_eq!(board.cards[0].route.technician_id, fixture.other_technician.id);
    assert!(board.empty_state.is_none());
}

#[tokio::test]
async fn test_approved_route_no_longer_offers_approve() {
    let fixture = Fixture::seeded().await;
    let saved = create_route(&fixture, fixture.technician.id, &[&fixture.alice]).await;
    let manager = RouteManager::new(fixture.store.clone());

    let card = manager.get(saved.route.id).await.unwrap();
    assert!(card.offers(RouteAction::Approve));
    assert_eq!(card.badge.label, "Pending");

    let approved = manager.approve(saved.route.id).await.unwrap();
    assert_eq!(approved.status, RouteStatus::Approved);

    let card = manager.get(saved.route.id).await.unwrap();
    assert!(!card.offers(RouteAction::Approve));
    assert!(card.offers(RouteAction::Edit));
    assert!(card.offers(RouteAction::Delete));

    let again = manager.approve(saved.route.id).await;
    assert_matches!(again, Err(AppError::InvalidTransition { entity: "route", .. }));
}

#[tokio::test]
async fn test_route_lifecycle_is_forward_only() {
    let fixture = Fixture::seeded().await;
    let saved = create_route(&fixture, fixture.technician.id, &[&fixture.alice]).await;
    let manager = RouteManager::new(fixture.store.clone());
    let id = saved.route.id;

    let skipped = manager.transition_route(id, RouteStatus::InProgress).await;
    assert_matches!(skipped, Err(AppError::InvalidTransition { .. }));

    manager.approve(id).await.unwrap();
    manager.transition_route(id, RouteStatus::InProgress).await.unwrap();
    let done = manager.transition_route(id, RouteStatus::Completed).await.unwrap();
    assert_eq!(done.status, RouteStatus::Completed);

    let back = manager.transition_route(id, RouteStatus::Pending).await;
    assert_matches!(back, Err(AppError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_stop_progress_and_transitions() {
    let fixture = Fixture::seeded().await;
    let saved = create_route(&fixture, fixture.technician.id, &[&fixture.alice, &fixture.bob]).await;
    let manager = RouteManager::new(fixture.store.clone());
    let route_id = saved.route.id;
    let first = saved.stops[0].stop.id;
    let second = saved.stops[1].stop.id;

    let card = manager.get(route_id).await.unwrap();
    assert_eq!(card.progress.completed, 0);
    assert_eq!(card.progress.total, 2);

    for status in [StopStatus::EnRoute, StopStatus::Arrived, StopStatus::Completed] {
        manager.set_stop_status(route_id, first, status).await.unwrap();
    }
    let skipped = manager
        .set_stop_status(route_id, second, StopStatus::Skipped)
        .await
        .unwrap();
    assert_eq!(skipped.status, StopStatus::Skipped);

    let card = manager.get(route_id).await.unwrap();
    assert_eq!(card.progress.completed, 1);
    assert_eq!(card.progress.percent, 50);
    assert_eq!(card.stops[0].badge.label, "Completed");
    assert_eq!(card.stops[1].badge.color, "red");

    let reopen = manager
        .set_stop_status(route_id, first, StopStatus::Pending)
        .await;
    assert_matches!(reopen, Err(AppError::InvalidTransition { entity: "stop", .. }));

    let unknown = manager
        .set_stop_status(route_id, Uuid::new_v4(), StopStatus::EnRoute)
        .await;
    assert_matches!(unknown, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_confirmed_delete_removes_route_and_stops() {
    let fixture = Fixture::seeded().await;
    let saved = create_route(&fixture, fixture.technician.id, &[&fixture.alice, &fixture.bob]).await;
    let manager = RouteManager::new(fixture.store.clone());

    let pending = manager.request_delete(saved.route.id).await.unwrap();
    assert_eq!(pending.route_id(), saved.route.id);
    assert_eq!(fixture.store.route_count().await, 1);

    manager.delete(pending.confirm()).await.unwrap();

    assert_eq!(fixture.store.route_count().await, 0);
    assert_eq!(fixture.store.stop_count().await, 0);
    assert_matches!(manager.get(saved.route.id).await, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn test_delete_unknown_route_is_not_found() {
    let fixture = Fixture::seeded().await;
    let manager = RouteManager::new(fixture.store.clone());

    assert_matches!(
        manager.request_delete(Uuid::new_v4()).await,
        Err(AppError::NotFound(_))
    );
}

#[tokio::test]
async fn test_edit_opens_builder_with_persisted_order() {
    let fixture = Fixture::seeded().await;
    let saved = create_route(&fixture, fixture.technician.id, &[&fixture.carol, &fixture.alice]).await;
    let manager = RouteManager::new(fixture.store.clone());

    let builder = manager.edit(saved.route.id).await.unwrap();

    assert!(builder.is_edit());
    assert_eq!(builder.technician_id(), Some(fixture.technician.id));
    let ids: Vec<_> = builder.stops().iter().map(|s| s.customer_id).collect();
    assert_eq!(ids, vec![fixture.carol.id, fixture.alice.id]);
}
