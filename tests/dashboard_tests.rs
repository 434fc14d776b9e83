//! Dashboard aggregate: recounts over five tables and push-driven refresh.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use irrisync::entity::tables;
use irrisync::{DashboardStats, InMemoryStore, RemoteStore, SyncClient, SyncOptions};

async fn seed(store: &InMemoryStore) {
    store
        .insert(
            tables::IRRIGATION_AREAS,
            json!({ "name": "Daerah Utara", "location": "Hulu", "total_area": 50.0,
                    "status": "active", "lat": 0.0, "lng": 0.0 }),
            None,
        )
        .await
        .unwrap();
    store
        .insert(
            tables::CANALS,
            json!({ "area_id": Uuid::new_v4(), "name": "Saluran Primer", "length": 1000.0,
                    "width": 3.0, "capacity": 12.0, "status": "good" }),
            None,
        )
        .await
        .unwrap();
    for title in ["Banjir", "Pintu macet"] {
        store
            .insert(
                tables::ALERTS,
                json!({ "type": "critical", "title": title, "location": "Hulu", "is_read": false }),
                None,
            )
            .await
            .unwrap();
    }
    // read and non-critical alerts never count
    store
        .insert(
            tables::ALERTS,
            json!({ "type": "critical", "title": "Sudah dibaca", "location": "Hulu", "is_read": true }),
            None,
        )
        .await
        .unwrap();
    store
        .insert(
            tables::ALERTS,
            json!({ "type": "info", "title": "Info", "location": "Hulu", "is_read": false }),
            None,
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn initial_counts_cover_all_tables() {
    let store = Arc::new(InMemoryStore::for_dashboard());
    seed(&store).await;

    let client = SyncClient::with_options(
        Arc::clone(&store) as Arc<dyn RemoteStore>,
        SyncOptions::new().auto_subscribe(false),
    );
    let dashboard = client.open_dashboard().await;

    assert_eq!(
        dashboard.stats().await,
        DashboardStats {
            total_areas: 1,
            total_canals: 1,
            total_gates: 0,
            total_readings: 0,
            unread_critical_alerts: 2,
        }
    );
    assert!(!dashboard.is_live());
}

#[tokio::test]
async fn change_on_any_table_triggers_recount() {
    let store = Arc::new(InMemoryStore::for_dashboard());
    let client = SyncClient::new(Arc::clone(&store) as Arc<dyn RemoteStore>);
    let dashboard = client.open_dashboard().await;
    assert!(dashboard.is_live());
    assert_eq!(dashboard.stats().await, DashboardStats::default());

    store
        .insert(
            tables::GATES,
            json!({ "canal_id": Uuid::new_v4(), "name": "Pintu 1", "type": "intake",
                    "status": "open", "condition": "good", "last_maintenance": null }),
            None,
        )
        .await
        .unwrap();

    let mut counted = false;
    for _ in 0..100 {
        if dashboard.stats().await.total_gates == 1 {
            counted = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(counted, "gate insert never reached the dashboard counts");
}

#[tokio::test]
async fn marking_alert_read_drops_it_from_the_count() {
    let store = Arc::new(InMemoryStore::for_dashboard());
    let alert = store
        .insert(
            tables::ALERTS,
            json!({ "type": "critical", "title": "Banjir", "location": "Hulu", "is_read": false }),
            None,
        )
        .await
        .unwrap();
    let alert_id = Uuid::parse_str(alert["id"].as_str().unwrap()).unwrap();

    let client = SyncClient::new(Arc::clone(&store) as Arc<dyn RemoteStore>);
    let dashboard = client.open_dashboard().await;
    assert_eq!(dashboard.stats().await.unread_critical_alerts, 1);

    store
        .update(tables::ALERTS, alert_id, json!({ "is_read": true }), None)
        .await
        .unwrap();

    let mut cleared = false;
    for _ in 0..100 {
        if dashboard.stats().await.unread_critical_alerts == 0 {
            cleared = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(cleared, "read alert still counted as unread");
}

#[tokio::test]
async fn manual_refresh_picks_up_external_changes() {
    let store = Arc::new(InMemoryStore::for_dashboard());
    let client = SyncClient::with_options(
        Arc::clone(&store) as Arc<dyn RemoteStore>,
        SyncOptions::new().auto_subscribe(false),
    );
    let dashboard = client.open_dashboard().await;
    assert_eq!(dashboard.stats().await.total_areas, 0);

    store
        .insert(
            tables::IRRIGATION_AREAS,
            json!({ "name": "Daerah Baru", "location": "Hulu", "total_area": 1.0,
                    "status": "active", "lat": 0.0, "lng": 0.0 }),
            None,
        )
        .await
        .unwrap();

    // without channels nothing moves until an explicit recount
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(dashboard.stats().await.total_areas, 0);

    dashboard.refresh().await.unwrap();
    assert_eq!(dashboard.stats().await.total_areas, 1);
}
