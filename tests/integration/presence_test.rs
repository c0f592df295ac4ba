//! End-to-end test of the client stack: controller + transport on one
//! side, presence registry on the other, bridged by the served relay.

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use studyhub_client::{
    GroupPresence, StudySessionController, TransportManager, spawn_event_pump,
};
use studyhub_core::config::client::ClientConfig;
use studyhub_database::{GroupStore, ProfileStore};
use studyhub_entity::group::CreateStudyGroup;
use studyhub_entity::profile::CreateProfile;
use studyhub_realtime::message::ClientEvent;
use studyhub_service::{AchievementService, ProgressionService};

use crate::helpers::TestApp;

fn client_config(addr: std::net::SocketAddr) -> ClientConfig {
    ClientConfig {
        relay_url: format!("ws://{addr}/ws"),
        connect_timeout_seconds: 5,
        max_reconnect_attempts: 5,
        reconnect_delay_ms: 100,
        tick_interval_seconds: 60,
    }
}

#[tokio::test]
async fn test_group_peers_see_live_study_status() {
    let app = TestApp::new();
    let addr = app.serve().await;

    // Ana is a group member who will study; her peer watches the group.
    let ana = Uuid::new_v4();
    ProfileStore::create(
        app.store.as_ref(),
        &CreateProfile {
            id: ana,
            username: "ana".to_string(),
            display_name: "Ana".to_string(),
        },
    )
    .await
    .unwrap();
    let group = GroupStore::create(
        app.store.as_ref(),
        &CreateStudyGroup {
            name: "Night owls".to_string(),
            description: None,
            subject: "physics".to_string(),
            created_by: ana,
        },
    )
    .await
    .unwrap();

    // Peer side: transport + presence registry.
    let peer_transport = TransportManager::new(client_config(addr));
    let peer_presence = Arc::new(GroupPresence::new());
    peer_transport.connect().await.unwrap();
    spawn_event_pump(&peer_transport, peer_presence.clone());
    peer_transport.emit(&ClientEvent::JoinGroup(group.id));

    // Ana's side: the full controller stack over the shared store.
    let ana_transport = TransportManager::new(client_config(addr));
    ana_transport.connect().await.unwrap();
    let progression = ProgressionService::new(app.store.clone());
    let achievements = AchievementService::new(
        app.store.clone(),
        app.store.clone(),
        app.store.clone(),
        progression.clone(),
    );
    let controller = StudySessionController::new(
        ana,
        app.store.clone(),
        app.store.clone(),
        progression,
        achievements,
        ana_transport.clone(),
        Duration::from_secs(60),
    );
    controller.join_group(group.id);

    // Both connections must be in the room before the start broadcast.
    for _ in 0..100 {
        if app.engine.relay.group_subscriber_count(group.id) == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(app.engine.relay.group_subscriber_count(group.id), 2);

    controller.start_session("physics", Some(group.id)).await.unwrap();

    // The peer's registry learns that Ana is studying.
    let mut seen = None;
    for _ in 0..100 {
        if let Some(status) = peer_presence.get(ana) {
            if status.is_studying {
                seen = Some(status);
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    let status = seen.expect("peer never saw Ana studying");
    assert_eq!(status.username, "ana");
    assert_eq!(status.subject.as_deref(), Some("physics"));
    assert_eq!(status.elapsed_time, 0);

    // Ending the session clears the transient fields but keeps the entry.
    controller.end_session().await.unwrap().unwrap();

    let mut cleared = false;
    for _ in 0..100 {
        if let Some(status) = peer_presence.get(ana) {
            if !status.is_studying {
                cleared = true;
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(cleared, "peer never saw Ana stop studying");
    assert_eq!(peer_presence.member_count(), 1);
}
