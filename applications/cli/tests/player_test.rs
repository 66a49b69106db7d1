//! Player command tests against a mock Vibefy server

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use vibefy_cli::player::{Key, Player};
use vibefy_playback::{NullSession, PlaybackHandle, PlaybackService, PlaybackState, Track};
use vibefy_server_client::{HttpTrackLoader, ServerConfig, VibefyClient};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LIMIT: Duration = Duration::from_secs(5);

fn player_for(server: &MockServer) -> (Player, PlaybackHandle) {
    let client =
        VibefyClient::new(ServerConfig::with_session(server.uri(), "me@example.com")).unwrap();
    let loader = Arc::new(HttpTrackLoader::new(client.clone()));
    let (handle, _task) = PlaybackService::spawn(
        Default::default(),
        |_events| NullSession::new(),
        loader,
    );
    handle
        .set_queue(vec![Track::new(1u64, "Old", "Me")])
        .unwrap();
    (Player::new(handle.clone(), client), handle)
}

async fn wait_until(
    handle: &PlaybackHandle,
    pred: impl FnMut(&PlaybackState) -> bool,
) -> PlaybackState {
    let mut rx = handle.subscribe();
    let state = tokio::time::timeout(LIMIT, rx.wait_for(pred))
        .await
        .expect("state never matched")
        .expect("service stopped");
    (*state).clone()
}

fn temp_mp3() -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".mp3").tempfile().unwrap();
    file.write_all(b"ID3\x04not really audio").unwrap();
    file
}

async fn mount_upload(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Song uploaded and metadata extracted successfully!"),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn upload_refreshes_queue() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/getUserSongList"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"id": 1, "title": "Old"}, {"id": 2, "title": "New"}]"#,
        ))
        .mount(&server)
        .await;

    let (player, handle) = player_for(&server);
    let file = temp_mp3();

    player
        .apply(Key::Upload(file.path().to_path_buf()))
        .await
        .unwrap();

    let state = wait_until(&handle, |s| s.queue.len() == 2).await;
    assert_eq!(state.queue[1].title, "New");
}

#[tokio::test]
async fn failed_refresh_keeps_player_running() {
    let server = MockServer::start().await;
    mount_upload(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/getUserSongList"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database down"))
        .mount(&server)
        .await;

    let (player, handle) = player_for(&server);
    let file = temp_mp3();

    assert!(player
        .apply(Key::Upload(file.path().to_path_buf()))
        .await
        .is_ok());

    // The engine still takes commands and the old queue is intact
    player.apply(Key::Shuffle).await.unwrap();
    let state = wait_until(&handle, |s| s.shuffle).await;
    assert_eq!(state.queue.len(), 1);
}

#[tokio::test]
async fn failed_upload_keeps_player_running() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Upload failed"))
        .mount(&server)
        .await;

    let (player, handle) = player_for(&server);
    let file = temp_mp3();

    assert!(player
        .apply(Key::Upload(file.path().to_path_buf()))
        .await
        .is_ok());
    player.apply(Key::Repeat).await.unwrap();
    assert!(wait_until(&handle, |s| s.repeat).await.repeat);
}
