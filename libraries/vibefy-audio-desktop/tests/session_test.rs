//! Tests for the desktop audio session
//!
//! Decoding and seek clamping run anywhere. Tests that need an output
//! device are marked `#[ignore]`:
//! ```bash
//! cargo test -p vibefy-audio-desktop -- --ignored
//! ```

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use vibefy_audio_desktop::{decode, seek_target, AudioError, RodioSession};
use vibefy_playback::{
    AudioHandle, AudioSession, HandleAllocator, LoadError, NullSession, PlaybackConfig,
    PlaybackEvent, PlaybackService, SessionError, Track, TrackId, TrackLoader,
};

/// `seconds` of 8 kHz mono silence
fn wav_bytes(seconds: u32) -> Bytes {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut buffer = Vec::new();
    {
        let mut writer = hound::WavWriter::new(Cursor::new(&mut buffer), spec).unwrap();
        for _ in 0..(8000 * seconds) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    Bytes::from(buffer)
}

#[test]
fn decode_reports_duration() {
    let (_decoder, duration) = decode(wav_bytes(1)).unwrap();
    let duration = duration.expect("wav reports its length");
    assert!((duration.as_secs_f64() - 1.0).abs() < 0.05, "{duration:?}");
}

#[test]
fn decode_rejects_garbage() {
    let result = decode(Bytes::from_static(b"definitely not audio"));
    assert!(matches!(result, Err(AudioError::UnsupportedFormat(_))));
}

#[test]
fn decode_failure_maps_to_session_decode_error() {
    let err = decode(Bytes::new()).err().unwrap();
    assert!(matches!(SessionError::from(err), SessionError::Decode(_)));
    assert_eq!(
        SessionError::from(AudioError::ThreadStopped),
        SessionError::Disconnected
    );
}

#[test]
fn seek_target_clamps() {
    let length = Some(Duration::from_secs(10));
    assert_eq!(seek_target(-3.0, length), Duration::ZERO);
    assert_eq!(seek_target(4.5, length), Duration::from_secs_f64(4.5));
    assert_eq!(seek_target(99.0, length), Duration::from_secs(10));
    assert_eq!(seek_target(99.0, None), Duration::from_secs(99));
    assert_eq!(seek_target(f64::NAN, length), Duration::ZERO);
}

/// Serves the same WAV for every id
struct WavLoader {
    allocator: HandleAllocator,
    data: Bytes,
}

#[async_trait]
impl TrackLoader for WavLoader {
    async fn load(&self, track_id: &TrackId) -> Result<AudioHandle, LoadError> {
        Ok(self.allocator.allocate(
            track_id.clone(),
            Some("audio/wav".into()),
            self.data.clone(),
        ))
    }

    fn release(&self, handle: AudioHandle) {
        self.allocator.revoke(handle);
    }
}

#[tokio::test]
#[ignore = "requires an audio output device"]
async fn plays_through_and_advances() {
    let loader = Arc::new(WavLoader {
        allocator: HandleAllocator::new(),
        data: wav_bytes(1),
    });

    let mut opened = true;
    let (handle, task) = PlaybackService::spawn(
        PlaybackConfig::default(),
        |events| -> Box<dyn AudioSession> {
            match RodioSession::new(events) {
                Ok(session) => Box::new(session),
                Err(e) => {
                    println!("No audio device - skipping test ({e})");
                    opened = false;
                    Box::new(NullSession::new())
                }
            }
        },
        Arc::clone(&loader),
    );
    if !opened {
        handle.shutdown().await.unwrap();
        task.await.unwrap();
        return;
    }

    let mut events = handle.events();
    handle
        .set_queue(vec![Track::new(1u64, "One", "Me"), Track::new(2u64, "Two", "Me")])
        .unwrap();
    handle.play_by_id(1u64).unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(PlaybackEvent::TrackFinished { track_id }) = events.recv().await {
                return track_id;
            }
        }
    })
    .await
    .expect("first track never finished");
    assert_eq!(finished, TrackId::from(1u64));

    let mut rx = handle.subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        rx.wait_for(|s| {
            s.current_track.as_ref().map(|t| t.id.clone()) == Some(TrackId::from(2u64))
        }),
    )
    .await
    .unwrap()
    .unwrap();

    handle.shutdown().await.unwrap();
    task.await.unwrap();
    assert_eq!(loader.allocator.live(), 0);
}
