mod common;

use common::{eventually, wait_for_log, FakeSurface, WsServer};
use easyanalyzer::audio::SampleTap;
use easyanalyzer::backend::Endpoints;
use easyanalyzer::capture::{CapturePhase, CaptureSession, ProducerSettings, StartOutcome, StopOutcome};
use easyanalyzer::relay::OutputType;
use easyanalyzer::workspace::{ReportOutcome, TranscriptionHandle};
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

const QUIET: Duration = Duration::from_millis(200);

fn session_for(server: &WsServer, surface: FakeSurface, transcription: &TranscriptionHandle) -> CaptureSession {
    CaptureSession::new(
        Box::new(surface),
        Endpoints::new(&server.host, false),
        ProducerSettings::new(Duration::from_millis(20), 16000),
        transcription.clone(),
    )
}

async fn wait_until_open(session: &CaptureSession) {
    let open = eventually(|| session.channel().map(|c| c.is_open()).unwrap_or(false)).await;
    assert!(open, "socket never opened");
}

#[tokio::test]
async fn test_full_session_on_the_wire() {
    let mut server = WsServer::start().await;
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let tap = SampleTap::new(16000);
    let surface = FakeSurface::new(vec![tap.clone()]);
    let released = surface.released.clone();
    let mut session = session_for(&server, surface, &transcription);

    let outcome = session.start(OutputType::Notes).await.unwrap();
    let session_id = match outcome {
        StartOutcome::Started {
            session_id,
            output_type,
        } => {
            assert_eq!(output_type, OutputType::Notes);
            session_id
        }
        other => panic!("unexpected {other:?}"),
    };
    assert!(session_id.starts_with("meeting_"));
    assert_eq!(session.phase(), CapturePhase::Capturing);
    assert!(transcription.is_recording().await);
    assert_eq!(transcription.session_id().await.as_deref(), Some(session_id.as_str()));

    let mut conn = server.next_connection().await.expect("no connection");
    assert_eq!(conn.path, format!("/ws/live/{session_id}"));

    assert_eq!(
        conn.next_frame().await,
        Some(Message::Text("__OUTPUT_TYPE__::notes".to_string()))
    );

    wait_until_open(&session).await;
    tap.push(&vec![0.25; 1600]);

    match conn.next_frame().await {
        Some(Message::Binary(bytes)) => {
            assert_eq!(&bytes[..4], b"RIFF");
            assert_eq!(&bytes[8..12], b"WAVE");
        }
        other => panic!("expected first audio chunk, got {other:?}"),
    }

    tap.push(&vec![0.25; 1600]);
    let outcome = session.stop().await;
    match outcome {
        StopOutcome::Stopped {
            session_id: stopped,
            end_token_sent,
            stats,
            ..
        } => {
            assert_eq!(stopped, session_id);
            assert!(end_token_sent);
            assert!(stats.chunks_sent >= 1);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(session.phase(), CapturePhase::Idle);
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert!(!transcription.is_recording().await);

    let mut last = None;
    while let Some(frame) = conn.frame_within(QUIET).await {
        if let Message::Binary(bytes) = &frame {
            assert!(!bytes.starts_with(b"RIFF"), "header sent twice");
        }
        last = Some(frame);
    }
    assert_eq!(last, Some(Message::Text("__END_MEETING__".to_string())));

    let state = transcription.get().await;
    assert_eq!(state.activity.messages(), vec!["Stopped", "Starting session..."]);
}

#[tokio::test]
async fn test_report_ready_sets_link_without_logging() {
    let mut server = WsServer::start().await;
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let mut session = session_for(&server, FakeSurface::new(vec![SampleTap::new(16000)]), &transcription);

    session.start(OutputType::Analysis).await.unwrap();
    let mut conn = server.next_connection().await.expect("no connection");
    conn.next_frame().await;
    wait_until_open(&session).await;
    session.stop().await;

    conn.reply("Transcribing...");
    conn.reply("__REPORT_READY__::abc123");

    let outcome = transcription
        .wait_for_report(None, Duration::from_secs(5))
        .await;
    assert_eq!(
        outcome,
        ReportOutcome::Ready(format!("http://{}/live-report/abc123", server.host))
    );

    let state = transcription.get().await;
    let messages = state.activity.messages();
    assert!(messages.contains(&"Transcribing..."));
    assert!(messages.contains(&"PDF Ready"));
    assert!(messages.iter().all(|m| !m.contains("__REPORT_READY__")));
}

#[tokio::test]
async fn test_other_frames_logged_verbatim() {
    let mut server = WsServer::start().await;
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let mut session = session_for(&server, FakeSurface::new(vec![SampleTap::new(16000)]), &transcription);

    session.start(OutputType::Analysis).await.unwrap();
    let mut conn = server.next_connection().await.expect("no connection");
    conn.next_frame().await;

    conn.reply("__ERROR_FINAL__::transcription failed");
    conn.reply("Chunk 3 received");

    assert!(wait_for_log(&transcription, |m| m == "Chunk 3 received").await);

    let state = transcription.get().await;
    assert!(state
        .activity
        .messages()
        .contains(&"__ERROR_FINAL__::transcription failed"));
    assert_eq!(state.report_link, None);

    session.stop().await;
}

#[tokio::test]
async fn test_second_start_is_a_noop() {
    let mut server = WsServer::start().await;
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let surface = FakeSurface::new(vec![SampleTap::new(16000)]);
    let acquired = surface.acquired.clone();
    let mut session = session_for(&server, surface, &transcription);

    let first = session.start(OutputType::Analysis).await.unwrap();
    let StartOutcome::Started { session_id, .. } = first else {
        panic!("unexpected {first:?}");
    };
    let log_len = transcription.get().await.activity.len();

    let second = session.start(OutputType::Notes).await.unwrap();
    assert_eq!(
        second,
        StartOutcome::AlreadyCapturing {
            session_id: session_id.clone()
        }
    );
    assert_eq!(session.output_type(), Some(OutputType::Analysis));
    assert_eq!(acquired.load(Ordering::SeqCst), 1);
    assert_eq!(transcription.get().await.activity.len(), log_len);

    assert!(server.next_connection().await.is_some());
    assert!(server.connection_within(QUIET).await.is_none());

    session.stop().await;
}

#[tokio::test]
async fn test_stop_when_idle_is_a_noop() {
    let server = WsServer::start().await;
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let surface = FakeSurface::new(Vec::new());
    let released = surface.released.clone();
    let mut session = session_for(&server, surface, &transcription);

    assert_eq!(session.stop().await, StopOutcome::NotCapturing);
    assert_eq!(released.load(Ordering::SeqCst), 0);
    assert!(transcription.get().await.activity.is_empty());
}

#[tokio::test]
async fn test_refused_capture_stays_idle_and_is_reported() {
    let server = WsServer::start().await;
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let mut session = session_for(&server, FakeSurface::refusing(), &transcription);

    let err = session.start(OutputType::Analysis).await.unwrap_err();
    assert!(format!("{err:#}").contains("Permission denied"));
    assert_eq!(session.phase(), CapturePhase::Idle);
    assert!(!transcription.is_recording().await);

    let state = transcription.get().await;
    let latest = state.activity.latest().expect("no log line");
    assert!(latest.message.starts_with("Capture failed"));
}

#[tokio::test]
async fn test_unreachable_server_is_logged() {
    // Bind then drop to get a port nothing listens on.
    let host = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let mut session = CaptureSession::new(
        Box::new(FakeSurface::new(vec![SampleTap::new(16000)])),
        Endpoints::new(&host, false),
        ProducerSettings::new(Duration::from_millis(20), 16000),
        transcription.clone(),
    );

    session.start(OutputType::Analysis).await.unwrap();

    assert!(wait_for_log(&transcription, |m| m.starts_with("Connection failed")).await);

    match session.stop().await {
        StopOutcome::Stopped { end_token_sent, .. } => assert!(!end_token_sent),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn test_server_failure_ends_report_wait() {
    let mut server = WsServer::start().await;
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let mut session = session_for(&server, FakeSurface::new(vec![SampleTap::new(16000)]), &transcription);

    session.start(OutputType::Analysis).await.unwrap();
    let mut conn = server.next_connection().await.expect("no connection");
    conn.next_frame().await;
    wait_until_open(&session).await;
    session.stop().await;

    conn.reply("__ERROR_FINAL__::FFMPEG conversion failed");
    conn.close();

    let started = tokio::time::Instant::now();
    let outcome = transcription
        .wait_for_report(None, Duration::from_secs(30))
        .await;
    assert_eq!(
        outcome,
        ReportOutcome::Failed("FFMPEG conversion failed".to_string())
    );
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_close_without_report_ends_report_wait() {
    let mut server = WsServer::start().await;
    let transcription = TranscriptionHandle::new(OutputType::Analysis);
    let mut session = session_for(&server, FakeSurface::new(vec![SampleTap::new(16000)]), &transcription);

    session.start(OutputType::Analysis).await.unwrap();
    let mut conn = server.next_connection().await.expect("no connection");
    conn.next_frame().await;
    wait_until_open(&session).await;
    session.stop().await;

    conn.close();

    let outcome = transcription
        .wait_for_report(None, Duration::from_secs(30))
        .await;
    assert_eq!(outcome, ReportOutcome::Closed);
}
