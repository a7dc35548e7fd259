//! Submission, polling and results through the runtime.

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::backend::{JobId, StatusResponse};
use crate::job::{JobError, JobEvent, JobEventKind, JobStatus};
use crate::message::JobMessage;

fn submit(app: &mut DataTrackApp, runtime: &mut Runtime, msg: JobMessage) {
    let effects = app.update(Message::Job(msg));
    runtime.execute(effects);
}

#[tokio::test(start_paused = true)]
async fn test_full_workflow_counts_vehicles() {
    let fake = Arc::new(
        FakeBackend::new()
            .with_statuses(vec![
                StatusResponse::processing(20.0),
                StatusResponse::processing(60.0),
                StatusResponse::completed(),
            ])
            .with_results(sample_results()),
    );
    let (mut app, mut runtime) = setup(&fake, test_config());

    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    draw_rectangle(&mut app, "Gate");
    submit(&mut app, &mut runtime, JobMessage::ConfidenceChanged(0.5));
    submit(&mut app, &mut runtime, JobMessage::FrameSkipChanged(2));
    submit(&mut app, &mut runtime, JobMessage::Submit);
    assert_eq!(app.jobs().status(), JobStatus::Uploading);

    runtime.settle(&mut app).await;

    assert_eq!(app.jobs().status(), JobStatus::Completed);
    let job = app.jobs().job().unwrap();
    assert_eq!(job.progress(), Some(100.0));
    assert_eq!(job.id, Some(JobId::new("job-1")));
    assert_eq!(job.region_labels, vec!["Lane", "Gate"]);

    let requests = fake.process_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.filename, "stored_traffic.mp4");
    assert_eq!(request.conf_threshold, 0.5);
    assert_eq!(request.frame_skip, 2);
    let triangle: Vec<[f32; 2]> = vec![[100.0, 100.0], [300.0, 100.0], [200.0, 250.0]];
    let rectangle: Vec<[f32; 2]> =
        vec![[500.0, 500.0], [700.0, 500.0], [700.0, 650.0], [500.0, 650.0]];
    assert_eq!(request.regions, vec![triangle, rectangle]);

    let view = app.results_view().unwrap();
    assert_eq!(view.total_vehicles, 50);
    assert_eq!(view.cars, 30);
    assert_eq!(view.motorcycles, 20);
    assert_eq!(view.other, 0);
    assert_eq!(view.regions[0].label, "Lane");
    assert_eq!(view.regions[1].label, "Gate");

    assert_eq!(fake.call_count("status"), 3);
    assert_eq!(fake.call_count("results"), 1);
    assert_eq!(runtime.running_jobs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_progress_is_monotonic_and_capped() {
    let fake = Arc::new(
        FakeBackend::new()
            .with_statuses(vec![
                StatusResponse::processing(10.0),
                StatusResponse::processing(45.0),
                StatusResponse::processing(30.0),
                StatusResponse::processing(120.0),
                StatusResponse::completed(),
            ])
            .with_results(sample_results()),
    );
    let (mut app, mut runtime) = setup(&fake, test_config());
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    submit(&mut app, &mut runtime, JobMessage::Submit);

    let mut seen = Vec::new();
    while app.jobs().is_active() {
        let message = runtime.next_message().await.unwrap();
        let effects = app.update(message);
        runtime.execute(effects);
        if let Some(p) = app.jobs().job().and_then(|j| j.progress()) {
            if seen.last() != Some(&p) {
                seen.push(p);
            }
        }
    }

    let expected: Vec<f32> = vec![0.0, 10.0, 45.0, 99.0, 100.0];
    assert_eq!(seen, expected);
}

#[tokio::test(start_paused = true)]
async fn test_submit_without_regions_sends_nothing() {
    let fake = Arc::new(FakeBackend::new());
    let (mut app, mut runtime) = setup(&fake, test_config());
    load_video(&mut app);

    let effects = app.update(Message::Job(JobMessage::Submit));
    assert!(effects.is_empty());
    runtime.execute(effects);

    assert_eq!(app.jobs().status(), JobStatus::Idle);
    let notice = app.take_notice().unwrap();
    assert!(notice.is_error());
    assert_eq!(notice.text(), JobError::NoRegions.to_string());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_submit_without_video_sends_nothing() {
    let fake = Arc::new(FakeBackend::new());
    let (mut app, mut runtime) = setup(&fake, test_config());

    submit(&mut app, &mut runtime, JobMessage::Submit);
    assert_eq!(app.jobs().status(), JobStatus::Idle);
    assert!(app.take_notice().unwrap().is_error());
    assert!(fake.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_resubmit_ignores_abandoned_job() {
    let fake = Arc::new(
        FakeBackend::new()
            .with_delay(Duration::from_millis(100))
            .with_statuses(vec![StatusResponse::processing(10.0)])
            .with_statuses(vec![
                StatusResponse::processing(30.0),
                StatusResponse::completed(),
            ])
            .with_results(sample_results()),
    );
    let (mut app, mut runtime) = setup(&fake, test_config());
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    submit(&mut app, &mut runtime, JobMessage::Submit);

    while app.jobs().job_id().is_none() {
        let message = runtime.next_message().await.unwrap();
        let effects = app.update(message);
        runtime.execute(effects);
    }
    let first_ticket = app.jobs().active_ticket().unwrap();

    submit(&mut app, &mut runtime, JobMessage::Resubmit);
    assert_ne!(app.jobs().active_ticket(), Some(first_ticket));
    runtime.settle(&mut app).await;

    assert_eq!(app.jobs().status(), JobStatus::Completed);
    assert_eq!(app.jobs().job_id(), Some(&JobId::new("job-2")));
    assert!(app.results().is_some());

    // A late answer for the first job changes nothing
    let late = JobEvent::new(
        first_ticket,
        JobEventKind::Status {
            job_id: JobId::new("job-1"),
            status: StatusResponse::failed("late failure"),
        },
    );
    app.update(Message::Job(JobMessage::Event(late)));
    assert_eq!(app.jobs().status(), JobStatus::Completed);
    assert!(app.results().is_some());

    // The first task was cancelled and stopped polling
    let polls = fake
        .calls()
        .iter()
        .filter(|c| c.as_str() == "status:job-1")
        .count();
    tokio::time::sleep(Duration::from_secs(5)).await;
    let polls_later = fake
        .calls()
        .iter()
        .filter(|c| c.as_str() == "status:job-1")
        .count();
    assert_eq!(polls, polls_later);
}

#[tokio::test(start_paused = true)]
async fn test_polling_gives_up_after_limit() {
    let fake = Arc::new(FakeBackend::new().with_statuses(vec![StatusResponse::processing(5.0)]));
    let mut config = test_config();
    config.polling.max_elapsed_secs = Some(2);
    let (mut app, mut runtime) = setup(&fake, config);
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    submit(&mut app, &mut runtime, JobMessage::Submit);

    runtime.settle(&mut app).await;

    let job = app.jobs().job().unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert!(matches!(job.error, Some(JobError::Timeout(_))));
    assert!(app.results().is_none());
    // Polls at 0, 0.5, 1.0 and 1.5s; the bound is hit after the fourth sleep
    assert_eq!(fake.call_count("status"), 4);
}

#[tokio::test(start_paused = true)]
async fn test_hung_status_request_still_times_out() {
    let fake = Arc::new(FakeBackend::new().with_delay(Duration::from_secs(1000)));
    let mut config = test_config();
    config.polling.max_elapsed_secs = Some(2);
    let (mut app, mut runtime) = setup(&fake, config);
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    submit(&mut app, &mut runtime, JobMessage::Submit);

    runtime.settle(&mut app).await;

    let job = app.jobs().job().unwrap();
    assert_eq!(job.status, JobStatus::Error);
    match &job.error {
        Some(JobError::Timeout(elapsed)) => assert!(*elapsed < Duration::from_secs(3)),
        other => panic!("expected a timeout, got {:?}", other),
    }
    // The first status request never answered
    assert_eq!(fake.call_count("status"), 1);
    assert_eq!(runtime.running_jobs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_backend_error_status_fails_job() {
    let fake = Arc::new(
        FakeBackend::new().with_statuses(vec![
            StatusResponse::processing(40.0),
            StatusResponse::failed("Model failed to load"),
        ]),
    );
    let (mut app, mut runtime) = setup(&fake, test_config());
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    submit(&mut app, &mut runtime, JobMessage::Submit);

    runtime.settle(&mut app).await;

    let job = app.jobs().job().unwrap();
    assert_eq!(job.status, JobStatus::Error);
    assert_eq!(job.progress(), None);
    assert_eq!(
        job.error,
        Some(JobError::Backend("Model failed to load".to_string()))
    );
    assert_eq!(fake.call_count("results"), 0);
    let notice = app.take_notice().unwrap();
    assert!(notice.text().contains("Model failed to load"));
}

#[tokio::test(start_paused = true)]
async fn test_upload_failure_skips_processing() {
    let fake = Arc::new(FakeBackend::new().failing_upload("Disk full"));
    let (mut app, mut runtime) = setup(&fake, test_config());
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    submit(&mut app, &mut runtime, JobMessage::Submit);

    runtime.settle(&mut app).await;

    assert_eq!(app.jobs().status(), JobStatus::Error);
    assert_eq!(fake.call_count("process"), 0);
    assert!(app.take_notice().unwrap().text().contains("Disk full"));
}

#[tokio::test(start_paused = true)]
async fn test_clear_results_cleans_up_job() {
    let fake = Arc::new(
        FakeBackend::new()
            .with_statuses(vec![StatusResponse::completed()])
            .with_results(sample_results()),
    );
    let (mut app, mut runtime) = setup(&fake, test_config());
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    submit(&mut app, &mut runtime, JobMessage::Submit);
    runtime.settle(&mut app).await;
    assert!(app.results().is_some());

    let effects = app.update(Message::ClearResults);
    runtime.execute(effects);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(app.results().is_none());
    assert_eq!(app.jobs().status(), JobStatus::Idle);
    assert!(fake.calls().contains(&"cleanup:job-1".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_export_after_completion() {
    let fake = Arc::new(
        FakeBackend::new()
            .with_statuses(vec![StatusResponse::completed()])
            .with_results(sample_results()),
    );
    let (mut app, mut runtime) = setup(&fake, test_config());
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");
    draw_rectangle(&mut app, "Gate");
    submit(&mut app, &mut runtime, JobMessage::Submit);
    runtime.settle(&mut app).await;

    let csv = app.export(crate::export::ExportFormat::Csv).unwrap();
    assert_eq!(csv.file_name, "results_job-1.csv");
    let text = String::from_utf8(csv.bytes).unwrap();
    assert!(text.contains("Lane"));
    assert!(text.contains("Gate"));

    let json = app.export(crate::export::ExportFormat::Json).unwrap();
    let parsed: ResultSet = serde_json::from_slice(&json.bytes).unwrap();
    assert_eq!(parsed, sample_results());
}

#[tokio::test(start_paused = true)]
async fn test_hardware_info_seeds_frame_skip() {
    let fake = Arc::new(FakeBackend::new().with_hardware(crate::backend::HardwareInfo {
        device: "cpu".to_string(),
        profile: "low".to_string(),
        frame_skip: Some(3),
        ..Default::default()
    }));
    let (mut app, mut runtime) = setup(&fake, test_config());
    let effects = app.init();
    runtime.execute(effects);

    let message = runtime.next_message().await.unwrap();
    app.update(message);
    assert_eq!(app.params().frame_skip, 3);
}

#[tokio::test(start_paused = true)]
async fn test_chosen_frame_skip_survives_hardware_info() {
    let fake = Arc::new(FakeBackend::new().with_hardware(crate::backend::HardwareInfo {
        device: "cuda".to_string(),
        profile: "high".to_string(),
        frame_skip: Some(5),
        ..Default::default()
    }));
    let (mut app, mut runtime) = setup(&fake, test_config());
    let effects = app.init();
    runtime.execute(effects);

    submit(&mut app, &mut runtime, JobMessage::FrameSkipChanged(2));
    let message = runtime.next_message().await.unwrap();
    app.update(message);
    assert_eq!(app.params().frame_skip, 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_frame_skip_from_config_sends_nothing() {
    let fake = Arc::new(FakeBackend::new());
    let mut config = test_config();
    config.detection.frame_skip = 0;
    let (mut app, mut runtime) = setup(&fake, config);
    load_video(&mut app);
    draw_triangle(&mut app, "Lane");

    submit(&mut app, &mut runtime, JobMessage::Submit);
    assert_eq!(app.jobs().status(), JobStatus::Idle);
    assert_eq!(
        app.take_notice().unwrap().text(),
        JobError::InvalidFrameSkip.to_string()
    );
    assert!(fake.calls().is_empty());
}
