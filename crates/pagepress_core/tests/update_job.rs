use std::sync::Once;
use std::time::Instant;

use pagepress_core::{
    update, AppState, Effect, FailureReason, JobPhase, Msg, Profile, ProgressUpdate, Reduction,
    UpdateStatus, UploadId,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(press_logging::initialize_for_tests);
}

fn loaded(pages: usize) -> AppState {
    let (state, effects) = update(
        AppState::new(),
        Msg::DocumentLoaded {
            name: "scan.pdf".to_string(),
            size_bytes: 10_000_000,
            page_count: pages,
        },
    );
    assert_eq!(effects, vec![Effect::CheckSignature]);
    state
}

fn streaming(job_id: &str) -> AppState {
    let (state, _) = update(loaded(10), Msg::SubmitClicked);
    let (state, _) = update(
        state,
        Msg::SubmitSucceeded {
            upload_id: 1,
            job_id: job_id.to_string(),
        },
    );
    let (state, _) = update(
        state,
        Msg::ChannelOpened {
            job_id: job_id.to_string(),
        },
    );
    state
}

fn submit(state: AppState) -> (AppState, UploadId) {
    let (state, effects) = update(state, Msg::SubmitClicked);
    match effects.as_slice() {
        [Effect::SubmitJob { upload_id, .. }] => (state, *upload_id),
        other => panic!("unexpected effects {other:?}"),
    }
}

fn progress(job_id: &str, update: ProgressUpdate) -> Msg {
    Msg::ProgressReceived {
        job_id: job_id.to_string(),
        update,
        at: Instant::now(),
    }
}

fn done(file: &str) -> ProgressUpdate {
    ProgressUpdate {
        server_percent: 100.0,
        status: UpdateStatus::Done,
        log_delta: vec!["finished".to_string()],
        signature_detected: None,
        final_file: Some(file.to_string()),
    }
}

#[test]
fn loading_a_document_produces_an_estimate() {
    init_logging();
    let mut state = loaded(10);
    let view = state.view();

    assert_eq!(view.pages.len(), 10);
    let estimate = view.estimate.unwrap();
    assert_eq!(estimate.projected_size_bytes, 6_000_000);
    assert_eq!(estimate.reduction, Reduction::Percent(40));
    assert!(state.consume_dirty());
}

#[test]
fn every_profile_change_refreshes_the_estimate() {
    init_logging();
    let state = loaded(10);
    let (state, _) = update(state, Msg::AllProfilesSelected { code: 4 });
    assert_eq!(state.estimate().unwrap().projected_size_bytes, 2_500_000);

    let (state, _) = update(state, Msg::ProfileSelected { index: 0, code: 6 });
    let estimate = state.estimate().unwrap();
    assert_eq!(estimate.reduction, Reduction::OcrSentinel);
    assert_eq!(estimate.projected_size_bytes, 2_350_000);
}

#[test]
fn invalid_selection_reports_error_and_keeps_pages() {
    init_logging();
    let state = loaded(3);
    let (state, effects) = update(state, Msg::ProfileSelected { index: 5, code: 1 });

    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.last_error.is_some());
    assert_eq!(view.pages, vec![Profile::Medium; 3]);
}

#[test]
fn submit_emits_snapshot_and_tracks_upload() {
    init_logging();
    let (state, effects) = update(loaded(2), Msg::SubmitClicked);
    let snapshot = match effects.as_slice() {
        [Effect::SubmitJob {
            upload_id: 1,
            snapshot,
        }] => snapshot.clone(),
        other => panic!("unexpected effects {other:?}"),
    };
    assert_eq!(snapshot.to_json(), r#"{"0":3,"1":3}"#);
    assert!(state.is_job_active());

    let (state, _) = update(
        state,
        Msg::UploadProgress {
            upload_id: 1,
            sent: 50,
            total: 100,
        },
    );
    let progress = state.view().progress.unwrap();
    assert_eq!(progress.phase, "Uploading");
    assert!((progress.unified_percent - 10.0).abs() < 1e-9);

    let (state, _) = update(
        state,
        Msg::UploadProgress {
            upload_id: 1,
            sent: 100,
            total: 100,
        },
    );
    assert!((state.view().progress.unwrap().unified_percent - 20.0).abs() < 1e-9);
}

#[test]
fn submit_without_document_is_refused() {
    let (state, effects) = update(AppState::new(), Msg::SubmitClicked);
    assert!(effects.is_empty());
    assert!(!state.is_job_active());
    assert!(state.view().last_error.is_some());
}

#[test]
fn second_submit_while_active_is_ignored() {
    let (state, _) = update(loaded(2), Msg::SubmitClicked);
    let (_state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());
}

#[test]
fn acknowledgement_opens_the_channel() {
    init_logging();
    let (state, _) = update(loaded(2), Msg::SubmitClicked);
    let (state, effects) = update(
        state,
        Msg::SubmitSucceeded {
            upload_id: 1,
            job_id: "abc".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenChannel {
            job_id: "abc".to_string()
        }]
    );
    assert_eq!(state.job().unwrap().phase, JobPhase::Connecting);

    let (state, _) = update(
        state,
        Msg::ChannelOpened {
            job_id: "abc".to_string(),
        },
    );
    assert_eq!(state.job().unwrap().phase, JobPhase::Streaming);
}

#[test]
fn acknowledgement_from_abandoned_upload_is_ignored() {
    init_logging();
    let (state, first) = submit(loaded(2));
    let (state, _) = update(state, Msg::AbortClicked);
    let (state, second) = submit(state);
    assert_ne!(first, second);

    let (state, effects) = update(
        state,
        Msg::SubmitSucceeded {
            upload_id: first,
            job_id: "job-of-first".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(state.job().is_none());
    assert!(state.is_job_active());

    let (state, effects) = update(
        state,
        Msg::SubmitSucceeded {
            upload_id: second,
            job_id: "job-of-second".to_string(),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::OpenChannel {
            job_id: "job-of-second".to_string()
        }]
    );
    assert_eq!(state.job().unwrap().id, "job-of-second");
}

#[test]
fn stale_upload_failure_and_progress_do_not_touch_current_upload() {
    let (state, first) = submit(loaded(2));
    let (state, _) = update(state, Msg::AbortClicked);
    let (state, second) = submit(state);

    let (state, _) = update(
        state,
        Msg::UploadProgress {
            upload_id: first,
            sent: 90,
            total: 100,
        },
    );
    let (state, _) = update(
        state,
        Msg::SubmitFailed {
            upload_id: first,
            reason: "connection reset".to_string(),
        },
    );
    assert!(state.is_job_active());
    assert!(state.view().last_error.is_none());
    assert_eq!(state.view().progress.unwrap().unified_percent, 0.0);

    let (state, _) = update(
        state,
        Msg::SubmitSucceeded {
            upload_id: second,
            job_id: "j2".to_string(),
        },
    );
    assert_eq!(state.job().unwrap().phase, JobPhase::Connecting);
}

#[test]
fn submission_failure_surfaces_reason() {
    init_logging();
    let (state, _) = update(loaded(2), Msg::SubmitClicked);
    let (state, effects) = update(
        state,
        Msg::SubmitFailed {
            upload_id: 1,
            reason: "file too large".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(!state.is_job_active());
    assert!(state.job().is_none());
    assert_eq!(
        state.view().last_error.as_deref(),
        Some("Submission failed: file too large")
    );
}

#[test]
fn server_progress_maps_onto_unified_scale_and_appends_logs() {
    init_logging();
    let state = streaming("j1");
    assert!((state.view().progress.unwrap().unified_percent - 20.0).abs() < 1e-9);

    let mut first = ProgressUpdate::in_progress(50.0);
    first.log_delta = vec!["page 1".into(), "page 2".into()];
    let (state, _) = update(state, progress("j1", first));

    let mut second = ProgressUpdate::in_progress(50.0);
    second.log_delta = vec!["page 2".into()];
    let (state, _) = update(state, progress("j1", second));

    let view = state.view().progress.unwrap();
    assert!((view.unified_percent - 60.0).abs() < 1e-9);
    assert_eq!(view.log_lines, vec!["page 1", "page 2", "page 2"]);
}

#[test]
fn unchanged_poll_state_is_not_an_error() {
    let state = streaming("j1");
    let (state, _) = update(state, progress("j1", ProgressUpdate::in_progress(30.0)));
    let (state, effects) = update(state, progress("j1", ProgressUpdate::in_progress(30.0)));

    assert!(effects.is_empty());
    assert_eq!(state.job().unwrap().phase, JobPhase::Streaming);
    assert!(state.view().last_error.is_none());
}

#[test]
fn done_completes_job_and_triggers_download() {
    init_logging();
    let state = streaming("j1");
    let (state, effects) = update(state, progress("j1", done("scan_opt.pdf")));

    assert_eq!(
        effects,
        vec![
            Effect::CloseChannel {
                job_id: "j1".to_string()
            },
            Effect::Download {
                job_id: "j1".to_string(),
                file_name: Some("scan_opt.pdf".to_string()),
            },
        ]
    );
    let job = state.job().unwrap();
    assert_eq!(job.phase, JobPhase::Completed);
    assert_eq!(job.final_file_name.as_deref(), Some("scan_opt.pdf"));
    assert!((state.view().progress.unwrap().unified_percent - 100.0).abs() < 1e-9);
    assert!(!state.is_job_active());
}

#[test]
fn events_after_terminal_phase_are_discarded() {
    init_logging();
    let state = streaming("j1");
    let (state, _) = update(state, progress("j1", done("out.pdf")));
    let before = state.job().cloned();

    let mut late = ProgressUpdate::in_progress(10.0);
    late.log_delta = vec!["late".into()];
    let (state, effects) = update(state, progress("j1", late));
    assert!(effects.is_empty());
    assert_eq!(state.job().cloned(), before);

    let (state, _) = update(
        state,
        Msg::ChannelFailed {
            job_id: "j1".to_string(),
            reason: FailureReason::ChannelError("reset".into()),
        },
    );
    assert_eq!(state.job().unwrap().phase, JobPhase::Completed);
}

#[test]
fn failure_marker_fails_the_job() {
    init_logging();
    let state = streaming("j1");
    let failed = ProgressUpdate {
        server_percent: 40.0,
        status: UpdateStatus::Failed(Some("ghostscript exited 1".into())),
        log_delta: Vec::new(),
        signature_detected: None,
        final_file: None,
    };
    let (state, effects) = update(state, progress("j1", failed));

    assert_eq!(
        effects,
        vec![Effect::CloseChannel {
            job_id: "j1".to_string()
        }]
    );
    assert_eq!(
        state.job().unwrap().phase,
        JobPhase::Failed(FailureReason::Server("ghostscript exited 1".into()))
    );
    assert!(!state.is_job_active());
    assert!(state.view().last_error.is_some());
}

#[test]
fn channel_error_without_terminal_status_fails_the_job() {
    let state = streaming("j1");
    let (state, _) = update(
        state,
        Msg::ChannelFailed {
            job_id: "j1".to_string(),
            reason: FailureReason::Stalled,
        },
    );
    assert_eq!(
        state.job().unwrap().phase,
        JobPhase::Failed(FailureReason::Stalled)
    );
    assert_eq!(state.guard_exit(), None);
}

#[test]
fn updates_for_other_jobs_are_ignored() {
    let state = streaming("j1");
    let (state, effects) = update(state, progress("other", done("x.pdf")));
    assert!(effects.is_empty());
    assert_eq!(state.job().unwrap().phase, JobPhase::Streaming);
}

#[test]
fn mid_stream_signature_sets_sticky_advisory() {
    init_logging();
    let state = streaming("j1");
    let mut flagged = ProgressUpdate::in_progress(10.0);
    flagged.signature_detected = Some(true);
    let (state, _) = update(state, progress("j1", flagged));
    assert!(state.view().signature_advisory);

    let mut cleared = ProgressUpdate::in_progress(20.0);
    cleared.signature_detected = Some(false);
    let (state, _) = update(state, progress("j1", cleared));
    assert!(state.view().signature_advisory);
    assert!(state.job().unwrap().signature_detected);

    let (state, _) = update(state, Msg::SignatureChecked { detected: false });
    assert!(state.view().signature_advisory);
}

#[test]
fn download_failure_keeps_job_completed() {
    let state = streaming("j1");
    let (state, _) = update(state, progress("j1", done("out.pdf")));
    let (state, _) = update(
        state,
        Msg::DownloadFailed {
            job_id: "j1".to_string(),
            reason: "http status 404".to_string(),
        },
    );
    assert_eq!(state.job().unwrap().phase, JobPhase::Completed);
    assert_eq!(
        state.view().last_error.as_deref(),
        Some("Download failed: http status 404")
    );
}

#[test]
fn channel_failure_releases_the_channel() {
    let state = streaming("j1");
    let (_state, effects) = update(
        state,
        Msg::ChannelFailed {
            job_id: "j1".to_string(),
            reason: FailureReason::Stalled,
        },
    );
    assert_eq!(
        effects,
        vec![Effect::CloseChannel {
            job_id: "j1".to_string()
        }]
    );
}

#[test]
fn downloads_for_previous_jobs_are_ignored() {
    let state = streaming("old");
    let (state, _) = update(state, progress("old", done("old.pdf")));
    let (state, _) = update(
        state,
        Msg::DocumentLoaded {
            name: "next.pdf".to_string(),
            size_bytes: 1_000,
            page_count: 1,
        },
    );
    let (state, upload_id) = submit(state);
    let (state, _) = update(
        state,
        Msg::SubmitSucceeded {
            upload_id,
            job_id: "new".to_string(),
        },
    );

    let (state, _) = update(
        state,
        Msg::DownloadFinished {
            job_id: "old".to_string(),
            path: "output/old.pdf".into(),
        },
    );
    let (state, _) = update(
        state,
        Msg::DownloadFailed {
            job_id: "old".to_string(),
            reason: "http status 404".to_string(),
        },
    );
    let view = state.view();
    assert_eq!(view.saved_to, None);
    assert_eq!(view.last_error, None);
    assert_eq!(state.job().unwrap().id, "new");
}

#[test]
fn two_sessions_do_not_interfere() {
    let first = streaming("j1");
    let second = loaded(3);
    assert!(first.is_job_active());
    assert!(!second.is_job_active());
    assert_eq!(second.guard_exit(), None);
}
