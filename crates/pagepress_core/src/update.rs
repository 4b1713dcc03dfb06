use press_logging::{press_debug, press_info, press_warn};

use crate::{Applied, AppState, Document, Effect, Job, Msg, ResetError};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::DocumentLoaded {
            name,
            size_bytes,
            page_count,
        } => {
            if state.is_job_active() {
                state.set_error("Cannot load a new document while a job is running");
                return (state, Vec::new());
            }
            match Document::new(name, size_bytes, page_count)
                .and_then(|document| state.load_document(document))
            {
                Ok(()) => vec![Effect::CheckSignature],
                Err(err) => {
                    press_warn!("Document rejected: {}", err);
                    state.set_error(err.to_string());
                    Vec::new()
                }
            }
        }
        Msg::DocumentRejected { reason } => {
            state.set_error(format!("Could not read document: {reason}"));
            Vec::new()
        }
        Msg::ProfileSelected { index, code } => {
            if let Err(err) = state.mutate_store(|store| store.set_profile_code(index, code)) {
                press_warn!("Profile change for page {} rejected: {}", index, err);
                state.set_error(err.to_string());
            }
            Vec::new()
        }
        Msg::AllProfilesSelected { code } => {
            if let Err(err) = state.mutate_store(|store| store.set_all_profile_codes(code)) {
                press_warn!("Bulk profile change rejected: {}", err);
                state.set_error(err.to_string());
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            if state.is_job_active() {
                press_warn!("Submit ignored: a job is already active");
                return (state, Vec::new());
            }
            match state.store().snapshot() {
                Ok(snapshot) if state.document().is_some() => {
                    let upload_id = state.begin_upload();
                    press_info!("Submitting {} pages as upload {}", snapshot.len(), upload_id);
                    vec![Effect::SubmitJob {
                        upload_id,
                        snapshot,
                    }]
                }
                _ => {
                    state.set_error("Select a document before submitting");
                    Vec::new()
                }
            }
        }
        Msg::UploadProgress {
            upload_id,
            sent,
            total,
        } => {
            if state.is_current_upload(upload_id) {
                state.set_upload_progress(sent, total);
            }
            Vec::new()
        }
        Msg::SubmitSucceeded { upload_id, job_id } => {
            if !state.is_current_upload(upload_id) {
                press_debug!(
                    "Ignoring acknowledgement for {} from stale upload {}",
                    job_id,
                    upload_id
                );
                return (state, Vec::new());
            }
            press_info!("Upload acknowledged, job {}", job_id);
            state.start_job(Job::new(job_id.clone()));
            vec![Effect::OpenChannel { job_id }]
        }
        Msg::SubmitFailed { upload_id, reason } => {
            if state.is_current_upload(upload_id) {
                state.end_upload();
                state.set_error(format!("Submission failed: {reason}"));
            }
            Vec::new()
        }
        Msg::ChannelOpened { job_id } => {
            if let Some(job) = state.job_mut(&job_id) {
                if job.channel_opened() {
                    state.mark_dirty();
                }
            }
            Vec::new()
        }
        Msg::ProgressReceived { job_id, update, at } => {
            let detected = update.signature_detected == Some(true);
            let Some(job) = state.job_mut(&job_id) else {
                press_debug!("Dropping update for unknown job {}", job_id);
                return (state, Vec::new());
            };
            let applied = job.apply(update);
            let final_file = job.final_file_name.clone();
            let failure = job.failure().map(ToString::to_string);
            if applied == Applied::Discarded {
                return (state, Vec::new());
            }
            if detected {
                state.observe_signature(true);
            }
            state.mark_dirty();
            match applied {
                Applied::Completed => {
                    state.guard.job_completed(at);
                    vec![
                        Effect::CloseChannel {
                            job_id: job_id.clone(),
                        },
                        Effect::Download {
                            job_id,
                            file_name: final_file,
                        },
                    ]
                }
                Applied::Failed => {
                    state.guard.job_ended();
                    if let Some(failure) = failure {
                        state.set_error(failure);
                    }
                    vec![Effect::CloseChannel { job_id }]
                }
                Applied::Progressed | Applied::Discarded => Vec::new(),
            }
        }
        Msg::ChannelFailed { job_id, reason } => {
            let failed = state
                .job_mut(&job_id)
                .is_some_and(|job| job.channel_failed(reason.clone()));
            if failed {
                state.guard.job_ended();
                state.set_error(reason.to_string());
            }
            vec![Effect::CloseChannel { job_id }]
        }
        Msg::DownloadFinished { job_id, path } => {
            if !is_current_job(&state, &job_id) {
                press_debug!("Ignoring download for previous job {}", job_id);
                return (state, Vec::new());
            }
            press_info!("Job {}: result saved to {:?}", job_id, path);
            state.guard.download_settled();
            state.set_saved_to(path);
            Vec::new()
        }
        Msg::DownloadFailed { job_id, reason } => {
            if !is_current_job(&state, &job_id) {
                press_debug!("Ignoring download failure for previous job {}", job_id);
                return (state, Vec::new());
            }
            press_warn!("Job {}: download failed: {}", job_id, reason);
            state.guard.download_settled();
            state.set_error(format!("Download failed: {reason}"));
            Vec::new()
        }
        Msg::SignatureChecked { detected } => {
            state.observe_signature(detected);
            Vec::new()
        }
        Msg::AbortClicked => abort_active(&mut state),
        Msg::ClearClicked { at } => match state.guard.check_reset(at, false) {
            Ok(()) => {
                state.reset();
                Vec::new()
            }
            Err(ResetError::ConfirmationRequired { warning }) => {
                vec![Effect::ConfirmClear { warning }]
            }
            Err(err @ ResetError::DownloadPending) => {
                state.set_error(err.to_string());
                Vec::new()
            }
        },
        Msg::ClearConfirmed { at } => match state.guard.check_reset(at, true) {
            Ok(()) => {
                let effects = abort_active(&mut state);
                state.reset();
                effects
            }
            Err(err) => {
                state.set_error(err.to_string());
                Vec::new()
            }
        },
        Msg::ExitRequested => match state.guard_exit() {
            Some(warning) => vec![Effect::ConfirmExit {
                warning: warning.to_string(),
            }],
            None => vec![Effect::Exit],
        },
        Msg::Tick { now } => {
            if state.guard.tick(now) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn is_current_job(state: &AppState, job_id: &str) -> bool {
    state.job().is_some_and(|job| job.id == job_id)
}

fn abort_active(state: &mut AppState) -> Vec<Effect> {
    if state.is_uploading() {
        state.end_upload();
        return vec![Effect::CancelUpload];
    }
    let Some(job_id) = state.job().map(|job| job.id.clone()) else {
        return Vec::new();
    };
    let aborted = state.job_mut(&job_id).is_some_and(|job| job.abort());
    if !aborted {
        return Vec::new();
    }
    state.guard.job_ended();
    state.mark_dirty();
    vec![Effect::CloseChannel { job_id }]
}
