use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{infrastructure::shutdown::Shutdown, tasks::processor::TriageProcessor};

pub async fn run_guarded_pass(
    processor: Arc<TriageProcessor>,
    gate: Arc<Mutex<()>>,
    shutdown: Shutdown,
) {
    let result = tokio::task::spawn_blocking(move || {
        let Some(_guard) = gate.try_lock() else {
            tracing::warn!(target: "scheduler", "previous pass still running; skipping this tick");
            return;
        };
        if let Err(err) = processor.run_pass(&shutdown.subscribe()) {
            tracing::error!(target: "scheduler", error = %err, "triage pass failed");
        }
    })
    .await;

    if let Err(err) = result {
        tracing::error!(target: "scheduler", error = %err, "triage pass panicked");
    }
}

pub async fn configure_triage_job(
    cron_spec: &str,
    processor: Arc<TriageProcessor>,
    gate: Arc<Mutex<()>>,
    shutdown: Shutdown,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;
    let label = cron_spec.to_string();
    let job = Job::new_async(cron_spec, move |_id, _l| {
        let processor = processor.clone();
        let gate = gate.clone();
        let shutdown = shutdown.clone();
        let cron_label = label.clone();
        Box::pin(async move {
            tracing::info!(target: "scheduler", cron = %cron_label, "triage job triggered");
            run_guarded_pass(processor, gate, shutdown).await;
        })
    })?;
    scheduler.add(job).await?;
    tracing::info!(target: "scheduler", cron = %cron_spec, "triage job registered");
    scheduler.start().await?;
    Ok(scheduler)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::TriageConfig,
        tasks::processor::tests::{message, trained_classifier, Call, RecordingMailbox},
    };

    fn processor(mailbox: Arc<RecordingMailbox>) -> Arc<TriageProcessor> {
        Arc::new(TriageProcessor::new(
            trained_classifier(),
            mailbox,
            TriageConfig::default(),
        ))
    }

    #[tokio::test]
    async fn guarded_pass_runs_when_gate_is_free() {
        let mailbox = Arc::new(RecordingMailbox::with_messages(vec![message(
            "m1", "Lunch", "", "",
        )]));
        let gate = Arc::new(Mutex::new(()));
        run_guarded_pass(processor(mailbox.clone()), gate, Shutdown::new()).await;
        assert_eq!(
            mailbox.calls(),
            vec![Call::List, Call::MarkReviewed("m1".into())]
        );
    }

    #[tokio::test]
    async fn overlapping_pass_is_skipped() {
        let mailbox = Arc::new(RecordingMailbox::with_messages(vec![message(
            "m1", "Lunch", "", "",
        )]));
        let gate = Arc::new(Mutex::new(()));
        let held = gate.clone();
        let guard = held.lock();
        run_guarded_pass(processor(mailbox.clone()), gate, Shutdown::new()).await;
        drop(guard);
        assert!(mailbox.calls().is_empty());
    }
}
