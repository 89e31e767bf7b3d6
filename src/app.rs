use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tokio::time::timeout;
use tokio_cron_scheduler::JobScheduler;

use crate::{
    config::AppConfig,
    domain::RunSummary,
    infrastructure::{directories::ResolvedPaths, shutdown::Shutdown},
    mailbox::{Mailbox, SpoolMailbox},
    model::SpamClassifier,
    tasks::{
        processor::TriageProcessor,
        scheduler::{configure_triage_job, run_guarded_pass},
    },
    text::Normalizer,
};

pub struct TriageApp {
    processor: Arc<TriageProcessor>,
    gate: Arc<Mutex<()>>,
    shutdown: Shutdown,
    config: Arc<AppConfig>,
}

impl TriageApp {
    pub fn initialize(
        config: AppConfig,
        paths: &ResolvedPaths,
        shutdown: Shutdown,
    ) -> Result<Self> {
        let classifier = SpamClassifier::load(
            Normalizer::english(),
            config.model.artifact_path(),
            config.triage.confidence_threshold,
        )?;
        tracing::info!(
            target: "lifecycle",
            loaded = classifier.is_loaded(),
            threshold = classifier.threshold(),
            "classifier ready"
        );
        let spool = SpoolMailbox::open(&paths.mailbox_dir)
            .with_context(|| format!("failed to open mailbox {}", paths.mailbox_dir.display()))?;
        let mailbox: Arc<dyn Mailbox> = Arc::new(spool);
        let processor = Arc::new(TriageProcessor::new(
            classifier,
            mailbox,
            config.triage.clone(),
        ));

        Ok(Self {
            processor,
            gate: Arc::new(Mutex::new(())),
            shutdown,
            config: Arc::new(config),
        })
    }

    pub async fn run_once(&self) -> Result<RunSummary> {
        let processor = self.processor.clone();
        let listener = self.shutdown.subscribe();
        let summary = tokio::task::spawn_blocking(move || processor.run_pass(&listener))
            .await
            .context("triage pass panicked")??;
        Ok(summary)
    }

    pub async fn run(self) -> Result<()> {
        let TriageApp {
            processor,
            gate,
            shutdown,
            config,
        } = self;

        tracing::info!(target: "lifecycle", "spam triage service starting");

        run_guarded_pass(processor.clone(), gate.clone(), shutdown.clone()).await;

        let mut scheduler: JobScheduler = configure_triage_job(
            &config.scheduler.cron_spec,
            processor,
            gate.clone(),
            shutdown.clone(),
        )
        .await?;

        let mut listener = shutdown.subscribe();
        listener.notified().await;
        tracing::info!(target: "lifecycle", "shutdown signal received");

        let shutdown_timeout = Duration::from_secs(5);
        match timeout(shutdown_timeout, scheduler.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::error!(target: "scheduler", ?err, "failed to stop scheduler");
            }
            Err(_) => {
                tracing::warn!(
                    target: "scheduler",
                    "scheduler did not stop within {:?}",
                    shutdown_timeout
                );
            }
        }

        // Wait for an in-flight pass to finish its current message.
        let drained = timeout(shutdown_timeout, async {
            loop {
                if gate.try_lock().is_some() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
        .await;
        if drained.is_err() {
            tracing::warn!(
                target: "lifecycle",
                "triage pass still running after {:?}; exiting",
                shutdown_timeout
            );
        }

        tracing::info!(target: "lifecycle", "spam triage service stopped");
        Ok(())
    }
}
