use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::TriageConfig,
    domain::{
        ActionKind, ActionOutcome, Message, MessageOutcome, RunSummary, Verdict, VerdictLabel,
    },
    infrastructure::shutdown::ShutdownListener,
    mailbox::Mailbox,
    model::SpamClassifier,
    text::CanonicalText,
};

const SUBJECT_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Error)]
pub enum TriageError {
    #[error("model not loaded; train first with `spam-triage train`")]
    ModelNotLoaded,
    #[error("failed to fetch messages: {0:#}")]
    Fetch(anyhow::Error),
}

pub struct TriageProcessor {
    classifier: SpamClassifier,
    mailbox: Arc<dyn Mailbox>,
    config: TriageConfig,
}

impl TriageProcessor {
    pub fn new(
        classifier: SpamClassifier,
        mailbox: Arc<dyn Mailbox>,
        config: TriageConfig,
    ) -> Self {
        Self {
            classifier,
            mailbox,
            config,
        }
    }

    pub fn run_pass(&self, shutdown: &ShutdownListener) -> Result<RunSummary, TriageError> {
        if !self.classifier.is_loaded() {
            tracing::error!(target: "triage", "model not loaded; aborting pass before fetching");
            return Err(TriageError::ModelNotLoaded);
        }

        let mut summary = RunSummary::start();
        tracing::info!(
            target: "triage",
            limit = self.config.fetch_limit,
            query = %self.config.query,
            "fetching unread messages"
        );
        let messages = self
            .mailbox
            .list_unread(&self.config.query, self.config.fetch_limit)
            .map_err(TriageError::Fetch)?;

        if messages.is_empty() {
            tracing::info!(target: "triage", "no messages to process");
            return Ok(summary.finish());
        }
        tracing::info!(target: "triage", total = messages.len(), "processing messages");

        for message in &messages {
            if shutdown.is_triggered() {
                tracing::info!(
                    target: "triage",
                    processed = summary.total,
                    remaining = messages.len() - summary.total,
                    "shutdown requested; stopping pass between messages"
                );
                summary.cancelled = true;
                break;
            }
            let outcome = self.process(message)?;
            summary.record(outcome);
        }

        let summary = summary.finish();
        tracing::info!(
            target: "triage",
            total = summary.total,
            spam = summary.spam,
            not_spam = summary.not_spam,
            action_failures = summary.action_failures,
            skipped = summary.skipped_actions,
            "classification summary"
        );
        Ok(summary)
    }

    fn process(&self, message: &Message) -> Result<MessageOutcome, TriageError> {
        let (text, used_snippet) = self.extract_text(message);
        let verdict = self.classifier.classify(&text);

        tracing::info!(
            target: "triage",
            id = %message.id,
            subject = %message.subject_preview(SUBJECT_PREVIEW_CHARS),
            from = %message.sender,
            prediction = %verdict.label,
            probability = format_args!("{:.2}%", verdict.spam_probability * 100.0),
            used_snippet,
            "message classified"
        );

        let action = self.apply(message, &verdict)?;
        Ok(MessageOutcome {
            id: message.id.clone(),
            verdict,
            used_snippet,
            action,
        })
    }

    /// Subject and body first; the snippet only when those normalize to nothing.
    fn extract_text(&self, message: &Message) -> (CanonicalText, bool) {
        let normalizer = self.classifier.normalizer();
        let primary = normalizer.normalize(&message.primary_text());
        if !primary.is_empty() {
            return (primary, false);
        }
        (normalizer.normalize(&message.snippet), true)
    }

    fn apply(&self, message: &Message, verdict: &Verdict) -> Result<ActionOutcome, TriageError> {
        let action = match verdict.label {
            VerdictLabel::Spam if !self.config.enable_quarantine_action => {
                tracing::info!(
                    target: "triage",
                    id = %message.id,
                    "quarantine disabled; leaving message in place"
                );
                return Ok(ActionOutcome::Skipped);
            }
            VerdictLabel::Spam => ActionKind::Quarantine,
            VerdictLabel::NotSpam => ActionKind::MarkReviewed,
            VerdictLabel::Unknown => return Err(TriageError::ModelNotLoaded),
        };

        let result = match action {
            ActionKind::Quarantine => self.mailbox.quarantine(&message.id),
            ActionKind::MarkReviewed => self.mailbox.mark_reviewed(&message.id),
        };

        Ok(match result {
            Ok(()) => {
                tracing::info!(
                    target: "triage",
                    id = %message.id,
                    action = ?action,
                    "action applied"
                );
                ActionOutcome::Applied { action }
            }
            Err(err) => {
                tracing::warn!(
                    target: "triage",
                    id = %message.id,
                    action = ?action,
                    error = %format!("{err:#}"),
                    "mailbox action failed; not retrying this pass"
                );
                ActionOutcome::Failed {
                    action,
                    error: format!("{err:#}"),
                }
            }
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashSet;

    use anyhow::{anyhow, Result};
    use parking_lot::Mutex;

    use super::*;
    use crate::{
        config::TrainingConfig,
        domain::MessageId,
        infrastructure::shutdown::Shutdown,
        model::DEFAULT_THRESHOLD,
        text::Normalizer,
        training::{LabeledText, Trainer},
    };

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        List,
        Quarantine(String),
        MarkReviewed(String),
    }

    #[derive(Default)]
    pub struct RecordingMailbox {
        messages: Vec<Message>,
        failing: HashSet<String>,
        calls: Mutex<Vec<Call>>,
    }

    impl RecordingMailbox {
        pub fn with_messages(messages: Vec<Message>) -> Self {
            Self {
                messages,
                ..Self::default()
            }
        }

        pub fn failing_on(mut self, id: &str) -> Self {
            self.failing.insert(id.to_string());
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }

        fn act(&self, id: &MessageId, call: Call) -> Result<()> {
            self.calls.lock().push(call);
            if self.failing.contains(id.as_str()) {
                return Err(anyhow!("simulated failure for {id}"));
            }
            Ok(())
        }
    }

    impl Mailbox for RecordingMailbox {
        fn list_unread(&self, _query: &str, limit: usize) -> Result<Vec<Message>> {
            self.calls.lock().push(Call::List);
            Ok(self.messages.iter().take(limit).cloned().collect())
        }

        fn quarantine(&self, id: &MessageId) -> Result<()> {
            self.act(id, Call::Quarantine(id.to_string()))
        }

        fn mark_reviewed(&self, id: &MessageId) -> Result<()> {
            self.act(id, Call::MarkReviewed(id.to_string()))
        }
    }

    pub fn message(id: &str, subject: &str, body: &str, snippet: &str) -> Message {
        Message {
            id: MessageId::new(id),
            subject: subject.to_string(),
            sender: "sender@example.com".to_string(),
            body: body.to_string(),
            snippet: snippet.to_string(),
        }
    }

    pub fn trained_classifier() -> SpamClassifier {
        let corpus = vec![
            LabeledText::new("WIN FREE MONEY NOW!!!", "spam"),
            LabeledText::new("Claim your cash prize, free entry", "spam"),
            LabeledText::new("Meeting at 3pm tomorrow", "ham"),
            LabeledText::new("Thanks, see you then at lunch", "ham"),
        ];
        let report = Trainer::new(Normalizer::english(), TrainingConfig::default())
            .train(&corpus)
            .unwrap();
        SpamClassifier::new(
            Normalizer::english(),
            Some(Arc::new(report.model)),
            DEFAULT_THRESHOLD,
        )
    }

    fn processor(mailbox: Arc<RecordingMailbox>, config: TriageConfig) -> TriageProcessor {
        TriageProcessor::new(trained_classifier(), mailbox, config)
    }

    fn listener() -> ShutdownListener {
        Shutdown::new().subscribe()
    }

    #[test]
    fn not_spam_is_marked_reviewed_once_and_never_quarantined() {
        let mailbox = Arc::new(RecordingMailbox::with_messages(vec![message(
            "m1",
            "Meeting tomorrow",
            "See you at 3pm",
            "",
        )]));
        let summary = processor(mailbox.clone(), TriageConfig::default())
            .run_pass(&listener())
            .unwrap();

        assert_eq!(summary.not_spam, 1);
        assert_eq!(
            mailbox.calls(),
            vec![Call::List, Call::MarkReviewed("m1".into())]
        );
    }

    #[test]
    fn spam_is_quarantined_and_failures_do_not_stop_the_pass() {
        let mailbox = Arc::new(
            RecordingMailbox::with_messages(vec![
                message("s1", "WIN FREE MONEY", "claim your cash prize now!!!", ""),
                message("s2", "FREE cash prize", "win money now!!!", ""),
                message("h1", "Lunch tomorrow?", "thanks, see you then", ""),
            ])
            .failing_on("s1"),
        );
        let summary = processor(mailbox.clone(), TriageConfig::default())
            .run_pass(&listener())
            .unwrap();

        assert_eq!(summary.total, 3);
        assert_eq!(summary.spam, 2);
        assert_eq!(summary.not_spam, 1);
        assert_eq!(summary.action_failures, 1);
        assert_eq!(
            mailbox.calls(),
            vec![
                Call::List,
                Call::Quarantine("s1".into()),
                Call::Quarantine("s2".into()),
                Call::MarkReviewed("h1".into()),
            ]
        );
        let ids: Vec<_> = summary.outcomes.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2", "h1"]);
        assert!(matches!(summary.outcomes[0].action, ActionOutcome::Failed { .. }));
    }

    #[test]
    fn disabled_quarantine_makes_no_mailbox_call() {
        let mailbox = Arc::new(RecordingMailbox::with_messages(vec![message(
            "s1",
            "WIN FREE MONEY NOW!!!",
            "",
            "",
        )]));
        let config = TriageConfig {
            enable_quarantine_action: false,
            ..TriageConfig::default()
        };
        let summary = processor(mailbox.clone(), config).run_pass(&listener()).unwrap();
        assert_eq!(summary.spam, 1);
        assert_eq!(summary.skipped_actions, 1);
        assert_eq!(mailbox.calls(), vec![Call::List]);
    }

    #[test]
    fn missing_model_aborts_before_any_mailbox_call() {
        let mailbox = Arc::new(RecordingMailbox::with_messages(vec![
            message("a", "WIN FREE MONEY", "", ""),
            message("b", "Meeting", "", ""),
        ]));
        let classifier = SpamClassifier::new(Normalizer::english(), None, DEFAULT_THRESHOLD);
        assert_eq!(classifier.predict("WIN FREE MONEY").label, VerdictLabel::Unknown);

        let processor = TriageProcessor::new(classifier, mailbox.clone(), TriageConfig::default());
        let result = processor.run_pass(&listener());
        assert!(matches!(result, Err(TriageError::ModelNotLoaded)));
        assert!(mailbox.calls().is_empty());
    }

    #[test]
    fn snippet_is_used_when_subject_and_body_are_empty() {
        let mailbox = Arc::new(RecordingMailbox::with_messages(vec![message(
            "m1",
            "",
            "",
            "Thanks, see you then",
        )]));
        let classifier = trained_classifier();
        let expected = classifier.predict("Thanks, see you then");
        let processor = TriageProcessor::new(classifier, mailbox.clone(), TriageConfig::default());
        let summary = processor.run_pass(&listener()).unwrap();

        let outcome = &summary.outcomes[0];
        assert!(outcome.used_snippet);
        assert_eq!(outcome.verdict, expected);
        assert_eq!(outcome.verdict.label, VerdictLabel::NotSpam);
        assert_eq!(mailbox.calls(), vec![Call::List, Call::MarkReviewed("m1".into())]);
    }

    #[test]
    fn stopword_only_subject_falls_back_to_snippet() {
        let processor = processor(
            Arc::new(RecordingMailbox::default()),
            TriageConfig::default(),
        );
        let (text, used_snippet) =
            processor.extract_text(&message("x", "Re: Fwd:", "", "win free money"));
        assert!(used_snippet);
        assert_eq!(text.as_str(), "win free money");
    }

    #[test]
    fn fetch_limit_and_empty_inbox() {
        let mailbox = Arc::new(RecordingMailbox::default());
        let summary = processor(mailbox.clone(), TriageConfig::default())
            .run_pass(&listener())
            .unwrap();
        assert_eq!(summary.total, 0);
        assert!(summary.finished_at.is_some());

        let mailbox = Arc::new(RecordingMailbox::with_messages(vec![
            message("a", "Lunch", "", ""),
            message("b", "Lunch", "", ""),
            message("c", "Lunch", "", ""),
        ]));
        let config = TriageConfig {
            fetch_limit: 2,
            ..TriageConfig::default()
        };
        let summary = processor(mailbox, config).run_pass(&listener()).unwrap();
        assert_eq!(summary.total, 2);
    }

    #[test]
    fn shutdown_stops_between_messages() {
        let mailbox = Arc::new(RecordingMailbox::with_messages(vec![
            message("a", "Lunch", "", ""),
            message("b", "Lunch", "", ""),
        ]));
        let shutdown = Shutdown::new();
        let listener = shutdown.subscribe();
        shutdown.trigger();
        let summary = processor(mailbox.clone(), TriageConfig::default())
            .run_pass(&listener)
            .unwrap();
        assert!(summary.cancelled);
        assert_eq!(summary.total, 0);
        assert_eq!(mailbox.calls(), vec![Call::List]);
    }
}
