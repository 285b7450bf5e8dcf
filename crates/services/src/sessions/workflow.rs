use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use quiz_core::model::{AttemptRecord, OptionId, QuestionBank, QuizSettings};
use quiz_core::{CountdownTick, OptionMark};
use storage::HistoryStore;

use super::plan::Shuffler;
use super::service::{AdvanceOutcome, SessionService};
use super::view::{Feedback, ResultView};
use crate::Clock;
use crate::error::SessionError;
use crate::render::{Notice, OptionState, RenderSink};
use crate::timer::{QuizTimer, TimerEvent};

/// What a timer event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerOutcome {
    /// Stale epoch, already finished, or nothing to do.
    Ignored,
    Ticked { remaining: u32 },
    /// Time ran out and the session was finished.
    Expired(AttemptRecord),
}

/// Drives one quiz: session state, countdown, score history and display.
///
/// All state changes funnel through `&mut self`, so user input and timer
/// events are applied one at a time. Feed timer events from
/// [`QuizRunner::next_timer_event`] into [`QuizRunner::handle_timer_event`].
pub struct QuizRunner<S: RenderSink> {
    session: SessionService,
    history: HistoryStore,
    clock: Clock,
    timer: QuizTimer,
    timer_tx: UnboundedSender<TimerEvent>,
    timer_rx: UnboundedReceiver<TimerEvent>,
    sink: S,
}

impl<S: RenderSink> QuizRunner<S> {
    /// Runner with the system clock and OS-seeded shuffling.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the bank has no questions.
    pub fn new(
        bank: QuestionBank,
        settings: QuizSettings,
        history: HistoryStore,
        sink: S,
    ) -> Result<Self, SessionError> {
        Self::with_parts(
            bank,
            settings,
            history,
            sink,
            Clock::default_clock(),
            Shuffler::from_os_rng(),
        )
    }

    /// Runner with an explicit clock and shuffler.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if the bank has no questions.
    pub fn with_parts(
        bank: QuestionBank,
        settings: QuizSettings,
        history: HistoryStore,
        sink: S,
        clock: Clock,
        shuffler: Shuffler,
    ) -> Result<Self, SessionError> {
        let session = SessionService::new(bank, settings, shuffler, clock.now())?;
        let (timer_tx, timer_rx) = unbounded_channel();
        Ok(Self {
            session,
            history,
            clock,
            timer: QuizTimer::new(),
            timer_tx,
            timer_rx,
            sink,
        })
    }

    #[must_use]
    pub fn session(&self) -> &SessionService {
        &self.session
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    #[must_use]
    pub fn timer(&self) -> &QuizTimer {
        &self.timer
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.session.is_finished()
    }

    /// Start the countdown and show the first question.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(&mut self) {
        let secs = self.session.settings().duration_secs();
        let epoch = self.timer.start(secs, self.timer_tx.clone());
        self.sink.show_timer(secs);
        self.render_current();
        tracing::info!(
            epoch,
            questions = self.session.total_questions(),
            duration_secs = secs,
            "quiz started"
        );
    }

    /// Toggle `option` and repaint the options whose state changed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if no question is awaiting an answer or the
    /// option is unknown.
    pub fn toggle_option(&mut self, option: OptionId) -> Result<(), SessionError> {
        let before = self.session.selection().clone();
        let after = self.session.toggle(option)?.clone();
        for changed in before.symmetric_difference(&after) {
            let state = if after.contains(changed) {
                OptionState::Selected
            } else {
                OptionState::Idle
            };
            self.sink.highlight(*changed, state);
        }
        Ok(())
    }

    /// Grade the current selection.
    ///
    /// # Errors
    ///
    /// Validation failures are also reported to the sink as a [`Notice`].
    pub fn submit(&mut self) -> Result<Feedback, SessionError> {
        let result = self.session.submit().cloned();
        self.present_feedback(result)
    }

    /// Grade an explicit selection, replacing the toggled one.
    ///
    /// # Errors
    ///
    /// Validation failures are also reported to the sink as a [`Notice`].
    pub fn submit_selection<I>(&mut self, selection: I) -> Result<Feedback, SessionError>
    where
        I: IntoIterator<Item = OptionId>,
    {
        let result = self.session.submit_selection(selection).cloned();
        self.present_feedback(result)
    }

    /// Move to the next question, or finish and record the attempt.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if there is no feedback to
    /// move past.
    pub async fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        let outcome = self.session.advance(self.clock.now())?;
        match &outcome {
            AdvanceOutcome::Next => self.render_current(),
            AdvanceOutcome::Finished(record) => self.complete(record).await,
        }
        Ok(outcome)
    }

    /// Finish before the last question, keeping the current score.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if already finished.
    pub async fn finish_early(&mut self) -> Result<AttemptRecord, SessionError> {
        let record = self.session.force_finish(self.clock.now())?;
        self.complete(&record).await;
        Ok(record)
    }

    /// Wait for the next countdown event.
    pub async fn next_timer_event(&mut self) -> Option<TimerEvent> {
        self.timer_rx.recv().await
    }

    /// Apply a countdown event. Events from an earlier run are ignored.
    pub async fn handle_timer_event(&mut self, event: TimerEvent) -> TimerOutcome {
        if event.epoch != self.timer.epoch() || self.session.is_finished() {
            tracing::trace!(epoch = event.epoch, "ignoring timer event");
            return TimerOutcome::Ignored;
        }

        match event.tick {
            CountdownTick::Running { remaining } => {
                self.session.set_remaining(remaining);
                self.sink.show_timer(remaining);
                TimerOutcome::Ticked { remaining }
            }
            CountdownTick::Expired => {
                self.session.set_remaining(0);
                self.sink.show_timer(0);
                self.sink.notify(Notice::TimeUp);
                match self.session.force_finish(self.clock.now()) {
                    Ok(record) => {
                        self.complete(&record).await;
                        TimerOutcome::Expired(record)
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "could not finish on timeout");
                        TimerOutcome::Ignored
                    }
                }
            }
            CountdownTick::Idle => TimerOutcome::Ignored,
        }
    }

    /// Begin a new attempt after finishing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is finished.
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.session.restart(self.clock.now())?;
        self.start();
        Ok(())
    }

    /// All recorded attempts, oldest first.
    pub async fn history(&self) -> Vec<AttemptRecord> {
        self.history.list().await
    }

    /// Delete the score history and refresh the result screen if shown.
    ///
    /// The caller is responsible for confirming with the user first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the history cannot be removed.
    pub async fn clear_history(&mut self) -> Result<(), SessionError> {
        self.history.clear().await?;
        self.sink.notify(Notice::HistoryCleared);
        if let Some(record) = self.session.attempt().cloned() {
            let history = self.history.list().await;
            self.sink.show_result(&ResultView::new(&record, &history));
        }
        Ok(())
    }

    fn render_current(&mut self) {
        if let Some(view) = self.session.current_view() {
            self.sink.render_question(&view);
            self.sink.show_progress(&self.session.progress());
        }
    }

    fn present_feedback(
        &mut self,
        result: Result<Feedback, SessionError>,
    ) -> Result<Feedback, SessionError> {
        let feedback = match result {
            Ok(feedback) => feedback,
            Err(err) => {
                match &err {
                    SessionError::EmptySelection => self.sink.notify(Notice::SelectAtLeastOne),
                    SessionError::TooManySelections(_) => {
                        self.sink.notify(Notice::SingleChoiceOnly);
                    }
                    _ => {}
                }
                return Err(err);
            }
        };

        for (id, mark) in &feedback.marks {
            self.sink.highlight(*id, OptionState::Disabled);
            match mark {
                OptionMark::Correct => self.sink.highlight(*id, OptionState::Correct),
                OptionMark::Incorrect => self.sink.highlight(*id, OptionState::Incorrect),
                OptionMark::Neutral => {}
            }
        }
        self.sink.show_feedback(&feedback);
        Ok(feedback)
    }

    async fn complete(&mut self, record: &AttemptRecord) {
        self.timer.stop();
        if let Err(err) = self.history.append(record.clone()).await {
            tracing::warn!(error = %err, "failed to save attempt to history");
        }
        let history = self.history.list().await;
        self.sink.show_progress(&self.session.progress());
        self.sink.show_result(&ResultView::new(record, &history));
        tracing::info!(
            score = record.score(),
            total = record.total(),
            duration_secs = record.duration_secs(),
            "quiz finished"
        );
    }
}

impl<S: RenderSink> std::fmt::Debug for QuizRunner<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizRunner")
            .field("session", &self.session)
            .field("history_key", &self.history.key())
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{RecordingSink, SinkCall};
    use async_trait::async_trait;
    use quiz_core::model::Question;
    use quiz_core::time::fixed_clock;
    use std::sync::Arc;
    use storage::{InMemoryStore, KeyValueStore, StorageError};

    fn bank() -> QuestionBank {
        QuestionBank::new(vec![
            Question::new("Pick B", ["A", "B", "C"], ["B"], false).unwrap(),
            Question::new("Pick both", ["x", "y"], ["x", "y"], true).unwrap(),
        ])
    }

    fn runner_with(kv: Arc<dyn KeyValueStore>) -> QuizRunner<RecordingSink> {
        QuizRunner::with_parts(
            bank(),
            QuizSettings::default(),
            HistoryStore::new(kv),
            RecordingSink::new(),
            fixed_clock(),
            Shuffler::seeded(9),
        )
        .unwrap()
    }

    fn runner() -> QuizRunner<RecordingSink> {
        runner_with(Arc::new(InMemoryStore::new()))
    }

    fn first_correct(runner: &QuizRunner<RecordingSink>) -> Vec<OptionId> {
        let question = runner.session().current_question().unwrap();
        question
            .option_ids()
            .filter(|id| {
                question
                    .option(*id)
                    .is_some_and(|text| question.correct_answers().iter().any(|c| c == text))
            })
            .collect()
    }

    #[tokio::test]
    async fn start_renders_question_and_timer() {
        let mut runner = runner();
        runner.start();
        let sink = runner.sink();
        assert_eq!(sink.last_timer(), Some(5400));
        let shown = sink.last_question().unwrap();
        assert_eq!(shown.options.len(), runner.session().option_order().len());
        assert!(runner.timer().is_running());
    }

    #[tokio::test]
    async fn empty_submit_notifies_and_keeps_state() {
        let mut runner = runner();
        runner.start();
        let before = runner.session().state();

        assert!(runner.submit().is_err());
        assert_eq!(runner.sink().notices(), vec![Notice::SelectAtLeastOne]);
        assert_eq!(runner.session().state(), before);
    }

    #[tokio::test]
    async fn submit_locks_options_and_shows_feedback() {
        let mut runner = runner();
        runner.start();
        let correct = first_correct(&runner);
        for id in &correct {
            runner.toggle_option(*id).unwrap();
        }
        runner.sink_mut().clear();

        let feedback = runner.submit().unwrap();
        assert!(feedback.correct);

        let sink = runner.sink();
        let option_count = runner.session().option_order().len();
        let disabled = sink.count(|c| matches!(c, SinkCall::Highlight(_, OptionState::Disabled)));
        assert_eq!(disabled, option_count);
        let marked_correct = sink.count(|c| matches!(c, SinkCall::Highlight(_, OptionState::Correct)));
        assert_eq!(marked_correct, correct.len());
        assert!(matches!(sink.calls.last(), Some(SinkCall::Feedback(_))));
    }

    #[tokio::test]
    async fn toggle_repaints_changed_options() {
        let mut runner = runner();
        runner.start();
        let Some(view) = runner.session().current_view() else {
            panic!("no question");
        };
        let first = view.options[0].id;
        let second = view.options[1].id;
        runner.sink_mut().clear();

        runner.toggle_option(first).unwrap();
        runner.toggle_option(second).unwrap();
        let highlights: Vec<_> = runner
            .sink()
            .calls
            .iter()
            .filter(|c| matches!(c, SinkCall::Highlight(..)))
            .cloned()
            .collect();

        if view.allows_multiple {
            assert_eq!(
                highlights,
                vec![
                    SinkCall::Highlight(first, OptionState::Selected),
                    SinkCall::Highlight(second, OptionState::Selected),
                ]
            );
        } else {
            assert_eq!(highlights.len(), 3);
            assert!(highlights.contains(&SinkCall::Highlight(first, OptionState::Idle)));
        }
    }

    #[tokio::test]
    async fn finish_early_records_and_shows_result() {
        let mut runner = runner();
        runner.start();
        runner.clock_mut().advance(chrono::Duration::seconds(75));

        let record = runner.finish_early().await.unwrap();
        assert_eq!(record.score(), 0);
        assert_eq!(record.total(), 2);
        assert_eq!(record.duration_secs(), 75);
        assert!(!runner.timer().is_running());

        let result = runner.sink().last_result().unwrap();
        assert_eq!(result.history.len(), 1);
        assert_eq!(runner.history().await.len(), 1);
        assert!(runner.finish_early().await.is_err());
    }

    #[tokio::test]
    async fn stale_and_post_finish_events_are_ignored() {
        let mut runner = runner();
        runner.start();
        let epoch = runner.timer().epoch();

        let stale = TimerEvent {
            epoch: epoch - 1,
            tick: CountdownTick::Expired,
        };
        assert_eq!(runner.handle_timer_event(stale).await, TimerOutcome::Ignored);
        assert!(!runner.is_finished());

        let tick = TimerEvent {
            epoch,
            tick: CountdownTick::Running { remaining: 10 },
        };
        assert_eq!(
            runner.handle_timer_event(tick).await,
            TimerOutcome::Ticked { remaining: 10 }
        );
        assert_eq!(runner.session().remaining_secs(), 10);

        runner.finish_early().await.unwrap();
        let late = TimerEvent {
            epoch,
            tick: CountdownTick::Expired,
        };
        assert_eq!(runner.handle_timer_event(late).await, TimerOutcome::Ignored);
        assert_eq!(runner.history().await.len(), 1);
    }

    #[tokio::test]
    async fn expiry_notifies_and_finishes() {
        let mut runner = runner();
        runner.start();
        let event = TimerEvent {
            epoch: runner.timer().epoch(),
            tick: CountdownTick::Expired,
        };

        let TimerOutcome::Expired(record) = runner.handle_timer_event(event).await else {
            panic!("expected expiry");
        };
        assert_eq!(record.score(), 0);
        assert!(runner.sink().notices().contains(&Notice::TimeUp));
        assert!(runner.is_finished());
    }

    #[tokio::test]
    async fn restart_starts_a_new_timer_epoch() {
        let mut runner = runner();
        runner.start();
        assert!(runner.restart().is_err());

        runner.finish_early().await.unwrap();
        let old_epoch = runner.timer().epoch();
        runner.restart().unwrap();

        assert_eq!(runner.timer().epoch(), old_epoch + 1);
        assert_eq!(runner.session().score(), 0);
        assert!(!runner.is_finished());
    }

    #[tokio::test]
    async fn clear_history_refreshes_result() {
        let mut runner = runner();
        runner.start();
        runner.finish_early().await.unwrap();

        runner.clear_history().await.unwrap();
        assert!(runner.history().await.is_empty());
        assert!(runner.sink().notices().contains(&Notice::HistoryCleared));
        assert!(runner.sink().last_result().unwrap().history.is_empty());
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }

        async fn put(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Connection("read-only".into()))
        }
    }

    #[tokio::test]
    async fn write_failure_still_shows_result() {
        let mut runner = runner_with(Arc::new(ReadOnlyStore));
        runner.start();

        let record = runner.finish_early().await.unwrap();
        let result = runner.sink().last_result().unwrap();
        assert_eq!(result.score, record.score());
        assert!(result.history.is_empty());
        assert!(runner.is_finished());

        assert!(matches!(
            runner.clear_history().await,
            Err(SessionError::Storage(_))
        ));
    }
}
