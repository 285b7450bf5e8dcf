use std::sync::Arc;

use quiz_core::model::{AttemptRecord, Question, QuestionBank, QuizSettings};
use quiz_core::time::{fixed_clock, fixed_now};
use quiz_core::CountdownTick;
use services::{
    AdvanceOutcome, QuizRunner, RecordingSink, SessionPhase, Shuffler, TimerEvent, TimerOutcome,
};
use storage::{HistoryStore, InMemoryStore};

fn bank() -> QuestionBank {
    QuestionBank::new(vec![
        Question::new(
            "Which command creates an HTTP(S) load balancer backend service?",
            [
                "gcloud compute backend-services create web \\\n--global",
                "gcloud compute instances create web",
                "gcloud compute networks create web",
            ],
            ["gcloud compute backend-services create web \\\n--global"],
            false,
        )
        .unwrap(),
        Question::new("Pick two", ["A", "B", "C", "D"], ["B", "D"], true).unwrap(),
        Question::new("Pick yes", ["yes", "no"], ["yes"], false).unwrap(),
    ])
}

fn runner(history: HistoryStore, duration_secs: u32) -> QuizRunner<RecordingSink> {
    QuizRunner::with_parts(
        bank(),
        QuizSettings::new(duration_secs).unwrap(),
        history,
        RecordingSink::new(),
        fixed_clock(),
        Shuffler::seeded(2024),
    )
    .unwrap()
}

fn correct_ids(runner: &QuizRunner<RecordingSink>) -> Vec<services::sessions::OptionView> {
    let view = runner.session().current_view().unwrap();
    let question = runner.session().current_question().unwrap();
    view.options
        .into_iter()
        .filter(|o| question.correct_answers().iter().any(|c| *c == o.text))
        .collect()
}

#[tokio::test]
async fn full_run_persists_exactly_one_record() {
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()));
    let mut runner = runner(history.clone(), 600);
    runner.start();

    let mut outcome = None;
    while outcome.is_none() {
        let picks = correct_ids(&runner);
        runner.submit_selection(picks.iter().map(|o| o.id)).unwrap();
        runner.clock_mut().advance(chrono::Duration::seconds(20));
        if let AdvanceOutcome::Finished(record) = runner.advance().await.unwrap() {
            outcome = Some(record);
        }
    }

    let record = outcome.unwrap();
    assert_eq!(record.score(), 3);
    assert_eq!(record.total(), 3);
    assert_eq!(record.duration_secs(), 60);
    assert_eq!(runner.session().phase(), SessionPhase::Finished);

    let stored = history.list().await;
    assert_eq!(stored, vec![record]);
    assert_eq!(runner.sink().last_result().unwrap().history.len(), 1);
    assert!(!runner.timer().is_running());
}

#[tokio::test(start_paused = true)]
async fn two_second_timer_expires_once_with_zero_score() {
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()));
    let mut runner = runner(history.clone(), 2);
    runner.start();

    let mut ticks = Vec::new();
    let record = loop {
        let event = runner.next_timer_event().await.unwrap();
        match runner.handle_timer_event(event).await {
            TimerOutcome::Expired(record) => break record,
            TimerOutcome::Ticked { remaining } => ticks.push(remaining),
            TimerOutcome::Ignored => {}
        }
    };

    assert_eq!(ticks, vec![1]);
    assert_eq!(record.score(), 0);
    assert_eq!(record.total(), 3);
    assert_eq!(runner.session().remaining_secs(), 0);
    assert_eq!(history.list().await.len(), 1);

    // A finished session never records a second attempt.
    let late = TimerEvent {
        epoch: runner.timer().epoch(),
        tick: CountdownTick::Expired,
    };
    assert_eq!(runner.handle_timer_event(late).await, TimerOutcome::Ignored);
    assert_eq!(history.list().await.len(), 1);
}

#[tokio::test]
async fn clear_history_then_append_starts_a_new_log() {
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()));
    for score in 0..3 {
        history
            .append(AttemptRecord::new(score, 3, fixed_now(), 30).unwrap())
            .await
            .unwrap();
    }

    let mut runner = runner(history.clone(), 600);
    runner.start();
    runner.finish_early().await.unwrap();
    assert_eq!(history.list().await.len(), 4);

    runner.clear_history().await.unwrap();
    assert!(history.list().await.is_empty());

    runner.restart().unwrap();
    runner.finish_early().await.unwrap();
    assert_eq!(history.list().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn stale_timer_event_after_restart_is_ignored() {
    let history = HistoryStore::new(Arc::new(InMemoryStore::new()));
    let mut runner = runner(history.clone(), 600);
    runner.start();
    let first_epoch = runner.timer().epoch();

    runner.finish_early().await.unwrap();
    runner.restart().unwrap();
    assert!(runner.timer().epoch() > first_epoch);

    let stale = TimerEvent {
        epoch: first_epoch,
        tick: CountdownTick::Expired,
    };
    assert_eq!(runner.handle_timer_event(stale).await, TimerOutcome::Ignored);
    assert_eq!(runner.session().phase(), SessionPhase::Answering);
    assert_eq!(history.list().await.len(), 1);

    let next = runner.next_timer_event().await.unwrap();
    assert!(matches!(
        runner.handle_timer_event(next).await,
        TimerOutcome::Ticked { remaining: 599 }
    ));
}
