use std::time::Duration;

use category_quiz::{
    EngineState, EventLog, JsonFileStore, KeyValueStore, MemoryStore, Outcome, PersistenceError,
    QuestionBank, QuizConfig, QuizEngine, ScoreStore, Signal,
};
use tokio::sync::mpsc::UnboundedReceiver;

const DOC: &str = r#"{
    "css": [
        {"question": "Which property sets text color?", "options": ["color", "font", "fill"], "answer": "color"},
        {"question": "Which unit is relative to the root font size?", "options": ["em", "rem", "px", "vh"], "answer": "rem"}
    ],
    "javascript": [
        {"question": "typeof null?", "options": ["object", "null", "undefined"], "answer": "object"},
        {"question": "Strict equality operator?", "options": ["==", "===", "="], "answer": "==="},
        {"question": "Array method that adds to the end?", "options": ["push", "shift", "pop"], "answer": "push"}
    ]
}"#;

struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
        Err(PersistenceError::Unavailable("read-only medium".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("read-only medium".to_string()))
    }
}

fn build<S: KeyValueStore>(
    store: S,
    config: QuizConfig,
) -> (QuizEngine<EventLog, S>, UnboundedReceiver<Signal>) {
    QuizEngine::new(
        config,
        QuestionBank::from_json_str(DOC),
        ScoreStore::new(store),
        EventLog::new(),
    )
}

fn choice<S: KeyValueStore>(engine: &QuizEngine<EventLog, S>, correct: bool) -> usize {
    let session = engine.session().expect("session in progress");
    let answer = &session.current_question().expect("question on screen").answer;
    session
        .choices()
        .iter()
        .position(|c| (c == answer) == correct)
        .expect("matching choice")
}

async fn answer<S: KeyValueStore>(
    engine: &mut QuizEngine<EventLog, S>,
    rx: &mut UnboundedReceiver<Signal>,
    correct: bool,
) {
    let index = choice(engine, correct);
    engine.select_choice(index).unwrap();
    engine.submit().unwrap();
    wait_for_advance(engine, rx).await;
}

async fn wait_for_advance<S: KeyValueStore>(
    engine: &mut QuizEngine<EventLog, S>,
    rx: &mut UnboundedReceiver<Signal>,
) {
    loop {
        let signal = rx.recv().await.unwrap();
        engine.handle_signal(signal);
        if matches!(signal, Signal::Advance { .. }) {
            return;
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_css_all_correct_updates_best_score() {
    let mut store = MemoryStore::new();
    store.set("best_score.css", "1").unwrap();
    let (mut engine, mut rx) = build(store, QuizConfig::default().with_seed(5));

    engine.start_category("css").unwrap();
    answer(&mut engine, &mut rx, true).await;
    answer(&mut engine, &mut rx, true).await;

    let summary = engine.presenter().summary().unwrap();
    assert_eq!(summary.score, 2);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.best_score, 2);
    assert_eq!(engine.best_score("css"), 2);
    assert!(engine.presenter().ticks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_lower_score_keeps_previous_best() {
    let mut store = MemoryStore::new();
    store.set("best_score.css", "5").unwrap();
    let (mut engine, mut rx) = build(store, QuizConfig::default().with_seed(5));

    engine.start_category("css").unwrap();
    answer(&mut engine, &mut rx, true).await;
    answer(&mut engine, &mut rx, true).await;

    assert_eq!(engine.presenter().summary().unwrap().best_score, 5);
}

#[tokio::test(start_paused = true)]
async fn test_javascript_timeout_correct_incorrect_scores_one() {
    let (mut engine, mut rx) = build(MemoryStore::new(), QuizConfig::default().with_seed(8));
    engine.start_category("javascript").unwrap();

    wait_for_advance(&mut engine, &mut rx).await;
    answer(&mut engine, &mut rx, true).await;
    answer(&mut engine, &mut rx, false).await;

    let outcomes: Vec<_> = engine
        .presenter()
        .feedback()
        .iter()
        .map(|f| f.outcome)
        .collect();
    assert_eq!(
        outcomes,
        vec![Outcome::TimeUp, Outcome::Correct, Outcome::Incorrect]
    );
    assert_eq!(engine.presenter().ticks(), (0..15).rev().collect::<Vec<u32>>());

    let summary = engine.presenter().summary().unwrap();
    assert_eq!(summary.score, 1);
    assert_eq!(summary.total, 3);
    assert!(matches!(engine.state(), EngineState::Completed(_)));
}

#[tokio::test(start_paused = true)]
async fn test_expiry_never_scores() {
    let config = QuizConfig::default().with_seed(2).with_time_limit(3);
    let (mut engine, mut rx) = build(MemoryStore::new(), config);
    engine.start_category("javascript").unwrap();

    for _ in 0..3 {
        wait_for_advance(&mut engine, &mut rx).await;
    }

    let summary = engine.presenter().summary().unwrap();
    assert_eq!(summary.score, 0);
    assert!(
        engine
            .presenter()
            .feedback()
            .iter()
            .all(|f| f.outcome == Outcome::TimeUp && f.score == 0)
    );
}

#[tokio::test(start_paused = true)]
async fn test_any_play_scores_within_bounds() {
    for seed in 0..8u64 {
        let config = QuizConfig::default()
            .with_seed(seed)
            .with_explicit_submit(false)
            .with_feedback_delay(Duration::from_millis(10));
        let (mut engine, mut rx) = build(MemoryStore::new(), config);
        engine.start_category("javascript").unwrap();

        for question in 0..3u64 {
            let index = ((seed + question) % 3) as usize;
            engine.select_choice(index).unwrap();
            wait_for_advance(&mut engine, &mut rx).await;
        }

        let summary = engine.presenter().summary().unwrap();
        assert!(summary.score <= summary.total);
        assert_eq!(summary.total, 3);
    }
}

#[tokio::test(start_paused = true)]
async fn test_best_score_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    {
        let (mut engine, mut rx) = build(
            JsonFileStore::in_dir(dir.path()),
            QuizConfig::default().with_seed(3),
        );
        engine.start_category("css").unwrap();
        answer(&mut engine, &mut rx, true).await;
        answer(&mut engine, &mut rx, false).await;
        assert_eq!(engine.presenter().summary().unwrap().best_score, 1);
    }

    let (engine, _rx) = build(JsonFileStore::in_dir(dir.path()), QuizConfig::default());
    assert_eq!(engine.best_score("css"), 1);
    assert_eq!(engine.best_score("javascript"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_options_are_reshuffled_between_sessions() {
    let (mut engine, mut rx) = build(MemoryStore::new(), QuizConfig::default().with_seed(13));
    let mut orders = Vec::new();

    for _ in 0..10 {
        engine.start_category("css").unwrap();
        let question = engine.presenter().last_question().unwrap().clone();
        orders.push((question.text, question.choices));

        answer(&mut engine, &mut rx, true).await;
        answer(&mut engine, &mut rx, true).await;
    }

    let distinct: std::collections::HashSet<_> = orders.iter().collect();
    assert!(distinct.len() > 1);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_store_still_completes_session() {
    let (mut engine, mut rx) = build(UnavailableStore, QuizConfig::default().with_seed(4));
    assert_eq!(engine.best_score("css"), 0);

    engine.start_category("css").unwrap();
    answer(&mut engine, &mut rx, true).await;
    answer(&mut engine, &mut rx, false).await;

    let summary = engine.presenter().summary().unwrap();
    assert_eq!(summary.score, 1);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.best_score, 1);
    assert!(matches!(engine.state(), EngineState::Completed(_)));
    assert_eq!(engine.best_score("css"), 1);

    engine.start_category("css").unwrap();
    answer(&mut engine, &mut rx, false).await;
    answer(&mut engine, &mut rx, false).await;
    assert_eq!(engine.presenter().summary().unwrap().score, 0);
    assert_eq!(engine.presenter().summary().unwrap().best_score, 1);
}
