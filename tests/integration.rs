//! Integration tests for Effort Grid
//!
//! These tests run whole recording sessions through the live capture path
//! (timing machine, prompts, quit confirmation) with a scripted typist, write
//! a real record file and analyse it again.

use assert_matches::assert_matches;
use effort_grid::analysis::{EffortMode, EffortReport, RecordReader};
use effort_grid::config::Config;
use effort_grid::fingers::Hand;
use effort_grid::keyboard::{
    KeyCode, KeyEvent, KeyEventSource, KeyEventType, Modifier, SourceError,
};
use effort_grid::recording::{
    Capture, CaptureOutcome, CaptureRequest, KeyboardCapture, RecordError, RecordFile, Session,
    SessionSettings, TimingSample,
};
use effort_grid::report::SessionOutcome;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const STEP: Duration = Duration::from_millis(10);

const CONFIG: &str = r#"
[session]
trigrams_per_char = 2
trigram_repeat_times = 2

[ready]
left = "fds"
right = "jkl"

[analysis]
use_n_best = 2

[left]
index = "f"
middle = "d"
ring = "s"
pinky = "a"

[right]
index = "j"
middle = "k"
ring = "l"
pinky = ";"
"#;

type Queue = Rc<RefCell<VecDeque<KeyEvent>>>;

/// Source reading from a queue the typist fills; nothing is stale
struct QueueSource(Queue);

impl KeyEventSource for QueueSource {
    fn recv(&mut self) -> Result<KeyEvent, SourceError> {
        self.0.borrow_mut().pop_front().ok_or(SourceError::ListenerClosed)
    }

    fn drain(&mut self) -> usize {
        0
    }
}

/// Types whatever the session asks for, one key every 10 ms, optionally
/// hitting Ctrl+C on chosen captures
struct Typist {
    inner: KeyboardCapture<QueueSource, Cursor<Vec<u8>>, Vec<u8>>,
    queue: Queue,
    now: Instant,
    captures: usize,
    cancel_on: Vec<usize>,
}

impl Typist {
    fn new(answers: &str, cancel_on: Vec<usize>) -> Self {
        let queue: Queue = Rc::default();
        let inner = KeyboardCapture::new(
            QueueSource(queue.clone()),
            Cursor::new(answers.as_bytes().to_vec()),
            Vec::new(),
            Modifier::Ctrl,
            'c',
            "quit",
        );
        Self {
            inner,
            queue,
            now: Instant::now(),
            captures: 0,
            cancel_on,
        }
    }

    fn push(&mut self, key: KeyCode, event_type: KeyEventType) {
        self.now += STEP;
        self.queue
            .borrow_mut()
            .push_back(KeyEvent::new(key, event_type, self.now));
    }

    fn tap(&mut self, text: &str) {
        for c in text.chars() {
            let key = KeyCode::for_char(c).unwrap();
            self.push(key, KeyEventType::Press);
            self.push(key, KeyEventType::Release);
        }
    }

    fn output(self) -> String {
        let (_, _, out) = self.inner.into_parts();
        String::from_utf8(out).unwrap()
    }
}

impl Capture for Typist {
    fn capture(&mut self, request: &CaptureRequest) -> Result<CaptureOutcome, RecordError> {
        self.captures += 1;
        if self.cancel_on.contains(&self.captures) {
            self.tap(&request.ready[..1]);
            self.push(KeyCode(29), KeyEventType::Press);
            self.push(KeyCode::for_char('c').unwrap(), KeyEventType::Press);
        } else {
            let text = format!("{}{}{}", request.ready, request.target, request.ready);
            self.tap(&text);
        }
        self.inner.capture(request)
    }

    fn confirm_quit(&mut self) -> Result<bool, RecordError> {
        self.inner.confirm_quit()
    }
}

fn load_config(dir: &Path) -> Config {
    let path = dir.join("config.toml");
    std::fs::write(&path, CONFIG).unwrap();
    Config::load_from(&path).unwrap()
}

// ---------------------------------------------------------------------------
// Full session tests
// ---------------------------------------------------------------------------

#[test]
fn full_session_writes_record_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(dir.path());
    let map = config.hand_finger_map().unwrap();
    let record_path = dir.path().join("record.txt");
    let mut sink = RecordFile::create(&record_path, false).unwrap();
    let mut typist = Typist::new("", Vec::new());

    let session = Session::new(SessionSettings::from_config(&config));
    let summary = session
        .run(&map, &mut StdRng::seed_from_u64(1), &mut typist, &mut sink, &mut Vec::new())
        .unwrap();

    assert_eq!(summary.outcome, SessionOutcome::Completed);
    assert_eq!(summary.chars_total, 8);
    assert_eq!(summary.trigrams_recorded, 16);
    assert_eq!(summary.repetitions_recorded, 32);
    assert_eq!(typist.captures, 32);

    // Target (3 taps) plus end sequence (3 taps), 2 events per tap
    let records = RecordReader::new(config.analysis.use_n_best)
        .read(&record_path)
        .unwrap();
    assert_eq!(records.len(), 16);
    for record in &records {
        assert_eq!(record.timings.len(), 2);
        for t in &record.timings {
            assert!((t - 0.12).abs() < 1e-9, "unexpected timing {}", t);
        }
        let target = record.trigram.target();
        let hand = map.locate(target).unwrap().hand;
        for c in record.trigram.chars() {
            assert_eq!(map.locate(c).unwrap().hand, hand);
        }
    }

    let out = typist.output();
    assert!(out.contains("OK!"));
    assert!(out.contains("with LEFT hand"));
    assert!(out.contains("with RIGHT hand"));
}

#[test]
fn recorded_file_feeds_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(dir.path());
    let map = config.hand_finger_map().unwrap();
    let record_path = dir.path().join("record.txt");
    let mut sink = RecordFile::create(&record_path, false).unwrap();

    Session::new(SessionSettings::from_config(&config))
        .run(
            &map,
            &mut StdRng::seed_from_u64(3),
            &mut Typist::new("", Vec::new()),
            &mut sink,
            &mut Vec::new(),
        )
        .unwrap();

    let records = RecordReader::new(config.analysis.use_n_best)
        .read(&record_path)
        .unwrap();
    let report = EffortReport::estimate(
        &records,
        &map,
        |hand| config.analysis.bias(hand),
        EffortMode::Average,
    )
    .unwrap();

    assert!((report.min - 0.12).abs() < 1e-9);
    let mut out = Vec::new();
    report.write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Hand: left"));
    assert!(text.contains("Char ;: 1.00  color: #"));
}

#[test]
fn declined_quit_retries_capture() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(dir.path());
    let map = config.hand_finger_map().unwrap();
    let mut sink: Vec<TimingSample> = Vec::new();
    let mut typist = Typist::new("no\n", vec![2]);

    let summary = Session::new(SessionSettings::from_config(&config))
        .run(&map, &mut StdRng::seed_from_u64(5), &mut typist, &mut sink, &mut Vec::new())
        .unwrap();

    assert_eq!(summary.outcome, SessionOutcome::Completed);
    assert_eq!(sink.len(), 16);
    assert_eq!(typist.captures, 33);
    assert!(typist.output().contains("Ctrl+C pressed"));
}

#[test]
fn confirmed_quit_keeps_finished_lines() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(dir.path());
    let map = config.hand_finger_map().unwrap();
    let record_path = dir.path().join("record.txt");
    let mut sink = RecordFile::create(&record_path, false).unwrap();
    // Captures 1-2 finish the first trigram, 3 finishes half of the second
    let mut typist = Typist::new("quit\n", vec![4]);

    let summary = Session::new(SessionSettings::from_config(&config))
        .run(&map, &mut StdRng::seed_from_u64(8), &mut typist, &mut sink, &mut Vec::new())
        .unwrap();

    assert_eq!(summary.outcome, SessionOutcome::Cancelled);
    assert_eq!(summary.trigrams_recorded, 1);
    let contents = std::fs::read_to_string(&record_path).unwrap();
    assert_eq!(contents.lines().count(), 1);
    assert!(contents.ends_with('\n'));
}

#[test]
fn exhausted_typist_is_a_source_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config(dir.path());
    let queue: Queue = Rc::default();
    let mut capture = KeyboardCapture::new(
        QueueSource(queue),
        Cursor::new(Vec::new()),
        Vec::new(),
        config.ready.cancel_modifier,
        config.ready.cancel_key,
        config.ready.confirm_word.clone(),
    );
    let request = CaptureRequest {
        target: "dfs".to_string(),
        ready: config.ready.sequence(Hand::Left).to_string(),
        hand: Hand::Left,
        progress: "(1/1)".to_string(),
    };
    assert_matches!(
        capture.capture(&request),
        Err(RecordError::Source(SourceError::ListenerClosed))
    );
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[test]
fn default_config_round_trips_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    Config::default().save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    let map = loaded.hand_finger_map().unwrap();
    assert_eq!(map.total_chars(), 30);
    assert_eq!(loaded.ready.sequence(Hand::Left), "fds");
}

#[test]
fn record_file_refuses_to_clobber() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("record.txt");
    std::fs::write(&path, "abc 0.1\n").unwrap();
    assert!(RecordFile::create(&path, false).is_err());
    assert!(RecordFile::create(&path, true).is_ok());
}
