//! Integration tests for source scheduling and render coordination.
//!
//! These tests drive sources through a running `Program` and check what the
//! output receives.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use bstatus_framework::{
    Output, Program, ProgramHandle, Repeat, Result, SampleError, Sampler, Source, SourceView,
    StatusError,
};
use tokio::task::JoinHandle;

type Renders = Arc<Mutex<Vec<Vec<SourceView>>>>;

/// Output that records every render.
struct RecordingOutput {
    renders: Renders,
}

impl RecordingOutput {
    fn new() -> (Self, Renders) {
        let renders = Renders::default();
        (
            Self {
                renders: renders.clone(),
            },
            renders,
        )
    }
}

impl Output for RecordingOutput {
    fn display(&mut self, sources: &[SourceView]) -> Result<()> {
        self.renders.lock().push(sources.to_vec());
        Ok(())
    }
}

/// Output that fails after `remaining` successful renders.
struct FailingOutput {
    remaining: usize,
}

impl Output for FailingOutput {
    fn display(&mut self, _sources: &[SourceView]) -> Result<()> {
        if self.remaining == 0 {
            return Err(StatusError::output("broken pipe"));
        }
        self.remaining -= 1;
        Ok(())
    }
}

/// Output whose input task never finishes on its own.
struct ListeningOutput;

impl Output for ListeningOutput {
    fn attach(&mut self, _program: ProgramHandle) -> Option<JoinHandle<()>> {
        Some(tokio::spawn(std::future::pending()))
    }

    fn display(&mut self, _sources: &[SourceView]) -> Result<()> {
        Ok(())
    }
}

/// Sampler that fails on the first call and counts its calls afterwards.
struct Flaky {
    calls: Arc<AtomicUsize>,
}

impl Sampler for Flaky {
    async fn sample(&mut self) -> std::result::Result<Option<String>, SampleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            return Err(SampleError::parse("/proc/stat", "no cpu line"));
        }
        Ok(Some(format!("tick {call}")))
    }
}

fn texts(view: &[SourceView]) -> Vec<String> {
    view.iter()
        .map(|v| v.runs.iter().map(|r| r.text.as_str()).collect())
        .collect()
}

fn sources(n: usize) -> Vec<Arc<Source>> {
    (0..n)
        .map(|i| Arc::new(Source::new(format!("source{i}"))))
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_set_output_renders_immediately() {
    let (output, renders) = RecordingOutput::new();
    let mut program = Program::new();
    for source in sources(2) {
        program.add_source(source);
    }

    program.set_output(Box::new(output)).unwrap();

    let renders = renders.lock();
    assert_eq!(renders.len(), 1);
    assert_eq!(renders[0].len(), 2);
    assert!(renders[0].iter().all(SourceView::is_empty));
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_changes_renders_once_in_order() {
    let (output, renders) = RecordingOutput::new();
    let mut program = Program::new().with_defer_timeout(Duration::from_millis(10));
    let sources = sources(3);
    for source in &sources {
        program.add_source(source.clone());
    }
    program.set_output(Box::new(output)).unwrap();

    let task = tokio::spawn(program.run());
    for (i, source) in sources.iter().enumerate().rev() {
        source.set_text(&format!("value {i}")).unwrap();
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    {
        let renders = renders.lock();
        assert_eq!(renders.len(), 2);
        assert_eq!(texts(&renders[1]), ["value 0", "value 1", "value 2"]);
    }
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_render_reads_latest_state() {
    let (output, renders) = RecordingOutput::new();
    let mut program = Program::new().with_defer_timeout(Duration::from_millis(10));
    let source = Arc::new(Source::new("clock"));
    program.add_source(source.clone());
    program.set_output(Box::new(output)).unwrap();

    let task = tokio::spawn(program.run());
    source.set_text("12:00").unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    source.set_text("12:01").unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    {
        let renders = renders.lock();
        assert_eq!(renders.len(), 2);
        assert_eq!(texts(&renders[1]), ["12:01"]);
    }
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_clicks_are_routed_by_index() {
    let (output, _renders) = RecordingOutput::new();
    let mut program = Program::new();
    let sources = sources(2);
    for source in &sources {
        program.add_source(source.clone());
    }
    let clicks = Arc::new(AtomicUsize::new(0));
    let seen = clicks.clone();
    sources[1].on_click(move |button| {
        seen.fetch_add(usize::from(button), Ordering::SeqCst);
    });
    program.set_output(Box::new(output)).unwrap();

    let handle = program.handle();
    let task = tokio::spawn(program.run());
    handle.click(7, 1);
    handle.click(1, 3);
    handle.click(0, 1);
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(clicks.load(Ordering::SeqCst), 3);
    assert!(!task.is_finished());
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_output_failure_ends_run() {
    let mut program = Program::new();
    let source = Arc::new(Source::new("a"));
    program.add_source(source.clone());
    program
        .set_output(Box::new(FailingOutput { remaining: 1 }))
        .unwrap();

    source.set_text("x").unwrap();
    let result = program.run().await;
    assert!(matches!(result, Err(StatusError::Output(_))));
}

#[tokio::test(start_paused = true)]
async fn test_repeat_recovers_after_error() {
    let (output, renders) = RecordingOutput::new();
    let mut program = Program::new();
    let source = Arc::new(Source::new("cpu"));
    program.add_source(source.clone());
    program.set_output(Box::new(output)).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let repeat = Repeat::new(
        source.clone(),
        Flaky {
            calls: calls.clone(),
        },
        Duration::from_secs(1),
    );
    let program_task = tokio::spawn(program.run());
    let repeat_task = repeat.spawn();

    tokio::time::sleep(Duration::from_millis(10)).await;
    {
        let renders = renders.lock();
        let last = renders.last().unwrap();
        assert_eq!(texts(last), ["Failed to parse /proc/stat: no cpu line"]);
    }

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert!(calls.load(Ordering::SeqCst) >= 2);
    assert!(source.view().runs[0].text.starts_with("tick "));
    assert_eq!(source.view().runs[0].color, None);

    repeat_task.abort();
    program_task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_trigger_replaces_pending_timer() {
    let source = Arc::new(Source::new("clock"));
    let calls = Arc::new(AtomicUsize::new(0));
    let repeat = Repeat::new(
        source.clone(),
        Flaky {
            calls: calls.clone(),
        },
        Duration::from_secs(3600),
    );
    let handle = repeat.handle();
    let task = repeat.spawn();

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    handle.trigger();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(source.view().runs[0].text, "tick 1");

    source.click(1);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    task.abort();
}

#[tokio::test]
async fn test_set_output_hands_back_input_task() {
    let mut program = Program::new();
    let input = program
        .set_output(Box::new(ListeningOutput))
        .unwrap()
        .expect("input task");
    assert!(!input.is_finished());

    input.abort();
    assert!(input.await.unwrap_err().is_cancelled());

    let mut program = Program::new();
    let (output, _) = RecordingOutput::new();
    assert!(program.set_output(Box::new(output)).unwrap().is_none());
}
