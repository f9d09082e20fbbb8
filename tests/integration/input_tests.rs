//! Input reader → command queue, driven through the public API.

use std::sync::Arc;

use trafficlight::adapters::time::MonotonicClock;
use trafficlight::app::context::SharedContext;
use trafficlight::app::input::{InputReader, MAX_CHARS_PER_POLL, QueueForwarder};
use trafficlight::app::queue::{COMMAND_QUEUE_DEPTH, CommandQueue, MAX_LINE_LEN};
use trafficlight::config::ControllerConfig;

use crate::mock_hw::ScriptedSource;

struct Rig {
    input: ScriptedSource,
    queue: Arc<CommandQueue>,
    ctx: Arc<SharedContext>,
    reader: InputReader<ScriptedSource, QueueForwarder>,
}

fn rig(config: &ControllerConfig) -> Rig {
    let input = ScriptedSource::new();
    let queue = Arc::new(CommandQueue::new());
    let ctx = Arc::new(SharedContext::new(config.debug_at_boot));
    let reader = InputReader::new(
        input.clone(),
        QueueForwarder::new(queue.clone()),
        ctx.clone(),
        MonotonicClock::new(),
        config,
        Some(config.debug_toggle),
    );
    Rig {
        input,
        queue,
        ctx,
        reader,
    }
}

fn drain(queue: &CommandQueue) -> Vec<String> {
    std::iter::from_fn(|| queue.try_pop())
        .map(|l| l.as_str().to_string())
        .collect()
}

#[test]
fn line_assembled_across_polls() {
    let mut r = rig(&ControllerConfig::default());
    r.input.send("R,10");
    r.reader.poll();
    assert!(r.queue.is_empty());
    assert_eq!(r.reader.pending(), "R,10");

    r.input.send("00 G\n");
    r.reader.poll();
    assert_eq!(drain(&r.queue), vec!["R,1000 G"]);
}

#[test]
fn blank_lines_push_nothing() {
    let mut r = rig(&ControllerConfig::default());
    r.input.send("\n\r\r\n");
    r.reader.poll();
    assert!(r.queue.is_empty());
}

#[test]
fn overlong_line_truncated_to_capacity() {
    let mut r = rig(&ControllerConfig::default());
    let long = "G,1 ".repeat(40);
    r.input.send(&long);
    r.input.send("\n");
    while r.reader.poll() > 0 {}

    let lines = drain(&r.queue);
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].len(), MAX_LINE_LEN);
}

#[test]
fn poll_is_bounded() {
    let mut r = rig(&ControllerConfig::default());
    r.input.send(&"R".repeat(MAX_CHARS_PER_POLL * 2));
    assert_eq!(r.reader.poll(), MAX_CHARS_PER_POLL);
    assert_eq!(r.reader.poll(), MAX_CHARS_PER_POLL);
    assert_eq!(r.reader.poll(), 0);
}

#[test]
fn toggle_char_flips_debug_and_is_not_buffered() {
    let mut r = rig(&ControllerConfig::default());
    assert!(r.ctx.debug.is_enabled());

    r.input.send("G,5d\n");
    r.reader.poll();
    assert!(!r.ctx.debug.is_enabled());
    assert_eq!(drain(&r.queue), vec!["G,5"]);
}

#[test]
fn full_queue_drops_excess_lines() {
    let mut r = rig(&ControllerConfig::default());
    for i in 0..COMMAND_QUEUE_DEPTH + 4 {
        r.input.send(&format!("R,{i}\n"));
    }
    while r.reader.poll() > 0 {}

    assert_eq!(r.reader.consumer().dropped(), 4);
    let lines = drain(&r.queue);
    assert_eq!(lines.len(), COMMAND_QUEUE_DEPTH);
    assert_eq!(lines[0], "R,0");
}
