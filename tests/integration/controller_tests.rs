//! End-to-end: serial input → dispatcher → actuators → GPIO.

use std::time::{Duration, Instant};

use trafficlight::adapters::time::MonotonicClock;
use trafficlight::app::controller::Controller;
use trafficlight::config::{ControllerConfig, InvalidTokenPolicy, OperatingMode};
use trafficlight::pins::{BLUE_GPIO, GREEN_GPIO, PAUSE_GPIO, RED_GPIO};

use crate::mock_hw::{RecordingGpio, RecordingSink, ScriptedSource, wait_until};

const WAIT: Duration = Duration::from_secs(5);

struct Rig {
    gpio: RecordingGpio,
    input: ScriptedSource,
    sink: std::sync::Arc<RecordingSink>,
    controller: Controller<RecordingGpio>,
}

fn start(config: ControllerConfig) -> Rig {
    let gpio = RecordingGpio::new();
    let input = ScriptedSource::new();
    let sink = RecordingSink::new();
    let controller = Controller::start(
        config,
        gpio.clone(),
        input.clone(),
        sink.clone(),
        MonotonicClock::new(),
    )
    .unwrap();
    Rig {
        gpio,
        input,
        sink,
        controller,
    }
}

fn sequences_done(rig: &Rig, n: usize) -> bool {
    wait_until(WAIT, || rig.sink.count_prefix("Sequence total duration") >= n)
}

#[test]
fn bring_up_configures_all_three_outputs() {
    let rig = start(ControllerConfig::default());
    assert_eq!(rig.gpio.configured(), vec![RED_GPIO, GREEN_GPIO, BLUE_GPIO]);
    assert!(rig.controller.is_running());
    assert_eq!(rig.controller.mode(), OperatingMode::Sequencer);
}

#[test]
fn red_then_green_never_overlap() {
    let rig = start(ControllerConfig::default());
    rig.input.send("R,200 G,300\n");
    assert!(sequences_done(&rig, 1));

    let red = rig.gpio.high_intervals(RED_GPIO);
    let green = rig.gpio.high_intervals(GREEN_GPIO);
    assert_eq!(red.len(), 1);
    assert_eq!(green.len(), 1);

    let (red_on, red_off) = red[0];
    let (green_on, green_off) = green[0];
    assert!(red_off - red_on >= Duration::from_millis(200));
    assert!(green_off - green_on >= Duration::from_millis(300));
    assert!(red_off <= green_on, "green lit before red went dark");
    assert!(!rig.gpio.ever_overlapped(RED_GPIO, GREEN_GPIO));
    assert_eq!(rig.controller.head().peak_active(), 1);
}

#[test]
fn tokens_execute_left_to_right() {
    let rig = start(ControllerConfig::default());
    rig.input.send("G,20 R,20 Y,20 G,20\n");
    assert!(sequences_done(&rig, 1));

    let order: Vec<String> = rig
        .sink
        .lines()
        .into_iter()
        .filter(|l| l.starts_with("Dispatcher: Color"))
        .collect();
    assert_eq!(
        order,
        vec![
            "Dispatcher: Color G for 20 ms",
            "Dispatcher: Color R for 20 ms",
            "Dispatcher: Color Y for 20 ms",
            "Dispatcher: Color G for 20 ms",
        ]
    );
    assert_eq!(rig.sink.count_prefix("RED task duration:"), 1);
    assert_eq!(rig.sink.count_prefix("YELLOW task duration:"), 1);
    assert_eq!(rig.sink.count_prefix("GREEN task duration:"), 2);
    assert_eq!(rig.controller.head().overlap_count(), 0);
}

#[test]
fn lines_run_in_arrival_order() {
    let rig = start(ControllerConfig::default());
    rig.input.send("R,30\n");
    rig.input.send("G,30\r");
    assert!(sequences_done(&rig, 2));

    let red = rig.gpio.high_intervals(RED_GPIO);
    let green = rig.gpio.high_intervals(GREEN_GPIO);
    assert!(red[0].1 <= green[0].0);
}

#[test]
fn yellow_lights_red_and_green_together() {
    let rig = start(ControllerConfig::default());
    rig.input.send("Y,60\n");
    assert!(sequences_done(&rig, 1));

    let red = rig.gpio.high_intervals(RED_GPIO);
    let green = rig.gpio.high_intervals(GREEN_GPIO);
    assert_eq!(red.len(), 1);
    assert_eq!(green.len(), 1);
    assert!(rig.gpio.ever_overlapped(RED_GPIO, GREEN_GPIO));
    assert!(rig.gpio.high_intervals(BLUE_GPIO).is_empty());
}

#[test]
fn malformed_line_is_dropped_and_pipeline_continues() {
    let rig = start(ControllerConfig::default());
    rig.input.send("R,100 X,5\n");
    rig.input.send("G,abc\n");
    rig.input.send("G,20\n");
    assert!(sequences_done(&rig, 1));

    assert!(rig.gpio.high_intervals(RED_GPIO).is_empty());
    assert_eq!(rig.gpio.high_intervals(GREEN_GPIO).len(), 1);
    assert_eq!(rig.sink.count_prefix("Parse error"), 2);
}

#[test]
fn skip_token_policy_runs_valid_tokens() {
    let rig = start(ControllerConfig {
        invalid_token_policy: InvalidTokenPolicy::SkipToken,
        ..ControllerConfig::default()
    });
    rig.input.send("R,20 Q,10 G,20\n");
    assert!(sequences_done(&rig, 1));

    assert_eq!(rig.gpio.high_intervals(RED_GPIO).len(), 1);
    assert_eq!(rig.gpio.high_intervals(GREEN_GPIO).len(), 1);
    assert_eq!(
        rig.sink.count_prefix("Dispatch error: no actuator for color 'Q'"),
        1
    );
}

#[test]
fn debug_off_emits_nothing() {
    let rig = start(ControllerConfig {
        debug_at_boot: false,
        ..ControllerConfig::default()
    });
    rig.input.send("R,20 G,20\n");

    // No status output to wait on; wait for the lamps instead.
    assert!(wait_until(WAIT, || rig.gpio.high_intervals(GREEN_GPIO).len() == 1
        && !rig.gpio.level(GREEN_GPIO)));
    assert!(wait_until(WAIT, || rig.controller.diagnostics().discarded() >= 5));

    assert!(rig.sink.lines().is_empty());
    assert_eq!(rig.controller.diagnostics().emitted(), 0);
}

#[test]
fn toggle_enables_diagnostics_mid_run() {
    let rig = start(ControllerConfig {
        debug_at_boot: false,
        ..ControllerConfig::default()
    });
    rig.input.send("d");
    assert!(wait_until(WAIT, || rig.controller.debug().is_enabled()));

    rig.input.send("G,10\n");
    assert!(sequences_done(&rig, 1));
    assert_eq!(rig.sink.count_prefix("Dispatcher: Color G for 10 ms"), 1);

    rig.input.send("D");
    assert!(wait_until(WAIT, || !rig.controller.debug().is_enabled()));
}

#[test]
fn time_check_mode_reports_codes() {
    let rig = start(ControllerConfig::time_check());
    rig.input.send("123456\n000000\n12:34:\n99\n");
    assert!(wait_until(WAIT, || rig.sink.lines().len() >= 4));
    assert_eq!(rig.sink.lines(), vec!["45296", "-4", "-6", "-1"]);
    assert!(rig.gpio.high_intervals(RED_GPIO).is_empty());
}

#[test]
fn auto_cycle_steps_and_pauses() {
    let rig = start(ControllerConfig {
        cycle_step_ms: 20,
        ..ControllerConfig::auto_cycle()
    });
    assert!(wait_until(WAIT, || rig.sink.count_prefix("GREEN task duration") >= 1));
    assert_eq!(rig.controller.head().overlap_count(), 0);

    rig.gpio.set_input(PAUSE_GPIO, true);
    // At most the running step and one queued step finish after pausing.
    std::thread::sleep(Duration::from_millis(100));
    let steps = rig.sink.count_prefix("Sequence total duration");
    std::thread::sleep(Duration::from_millis(150));
    assert_eq!(rig.sink.count_prefix("Sequence total duration"), steps);

    rig.gpio.set_input(PAUSE_GPIO, false);
    assert!(wait_until(WAIT, || {
        rig.sink.count_prefix("Sequence total duration") > steps
    }));
}

#[test]
fn shutdown_interrupts_long_command() {
    let mut rig = start(ControllerConfig::default());
    rig.input.send("R,60000\n");
    assert!(wait_until(WAIT, || rig.gpio.level(RED_GPIO)));

    let start = Instant::now();
    rig.controller.shutdown();
    assert!(start.elapsed() < Duration::from_secs(2));
    assert!(!rig.controller.is_running());
    assert!(!rig.gpio.level(RED_GPIO));

    // Idempotent.
    rig.controller.shutdown();
}
