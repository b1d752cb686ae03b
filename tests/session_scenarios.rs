use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use rezvibe::beat::BandPartition;
use rezvibe::{Actuator, BeatConfig, Error, MotorPhase, Result, Session, Snapshot};

#[derive(Clone, Debug, PartialEq)]
enum Call {
    Open,
    Set(u8),
    Close,
}

/// Records every command; optionally fails writes.
#[derive(Clone, Default)]
struct RecordingActuator {
    calls: Rc<RefCell<Vec<Call>>>,
    fail_writes: bool,
    fail_open: bool,
}

impl RecordingActuator {
    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn sets(&self) -> Vec<u8> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Set(v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

impl Actuator for RecordingActuator {
    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(Error::DeviceClosed);
        }
        self.calls.borrow_mut().push(Call::Open);
        Ok(())
    }

    fn set_intensity(&mut self, value: u8, _timeout: Duration) -> Result<()> {
        self.calls.borrow_mut().push(Call::Set(value));
        if self.fail_writes {
            Err(Error::DeviceClosed)
        } else {
            Ok(())
        }
    }

    fn close(&mut self) -> Result<()> {
        self.calls.borrow_mut().push(Call::Close);
        Ok(())
    }

    fn name(&self) -> String {
        "recorder".to_string()
    }
}

fn spectrum(levels: &[(usize, f32)]) -> Snapshot {
    let partition = BandPartition::new(512, 9).unwrap();
    let mut channel = vec![0.0; 512];
    for &(band, level) in levels {
        channel[partition.range(band).unwrap()].fill(level);
    }
    Snapshot::new(vec![channel.clone(), channel])
}

fn live_session(actuator: RecordingActuator) -> Session<RecordingActuator> {
    let mut session =
        Session::start(&BeatConfig::default(), actuator, Duration::from_millis(10)).unwrap();
    session.surface_shown();
    session.playback_started(100);
    session
}

/// Drives band 0 to a beat: average 2.0, then 4.0.
fn bass_beat(session: &mut Session<RecordingActuator>) {
    session.render(Some(&spectrum(&[(0, 2.0)])));
    let beat = session.render(Some(&spectrum(&[(0, 4.0)]))).unwrap();
    assert_eq!(beat.band, 0);
    assert!((beat.ratio - 2.0).abs() < 1e-6);
}

#[test]
fn first_loud_snapshot_does_not_trigger() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());

    assert_eq!(session.render(Some(&spectrum(&[(0, 10.0)]))), None);
    assert_eq!(session.phase(), MotorPhase::Idle);
    assert_eq!(actuator.sets(), Vec::<u8>::new());
}

#[test]
fn loud_band_without_history_decays_the_running_motor() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());
    bass_beat(&mut session);
    assert_eq!(session.speed(), 245);

    session.reset_detection();
    assert!(session.detector().history(0).unwrap().is_empty());

    assert_eq!(session.render(Some(&spectrum(&[(0, 10.0)]))), None);
    assert_eq!(session.speed(), 235);
    assert_eq!(actuator.sets(), vec![245, 235]);
}

#[test]
fn bass_beat_sets_near_full_speed() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());

    bass_beat(&mut session);
    assert_eq!(session.speed(), 245);
    assert_eq!(actuator.sets(), vec![245]);
}

#[test]
fn speed_decays_once_per_tick_without_data() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());
    bass_beat(&mut session);

    for _ in 0..3 {
        session.render(None);
    }
    assert_eq!(session.speed(), 215);
    assert_eq!(actuator.sets(), vec![245, 235, 225, 215]);
}

#[test]
fn quiet_snapshot_decays_like_a_missing_one() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());
    bass_beat(&mut session);

    session.render(Some(&spectrum(&[(0, 3.0)])));
    assert_eq!(session.speed(), 235);
}

#[test]
fn stop_mid_stream_sends_exactly_one_zero() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());
    bass_beat(&mut session);

    session.playback_stopped();
    session.render(Some(&spectrum(&[(0, 40.0)])));
    session.idle();

    assert_eq!(session.speed(), 0);
    assert_eq!(actuator.sets(), vec![245, 0]);
}

#[test]
fn hidden_surface_gates_beats() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());
    session.surface_hidden();

    session.render(Some(&spectrum(&[(0, 2.0)])));
    session.render(Some(&spectrum(&[(0, 4.0)])));
    assert_eq!(session.speed(), 0);
    assert!(actuator.sets().is_empty());

    // detection kept running while hidden
    session.surface_shown();
    assert_eq!(session.detector().history(0).unwrap().len(), 2);
}

#[test]
fn higher_band_beats_are_weaker() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());

    session.render(Some(&spectrum(&[(8, 2.0)])));
    let beat = session.render(Some(&spectrum(&[(8, 5.0)]))).unwrap();
    assert_eq!(beat.band, 8);
    assert_eq!(session.speed(), 165);
}

#[test]
fn end_commands_zero_then_closes() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());
    bass_beat(&mut session);

    session.end();
    assert_eq!(
        actuator.calls(),
        vec![Call::Open, Call::Set(245), Call::Set(0), Call::Close]
    );
}

#[test]
fn dropping_a_session_also_shuts_down() {
    let actuator = RecordingActuator::default();
    {
        let _session = live_session(actuator.clone());
    }
    assert_eq!(actuator.calls(), vec![Call::Open, Call::Set(0), Call::Close]);
}

#[test]
fn failed_write_degrades_to_no_actuator() {
    let actuator = RecordingActuator {
        fail_writes: true,
        ..RecordingActuator::default()
    };
    let mut session = live_session(actuator.clone());
    bass_beat(&mut session);

    assert!(!session.actuator_present());
    assert_eq!(session.speed(), 245);

    session.render(None);
    session.end();
    assert_eq!(
        actuator.calls(),
        vec![Call::Open, Call::Set(245), Call::Set(0), Call::Close]
    );
}

#[test]
fn failed_open_still_runs_detection() {
    let actuator = RecordingActuator {
        fail_open: true,
        ..RecordingActuator::default()
    };
    let mut session = live_session(actuator.clone());
    bass_beat(&mut session);

    assert!(!session.actuator_present());
    assert_eq!(session.speed(), 245);
    session.end();
    assert!(actuator.calls().is_empty());
}

#[test]
fn malformed_snapshot_counts_as_no_beat() {
    let actuator = RecordingActuator::default();
    let mut session = live_session(actuator.clone());
    bass_beat(&mut session);

    let ragged = Snapshot::new(vec![vec![50.0; 512], vec![50.0; 10]]);
    assert_eq!(session.render(Some(&ragged)), None);
    assert_eq!(session.speed(), 235);
    assert_eq!(session.render_count(), 3);
}
