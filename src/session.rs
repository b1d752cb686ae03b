//! The live session: one detector, one motor and the actuator they drive.
//!
//! The host forwards its lifecycle events to a [`Session`] one at a time.
//! After every event (except enable/disable) the output is gated and the
//! actuator is told about the new speed if it changed during that event.

use std::time::Duration;

use tracing::{info, trace, warn};

use crate::actuator::Actuator;
use crate::beat::{Beat, BeatDetector};
use crate::config::BeatConfig;
use crate::error::Result;
use crate::motor::{MotorPhase, MotorState};
use crate::types::Snapshot;

pub struct Session<A: Actuator> {
    detector: BeatDetector,
    motor: MotorState,
    actuator: A,
    timeout: Duration,
    volume: i32,
    renders: u64,
    last_beat: Option<Beat>,
    ended: bool,
}

impl<A: Actuator> Session<A> {
    /// Starts a session, failing only on an unusable configuration.
    ///
    /// An actuator that does not open is logged and left out; detection
    /// still runs.
    pub fn start(config: &BeatConfig, mut actuator: A, timeout: Duration) -> Result<Self> {
        let detector = BeatDetector::new(config)?;
        let mut motor = MotorState::new(config);

        match actuator.open() {
            Ok(()) => {
                info!("actuator '{}' connected", actuator.name());
                motor.set_actuator_present(true);
            }
            Err(e) => warn!("no actuator ({}): {}", actuator.name(), e),
        }

        info!(
            "session started: {} bands over {} bins, {} retained samples",
            detector.bands(),
            config.spectrum_bins,
            config.retain_samples
        );

        Ok(Self {
            detector,
            motor,
            actuator,
            timeout,
            volume: 0,
            renders: 0,
            last_beat: None,
            ended: false,
        })
    }

    /// Stops the motor and releases the actuator.
    pub fn end(mut self) {
        self.shutdown();
    }

    pub fn surface_shown(&mut self) {
        self.dispatch(|s| s.motor.set_surface_active(true));
    }

    pub fn surface_hidden(&mut self) {
        self.dispatch(|s| s.motor.set_surface_active(false));
    }

    pub fn playback_started(&mut self, volume: i32) {
        self.dispatch(|s| {
            s.volume = volume;
            s.motor.set_playing(true);
        });
    }

    /// Unpause; volume is left as it was.
    pub fn playback_resumed(&mut self) {
        self.dispatch(|s| s.motor.set_playing(true));
    }

    pub fn playback_paused(&mut self) {
        self.dispatch(|s| s.motor.set_playing(false));
    }

    pub fn playback_stopped(&mut self) {
        self.dispatch(|s| s.motor.set_playing(false));
    }

    /// One render tick.
    ///
    /// Without a snapshot no detection runs, but the motor still decays.
    pub fn render(&mut self, snapshot: Option<&Snapshot>) -> Option<Beat> {
        self.dispatch(|s| {
            s.renders += 1;
            let beat = snapshot.and_then(|snap| s.detector.process(snap));
            s.motor.apply(beat.as_ref());
            s.last_beat = beat;
        });
        self.last_beat
    }

    /// Forgets every band's history, e.g. when the audio source changes.
    ///
    /// The motor keeps its speed; no beat can fire until new energies arrive.
    pub fn reset_detection(&mut self) {
        self.detector.reset();
    }

    pub fn idle(&mut self) {
        self.dispatch(|_| {});
    }

    /// Accepted and ignored.
    pub fn enable(&mut self) {}

    /// Accepted and ignored.
    pub fn disable(&mut self) {}

    fn dispatch(&mut self, event: impl FnOnce(&mut Self)) {
        self.motor.begin();
        event(self);
        if let Some(speed) = self.motor.settle() {
            trace!("speed {} -> {}", self.motor.previous(), speed);
            self.send(speed);
        }
    }

    fn send(&mut self, speed: u8) {
        if let Err(e) = self.actuator.set_intensity(speed, self.timeout) {
            warn!("actuator write failed, continuing without it: {}", e);
            self.motor.set_actuator_present(false);
            self.release();
        }
    }

    /// Commands 0, then closes; errors are logged only.
    fn release(&mut self) {
        if let Err(e) = self.actuator.set_intensity(0, self.timeout) {
            warn!("failed to stop actuator: {}", e);
        }
        if let Err(e) = self.actuator.close() {
            warn!("actuator close failed: {}", e);
        }
    }

    fn shutdown(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.motor.force_idle();

        if self.motor.actuator_present() {
            self.release();
            self.motor.set_actuator_present(false);
        }
        info!("session ended after {} renders", self.renders);
    }

    pub fn speed(&self) -> u8 {
        self.motor.speed()
    }

    pub fn phase(&self) -> MotorPhase {
        self.motor.phase()
    }

    pub fn playing(&self) -> bool {
        self.motor.playing()
    }

    pub fn surface_active(&self) -> bool {
        self.motor.surface_active()
    }

    pub fn actuator_present(&self) -> bool {
        self.motor.actuator_present()
    }

    pub fn actuator_name(&self) -> String {
        self.actuator.name()
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn render_count(&self) -> u64 {
        self.renders
    }

    pub fn last_beat(&self) -> Option<Beat> {
        self.last_beat
    }

    pub fn detector(&self) -> &BeatDetector {
        &self.detector
    }
}

impl<A: Actuator> Drop for Session<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
