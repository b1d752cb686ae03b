//! Motor intensity state: beat mapping, decay and output gating.

use crate::beat::Beat;
use crate::config::BeatConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MotorPhase {
    Idle,
    Active(u8),
}

#[derive(Clone, Debug)]
pub struct MotorState {
    speed: u8,
    previous: u8,
    playing: bool,
    surface_active: bool,
    actuator_present: bool,
    bands: usize,
    decay: u8,
    falloff: f32,
}

impl MotorState {
    pub fn new(config: &BeatConfig) -> Self {
        Self {
            speed: 0,
            previous: 0,
            playing: false,
            surface_active: false,
            actuator_present: false,
            bands: config.frequency_bands,
            decay: config.decay,
            falloff: config.falloff,
        }
    }

    /// Marks the start of an event; `settle` reports changes relative to here.
    pub fn begin(&mut self) {
        self.previous = self.speed;
    }

    /// Sets the speed from the dominant beat, or decays it when there is none.
    pub fn apply(&mut self, beat: Option<&Beat>) {
        match beat {
            Some(beat) => self.speed = self.intensity_for(beat.band),
            None => self.decay(),
        }
    }

    /// Bass maps close to full speed, the top band `falloff` lower.
    ///
    /// Fractional speeds are truncated toward zero.
    pub fn intensity_for(&self, band: usize) -> u8 {
        if self.bands == 0 {
            return 0;
        }
        // multiply before dividing so whole results stay exact under floor
        let drop = (band + 1) as f64 * f64::from(self.falloff) / self.bands as f64;
        (255.0 - drop).floor().clamp(0.0, 255.0) as u8
    }

    pub fn decay(&mut self) {
        self.speed = self.speed.saturating_sub(self.decay);
    }

    /// Applies gating and returns the speed to send, if the actuator needs it.
    ///
    /// Output is forced to 0 while stopped or without a surface. Nothing is
    /// returned when the speed is unchanged since `begin` or no actuator is
    /// present.
    pub fn settle(&mut self) -> Option<u8> {
        if self.is_gated() {
            self.speed = 0;
        }
        (self.actuator_present && self.speed != self.previous).then_some(self.speed)
    }

    pub fn force_idle(&mut self) {
        self.speed = 0;
    }

    pub fn is_gated(&self) -> bool {
        !self.playing || !self.surface_active
    }

    pub fn phase(&self) -> MotorPhase {
        match self.speed {
            0 => MotorPhase::Idle,
            speed => MotorPhase::Active(speed),
        }
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn previous(&self) -> u8 {
        self.previous
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    pub fn surface_active(&self) -> bool {
        self.surface_active
    }

    pub fn set_surface_active(&mut self, active: bool) {
        self.surface_active = active;
    }

    pub fn actuator_present(&self) -> bool {
        self.actuator_present
    }

    pub fn set_actuator_present(&mut self, present: bool) {
        self.actuator_present = present;
    }
}
