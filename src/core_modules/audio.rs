// THEORY:
// Audio reactivity is an external collaborator. The host owns the audio analysis and
// exposes it here only as a scalar sampler, `AudioSource::level(band)`. The engine
// uses that level for one thing: scaling `focus_strength` and `zoom_strength` through
// an `AudioModulation` pair (band + multiplier). With modulation disabled, or with a
// silent source, the strengths pass through unchanged.

use serde::{Deserialize, Serialize};

/// The analysis bands a host may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioBand {
    Volume,
    Bass,
    Mid,
    Treble,
}

/// A scalar audio sampler supplied by the host. Levels are expected in 0..1.
pub trait AudioSource: Send + Sync {
    fn level(&self, band: AudioBand) -> f32;
}

/// The source used when the host provides no audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentAudio;

impl AudioSource for SilentAudio {
    fn level(&self, _band: AudioBand) -> f32 {
        0.0
    }
}

impl<F> AudioSource for F
where
    F: Fn(AudioBand) -> f32 + Send + Sync,
{
    fn level(&self, band: AudioBand) -> f32 {
        self(band)
    }
}

/// Ties one strength parameter to an audio band.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioModulation {
    /// The band to follow; `None` disables modulation.
    pub band: Option<AudioBand>,
    /// How strongly the band level boosts the base strength.
    pub multiplier: f32,
}

impl AudioModulation {
    pub fn new(band: AudioBand, multiplier: f32) -> Self {
        Self {
            band: Some(band),
            multiplier,
        }
    }

    /// `base * (1 + level * multiplier)`, or `base` when disabled.
    pub fn apply(&self, base: f32, audio: &dyn AudioSource) -> f32 {
        match self.band {
            Some(band) => {
                let level = audio.level(band).max(0.0);
                (base * (1.0 + level * self.multiplier)).max(0.0)
            }
            None => base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_modulation_passes_strength_through() {
        let loud = |_: AudioBand| -> f32 { 1.0 };
        assert_eq!(AudioModulation::default().apply(2.0, &loud), 2.0);
    }

    #[test]
    fn silent_audio_leaves_strength_unchanged() {
        let modulation = AudioModulation::new(AudioBand::Bass, 3.0);
        assert_eq!(modulation.apply(1.5, &SilentAudio), 1.5);
    }

    #[test]
    fn band_level_scales_strength() {
        let audio = |band: AudioBand| -> f32 { if band == AudioBand::Bass { 0.5 } else { 0.0 } };
        let modulation = AudioModulation::new(AudioBand::Bass, 2.0);
        assert!((modulation.apply(1.0, &audio) - 2.0).abs() < 1e-6);
        let treble = AudioModulation::new(AudioBand::Treble, 2.0);
        assert_eq!(treble.apply(1.0, &audio), 1.0);
    }
}
