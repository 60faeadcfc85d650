//! Effect parameters

use audacity_core::Command;

/// Parameters of the `Normalize:` effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeSettings {
    /// Target peak in dB
    pub peak_level: f64,
    pub apply_gain: bool,
    pub remove_dc_offset: bool,
    pub stereo_independent: bool,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self {
            peak_level: -1.0,
            apply_gain: true,
            remove_dc_offset: true,
            stereo_independent: false,
        }
    }
}

impl NormalizeSettings {
    pub fn command(&self) -> Command {
        Command::new("Normalize")
            .arg("PeakLevel", self.peak_level)
            .flag("ApplyGain", self.apply_gain)
            .flag("RemoveDcOffset", self.remove_dc_offset)
            .flag("StereoIndependent", self.stereo_independent)
    }
}

/// Parameters of the `Compressor:` effect
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressorSettings {
    /// dB
    pub threshold: f64,
    /// dB
    pub noise_floor: f64,
    pub ratio: f64,
    /// Seconds
    pub attack_time: f64,
    /// Seconds
    pub release_time: f64,
    /// Make-up gain to 0 dB after compressing
    pub normalize: bool,
    /// Compress based on peaks instead of RMS
    pub use_peak: bool,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            threshold: -12.0,
            noise_floor: -40.0,
            ratio: 2.0,
            attack_time: 0.2,
            release_time: 1.0,
            normalize: true,
            use_peak: false,
        }
    }
}

impl CompressorSettings {
    pub fn command(&self) -> Command {
        Command::new("Compressor")
            .arg("Threshold", self.threshold)
            .arg("NoiseFloor", self.noise_floor)
            .arg("Ratio", self.ratio)
            .arg("AttackTime", self.attack_time)
            .arg("ReleaseTime", self.release_time)
            .flag("Normalize", self.normalize)
            .flag("UsePeak", self.use_peak)
    }
}
