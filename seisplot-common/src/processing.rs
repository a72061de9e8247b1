//! Lightweight signal conditioning applied to traces before plotting.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::waveform::Trace;

/// Per-station processing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Subtract the mean before any filtering.
    #[serde(default)]
    pub demean: bool,

    /// High-pass corner frequency in Hz (no filtering when absent).
    #[serde(default)]
    pub highpass_hz: Option<f64>,

    /// Filter order; must be even (default: 4).
    #[serde(default = "default_corners")]
    pub corners: usize,
}

fn default_corners() -> usize {
    4
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            demean: false,
            highpass_hz: None,
            corners: default_corners(),
        }
    }
}

impl ProcessingConfig {
    /// Whether applying this configuration would change anything.
    pub fn is_noop(&self) -> bool {
        !self.demean && self.highpass_hz.is_none()
    }

    /// Validate the options that do not depend on the data.
    pub fn validate(&self) -> Result<()> {
        if self.corners == 0 || self.corners % 2 != 0 {
            return Err(Error::validation(format!(
                "processing.corners must be a positive even number, got {}",
                self.corners
            )));
        }
        if let Some(hz) = self.highpass_hz {
            if !(hz > 0.0) {
                return Err(Error::validation(format!(
                    "processing.highpass_hz must be > 0, got {}",
                    hz
                )));
            }
        }
        Ok(())
    }

    /// Apply the configured steps to a trace in place.
    pub fn apply(&self, trace: &mut Trace) -> Result<()> {
        if self.demean {
            demean(&mut trace.samples);
        }
        if let Some(corner_hz) = self.highpass_hz {
            highpass(&mut trace.samples, trace.sampling_rate, corner_hz, self.corners)?;
        }
        Ok(())
    }
}

/// Remove the mean value.
pub fn demean(samples: &mut [f64]) {
    if samples.is_empty() {
        return;
    }
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    for v in samples.iter_mut() {
        *v -= mean;
    }
}

/// Second-order IIR section in direct form I.
#[derive(Debug, Clone, Copy)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Biquad {
    fn highpass(sampling_rate: f64, corner_hz: f64, q: f64) -> Self {
        let w0 = 2.0 * std::f64::consts::PI * corner_hz / sampling_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        Self {
            b0: (1.0 + cos_w0) / 2.0 / a0,
            b1: -(1.0 + cos_w0) / a0,
            b2: (1.0 + cos_w0) / 2.0 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    fn run(&self, samples: &mut [f64]) {
        let (mut x1, mut x2, mut y1, mut y2) = (0.0, 0.0, 0.0, 0.0);
        for v in samples.iter_mut() {
            let x0 = *v;
            let y0 = self.b0 * x0 + self.b1 * x1 + self.b2 * x2 - self.a1 * y1 - self.a2 * y2;
            x2 = x1;
            x1 = x0;
            y2 = y1;
            y1 = y0;
            *v = y0;
        }
    }
}

/// Butterworth high-pass filter of order `corners`, applied causally as a
/// cascade of biquad sections.
pub fn highpass(
    samples: &mut [f64],
    sampling_rate: f64,
    corner_hz: f64,
    corners: usize,
) -> Result<()> {
    let nyquist = sampling_rate / 2.0;
    if !(corner_hz > 0.0 && corner_hz < nyquist) {
        return Err(Error::Processing(format!(
            "high-pass corner {} Hz outside (0, {}) Hz",
            corner_hz, nyquist
        )));
    }
    if corners == 0 || corners % 2 != 0 {
        return Err(Error::Processing(format!(
            "filter order must be a positive even number, got {}",
            corners
        )));
    }

    let n = corners as f64;
    for k in 0..corners / 2 {
        let theta = std::f64::consts::PI * (2.0 * k as f64 + 1.0) / (2.0 * n);
        let q = 1.0 / (2.0 * theta.cos());
        Biquad::highpass(sampling_rate, corner_hz, q).run(samples);
    }
    Ok(())
}
