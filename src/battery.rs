//! Battery voltage estimate and the discrete gauge it drives.

/// Divider factor and scale applied to the 16-bit normalised ADC sample.
const DIVIDER: f32 = 2.0;
const SCALE: f32 = 10_000.0;

/// One battery sample taken at boot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryReading {
    /// ADC sample normalised to 0..=65535.
    pub raw: u16,
    pub volts: f32,
}

impl BatteryReading {
    pub fn from_raw(raw: u16) -> Self {
        BatteryReading {
            raw,
            volts: raw as f32 * DIVIDER / SCALE,
        }
    }

    /// Normalise a reading from an ADC with `full_scale` as its maximum code.
    pub fn from_adc(code: u16, full_scale: u16) -> Self {
        let full_scale = full_scale.max(1) as u32;
        let raw = (code.min(full_scale as u16) as u32 * u16::MAX as u32) / full_scale;
        Self::from_raw(raw as u16)
    }

    #[cfg(test)]
    pub(crate) fn from_volts(volts: f32) -> Self {
        BatteryReading {
            raw: (volts * SCALE / DIVIDER) as u16,
            volts,
        }
    }
}

/// Voltage boundaries of the five gauge levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    /// At or below this the gauge shows a single low-battery segment.
    pub low_max: f32,
    /// Each reached step adds one segment after the base segment.
    pub steps: [f32; 3],
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            low_max: 3.71,
            steps: [3.79, 3.84, 3.98],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeLevel {
    Low,
    /// Number of filled segments, 1..=4.
    Segments(u8),
}

impl GaugeLevel {
    pub fn segment_count(self) -> usize {
        match self {
            GaugeLevel::Low => 1,
            GaugeLevel::Segments(n) => n as usize,
        }
    }
}

pub fn gauge_level(volts: f32, thresholds: &Thresholds) -> GaugeLevel {
    if volts <= thresholds.low_max {
        return GaugeLevel::Low;
    }
    let extra = thresholds.steps.iter().filter(|&&t| volts >= t).count() as u8;
    GaugeLevel::Segments(1 + extra)
}
