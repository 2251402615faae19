//! Boost pressure arithmetic.

/// psi per kPa.
pub const KPA_TO_PSI: f64 = 0.145038;

/// Boost in psi for the given absolute manifold and barometric pressures in kPa.
///
/// Manifold pressure at or below ambient is vacuum, not boost, and counts as zero.
pub fn boost_psi(manifold_kpa: u32, barometric_kpa: u32) -> f64 {
    let delta = manifold_kpa.saturating_sub(barometric_kpa);
    delta as f64 * KPA_TO_PSI
}

/// Current and peak boost, in psi. Neither is ever negative, and the peak never goes down.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct BoostState {
    current_psi: f64,
    peak_psi: f64,
}

impl BoostState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_psi(&self) -> f64 {
        self.current_psi
    }

    pub fn peak_psi(&self) -> f64 {
        self.peak_psi
    }

    /// Records a new reading. Returns `true` if it set a new peak.
    pub fn update(&mut self, boost_psi: f64) -> bool {
        // NaN fails the comparison and is treated as no boost
        let boost_psi = if boost_psi > 0.0 { boost_psi } else { 0.0 };
        self.current_psi = boost_psi;
        if boost_psi > self.peak_psi {
            self.peak_psi = boost_psi;
            true
        } else {
            false
        }
    }
}
