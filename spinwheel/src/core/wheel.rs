//! Wheel geometry and landing angles
//!
//! The wheel is divided into equal sectors. Catalog prizes are painted on
//! some of them; the rest are decoration (the "try again" slices clients may
//! show) and are never landed on. A landing angle is a sector position plus a
//! whole number of extra rotations, so reducing it modulo 360 always gives a
//! point inside the allocated prize's sector.

use super::{Prize, PrizeCatalog, WheelError};
use rand::Rng;

const FULL_TURN: f64 = 360.0;

/// Sector layout of the rendered wheel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelLayout {
    /// Number of equal sectors on the wheel
    pub sectors: usize,
    /// Degrees kept clear at each sector edge so the pointer never rests on a
    /// border line
    pub edge_margin: f64,
    /// Minimum whole extra rotations (inclusive)
    pub min_turns: u32,
    /// Maximum whole extra rotations (exclusive)
    pub max_turns: u32,
}

impl Default for WheelLayout {
    fn default() -> Self {
        WheelLayout {
            sectors: 6,
            edge_margin: 5.0,
            min_turns: 3,
            max_turns: 6,
        }
    }
}

impl WheelLayout {
    pub fn sector_width(&self) -> f64 {
        FULL_TURN / self.sectors as f64
    }

    /// Angular range `[start, end)` of a sector, in degrees
    pub fn sector_bounds(&self, sector: usize) -> (f64, f64) {
        let width = self.sector_width();
        let start = sector as f64 * width;
        (start, start + width)
    }

    /// Sector under an angle, after removing whole rotations
    pub fn sector_at(&self, angle: f64) -> usize {
        let normalized = angle.rem_euclid(FULL_TURN);
        ((normalized / self.sector_width()) as usize).min(self.sectors - 1)
    }

    /// Check that the layout is usable and every catalog sector exists
    pub fn validate(&self, catalog: &PrizeCatalog) -> Result<(), WheelError> {
        if self.sectors == 0 {
            return Err(WheelError::InvalidLayout("wheel needs at least one sector".into()));
        }
        if !(0.0..self.sector_width() / 2.0).contains(&self.edge_margin) {
            return Err(WheelError::InvalidLayout(format!(
                "edge margin {} must be below half the sector width ({})",
                self.edge_margin,
                self.sector_width() / 2.0
            )));
        }
        if self.min_turns >= self.max_turns {
            return Err(WheelError::InvalidLayout(format!(
                "turn range {}..{} is empty",
                self.min_turns, self.max_turns
            )));
        }
        if let Some(entry) = catalog.entries().iter().find(|e| e.sector >= self.sectors) {
            return Err(WheelError::InvalidLayout(format!(
                "prize {} is assigned to sector {} but the wheel has {}",
                entry.prize, entry.sector, self.sectors
            )));
        }
        Ok(())
    }

    /// Pick a landing angle inside `sector`, with extra full rotations
    pub fn landing_angle<R: Rng>(&self, sector: usize, rng: &mut R) -> f64 {
        let (start, end) = self.sector_bounds(sector);
        let offset = rng.gen_range(start + self.edge_margin..end - self.edge_margin);
        let turns = rng.gen_range(self.min_turns..self.max_turns);
        f64::from(turns) * FULL_TURN + offset
    }

    /// Landing angle for a prize, or `None` if the prize is not on the wheel
    pub fn angle_for<R: Rng>(&self, catalog: &PrizeCatalog, prize: Prize, rng: &mut R) -> Option<f64> {
        catalog
            .sector_of(prize)
            .map(|sector| self.landing_angle(sector, rng))
    }
}
