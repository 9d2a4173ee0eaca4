//! Prize kinds and the weighted prize catalog
//!
//! The catalog is static configuration: every entry pairs a winnable
//! [`Prize`] with a selection weight (in percent) and the wheel sector the
//! prize is painted on. Weights must add up to 100.

use super::WheelError;
use rand::Rng;
use std::fmt;
use std::str::FromStr;

const WEIGHT_TOTAL: f64 = 100.0;
const WEIGHT_EPSILON: f64 = 1e-6;

/// A winnable prize kind
///
/// Codes are the uppercase names exchanged with clients (`COMBO`, `XTUDO`,
/// `HOTDOG`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prize {
    Combo,
    Xtudo,
    Hotdog,
}

impl Prize {
    pub const ALL: [Prize; 3] = [Prize::Combo, Prize::Xtudo, Prize::Hotdog];

    pub fn code(&self) -> &'static str {
        match self {
            Prize::Combo => "COMBO",
            Prize::Xtudo => "XTUDO",
            Prize::Hotdog => "HOTDOG",
        }
    }
}

impl fmt::Display for Prize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Prize {
    type Err = WheelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "COMBO" => Ok(Prize::Combo),
            "XTUDO" => Ok(Prize::Xtudo),
            "HOTDOG" => Ok(Prize::Hotdog),
            _ => Err(WheelError::UnknownPrize(s.to_string())),
        }
    }
}

/// One catalog line: a prize, its weight in percent and its wheel sector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrizeEntry {
    pub prize: Prize,
    pub weight: f64,
    pub sector: usize,
}

/// Weighted catalog of claimable prizes
///
/// Draws are made against cumulative weight boundaries using half-open
/// intervals: with weights `{35, 32.5, 32.5}` the first prize owns
/// `[0, 35)`, the second `[35, 67.5)` and the third `[67.5, 100)`.
///
/// # Example
///
/// ```
/// use spinwheel::{Prize, PrizeCatalog};
///
/// let catalog = PrizeCatalog::default();
/// assert_eq!(catalog.select(0.0), Prize::Combo);
/// assert_eq!(catalog.select(35.0), Prize::Xtudo);
/// assert_eq!(catalog.select(99.9), Prize::Hotdog);
/// ```
#[derive(Debug, Clone)]
pub struct PrizeCatalog {
    entries: Vec<PrizeEntry>,
    // Upper boundary of each entry's interval, same order as `entries`
    boundaries: Vec<f64>,
}

impl PrizeCatalog {
    /// Build a catalog from explicit entries
    ///
    /// # Errors
    ///
    /// [`WheelError::InvalidCatalog`] if the catalog is empty, a weight is
    /// not positive, weights do not sum to 100, or a prize or sector is
    /// listed twice.
    pub fn new(entries: Vec<PrizeEntry>) -> Result<Self, WheelError> {
        if entries.is_empty() {
            return Err(WheelError::InvalidCatalog("catalog has no prizes".into()));
        }

        let mut boundaries = Vec::with_capacity(entries.len());
        let mut cumulative = 0.0;
        for (i, entry) in entries.iter().enumerate() {
            if !entry.weight.is_finite() || entry.weight <= 0.0 {
                return Err(WheelError::InvalidCatalog(format!(
                    "weight for {} must be positive, got {}",
                    entry.prize, entry.weight
                )));
            }
            if entries[..i].iter().any(|e| e.prize == entry.prize) {
                return Err(WheelError::InvalidCatalog(format!(
                    "prize {} listed more than once",
                    entry.prize
                )));
            }
            if entries[..i].iter().any(|e| e.sector == entry.sector) {
                return Err(WheelError::InvalidCatalog(format!(
                    "sector {} assigned to more than one prize",
                    entry.sector
                )));
            }
            cumulative += entry.weight;
            boundaries.push(cumulative);
        }

        if (cumulative - WEIGHT_TOTAL).abs() > WEIGHT_EPSILON {
            return Err(WheelError::InvalidCatalog(format!(
                "weights must sum to {WEIGHT_TOTAL}, got {cumulative}"
            )));
        }

        Ok(PrizeCatalog {
            entries,
            boundaries,
        })
    }

    pub fn entries(&self) -> &[PrizeEntry] {
        &self.entries
    }

    pub fn contains(&self, prize: Prize) -> bool {
        self.entry(prize).is_some()
    }

    pub fn entry(&self, prize: Prize) -> Option<&PrizeEntry> {
        self.entries.iter().find(|e| e.prize == prize)
    }

    /// Wheel sector assigned to a prize
    pub fn sector_of(&self, prize: Prize) -> Option<usize> {
        self.entry(prize).map(|e| e.sector)
    }

    /// Select the prize whose interval contains `value`
    ///
    /// `value` is expected in `[0, 100)`. Values at or beyond the final
    /// boundary (floating point rounding) resolve to the last entry.
    pub fn select(&self, value: f64) -> Prize {
        self.boundaries
            .iter()
            .position(|&upper| value < upper)
            .map(|i| self.entries[i].prize)
            .unwrap_or_else(|| self.entries[self.entries.len() - 1].prize)
    }

    /// Draw a prize using the supplied random source
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Prize {
        self.select(rng.gen_range(0.0..WEIGHT_TOTAL))
    }
}

impl Default for PrizeCatalog {
    /// The promotion's standing catalog: COMBO 35%, XTUDO 32.5%, HOTDOG 32.5%
    fn default() -> Self {
        PrizeCatalog {
            entries: vec![
                PrizeEntry {
                    prize: Prize::Combo,
                    weight: 35.0,
                    sector: 5,
                },
                PrizeEntry {
                    prize: Prize::Xtudo,
                    weight: 32.5,
                    sector: 3,
                },
                PrizeEntry {
                    prize: Prize::Hotdog,
                    weight: 32.5,
                    sector: 1,
                },
            ],
            boundaries: vec![35.0, 67.5, 100.0],
        }
    }
}
