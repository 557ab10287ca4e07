//! Ring/slot geometry for orbital placement.
//!
//! Every node type orbits its anchor on a list of concentric rings. Ring `i`
//! with `slots_i` positions puts slot `j` at angle `2*pi*j/slots_i`, measured
//! from the +x axis, with y growing downward as on screen.
//!
//! Properties:
//! - Pure: no node identity, no occupancy
//! - Deterministic enumeration: ring-major, then angle
//! - Rings past the configured list grow outward by a fixed increment

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

/// A 2D point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Angle of `self` seen from `center`, in the same convention as `polar`.
    pub fn bearing_from(&self, center: &Point) -> f64 {
        (self.y - center.y).atan2(self.x - center.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Point at `radius` from `center` in direction `angle` (radians).
    pub fn polar(center: Point, radius: f64, angle: f64) -> Self {
        Self {
            x: center.x + radius * angle.cos(),
            y: center.y + radius * angle.sin(),
        }
    }
}

/// One concentric ring: a radius and how many evenly spaced slots it holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingTier {
    pub radius: f64,
    pub slots: usize,
}

impl RingTier {
    pub const fn new(radius: f64, slots: usize) -> Self {
        Self { radius, slots }
    }
}

/// A candidate coordinate on a ring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    /// Ring index in enumeration order
    pub ring: usize,
    /// Slot index on the ring
    pub index: usize,
    pub radius: f64,
    /// Angle from the anchor, in radians
    pub angle: f64,
    pub position: Point,
}

/// Angle of slot `index` on a ring with `slots` positions.
pub fn slot_angle(index: usize, slots: usize) -> f64 {
    if slots == 0 {
        return 0.0;
    }
    TAU * index as f64 / slots as f64
}

/// Slots of a single ring, in angle order.
pub fn ring_slots(center: Point, ring: usize, tier: RingTier) -> impl Iterator<Item = Slot> {
    (0..tier.slots).map(move |index| {
        let angle = slot_angle(index, tier.slots);
        Slot {
            ring,
            index,
            radius: tier.radius,
            angle,
            position: Point::polar(center, tier.radius, angle),
        }
    })
}

/// Full candidate list for `tiers` around `center`, ring-major then angle.
pub fn candidate_slots(center: Point, tiers: &[RingTier]) -> Vec<Slot> {
    tiers
        .iter()
        .enumerate()
        .flat_map(|(ring, tier)| ring_slots(center, ring, *tier))
        .collect()
}

/// Ring configuration for one node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrbitConfig {
    /// Configured rings, innermost first
    pub rings: Vec<RingTier>,
    /// Radius step for rings grown past the configured list
    pub increment: f64,
}

impl OrbitConfig {
    pub fn new(rings: Vec<RingTier>, increment: f64) -> Self {
        Self { rings, increment }
    }

    /// Ring `k`, growing the last configured ring when `k` is past the list.
    ///
    /// Grown rings keep the last ring's slot count (at least one) so that
    /// every grown ring offers a candidate.
    pub fn tier(&self, k: usize) -> RingTier {
        if let Some(tier) = self.rings.get(k) {
            return *tier;
        }
        match self.rings.last() {
            Some(last) => {
                let steps = (k + 1 - self.rings.len()) as f64;
                RingTier::new(last.radius + self.increment * steps, last.slots.max(1))
            }
            None => RingTier::new(self.increment * (k + 1) as f64, 1),
        }
    }

    /// The first `count` rings, configured and grown.
    pub fn tiers(&self, count: usize) -> Vec<RingTier> {
        (0..count).map(|k| self.tier(k)).collect()
    }

    /// Check that rings can actually hold nodes.
    pub fn validate(&self) -> Result<(), String> {
        if self.rings.is_empty() {
            return Err("at least one ring is required".into());
        }
        if let Some(bad) = self.rings.iter().find(|t| !(t.radius > 0.0)) {
            return Err(format!("ring radius must be positive, got {}", bad.radius));
        }
        if !(self.increment > 0.0) {
            return Err(format!("increment must be positive, got {}", self.increment));
        }
        Ok(())
    }
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self::primary()
    }
}

impl OrbitConfig {
    pub fn primary() -> Self {
        Self::new(
            vec![
                RingTier::new(180.0, 6),
                RingTier::new(280.0, 8),
                RingTier::new(380.0, 12),
            ],
            100.0,
        )
    }

    pub fn secondary() -> Self {
        Self::new(vec![RingTier::new(60.0, 5)], 30.0)
    }

    pub fn tertiary() -> Self {
        Self::new(vec![RingTier::new(95.0, 6)], 30.0)
    }
}
