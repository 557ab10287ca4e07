//! Spatial hash of claimed positions.
//!
//! Positions are floats produced by trigonometry, so "same slot" means "within
//! tolerance". Claims are bucketed into square cells; a lookup only scans the
//! cells covering `point +/- tolerance`.

use std::collections::HashMap;

use crate::domain::entities::NodeId;
use crate::domain::geometry::Point;

/// Positions currently held by nodes.
#[derive(Debug, Clone)]
pub struct Occupancy {
    tolerance: f64,
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<(NodeId, Point)>>,
    len: usize,
}

impl Occupancy {
    /// Create an empty occupancy map. Points closer than `tolerance` collide.
    pub fn new(tolerance: f64) -> Self {
        let tolerance = if tolerance > 0.0 { tolerance } else { f64::EPSILON };
        Self {
            tolerance,
            cell_size: (tolerance * 4.0).max(1.0),
            cells: HashMap::new(),
            len: 0,
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn cell_of(&self, v: f64) -> i64 {
        (v / self.cell_size).floor() as i64
    }

    fn cell_range(&self, point: &Point) -> Vec<(i64, i64)> {
        let min_x = self.cell_of(point.x - self.tolerance);
        let max_x = self.cell_of(point.x + self.tolerance);
        let min_y = self.cell_of(point.y - self.tolerance);
        let max_y = self.cell_of(point.y + self.tolerance);

        let mut cells = Vec::new();
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                cells.push((cx, cy));
            }
        }
        cells
    }

    /// Node holding `point`, if any.
    pub fn occupant_at(&self, point: &Point) -> Option<&NodeId> {
        self.cell_range(point)
            .into_iter()
            .filter_map(|cell| self.cells.get(&cell))
            .flatten()
            .find(|(_, p)| p.distance(point) < self.tolerance)
            .map(|(id, _)| id)
    }

    /// True when `point` is unclaimed or claimed by `id` itself.
    pub fn is_free_for(&self, point: &Point, id: &NodeId) -> bool {
        match self.occupant_at(point) {
            None => true,
            Some(occupant) => occupant == id,
        }
    }

    /// Claim `point` for `id`. Fails with the current holder if another node has it.
    pub fn claim(&mut self, id: &NodeId, point: Point) -> Result<(), NodeId> {
        if let Some(occupant) = self.occupant_at(&point) {
            if occupant == id {
                return Ok(());
            }
            return Err(occupant.clone());
        }
        let cell = (self.cell_of(point.x), self.cell_of(point.y));
        self.cells.entry(cell).or_default().push((id.clone(), point));
        self.len += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_and_lookup() {
        let mut occ = Occupancy::new(0.5);
        let a = NodeId::new("a");
        occ.claim(&a, Point::new(10.0, 10.0)).unwrap();

        assert_eq!(occ.occupant_at(&Point::new(10.2, 9.9)), Some(&a));
        assert!(occ.occupant_at(&Point::new(11.0, 10.0)).is_none());
        assert_eq!(occ.len(), 1);
    }

    #[test]
    fn test_claim_across_cell_boundary() {
        let mut occ = Occupancy::new(0.5);
        let a = NodeId::new("a");
        // cell size is 2.0, so 1.9 and 2.1 land in different cells
        occ.claim(&a, Point::new(1.9, 0.0)).unwrap();

        let b = NodeId::new("b");
        assert_eq!(occ.claim(&b, Point::new(2.1, 0.0)), Err(a.clone()));
        assert!(occ.is_free_for(&Point::new(2.1, 0.0), &a));
    }
}
