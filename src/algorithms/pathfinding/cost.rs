//! Edge weights for contention-aware routing.

use crate::grid::Position;
use crate::Id;

/// Cost of stepping into any traversable cell.
pub const BASE_COST: u32 = 1;
/// Surcharge for a cell another forklift stands on.
pub const OCCUPIED_PENALTY: u32 = 1000;
/// Surcharge for a cell adjacent (8-neighbourhood) to another forklift.
pub const PROXIMITY_PENALTY: u32 = 10;
/// Surcharge for a cell another forklift plans to enter next.
pub const PLANNED_PENALTY: u32 = 50;

/// Where a forklift is and where it goes next, captured before a tick moves
/// anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footprint {
    pub id: Id,
    pub position: Position,
    /// `path[1]` of the forklift's current route, if it has one.
    pub next_step: Option<Position>,
}

/// The other forklifts a route has to share the floor with.
#[derive(Debug, Clone, Copy)]
pub struct Contention<'a> {
    footprints: &'a [Footprint],
    exclude: Option<&'a str>,
}

impl<'a> Contention<'a> {
    /// Contention from every footprint except the one with id `exclude`.
    pub fn new(footprints: &'a [Footprint], exclude: &'a str) -> Self {
        Self {
            footprints,
            exclude: Some(exclude),
        }
    }

    /// An empty floor: every step costs [`BASE_COST`].
    pub fn none() -> Self {
        Self {
            footprints: &[],
            exclude: None,
        }
    }

    /// Footprints of the other forklifts.
    pub fn others(&self) -> impl Iterator<Item = &'a Footprint> + '_ {
        let exclude = self.exclude;
        self.footprints
            .iter()
            .filter(move |f| Some(f.id.as_str()) != exclude)
    }

    /// Returns true if another forklift stands on `pos`.
    pub fn is_occupied(&self, pos: Position) -> bool {
        self.others().any(|f| f.position == pos)
    }

    /// Cost of stepping into `target`.
    ///
    /// Each surcharge applies at most once, however many forklifts trigger it.
    pub fn step_cost(&self, target: Position) -> u32 {
        let mut cost = BASE_COST;
        if self.is_occupied(target) {
            cost += OCCUPIED_PENALTY;
        }
        if self
            .others()
            .any(|f| f.position != target && f.position.chebyshev(&target) <= 1)
        {
            cost += PROXIMITY_PENALTY;
        }
        if self.others().any(|f| f.next_step == Some(target)) {
            cost += PLANNED_PENALTY;
        }
        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(id: &str, x: i32, y: i32, next: Option<(i32, i32)>) -> Footprint {
        Footprint {
            id: id.into(),
            position: Position::new(x, y),
            next_step: next.map(|(x, y)| Position::new(x, y)),
        }
    }

    #[test]
    fn empty_floor_costs_base() {
        assert_eq!(Contention::none().step_cost(Position::new(3, 3)), BASE_COST);
    }

    #[test]
    fn occupied_cell_is_expensive() {
        let fps = [fp("a", 5, 5, None)];
        let c = Contention::new(&fps, "me");
        assert_eq!(c.step_cost(Position::new(5, 5)), 1 + 1000);
        assert_eq!(c.step_cost(Position::new(6, 6)), 1 + 10);
        assert_eq!(c.step_cost(Position::new(7, 5)), 1);
    }

    #[test]
    fn planned_step_penalty() {
        let fps = [fp("a", 1, 1, Some((1, 2))), fp("b", 10, 10, None)];
        let c = Contention::new(&fps, "me");
        // (1, 2) is also adjacent to a
        assert_eq!(c.step_cost(Position::new(1, 2)), 1 + 10 + 50);
    }

    #[test]
    fn own_footprint_is_ignored() {
        let fps = [fp("me", 2, 2, Some((2, 3)))];
        let c = Contention::new(&fps, "me");
        assert_eq!(c.step_cost(Position::new(2, 2)), BASE_COST);
        assert_eq!(c.step_cost(Position::new(2, 3)), BASE_COST);
        assert!(!c.is_occupied(Position::new(2, 2)));
    }
}
