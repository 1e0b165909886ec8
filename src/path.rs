//! Path inputs consumed by the occupancy index
//!
//! Path planning lives outside this crate. Planners hand us their route as
//! anything implementing [`PathPoint`]; identifiers are read once at
//! registration time, so the index never holds on to planner objects.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::types::{CellId, PointId};

/// A point on a planned route
pub trait PathPoint {
    /// Identifier of the exact road point
    fn point_id(&self) -> PointId;

    /// Coarse cell the road point falls into
    fn cell_id(&self) -> CellId;
}

impl<T: PathPoint + ?Sized> PathPoint for &T {
    fn point_id(&self) -> PointId {
        (**self).point_id()
    }

    fn cell_id(&self) -> CellId {
        (**self).cell_id()
    }
}

impl<T: PathPoint + ?Sized> PathPoint for Arc<T> {
    fn point_id(&self) -> PointId {
        (**self).point_id()
    }

    fn cell_id(&self) -> CellId {
        (**self).cell_id()
    }
}

/// Plain resolved waypoint: a point and the cell it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Waypoint {
    pub point: PointId,
    pub cell: CellId,
}

impl Waypoint {
    pub fn new(point: u64, cell: u64) -> Self {
        Self {
            point: PointId(point),
            cell: CellId(cell),
        }
    }
}

impl PathPoint for Waypoint {
    fn point_id(&self) -> PointId {
        self.point
    }

    fn cell_id(&self) -> CellId {
        self.cell
    }
}

impl PathPoint for (PointId, CellId) {
    fn point_id(&self) -> PointId {
        self.0
    }

    fn cell_id(&self) -> CellId {
        self.1
    }
}

/// Ordered, indexable sequence of path points (a planner's lookahead buffer)
pub trait PathBuffer {
    type Point: PathPoint;

    fn len(&self) -> usize;

    fn point_at(&self, index: usize) -> Option<&Self::Point>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: PathPoint> PathBuffer for [P] {
    type Point = P;

    fn len(&self) -> usize {
        <[P]>::len(self)
    }

    fn point_at(&self, index: usize) -> Option<&P> {
        self.get(index)
    }
}

impl<P: PathPoint> PathBuffer for Vec<P> {
    type Point = P;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn point_at(&self, index: usize) -> Option<&P> {
        self.get(index)
    }
}

impl<P: PathPoint> PathBuffer for VecDeque<P> {
    type Point = P;

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn point_at(&self, index: usize) -> Option<&P> {
        self.get(index)
    }
}

/// Buffer offsets read by sampled registration
///
/// Yields `sample_count + 1` offsets `min(i * stride, len - 1)` with
/// `stride = len / sample_count`. The last offset is always `len - 1`, so
/// both buffer ends are covered even when the stride rounds down. Yields
/// nothing for an empty buffer. Offsets may repeat on short buffers.
pub fn sample_offsets(len: usize, sample_count: usize) -> impl Iterator<Item = usize> {
    let last = len.saturating_sub(1);
    let stride = if sample_count == 0 { 0 } else { len / sample_count };
    let count = if len == 0 { 0 } else { sample_count + 1 };

    (0..count).map(move |i| {
        if i == sample_count {
            last
        } else {
            (i * stride).min(last)
        }
    })
}
