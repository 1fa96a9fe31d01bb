// THEORY:
// The `SpatialAggregator` is the engine of the spatial layer. It reads the motion
// field once, on a fixed `G x G` grid of sample positions, and reduces it into three
// parallel encodings of "where is the motion":
//
// 1.  **QuadrantSums**: mean intensity in each screen quadrant.
// 2.  **ZoneSums**: mean intensity in each cell of a 3x3 partition. Eight zones are
//     accumulated directly; the center zone is estimated as the average of its left
//     and right neighbours. This keeps the accumulator to eight zone slots and is an
//     approximation, not an exact reading of the center zone.
// 3.  **WeightedCentroid**: the intensity-weighted center of mass of the grid plus the
//     total intensity ("total motion").
//
// All three come from the same grid and the same field snapshot within one call, so
// consumers can mix them freely. The grid is bounded (default 72x72) regardless of
// frame size, which fixes the cost of this pass; `grid_resolution` trades that cost
// for precision without changing the algorithm.
//
// Rows of the grid are reduced in parallel into partial accumulators that are then
// merged, the same per-row split the other passes use.

use crate::core_modules::motion_detector::MotionField;
use crate::core_modules::point::Point;
use rayon::prelude::*;

/// Default number of grid samples per axis.
pub const DEFAULT_GRID_RESOLUTION: u32 = 72;
/// Thirds need at least three samples per axis.
pub const MIN_GRID_RESOLUTION: u32 = 3;
/// Totals and weights below this are treated as "no motion".
pub const MOTION_EPSILON: f32 = 1e-5;

const ONE_THIRD: f32 = 1.0 / 3.0;
const TWO_THIRDS: f32 = 2.0 / 3.0;

/// The screen quadrants, in the order `QuadrantSums::as_array` reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// The quadrant a normalized position falls in; the center line belongs to the
    /// right/bottom side.
    pub fn containing(position: Point) -> Quadrant {
        match (position.x < 0.5, position.y < 0.5) {
            (true, true) => Quadrant::TopLeft,
            (false, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BottomLeft,
            (false, false) => Quadrant::BottomRight,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// The reference position used when this quadrant carries the motion.
    pub fn center(self) -> Point {
        match self {
            Quadrant::TopLeft => Point::new(0.25, 0.25),
            Quadrant::TopRight => Point::new(0.75, 0.25),
            Quadrant::BottomLeft => Point::new(0.25, 0.75),
            Quadrant::BottomRight => Point::new(0.75, 0.75),
        }
    }
}

/// Mean motion intensity per screen quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QuadrantSums {
    pub top_left: f32,
    pub top_right: f32,
    pub bottom_left: f32,
    pub bottom_right: f32,
}

impl QuadrantSums {
    pub fn from_array([top_left, top_right, bottom_left, bottom_right]: [f32; 4]) -> Self {
        Self {
            top_left,
            top_right,
            bottom_left,
            bottom_right,
        }
    }

    pub fn as_array(&self) -> [f32; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }

    pub fn get(&self, quadrant: Quadrant) -> f32 {
        self.as_array()[quadrant.index()]
    }

    /// The intensity of the busiest quadrant.
    pub fn dominant(&self) -> f32 {
        self.as_array().into_iter().fold(0.0, f32::max)
    }

    /// The busiest quadrant; ties resolve in `Quadrant::ALL` order.
    pub fn dominant_quadrant(&self) -> Quadrant {
        let values = self.as_array();
        Quadrant::ALL
            .into_iter()
            .fold(Quadrant::TopLeft, |best, candidate| {
                if values[candidate.index()] > values[best.index()] {
                    candidate
                } else {
                    best
                }
            })
    }

    pub fn total(&self) -> f32 {
        self.as_array().into_iter().sum()
    }

    pub fn mean(&self) -> f32 {
        self.total() / 4.0
    }

    /// Combined intensity of the three quadrants that are not dominant.
    pub fn sum_of_others(&self) -> f32 {
        (self.total() - self.dominant()).max(0.0)
    }
}

/// Mean motion intensity per cell of a 3x3 screen partition, row-major.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoneSums {
    pub zones: [f32; 9],
}

impl ZoneSums {
    /// The zone whose value is estimated rather than accumulated.
    pub const ESTIMATED_ZONE: usize = 4;

    /// Row-major index of the zone a normalized position falls in.
    pub fn zone_index(position: Point) -> usize {
        third_of(position.y) * 3 + third_of(position.x)
    }

    /// The reference position of a zone (its center).
    pub fn zone_center(index: usize) -> Point {
        let column = (index % 3) as f32;
        let row = (index / 3 % 3) as f32;
        Point::new((column + 0.5) / 3.0, (row + 0.5) / 3.0)
    }

    pub fn zone(&self, column: usize, row: usize) -> f32 {
        self.zones[row.min(2) * 3 + column.min(2)]
    }

    pub fn total(&self) -> f32 {
        self.zones.iter().sum()
    }
}

#[inline]
fn third_of(coordinate: f32) -> usize {
    if coordinate < ONE_THIRD {
        0
    } else if coordinate < TWO_THIRDS {
        1
    } else {
        2
    }
}

/// The intensity-weighted center of mass of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedCentroid {
    /// The center of mass, or the screen center when there is no motion.
    pub center: Point,
    /// The sum of every sampled intensity.
    pub total_motion: f32,
}

impl Default for WeightedCentroid {
    fn default() -> Self {
        Self {
            center: Point::SCREEN_CENTER,
            total_motion: 0.0,
        }
    }
}

/// Three encodings of the same motion field snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusStatistics {
    pub quadrants: QuadrantSums,
    pub zones: ZoneSums,
    pub centroid: WeightedCentroid,
    /// Samples per axis of the grid the statistics were taken on.
    pub grid_resolution: u32,
}

impl Default for FocusStatistics {
    fn default() -> Self {
        Self {
            quadrants: QuadrantSums::default(),
            zones: ZoneSums::default(),
            centroid: WeightedCentroid::default(),
            grid_resolution: DEFAULT_GRID_RESOLUTION,
        }
    }
}

impl FocusStatistics {
    /// Whether the field carried enough motion for any statistic to mean something.
    pub fn has_motion(&self) -> bool {
        self.centroid.total_motion >= MOTION_EPSILON
    }
}

/// Partial sums for a band of grid rows.
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    quadrant_sums: [f32; 4],
    quadrant_counts: [u32; 4],
    zone_sums: [f32; 9],
    zone_counts: [u32; 9],
    weighted_x: f32,
    weighted_y: f32,
    total: f32,
}

impl Accumulator {
    fn add(&mut self, position: Point, intensity: f32) {
        let quadrant = Quadrant::containing(position).index();
        self.quadrant_sums[quadrant] += intensity;
        self.quadrant_counts[quadrant] += 1;

        let zone = ZoneSums::zone_index(position);
        if zone != ZoneSums::ESTIMATED_ZONE {
            self.zone_sums[zone] += intensity;
            self.zone_counts[zone] += 1;
        }

        self.weighted_x += position.x * intensity;
        self.weighted_y += position.y * intensity;
        self.total += intensity;
    }

    fn merge(mut self, other: Accumulator) -> Accumulator {
        for i in 0..4 {
            self.quadrant_sums[i] += other.quadrant_sums[i];
            self.quadrant_counts[i] += other.quadrant_counts[i];
        }
        for i in 0..9 {
            self.zone_sums[i] += other.zone_sums[i];
            self.zone_counts[i] += other.zone_counts[i];
        }
        self.weighted_x += other.weighted_x;
        self.weighted_y += other.weighted_y;
        self.total += other.total;
        self
    }

    fn finish(self, grid_resolution: u32) -> FocusStatistics {
        let mut quadrant_means = [0.0; 4];
        for (i, mean) in quadrant_means.iter_mut().enumerate() {
            *mean = self.quadrant_sums[i] / self.quadrant_counts[i].max(1) as f32;
        }

        let mut zones = [0.0; 9];
        for (i, zone) in zones.iter_mut().enumerate() {
            if i != ZoneSums::ESTIMATED_ZONE {
                *zone = self.zone_sums[i] / self.zone_counts[i].max(1) as f32;
            }
        }
        zones[ZoneSums::ESTIMATED_ZONE] = (zones[3] + zones[5]) * 0.5;

        let centroid = if self.total < MOTION_EPSILON {
            WeightedCentroid {
                center: Point::SCREEN_CENTER,
                total_motion: self.total,
            }
        } else {
            WeightedCentroid {
                center: Point::new(self.weighted_x / self.total, self.weighted_y / self.total),
                total_motion: self.total,
            }
        };

        FocusStatistics {
            quadrants: QuadrantSums::from_array(quadrant_means),
            zones: ZoneSums { zones },
            centroid,
            grid_resolution,
        }
    }
}

/// Reduces `field` into quadrant, zone and centroid statistics on a `grid x grid` grid.
pub fn aggregate(field: &MotionField, grid_resolution: u32) -> FocusStatistics {
    let grid = grid_resolution.max(MIN_GRID_RESOLUTION);
    let spacing = 1.0 / grid as f32;

    (0..grid)
        .into_par_iter()
        .map(|row| {
            let mut accumulator = Accumulator::default();
            let v = (row as f32 + 0.5) * spacing;
            for column in 0..grid {
                let u = (column as f32 + 0.5) * spacing;
                accumulator.add(Point::new(u, v), field.sample_nearest(u, v));
            }
            accumulator
        })
        .reduce(Accumulator::default, Accumulator::merge)
        .finish(grid)
}
