//! Core types for the junction simulation
//!
//! Standalone data types shared by the arrival policies and the simulator.

use std::f32::consts::{FRAC_PI_2, PI};

/// A unique identifier for simulation agents
/// This is a simple wrapper around a u64 for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u64);

/// Class of agent moving through the junction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentClass {
    /// Motorized traffic in the vehicle lane
    Vehicle,
    /// Bicycles in the bike lane
    Bicycle,
    /// Pedestrians on the sidewalk crossing
    Pedestrian,
}

impl AgentClass {
    pub const ALL: [AgentClass; 3] = [
        AgentClass::Vehicle,
        AgentClass::Bicycle,
        AgentClass::Pedestrian,
    ];

    /// Travel speed in world units per simulated second
    pub fn base_speed(self) -> f32 {
        match self {
            AgentClass::Vehicle => 8.0,
            AgentClass::Bicycle => 5.0,
            AgentClass::Pedestrian => 2.0,
        }
    }

    /// Radius used for both car-following and accident separation checks
    pub fn safety_radius(self) -> f32 {
        match self {
            AgentClass::Vehicle => 4.0,
            AgentClass::Bicycle => 2.5,
            AgentClass::Pedestrian => 1.2,
        }
    }

    /// Perpendicular offset from the road centerline at the spawn edge
    pub fn lane_offset(self) -> f32 {
        match self {
            AgentClass::Vehicle => LANE_WIDTH / 2.0,
            AgentClass::Bicycle => BIKE_LANE_OFFSET,
            AgentClass::Pedestrian => SIDEWALK_OFFSET,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgentClass::Vehicle => "vehicle",
            AgentClass::Bicycle => "bicycle",
            AgentClass::Pedestrian => "pedestrian",
        }
    }
}

/// Body style for vehicle agents; other classes have no subdivision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleKind {
    Car,
    Motorcycle,
}

/// Axis a direction of travel belongs to, for right-of-way grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    EastWest,
    NorthSouth,
}

/// Travel direction through the junction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    EastToWest,
    WestToEast,
    NorthToSouth,
    SouthToNorth,
}

impl Direction {
    pub fn axis(self) -> Axis {
        match self {
            Direction::EastToWest | Direction::WestToEast => Axis::EastWest,
            Direction::NorthToSouth | Direction::SouthToNorth => Axis::NorthSouth,
        }
    }

    pub fn is_perpendicular_to(self, other: Direction) -> bool {
        self.axis() != other.axis()
    }

    /// Unit displacement per world unit traveled
    pub fn unit(self) -> (f32, f32) {
        match self {
            Direction::EastToWest => (-1.0, 0.0),
            Direction::WestToEast => (1.0, 0.0),
            Direction::NorthToSouth => (0.0, 1.0),
            Direction::SouthToNorth => (0.0, -1.0),
        }
    }

    /// Y-axis rotation a renderer should apply to face this direction
    pub fn heading(self) -> f32 {
        match self {
            Direction::EastToWest => -FRAC_PI_2,
            Direction::WestToEast => FRAC_PI_2,
            Direction::NorthToSouth => 0.0,
            Direction::SouthToNorth => PI,
        }
    }

    /// Whether `(dx, dz)` (other minus self) points ahead along this
    /// direction and inside the lateral band
    pub fn is_ahead(self, dx: f32, dz: f32, lateral_band: f32) -> bool {
        match self {
            Direction::EastToWest => dx < 0.0 && dz.abs() < lateral_band,
            Direction::WestToEast => dx > 0.0 && dz.abs() < lateral_band,
            Direction::NorthToSouth => dz > 0.0 && dx.abs() < lateral_band,
            Direction::SouthToNorth => dz < 0.0 && dx.abs() < lateral_band,
        }
    }
}

/// One of the four compass spawn edges around the junction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Approach {
    East = 1,
    North = 2,
    West = 3,
    South = 4,
}

impl Approach {
    pub const ALL: [Approach; 4] = [
        Approach::East,
        Approach::North,
        Approach::West,
        Approach::South,
    ];

    /// Each edge feeds exactly one direction of travel
    pub fn direction(self) -> Direction {
        match self {
            Approach::East => Direction::EastToWest,
            Approach::North => Direction::NorthToSouth,
            Approach::West => Direction::WestToEast,
            Approach::South => Direction::SouthToNorth,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Spawn-edge position for an agent entering here, `offset` to the
    /// right of the centerline (lane offset by class)
    pub fn spawn_position(self, offset: f32) -> Position {
        match self {
            Approach::East => Position::new(SPAWN_DISTANCE, -offset),
            Approach::North => Position::new(offset, -SPAWN_DISTANCE),
            Approach::West => Position::new(-SPAWN_DISTANCE, offset),
            Approach::South => Position::new(-offset, SPAWN_DISTANCE),
        }
    }
}

/// A ground-plane position in the simulation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    pub fn distance(&self, other: &Position) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Distance to the junction center at the origin
    pub fn distance_to_center(&self) -> f32 {
        (self.x * self.x + self.z * self.z).sqrt()
    }

    pub fn midpoint(&self, other: &Position) -> Position {
        Position {
            x: (self.x + other.x) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }
}

/// Width of one vehicle lane in world units
pub const LANE_WIDTH: f32 = 3.5;

/// Bike lane offset from the road centerline
pub const BIKE_LANE_OFFSET: f32 = 4.25;

/// Sidewalk offset from the road centerline
pub const SIDEWALK_OFFSET: f32 = LANE_WIDTH * 2.0 + 4.0;

/// Distance from the junction center at which agents spawn
pub const SPAWN_DISTANCE: f32 = 40.0;

/// Margin past the spawn distance after which an agent has fully crossed
pub const EXIT_MARGIN: f32 = 10.0;

/// Junction interior radius; crossing it passes the stop line
pub const STOP_LINE_DISTANCE: f32 = 8.0;

/// Outer radius of the signal approach band
pub const SIGNAL_GATE_DISTANCE: f32 = 12.0;

/// Radius of the zone scanned for perpendicular collisions
pub const ACCIDENT_ZONE_RADIUS: f32 = 10.0;

/// Fraction of the combined safety radius that counts as an impact
pub const ACCIDENT_RADIUS_SCALE: f32 = 0.8;

/// Simulated seconds an accident blocks the junction before clearing
pub const ACCIDENT_DURATION: f32 = 5.0;

/// Per-tick chance that a non-respecting agent stops at a red anyway
pub const SIGNAL_VIOLATION_STOP_CHANCE: f32 = 0.02;

/// Default lateral band for the car-following ahead test
pub const DEFAULT_FOLLOW_LATERAL_BAND: f32 = 2.0;
