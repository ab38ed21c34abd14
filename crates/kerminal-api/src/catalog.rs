//! Known Telemachus API variables and actions.
//!
//! Plottables can be subscribed to and arrive with every pulse; actions are
//! sent through a `"run"` message. The tables pair each name with a short
//! human-readable label for display.

/// A variable or action name with its display label.
pub type Entry = (&'static str, &'static str);

// ── Plottables ───────────────────────────────────────────────────────

pub const TARGET: &[Entry] = &[
    ("tar.o.sma", "Target Semimajor Axis"),
    ("tar.o.lan", "Target Longitude of Ascending Node"),
    ("tar.o.maae", "Target Mean Anomaly at Epoch"),
    ("tar.name", "Target Name"),
    ("tar.type", "Target Type"),
    ("tar.distance", "Target Distance"),
    ("tar.o.velocity", "Target Velocity"),
    ("tar.o.PeA", "Target Periapsis"),
    ("tar.o.ApA", "Target Apoapsis"),
    ("tar.o.timeToAp", "Target Time to Apoapsis"),
    ("tar.o.timeToPe", "Target Time to Periapsis"),
    ("tar.o.inclination", "Target Inclination"),
    ("tar.o.eccentricity", "Target Eccentricity"),
    ("tar.o.period", "Target Orbital Period"),
    ("tar.o.relativeVelocity", "Target Relative Velocity"),
    ("tar.o.orbitingBody", "Target Orbiting Body"),
    ("tar.o.argumentOfPeriapsis", "Target Argument of Periapsis"),
    ("tar.o.timeToTransition1", "Target Time to Transition 1"),
    ("tar.o.timeToTransition2", "Target Time to Transition 2"),
    ("tar.o.timeOfPeriapsisPassage", "Target Time of Periapsis Passage"),
];

pub const DOCKING: &[Entry] = &[
    ("dock.ax", "Docking x Angle"),
    ("dock.ay", "Relative Pitch Angle"),
    ("dock.az", "Docking z Angle"),
    ("dock.x", "Target x Distance"),
    ("dock.y", "Target y Distance"),
];

pub const NAVBALL: &[Entry] = &[
    ("n.heading", "Heading"),
    ("n.pitch", "Pitch"),
    ("n.roll", "Roll"),
    ("n.rawheading", "Raw Heading"),
    ("n.rawpitch", "Raw Pitch"),
    ("n.rawroll", "Raw Roll"),
];

pub const VESSEL: &[Entry] = &[
    ("v.altitude", "Altitude"),
    ("v.heightFromTerrain", "Height from Terrain"),
    ("v.terrainHeight", "Terrain Height"),
    ("v.missionTime", "Mission Time"),
    ("v.surfaceVelocity", "Surface Velocity"),
    ("v.surfaceVelocityx", "Surface Velocity x"),
    ("v.surfaceVelocityy", "Surface Velocity y"),
    ("v.surfaceVelocityz", "Surface Velocity z"),
    ("v.angularVelocity", "Angular Velocity"),
    ("v.orbitalVelocity", "Orbital Velocity"),
    ("v.surfaceSpeed", "Surface Speed"),
    ("v.verticalSpeed", "Vertical Speed"),
    ("v.geeForce", "G-Force"),
    ("v.atmosphericDensity", "Atmospheric Density"),
    ("v.long", "Longitude"),
    ("v.lat", "Latitude"),
    ("v.dynamicPressure", "Dynamic Pressure"),
    ("v.name", "Name"),
    ("v.body", "Body Name"),
    ("v.angleToPrograde", "Angle to Prograde"),
];

pub const ORBIT: &[Entry] = &[
    ("o.relativeVelocity", "Relative Velocity"),
    ("o.PeA", "Periapsis"),
    ("o.ApA", "Apoapsis"),
    ("o.timeToAp", "Time to Apoapsis"),
    ("o.timeToPe", "Time to Periapsis"),
    ("o.inclination", "Inclination"),
    ("o.eccentricity", "Eccentricity"),
    ("o.epoch", "Epoch"),
    ("o.period", "Orbital Period"),
    ("o.argumentOfPeriapsis", "Argument of Periapsis"),
    ("o.timeToTransition1", "Time to Transition 1"),
    ("o.timeToTransition2", "Time to Transition 2"),
    ("o.sma", "Semimajor Axis"),
    ("o.lan", "Longitude of Ascending Node"),
    ("o.maae", "Mean Anomaly at Epoch"),
    ("o.timeOfPeriapsisPassage", "Time of Periapsis Passage"),
    ("o.trueAnomaly", "True Anomaly"),
];

pub const SENSOR: &[Entry] = &[
    ("s.sensor.temp", "Temperature Sensor"),
    ("s.sensor.pres", "Pressure Sensor"),
    ("s.sensor.grav", "Gravity Sensor"),
    ("s.sensor.acc", "Acceleration Sensor"),
];

pub const API: &[Entry] = &[("a.version", "Telemachus Version")];

pub const TIME_WARP: &[Entry] = &[("t.universalTime", "Universal Time")];

/// Every plottable group considered safe to subscribe to.
pub const PLOTTABLE_GROUPS: &[&[Entry]] =
    &[TARGET, DOCKING, NAVBALL, VESSEL, ORBIT, SENSOR, API, TIME_WARP];

/// Iterate over every safe plottable name, group by group.
pub fn plottables() -> impl Iterator<Item = &'static str> {
    PLOTTABLE_GROUPS
        .iter()
        .flat_map(|group| group.iter().map(|(name, _)| *name))
}

/// Display label for a known plottable.
pub fn label(name: &str) -> Option<&'static str> {
    PLOTTABLE_GROUPS
        .iter()
        .flat_map(|group| group.iter())
        .find(|(n, _)| *n == name)
        .map(|(_, label)| *label)
}

// ── Resources ────────────────────────────────────────────────────────

/// Resource variables take the resource name as an argument, e.g.
/// `r.resource[LiquidFuel]`.
pub fn resource(kind: ResourceQuery, resource_name: &str) -> String {
    let prefix = match kind {
        ResourceQuery::Total => "r.resource",
        ResourceQuery::CurrentStage => "r.resourceCurrent",
        ResourceQuery::Maximum => "r.resourceMax",
    };
    format!("{prefix}[{resource_name}]")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceQuery {
    Total,
    CurrentStage,
    Maximum,
}

// ── Actions ──────────────────────────────────────────────────────────

/// MechJeb SmartASS modes.
pub const SMART_ASS: &[Entry] = &[
    ("mj.smartassoff", "Smart ASS Off"),
    ("mj.node", "Node"),
    ("mj.prograde", "Prograde"),
    ("mj.retrograde", "Retrograde"),
    ("mj.normalplus", "Normal Plus"),
    ("mj.normalminus", "Normal Minus"),
    ("mj.radialplus", "Radial Plus"),
    ("mj.radialminus", "Radial Minus"),
    ("mj.targetplus", "Target Plus"),
    ("mj.targetminus", "Target Minus"),
    ("mj.relativeplus", "Relative Plus"),
    ("mj.relativeminus", "Relative Minus"),
    ("mj.parallelplus", "Parallel Plus"),
    ("mj.parallelminus", "Parallel Minus"),
    ("mj.surface", "Surface [heading, pitch]"),
    ("mj.surface2", "Surface [heading, pitch] (double)"),
];

pub const MAP_VIEW: &[Entry] = &[
    ("m.toggleMapView", "Toggle Map View"),
    ("m.enterMapView", "Enter Map View"),
    ("m.exitMapView", "Exit Map View"),
];
