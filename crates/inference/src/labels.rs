/// Class names in model output order.
pub const LABELS: [&str; 50] = [
    "AIR COMPRESSOR",
    "ALTERNATOR",
    "BATTERY",
    "BRAKE CALIPER",
    "BRAKE PAD",
    "BRAKE ROTOR",
    "CAMSHAFT",
    "CARBERATOR",
    "CLUTCH PLATE",
    "COIL SPRING",
    "CRANKSHAFT",
    "CYLINDER HEAD",
    "DISTRIBUTOR",
    "ENGINE BLOCK",
    "ENGINE VALVE",
    "FUEL INJECTOR",
    "FUSE BOX",
    "GAS CAP",
    "HEADLIGHTS",
    "IDLER ARM",
    "IGNITION COIL",
    "INSTRUMENT CLUSTER",
    "LEAF SPRING",
    "LOWER CONTROL ARM",
    "MUFFLER",
    "OIL FILTER",
    "OIL PAN",
    "OIL PRESSURE SENSOR",
    "OVERFLOW TANK",
    "OXYGEN SENSOR",
    "PISTON",
    "PRESSURE PLATE",
    "RADIATOR",
    "RADIATOR FAN",
    "RADIATOR HOSE",
    "RADIO",
    "RIM",
    "SHIFT KNOB",
    "SIDE MIRROR",
    "SPARK PLUG",
    "SPOILER",
    "STARTER",
    "TAILLIGHTS",
    "THERMOSTAT",
    "TORQUE CONVERTER",
    "TRANSMISSION",
    "VACUUM BRAKE BOOSTER",
    "VALVE LIFTER",
    "WATER PUMP",
    "WINDOW REGULATOR",
];

pub const NUM_CLASSES: usize = LABELS.len();

/// Name of `class_id`.
///
/// # Panics
/// If `class_id >= NUM_CLASSES`. Class ids come from an argmax over exactly
/// `NUM_CLASSES` scores, so an out-of-range id is a decoding bug.
#[inline]
pub fn label_of(class_id: usize) -> &'static str {
    LABELS[class_id]
}
