//! Physical constants shared by the map mathematics.

/// Electron rest energy in GeV.
pub const ELECTRON_MASS_GEV: f64 = 0.000510998928;

/// Speed of light in vacuum, in m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
