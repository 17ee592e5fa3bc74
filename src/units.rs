//! Output units for exported results. Internally everything is SI (m, N).

use serde::{Deserialize, Serialize};
use uom::si::f64::{Force, Length};
use uom::si::{force, length};

/// Length unit for displacement output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    Meter,
    Centimeter,
    Millimeter,
    Foot,
    Inch,
}

impl LengthUnit {
    /// Convert a value in meters to this unit
    pub fn from_base(self, meters: f64) -> f64 {
        let value = Length::new::<length::meter>(meters);
        match self {
            Self::Meter => value.get::<length::meter>(),
            Self::Centimeter => value.get::<length::centimeter>(),
            Self::Millimeter => value.get::<length::millimeter>(),
            Self::Foot => value.get::<length::foot>(),
            Self::Inch => value.get::<length::inch>(),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Centimeter => "cm",
            Self::Millimeter => "mm",
            Self::Foot => "ft",
            Self::Inch => "in",
        }
    }
}

/// Force unit for load and reaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ForceUnit {
    #[default]
    Newton,
    Kilonewton,
    Meganewton,
    PoundForce,
    Kip,
}

impl ForceUnit {
    /// Convert a value in newtons to this unit
    pub fn from_base(self, newtons: f64) -> f64 {
        let value = Force::new::<force::newton>(newtons);
        match self {
            Self::Newton => value.get::<force::newton>(),
            Self::Kilonewton => value.get::<force::kilonewton>(),
            Self::Meganewton => value.get::<force::meganewton>(),
            Self::PoundForce => value.get::<force::pound_force>(),
            Self::Kip => value.get::<force::kip>(),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Newton => "N",
            Self::Kilonewton => "kN",
            Self::Meganewton => "MN",
            Self::PoundForce => "lbf",
            Self::Kip => "kip",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_conversion() {
        assert_relative_eq!(LengthUnit::Millimeter.from_base(0.25), 250.0, max_relative = 1e-12);
        assert_relative_eq!(LengthUnit::Inch.from_base(0.0254), 1.0, max_relative = 1e-12);
        assert_relative_eq!(LengthUnit::Foot.from_base(0.3048), 1.0, max_relative = 1e-12);
        assert_eq!(LengthUnit::default().symbol(), "m");
    }

    #[test]
    fn test_force_conversion() {
        assert_relative_eq!(ForceUnit::Kilonewton.from_base(1500.0), 1.5, max_relative = 1e-12);
        assert_relative_eq!(ForceUnit::PoundForce.from_base(4.448_222), 1.0, max_relative = 1e-6);
        assert_relative_eq!(ForceUnit::Kip.from_base(4448.222), 1.0, max_relative = 1e-6);
        assert_eq!(ForceUnit::Kip.symbol(), "kip");
    }
}
