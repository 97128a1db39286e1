//! Conversion of code units to cgs by variable name

// crate modules
use crate::error::Result;
use crate::info::Info;

/// Code unit scales of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodeUnits {
    /// Length unit in cm
    pub unit_l: f64,
    /// Density unit in g/cm3
    pub unit_d: f64,
    /// Time unit in s
    pub unit_t: f64,
}

impl CodeUnits {
    /// Take the unit scales from run metadata
    pub fn from_info(info: &Info) -> Result<Self> {
        Ok(Self {
            unit_l: info.float("unit_l")?,
            unit_d: info.float("unit_d")?,
            unit_t: info.float("unit_t")?,
        })
    }

    fn velocity(&self) -> f64 {
        self.unit_l / self.unit_t
    }

    /// Multiplier and unit string that convert `name` to cgs
    ///
    /// Geometry columns are converted to cm and labelled with the length
    /// scale name, since they are rescaled by recentring straight after.
    ///
    /// ```rust
    /// # use amrtools_ramses::CodeUnits;
    /// let units = CodeUnits { unit_l: 2.0, unit_d: 3.0, unit_t: 4.0 };
    ///
    /// assert_eq!(units.rule("density", "au"), (3.0, "g/cm3"));
    /// assert_eq!(units.rule("velocity_x", "au"), (0.5, "cm/s"));
    /// assert_eq!(units.rule("dx", "au"), (2.0, "au"));
    /// assert_eq!(units.rule("passive_scalar", "au"), (1.0, ""));
    /// ```
    pub fn rule<'a>(&self, name: &str, scale: &'a str) -> (f64, &'a str) {
        let ud = self.unit_d;
        let uv = self.velocity();

        match name {
            "density" => (ud, "g/cm3"),
            "x" | "y" | "z" | "dx" => (self.unit_l, scale),
            "temperature" => (1.0, "K"),
            n if n.starts_with("velocity") => (uv, "cm/s"),
            n if n.starts_with("momentum") => (ud * uv, "g/cm2/s"),
            n if n.starts_with("B_") => ((4.0 * std::f64::consts::PI * ud * uv * uv).sqrt(), "G"),
            n if ["thermal_pressure", "total_energy", "radiative_energy"]
                .iter()
                .any(|p| n.starts_with(p)) =>
            {
                (ud * uv * uv, "erg/cm3")
            }
            _ => (1.0, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units() -> CodeUnits {
        CodeUnits {
            unit_l: 2.0,
            unit_d: 3.0,
            unit_t: 4.0,
        }
    }

    #[test]
    fn energy_densities() {
        // 3 * 0.5^2
        assert_eq!(units().rule("thermal_pressure", "au"), (0.75, "erg/cm3"));
        assert_eq!(units().rule("total_energy", "au"), (0.75, "erg/cm3"));
        assert_eq!(units().rule("radiative_energy_2", "au"), (0.75, "erg/cm3"));
    }

    #[test]
    fn magnetic_field() {
        let (scale, unit) = units().rule("B_left_y", "au");
        assert_eq!(unit, "G");
        assert!((scale - (4.0 * std::f64::consts::PI * 0.75).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn momentum_and_level() {
        assert_eq!(units().rule("momentum_z", "pc"), (1.5, "g/cm2/s"));
        assert_eq!(units().rule("level", "pc"), (1.0, ""));
        assert_eq!(units().rule("temperature", "pc"), (1.0, "K"));
        assert_eq!(units().rule("y", "pc"), (2.0, "pc"));
    }
}
