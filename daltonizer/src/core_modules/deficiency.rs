// THEORY:
// The `deficiency` module turns a run's configuration (which deficiency, how
// strong) into the plain matrices the per-pixel transform needs. Nothing here is
// computed per pixel: `CorrectionMatrices::new` runs once per batch and the
// result is copied into every worker.
//
// Every non-trivial entry is a straight line between "no effect" and the
// canonical simulation constant, driven by the strength percentage. At strength
// 0 every matrix is the identity: the simulation changes nothing and the
// compensation passes each channel's error straight through. At strength 100 the
// deficiency matrices are the published simulation matrices, and the
// compensation drops the red error and adds 0.7 of the green and blue error to
// red instead.

pub mod deficiency {
    use crate::core_modules::color_space::color_space::{IDENTITY, Matrix3};
    use crate::error::{DaltonizeError, Result};
    use std::fmt;
    use std::str::FromStr;

    pub const MAX_STRENGTH: u8 = 100;

    /// The color-vision deficiency a run corrects for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Deficiency {
        /// Missing long-wavelength (red) cone response.
        Protanopia,
        /// Missing medium-wavelength (green) cone response.
        Deuteranopia,
        /// Missing short-wavelength (blue) cone response.
        Tritanopia,
    }

    impl Deficiency {
        pub const ALL: [Deficiency; 3] = [
            Deficiency::Protanopia,
            Deficiency::Deuteranopia,
            Deficiency::Tritanopia,
        ];

        /// Only the first character is significant, compared case-insensitively.
        pub fn parse(input: &str) -> Result<Self> {
            match input.trim_start().chars().next().map(|c| c.to_ascii_lowercase()) {
                Some('p') => Ok(Deficiency::Protanopia),
                Some('d') => Ok(Deficiency::Deuteranopia),
                Some('t') => Ok(Deficiency::Tritanopia),
                _ => Err(DaltonizeError::UnrecognizedKind {
                    input: input.to_string(),
                }),
            }
        }

        /// The row of the simulation matrix that differs from the identity.
        pub fn affected_row(self) -> usize {
            match self {
                Deficiency::Protanopia => 0,
                Deficiency::Deuteranopia => 1,
                Deficiency::Tritanopia => 2,
            }
        }
    }

    impl FromStr for Deficiency {
        type Err = DaltonizeError;

        fn from_str(s: &str) -> Result<Self> {
            Deficiency::parse(s)
        }
    }

    impl fmt::Display for Deficiency {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            let name = match self {
                Deficiency::Protanopia => "Protanopia",
                Deficiency::Deuteranopia => "Deuteranopia",
                Deficiency::Tritanopia => "Tritanopia",
            };
            f.write_str(name)
        }
    }

    /// Correction strength as a percentage, 0..=100.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct Strength(u8);

    impl Strength {
        pub const FULL: Strength = Strength(MAX_STRENGTH);
        pub const NONE: Strength = Strength(0);

        pub fn new(value: u8) -> Result<Self> {
            if value > MAX_STRENGTH {
                return Err(DaltonizeError::InvalidStrength {
                    input: value.to_string(),
                });
            }
            Ok(Strength(value))
        }

        pub fn parse(input: &str) -> Result<Self> {
            let invalid = || DaltonizeError::InvalidStrength {
                input: input.to_string(),
            };
            let value: u8 = input.trim().parse().map_err(|_| invalid())?;
            Strength::new(value).map_err(|_| invalid())
        }

        pub fn value(self) -> u8 {
            self.0
        }

        /// Percentage left over, `100 - strength`.
        pub fn complement(self) -> u8 {
            MAX_STRENGTH - self.0
        }
    }

    impl Default for Strength {
        fn default() -> Self {
            Strength::FULL
        }
    }

    impl FromStr for Strength {
        type Err = DaltonizeError;

        fn from_str(s: &str) -> Result<Self> {
            Strength::parse(s)
        }
    }

    impl fmt::Display for Strength {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    /// Linear interpolation from 0 (strength 0) to `target` (strength 100).
    #[inline]
    pub fn interpolate(target: f64, strength: u8) -> f64 {
        target * (strength as f64 / MAX_STRENGTH as f64)
    }

    /// LMS-space simulation matrix for `kind` at the given strength.
    pub fn build_matrix(kind: Deficiency, strength: Strength) -> Matrix3 {
        let s = strength.value();
        let keep = strength.complement();
        let mut matrix = IDENTITY;
        matrix[kind.affected_row()] = match kind {
            Deficiency::Protanopia => [
                interpolate(1.0, keep),
                interpolate(1.05118294, s),
                interpolate(-0.05116099, s),
            ],
            Deficiency::Deuteranopia => [
                interpolate(0.9513092, s),
                interpolate(1.0, keep),
                interpolate(0.04866992, s),
            ],
            Deficiency::Tritanopia => [
                interpolate(-0.86744736, s),
                interpolate(1.86727089, s),
                interpolate(1.0, keep),
            ],
        };
        matrix
    }

    /// Mixes the RGB simulation error back into red.
    ///
    /// With row vectors, `out_r = e_r * (1 - s) + 0.7s * (e_g + e_b)` while green and
    /// blue keep their own error unchanged.
    pub fn build_compensation_matrix(strength: Strength) -> Matrix3 {
        let shift = interpolate(0.7, strength.value());
        [
            [interpolate(1.0, strength.complement()), 0.0, 0.0],
            [shift, 1.0, 0.0],
            [shift, 0.0, 1.0],
        ]
    }

    /// A run's configuration: which deficiency to correct and how hard.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DaltonizeConfig {
        pub kind: Deficiency,
        pub strength: Strength,
    }

    impl DaltonizeConfig {
        pub fn new(kind: Deficiency, strength: Strength) -> Self {
            Self { kind, strength }
        }

        pub fn matrices(&self) -> CorrectionMatrices {
            CorrectionMatrices::new(self)
        }
    }

    /// Every matrix one run needs, derived from a single configuration.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct CorrectionMatrices {
        pub kind: Deficiency,
        pub simulation: Matrix3,
        pub compensation: Matrix3,
    }

    impl CorrectionMatrices {
        pub fn new(config: &DaltonizeConfig) -> Self {
            Self {
                kind: config.kind,
                simulation: build_matrix(config.kind, config.strength),
                compensation: build_compensation_matrix(config.strength),
            }
        }
    }
}
