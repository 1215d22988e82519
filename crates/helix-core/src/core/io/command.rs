use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Name of the output volume the simulated helix is written to.
pub const OUTPUT_VOLUME: &str = "init_model.mrc";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Invalid point group '{0}': expected a positive integer, optionally prefixed with 'C'")]
pub struct PointGroupError(pub String);

/// Cyclic point group `C_n` of a helix, where `n` is the number of starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointGroup(pub u32);

impl PointGroup {
    pub fn order(&self) -> u32 {
        self.0
    }
}

impl FromStr for PointGroup {
    type Err = PointGroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('C')
            .or_else(|| trimmed.strip_prefix('c'))
            .unwrap_or(trimmed);
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Ok(PointGroup(n)),
            _ => Err(PointGroupError(s.to_string())),
        }
    }
}

impl fmt::Display for PointGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Parameters of the helical initial-model simulation run by the reconstruction package.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructionCommand {
    pub rise: f64,
    pub twist: f64,
    pub point_group: PointGroup,
    pub tube_diameter: f64,
    pub subunit_diameter: f64,
    pub box_dimension: u32,
    pub pixel_size: f64,
}

impl fmt::Display for ReconstructionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "relion_helix_toolbox --simulate_helix --o {} --subunit_diameter {} \
             --cyl_outer_diameter {} --angpix {} --rise {} --twist {} --boxdim {} --sym_Cn {}",
            OUTPUT_VOLUME,
            self.subunit_diameter,
            self.tube_diameter,
            self.pixel_size,
            self.rise,
            self.twist,
            self.box_dimension,
            self.point_group.order()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_point_groups_with_and_without_prefix() {
        assert_eq!("C3".parse::<PointGroup>(), Ok(PointGroup(3)));
        assert_eq!(" 2 ".parse::<PointGroup>(), Ok(PointGroup(2)));
        assert_eq!("c1".parse::<PointGroup>(), Ok(PointGroup(1)));
        assert!("C0".parse::<PointGroup>().is_err());
        assert!("D2".parse::<PointGroup>().is_err());
        assert_eq!(PointGroup(4).to_string(), "C4");
    }

    #[test]
    fn formats_simulation_command() {
        let command = ReconstructionCommand {
            rise: 4.75,
            twist: -108.5,
            point_group: PointGroup(2),
            tube_diameter: 130.0,
            subunit_diameter: 31.0,
            box_dimension: 256,
            pixel_size: 1.08,
        };
        assert_eq!(
            command.to_string(),
            "relion_helix_toolbox --simulate_helix --o init_model.mrc --subunit_diameter 31 \
             --cyl_outer_diameter 130 --angpix 1.08 --rise 4.75 --twist -108.5 --boxdim 256 --sym_Cn 2"
        );
    }
}
