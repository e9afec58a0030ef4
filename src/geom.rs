use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use symm::atom::Atom;

/// bohr to Ångström (CODATA 2018)
pub const BOHR_TO_ANGSTROM: f64 = 0.529177210903;

/// a Cartesian geometry in Ångström
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Geom(pub Vec<Atom>);

impl Display for Geom {
    /// Q-Chem accepts atomic numbers in place of symbols, so write those
    /// instead of labels
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, atom) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "{:<5}{:15.10}{:15.10}{:15.10}",
                atom.atomic_number, atom.x, atom.y, atom.z,
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub struct GeomParseError(pub String);

impl Display for GeomParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to parse geometry line `{}`", self.0)
    }
}

impl std::error::Error for GeomParseError {}

impl FromStr for Geom {
    type Err = GeomParseError;

    /// parse an XYZ geometry, with or without the leading atom count and
    /// comment lines
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut atoms = Vec::new();
        let mut skip = 0;
        for line in s.lines() {
            let fields = line.split_whitespace().collect::<Vec<_>>();
            if skip > 0 {
                skip -= 1;
                continue;
            } else if fields.is_empty() {
                continue;
            } else if fields.len() == 1 {
                // atom count, followed by a comment line
                skip = 1;
                continue;
            } else {
                let atom = line
                    .parse::<Atom>()
                    .map_err(|_| GeomParseError(line.to_owned()))?;
                atoms.push(atom);
            }
        }
        Ok(Geom(atoms))
    }
}

impl Geom {
    /// convert `atoms` in bohr to a [Geom] in Ångström
    pub fn from_bohr(atoms: &[Atom]) -> Self {
        Self(
            atoms
                .iter()
                .map(|a| {
                    Atom::new(
                        a.atomic_number,
                        a.x * BOHR_TO_ANGSTROM,
                        a.y * BOHR_TO_ANGSTROM,
                        a.z * BOHR_TO_ANGSTROM,
                    )
                })
                .collect(),
        )
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
