//! The Gaussian 16 `External` file formats. Gaussian invokes the external
//! program as
//!
//! ```text
//! script layer InputFile OutputFile MsgFile FChkFile MatElFile
//! ```
//!
//! where `InputFile` describes the calculation and `OutputFile` has to be
//! filled in with the energy and whatever derivatives were requested.

use std::{
    fmt::Display,
    fs::{read_to_string, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    str::FromStr,
};

use symm::Atom;

#[cfg(test)]
mod tests;

#[derive(Debug, PartialEq)]
pub enum ExternalError {
    EmptyInput,
    BadHeader(String),
    Truncated { want: usize, got: usize },
    BadAtom(String),
    BadDerivative(usize),
    Usage(usize),
    Io(String),
}

impl Display for ExternalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalError::EmptyInput => write!(f, "Gaussian input file is empty"),
            ExternalError::BadHeader(h) => {
                write!(f, "malformed header line `{h}`")
            }
            ExternalError::Truncated { want, got } => write!(
                f,
                "Gaussian input file is truncated: expected {want} atoms, \
		 got {got}"
            ),
            ExternalError::BadAtom(l) => write!(f, "malformed atom line `{l}`"),
            ExternalError::BadDerivative(n) => {
                write!(f, "unsupported derivative order {n}")
            }
            ExternalError::Usage(n) => write!(
                f,
                "expected at least 4 arguments (layer InputFile OutputFile \
		 MsgFile), got {n}"
            ),
            ExternalError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ExternalError {}

/// the derivative order requested by Gaussian (NDer)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Derivative {
    Energy,
    Gradient,
    Hessian,
}

impl TryFrom<usize> for Derivative {
    type Error = ExternalError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Energy),
            1 => Ok(Self::Gradient),
            2 => Ok(Self::Hessian),
            n => Err(ExternalError::BadDerivative(n)),
        }
    }
}

/// the paths Gaussian passes on the command line
#[derive(Debug, PartialEq)]
pub struct Invocation {
    pub layer: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub msg: PathBuf,
    pub fchk: Option<PathBuf>,
    pub matel: Option<PathBuf>,
}

impl Invocation {
    /// build an [Invocation] from the arguments following the program name
    pub fn from_args<I, S>(args: I) -> Result<Self, ExternalError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if args.len() < 4 {
            return Err(ExternalError::Usage(args.len()));
        }
        let mut args = args.into_iter();
        // checked the length above
        let mut next = || args.next().unwrap_or_default();
        let layer = next();
        let input = next().into();
        let output = next().into();
        let msg = next().into();
        let fchk = Some(next()).filter(|s| !s.is_empty()).map(PathBuf::from);
        let matel = Some(next()).filter(|s| !s.is_empty()).map(PathBuf::from);
        Ok(Self {
            layer,
            input,
            output,
            msg,
            fchk,
            matel,
        })
    }
}

/// a calculation request read from an EIn file. coordinates are in bohr
#[derive(Debug, PartialEq)]
pub struct Calculation {
    pub derivative: Derivative,
    pub charge: isize,
    pub multiplicity: usize,
    pub atoms: Vec<Atom>,
    pub mm_charges: Vec<f64>,
}

impl Calculation {
    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    /// whether any atom carries a nonzero MM charge. Q-Chem never sees these
    pub fn has_mm_charges(&self) -> bool {
        self.mm_charges.iter().any(|&q| q != 0.0)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ExternalError> {
        let path = path.as_ref();
        let contents = read_to_string(path).map_err(|e| {
            ExternalError::Io(format!("failed to read {}: {e}", path.display()))
        })?;
        contents.parse()
    }
}

fn parse_fields<T: FromStr>(s: &str) -> Option<Vec<T>> {
    s.split_whitespace().map(|f| f.parse().ok()).collect()
}

impl FromStr for Calculation {
    type Err = ExternalError;

    /// parse an EIn file like
    ///
    /// ```text
    ///          3         2         0         1
    ///          8        0.000000000000        0.000000000000       -0.124238490912        0.000000000000
    ///          1        0.000000000000        1.431498280405        0.985865290419        0.000000000000
    ///          1        0.000000000000       -1.431498280405        0.985865290419        0.000000000000
    /// ```
    ///
    /// The header holds NAtoms, NDer, ICharg, and Multip, and each atom line
    /// holds the atomic number, x, y, z, and the MM charge.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let header = lines.next().ok_or(ExternalError::EmptyInput)?;
        if header.trim().is_empty() {
            return Err(ExternalError::EmptyInput);
        }
        let bad_header = || ExternalError::BadHeader(header.to_owned());
        let fields: Vec<isize> = parse_fields(header).ok_or_else(bad_header)?;
        let [natoms, nder, charge, multiplicity] = fields[..] else {
            return Err(bad_header());
        };
        let natoms: usize = natoms.try_into().map_err(|_| bad_header())?;
        let nder: usize = nder.try_into().map_err(|_| bad_header())?;
        let multiplicity: usize =
            multiplicity.try_into().map_err(|_| bad_header())?;
        let derivative = Derivative::try_from(nder)?;

        let mut atoms = Vec::new();
        let mut mm_charges = Vec::new();
        for (got, line) in lines.take(natoms).enumerate() {
            let bad_atom = || ExternalError::BadAtom(line.to_owned());
            let mut sp = line.split_whitespace();
            let Some(Ok(z)) = sp.next().map(str::parse::<usize>) else {
                if line.trim().is_empty() {
                    return Err(ExternalError::Truncated { want: natoms, got });
                }
                return Err(bad_atom());
            };
            let vals: Vec<f64> = sp
                .map(str::parse)
                .collect::<Result<_, _>>()
                .map_err(|_| bad_atom())?;
            let [x, y, z_coord, mm] = vals[..] else {
                return Err(bad_atom());
            };
            atoms.push(Atom::new(z, x, y, z_coord));
            mm_charges.push(mm);
        }
        if atoms.len() != natoms {
            return Err(ExternalError::Truncated {
                want: natoms,
                got: atoms.len(),
            });
        }

        Ok(Self {
            derivative,
            charge,
            multiplicity,
            atoms,
            mm_charges,
        })
    }
}

/// the quantities returned to Gaussian. `gradient` is in atom-major order and
/// `hessian` is the row-major lower triangle of the Cartesian force constant
/// matrix
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Results {
    pub energy: f64,
    pub dipole: [f64; 3],
    pub gradient: Option<Vec<f64>>,
    pub hessian: Option<Vec<f64>>,
}

/// write `vals` three to a line in Gaussian's 3D20.12 format
fn write_triples<W: Write>(w: &mut W, vals: &[f64]) -> std::io::Result<()> {
    for chunk in vals.chunks(3) {
        for v in chunk {
            write!(w, "{v:+20.12}")?;
        }
        writeln!(w)?;
    }
    Ok(())
}

impl Results {
    /// write `self` in the EOu format Gaussian expects. Polarizabilities and
    /// dipole derivatives are not computed and are written as zeros whenever
    /// a gradient is present
    pub fn write_to<W: Write>(
        &self,
        w: &mut W,
        natoms: usize,
    ) -> std::io::Result<()> {
        let [dx, dy, dz] = self.dipole;
        writeln!(w, "{:+20.12}{dx:+20.12}{dy:+20.12}{dz:+20.12}", self.energy)?;

        if let Some(grad) = &self.gradient {
            write_triples(w, grad)?;
            // polarizability (6) + dipole derivatives (9 * natoms)
            write_triples(w, &vec![0.0; 6 + 9 * natoms])?;
        }

        if let Some(hess) = &self.hessian {
            write_triples(w, hess)?;
        }
        Ok(())
    }

    pub fn save(
        &self,
        path: impl AsRef<Path>,
        natoms: usize,
    ) -> std::io::Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        self.write_to(&mut w, natoms)?;
        w.flush()
    }
}
