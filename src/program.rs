use std::{fmt::Display, fs::File, io::Write};

use serde::{Deserialize, Serialize};

use crate::external::Derivative;

pub mod qchem;

#[derive(Debug, PartialEq)]
pub enum ProgramError {
    FileNotFound(String),
    ErrorInOutput(String),
    EnergyNotFound(String),
    EnergyParseError(String),
    /// a value in the file could not be parsed
    DataParseError(String, String),
    /// the file contained a different number of values than expected
    WrongCount {
        file: String,
        want: usize,
        got: usize,
    },
    Io(String),
}

impl Display for ProgramError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramError::FileNotFound(s) => write!(f, "file not found: {s}"),
            ProgramError::ErrorInOutput(s) => write!(f, "error in output: {s}"),
            ProgramError::EnergyNotFound(s) => {
                write!(f, "no energy line found in {s}")
            }
            ProgramError::EnergyParseError(s) => {
                write!(f, "failed to parse energy in {s}")
            }
            ProgramError::DataParseError(file, why) => {
                write!(f, "failed to parse values in {file}: {why}")
            }
            ProgramError::WrongCount { file, want, got } => {
                write!(f, "expected {want} values in {file}, got {got}")
            }
            ProgramError::Io(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for ProgramError {}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgramResult {
    pub energy: f64,
    /// dipole moment in atomic units, if one was printed
    pub dipole: Option<[f64; 3]>,
    /// wall time in seconds
    pub time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub header: String,
}

impl Template {
    pub fn from(s: &str) -> Self {
        Self {
            header: s.to_string(),
        }
    }
}

pub trait Program {
    fn new(
        filename: String,
        template: Template,
        charge: isize,
        multiplicity: usize,
    ) -> Self;

    fn filename(&self) -> String;

    fn set_filename(&mut self, filename: &str);

    fn template(&self) -> &Template;

    fn extension(&self) -> String;

    fn charge(&self) -> isize;

    /// the contents of the input file for a calculation of `derivative`
    /// order
    fn build_input(&self, derivative: Derivative) -> String;

    /// write the input file built by [Program::build_input] to
    /// [Program::infile]
    fn write_input(
        &mut self,
        derivative: Derivative,
    ) -> Result<(), ProgramError> {
        let body = self.build_input(derivative);
        let filename = self.infile();
        let mut file = File::create(&filename).map_err(|e| {
            ProgramError::Io(format!("failed to create {filename} with {e}"))
        })?;
        write!(file, "{body}").map_err(|e| {
            ProgramError::Io(format!("failed to write {filename} with {e}"))
        })
    }

    /// read the output file for `filename`, without its extension
    fn read_output(filename: &str) -> Result<ProgramResult, ProgramError>;

    /// Return all the filenames associated with the Program
    fn associated_files(&self) -> Vec<String>;

    fn infile(&self) -> String {
        format!("{}.{}", self.filename(), self.extension())
    }

    fn outfile(&self) -> String {
        self.filename() + ".out"
    }
}
