//! Drive Q-Chem as a Gaussian 16 `External` program.

use std::{fmt::Display, fs::OpenOptions, io::Write, path::Path};

use log::{debug, info};

use crate::{
    config::{Config, ConfigError},
    external::{Calculation, Derivative, ExternalError, Invocation, Results},
    program::{
        qchem::{self, QChem},
        Program, ProgramError,
    },
    runner::Local,
};

pub mod config;
pub mod external;
pub mod geom;
pub mod program;
pub mod runner;

#[cfg(test)]
mod tests;

#[derive(Debug)]
pub enum Error {
    External(ExternalError),
    Program(ProgramError),
    Config(ConfigError),
    Io(std::io::Error),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::External(e) => write!(f, "gaussian interface: {e}"),
            Error::Program(e) => write!(f, "q-chem: {e}"),
            Error::Config(e) => write!(f, "configuration: {e}"),
            Error::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ExternalError> for Error {
    fn from(value: ExternalError) -> Self {
        Self::External(value)
    }
}

impl From<ProgramError> for Error {
    fn from(value: ProgramError) -> Self {
        Self::Program(value)
    }
}

impl From<ConfigError> for Error {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// collect the Q-Chem results in `dir` for a calculation of `derivative`
/// order on `natoms` atoms
pub fn translate(
    dir: &Path,
    natoms: usize,
    derivative: Derivative,
) -> Result<Results, ProgramError> {
    let filename = dir.join(qchem::FILENAME);
    let res = QChem::read_output(&filename.to_string_lossy())?;
    info!("q-chem reported {:.2} s of wall time", res.time);
    let gradient = if derivative >= Derivative::Gradient {
        Some(QChem::read_gradient(dir, natoms)?)
    } else {
        None
    };
    let hessian = if derivative == Derivative::Hessian {
        Some(QChem::read_hessian(dir, natoms)?)
    } else {
        None
    };
    Ok(Results {
        energy: res.energy,
        dipole: res.dipole.unwrap_or_default(),
        gradient,
        hessian,
    })
}

/// run the whole External step described by `inv`: read the Gaussian input,
/// run Q-Chem according to `config`, and write the Gaussian output and
/// message files
pub fn run(inv: &Invocation, config: &Config) -> Result<Results, Error> {
    let calc = Calculation::load(&inv.input)?;
    info!(
        "layer {}: {} atoms, {:?}, charge {}, multiplicity {}",
        inv.layer,
        calc.natoms(),
        calc.derivative,
        calc.charge,
        calc.multiplicity
    );
    if calc.has_mm_charges() {
        debug!(
            "ignoring MM charges {:?}; q-chem only sees the QM atoms",
            calc.mm_charges
        );
    }

    let dir = Path::new(&config.rundir);
    if !config.skip_run {
        let template = config.template()?;
        let mut qchem = QChem::from_calculation(
            dir.join(qchem::FILENAME).to_string_lossy().to_string(),
            template,
            &calc,
        );
        let local = Local::new(&config.command, config.threads, dir);
        if !config.keep_files {
            local.clear_stale(&qchem.result_files())?;
        }
        qchem.write_input(calc.derivative)?;
        local.run(&qchem)?;
    } else {
        debug!("skipping q-chem run, reading results in {}", dir.display());
    }

    let results = translate(dir, calc.natoms(), calc.derivative)?;
    results.save(&inv.output, calc.natoms())?;
    write_message(&inv.msg, &summary(&calc, &results))?;
    Ok(results)
}

fn summary(calc: &Calculation, results: &Results) -> String {
    let now = chrono::Local::now();
    let mut s = format!(
        "qchem_g16 {} at {}\n",
        env!("CARGO_PKG_VERSION"),
        now.format("%Y-%m-%d %H:%M:%S")
    );
    s.push_str(&format!(
        " {} atoms, {:?} requested\n energy = {:.12}\n",
        calc.natoms(),
        calc.derivative,
        results.energy
    ));
    s
}

/// append `msg` to the Gaussian message file at `path`
pub fn write_message(
    path: impl AsRef<Path>,
    msg: &str,
) -> std::io::Result<()> {
    let mut f = OpenOptions::new().create(true).append(true).open(path)?;
    write!(f, "{msg}")?;
    if !msg.ends_with('\n') {
        writeln!(f)?;
    }
    Ok(())
}
