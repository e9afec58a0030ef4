use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    external::{Calculation, Derivative},
    geom::Geom,
};

use super::{Program, ProgramError, ProgramResult, Template};


/// converts the entries of Q-Chem's hessian.dat to the hartree/bohr² Gaussian
/// expects
pub const HESS_CONV: f64 = 4.46552493159e-4;

/// Debye per atomic unit of dipole moment
pub const DEBYE: f64 = 2.541746473;

/// the base name of the Q-Chem input and output files in the run directory
pub const FILENAME: &str = "qchem";

/// the file Q-Chem writes the gradient to in QM/MM runs
pub const GRADIENT_FILE: &str = "efield.dat";

/// the file Q-Chem writes the Cartesian Hessian to in QM/MM runs
pub const HESSIAN_FILE: &str = "hessian.dat";

const DEFAULT_TEMPLATE: &str = "$molecule
{{.charge}} {{.spin}}
{{.geom}}
$end

$rem
jobtype {{.jobtype}}
method hf
basis sto-3g
qm_mm true
qmmm_print true
sym_ignore true
$end
";

impl Default for Template {
    fn default() -> Self {
        Self::from(DEFAULT_TEMPLATE)
    }
}

/// QChem holds what's needed to write a Q-Chem input file. `filename` should
/// not include an extension: `.in` is appended for the input file and `.out`
/// for the output. The auxiliary data files are always written to the same
/// directory as the output, with fixed names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QChem {
    filename: String,
    template: Template,
    charge: isize,
    multiplicity: usize,
    geom: Geom,
}

static INPUT_CELL: OnceLock<[Regex; 5]> = OnceLock::new();
static CELL: OnceLock<[Regex; 5]> = OnceLock::new();

impl Program for QChem {
    fn new(
        filename: String,
        template: Template,
        charge: isize,
        multiplicity: usize,
    ) -> Self {
        Self {
            filename,
            template,
            charge,
            multiplicity,
            geom: Geom::default(),
        }
    }

    fn filename(&self) -> String {
        self.filename.clone()
    }

    fn set_filename(&mut self, filename: &str) {
        self.filename = filename.into();
    }

    fn template(&self) -> &Template {
        &self.template
    }

    fn extension(&self) -> String {
        String::from("in")
    }

    fn charge(&self) -> isize {
        self.charge
    }

    /// Example [Template]:
    /// ```text
    /// $molecule
    /// {{.charge}} {{.spin}}
    /// {{.geom}}
    /// $end
    ///
    /// $rem
    /// jobtype {{.jobtype}}
    /// method b3lyp
    /// basis 6-31g*
    /// qm_mm true
    /// $end
    /// ```
    ///
    /// `{{.geom}}` is replaced with the geometry in Ångström, `{{.charge}}`
    /// with `self.charge`, and `{{.spin}}` with `self.multiplicity`. The
    /// jobtype follows `derivative`: `sp`, `force`, or `freq`. Without a
    /// `{{.jobtype}}` placeholder, an existing `jobtype` line is rewritten,
    /// and if there is no such line one is added at the top of `$rem`.
    fn build_input(&self, derivative: Derivative) -> String {
        let mut body = self.template().header.clone();
        let [jobtype_re, jobtype_line, charge, spin, geom_re] =
            INPUT_CELL.get_or_init(|| {
                [
                    Regex::new(r"\{\{.jobtype\}\}").unwrap(),
                    Regex::new(r"(?i)^\s*jobtype(\s|=|$)").unwrap(),
                    Regex::new(r"\{\{.charge\}\}").unwrap(),
                    Regex::new(r"\{\{.spin\}\}").unwrap(),
                    Regex::new(r"\{\{.geom\}\}").unwrap(),
                ]
            });
        let jobtype = match derivative {
            Derivative::Energy => "sp",
            Derivative::Gradient => "force",
            Derivative::Hessian => "freq",
        };
        if jobtype_re.is_match(&body) {
            body = jobtype_re.replace_all(&body, jobtype).to_string();
        } else {
            use std::fmt::Write;
            let found = body.lines().any(|l| jobtype_line.is_match(l));
            let mut new = String::with_capacity(body.len() + 16);
            for line in body.lines() {
                if found && jobtype_line.is_match(line) {
                    writeln!(new, "jobtype {jobtype}").unwrap();
                    continue;
                }
                writeln!(new, "{line}").unwrap();
                if !found && line.trim().eq_ignore_ascii_case("$rem") {
                    writeln!(new, "jobtype {jobtype}").unwrap();
                }
            }
            body = new;
        }
        let geom = self.geom.to_string();
        body = geom_re.replace(&body, geom.as_str()).to_string();
        body = charge
            .replace(&body, self.charge.to_string().as_str())
            .to_string();
        spin.replace(&body, self.multiplicity.to_string().as_str())
            .to_string()
    }

    /// read `filename.out`. The energy comes from the first QM/MM energy line
    /// if present and otherwise from the last SCF energy
    fn read_output(filename: &str) -> Result<ProgramResult, ProgramError> {
        let outfile = format!("{filename}.out");
        let contents = match read_to_string(&outfile) {
            Ok(s) => s,
            Err(_) => {
                return Err(ProgramError::FileNotFound(outfile));
            }
        };

        let [error_re, qm_re, scf_re, dipole_re, time_re] =
            CELL.get_or_init(|| {
                [
                    Regex::new(r"(?i)Q-Chem fatal error").unwrap(),
                    Regex::new(r"^ The QM part of the energy is").unwrap(),
                    Regex::new(r"^ Total energy in the final basis set =")
                        .unwrap(),
                    Regex::new(r"Dipole Moment \(Debye\)").unwrap(),
                    Regex::new(r"^ Total job time:").unwrap(),
                ]
            });

        if error_re.is_match(&contents) {
            return Err(ProgramError::ErrorInOutput(outfile));
        }

        let mut qm_energy = None;
        let mut scf_energy = None;
        let mut dipole = None;
        let mut time = 0.0;
        let mut next_dipole = false;
        for line in contents.lines() {
            if next_dipole {
                next_dipole = false;
                // line like
                //          X      -0.0000      Y      -0.0000      Z       2.0512
                let sp: Vec<_> = line.split_whitespace().collect();
                if let [_, x, _, y, _, z] = sp[..] {
                    if let (Ok(x), Ok(y), Ok(z)) =
                        (x.parse::<f64>(), y.parse::<f64>(), z.parse::<f64>())
                    {
                        dipole = Some([x / DEBYE, y / DEBYE, z / DEBYE]);
                    }
                }
            } else if qm_re.is_match(line) {
                if qm_energy.is_none() {
                    qm_energy = Some(parse_energy(qm_re, line, &outfile)?);
                }
            } else if scf_re.is_match(line) {
                scf_energy = Some(parse_energy(scf_re, line, &outfile)?);
            } else if dipole_re.is_match(line) {
                next_dipole = true;
            } else if time_re.is_match(line) {
                // line like
                //  Total job time:  0.95s(wall), 0.71s(cpu)
                if let Some(t) = line
                    .split_ascii_whitespace()
                    .nth(3)
                    .and_then(|s| s.split('s').next())
                    .and_then(|s| s.parse().ok())
                {
                    time = t;
                }
            }
        }

        let Some(energy) = qm_energy.or(scf_energy) else {
            return Err(ProgramError::EnergyNotFound(outfile));
        };

        Ok(ProgramResult {
            energy,
            dipole,
            time,
        })
    }

    fn associated_files(&self) -> Vec<String> {
        let mut ret = vec![self.infile()];
        ret.extend(self.result_files());
        ret
    }
}

/// parse the energy following the text matched by `re` in `line`
fn parse_energy(
    re: &Regex,
    line: &str,
    outfile: &str,
) -> Result<f64, ProgramError> {
    let rest = re.replace(line, "");
    rest.trim()
        .parse()
        .map_err(|_| ProgramError::EnergyParseError(outfile.to_owned()))
}

/// read exactly `n` whitespace-separated floats from `path`
fn parse_values(path: &Path, n: usize) -> Result<Vec<f64>, ProgramError> {
    let file = path.display().to_string();
    let contents = match read_to_string(path) {
        Ok(s) => s,
        Err(_) => return Err(ProgramError::FileNotFound(file)),
    };
    let vals = contents
        .split_whitespace()
        .map(|s| {
            s.parse::<f64>().map_err(|e| {
                ProgramError::DataParseError(file.clone(), format!("`{s}`: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if vals.len() != n {
        return Err(ProgramError::WrongCount {
            file,
            want: n,
            got: vals.len(),
        });
    }
    Ok(vals)
}

fn too_many_atoms(path: &Path, natoms: usize) -> ProgramError {
    ProgramError::DataParseError(
        path.display().to_string(),
        format!("no result file can hold {natoms} atoms"),
    )
}

impl QChem {
    /// build a [QChem] for the molecule described by `calc`, converting its
    /// coordinates from bohr
    pub fn from_calculation(
        filename: String,
        template: Template,
        calc: &Calculation,
    ) -> Self {
        Self {
            geom: Geom::from_bohr(&calc.atoms),
            ..Self::new(filename, template, calc.charge, calc.multiplicity)
        }
    }

    pub fn geom(&self) -> &Geom {
        &self.geom
    }

    fn dir(&self) -> PathBuf {
        Path::new(&self.filename)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// the files holding the results of a run. These have to be cleared
    /// before a new run so stale values are never read back
    pub fn result_files(&self) -> Vec<String> {
        let dir = self.dir();
        vec![
            self.outfile(),
            dir.join(GRADIENT_FILE).to_string_lossy().to_string(),
            dir.join(HESSIAN_FILE).to_string_lossy().to_string(),
        ]
    }

    /// read the Cartesian gradient for `natoms` atoms from the efield.dat
    /// file in `dir`
    pub fn read_gradient(
        dir: &Path,
        natoms: usize,
    ) -> Result<Vec<f64>, ProgramError> {
        let path = dir.join(GRADIENT_FILE);
        let n = natoms
            .checked_mul(3)
            .ok_or_else(|| too_many_atoms(&path, natoms))?;
        parse_values(&path, n)
    }

    /// read the hessian.dat file in `dir` and return the force constants as
    /// the row-major lower triangle that Gaussian expects. hessian.dat holds
    /// the row-major upper triangle in Q-Chem's units
    pub fn read_hessian(
        dir: &Path,
        natoms: usize,
    ) -> Result<Vec<f64>, ProgramError> {
        let path = dir.join(HESSIAN_FILE);
        let (n, len) = natoms
            .checked_mul(3)
            .and_then(|n| Some((n, n.checked_mul(n.checked_add(1)?)? / 2)))
            .ok_or_else(|| too_many_atoms(&path, natoms))?;
        let data = parse_values(&path, len)?;
        Ok(upper_to_lower(&data, n)
            .into_iter()
            .map(|v| v * HESS_CONV)
            .collect())
    }
}

/// convert the row-major upper triangle of a symmetric `n`x`n` matrix into
/// its row-major lower triangle
pub fn upper_to_lower(data: &[f64], n: usize) -> Vec<f64> {
    let mut full = vec![0.0; n * n];
    let mut k = 0;
    for i in 0..n {
        for j in i..n {
            full[i * n + j] = data[k];
            full[j * n + i] = data[k];
            k += 1;
        }
    }
    let mut ret = Vec::with_capacity(data.len());
    for i in 0..n {
        ret.extend_from_slice(&full[i * n..=i * n + i]);
    }
    ret
}
