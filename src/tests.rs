use std::{fs, path::Path};

use symm::Atom;

use crate::{
    config::Config,
    external::{Derivative, Invocation},
    geom::Geom,
    program::{qchem::HESS_CONV, ProgramError},
    run, translate, write_message, Error,
};

#[test]
fn test_from_cart() {
    // testfiles/water/water.EIn converted to Ångström
    let want = Geom(vec![
        Atom::new(8, 0.0, 0.0, -0.0657441781),
        Atom::new(1, 0.0, 0.7574608142, 0.5217939282),
        Atom::new(1, 0.0, -0.7574608142, 0.5217939282),
    ]);
    let bare = "O 0.0 0.0 -0.0657441781
H 0.0 0.7574608142 0.5217939282
H 0.0 -0.7574608142 0.5217939282";
    assert_eq!(bare.parse::<Geom>().unwrap(), want);

    let xyz = format!("3\nwater.EIn in angstroms\n{bare}\n\n");
    assert_eq!(xyz.parse::<Geom>().unwrap(), want);
}

#[test]
fn test_geom_display() {
    let geom = Geom(vec![
        Atom::new(8, 0.0, 0.0, -0.0657441781),
        Atom::new(1, 0.0, 0.7574608142, 0.5217939282),
    ]);
    assert_eq!(
        geom.to_string(),
        "8       0.0000000000   0.0000000000  -0.0657441781
1       0.0000000000   0.7574608142   0.5217939282"
    );
}

#[test]
fn test_from_bohr() {
    let got = Geom::from_bohr(&[Atom::new(1, 1.0, -2.0, 0.0)]);
    assert_eq!(
        got,
        Geom(vec![Atom::new(1, 0.529177210903, -1.058354421806, 0.0)])
    );
}

#[test]
fn test_translate() {
    let dir = Path::new("testfiles/water");
    let got = translate(dir, 3, Derivative::Energy).unwrap();
    assert_eq!(got.energy, -74.962930951047);
    assert!(got.gradient.is_none());
    assert!(got.hessian.is_none());

    let got = translate(dir, 3, Derivative::Gradient).unwrap();
    assert_eq!(got.gradient.as_ref().map(Vec::len), Some(9));
    assert!(got.hessian.is_none());

    let got = translate(dir, 3, Derivative::Hessian).unwrap();
    let hess = got.hessian.unwrap();
    assert_eq!(hess.len(), 45);
    assert_eq!(hess[0], 101.0 * HESS_CONV);
    assert_eq!(hess[44], 909.0 * HESS_CONV);
}

#[test]
fn test_translate_wrong_natoms() {
    let got = translate(Path::new("testfiles/water"), 2, Derivative::Gradient);
    assert_eq!(
        got,
        Err(ProgramError::WrongCount {
            file: "testfiles/water/efield.dat".to_owned(),
            want: 6,
            got: 9,
        })
    );
}

/// copy the canned water results into a fresh directory
fn water_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for f in ["water.EIn", "qchem.out", "efield.dat", "hessian.dat"] {
        fs::copy(Path::new("testfiles/water").join(f), dir.path().join(f))
            .unwrap();
    }
    dir
}

fn invocation(dir: &Path) -> Invocation {
    Invocation {
        layer: "R".to_owned(),
        input: dir.join("water.EIn"),
        output: dir.join("water.EOu"),
        msg: dir.join("water.EMs"),
        fchk: None,
        matel: None,
    }
}

#[test]
fn test_run_skip() {
    let dir = water_dir();
    let config = Config {
        rundir: dir.path().to_string_lossy().to_string(),
        skip_run: true,
        ..Config::default()
    };
    let inv = invocation(dir.path());
    let got = run(&inv, &config).unwrap();
    assert_eq!(got.energy, -74.962930951047);

    let out = fs::read_to_string(&inv.output).unwrap();
    // energy + 3 gradient + 2 polar + 9 dipole derivative + 15 hessian
    assert_eq!(out.lines().count(), 30);
    assert!(out.starts_with("    -74.962930951047"));

    let msg = fs::read_to_string(&inv.msg).unwrap();
    assert!(msg.contains("3 atoms, Hessian requested"));
    assert!(msg.contains("energy = -74.962930951047"));
    // the input was never written
    assert!(!dir.path().join("qchem.in").exists());
}

#[test]
fn test_run_clears_stale_results() {
    let dir = water_dir();
    // `true` writes nothing, so the stale results must not be picked up
    let config = Config {
        rundir: dir.path().to_string_lossy().to_string(),
        command: "true".to_owned(),
        ..Config::default()
    };
    let inv = invocation(dir.path());
    let got = run(&inv, &config);
    assert!(matches!(got, Err(Error::Program(ProgramError::FileNotFound(_)))));
    assert!(!dir.path().join("efield.dat").exists());
    let input = fs::read_to_string(dir.path().join("qchem.in")).unwrap();
    assert!(input.contains("jobtype freq"));
    assert!(!inv.output.exists());
}

#[test]
fn test_run_stale_results_stuck() {
    let dir = water_dir();
    let hessian = dir.path().join("hessian.dat");
    fs::remove_file(&hessian).unwrap();
    fs::create_dir(&hessian).unwrap();
    let config = Config {
        rundir: dir.path().to_string_lossy().to_string(),
        command: "true".to_owned(),
        ..Config::default()
    };
    let inv = invocation(dir.path());
    let got = run(&inv, &config);
    assert!(matches!(got, Err(Error::Program(ProgramError::Io(_)))));
    // q-chem never ran
    assert!(!dir.path().join("qchem.in").exists());
    assert!(!inv.output.exists());
}

#[test]
fn test_run_keep_files() {
    let dir = water_dir();
    let config = Config {
        rundir: dir.path().to_string_lossy().to_string(),
        command: "true".to_owned(),
        keep_files: true,
        ..Config::default()
    };
    let inv = invocation(dir.path());
    run(&inv, &config).unwrap();
    assert!(inv.output.exists());
}

#[test]
fn test_run_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let inv = invocation(dir.path());
    fs::write(&inv.input, "3 2 0\n").unwrap();
    let got = run(&inv, &Config::default());
    assert!(matches!(got, Err(Error::External(_))));
}

#[test]
fn test_write_message() {
    let dir = tempfile::tempdir().unwrap();
    let msg = dir.path().join("msg");
    write_message(&msg, "first").unwrap();
    write_message(&msg, "second\n").unwrap();
    assert_eq!(fs::read_to_string(msg).unwrap(), "first\nsecond\n");
}
