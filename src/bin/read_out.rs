//! Translate the Q-Chem results already in a directory to the Gaussian
//! External output format on stdout
//!
//! usage: read_out natoms nder [dir]

use std::{io::Write, path::PathBuf};

use qchem_g16::{config::RUNDIR_VAR, external::Derivative, translate};

fn die(msg: &str) -> ! {
    eprintln!("{msg}");
    eprintln!("usage: read_out natoms nder [dir]");
    std::process::exit(1);
}

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        die("not enough arguments");
    }
    let Ok(natoms) = args[0].parse::<usize>() else {
        die(&format!("failed to parse `{}` as natoms", args[0]));
    };
    let derivative = match args[1].parse::<usize>().map(Derivative::try_from) {
        Ok(Ok(d)) => d,
        _ => die(&format!("invalid derivative order `{}`", args[1])),
    };
    let dir: PathBuf = args
        .get(2)
        .cloned()
        .or_else(|| std::env::var(RUNDIR_VAR).ok())
        .unwrap_or_else(|| ".".to_owned())
        .into();

    let res = match translate(&dir, natoms, derivative) {
        Ok(res) => res,
        Err(e) => die(&e.to_string()),
    };
    let mut out = std::io::stdout().lock();
    if let Err(e) = res.write_to(&mut out, natoms).and_then(|_| out.flush()) {
        die(&e.to_string());
    }
}
