use symm::Atom;

use super::*;

const WATER: &str = "         3         2         0         1
         8        0.000000000000        0.000000000000       -0.124238490912        0.000000000000
         1        0.000000000000        1.431498280405        0.985865290419        0.000000000000
         1        0.000000000000       -1.431498280405        0.985865290419        0.000000000000
";

#[test]
fn parse_ein() {
    let got: Calculation = WATER.parse().unwrap();
    let want = Calculation {
        derivative: Derivative::Hessian,
        charge: 0,
        multiplicity: 1,
        atoms: vec![
            Atom::new(8, 0.0, 0.0, -0.124238490912),
            Atom::new(1, 0.0, 1.431498280405, 0.985865290419),
            Atom::new(1, 0.0, -1.431498280405, 0.985865290419),
        ],
        mm_charges: vec![0.0; 3],
    };
    assert_eq!(got, want);
    assert_eq!(got.natoms(), 3);
}

#[test]
fn parse_ein_trailing_sections() {
    let input = format!("{WATER} 1 2 1.0\n 2 3 1.0\n");
    let got: Calculation = input.parse().unwrap();
    assert_eq!(got.natoms(), 3);
}

#[test]
fn parse_ein_charged() {
    let got: Calculation = "1 0 -1 2\n 9 0.0 0.0 0.0 -0.5\n".parse().unwrap();
    assert_eq!(got.derivative, Derivative::Energy);
    assert_eq!(got.charge, -1);
    assert_eq!(got.multiplicity, 2);
    assert_eq!(got.mm_charges, vec![-0.5]);
    assert!(got.has_mm_charges());

    let got: Calculation = WATER.parse().unwrap();
    assert!(!got.has_mm_charges());
}

#[test]
fn parse_ein_errors() {
    let tests = [
        ("", ExternalError::EmptyInput),
        ("\n", ExternalError::EmptyInput),
        ("3 2 0", ExternalError::BadHeader("3 2 0".to_owned())),
        ("3 x 0 1", ExternalError::BadHeader("3 x 0 1".to_owned())),
        ("1 3 0 1\n 1 0.0 0.0 0.0 0.0", ExternalError::BadDerivative(3)),
        (
            "3 0 0 1\n 1 0.0 0.0 0.0 0.0\n 1 0.0 0.0 1.0 0.0\n",
            ExternalError::Truncated { want: 3, got: 2 },
        ),
        (
            "2 0 0 1\n 1 0.0 0.0 0.0 0.0\n\n 1 0.0 0.0 1.0 0.0\n",
            ExternalError::Truncated { want: 2, got: 1 },
        ),
        (
            "4611686018427387904 0 0 1\n 1 0.0 0.0 0.0 0.0\n",
            ExternalError::Truncated {
                want: 4611686018427387904,
                got: 1,
            },
        ),
        (
            "1000000000 2 0 1\n 1 0.0 0.0 0.0 0.0\n",
            ExternalError::Truncated {
                want: 1000000000,
                got: 1,
            },
        ),
        (
            "1 0 0 1\n H 0.0 0.0 0.0 0.0",
            ExternalError::BadAtom(" H 0.0 0.0 0.0 0.0".to_owned()),
        ),
        (
            "1 0 0 1\n 1 0.0 0.0 0.0",
            ExternalError::BadAtom(" 1 0.0 0.0 0.0".to_owned()),
        ),
    ];
    for (input, want) in tests {
        let got = input.parse::<Calculation>().unwrap_err();
        assert_eq!(got, want, "input = {input:?}");
    }
}

#[test]
fn derivative_order() {
    assert!(Derivative::Energy < Derivative::Gradient);
    assert!(Derivative::Gradient < Derivative::Hessian);
    assert_eq!(Derivative::try_from(1_usize), Ok(Derivative::Gradient));
}

#[test]
fn invocation() {
    let got = Invocation::from_args([
        "R",
        "Gau-1234.EIn",
        "Gau-1234.EOu",
        "Gau-1234.EMs",
        "Gau-1234.EFC",
        "Gau-1234.EUF",
    ])
    .unwrap();
    assert_eq!(
        got,
        Invocation {
            layer: "R".to_owned(),
            input: "Gau-1234.EIn".into(),
            output: "Gau-1234.EOu".into(),
            msg: "Gau-1234.EMs".into(),
            fchk: Some("Gau-1234.EFC".into()),
            matel: Some("Gau-1234.EUF".into()),
        }
    );

    let got = Invocation::from_args(["R", "in", "out", "msg"]).unwrap();
    assert_eq!(got.fchk, None);
    assert_eq!(got.matel, None);

    assert_eq!(
        Invocation::from_args(["R", "in", "out"]),
        Err(ExternalError::Usage(3))
    );
}

fn render(res: &Results, natoms: usize) -> String {
    let mut buf = Vec::new();
    res.write_to(&mut buf, natoms).unwrap();
    String::from_utf8(buf).unwrap()
}

#[test]
fn write_energy() {
    let res = Results {
        energy: -76.0,
        dipole: [0.0, 0.0, 0.5],
        ..Default::default()
    };
    assert_eq!(
        render(&res, 3),
        "    -76.000000000000     +0.000000000000     +0.000000000000     +0.500000000000\n"
    );
}

#[test]
fn write_gradient() {
    let res = Results {
        energy: -0.5,
        dipole: [0.0; 3],
        gradient: Some(vec![0.0, 0.0, 0.01]),
        hessian: None,
    };
    let got = render(&res, 1);
    let lines: Vec<_> = got.lines().collect();
    // energy, gradient, 2 polarizability, 3 dipole derivative
    assert_eq!(lines.len(), 7);
    assert_eq!(
        lines[1],
        "     +0.000000000000     +0.000000000000     +0.010000000000"
    );
    assert!(lines[2..].iter().all(|l| l.len() == 60));
}

#[test]
fn write_hessian() {
    let natoms = 2;
    let n = 3 * natoms * (3 * natoms + 1) / 2;
    let res = Results {
        energy: -1.0,
        dipole: [0.0; 3],
        gradient: Some(vec![0.0; 3 * natoms]),
        hessian: Some((0..n).map(|i| i as f64).collect()),
    };
    let got = render(&res, natoms);
    let lines: Vec<_> = got.lines().collect();
    // energy, gradient, zeros, and 21 hessian values
    assert_eq!(lines.len(), 18);
    assert_eq!(
        lines[11],
        "     +0.000000000000     +1.000000000000     +2.000000000000"
    );
    assert_eq!(
        lines[17],
        "    +18.000000000000    +19.000000000000    +20.000000000000"
    );
    assert!(got.ends_with('\n'));
}

#[test]
fn write_hessian_partial_line() {
    let res = Results {
        energy: 0.0,
        dipole: [0.0; 3],
        gradient: None,
        hessian: Some(vec![1.0; 4]),
    };
    let got = render(&res, 0);
    assert_eq!(
        got.lines().last().unwrap(),
        "     +1.000000000000"
    );
    assert!(got.ends_with('\n'));
}
