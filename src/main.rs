//! Gaussian 16 External driver for Q-Chem. Use it from a Gaussian input like
//!
//! ```text
//! #p external="qchem_g16" freq
//! ```

use qchem_g16::{
    config::Config, external::Invocation, run, write_message, Error,
};

fn main() {
    env_logger::init();

    let inv = match Invocation::from_args(std::env::args().skip(1)) {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("{e}");
            eprintln!(
                "usage: qchem_g16 layer InputFile OutputFile MsgFile \
		 [FChkFile MatElFile]"
            );
            std::process::exit(1);
        }
    };

    let res = Config::from_env()
        .map_err(Error::from)
        .and_then(|config| run(&inv, &config));

    if let Err(e) = res {
        log::error!("{e}");
        if let Err(w) = write_message(&inv.msg, &format!("qchem_g16: {e}")) {
            log::error!("failed to write {} with {w}", inv.msg.display());
        }
        std::process::exit(1);
    }
}
