use std::fs;
use std::path::Path;
use std::process;

use bitmc_compiler::check_supported;
use bitmc_core::Contract;

use crate::report_error;

pub(crate) fn cmd_check(file: &Path, quiet: bool) {
    let contract_str = match fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", file.display(), e);
            report_error(&msg, quiet);
            process::exit(1);
        }
    };

    // Deserialising runs both validation passes
    let contract: Contract = match serde_json::from_str(&contract_str) {
        Ok(c) => c,
        Err(e) => {
            let msg = format!("invalid contract '{}': {}", file.display(), e);
            report_error(&msg, quiet);
            process::exit(1);
        }
    };

    if let Err(e) = check_supported(&contract) {
        report_error(&format!("error: {}", e), quiet);
        process::exit(1);
    }

    if !quiet {
        println!("valid");
    }
}
