use std::fs;
use std::path::Path;
use std::process;

use bitmc_compiler::{CompileJob, CompileOptions, Compiler};
use bitmc_ispl::to_ispl;
use tracing::info;

use crate::report_error;

pub(crate) struct CompileArgs<'a> {
    pub job: &'a Path,
    pub options: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub json: bool,
    pub quiet: bool,
}

pub(crate) fn cmd_compile(args: CompileArgs<'_>) {
    let quiet = args.quiet;

    // Step 1: Read the job document
    let job_str = match fs::read_to_string(args.job) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", args.job.display(), e);
            report_error(&msg, quiet);
            process::exit(1);
        }
    };
    let job: CompileJob = match serde_json::from_str(&job_str) {
        Ok(j) => j,
        Err(e) => {
            let msg = format!("invalid job document '{}': {}", args.job.display(), e);
            report_error(&msg, quiet);
            process::exit(1);
        }
    };

    // Step 2: Options
    let options = match args.options {
        Some(path) => match CompileOptions::from_toml_file(path) {
            Ok(o) => o,
            Err(e) => {
                report_error(&format!("error: {}", e), quiet);
                process::exit(1);
            }
        },
        None => CompileOptions::default(),
    };

    // Step 3: Compile
    let system = match Compiler::from_job(job).and_then(|c| c.with_options(options).compile()) {
        Ok(s) => s,
        Err(e) => {
            report_error(&format!("compile error: {}", e), quiet);
            process::exit(1);
        }
    };

    // Step 4: Emit
    let text = if args.json {
        match serde_json::to_string_pretty(&system) {
            Ok(s) => s + "\n",
            Err(e) => {
                report_error(&format!("serialization error: {}", e), quiet);
                process::exit(1);
            }
        }
    } else {
        to_ispl(&system)
    };

    match args.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &text) {
                let msg = format!("error writing file '{}': {}", path.display(), e);
                report_error(&msg, quiet);
                process::exit(1);
            }
            info!(path = %path.display(), "model written");
        }
        None => print!("{}", text),
    }
}
