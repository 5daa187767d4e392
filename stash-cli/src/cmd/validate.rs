use std::path::Path;

use serde::Serialize;
use stash_core::{resolve_config, ResolvedSnapshot};

use super::config::{config_stem, load_config, load_secrets};
use crate::exit_codes;
use crate::output::{print_error, print_result, OutputFormat};
use crate::{OutputArgs, SecretsArgs};

#[derive(Serialize)]
struct ValidateResult {
    valid: bool,
    name: String,
    sequences: usize,
    requests: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_path: Option<String>,
}

pub fn validate_cmd(
    path: &Path,
    write_resolved: bool,
    secrets: SecretsArgs,
    output: OutputArgs,
) -> i32 {
    let config = match load_config(path, &output) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let secrets = match load_secrets(&secrets, &output) {
        Ok(s) => s,
        Err(code) => return code,
    };

    // Resolution proves every secret, set and pattern reference is satisfiable.
    let resolved = match resolve_config(&config, &secrets, false) {
        Ok(r) => r,
        Err(e) => {
            print_error(output.format, output.quiet, &format!("configuration error: {e}"));
            return exit_codes::VALIDATION_FAILED;
        }
    };

    let mut resolved_path = None;
    if write_resolved {
        let target = path.with_file_name(format!("{}-resolved.yml", config_stem(path)));
        let written = ResolvedSnapshot::new(&resolved)
            .to_yaml(&secrets.redactor())
            .map_err(|e| e.to_string())
            .and_then(|yaml| std::fs::write(&target, yaml).map_err(|e| e.to_string()));
        if let Err(e) = written {
            print_error(
                output.format,
                output.quiet,
                &format!("failed to write resolved config {}: {e}", target.display()),
            );
            return exit_codes::RUNTIME_ERROR;
        }
        resolved_path = Some(target.display().to_string());
    }

    let result = ValidateResult {
        valid: true,
        name: resolved.name.clone(),
        sequences: resolved.sequences.len(),
        requests: resolved.total_requests(),
        resolved_path,
    };
    if output.format == OutputFormat::Text && !output.quiet {
        println!(
            "ok: valid stash config '{}' ({} sequences, {} requests)",
            result.name, result.sequences, result.requests
        );
        if let Some(p) = &result.resolved_path {
            println!("Wrote resolved config: {p}");
        }
    } else {
        print_result(output.format, output.quiet, &result);
    }
    exit_codes::SUCCESS
}
