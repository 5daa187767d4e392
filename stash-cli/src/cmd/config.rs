use std::path::Path;

use stash_core::{parse_document_str, DocumentFormat, SecretMap, StashConfig, Validate};
use stash_exec::load_secrets_file;

use crate::exit_codes;
use crate::output::print_error;
use crate::{OutputArgs, SecretsArgs};

/// Reads, parses and validates a stash config. `Err` carries the exit code
/// after the problem has been reported.
pub fn load_config(path: &Path, output: &OutputArgs) -> Result<StashConfig, i32> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        print_error(
            output.format,
            output.quiet,
            &format!("failed to read {}: {e}", path.display()),
        );
        exit_codes::RUNTIME_ERROR
    })?;

    let parsed = parse_document_str(&content, DocumentFormat::Auto).map_err(|e| {
        print_error(output.format, output.quiet, &e.to_string());
        exit_codes::VALIDATION_FAILED
    })?;

    if let Err(err) = parsed.document.validate() {
        print_error(output.format, output.quiet, &err.to_string());
        if !output.quiet {
            for v in &err.violations {
                eprintln!("- {}: {}", v.path, v.message);
            }
        }
        return Err(exit_codes::VALIDATION_FAILED);
    }
    Ok(parsed.document.stash_config)
}

/// An absent `--secrets` means an empty map.
pub fn load_secrets(args: &SecretsArgs, output: &OutputArgs) -> Result<SecretMap, i32> {
    let Some(path) = &args.secrets else {
        return Ok(SecretMap::new());
    };
    load_secrets_file(path).map_err(|e| {
        print_error(
            output.format,
            output.quiet,
            &format!("failed to load secrets file: {e}"),
        );
        exit_codes::RUNTIME_ERROR
    })
}

/// Config file name without extension, used to name run artifacts.
pub fn config_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stash".to_string())
}
