//! Hands a finished module to LLVM's target machinery.

use std::{fs, path::Path};

use inkwell::{
    module::Module,
    targets::{CodeModel, FileType, InitializationConfig, RelocMode, Target, TargetMachine},
    OptimizationLevel,
};
use tracing::{debug, info};

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

fn create_parent_dirs(path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Builds a target machine for the host.
pub fn host_target_machine(optimization: OptimizationLevel) -> Result<TargetMachine, Error> {
    // Initialize all targets, targets info, target MCs, asm parsers and printers
    Target::initialize_all(&InitializationConfig::default());

    let target_triple = TargetMachine::get_default_triple();
    let target = Target::from_triple(&target_triple).map_err(|message| {
        Error::new(
            ErrorImpl::Backend {
                message: message.to_string(),
            },
            Position::null(),
        )
    })?;

    target
        .create_target_machine(
            &target_triple,
            "generic",
            "",
            optimization,
            RelocMode::PIC,
            CodeModel::Default,
        )
        .ok_or_else(|| {
            Error::new(
                ErrorImpl::Backend {
                    message: format!(
                        "no target machine for {}",
                        target_triple.as_str().to_string_lossy()
                    ),
                },
                Position::null(),
            )
        })
}

/// Verifies `module` and writes it to `path` as a relocatable object file.
pub fn emit_object(
    module: &Module,
    optimization: OptimizationLevel,
    path: &Path,
) -> Result<(), Error> {
    let target_machine = host_target_machine(optimization)?;

    module.set_triple(&target_machine.get_triple());
    module.set_data_layout(&target_machine.get_target_data().get_data_layout());

    module.verify().map_err(|message| {
        Error::new(
            ErrorImpl::Verification {
                message: message.to_string(),
            },
            Position::null(),
        )
    })?;
    debug!("module verified");

    create_parent_dirs(path)?;
    target_machine
        .write_to_file(module, FileType::Object, path)
        .map_err(|message| {
            Error::new(
                ErrorImpl::ObjectEmission {
                    message: message.to_string(),
                },
                Position::null(),
            )
        })?;

    info!(path = %path.display(), "wrote object file");
    Ok(())
}

/// Writes the textual IR of `module` to `path`.
pub fn emit_ir(module: &Module, path: &Path) -> Result<(), Error> {
    create_parent_dirs(path)?;
    module.print_to_file(path).map_err(|message| {
        Error::new(
            ErrorImpl::Io {
                message: message.to_string(),
            },
            Position::null(),
        )
    })?;

    info!(path = %path.display(), "wrote IR");
    Ok(())
}
