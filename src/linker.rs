use std::{
    env::consts::ARCH,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use tracing::{debug, info, warn};
use which::which;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

const LOADERS: &[(&str, &str)] = &[
    ("x86_64", "ld-linux-x86-64.so.2"),
    ("aarch64", "ld-linux-aarch64.so.1"),
    ("riscv64", "ld-linux-riscv64-lp64d.so.1"),
];

/// Host tools and C runtime files needed to turn an object into an executable.
#[derive(Debug, Clone, PartialEq)]
pub struct Toolchain {
    pub linker: PathBuf,
    pub loader: PathBuf,
    pub crt1: PathBuf,
    pub crti: PathBuf,
    pub crtn: PathBuf,
    pub library_dirs: Vec<PathBuf>,
}

impl Toolchain {
    /// Finds `ld` and asks the host C driver where the startup files and
    /// the dynamic loader live.
    pub fn discover() -> Result<Self, Error> {
        let driver = which("cc")
            .or_else(|_| which("gcc"))
            .map_err(|_| toolchain_error("no C driver (`cc` or `gcc`) found on PATH"))?;
        let linker = which("ld").map_err(|_| toolchain_error("`ld` not found on PATH"))?;
        debug!(driver = %driver.display(), linker = %linker.display(), "found host tools");

        let crt1 = runtime_file(&driver, "crt1.o")?;
        let crti = runtime_file(&driver, "crti.o")?;
        let crtn = runtime_file(&driver, "crtn.o")?;
        let loader = dynamic_loader(&driver)?;

        let mut library_dirs = vec![];
        let libc = print_file_name(&driver, "libc.so");
        for file in [Some(&crt1), libc.as_ref()].into_iter().flatten() {
            if let Some(dir) = file.parent() {
                if !library_dirs.iter().any(|known| known == dir) {
                    library_dirs.push(dir.to_path_buf());
                }
            }
        }

        Ok(Toolchain {
            linker,
            loader,
            crt1,
            crti,
            crtn,
            library_dirs,
        })
    }
}

fn toolchain_error(message: &str) -> Error {
    Error::new(
        ErrorImpl::Toolchain {
            message: String::from(message),
        },
        Position::null(),
    )
}

/// Asks the C driver for the full path of a runtime file.
///
/// gcc echoes the bare name back when it cannot find the file, so only an
/// existing absolute path counts as an answer.
fn print_file_name(driver: &Path, name: &str) -> Option<PathBuf> {
    let output = Command::new(driver)
        .arg(format!("-print-file-name={}", name))
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    (path.is_absolute() && path.exists()).then_some(path)
}

fn runtime_file(driver: &Path, name: &str) -> Result<PathBuf, Error> {
    print_file_name(driver, name)
        .ok_or_else(|| toolchain_error(&format!("C runtime file `{}` not found", name)))
}

fn dynamic_loader(driver: &Path) -> Result<PathBuf, Error> {
    let Some((_, loader)) = LOADERS.iter().find(|(arch, _)| *arch == ARCH) else {
        return Err(toolchain_error(&format!(
            "no known dynamic loader for `{}`",
            ARCH
        )));
    };

    if let Some(path) = print_file_name(driver, loader) {
        return Ok(path);
    }

    let fallbacks = [
        PathBuf::from("/lib64"),
        PathBuf::from("/lib"),
        PathBuf::from(format!("/lib/{}-linux-gnu", ARCH)),
        PathBuf::from(format!("/usr/lib/{}-linux-gnu", ARCH)),
    ];

    fallbacks
        .iter()
        .map(|dir| dir.join(loader))
        .find(|path| path.exists())
        .ok_or_else(|| toolchain_error(&format!("dynamic loader `{}` not found", loader)))
}

/// Arguments for `ld` linking `object` against the C runtime into `executable`.
pub fn link_arguments(toolchain: &Toolchain, object: &Path, executable: &Path) -> Vec<String> {
    let mut arguments = vec![
        String::from("-o"),
        executable.display().to_string(),
        String::from("-dynamic-linker"),
        toolchain.loader.display().to_string(),
        toolchain.crt1.display().to_string(),
        toolchain.crti.display().to_string(),
    ];

    arguments.extend(
        toolchain
            .library_dirs
            .iter()
            .map(|dir| format!("-L{}", dir.display())),
    );

    arguments.push(object.display().to_string());
    arguments.push(String::from("-lc"));
    arguments.push(toolchain.crtn.display().to_string());

    arguments
}

pub fn link_executable(toolchain: &Toolchain, object: &Path, executable: &Path) -> Result<(), Error> {
    if let Some(parent) = executable.parent() {
        fs::create_dir_all(parent)?;
    }

    let arguments = link_arguments(toolchain, object, executable);
    debug!(linker = %toolchain.linker.display(), ?arguments, "linking");

    let output = Command::new(&toolchain.linker)
        .args(&arguments)
        .output()
        .map_err(|error| {
            Error::new(
                ErrorImpl::Linker {
                    message: format!("could not start `{}`: {}", toolchain.linker.display(), error),
                },
                Position::null(),
            )
        })?;

    if !output.status.success() {
        return Err(Error::new(
            ErrorImpl::Linker {
                message: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Position::null(),
        ));
    }

    info!(path = %executable.display(), "linked executable");
    Ok(())
}

/// Runs the linked program and returns its exit status.
pub fn run_executable(path: &Path) -> Result<i32, Error> {
    let path = if path.is_relative() {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    };

    let status = Command::new(&path).status().map_err(|error| {
        Error::new(
            ErrorImpl::Launch {
                message: format!("{}: {}", path.display(), error),
            },
            Position::null(),
        )
    })?;

    match status.code() {
        Some(code) => {
            info!(code, "program exited");
            Ok(code)
        }
        None => {
            warn!("program terminated by a signal");
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{link_arguments, run_executable, Toolchain};

    fn toolchain() -> Toolchain {
        Toolchain {
            linker: PathBuf::from("/usr/bin/ld"),
            loader: PathBuf::from("/lib64/ld-linux-x86-64.so.2"),
            crt1: PathBuf::from("/usr/lib/x86_64-linux-gnu/crt1.o"),
            crti: PathBuf::from("/usr/lib/x86_64-linux-gnu/crti.o"),
            crtn: PathBuf::from("/usr/lib/x86_64-linux-gnu/crtn.o"),
            library_dirs: vec![
                PathBuf::from("/usr/lib/x86_64-linux-gnu"),
                PathBuf::from("/usr/lib"),
            ],
        }
    }

    #[test]
    fn test_link_arguments_order() {
        let arguments = link_arguments(
            &toolchain(),
            Path::new("build/out.o"),
            Path::new("build/output"),
        );

        assert_eq!(
            arguments,
            [
                "-o",
                "build/output",
                "-dynamic-linker",
                "/lib64/ld-linux-x86-64.so.2",
                "/usr/lib/x86_64-linux-gnu/crt1.o",
                "/usr/lib/x86_64-linux-gnu/crti.o",
                "-L/usr/lib/x86_64-linux-gnu",
                "-L/usr/lib",
                "build/out.o",
                "-lc",
                "/usr/lib/x86_64-linux-gnu/crtn.o",
            ]
        );
    }

    #[test]
    fn test_link_arguments_without_library_dirs() {
        let mut toolchain = toolchain();
        toolchain.library_dirs.clear();

        let arguments = link_arguments(&toolchain, Path::new("a.o"), Path::new("a.out"));
        assert!(!arguments.iter().any(|argument| argument.starts_with("-L")));
        assert_eq!(arguments[6], "a.o");
    }

    #[test]
    fn test_run_missing_executable() {
        let error = run_executable(Path::new("/nonexistent/minicc/output")).unwrap_err();
        assert_eq!(error.get_error_name(), "Launch");
    }
}
