use std::{fs, path::PathBuf};

use clap::{ArgGroup, Parser};
use inkwell::OptimizationLevel;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// Command line of the `minicc` driver.
#[derive(Parser, Debug)]
#[command(
    name = "minicc",
    about = "Compiles a small subset of C to a native executable"
)]
#[command(group(ArgGroup::new("input").required(true).args(["file", "source"])))]
pub struct Cli {
    /// C source file to compile
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Compile the given program text instead of a file
    #[arg(short, long, value_name = "PROGRAM")]
    pub source: Option<String>,

    /// Print the syntax tree and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Path of the linked executable
    #[arg(short, long, value_name = "EXE", default_value = "build/output")]
    pub output: PathBuf,

    /// Path of the intermediate object file
    #[arg(long, value_name = "PATH", default_value = "build/out.o")]
    pub object: PathBuf,

    /// Also write the textual IR to this path
    #[arg(long, value_name = "PATH")]
    pub emit_ir: Option<PathBuf>,

    /// Stop after writing the object file
    #[arg(long)]
    pub no_link: bool,

    /// Run the executable after linking and exit with its status
    #[arg(long, conflicts_with = "no_link")]
    pub run: bool,

    /// Backend optimisation level
    #[arg(
        short = 'O',
        long,
        value_name = "LEVEL",
        default_value_t = 0,
        value_parser = clap::value_parser!(u8).range(0..=3)
    )]
    pub opt_level: u8,

    /// Print the token stream before parsing
    #[arg(long)]
    pub tokens: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceInput {
    File(PathBuf),
    Inline(String),
}

impl SourceInput {
    /// Loads the program text together with the name diagnostics refer to it by.
    pub fn read(&self) -> Result<(String, String), Error> {
        match self {
            SourceInput::File(path) => {
                let source = fs::read_to_string(path).map_err(|error| {
                    Error::new(
                        ErrorImpl::Io {
                            message: format!("{}: {}", path.display(), error),
                        },
                        Position::null(),
                    )
                })?;

                Ok((source, path.display().to_string()))
            }
            SourceInput::Inline(program) => Ok((program.clone(), String::from("<inline>"))),
        }
    }
}

/// Resolved driver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    pub input: SourceInput,
    pub verbose: bool,
    pub dump_tokens: bool,
    pub output: PathBuf,
    pub object: PathBuf,
    pub emit_ir: Option<PathBuf>,
    pub link: bool,
    pub run: bool,
    pub optimization: OptimizationLevel,
}

impl From<Cli> for CompileOptions {
    fn from(cli: Cli) -> Self {
        let input = match (cli.source, cli.file) {
            (Some(program), _) => SourceInput::Inline(program),
            (None, Some(path)) => SourceInput::File(path),
            (None, None) => SourceInput::Inline(String::new()),
        };

        CompileOptions {
            input,
            verbose: cli.verbose,
            dump_tokens: cli.tokens,
            output: cli.output,
            object: cli.object,
            emit_ir: cli.emit_ir,
            link: !cli.no_link,
            run: cli.run,
            optimization: optimization_level(cli.opt_level),
        }
    }
}

fn optimization_level(level: u8) -> OptimizationLevel {
    match level {
        0 => OptimizationLevel::None,
        1 => OptimizationLevel::Less,
        2 => OptimizationLevel::Default,
        _ => OptimizationLevel::Aggressive,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;
    use inkwell::OptimizationLevel;

    use super::{Cli, CompileOptions, SourceInput};

    fn options(args: &[&str]) -> CompileOptions {
        CompileOptions::from(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_defaults() {
        let options = options(&["minicc", "main.c"]);

        assert_eq!(options.input, SourceInput::File(PathBuf::from("main.c")));
        assert_eq!(options.output, PathBuf::from("build/output"));
        assert_eq!(options.object, PathBuf::from("build/out.o"));
        assert_eq!(options.emit_ir, None);
        assert_eq!(options.optimization, OptimizationLevel::None);
        assert!(options.link);
        assert!(!options.run);
        assert!(!options.verbose);
        assert!(!options.dump_tokens);
    }

    #[test]
    fn test_tokens_flag_enables_dump() {
        let options = options(&["minicc", "main.c", "--tokens"]);
        assert!(options.dump_tokens);
    }

    #[test]
    fn test_inline_source_and_flags() {
        let options = options(&[
            "minicc",
            "-s",
            "int main() { return 3; }",
            "-v",
            "-O",
            "2",
            "--no-link",
            "--emit-ir",
            "out.ll",
        ]);

        assert_eq!(
            options.input,
            SourceInput::Inline(String::from("int main() { return 3; }"))
        );
        assert_eq!(options.optimization, OptimizationLevel::Default);
        assert_eq!(options.emit_ir, Some(PathBuf::from("out.ll")));
        assert!(!options.link);
        assert!(options.verbose);
    }

    #[test]
    fn test_input_is_required_and_exclusive() {
        assert!(Cli::try_parse_from(["minicc"]).is_err());
        assert!(Cli::try_parse_from(["minicc", "main.c", "-s", "int main() {}"]).is_err());
    }

    #[test]
    fn test_rejects_bad_flag_values() {
        assert!(Cli::try_parse_from(["minicc", "main.c", "-O", "4"]).is_err());
        assert!(Cli::try_parse_from(["minicc", "main.c", "--run", "--no-link"]).is_err());
    }

    #[test]
    fn test_read_inline_and_missing_file() {
        let (source, name) = SourceInput::Inline(String::from("int x;")).read().unwrap();
        assert_eq!(source, "int x;");
        assert_eq!(name, "<inline>");

        let error = SourceInput::File(PathBuf::from("/nonexistent/minicc/main.c"))
            .read()
            .unwrap_err();
        assert_eq!(error.get_error_name(), "Io");
    }
}
