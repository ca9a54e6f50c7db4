use std::{process::ExitCode, rc::Rc, time::Instant};

use clap::Parser;
use inkwell::context::Context;
use minicc::{
    compiler::{
        backend::{emit_ir, emit_object},
        compiler::compile,
    },
    config::{Cli, CompileOptions},
    display_error,
    errors::errors::Error,
    lexer::lexer::tokenize,
    linker::{link_executable, run_executable, Toolchain},
    parser::parser::parse,
    type_checker::type_checker::type_check,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Stage at which compilation stopped; each maps to its own exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Frontend,
    Codegen,
    Semantic,
    Tool,
}

impl Failure {
    fn exit_code(self) -> u8 {
        match self {
            Failure::Frontend => 1,
            Failure::Codegen => 2,
            Failure::Semantic => 3,
            Failure::Tool => 4,
        }
    }
}

fn main() -> ExitCode {
    let options = CompileOptions::from(Cli::parse());
    init_logging(options.verbose);

    match run(&options) {
        Ok(code) => ExitCode::from(code as u8),
        Err(failure) => {
            error!(?failure, "compilation failed");
            ExitCode::from(failure.exit_code())
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn report(error: &Error, source: &str, name: &str, failure: Failure) -> Failure {
    display_error(error, source, name);
    failure
}

fn run(options: &CompileOptions) -> Result<i32, Failure> {
    let start = Instant::now();

    let (source, name) = options
        .input
        .read()
        .map_err(|error| report(&error, "", "<input>", Failure::Frontend))?;

    let tokens =
        tokenize(&source).map_err(|error| report(&error, &source, &name, Failure::Frontend))?;
    let token_count = tokens.len().saturating_sub(1);

    if options.dump_tokens {
        for token in &tokens {
            token.debug();
        }
    }

    let ast = parse(tokens).map_err(|error| report(&error, &source, &name, Failure::Frontend))?;
    info!("Parsing succeeded");

    type_check(&ast).map_err(|error| report(&error, &source, &name, Failure::Semantic))?;

    if options.verbose {
        println!("{}", ast);
        println!("Total lexer tokens: {}", token_count);
    }

    let context = Context::create();
    let module_name = name.rsplit('/').next().unwrap_or(&name).to_string();
    let compiler = compile(Rc::new(ast), &context, &module_name).map_err(|diagnostics| {
        for error in &diagnostics {
            display_error(error, &source, &name);
        }
        if diagnostics.has_tool_error() {
            Failure::Tool
        } else {
            Failure::Codegen
        }
    })?;
    debug!(elapsed = ?start.elapsed(), "generated IR");

    if let Some(path) = &options.emit_ir {
        emit_ir(&compiler.module, path)
            .map_err(|error| report(&error, &source, &name, Failure::Tool))?;
    }

    emit_object(&compiler.module, options.optimization, &options.object)
        .map_err(|error| report(&error, &source, &name, Failure::Tool))?;

    if !options.link {
        info!(elapsed = ?start.elapsed(), "done");
        return Ok(0);
    }

    Toolchain::discover()
        .and_then(|toolchain| link_executable(&toolchain, &options.object, &options.output))
        .map_err(|error| report(&error, &source, &name, Failure::Tool))?;
    info!(elapsed = ?start.elapsed(), "done");

    if options.run {
        return run_executable(&options.output)
            .map_err(|error| report(&error, &source, &name, Failure::Tool));
    }

    Ok(0)
}
