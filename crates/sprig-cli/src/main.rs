use std::env;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use sprig::{Data, InterpreterLimits, RunError};

struct Args {
    path: String,
    include_paths: Vec<PathBuf>,
    recursion_limit: Option<usize>,
    dump_ast: bool,
}

fn parse_args(raw: Vec<String>) -> Result<Args, String> {
    let mut include_paths = Vec::new();
    let mut recursion_limit = None;
    let mut dump_ast = false;
    let mut path = None;

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--include" => {
                let dir = iter.next().ok_or("--include requires a DIR argument")?;
                include_paths.push(PathBuf::from(dir));
            }
            "--recursion-limit" => {
                let n = iter.next().ok_or("--recursion-limit requires a number")?;
                recursion_limit = Some(n.parse::<usize>().map_err(|_| "--recursion-limit expects an integer")?);
            }
            "--dump-ast" => dump_ast = true,
            other if path.is_none() => path = Some(other.to_owned()),
            other => return Err(format!("unexpected argument: {other}")),
        }
    }

    let path = path.ok_or("usage: interpreter [--include DIR]... [--recursion-limit N] [--dump-ast] PATH")?;
    Ok(Args { path, include_paths, recursion_limit, dump_ast })
}

fn main() -> ExitCode {
    let raw: Vec<String> = env::args().skip(1).collect();
    let args = match parse_args(raw) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::from(2);
        }
    };

    let source = match fs::read_to_string(&args.path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: could not read {}: {err}", args.path);
            return ExitCode::from(2);
        }
    };

    if args.dump_ast {
        let outcome = sprig::parse(&args.path, &source);
        if !outcome.errors.is_empty() {
            report_parse_errors(&outcome.errors);
            return ExitCode::from(2);
        }
        match serde_json::to_string_pretty(&outcome.expression) {
            Ok(json) => {
                println!("{json}");
                return ExitCode::SUCCESS;
            }
            Err(err) => {
                eprintln!("error: could not serialize AST: {err}");
                return ExitCode::from(2);
            }
        }
    }

    let mut limits = InterpreterLimits::default();
    limits.include_paths = args.include_paths;
    if let Some(n) = args.recursion_limit {
        limits.max_recursion_depth = n;
    }

    let (gc, result) = sprig::run(&args.path, &source, limits);
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(RunError::Exception(exc)) if matches!(exc.value, Data::Object(id) if id == gc.exceptions.parser_exception) => {
            eprintln!("ParserError at {}: could not parse {}", exc.position, args.path);
            ExitCode::from(2)
        }
        Err(RunError::Exception(exc)) => {
            let message = match exc.value {
                Data::Object(id) => gc.string_contents(id).unwrap_or_else(|| format!("<object {id}>")),
                other => format!("{other:?}"),
            };
            eprintln!("unhandled exception at {}: {message}", exc.position);
            for frame in exc.stack.iter().rev() {
                if frame.position.stack_reportable() {
                    eprintln!("  at {}", frame.position);
                }
            }
            ExitCode::from(1)
        }
        Err(other) => {
            eprintln!("error: {other}");
            ExitCode::from(1)
        }
    }
}

fn report_parse_errors(errors: &[sprig::ParserError]) {
    for err in errors {
        eprintln!("{err}");
    }
}
