//! strexpr: Compile and evaluate a C#-style expression from the command line.
//!
//! Usage:
//!   strexpr [options] <EXPRESSION>
//!
//! ```text
//! strexpr --arg int=3 --arg int=4 --returns int "(x, y) => x * y + 1"
//! strexpr -n System "Math.Sqrt(16)"
//! ```

mod args;

use clap::Parser as ClapParser;
use miette::{miette, LabeledSpan, Report};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use strexpr_ast::types::TypeDescriptor;
use strexpr_checker::{to_display_string, Registry, TypeRegistry};
use strexpr_compiler::{ExpressionCompiler, Signature};
use strexpr_diagnostics::Diagnostic;
use strexpr_options::ParseOptions;
use strexpr_printer::print_lambda;
use tracing_subscriber::filter::LevelFilter;

#[derive(ClapParser, Debug)]
#[command(name = "strexpr", about = "Compile and evaluate a C#-style expression", version)]
struct Cli {
    /// The expression, optionally with a lambda header: `(x, y) => x + y`.
    #[arg(value_name = "EXPRESSION")]
    expression: String,

    /// Bind the next lambda parameter, e.g. `int=3` or `string?=null`.
    #[arg(long = "arg", value_name = "TYPE=VALUE")]
    args: Vec<String>,

    /// Declared return type of the lambda.
    #[arg(long, value_name = "TYPE", default_value = "object")]
    returns: String,

    /// Namespace searched for unqualified type names (repeatable).
    #[arg(short = 'n', long = "namespace", value_name = "NAMESPACE")]
    namespaces: Vec<String>,

    /// JSON file with parse options.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the typed tree instead of evaluating it.
    #[arg(long)]
    tree: bool,

    /// Enable debug logging.
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Exit code for a usage, configuration or parse failure.
const EXIT_PARSE: i32 = 1;
/// Exit code for a failure while evaluating.
const EXIT_EVAL: i32 = 2;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match run(&cli) {
        Ok(output) => {
            println!("{}", output);
            0
        }
        Err((code, report)) => {
            eprintln!("{:?}", report);
            code
        }
    };
    process::exit(code);
}

fn init_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: &Cli) -> Result<String, (i32, Report)> {
    let fail = |report: Report| (EXIT_PARSE, report);

    let mut options = match &cli.config {
        Some(path) => ParseOptions::load(path).map_err(|e| fail(miette!("{}", e)))?,
        None => ParseOptions::default(),
    };
    options.merge(&ParseOptions::with_namespaces(cli.namespaces.iter().cloned()));
    tracing::debug!(?options, "resolved options");

    let registry: Arc<dyn TypeRegistry> = Registry::standard();
    let bindings = cli
        .args
        .iter()
        .map(|arg| args::parse_binding(arg, registry.as_ref(), &options.namespaces))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| fail(miette!("invalid --arg: {}", e)))?;
    let return_type = args::resolve_type(&cli.returns, registry.as_ref(), &options.namespaces)
        .map_err(|e| fail(miette!("invalid --returns: {}", e)))?;

    let signature = Signature::new(bindings.iter().map(|b| b.ty.clone()).collect(), return_type);
    let compiler = ExpressionCompiler::new()
        .with_registry(Arc::clone(&registry))
        .with_options(options);

    if cli.tree {
        let lambda = compiler
            .parse(&cli.expression, &signature)
            .map_err(|d| fail(render_diagnostic(&d, &cli.expression)))?;
        return Ok(print_lambda(&lambda, registry.as_ref()));
    }

    let lambda = compiler
        .compile(&cli.expression, &signature)
        .map_err(|d| fail(render_diagnostic(&d, &cli.expression)))?;
    let values: Vec<_> = bindings.into_iter().map(|b| b.value).collect();
    let result = lambda
        .invoke(&values)
        .map_err(|e| (EXIT_EVAL, miette!("evaluation failed: {}", e)))?;
    if signature.return_type == TypeDescriptor::void() {
        return Ok(String::new());
    }
    Ok(to_display_string(Some(registry.as_ref()), &result))
}

/// A report pointing at the offending token in `source`.
fn render_diagnostic(diagnostic: &Diagnostic, source: &str) -> Report {
    let label = diagnostic.span.map(|span| match span.snippet(source) {
        Some(text) if !text.is_empty() => LabeledSpan::at(span.to_range(), format!("'{}'", text)),
        _ => LabeledSpan::at_offset(span.start as usize, "here"),
    });
    let report = match label {
        Some(label) => miette!(labels = vec![label], "{}", diagnostic),
        None => miette!("{}", diagnostic),
    };
    report.with_source_code(source.to_string())
}
