#[macro_use]
extern crate indoc;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::{
    self,
    termcolor::{ColorChoice, StandardStream},
    Config,
};
use logos::Logos;

use wenyan::error::{report_grammar_error, report_runtime_error};
use wenyan::token::Token;

/// A lexer, macro expander, parser, and tree-walking evaluator for Wenyan.
#[derive(Parser)]
#[command(name = "wenyan", about = "Run a Wenyan (文言) source file")]
struct Cli {
    /// A `.wy` Wenyan source file.
    path: PathBuf,

    /// Romanize keywords/identifiers in diagnostics. Has no effect on
    /// parsing or evaluation.
    #[arg(long)]
    roman: bool,

    /// Print the token stream instead of evaluating.
    #[arg(long = "dump-tokens", long_help = indoc! {
        "Lex and macro-expand the source, print the resulting token stream,
        and exit without parsing or evaluating."
    })]
    dump_tokens: bool,

    /// Print the parsed AST instead of evaluating.
    #[arg(long = "dump-ast", long_help = indoc! {
        "Lex, expand, and parse the source, print the resulting AST, and
        exit without evaluating."
    })]
    dump_ast: bool,
}

fn main() -> ExitCode {
    let _ = simple_logger::SimpleLogger::new().with_level(log::LevelFilter::Info).init();
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("could not read {}: {error}", cli.path.display());
            return ExitCode::from(2);
        }
    };

    let mut files = SimpleFiles::<String, String>::new();
    let file_id = files.add(cli.path.display().to_string(), source.clone());
    let stderr_writer = StandardStream::stderr(ColorChoice::Always);
    let config = Config::default();

    if cli.dump_tokens {
        log::debug!("lexing {}", cli.path.display());
        for (token, _) in Token::lexer(&source).spanned() {
            println!("{token:?}");
        }
        return ExitCode::SUCCESS;
    }

    log::debug!("parsing {}", cli.path.display());
    let program = match wenyan::compile(&source) {
        Ok(program) => program,
        Err(error) => {
            report_grammar_error(&error, file_id, &files, &mut stderr_writer.lock(), &config, cli.roman);
            return ExitCode::from(1);
        }
    };

    if cli.dump_ast {
        println!("{program:#?}");
        return ExitCode::SUCCESS;
    }

    log::debug!("evaluating {}", cli.path.display());
    match wenyan::eval::eval_program(&program) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            report_runtime_error(&error, file_id, &files, &mut stderr_writer.lock(), &config, cli.roman);
            ExitCode::from(2)
        }
    }
}

