use clap::{Parser, Subcommand};
use env_logger::Env;

use langtemplate_cli::{
    HandlerArgs, compile::run_compile_command, extract::parse_document,
    extract::run_parse_command, plurals::run_check_plurals_command, view::print_view,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log progress to stderr; RUST_LOG overrides the level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a document into a template and a stringset.
    Parse {
        /// The document to parse
        #[arg(short, long)]
        input: String,
        /// Where to write the template
        #[arg(short, long)]
        template: String,
        /// Where to write the extracted strings, as JSON
        #[arg(short, long)]
        stringset: String,
        #[command(flatten)]
        handler: HandlerArgs,
    },

    /// Write a (translated) stringset into a template.
    Compile {
        /// The template produced by `parse`
        #[arg(short, long)]
        template: String,
        /// The strings to write, as JSON
        #[arg(short, long)]
        stringset: String,
        /// The document to write
        #[arg(short, long)]
        output: String,
        /// Fail when a plural string misses a rule this language requires
        #[arg(short, long)]
        lang: Option<String>,
        #[command(flatten)]
        handler: HandlerArgs,
    },

    /// View the strings of a document.
    View {
        /// The document to view
        #[arg(short, long)]
        input: String,
        /// Display full value without truncation (even in terminal)
        #[arg(long)]
        full: bool,
        /// Print the stringset as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        handler: HandlerArgs,
    },

    /// Report plural strings missing rules a language requires.
    CheckPlurals {
        /// The stringset to check, as JSON
        #[arg(short, long)]
        stringset: String,
        /// Language code, eg `fr` or `pt-BR`
        #[arg(short, long)]
        lang: String,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let result = match args.commands {
        Commands::Parse {
            input,
            template,
            stringset,
            handler,
        } => run_parse_command(&input, &template, &stringset, &handler).map(|count| {
            println!("✅ Extracted {} strings from {}", count, input);
        }),
        Commands::Compile {
            template,
            stringset,
            output,
            lang,
            handler,
        } => run_compile_command(&template, &stringset, &output, lang.as_deref(), &handler).map(
            |count| {
                println!("✅ Compiled {} strings into {}", count, output);
            },
        ),
        Commands::View {
            input,
            full,
            json,
            handler,
        } => parse_document(&input, &handler).and_then(|(_, strings)| {
            if json {
                let body = serde_json::to_string_pretty(&strings)
                    .map_err(|e| format!("Error serializing to JSON: {}", e))?;
                println!("{}", body);
            } else {
                print_view(&strings, full);
            }
            Ok(())
        }),
        Commands::CheckPlurals {
            stringset,
            lang,
            json,
        } => run_check_plurals_command(&stringset, &lang, json),
    };

    if let Err(e) = result {
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }
}
