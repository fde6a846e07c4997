mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use codespan_reporting::diagnostic::Diagnostic;
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use serde::Deserialize;
use tracing::{Level, event};
use tracing_subscriber::EnvFilter;

use blocks::{BlockConfig, BlockError, ContentId, Host, ProcedureBlock, Workspace};
use proccode::mutation::Mutation;

#[derive(Parser)]
#[command(name = "procblocks", version, about = "Procedure block mutation tool")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a <mutation> element into a procedure block and print its layout
    Render(RenderArgs),

    /// Run .test.xml fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// File containing a single <mutation> element
    file: String,

    /// Which procedure block to load the mutation into
    #[arg(short, long, value_enum, default_value = "caller")]
    variant: Variant,

    /// Editor commands applied after loading, in order (root only). Repeatable.
    #[arg(short, long, value_enum)]
    append: Vec<Append>,

    /// Validate only, don't print anything (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump the block state and inputs
    #[arg(long)]
    dump: bool,

    /// Print the block's mutation after loading and edits
    #[arg(long)]
    emit: bool,

    /// Seed for generated ids
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.xml file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

/// The three procedure block types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// procedures_callnoreturn
    #[default]
    Caller,
    /// procedures_callnoreturn_internal
    Internal,
    /// procedures_mutator_root
    Root,
}

impl Variant {
    pub fn config(self) -> BlockConfig {
        match self {
            Variant::Caller => blocks::CALLER,
            Variant::Internal => blocks::INTERNAL_CALLER,
            Variant::Root => blocks::MUTATOR_ROOT,
        }
    }
}

/// Mutator root edit commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Append {
    Label,
    Boolean,
    String,
}

impl Append {
    pub fn apply(
        self,
        block: &mut ProcedureBlock,
        host: &mut dyn Host,
    ) -> Result<Vec<ContentId>, BlockError> {
        match self {
            Append::Label => block.append_label(host),
            Append::Boolean => block.append_boolean(host),
            Append::String => block.append_string_number(host),
        }
    }
}

pub fn workspace(seed: Option<u64>) -> Workspace {
    match seed {
        Some(seed) => Workspace::with_seed(seed),
        None => Workspace::new(),
    }
}

fn main() {
    tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Render(render_args) => do_render(render_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn do_render(args: RenderArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    // Read source
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());
    let emit = |diagnostic: Diagnostic<usize>, files: &SimpleFiles<String, String>| {
        let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
    };

    let block_config = args.variant.config();
    let mutation = match Mutation::parse_xml(&source, block_config.mutation_kind) {
        Ok(m) => m,
        Err(error) => {
            emit(error.to_diagnostic(file_id), &files);
            process::exit(1);
        }
    };

    // Codec errors inside the proc-code point into this pseudo-file.
    let proc_code_id = files.add(format!("{} (proccode)", args.file), mutation.proc_code.clone());

    let mut ws = workspace(args.seed);
    let mut block = ProcedureBlock::new(block_config, &mut ws);

    let mut orphans = match block.load_mutation(&mut ws, &mutation) {
        Ok(orphans) => orphans,
        Err(BlockError::Codec(error)) => {
            emit(error.to_diagnostic(proc_code_id), &files);
            process::exit(1);
        }
        Err(error) => {
            eprintln!("error: {}", error);
            process::exit(1);
        }
    };

    for append in &args.append {
        match append.apply(&mut block, &mut ws) {
            Ok(more) => orphans.extend(more),
            Err(error) => {
                eprintln!("error: {}", error);
                process::exit(1);
            }
        }
    }
    event!(Level::DEBUG, "{} orphaned block(s)", orphans.len());

    // --check: load succeeded, exit
    if args.check {
        eprintln!("ok: {} loaded as {}", args.file, block_config.block_type);
        return;
    }

    // --dump: block state and inputs
    if args.dump {
        println!("{:#?}", block.state());
        println!("{:#?}", block.inputs());
        return;
    }

    println!("{}", block.layout(&ws));

    if args.emit {
        match block.mutation_xml() {
            Ok(xml) => println!("{}", xml),
            Err(error) => {
                emit(error.to_diagnostic(file_id), &files);
                process::exit(1);
            }
        }
    }
}
