use anyhow::{Context, Result};
use bitgraph::commands::plumbing::cat_file::CatFileOutput;
use bitgraph::{CommitDecoration, CommitDisplayFormat, LogOptions, Repository, SortFlags};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `BIT_LOG=bitgraph=debug`
const LOG_ENV: &str = "BIT_LOG";

#[derive(Parser)]
#[command(
    name = "bit",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "A git-compatible object store and history walker",
    long_about = "bit stores content-addressed objects in a git-compatible layout, \
    stages files in a git index and walks commit history in breadth-first, \
    date, topological or reversed order.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "init",
        about = "Initialize a new repository",
        long_about = "This command initializes a new repository in the current directory or at the specified path."
    )]
    Init {
        #[arg(index = 1, help = "The path to the repository")]
        path: Option<PathBuf>,
    },
    #[command(
        name = "hash-object",
        about = "Compute an object id and optionally write the object to the database"
    )]
    HashObject {
        #[arg(short, long, help = "Write the object to the object database")]
        write: bool,
        #[arg(index = 1)]
        file: PathBuf,
    },
    #[command(
        name = "cat-file",
        about = "Print the content or type of an object",
        long_about = "With -p the object is pretty-printed, with -t only its type is shown. \
        Without either flag the stored payload is written as is."
    )]
    CatFile {
        #[arg(short = 'p', help = "Pretty-print the object content")]
        pretty: bool,
        #[arg(short = 't', conflicts_with = "pretty", help = "Print the object type")]
        show_type: bool,
        #[arg(index = 1, help = "The object to show (id, branch, tag, HEAD~n, ...)")]
        object: String,
    },
    #[command(name = "add", about = "Add file contents to the index")]
    Add {
        #[arg(index = 1, required = true, num_args = 1.., help = "Files or directories to stage")]
        paths: Vec<String>,
    },
    #[command(name = "commit", about = "Record the staged snapshot as a new commit")]
    Commit {
        #[arg(short, long, help = "The commit message")]
        message: String,
    },
    #[command(
        name = "branch",
        about = "List branches, or create one",
        long_about = "Without arguments the branches are listed. With a name a new branch is \
        created at the given start revision, or at HEAD."
    )]
    Branch {
        #[arg(index = 1, help = "The branch to create")]
        name: Option<String>,
        #[arg(index = 2, requires = "name", help = "Revision the branch starts at")]
        start: Option<String>,
    },
    #[command(
        name = "tag",
        about = "List tags, or create an annotated tag",
        long_about = "Without arguments the tags are listed. With a name an annotated tag is \
        created for the target revision, or for HEAD."
    )]
    Tag {
        #[arg(index = 1, help = "The tag to create")]
        name: Option<String>,
        #[arg(index = 2, requires = "name", help = "Object the tag points at")]
        target: Option<String>,
        #[arg(short, long, requires = "name", help = "The tag message")]
        message: Option<String>,
    },
    #[command(name = "log", about = "Show commit history")]
    Log {
        #[command(flatten)]
        order: OrderArgs,
        #[arg(long, help = "Shorthand for --format=oneline --abbrev-commit")]
        oneline: bool,
        #[arg(long, help = "Show abbreviated commit ids")]
        abbrev_commit: bool,
        #[arg(long, value_enum, default_value_t = CommitDisplayFormat::Medium)]
        format: CommitDisplayFormat,
        #[arg(
            long,
            value_enum,
            num_args = 0..=1,
            default_value_t = CommitDecoration::None,
            default_missing_value = "short",
            help = "Show the references pointing at each commit"
        )]
        decorate: CommitDecoration,
        #[arg(
            index = 1,
            help = "Revisions to start from; prefix with ^ to exclude a revision's history"
        )]
        revisions: Vec<String>,
    },
    #[command(name = "rev-list", about = "List commits reachable from the given revisions")]
    RevList {
        #[command(flatten)]
        order: OrderArgs,
        #[arg(long, help = "Print only the number of commits")]
        count: bool,
        #[arg(
            index = 1,
            help = "Revisions to start from; prefix with ^ to exclude a revision's history"
        )]
        revisions: Vec<String>,
    },
}

#[derive(clap::Args)]
struct OrderArgs {
    #[arg(long, help = "Never show a commit before its descendants")]
    topo_order: bool,
    #[arg(long, help = "Show newer commits first")]
    date_order: bool,
    #[arg(long, help = "Output the commits in reverse order")]
    reverse: bool,
}

impl OrderArgs {
    fn sorting(&self) -> SortFlags {
        let mut sorting = SortFlags::NONE;
        sorting.set(SortFlags::TOPOLOGICAL, self.topo_order);
        sorting.set(SortFlags::TIME, self.date_order);
        sorting.set(SortFlags::REVERSE, self.reverse);

        sorting
    }
}

fn open_repository(pwd: &Path) -> Result<Repository> {
    let repository = Repository::open(pwd)
        .with_context(|| format!("not a bit repository: {}", pwd.display()))?;

    Ok(repository.with_writer(Box::new(std::io::stdout())))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    let cli = Cli::parse();
    let pwd = std::env::current_dir()?;

    match &cli.command {
        Commands::Init { path } => {
            let path = path.clone().unwrap_or(pwd);
            Repository::init_with_report(&path, Box::new(std::io::stdout()))?;
        }
        Commands::HashObject { write, file } => {
            open_repository(&pwd)?.hash_object(file, *write)?;
        }
        Commands::CatFile {
            pretty,
            show_type,
            object,
        } => {
            let output = match (*pretty, *show_type) {
                (_, true) => CatFileOutput::Type,
                (true, false) => CatFileOutput::Pretty,
                (false, false) => CatFileOutput::Raw,
            };
            open_repository(&pwd)?.cat_file(object, output)?;
        }
        Commands::Add { paths } => {
            open_repository(&pwd)?.add(paths)?;
        }
        Commands::Commit { message } => {
            open_repository(&pwd)?.commit(message)?;
        }
        Commands::Branch { name, start } => {
            let repository = open_repository(&pwd)?;
            match name {
                Some(name) => repository.branch(name, start.as_deref())?,
                None => repository.list_branches()?,
            }
        }
        Commands::Tag {
            name,
            target,
            message,
        } => {
            let repository = open_repository(&pwd)?;
            match name {
                Some(name) => {
                    let message = message
                        .as_deref()
                        .context("an annotated tag needs a message (-m)")?;
                    repository.tag(name, target.as_deref(), message)?;
                }
                None => repository.list_tags()?,
            }
        }
        Commands::Log {
            order,
            oneline,
            abbrev_commit,
            format,
            decorate,
            revisions,
        } => {
            let opts = LogOptions {
                oneline: *oneline,
                abbrev_commit: *abbrev_commit,
                format: *format,
                decorate: *decorate,
                sorting: order.sorting(),
            };

            open_repository(&pwd)?.log(revisions, &opts)?;
        }
        Commands::RevList {
            order,
            count,
            revisions,
        } => {
            open_repository(&pwd)?.rev_list(revisions, order.sorting(), *count)?;
        }
    }

    Ok(())
}
