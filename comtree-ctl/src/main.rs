use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use comtree_store::{
    api::{Comparator, Field, Operator, Value},
    snapshot, table, SortBy, Tree,
};

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Print a tree level by level
    Show {
        /// Tree file, `.csv` for a table and anything else for a snapshot
        file: PathBuf,

        /// Field to print for each comment
        #[structopt(long, default_value = "text")]
        field: Field,

        /// Additional field to print next to each comment
        #[structopt(long)]
        extra: Option<Field>,

        /// Print parent, index and id of each comment
        #[structopt(long)]
        debug: bool,

        /// Print the nested JSON view instead
        #[structopt(long)]
        json: bool,
    },

    /// Search for comments
    Find {
        file: PathBuf,

        /// Query set, as comma-separated `field=value` pairs. May be repeated.
        #[structopt(long = "set")]
        sets: Vec<String>,

        /// Comparison operator applied between a field and its target value
        #[structopt(long = "op", default_value = "==")]
        operator: Operator,

        /// Compare values as they are instead of casting to the target's kind
        #[structopt(long)]
        no_cast: bool,

        /// Maximum number of comments to return
        #[structopt(long)]
        cap: Option<usize>,

        /// Index path from the root, as dot-separated indices. May be repeated,
        /// and takes precedence over query sets.
        #[structopt(long = "path")]
        paths: Vec<String>,
    },

    /// Sort the children of every comment and write the result
    Sort {
        input: PathBuf,
        output: PathBuf,

        #[structopt(long, default_value = "likes")]
        field: Field,

        #[structopt(long)]
        descending: bool,

        /// Ordering operator, one of `<`, `<=`, `>`, `>=`
        #[structopt(long = "op", default_value = "<")]
        comparator: Comparator,
    },

    /// Rewrite a tree in the format implied by the output extension
    Convert { input: PathBuf, output: PathBuf },

    /// List the ids of the comments of each author
    Authors { file: PathBuf },
}

fn is_table(path: &Path) -> bool {
    path.extension().map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}

fn load(path: &Path) -> anyhow::Result<Tree> {
    match is_table(path) {
        true => table::load(path),
        false => snapshot::load(path),
    }
}

fn save(tree: &Tree, path: &Path) -> anyhow::Result<()> {
    match is_table(path) {
        true => table::save(tree, path),
        false => snapshot::save(tree, path),
    }
}

fn parse_set(set: &str) -> anyhow::Result<Vec<(Field, Value)>> {
    set.split(',')
        .map(|pair| {
            let (field, value) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected `field=value`, got {pair:?}"))?;
            let field = field.trim().parse::<Field>()?;
            // unparseable values stay strings and get cast at comparison time
            let value = Value::parse_for(field, value)
                .unwrap_or_else(|_| Value::Str(value.to_string()));
            Ok((field, value))
        })
        .collect()
}

fn parse_path(path: &str) -> anyhow::Result<Vec<usize>> {
    path.split('.')
        .map(|i| {
            i.parse()
                .with_context(|| format!("parsing index {i:?} of path {path:?}"))
        })
        .collect()
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = <Opt as structopt::StructOpt>::from_args();

    match opt.cmd {
        Command::Show {
            file,
            field,
            extra,
            debug,
            json,
        } => {
            let tree = load(&file)?;
            if json {
                let out = serde_json::to_string_pretty(&tree.root().local_tree())
                    .context("serializing nested view")?;
                println!("{out}");
            } else {
                println!("{}", tree.level_order(field, extra, debug));
            }
        }
        Command::Find {
            file,
            sets,
            operator,
            no_cast,
            cap,
            paths,
        } => {
            let tree = load(&file)?;
            let mut find = tree.find_nodes().operator(operator).cast(!no_cast);
            for set in &sets {
                find = find.query(parse_set(set).with_context(|| format!("parsing set {set:?}"))?);
            }
            if !paths.is_empty() {
                find = find.paths(paths.iter().map(|p| parse_path(p)).collect::<Result<_, _>>()?);
            }
            if let Some(cap) = cap {
                find = find.cap(cap);
            }
            let found = find.run()?;
            for (i, group) in found.groups.iter().enumerate() {
                println!("group {i}:");
                for n in group.iter().filter_map(|k| tree.node_ref(*k)) {
                    println!("    {}\t{}", n.id(), n.comment().text());
                }
            }
            tracing::info!(warnings = found.warnings.len(), "search done");
        }
        Command::Sort {
            input,
            output,
            field,
            descending,
            comparator,
        } => {
            let mut tree = load(&input)?;
            let by = SortBy::field(field)
                .descending(descending)
                .comparator(comparator);
            tree.sort(&by)?;
            save(&tree, &output)?;
        }
        Command::Convert { input, output } => {
            save(&load(&input)?, &output)?;
        }
        Command::Authors { file } => {
            let tree = load(&file)?;
            for (author, ids) in tree.unique_authors() {
                println!("{author}: {}", ids.join(", "));
            }
        }
    }

    Ok(())
}
