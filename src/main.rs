use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use studynotes::config::Config;
use studynotes::corpus::{build_study_index, collect_tree, search, Folder, Slug, StudyIndexItem};
use studynotes::logging::init_logging;
use studynotes::page::StudyPage;
use studynotes::quiz::{next, start, NavTarget, Pool, RevealState, RANDOM_ROUTE};
use tracing::info;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Browse a study-notes corpus and render fill-in-the-blank quizzes
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
struct Cli {
    /// Corpus root (overrides STUDY_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the folder tree
    Tree,

    /// Print the flattened study index
    Index {
        #[arg(long)]
        json: bool,
    },

    /// Search titles and paths
    Search {
        query: String,
        #[arg(long)]
        json: bool,
    },

    /// Render one document with blanks
    Show {
        slug: String,
        /// Initial reveal seed
        #[arg(long)]
        seed: Option<u64>,
        /// Fraction of inline tokens left visible
        #[arg(long)]
        ratio: Option<f64>,
        /// Print the first-paint view without blanks
        #[arg(long = "static")]
        static_view: bool,
    },

    /// Show one random problem block from a pool
    Random {
        /// JSON array of slug paths
        #[arg(long)]
        files: String,
        /// Document to show; picked from the pool when omitted
        slug: Option<String>,
    },

    /// Decode a navigation href and print a fresh next target
    Next { href: String },

    /// Verify that every document has a unique slug
    Check,
}

fn print_tree(folder: &Folder, depth: usize) {
    let indent = "  ".repeat(depth);
    for sub in &folder.folders {
        println!("{indent}{}/", sub.name);
        print_tree(sub, depth + 1);
    }
    for file in &folder.files {
        println!("{indent}{} ({})", file.title, file.slug);
    }
}

fn print_items(items: &[&StudyIndexItem], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(items).context("failed to serialize index")?
        );
        return Ok(());
    }
    for item in items {
        println!("{}\t{}\t{}", item.title, item.full_path_label, item.href());
    }
    Ok(())
}

fn print_page(page: &mut StudyPage) {
    let crumbs: Vec<&str> = page.breadcrumbs().iter().map(|c| c.label.as_str()).collect();
    if !crumbs.is_empty() {
        println!("{}", crumbs.join(" / "));
    }
    println!("{BOLD}{}{RESET}", page.title());
    for heading in page.toc() {
        println!("{}- {} (#{})", "  ".repeat(heading.level - 1), heading.text, heading.id);
    }
    println!();
    println!("{}", page.render_text());
    if let Some(href) = page.next_href() {
        println!();
        println!("next: {href}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()
        .context("invalid environment configuration")?
        .with_overrides(cli.root, None);
    init_logging(config.log_json);

    let root = config.root.as_path();
    let mut rng = rand::thread_rng();

    match cli.command {
        Commands::Tree => {
            let tree = collect_tree(root).context("failed to walk corpus")?;
            print_tree(&tree, 0);
        }
        Commands::Index { json } => {
            let tree = collect_tree(root).context("failed to walk corpus")?;
            let items = build_study_index(&tree);
            print_items(&items.iter().collect::<Vec<_>>(), json)?;
        }
        Commands::Search { query, json } => {
            let tree = collect_tree(root).context("failed to walk corpus")?;
            let items = build_study_index(&tree);
            print_items(&search(&items, &query), json)?;
        }
        Commands::Show {
            slug,
            seed,
            ratio,
            static_view,
        } => {
            let settings = config.clone().with_overrides(None, ratio).page_settings();
            let state = match seed {
                Some(seed) => RevealState::with_seed(seed, settings.reveal_ratio),
                None => RevealState::new(settings.reveal_ratio),
            };
            let mut page = StudyPage::open_study_seeded(root, &Slug::parse(&slug), settings, state)
                .with_context(|| format!("could not open '{slug}'"))?;
            if !static_view {
                page.mount();
            }
            print_page(&mut page);
        }
        Commands::Random { files, slug } => {
            let pool = Pool::decode(Some(&files));
            let slug = match slug {
                Some(slug) => Slug::parse(&slug),
                None => match start(&pool, &mut rng) {
                    Some(target) => target.slug,
                    None => bail!("the pool is empty, pick files first"),
                },
            };
            let mut page =
                StudyPage::open_random(root, &slug, &pool, config.page_settings(), &mut rng)
                    .with_context(|| format!("could not open '{slug}'"))?;
            page.mount();
            print_page(&mut page);
        }
        Commands::Next { href } => {
            let target = NavTarget::from_href(&href)
                .with_context(|| format!("'{href}' is not a random-study href"))?;
            let current = target.slug.to_string();
            match next(&target.pool, Some(&current), false, &mut rng) {
                Some(target) => println!("{}", target.href()),
                None => println!("{RANDOM_ROUTE}"),
            }
        }
        Commands::Check => {
            let tree = collect_tree(root).context("failed to walk corpus")?;
            tree.check_unique_slugs().context("slug collision in corpus")?;
            let (folders, files) = tree.count();
            info!("checked {} files in {} folders", files, folders);
            println!("{files} documents, all slugs unique");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::parse_from(["studynotes", "show", "a/b", "--seed", "7", "--static"]);
        match cli.command {
            Commands::Show {
                slug,
                seed,
                static_view,
                ..
            } => {
                assert_eq!(slug, "a/b");
                assert_eq!(seed, Some(7));
                assert!(static_view);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
