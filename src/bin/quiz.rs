use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use studynotes::config::Config;
use studynotes::corpus::Slug;
use studynotes::logging::init_logging;
use studynotes::page::{PageSettings, StudyPage};
use studynotes::quiz::{next, InputOutcome, Pool, Status};

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

const HELP: &str = "\
  N text      answer blank N (end with the trigger character to fill it in)
  :reveal N   show or hide the answer of blank N
  :ratio R    change the visible fraction (0..1)
  :reset      reshuffle blanks and clear answers
  :next       jump to another document of the pool
  :quit       leave";

/// Interactive fill-in-the-blank session in the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Document to start with
    slug: String,

    /// JSON array of slug paths used by `:next`
    #[arg(long)]
    files: Option<String>,

    /// Corpus root (overrides STUDY_ROOT)
    #[arg(short, long)]
    root: Option<PathBuf>,
}

enum Command {
    Answer(usize, String),
    Reveal(usize),
    Ratio(f64),
    Reset,
    Next,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (head, rest) = line.trim_start().split_once(' ').unwrap_or((line.trim(), ""));
    match head {
        ":reveal" => rest.trim().parse().ok().map(Command::Reveal),
        ":ratio" => rest.trim().parse().ok().map(Command::Ratio),
        ":reset" => Some(Command::Reset),
        ":next" => Some(Command::Next),
        ":quit" | ":q" => Some(Command::Quit),
        ":help" => Some(Command::Help),
        _ => head
            .parse()
            .ok()
            .map(|index| Command::Answer(index, rest.to_string())),
    }
}

fn open(root: &Path, slug: &Slug, pool: &Pool, settings: PageSettings) -> Result<StudyPage> {
    let mut rng = rand::thread_rng();
    let mut page = if pool.is_empty() {
        StudyPage::open_study(root, slug, settings)
    } else {
        StudyPage::open_random(root, slug, pool, settings, &mut rng)
    }
    .with_context(|| format!("could not open '{slug}'"))?;
    page.mount();
    Ok(page)
}

fn show(page: &mut StudyPage) {
    println!();
    println!("{BOLD}{}{RESET}", page.title());
    println!("{}", page.render_text());
    println!();
}

/// Block until every pending timer of the page has fired.
fn settle(page: &mut StudyPage) {
    while let Some(deadline) = page.next_deadline() {
        let now = Instant::now();
        if deadline > now {
            thread::sleep(deadline - now);
        }
        page.poll(Instant::now());
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()
        .context("invalid environment configuration")?
        .with_overrides(args.root, None);
    init_logging(config.log_json);

    let settings = config.page_settings();
    let pool = Pool::decode(args.files.as_deref());
    let mut slug = Slug::parse(&args.slug);
    let mut page = open(&config.root, &slug, &pool, settings)?;
    show(&mut page);
    println!("{HELP}");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush().context("failed to flush stdout")?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read stdin")?;
        page.poll(Instant::now());

        match parse_command(&line) {
            Some(Command::Answer(index, text)) => {
                match page.input(index, &text, Instant::now()) {
                    None => println!("no blank {index}"),
                    Some(InputOutcome::AutoFilled { .. }) => println!("filled in"),
                    Some(InputOutcome::Scheduled { .. }) => {
                        match page.submit(index) {
                            Some(Status::Correct) => println!("correct"),
                            Some(_) => println!("wrong"),
                            None => {}
                        }
                    }
                }
                show(&mut page);
            }
            Some(Command::Reveal(index)) => match page.toggle_answer(index) {
                Some(_) => show(&mut page),
                None => println!("no blank {index}"),
            },
            Some(Command::Ratio(ratio)) => {
                page.nudge_ratio(ratio, Instant::now());
                settle(&mut page);
                show(&mut page);
            }
            Some(Command::Reset) => {
                page.reset();
                show(&mut page);
            }
            Some(Command::Next) => {
                let current = slug.to_string();
                match next(&pool, Some(&current), true, &mut rand::thread_rng()) {
                    Some(target) => {
                        page.unmount();
                        slug = target.slug;
                        page = open(&config.root, &slug, &pool, settings)?;
                        show(&mut page);
                    }
                    None => println!("no pool selected, pass --files to enable :next"),
                }
            }
            Some(Command::Quit) => break,
            Some(Command::Help) => println!("{HELP}"),
            None => println!("unknown command, :help lists them"),
        }
    }

    page.unmount();
    Ok(())
}
