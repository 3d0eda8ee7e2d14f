use chrono::{Local, Utc};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::path::PathBuf;

use drill::challenges::Challenge;
use drill::error::Result;
use drill::feedback::Promotion;
use drill::scheduler::{FeedbackOutcome, GenerateOutcome, StatusReport, WeightEffect};
use drill::store::{self, DataDir};
use drill::telemetry;

#[derive(Parser)]
#[command(name = "drill", about = "Adaptive practice scheduler")]
struct Cli {
    /// Directory holding the JSON stores
    #[arg(long, env = "DRILL_DATA_DIR", global = true)]
    data_dir: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
    /// Seed the random draw (reproducible selection)
    #[arg(long, global = true)]
    seed: Option<u64>,
    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Pick the next challenge (the default command)
    Generate {
        /// Force a wildcard challenge
        #[arg(long)]
        wildcard: bool,
    },
    /// Same as `generate --wildcard`
    Wildcard,
    /// Rate how hard a challenge felt, 1 (trivial) to 10 (very hard)
    Feedback {
        /// Challenge id, e.g. 2026-10-17-R-001
        id: String,
        /// Difficulty rating 1-10
        #[arg(allow_negative_numbers = true)]
        rating: i64,
    },
    /// Current zone, wildcard odds, top focus areas and totals
    Status {
        /// Focus areas to list
        #[arg(short = 'n', long, default_value = "5")]
        limit: usize,
    },
    /// Show all tunables, one tunable, or update one
    Config {
        /// Setting key, e.g. mastery-wildcard
        key: Option<String>,
        /// New value
        #[arg(allow_negative_numbers = true)]
        value: Option<String>,
    },
    /// Create the data directory with default content
    Init {
        /// Overwrite existing stores
        #[arg(long)]
        force: bool,
    },
    /// Show the full record of a challenge
    Show {
        /// Challenge id
        id: String,
    },
    /// Recent challenges, newest first
    Log {
        /// Max entries to show
        #[arg(short = 'n', long, default_value = "10")]
        limit: usize,
    },
}

fn main() {
    telemetry::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let data = DataDir::new(cli.data_dir.unwrap_or_else(store::default_root));
    let json = cli.json;

    match cli.cmd.unwrap_or(Cmd::Generate { wildcard: false }) {
        Cmd::Generate { wildcard } => generate(&data, wildcard, cli.seed, json),
        Cmd::Wildcard => generate(&data, true, cli.seed, json),

        Cmd::Feedback { id, rating } => {
            let mut snap = data.load()?;
            let outcome = snap.state.feedback(&id, rating, Local::now().date_naive())?;
            data.commit(&snap)?;
            if json {
                print_json(&outcome)
            } else {
                print_feedback(&outcome);
                Ok(())
            }
        }

        Cmd::Status { limit } => {
            let snap = data.load()?;
            let report = snap.state.status(limit);
            if json {
                print_json(&report)
            } else {
                print_status(&report);
                Ok(())
            }
        }

        Cmd::Config { key, value } => {
            let mut loaded = data.load_config()?;
            match (key, value) {
                (None, _) => {
                    let entries = loaded.value.entries();
                    if json {
                        let map: serde_json::Map<String, serde_json::Value> = entries
                            .into_iter()
                            .map(|(k, v)| (k.to_string(), serde_json::json!(v)))
                            .collect();
                        return print_json(&map);
                    }
                    println!("SYSTEM CONFIGURATION");
                    for (k, v) in entries {
                        println!("  {k:<26} {v}");
                    }
                    Ok(())
                }
                (Some(key), None) => {
                    let v = loaded.value.get(&key)?;
                    if json {
                        return print_json(&serde_json::json!({ key: v }));
                    }
                    println!("{key} = {v}");
                    Ok(())
                }
                (Some(key), Some(raw)) => {
                    let old = loaded.value.set(&key, &raw)?;
                    let new = loaded.value.get(&key)?;
                    data.commit_config(&loaded)?;
                    if json {
                        return print_json(&serde_json::json!({ "key": key, "old": old, "new": new }));
                    }
                    println!("updated {key}: {old} -> {new}");
                    Ok(())
                }
            }
        }

        Cmd::Init { force } => {
            let paths = data.init(force)?;
            for p in &paths {
                eprintln!("wrote {}", p.display());
            }
            println!("initialised {}", data.root().display());
            Ok(())
        }

        Cmd::Show { id } => {
            let snap = data.load()?;
            match snap.state.log.get(&id) {
                Some(c) => print_json(c),
                None => Err(drill::DrillError::NotFound(format!("challenge {id} not found"))),
            }
        }

        Cmd::Log { limit } => {
            let snap = data.load()?;
            let items = snap.state.log.recent(limit);
            if json {
                return print_json(&items);
            }
            if items.is_empty() {
                eprintln!("no challenges yet");
            }
            for c in items {
                print_log_line(c);
            }
            Ok(())
        }
    }
}

fn generate(data: &DataDir, force_wildcard: bool, seed: Option<u64>, json: bool) -> Result<()> {
    let mut rng = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut snap = data.load()?;
    let outcome = snap
        .state
        .generate(force_wildcard, Local::now().date_naive(), Utc::now(), &mut rng)?;
    data.commit(&snap)?;
    if json {
        print_json(&outcome)
    } else {
        print_generated(&outcome);
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn pct(x: f64) -> String {
    format!("{}%", (x * 100.0).round())
}

fn print_generated(out: &GenerateOutcome) {
    let c = &out.challenge;
    if c.is_wildcard() {
        println!("WILDCARD CHALLENGE ({})", c.concept);
    } else {
        println!("TRAINING CHALLENGE ({})", c.concept);
    }
    println!("Challenge {}\n", c.id);
    println!("{}", c.prompt);
    if let Some(sel) = &out.selection {
        eprintln!(
            "\nweight {} x recency {:.1} -> {} of the draw",
            pct(sel.weight),
            sel.recency_multiplier,
            pct(sel.share)
        );
    }
    eprintln!("\nrate it when done: drill feedback {} <1-10>", c.id);
}

fn print_feedback(out: &FeedbackOutcome) {
    println!("Feedback recorded for {}", out.id);
    println!("Difficulty: {} (attempt {})\n", out.rating, out.attempts);

    match &out.effect {
        WeightEffect::Adjusted { old, new } => {
            println!("\"{}\" weight: {} -> {}", out.concept, pct(*old), pct(*new));
        }
        WeightEffect::Wildcard {
            promotion,
            average_rating,
        } => {
            println!("Average rating: {average_rating:.1}");
            match promotion {
                Promotion::Mastered { weight } => println!(
                    "Wildcard mastered, added to regular practice: \"{}\" weight {}",
                    out.concept,
                    pct(*weight)
                ),
                Promotion::Challenging { weight } => println!(
                    "Challenging wildcard, added to focused practice: \"{}\" weight {}",
                    out.concept,
                    pct(*weight)
                ),
                Promotion::Continue => println!("Wildcard practice continues."),
            }
        }
    }

    match (&out.before, &out.after) {
        (Some(b), Some(a)) if b.zone != a.zone => {
            println!("Zone: {} -> {}", b.zone, a.zone);
            println!("Wildcard chance: {} -> {}", pct(b.wildcard_probability), pct(a.wildcard_probability));
        }
        (_, Some(a)) => {
            println!("Zone: {}", a.zone);
            println!("Wildcard chance: {}", pct(a.wildcard_probability));
        }
        (_, None) => {}
    }
}

fn print_status(r: &StatusReport) {
    println!("TRAINING STATUS\n");
    match &r.reading {
        Some(reading) => {
            println!("System mode: {}", reading.zone);
            println!("Average attention: {}", pct(reading.average));
        }
        None => println!("System mode: no concepts in rotation"),
    }
    println!("Wildcard probability: {}\n", pct(r.wildcard_probability));

    if !r.focus.is_empty() {
        println!("Top focus areas:");
        for f in &r.focus {
            println!("  {}: {} ({})", f.concept, pct(f.weight), f.level);
        }
        println!();
    }
    println!("Concepts: {}  Wildcard prompts: {}", r.concepts, r.wildcard_prompts);
    println!("Total challenges: {}", r.totals.total_challenges);
    println!(
        "Wildcard encounters: {} ({})",
        r.totals.total_wildcards,
        pct(r.wildcard_share)
    );
}

fn print_log_line(c: &Challenge) {
    let ratings: Vec<String> = c.feedback_history.iter().map(|r| r.to_string()).collect();
    println!(
        "{}  {:<8}  {:<24}  attempts {}  [{}]",
        c.id,
        c.kind,
        c.concept,
        c.attempts,
        ratings.join(",")
    );
}
