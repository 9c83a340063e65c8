use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::PathBuf;
use std::process::ExitCode;

use gloomedit_core::campaign::{CampaignUpdate, CampaignValues};
use gloomedit_core::character::{CharacterUpdate, CharacterValues};
use gloomedit_core::events::EventDeckKind;
use gloomedit_core::scenario::StatusChange;
use gloomedit_core::{EditError, Graph, SaveData, ScenarioStatus};

#[derive(Debug, Parser)]
#[command(name = "gloomedit", version, about = "Gloomhaven campaign save editor")]
struct Args {
    /// Path to the campaign save file.
    #[arg(long)]
    save: PathBuf,

    /// JSON dump of the save's decoded object graph, as produced by an
    /// external record-stream decoder. Required by quest and chest
    /// commands.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Apply edits in memory and report, but do not write the file.
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Skip the timestamped backup normally written before the first
    /// mutation.
    #[arg(long, default_value_t = false)]
    no_backup: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show or replace a city/road event deck.
    Events {
        /// Which deck: city or road.
        kind: String,
        /// New event identifiers, in draw order. Omit to show the deck.
        #[arg(long, num_args = 1..)]
        set: Option<Vec<String>>,
    },
    /// Show or update a character's values.
    Character {
        name: String,
        #[arg(long)]
        gold: Option<u32>,
        #[arg(long)]
        experience: Option<u32>,
        #[arg(long)]
        perk_points: Option<u32>,
        #[arg(long)]
        perk_checks: Option<u32>,
    },
    /// Show or update campaign-wide values.
    Campaign {
        #[arg(long)]
        donated: Option<u32>,
        #[arg(long)]
        prosperity: Option<u32>,
        #[arg(long)]
        reputation: Option<u32>,
    },
    /// Show one scenario's status, or set it by name.
    Scenario {
        number: u32,
        /// Target status (Locked, Unlocked, Blocked, Completed, ...).
        #[arg(long)]
        status: Option<String>,
    },
    /// Overview of every scenario grouped by status.
    Scenarios {
        /// Also list statuses with no scenarios and the locked bulk.
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },
    /// Show, reorder or trim the personal quest deck.
    Quests {
        /// Quests to move to the front, interleaved with the existing
        /// order.
        #[arg(long, num_args = 1..)]
        prioritise: Option<Vec<String>>,
        /// Quests to drop from the deck.
        #[arg(long, num_args = 1..)]
        remove: Option<Vec<String>>,
    },
    /// Show looted chests, or mark more as looted.
    Chests {
        /// Chest numbers to mark looted.
        #[arg(long, num_args = 1..)]
        loot: Option<Vec<u32>>,
    },
    /// Apply a whole campaign plan from a JSON file.
    Apply {
        #[arg(long)]
        plan: PathBuf,
    },
}

/// Campaign plan file, the batch counterpart of the individual
/// subcommands.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Plan {
    #[serde(rename = "GoldDonations")]
    gold_donations: Option<u32>,
    #[serde(rename = "Prosperity")]
    prosperity: Option<u32>,
    #[serde(rename = "Reputation")]
    reputation: Option<u32>,
    #[serde(rename = "CityEvents")]
    city_events: Option<Vec<String>>,
    #[serde(rename = "RoadEvents")]
    road_events: Option<Vec<String>>,
    #[serde(rename = "LootedChests")]
    looted_chests: Option<Vec<u32>>,
    #[serde(rename = "Characters", default)]
    characters: Vec<PlanCharacter>,
    #[serde(rename = "Scenarios", default)]
    scenarios: Vec<PlanScenario>,
}

#[derive(Debug, Deserialize)]
struct PlanCharacter {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Gold")]
    gold: Option<u32>,
    #[serde(rename = "Experience")]
    experience: Option<u32>,
    #[serde(rename = "PerkPoints")]
    perk_points: Option<u32>,
    #[serde(rename = "PerkChecks")]
    perk_checks: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct PlanScenario {
    #[serde(rename = "Id")]
    id: u32,
    #[serde(rename = "Status")]
    status: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), EditError> {
    let mut save = SaveData::load(&args.save)?;
    let graph = match &args.graph {
        Some(path) => Some(Graph::load(path)?),
        None => None,
    };

    let mutating = command_mutates(&args.command);
    if mutating && !args.no_backup {
        let backup = save.write_backup()?;
        println!("Backup written to {}", backup.display());
    }

    match args.command {
        Command::Events { kind, set } => {
            let kind = parse_deck_kind(&kind)?;
            match set {
                Some(events) => {
                    let report = save.replace_events(kind, &events)?;
                    println!(
                        "{} events replaced ({} -> {}).",
                        kind.label(),
                        report.previous.len(),
                        report.current.len()
                    );
                    print_events(kind, &report.current);
                }
                None => {
                    let events = save.read_events(kind)?;
                    print_events(kind, &events);
                }
            }
        }
        Command::Character {
            name,
            gold,
            experience,
            perk_points,
            perk_checks,
        } => {
            let update = CharacterUpdate {
                gold,
                experience,
                perk_points,
                perk_checks,
            };
            if update.is_empty() {
                print_character(&name, save.character_values(&name)?);
            } else {
                let (before, after) = save.update_character(&name, update)?;
                print_character_change(&name, before, after);
            }
        }
        Command::Campaign {
            donated,
            prosperity,
            reputation,
        } => {
            let update = CampaignUpdate {
                gold_donated: donated,
                prosperity,
                reputation,
            };
            if update.is_empty() {
                print_campaign(save.campaign_values()?);
            } else {
                let (before, after) = save.update_campaign(update)?;
                print_campaign_change(before, after);
            }
        }
        Command::Scenario { number, status } => match status {
            Some(status) => {
                let target = parse_status(&status)?;
                print_status_change(number, save.set_scenario_status(number, target)?);
            }
            None => {
                let status = save.scenario_status(number)?;
                println!("Scenario {number} is currently {}.", status.name());
            }
        },
        Command::Scenarios { verbose } => {
            print_overview(&save, verbose);
        }
        Command::Quests { prioritise, remove } => {
            let graph = require_graph(graph.as_ref())?;
            if let Some(quests) = remove {
                let report = save.remove_quests(graph, &quests)?;
                for name in &report.not_found {
                    println!("Quest {name} was not found in the quest deck!");
                }
                print_quests("New personal quest deck order", &report.order);
            } else if let Some(quests) = prioritise {
                let order = save.prioritise_quests(graph, &quests)?;
                print_quests("New personal quest deck order", &order);
            } else {
                let order = save.read_quests(graph)?;
                print_quests("Current personal quest deck order", &order);
            }
        }
        Command::Chests { loot } => {
            let graph = require_graph(graph.as_ref())?;
            match loot {
                Some(chests) => {
                    let report = save.loot_chests(graph, &chests)?;
                    println!(
                        "The following chests will now be set to 'looted': {}",
                        join(&report.newly_looted)
                    );
                    println!("Looted chests: {}", join(&report.looted));
                }
                None => {
                    let looted = save.read_looted_chests(graph)?;
                    println!("Looted chests: {}", join(&looted));
                }
            }
        }
        Command::Apply { plan } => {
            let text = std::fs::read_to_string(&plan)?;
            let plan: Plan = serde_json::from_str(&text)?;
            apply_plan(&mut save, graph.as_ref(), &plan)?;
        }
    }

    if mutating {
        if args.dry_run {
            println!("Dry run: save file left untouched.");
        } else {
            save.save()?;
        }
    }

    Ok(())
}

/// Runs a plan file the way a full campaign sync does: campaign values
/// first, then both event decks, looted chests, per-character values
/// and scenario statuses.
fn apply_plan(
    save: &mut SaveData,
    graph: Option<&Graph>,
    plan: &Plan,
) -> Result<(), EditError> {
    let campaign = CampaignUpdate {
        gold_donated: plan.gold_donations,
        prosperity: plan.prosperity,
        reputation: plan.reputation,
    };
    if !campaign.is_empty() {
        let (before, after) = save.update_campaign(campaign)?;
        print_campaign_change(before, after);
    }

    if let Some(events) = &plan.city_events {
        let report = save.replace_events(EventDeckKind::City, events)?;
        print_events(EventDeckKind::City, &report.current);
    }
    if let Some(events) = &plan.road_events {
        let report = save.replace_events(EventDeckKind::Road, events)?;
        print_events(EventDeckKind::Road, &report.current);
    }

    if let Some(chests) = &plan.looted_chests {
        let graph = require_graph(graph)?;
        let report = save.loot_chests(graph, chests)?;
        println!("Looted chests: {}", join(&report.looted));
    }

    for character in &plan.characters {
        let update = CharacterUpdate {
            gold: character.gold,
            experience: character.experience,
            perk_points: character.perk_points,
            perk_checks: character.perk_checks,
        };
        if update.is_empty() {
            continue;
        }
        let (before, after) = save.update_character(&character.name, update)?;
        print_character_change(&character.name, before, after);
    }

    for scenario in &plan.scenarios {
        let target = parse_status(&scenario.status)?;
        print_status_change(scenario.id, save.set_scenario_status(scenario.id, target)?);
    }

    Ok(())
}

fn command_mutates(command: &Command) -> bool {
    match command {
        Command::Events { set, .. } => set.is_some(),
        Command::Character {
            gold,
            experience,
            perk_points,
            perk_checks,
            ..
        } => {
            gold.is_some() || experience.is_some() || perk_points.is_some() || perk_checks.is_some()
        }
        Command::Campaign {
            donated,
            prosperity,
            reputation,
        } => donated.is_some() || prosperity.is_some() || reputation.is_some(),
        Command::Scenario { status, .. } => status.is_some(),
        Command::Scenarios { .. } => false,
        Command::Quests {
            prioritise, remove, ..
        } => prioritise.is_some() || remove.is_some(),
        Command::Chests { loot } => loot.is_some(),
        Command::Apply { .. } => true,
    }
}

fn parse_deck_kind(kind: &str) -> Result<EventDeckKind, EditError> {
    match kind {
        "city" => Ok(EventDeckKind::City),
        "road" => Ok(EventDeckKind::Road),
        other => Err(EditError::Config(format!(
            "unknown event deck kind '{other}', expected city or road"
        ))),
    }
}

fn parse_status(name: &str) -> Result<ScenarioStatus, EditError> {
    ScenarioStatus::from_name(name)
        .ok_or_else(|| EditError::Config(format!("unknown scenario status '{name}'")))
}

fn require_graph(graph: Option<&Graph>) -> Result<&Graph, EditError> {
    graph.ok_or_else(|| {
        EditError::Config("this command needs the decoded graph; pass --graph <json>".to_string())
    })
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn print_events(kind: EventDeckKind, events: &[String]) {
    let mut sorted = events.to_vec();
    sorted.sort();
    println!("{} {} events:", events.len(), kind.label());
    println!("Current order: {}", join(events));
    println!("Sorted: {}", join(&sorted));
}

fn print_character(name: &str, values: CharacterValues) {
    println!(
        "{name}: level {} with {} experience, {} gold, {} perk points, {} perk checks.",
        values.level, values.experience, values.gold, values.perk_points, values.perk_checks
    );
}

fn print_character_change(name: &str, before: CharacterValues, after: CharacterValues) {
    if before.gold != after.gold {
        println!("{name}'s gold was updated from {} to {}.", before.gold, after.gold);
    }
    if before.experience != after.experience {
        println!(
            "{name}'s experience was updated from {} (level {}) to {}.",
            before.experience, before.level, after.experience
        );
    }
    if before.perk_points != after.perk_points {
        println!(
            "{name}'s available perk points were updated from {} to {}.",
            before.perk_points, after.perk_points
        );
    }
    if before.perk_checks != after.perk_checks {
        println!(
            "{name}'s perk checks were updated from {} to {}.",
            before.perk_checks, after.perk_checks
        );
    }
}

fn print_campaign(values: CampaignValues) {
    println!("Gold donated to the tree so far: {}", values.gold_donated);
    println!("Current prosperity: {}", values.prosperity);
    println!("Current reputation: {}", values.reputation);
}

fn print_campaign_change(before: CampaignValues, after: CampaignValues) {
    if before.gold_donated != after.gold_donated {
        println!(
            "The total gold donated to the tree was updated from {} to {}.",
            before.gold_donated, after.gold_donated
        );
    }
    if before.prosperity != after.prosperity {
        println!(
            "Prosperity was updated from {} to {}.",
            before.prosperity, after.prosperity
        );
    }
    if before.reputation != after.reputation {
        println!(
            "Reputation was updated from {} to {}.",
            before.reputation, after.reputation
        );
    }
}

fn print_status_change(number: u32, change: StatusChange) {
    match change {
        StatusChange::Applied { from, to } => {
            println!(
                "Scenario {number} was changed from {} to {}.",
                from.name(),
                to.name()
            );
        }
        StatusChange::Rejected { current } => {
            println!("Scenario {number} is currently {}.", current.name());
            println!("I can't change the state of such a scenario.");
        }
    }
}

fn print_quests(heading: &str, order: &[String]) {
    println!("{heading}:");
    for quest in order {
        println!("    {quest}");
    }
}

fn print_overview(save: &SaveData, verbose: bool) {
    let overview = save.scenario_overview();
    println!("Scenario Overview:");
    for status in ScenarioStatus::all() {
        let numbers: Vec<u32> = overview
            .iter()
            .filter(|(_, s)| *s == status)
            .map(|(n, _)| *n)
            .collect();
        if (!numbers.is_empty() && status != ScenarioStatus::Locked) || verbose {
            println!("    {}: {}", status.name(), join(&numbers));
        }
    }
}
