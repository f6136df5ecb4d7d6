#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;

use std::io;
use std::path;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use clap::builder::PossibleValuesParser;
use clap::value_parser;
use clap::Arg;
use clap::ArgAction;
use clap::ArgGroup;
use clap::ArgMatches;
use clap::Command;
use clap_complete::generate;
use clap_complete::Generator;
use clap_complete::Shell;
use strum::VariantNames;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Locale;

/// What the binary should do once configuration is loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunCommand {
    Chat {
        persona_id: String,
    },
    Personas,
    Feed {
        persona_id: Option<String>,
        pages: usize,
    },
    Activity {
        persona_id: String,
        activity_type: Option<String>,
        triggered_by: Option<String>,
        pages: usize,
    },
    Lora {
        persona_id: String,
        train: bool,
        watch: bool,
    },
    Post {
        post_id: String,
    },
    Schedules {
        persona_id: String,
        action: ScheduleAction,
    },
    Images {
        persona_id: String,
        action: ImageAction,
    },
}

/// Schedule changes run before the list is printed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScheduleAction {
    List,
    Pause(String),
    Resume(String),
    Delete(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageAction {
    List,
    Generate(String),
    SetProfile(String),
    Delete(String),
}

pub fn version() -> &'static str {
    return option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown");
}

pub fn log_dir() -> path::PathBuf {
    if let Ok(dir) = std::env::var("ALTEREGO_LOG_DIR") {
        return path::PathBuf::from(dir);
    }

    return dirs::cache_dir()
        .unwrap_or_else(|| return path::PathBuf::from("."))
        .join("alterego");
}

fn print_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

async fn create_config_file() -> Result<()> {
    let config_file_path_str = Config::default(ConfigKey::ConfigFile);
    let config_file_path = path::PathBuf::from(&config_file_path_str);
    if config_file_path.exists() {
        bail!(format!(
            "Config file already exists at {config_file_path_str}"
        ));
    }

    if let Some(parent) = config_file_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(config_file_path.clone()).await?;
    file.write_all(Config::serialize_default(build()).as_bytes())
        .await?;

    println!("Created default config file at {config_file_path_str}");
    return Ok(());
}

fn arg_persona(required: bool) -> Arg {
    return Arg::new("persona")
        .short('p')
        .long("persona")
        .help("Persona ID.")
        .num_args(1)
        .required(required);
}

fn arg_pages() -> Arg {
    return Arg::new("pages")
        .long("pages")
        .help("How many pages to fetch before stopping.")
        .num_args(1)
        .default_value("1")
        .value_parser(value_parser!(usize));
}

fn subcommand_chat() -> Command {
    return Command::new("chat")
        .about("Chat with a persona. Replies stream in as they are generated.")
        .arg(arg_persona(true));
}

fn subcommand_feed() -> Command {
    return Command::new("feed")
        .about("Browse the social feed. Pass a persona to see the posts of who they follow.")
        .arg(arg_persona(false))
        .arg(arg_pages());
}

fn subcommand_activity() -> Command {
    return Command::new("activity")
        .about("Show a persona's activity log.")
        .arg(arg_persona(true))
        .arg(
            Arg::new("type")
                .long("type")
                .help("Only show activity of this type, e.g. post, like, comment, follow, chat.")
                .num_args(1),
        )
        .arg(
            Arg::new("trigger")
                .long("trigger")
                .help("Only show activity triggered this way, e.g. manual, auto.")
                .num_args(1),
        )
        .arg(arg_pages());
}

fn subcommand_lora() -> Command {
    return Command::new("lora")
        .about("Show or start a persona's LoRA training.")
        .arg(arg_persona(true))
        .arg(
            Arg::new("train")
                .long("train")
                .help("Start training before reporting status.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("watch")
                .short('w')
                .long("watch")
                .help("Keep polling until training is ready or failed.")
                .action(ArgAction::SetTrue),
        );
}

fn subcommand_post() -> Command {
    return Command::new("post")
        .about("Show a post and its comment thread.")
        .arg(
            Arg::new("id")
                .long("id")
                .help("Post ID.")
                .num_args(1)
                .required(true),
        );
}

fn arg_id(name: &'static str, help: &'static str) -> Arg {
    return Arg::new(name).long(name).help(help).num_args(1);
}

fn subcommand_schedules() -> Command {
    return Command::new("schedules")
        .about("List a persona's activity schedules, optionally pausing, resuming or deleting one first.")
        .arg(arg_persona(true))
        .arg(arg_id("pause", "Schedule ID to pause."))
        .arg(arg_id("resume", "Schedule ID to resume."))
        .arg(arg_id("delete", "Schedule ID to delete."))
        .group(ArgGroup::new("action").args(["pause", "resume", "delete"]));
}

fn subcommand_images() -> Command {
    return Command::new("images")
        .about("List a persona's generated images, optionally generating, selecting or deleting one first.")
        .arg(arg_persona(true))
        .arg(arg_id("generate", "Prompt to generate a new image from."))
        .arg(arg_id("set-profile", "Image ID to use as the profile image."))
        .arg(arg_id("delete", "Image ID to delete."))
        .group(ArgGroup::new("action").args(["generate", "set-profile", "delete"]));
}

fn subcommand_completions() -> Command {
    return Command::new("completions")
        .about("Generates shell completions.")
        .arg(
            clap::Arg::new("shell")
                .short('s')
                .long("shell")
                .help("Which shell to generate completions for.")
                .action(ArgAction::Set)
                .value_parser(value_parser!(Shell))
                .required(true),
        );
}

fn subcommand_config() -> Command {
    return Command::new("config")
        .about("Configuration file options.")
        .subcommand(
            Command::new("create").about("Saves the default config file to the configuration file path. This command will fail if the file exists already.")
        )
        .subcommand(
            Command::new("default").about("Outputs the default configuration file to stdout.")
        )
        .subcommand(
            Command::new("path").about("Returns the default path for the configuration file.")
        );
}

fn subcommand_debug() -> Command {
    return Command::new("debug")
        .about("Debug helpers for Alter Ego")
        .hide(true)
        .subcommand(
            Command::new("log-path").about("Output path to debug log file generated when running Alter Ego with environment variable RUST_LOG=alterego")
        )
        .subcommand(
            Command::new("enum-config").about("List all config keys as strings.")
        );
}

fn arg_config(key: ConfigKey, help: String) -> Arg {
    return Arg::new(key.to_string())
        .long(key.to_string())
        .env(key.env_var())
        .num_args(1)
        .help(help)
        .global(true);
}

pub fn build() -> Command {
    let about = format!(
        "{}\n\nVersion: {}\nCommit: {}",
        env!("CARGO_PKG_DESCRIPTION"),
        env!("CARGO_PKG_VERSION"),
        version()
    );

    return Command::new("alterego")
        .about(about)
        .author(env!("CARGO_PKG_AUTHORS"))
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .subcommand(subcommand_chat())
        .subcommand(Command::new("personas").about("List your personas."))
        .subcommand(subcommand_feed())
        .subcommand(subcommand_activity())
        .subcommand(subcommand_lora())
        .subcommand(subcommand_post())
        .subcommand(subcommand_schedules())
        .subcommand(subcommand_images())
        .subcommand(subcommand_completions())
        .subcommand(subcommand_config())
        .subcommand(subcommand_debug())
        .arg(
            Arg::new(ConfigKey::ConfigFile.to_string())
                .short('c')
                .long(ConfigKey::ConfigFile.to_string())
                .env(ConfigKey::ConfigFile.env_var())
                .num_args(1)
                .help(format!("Path to configuration file [default: {}]", Config::default(ConfigKey::ConfigFile)))
                .global(true)
        )
        .arg(arg_config(
            ConfigKey::ApiUrl,
            format!("Alter Ego API URL. [default: {}]", Config::default(ConfigKey::ApiUrl)),
        ))
        .arg(arg_config(
            ConfigKey::WsUrl,
            "Chat streaming URL. Derived from the API URL when not set.".to_string(),
        ))
        .arg(arg_config(
            ConfigKey::Token,
            "API access token.".to_string(),
        ))
        .arg(
            arg_config(
                ConfigKey::Locale,
                "Language for labels and messages. Detected from LANG when not set.".to_string(),
            )
            .short('l')
            .value_parser(PossibleValuesParser::new(Locale::VARIANTS)),
        )
        .arg(arg_config(
            ConfigKey::PageLimit,
            format!("Items to request per page. [default: {}]", Config::default(ConfigKey::PageLimit)),
        ))
        .arg(arg_config(
            ConfigKey::ConnectTimeout,
            format!("Time to wait in milliseconds before giving up on opening a chat connection. [default: {}]", Config::default(ConfigKey::ConnectTimeout)),
        ))
        .arg(arg_config(
            ConfigKey::LoraPollInterval,
            format!("Milliseconds between LoRA status checks when watching training. [default: {}]", Config::default(ConfigKey::LoraPollInterval)),
        ));
}

fn persona_of(matches: &ArgMatches) -> Result<String> {
    return matches
        .get_one::<String>("persona")
        .map(|e| return e.to_string())
        .ok_or_else(|| return anyhow!("--persona is required"));
}

fn value_of(matches: &ArgMatches, name: &str) -> Option<String> {
    return matches
        .get_one::<String>(name)
        .map(|e| return e.to_string());
}

fn schedule_action_of(matches: &ArgMatches) -> ScheduleAction {
    if let Some(id) = value_of(matches, "pause") {
        return ScheduleAction::Pause(id);
    }
    if let Some(id) = value_of(matches, "resume") {
        return ScheduleAction::Resume(id);
    }
    if let Some(id) = value_of(matches, "delete") {
        return ScheduleAction::Delete(id);
    }

    return ScheduleAction::List;
}

fn image_action_of(matches: &ArgMatches) -> ImageAction {
    if let Some(prompt) = value_of(matches, "generate") {
        return ImageAction::Generate(prompt);
    }
    if let Some(id) = value_of(matches, "set-profile") {
        return ImageAction::SetProfile(id);
    }
    if let Some(id) = value_of(matches, "delete") {
        return ImageAction::Delete(id);
    }

    return ImageAction::List;
}

fn pages_of(matches: &ArgMatches) -> usize {
    return matches.get_one::<usize>("pages").copied().unwrap_or(1);
}

/// Turns a parsed subcommand into the command to run. `None` for anything
/// that finishes during parsing.
pub fn run_command(name: &str, matches: &ArgMatches) -> Result<Option<RunCommand>> {
    let cmd = match name {
        "chat" => RunCommand::Chat {
            persona_id: persona_of(matches)?,
        },
        "personas" => RunCommand::Personas,
        "feed" => RunCommand::Feed {
            persona_id: matches
                .get_one::<String>("persona")
                .map(|e| return e.to_string()),
            pages: pages_of(matches),
        },
        "activity" => RunCommand::Activity {
            persona_id: persona_of(matches)?,
            activity_type: matches
                .get_one::<String>("type")
                .map(|e| return e.to_string()),
            triggered_by: matches
                .get_one::<String>("trigger")
                .map(|e| return e.to_string()),
            pages: pages_of(matches),
        },
        "lora" => RunCommand::Lora {
            persona_id: persona_of(matches)?,
            train: matches.get_flag("train"),
            watch: matches.get_flag("watch"),
        },
        "post" => RunCommand::Post {
            post_id: value_of(matches, "id").ok_or_else(|| return anyhow!("--id is required"))?,
        },
        "schedules" => RunCommand::Schedules {
            persona_id: persona_of(matches)?,
            action: schedule_action_of(matches),
        },
        "images" => RunCommand::Images {
            persona_id: persona_of(matches)?,
            action: image_action_of(matches),
        },
        _ => return Ok(None),
    };

    return Ok(Some(cmd));
}

pub async fn parse() -> Result<Option<RunCommand>> {
    let matches = build().get_matches();

    match matches.subcommand() {
        Some(("debug", debug_matches)) => {
            match debug_matches.subcommand() {
                Some(("log-path", _)) => {
                    let log_path = log_dir().join("debug.log");
                    println!("{}", log_path.to_string_lossy());
                }
                Some(("enum-config", _)) => {
                    let res = ConfigKey::VARIANTS.join("\n");
                    println!("{}", res);
                }
                _ => {
                    subcommand_debug().print_long_help()?;
                }
            }

            return Ok(None);
        }
        Some(("completions", subcmd_matches)) => {
            if let Some(completions) = subcmd_matches.get_one::<Shell>("shell").copied() {
                let mut app = build();
                print_completions(completions, &mut app);
            }
            return Ok(None);
        }
        Some(("config", subcmd_matches)) => match subcmd_matches.subcommand() {
            Some(("create", _)) => {
                create_config_file().await?;
                return Ok(None);
            }
            Some(("default", _)) => {
                println!("{}", Config::serialize_default(build()));
                return Ok(None);
            }
            Some(("path", _)) => {
                println!("{}", Config::default(ConfigKey::ConfigFile));
                return Ok(None);
            }
            _ => {
                subcommand_config().print_long_help()?;
                return Ok(None);
            }
        },
        Some((name, subcmd_matches)) => {
            Config::load(build(), vec![&matches, subcmd_matches]).await?;
            return run_command(name, subcmd_matches);
        }
        None => {
            build().print_long_help()?;
            return Ok(None);
        }
    }
}
