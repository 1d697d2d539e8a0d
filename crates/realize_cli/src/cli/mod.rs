use clap::{Parser, Subcommand};
use realize_core::config::{ConfigOverrides, canonical_name};
use realize_core::error::AppError;

#[derive(Parser, Debug)]
#[command(name = "realize", author, version, about = "Staff-room dashboard", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play the dashboard slideshow until Ctrl-C
    ///
    /// Example: realize show
    /// Example: realize show --limit 7
    Show {
        /// Stop after rendering this many slides
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Render a single panel
    ///
    /// Example: realize panel schedule
    Panel {
        name: String,
    },
    /// Manage staff members
    Member {
        #[command(subcommand)]
        action: MemberCommand,
    },
    /// Manage to-do tasks
    Task {
        #[command(subcommand)]
        action: TaskCommand,
    },
    /// Manage timetables
    Timetable {
        #[command(subcommand)]
        action: TimetableCommand,
    },
    /// Manage announcements
    Announcement {
        #[command(subcommand)]
        action: AnnouncementCommand,
    },
    /// Manage schedule events
    Event {
        #[command(subcommand)]
        action: EventCommand,
    },
    /// Sign in with an identity token from the sign-in widget
    ///
    /// Example: realize login --credential eyJhbGciOi...
    Login {
        #[arg(long)]
        credential: Option<String>,
    },
    /// Sign out and forget the stored user
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Generate an inspirational quote
    Quote,
    /// Generate today's briefing
    Briefing,
    /// Ask the assistant about the dashboard data
    ///
    /// Example: realize chat "今日の会議は何時から?"
    Chat {
        question: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemberCommand {
    /// List members
    List,
    /// Add a member
    ///
    /// Example: realize member add "伊藤 翼"
    Add {
        name: String,
    },
    /// Change a member's name or status
    ///
    /// Example: realize member edit 2 --status "On Break"
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete a member with their tasks and timetable
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// List tasks
    List {
        /// Only tasks of this member
        #[arg(long)]
        member: Option<String>,
    },
    /// Add a task for a member
    ///
    /// Example: realize task add "Grade quizzes" --member 1
    Add {
        text: String,
        #[arg(long)]
        member: String,
    },
    /// Toggle a task's completion
    Toggle {
        id: String,
    },
    /// Delete a task
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum TimetableCommand {
    /// Show one member's timetable, or all of them
    Show {
        member: Option<String>,
    },
    /// Append an empty slot
    AddSlot {
        member: String,
    },
    /// Set one field of a slot (slots are numbered from 1)
    ///
    /// Example: realize timetable set 1 2 subject "Chemistry"
    Set {
        member: String,
        slot: usize,
        field: String,
        value: String,
    },
    /// Delete a slot (slots are numbered from 1)
    DeleteSlot {
        member: String,
        slot: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum AnnouncementCommand {
    /// List announcements
    List,
    /// Add an announcement
    ///
    /// Example: realize announcement add "避難訓練" --content "10:00" --type important
    Add {
        title: String,
        #[arg(long, default_value = "")]
        content: String,
        #[arg(long = "type", default_value = "normal")]
        kind: String,
    },
    /// Edit an announcement
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Delete an announcement
    Delete {
        id: String,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct EventFields {
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<String>,
    /// Start time (HH:MM)
    #[arg(long)]
    pub start_time: Option<String>,
    /// End date (YYYY-MM-DD), defaults to the start date
    #[arg(long)]
    pub end_date: Option<String>,
    /// End time (HH:MM), defaults to the start time
    #[arg(long)]
    pub end_time: Option<String>,
    /// All-day event
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub all_day: Option<bool>,
}

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// List events ordered by start
    List,
    /// Add an event
    ///
    /// Example: realize event add "Open Campus" --start-date 2025-06-20 --start-time 13:00
    Add {
        title: String,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Edit an event; omitted fields keep their values
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: EventFields,
    },
    /// Delete an event
    Delete {
        id: String,
    },
}

/// Flag name used to identify config override arguments by the runtime.
pub const CONFIG_OVERRIDE_FLAG: &str = "--config-override";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    SlideInterval,
    Model,
    LogLevel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let (key_raw, value_raw) = raw
        .trim()
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field = canonical_name(key_raw);
    if field.is_empty() {
        return Err("override key cannot be empty".to_string());
    }

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "slide_interval" | "slide_interval_seconds" => ConfigOverrideTarget::SlideInterval,
        "model" => ConfigOverrideTarget::Model,
        "log_level" => ConfigOverrideTarget::LogLevel,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

pub fn collect_overrides(raw: &[String]) -> Result<ConfigOverrides, AppError> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry).map_err(AppError::invalid_input)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::SlideInterval => {
                let seconds = parsed
                    .value
                    .parse::<u64>()
                    .ok()
                    .filter(|seconds| *seconds > 0)
                    .ok_or_else(|| {
                        AppError::invalid_input("slide_interval must be a positive number of seconds")
                    })?;
                overrides.slide_interval_seconds = Some(seconds);
            }
            ConfigOverrideTarget::Model => overrides.model = Some(parsed.value),
            ConfigOverrideTarget::LogLevel => overrides.log_level = Some(parsed.value),
        }
    }
    Ok(overrides)
}

/// Config overrides given before the subcommand, read without a full parse
/// so logging can be set up first.
pub fn raw_overrides_from_args(args: &[String]) -> Vec<String> {
    let mut found = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == CONFIG_OVERRIDE_FLAG {
            if let Some(value) = iter.next() {
                found.push(value.clone());
            }
        } else if let Some(value) = arg
            .strip_prefix(CONFIG_OVERRIDE_FLAG)
            .and_then(|rest| rest.strip_prefix('='))
        {
            found.push(value.to_string());
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, EventCommand, collect_overrides,
        parse_config_override, raw_overrides_from_args,
    };
    use clap::Parser;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Slide-Interval = 30 ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::SlideInterval);
        assert_eq!(parsed.value, "30");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("aliases.ls=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("theme").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn collect_overrides_validates_the_interval() {
        let overrides =
            collect_overrides(&["theme=noir".to_string(), "slide_interval=5".to_string()]).unwrap();
        assert_eq!(overrides.theme.as_deref(), Some("noir"));
        assert_eq!(overrides.slide_interval_seconds, Some(5));

        let err = collect_overrides(&["slide_interval=0".to_string()]).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn raw_overrides_are_found_in_both_spellings() {
        let args: Vec<String> = [
            "show",
            "--config-override",
            "theme=noir",
            "--config-override=log_level=debug",
        ]
        .iter()
        .map(|arg| arg.to_string())
        .collect();

        assert_eq!(
            raw_overrides_from_args(&args),
            ["theme=noir", "log_level=debug"]
        );
    }

    #[test]
    fn event_edit_keeps_fields_optional() {
        let cli = Cli::try_parse_from(["realize", "event", "edit", "e1", "--all-day", "false"])
            .unwrap();

        match cli.command {
            Command::Event {
                action: EventCommand::Edit { id, title, fields },
            } => {
                assert_eq!(id, "e1");
                assert!(title.is_none());
                assert_eq!(fields.all_day, Some(false));
                assert!(fields.start_date.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
