use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use realize_cli::cli::{
    AnnouncementCommand, Cli, Command, EventCommand, EventFields, MemberCommand, TaskCommand,
    TimetableCommand, collect_overrides, raw_overrides_from_args,
};
use realize_cli::render::{self, GeneratedText};
use realize_core::assistant::{Assistant, GeminiClient, text_or_fallback};
use realize_core::clock::{local_offset, now_local};
use realize_core::config::{
    Config, Credentials, Palette, load_config_with_fallback, merge_overrides, palette_for_theme,
};
use realize_core::dashboard::Dashboard;
use realize_core::error::AppError;
use realize_core::identity::CredentialIdentity;
use realize_core::model::{AnnouncementKind, AuthenticatedUser, MemberStatus, Task};
use realize_core::panel::Panel;
use realize_core::rotation::Slideshow;
use realize_core::session::Session;
use realize_core::settings_api::{
    AnnouncementDraft, EventDraft, MemberUpdate, SlotField, parse_date, parse_time,
};
use realize_core::storage::{FileBlobStore, SharedStore, store_dir};
use std::io::{self, BufRead, IsTerminal};
use std::sync::Arc;
use time::UtcOffset;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

struct App {
    config: Config,
    credentials: Credentials,
    store: SharedStore,
    session: Session,
}

impl App {
    fn open(config: Config, credentials: Credentials) -> Result<Self, AppError> {
        let dir = store_dir()?;
        tracing::debug!(dir = %dir.display(), "opening store");
        let store: SharedStore = Arc::new(FileBlobStore::new(dir));
        let session = Session::load(store.clone());
        Ok(Self {
            config,
            credentials,
            store,
            session,
        })
    }

    fn identity(&self, credential: Option<String>) -> CredentialIdentity {
        let provider = CredentialIdentity::new(self.credentials.google_client_id.clone());
        match credential {
            Some(token) => provider.with_credential(token),
            None => provider,
        }
    }

    fn assistant(&self, config: &Config) -> Assistant<GeminiClient> {
        let client = self.credentials.gemini_api_key.as_ref().map(|key| {
            GeminiClient::new(
                key.clone(),
                self.credentials.gemini_base_url.clone(),
                config.model(),
            )
        });
        if client.is_none() {
            tracing::debug!("no Gemini API key configured");
        }
        Assistant::new(client)
    }

    fn signed_in(&self) -> Result<AuthenticatedUser, AppError> {
        self.session.require_user().cloned()
    }

    fn dashboard(&self) -> Result<Dashboard, AppError> {
        Dashboard::load(self.store.clone(), now_local())
    }
}

fn init_tracing(level: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn emit(json: serde_json::Result<String>) -> Result<(), AppError> {
    let json = json.map_err(|err| AppError::invalid_data(err.to_string()))?;
    println!("{json}");
    Ok(())
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn slot_index(slot: usize) -> Result<usize, AppError> {
    slot.checked_sub(1)
        .ok_or_else(|| AppError::invalid_input("slot numbers start at 1"))
}

fn parse_kind(raw: &str) -> Result<AnnouncementKind, AppError> {
    raw.parse().map_err(AppError::invalid_input)
}

/// Applies the given form fields over `draft`.
fn apply_event_fields(draft: &mut EventDraft, fields: &EventFields) -> Result<(), AppError> {
    if let Some(raw) = fields.start_date.as_deref() {
        draft.start_date = parse_date(raw)?;
    }
    if let Some(raw) = fields.start_time.as_deref() {
        draft.start_time = Some(parse_time(raw)?);
    }
    if let Some(raw) = fields.end_date.as_deref() {
        draft.end_date = Some(parse_date(raw)?);
    }
    if let Some(raw) = fields.end_time.as_deref() {
        draft.end_time = Some(parse_time(raw)?);
    }
    if let Some(all_day) = fields.all_day {
        draft.is_all_day = all_day;
    }
    Ok(())
}

fn new_event_draft(title: String, fields: &EventFields) -> Result<EventDraft, AppError> {
    let start_date = fields
        .start_date
        .as_deref()
        .ok_or_else(|| AppError::invalid_input("start date is required"))
        .and_then(parse_date)?;
    let mut draft = EventDraft {
        title,
        start_date,
        start_time: None,
        end_date: None,
        end_time: None,
        is_all_day: false,
    };
    apply_event_fields(&mut draft, fields)?;
    Ok(draft)
}

fn print_slide(
    panel: Panel,
    index: usize,
    user: &AuthenticatedUser,
    dashboard: &Dashboard,
    generated: &GeneratedText,
    palette: &Palette,
    json: bool,
) -> Result<(), AppError> {
    let now = now_local();
    let body = render::render_panel(panel, dashboard, generated, now, palette);
    if json {
        return emit(serde_json::to_string(&serde_json::json!({
            "index": index,
            "panel": panel.slug(),
            "title": panel.title(),
            "text": body,
        })));
    }

    if io::stdout().is_terminal() {
        print!("\x1b[2J\x1b[H");
    }
    println!("{}", render::render_header(user, now, palette));
    println!();
    println!("{body}");
    println!();
    println!("{}", render::render_position(index, Panel::ALL.len(), palette));
    Ok(())
}

async fn generate_panel_text(
    assistant: &Assistant<GeminiClient>,
    dashboard: &Dashboard,
    panels: &[Panel],
) -> GeneratedText {
    let mut generated = GeneratedText::default();
    for panel in panels.iter().filter(|panel| panel.needs_assistant()) {
        match panel {
            Panel::Briefing => {
                let briefing = assistant.daily_briefing(dashboard, now_local()).await;
                generated.briefing = Some(text_or_fallback(briefing));
            }
            Panel::Quote => generated.quote = Some(text_or_fallback(assistant.quote().await)),
            _ => {}
        }
    }
    generated
}

async fn run_show(
    app: &App,
    config: &Config,
    palette: &Palette,
    limit: Option<usize>,
    json: bool,
) -> Result<(), AppError> {
    let user = app.signed_in()?;
    let dashboard = app.dashboard()?;
    let assistant = app.assistant(config);
    let generated = generate_panel_text(&assistant, &dashboard, &Panel::ALL).await;

    let mut slideshow = Slideshow::start(Panel::ALL.to_vec(), config.slide_interval())?;
    let mut changes = slideshow.subscribe();
    tracing::info!(
        panels = Panel::ALL.len(),
        interval_secs = config.slide_interval().as_secs(),
        "slideshow started"
    );

    let mut shown = 0usize;
    loop {
        if limit.is_some_and(|limit| shown >= limit) {
            break;
        }
        if let Some((panel, index)) = slideshow.active() {
            print_slide(*panel, index, &user, &dashboard, &generated, palette, json)?;
        }
        shown += 1;

        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    slideshow.stop();
    tracing::info!(shown, "slideshow stopped");
    Ok(())
}

fn run_member(
    dashboard: &mut Dashboard,
    action: MemberCommand,
    json: bool,
) -> Result<(), AppError> {
    match action {
        MemberCommand::List => {
            if json {
                emit(serde_json::to_string(dashboard.members()))?;
            } else {
                println!("{}", render::members_table(dashboard));
            }
        }
        MemberCommand::Add { name } => {
            let member = dashboard.add_member(&name)?;
            if json {
                emit(serde_json::to_string(&member))?;
            } else {
                println!("Added member: {}", render::member_line(&member));
            }
        }
        MemberCommand::Edit { id, name, status } => {
            let status = status
                .map(|raw| raw.parse::<MemberStatus>().map_err(AppError::invalid_input))
                .transpose()?;
            let member = dashboard.update_member(&id, MemberUpdate { name, status })?;
            if json {
                emit(serde_json::to_string(&member))?;
            } else {
                println!("Updated member: {}", render::member_line(&member));
            }
        }
        MemberCommand::Delete { id } => {
            let member = dashboard.delete_member(&id)?;
            if json {
                emit(serde_json::to_string(&member))?;
            } else {
                println!("Deleted member: {}", render::member_line(&member));
            }
        }
    }
    Ok(())
}

fn run_task(dashboard: &mut Dashboard, action: TaskCommand, json: bool) -> Result<(), AppError> {
    match action {
        TaskCommand::List { member } => {
            let tasks: Vec<&Task> = match member.as_deref() {
                Some(member_id) => dashboard.tasks_for(member_id),
                None => dashboard.tasks().iter().collect(),
            };
            if json {
                emit(serde_json::to_string(&tasks))?;
            } else {
                println!("{}", render::tasks_table(dashboard, &tasks));
            }
        }
        TaskCommand::Add { text, member } => {
            let task = dashboard.add_task(&text, &member)?;
            if json {
                emit(serde_json::to_string(&task))?;
            } else {
                println!("Added task: {} ({})", task.text, task.id);
            }
        }
        TaskCommand::Toggle { id } => {
            let task = dashboard.toggle_task(&id)?;
            if json {
                emit(serde_json::to_string(&task))?;
            } else {
                let state = if task.completed { "done" } else { "open" };
                println!("Marked task {state}: {} ({})", task.text, task.id);
            }
        }
        TaskCommand::Delete { id } => {
            let task = dashboard.delete_task(&id)?;
            if json {
                emit(serde_json::to_string(&task))?;
            } else {
                println!("Deleted task: {} ({})", task.text, task.id);
            }
        }
    }
    Ok(())
}

fn run_timetable(
    dashboard: &mut Dashboard,
    action: TimetableCommand,
    json: bool,
) -> Result<(), AppError> {
    match action {
        TimetableCommand::Show { member: Some(member_id) } => {
            let entry = dashboard
                .timetable_for(&member_id)
                .ok_or_else(|| AppError::not_found("timetable not found"))?;
            if json {
                emit(serde_json::to_string(entry))?;
            } else {
                println!("{}", dashboard.member_name(&entry.member_id));
                println!("{}", render::slots_table(&entry.timetable));
            }
        }
        TimetableCommand::Show { member: None } => {
            if json {
                emit(serde_json::to_string(dashboard.timetables()))?;
            } else {
                for entry in dashboard.timetables() {
                    println!("{}", dashboard.member_name(&entry.member_id));
                    println!("{}", render::slots_table(&entry.timetable));
                }
            }
        }
        TimetableCommand::AddSlot { member } => {
            let slot = dashboard.add_timetable_slot(&member)?;
            if json {
                emit(serde_json::to_string(&slot))?;
            } else {
                println!("Added slot {} for {}", slot.period, dashboard.member_name(&member));
            }
        }
        TimetableCommand::Set {
            member,
            slot,
            field,
            value,
        } => {
            let field: SlotField = field.parse().map_err(AppError::invalid_input)?;
            let updated = dashboard.set_timetable_slot(&member, slot_index(slot)?, field, &value)?;
            if json {
                emit(serde_json::to_string(&updated))?;
            } else {
                println!("Updated slot {slot} {field}: {value}");
            }
        }
        TimetableCommand::DeleteSlot { member, slot } => {
            let removed = dashboard.delete_timetable_slot(&member, slot_index(slot)?)?;
            if json {
                emit(serde_json::to_string(&removed))?;
            } else {
                println!("Deleted slot {slot} ({} {})", removed.period, removed.subject);
            }
        }
    }
    Ok(())
}

fn run_announcement(
    dashboard: &mut Dashboard,
    action: AnnouncementCommand,
    json: bool,
) -> Result<(), AppError> {
    let announcement = match action {
        AnnouncementCommand::List => {
            if json {
                emit(serde_json::to_string(dashboard.announcements()))?;
            } else {
                println!("{}", render::announcements_table(dashboard.announcements()));
            }
            return Ok(());
        }
        AnnouncementCommand::Add {
            title,
            content,
            kind,
        } => {
            let draft = AnnouncementDraft {
                title,
                content,
                kind: parse_kind(&kind)?,
            };
            let added = dashboard.add_announcement(draft)?;
            if !json {
                println!("Added announcement: {} ({})", added.title, added.id);
            }
            added
        }
        AnnouncementCommand::Edit {
            id,
            title,
            content,
            kind,
        } => {
            let existing = dashboard
                .announcements()
                .iter()
                .find(|item| item.id == id)
                .ok_or_else(|| AppError::not_found("announcement not found"))?;
            let mut draft = AnnouncementDraft::from(existing);
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(content) = content {
                draft.content = content;
            }
            if let Some(kind) = kind.as_deref() {
                draft.kind = parse_kind(kind)?;
            }
            let updated = dashboard.update_announcement(&id, draft)?;
            if !json {
                println!("Updated announcement: {} ({})", updated.title, updated.id);
            }
            updated
        }
        AnnouncementCommand::Delete { id } => {
            let removed = dashboard.delete_announcement(&id)?;
            if !json {
                println!("Deleted announcement: {} ({})", removed.title, removed.id);
            }
            removed
        }
    };

    if json {
        emit(serde_json::to_string(&announcement))?;
    }
    Ok(())
}

fn run_event(
    dashboard: &mut Dashboard,
    action: EventCommand,
    offset: UtcOffset,
    json: bool,
) -> Result<(), AppError> {
    let event = match action {
        EventCommand::List => {
            let events = dashboard.events_by_start();
            if json {
                emit(serde_json::to_string(&events))?;
            } else {
                println!("{}", render::events_table(&events, offset));
            }
            return Ok(());
        }
        EventCommand::Add { title, fields } => {
            let draft = new_event_draft(title, &fields)?;
            let added = dashboard.add_event(&draft, offset)?;
            if !json {
                println!("Added event: {} ({})", added.title, added.id);
            }
            added
        }
        EventCommand::Edit { id, title, fields } => {
            let existing = dashboard
                .schedule_events()
                .iter()
                .find(|event| event.id == id)
                .ok_or_else(|| AppError::not_found("event not found"))?;
            let mut draft = EventDraft::from_event(existing, offset);
            if let Some(title) = title {
                draft.title = title;
            }
            apply_event_fields(&mut draft, &fields)?;
            let updated = dashboard.update_event(&id, &draft, offset)?;
            if !json {
                println!("Updated event: {} ({})", updated.title, updated.id);
            }
            updated
        }
        EventCommand::Delete { id } => {
            let removed = dashboard.delete_event(&id)?;
            if !json {
                println!("Deleted event: {} ({})", removed.title, removed.id);
            }
            removed
        }
    };

    if json {
        emit(serde_json::to_string(&event))?;
    }
    Ok(())
}

fn print_user(user: &AuthenticatedUser, json: bool) -> Result<(), AppError> {
    if json {
        emit(serde_json::to_string(user))
    } else {
        println!("{} <{}>", user.name, user.email);
        Ok(())
    }
}

fn print_generated(kind: &str, text: &str, json: bool) -> Result<(), AppError> {
    if json {
        let mut payload = serde_json::Map::new();
        payload.insert(kind.to_string(), serde_json::Value::from(text));
        emit(serde_json::to_string(&payload))
    } else {
        println!("{text}");
        Ok(())
    }
}

async fn run_command(app: &mut App, cli: Cli) -> Result<(), AppError> {
    let overrides = collect_overrides(&cli.config_override)?;
    let config = merge_overrides(&app.config, &overrides);
    let palette = palette_for_theme(config.theme.as_deref());
    let json = cli.json;

    match cli.command {
        Command::Login { credential } => {
            let provider = app.identity(credential);
            let user = app.session.sign_in(&provider).await?.clone();
            if json {
                print_user(&user, true)?;
            } else {
                println!("Signed in as {} <{}>", user.name, user.email);
            }
        }
        Command::Logout => {
            let provider = app.identity(None);
            app.session.sign_out(&provider)?;
            if json {
                emit(serde_json::to_string(&serde_json::json!({ "signed_in": false })))?;
            } else {
                println!("Signed out");
            }
        }
        Command::Whoami => print_user(&app.signed_in()?, json)?,
        Command::Show { limit } => run_show(app, &config, &palette, limit, json).await?,
        Command::Panel { name } => {
            let panel: Panel = name.parse().map_err(AppError::invalid_input)?;
            let user = app.signed_in()?;
            let dashboard = app.dashboard()?;
            let generated =
                generate_panel_text(&app.assistant(&config), &dashboard, &[panel]).await;
            let index = Panel::ALL
                .iter()
                .position(|candidate| *candidate == panel)
                .unwrap_or(0);
            print_slide(panel, index, &user, &dashboard, &generated, &palette, json)?;
        }
        Command::Quote => {
            app.signed_in()?;
            let quote = text_or_fallback(app.assistant(&config).quote().await);
            print_generated("quote", &quote, json)?;
        }
        Command::Briefing => {
            app.signed_in()?;
            let dashboard = app.dashboard()?;
            let briefing = app
                .assistant(&config)
                .daily_briefing(&dashboard, now_local())
                .await;
            print_generated("briefing", &text_or_fallback(briefing), json)?;
        }
        Command::Chat { question } => {
            app.signed_in()?;
            if question.trim().is_empty() {
                return Err(AppError::invalid_input("question is required"));
            }
            let dashboard = app.dashboard()?;
            let answer = app
                .assistant(&config)
                .chat(question.trim(), &dashboard, now_local())
                .await;
            print_generated("answer", &text_or_fallback(answer), json)?;
        }
        Command::Member { action } => {
            app.signed_in()?;
            run_member(&mut app.dashboard()?, action, json)?;
        }
        Command::Task { action } => {
            app.signed_in()?;
            run_task(&mut app.dashboard()?, action, json)?;
        }
        Command::Timetable { action } => {
            app.signed_in()?;
            run_timetable(&mut app.dashboard()?, action, json)?;
        }
        Command::Announcement { action } => {
            app.signed_in()?;
            run_announcement(&mut app.dashboard()?, action, json)?;
        }
        Command::Event { action } => {
            app.signed_in()?;
            run_event(&mut app.dashboard()?, action, local_offset(), json)?;
        }
    }

    Ok(())
}

async fn run_interactive(app: &mut App) -> Result<(), AppError> {
    let mut input = String::new();

    loop {
        input.clear();
        let bytes = io::stdin()
            .lock()
            .read_line(&mut input)
            .map_err(|err| AppError::io(err.to_string()))?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("realize".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(app, cli).await {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    let credentials = Credentials::from_env();
    let loaded = load_config_with_fallback();
    let startup_overrides = collect_overrides(&raw_overrides_from_args(&args)).unwrap_or_default();
    init_tracing(merge_overrides(&loaded.config, &startup_overrides).log_level());
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(error = %err, "ignoring unreadable config file");
    }

    let mut app = match App::open(loaded.config, credentials) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
    };

    if args.is_empty() {
        if let Err(err) = run_interactive(&mut app).await {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return;
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(&mut app, cli).await {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{slot_index, split_command_line};

    #[test]
    fn split_command_line_keeps_quoted_words_together() {
        let args = split_command_line(r#"task add "Grade \"final\" exams" --member 1"#).unwrap();

        assert_eq!(args, ["task", "add", "Grade \"final\" exams", "--member", "1"]);
    }

    #[test]
    fn split_command_line_rejects_open_quotes() {
        let err = split_command_line("member add \"伊藤").unwrap_err();
        assert_eq!(err.code(), "invalid_input");
    }

    #[test]
    fn slots_are_numbered_from_one() {
        assert_eq!(slot_index(1).unwrap(), 0);
        assert_eq!(slot_index(0).unwrap_err().code(), "invalid_input");
    }
}
