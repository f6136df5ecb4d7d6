#[cfg(test)]
#[path = "ui_test.rs"]
mod tests;

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use chrono::DateTime;
use chrono::Utc;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::signal;
use yansi::Paint;

use super::cli::ImageAction;
use super::cli::RunCommand;
use super::cli::ScheduleAction;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::format_relative;
use crate::domain::models::ActivityLog;
use crate::domain::models::Comment;
use crate::domain::models::LoraStatusResponse;
use crate::domain::models::LoraTrainRequest;
use crate::domain::models::PageSource;
use crate::domain::models::Persona;
use crate::domain::models::Post;
use crate::domain::models::PersonaImage;
use crate::domain::models::Schedule;
use crate::domain::models::ScheduleUpdate;
use crate::domain::models::TranslationKey;
use crate::domain::services::LocaleStore;
use crate::domain::services::LoraPoller;
use crate::domain::services::Paginator;
use crate::domain::services::SessionUpdate;
use crate::domain::services::ThreadSession;
use crate::infrastructure::api::ActivitySource;
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::api::CommentsSource;
use crate::infrastructure::api::FeedSource;
use crate::infrastructure::transport::WebSocketConnector;

enum ChatExit {
    Quit,
    Lost,
}

/// Tracks how much of the streaming reply has reached the terminal so each
/// update prints only what is new.
#[derive(Default)]
struct ReplyPrinter {
    printed: usize,
}

impl ReplyPrinter {
    fn delta<'a>(&mut self, content: &'a str) -> &'a str {
        let delta = content.get(self.printed..).unwrap_or_default();
        self.printed = content.len();
        return delta;
    }

    fn reset(&mut self) {
        self.printed = 0;
    }
}

pub fn format_persona(persona: &Persona) -> String {
    let mut res = format!("- {} (ID: {})", persona.name, persona.id);
    if let Some(status) = persona.lora_status {
        res = format!("{res}, LoRA: {status}");
    }
    res = format!("{res}\n  {} / {}", persona.personality, persona.speaking_style);

    return res;
}

pub fn format_post(post: &Post, locale: &LocaleStore, now: DateTime<Utc>) -> String {
    let mut lines = vec![format!(
        "{} · {}",
        post.persona.name,
        format_relative(&post.created_at, now)
    )];

    if let Some(content) = &post.content {
        for line in content.lines() {
            lines.push(format!("  {line}"));
        }
    }
    if let Some(image_url) = &post.image_url {
        lines.push(format!("  [{image_url}]"));
    }

    lines.push(format!(
        "  {} {} · {} {}",
        post.like_count,
        locale.t(TranslationKey::SnsLikes),
        post.comment_count,
        locale.t(TranslationKey::SnsComments)
    ));

    return lines.join("\n");
}

/// Replies are indented one step per level below the post.
pub fn format_comment(comment: &Comment, depth: usize, now: DateTime<Utc>) -> String {
    let indent = "  ".repeat(depth + 1);
    let mut lines = vec![format!(
        "{indent}↳ {} · {}",
        comment.persona.name,
        format_relative(&comment.created_at, now)
    )];
    for line in comment.content.lines() {
        lines.push(format!("{indent}  {line}"));
    }

    return lines.join("\n");
}

pub fn format_schedule(schedule: &Schedule, locale: &LocaleStore) -> String {
    let state = if schedule.is_active {
        locale.t(TranslationKey::ScheduleActive)
    } else {
        locale.t(TranslationKey::ScheduleInactive)
    };
    let mut res = format!(
        "- {} · {} {} [{state}] (ID: {})",
        schedule.activity_type, schedule.schedule_type, schedule.schedule_value, schedule.id
    );
    if let Some(prompt) = &schedule.activity_prompt {
        res = format!("{res}\n  {prompt}");
    }

    return res;
}

pub fn format_image(image: &PersonaImage, locale: &LocaleStore) -> String {
    let mut res = format!("- {}", image.id);
    if image.is_profile {
        res = format!("{res} ({})", locale.t(TranslationKey::ImageProfile));
    }

    return format!("{res}\n  {}\n  {}", image.prompt, image.url);
}

pub fn format_activity(log: &ActivityLog, now: DateTime<Utc>) -> String {
    let mut res = format!(
        "{} {} · {} ({})",
        log.icon(),
        log.activity_type,
        format_relative(&log.created_at, now),
        log.triggered_by
    );
    if let Some(summary) = log.summary() {
        res = format!("{res}\n  {summary}");
    }

    return res;
}

pub fn format_lora_status(status: &LoraStatusResponse, locale: &LocaleStore) -> String {
    let mut res = format!("{}: {}", locale.t(TranslationKey::LoraStatus), status.lora_status);
    if let Some(trigger_word) = &status.lora_trigger_word {
        res = format!("{res} (trigger: {trigger_word})");
    }

    return res;
}

async fn chat_loop(
    session: &ThreadSession<WebSocketConnector>,
    locale: &LocaleStore,
) -> Result<ChatExit> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printer = ReplyPrinter::default();

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => return Ok(ChatExit::Quit),
            update = session.next_update() => match update {
                None => return Ok(ChatExit::Quit),
                Some(SessionUpdate::MessagesChanged) => {
                    if let Some(last) = session.messages().last() {
                        if last.is_assistant() {
                            print!("{}", printer.delta(&last.content));
                            std::io::stdout().flush()?;
                        }
                    }
                }
                Some(SessionUpdate::TurnCompleted) => {
                    println!();
                    printer.reset();
                }
                Some(SessionUpdate::TurnFailed(message)) => {
                    println!();
                    eprintln!(
                        "{}",
                        Paint::red(format!("{}: {message}", locale.t(TranslationKey::ChatTurnFailed)))
                    );
                    printer.reset();
                }
                Some(SessionUpdate::ConnectionLost) => {
                    println!();
                    eprintln!("{}", Paint::yellow(locale.t(TranslationKey::ChatConnectionLost)));
                    return Ok(ChatExit::Lost);
                }
            },
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => return Ok(ChatExit::Quit),
                };
                let text = line.trim();
                if text == "/quit" {
                    return Ok(ChatExit::Quit);
                }
                if text.is_empty() {
                    continue;
                }
                if !session.send(text) {
                    eprintln!("{}", Paint::yellow(locale.t(TranslationKey::ChatStreaming)));
                }
            }
        }
    }
}

async fn chat(client: Arc<ApiClient>, locale: &LocaleStore, persona_id: &str) -> Result<()> {
    loop {
        let session = ThreadSession::new(client.clone(), WebSocketConnector::default());
        println!("{}", Paint::new(locale.t(TranslationKey::ChatConnecting)).dimmed());

        let opened = tokio::select! {
            res = session.open(persona_id) => Some(res),
            _ = signal::ctrl_c() => None,
        };
        let res = match opened {
            Some(Ok(())) => {
                println!(
                    "{} {}",
                    Paint::green(locale.t(TranslationKey::ChatConnected)),
                    Paint::new(format!("({})", locale.t(TranslationKey::ChatPlaceholder))).dimmed()
                );
                chat_loop(&session, locale).await
            }
            Some(Err(err)) => Err(err.into()),
            None => Ok(ChatExit::Quit),
        };
        session.close();

        match res? {
            ChatExit::Quit => return Ok(()),
            ChatExit::Lost => continue,
        }
    }
}

async fn personas(client: Arc<ApiClient>, locale: &LocaleStore) -> Result<()> {
    println!("{}", Paint::new(locale.t(TranslationKey::PersonaMyPersonas)).bold());
    let personas = client.list_personas().await?;
    if personas.is_empty() {
        println!("{}", locale.t(TranslationKey::PersonaEmpty));
        return Ok(());
    }

    let res = personas
        .iter()
        .map(|persona| return format_persona(persona))
        .collect::<Vec<String>>()
        .join("\n");
    println!("{res}");

    return Ok(());
}

/// Fetches up to `pages` pages, stopping early once the source runs dry.
async fn collect_pages<T: Send>(source: &dyn PageSource<T>, pages: usize) -> Result<Vec<T>> {
    let mut paginator = Paginator::new();
    paginator.refresh(source).await?;
    for _ in 1..pages {
        if !paginator.load_more(source).await? {
            break;
        }
    }

    return Ok(paginator.into_items());
}

fn page_limit() -> u32 {
    return Config::get(ConfigKey::PageLimit)
        .parse::<u32>()
        .unwrap_or(20);
}

async fn feed(
    client: Arc<ApiClient>,
    locale: &LocaleStore,
    persona_id: Option<String>,
    pages: usize,
) -> Result<()> {
    let source = match &persona_id {
        Some(persona_id) => FeedSource::following(client, persona_id, page_limit()),
        None => FeedSource::global(client, page_limit()),
    };

    println!("{}", Paint::new(locale.t(TranslationKey::SnsFeed)).bold());
    let posts = collect_pages(&source, pages).await?;
    if posts.is_empty() {
        println!("{}", locale.t(TranslationKey::SnsEmpty));
        return Ok(());
    }

    let now = Utc::now();
    let res = posts
        .iter()
        .map(|post| return format_post(post, locale, now))
        .collect::<Vec<String>>()
        .join("\n\n");
    println!("{res}");

    return Ok(());
}

async fn activity(
    client: Arc<ApiClient>,
    locale: &LocaleStore,
    persona_id: &str,
    activity_type: Option<String>,
    triggered_by: Option<String>,
    pages: usize,
) -> Result<()> {
    let source = ActivitySource::new(client, persona_id, page_limit(), activity_type, triggered_by);

    println!("{}", Paint::new(locale.t(TranslationKey::ActivityLogTitle)).bold());
    let logs = collect_pages(&source, pages).await?;
    if logs.is_empty() {
        println!("{}", locale.t(TranslationKey::ActivityLogEmpty));
        return Ok(());
    }

    let now = Utc::now();
    let res = logs
        .iter()
        .map(|log| return format_activity(log, now))
        .collect::<Vec<String>>()
        .join("\n");
    println!("{res}");

    return Ok(());
}

async fn lora(
    client: Arc<ApiClient>,
    locale: &LocaleStore,
    persona_id: &str,
    train: bool,
    watch: bool,
) -> Result<()> {
    if train {
        let res = client
            .train_lora(persona_id, &LoraTrainRequest::default())
            .await?;
        println!(
            "{} (ID: {})",
            Paint::green(locale.t(TranslationKey::LoraTrainingStarted)),
            res.training_id
        );
    }

    let status = client.lora_status(persona_id).await?;
    println!("{}", format_lora_status(&status, locale));
    if !watch || status.lora_status.is_terminal() {
        return Ok(());
    }

    let mut poller = LoraPoller::default();
    let mut rx = poller.watch(client, persona_id);
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => break,
            status = rx.recv() => match status {
                Some(status) => println!("{}", format_lora_status(&status, locale)),
                None => break,
            },
        }
    }
    poller.cancel();

    return Ok(());
}

async fn post(client: Arc<ApiClient>, locale: &LocaleStore, post_id: &str) -> Result<()> {
    let post = client.post(post_id).await?;
    let now = Utc::now();
    println!("{}", format_post(&post, locale, now));

    // Comments arrive as one tree, so a single page holds the whole thread.
    let source = CommentsSource::new(client, post_id);
    let comments = collect_pages(&source, 1).await?;
    if comments.is_empty() {
        return Ok(());
    }

    let res = Comment::flatten(&comments)
        .into_iter()
        .map(|(depth, comment)| return format_comment(comment, depth, now))
        .collect::<Vec<String>>()
        .join("\n");
    println!("\n{res}");

    return Ok(());
}

async fn set_schedule_active(
    client: &ApiClient,
    persona_id: &str,
    schedule_id: &str,
    is_active: bool,
) -> Result<()> {
    let update = ScheduleUpdate {
        is_active: Some(is_active),
        ..ScheduleUpdate::default()
    };
    client
        .update_schedule(persona_id, schedule_id, &update)
        .await?;

    return Ok(());
}

async fn schedules(
    client: Arc<ApiClient>,
    locale: &LocaleStore,
    persona_id: &str,
    action: ScheduleAction,
) -> Result<()> {
    match action {
        ScheduleAction::List => {}
        ScheduleAction::Pause(schedule_id) => {
            set_schedule_active(&client, persona_id, &schedule_id, false).await?;
        }
        ScheduleAction::Resume(schedule_id) => {
            set_schedule_active(&client, persona_id, &schedule_id, true).await?;
        }
        ScheduleAction::Delete(schedule_id) => {
            client.delete_schedule(persona_id, &schedule_id).await?;
        }
    }

    println!("{}", Paint::new(locale.t(TranslationKey::ScheduleTitle)).bold());
    let schedules = client.schedules(persona_id).await?;
    if schedules.is_empty() {
        println!("{}", locale.t(TranslationKey::ScheduleEmpty));
        return Ok(());
    }

    let res = schedules
        .iter()
        .map(|schedule| return format_schedule(schedule, locale))
        .collect::<Vec<String>>()
        .join("\n");
    println!("{res}");

    return Ok(());
}

async fn images(
    client: Arc<ApiClient>,
    locale: &LocaleStore,
    persona_id: &str,
    action: ImageAction,
) -> Result<()> {
    match action {
        ImageAction::List => {}
        ImageAction::Generate(prompt) => {
            println!("{}", Paint::new(locale.t(TranslationKey::CommonLoading)).dimmed());
            client.generate_image(persona_id, &prompt).await?;
        }
        ImageAction::SetProfile(image_id) => {
            client.set_profile_image(persona_id, &image_id).await?;
        }
        ImageAction::Delete(image_id) => {
            client.delete_image(persona_id, &image_id).await?;
        }
    }

    println!("{}", Paint::new(locale.t(TranslationKey::ImageGallery)).bold());
    let images = client.images(persona_id).await?;
    if images.is_empty() {
        println!("{}", locale.t(TranslationKey::ImageNoImages));
        return Ok(());
    }

    let res = images
        .iter()
        .map(|image| return format_image(image, locale))
        .collect::<Vec<String>>()
        .join("\n");
    println!("{res}");

    return Ok(());
}

pub async fn start(cmd: RunCommand) -> Result<()> {
    let client = Arc::new(ApiClient::default());
    let locale = LocaleStore::default();

    match cmd {
        RunCommand::Chat { persona_id } => return chat(client, &locale, &persona_id).await,
        RunCommand::Personas => return personas(client, &locale).await,
        RunCommand::Feed { persona_id, pages } => {
            return feed(client, &locale, persona_id, pages).await
        }
        RunCommand::Activity {
            persona_id,
            activity_type,
            triggered_by,
            pages,
        } => {
            return activity(
                client,
                &locale,
                &persona_id,
                activity_type,
                triggered_by,
                pages,
            )
            .await
        }
        RunCommand::Lora {
            persona_id,
            train,
            watch,
        } => return lora(client, &locale, &persona_id, train, watch).await,
        RunCommand::Post { post_id } => return post(client, &locale, &post_id).await,
        RunCommand::Schedules { persona_id, action } => {
            return schedules(client, &locale, &persona_id, action).await
        }
        RunCommand::Images { persona_id, action } => {
            return images(client, &locale, &persona_id, action).await
        }
    }
}
