//! Interactive line-based front-end.
//!
//! Each input line becomes a [`UiEvent`]. Requests run as tokio tasks and
//! report back over a channel, so the prompt stays responsive while the
//! backend works and both flows can be in flight at once.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::api::HttpBackend;
use crate::config::ClientConfig;
use crate::controller::{Command, Control, Controller, Field, Key, KeyPress, UiEvent};
use crate::history::CardId;
use crate::notifications::NotificationId;
use crate::preview::FileCandidate;
use crate::storage::Storage;
use crate::view::{render_page, HealthPanel, InlinePanel, PageView};

const TICK_INTERVAL: Duration = Duration::from_millis(500);

const HELP: &str = "\
Commands:
  image <path>              select an image file
  drag                      drag a file over the upload card
  leave                     drag back out without dropping
  drop <path> [path...]     drop files onto the upload card
  img-prompt <text>         type into the image prompt
  prompt <text>             type into the text prompt
  focus image|text|none     move keyboard focus
  key ctrl+enter|escape     press a shortcut in the focused field
  click <control>           generate-image, clear-image, remove-image,
                            generate-text, clear-text, clear-all-results,
                            toggle-theme, check-health
  delete <card>             delete a result card
  dismiss <id>              dismiss a notification
  show                      print the current state
  render [path]             write the page as HTML
  help                      this text
  quit                      exit";

/// A parsed input line.
#[derive(Debug)]
pub enum Input {
    Event(UiEvent),
    Select(PathBuf),
    Drop(Vec<PathBuf>),
    Render(Option<PathBuf>),
    Show,
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> std::result::Result<Input, String> {
    let trimmed = line.trim_start();
    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest),
        None => (trimmed.trim_end(), ""),
    };
    let arg = rest.trim();

    let input = match command {
        "" => Input::Empty,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        "show" => Input::Show,
        "image" => Input::Select(PathBuf::from(required(arg, "image <path>")?)),
        "drag" => Input::Event(UiEvent::DragOver),
        "leave" => Input::Event(UiEvent::DragLeave),
        "drop" => Input::Drop(arg.split_whitespace().map(PathBuf::from).collect()),
        // Prompts keep their text verbatim, trailing spaces included.
        "img-prompt" => Input::Event(UiEvent::ImagePromptInput(rest.to_string())),
        "prompt" => Input::Event(UiEvent::TextPromptInput(rest.to_string())),
        "focus" => Input::Event(UiEvent::FocusChanged(match arg {
            "image" => Some(Field::ImagePrompt),
            "text" => Some(Field::TextPrompt),
            "none" | "" => None,
            other => return Err(format!("unknown field '{}'", other)),
        })),
        "key" => Input::Event(UiEvent::KeyPressed(parse_key(arg)?)),
        "click" => Input::Event(required(arg, "click <control>")?.parse::<Control>()?.event()),
        "delete" => Input::Event(UiEvent::DeleteResult(CardId::from(parse_number(arg)?))),
        "dismiss" => Input::Event(UiEvent::DismissNotification(NotificationId::from(
            parse_number(arg)?,
        ))),
        "render" => Input::Render((!arg.is_empty()).then(|| PathBuf::from(arg))),
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(input)
}

fn required<'a>(arg: &'a str, usage: &str) -> std::result::Result<&'a str, String> {
    if arg.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(arg)
    }
}

fn parse_number(arg: &str) -> std::result::Result<u64, String> {
    arg.trim_start_matches('#')
        .parse()
        .map_err(|_| format!("expected a number, got '{}'", arg))
}

fn parse_key(arg: &str) -> std::result::Result<KeyPress, String> {
    let lower = arg.to_ascii_lowercase();
    let (modifier, key) = match lower.rsplit_once('+') {
        Some((m, key)) if matches!(m, "ctrl" | "cmd" | "meta") => (true, key),
        Some((m, _)) => return Err(format!("unknown modifier '{}'", m)),
        None => (false, lower.as_str()),
    };
    let key = match key {
        "enter" => Key::Enter,
        "escape" | "esc" => Key::Escape,
        "" => return Err("usage: key ctrl+enter|escape".to_string()),
        _ => Key::Other,
    };
    Ok(KeyPress { key, modifier })
}

struct Shell {
    backend: HttpBackend,
    events: mpsc::UnboundedSender<UiEvent>,
    page_path: PathBuf,
    last_seen: Option<NotificationId>,
    pending_confirm: Option<UiEvent>,
}

impl Shell {
    fn execute(&mut self, command: Command) {
        match command {
            Command::InferImage(request) => {
                let backend = self.backend.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let outcome = backend.infer_image(request).await;
                    let _ = events.send(UiEvent::ImageResponse(outcome));
                });
                println!("⏳ Generating from image...");
            }
            Command::GenerateText(request) => {
                let backend = self.backend.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let outcome = backend.generate_text(request).await;
                    let _ = events.send(UiEvent::TextResponse(outcome));
                });
                println!("⏳ Generating from text...");
            }
            Command::CheckHealth => {
                let backend = self.backend.clone();
                let events = self.events.clone();
                tokio::spawn(async move {
                    let outcome = backend.health().await;
                    let _ = events.send(UiEvent::HealthResponse(outcome));
                });
                println!("⏳ Checking...");
            }
            Command::RemoveAfter { card, delay } => {
                let events = self.events.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = events.send(UiEvent::RemovalFinished(card));
                });
            }
            Command::Confirm {
                message,
                on_confirm,
            } => {
                println!("❓ {} [y/N]", message);
                self.pending_confirm = Some(on_confirm);
            }
        }
    }

    /// Prints notifications that appeared since the last call.
    fn announce<S: Storage>(&mut self, controller: &Controller<S>) {
        for notification in controller.notifications().since(self.last_seen) {
            println!(
                "[{}] {} (#{})",
                notification.severity.as_str(),
                notification.message,
                notification.id.value()
            );
            self.last_seen = Some(notification.id);
        }
    }

    async fn handle_line<S: Storage>(
        &mut self,
        line: &str,
        controller: &Controller<S>,
    ) -> Result<Option<UiEvent>, Quit> {
        if let Some(on_confirm) = self.pending_confirm.take() {
            return Ok(match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => Some(on_confirm),
                _ => {
                    println!("Cancelled");
                    None
                }
            });
        }

        let input = match parse_line(line) {
            Ok(input) => input,
            Err(message) => {
                println!("⚠ {}", message);
                return Ok(None);
            }
        };

        match input {
            Input::Event(event) => Ok(Some(event)),
            Input::Select(path) => Ok(read_file(&path).await.map(UiEvent::FileSelected)),
            Input::Drop(paths) => Ok(Some(drop_event(&paths).await)),
            Input::Render(path) => {
                let path = path.unwrap_or_else(|| self.page_path.clone());
                match write_page(&path, &controller.view()).await {
                    Ok(()) => println!("📄 Page written to {}", path.display()),
                    Err(e) => println!("⚠ {:#}", e),
                }
                Ok(None)
            }
            Input::Show => {
                print!("{}", describe(&controller.view()));
                Ok(None)
            }
            Input::Help => {
                println!("{}", HELP);
                Ok(None)
            }
            Input::Quit => Err(Quit),
            Input::Empty => Ok(None),
        }
    }
}

struct Quit;

async fn read_file(path: &Path) -> Option<FileCandidate> {
    match FileCandidate::read(path).await {
        Ok(file) => Some(file),
        Err(e) => {
            println!("⚠ Cannot read {}: {}", path.display(), e);
            None
        }
    }
}

/// Only the first dropped file is used, so only it is read. An unreadable
/// first file still ends the drag with an empty drop.
async fn drop_event(paths: &[PathBuf]) -> UiEvent {
    let first = match paths.first() {
        Some(path) => read_file(path).await,
        None => None,
    };
    UiEvent::Dropped(first.into_iter().collect())
}

async fn write_page(path: &Path, page: &PageView) -> Result<()> {
    tokio::fs::write(path, render_page(page))
        .await
        .with_context(|| format!("Cannot write {}", path.display()))
}

fn describe_panel(out: &mut String, panel: &Option<InlinePanel>) {
    match panel {
        Some(InlinePanel::Generated {
            prompt, generated, ..
        }) => {
            let _ = writeln!(out, "    Prompt: {}", prompt);
            let _ = writeln!(out, "    Generated: {}", generated);
        }
        Some(InlinePanel::Error(message)) => {
            let _ = writeln!(out, "    Error: {}", message);
        }
        None => {}
    }
}

/// Plain-text rendering of the page for the terminal.
pub fn describe(page: &PageView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Theme: {}", page.theme);

    let _ = writeln!(out, "Image:");
    match &page.preview {
        Some(preview) => {
            let _ = writeln!(out, "  File: {}", preview.info);
        }
        None => {
            let _ = writeln!(out, "  File: none");
        }
    }
    let counter = &page.image_prompt.counter;
    let _ = writeln!(
        out,
        "  Prompt: {:?} ({}/500{})",
        page.image_prompt.value,
        counter.count,
        if counter.near_limit { ", near limit" } else { "" }
    );
    if page.image_flow.busy {
        let _ = writeln!(out, "  Generating...");
    }
    describe_panel(&mut out, &page.image_flow.panel);

    let counter = &page.text_prompt.counter;
    let _ = writeln!(out, "Text:");
    let _ = writeln!(
        out,
        "  Prompt: {:?} ({}/500{})",
        page.text_prompt.value,
        counter.count,
        if counter.near_limit { ", near limit" } else { "" }
    );
    if page.text_flow.busy {
        let _ = writeln!(out, "  Generating...");
    }
    describe_panel(&mut out, &page.text_flow.panel);

    match &page.health.panel {
        Some(HealthPanel::Report(report)) => {
            let _ = writeln!(
                out,
                "Health: {} | model {} | {} | {}",
                report.status,
                if report.model_loaded { "loaded" } else { "not loaded" },
                report.device,
                report.dtype
            );
        }
        Some(HealthPanel::Error(message)) => {
            let _ = writeln!(out, "Health: {}", message);
        }
        None if page.health.checking => {
            let _ = writeln!(out, "Health: checking...");
        }
        None => {}
    }

    let _ = writeln!(out, "Results:");
    if page.shows_placeholder() {
        let _ = writeln!(out, "  No results yet");
    }
    for entry in &page.results {
        let _ = writeln!(
            out,
            "  [card {}] #{} {} {}{}",
            entry.card.value(),
            entry.sequence,
            entry.kind.label(),
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            if entry.leaving { " (removing)" } else { "" }
        );
        let _ = writeln!(out, "    Prompt: {}", entry.prompt);
        let _ = writeln!(out, "    Generated: {}", entry.generated);
    }
    out
}

pub async fn run<S: Storage>(config: &ClientConfig, backend: HttpBackend, storage: S) -> Result<()> {
    let mut controller = Controller::new(storage, config.notification_lifetime);
    let (events, mut responses) = mpsc::unbounded_channel();

    let mut shell = Shell {
        backend,
        events,
        page_path: config.page_path.clone(),
        last_seen: None,
        pending_confirm: None,
    };

    println!("🚀 BLIP-2 client for {}", shell.backend.base_url());
    println!("Type 'help' for commands.");
    shell.announce(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    loop {
        let event = tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                match shell.handle_line(&line, &controller).await {
                    Ok(Some(event)) => event,
                    Ok(None) => continue,
                    Err(Quit) => break,
                }
            }
            Some(event) = responses.recv() => event,
            _ = ticker.tick() => UiEvent::Tick(Instant::now()),
        };

        for command in controller.update(event) {
            shell.execute(command);
        }
        shell.announce(&controller);
    }

    tracing::info!("Shell closed");
    Ok(())
}
