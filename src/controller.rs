//! The UI controller.
//!
//! All input arrives as [`UiEvent`]s and goes through [`Controller::update`].
//! The controller never touches the network: it answers with [`Command`]s
//! that the runtime executes, and the runtime reports results back as
//! response events. This keeps every rule testable without a DOM or server.

use std::str::FromStr;
use std::time::{Duration, Instant};

use crate::api::{ApiOutcome, Generation, HealthReport, ImageRequest, TextRequest};
use crate::error::ValidationError;
use crate::history::{CardId, History, ResultKind, REMOVAL_DELAY};
use crate::notifications::{Manager, NotificationId, Severity};
use crate::preview::{FileCandidate, SelectedImage};
use crate::storage::{DraftState, Storage, THEME_KEY};
use crate::theme::Theme;
use crate::validation::{validate_file, validate_prompt, CharCounter};
use crate::view::{
    FlowView, HealthPanel, HealthView, InlinePanel, PageView, PreviewView, PromptView,
};

pub const GENERATION_FALLBACK: &str = "Failed to generate text";
pub const NETWORK_ERROR: &str = "Network error. Please check your connection and try again.";
pub const HEALTH_FAILED: &str = "Failed to check health status";
pub const HEALTH_UNREACHABLE: &str = "Cannot connect to server";
pub const CLEAR_ALL_QUESTION: &str = "Are you sure you want to clear all results?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ImagePrompt,
    TextPrompt,
}

/// Every clickable control on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    GenerateImage,
    ClearImage,
    RemoveImage,
    GenerateText,
    ClearText,
    ClearAllResults,
    ToggleTheme,
    CheckHealth,
}

impl Control {
    pub const ALL: [Control; 8] = [
        Control::GenerateImage,
        Control::ClearImage,
        Control::RemoveImage,
        Control::GenerateText,
        Control::ClearText,
        Control::ClearAllResults,
        Control::ToggleTheme,
        Control::CheckHealth,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Control::GenerateImage => "generate-image",
            Control::ClearImage => "clear-image",
            Control::RemoveImage => "remove-image",
            Control::GenerateText => "generate-text",
            Control::ClearText => "clear-text",
            Control::ClearAllResults => "clear-all-results",
            Control::ToggleTheme => "toggle-theme",
            Control::CheckHealth => "check-health",
        }
    }

    /// The event a click on this control produces.
    pub fn event(self) -> UiEvent {
        CLICK_BINDINGS
            .iter()
            .find(|(control, _)| *control == self)
            .map(|(_, event)| event.clone())
            .unwrap_or(UiEvent::Ignored)
    }
}

impl FromStr for Control {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Control::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| format!("unknown control '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub modifier: bool,
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    FileSelected(FileCandidate),
    RemoveImage,
    ClearImage,
    ImagePromptInput(String),
    SubmitImage,
    ImageResponse(ApiOutcome<Generation>),
    TextPromptInput(String),
    SubmitText,
    TextResponse(ApiOutcome<Generation>),
    ClearText,
    DeleteResult(CardId),
    RemovalFinished(CardId),
    ClearAllRequested,
    ClearAllConfirmed,
    ToggleTheme,
    CheckHealth,
    HealthResponse(ApiOutcome<HealthReport>),
    FocusChanged(Option<Field>),
    KeyPressed(KeyPress),
    DragOver,
    DragLeave,
    Dropped(Vec<FileCandidate>),
    DismissNotification(NotificationId),
    Tick(Instant),
    Ignored,
}

static CLICK_BINDINGS: [(Control, UiEvent); 8] = [
    (Control::GenerateImage, UiEvent::SubmitImage),
    (Control::ClearImage, UiEvent::ClearImage),
    (Control::RemoveImage, UiEvent::RemoveImage),
    (Control::GenerateText, UiEvent::SubmitText),
    (Control::ClearText, UiEvent::ClearText),
    (Control::ClearAllResults, UiEvent::ClearAllRequested),
    (Control::ToggleTheme, UiEvent::ToggleTheme),
    (Control::CheckHealth, UiEvent::CheckHealth),
];

/// Side effects requested by the controller.
#[derive(Debug, Clone)]
pub enum Command {
    InferImage(ImageRequest),
    GenerateText(TextRequest),
    CheckHealth,
    /// Deliver `RemovalFinished(card)` after `delay`.
    RemoveAfter { card: CardId, delay: Duration },
    /// Ask the user; deliver `on_confirm` only if they accept.
    Confirm {
        message: &'static str,
        on_confirm: UiEvent,
    },
}

#[derive(Debug)]
struct Flow {
    busy: bool,
    panel: Option<InlinePanel>,
    /// Preview captured at submission, attached to the history entry.
    pending_preview: Option<String>,
}

impl Flow {
    fn idle() -> Self {
        Self {
            busy: false,
            panel: None,
            pending_preview: None,
        }
    }

    fn start(&mut self, preview: Option<String>) {
        self.busy = true;
        self.panel = None;
        self.pending_preview = preview;
    }
}

pub struct Controller<S: Storage> {
    storage: S,
    theme: Theme,
    image_prompt: String,
    text_prompt: String,
    selected: Option<SelectedImage>,
    image_flow: Flow,
    text_flow: Flow,
    history: History,
    notifications: Manager,
    health_checking: bool,
    health_panel: Option<HealthPanel>,
    focus: Option<Field>,
    drag_over: bool,
}

impl<S: Storage> Controller<S> {
    /// Restores theme and drafts from storage and greets the user.
    pub fn new(storage: S, notification_lifetime: Duration) -> Self {
        let theme = Theme::load(&storage);
        let draft = DraftState::load(&storage).unwrap_or_default();

        let mut controller = Self {
            storage,
            theme,
            image_prompt: draft.image_prompt,
            text_prompt: draft.text_prompt,
            selected: None,
            image_flow: Flow::idle(),
            text_flow: Flow::idle(),
            history: History::new(),
            notifications: Manager::new(notification_lifetime),
            health_checking: false,
            health_panel: None,
            focus: None,
            drag_over: false,
        };

        tracing::info!("BLIP-2 client initialized (theme: {})", controller.theme);
        controller.notify(Severity::Info, "Welcome! Upload an image to get started");
        controller
    }

    pub fn update(&mut self, event: UiEvent) -> Vec<Command> {
        match event {
            UiEvent::FileSelected(candidate) => {
                self.select_file(candidate);
                Vec::new()
            }
            UiEvent::RemoveImage => {
                self.selected = None;
                Vec::new()
            }
            UiEvent::ClearImage => {
                self.selected = None;
                self.image_prompt.clear();
                self.image_flow.panel = None;
                self.save_draft();
                self.notify(Severity::Info, "Image upload cleared");
                Vec::new()
            }
            UiEvent::ImagePromptInput(value) => {
                self.image_prompt = value;
                self.save_draft();
                Vec::new()
            }
            UiEvent::SubmitImage => self.submit_image(),
            UiEvent::ImageResponse(outcome) => {
                self.finish_generation(ResultKind::Image, outcome);
                Vec::new()
            }
            UiEvent::TextPromptInput(value) => {
                self.text_prompt = value;
                self.save_draft();
                Vec::new()
            }
            UiEvent::SubmitText => self.submit_text(),
            UiEvent::TextResponse(outcome) => {
                self.finish_generation(ResultKind::Text, outcome);
                Vec::new()
            }
            UiEvent::ClearText => {
                self.text_prompt.clear();
                self.text_flow.panel = None;
                self.save_draft();
                self.notify(Severity::Info, "Text prompt cleared");
                Vec::new()
            }
            UiEvent::DeleteResult(card) => {
                if self.history.begin_removal(card) {
                    vec![Command::RemoveAfter {
                        card,
                        delay: REMOVAL_DELAY,
                    }]
                } else {
                    tracing::debug!("Ignoring delete of unknown card {}", card.value());
                    Vec::new()
                }
            }
            UiEvent::RemovalFinished(card) => {
                self.history.finish_removal(card);
                Vec::new()
            }
            UiEvent::ClearAllRequested => {
                if self.history.is_empty() {
                    return Vec::new();
                }
                vec![Command::Confirm {
                    message: CLEAR_ALL_QUESTION,
                    on_confirm: UiEvent::ClearAllConfirmed,
                }]
            }
            UiEvent::ClearAllConfirmed => {
                self.history.clear();
                self.notify(Severity::Info, "All results cleared");
                Vec::new()
            }
            UiEvent::ToggleTheme => {
                self.toggle_theme();
                Vec::new()
            }
            UiEvent::CheckHealth => {
                if self.health_checking {
                    tracing::debug!("Health check already in flight");
                    return Vec::new();
                }
                self.health_checking = true;
                self.health_panel = None;
                vec![Command::CheckHealth]
            }
            UiEvent::HealthResponse(outcome) => {
                self.finish_health(outcome);
                Vec::new()
            }
            UiEvent::FocusChanged(field) => {
                self.focus = field;
                Vec::new()
            }
            UiEvent::KeyPressed(press) => match self.shortcut(press) {
                Some(control) => self.update(control.event()),
                None => Vec::new(),
            },
            UiEvent::DragOver => {
                self.drag_over = true;
                Vec::new()
            }
            UiEvent::DragLeave => {
                self.drag_over = false;
                Vec::new()
            }
            UiEvent::Dropped(files) => {
                self.drag_over = false;
                if let Some(file) = files.into_iter().next() {
                    if self.select_file(file) {
                        self.notify(Severity::Success, "Image uploaded via drag & drop");
                    }
                }
                Vec::new()
            }
            UiEvent::DismissNotification(id) => {
                self.notifications.dismiss(id);
                Vec::new()
            }
            UiEvent::Tick(now) => {
                self.notifications.expire(now);
                Vec::new()
            }
            UiEvent::Ignored => Vec::new(),
        }
    }

    /// Which control a key press activates, given the focused field.
    pub fn shortcut(&self, press: KeyPress) -> Option<Control> {
        match (press.key, press.modifier, self.focus) {
            (Key::Enter, true, Some(Field::ImagePrompt)) if self.selected.is_some() => {
                Some(Control::GenerateImage)
            }
            (Key::Enter, true, Some(Field::TextPrompt)) => Some(Control::GenerateText),
            (Key::Escape, _, Some(Field::ImagePrompt)) => Some(Control::ClearImage),
            (Key::Escape, _, Some(Field::TextPrompt)) => Some(Control::ClearText),
            _ => None,
        }
    }

    fn select_file(&mut self, candidate: FileCandidate) -> bool {
        if let Err(e) = validate_file(&candidate.mime, candidate.size) {
            tracing::info!("Rejected {}: {:?}", candidate.name, e);
            self.reject(e);
            return false;
        }

        let selected = SelectedImage::from_candidate(candidate);
        tracing::info!("Selected {} ({})", selected.file.name, selected.info());
        self.selected = Some(selected);
        true
    }

    fn submit_image(&mut self) -> Vec<Command> {
        if self.image_flow.busy {
            tracing::debug!("Image request already in flight");
            return Vec::new();
        }

        if self.selected.is_none() {
            self.reject(ValidationError::NoImageSelected);
            return Vec::new();
        }

        let prompt = match validate_prompt(&self.image_prompt) {
            Ok(prompt) => prompt.to_string(),
            Err(e) => {
                self.reject(e);
                return Vec::new();
            }
        };

        let Some(selected) = &self.selected else {
            return Vec::new();
        };
        let request = ImageRequest {
            file: selected.file.clone(),
            prompt,
        };
        let preview = selected.data_url.clone();
        self.image_flow.start(Some(preview));
        vec![Command::InferImage(request)]
    }

    fn submit_text(&mut self) -> Vec<Command> {
        if self.text_flow.busy {
            tracing::debug!("Text request already in flight");
            return Vec::new();
        }

        let prompt = match validate_prompt(&self.text_prompt) {
            Ok(prompt) => prompt.to_string(),
            Err(e) => {
                self.reject(e);
                return Vec::new();
            }
        };

        self.text_flow.start(None);
        vec![Command::GenerateText(TextRequest { prompt })]
    }

    fn finish_generation(&mut self, kind: ResultKind, outcome: ApiOutcome<Generation>) {
        let flow = match kind {
            ResultKind::Image => &mut self.image_flow,
            ResultKind::Text => &mut self.text_flow,
        };
        flow.busy = false;
        let preview = flow.pending_preview.take();

        match outcome {
            ApiOutcome::Success(generation) => {
                flow.panel = Some(InlinePanel::Generated {
                    kind,
                    prompt: generation.prompt.clone(),
                    generated: generation.generated.clone(),
                });
                self.history
                    .push(kind, generation.prompt, generation.generated, preview);
                self.notify(Severity::Success, "Text generated successfully!");
            }
            ApiOutcome::Failed { message, .. } => {
                let message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| GENERATION_FALLBACK.to_string());
                flow.panel = Some(InlinePanel::Error(message.clone()));
                self.notify(Severity::Danger, message);
            }
            ApiOutcome::Network => {
                flow.panel = Some(InlinePanel::Error(NETWORK_ERROR.to_string()));
                self.notify(Severity::Danger, NETWORK_ERROR);
            }
        }
    }

    fn finish_health(&mut self, outcome: ApiOutcome<HealthReport>) {
        self.health_checking = false;

        match outcome {
            ApiOutcome::Success(report) => {
                let (severity, message) = if report.model_loaded {
                    (Severity::Success, "System is ready")
                } else {
                    (Severity::Danger, "System is not ready")
                };
                self.health_panel = Some(HealthPanel::Report(report));
                self.notify(severity, message);
            }
            ApiOutcome::Failed { .. } => {
                self.health_panel = Some(HealthPanel::Error(HEALTH_FAILED.to_string()));
                self.notify(Severity::Danger, HEALTH_FAILED);
            }
            ApiOutcome::Network => {
                self.health_panel = Some(HealthPanel::Error(HEALTH_UNREACHABLE.to_string()));
                self.notify(Severity::Danger, HEALTH_UNREACHABLE);
            }
        }
    }

    fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(e) = self.storage.set_item(THEME_KEY, self.theme.as_str()) {
            tracing::warn!("Could not persist theme: {}", e);
        }
        self.notify(Severity::Info, format!("Switched to {} theme", self.theme));
    }

    fn save_draft(&mut self) {
        let draft = DraftState {
            image_prompt: self.image_prompt.clone(),
            text_prompt: self.text_prompt.clone(),
        };
        if let Err(e) = draft.save(&mut self.storage) {
            tracing::warn!("Could not persist draft: {}", e);
        }
    }

    fn reject(&mut self, error: ValidationError) {
        let severity = match error {
            ValidationError::NoImageSelected | ValidationError::EmptyPrompt => Severity::Warning,
            ValidationError::InvalidFileType { .. }
            | ValidationError::FileTooLarge { .. }
            | ValidationError::PromptTooLong { .. } => Severity::Danger,
        };
        self.notify(severity, error.to_string());
    }

    fn notify(&mut self, severity: Severity, message: impl Into<String>) {
        self.notifications.push(severity, message);
    }

    #[cfg(test)]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[cfg(test)]
    pub fn image_prompt(&self) -> &str {
        &self.image_prompt
    }

    #[cfg(test)]
    pub fn text_prompt(&self) -> &str {
        &self.text_prompt
    }

    #[cfg(test)]
    pub fn selected_image(&self) -> Option<&SelectedImage> {
        self.selected.as_ref()
    }

    #[cfg(test)]
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn notifications(&self) -> &Manager {
        &self.notifications
    }

    #[cfg(test)]
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn view(&self) -> PageView {
        PageView {
            theme: self.theme,
            drop_highlight: self.drag_over,
            preview: self.selected.as_ref().map(|s| PreviewView {
                data_url: s.data_url.clone(),
                info: s.info(),
            }),
            image_prompt: PromptView {
                value: self.image_prompt.clone(),
                counter: CharCounter::of(&self.image_prompt),
            },
            image_flow: FlowView {
                kind: ResultKind::Image,
                busy: self.image_flow.busy,
                panel: self.image_flow.panel.clone(),
            },
            text_prompt: PromptView {
                value: self.text_prompt.clone(),
                counter: CharCounter::of(&self.text_prompt),
            },
            text_flow: FlowView {
                kind: ResultKind::Text,
                busy: self.text_flow.busy,
                panel: self.text_flow.panel.clone(),
            },
            results: self.history.entries().to_vec(),
            health: HealthView {
                checking: self.health_checking,
                panel: self.health_panel.clone(),
            },
            notifications: self.notifications.visible().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::DEFAULT_LIFETIME;
    use crate::preview::tests::png_bytes;
    use crate::storage::{MemoryStorage, DRAFT_KEY};
    use crate::validation::MAX_FILE_SIZE;
    use crate::view::render_inline_panel;

    fn controller() -> Controller<MemoryStorage> {
        Controller::new(MemoryStorage::new(), DEFAULT_LIFETIME)
    }

    fn png(name: &str) -> FileCandidate {
        FileCandidate::new(name, "image/png", png_bytes(2, 2))
    }

    fn last_message<S: Storage>(c: &Controller<S>) -> (Severity, String) {
        let n = c.notifications().latest().expect("notification");
        (n.severity, n.message.clone())
    }

    fn generation(prompt: &str, generated: &str) -> ApiOutcome<Generation> {
        ApiOutcome::Success(Generation {
            prompt: prompt.into(),
            generated: generated.into(),
        })
    }

    #[test]
    fn starts_with_welcome_and_dark_theme() {
        let c = controller();
        assert_eq!(c.theme(), Theme::Dark);
        assert_eq!(
            last_message(&c),
            (Severity::Info, "Welcome! Upload an image to get started".into())
        );
        assert!(c.view().shows_placeholder());
        assert!(!c.view().clear_all_visible());
    }

    #[test]
    fn invalid_files_leave_selection_untouched() {
        let mut c = controller();
        c.update(UiEvent::FileSelected(png("first.png")));
        assert!(c.selected_image().is_some());

        c.update(UiEvent::FileSelected(FileCandidate::new(
            "doc.pdf",
            "application/pdf",
            vec![0; 10],
        )));
        assert_eq!(c.selected_image().unwrap().file.name, "first.png");
        assert_eq!(
            last_message(&c),
            (
                Severity::Danger,
                "Invalid file type. Please upload PNG, JPEG, GIF, WebP, or BMP.".into()
            )
        );

        let mut huge = png("huge.png");
        huge.size = MAX_FILE_SIZE + 1;
        c.update(UiEvent::FileSelected(huge));
        assert_eq!(c.selected_image().unwrap().file.name, "first.png");
        assert_eq!(
            last_message(&c),
            (Severity::Danger, "File too large. Maximum size is 16MB.".into())
        );
    }

    #[test]
    fn rejected_file_never_produces_a_request() {
        let mut c = controller();
        c.update(UiEvent::FileSelected(FileCandidate::new("a.gif", "image/tiff", vec![1])));
        c.update(UiEvent::ImagePromptInput("describe".into()));

        assert!(c.update(UiEvent::SubmitImage).is_empty());
        assert_eq!(
            last_message(&c),
            (Severity::Warning, "Please choose an image first".into())
        );
    }

    #[test]
    fn image_flow_needs_a_prompt() {
        let mut c = controller();
        c.update(UiEvent::FileSelected(png("cat.png")));
        c.update(UiEvent::ImagePromptInput("   ".into()));

        assert!(c.update(UiEvent::SubmitImage).is_empty());
        assert_eq!(last_message(&c), (Severity::Warning, "Please enter a prompt".into()));
    }

    #[test]
    fn over_long_prompt_is_rejected_and_500_is_accepted() {
        let mut c = controller();
        c.update(UiEvent::TextPromptInput("x".repeat(501)));
        assert!(c.update(UiEvent::SubmitText).is_empty());
        assert_eq!(
            last_message(&c),
            (Severity::Danger, "Prompt too long. Maximum 500 characters".into())
        );
        assert!(!c.view().text_flow.busy);

        c.update(UiEvent::TextPromptInput("x".repeat(500)));
        let commands = c.update(UiEvent::SubmitText);
        assert!(matches!(
            commands.as_slice(),
            [Command::GenerateText(TextRequest { prompt })] if prompt.len() == 500
        ));
    }

    #[test]
    fn successful_image_flow_adds_one_history_entry() {
        let mut c = controller();
        c.update(UiEvent::FileSelected(png("cat.png")));
        c.update(UiEvent::ImagePromptInput("  what <is> this? ".into()));

        let commands = c.update(UiEvent::SubmitImage);
        let request = match commands.as_slice() {
            [Command::InferImage(request)] => request.clone(),
            other => panic!("unexpected commands: {:?}", other),
        };
        assert_eq!(request.prompt, "what <is> this?");
        assert_eq!(request.file.name, "cat.png");

        let view = c.view();
        assert!(view.image_flow.busy);
        assert!(view.image_flow.button_label().contains("Generating..."));
        assert!(view.image_flow.panel.is_none());

        c.update(UiEvent::ImageResponse(generation("p<", "g&")));

        let entries = c.history().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, ResultKind::Image);
        assert_eq!(entries[0].prompt, "p<");
        assert_eq!(entries[0].generated, "g&");
        assert_eq!(
            entries[0].source_preview.as_deref(),
            Some(c.selected_image().unwrap().data_url.as_str())
        );

        let view = c.view();
        assert!(!view.image_flow.busy);
        let html = render_inline_panel(view.image_flow.panel.as_ref().unwrap());
        assert!(html.contains("p&lt;"));
        assert!(html.contains("g&amp;"));
        assert!(view.clear_all_visible());
        assert_eq!(
            last_message(&c),
            (Severity::Success, "Text generated successfully!".into())
        );
    }

    #[test]
    fn server_error_is_shown_verbatim_and_history_unchanged() {
        let mut c = controller();
        c.update(UiEvent::TextPromptInput("hello".into()));
        c.update(UiEvent::SubmitText);
        c.update(UiEvent::TextResponse(ApiOutcome::Failed {
            status: 400,
            message: Some("bad input".into()),
        }));

        assert!(c.history().is_empty());
        assert_eq!(
            c.view().text_flow.panel,
            Some(InlinePanel::Error("bad input".into()))
        );
        assert_eq!(last_message(&c), (Severity::Danger, "bad input".into()));
        assert_eq!(c.text_prompt(), "hello");
        assert!(!c.view().text_flow.busy);
    }

    #[test]
    fn missing_error_field_uses_fallback() {
        let mut c = controller();
        c.update(UiEvent::TextPromptInput("hello".into()));
        c.update(UiEvent::SubmitText);
        c.update(UiEvent::TextResponse(ApiOutcome::Failed {
            status: 500,
            message: None,
        }));
        assert_eq!(last_message(&c), (Severity::Danger, GENERATION_FALLBACK.into()));
    }

    #[test]
    fn network_failure_restores_idle_state() {
        let mut c = controller();
        c.update(UiEvent::TextPromptInput("hello".into()));
        c.update(UiEvent::SubmitText);
        c.update(UiEvent::TextResponse(ApiOutcome::Network));

        let view = c.view();
        assert!(!view.text_flow.busy);
        assert_eq!(view.text_flow.panel, Some(InlinePanel::Error(NETWORK_ERROR.into())));
        assert_eq!(last_message(&c), (Severity::Danger, NETWORK_ERROR.into()));
    }

    #[test]
    fn duplicate_submission_is_ignored_while_in_flight() {
        let mut c = controller();
        c.update(UiEvent::TextPromptInput("hello".into()));
        assert_eq!(c.update(UiEvent::SubmitText).len(), 1);
        assert!(c.update(UiEvent::SubmitText).is_empty());

        // The other flow is independent.
        c.update(UiEvent::FileSelected(png("cat.png")));
        c.update(UiEvent::ImagePromptInput("describe".into()));
        assert_eq!(c.update(UiEvent::SubmitImage).len(), 1);

        c.update(UiEvent::TextResponse(generation("hello", "world")));
        assert_eq!(c.update(UiEvent::SubmitText).len(), 1);
    }

    #[test]
    fn new_submission_clears_previous_inline_result() {
        let mut c = controller();
        c.update(UiEvent::TextPromptInput("hello".into()));
        c.update(UiEvent::SubmitText);
        c.update(UiEvent::TextResponse(generation("hello", "world")));
        assert!(c.view().text_flow.panel.is_some());

        c.update(UiEvent::SubmitText);
        assert!(c.view().text_flow.panel.is_none());
    }

    #[test]
    fn deleting_only_entry_restores_placeholder() {
        let mut c = controller();
        c.update(UiEvent::TextPromptInput("hello".into()));
        c.update(UiEvent::SubmitText);
        c.update(UiEvent::TextResponse(generation("hello", "world")));
        let card = c.history().entries()[0].card;

        let commands = c.update(UiEvent::DeleteResult(card));
        assert!(matches!(
            commands.as_slice(),
            [Command::RemoveAfter { card: target, delay }] if *target == card && *delay == REMOVAL_DELAY
        ));
        assert!(c.view().clear_all_visible());
        assert!(c.update(UiEvent::DeleteResult(card)).is_empty());

        c.update(UiEvent::RemovalFinished(card));
        let view = c.view();
        assert!(view.shows_placeholder());
        assert!(!view.clear_all_visible());
    }

    #[test]
    fn clear_all_requires_confirmation_and_resets_sequence() {
        let mut c = controller();
        assert!(c.update(UiEvent::ClearAllRequested).is_empty());

        c.update(UiEvent::TextPromptInput("hello".into()));
        for _ in 0..2 {
            c.update(UiEvent::SubmitText);
            c.update(UiEvent::TextResponse(generation("hello", "world")));
        }
        assert_eq!(c.history().entries()[0].sequence, 2);

        let commands = c.update(Control::ClearAllResults.event());
        let on_confirm = match commands.as_slice() {
            [Command::Confirm { message, on_confirm }] => {
                assert_eq!(*message, CLEAR_ALL_QUESTION);
                on_confirm.clone()
            }
            other => panic!("unexpected commands: {:?}", other),
        };
        assert_eq!(c.history().len(), 2);

        c.update(on_confirm);
        assert!(c.view().shows_placeholder());
        assert_eq!(last_message(&c), (Severity::Info, "All results cleared".into()));

        c.update(UiEvent::SubmitText);
        c.update(UiEvent::TextResponse(generation("hello", "again")));
        assert_eq!(c.history().entries()[0].sequence, 1);
    }

    #[test]
    fn theme_toggle_twice_restores_persisted_value() {
        let mut c = controller();
        c.update(UiEvent::ToggleTheme);
        assert_eq!(c.theme(), Theme::Light);
        assert_eq!(c.storage().get_item(THEME_KEY).as_deref(), Some("light"));
        assert_eq!(last_message(&c), (Severity::Info, "Switched to light theme".into()));

        c.update(UiEvent::ToggleTheme);
        assert_eq!(c.storage().get_item(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(c.view().theme.icon(), "fas fa-moon");
    }

    #[test]
    fn draft_survives_restart() {
        let mut c = controller();
        c.update(UiEvent::TextPromptInput("hello".into()));
        c.update(UiEvent::ImagePromptInput("caption it".into()));

        let restarted = Controller::new(c.storage, DEFAULT_LIFETIME);
        assert_eq!(restarted.text_prompt(), "hello");
        let view = restarted.view();
        assert_eq!(view.text_prompt.value, "hello");
        assert_eq!(view.text_prompt.counter.count, 5);
        assert_eq!(view.image_prompt.counter.count, 10);
    }

    #[test]
    fn corrupt_draft_leaves_fields_empty() {
        let mut storage = MemoryStorage::new();
        storage.set_item(DRAFT_KEY, "[[[").unwrap();
        let c = Controller::new(storage, DEFAULT_LIFETIME);
        assert_eq!(c.text_prompt(), "");
        assert_eq!(c.image_prompt(), "");
    }

    #[test]
    fn clear_controls_reset_their_flow_and_persist() {
        let mut c = controller();
        c.update(UiEvent::FileSelected(png("cat.png")));
        c.update(UiEvent::ImagePromptInput("describe".into()));
        c.update(UiEvent::TextPromptInput("hello".into()));

        c.update(UiEvent::ClearImage);
        assert!(c.selected_image().is_none());
        assert_eq!(c.image_prompt(), "");
        assert_eq!(c.text_prompt(), "hello");
        assert_eq!(last_message(&c), (Severity::Info, "Image upload cleared".into()));

        c.update(UiEvent::ClearText);
        assert_eq!(last_message(&c), (Severity::Info, "Text prompt cleared".into()));
        let draft = DraftState::load(c.storage()).unwrap();
        assert_eq!(draft, DraftState::default());
    }

    #[test]
    fn remove_image_keeps_prompt() {
        let mut c = controller();
        c.update(UiEvent::FileSelected(png("cat.png")));
        c.update(UiEvent::ImagePromptInput("describe".into()));
        c.update(Control::RemoveImage.event());
        assert!(c.selected_image().is_none());
        assert!(c.view().preview.is_none());
        assert_eq!(c.image_prompt(), "describe");
    }

    #[test]
    fn shortcuts_follow_focus() {
        let mut c = controller();
        let submit = KeyPress {
            key: Key::Enter,
            modifier: true,
        };
        let escape = KeyPress {
            key: Key::Escape,
            modifier: false,
        };

        c.update(UiEvent::ImagePromptInput("describe".into()));
        c.update(UiEvent::TextPromptInput("hello".into()));

        assert!(c.update(UiEvent::KeyPressed(submit)).is_empty());

        c.update(UiEvent::FocusChanged(Some(Field::ImagePrompt)));
        assert_eq!(c.shortcut(submit), None);
        c.update(UiEvent::FileSelected(png("cat.png")));
        assert!(matches!(
            c.update(UiEvent::KeyPressed(submit)).as_slice(),
            [Command::InferImage(_)]
        ));

        c.update(UiEvent::FocusChanged(Some(Field::TextPrompt)));
        assert!(c
            .update(UiEvent::KeyPressed(KeyPress {
                key: Key::Enter,
                modifier: false,
            }))
            .is_empty());
        assert!(matches!(
            c.update(UiEvent::KeyPressed(submit)).as_slice(),
            [Command::GenerateText(_)]
        ));

        c.update(UiEvent::KeyPressed(escape));
        assert_eq!(c.text_prompt(), "");
        c.update(UiEvent::FocusChanged(Some(Field::ImagePrompt)));
        c.update(UiEvent::KeyPressed(escape));
        assert_eq!(c.image_prompt(), "");
        assert!(c.selected_image().is_none());
    }

    #[test]
    fn drop_validates_and_uses_first_file() {
        let mut c = controller();
        c.update(UiEvent::DragOver);
        assert!(c.view().drop_highlight);

        c.update(UiEvent::Dropped(vec![png("first.png"), png("second.png")]));
        assert!(!c.view().drop_highlight);
        assert_eq!(c.selected_image().unwrap().file.name, "first.png");
        assert_eq!(
            last_message(&c),
            (Severity::Success, "Image uploaded via drag & drop".into())
        );

        c.update(UiEvent::Dropped(vec![FileCandidate::new("x.txt", "text/plain", vec![1])]));
        assert_eq!(c.selected_image().unwrap().file.name, "first.png");
        assert_eq!(last_message(&c).0, Severity::Danger);

        let before = c.notifications().visible().len();
        c.update(UiEvent::Dropped(Vec::new()));
        assert_eq!(c.notifications().visible().len(), before);
    }

    #[test]
    fn drag_leave_clears_highlight() {
        let mut c = controller();
        c.update(UiEvent::DragOver);
        assert!(c.view().drop_highlight);

        assert!(c.update(UiEvent::DragLeave).is_empty());
        assert!(!c.view().drop_highlight);
        assert!(c.selected_image().is_none());
    }

    #[test]
    fn health_check_outcomes() {
        let mut c = controller();
        assert!(matches!(
            c.update(UiEvent::CheckHealth).as_slice(),
            [Command::CheckHealth]
        ));
        assert!(c.view().health.checking);
        assert!(c.update(UiEvent::CheckHealth).is_empty());

        let report = HealthReport {
            status: "ok".into(),
            model_loaded: false,
            device: "cpu".into(),
            dtype: "float32".into(),
        };
        c.update(UiEvent::HealthResponse(ApiOutcome::Success(report.clone())));
        assert!(!c.view().health.checking);
        assert_eq!(c.view().health.panel, Some(HealthPanel::Report(report)));
        assert_eq!(last_message(&c), (Severity::Danger, "System is not ready".into()));

        c.update(UiEvent::CheckHealth);
        c.update(UiEvent::HealthResponse(ApiOutcome::Failed {
            status: 503,
            message: None,
        }));
        assert_eq!(
            c.view().health.panel,
            Some(HealthPanel::Error(HEALTH_FAILED.into()))
        );
        assert_eq!(last_message(&c), (Severity::Danger, HEALTH_FAILED.into()));

        c.update(UiEvent::CheckHealth);
        c.update(UiEvent::HealthResponse(ApiOutcome::Network));
        assert_eq!(last_message(&c), (Severity::Danger, HEALTH_UNREACHABLE.into()));
    }

    #[test]
    fn healthy_backend_reports_ready() {
        let mut c = controller();
        c.update(UiEvent::CheckHealth);

        let report = HealthReport {
            status: "ok".into(),
            model_loaded: true,
            device: "cuda".into(),
            dtype: "float16".into(),
        };
        c.update(UiEvent::HealthResponse(ApiOutcome::Success(report.clone())));

        let health = c.view().health;
        assert!(!health.checking);
        assert_eq!(health.panel, Some(HealthPanel::Report(report)));
        assert_eq!(last_message(&c), (Severity::Success, "System is ready".into()));
    }

    #[test]
    fn notifications_expire_on_tick() {
        let mut c = controller();
        let id = c.notifications().latest().unwrap().id;
        c.update(UiEvent::ToggleTheme);
        c.update(UiEvent::DismissNotification(id));
        assert_eq!(c.notifications().visible().len(), 1);

        c.update(UiEvent::Tick(Instant::now() + DEFAULT_LIFETIME));
        assert!(c.notifications().visible().is_empty());
    }

    #[test]
    fn every_control_has_a_binding() {
        for control in Control::ALL {
            assert!(!matches!(control.event(), UiEvent::Ignored), "{:?}", control);
            assert_eq!(control.name().parse::<Control>(), Ok(control));
        }
        assert!("nope".parse::<Control>().is_err());
    }
}
