//! View-model and HTML rendering.
//!
//! The controller produces a [`PageView`] snapshot; the functions here turn
//! it into markup. Every string that came from the user or the backend goes
//! through [`escape_html`] on its way out, so templates never see raw text.

use std::fmt::Write as _;

use crate::api::HealthReport;
use crate::history::{ResultEntry, ResultKind};
use crate::notifications::Notification;
use crate::theme::Theme;
use crate::validation::CharCounter;

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// What a flow shows under its form after a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlinePanel {
    Generated {
        kind: ResultKind,
        prompt: String,
        generated: String,
    },
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthPanel {
    Report(HealthReport),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct FlowView {
    pub kind: ResultKind,
    pub busy: bool,
    pub panel: Option<InlinePanel>,
}

impl FlowView {
    fn idle_icon(&self) -> &'static str {
        match self.kind {
            ResultKind::Image => "fa-magic",
            ResultKind::Text => "fa-lightbulb",
        }
    }

    pub fn button_label(&self) -> String {
        if self.busy {
            r#"<i class="fas fa-spinner fa-spin me-2"></i> Generating..."#.to_string()
        } else {
            format!(r#"<i class="fas {} me-2"></i> Generate"#, self.idle_icon())
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreviewView {
    pub data_url: String,
    pub info: String,
}

#[derive(Debug, Clone)]
pub struct PromptView {
    pub value: String,
    pub counter: CharCounter,
}

#[derive(Debug, Clone)]
pub struct HealthView {
    pub checking: bool,
    pub panel: Option<HealthPanel>,
}

/// Full snapshot of what the page shows.
#[derive(Debug, Clone)]
pub struct PageView {
    pub theme: Theme,
    pub drop_highlight: bool,
    pub preview: Option<PreviewView>,
    pub image_prompt: PromptView,
    pub image_flow: FlowView,
    pub text_prompt: PromptView,
    pub text_flow: FlowView,
    pub results: Vec<ResultEntry>,
    pub health: HealthView,
    pub notifications: Vec<Notification>,
}

impl PageView {
    pub fn shows_placeholder(&self) -> bool {
        self.results.is_empty()
    }

    pub fn clear_all_visible(&self) -> bool {
        !self.results.is_empty()
    }
}

pub fn render_generation(kind: ResultKind, prompt: &str, generated: &str) -> String {
    let icon = match kind {
        ResultKind::Image => "fa-magic",
        ResultKind::Text => "fa-lightbulb",
    };
    format!(
        r#"<div class="p-3 result-card fade-in">
  <div class="mb-2">
    <strong class="text-primary"><i class="fas fa-quote-left me-1"></i> Prompt:</strong>
    <p class="text-muted small mb-0 ms-3">{}</p>
  </div>
  <div>
    <strong class="text-success"><i class="fas {} me-1"></i> Generated:</strong>
    <p class="text-secondary mb-0 ms-3">{}</p>
  </div>
</div>"#,
        escape_html(prompt),
        icon,
        escape_html(generated)
    )
}

pub fn render_error(message: &str) -> String {
    format!(
        r#"<div class="alert alert-danger fade-in">
  <i class="fas fa-exclamation-circle me-2"></i>
  <strong>Error:</strong> {}
</div>"#,
        escape_html(message)
    )
}

pub fn render_inline_panel(panel: &InlinePanel) -> String {
    match panel {
        InlinePanel::Generated {
            kind,
            prompt,
            generated,
        } => render_generation(*kind, prompt, generated),
        InlinePanel::Error(message) => render_error(message),
    }
}

pub fn render_health(report: &HealthReport) -> String {
    let (class, icon, model) = if report.model_loaded {
        ("success", "check-circle", "Loaded ✓")
    } else {
        ("danger", "times-circle", "Not Loaded ✗")
    };
    format!(
        r#"<div class="alert alert-{} small mt-2 mb-0">
  <i class="fas fa-{} me-2"></i>
  <strong>Status:</strong> {}<br>
  <strong>Model:</strong> {}<br>
  <strong>Device:</strong> {}<br>
  <strong>Dtype:</strong> {}
</div>"#,
        class,
        icon,
        escape_html(&report.status),
        model,
        escape_html(&report.device),
        escape_html(&report.dtype)
    )
}

pub fn render_card(entry: &ResultEntry) -> String {
    let (badge, icon) = match entry.kind {
        ResultKind::Image => ("bg-primary", "image"),
        ResultKind::Text => ("bg-success", "keyboard"),
    };
    let animation = if entry.leaving {
        "animate__fadeOutRight"
    } else {
        "animate__fadeInUp"
    };

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div class="result-card animate__animated {}" data-card="{}">
  <div class="result-header">
    <div class="d-flex align-items-center gap-2">
      <span class="badge {}"><i class="fas fa-{} me-1"></i>{}</span>
      <small class="text-muted">#{}</small>
    </div>
    <div class="d-flex align-items-center gap-2">
      <small class="text-muted"><i class="fas fa-clock me-1"></i>{}</small>
      <button class="btn btn-sm btn-outline-danger delete-result"><i class="fas fa-trash"></i></button>
    </div>
  </div>
"#,
        animation,
        entry.card.value(),
        badge,
        icon,
        entry.kind.label(),
        entry.sequence,
        entry.timestamp.format("%Y-%m-%d %H:%M:%S")
    );

    if let Some(src) = &entry.source_preview {
        let _ = write!(
            html,
            r#"  <div class="mb-2">
    <img src="{}" alt="Generated from" class="img-fluid rounded" style="max-height: 150px; object-fit: cover;">
  </div>
"#,
            escape_html(src)
        );
    }

    let _ = write!(
        html,
        r#"  <div class="result-content">
    <div class="result-prompt"><i class="fas fa-quote-left me-1"></i><strong>Prompt:</strong> {}</div>
    <div class="result-generated"><i class="fas fa-magic me-1"></i><strong>Generated:</strong> {}</div>
  </div>
</div>"#,
        escape_html(&entry.prompt),
        escape_html(&entry.generated)
    );
    html
}

pub fn render_empty_placeholder() -> &'static str {
    r#"<div class="empty text-center text-muted py-5">
  <i class="fas fa-inbox fa-3x mb-3 opacity-50"></i>
  <p class="lead">No results yet</p>
  <p class="small">Upload an image or enter a prompt to get started</p>
</div>"#
}

/// The list body: cards newest first, or the placeholder. Never both.
pub fn render_results(results: &[ResultEntry]) -> String {
    if results.is_empty() {
        return render_empty_placeholder().to_string();
    }
    results
        .iter()
        .map(render_card)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_notification(notification: &Notification) -> String {
    format!(
        r#"<div class="alert alert-{} alert-dismissible fade show animate__animated animate__fadeInDown" data-notification="{}">
  <i class="fas fa-{} me-2"></i>
  {}
  <button type="button" class="btn-close" data-bs-dismiss="alert"></button>
</div>"#,
        notification.severity.as_str(),
        notification.id.value(),
        notification.severity.icon(),
        escape_html(&notification.message)
    )
}

fn hidden(visible: bool) -> &'static str {
    if visible {
        ""
    } else {
        " d-none"
    }
}

fn counter_class(counter: &CharCounter) -> &'static str {
    if counter.near_limit {
        " text-warning"
    } else {
        ""
    }
}

fn disabled(busy: bool) -> &'static str {
    if busy {
        " disabled"
    } else {
        ""
    }
}

pub fn render_page(page: &PageView) -> String {
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>BLIP-2 Image to Text Generator</title>
  <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.2/dist/css/bootstrap.min.css">
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.5.1/css/all.min.css">
  <link rel="stylesheet" href="https://cdnjs.cloudflare.com/ajax/libs/animate.css/4.1.1/animate.min.css">
</head>
<body data-theme="{}">
<div id="alertContainer">
"#,
        page.theme
    );

    for notification in &page.notifications {
        html.push_str(&render_notification(notification));
        html.push('\n');
    }

    let _ = write!(
        html,
        r#"</div>
<nav class="d-flex justify-content-between p-3">
  <h1>BLIP-2 Image to Text Generator</h1>
  <div>
    <button id="checkHealth" class="btn btn-outline-info"{}>{}</button>
    <button id="themeToggle" class="btn btn-outline-secondary"><i class="{}"></i></button>
  </div>
</nav>
<div id="healthStatus">{}</div>
"#,
        disabled(page.health.checking),
        if page.health.checking {
            r#"<i class="fas fa-spinner fa-spin"></i> Checking..."#
        } else {
            r#"<i class="fas fa-heartbeat"></i> Check Status"#
        },
        page.theme.icon(),
        match &page.health.panel {
            Some(HealthPanel::Report(report)) => render_health(report),
            Some(HealthPanel::Error(message)) => render_error(message),
            None => String::new(),
        }
    );

    let drop_style = if page.drop_highlight {
        r#" style="border-color: var(--accent-primary); background-color: rgba(99, 102, 241, 0.1);""#
    } else {
        ""
    };
    let (preview_src, preview_info) = match &page.preview {
        Some(preview) => (escape_html(&preview.data_url), escape_html(&preview.info)),
        None => (String::new(), String::new()),
    };

    let _ = write!(
        html,
        r#"<section class="card glass"{}>
  <input type="file" id="imageInput" accept="image/*">
  <div id="previewWrap" class="{}">
    <img id="preview" src="{}" alt="Preview">
    <button id="removeImage" class="btn btn-sm btn-danger"><i class="fas fa-times"></i></button>
    <div id="imageInfo"><i class="fas fa-info-circle"></i> {}</div>
  </div>
  <textarea id="imgPrompt" maxlength="500">{}</textarea>
  <small><span id="charCount" class="{}">{}</span>/500</small>
  <button id="imgGenBtn" class="btn btn-primary"{}>{}</button>
  <button id="clearImgBtn" class="btn btn-outline-secondary">Clear</button>
  <div id="imgLoading" class="{}"><div class="spinner-border"></div></div>
  <div id="imgResult">{}</div>
</section>
"#,
        drop_style,
        hidden(page.preview.is_some()).trim_start(),
        preview_src,
        preview_info,
        escape_html(&page.image_prompt.value),
        counter_class(&page.image_prompt.counter).trim_start(),
        page.image_prompt.counter.count,
        disabled(page.image_flow.busy),
        page.image_flow.button_label(),
        hidden(page.image_flow.busy).trim_start(),
        page.image_flow
            .panel
            .as_ref()
            .map(render_inline_panel)
            .unwrap_or_default()
    );

    let _ = write!(
        html,
        r#"<section class="card">
  <textarea id="prompt" maxlength="500">{}</textarea>
  <small><span id="textCharCount" class="{}">{}</span>/500</small>
  <button id="genBtn" class="btn btn-success"{}>{}</button>
  <button id="clearTxtBtn" class="btn btn-outline-secondary">Clear</button>
  <div id="txtLoading" class="{}"><div class="spinner-border"></div></div>
  <div id="txtResult">{}</div>
</section>
"#,
        escape_html(&page.text_prompt.value),
        counter_class(&page.text_prompt.counter).trim_start(),
        page.text_prompt.counter.count,
        disabled(page.text_flow.busy),
        page.text_flow.button_label(),
        hidden(page.text_flow.busy).trim_start(),
        page.text_flow
            .panel
            .as_ref()
            .map(render_inline_panel)
            .unwrap_or_default()
    );

    let _ = write!(
        html,
        r#"<section class="card">
  <div class="d-flex justify-content-between">
    <h2>Results</h2>
    <button id="clearAllResults" class="btn btn-sm btn-outline-danger{}">Clear All</button>
  </div>
  <div id="resultsList">
{}
  </div>
</section>
</body>
</html>
"#,
        hidden(page.clear_all_visible()),
        render_results(&page.results)
    );

    html
}
