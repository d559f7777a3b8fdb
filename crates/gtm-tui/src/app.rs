use std::path::PathBuf;
use std::sync::Arc;

use gtm_core::api::{AskResponse, DealScore, GtmApi, KnowledgeStats, OutreachResult, ServiceInfo};
use gtm_core::error::{ApiError, Result as ApiResult};
use gtm_core::state::{ChatSession, DealSession, FormField, OutreachSession, EXAMPLE_QUESTIONS};
use gtm_core::Channel;
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    AskGtm,
    DealSense,
    Outreach,
}

impl Screen {
    pub fn tools() -> [Screen; 3] {
        [Screen::DealSense, Screen::AskGtm, Screen::Outreach]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Dashboard => "Dashboard",
            Screen::AskGtm => "AskGTM AI",
            Screen::DealSense => "DealSense AI",
            Screen::Outreach => "OutreachAI",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Screen::Dashboard => "AI-powered tools for GTM teams",
            Screen::AskGtm => "RAG-powered GTM knowledge assistant",
            Screen::DealSense => "Pipeline forecasting + AI deal scoring",
            Screen::Outreach => "Multi-channel engagement automation",
        }
    }

    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Screen::Dashboard => &[],
            Screen::AskGtm => &["Instant answers", "Source citations", "Conversation memory"],
            Screen::DealSense => &["Deal probability scoring", "Risk detection", "Next-best actions"],
            Screen::Outreach => &["Personalized outreach", "Multi-channel", "A/B testing"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Focusable rows of the outreach form, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutreachFocus {
    Channel,
    Field(FormField),
    Generate,
}

impl OutreachFocus {
    pub fn all() -> Vec<OutreachFocus> {
        let mut rows = vec![OutreachFocus::Channel];
        rows.extend(FormField::all().into_iter().map(OutreachFocus::Field));
        rows.push(OutreachFocus::Generate);
        rows
    }
}

type Task<T> = Option<JoinHandle<ApiResult<T>>>;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,
    pub api: Arc<dyn GtmApi>,
    pub api_url: String,

    // Dashboard
    pub dashboard_state: ListState,
    pub service_info: Option<ServiceInfo>,
    pub info_task: Task<ServiceInfo>,

    // AskGTM
    pub chat: ChatSession,
    pub chat_input: String,
    pub chat_cursor: usize,
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub example_state: ListState,
    pub ask_task: Task<AskResponse>,
    pub reset_task: Task<()>,
    pub stats_task: Task<KnowledgeStats>,

    // DealSense
    pub deals: DealSession,
    pub deal_path_input: String,
    pub deal_cursor: usize,
    pub deal_scroll: u16,
    pub high_risk_only: bool,
    pub deal_task: Task<Vec<DealScore>>,

    // OutreachAI
    pub outreach: OutreachSession,
    pub outreach_focus: usize,
    pub field_cursor: usize,
    pub outreach_scroll: u16,
    pub outreach_task: Task<OutreachResult>,
    pub copied_ticks: u8,

    // Last failure, shown in the footer until the next action
    pub status: Option<String>,

    // Animation state
    pub animation_frame: u8,

    // Panel area for mouse scrolling (updated during render)
    pub scroll_area: Option<Rect>,
}

impl App {
    pub fn new(api: Arc<dyn GtmApi>, api_url: String, default_channel: Option<Channel>) -> Self {
        let mut dashboard_state = ListState::default();
        dashboard_state.select(Some(0));

        let mut example_state = ListState::default();
        example_state.select(Some(0));

        let mut outreach = OutreachSession::new();
        outreach.form.channel = default_channel.unwrap_or_default();

        Self {
            should_quit: false,
            screen: Screen::Dashboard,
            input_mode: InputMode::Normal,
            api,
            api_url,

            dashboard_state,
            service_info: None,
            info_task: None,

            chat: ChatSession::new(),
            chat_input: String::new(),
            chat_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            example_state,
            ask_task: None,
            reset_task: None,
            stats_task: None,

            deals: DealSession::new(),
            deal_path_input: String::new(),
            deal_cursor: 0,
            deal_scroll: 0,
            high_risk_only: false,
            deal_task: None,

            outreach,
            outreach_focus: 0,
            field_cursor: 0,
            outreach_scroll: 0,
            outreach_task: None,
            copied_ticks: 0,

            status: None,
            animation_frame: 0,
            scroll_area: None,
        }
    }

    /// Kick off the background fetches the dashboard and chat header show.
    pub fn start(&mut self) {
        let api = self.api.clone();
        self.info_task = Some(tokio::spawn(async move { api.service_info().await }));
        self.refresh_stats();
    }

    pub fn refresh_stats(&mut self) {
        if self.stats_task.is_some() {
            return;
        }
        let api = self.api.clone();
        self.stats_task = Some(tokio::spawn(async move { api.stats().await }));
    }

    pub fn open(&mut self, screen: Screen) {
        self.screen = screen;
        self.input_mode = InputMode::Normal;
        if screen == Screen::Outreach {
            self.sync_field_cursor();
        }
    }

    pub fn selected_tool(&self) -> Screen {
        let tools = Screen::tools();
        let i = self.dashboard_state.selected().unwrap_or(0);
        tools[i.min(tools.len() - 1)]
    }

    pub fn dashboard_down(&mut self) {
        let i = self.dashboard_state.selected().unwrap_or(0);
        self.dashboard_state
            .select(Some((i + 1).min(Screen::tools().len() - 1)));
    }

    pub fn dashboard_up(&mut self) {
        let i = self.dashboard_state.selected().unwrap_or(0);
        self.dashboard_state.select(Some(i.saturating_sub(1)));
    }

    // AskGTM actions

    pub fn submit_question(&mut self) {
        // A question sent now would be wiped when the pending reset lands
        if self.reset_task.is_some() {
            return;
        }
        let Some(question) = self.chat.begin_ask(&self.chat_input) else {
            return;
        };
        self.status = None;
        self.chat_input.clear();
        self.chat_cursor = 0;
        self.scroll_chat_to_bottom();

        let api = self.api.clone();
        self.ask_task = Some(tokio::spawn(async move { api.ask(&question).await }));
    }

    pub fn reset_chat(&mut self) {
        if self.reset_task.is_some() {
            return;
        }
        // Drop any in-flight answer so it cannot land after the reset
        if let Some(task) = self.ask_task.take() {
            task.abort();
        }
        self.chat.loading = false;

        let api = self.api.clone();
        self.reset_task = Some(tokio::spawn(async move { api.reset().await }));
    }

    pub fn example_down(&mut self) {
        let i = self.example_state.selected().unwrap_or(0);
        self.example_state
            .select(Some((i + 1).min(EXAMPLE_QUESTIONS.len() - 1)));
    }

    pub fn example_up(&mut self) {
        let i = self.example_state.selected().unwrap_or(0);
        self.example_state.select(Some(i.saturating_sub(1)));
    }

    /// Put the highlighted example question into the input line
    pub fn use_example(&mut self) {
        if let Some(question) = self
            .example_state
            .selected()
            .and_then(|i| EXAMPLE_QUESTIONS.get(i))
        {
            self.chat_input = question.to_string();
            self.chat_cursor = self.chat_input.chars().count();
        }
    }

    /// Scroll chat so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let wrapped = |text: &str| -> usize { text.chars().count() / wrap_width + 1 };

        let mut total_lines: usize = 0;
        for msg in &self.chat.messages {
            total_lines += 1; // Role line
            for line in msg.content.lines() {
                total_lines += wrapped(line);
            }
            let citations = msg.citations();
            if !citations.is_empty() {
                total_lines += 2; // Blank + "Sources:"
                for source in citations {
                    total_lines += 1 + wrapped(&source.content);
                }
            }
            total_lines += 1; // Blank line after message
        }

        if self.chat.loading {
            total_lines += 2; // "AI:" + "Thinking..."
        }

        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };

        self.chat_scroll = u16::try_from(total_lines)
            .unwrap_or(u16::MAX)
            .saturating_sub(visible_height);
    }

    // DealSense actions

    /// Upload the typed path. Nothing is sent when the path is blank.
    pub fn submit_upload(&mut self) {
        self.deals.select_file(&self.deal_path_input);
        let Some(path) = self.deals.begin_upload() else {
            if self.deals.file.is_none() {
                self.status = Some("Select a CSV file first".to_string());
            }
            return;
        };
        self.status = None;
        self.deal_scroll = 0;
        self.spawn_upload(path);
    }

    fn spawn_upload(&mut self, path: PathBuf) {
        let api = self.api.clone();
        self.deal_task = Some(tokio::spawn(async move { api.analyze_csv(&path).await }));
    }

    pub fn visible_deals(&self) -> Vec<&DealScore> {
        if self.high_risk_only {
            self.deals.high_risk()
        } else {
            self.deals.results.iter().collect()
        }
    }

    // OutreachAI actions

    pub fn focused_row(&self) -> OutreachFocus {
        let rows = OutreachFocus::all();
        rows[self.outreach_focus.min(rows.len() - 1)]
    }

    pub fn focused_field(&self) -> Option<FormField> {
        match self.focused_row() {
            OutreachFocus::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn outreach_focus_down(&mut self) {
        self.outreach_focus = (self.outreach_focus + 1).min(OutreachFocus::all().len() - 1);
        self.sync_field_cursor();
    }

    pub fn outreach_focus_up(&mut self) {
        self.outreach_focus = self.outreach_focus.saturating_sub(1);
        self.sync_field_cursor();
    }

    /// Place the cursor at the end of the newly focused field
    fn sync_field_cursor(&mut self) {
        self.field_cursor = self
            .focused_field()
            .map(|field| self.outreach.form.field(field).chars().count())
            .unwrap_or(0);
    }

    pub fn next_channel(&mut self) {
        self.outreach.form.channel = self.outreach.form.channel.next();
    }

    pub fn prev_channel(&mut self) {
        self.outreach.form.channel = self.outreach.form.channel.prev();
    }

    pub fn submit_generate(&mut self) {
        let Some(request) = self.outreach.begin_generate() else {
            if !self.outreach.form.is_valid() {
                let missing: Vec<&str> = self
                    .outreach
                    .form
                    .missing_fields()
                    .iter()
                    .map(|field| field.label())
                    .collect();
                self.status = Some(format!("Required: {}", missing.join(", ")));
            }
            return;
        };
        self.status = None;
        self.outreach_scroll = 0;

        let api = self.api.clone();
        self.outreach_task = Some(tokio::spawn(async move { api.generate(&request).await }));
    }

    pub fn copy_outreach(&mut self) {
        if let Some(text) = self.outreach.copy_text() {
            if crate::clipboard::copy(&text) {
                // Roughly two seconds at the 300ms tick rate
                self.copied_ticks = 7;
            } else {
                self.status = Some("No clipboard tool found (pbcopy, wl-copy, xclip)".to_string());
            }
        }
    }

    // Background work

    pub fn is_busy(&self) -> bool {
        self.info_task.is_some()
            || self.stats_task.is_some()
            || self.ask_task.is_some()
            || self.reset_task.is_some()
            || self.deal_task.is_some()
            || self.outreach_task.is_some()
    }

    /// Collect every request task that has finished and apply its result.
    pub async fn poll_tasks(&mut self) {
        if let Some(result) = take_finished(&mut self.info_task).await {
            match result {
                Ok(info) => self.service_info = Some(info),
                Err(e) => tracing::warn!("GTM API unreachable at {}: {}", self.api_url, e),
            }
        }

        if let Some(result) = take_finished(&mut self.stats_task).await {
            match result {
                Ok(stats) => self.chat.stats = Some(stats),
                Err(e) => tracing::error!("Error fetching stats: {}", e),
            }
        }

        if let Some(result) = take_finished(&mut self.ask_task).await {
            self.chat.finish_ask(result);
            self.scroll_chat_to_bottom();
        }

        if let Some(result) = take_finished(&mut self.reset_task).await {
            self.chat.clear();
            self.chat_scroll = 0;
            if let Err(e) = result {
                tracing::error!("Error resetting conversation: {}", e);
                self.status = Some(format!("Reset failed: {}", e));
            }
        }

        if let Some(result) = take_finished(&mut self.deal_task).await {
            if let Err(e) = &result {
                self.status = Some(format!("Analysis failed: {}", e));
            }
            self.deals.finish_upload(result);
        }

        if let Some(result) = take_finished(&mut self.outreach_task).await {
            if let Err(e) = &result {
                self.status = Some(format!("Generation failed: {}", e));
            }
            self.outreach.finish_generate(result);
        }
    }

    pub fn tick(&mut self) {
        if self.chat.loading || self.deals.loading || self.outreach.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
        self.copied_ticks = self.copied_ticks.saturating_sub(1);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        match self.screen {
            Screen::AskGtm => self.chat_scroll = self.chat_scroll.saturating_add(lines),
            Screen::DealSense => self.deal_scroll = self.deal_scroll.saturating_add(lines),
            Screen::Outreach => self.outreach_scroll = self.outreach_scroll.saturating_add(lines),
            Screen::Dashboard => {}
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.screen {
            Screen::AskGtm => self.chat_scroll = self.chat_scroll.saturating_sub(lines),
            Screen::DealSense => self.deal_scroll = self.deal_scroll.saturating_sub(lines),
            Screen::Outreach => self.outreach_scroll = self.outreach_scroll.saturating_sub(lines),
            Screen::Dashboard => {}
        }
    }
}

/// Take a task out of its slot once it has finished.
async fn take_finished<T>(slot: &mut Task<T>) -> Option<ApiResult<T>> {
    if !slot.as_ref().is_some_and(|handle| handle.is_finished()) {
        return None;
    }
    let handle = slot.take()?;
    Some(
        handle
            .await
            .unwrap_or_else(|e| Err(ApiError::TaskFailed(e.to_string()))),
    )
}
