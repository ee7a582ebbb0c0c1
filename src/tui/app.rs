//! Main TUI application state and logic

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::prelude::*;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::api::{
    Category, ClassificationSuggestion, Priority, Status, Ticket, TicketApi, TicketDraft,
    TicketFilters, TicketPatch, TicketStats,
};
use crate::error::{Result, TicketError};
use crate::tui::event::{is_back_key, is_quit_key, AppEvent, EventHandler};
use crate::tui::ui;

/// Quiet period after the last description keystroke before classifying
pub const CLASSIFY_DEBOUNCE: Duration = Duration::from_millis(800);

/// Minimum trimmed description length before a classification is requested
pub const CLASSIFY_MIN_CHARS: usize = 20;

/// Message type for async operation results
#[derive(Debug)]
pub enum AsyncMessage {
    /// Ticket list loaded successfully
    TicketsLoaded {
        /// Fetch generation, for discarding stale responses
        generation: u64,
        tickets: Vec<Ticket>,
    },
    /// Ticket list load failed
    TicketsError { generation: u64, error: String },
    /// Stats loaded successfully
    StatsLoaded(Box<TicketStats>),
    /// Stats load failed
    StatsError(String),
    /// Ticket created successfully
    TicketCreated(Box<Ticket>),
    /// Ticket creation rejected by the server
    TicketCreateError(String),
    /// Ticket status updated successfully
    TicketUpdated(Box<Ticket>),
    /// Ticket status update failed
    TicketUpdateError(String),
    /// Classification suggestion arrived
    SuggestionReady {
        request_id: u64,
        suggestion: ClassificationSuggestion,
    },
    /// Classification failed (silent)
    SuggestionFailed { request_id: u64 },
}

/// Current screen in the TUI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    TicketList,
    TicketForm,
    Dashboard,
}

/// List selection state
#[derive(Debug, Default)]
pub struct ListState {
    /// Currently selected index
    pub selected: usize,
    /// Total items in the list
    pub total: usize,
}

impl ListState {
    pub fn new(total: usize) -> Self {
        Self { selected: 0, total }
    }

    pub fn next(&mut self) {
        if self.total > 0 {
            self.selected = (self.selected + 1) % self.total;
        }
    }

    pub fn previous(&mut self) {
        if self.total > 0 {
            self.selected = self.selected.checked_sub(1).unwrap_or(self.total - 1);
        }
    }
}

/// Error popup for displaying important errors that require user acknowledgment
#[derive(Debug, Clone)]
pub struct ErrorPopup {
    /// Title of the error popup (e.g., "Status Update Failed")
    pub title: String,
    /// The full error message to display
    pub message: String,
}

/// Submission form phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Idle,
    Classifying,
    Submitting,
}

/// Form fields, in tab order
pub const FORM_FIELD_TITLE: usize = 0;
pub const FORM_FIELD_DESCRIPTION: usize = 1;
pub const FORM_FIELD_CATEGORY: usize = 2;
pub const FORM_FIELD_PRIORITY: usize = 3;
pub const FORM_FIELD_SUBMIT: usize = 4;
const FORM_FIELD_COUNT: usize = 5;

/// State for the ticket submission form
///
/// Owns the classification debounce: every description edit re-arms a single
/// deadline, and each fired request carries an id so that only the most
/// recent response is ever applied.
#[derive(Debug)]
pub struct TicketForm {
    pub title: String,
    pub description: String,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub phase: FormPhase,
    pub suggestion: Option<ClassificationSuggestion>,
    pub error: Option<String>,
    /// Currently focused field
    pub field: usize,
    /// Pending debounce deadline, re-armed on every keystroke
    classify_deadline: Option<Instant>,
    /// Id of the most recently fired classification request
    classify_request_id: u64,
}

impl Default for TicketForm {
    fn default() -> Self {
        Self::new()
    }
}

impl TicketForm {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: None,
            priority: None,
            phase: FormPhase::Idle,
            suggestion: None,
            error: None,
            field: FORM_FIELD_TITLE,
            classify_deadline: None,
            classify_request_id: 0,
        }
    }

    /// Record a description edit: drop any pending suggestion and re-arm the
    /// debounce. Text under the length threshold disarms it entirely.
    pub fn note_description_changed(&mut self, now: Instant) {
        self.suggestion = None;
        if self.description.trim().chars().count() >= CLASSIFY_MIN_CHARS {
            self.classify_deadline = Some(now + CLASSIFY_DEBOUNCE);
        } else {
            self.classify_deadline = None;
        }
    }

    /// If the debounce deadline has passed, consume it and return the request
    /// id plus the text to classify. At most one request per quiet period.
    pub fn due_classification(&mut self, now: Instant) -> Option<(u64, String)> {
        match self.classify_deadline {
            Some(deadline) if now >= deadline => {
                self.classify_deadline = None;
                self.classify_request_id += 1;
                Some((self.classify_request_id, self.description.clone()))
            }
            _ => None,
        }
    }

    /// Apply a classification response. Stale responses (from an earlier
    /// request) are dropped, and fields the user already set are never
    /// overwritten.
    pub fn apply_suggestion(&mut self, request_id: u64, suggestion: ClassificationSuggestion) {
        if request_id != self.classify_request_id {
            return;
        }
        if self.category.is_none() {
            self.category = Some(suggestion.suggested_category);
        }
        if self.priority.is_none() {
            self.priority = Some(suggestion.suggested_priority);
        }
        self.suggestion = Some(suggestion);
    }

    /// Validate the form locally, producing the create payload
    pub fn validate(&self) -> std::result::Result<TicketDraft, String> {
        let (Some(category), Some(priority)) = (self.category, self.priority) else {
            return Err("Please select a category and priority".to_string());
        };
        Ok(TicketDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            category,
            priority,
        })
    }

    /// Reset to an empty form after a successful submission
    pub fn reset(&mut self) {
        let request_id = self.classify_request_id;
        *self = Self::new();
        // Invalidate any in-flight request so its response can never
        // repopulate the fresh form.
        self.classify_request_id = request_id + 1;
    }
}

/// Cycle an optional selection through all values and back to "unset"
fn cycle_selection<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(value) => match all.iter().position(|v| *v == value) {
            Some(i) if i + 1 < all.len() => Some(all[i + 1]),
            _ => None,
        },
    }
}

/// Main TUI application
///
/// Owns the ticket list, filter set, and stats; children only report events
/// back through [`AsyncMessage`], never mutate this state directly.
pub struct App {
    /// Whether the app is running
    pub running: bool,
    /// Current screen
    pub current_screen: Screen,
    /// Navigation history for back navigation
    pub navigation_stack: Vec<Screen>,
    /// Ticket API handle, shared with spawned tasks
    api: Arc<dyn TicketApi>,
    /// Status message to display
    pub status_message: Option<String>,
    /// Whether to show the help overlay
    pub show_help: bool,

    /// Sender for async messages (cloned into tasks)
    async_tx: mpsc::Sender<AsyncMessage>,
    /// Receiver for async messages
    async_rx: mpsc::Receiver<AsyncMessage>,

    // ─────────────────────────────────────────────────────────────────────────
    // Coordinator state: tickets, filters, stats
    // ─────────────────────────────────────────────────────────────────────────
    /// Cache of the last server query for the current filters
    pub tickets: Vec<Ticket>,
    /// Active filter set, applied server-side
    pub filters: TicketFilters,
    /// Last successfully loaded stats
    pub stats: Option<TicketStats>,
    /// Whether a ticket list fetch is in flight
    pub tickets_loading: bool,
    /// Whether the first list fetch has resolved
    pub tickets_fetched: bool,
    /// Whether a stats fetch is in flight
    pub stats_loading: bool,
    /// Whether the first stats fetch has resolved
    pub stats_fetched: bool,
    /// Fetch generation; responses from older fetches are discarded
    list_generation: u64,

    // ─────────────────────────────────────────────────────────────────────────
    // Ticket list screen
    // ─────────────────────────────────────────────────────────────────────────
    /// Ticket list selection
    pub list_selection: ListState,
    /// Id of the single expanded ticket, if any
    pub expanded_id: Option<u64>,
    /// Whether the search input captures keystrokes
    pub search_input_mode: bool,
    /// Whether the status picker popup is open
    pub status_picker_open: bool,
    /// Status picker selection
    pub status_picker_selection: ListState,
    /// Whether a status update is in flight
    pub ticket_updating: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Ticket form screen
    // ─────────────────────────────────────────────────────────────────────────
    pub form: TicketForm,

    /// Error popup to display (requires user dismissal)
    pub error_popup: Option<ErrorPopup>,
}

impl App {
    /// Create a new app instance over the given API client
    pub fn new(api: Arc<dyn TicketApi>) -> Self {
        let (async_tx, async_rx) = mpsc::channel(32);

        Self {
            running: true,
            current_screen: Screen::TicketList,
            navigation_stack: Vec::new(),
            api,
            status_message: None,
            show_help: false,

            async_tx,
            async_rx,

            tickets: Vec::new(),
            filters: TicketFilters::default(),
            stats: None,
            tickets_loading: false,
            tickets_fetched: false,
            stats_loading: false,
            stats_fetched: false,
            list_generation: 0,

            list_selection: ListState::default(),
            expanded_id: None,
            search_input_mode: false,
            status_picker_open: false,
            status_picker_selection: ListState::new(Status::all().len()),
            ticket_updating: false,

            form: TicketForm::new(),

            error_popup: None,
        }
    }

    /// True while the initial concurrent list+stats load has not resolved
    pub fn initial_loading(&self) -> bool {
        !self.tickets_fetched || !self.stats_fetched
    }

    /// Get the ticket under the list cursor
    pub fn selected_ticket(&self) -> Option<&Ticket> {
        self.tickets.get(self.list_selection.selected)
    }

    /// Setup terminal for TUI
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode().map_err(|e| TicketError::Terminal(e.to_string()))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen).map_err(|e| TicketError::Terminal(e.to_string()))?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend).map_err(|e| TicketError::Terminal(e.to_string()))?;
        Ok(terminal)
    }

    /// Restore terminal to normal state
    fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        disable_raw_mode().map_err(|e| TicketError::Terminal(e.to_string()))?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| TicketError::Terminal(e.to_string()))?;
        terminal
            .show_cursor()
            .map_err(|e| TicketError::Terminal(e.to_string()))?;
        Ok(())
    }

    /// Run the TUI application
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = Self::setup_terminal()?;
        let mut events = EventHandler::new(Duration::from_millis(250));

        // Initial load: tickets and stats fetch concurrently
        self.fetch_tickets();
        self.fetch_stats();

        while self.running {
            terminal
                .draw(|frame| ui::render(frame, self))
                .map_err(|e| TicketError::Terminal(e.to_string()))?;

            // Drain async messages (non-blocking)
            while let Ok(msg) = self.async_rx.try_recv() {
                self.handle_async_message(msg);
            }

            if let Some(event) = events.next().await {
                match event {
                    AppEvent::Key(key) => self.handle_key_event(key),
                    AppEvent::Resize(_, _) => {
                        // Handled automatically by ratatui
                    }
                    AppEvent::Tick => {
                        self.poll_classification(Instant::now());
                    }
                }
            }
        }

        Self::restore_terminal(&mut terminal)?;
        Ok(())
    }

    /// Handle async message from background tasks
    fn handle_async_message(&mut self, msg: AsyncMessage) {
        match msg {
            AsyncMessage::TicketsLoaded {
                generation,
                tickets,
            } => {
                if generation != self.list_generation {
                    // A newer fetch is in flight; this response is stale
                    return;
                }
                self.tickets = tickets;
                self.tickets_loading = false;
                self.tickets_fetched = true;
                self.list_selection = ListState::new(self.tickets.len());
                if self.tickets.is_empty() {
                    self.status_message = Some("No tickets found".to_string());
                } else {
                    self.status_message = Some(format!("Loaded {} tickets", self.tickets.len()));
                }
            }
            AsyncMessage::TicketsError { generation, error } => {
                if generation != self.list_generation {
                    return;
                }
                // Keep showing the last good list
                self.tickets_loading = false;
                self.tickets_fetched = true;
                tracing::warn!(error = %error, "ticket list load failed");
                self.status_message = Some(format!("Error loading tickets: {}", error));
            }
            AsyncMessage::StatsLoaded(stats) => {
                self.stats = Some(*stats);
                self.stats_loading = false;
                self.stats_fetched = true;
            }
            AsyncMessage::StatsError(error) => {
                self.stats_loading = false;
                self.stats_fetched = true;
                tracing::warn!(error = %error, "stats load failed");
            }
            AsyncMessage::TicketCreated(ticket) => {
                self.status_message = Some(format!("Ticket #{} created", ticket.id));
                self.form.reset();
                // New ticket goes to the front of the cached list; stats are
                // re-fetched rather than recomputed locally
                self.tickets.insert(0, *ticket);
                self.list_selection = ListState::new(self.tickets.len());
                self.fetch_stats();
                self.navigate_to(Screen::TicketList);
            }
            AsyncMessage::TicketCreateError(error) => {
                // Entered values are kept so nothing is lost on failure
                self.form.phase = FormPhase::Idle;
                self.form.error = Some(error);
            }
            AsyncMessage::TicketUpdated(ticket) => {
                self.ticket_updating = false;
                self.status_picker_open = false;
                self.status_message = Some(format!(
                    "Ticket #{} is now {}",
                    ticket.id,
                    ticket.status.display_name()
                ));
                if let Some(entry) = self.tickets.iter_mut().find(|t| t.id == ticket.id) {
                    *entry = *ticket;
                }
                self.fetch_stats();
            }
            AsyncMessage::TicketUpdateError(error) => {
                self.ticket_updating = false;
                self.status_picker_open = false;
                self.error_popup = Some(ErrorPopup {
                    title: "Status Update Failed".to_string(),
                    message: error,
                });
            }
            AsyncMessage::SuggestionReady {
                request_id,
                suggestion,
            } => {
                if self.form.phase == FormPhase::Classifying {
                    self.form.phase = FormPhase::Idle;
                }
                self.form.apply_suggestion(request_id, suggestion);
            }
            AsyncMessage::SuggestionFailed { request_id } => {
                // Classification failures never surface to the user
                tracing::debug!(request_id, "classification request failed");
                if self.form.phase == FormPhase::Classifying {
                    self.form.phase = FormPhase::Idle;
                }
            }
        }
    }

    /// Spawn a task to fetch the ticket list for the current filters
    pub fn fetch_tickets(&mut self) {
        // Every fetch gets a fresh generation; a response only applies if no
        // newer fetch was started meanwhile. Filter changes during an
        // in-flight request therefore never show stale results.
        self.list_generation += 1;
        let generation = self.list_generation;

        self.tickets_loading = true;

        let api = Arc::clone(&self.api);
        let filters = self.filters.clone();
        let tx = self.async_tx.clone();

        tokio::spawn(async move {
            match api.list_tickets(filters).await {
                Ok(tickets) => {
                    let _ = tx
                        .send(AsyncMessage::TicketsLoaded {
                            generation,
                            tickets,
                        })
                        .await;
                }
                Err(e) => {
                    let _ = tx
                        .send(AsyncMessage::TicketsError {
                            generation,
                            error: e.to_string(),
                        })
                        .await;
                }
            }
        });
    }

    /// Spawn a task to fetch stats
    pub fn fetch_stats(&mut self) {
        self.stats_loading = true;

        let api = Arc::clone(&self.api);
        let tx = self.async_tx.clone();

        tokio::spawn(async move {
            match api.fetch_stats().await {
                Ok(stats) => {
                    let _ = tx.send(AsyncMessage::StatsLoaded(Box::new(stats))).await;
                }
                Err(e) => {
                    let _ = tx.send(AsyncMessage::StatsError(e.to_string())).await;
                }
            }
        });
    }

    /// Submit the form, validating locally first
    fn submit_form(&mut self) {
        if self.form.phase == FormPhase::Submitting {
            return;
        }

        self.form.error = None;
        let draft = match self.form.validate() {
            Ok(draft) => draft,
            Err(message) => {
                // Local validation failure; the server is not contacted
                self.form.error = Some(message);
                return;
            }
        };

        self.form.phase = FormPhase::Submitting;
        // A classification firing mid-submission would clobber the phase
        self.form.classify_deadline = None;

        let api = Arc::clone(&self.api);
        let tx = self.async_tx.clone();

        tokio::spawn(async move {
            match api.create_ticket(draft).await {
                Ok(ticket) => {
                    let _ = tx.send(AsyncMessage::TicketCreated(Box::new(ticket))).await;
                }
                Err(e) => {
                    let _ = tx
                        .send(AsyncMessage::TicketCreateError(e.to_string()))
                        .await;
                }
            }
        });
    }

    /// Fire a due classification request, if any
    fn poll_classification(&mut self, now: Instant) {
        if self.form.phase == FormPhase::Submitting {
            return;
        }
        let Some((request_id, description)) = self.form.due_classification(now) else {
            return;
        };

        self.form.phase = FormPhase::Classifying;

        let api = Arc::clone(&self.api);
        let tx = self.async_tx.clone();

        tokio::spawn(async move {
            match api.classify(description).await {
                Ok(suggestion) => {
                    let _ = tx
                        .send(AsyncMessage::SuggestionReady {
                            request_id,
                            suggestion,
                        })
                        .await;
                }
                Err(_) => {
                    let _ = tx.send(AsyncMessage::SuggestionFailed { request_id }).await;
                }
            }
        });
    }

    /// PATCH the selected ticket to the given status
    fn change_selected_status(&mut self, status: Status) {
        if self.ticket_updating {
            return;
        }
        let Some(ticket) = self.selected_ticket() else {
            return;
        };
        let id = ticket.id;

        self.ticket_updating = true;
        self.status_message = Some(format!("Updating ticket #{}...", id));

        let api = Arc::clone(&self.api);
        let tx = self.async_tx.clone();

        tokio::spawn(async move {
            match api.update_ticket(id, TicketPatch::status(status)).await {
                Ok(ticket) => {
                    let _ = tx.send(AsyncMessage::TicketUpdated(Box::new(ticket))).await;
                }
                Err(e) => {
                    let _ = tx
                        .send(AsyncMessage::TicketUpdateError(e.to_string()))
                        .await;
                }
            }
        });
    }

    /// Toggle expansion for a ticket; expanding one collapses any other
    fn toggle_expanded(&mut self, id: u64) {
        self.expanded_id = if self.expanded_id == Some(id) {
            None
        } else {
            Some(id)
        };
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Key handling
    // ─────────────────────────────────────────────────────────────────────────

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        // If help is shown, any key dismisses it
        if self.show_help {
            self.show_help = false;
            return;
        }

        // If error popup is shown, only allow dismissal keys
        if self.error_popup.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
                self.error_popup = None;
            }
            return;
        }

        if self.search_input_mode {
            self.handle_search_key(key);
            return;
        }

        if self.status_picker_open {
            self.handle_status_picker_key(key);
            return;
        }

        // Form text fields capture raw input
        if self.current_screen == Screen::TicketForm {
            self.handle_form_key(key);
            return;
        }

        // Global key handlers
        if key.code == KeyCode::Char('?') {
            self.show_help = true;
            return;
        }

        if is_quit_key(&key) {
            if self.current_screen == Screen::TicketList {
                self.quit();
            } else {
                self.go_back();
            }
            return;
        }

        if is_back_key(&key) {
            self.go_back();
            return;
        }

        match self.current_screen {
            Screen::TicketList => self.handle_list_key(key),
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::TicketForm => unreachable!(),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.list_selection.next(),
            KeyCode::Char('k') | KeyCode::Up => self.list_selection.previous(),
            KeyCode::Enter => {
                if let Some(ticket) = self.selected_ticket() {
                    let id = ticket.id;
                    self.toggle_expanded(id);
                }
            }
            KeyCode::Char('s') => {
                if let Some(ticket) = self.selected_ticket() {
                    let current = ticket.status;
                    self.status_picker_selection = ListState::new(Status::all().len());
                    self.status_picker_selection.selected = Status::all()
                        .iter()
                        .position(|s| *s == current)
                        .unwrap_or(0);
                    self.status_picker_open = true;
                }
            }
            KeyCode::Char('/') => {
                self.search_input_mode = true;
            }
            KeyCode::Char('c') => {
                self.filters.category = cycle_selection(Category::all(), self.filters.category);
                self.fetch_tickets();
            }
            KeyCode::Char('p') => {
                self.filters.priority = cycle_selection(Priority::all(), self.filters.priority);
                self.fetch_tickets();
            }
            KeyCode::Char('f') => {
                self.filters.status = cycle_selection(Status::all(), self.filters.status);
                self.fetch_tickets();
            }
            KeyCode::Char('x') => {
                if !self.filters.is_empty() {
                    self.filters = TicketFilters::default();
                    self.fetch_tickets();
                }
            }
            KeyCode::Char('r') => {
                self.fetch_tickets();
                self.fetch_stats();
            }
            KeyCode::Char('n') => self.navigate_to(Screen::TicketForm),
            KeyCode::Char('d') => self.navigate_to(Screen::Dashboard),
            _ => {}
        }
    }

    /// Search input: every keystroke is forwarded to the coordinator, which
    /// re-fetches; there is no debounce on list filters
    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => {
                self.search_input_mode = false;
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.filters
                    .search
                    .get_or_insert_with(String::new)
                    .push(c);
                self.fetch_tickets();
            }
            KeyCode::Backspace => {
                if let Some(search) = &mut self.filters.search {
                    search.pop();
                    if search.is_empty() {
                        self.filters.search = None;
                    }
                    self.fetch_tickets();
                }
            }
            _ => {}
        }
    }

    fn handle_status_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.status_picker_open = false;
            }
            KeyCode::Char('j') | KeyCode::Down => self.status_picker_selection.next(),
            KeyCode::Char('k') | KeyCode::Up => self.status_picker_selection.previous(),
            KeyCode::Enter => {
                if let Some(status) = Status::all().get(self.status_picker_selection.selected) {
                    self.change_selected_status(*status);
                }
            }
            _ => {}
        }
    }

    /// Handle key events for the submission form
    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.go_back();
            }
            KeyCode::Tab | KeyCode::Down => {
                self.form.field = (self.form.field + 1) % FORM_FIELD_COUNT;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.form.field = self
                    .form
                    .field
                    .checked_sub(1)
                    .unwrap_or(FORM_FIELD_COUNT - 1);
            }
            KeyCode::Enter => match self.form.field {
                FORM_FIELD_SUBMIT => self.submit_form(),
                _ => self.form.field = (self.form.field + 1) % FORM_FIELD_COUNT,
            },
            KeyCode::Char(' ') | KeyCode::Right
                if self.form.field == FORM_FIELD_CATEGORY =>
            {
                self.form.category = cycle_selection(Category::all(), self.form.category);
            }
            KeyCode::Char(' ') | KeyCode::Right
                if self.form.field == FORM_FIELD_PRIORITY =>
            {
                self.form.priority = cycle_selection(Priority::all(), self.form.priority);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                match self.form.field {
                    FORM_FIELD_TITLE => self.form.title.push(c),
                    FORM_FIELD_DESCRIPTION => {
                        self.form.description.push(c);
                        self.form.note_description_changed(Instant::now());
                    }
                    _ => {}
                }
            }
            KeyCode::Backspace => match self.form.field {
                FORM_FIELD_TITLE => {
                    self.form.title.pop();
                }
                FORM_FIELD_DESCRIPTION => {
                    self.form.description.pop();
                    self.form.note_description_changed(Instant::now());
                }
                _ => {}
            },
            _ => {}
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('r') => self.fetch_stats(),
            KeyCode::Char('n') => self.navigate_to(Screen::TicketForm),
            _ => {}
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    fn navigate_to(&mut self, screen: Screen) {
        if screen == self.current_screen {
            return;
        }
        self.navigation_stack.push(self.current_screen);
        self.current_screen = screen;
    }

    fn go_back(&mut self) {
        if let Some(screen) = self.navigation_stack.pop() {
            self.current_screen = screen;
        } else {
            self.current_screen = Screen::TicketList;
        }
    }

    fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::MockTicketApi;
    use chrono::Utc;
    use mockall::predicate;
    use std::time::Duration as StdDuration;

    fn sample_ticket(id: u64) -> Ticket {
        Ticket {
            id,
            title: format!("Ticket {}", id),
            description: "The invoice total does not match the order".to_string(),
            category: Category::Billing,
            priority: Priority::Medium,
            status: Status::Open,
            created_at: Utc::now(),
        }
    }

    fn app_with(api: MockTicketApi) -> App {
        App::new(Arc::new(api))
    }

    async fn next_message(app: &mut App) -> AsyncMessage {
        tokio::time::timeout(StdDuration::from_secs(1), app.async_rx.recv())
            .await
            .expect("timed out waiting for async message")
            .expect("channel closed")
    }

    // ─── Debounce ────────────────────────────────────────────────────────────

    #[test]
    fn short_description_never_arms_classification() {
        let mut form = TicketForm::new();
        let t0 = Instant::now();

        form.description = "too short".to_string();
        form.note_description_changed(t0);

        assert_eq!(form.due_classification(t0 + CLASSIFY_DEBOUNCE * 2), None);
    }

    #[test]
    fn classification_fires_once_after_quiet_period() {
        let mut form = TicketForm::new();
        let t0 = Instant::now();

        form.description = "My payment was charged twice this month".to_string();
        form.note_description_changed(t0);

        // Still inside the debounce window
        assert_eq!(form.due_classification(t0 + StdDuration::from_millis(500)), None);

        let fired = form.due_classification(t0 + CLASSIFY_DEBOUNCE);
        assert!(fired.is_some());

        // Consumed; no second request until the next edit
        assert_eq!(form.due_classification(t0 + CLASSIFY_DEBOUNCE * 3), None);
    }

    #[test]
    fn keystrokes_restart_the_debounce_window() {
        let mut form = TicketForm::new();
        let t0 = Instant::now();

        form.description = "The dashboard crashes on every login attempt".to_string();
        form.note_description_changed(t0);

        // A keystroke at 700ms pushes the deadline out
        let t1 = t0 + StdDuration::from_millis(700);
        form.note_description_changed(t1);

        assert_eq!(form.due_classification(t0 + CLASSIFY_DEBOUNCE), None);
        assert!(form.due_classification(t1 + CLASSIFY_DEBOUNCE).is_some());
    }

    #[test]
    fn editing_clears_pending_suggestion() {
        let mut form = TicketForm::new();
        form.suggestion = Some(ClassificationSuggestion {
            suggested_category: Category::Billing,
            suggested_priority: Priority::High,
        });

        form.description = "short".to_string();
        form.note_description_changed(Instant::now());

        assert!(form.suggestion.is_none());
    }

    // ─── Suggestion merge ────────────────────────────────────────────────────

    #[test]
    fn suggestion_never_overwrites_user_choice() {
        let mut form = TicketForm::new();
        form.priority = Some(Priority::Low);
        form.description = "Please review my subscription invoice charges".to_string();
        let t0 = Instant::now();
        form.note_description_changed(t0);
        let (request_id, _) = form.due_classification(t0 + CLASSIFY_DEBOUNCE).unwrap();

        form.apply_suggestion(
            request_id,
            ClassificationSuggestion {
                suggested_category: Category::Billing,
                suggested_priority: Priority::High,
            },
        );

        // Fill-if-empty: category was unset, priority was user-chosen
        assert_eq!(form.category, Some(Category::Billing));
        assert_eq!(form.priority, Some(Priority::Low));
    }

    #[test]
    fn stale_suggestion_is_dropped() {
        let mut form = TicketForm::new();
        form.description = "Cannot reset my password from the account page".to_string();
        let t0 = Instant::now();
        form.note_description_changed(t0);
        let (old_id, _) = form.due_classification(t0 + CLASSIFY_DEBOUNCE).unwrap();

        // Another edit and fire supersedes the first request
        form.note_description_changed(t0 + CLASSIFY_DEBOUNCE);
        form.due_classification(t0 + CLASSIFY_DEBOUNCE * 2).unwrap();

        form.apply_suggestion(
            old_id,
            ClassificationSuggestion {
                suggested_category: Category::Account,
                suggested_priority: Priority::Critical,
            },
        );

        assert_eq!(form.category, None);
        assert_eq!(form.priority, None);
        assert!(form.suggestion.is_none());
    }

    #[test]
    fn reset_invalidates_in_flight_classification() {
        let mut form = TicketForm::new();
        form.description = "The exported report is missing last month's rows".to_string();
        let t0 = Instant::now();
        form.note_description_changed(t0);
        let (request_id, _) = form.due_classification(t0 + CLASSIFY_DEBOUNCE).unwrap();

        // Form resets (successful create) while the response is in flight
        form.reset();
        form.apply_suggestion(
            request_id,
            ClassificationSuggestion {
                suggested_category: Category::Billing,
                suggested_priority: Priority::High,
            },
        );

        assert_eq!(form.category, None);
        assert_eq!(form.priority, None);
        assert!(form.suggestion.is_none());
    }

    // ─── Submission ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn submit_without_selection_is_rejected_locally() {
        // No expectations: any API call would panic the mock
        let mut app = app_with(MockTicketApi::new());
        app.form.title = "Broken printer".to_string();
        app.form.description = "It will not print".to_string();

        app.submit_form();

        assert_eq!(
            app.form.error.as_deref(),
            Some("Please select a category and priority")
        );
        assert_eq!(app.form.phase, FormPhase::Idle);
    }

    #[tokio::test]
    async fn successful_creation_resets_form_and_prepends_ticket() {
        let mut api = MockTicketApi::new();
        api.expect_create_ticket()
            .withf(|draft: &TicketDraft| {
                draft.title == "Login broken" && draft.category == Category::Technical
            })
            .returning(|_| Ok(sample_ticket(7)));
        api.expect_fetch_stats()
            .returning(|| Ok(TicketStats::default()));

        let mut app = app_with(api);
        app.tickets.push(sample_ticket(1));
        app.form.title = "Login broken".to_string();
        app.form.description = "500 on every login".to_string();
        app.form.category = Some(Category::Technical);
        app.form.priority = Some(Priority::High);

        app.submit_form();
        assert_eq!(app.form.phase, FormPhase::Submitting);

        let msg = next_message(&mut app).await;
        app.handle_async_message(msg);

        assert!(app.form.title.is_empty());
        assert!(app.form.description.is_empty());
        assert_eq!(app.form.category, None);
        assert_eq!(app.form.priority, None);
        assert_eq!(app.tickets.len(), 2);
        assert_eq!(app.tickets[0].id, 7);
    }

    #[tokio::test]
    async fn rejected_creation_keeps_entered_values() {
        let mut api = MockTicketApi::new();
        api.expect_create_ticket()
            .returning(|_| Err(TicketError::Validation(r#"{"title":["too long"]}"#.into())));

        let mut app = app_with(api);
        app.form.title = "A very long title".to_string();
        app.form.description = "details".to_string();
        app.form.category = Some(Category::General);
        app.form.priority = Some(Priority::Low);

        app.submit_form();
        let msg = next_message(&mut app).await;
        app.handle_async_message(msg);

        assert_eq!(app.form.phase, FormPhase::Idle);
        assert_eq!(app.form.error.as_deref(), Some(r#"{"title":["too long"]}"#));
        assert_eq!(app.form.title, "A very long title");
        assert_eq!(app.form.category, Some(Category::General));
    }

    #[tokio::test]
    async fn submission_disarms_pending_classification() {
        // No classify expectation: firing one would panic the mock
        let mut api = MockTicketApi::new();
        api.expect_create_ticket()
            .returning(|_| Ok(sample_ticket(9)));
        api.expect_fetch_stats()
            .returning(|| Ok(TicketStats::default()));

        let mut app = app_with(api);
        app.form.title = "Slow exports".to_string();
        app.form.description = "Report generation takes over ten minutes".to_string();
        app.form.category = Some(Category::Technical);
        app.form.priority = Some(Priority::Medium);
        let t0 = Instant::now();
        app.form.note_description_changed(t0);

        app.submit_form();
        app.poll_classification(t0 + CLASSIFY_DEBOUNCE);

        // A tick after the old deadline must not flip the phase away from
        // Submitting, or Enter could create the ticket twice
        assert_eq!(app.form.phase, FormPhase::Submitting);
    }

    // ─── Coordinator ─────────────────────────────────────────────────────────

    #[tokio::test]
    async fn filter_fetch_passes_current_filters() {
        let mut api = MockTicketApi::new();
        api.expect_list_tickets()
            .with(predicate::eq(TicketFilters {
                priority: Some(Priority::High),
                ..Default::default()
            }))
            .returning(|_| Ok(vec![sample_ticket(3)]));

        let mut app = app_with(api);
        app.filters.priority = Some(Priority::High);
        app.fetch_tickets();

        let msg = next_message(&mut app).await;
        app.handle_async_message(msg);

        assert_eq!(app.tickets.len(), 1);
        assert!(app.tickets_fetched);
    }

    #[tokio::test]
    async fn stale_list_response_is_discarded() {
        let mut api = MockTicketApi::new();
        api.expect_list_tickets()
            .times(2)
            .returning(|filters| {
                if filters.is_empty() {
                    Ok(vec![sample_ticket(1), sample_ticket(2)])
                } else {
                    Ok(vec![sample_ticket(2)])
                }
            });

        let mut app = app_with(api);
        app.fetch_tickets();
        let first = next_message(&mut app).await;

        // Filter change starts a newer fetch before the first is applied
        app.filters.status = Some(Status::Open);
        app.fetch_tickets();
        let second = next_message(&mut app).await;

        app.handle_async_message(second);
        app.handle_async_message(first);

        // The older (unfiltered, 2-ticket) response must not clobber the newer one
        assert_eq!(app.tickets.len(), 1);
        assert_eq!(app.tickets[0].id, 2);
    }

    #[tokio::test]
    async fn list_error_keeps_previous_tickets() {
        let mut api = MockTicketApi::new();
        api.expect_list_tickets()
            .returning(|_| Err(TicketError::Network("connection refused".into())));

        let mut app = app_with(api);
        app.tickets = vec![sample_ticket(1)];
        app.fetch_tickets();

        let msg = next_message(&mut app).await;
        app.handle_async_message(msg);

        assert_eq!(app.tickets.len(), 1);
        assert!(!app.tickets_loading);
        assert!(app.error_popup.is_none());
    }

    #[tokio::test]
    async fn status_update_replaces_ticket_by_id() {
        let mut api = MockTicketApi::new();
        api.expect_update_ticket()
            .withf(|id, patch| *id == 2 && patch.status == Some(Status::Resolved))
            .returning(|id, _| {
                let mut ticket = sample_ticket(id);
                ticket.status = Status::Resolved;
                Ok(ticket)
            });
        api.expect_fetch_stats()
            .returning(|| Ok(TicketStats::default()));

        let mut app = app_with(api);
        app.tickets = vec![sample_ticket(1), sample_ticket(2)];
        app.list_selection = ListState::new(2);
        app.list_selection.selected = 1;

        app.change_selected_status(Status::Resolved);
        let msg = next_message(&mut app).await;
        app.handle_async_message(msg);

        assert_eq!(app.tickets[1].status, Status::Resolved);
        assert_eq!(app.tickets[0].status, Status::Open);
    }

    #[tokio::test]
    async fn failed_status_update_leaves_list_unchanged() {
        let mut api = MockTicketApi::new();
        api.expect_update_ticket()
            .returning(|_, _| Err(TicketError::Network("502 Bad Gateway".into())));

        let mut app = app_with(api);
        app.tickets = vec![sample_ticket(1)];
        app.list_selection = ListState::new(1);

        app.change_selected_status(Status::Closed);
        let msg = next_message(&mut app).await;
        app.handle_async_message(msg);

        // No optimistic update: the entry still shows the server's state,
        // and the failure is a blocking notice
        assert_eq!(app.tickets[0].status, Status::Open);
        assert!(app.error_popup.is_some());
    }

    #[tokio::test]
    async fn classification_failure_is_silent() {
        let mut api = MockTicketApi::new();
        api.expect_classify()
            .returning(|_| Err(TicketError::Classification("503".into())));

        let mut app = app_with(api);
        app.form.description = "Everything is down and nobody can work".to_string();
        let t0 = Instant::now();
        app.form.note_description_changed(t0);
        app.poll_classification(t0 + CLASSIFY_DEBOUNCE);
        assert_eq!(app.form.phase, FormPhase::Classifying);

        let msg = next_message(&mut app).await;
        app.handle_async_message(msg);

        assert_eq!(app.form.phase, FormPhase::Idle);
        assert!(app.form.error.is_none());
        assert!(app.error_popup.is_none());
        assert!(app.form.suggestion.is_none());
    }

    // ─── List interactions ───────────────────────────────────────────────────

    #[test]
    fn expanding_a_second_ticket_collapses_the_first() {
        let mut app = app_with(MockTicketApi::new());

        app.toggle_expanded(1);
        assert_eq!(app.expanded_id, Some(1));

        app.toggle_expanded(2);
        assert_eq!(app.expanded_id, Some(2));

        app.toggle_expanded(2);
        assert_eq!(app.expanded_id, None);
    }

    #[test]
    fn control_chords_do_not_edit_text_fields() {
        let mut app = app_with(MockTicketApi::new());

        app.navigate_to(Screen::TicketForm);
        app.handle_form_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.form.title.is_empty());

        app.current_screen = Screen::TicketList;
        app.search_input_mode = true;
        app.filters.search = Some("print".to_string());
        app.handle_search_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::CONTROL));
        assert_eq!(app.filters.search.as_deref(), Some("print"));
    }

    #[test]
    fn cycle_selection_walks_all_values_and_clears() {
        let mut current: Option<Priority> = None;
        for expected in Priority::all() {
            current = cycle_selection(Priority::all(), current);
            assert_eq!(current, Some(*expected));
        }
        assert_eq!(cycle_selection(Priority::all(), current), None);
    }

    #[test]
    fn initial_loading_requires_both_fetches() {
        let mut app = app_with(MockTicketApi::new());
        assert!(app.initial_loading());

        app.tickets_fetched = true;
        assert!(app.initial_loading());

        app.stats_fetched = true;
        assert!(!app.initial_loading());
    }
}
