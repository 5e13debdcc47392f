use std::collections::VecDeque;
use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use log::{debug, error, info, warn};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;
use tui_widgets::popup::PopupState;

use crate::api::{self, ApiError, Contact, KeyStatus, Outcome, Request, Response};
use crate::config::{Config, UiColors};
use crate::session::SessionStore;
use crate::validation;

use super::draw;
use super::form::ContactFormState;
use super::list::ContactList;
use super::view::{Router, View};
use super::worker::{Job, Worker};

const INVALID_KEY_MESSAGE: &str = "Invalid API key entered! Please try again.";
const BUSY_MESSAGE: &str = "Busy... wait for the current request to finish";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmModal {
    pub title: String,
    pub message: String,
    pub action: ConfirmAction,
}

/// Action to perform when confirm modal is accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    DeleteContact(String),
    LogOut,
}

/// Blocking message the user has to dismiss.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InFlight {
    ticket: u64,
    label: &'static str,
}

pub struct App {
    config: Config,
    pub session: SessionStore,
    pub router: Router,
    pub list: ContactList,
    pub form: ContactFormState,
    pub key_input: Input,
    /// Inline error under the key input
    pub key_error: Option<String>,
    pub search_input: Input,
    pub search_active: bool,
    pub confirm_modal: Option<ConfirmModal>,
    pub notice: Option<Notice>,
    // Popup state for modal dialog (tui-widgets popup)
    pub modal_popup: PopupState,
    pub status: Option<String>,
    in_flight: Option<InFlight>,
    outbox: VecDeque<Job>,
    next_ticket: u64,
}

impl App {
    pub fn new(config: Config, session: SessionStore) -> Self {
        let router = Router::new(session.is_active());
        let mut app = Self {
            config,
            session,
            router,
            list: ContactList::default(),
            form: ContactFormState::default(),
            key_input: Input::default(),
            key_error: None,
            search_input: Input::default(),
            search_active: false,
            confirm_modal: None,
            notice: None,
            modal_popup: PopupState::default(),
            status: None,
            in_flight: None,
            outbox: VecDeque::new(),
            next_ticket: 1,
        };
        if app.session.is_active() {
            app.refresh_contacts();
        }
        app
    }

    pub fn run(&mut self, worker: Worker) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = self.event_loop(&mut terminal, &worker);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop<B>(&mut self, terminal: &mut Terminal<B>, worker: &Worker) -> Result<()>
    where
        B: ratatui::backend::Backend,
    {
        loop {
            while let Some(job) = self.take_job() {
                worker.submit(job)?;
            }

            while let Some(done) = worker.poll()? {
                self.complete(done.ticket, done.response);
            }

            draw::render(terminal, self)?;

            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        if self.handle_key(key) {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Request bookkeeping
    // =========================================================================

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn busy_label(&self) -> Option<&'static str> {
        self.in_flight.as_ref().map(|f| f.label)
    }

    /// Queues `request` unless another one is still pending. Returns false
    /// when refused.
    fn dispatch(&mut self, request: Request, label: &'static str) -> bool {
        if self.in_flight.is_some() {
            self.set_status(BUSY_MESSAGE);
            return false;
        }
        let ticket = self.next_ticket;
        self.next_ticket += 1;

        let key = match &request {
            Request::ValidateKey(candidate) => candidate.clone(),
            _ => self.session.key().unwrap_or_default().to_string(),
        };
        debug!("dispatching ticket {} ({})", ticket, label);
        self.in_flight = Some(InFlight { ticket, label });
        self.outbox.push_back(Job {
            ticket,
            key,
            request,
        });
        true
    }

    pub fn take_job(&mut self) -> Option<Job> {
        self.outbox.pop_front()
    }

    /// Applies a worker answer. Answers for anything but the current
    /// in-flight ticket are stale and dropped.
    pub fn complete(&mut self, ticket: u64, response: Response) {
        match &self.in_flight {
            Some(current) if current.ticket == ticket => {}
            _ => {
                debug!("dropping stale response for ticket {}", ticket);
                return;
            }
        }
        self.in_flight = None;
        self.status = None;

        match response {
            Response::KeyValidated { key, result } => self.on_key_validated(key, result),
            Response::Listed(result) => self.on_listed(result),
            Response::Loaded { id, result } => self.on_loaded(&id, result),
            Response::Inserted(result) => {
                self.on_saved(result, "Contact added successfully!", "Error adding contact")
            }
            Response::Updated { result, .. } => {
                self.on_saved(result, "Contact updated successfully!", "Error updating contact")
            }
            Response::Deleted { id, result } => self.on_deleted(&id, result),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn submit_key(&mut self) {
        if self.is_busy() {
            self.set_status(BUSY_MESSAGE);
            return;
        }
        match validation::validate_api_key(self.key_input.value()) {
            Ok(key) => {
                self.key_error = None;
                self.dispatch(Request::ValidateKey(key), "Validating...");
            }
            Err(err) => self.key_error = Some(err.to_string()),
        }
    }

    fn on_key_validated(&mut self, key: String, result: Result<KeyStatus, ApiError>) {
        match result {
            Ok(KeyStatus::Valid) => self.accept_key(&key),
            Ok(KeyStatus::Invalid) => {
                info!("API key rejected by server");
                self.key_error = Some(INVALID_KEY_MESSAGE.to_string());
            }
            Err(err) if err.is_network() => {
                // The validation endpoint may be down; a bad key surfaces on
                // the first real data call instead.
                warn!("API key validation failed ({}), accepting key", err);
                self.accept_key(&key);
            }
            Err(err) => {
                error!("API key validation failed: {}", err);
                self.key_error = Some(format!("Error validating your API Key: {}", err));
            }
        }
    }

    fn accept_key(&mut self, key: &str) {
        if let Err(err) = self.session.commit(key) {
            error!("{:#}", err);
            self.key_error = Some(format!("Could not store API key: {:#}", err));
            return;
        }
        self.key_input.reset();
        self.key_error = None;
        self.router.show_contacts();
        self.refresh_contacts();
    }

    pub fn request_logout(&mut self) {
        self.confirm_modal = Some(ConfirmModal {
            title: "LOG OUT".into(),
            message: "Are you sure you want to log out? This will clear your API key.".into(),
            action: ConfirmAction::LogOut,
        });
    }

    fn log_out(&mut self) {
        if let Err(err) = self.session.clear() {
            error!("{:#}", err);
            self.show_error(format!("Could not clear API key: {:#}", err));
            return;
        }
        self.reset();
        self.show_notice("You have been logged out successfully.");
    }

    /// Returns to a fresh key-entry state. Pending answers become stale.
    fn reset(&mut self) {
        self.router.show_key_entry();
        self.list = ContactList::default();
        self.form.reset();
        self.key_input.reset();
        self.key_error = None;
        self.search_input.reset();
        self.search_active = false;
        self.confirm_modal = None;
        self.notice = None;
        self.status = None;
        self.in_flight = None;
        self.outbox.clear();
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    pub fn refresh_contacts(&mut self) {
        if self.dispatch(Request::ListContacts, "Loading contacts...") {
            self.list.loading();
        }
    }

    fn on_listed(&mut self, result: Result<Vec<Contact>, ApiError>) {
        match result {
            Ok(contacts) => {
                debug!("received {} contacts", contacts.len());
                let base = self.config.base_url.clone();
                let avatars = self.config.avatar_service.clone();
                self.list
                    .render(&contacts, |c| api::avatar_url(&base, &avatars, c));
            }
            Err(err) => {
                error!("Error fetching contacts: {}", err);
                self.list.failed(err.to_string());
            }
        }
    }

    pub fn open_add(&mut self) {
        if self.is_busy() {
            self.set_status(BUSY_MESSAGE);
            return;
        }
        if self.router.show_add() {
            self.form.reset();
        }
    }

    pub fn open_edit(&mut self) {
        let Some(id) = self.actionable_selection() else {
            return;
        };
        if self.is_busy() {
            self.set_status(BUSY_MESSAGE);
            return;
        }
        if self.router.show_edit(&id) {
            self.form.reset();
            self.form.loading = true;
            self.dispatch(Request::LoadContact(id), "Loading contact details...");
        }
    }

    fn on_loaded(&mut self, id: &str, result: Result<Option<Contact>, ApiError>) {
        if self.router.editing_id() != Some(id) {
            debug!("edit view for {} closed before details arrived", id);
            return;
        }
        match result {
            Ok(Some(contact)) => {
                let avatar = contact.avatar.as_ref().map(|_| {
                    api::avatar_url(&self.config.base_url, &self.config.avatar_service, &contact)
                });
                self.form.fill(&contact, avatar);
            }
            Ok(None) => {
                self.show_error("No contact details found or contact may have been deleted.");
                self.close_form();
            }
            Err(err) => {
                error!("Error loading contact details: {}", err);
                self.show_error(format!("Error loading contact details: {}", err));
                self.close_form();
            }
        }
    }

    pub fn submit_form(&mut self) {
        if self.is_busy() || self.form.loading {
            self.set_status(BUSY_MESSAGE);
            return;
        }
        let form = match validation::validate_draft(&self.form.draft()) {
            Ok(form) => form,
            Err(err) => {
                self.show_error(err.to_string());
                return;
            }
        };
        match self.router.current().clone() {
            View::AddContact => {
                self.dispatch(Request::Insert(form), "Saving...");
            }
            View::EditContact(id) => {
                self.dispatch(Request::Update { id, form }, "Updating...");
            }
            View::KeyEntry | View::Contacts => {}
        }
    }

    fn on_saved(&mut self, result: Result<Outcome, ApiError>, success: &str, rejected: &str) {
        match result {
            Ok(Outcome::Success) => {
                info!("{}", success);
                self.show_notice(success);
                self.cancel_form();
                self.refresh_contacts();
            }
            Ok(Outcome::Rejected(message)) => {
                warn!("{}: {}", rejected, message);
                self.show_error(format!("{}: {}", rejected, message));
            }
            Err(err) => self.show_failure(rejected, err),
        }
    }

    pub fn cancel_form(&mut self) {
        if self.router.current().is_form() {
            self.close_form();
        }
    }

    fn close_form(&mut self) {
        self.router.show_contacts();
        self.form.reset();
    }

    pub fn request_delete(&mut self) {
        let Some(id) = self.actionable_selection() else {
            return;
        };
        self.confirm_modal = Some(ConfirmModal {
            title: "DELETE".into(),
            message: "Delete contact. Are you sure?".into(),
            action: ConfirmAction::DeleteContact(id),
        });
    }

    fn delete_contact(&mut self, id: String) {
        if self.is_busy() {
            self.set_status(BUSY_MESSAGE);
            return;
        }
        self.list.mark_pending(&id);
        self.dispatch(Request::Delete(id), "Deleting...");
    }

    fn on_deleted(&mut self, id: &str, result: Result<Outcome, ApiError>) {
        match result {
            Ok(Outcome::Success) => {
                info!("contact {} deleted", id);
                self.show_notice("Contact deleted successfully!");
                self.refresh_contacts();
            }
            Ok(Outcome::Rejected(message)) => {
                warn!("Error deleting contact {}: {}", id, message);
                self.list.clear_pending(id);
                self.show_error(format!("Error deleting contact: {}", message));
            }
            Err(err) => {
                self.list.clear_pending(id);
                self.show_failure("Error deleting contact", err);
            }
        }
    }

    /// Id of the selected card unless it is waiting on a delete.
    fn actionable_selection(&self) -> Option<String> {
        if *self.router.current() != View::Contacts {
            return None;
        }
        self.list
            .selected_card()
            .filter(|card| !card.pending)
            .map(|card| card.id.clone())
    }

    pub fn apply_search(&mut self) {
        let query = self.search_input.value().to_string();
        self.list.filter(&query);
    }

    // =========================================================================
    // Notices & status
    // =========================================================================

    fn show_notice<S: Into<String>>(&mut self, message: S) {
        self.notice = Some(Notice {
            message: message.into(),
            is_error: false,
        });
    }

    fn show_error<S: Into<String>>(&mut self, message: S) {
        self.notice = Some(Notice {
            message: message.into(),
            is_error: true,
        });
    }

    fn show_failure(&mut self, context: &str, err: ApiError) {
        error!("{}: {}", context, err);
        self.show_error(format!("Something went wrong. Please try again. Error: {}", err));
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }

    pub fn ui_colors(&self) -> &UiColors {
        &self.config.ui.colors
    }

    // =========================================================================
    // Keys
    // =========================================================================

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Ctrl+C always quits
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return true;
        }

        if self.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.notice = None;
            }
            return false;
        }

        if self.confirm_modal.is_some() {
            self.handle_confirm_modal_key(key);
            return false;
        }

        match self.router.current().clone() {
            View::KeyEntry => self.handle_key_entry_key(key),
            View::Contacts => self.handle_contacts_key(key),
            View::AddContact | View::EditContact(_) => {
                self.handle_form_key(key);
                false
            }
        }
    }

    fn handle_confirm_modal_key(&mut self, key: KeyEvent) {
        let Some(modal) = self.confirm_modal.take() else {
            return;
        };

        match key.code {
            KeyCode::Esc => {}
            KeyCode::Char(c) if c.eq_ignore_ascii_case(&'n') => {}
            KeyCode::Enter => self.run_confirmed(modal.action),
            KeyCode::Char(c) if c.eq_ignore_ascii_case(&'y') => self.run_confirmed(modal.action),
            // Put the modal back if key wasn't handled
            _ => self.confirm_modal = Some(modal),
        }
    }

    fn run_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteContact(id) => self.delete_contact(id),
            ConfirmAction::LogOut => self.log_out(),
        }
    }

    fn handle_key_entry_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Enter => self.submit_key(),
            _ => {
                self.key_input.handle_event(&Event::Key(key));
            }
        }
        false
    }

    fn handle_contacts_key(&mut self, key: KeyEvent) -> bool {
        if self.search_active {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.search_active = false,
                KeyCode::Down => self.list.select_next(),
                KeyCode::Up => self.list.select_prev(),
                _ => {
                    if self.search_input.handle_event(&Event::Key(key)).is_some() {
                        self.apply_search();
                    }
                }
            }
            return false;
        }

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('/') => self.search_active = true,
            KeyCode::Char('j') | KeyCode::Down => self.list.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.list.select_prev(),
            KeyCode::Char('a') => self.open_add(),
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit(),
            KeyCode::Char('d') | KeyCode::Delete => self.request_delete(),
            KeyCode::Char('r') => self.refresh_contacts(),
            KeyCode::Char('L') => self.request_logout(),
            KeyCode::Esc => {
                if !self.search_input.value().is_empty() {
                    self.search_input.reset();
                    self.apply_search();
                }
            }
            _ => {}
        }
        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.cancel_form(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Tab | KeyCode::Down => self.form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.form.focus_prev(),
            _ => {
                if !self.form.loading {
                    self.form.handle_key_event(key);
                }
            }
        }
    }
}
