use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::api::Contact;
use crate::validation::ContactDraft;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FirstName,
    LastName,
    Mobile,
    Email,
    Avatar,
}

impl FormField {
    pub const ALL: [FormField; 5] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::Mobile,
        FormField::Email,
        FormField::Avatar,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::FirstName => "First name",
            FormField::LastName => "Last name",
            FormField::Mobile => "Mobile",
            FormField::Email => "Email",
            FormField::Avatar => "Avatar file",
        }
    }

    pub fn index(self) -> usize {
        match self {
            FormField::FirstName => 0,
            FormField::LastName => 1,
            FormField::Mobile => 2,
            FormField::Email => 3,
            FormField::Avatar => 4,
        }
    }
}

/// Text inputs backing the add and edit views.
#[derive(Debug, Clone, Default)]
pub struct ContactFormState {
    inputs: [Input; 5],
    focus: usize,
    /// Avatar already stored remotely, shown while editing
    pub current_avatar: Option<String>,
    /// Set while the edit view waits for the contact to load
    pub loading: bool,
}

impl ContactFormState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn fill(&mut self, contact: &Contact, avatar_url: Option<String>) {
        self.inputs = [
            Input::new(contact.first_name.clone()),
            Input::new(contact.last_name.clone()),
            Input::new(contact.mobile.clone()),
            Input::new(contact.email.clone()),
            Input::default(),
        ];
        self.focus = 0;
        self.current_avatar = avatar_url;
        self.loading = false;
    }

    pub fn focused(&self) -> FormField {
        FormField::ALL[self.focus]
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % FormField::ALL.len();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + FormField::ALL.len() - 1) % FormField::ALL.len();
    }

    pub fn value(&self, field: FormField) -> &str {
        self.inputs[field.index()].value()
    }

    pub fn set_value(&mut self, field: FormField, value: &str) {
        self.inputs[field.index()] = Input::new(value.to_string());
    }

    pub fn visual_cursor(&self) -> usize {
        self.inputs[self.focus].visual_cursor()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.inputs[self.focus]
            .handle_event(&Event::Key(key))
            .is_some()
    }

    pub fn draft(&self) -> ContactDraft {
        ContactDraft {
            first_name: self.value(FormField::FirstName).to_string(),
            last_name: self.value(FormField::LastName).to_string(),
            mobile: self.value(FormField::Mobile).to_string(),
            email: self.value(FormField::Email).to_string(),
            avatar_path: self.value(FormField::Avatar).to_string(),
        }
    }
}
