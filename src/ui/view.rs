/// The mutually exclusive screens of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// No session yet: ask for the access key
    KeyEntry,
    /// Contact cards with search
    Contacts,
    AddContact,
    /// Editing the contact with this id
    EditContact(String),
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::KeyEntry => "API KEY",
            View::Contacts => "CONTACTS",
            View::AddContact => "ADD CONTACT",
            View::EditContact(_) => "EDIT CONTACT",
        }
    }

    pub fn is_form(&self) -> bool {
        matches!(self, View::AddContact | View::EditContact(_))
    }
}

/// Holds the active view and only allows the documented transitions.
#[derive(Debug, Clone)]
pub struct Router {
    current: View,
}

impl Router {
    pub fn new(has_session: bool) -> Self {
        let current = if has_session {
            View::Contacts
        } else {
            View::KeyEntry
        };
        Self { current }
    }

    pub fn current(&self) -> &View {
        &self.current
    }

    /// Any view may return to the list once a session exists.
    pub fn show_contacts(&mut self) {
        self.current = View::Contacts;
    }

    pub fn show_add(&mut self) -> bool {
        if self.current != View::Contacts {
            return false;
        }
        self.current = View::AddContact;
        true
    }

    pub fn show_edit(&mut self, id: &str) -> bool {
        if self.current != View::Contacts || id.trim().is_empty() {
            return false;
        }
        self.current = View::EditContact(id.to_string());
        true
    }

    pub fn show_key_entry(&mut self) {
        self.current = View::KeyEntry;
    }

    pub fn editing_id(&self) -> Option<&str> {
        match &self.current {
            View::EditContact(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_view_depends_on_session() {
        assert_eq!(Router::new(true).current(), &View::Contacts);
        assert_eq!(Router::new(false).current(), &View::KeyEntry);
    }

    #[test]
    fn test_forms_only_open_from_list() {
        let mut router = Router::new(false);
        assert!(!router.show_add());
        assert!(!router.show_edit("1"));
        assert_eq!(router.current(), &View::KeyEntry);

        router.show_contacts();
        assert!(router.show_add());
        assert!(!router.show_edit("1"));
        assert_eq!(router.current(), &View::AddContact);

        router.show_contacts();
        assert!(router.show_edit("1"));
        assert_eq!(router.editing_id(), Some("1"));
        assert!(!router.show_add());
    }

    #[test]
    fn test_edit_requires_id() {
        let mut router = Router::new(true);
        assert!(!router.show_edit(""));
        assert!(!router.show_edit("  "));
        assert_eq!(router.current(), &View::Contacts);
    }

    #[test]
    fn test_any_view_returns_to_list() {
        let mut router = Router::new(true);
        router.show_edit("4");
        router.show_contacts();
        assert_eq!(router.current(), &View::Contacts);
        router.show_key_entry();
        assert_eq!(router.current(), &View::KeyEntry);
        assert!(!View::Contacts.is_form());
        assert!(View::EditContact("1".into()).is_form());
    }
}
