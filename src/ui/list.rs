//! View model for the contact list: cards, placeholders, client-side search
//! and per-card pending state.

use crate::api::Contact;
use crate::search;

pub const LOADING_MESSAGE: &str = "Loading contacts...";
pub const EMPTY_MESSAGE: &str = "No contacts found. Add your first contact!";
pub const NO_RESULTS_MESSAGE: &str = "No contacts found matching your search.";
pub const FAILED_MESSAGE: &str = "Something went wrong, please try again later.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub email: String,
    pub avatar_url: String,
    pub visible: bool,
    /// Faded with actions disabled while a delete is in flight
    pub pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListStatus {
    Loading,
    Failed(String),
    Ready,
}

#[derive(Debug, Clone)]
pub struct ContactList {
    status: ListStatus,
    cards: Vec<Card>,
    query: String,
    selected: Option<usize>,
}

impl Default for ContactList {
    fn default() -> Self {
        Self {
            status: ListStatus::Ready,
            cards: Vec::new(),
            query: String::new(),
            selected: None,
        }
    }
}

impl ContactList {
    pub fn loading(&mut self) {
        self.status = ListStatus::Loading;
        self.cards.clear();
        self.selected = None;
    }

    pub fn failed(&mut self, message: impl Into<String>) {
        self.status = ListStatus::Failed(message.into());
        self.cards.clear();
        self.selected = None;
    }

    /// Replaces the cards, one per contact in input order. The current search
    /// query stays applied and the selection follows the previously selected
    /// id when it is still present.
    pub fn render<F>(&mut self, contacts: &[Contact], avatar_url: F)
    where
        F: Fn(&Contact) -> String,
    {
        let previous = self.selected_card().map(|card| card.id.clone());

        self.status = ListStatus::Ready;
        self.cards = contacts
            .iter()
            .map(|contact| Card {
                id: contact.id.clone(),
                name: contact.display_name(),
                mobile: contact.mobile.clone(),
                email: contact.email.clone(),
                avatar_url: avatar_url(contact),
                visible: true,
                pending: false,
            })
            .collect();

        let query = std::mem::take(&mut self.query);
        self.filter(&query);

        if let Some(id) = previous {
            if let Some(index) = self.cards.iter().position(|c| c.id == id && c.visible) {
                self.selected = Some(index);
            }
        }
    }

    /// Shows only cards whose name, mobile or email contain `query`,
    /// ignoring case. Does not refetch anything.
    pub fn filter(&mut self, query: &str) {
        self.query = query.to_string();
        let needle = search::normalize_query(query);
        for card in &mut self.cards {
            card.visible = match needle.as_deref() {
                None => true,
                Some(needle) => search::matches_any(
                    needle,
                    [card.name.as_str(), card.mobile.as_str(), card.email.as_str()],
                ),
            };
        }
        self.selected = self.cards.iter().position(|card| card.visible);
    }

    #[cfg(test)]
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> &ListStatus {
        &self.status
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn visible_cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|card| card.visible)
    }

    pub fn visible_count(&self) -> usize {
        self.visible_cards().count()
    }

    /// Message shown in place of (or under) the cards, if any.
    pub fn placeholder(&self) -> Option<String> {
        match &self.status {
            ListStatus::Loading => Some(LOADING_MESSAGE.to_string()),
            ListStatus::Failed(message) => Some(format!("{}\n{}", FAILED_MESSAGE, message)),
            ListStatus::Ready if self.cards.is_empty() => Some(EMPTY_MESSAGE.to_string()),
            ListStatus::Ready if self.visible_count() == 0 && !self.query.is_empty() => {
                Some(NO_RESULTS_MESSAGE.to_string())
            }
            ListStatus::Ready => None,
        }
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_card(&self) -> Option<&Card> {
        self.selected.and_then(|index| self.cards.get(index))
    }

    pub fn select_next(&mut self) {
        self.step_selection(1);
    }

    pub fn select_prev(&mut self) {
        self.step_selection(-1);
    }

    fn step_selection(&mut self, delta: isize) {
        let visible: Vec<usize> = self
            .cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.visible)
            .map(|(index, _)| index)
            .collect();
        if visible.is_empty() {
            self.selected = None;
            return;
        }
        let position = self
            .selected
            .and_then(|current| visible.iter().position(|&index| index == current))
            .unwrap_or(0) as isize;
        let next = (position + delta).clamp(0, visible.len() as isize - 1) as usize;
        self.selected = Some(visible[next]);
    }

    pub fn mark_pending(&mut self, id: &str) -> bool {
        self.set_pending(id, true)
    }

    pub fn clear_pending(&mut self, id: &str) -> bool {
        self.set_pending(id, false)
    }

    fn set_pending(&mut self, id: &str, pending: bool) -> bool {
        match self.cards.iter_mut().find(|card| card.id == id) {
            Some(card) => {
                card.pending = pending;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str, first: &str, last: &str, mobile: &str, email: &str) -> Contact {
        Contact {
            id: id.into(),
            first_name: first.into(),
            last_name: last.into(),
            mobile: mobile.into(),
            email: email.into(),
            avatar: None,
        }
    }

    fn sample() -> Vec<Contact> {
        vec![
            contact("1", "Alice", "Smith", "0123456789", "alice@example.com"),
            contact("2", "Bob", "Jones", "0987654321", "bob@example.com"),
            contact("3", "Carol", "Khalid", "5550001111", "carol@mail.test"),
        ]
    }

    fn rendered() -> ContactList {
        let mut list = ContactList::default();
        list.render(&sample(), |c| format!("avatar:{}", c.id));
        list
    }

    #[test]
    fn test_empty_collection_shows_placeholder_only() {
        let mut list = ContactList::default();
        list.render(&[], |_| String::new());
        assert!(list.cards().is_empty());
        assert_eq!(list.placeholder().as_deref(), Some(EMPTY_MESSAGE));
        assert!(list.selected_card().is_none());
    }

    #[test]
    fn test_one_card_per_contact_in_order() {
        let list = rendered();
        let ids: Vec<&str> = list.cards().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(list.cards()[0].name, "Alice Smith");
        assert_eq!(list.cards()[1].avatar_url, "avatar:2");
        assert_eq!(list.placeholder(), None);
        assert_eq!(list.selected_card().map(|c| c.id.as_str()), Some("1"));
    }

    #[test]
    fn test_filter_is_case_insensitive_over_name_mobile_email() {
        let mut list = rendered();
        list.filter("ALI");
        let visible: Vec<&str> = list.visible_cards().map(|c| c.id.as_str()).collect();
        // Alice by name, Carol by "Khalid"
        assert_eq!(visible, vec!["1", "3"]);
        assert_eq!(list.placeholder(), None);

        list.filter("0987");
        let visible: Vec<&str> = list.visible_cards().map(|c| c.id.as_str()).collect();
        assert_eq!(visible, vec!["2"]);

        list.filter("mail.test");
        let visible: Vec<&str> = list.visible_cards().map(|c| c.id.as_str()).collect();
        assert_eq!(visible, vec!["3"]);
    }

    #[test]
    fn test_no_results_placeholder_iff_nothing_visible_and_query_set() {
        let mut list = rendered();
        list.filter("zzz");
        assert_eq!(list.visible_count(), 0);
        assert_eq!(list.placeholder().as_deref(), Some(NO_RESULTS_MESSAGE));
        assert!(list.selected_card().is_none());

        list.filter("");
        assert_eq!(list.visible_count(), 3);
        assert_eq!(list.placeholder(), None);
    }

    #[test]
    fn test_rerender_keeps_query_and_selection() {
        let mut list = rendered();
        list.filter("o");
        list.select_next();
        assert_eq!(list.selected_card().map(|c| c.id.as_str()), Some("2"));

        list.render(&sample(), |_| String::new());
        assert_eq!(list.query(), "o");
        assert_eq!(list.selected_card().map(|c| c.id.as_str()), Some("2"));
        assert!(list.cards().iter().all(|c| !c.pending));
    }

    #[test]
    fn test_selection_skips_hidden_cards_and_clamps() {
        let mut list = rendered();
        list.filter("ali");
        assert_eq!(list.selected_card().map(|c| c.id.as_str()), Some("1"));
        list.select_next();
        assert_eq!(list.selected_card().map(|c| c.id.as_str()), Some("3"));
        list.select_next();
        assert_eq!(list.selected_card().map(|c| c.id.as_str()), Some("3"));
        list.select_prev();
        list.select_prev();
        assert_eq!(list.selected_card().map(|c| c.id.as_str()), Some("1"));
    }

    #[test]
    fn test_pending_toggles_by_id() {
        let mut list = rendered();
        assert!(list.mark_pending("2"));
        assert!(list.cards()[1].pending);
        assert!(list.clear_pending("2"));
        assert!(!list.cards()[1].pending);
        assert!(!list.mark_pending("99"));
    }

    #[test]
    fn test_loading_and_failure_states() {
        let mut list = rendered();
        list.loading();
        assert!(list.cards().is_empty());
        assert_eq!(list.placeholder().as_deref(), Some(LOADING_MESSAGE));

        list.failed("server responded with HTTP 500");
        let text = list.placeholder().unwrap();
        assert!(text.starts_with(FAILED_MESSAGE));
        assert!(text.ends_with("HTTP 500"));
    }
}
