use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Element ids and classes used by the returns pages
pub const CHART_CONTAINER_ID: &str = "stockChartContainer";
pub const SPINNER_CLASS: &str = "spinner-border";
pub const CONTENT_ID: &str = "content";
pub const INVISIBLE_CLASS: &str = "invisible";
pub const PROFILE_RETURNS_ID: &str = "profile-returns-id";
pub const RETURNS_GRAPH_ID: &str = "returns-graph-id";

/// Anything whose inner HTML can be replaced
pub trait Container: Send + Sync {
    fn replace_inner_html(&self, html: &str);
}

/// A loading indicator that is cleared once a request settles
pub trait LoadingIndicator: Send + Sync {
    fn settle(&self);
}

#[derive(Debug, Default)]
struct ElementState {
    id: String,
    classes: BTreeSet<String>,
    inner_html: String,
}

/// Shared handle to one element; clones refer to the same element
#[derive(Debug, Clone, Default)]
pub struct Element {
    state: Arc<Mutex<ElementState>>,
}

impl Element {
    pub fn new(id: &str, classes: &[&str]) -> Self {
        Element {
            state: Arc::new(Mutex::new(ElementState {
                id: id.to_string(),
                classes: classes.iter().map(|c| c.to_string()).collect(),
                inner_html: String::new(),
            })),
        }
    }

    // A panicked writer leaves plain strings behind; keep using them.
    fn lock(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn inner_html(&self) -> String {
        self.lock().inner_html.clone()
    }

    pub fn set_inner_html(&self, html: impl Into<String>) {
        self.lock().inner_html = html.into();
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.lock().classes.contains(class)
    }

    pub fn remove_class(&self, class: &str) {
        self.lock().classes.remove(class);
    }
}

impl Container for Element {
    fn replace_inner_html(&self, html: &str) {
        self.set_inner_html(html);
    }
}

/// In-memory document: an ordered list of element handles
#[derive(Debug, Clone, Default)]
pub struct Page {
    elements: Arc<Mutex<Vec<Element>>>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// The returns page layout: chart and fragment containers, one spinner,
    /// and the content area hidden until the first request settles
    pub fn returns_page() -> Self {
        let page = Page::new();
        page.append(Element::new(SPINNER_CLASS, &[SPINNER_CLASS]));
        page.append(Element::new(CONTENT_ID, &[INVISIBLE_CLASS]));
        page.append(Element::new(CHART_CONTAINER_ID, &[]));
        page.append(Element::new(PROFILE_RETURNS_ID, &[]));
        page.append(Element::new(RETURNS_GRAPH_ID, &[]));
        page
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Element>> {
        self.elements.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn append(&self, element: Element) -> Element {
        self.lock().push(element.clone());
        element
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.lock().iter().find(|e| e.id() == id).cloned()
    }

    pub fn elements_by_class(&self, class: &str) -> Vec<Element> {
        self.lock().iter().filter(|e| e.has_class(class)).cloned().collect()
    }

    /// Detach every element carrying `class`, returning how many were removed
    pub fn remove_by_class(&self, class: &str) -> usize {
        let mut elements = self.lock();
        let before = elements.len();
        elements.retain(|e| !e.has_class(class));
        before - elements.len()
    }
}

/// Spinner-by-class plus a content area revealed on settle
pub struct PageSpinner {
    page: Page,
    spinner_class: String,
    content: Element,
}

impl PageSpinner {
    pub fn new(page: Page, spinner_class: &str, content: Element) -> Self {
        PageSpinner {
            page,
            spinner_class: spinner_class.to_string(),
            content,
        }
    }
}

impl LoadingIndicator for PageSpinner {
    fn settle(&self) {
        let removed = self.page.remove_by_class(&self.spinner_class);
        self.content.remove_class(INVISIBLE_CLASS);
        tracing::debug!("Removed {} spinner(s), content revealed", removed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_page_layout() {
        let page = Page::returns_page();
        for id in [CHART_CONTAINER_ID, CONTENT_ID, PROFILE_RETURNS_ID, RETURNS_GRAPH_ID] {
            assert!(page.get_element_by_id(id).is_some(), "missing {}", id);
        }
        assert_eq!(page.elements_by_class(SPINNER_CLASS).len(), 1);
        assert!(page.get_element_by_id(CONTENT_ID).unwrap().has_class(INVISIBLE_CLASS));
        assert!(page.get_element_by_id("missing").is_none());
    }

    #[test]
    fn test_handles_share_state() {
        let page = Page::returns_page();
        let container = page.get_element_by_id(PROFILE_RETURNS_ID).unwrap();
        container.replace_inner_html("<table></table>");

        let again = page.get_element_by_id(PROFILE_RETURNS_ID).unwrap();
        assert_eq!(again.inner_html(), "<table></table>");
    }

    #[test]
    fn test_settle_removes_all_spinners_and_reveals_content() {
        let page = Page::returns_page();
        page.append(Element::new("graph-spinner", &[SPINNER_CLASS]));
        let content = page.get_element_by_id(CONTENT_ID).unwrap();

        let spinner = PageSpinner::new(page.clone(), SPINNER_CLASS, content.clone());
        spinner.settle();

        assert!(page.elements_by_class(SPINNER_CLASS).is_empty());
        assert!(page.get_element_by_id("graph-spinner").is_none());
        assert!(!content.has_class(INVISIBLE_CLASS));

        // settling twice is harmless
        spinner.settle();
        assert_eq!(page.remove_by_class(SPINNER_CLASS), 0);
        assert!(page.get_element_by_id(CONTENT_ID).is_some());
    }
}
