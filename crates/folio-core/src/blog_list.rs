// Blog listing component: fetch, filter, sort, search and paginate into a container
use std::fmt::Display;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::acquire::DataAcquirer;
use crate::config::ListConfig;
use crate::debounce::{sleep_until_due, Debouncer};
use crate::dom::Element;
use crate::listing::{filter_entries, search_entries, sort_entries};
use crate::models::{BlogEntry, SortBy};
use crate::render::render_entries;
use crate::subscriptions::Subscriptions;
use crate::{Error, Result};

/// What an element under the listing's root is for, by its marker class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Content,
    Loading,
    Error,
    Sort,
    Filter,
    Search,
    LoadMore,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Content,
        Role::Loading,
        Role::Error,
        Role::Sort,
        Role::Filter,
        Role::Search,
        Role::LoadMore,
    ];

    pub fn class_name(self) -> &'static str {
        match self {
            Role::Content => "blog-list__content",
            Role::Loading => "blog-list__loading",
            Role::Error => "blog-list__error",
            Role::Sort => "blog-list__sort",
            Role::Filter => "blog-list__filter",
            Role::Search => "blog-list__search",
            Role::LoadMore => "blog-list__load-more",
        }
    }
}

/// The listing's container and the elements found under it
///
/// Only the content region is required.
#[derive(Debug, Clone)]
pub struct BlogListRoot {
    content: Element,
    loading: Option<Element>,
    error: Option<Element>,
    sort: Option<Element>,
    filter: Option<Element>,
    search: Option<Element>,
    load_more: Option<Element>,
}

impl BlogListRoot {
    pub fn new(content: Element) -> Self {
        Self {
            content,
            loading: None,
            error: None,
            sort: None,
            filter: None,
            search: None,
            load_more: None,
        }
    }

    /// Pick children by role class, first match wins
    pub fn from_children(children: impl IntoIterator<Item = Element>) -> Result<Self> {
        let mut found: Vec<(Role, Element)> = Vec::new();
        for child in children {
            let role = Role::ALL
                .into_iter()
                .find(|role| child.has_class(role.class_name()));
            if let Some(role) = role {
                if !found.iter().any(|(r, _)| *r == role) {
                    found.push((role, child));
                }
            }
        }

        let content_at = found
            .iter()
            .position(|(role, _)| *role == Role::Content)
            .ok_or_else(|| Error::MissingElement(Role::Content.class_name().to_string()))?;
        let (_, content) = found.remove(content_at);

        Ok(found
            .into_iter()
            .fold(Self::new(content), |root, (role, element)| root.with(role, element)))
    }

    /// Attach an element for `role`, replacing any previous one
    pub fn with(mut self, role: Role, element: Element) -> Self {
        match self.slot_mut(role) {
            Some(slot) => *slot = Some(element),
            None => self.content = element,
        }
        self
    }

    pub fn content(&self) -> &Element {
        &self.content
    }

    pub fn element(&self, role: Role) -> Option<&Element> {
        match role {
            Role::Content => Some(&self.content),
            Role::Loading => self.loading.as_ref(),
            Role::Error => self.error.as_ref(),
            Role::Sort => self.sort.as_ref(),
            Role::Filter => self.filter.as_ref(),
            Role::Search => self.search.as_ref(),
            Role::LoadMore => self.load_more.as_ref(),
        }
    }

    pub fn element_mut(&mut self, role: Role) -> Option<&mut Element> {
        match role {
            Role::Content => Some(&mut self.content),
            _ => self.slot_mut(role).and_then(Option::as_mut),
        }
    }

    /// Storage for an optional role; `None` for the content region
    fn slot_mut(&mut self, role: Role) -> Option<&mut Option<Element>> {
        match role {
            Role::Content => None,
            Role::Loading => Some(&mut self.loading),
            Role::Error => Some(&mut self.error),
            Role::Sort => Some(&mut self.sort),
            Role::Filter => Some(&mut self.filter),
            Role::Search => Some(&mut self.search),
            Role::LoadMore => Some(&mut self.load_more),
        }
    }
}

/// User interaction with the listing's controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    SortChanged(String),
    FilterChanged(String),
    SearchInput(String),
    LoadMore,
}

impl ControlEvent {
    fn role(&self) -> Role {
        match self {
            ControlEvent::SortChanged(_) => Role::Sort,
            ControlEvent::FilterChanged(_) => Role::Filter,
            ControlEvent::SearchInput(_) => Role::Search,
            ControlEvent::LoadMore => Role::LoadMore,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub per_page: usize,
    pub search_debounce: Duration,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::from(&ListConfig::default())
    }
}

impl From<&ListConfig> for ListOptions {
    fn from(config: &ListConfig) -> Self {
        Self {
            per_page: config.per_page.max(1),
            search_debounce: Duration::from_millis(config.search_debounce_ms),
        }
    }
}

/// Everything the listing knows about its entries
#[derive(Debug, Clone)]
pub struct ListState {
    items: Vec<BlogEntry>,
    filtered_items: Vec<BlogEntry>,
    page: usize,
    per_page: usize,
}

impl ListState {
    fn new(per_page: usize) -> Self {
        Self {
            items: Vec::new(),
            filtered_items: Vec::new(),
            page: 1,
            per_page,
        }
    }

    pub fn items(&self) -> &[BlogEntry] {
        &self.items
    }

    pub fn filtered_items(&self) -> &[BlogEntry] {
        &self.filtered_items
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// First `page * per_page` filtered entries
    pub fn visible(&self) -> &[BlogEntry] {
        let end = self
            .page
            .saturating_mul(self.per_page)
            .min(self.filtered_items.len());
        &self.filtered_items[..end]
    }

    pub fn has_more(&self) -> bool {
        self.visible().len() < self.filtered_items.len()
    }

    fn replace_filtered(&mut self, filtered: Vec<BlogEntry>) {
        self.filtered_items = filtered;
        self.page = 1;
    }
}

pub struct BlogList {
    root: BlogListRoot,
    acquirer: DataAcquirer,
    state: ListState,
    listeners: Subscriptions<Role>,
    search_debounce: Debouncer<String>,
    renders: watch::Sender<String>,
    render_count: u64,
    destroyed: bool,
}

impl BlogList {
    pub fn new(root: BlogListRoot, acquirer: DataAcquirer, options: ListOptions) -> Self {
        let (renders, _) = watch::channel(String::new());
        Self {
            root,
            acquirer,
            state: ListState::new(options.per_page.max(1)),
            listeners: Subscriptions::new(),
            search_debounce: Debouncer::new(options.search_debounce),
            renders,
            render_count: 0,
            destroyed: false,
        }
    }

    pub fn root(&self) -> &BlogListRoot {
        &self.root
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn is_listening(&self, role: Role) -> bool {
        self.listeners.is_subscribed(&role)
    }

    /// Latest content markup, updated on every render
    pub fn subscribe_renders(&self) -> watch::Receiver<String> {
        self.renders.subscribe()
    }

    /// Load data, wire the controls and render the first page
    ///
    /// A failed load lands in the error region and is also returned. The
    /// loading indicator is hidden on both paths.
    pub async fn initialize(&mut self) -> Result<()> {
        self.show_loading();

        let outcome = match self.acquire_data().await {
            Ok(()) => {
                self.wire_controls();
                self.render();
                Ok(())
            }
            Err(e) => {
                self.show_error(&e);
                Err(e)
            }
        };

        self.hide_loading();
        outcome
    }

    pub async fn acquire_data(&mut self) -> Result<()> {
        let items = self.acquirer.acquire().await?;
        info!("Loaded {} blog entries", items.len());

        self.state.filtered_items = items.clone();
        self.state.items = items;
        self.state.page = 1;
        Ok(())
    }

    /// Listen on every control that is present; missing ones stay inert
    fn wire_controls(&mut self) {
        for role in [Role::Sort, Role::Filter, Role::Search, Role::LoadMore] {
            if self.root.element(role).is_some() {
                self.listeners.subscribe(role);
            }
        }
        debug!("Listening on {} controls", self.listeners.len());
    }

    /// Reorder within whatever filter or search is active
    pub fn apply_sort(&mut self, sort_by: SortBy) {
        debug!("Sorting {} entries by {}", self.state.filtered_items.len(), sort_by.as_str());
        let mut working = self.state.filtered_items.clone();
        sort_entries(&mut working, sort_by);
        self.state.replace_filtered(working);
        self.render();
    }

    /// Narrow the full set by category or tag; empty shows everything
    pub fn apply_filter(&mut self, value: &str) {
        let filtered = filter_entries(&self.state.items, value);
        self.state.replace_filtered(filtered);
        self.render();
    }

    /// Search titles and content; an empty query falls back to the selected filter
    pub fn apply_search(&mut self, query: &str) {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            let filter = self.selected_filter();
            self.apply_filter(&filter);
            return;
        }

        let found = search_entries(&self.state.items, &query);
        self.state.replace_filtered(found);
        self.render();
    }

    /// Reveal one more page
    pub fn load_more(&mut self) {
        if self.state.has_more() {
            self.state.page += 1;
            self.render();
        }
    }

    fn selected_filter(&self) -> String {
        self.root
            .element(Role::Filter)
            .map(|el| el.value().to_string())
            .unwrap_or_default()
    }

    pub fn render(&mut self) {
        let html = render_entries(self.state.visible());
        let has_more = self.state.has_more();

        self.root.content.set_inner_html(html.clone());
        if let Some(button) = self.root.element_mut(Role::LoadMore) {
            button.toggle_class(crate::dom::HIDDEN, !has_more);
        }

        self.render_count += 1;
        debug!(
            "Rendered {} of {} entries",
            self.state.visible().len(),
            self.state.filtered_items.len()
        );
        self.renders.send_replace(html);
    }

    pub fn show_loading(&mut self) {
        if let Some(el) = self.root.element_mut(Role::Loading) {
            el.show();
        }
    }

    pub fn hide_loading(&mut self) {
        if let Some(el) = self.root.element_mut(Role::Loading) {
            el.hide();
        }
    }

    pub fn show_error(&mut self, error: &dyn Display) {
        warn!("Blog list failed: {}", error);
        if let Some(el) = self.root.element_mut(Role::Error) {
            el.set_text(format!("Failed to load blogs: {}", error));
            el.show();
        }
    }

    /// Route one control event; search input is debounced, the rest apply at once
    pub fn dispatch(&mut self, event: ControlEvent) {
        let role = event.role();
        if self.destroyed || !self.listeners.is_subscribed(&role) {
            debug!("Ignoring {:?}, nobody is listening", event);
            return;
        }

        match event {
            ControlEvent::SortChanged(value) => {
                self.set_control_value(Role::Sort, &value);
                self.apply_sort(SortBy::from_value(&value));
            }
            ControlEvent::FilterChanged(value) => {
                self.set_control_value(Role::Filter, &value);
                self.apply_filter(&value);
            }
            ControlEvent::SearchInput(value) => {
                self.set_control_value(Role::Search, &value);
                self.search_debounce.schedule(value);
            }
            ControlEvent::LoadMore => self.load_more(),
        }
    }

    fn set_control_value(&mut self, role: Role, value: &str) {
        if let Some(el) = self.root.element_mut(role) {
            el.set_value(value);
        }
    }

    /// Run a debounced search if its quiet period is over
    pub fn fire_pending_search(&mut self) {
        if let Some(query) = self.search_debounce.take_due(Instant::now()) {
            self.apply_search(&query);
        }
    }

    /// Handle control events until the sender goes away
    ///
    /// A search still waiting out its debounce when the channel closes runs
    /// once its quiet period is over. Dropping the future abandons it.
    pub async fn run(&mut self, mut events: mpsc::Receiver<ControlEvent>) {
        loop {
            let deadline = self.search_debounce.deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.dispatch(event),
                    None => break,
                },
                _ = sleep_until_due(deadline) => self.fire_pending_search(),
            }
        }

        if let Some(deadline) = self.search_debounce.deadline() {
            sleep_until_due(Some(deadline)).await;
            self.fire_pending_search();
        }
    }

    /// Detach every listener and cancel the pending search
    pub fn destroy(&mut self) {
        let released = self.listeners.drain();
        self.search_debounce.cancel();
        self.destroyed = true;
        debug!("Blog list torn down, released {} listeners", released.len());
    }
}
