// Scroll-synced navigation: highlights the link of the section in view
use tracing::debug;

use crate::dom::Element;
use crate::subscriptions::Subscriptions;

pub const ACTIVE: &str = "active";

/// A page section and where it sits in the document
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

impl Section {
    pub fn new(id: impl Into<String>, top: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            top,
            height,
        }
    }

    /// Share of the section in view; sections taller than the viewport
    /// count as fully visible once they fill it
    fn visible_ratio(&self, viewport_top: f64, viewport_height: f64) -> f64 {
        if self.height <= 0.0 || viewport_height <= 0.0 {
            return 0.0;
        }
        let start = self.top.max(viewport_top);
        let end = (self.top + self.height).min(viewport_top + viewport_height);
        let visible = (end - start).max(0.0);
        visible / self.height.min(viewport_height)
    }
}

#[derive(Debug, Clone)]
pub struct NavOptions {
    /// Visible share a section needs before its link lights up
    pub threshold: f64,
    /// Height of the fixed header; scroll targets land below it
    pub header_offset: f64,
}

impl Default for NavOptions {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            header_offset: 0.0,
        }
    }
}

/// Where a link click should scroll to
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollTarget {
    pub section_id: String,
    pub top: f64,
    pub smooth: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum NavListener {
    Observe(String),
    Click(String),
}

pub struct Navigation {
    sections: Vec<Section>,
    links: Vec<Element>,
    options: NavOptions,
    active: Option<String>,
    listeners: Subscriptions<NavListener>,
}

impl Navigation {
    /// Observe every section and listen on every in-page anchor link
    pub fn new(sections: Vec<Section>, links: Vec<Element>, options: NavOptions) -> Self {
        let mut listeners = Subscriptions::new();
        for section in &sections {
            listeners.subscribe(NavListener::Observe(section.id.clone()));
        }
        for href in links.iter().filter_map(|l| l.attr("href")) {
            if href.starts_with('#') {
                listeners.subscribe(NavListener::Click(href.to_string()));
            }
        }

        Self {
            sections,
            links,
            options,
            active: None,
            listeners,
        }
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn links(&self) -> &[Element] {
        &self.links
    }

    pub fn link(&self, href: &str) -> Option<&Element> {
        self.links.iter().find(|l| l.attr("href") == Some(href))
    }

    /// Re-evaluate which section is in view
    ///
    /// The most visible section past the threshold becomes active. When none
    /// qualifies the previous highlight stays.
    pub fn on_scroll(&mut self, scroll_top: f64, viewport_height: f64) -> Option<&str> {
        let best = self
            .sections
            .iter()
            .filter(|s| self.listeners.is_subscribed(&NavListener::Observe(s.id.clone())))
            .map(|s| (s, s.visible_ratio(scroll_top, viewport_height)))
            .filter(|(_, ratio)| *ratio >= self.options.threshold)
            .fold(None::<(&Section, f64)>, |best, (s, ratio)| match best {
                Some((_, best_ratio)) if best_ratio >= ratio => best,
                _ => Some((s, ratio)),
            })
            .map(|(s, _)| s.id.clone());

        if let Some(id) = best {
            if self.active.as_deref() != Some(id.as_str()) {
                debug!("Active section is now #{}", id);
                self.set_active(&id);
            }
        }
        self.active.as_deref()
    }

    fn set_active(&mut self, id: &str) {
        let target = format!("#{}", id);
        for link in &mut self.links {
            let is_active = link.attr("href") == Some(target.as_str());
            link.toggle_class(ACTIVE, is_active);
            if is_active {
                link.set_attr("aria-current", "page");
            } else {
                link.remove_attr("aria-current");
            }
        }
        self.active = Some(id.to_string());
    }

    /// Smooth-scroll target for an in-page anchor; `None` lets the click through
    pub fn on_link_click(&self, href: &str) -> Option<ScrollTarget> {
        if !self.listeners.is_subscribed(&NavListener::Click(href.to_string())) {
            return None;
        }

        let id = href.strip_prefix('#')?;
        let section = self.sections.iter().find(|s| s.id == id)?;

        Some(ScrollTarget {
            section_id: section.id.clone(),
            top: (section.top - self.options.header_offset).max(0.0),
            smooth: true,
        })
    }

    /// Stop observing sections and drop link listeners
    pub fn destroy(&mut self) {
        let released = self.listeners.drain();
        debug!("Navigation torn down, released {} listeners", released.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nav(options: NavOptions) -> Navigation {
        let sections = vec![
            Section::new("home", 0.0, 800.0),
            Section::new("work", 800.0, 1200.0),
            Section::new("blog", 2000.0, 600.0),
        ];
        let links = vec![
            Element::new("a").with_attr("href", "#home"),
            Element::new("a").with_attr("href", "#work"),
            Element::new("a").with_attr("href", "#blog"),
            Element::new("a").with_attr("href", "https://github.com/folio"),
        ];
        Navigation::new(sections, links, options)
    }

    #[test]
    fn test_scroll_highlights_most_visible_section() {
        let mut nav = nav(NavOptions::default());

        assert_eq!(nav.on_scroll(0.0, 800.0), Some("home"));
        assert!(nav.link("#home").unwrap().has_class(ACTIVE));

        // 200px of home, 600px of work
        assert_eq!(nav.on_scroll(600.0, 800.0), Some("work"));
        let work = nav.link("#work").unwrap();
        assert!(work.has_class(ACTIVE));
        assert_eq!(work.attr("aria-current"), Some("page"));
        assert!(!nav.link("#home").unwrap().has_class(ACTIVE));
        assert_eq!(nav.link("#home").unwrap().attr("aria-current"), None);
    }

    #[test]
    fn test_below_threshold_keeps_previous_highlight() {
        let mut nav = nav(NavOptions {
            threshold: 0.9,
            ..Default::default()
        });

        nav.on_scroll(0.0, 800.0);
        // Roughly half of home and half of work
        assert_eq!(nav.on_scroll(400.0, 800.0), Some("home"));
    }

    #[test]
    fn test_click_on_anchor_scrolls_below_header() {
        let nav = nav(NavOptions {
            header_offset: 64.0,
            ..Default::default()
        });

        let target = nav.on_link_click("#work").unwrap();
        assert_eq!(target.section_id, "work");
        assert_eq!(target.top, 736.0);
        assert!(target.smooth);

        assert_eq!(nav.on_link_click("#home").unwrap().top, 0.0);
        assert_eq!(nav.on_link_click("https://github.com/folio"), None);
        assert_eq!(nav.on_link_click("#missing"), None);
    }

    #[test]
    fn test_destroy_stops_reacting() {
        let mut nav = nav(NavOptions::default());
        nav.on_scroll(0.0, 800.0);
        nav.destroy();

        assert_eq!(nav.on_scroll(2000.0, 600.0), Some("home"));
        assert_eq!(nav.on_link_click("#blog"), None);
    }
}
