// Drag-and-drop sorter: draggable items moved between drop zones
use tracing::debug;

use crate::dom::Element;
use crate::subscriptions::Subscriptions;

pub const DRAGGING: &str = "dragging";
pub const DRAG_OVER: &str = "drag-over";

#[derive(Debug, Clone, PartialEq)]
enum DragListener {
    Item(String),
    Zone(String),
}

#[derive(Debug, Clone)]
struct DropZone {
    element: Element,
    items: Vec<String>,
}

/// Result of a successful drop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropOutcome {
    pub item: String,
    pub from: Option<String>,
    pub to: String,
}

pub struct DragDrop {
    items: Vec<Element>,
    zones: Vec<DropZone>,
    dragging: Option<String>,
    listeners: Subscriptions<DragListener>,
}

impl DragDrop {
    /// Items and zones are identified by their `id` attribute; elements
    /// without one are left alone
    pub fn new(items: Vec<Element>, zones: Vec<Element>) -> Self {
        let mut listeners = Subscriptions::new();

        let items: Vec<Element> = items
            .into_iter()
            .map(|mut item| {
                if let Some(id) = item.id().map(String::from) {
                    item.set_attr("draggable", "true");
                    item.set_attr("aria-grabbed", "false");
                    listeners.subscribe(DragListener::Item(id));
                }
                item
            })
            .collect();

        let zones = zones
            .into_iter()
            .map(|element| {
                if let Some(id) = element.id() {
                    listeners.subscribe(DragListener::Zone(id.to_string()));
                }
                DropZone {
                    element,
                    items: Vec::new(),
                }
            })
            .collect();

        Self {
            items,
            zones,
            dragging: None,
            listeners,
        }
    }

    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    pub fn item(&self, id: &str) -> Option<&Element> {
        self.items.iter().find(|i| i.id() == Some(id))
    }

    pub fn zone(&self, id: &str) -> Option<&Element> {
        self.zones.iter().find(|z| z.element.id() == Some(id)).map(|z| &z.element)
    }

    /// Item ids dropped into a zone, in drop order
    pub fn zone_items(&self, id: &str) -> &[String] {
        self.zones
            .iter()
            .find(|z| z.element.id() == Some(id))
            .map(|z| z.items.as_slice())
            .unwrap_or(&[])
    }

    fn item_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.items.iter_mut().find(|i| i.id() == Some(id))
    }

    fn zone_mut(&mut self, id: &str) -> Option<&mut DropZone> {
        self.zones.iter_mut().find(|z| z.element.id() == Some(id))
    }

    fn listens_to_zone(&self, id: &str) -> bool {
        self.listeners.is_subscribed(&DragListener::Zone(id.to_string()))
    }

    pub fn drag_start(&mut self, item_id: &str) -> bool {
        if !self.listeners.is_subscribed(&DragListener::Item(item_id.to_string())) {
            return false;
        }
        let Some(item) = self.item_mut(item_id) else {
            return false;
        };

        item.add_class(DRAGGING);
        item.set_attr("aria-grabbed", "true");
        self.dragging = Some(item_id.to_string());
        true
    }

    pub fn drag_enter(&mut self, zone_id: &str) {
        if self.dragging.is_none() || !self.listens_to_zone(zone_id) {
            return;
        }
        if let Some(zone) = self.zone_mut(zone_id) {
            zone.element.add_class(DRAG_OVER);
        }
    }

    pub fn drag_leave(&mut self, zone_id: &str) {
        if !self.listens_to_zone(zone_id) {
            return;
        }
        if let Some(zone) = self.zone_mut(zone_id) {
            zone.element.remove_class(DRAG_OVER);
        }
    }

    /// Move the dragged item into `zone_id`
    pub fn drop(&mut self, zone_id: &str) -> Option<DropOutcome> {
        if !self.listens_to_zone(zone_id) {
            return None;
        }
        let item_id = self.dragging.clone()?;
        self.zone_mut(zone_id)?;

        let mut from = None;
        for zone in &mut self.zones {
            if let Some(pos) = zone.items.iter().position(|i| *i == item_id) {
                zone.items.remove(pos);
                from = zone.element.id().map(String::from);
            }
        }

        if let Some(zone) = self.zone_mut(zone_id) {
            zone.element.remove_class(DRAG_OVER);
            zone.items.push(item_id.clone());
        }
        if let Some(item) = self.item_mut(&item_id) {
            item.set_attr("data-zone", zone_id);
        }

        debug!("Dropped {} into {}", item_id, zone_id);
        Some(DropOutcome {
            item: item_id,
            from,
            to: zone_id.to_string(),
        })
    }

    /// Clear drag styling whether or not the drop landed
    pub fn drag_end(&mut self) {
        if let Some(item_id) = self.dragging.take() {
            if let Some(item) = self.item_mut(&item_id) {
                item.remove_class(DRAGGING);
                item.set_attr("aria-grabbed", "false");
            }
        }
        for zone in &mut self.zones {
            zone.element.remove_class(DRAG_OVER);
        }
    }

    /// Detach every item and zone listener
    pub fn destroy(&mut self) {
        self.drag_end();
        let released = self.listeners.drain();
        debug!("Drag and drop torn down, released {} listeners", released.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> DragDrop {
        DragDrop::new(
            vec![
                Element::new("li").with_attr("id", "card-1"),
                Element::new("li").with_attr("id", "card-2"),
                Element::new("li"),
            ],
            vec![
                Element::new("ul").with_attr("id", "todo"),
                Element::new("ul").with_attr("id", "done"),
            ],
        )
    }

    #[test]
    fn test_items_are_marked_draggable() {
        let dd = board();
        assert_eq!(dd.item("card-1").unwrap().attr("draggable"), Some("true"));
        assert_eq!(dd.item("card-1").unwrap().attr("aria-grabbed"), Some("false"));
    }

    #[test]
    fn test_drag_and_drop_moves_item_between_zones() {
        let mut dd = board();

        assert!(dd.drag_start("card-1"));
        assert!(dd.item("card-1").unwrap().has_class(DRAGGING));

        dd.drag_enter("todo");
        assert!(dd.zone("todo").unwrap().has_class(DRAG_OVER));

        let outcome = dd.drop("todo").unwrap();
        assert_eq!(outcome, DropOutcome { item: "card-1".into(), from: None, to: "todo".into() });
        assert!(!dd.zone("todo").unwrap().has_class(DRAG_OVER));
        dd.drag_end();
        assert!(!dd.item("card-1").unwrap().has_class(DRAGGING));

        dd.drag_start("card-1");
        let outcome = dd.drop("done").unwrap();
        dd.drag_end();

        assert_eq!(outcome.from.as_deref(), Some("todo"));
        assert!(dd.zone_items("todo").is_empty());
        assert_eq!(dd.zone_items("done"), &["card-1".to_string()]);
        assert_eq!(dd.item("card-1").unwrap().attr("data-zone"), Some("done"));
    }

    #[test]
    fn test_drop_without_drag_or_unknown_zone_does_nothing() {
        let mut dd = board();
        assert_eq!(dd.drop("todo"), None);

        dd.drag_start("card-2");
        assert_eq!(dd.drop("archive"), None);
        assert!(!dd.drag_start("nope"));
    }

    #[test]
    fn test_drag_leave_clears_highlight() {
        let mut dd = board();
        dd.drag_start("card-2");
        dd.drag_enter("done");
        dd.drag_leave("done");
        assert!(!dd.zone("done").unwrap().has_class(DRAG_OVER));
    }

    #[test]
    fn test_destroy_detaches_everything() {
        let mut dd = board();
        dd.drag_start("card-1");
        dd.destroy();

        assert_eq!(dd.dragging(), None);
        assert!(!dd.drag_start("card-1"));
        assert_eq!(dd.drop("todo"), None);
    }
}
