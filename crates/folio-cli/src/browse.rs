// Line commands for the interactive browse mode
use folio_core::ControlEvent;

pub const HELP: &str = "Commands: sort <date|reading_time|category|none>, filter [value], search [query], more, quit";

#[derive(Debug, PartialEq, Eq)]
pub enum BrowseCommand {
    Event(ControlEvent),
    Quit,
}

impl BrowseCommand {
    /// `filter` and `search` without an argument clear them
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let event = match verb.to_lowercase().as_str() {
            "sort" => ControlEvent::SortChanged(rest.to_string()),
            "filter" => ControlEvent::FilterChanged(rest.to_string()),
            "search" => ControlEvent::SearchInput(rest.to_string()),
            "more" => ControlEvent::LoadMore,
            "quit" | "exit" | "q" => return Some(BrowseCommand::Quit),
            _ => return None,
        };
        Some(BrowseCommand::Event(event))
    }
}
