// Page widgets and the blog listing pipeline behind them
pub mod acquire;
pub mod blog_list;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod dom;
pub mod dragdrop;
pub mod error;
pub mod listing;
pub mod models;
pub mod navigation;
pub mod providers;
pub mod render;
pub mod source;
pub mod subscriptions;

pub use acquire::DataAcquirer;
pub use blog_list::{BlogList, BlogListRoot, ControlEvent, ListOptions, ListState, Role};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use dom::Element;
pub use dragdrop::{DragDrop, DropOutcome};
pub use error::Error;
pub use models::{BlogEntry, ReadingTime, SortBy};
pub use navigation::{NavOptions, Navigation, ScrollTarget, Section};
pub use source::BlogSource;

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
