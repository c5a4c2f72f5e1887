pub mod activity;
pub mod application;
pub mod category;
pub mod item;
pub mod session;
pub mod setting;
pub mod website;

pub use activity::{ActivityEntry, ActivityLog};
pub use application::Application;
pub use category::Category;
pub use item::{ActiveItem, ItemKind};
pub use session::{PendingCandidate, Session, SessionRecord};
pub use setting::Setting;
pub use website::Website;
