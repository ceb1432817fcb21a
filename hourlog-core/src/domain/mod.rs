mod daily_log;
mod email;
mod error;
mod ids;
mod notification;
mod patch;
mod supervisor;
mod user;
mod weekly_report;

pub use daily_log::*;
pub use email::*;
pub use error::*;
pub use ids::*;
pub use notification::*;
pub use patch::*;
pub use supervisor::*;
pub use user::*;
pub use weekly_report::*;
