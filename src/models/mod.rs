mod package;
mod setting;
mod transaction;
mod user;

pub use package::*;
pub use setting::*;
pub use transaction::*;
pub use user::*;
