//! SQLite database management

mod bonus_rules;
mod connection;
mod news;
mod products;
mod qr_codes;
mod settings;
mod transactions;
mod users;

pub use bonus_rules::*;
pub use connection::Database;
pub use news::*;
pub use products::*;
pub use qr_codes::*;
pub use settings::*;
pub use transactions::*;
pub use users::*;
