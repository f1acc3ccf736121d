pub mod category;
pub mod gift;
pub mod giver;
pub mod user;

pub use category::CategoryRepository;
pub use gift::GiftRepository;
pub use giver::GiverRepository;
pub use user::UserRepository;
