//! SurrealDB repository implementations.

mod balance;
mod settings;
mod token;
mod user;

pub use balance::SurrealInstructorBalanceRepository;
pub use settings::SurrealUserSettingsRepository;
pub use token::SurrealTokenRepository;
pub use user::SurrealUserRepository;
