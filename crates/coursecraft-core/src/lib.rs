//! CourseCraft Core — domain models, repository trait contracts,
//! collaborator contracts (mail, identity providers), and the shared
//! error taxonomy.

pub mod error;
pub mod identity;
pub mod mail;
pub mod models;
pub mod repository;

pub use error::{CoreError, CoreResult};
