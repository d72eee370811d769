pub mod account;
pub mod corporation;
pub mod file;
pub mod partner;
pub mod task;

pub use account::AccountRepository;
pub use corporation::CorporationRepository;
pub use file::FileRepository;
pub use partner::PartnerRepository;
pub use task::{TaskRepository, NEW_TASK_CHANNEL};
