pub mod adapter;
pub mod ceye;
pub mod collaborator;
pub mod provider;
pub mod router;

pub use adapter::BackendAdapter;
pub use collaborator::{CollaboratorClient, CollaboratorProvider, Interaction, InteractionType};
pub use provider::OastBackend;
pub use router::create_backend;
