pub mod agent;
pub mod concierge;
pub mod errors;
pub mod location;
pub mod models;
pub mod prompt_template;
pub mod providers;
pub mod recommendation;
pub mod sources;
pub mod tools;
