pub mod client;
pub mod policy;
pub mod policy_client;

pub use client::Client;
pub use policy::Policy;
pub use policy_client::PolicyClientRow;
