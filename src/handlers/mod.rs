// handlers/mod.rs - one module per resource
//
// /api/policy-clients  → listing
// /api/policies[/:id]  → policies
// /api/clients[/:id]   → clients
// /uploads/:file       → uploads
// /health              → health

pub mod clients;
pub mod health;
pub mod listing;
pub mod policies;
pub mod uploads;
