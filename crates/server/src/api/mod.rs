pub mod audit;
pub mod handlers;
pub mod items;
pub mod middleware;
pub mod publish;
pub mod queue;
pub mod routes;
pub mod schedule;

pub use routes::create_router;
