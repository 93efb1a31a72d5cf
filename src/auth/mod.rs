pub mod accounts;
pub mod middleware;
pub mod session;
