// Event-driven features
pub mod announcement;
pub mod gateway;
pub mod member_join;
pub mod welcome;
