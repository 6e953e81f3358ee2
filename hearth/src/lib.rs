pub mod app;
pub mod config;
pub mod conversation;
pub mod models;
pub mod packet;
pub mod user;
