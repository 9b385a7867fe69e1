pub mod app_config;
pub mod create_admin;
pub mod db;
pub mod directory;
pub mod middleware;
pub mod moderation;
pub mod orm;
pub mod session;
pub mod web;
