pub mod action;
pub mod capture;
pub mod config;
pub mod control;
pub mod decision;
pub mod geometry;
pub mod logger;
pub mod motion;
pub mod orchestrator;
pub mod overlay;
pub mod pilot;
pub mod platform;
pub mod scheduler;
pub mod types;
