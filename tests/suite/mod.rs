mod config;
mod conversation;
