mod auth;
mod common;
mod database;
mod tag;
mod user;
