pub mod application {
    pub mod account_service;
    pub mod auth_service;
    pub mod ledger_service;
    pub mod user_service;
}

pub mod data {
    pub mod account_repository;
    pub mod ledger_repository;
    pub mod user_repository;
}

pub mod domain {
    pub mod error;
    pub mod models;
    pub mod repository;
    pub mod user;
    pub mod validation;
}

pub mod infrastructure {
    pub mod config;
    pub mod database;
    pub mod logging;
    pub mod security;
}

pub mod presentation {
    pub mod accounts;
    pub mod auth;
    pub mod handlers;
    pub mod middleware;
    pub mod routes;
    pub mod transactions;
    pub mod users;
}
