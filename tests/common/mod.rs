pub mod auth_server;
