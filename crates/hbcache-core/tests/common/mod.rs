pub mod cache_server;
