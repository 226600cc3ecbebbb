pub mod mod_info;
pub mod server;
