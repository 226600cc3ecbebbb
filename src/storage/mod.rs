pub mod directory;
pub mod mod_cache;
