pub mod db;

pub use db::{
    create_db, delete_setting, flush_settings, get_setting, load_settings, put_setting, DbPool,
    StorageError,
};
