use std::path::{Path, PathBuf};

use clap::Parser;

use crate::users::AdminSeed;
use crate::write_gate::WriteMode;

#[derive(Parser, Debug)]
#[command(
    name = "animalandia-backend",
    about = "Product catalog and account API backed by JSON files"
)]
pub struct Cli {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port to listen on.
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    /// Directory holding the product and user files.
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Product collection file name inside the data directory.
    #[arg(long, default_value = "catfood.json")]
    pub products_file: String,

    /// User collection file name inside the data directory.
    #[arg(long, default_value = "users.json")]
    pub users_file: String,

    /// `serialized` queues mutations of each file behind a process-wide lock.
    /// `relaxed` lets overlapping writers race (last save wins).
    #[arg(long, value_enum, default_value_t = WriteMode::Relaxed)]
    pub write_mode: WriteMode,

    /// Display name of the seeded admin account.
    #[arg(long, default_value = "Admin")]
    pub admin_name: String,

    #[arg(long, default_value = "admin@animalandia.com")]
    pub admin_email: String,

    #[arg(long, default_value = "Admin123")]
    pub admin_password: String,
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub bind_addr: String,
    pub products_path: PathBuf,
    pub users_path: PathBuf,
    pub write_mode: WriteMode,
    pub admin: AdminSeed,
}

impl Cli {
    pub fn into_config(self) -> BackendConfig {
        BackendConfig {
            bind_addr: format!("{}:{}", self.host, self.port),
            products_path: self.data_dir.join(&self.products_file),
            users_path: self.data_dir.join(&self.users_file),
            write_mode: self.write_mode,
            admin: AdminSeed {
                name: self.admin_name,
                email: self.admin_email,
                password: self.admin_password,
            },
        }
    }
}

impl BackendConfig {
    /// Defaults with both files under `dir`, bound to an ephemeral local port.
    pub fn in_dir(dir: &Path) -> Self {
        BackendConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            products_path: dir.join("catfood.json"),
            users_path: dir.join("users.json"),
            write_mode: WriteMode::Relaxed,
            admin: AdminSeed::default(),
        }
    }
}
