//! Process configuration, read once from the environment at startup.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    /// Address the HTTP server binds to. `PORT`, default 8080.
    pub addr: SocketAddr,
    /// Directory holding the collection files. `DATA_DIR`, default `data`.
    pub data_dir: PathBuf,
    /// Directory of static assets served at `/`. `PUBLIC_DIR`, default `public`.
    pub public_dir: PathBuf,
    /// The admin kill switch gating mutating product routes. `ADMIN`,
    /// default true; `false` or `0` disable.
    pub admin: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(8080);

        let data_dir = std::env::var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let public_dir = std::env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public"));

        let admin = std::env::var("ADMIN")
            .map(|raw| !matches!(raw.trim(), "false" | "0"))
            .unwrap_or(true);

        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            data_dir,
            public_dir,
            admin,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080),
            data_dir: PathBuf::from("data"),
            public_dir: PathBuf::from("public"),
            admin: true,
        }
    }
}
