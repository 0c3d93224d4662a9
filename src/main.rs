//! The arbor binary: load the config, connect to X and run the manager.
use arbor::{config, x11::RustConn, Result, WindowManager};
use std::{env, path::PathBuf, process};
use tracing_subscriber::{prelude::*, EnvFilter};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let mut config_path: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-v" | "--version" => {
                println!("arbor {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "-c" | "--config" => config_path = args.next().map(PathBuf::from),
            other => {
                eprintln!("usage: arbor [-v|--version] [-c <config file>] (got '{other}')");
                process::exit(2);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .finish()
        .init();

    let path = match config_path {
        Some(p) => p,
        None => config::locate_or_install()?,
    };
    let config = config::load(&path)?;

    let conn = RustConn::new()?;
    let mut wm = WindowManager::new(config, Some(path), conn)?;

    wm.run()
}
