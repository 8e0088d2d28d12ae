use log::LevelFilter;
use env_logger::Builder;
use std::io::Write;
use chrono::Local;

/// Installs the global logger. `RUST_LOG` still overrides the level chosen here.
pub fn init(verbose: bool) {
    let level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    Builder::new()
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level)
        // chromiumoxide reports every unknown CDP event at warn
        .filter(Some("chromiumoxide"), LevelFilter::Error)
        .parse_default_env()
        .init();

    log::debug!("Logger initialized at {}.", level);
}
