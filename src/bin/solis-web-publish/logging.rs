use std::io::Write;

use chrono::Local;
use env_logger::{Builder, Env};

pub fn init_logger() {
    // everything goes to stderr at debug level unless RUST_LOG says otherwise
    Builder::from_env(Env::default().default_filter_or("debug"))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%dT%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();
}
