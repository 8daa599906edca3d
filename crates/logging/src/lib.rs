// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! # Crystal editor logging
//!
//! The editor libraries log through the [`log`] facade and never install a logger themselves.
//! Front ends call [`init`] once at startup, which uses [`env_logger`] to print records from the
//! listed crates.
//!
//! By default, the logging level is set to [`Info`](log::Level::Info) for debug builds, and
//! [`Warn`](log::Level::Warn) for release builds. This can be overridden by setting the `RUST_LOG`
//! environment variable, like so:
//!
//! ```sh
//! $> RUST_LOG=crystal_editor=debug crystal-editor info POSCAR
//! ```

mod filter;

pub use filter::filter_string;

/// Returns the default level for the current build profile.
pub fn default_level() -> log::LevelFilter {
    if cfg!(debug_assertions) {
        log::LevelFilter::Info
    } else {
        log::LevelFilter::Warn
    }
}

/// Initializes logging for `crates` at the build profile's default level.
pub fn init(crates: &[&'static str]) {
    init_with_level(crates, default_level());
}

/// Initializes logging for `crates` at `log_level`, unless `RUST_LOG` is set, in which case the
/// environment wins.  Calling this twice is harmless: the second call is ignored.
pub fn init_with_level(crates: &[&'static str], log_level: log::LevelFilter) {
    let mut builder = if std::env::var("RUST_LOG").is_err() {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(filter_string(crates, log_level)),
        )
    } else {
        env_logger::Builder::from_default_env()
    };
    builder.format_timestamp(None);

    // A logger may already be installed (tests, embedding applications).
    let _ = builder.try_init();
}

// End of File
