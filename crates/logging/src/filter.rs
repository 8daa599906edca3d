// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

/// Builds the filter string that would otherwise have been set in `RUST_LOG`, e.g.
/// `crystal_editor=info,atomcad_logging=info`.
pub fn filter_string(crates: &[&'static str], log_level: log::LevelFilter) -> String {
    let level_str = match log_level {
        log::LevelFilter::Off => "off",
        log::LevelFilter::Error => "error",
        log::LevelFilter::Warn => "warn",
        log::LevelFilter::Info => "info",
        log::LevelFilter::Debug => "debug",
        log::LevelFilter::Trace => "trace",
    };
    crates
        .iter()
        .map(|&pkg_name| format!("{}={}", pkg_name.replace('-', "_"), level_str))
        .collect::<Vec<_>>()
        .join(",")
}


// End of File
