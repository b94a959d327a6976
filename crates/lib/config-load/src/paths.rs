//! Default configuration file locations.

use std::path::PathBuf;

use either::Either;

/// Default config file locations, most specific first.
pub fn defaults() -> impl Iterator<Item = PathBuf> {
    let config_dir = dirs::config_dir().into_iter().flat_map(|d| {
        [
            d.join("inbox-forwarder/config.yaml"),
            d.join("inbox-forwarder.yaml"),
        ]
    });
    let home_dir = dirs::home_dir().into_iter().flat_map(|d| {
        [
            d.join(".inbox-forwarder.yaml"),
            d.join(".inbox-forwarder/config.yaml"),
        ]
    });
    let system = std::iter::once_with(|| PathBuf::from("/etc/inbox-forwarder/config.yaml"));

    config_dir.chain(home_dir).chain(system)
}

/// An explicit path replaces the defaults entirely.
pub fn resolve(explicit: Option<PathBuf>) -> impl Iterator<Item = PathBuf> {
    match explicit {
        Some(path) => Either::Left(std::iter::once(path)),
        None => Either::Right(defaults()),
    }
}
