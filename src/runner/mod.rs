pub mod flatten;
pub mod manifest;
pub mod trim;

use crate::scan::{duplicate_destinations, PathPair};
use tracing::warn;

/// Colliding destinations are still written in walk order, so the last
/// source wins. Surface that before anything is touched.
pub(crate) fn warn_duplicate_destinations(pairs: &[PathPair]) {
    for destination in duplicate_destinations(pairs) {
        warn!(
            destination = %destination.display(),
            "several inputs map to the same output; later ones overwrite earlier ones"
        );
    }
}
