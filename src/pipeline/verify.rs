//! Post-pass verification of the backup root.

use tracing::{debug, info, instrument};

use crate::backup::DestinationPlanner;
use crate::reference::MediaReference;

/// Recomputes every expected destination and reports which are absent.
///
/// "Missing" does not distinguish causes: never attempted, failed, or removed
/// after a successful pass all look the same here.
#[derive(Debug, Clone)]
pub struct Verifier {
    planner: DestinationPlanner,
}

impl Verifier {
    /// Creates a verifier over the same destinations the transfer pass used.
    #[must_use]
    pub fn new(planner: DestinationPlanner) -> Self {
        Self { planner }
    }

    /// References whose destination does not exist, or that have none.
    #[instrument(skip_all)]
    pub fn missing<'a, I>(&self, references: I) -> Vec<MediaReference>
    where
        I: IntoIterator<Item = &'a MediaReference>,
    {
        let mut checked = 0usize;
        let missing: Vec<MediaReference> = references
            .into_iter()
            .inspect(|_| checked += 1)
            .filter(|reference| {
                let present = self
                    .planner
                    .destination(reference)
                    .is_some_and(|dest| dest.try_exists().unwrap_or(false));
                if !present {
                    debug!(reference = %reference, "missing from backup");
                }
                !present
            })
            .cloned()
            .collect();
        info!(checked, missing = missing.len(), "Verification complete");
        missing
    }
}
