use serde::{Deserialize, Serialize};

/// Original sizes of both inputs, before any canvas reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDimensions {
    pub baseline_width: u32,
    pub baseline_height: u32,
    pub candidate_width: u32,
    pub candidate_height: u32,
}

impl ImageDimensions {
    pub fn has_size_mismatch(&self) -> bool {
        self.baseline_width != self.candidate_width
            || self.baseline_height != self.candidate_height
    }

    /// Size of the shared canvas both images are compared on.
    pub fn canvas(&self) -> (u32, u32) {
        (
            self.baseline_width.max(self.candidate_width),
            self.baseline_height.max(self.candidate_height),
        )
    }
}
