/// Number of leading bytes inspected for magic-number detection. Matches
/// the probe captured by the staging writer; detection never needs more.
pub const PROBE_CAP: usize = 4100;

/// MIME type and canonical extension resolved from a content probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedType {
    pub mime: &'static str,
    pub extension: &'static str,
}

impl Default for DetectedType {
    /// Fallback for content with no recognizable signature.
    fn default() -> Self {
        Self {
            mime: "text/plain",
            extension: "txt",
        }
    }
}

/// Classifies content from at most the first [`PROBE_CAP`] bytes.
/// Returns `None` when no known signature matches.
pub fn detect(probe: &[u8]) -> Option<DetectedType> {
    let probe = &probe[..probe.len().min(PROBE_CAP)];
    infer::get(probe).map(|kind| DetectedType {
        mime: kind.mime_type(),
        extension: kind.extension(),
    })
}
