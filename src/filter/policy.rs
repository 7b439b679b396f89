//! Buffering policy derived from which hooks are registered.
//!
//! Neither flag is configuration. Both are recomputed from the hook set.
//! Buffering is the default: only a hook set carrying both whole-buffer
//! transforms passes bytes downstream at write time.

use super::hooks::RewriteHookSet;

/// Whether incoming bytes are retained in the cache for completion.
///
/// True when any capture hook is present, or when either whole-buffer
/// transform is missing.
pub fn is_captured(hooks: &RewriteHookSet) -> bool {
    hooks.has_capture_bytes()
        || hooks.has_capture_text()
        || !hooks.has_transform_final_bytes()
        || !hooks.has_transform_final_text()
}

/// Whether downstream output is withheld until completion.
///
/// True when either whole-buffer transform is missing.
pub fn is_output_delayed(hooks: &RewriteHookSet) -> bool {
    !hooks.has_transform_final_bytes() || !hooks.has_transform_final_text()
}
