/// Activation-key validation. The key set is fixed at build time; each key is
/// single-purpose and unlocks generation of the gated chapters for one
/// project. Validation is membership only: keys carry no structure beyond the
/// `SPN-` prefix.
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use tracing::debug;

static VALID_KEYS: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    BTreeSet::from([
        "SPN-CgbInU4mmneUddLHFI0vtWueQTDBMZpQ",
        "SPN-AHU6wZNqIQfwpoj78bgf3GrNTgKEEK1u",
        "SPN-ImFQ7zIvJELSihGh0iQ8f0vHwrfhHpFm",
        "SPN-QwhkgrbQNKrGe9G5PCADWPe8MH8YjAYl",
        "SPN-NUkARi3j0xhGwYoEKQPGNXMfKnPJ1ofh",
        "SPN-dDcVQSmvdfB6n0Kdxs7t13ZXi7H1R4rb",
        "SPN-qvZYsh3bNrnAIxiPXTLlVrWg1vOX46bk",
        "SPN-oIah1uLoT6AN9YK81ioBySoKwxamZPuL",
        "SPN-f1izd4xwLVibzlTlhe0khY0ksHcnLO8Z",
        "SPN-SBPdsBtL3d1oRUFH0EddUaOk0byX5hpo",
    ])
});

/// Check a user-entered activation key. Surrounding whitespace is forgiven;
/// the key itself is matched exactly.
pub fn validate_key(key: &str) -> bool {
    let valid = VALID_KEYS.contains(key.trim());
    if !valid {
        debug!("rejected activation key attempt");
    }
    valid
}
