//! Bounded cursor jitter
//!
//! Each click may move the cursor by a small random offset before the press
//! and move it back by the exact negation afterwards, so the net displacement
//! per click is zero. This module only picks the offset; the click cycle owns
//! the restore.

use rand::Rng;

/// Pick a random offset with both components in `[-radius, radius]`.
///
/// A radius of zero (or less) yields `(0, 0)`.
pub fn offset(radius: i32) -> (i32, i32) {
    if radius <= 0 {
        return (0, 0);
    }
    let mut rng = rand::thread_rng();
    (
        rng.gen_range(-radius..=radius),
        rng.gen_range(-radius..=radius),
    )
}
