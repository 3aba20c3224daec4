//! Price composition.
//!
//! `{UoA/tok} = {UoA/ref} * {ref/tok}`. The feed interval is scaled by the
//! exposed reference rate with the low bound rounded down and the high bound
//! rounded up, so the result always contains both exact products.

use vigil_fixed::Fix;
use vigil_types::PriceInterval;

/// Compose a `{UoA/ref}` interval with the exposed `{ref/tok}`.
///
/// An UNPRICED feed interval composes to UNPRICED, and so does a product too
/// large to represent.
pub fn compose(feed_interval: &PriceInterval, ref_per_tok: Fix) -> PriceInterval {
    feed_interval.scale(ref_per_tok)
}

/// Whether a composed price can be handed to consumers.
pub fn is_usable(price: &PriceInterval) -> bool {
    !price.is_unpriced() && !price.low().is_zero()
}
