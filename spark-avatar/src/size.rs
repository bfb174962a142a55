use std::ops::Bound;

use crate::{AvatarRecord, AvatarSizes};

/// Picks the record for `requested` out of the sizes available for a user.
///
/// An exact key wins. Otherwise the smallest size above the request is used,
/// and only when nothing larger exists the largest size below it.
pub fn resolve_nearest(sizes: &AvatarSizes, requested: u32) -> Option<&AvatarRecord> {
    if let Some(record) = sizes.get(&requested) {
        return Some(record);
    }

    sizes
        .range((Bound::Excluded(requested), Bound::Unbounded))
        .next()
        .or_else(|| sizes.range(..requested).next_back())
        .map(|(_, record)| record)
}
