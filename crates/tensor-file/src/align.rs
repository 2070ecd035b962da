//! Payload placement.

/// Round `position` up to the next multiple of `alignment`.
///
/// Alignments do not have to be powers of two. An alignment of zero leaves
/// the position unchanged; writers reject it before calling this.
#[inline]
pub fn align_up(position: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return position;
    }
    position.div_ceil(alignment) * alignment
}

/// Number of filler bytes needed to move `position` onto an alignment boundary.
#[inline]
pub fn padding_for(position: u64, alignment: u64) -> u64 {
    align_up(position, alignment) - position
}
