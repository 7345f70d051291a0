//! Fixed-size partitioning of file id sets for IN-clause queries.

/// Split `items` into ordered chunks of at most `batch_size`.
///
/// Deterministic and order-preserving: concatenating the chunks reproduces
/// the input. The last chunk may be smaller but is never empty; empty input
/// yields no chunks. A `batch_size` of zero is clamped to one.
///
/// # Examples
///
/// ```
/// use sf_files_dl::batch::partition;
///
/// let ids: Vec<u32> = (0..250).collect();
/// let sizes: Vec<usize> = partition(&ids, 100).map(<[u32]>::len).collect();
/// assert_eq!(sizes, [100, 100, 50]);
/// ```
pub fn partition<T>(items: &[T], batch_size: usize) -> impl Iterator<Item = &[T]> + '_ {
    items.chunks(batch_size.max(1))
}
