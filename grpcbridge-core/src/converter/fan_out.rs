//! Bounded fan-out/fan-in over scoped threads for per-entry transformations.
use std::{num::NonZeroUsize, thread};

/// Applies `f` to every item, spreading the work over the available cores once there are
/// at least `threshold` items. Smaller inputs are processed on the calling thread.
///
/// Results keep the input order. The first error found while joining is returned.
pub fn try_map<T, U, E, F>(items: Vec<T>, threshold: usize, f: F) -> Result<Vec<U>, E>
where
    T: Send,
    U: Send,
    E: Send,
    F: Fn(T) -> Result<U, E> + Sync,
{
    let workers = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);

    if workers < 2 || items.len() < threshold.max(2) {
        return items.into_iter().map(f).collect();
    }

    let total = items.len();
    let chunk_size = total.div_ceil(workers);
    let chunks = split_owned(items, chunk_size);
    let f = &f;

    tracing::trace!(total, chunks = chunks.len(), "fanning out");

    thread::scope(|scope| -> Result<Vec<U>, E> {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| scope.spawn(move || chunk.into_iter().map(f).collect::<Result<Vec<U>, E>>()))
            .collect();

        let mut out = Vec::with_capacity(total);
        for handle in handles {
            match handle.join() {
                Ok(part) => out.extend(part?),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        Ok(out)
    })
}

fn split_owned<T>(mut items: Vec<T>, chunk_size: usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::with_capacity(items.len().div_ceil(chunk_size));
    while !items.is_empty() {
        let rest = items.split_off(chunk_size.min(items.len()));
        chunks.push(std::mem::replace(&mut items, rest));
    }
    chunks
}
