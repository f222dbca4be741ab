//! Common identity of the derived projections.

/// A derived view kept in the secondary store.
pub trait Projection: Send + Sync {
    /// Returns the name of this projection.
    fn name(&self) -> &'static str;

    /// Returns the collection the projection persists to.
    fn collection(&self) -> &'static str;
}

/// Records one write against a projection's collection.
pub(crate) fn record_write(collection: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(
        "projection_writes_total",
        "collection" => collection,
        "outcome" => outcome
    )
    .increment(1);
}
