use std::collections::{BTreeSet, HashMap};

use crate::models::{CanonicalAggregate, Disposition, DispositionRecord, IncludedProduct};
use crate::store::DispositionStore;

/// Join aggregates with their disposition records.
///
/// Canonical names with no record get a pending one created through the
/// store's insert-if-absent primitive. Store failures are logged and the
/// affected aggregates fall back to `pending` with no replacement.
pub fn enrich(
    aggregates: Vec<CanonicalAggregate>,
    store: &dyn DispositionStore,
) -> Vec<IncludedProduct> {
    let names: BTreeSet<String> = aggregates
        .iter()
        .map(|a| a.canonical_name.clone())
        .collect();

    let mut records: HashMap<String, DispositionRecord> = HashMap::new();
    if !names.is_empty() {
        match store.fetch_dispositions(&names) {
            Ok(found) => {
                records.extend(found.into_iter().map(|r| (r.canonical_name.clone(), r)));
            }
            Err(err) => {
                tracing::warn!(error = %err, "could not fetch dispositions");
            }
        }
    }

    let missing: Vec<String> = names
        .into_iter()
        .filter(|n| !records.contains_key(n))
        .collect();

    for name in missing {
        match store.upsert_pending_disposition(&name) {
            Ok(record) => {
                tracing::debug!(canonical_name = %name, disposition = %record.disposition, "disposition resolved on insert");
                records.insert(name, record);
            }
            Err(err) => {
                tracing::warn!(canonical_name = %name, error = %err, "could not create pending disposition");
            }
        }
    }

    aggregates
        .into_iter()
        .map(|aggregate| {
            let record = records.remove(&aggregate.canonical_name);
            with_disposition(aggregate, record)
        })
        .collect()
}

fn with_disposition(
    aggregate: CanonicalAggregate,
    record: Option<DispositionRecord>,
) -> IncludedProduct {
    match record {
        Some(r) => IncludedProduct {
            aggregate,
            disposition: r.disposition,
            replacement_id: r.replacement_id,
            replacement_name: r.replacement_name,
            disposition_notes: r.notes,
        },
        None => IncludedProduct {
            aggregate,
            disposition: Disposition::Pending,
            replacement_id: None,
            replacement_name: None,
            disposition_notes: String::new(),
        },
    }
}
