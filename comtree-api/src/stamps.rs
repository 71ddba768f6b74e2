use std::collections::BTreeMap;

/// Local wall-clock time at which a field was written
pub type Stamp = chrono::NaiveDateTime;

pub fn now() -> Stamp {
    chrono::Local::now().naive_local()
}

/// Per-field write times of a record.
///
/// Every field of the record has an entry from construction on, `None` meaning
/// the field was never written.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Stamps<F: Ord>(BTreeMap<F, Option<Stamp>>);

impl<F: Copy + Ord> Stamps<F> {
    pub fn empty(fields: &[F]) -> Stamps<F> {
        Stamps(fields.iter().map(|f| (*f, None)).collect())
    }

    pub fn get(&self, field: F) -> Option<Stamp> {
        self.0.get(&field).copied().flatten()
    }

    /// Stamp `field` with the current time, never moving its stamp backwards
    pub fn touch(&mut self, field: F) {
        let now = now();
        let slot = self.0.entry(field).or_insert(None);
        *slot = Some(match *slot {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }

    /// Override every stamp with `at`
    pub fn set_all(&mut self, at: Option<Stamp>) {
        for slot in self.0.values_mut() {
            *slot = at;
        }
    }

    pub fn latest(&self) -> Option<Stamp> {
        self.0.values().flatten().max().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, Option<Stamp>)> + '_ {
        self.0.iter().map(|(f, s)| (*f, *s))
    }
}
