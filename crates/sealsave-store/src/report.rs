use sealsave_core::SaveError;

/// Outcome of one record inside a batch operation.
#[derive(Debug)]
pub struct BatchItem<T = ()> {
    /// Record name (file suffix).
    pub name: String,
    pub result: Result<T, SaveError>,
}

impl<T> BatchItem<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-record results of a batch, in input order.
#[derive(Debug)]
pub struct BatchReport<T = ()> {
    items: Vec<BatchItem<T>>,
}

impl<T> BatchReport<T> {
    pub fn new(items: Vec<BatchItem<T>>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[BatchItem<T>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when every record succeeded.
    pub fn is_complete(&self) -> bool {
        self.items.iter().all(BatchItem::is_ok)
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &BatchItem<T>> {
        self.items.iter().filter(|item| item.is_ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &SaveError)> {
        self.items.iter().filter_map(|item| match &item.result {
            Ok(_) => None,
            Err(err) => Some((item.name.as_str(), err)),
        })
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }
}
