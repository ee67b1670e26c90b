/// Named secondary index declared by a record type.
///
/// Column order is significant: it is the key order of the physical index.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Index {
    /// Index name, unique per database.
    pub name: String,
    /// Indexed columns in key order.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl Index {
    /// Declares a non-unique index over `columns`.
    pub fn new<I, S>(name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    /// Marks the index as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}
