use crate::PhiAccessError;
use indexmap::IndexSet;
use parking_lot::RwLock;

/// Default primary key attribute, never wrapped.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Declares which members of a record type are guarded.
///
/// Attributes are the persisted columns of the type; methods are derived
/// members that may be opted in with [`ModelBuilder::include_in_phi`].
/// Relations are accessors returning other records, and may extend access
/// with [`ModelBuilder::extend_phi_access`].
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    name: String,
    primary_key: String,
    attributes: Vec<String>,
    methods: Vec<String>,
    relations: Vec<String>,
    excluded: Vec<String>,
    included: Vec<String>,
    extended: Vec<String>,
}

impl ModelBuilder {
    /// Start describing the record type called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: DEFAULT_PRIMARY_KEY.to_owned(),
            attributes: Vec::new(),
            methods: Vec::new(),
            relations: Vec::new(),
            excluded: Vec::new(),
            included: Vec::new(),
            extended: Vec::new(),
        }
    }

    /// Name of the primary key attribute.
    pub fn primary_key(mut self, name: impl Into<String>) -> Self {
        self.primary_key = name.into();
        self
    }

    /// Persisted attributes. All of them are guarded unless excluded.
    pub fn attributes<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes.extend(names.into_iter().map(Into::into));
        self
    }

    /// Derived members that exist on the type but are not persisted.
    pub fn methods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.extend(names.into_iter().map(Into::into));
        self
    }

    /// Accessors returning related records.
    pub fn relations<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations.extend(names.into_iter().map(Into::into));
        self
    }

    /// Attributes left unguarded.
    pub fn exclude_from_phi<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded = names.into_iter().map(Into::into).collect();
        self
    }

    /// Methods guarded in addition to the attributes.
    pub fn include_in_phi<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.included = names.into_iter().map(Into::into).collect();
        self
    }

    /// Relations whose targets receive the grant of the record they are
    /// reached through.
    pub fn extend_phi_access<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extended = names.into_iter().map(Into::into).collect();
        self
    }

    /// Name of the described type.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn key_attribute(&self) -> &str {
        &self.primary_key
    }

    fn exists(&self, member: &str) -> bool {
        self.attributes.iter().any(|name| name == member)
            || self.methods.iter().any(|name| name == member)
    }

    fn is_relation(&self, member: &str) -> bool {
        self.relations.iter().any(|name| name == member)
            || self.methods.iter().any(|name| name == member)
    }

    /// Members to wrap: attributes, minus excluded, plus included, minus
    /// the primary key. Ordered and free of duplicates.
    fn wrap_candidates(&self) -> IndexSet<&str> {
        self.attributes
            .iter()
            .filter(|name| !self.excluded.contains(*name))
            .chain(self.included.iter())
            .map(String::as_str)
            .filter(|name| *name != self.primary_key)
            .collect()
    }
}

/// A registered record type and its guarded member tables.
#[derive(Debug)]
pub struct PhiModel {
    name: String,
    primary_key: String,
    wrapped: RwLock<IndexSet<String>>,
    extended: RwLock<IndexSet<String>>,
}

impl PhiModel {
    pub(crate) fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            wrapped: RwLock::new(IndexSet::new()),
            extended: RwLock::new(IndexSet::new()),
        }
    }

    /// Type name used in log lines and type-level stacks.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary key attribute.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Whether reads of `member` are guarded.
    pub fn wraps(&self, member: &str) -> bool {
        self.wrapped.read().contains(member)
    }

    /// Whether `relation` extends access to its targets.
    pub fn extends(&self, relation: &str) -> bool {
        self.extended.read().contains(relation)
    }

    /// Guarded members in registration order.
    pub fn wrapped_members(&self) -> Vec<String> {
        self.wrapped.read().iter().cloned().collect()
    }

    /// Extending relations in registration order.
    pub fn extended_relations(&self) -> Vec<String> {
        self.extended.read().iter().cloned().collect()
    }

    /// Applies `builder` on top of what is already wrapped. Returns the
    /// names that could not be wrapped because the type has no such member.
    ///
    /// Relation names are checked before anything changes, so a rejected
    /// configuration leaves the model untouched.
    pub(crate) fn apply(&self, builder: &ModelBuilder) -> Result<Vec<String>, PhiAccessError> {
        if let Some(name) = builder
            .extended
            .iter()
            .find(|name| !builder.is_relation(name))
        {
            return Err(PhiAccessError::UndefinedRelation {
                model: self.name.clone(),
                name: name.clone(),
            });
        }

        let mut missing = Vec::new();
        {
            let mut wrapped = self.wrapped.write();
            for candidate in builder.wrap_candidates() {
                if builder.exists(candidate) {
                    wrapped.insert(candidate.to_owned());
                } else {
                    missing.push(candidate.to_owned());
                }
            }
        }

        self.extended
            .write()
            .extend(builder.extended.iter().cloned());

        Ok(missing)
    }
}
