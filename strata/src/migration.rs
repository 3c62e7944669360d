use crate::errors::StrataResult;
use crate::session::Session;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Shared, callable schema change run with the engine's session.
pub type ActionFn = Arc<dyn Fn(&Session<'_>) -> StrataResult<()> + Send + Sync>;

/// A forward, reverse or schema-init action.
#[derive(Clone)]
pub struct Action {
    inner: ActionFn,
}

impl Action {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Session<'_>) -> StrataResult<()> + Send + Sync + 'static,
    {
        Action { inner: Arc::new(f) }
    }

    pub fn run(&self, session: &Session<'_>) -> StrataResult<()> {
        (self.inner)(session)
    }
}

impl Debug for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action(<fn>)")
    }
}

/// A single, named schema change.
///
/// # Purpose
/// Identifies one step of the schema history by an opaque identifier,
/// usually a sortable timestamp such as `"201608301400"`. A migration
/// always knows how to apply itself; knowing how to revert is optional
/// and a migration without a rollback action is simply irreversible.
///
/// # Characteristics
/// - Cheap to clone, actions are shared
/// - The identifier must be non-empty, unique within a registry and must not
///   be the reserved schema-init identifier
///
/// # Usage
/// ```ignore
/// let migration = Migration::new("201608301400", |session| {
///     session.execute("CREATE TABLE person (name TEXT)")
/// })
/// .with_description("create person table")
/// .with_rollback(|session| session.execute("DROP TABLE person"));
/// ```
#[derive(Clone)]
pub struct Migration {
    id: String,
    description: Option<String>,
    migrate: Action,
    rollback: Option<Action>,
}

impl Migration {
    /// Creates an irreversible migration.
    pub fn new<F>(id: &str, migrate: F) -> Self
    where
        F: Fn(&Session<'_>) -> StrataResult<()> + Send + Sync + 'static,
    {
        Migration {
            id: id.to_string(),
            description: None,
            migrate: Action::new(migrate),
            rollback: None,
        }
    }

    /// Adds a rollback action, making the migration reversible.
    pub fn with_rollback<F>(mut self, rollback: F) -> Self
    where
        F: Fn(&Session<'_>) -> StrataResult<()> + Send + Sync + 'static,
    {
        self.rollback = Some(Action::new(rollback));
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn is_reversible(&self) -> bool {
        self.rollback.is_some()
    }

    pub(crate) fn migrate_action(&self) -> &Action {
        &self.migrate
    }

    pub(crate) fn rollback_action(&self) -> Option<&Action> {
        self.rollback.as_ref()
    }
}

impl Debug for Migration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("id", &self.id)
            .field("description", &self.description)
            .field("reversible", &self.is_reversible())
            .finish()
    }
}
