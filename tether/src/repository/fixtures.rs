use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{from_value, Convertible, Document, Value};
use crate::doc;
use crate::errors::{ErrorKind, TetherError, TetherResult};
use crate::repository::{Entity, Hooks, PrimaryKey};
use crate::scope::Scope;
use crate::store::ChangeOutcome;
use crate::tether_builder::TetherBuilder;

const EVENTS: &str = "test.events";
const FAIL: &str = "test.fail";
const ASSIGN: &str = "test.assign";
const OUTCOME: &str = "test.outcome";

pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

/// A scope with an event log that [Note] hooks write into.
pub(crate) fn scope() -> (Scope, EventLog) {
    let scope = TetherBuilder::new().build().unwrap().scope();
    let events: EventLog = Arc::new(Mutex::new(Vec::new()));
    scope.set(EVENTS, events.clone());
    (scope, events)
}

/// Makes the hook named `hook` fail within `scope`.
pub(crate) fn fail_on(scope: &Scope, hook: &str) {
    scope.set(FAIL, hook.to_string());
}

/// Makes `on_save` and `on_load` give keyless notes the id `assigned`.
pub(crate) fn assign_ids(scope: &Scope) {
    scope.set(ASSIGN, true);
}

/// The outcome the last [Note] `after_save` received.
pub(crate) fn saved_outcome(scope: &Scope) -> Option<ChangeOutcome> {
    scope.get(OUTCOME)
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Note {
    pub id: String,
    pub body: String,
}

impl Note {
    pub fn new(id: &str, body: &str) -> Self {
        Note {
            id: id.to_string(),
            body: body.to_string(),
        }
    }

    fn assign_id(&mut self, scope: &Scope) {
        if self.id.is_empty() && scope.get::<bool>(ASSIGN).unwrap_or(false) {
            self.id = "assigned".to_string();
        }
    }

    fn record(&self, scope: &Scope, hook: &str) -> TetherResult<()> {
        if let Some(events) = scope.get::<EventLog>(EVENTS) {
            let who = if self.id.is_empty() { "zero" } else { &self.id };
            events.lock().push(format!("{}:{}", hook, who));
        }
        if scope.get::<String>(FAIL).as_deref() == Some(hook) {
            return Err(TetherError::new(
                &format!("{} refused", hook),
                ErrorKind::HookError,
            ));
        }
        Ok(())
    }
}

impl Convertible for Note {
    fn to_value(&self) -> TetherResult<Value> {
        let mut doc = doc! { body: (self.body.clone()) };
        if !self.id.is_empty() {
            doc.put("_id", self.id.clone())?;
        }
        Ok(Value::Document(doc))
    }

    fn from_value(value: &Value) -> TetherResult<Self> {
        let doc = value.as_document().cloned().unwrap_or_default();
        Ok(Note {
            id: from_value(doc.get("_id").unwrap_or(&Value::Null)).unwrap_or_default(),
            body: from_value(doc.get("body").unwrap_or(&Value::Null)).unwrap_or_default(),
        })
    }
}

impl Hooks for Note {
    fn on_load(&mut self, scope: &Scope) -> TetherResult<()> {
        self.assign_id(scope);
        self.record(scope, "on_load")
    }

    fn after_load(&mut self, scope: &Scope) -> TetherResult<()> {
        self.record(scope, "after_load")
    }

    fn on_insert(&mut self, scope: &Scope) -> TetherResult<()> {
        self.record(scope, "on_insert")
    }

    fn after_insert(&mut self, scope: &Scope) -> TetherResult<()> {
        self.record(scope, "after_insert")
    }

    fn on_update(&mut self, scope: &Scope, _selector: &Document) -> TetherResult<()> {
        self.record(scope, "on_update")
    }

    fn after_update(&mut self, scope: &Scope, _selector: &Document) -> TetherResult<()> {
        self.record(scope, "after_update")
    }

    fn on_delete(&self, scope: &Scope, _selector: &Document) -> TetherResult<()> {
        self.record(scope, "on_delete")
    }

    fn after_delete(&self, scope: &Scope, _selector: &Document) -> TetherResult<()> {
        self.record(scope, "after_delete")
    }

    fn on_save(&mut self, scope: &Scope) -> TetherResult<()> {
        self.assign_id(scope);
        self.record(scope, "on_save")
    }

    fn after_save(&mut self, scope: &Scope, outcome: &ChangeOutcome) -> TetherResult<()> {
        scope.set(OUTCOME, outcome.clone());
        self.record(scope, "after_save")
    }
}

impl Entity for Note {
    fn collection_name(&self) -> Option<String> {
        Some("notes".to_string())
    }

    fn load_selector(&self, scope: &Scope) -> Option<Document> {
        self.primary_key(scope).ok()
    }
}

impl PrimaryKey for Note {
    fn primary_key(&self, _scope: &Scope) -> TetherResult<Document> {
        if self.id.is_empty() {
            return Err(TetherError::new("note has no id", ErrorKind::ValidationError));
        }
        Ok(doc! { _id: (self.id.clone()) })
    }
}
