mod hook_dispatch_test;
mod operator_test;
mod query_test;
mod save_round_trip_test;

use std::sync::{Arc, Mutex};

use tether::common::{Document, DocumentId};
use tether::errors::{ErrorKind, TetherError, TetherResult};
use tether::repository::Hooks;
use tether::scope::Scope;
use tether::store::ChangeOutcome;
use tether_derive::{Convertible, Entity};

const JOURNAL: &str = "it.journal";
const FAIL_ON: &str = "it.fail_on";
const PANIC_ON: &str = "it.panic_on";

pub type Journal = Arc<Mutex<Vec<String>>>;

/// Starts recording the hooks fired in `scope`.
pub fn journal(scope: &Scope) -> Journal {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    scope.set(JOURNAL, journal.clone());
    journal
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

/// Makes the hook named `hook` return an error within `scope`.
pub fn fail_on(scope: &Scope, hook: &str) {
    scope.set(FAIL_ON, hook.to_string());
}

/// Makes `after_load` panic for the account with id `id`.
pub fn panic_after_loading(scope: &Scope, id: &str) {
    scope.set(PANIC_ON, id.to_string());
}

fn record(scope: &Scope, hook: &str, who: &str) -> TetherResult<()> {
    if let Some(journal) = scope.get::<Journal>(JOURNAL) {
        let who = if who.is_empty() { "zero" } else { who };
        journal.lock().unwrap().push(format!("{}:{}", hook, who));
    }
    if scope.get::<String>(FAIL_ON).as_deref() == Some(hook) {
        return Err(TetherError::new(
            &format!("{} rejected the document", hook),
            ErrorKind::HookError,
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Convertible, Entity)]
#[entity(collection = "accounts", id = "id")]
pub struct Account {
    #[converter(rename = "_id")]
    pub id: String,
    pub owner: String,
    pub balance: i64,
}

impl Account {
    pub fn new(id: &str, owner: &str, balance: i64) -> Self {
        Account {
            id: id.to_string(),
            owner: owner.to_string(),
            balance,
        }
    }
}

impl Hooks for Account {
    fn on_load(&mut self, scope: &Scope) -> TetherResult<()> {
        record(scope, "on_load", &self.id)
    }

    fn after_load(&mut self, scope: &Scope) -> TetherResult<()> {
        if scope.get::<String>(PANIC_ON).as_deref() == Some(self.id.as_str()) {
            panic!("after_load gave up on {}", self.id);
        }
        record(scope, "after_load", &self.id)
    }

    fn on_insert(&mut self, scope: &Scope) -> TetherResult<()> {
        record(scope, "on_insert", &self.id)
    }

    fn after_insert(&mut self, scope: &Scope) -> TetherResult<()> {
        record(scope, "after_insert", &self.id)
    }

    fn on_update(&mut self, scope: &Scope, _selector: &Document) -> TetherResult<()> {
        record(scope, "on_update", &self.id)
    }

    fn after_update(&mut self, scope: &Scope, _selector: &Document) -> TetherResult<()> {
        record(scope, "after_update", &self.id)
    }

    fn on_delete(&self, scope: &Scope, _selector: &Document) -> TetherResult<()> {
        record(scope, "on_delete", &self.id)
    }

    fn after_delete(&self, scope: &Scope, _selector: &Document) -> TetherResult<()> {
        record(scope, "after_delete", &self.id)
    }

    fn on_save(&mut self, scope: &Scope) -> TetherResult<()> {
        record(scope, "on_save", &self.id)
    }

    fn after_save(&mut self, scope: &Scope, outcome: &ChangeOutcome) -> TetherResult<()> {
        let hook = if outcome.is_update() {
            "after_save(updated)"
        } else {
            "after_save(inserted)"
        };
        record(scope, hook, &self.id)
    }
}

/// A document type without any hook of its own.
#[derive(Debug, Clone, Default, PartialEq, Convertible, Entity)]
#[entity(collection = "settings", id = "key", default_hooks)]
pub struct Setting {
    #[converter(rename = "_id")]
    pub key: String,
    pub value: String,
}

impl Setting {
    pub fn new(key: &str, value: &str) -> Self {
        Setting {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Gets a store-style id on its first save.
#[derive(Debug, Clone, Default, PartialEq, Convertible, Entity)]
#[entity(collection = "tickets", id = "id")]
pub struct Ticket {
    #[converter(rename = "_id")]
    pub id: Option<DocumentId>,
    pub title: String,
    pub saves: u32,
}

impl Hooks for Ticket {
    fn on_save(&mut self, _scope: &Scope) -> TetherResult<()> {
        if self.id.is_none() {
            self.id = Some(DocumentId::new());
        }
        self.saves += 1;
        Ok(())
    }
}
