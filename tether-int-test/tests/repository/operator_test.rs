use std::sync::Arc;

use tether::doc;
use tether::errors::ErrorKind;
use tether::repository::Repository;
use tether_int_test::test_util::{cleanup, create_test_context, run_test};

use crate::repository::{entries, journal, Account, Setting};

#[test]
fn test_load_document_not_found_skips_after_load() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let journal = journal(&scope);
            let operator = Repository::<Account>::new().operator(&scope)?;

            let mut missing = Account::new("ghost", "", 0);
            let err = operator.load_document(&mut missing).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::NotFound);
            assert_eq!(entries(&journal), vec!["on_load:ghost"]);
            assert_eq!(ctx.stats().cursor_closes(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_load_document_fills_by_primary_key() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = Repository::<Account>::new().operator(&scope)?;
            operator.insert(&mut Account::new("a1", "ada", 42))?;

            let journal = journal(&scope);
            let mut account = Account::new("a1", "", 0);
            operator.load_document(&mut account)?;
            assert_eq!(account, Account::new("a1", "ada", 42));
            assert_eq!(entries(&journal), vec!["on_load:a1", "after_load:a1"]);

            let err = operator.load_document(&mut Account::default()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_of_missing_document_is_not_found() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let journal = journal(&scope);
            let operator = Repository::<Account>::new().operator(&scope)?;

            let err = operator
                .update_document(&mut Account::new("a9", "", 0))
                .unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(entries(&journal), vec!["on_update:a9"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_operators_are_cached_per_scope() {
    run_test(
        || create_test_context(),
        |ctx| {
            let repository = Repository::<Setting>::new();
            let first_scope = ctx.scope();
            let second_scope = ctx.scope();

            let a = repository.operator(&first_scope)?;
            let b = repository.operator(&first_scope)?;
            let c = repository.operator(&second_scope)?;
            assert!(Arc::ptr_eq(&a, &b));
            assert!(!Arc::ptr_eq(&a, &c));
            assert_eq!(a.collection().name(), "settings");

            let archive = Repository::<Setting>::with_collection("settings_archive");
            let d = archive.operator(&first_scope)?;
            assert_eq!(d.collection().name(), "settings_archive");
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_scopes_share_data_but_not_sessions() {
    run_test(
        || create_test_context(),
        |ctx| {
            let writer = ctx.scope();
            Repository::<Setting>::new()
                .operator(&writer)?
                .insert(&mut Setting::new("mode", "fast"))?;
            writer.end();

            let reader = ctx.scope();
            let operator = Repository::<Setting>::new().operator(&reader)?;
            assert_eq!(operator.count(&doc! {})?, 1);

            let ended = writer.store().err().map(|e| e.kind().clone());
            assert_eq!(ended, Some(ErrorKind::ScopeEnded));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_operator_outliving_its_scope_fails() {
    run_test(
        || create_test_context(),
        |ctx| {
            let operator = {
                let scope = ctx.scope();
                Repository::<Setting>::new().operator(&scope)?
            };

            let err = operator
                .insert(&mut Setting::new("late", "yes"))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ScopeEnded);
            assert_eq!(ctx.stats().inserts(), 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
