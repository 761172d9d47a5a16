use tether::doc;
use tether::errors::ErrorKind;
use tether::repository::Repository;
use tether_int_test::test_util::{cleanup, create_test_context, run_test};

use crate::repository::{entries, fail_on, journal, Account, Setting};

#[test]
fn test_documents_without_hooks_behave_as_store_calls() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = Repository::<Setting>::new().operator(&scope)?;

            let mut theme = Setting::new("theme", "dark");
            operator.insert(&mut theme)?;
            assert_eq!(ctx.stats().inserts(), 1);

            let mut lighter = Setting::new("theme", "light");
            operator.update(&doc! { _id: "theme" }, &mut lighter)?;
            assert_eq!(ctx.stats().updates(), 1);

            let mut locale = Setting::new("locale", "fr");
            let outcome = operator.save_document(&mut locale)?;
            assert!(!outcome.is_update());
            assert_eq!(ctx.stats().upserts(), 1);

            let stored = operator.search(doc! {}).sort(&["_id"]).get_all();
            assert_eq!(stored, vec![locale.clone(), lighter.clone()]);
            assert_eq!(lighter, Setting::new("theme", "light"));

            operator.delete(&doc! { _id: "theme" })?;
            operator.delete_document(&locale)?;
            assert_eq!(ctx.stats().removes(), 2);
            assert_eq!(operator.count(&doc! {})?, 0);
            assert_eq!(ctx.stats().writes(), 5);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_failing_on_insert_never_reaches_store() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let journal = journal(&scope);
            fail_on(&scope, "on_insert");
            let operator = Repository::<Account>::new().operator(&scope)?;

            let err = operator
                .insert(&mut Account::new("a1", "ada", 10))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::HookError);
            assert_eq!(err.message(), "on_insert rejected the document");
            assert_eq!(ctx.stats().inserts(), 0);
            assert_eq!(entries(&journal), vec!["on_insert:a1"]);
            assert_eq!(operator.count(&doc! {})?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_failing_before_hooks_leave_store_untouched() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = Repository::<Account>::new().operator(&scope)?;
            operator.insert(&mut Account::new("a1", "ada", 10))?;

            fail_on(&scope, "on_update");
            let mut changed = Account::new("a1", "ada", 99);
            assert!(operator.update_document(&mut changed).is_err());
            assert_eq!(ctx.stats().updates(), 0);

            fail_on(&scope, "on_save");
            assert!(operator.save_document(&mut changed).is_err());
            assert_eq!(ctx.stats().upserts(), 0);

            fail_on(&scope, "on_delete");
            assert!(operator.delete_document(&changed).is_err());
            assert!(operator.delete(&doc! { _id: "a1" }).is_err());
            assert_eq!(ctx.stats().removes(), 0);

            let stored = operator.search(doc! { _id: "a1" }).get_one();
            assert_eq!(stored.map(|a| a.balance), Some(10));
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_failing_after_hook_is_reported_after_commit() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            fail_on(&scope, "after_insert");
            let operator = Repository::<Account>::new().operator(&scope)?;

            let err = operator
                .insert(&mut Account::new("a1", "ada", 10))
                .unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::HookError);
            assert_eq!(ctx.stats().inserts(), 1);
            assert_eq!(operator.count(&doc! { _id: "a1" })?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_save_fires_exactly_one_branch_hook() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let journal = journal(&scope);
            let operator = Repository::<Account>::new().operator(&scope)?;

            let mut account = Account::new("a1", "ada", 10);
            let first = operator.save_document(&mut account)?;
            assert!(first.is_insert());
            assert_eq!(
                entries(&journal),
                vec!["on_save:a1", "after_insert:a1", "after_save(inserted):a1"]
            );

            journal.lock().unwrap().clear();
            account.balance = 20;
            let second = operator.save_document(&mut account)?;
            assert!(second.is_update());
            assert_eq!(second.updated_count(), 1);
            assert_eq!(
                entries(&journal),
                vec!["on_save:a1", "after_update:a1", "after_save(updated):a1"]
            );

            assert_eq!(operator.count(&doc! {})?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete_by_selector_fires_hooks_on_zero_value_once() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = Repository::<Account>::new().operator(&scope)?;
            operator.insert(&mut Account::new("a1", "ada", 10))?;
            operator.insert(&mut Account::new("a2", "alan", 10))?;

            let journal = journal(&scope);
            operator.delete(&doc! { balance: 10 })?;
            assert_eq!(entries(&journal), vec!["on_delete:zero", "after_delete:zero"]);
            assert_eq!(operator.count(&doc! {})?, 1);

            journal.lock().unwrap().clear();
            operator.delete_document(&Account::new("a2", "", 0))?;
            assert_eq!(entries(&journal), vec!["on_delete:a2", "after_delete:a2"]);
            assert_eq!(operator.count(&doc! {})?, 0);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
