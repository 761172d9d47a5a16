use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tether::doc;
use tether::errors::TetherResult;
use tether::repository::{Repository, RepositoryOperator};
use tether::scope::Scope;
use tether_int_test::test_util::{cleanup, create_test_context, run_test};

use crate::repository::{entries, fail_on, journal, panic_after_loading, Account};

fn seed(scope: &Scope, count: usize) -> TetherResult<Arc<RepositoryOperator<Account>>> {
    let operator = Repository::<Account>::new().operator(scope)?;
    for i in 1..=count {
        operator.insert(&mut Account::new(&format!("a{}", i), "owner", i as i64 * 10))?;
    }
    Ok(operator)
}

fn ids(accounts: &[Account]) -> Vec<&str> {
    accounts.iter().map(|a| a.id.as_str()).collect()
}

#[test]
fn test_all_reuses_two_slots_then_appends_three() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = seed(&scope, 5)?;
            let journal = journal(&scope);

            let mut accounts = Vec::with_capacity(16);
            accounts.push(Account::new("old-1", "", 0));
            accounts.push(Account::new("old-2", "", 0));
            operator.search(doc! {}).sort(&["_id"]).all(&mut accounts)?;

            assert_eq!(accounts.len(), 5);
            assert_eq!(ids(&accounts), vec!["a1", "a2", "a3", "a4", "a5"]);
            assert_eq!(
                entries(&journal),
                vec![
                    "on_load:old-1",
                    "after_load:a1",
                    "on_load:old-2",
                    "after_load:a2",
                    "on_load:zero",
                    "after_load:a3",
                    "on_load:zero",
                    "after_load:a4",
                    "on_load:zero",
                    "after_load:a5",
                ]
            );
            assert_eq!(ctx.stats().cursor_closes(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_all_truncates_surplus_slots() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = seed(&scope, 3)?;

            let mut accounts = vec![Account::default(); 7];
            operator.search(doc! {}).all(&mut accounts)?;
            assert_eq!(accounts.len(), 3);

            operator.search(doc! { owner: "nobody" }).all(&mut accounts)?;
            assert!(accounts.is_empty());
            assert_eq!(ctx.stats().cursor_closes(), 2);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_cursor_closed_once_when_after_load_panics() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = seed(&scope, 5)?;
            panic_after_loading(&scope, "a3");

            let mut accounts = Vec::new();
            let result = catch_unwind(AssertUnwindSafe(|| {
                operator.search(doc! {}).sort(&["_id"]).all(&mut accounts)
            }));

            assert!(result.is_err());
            assert_eq!(ctx.stats().finds(), 1);
            assert_eq!(ctx.stats().cursor_closes(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_failing_on_load_aborts_materialization() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = seed(&scope, 4)?;
            fail_on(&scope, "after_load");

            let mut accounts = vec![Account::new("kept", "", 0)];
            let err = operator.search(doc! {}).all(&mut accounts).unwrap_err();
            assert_eq!(err.message(), "after_load rejected the document");
            assert_eq!(ctx.stats().cursor_closes(), 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_one_reports_not_found_and_get_one_collapses_it() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = seed(&scope, 2)?;

            let mut account = Account::default();
            operator.search(doc! { balance: 20 }).one(&mut account)?;
            assert_eq!(account.id, "a2");

            let err = operator
                .search(doc! { balance: 999 })
                .one(&mut account)
                .unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(account.id, "a2");

            assert!(operator.search(doc! { balance: 999 }).get_one().is_none());
            fail_on(&scope, "on_load");
            assert!(operator.search(doc! { balance: 20 }).get_one().is_none());
            assert!(operator.search(doc! {}).get_all().is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_modifiers_are_order_independent() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = seed(&scope, 6)?;

            let first = operator
                .search(doc! { balance: { "$gt": 10 } })
                .sort(&["-balance"])
                .skip(1)
                .limit(3)
                .get_all();
            let second = operator
                .search(doc! { balance: { "$gt": 10 } })
                .limit(3)
                .skip(1)
                .sort(&["-balance"])
                .get_all();

            assert_eq!(ids(&first), vec!["a5", "a4", "a3"]);
            assert_eq!(first, second);

            let projected = operator
                .search(doc! { _id: "a1" })
                .select(doc! { balance: 1 })
                .get_one()
                .unwrap_or_default();
            assert_eq!(projected.balance, 10);
            assert!(projected.owner.is_empty());
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
