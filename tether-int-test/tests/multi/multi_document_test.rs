use tether::common::Document;
use tether::doc;
use tether::multi::{self, Operand};
use tether_int_test::test_util::{cleanup, create_test_context, run_test};

use crate::repository::{entries, fail_on, journal, Account, Setting};

#[test]
fn test_insert_heterogeneous_documents() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let journal = journal(&scope);

            let mut ada = Account::new("a1", "ada", 10);
            let mut theme = Setting::new("theme", "dark");
            let mut raw_one = doc! { kind: "audit", n: 1 };
            let mut raw_two = doc! { kind: "audit", n: 2 };

            multi::insert(
                &scope,
                [
                    Operand::collection("events"),
                    Operand::document(&mut raw_one),
                    Operand::document(&mut ada),
                    Operand::document(&mut theme),
                    Operand::collection("events"),
                    Operand::document(&mut raw_two),
                ],
            )?;

            assert_eq!(multi::count(&scope, "accounts", &doc! {})?, 1);
            assert_eq!(multi::count(&scope, "settings", &doc! {})?, 1);
            assert_eq!(multi::count(&scope, "events", &doc! { kind: "audit" })?, 2);
            assert_eq!(
                entries(&journal),
                vec![
                    "on_save:a1",
                    "on_insert:a1",
                    "after_insert:a1",
                    "after_save(inserted):a1"
                ]
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_insert_stops_at_first_rejected_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            fail_on(&scope, "on_insert");

            let mut theme = Setting::new("theme", "dark");
            let mut ada = Account::new("a1", "ada", 10);
            let mut locale = Setting::new("locale", "fr");
            let result = multi::insert(
                &scope,
                [
                    Operand::document(&mut theme),
                    Operand::document(&mut ada),
                    Operand::document(&mut locale),
                ],
            );

            assert!(result.is_err());
            assert_eq!(ctx.stats().inserts(), 1);
            assert_eq!(multi::count(&scope, "settings", &doc! {})?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_update_carries_selector_to_following_documents() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let mut first = doc! { slot: "a", v: 1 };
            let mut second = doc! { slot: "b", v: 1 };
            multi::insert(
                &scope,
                [
                    Operand::collection("slots"),
                    Operand::document(&mut first),
                    Operand::document(&mut second),
                ],
            )?;

            let mut replacement = doc! { slot: "a", v: 2 };
            let mut account = Account::new("a1", "ada", 10);
            multi::insert(&scope, [Operand::document(&mut account)])?;
            account.balance = 70;

            multi::update(
                &scope,
                [
                    Operand::collection("slots"),
                    Operand::selector(doc! { slot: "a" }),
                    Operand::document(&mut replacement),
                    Operand::document(&mut account),
                ],
            )?;

            assert_eq!(multi::count(&scope, "slots", &doc! { v: 2 })?, 1);
            assert_eq!(multi::count(&scope, "accounts", &doc! { balance: 70 })?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_delete_by_selector_and_by_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let mut ada = Account::new("a1", "ada", 10);
            let mut alan = Account::new("a2", "alan", 10);
            let mut theme = Setting::new("theme", "dark");
            multi::insert(
                &scope,
                [
                    Operand::document(&mut ada),
                    Operand::document(&mut alan),
                    Operand::document(&mut theme),
                ],
            )?;

            let journal = journal(&scope);
            multi::delete(
                &scope,
                [
                    Operand::collection("accounts"),
                    Operand::selector(doc! { _id: "a2" }),
                    Operand::document(&mut ada),
                    Operand::document(&mut theme),
                ],
            )?;

            assert_eq!(multi::count(&scope, "accounts", &doc! {})?, 0);
            assert_eq!(multi::count(&scope, "settings", &doc! {})?, 0);
            assert_eq!(entries(&journal), vec!["on_delete:a1", "after_delete:a1"]);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_find_fills_documents_and_sequences_on_fetch() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let mut accounts = [
                Account::new("a1", "ada", 10),
                Account::new("a2", "alan", 20),
                Account::new("a3", "grace", 30),
            ];
            let mut theme = Setting::new("theme", "dark");
            {
                let mut operands: Vec<Operand> =
                    accounts.iter_mut().map(Operand::document).collect();
                operands.push(Operand::document(&mut theme));
                multi::insert(&scope, operands)?;
            }

            let mut everyone: Vec<Account> = vec![Account::default()];
            let mut grace = Account::new("a3", "", 0);
            let mut setting = Setting::new("theme", "");
            let mut first_event = Document::new();
            let mut plan = multi::find(
                &scope,
                [
                    Operand::collection("accounts"),
                    Operand::sequence(&mut everyone),
                    Operand::document(&mut grace),
                    Operand::document(&mut setting),
                    Operand::collection("events"),
                    Operand::document(&mut first_event),
                ],
            );
            assert_eq!(plan.pending(), 4);
            assert_eq!(ctx.stats().finds(), 0);

            assert!(plan.fetch().unwrap_err().is_not_found());
            assert_eq!(plan.completed(), 3);
            assert_eq!(plan.pending(), 0);
            drop(plan);

            assert_eq!(everyone.len(), 3);
            assert_eq!(grace.owner, "grace");
            assert_eq!(setting.value, "dark");
            assert_eq!(ctx.stats().cursor_closes(), 4);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_save_stashes_outcome_per_document() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let journal = journal(&scope);
            let mut ada = Account::new("a1", "ada", 10);

            multi::save(&scope, [Operand::document(&mut ada)])?;
            assert_eq!(multi::last_change_outcome(&scope).map(|o| o.is_update()), Some(false));

            ada.balance = 15;
            multi::save(&scope, [Operand::document(&mut ada)])?;
            assert_eq!(multi::last_change_outcome(&scope).map(|o| o.is_update()), Some(true));
            assert_eq!(
                entries(&journal),
                vec![
                    "on_save:a1",
                    "after_insert:a1",
                    "after_save(inserted):a1",
                    "on_save:a1",
                    "after_update:a1",
                    "after_save(updated):a1"
                ]
            );
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
#[should_panic(expected = "No collection specified before the first document")]
fn test_document_without_collection_panics() {
    let ctx = create_test_context().unwrap();
    let scope = ctx.scope();
    let mut raw = doc! { a: 1 };
    let _ = multi::insert(&scope, [Operand::document(&mut raw)]);
}

#[test]
#[should_panic(expected = "No selector specified and the document provides none")]
fn test_update_without_selector_panics() {
    let ctx = create_test_context().unwrap();
    let scope = ctx.scope();
    let mut raw = doc! { a: 1 };
    let _ = multi::update(&scope, [Operand::collection("raw"), Operand::document(&mut raw)]);
}
