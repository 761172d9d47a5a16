use tether::doc;
use tether::multi::{self, Operand};
use tether::repository::Repository;
use tether_int_test::test_util::{cleanup, create_test_context, run_test};

use crate::repository::Ticket;

#[test]
fn test_save_inserts_first_then_updates() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();
            let operator = Repository::<Ticket>::new().operator(&scope)?;

            let mut ticket = Ticket {
                title: "printer on fire".to_string(),
                ..Default::default()
            };
            let first = operator.save_document(&mut ticket)?;
            assert!(!first.is_update());
            assert!(ticket.id.is_some());

            ticket.title = "printer extinguished".to_string();
            let second = operator.save_document(&mut ticket)?;
            assert!(second.is_update());

            let mut stored = Ticket {
                id: ticket.id,
                ..Default::default()
            };
            operator.load_document(&mut stored)?;
            assert_eq!(stored.title, "printer extinguished");
            assert_eq!(stored.saves, 2);
            assert_eq!(operator.count(&doc! {})?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}

#[test]
fn test_multi_save_round_trip_with_generated_id() {
    run_test(
        || create_test_context(),
        |ctx| {
            let scope = ctx.scope();

            let mut note = doc! { text: "draft" };
            multi::save(&scope, [Operand::collection("notes"), Operand::document(&mut note)])?;
            let outcome = multi::last_change_outcome(&scope).unwrap_or_default();
            assert!(!outcome.is_update());

            let id = multi::last_document_id(&scope).unwrap();

            let mut revised = doc! { text: "final" };
            let selector = doc! { _id: (id) };
            multi::save(
                &scope,
                [
                    Operand::collection("notes"),
                    Operand::selector(selector),
                    Operand::document(&mut revised),
                ],
            )?;
            let outcome = multi::last_change_outcome(&scope).unwrap_or_default();
            assert!(outcome.is_update());
            assert_eq!(multi::count(&scope, "notes", &doc! {})?, 1);
            Ok(())
        },
        |ctx| cleanup(ctx),
    )
}
