//! Randomized command sequences, asserting the book never crosses and every
//! bucket's counters stay consistent after each step.

use limit_engine_core::prelude::*;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Step {
    Place {
        uid: u64,
        order_id: u64,
        price: i64,
        size: i64,
        action: bool,
    },
    Cancel {
        uid: u64,
        order_id: u64,
    },
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        (1u64..5, 1u64..40, 90i64..110, 1i64..20, any::<bool>()).prop_map(
            |(uid, order_id, price, size, action)| Step::Place {
                uid,
                order_id,
                price,
                size,
                action,
            }
        ),
        (1u64..5, 1u64..40).prop_map(|(uid, order_id)| Step::Cancel { uid, order_id }),
    ]
}

fn place_request(uid: u64, order_id: u64, price: i64, size: i64, action: Action) -> Vec<u8> {
    let mut buf = vec![CommandOpcode::Place as u8];
    buf.extend(uid.to_be_bytes());
    buf.extend(order_id.to_be_bytes());
    buf.extend(price.to_be_bytes());
    buf.extend(0i64.to_be_bytes());
    buf.extend(size.to_be_bytes());
    buf.extend(0u32.to_be_bytes());
    buf.push(action as u8);
    buf.push(OrderKind::Gtc as u8);
    buf
}

fn cancel_request(uid: u64, order_id: u64) -> Vec<u8> {
    let mut buf = vec![CommandOpcode::Cancel as u8];
    buf.extend(uid.to_be_bytes());
    buf.extend(order_id.to_be_bytes());
    buf
}

proptest! {
    #[test]
    fn random_command_sequences_never_violate_book_invariants(steps in prop::collection::vec(step_strategy(), 1..60)) {
        let engine = MatchingEngine::new(SymbolSpec::new("XYZ", false));
        let mut out = [0u8; 512];

        for (i, step) in steps.into_iter().enumerate() {
            let request = match step {
                Step::Place { uid, order_id, price, size, action } => {
                    place_request(uid, order_id, price, size, if action { Action::Bid } else { Action::Ask })
                }
                Step::Cancel { uid, order_id } => cancel_request(uid, order_id),
            };
            let _ = dispatch(&engine, &request, 0, i as i64, &mut out, 0);

            prop_assert!(engine.verify_internal_state());
            prop_assert!(engine.is_uncrossed());
        }
    }
}
