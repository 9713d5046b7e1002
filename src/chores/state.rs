use serde::{Deserialize, Serialize};

use crate::chores::models::Chore;

/// Derived lifecycle stage of a chore. Open chores serialize as the
/// empty string, matching the wire format the clients expect.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChoreStatus {
    #[serde(rename = "")]
    Open,
    Pending,
    Finished,
}

/// Action the viewer is permitted to take on a chore.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChoreAction {
    Accept,
    Withdraw,
    Finish,
    Nothing,
}

/// Derive a chore's status and the viewer's permitted action.
///
/// Pure and total: no I/O, never fails, same inputs always give the
/// same answer. This only computes UI affordances; the server-side
/// handlers re-validate against the stored record independently.
///
/// Evaluation order, first match wins:
/// 1. finished chore: nothing more can happen to it;
/// 2. accepted chore: requestor may withdraw, acceptor may finish;
/// 3. open chore: requestor may withdraw, anyone else may accept.
///
/// An absent viewer always yields `Nothing`.
pub fn resolve(chore: &Chore, viewer: Option<&str>) -> (ChoreStatus, ChoreAction) {
    if chore.finished_at.is_some() {
        return (ChoreStatus::Finished, ChoreAction::Nothing);
    }

    if let Some(acceptor) = &chore.acceptor {
        let action = match viewer {
            Some(v) if v == chore.requestor.id => ChoreAction::Withdraw,
            Some(v) if v == acceptor.id => ChoreAction::Finish,
            _ => ChoreAction::Nothing,
        };
        return (ChoreStatus::Pending, action);
    }

    let action = match viewer {
        Some(v) if v == chore.requestor.id => ChoreAction::Withdraw,
        Some(_) => ChoreAction::Accept,
        None => ChoreAction::Nothing,
    };
    (ChoreStatus::Open, action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chores::models::UserSnapshot;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn chore(acceptor: Option<&str>, finished: bool) -> Chore {
        let mut c = Chore::new(
            "hh-1".to_string(),
            "dishes".to_string(),
            "after dinner".to_string(),
            dec!(5),
            vec![],
            UserSnapshot {
                id: "requestor".to_string(),
                name: Some("Alice".to_string()),
            },
        );
        c.acceptor = acceptor.map(|id| UserSnapshot {
            id: id.to_string(),
            name: None,
        });
        if finished {
            c.finished_at = Some(Utc::now());
        }
        c
    }

    #[test]
    fn finished_chore_is_inert_for_every_viewer() {
        let c = chore(Some("acceptor"), true);
        for viewer in [Some("requestor"), Some("acceptor"), Some("other"), None] {
            assert_eq!(
                resolve(&c, viewer),
                (ChoreStatus::Finished, ChoreAction::Nothing)
            );
        }
    }

    #[test]
    fn open_chore_requestor_may_withdraw_others_may_accept() {
        let c = chore(None, false);
        assert_eq!(
            resolve(&c, Some("requestor")),
            (ChoreStatus::Open, ChoreAction::Withdraw)
        );
        assert_eq!(
            resolve(&c, Some("other")),
            (ChoreStatus::Open, ChoreAction::Accept)
        );
    }

    #[test]
    fn accepted_chore_splits_actions_by_party() {
        let c = chore(Some("acceptor"), false);
        assert_eq!(
            resolve(&c, Some("requestor")),
            (ChoreStatus::Pending, ChoreAction::Withdraw)
        );
        assert_eq!(
            resolve(&c, Some("acceptor")),
            (ChoreStatus::Pending, ChoreAction::Finish)
        );
        assert_eq!(
            resolve(&c, Some("bystander")),
            (ChoreStatus::Pending, ChoreAction::Nothing)
        );
    }

    #[test]
    fn absent_viewer_never_gets_an_action() {
        assert_eq!(
            resolve(&chore(None, false), None),
            (ChoreStatus::Open, ChoreAction::Nothing)
        );
        assert_eq!(
            resolve(&chore(Some("acceptor"), false), None),
            (ChoreStatus::Pending, ChoreAction::Nothing)
        );
    }

    #[test]
    fn open_status_serializes_as_empty_string() {
        assert_eq!(serde_json::to_string(&ChoreStatus::Open).unwrap(), "\"\"");
        assert_eq!(
            serde_json::to_string(&ChoreStatus::Pending).unwrap(),
            "\"Pending\""
        );
    }
}
