//! Integration tests for `SqliteStore` against an in-memory database.

use std::collections::HashSet;

use agree_core::{
  card::{CardKind, CardRender, SVG_CONTENT_TYPE},
  statement::{Content, NewStatement, Statement},
  store::{StatementStore, StoreError as _},
  vote::ToggleOutcome,
};
use chrono::Utc;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn content(text: &str) -> Content { Content::parse(text).unwrap() }

async fn root(s: &SqliteStore, text: &str) -> Statement {
  s.create_statement(NewStatement::root(content(text), Uuid::new_v4()))
    .await
    .unwrap()
}

async fn variant(s: &SqliteStore, parent: &Statement, text: &str) -> Statement {
  s.create_statement(NewStatement::variant(
    content(text),
    Uuid::new_v4(),
    parent.statement_id,
  ))
  .await
  .unwrap()
}

fn ids(statements: &[Statement]) -> Vec<Uuid> {
  statements.iter().map(|s| s.statement_id).collect()
}

fn is_not_found(err: &crate::Error, id: Uuid) -> bool {
  matches!(err.as_core(), Some(agree_core::Error::StatementNotFound(x)) if *x == id)
}

/// grandparent ─┬─ parent1 ─┬─ child1
///              │           └─ child2
///              └─ parent2 ─── child3
struct Family {
  grandparent: Statement,
  parent1:     Statement,
  parent2:     Statement,
  child1:      Statement,
  child2:      Statement,
  child3:      Statement,
}

async fn family(s: &SqliteStore) -> Family {
  let grandparent = root(s, "grandparent").await;
  let parent1 = variant(s, &grandparent, "parent 1").await;
  let parent2 = variant(s, &grandparent, "parent 2").await;
  let child1 = variant(s, &parent1, "child 1").await;
  let child2 = variant(s, &parent1, "child 2").await;
  let child3 = variant(s, &parent2, "child 3").await;
  Family { grandparent, parent1, parent2, child1, child2, child3 }
}

// ─── Statements ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_statement() {
  let s = store().await;
  let author = Uuid::new_v4();

  let created = s
    .create_statement(NewStatement::root(content("The world is round."), author))
    .await
    .unwrap();
  assert_eq!(created.content, "the world is round");
  assert_eq!(created.author_id, author);
  assert!(created.is_root());

  let fetched = s.get_statement(created.statement_id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
}

#[tokio::test]
async fn get_missing_statement_returns_none() {
  let s = store().await;
  assert!(s.get_statement(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn variant_of_missing_parent_is_not_found() {
  let s = store().await;
  let missing = Uuid::new_v4();

  let err = s
    .create_statement(NewStatement::variant(content("orphan"), Uuid::new_v4(), missing))
    .await
    .unwrap_err();
  assert!(is_not_found(&err, missing), "{err}");
  assert!(s.list_statement_ids().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_content_keeps_lineage() {
  let s = store().await;
  let parent = root(&s, "parent statement").await;
  let child = variant(&s, &parent, "child statement").await;

  let updated = s
    .update_content(child.statement_id, content("Updated content."))
    .await
    .unwrap();
  assert_eq!(updated.content, "updated content");
  assert_eq!(updated.parent_id, Some(parent.statement_id));
  assert_eq!(updated.author_id, child.author_id);
  assert_eq!(updated.created_at, child.created_at);
}

#[tokio::test]
async fn update_missing_statement_is_not_found() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s.update_content(missing, content("anything")).await.unwrap_err();
  assert!(is_not_found(&err, missing));
}

#[tokio::test]
async fn delete_leaf_removes_votes() {
  let s = store().await;
  let parent = root(&s, "parent").await;
  let child = variant(&s, &parent, "child").await;
  let voter = Uuid::new_v4();
  s.toggle_vote(voter, child.statement_id, false).await.unwrap();

  s.delete_statement(child.statement_id).await.unwrap();

  assert!(s.get_statement(child.statement_id).await.unwrap().is_none());
  assert!(s.votes_of(voter).await.unwrap().is_empty());
  assert_eq!(s.descendant_count(parent.statement_id).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_with_variants_is_refused() {
  let s = store().await;
  let parent = root(&s, "parent").await;
  variant(&s, &parent, "child").await;

  let err = s.delete_statement(parent.statement_id).await.unwrap_err();
  assert!(matches!(
    err.as_core(),
    Some(agree_core::Error::HasVariants(id)) if *id == parent.statement_id
  ));
  assert!(s.get_statement(parent.statement_id).await.unwrap().is_some());
}

#[tokio::test]
async fn delete_missing_is_not_found() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s.delete_statement(missing).await.unwrap_err();
  assert!(is_not_found(&err, missing));
}

// ─── Hierarchy ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn children_in_creation_order() {
  let s = store().await;
  let f = family(&s).await;

  let children = s.children_of(f.grandparent.statement_id).await.unwrap();
  assert_eq!(ids(&children), vec![f.parent1.statement_id, f.parent2.statement_id]);
  assert!(s.children_of(f.child1.statement_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn ancestors_nearest_first() {
  let s = store().await;
  let f = family(&s).await;

  let ancestors = s.ancestors_of(f.child2.statement_id).await.unwrap();
  assert_eq!(
    ids(&ancestors),
    vec![f.parent1.statement_id, f.grandparent.statement_id]
  );
  assert!(s.ancestors_of(f.grandparent.statement_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn descendants_at_every_depth() {
  let s = store().await;
  let f = family(&s).await;

  let descendants: HashSet<Uuid> = ids(&s.descendants_of(f.grandparent.statement_id).await.unwrap())
    .into_iter()
    .collect();
  let expected: HashSet<Uuid> = [&f.parent1, &f.parent2, &f.child1, &f.child2, &f.child3]
    .iter()
    .map(|st| st.statement_id)
    .collect();
  assert_eq!(descendants, expected);

  let under_parent1 = s.descendants_of(f.parent1.statement_id).await.unwrap();
  assert_eq!(ids(&under_parent1), vec![f.child1.statement_id, f.child2.statement_id]);
  assert!(s.descendants_of(f.child1.statement_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn descendant_count_is_recursive() {
  let s = store().await;
  let f = family(&s).await;

  assert_eq!(s.descendant_count(f.grandparent.statement_id).await.unwrap(), 5);
  assert_eq!(s.descendant_count(f.parent1.statement_id).await.unwrap(), 2);
  assert_eq!(s.descendant_count(f.parent2.statement_id).await.unwrap(), 1);
  assert_eq!(s.descendant_count(f.child3.statement_id).await.unwrap(), 0);
}

#[tokio::test]
async fn hierarchy_queries_on_unknown_id_are_not_found() {
  let s = store().await;
  let missing = Uuid::new_v4();
  assert!(is_not_found(&s.ancestors_of(missing).await.unwrap_err(), missing));
  assert!(is_not_found(&s.descendants_of(missing).await.unwrap_err(), missing));
  assert!(is_not_found(&s.children_of(missing).await.unwrap_err(), missing));
  assert!(is_not_found(&s.descendant_count(missing).await.unwrap_err(), missing));
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn toggle_on_then_off() {
  let s = store().await;
  let st = root(&s, "test statement").await;
  let voter = Uuid::new_v4();

  let first = s.toggle_vote(voter, st.statement_id, false).await.unwrap();
  assert_eq!(first, ToggleOutcome::Voted { replaced: vec![] });
  assert!(s.has_voted(voter, st.statement_id).await.unwrap());

  let second = s.toggle_vote(voter, st.statement_id, false).await.unwrap();
  assert_eq!(second, ToggleOutcome::Unvoted);
  assert!(!s.has_voted(voter, st.statement_id).await.unwrap());

  let third = s.toggle_vote(voter, st.statement_id, false).await.unwrap();
  assert!(matches!(third, ToggleOutcome::Voted { .. }));
  assert_eq!(s.vote_count(st.statement_id).await.unwrap(), 1);
}

#[tokio::test]
async fn toggle_on_unknown_statement_is_not_found() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s.toggle_vote(Uuid::new_v4(), missing, true).await.unwrap_err();
  assert!(is_not_found(&err, missing));
}

#[tokio::test]
async fn no_voted_ancestors_never_pends() {
  let s = store().await;
  let f = family(&s).await;
  let voter = Uuid::new_v4();

  // A sibling branch vote is not an ancestor conflict.
  s.toggle_vote(voter, f.parent2.statement_id, false).await.unwrap();
  let outcome = s.toggle_vote(voter, f.child1.statement_id, false).await.unwrap();
  assert!(!outcome.is_pending());
}

#[tokio::test]
async fn voted_ancestor_without_confirmation_changes_nothing() {
  let s = store().await;
  let parent = root(&s, "parent statement").await;
  let child = variant(&s, &parent, "child statement").await;
  let voter = Uuid::new_v4();
  s.toggle_vote(voter, parent.statement_id, false).await.unwrap();

  let outcome = s.toggle_vote(voter, child.statement_id, false).await.unwrap();
  assert_eq!(
    outcome,
    ToggleOutcome::ConflictPending {
      statement_id:      child.statement_id,
      ancestor_contents: vec!["parent statement".into()],
    }
  );
  assert!(s.has_voted(voter, parent.statement_id).await.unwrap());
  assert!(!s.has_voted(voter, child.statement_id).await.unwrap());
}

#[tokio::test]
async fn pending_lists_every_voted_ancestor_nearest_first() {
  let s = store().await;
  let grandparent = root(&s, "grandparent").await;
  let parent = variant(&s, &grandparent, "parent").await;
  let child = variant(&s, &parent, "child").await;
  let voter = Uuid::new_v4();

  // Reconciliation bypasses conflict detection, so both ancestors can be
  // voted at once.
  let added = s
    .reconcile_votes(voter, &[grandparent.statement_id, parent.statement_id])
    .await
    .unwrap();
  assert_eq!(added, 2);

  let outcome = s.toggle_vote(voter, child.statement_id, false).await.unwrap();
  assert_eq!(
    outcome,
    ToggleOutcome::ConflictPending {
      statement_id:      child.statement_id,
      ancestor_contents: vec!["parent".into(), "grandparent".into()],
    }
  );
}

#[tokio::test]
async fn confirmed_vote_replaces_all_ancestor_votes() {
  let s = store().await;
  let grandparent = root(&s, "grandparent").await;
  let parent = variant(&s, &grandparent, "parent").await;
  let child = variant(&s, &parent, "child").await;
  let voter = Uuid::new_v4();
  s.reconcile_votes(voter, &[grandparent.statement_id, parent.statement_id])
    .await
    .unwrap();

  let outcome = s.toggle_vote(voter, child.statement_id, true).await.unwrap();
  assert_eq!(
    outcome,
    ToggleOutcome::Voted {
      replaced: vec![parent.statement_id, grandparent.statement_id],
    }
  );
  assert_eq!(s.votes_of(voter).await.unwrap(), vec![child.statement_id]);
}

#[tokio::test]
async fn confirmation_without_conflict_is_a_plain_vote() {
  let s = store().await;
  let st = root(&s, "lonely").await;
  let voter = Uuid::new_v4();
  let outcome = s.toggle_vote(voter, st.statement_id, true).await.unwrap();
  assert_eq!(outcome, ToggleOutcome::Voted { replaced: vec![] });
}

#[tokio::test]
async fn descendant_votes_are_left_alone() {
  let s = store().await;
  let parent = root(&s, "parent").await;
  let child = variant(&s, &parent, "child").await;
  let voter = Uuid::new_v4();
  s.toggle_vote(voter, child.statement_id, false).await.unwrap();

  let outcome = s.toggle_vote(voter, parent.statement_id, false).await.unwrap();
  assert_eq!(outcome, ToggleOutcome::Voted { replaced: vec![] });
  assert!(s.has_voted(voter, child.statement_id).await.unwrap());
}

#[tokio::test]
async fn voters_do_not_interfere() {
  let s = store().await;
  let parent = root(&s, "parent").await;
  let child = variant(&s, &parent, "child").await;
  let alice = Uuid::new_v4();
  let bob = Uuid::new_v4();

  s.toggle_vote(alice, parent.statement_id, false).await.unwrap();
  let outcome = s.toggle_vote(bob, child.statement_id, false).await.unwrap();
  assert!(!outcome.is_pending());
  assert!(s.has_voted(alice, parent.statement_id).await.unwrap());
}

// ─── Reconciliation ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reconcile_skips_unknown_and_already_voted() {
  let s = store().await;
  let a = root(&s, "first").await;
  let b = root(&s, "second").await;
  let voter = Uuid::new_v4();
  s.toggle_vote(voter, a.statement_id, false).await.unwrap();

  let added = s
    .reconcile_votes(voter, &[a.statement_id, Uuid::new_v4(), b.statement_id, b.statement_id])
    .await
    .unwrap();
  assert_eq!(added, 1);
  assert_eq!(s.vote_count(a.statement_id).await.unwrap(), 1);
  assert_eq!(s.vote_count(b.statement_id).await.unwrap(), 1);
}

#[tokio::test]
async fn reconcile_empty_list() {
  let s = store().await;
  assert_eq!(s.reconcile_votes(Uuid::new_v4(), &[]).await.unwrap(), 0);
}

// ─── Rankings and search ─────────────────────────────────────────────────────

#[tokio::test]
async fn top_by_votes_orders_by_count() {
  let s = store().await;
  let quiet = root(&s, "quiet").await;
  let popular = root(&s, "popular").await;
  let middling = root(&s, "middling").await;

  for _ in 0..3 {
    s.toggle_vote(Uuid::new_v4(), popular.statement_id, false).await.unwrap();
  }
  s.toggle_vote(Uuid::new_v4(), middling.statement_id, false).await.unwrap();

  let top = s.top_by_votes(10).await.unwrap();
  let order: Vec<Uuid> = top.iter().map(|r| r.statement.statement_id).collect();
  assert_eq!(
    order,
    vec![popular.statement_id, middling.statement_id, quiet.statement_id]
  );
  assert_eq!(top[0].score, 3);
  assert_eq!(top[2].score, 0);

  assert_eq!(s.top_by_votes(1).await.unwrap().len(), 1);
}

#[tokio::test]
async fn top_by_descendants_skips_leaves() {
  let s = store().await;
  let f = family(&s).await;

  let top = s.top_by_descendants(10).await.unwrap();
  let ranked: Vec<(Uuid, u64)> = top.iter().map(|r| (r.statement.statement_id, r.score)).collect();
  assert_eq!(
    ranked,
    vec![
      (f.grandparent.statement_id, 5),
      (f.parent1.statement_id, 2),
      (f.parent2.statement_id, 1),
    ]
  );
}

#[tokio::test]
async fn most_recent_is_newest_first() {
  let s = store().await;
  let a = root(&s, "first").await;
  let b = root(&s, "second").await;
  let c = root(&s, "third").await;

  let recent = s.most_recent(2).await.unwrap();
  assert_eq!(ids(&recent), vec![c.statement_id, b.statement_id]);
  assert_eq!(s.list_statement_ids().await.unwrap(), ids(&[a, b, c]));
}

#[tokio::test]
async fn search_is_case_insensitive_and_literal() {
  let s = store().await;
  root(&s, "cats are Great").await;
  root(&s, "dogs are loyal").await;
  root(&s, "100% of people breathe").await;

  let hits = s.search("GREAT", 10).await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].content, "cats are Great");

  assert_eq!(s.search("are", 10).await.unwrap().len(), 2);
  assert_eq!(s.search("%", 10).await.unwrap().len(), 1);
  assert!(s.search("_ats", 10).await.unwrap().is_empty());
}

// ─── Card cache ──────────────────────────────────────────────────────────────

fn card(statement_id: Uuid, kind: CardKind, body: &str) -> CardRender {
  CardRender {
    statement_id,
    kind,
    content_type: SVG_CONTENT_TYPE.into(),
    body: body.as_bytes().to_vec(),
    etag: format!("\"{body}\""),
    rendered_at: Utc::now(),
  }
}

#[tokio::test]
async fn cards_are_replaced_as_a_set() {
  let s = store().await;
  let st = root(&s, "render me").await;
  let id = st.statement_id;

  assert!(s.get_card(id, CardKind::Square).await.unwrap().is_none());

  s.put_cards(id, vec![card(id, CardKind::Square, "v1"), card(id, CardKind::Og, "v1")])
    .await
    .unwrap();
  let square = s.get_card(id, CardKind::Square).await.unwrap().unwrap();
  assert_eq!(square.body, b"v1");
  assert_eq!(square.kind, CardKind::Square);

  s.put_cards(id, vec![card(id, CardKind::Square, "v2")]).await.unwrap();
  assert_eq!(s.get_card(id, CardKind::Square).await.unwrap().unwrap().body, b"v2");
  assert!(s.get_card(id, CardKind::Og).await.unwrap().is_none());
}

#[tokio::test]
async fn cards_for_deleted_statement_are_rejected() {
  let s = store().await;
  let st = root(&s, "short lived").await;
  let id = st.statement_id;
  s.put_cards(id, vec![card(id, CardKind::Social, "v1")]).await.unwrap();

  s.delete_statement(id).await.unwrap();
  assert!(s.get_card(id, CardKind::Social).await.unwrap().is_none());

  let err = s.put_cards(id, vec![card(id, CardKind::Social, "v2")]).await.unwrap_err();
  assert!(is_not_found(&err, id));
}

// ─── Vote invariant ──────────────────────────────────────────────────────────

mod invariant {
  use std::collections::HashMap;

  use proptest::prelude::*;

  use super::*;

  /// Parent index of each node in a fixed forest; `None` marks a root.
  const SHAPE: &[Option<usize>] = &[
    None,    // 0
    Some(0), // 1
    Some(0), // 2
    Some(1), // 3
    Some(3), // 4
    Some(2), // 5
    None,    // 6
    Some(6), // 7
  ];

  fn ancestors(node: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut cur = SHAPE[node];
    while let Some(p) = cur {
      out.push(p);
      cur = SHAPE[p];
    }
    out
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn toggles_never_leave_a_voted_ancestor(
      ops in prop::collection::vec((0usize..2, 0..SHAPE.len(), any::<bool>()), 1..40)
    ) {
      let rt = tokio::runtime::Runtime::new().unwrap();
      rt.block_on(async {
        let s = store().await;
        let mut nodes: Vec<Statement> = Vec::new();
        for (i, parent) in SHAPE.iter().enumerate() {
          let st = match parent {
            None => root(&s, &format!("node {i}")).await,
            Some(p) => variant(&s, &nodes[*p], &format!("node {i}")).await,
          };
          nodes.push(st);
        }
        let index: HashMap<Uuid, usize> =
          nodes.iter().enumerate().map(|(i, st)| (st.statement_id, i)).collect();
        let voters = [Uuid::new_v4(), Uuid::new_v4()];

        for (voter_idx, node, confirmed) in ops {
          let voter = voters[voter_idx];
          let before = s.votes_of(voter).await.unwrap();
          let target = nodes[node].statement_id;
          let outcome = s.toggle_vote(voter, target, confirmed).await.unwrap();
          let after = s.votes_of(voter).await.unwrap();
          let voted: HashSet<usize> = after.iter().map(|id| index[id]).collect();

          match outcome {
            ToggleOutcome::Unvoted => {
              assert!(!voted.contains(&node));
            }
            ToggleOutcome::Voted { .. } => {
              assert!(voted.contains(&node));
              for a in ancestors(node) {
                assert!(!voted.contains(&a), "ancestor {a} of {node} still voted");
              }
            }
            ToggleOutcome::ConflictPending { ancestor_contents, .. } => {
              assert!(!confirmed);
              assert!(!ancestor_contents.is_empty());
              assert_eq!(before, after);
            }
          }
        }
      });
    }

    #[test]
    fn top_down_voting_keeps_one_vote_per_path(
      picks in prop::collection::vec(0..SHAPE.len(), 1..20)
    ) {
      let rt = tokio::runtime::Runtime::new().unwrap();
      rt.block_on(async {
        let s = store().await;
        let mut nodes: Vec<Statement> = Vec::new();
        for (i, parent) in SHAPE.iter().enumerate() {
          let st = match parent {
            None => root(&s, &format!("node {i}")).await,
            Some(p) => variant(&s, &nodes[*p], &format!("node {i}")).await,
          };
          nodes.push(st);
        }
        let index: HashMap<Uuid, usize> =
          nodes.iter().enumerate().map(|(i, st)| (st.statement_id, i)).collect();
        let voter = Uuid::new_v4();

        // Visit picks shallowest first so no vote ever lands above an
        // existing one.
        let mut picks = picks;
        picks.sort_by_key(|n| ancestors(*n).len());
        for node in picks {
          if !s.has_voted(voter, nodes[node].statement_id).await.unwrap() {
            s.toggle_vote(voter, nodes[node].statement_id, true).await.unwrap();
          }
        }

        let voted: Vec<usize> =
          s.votes_of(voter).await.unwrap().iter().map(|id| index[id]).collect();
        for &a in &voted {
          for &b in &voted {
            assert!(!ancestors(b).contains(&a), "{a} is an ancestor of {b}");
          }
        }
      });
    }
  }
}
