//! Integration tests for the SQLite stores against in-memory databases.

use std::sync::Arc;

use rand::{SeedableRng, rngs::StdRng};
use rusqlite::types::Value;
use sop_core::{
  annotation::{NewAnnotation, Rating, Ratings},
  annotator::{AnnotatorId, FunctionId, NewAnnotator},
  question::{NewQuestion, Question, QuestionId},
  sampling::Sampler,
  store::AnnotationStore,
};

use crate::{
  Error, Push, Pushed, QuestionBank, Row, RowArity, SqliteStore, StatementCatalog,
  guard::{guard_rows, guard_scalar},
  introspect::{get_insert_columns, validate_rows_for_table_db},
  schema::{ANNOTATION_TABLE, BACKUP_TABLE, FUNCTION_TABLE, QUESTION_TABLE, USER_TABLE},
};

fn catalog() -> Arc<StatementCatalog> { Arc::new(StatementCatalog::default()) }

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory(catalog())
    .await
    .expect("in-memory store")
}

async fn bank() -> QuestionBank {
  QuestionBank::open_in_memory(catalog())
    .await
    .expect("in-memory bank")
}

fn text(s: &str) -> Value { Value::Text(s.to_owned()) }

fn annotator(first: &str, function_id: FunctionId) -> NewAnnotator {
  NewAnnotator {
    first_name: first.into(),
    last_name: "Tester".into(),
    function_id,
    years_in_function: 3,
  }
}

fn ratings(score: i64) -> Ratings {
  let r = Rating::new(score).unwrap();
  Ratings { fluency: r, comprehensiveness: r, factuality: r }
}

fn question(id: i64) -> Question {
  Question {
    question_id:   QuestionId(id),
    question_text: format!("question {id}"),
    answer_text:   format!("answer {id}"),
    passage_text:  format!("passage {id}"),
  }
}

fn new_question(n: i64) -> NewQuestion {
  NewQuestion {
    question_text: format!("question {n}"),
    answer_text:   format!("answer {n}"),
    passage_text:  format!("passage {n}"),
  }
}

// ─── Schema introspection ────────────────────────────────────────────────────

#[tokio::test]
async fn insert_columns_skip_autoincrement_keys() {
  let s = store().await;
  let (function, user, annotations) = s
    .scoped(|tx, _| {
      Ok((
        get_insert_columns(tx, FUNCTION_TABLE)?,
        get_insert_columns(tx, USER_TABLE)?,
        get_insert_columns(tx, ANNOTATION_TABLE)?,
      ))
    })
    .await
    .unwrap();

  assert_eq!(function, ["name"]);
  assert_eq!(user, ["first_name", "last_name", "function_id", "years_in_function"]);
  assert_eq!(annotations.len(), 11);
  assert_eq!(annotations[0], "question_text");
  assert!(!annotations.iter().any(|c| c == "id"));
}

#[tokio::test]
async fn live_table_keeps_copied_question_id() {
  let b = bank().await;
  let (backup, live) = b
    .scoped(|tx, _| Ok((get_insert_columns(tx, BACKUP_TABLE)?, get_insert_columns(tx, QUESTION_TABLE)?)))
    .await
    .unwrap();

  assert_eq!(backup, ["question_text", "answer_text", "passage_text"]);
  assert_eq!(live, ["question_id", "question_text", "answer_text", "passage_text"]);
}

#[tokio::test]
async fn unknown_table_errors() {
  let s = store().await;
  let err = s
    .scoped(|tx, _| get_insert_columns(tx, "nope"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownTable(ref t) if t == "nope"));
}

#[tokio::test]
async fn arity_validation_reports_every_bad_row() {
  let s = store().await;
  let rows: Vec<Row> = vec![
    vec![text("a"), text("b"), Value::Integer(1)],
    vec![text("a"), text("b"), Value::Integer(1), Value::Integer(2)],
    vec![text("a"), text("b"), Value::Integer(1), Value::Integer(2), Value::Null],
  ];

  let err = s
    .scoped(move |tx, _| validate_rows_for_table_db(tx, USER_TABLE, &rows))
    .await
    .unwrap_err();

  let Error::Validation { expected, ref offending, .. } = err else {
    panic!("expected a validation error, got {err:?}");
  };
  assert_eq!(expected, 4);
  assert_eq!(offending, &[RowArity { index: 0, len: 3 }, RowArity { index: 2, len: 5 }]);

  let message = err.to_string();
  assert!(message.contains("row 0 has 3"), "{message}");
  assert!(message.contains("row 2 has 5"), "{message}");
}

#[tokio::test]
async fn arity_validation_returns_columns() {
  let s = store().await;
  let columns = s
    .scoped(|tx, _| validate_rows_for_table_db(tx, FUNCTION_TABLE, &[vec![text("Nurse")]]))
    .await
    .unwrap();
  assert_eq!(columns, ["name"]);
}

// ─── Duplicate guard ─────────────────────────────────────────────────────────

#[tokio::test]
async fn guard_scalar_signals_present_and_passes_absent() {
  let s = store().await;
  s.resolve_function("Nurse").await.unwrap();

  let (nurse, doctor) = s
    .scoped(|tx, catalog| {
      Ok((
        guard_scalar(tx, catalog, FUNCTION_TABLE, &["name"], "Nurse")?,
        guard_scalar(tx, catalog, FUNCTION_TABLE, &["name"], "Doctor")?,
      ))
    })
    .await
    .unwrap();

  assert_eq!(nurse, None);
  assert_eq!(doctor.as_deref(), Some("Doctor"));
}

#[tokio::test]
async fn guard_scalar_is_case_sensitive() {
  let s = store().await;
  s.resolve_function("Nurse").await.unwrap();

  let lower = s
    .scoped(|tx, catalog| guard_scalar(tx, catalog, FUNCTION_TABLE, &["name"], "nurse"))
    .await
    .unwrap();
  assert_eq!(lower.as_deref(), Some("nurse"));
}

#[tokio::test]
async fn guard_rows_filters_existing_tuples() {
  let s = store().await;
  let f = s.resolve_function("Nurse").await.unwrap();
  s.resolve_annotator(annotator("Ada", f)).await.unwrap();

  let existing: Row = vec![text("Ada"), text("Tester"), Value::Integer(f.0), Value::Integer(3)];
  let new: Row = vec![text("Bob"), text("Tester"), Value::Integer(f.0), Value::Integer(3)];
  let candidates = vec![existing, new.clone()];

  let fresh = s
    .scoped(move |tx, catalog| {
      let columns = get_insert_columns(tx, USER_TABLE)?;
      guard_rows(tx, catalog, USER_TABLE, &columns, candidates)
    })
    .await
    .unwrap();
  assert_eq!(fresh, vec![new]);
}

#[tokio::test]
async fn guard_rows_compares_positionally() {
  let s = store().await;
  let f = s.resolve_function("Nurse").await.unwrap();
  s.resolve_annotator(annotator("Ada", f)).await.unwrap();

  // Same values, first and last name swapped.
  let swapped: Row = vec![text("Tester"), text("Ada")];
  let fresh = s
    .scoped(move |tx, catalog| {
      guard_rows(tx, catalog, USER_TABLE, &["first_name", "last_name"], vec![swapped])
    })
    .await
    .unwrap();
  assert_eq!(fresh.len(), 1);
}

#[tokio::test]
async fn guard_rows_rejects_mismatched_width() {
  let s = store().await;
  let err = s
    .scoped(|tx, catalog| guard_rows(tx, catalog, FUNCTION_TABLE, &["name"], vec![vec![]]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation { expected: 1, .. }));
}

// ─── Functions and annotators ────────────────────────────────────────────────

#[tokio::test]
async fn function_resolution_is_idempotent() {
  let s = store().await;
  let first = s.resolve_function("Nurse").await.unwrap();
  let second = s.resolve_function("Nurse").await.unwrap();
  let other = s.resolve_function("Physician").await.unwrap();

  assert_eq!(first, second);
  assert_ne!(first, other);
  assert_eq!(s.counts().await.unwrap().functions, 2);

  let names: Vec<_> = s.functions().await.unwrap().into_iter().map(|f| f.name).collect();
  assert_eq!(names, ["Nurse", "Physician"]);
}

#[tokio::test]
async fn annotator_resolution_is_idempotent() {
  let s = store().await;
  let f = s.resolve_function("Nurse").await.unwrap();

  let first = s.resolve_annotator(annotator("Ada", f)).await.unwrap();
  let second = s.resolve_annotator(annotator("Ada", f)).await.unwrap();
  assert_eq!(first, second);
  assert_eq!(s.counts().await.unwrap().annotators, 1);

  // Any differing field is a different annotator.
  let mut senior = annotator("Ada", f);
  senior.years_in_function = 10;
  let third = s.resolve_annotator(senior).await.unwrap();
  assert_ne!(first, third);
  assert_eq!(s.annotators_by_name("Ada", "Tester").await.unwrap().len(), 2);
}

#[tokio::test]
async fn annotator_requires_existing_function() {
  let s = store().await;
  let err = s
    .resolve_annotator(annotator("Ada", FunctionId(42)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Sqlite(_)), "{err:?}");
  assert_eq!(s.counts().await.unwrap().annotators, 0);
}

#[tokio::test]
async fn push_dispatches_by_entity() {
  let s = store().await;
  let Pushed::Function(f) = s.push(Push::Function("Nurse".into())).await.unwrap() else {
    panic!("expected a function key");
  };
  let Pushed::Annotator(a) = s.push(Push::Annotator(annotator("Ada", f))).await.unwrap() else {
    panic!("expected an annotator key");
  };
  let pushed = s
    .push(Push::Annotation(NewAnnotation::accept(&question(1), a, ratings(4))))
    .await
    .unwrap();
  assert_eq!(pushed, Pushed::Annotation);

  let fetched = s.get_annotator(a).await.unwrap().unwrap();
  assert_eq!(fetched.function_id, f);
}

// ─── Annotations ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_annotation_is_rejected() {
  let s = store().await;
  let f = s.resolve_function("Nurse").await.unwrap();
  let a = s.resolve_annotator(annotator("Ada", f)).await.unwrap();

  let input = NewAnnotation::accept(&question(1), a, ratings(4));
  s.record_annotation(input.clone()).await.unwrap();
  let err = s.record_annotation(input).await.unwrap_err();

  assert!(matches!(err, Error::DuplicateEntry { ref table } if table == ANNOTATION_TABLE));
  assert_eq!(s.counts().await.unwrap().annotations, 1);
}

#[tokio::test]
async fn same_annotator_cannot_annotate_twice() {
  let s = store().await;
  let f = s.resolve_function("Nurse").await.unwrap();
  let a = s.resolve_annotator(annotator("Ada", f)).await.unwrap();

  s.record_annotation(NewAnnotation::accept(&question(1), a, ratings(4)))
    .await
    .unwrap();
  let err = s
    .record_annotation(NewAnnotation::accept(&question(1), a, ratings(2)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SameAnnotator { annotator_id, .. } if annotator_id == a));
}

#[tokio::test]
async fn second_annotation_must_share_function() {
  let s = store().await;
  let nurse = s.resolve_function("Nurse").await.unwrap();
  let physician = s.resolve_function("Physician").await.unwrap();
  let a = s.resolve_annotator(annotator("Ada", nurse)).await.unwrap();
  let b = s.resolve_annotator(annotator("Bob", physician)).await.unwrap();

  s.record_annotation(NewAnnotation::accept(&question(1), a, ratings(4)))
    .await
    .unwrap();
  let err = s
    .record_annotation(NewAnnotation::accept(&question(1), b, ratings(4)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::FunctionMismatch(QuestionId(1))));
}

#[tokio::test]
async fn at_most_two_annotations_per_question() {
  let s = store().await;
  let f = s.resolve_function("Nurse").await.unwrap();
  let a = s.resolve_annotator(annotator("Ada", f)).await.unwrap();
  let b = s.resolve_annotator(annotator("Bob", f)).await.unwrap();
  let c = s.resolve_annotator(annotator("Cy", f)).await.unwrap();

  s.record_annotation(NewAnnotation::accept(&question(1), a, ratings(4)))
    .await
    .unwrap();
  s.record_annotation(NewAnnotation::reject(
    &question(1),
    b,
    ratings(2),
    Some("What is asked?".into()),
    Some("This.".into()),
  ))
  .await
  .unwrap();
  let err = s
    .record_annotation(NewAnnotation::accept(&question(1), c, ratings(3)))
    .await
    .unwrap_err();

  assert!(matches!(err, Error::QuestionExhausted(QuestionId(1))));
  assert_eq!(s.annotation_stamps(QuestionId(1)).await.unwrap().len(), 2);
}

#[tokio::test]
async fn over_annotated_question_is_an_invariant_violation() {
  let s = store().await;
  let f = s.resolve_function("Nurse").await.unwrap();
  let mut ids = Vec::new();
  for name in ["Ada", "Bob", "Cy", "Dee"] {
    ids.push(s.resolve_annotator(annotator(name, f)).await.unwrap());
  }

  // Bypass the router to plant a history it would never allow.
  let seeded = ids[..3].to_vec();
  s.scoped(move |tx, catalog| {
    let columns = get_insert_columns(tx, ANNOTATION_TABLE)?;
    for id in seeded {
      let row = crate::encode::annotation_row(&NewAnnotation::accept(&question(1), id, ratings(3)));
      crate::router::insert_row(tx, &catalog.insert_in_annotation, ANNOTATION_TABLE, &columns, &row)?;
    }
    Ok(())
  })
  .await
  .unwrap();

  let err = s
    .record_annotation(NewAnnotation::accept(&question(1), ids[3], ratings(4)))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(sop_core::Error::InvariantViolation { question_id: QuestionId(1), count: 3 })
  ));
  assert_eq!(s.annotation_stamps(QuestionId(1)).await.unwrap().len(), 3);
}

#[tokio::test]
async fn annotation_requires_known_annotator() {
  let s = store().await;
  let err = s
    .record_annotation(NewAnnotation::accept(&question(1), AnnotatorId(9), ratings(4)))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UnknownAnnotator(AnnotatorId(9))));
}

#[tokio::test]
async fn stamps_carry_annotator_function() {
  let s = store().await;
  let f = s.resolve_function("Nurse").await.unwrap();
  let a = s.resolve_annotator(annotator("Ada", f)).await.unwrap();
  s.record_annotation(NewAnnotation::accept(&question(5), a, ratings(5)))
    .await
    .unwrap();

  let stamps = s.annotation_stamps(QuestionId(5)).await.unwrap();
  assert_eq!(stamps.len(), 1);
  assert_eq!(stamps[0].annotator_id, a);
  assert_eq!(stamps[0].function_id, f);
  assert!(s.annotation_stamps(QuestionId(6)).await.unwrap().is_empty());
}

// ─── Connection scope ────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_scope_rolls_back() {
  let s = store().await;
  let err = s
    .scoped(|tx, catalog| {
      crate::router::push_function(tx, catalog, "Nurse")?;
      Err::<(), _>(Error::KeyNotFound(FUNCTION_TABLE))
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::KeyNotFound(_)));
  assert_eq!(s.counts().await.unwrap().functions, 0);
}

#[tokio::test]
async fn malformed_template_surfaces_as_sqlite_error() {
  let catalog = StatementCatalog {
    select_length: "SELEKT COUNT(*) FROM {table}".into(),
    ..StatementCatalog::default()
  };
  let s = SqliteStore::open_in_memory(Arc::new(catalog)).await.unwrap();
  assert!(matches!(s.counts().await, Err(Error::Sqlite(_))));
}

// ─── Question bank ───────────────────────────────────────────────────────────

#[tokio::test]
async fn import_assigns_shared_ids_and_skips_duplicates() {
  let b = bank().await;
  let added = b.import(vec![new_question(1), new_question(2), new_question(1)]).await.unwrap();
  assert_eq!(added.len(), 2);

  let again = b.import(vec![new_question(2), new_question(3)]).await.unwrap();
  assert_eq!(again.len(), 1);

  let live = b.live_questions().await.unwrap();
  assert_eq!(live.len(), 3);
  for q in &live {
    assert_eq!(b.get(q.question_id).await.unwrap().as_ref(), Some(q));
  }
}

#[tokio::test]
async fn import_rows_validates_every_row_before_writing() {
  let b = bank().await;
  let rows = vec![
    vec!["q".to_owned(), "a".to_owned()],
    vec!["q".to_owned(), "a".to_owned(), "p".to_owned()],
    vec!["q".to_owned(), "a".to_owned(), "p".to_owned(), "extra".to_owned()],
  ];

  let err = b.import_rows(rows).await.unwrap_err();
  let Error::Validation { offending, .. } = err else { panic!("expected validation error") };
  assert_eq!(offending.iter().map(|r| r.index).collect::<Vec<_>>(), [0, 2]);
  assert_eq!(b.counts().await.unwrap().backup, 0);
}

#[tokio::test]
async fn retired_questions_stay_in_backup() {
  let b = bank().await;
  let added = b.import(vec![new_question(1), new_question(2)]).await.unwrap();
  let gone = added[0].question_id;

  assert_eq!(b.retire(vec![gone]).await.unwrap(), 1);
  assert_eq!(b.retire(vec![gone]).await.unwrap(), 0);

  let counts = b.counts().await.unwrap();
  assert_eq!(counts.live, 1);
  assert_eq!(counts.backup, 2);
  assert!(b.get(gone).await.unwrap().is_some());
  assert!(!b.load_pool().await.unwrap().contains(gone));
}

// ─── End to end ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn two_annotators_exhaust_a_question() {
  let s = store().await;
  let b = bank().await;
  b.import(vec![new_question(1)]).await.unwrap();
  let mut pool = b.load_pool().await.unwrap();
  let q1 = pool.questions()[0].question_id;

  let nurse = s.resolve_function("Nurse").await.unwrap();
  let a = s.resolve_annotator(annotator("Ada", nurse)).await.unwrap();
  let bob = s.resolve_annotator(annotator("Bob", nurse)).await.unwrap();
  let sampler = Sampler::default();
  let mut rng = StdRng::seed_from_u64(1);

  // A gets the fresh question and annotates it.
  let got = sampler.sample(&mut pool, &s, a, nurse, &mut rng).await.unwrap();
  assert_eq!(got.question_id, q1);
  s.record_annotation(NewAnnotation::accept(&got, a, ratings(4)))
    .await
    .unwrap();

  // A is now blocked on the only question.
  let err = sampler.sample(&mut pool, &s, a, nurse, &mut rng).await.unwrap_err();
  assert!(matches!(err, sop_core::Error::NoSuitableQuestion { .. }));
  assert_eq!(pool.len(), 1);

  // B shares the function and gets it.
  let got = sampler.sample(&mut pool, &s, bob, nurse, &mut rng).await.unwrap();
  assert_eq!(got.question_id, q1);
  s.record_annotation(NewAnnotation::accept(&got, bob, ratings(3)))
    .await
    .unwrap();
  assert_eq!(s.annotation_stamps(q1).await.unwrap().len(), 2);

  // Anyone else drains the pool.
  let cy = s.resolve_annotator(annotator("Cy", nurse)).await.unwrap();
  let err = sampler.sample(&mut pool, &s, cy, nurse, &mut rng).await.unwrap_err();
  assert!(matches!(err, sop_core::Error::PoolExhausted));
  assert!(pool.is_empty());
  assert_eq!(pool.take_retired(), [q1]);
}
