extern crate scoped_helpers;
#[macro_use]
extern crate lazy_static;

use pretty_assertions::assert_eq;
use scoped_helpers::ds::{HelperError, ScopeChain, SuiteBuilder};
use scoped_helpers::helper::HelperId;
use scoped_helpers::runner::{ExampleOutcome, ExampleRunner};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

lazy_static! {
    static ref PROCESS_COUNTER: Mutex<usize> = Mutex::new(0);
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

// ── Memoization within one example ───────────────────────────────────

#[test]
fn test_block_runs_once_per_example() {
    let calls = counter();
    let mut builder = SuiteBuilder::new("Widget");
    let root = builder.root();
    let c = calls.clone();
    builder.subject(root, move |_ctx| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(String::from("widget"))
    });
    let suite = builder.build();

    let outcome = ExampleRunner::run(ScopeChain::new(&suite, root).unwrap(), |ctx| {
        let first = ctx.subject::<String>()?;
        let second = ctx.subject::<String>()?;
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(ctx.computed_count(), 1);
        Ok(())
    });

    assert!(outcome.is_passed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_in_place_mutation_visible_on_later_reads() {
    let mut builder = SuiteBuilder::new("Stack");
    let root = builder.root();
    builder.subject(root, |_ctx| Ok(RefCell::new(Vec::<i32>::new())));
    let suite = builder.build();

    let outcome = ExampleRunner::run(ScopeChain::new(&suite, root).unwrap(), |ctx| {
        ctx.subject::<RefCell<Vec<i32>>>()?.borrow_mut().push(7);
        ctx.subject::<RefCell<Vec<i32>>>()?.borrow_mut().push(8);
        assert_eq!(*ctx.subject::<RefCell<Vec<i32>>>()?.borrow(), vec![7, 8]);
        Ok(())
    });
    assert!(outcome.is_passed());
}

#[test]
fn test_lazy_helper_never_referenced_is_never_run() {
    let calls = counter();
    let mut builder = SuiteBuilder::new("Lazy");
    let root = builder.root();
    let c = calls.clone();
    builder.let_helper(root, "expensive", move |_ctx| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(42_u64)
    });
    builder.example(root, "ignores it", |_ctx| Ok(()));
    let suite = builder.build();

    let report = ExampleRunner::run_suite(&suite);
    assert!(report.is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

// ── Isolation between examples ───────────────────────────────────────

#[test]
fn test_pushes_in_before_hook_never_accumulate_across_examples() {
    let mut builder = SuiteBuilder::new("Array");
    let root = builder.root();
    builder.subject(root, |_ctx| Ok(RefCell::new(Vec::<i32>::new())));
    builder.before(root, |ctx| {
        ctx.subject::<RefCell<Vec<i32>>>()?.borrow_mut().extend([1, 2, 3]);
        Ok(())
    });
    for name in ["first run", "second run"] {
        builder.example(root, name, |ctx| {
            ctx.is_expected::<RefCell<Vec<i32>>>()?
                .to_equal(RefCell::new(vec![1, 2, 3]))
        });
    }
    let suite = builder.build();

    let report = ExampleRunner::run_suite(&suite);
    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 0);

    // The same suite run again starts from scratch too.
    assert!(ExampleRunner::run_suite(&suite).is_success());
}

#[test]
fn test_named_subject_counter_literal() {
    let mut builder = SuiteBuilder::new("Counter");
    let root = builder.root();
    builder.subject_named(root, "count", |_ctx| {
        let mut n = PROCESS_COUNTER.lock().map_err(|e| HelperError::failure(e.to_string()))?;
        *n += 1;
        Ok(*n)
    });
    builder.example(root, "is memoized within an example", |ctx| {
        assert_eq!(*ctx.helper::<usize>("count")?, 1);
        assert_eq!(*ctx.helper::<usize>("count")?, 1);
        assert_eq!(*ctx.subject::<usize>()?, 1);
        Ok(())
    });
    builder.example(root, "is not cached between examples", |ctx| {
        ctx.is_expected::<usize>()?.to_equal(2)?;
        assert_eq!(*ctx.helper::<usize>("count")?, 2);
        Ok(())
    });
    let suite = builder.build();

    let report = ExampleRunner::run_suite(&suite);
    for result in report.results() {
        assert!(result.outcome.is_passed(), "{}: {:?}", result.full_description, result.outcome);
    }
}

#[test]
fn test_each_example_gets_its_own_computation() {
    let calls = counter();
    let mut builder = SuiteBuilder::new("Isolation");
    let root = builder.root();
    let c = calls.clone();
    builder.let_helper(root, "ticket", move |_ctx| Ok(c.fetch_add(1, Ordering::SeqCst) + 1));
    let inner = builder.group(root, "nested");
    builder.example(inner, "one", |ctx| ctx.helper::<usize>("ticket").map(|_| ()));
    builder.example(inner, "two", |ctx| ctx.helper::<usize>("ticket").map(|_| ()));
    builder.example(root, "three", |ctx| ctx.helper::<usize>("ticket").map(|_| ()));
    let suite = builder.build();

    assert!(ExampleRunner::run_suite(&suite).is_success());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn test_block_failure_propagates_verbatim_and_is_not_retried() {
    let calls = counter();
    let mut builder = SuiteBuilder::new("Flaky");
    let root = builder.root();
    let c = calls.clone();
    builder.let_helper(root, "connection", move |_ctx| -> Result<u8, HelperError> {
        c.fetch_add(1, Ordering::SeqCst);
        Err(HelperError::failure("connection refused"))
    });
    let suite = builder.build();

    let outcome = ExampleRunner::run(ScopeChain::new(&suite, root).unwrap(), |ctx| {
        let first = ctx.helper::<u8>("connection").unwrap_err();
        assert_eq!(first.to_string(), "connection refused");
        assert!(matches!(first, HelperError::DefinitionBlockFailure(_)));

        let second = ctx.helper::<u8>("connection").unwrap_err();
        assert!(matches!(second, HelperError::PreviouslyFailed { .. }));
        assert!(!ctx.is_memoized(&HelperId::named("connection")));
        Ok(())
    });

    assert!(outcome.is_passed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failing_example_does_not_affect_sibling() {
    let mut builder = SuiteBuilder::new("Siblings");
    let root = builder.root();
    builder.let_helper(root, "value", |_ctx| Ok(10_i32));
    builder.example(root, "fails", |ctx| {
        ctx.helper::<i32>("missing").map(|_| ())
    });
    builder.example(root, "passes", |ctx| {
        assert_eq!(*ctx.helper::<i32>("value")?, 10);
        Ok(())
    });
    let suite = builder.build();

    let report = ExampleRunner::run_suite(&suite);
    assert_eq!(report.passed(), 1);
    assert_eq!(report.failed(), 1);
    match &report.get("Siblings fails").unwrap().outcome {
        ExampleOutcome::Failed(HelperError::NoSuchHelper { id }) => {
            assert_eq!(*id, HelperId::named("missing"))
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(report.get("Siblings passes").unwrap().outcome.is_passed());
}

#[test]
fn test_nested_helper_error_passes_through_unchanged() {
    let mut builder = SuiteBuilder::new("Chain");
    let root = builder.root();
    builder.let_helper(root, "outer", |ctx| {
        let inner = ctx.helper::<i32>("undefined")?;
        Ok(*inner + 1)
    });
    let suite = builder.build();

    let outcome = ExampleRunner::run(ScopeChain::new(&suite, root).unwrap(), |ctx| {
        ctx.helper::<i32>("outer").map(|_| ())
    });
    match outcome {
        ExampleOutcome::Failed(HelperError::NoSuchHelper { id }) => {
            assert_eq!(id, HelperId::named("undefined"))
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_panicking_example_does_not_stop_siblings() {
    let sibling_runs = counter();
    let mut builder = SuiteBuilder::new("Panics");
    let root = builder.root();
    builder.let_helper(root, "boom", |_ctx| -> Result<u8, HelperError> {
        panic!("fixture exploded")
    });
    builder.example(root, "reads boom", |ctx| ctx.helper::<u8>("boom").map(|_| ()));
    let c = sibling_runs.clone();
    builder.example(root, "runs anyway", move |_ctx| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let suite = builder.build();

    let report = ExampleRunner::run_suite(&suite);
    assert_eq!(report.results().len(), 2);
    match &report.get("Panics reads boom").unwrap().outcome {
        ExampleOutcome::Failed(HelperError::Panicked { message }) => {
            assert_eq!(message, "fixture exploded")
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(report.get("Panics runs anyway").unwrap().outcome.is_passed());
    assert_eq!(sibling_runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_assertion_in_body_is_a_failed_example() {
    let mut builder = SuiteBuilder::new("Assert");
    let root = builder.root();
    builder.let_helper(root, "n", |_ctx| Ok(1_i32));
    builder.example(root, "is wrong", |ctx| {
        let n = ctx.helper::<i32>("n")?;
        assert_eq!(*n, 2, "n should be two");
        Ok(())
    });
    let suite = builder.build();

    let report = ExampleRunner::run_suite(&suite);
    assert_eq!(report.failed(), 1);
    let err = report.results()[0].outcome.error().unwrap();
    assert!(err.to_string().contains("n should be two"), "{}", err);
}

// ── Circular evaluation ──────────────────────────────────────────────

#[test]
fn test_self_reference_is_circular() {
    let mut builder = SuiteBuilder::new("Ouroboros");
    let root = builder.root();
    builder.subject(root, |ctx| {
        let me = ctx.subject::<i32>()?;
        Ok(*me + 1)
    });
    let suite = builder.build();

    let outcome = ExampleRunner::run(ScopeChain::new(&suite, root).unwrap(), |ctx| {
        ctx.subject::<i32>().map(|_| ())
    });
    match outcome {
        ExampleOutcome::Failed(HelperError::CircularHelperEvaluation { id, cycle }) => {
            assert_eq!(id, HelperId::Default);
            assert_eq!(cycle, vec![HelperId::Default, HelperId::Default]);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_mutual_recursion_reports_cycle_path() {
    let mut builder = SuiteBuilder::new("Mutual");
    let root = builder.root();
    builder.let_helper(root, "a", |ctx| Ok(*ctx.helper::<i32>("b")? + 1));
    builder.let_helper(root, "b", |ctx| Ok(*ctx.helper::<i32>("a")? + 1));
    let suite = builder.build();

    let outcome = ExampleRunner::run(ScopeChain::new(&suite, root).unwrap(), |ctx| {
        let err = ctx.helper::<i32>("a").unwrap_err();
        match err {
            HelperError::CircularHelperEvaluation { cycle, .. } => assert_eq!(
                cycle,
                vec![HelperId::named("a"), HelperId::named("b"), HelperId::named("a")]
            ),
            other => panic!("unexpected error: {:?}", other),
        }
        Ok(())
    });
    assert!(outcome.is_passed());
}

#[test]
fn test_alias_reentry_is_circular() {
    let mut builder = SuiteBuilder::new("Alias loop");
    let root = builder.root();
    builder.subject_named(root, "account", |ctx| Ok(*ctx.subject::<i32>()? * 2));
    let suite = builder.build();

    let outcome = ExampleRunner::run(ScopeChain::new(&suite, root).unwrap(), |ctx| {
        ctx.helper::<i32>("account").map(|_| ())
    });
    match outcome {
        ExampleOutcome::Failed(HelperError::CircularHelperEvaluation { cycle, .. }) => {
            assert_eq!(cycle, vec![HelperId::named("account"), HelperId::Default])
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_helper_discarded_by_cycle_is_computed_later() {
    let b_runs = counter();
    let mut builder = SuiteBuilder::new("Recovering");
    let root = builder.root();
    builder.let_helper(root, "a", |ctx| match ctx.helper::<i32>("b") {
        Ok(b) => Ok(*b),
        Err(HelperError::CircularHelperEvaluation { .. }) => Ok(7),
        Err(err) => Err(err),
    });
    let c = b_runs.clone();
    builder.let_helper(root, "b", move |ctx| {
        c.fetch_add(1, Ordering::SeqCst);
        Ok(*ctx.helper::<i32>("a")? + 1)
    });
    let suite = builder.build();

    let outcome = ExampleRunner::run(ScopeChain::new(&suite, root).unwrap(), |ctx| {
        assert_eq!(*ctx.helper::<i32>("a")?, 7);
        assert!(!ctx.is_memoized(&HelperId::named("b")));
        assert_eq!(*ctx.helper::<i32>("b")?, 8);
        Ok(())
    });
    assert!(outcome.is_passed(), "{:?}", outcome);
    assert_eq!(b_runs.load(Ordering::SeqCst), 2);
}
