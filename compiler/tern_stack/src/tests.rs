use pretty_assertions::assert_eq;

use super::*;

#[test]
fn test_deep_recursion() {
    // This would overflow without stack growth
    fn deep_recurse(n: u64) -> u64 {
        ensure_sufficient_stack(|| if n == 0 { 0 } else { deep_recurse(n - 1) + 1 })
    }

    assert_eq!(deep_recurse(100_000), 100_000);
}

#[test]
fn test_returns_closure_result() {
    let result: Result<i32, &str> = ensure_sufficient_stack(|| Ok(123));
    assert_eq!(result, Ok(123));
}

// ── DepthBudget ─────────────────────────────────────────────────

fn nest(budget: &mut DepthBudget, remaining: u32) -> Result<u32, DepthExceeded> {
    if remaining == 0 {
        return Ok(budget.depth());
    }
    budget.descend(|b| nest(b, remaining - 1))?
}

#[test]
fn budget_allows_nesting_up_to_limit() {
    let mut budget = DepthBudget::new(8);
    assert_eq!(nest(&mut budget, 8), Ok(8));
    assert_eq!(budget.depth(), 0);
}

#[test]
fn budget_rejects_nesting_past_limit() {
    let mut budget = DepthBudget::new(8);
    assert_eq!(nest(&mut budget, 9), Err(DepthExceeded { limit: 8 }));
    // Depth unwinds even when a child failed.
    assert_eq!(budget.depth(), 0);
}

#[test]
fn budget_default_limit() {
    let budget = DepthBudget::default();
    assert_eq!(budget.limit(), DEFAULT_MAX_DEPTH);
}
