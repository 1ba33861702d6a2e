use crate::schema::AccountPlan;

const BASE_CONFIDENCE: usize = 20;
const CONFIDENCE_PER_SOURCE: usize = 10;
const MAX_CONFIDENCE: usize = 95;

/// Confidence as a whole percentage: `min(95, 20 + 10 * source_count)`.
///
/// This is a heuristic proxy for breadth of evidence, derived from nothing but the number of
/// unique sources. It is not a statistical estimate of correctness.
pub fn confidence_percent(source_count: usize) -> usize {
    source_count
        .saturating_mul(CONFIDENCE_PER_SOURCE)
        .saturating_add(BASE_CONFIDENCE)
        .min(MAX_CONFIDENCE)
}

pub fn confidence_estimate(source_count: usize) -> String {
    format!("{}%", confidence_percent(source_count))
}

/// Attach the evidence sources and the derived confidence estimate.
pub fn finalize(mut plan: AccountPlan, sources: &[String]) -> AccountPlan {
    plan.sources = sources.to_vec();
    plan.confidence_estimate = confidence_estimate(plan.sources.len());
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PlanTemplate;

    #[test]
    fn test_confidence_curve() {
        assert_eq!(confidence_estimate(0), "20%");
        assert_eq!(confidence_estimate(1), "30%");
        assert_eq!(confidence_estimate(5), "70%");
        assert_eq!(confidence_estimate(7), "90%");
        assert_eq!(confidence_estimate(8), "95%");
        assert_eq!(confidence_estimate(10), "95%");
        assert_eq!(confidence_estimate(usize::MAX), "95%");
    }

    #[test]
    fn test_confidence_is_monotonic() {
        let mut previous = 0;
        for n in 0..20 {
            let current = confidence_percent(n);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn test_finalize_attaches_sources() {
        let plan = AccountPlan::empty(&PlanTemplate::default());
        let sources = vec!["https://a.example".to_string(), "https://b.example".to_string()];

        let plan = finalize(plan, &sources);
        assert_eq!(plan.sources, sources);
        assert_eq!(plan.confidence_estimate, "40%");

        let plan = finalize(plan, &[]);
        assert!(plan.sources.is_empty());
        assert_eq!(plan.confidence_estimate, "20%");
    }
}
