//! Weighted random template selection

use rand::seq::IndexedRandom;
use rand::Rng;

use super::types::Template;

/// Pick one template using the thread-local random source.
pub fn select_weighted(templates: &[Template]) -> Option<&Template> {
    select_weighted_with(templates, &mut rand::rng())
}

/// Pick one template with probability proportional to its weight.
///
/// Weight-0 templates are never picked while any candidate carries a positive
/// weight. When no candidate has weight, every candidate is equally likely.
pub fn select_weighted_with<'a, R>(templates: &'a [Template], rng: &mut R) -> Option<&'a Template>
where
    R: Rng + ?Sized,
{
    if templates.is_empty() {
        return None;
    }

    let total_weight: f64 = templates.iter().map(Template::effective_weight).sum();
    if total_weight <= 0.0 {
        return templates.choose(&mut *rng);
    }

    let weighted: Vec<&Template> = templates
        .iter()
        .filter(|t| t.effective_weight() > 0.0)
        .collect();

    match weighted.choose_weighted(&mut *rng, |t| t.effective_weight()) {
        Ok(template) => Some(*template),
        Err(e) => {
            tracing::warn!(error = %e, "Weighted selection failed, using uniform selection");
            templates.choose(&mut *rng)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn template(id: &str, weight: f64) -> Template {
        Template {
            id: id.to_string(),
            name: id.to_string(),
            weight,
            is_active: true,
            ..Default::default()
        }
    }

    fn tally(templates: &[Template], trials: usize) -> HashMap<String, usize> {
        let mut rng = StdRng::seed_from_u64(42);
        let mut counts = HashMap::new();
        for _ in 0..trials {
            let picked = select_weighted_with(templates, &mut rng).unwrap();
            *counts.entry(picked.id.clone()).or_insert(0) += 1;
        }
        counts
    }

    #[test]
    fn test_empty_input() {
        assert!(select_weighted(&[]).is_none());
    }

    #[test]
    fn test_single_candidate() {
        let templates = vec![template("only", 0.0)];
        assert_eq!(select_weighted(&templates).unwrap().id, "only");
    }

    #[test]
    fn test_zero_weight_templates_never_selected() {
        let templates = vec![template("a", 0.0), template("b", 10.0), template("c", 0.0)];
        let counts = tally(&templates, 10_000);

        assert_eq!(counts.get("a"), None);
        assert_eq!(counts.get("c"), None);
        assert_eq!(counts["b"], 10_000);
    }

    #[test]
    fn test_weights_are_proportional() {
        let templates = vec![template("light", 1.0), template("heavy", 3.0)];
        let counts = tally(&templates, 10_000);

        // Expected 2500 / 7500
        let light = counts["light"];
        assert!((2_000..3_000).contains(&light), "light picked {} times", light);
        assert_eq!(light + counts["heavy"], 10_000);
    }

    #[test]
    fn test_uniform_when_no_weights() {
        let templates = vec![template("a", 0.0), template("b", 0.0), template("c", 0.0)];
        let counts = tally(&templates, 9_000);

        for id in ["a", "b", "c"] {
            let n = counts[id];
            assert!((2_500..3_500).contains(&n), "{} picked {} times", id, n);
        }
    }

    #[test]
    fn test_negative_weights_count_as_zero() {
        let templates = vec![template("neg", -5.0), template("pos", 1.0)];
        let counts = tally(&templates, 1_000);
        assert_eq!(counts["pos"], 1_000);
    }
}
