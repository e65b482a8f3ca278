use crate::config::{DistanceMetric, RulesConfig};
use crate::state::Position;

/// Separation between two positions in distance units.
pub fn separation(a: Position, b: Position, rules: &RulesConfig) -> f64 {
    let dx = f64::from(a.x.abs_diff(b.x));
    let dy = f64::from(a.y.abs_diff(b.y));
    let squares = match rules.distance_metric {
        DistanceMetric::Grid => dx.max(dy),
        DistanceMetric::Euclidean => dx.hypot(dy),
    };
    squares * rules.grid_size
}

pub fn within_range(a: Position, b: Position, range: u32, rules: &RulesConfig) -> bool {
    separation(a, b, rules) <= f64::from(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonals_cost_one_square_on_the_grid() {
        let rules = RulesConfig::default();
        let a = Position::new(0, 0);
        let b = Position::new(2, 2);
        assert_eq!(separation(a, b, &rules), 10.0);
        assert!(within_range(a, b, 10, &rules));

        let euclidean = RulesConfig {
            distance_metric: DistanceMetric::Euclidean,
            ..RulesConfig::default()
        };
        assert!(!within_range(a, b, 10, &euclidean));
        assert!(within_range(a, b, 15, &euclidean));
    }
}
