use super::PointValue;

/// Collapses a sample to one scalar: the float field if non-zero, else the
/// integer field if non-zero, else 0.
///
/// A sample whose real value is zero and a sample with neither field set
/// both come out as 0. Callers that need the distinction should match on
/// [`PointValue::typed`] instead.
pub fn normalize(value: &PointValue) -> f64 {
    let double = value.double_value.unwrap_or(0.0);
    if double != 0.0 {
        return double;
    }

    let int = value.int64_value.unwrap_or(0);
    if int != 0 {
        return int as f64;
    }

    0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_wins_when_set() {
        assert_eq!(normalize(&PointValue::double(0.73)), 0.73);

        let both = PointValue {
            double_value: Some(2.5),
            int64_value: Some(9),
        };
        assert_eq!(normalize(&both), 2.5);
    }

    #[test]
    fn test_integer_only_is_exact() {
        for n in [1_i64, 40, 1_000_000, 1 << 40] {
            assert_eq!(normalize(&PointValue::int64(n)), n as f64);
        }

        let zero_double = PointValue {
            double_value: Some(0.0),
            int64_value: Some(40),
        };
        assert_eq!(normalize(&zero_double), 40.0);
    }

    #[test]
    fn test_zero_and_unset_conflate() {
        let both_zero = PointValue {
            double_value: Some(0.0),
            int64_value: Some(0),
        };
        assert_eq!(normalize(&both_zero), 0.0);
        assert_eq!(normalize(&PointValue::default()), 0.0);
        assert_eq!(normalize(&PointValue::double(0.0)), 0.0);
    }
}
